use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use resona_api::SessionInfo;
use resona_device::CallbackGate;
use smallvec::SmallVec;

use crate::error::{Error, Result};

const INLINE_CHANNELS: usize = 16;

pub enum Message {
    Start { sender: oneshot::Sender<()> },
    Stop { sender: oneshot::Sender<()> },
    Terminate,
}

pub struct Handle {
    sender: Sender<Message>,
    thread: Option<JoinHandle<()>>,
}

impl Handle {
    pub fn spawn(
        session: SessionInfo,
        num_inputs: usize,
        num_outputs: usize,
        gate: Arc<CallbackGate>,
    ) -> Result<Handle> {
        let (sender, receiver) = crossbeam_channel::unbounded();

        let thread = thread::Builder::new()
            .name("dummy-audio".into())
            .spawn(move || Worker::new(session, num_inputs, num_outputs, gate).run(receiver))
            .map_err(Error::ThreadSpawn)?;

        Ok(Handle {
            sender,
            thread: Some(thread),
        })
    }

    pub fn start(&self) -> Result<()> {
        self.send_recv(|sender| Message::Start { sender })
    }

    pub fn stop(&self) -> Result<()> {
        self.send_recv(|sender| Message::Stop { sender })
    }

    /// Shut the worker down and wait for it to exit.
    pub fn terminate(mut self) {
        let _ = self.sender.send(Message::Terminate);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    fn send_recv(&self, message: impl FnOnce(oneshot::Sender<()>) -> Message) -> Result<()> {
        let (ack, wait) = oneshot::channel();
        self.sender
            .send(message(ack))
            .map_err(|_| Error::ThreadCrashed)?;
        wait.recv().map_err(|_| Error::ThreadCrashed)
    }
}

/// Owns the channel storage and drives the delivery clock. While streaming,
/// the mailbox doubles as the timer: control messages are awaited with the
/// next block's deadline, and a timeout means it is time to deliver.
struct Worker {
    session: SessionInfo,
    gate: Arc<CallbackGate>,
    input_buffers: Vec<Vec<f32>>,
    output_buffers: Vec<Vec<f32>>,
    streaming: bool,
    next_deadline: Instant,
    promoted: bool,
}

impl Worker {
    fn new(
        session: SessionInfo,
        num_inputs: usize,
        num_outputs: usize,
        gate: Arc<CallbackGate>,
    ) -> Worker {
        let buffer_size = session.buffer_size;
        Worker {
            session,
            gate,
            input_buffers: vec![vec![0.0; buffer_size]; num_inputs],
            output_buffers: vec![vec![0.0; buffer_size]; num_outputs],
            streaming: false,
            next_deadline: Instant::now(),
            promoted: false,
        }
    }

    fn run(mut self, receiver: Receiver<Message>) {
        loop {
            let message = if self.streaming {
                match receiver.recv_deadline(self.next_deadline) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => {
                        self.tick();
                        None
                    }
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            } else {
                match receiver.recv() {
                    Ok(message) => Some(message),
                    Err(_) => return,
                }
            };

            match message {
                Some(Message::Start { sender }) => {
                    self.promote();
                    self.streaming = true;
                    self.next_deadline = Instant::now() + self.period();
                    let _ = sender.send(());
                }
                Some(Message::Stop { sender }) => {
                    self.streaming = false;
                    let _ = sender.send(());
                }
                Some(Message::Terminate) => return,
                None => {}
            }
        }
    }

    fn promote(&mut self) {
        if self.promoted {
            return;
        }
        self.promoted = true;

        if let Err(e) = audio_thread_priority::promote_current_thread_to_real_time(
            self.session.buffer_size as u32,
            self.session.sample_rate,
        ) {
            tracing::warn!("real-time promotion failed: {e}");
        }
    }

    fn tick(&mut self) {
        let num_samples = self.session.buffer_size;
        let active_inputs = &self.session.active_inputs;
        let active_outputs = &self.session.active_outputs;

        // The null device records nothing; enabled inputs carry silence.
        for buffer in &mut self.input_buffers {
            buffer.fill(0.0);
        }

        let inputs: SmallVec<[Option<&[f32]>; INLINE_CHANNELS]> = self
            .input_buffers
            .iter()
            .enumerate()
            .map(|(i, buffer)| active_inputs.contains(i).then_some(buffer.as_slice()))
            .collect();

        let mut outputs: SmallVec<[Option<&mut [f32]>; INLINE_CHANNELS]> = self
            .output_buffers
            .iter_mut()
            .enumerate()
            .map(|(i, buffer)| active_outputs.contains(i).then_some(buffer.as_mut_slice()))
            .collect();

        self.gate.process(&inputs, &mut outputs, num_samples);
        drop(outputs);
        drop(inputs);

        self.next_deadline += self.period();
        let now = Instant::now();
        if self.next_deadline < now {
            // Fell behind the clock; skip ahead instead of bursting.
            self.next_deadline = now;
        }
    }

    fn period(&self) -> Duration {
        Duration::from_secs_f64(self.session.buffer_size as f64 / self.session.sample_rate as f64)
    }
}
