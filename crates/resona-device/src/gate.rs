use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use resona_api::IoCallback;

use crate::state::SessionState;

/// Exchange point between the lifecycle thread and the backend's real-time
/// delivery thread.
///
/// The slot mutex serializes block delivery (one invocation at a time) and
/// doubles as the stop rendezvous: `drain` cannot take the callback out while
/// a block is in flight, so once it returns, the consumer has observed its
/// last invocation.
pub struct CallbackGate {
    slot: Mutex<Option<Box<dyn IoCallback>>>,
    state: Arc<SessionState>,
}

impl CallbackGate {
    pub(crate) fn new(state: Arc<SessionState>) -> CallbackGate {
        CallbackGate {
            slot: Mutex::new(None),
            state,
        }
    }

    /// Deliver one block to the installed consumer. Backend-facing; intended
    /// for the real-time thread.
    ///
    /// Slot `i` of `inputs`/`outputs` maps to channel `i` of the device's
    /// channel-name lists, with `None` at disabled channels; each `Some`
    /// slice is `num_samples` long. With no consumer installed (or a stop in
    /// progress) the enabled output slots are zero-filled so a racing cycle
    /// still emits silence.
    pub fn process(
        &self,
        inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
        num_samples: usize,
    ) {
        let mut slot = self.lock_slot();
        match slot.as_mut() {
            Some(callback) if self.state.is_playing() => {
                callback.process_block(inputs, outputs, num_samples);
            }
            _ => {
                for channel in outputs.iter_mut().flatten() {
                    channel.fill(0.0);
                }
            }
        }
    }

    /// Report an operational failure. Backend-facing; any thread.
    ///
    /// Records the message, drops the open/playing flags (the spontaneous
    /// device-loss surface) and forwards to the consumer's `device_error`
    /// when the slot can be acquired without blocking. A failure raised from
    /// inside a block cycle skips the direct notification; the recorded
    /// error is still observable through the device status surface.
    pub fn fail(&self, message: &str) {
        tracing::error!("device failure: {message}");

        self.state.record_error(message.to_owned());
        self.state.set_playing(false);
        self.state.set_open(false);

        if let Ok(mut slot) = self.slot.try_lock() {
            if let Some(callback) = slot.as_mut() {
                callback.device_error(message);
            }
        }
    }

    pub(crate) fn install(&self, callback: Box<dyn IoCallback>) {
        *self.lock_slot() = Some(callback);
        self.state.set_playing(true);
    }

    /// Take the consumer out, waiting for any in-flight block to complete.
    /// After this returns, no further `process` cycle can reach it.
    pub(crate) fn drain(&self) -> Option<Box<dyn IoCallback>> {
        self.state.set_playing(false);
        self.lock_slot().take()
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Box<dyn IoCallback>>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering::SeqCst;
    use std::thread;
    use std::time::Duration;

    use resona_api::SessionInfo;

    use super::*;

    struct SlowCallback {
        blocks: Arc<AtomicUsize>,
        errors: Arc<AtomicUsize>,
    }

    impl IoCallback for SlowCallback {
        fn about_to_start(&mut self, _session: &SessionInfo) {}

        fn process_block(
            &mut self,
            _inputs: &[Option<&[f32]>],
            outputs: &mut [Option<&mut [f32]>],
            _num_samples: usize,
        ) {
            thread::sleep(Duration::from_millis(5));
            for channel in outputs.iter_mut().flatten() {
                channel.fill(1.0);
            }
            self.blocks.fetch_add(1, SeqCst);
        }

        fn stopped(&mut self) {}

        fn device_error(&mut self, _message: &str) {
            self.errors.fetch_add(1, SeqCst);
        }
    }

    fn gate() -> Arc<CallbackGate> {
        Arc::new(CallbackGate::new(Arc::new(SessionState::default())))
    }

    #[test]
    fn test_process_without_consumer_writes_silence() {
        let gate = gate();

        let mut buffer = vec![1.0f32; 8];
        let mut outputs = [Some(buffer.as_mut_slice()), None];
        gate.process(&[], &mut outputs, 8);

        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_drain_waits_for_in_flight_block() {
        let gate = gate();
        let blocks = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        gate.install(Box::new(SlowCallback {
            blocks: blocks.clone(),
            errors: errors.clone(),
        }));

        let delivery = {
            let gate = gate.clone();
            thread::spawn(move || {
                let mut buffer = vec![0.0f32; 4];
                for _ in 0..200 {
                    let mut outputs = [Some(buffer.as_mut_slice())];
                    gate.process(&[], &mut outputs, 4);
                }
            })
        };

        // Let a few blocks through before stopping.
        thread::sleep(Duration::from_millis(20));

        let callback = gate.drain();
        assert!(callback.is_some());

        let frozen = blocks.load(SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(blocks.load(SeqCst), frozen);

        delivery.join().unwrap();
    }

    #[test]
    fn test_fail_notifies_consumer_and_clears_flags() {
        let state = Arc::new(SessionState::default());
        state.set_open(true);
        let gate = CallbackGate::new(state.clone());

        let blocks = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        gate.install(Box::new(SlowCallback {
            blocks,
            errors: errors.clone(),
        }));

        gate.fail("device unplugged");

        assert_eq!(errors.load(SeqCst), 1);
        assert!(!state.is_open());
        assert!(!state.is_playing());
        assert_eq!(state.last_error().as_deref(), Some("device unplugged"));
    }
}
