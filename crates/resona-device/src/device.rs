use std::sync::Arc;

use resona_api::{
    ChannelMask, DeviceDescriptor, Direction, Error, IoCallback, IoConfig, OpenError, Result,
    SessionInfo,
};

use crate::backend::DeviceBackend;
use crate::gate::CallbackGate;
use crate::state::SessionState;

/// One openable audio endpoint: the capability-query surface and the
/// open/start/stop/close state machine over a boxed backend.
///
/// Lifecycle methods take `&mut self`, so transitions are serialized by
/// construction; `is_open`/`is_playing` go through shared atomics and may be
/// polled from any thread. Changing channels, rate or buffer size requires a
/// close/open cycle; there is no renegotiation while open.
pub struct Device {
    backend: Box<dyn DeviceBackend>,
    gate: Arc<CallbackGate>,
    state: Arc<SessionState>,
}

impl Device {
    pub fn new(backend: Box<dyn DeviceBackend>) -> Device {
        let state = Arc::new(SessionState::default());
        let gate = Arc::new(CallbackGate::new(state.clone()));
        Device {
            backend,
            gate,
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.backend.descriptor().name
    }

    pub fn type_name(&self) -> &str {
        &self.backend.descriptor().type_name
    }

    pub fn input_channel_names(&self) -> &[String] {
        &self.backend.descriptor().input_channel_names
    }

    pub fn output_channel_names(&self) -> &[String] {
        &self.backend.descriptor().output_channel_names
    }

    pub fn num_sample_rates(&self) -> usize {
        self.backend.descriptor().sample_rates.len()
    }

    pub fn sample_rate(&self, index: usize) -> Option<u32> {
        self.backend.descriptor().sample_rates.get(index).copied()
    }

    pub fn sample_rates(&self) -> &[u32] {
        &self.backend.descriptor().sample_rates
    }

    pub fn num_buffer_sizes(&self) -> usize {
        self.backend.descriptor().buffer_sizes.len()
    }

    pub fn buffer_size_samples(&self, index: usize) -> Option<usize> {
        self.backend.descriptor().buffer_sizes.get(index).copied()
    }

    pub fn buffer_sizes(&self) -> &[usize] {
        &self.backend.descriptor().buffer_sizes
    }

    pub fn default_buffer_size(&self) -> usize {
        self.backend.descriptor().default_buffer_size
    }

    /// Try to open the device with the requested configuration. An already
    /// open device is closed first. On failure the device is left closed and
    /// the rendered diagnostic is retained for [`last_error`](Self::last_error).
    pub fn open(&mut self, config: &IoConfig) -> Result<(), OpenError> {
        if self.state.is_open() {
            self.close();
        } else if let Some(mut stale) = self.gate.drain() {
            // Left behind by a spontaneous device failure; finish its
            // lifecycle before the new session can reach the gate.
            stale.stopped();
        }

        if let Err(error) = validate(self.backend.descriptor(), config) {
            tracing::warn!("open rejected: {error}");
            self.state.record_error(error.to_string());
            return Err(error);
        }

        match self.backend.open(config, self.gate.clone()) {
            Ok(session) => {
                tracing::debug!(
                    sample_rate = session.sample_rate,
                    buffer_size = session.buffer_size,
                    "device open"
                );
                self.state.set_session(Some(session));
                self.state.clear_error();
                self.state.set_open(true);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("backend refused open: {error}");
                self.state.record_error(error.to_string());
                Err(error)
            }
        }
    }

    /// Stop if playing, release backend resources. No-op when already closed.
    pub fn close(&mut self) {
        if !self.state.is_open() {
            return;
        }

        if self.state.is_playing() {
            self.stop();
        }

        self.backend.close();
        self.state.set_open(false);
        self.state.set_session(None);
        tracing::debug!("device closed");
    }

    /// Register the consumer and begin streaming. `about_to_start` runs
    /// synchronously before the first block can be delivered. Rejected with
    /// [`Error::AlreadyPlaying`] while playing; the callback is not replaced.
    pub fn start(&mut self, mut callback: Box<dyn IoCallback>) -> Result<()> {
        if !self.state.is_open() {
            return Err(Error::NotOpen);
        }
        if self.state.is_playing() {
            return Err(Error::AlreadyPlaying);
        }

        let Some(session) = self.state.session() else {
            return Err(Error::NotOpen);
        };

        callback.about_to_start(&session);
        self.gate.install(callback);

        if let Err(error) = self.backend.start() {
            if let Some(mut callback) = self.gate.drain() {
                callback.stopped();
            }
            self.state.record_error(error.to_string());
            return Err(error);
        }

        tracing::debug!("device started");
        Ok(())
    }

    /// Halt streaming. Blocks until any in-flight block callback has
    /// completed; afterwards the consumer sees `stopped()` exactly once and
    /// is handed back to the caller. Returns `None` when not playing.
    pub fn stop(&mut self) -> Option<Box<dyn IoCallback>> {
        if !self.state.is_playing() {
            return None;
        }

        self.backend.stop();
        let mut callback = self.gate.drain();
        if let Some(callback) = callback.as_mut() {
            callback.stopped();
        }

        tracing::debug!("device stopped");
        callback
    }

    /// May flip to false asynchronously if the backend reports a fatal
    /// failure; poll rather than cache.
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Negotiated parameters of the current session, if open.
    pub fn session(&self) -> Option<SessionInfo> {
        self.state.session()
    }

    pub fn current_sample_rate(&self) -> Option<u32> {
        self.state.session().map(|s| s.sample_rate)
    }

    pub fn current_buffer_size(&self) -> Option<usize> {
        self.state.session().map(|s| s.buffer_size)
    }

    pub fn current_bit_depth(&self) -> Option<u32> {
        self.state.session().map(|s| s.bit_depth)
    }

    pub fn input_latency(&self) -> Option<usize> {
        self.state.session().map(|s| s.input_latency)
    }

    pub fn output_latency(&self) -> Option<usize> {
        self.state.session().map(|s| s.output_latency)
    }

    /// Active mask for the current session; empty when closed.
    pub fn active_input_channels(&self) -> ChannelMask {
        self.state
            .session()
            .map(|s| s.active_inputs)
            .unwrap_or_default()
    }

    pub fn active_output_channels(&self) -> ChannelMask {
        self.state
            .session()
            .map(|s| s.active_outputs)
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    pub fn has_control_panel(&self) -> bool {
        self.backend.has_control_panel()
    }

    pub fn show_control_panel(&mut self) -> bool {
        self.backend.show_control_panel()
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name())
            .field("is_open", &self.is_open())
            .field("is_playing", &self.is_playing())
            .finish()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.close();
    }
}

fn validate(descriptor: &DeviceDescriptor, config: &IoConfig) -> Result<(), OpenError> {
    let masks = [
        (
            &config.input_channels,
            descriptor.input_channel_names.len(),
            Direction::Input,
        ),
        (
            &config.output_channels,
            descriptor.output_channel_names.len(),
            Direction::Output,
        ),
    ];

    for (mask, available, direction) in masks {
        if let Some(index) = mask.iter().find(|&index| index >= available) {
            return Err(OpenError::ChannelOutOfRange {
                direction,
                index,
                available,
            });
        }
    }

    if !descriptor.sample_rates.contains(&config.sample_rate) {
        return Err(OpenError::UnsupportedSampleRate {
            requested: config.sample_rate,
        });
    }

    if !descriptor.buffer_sizes.contains(&config.buffer_size) {
        return Err(OpenError::UnsupportedBufferSize {
            requested: config.buffer_size,
        });
    }

    Ok(())
}
