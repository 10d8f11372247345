//! Null audio backend: a timer-driven device that exchanges silence with its
//! consumer at the configured block rate, without touching any sound API.
//! Useful as a stand-in where no hardware exists and as the reference
//! implementation of the backend contract.

mod error;
mod internal;

use std::sync::Arc;

use resona_api::{DeviceDescriptor, IoConfig, OpenError, Result, SessionInfo};
use resona_device::{CallbackGate, DeviceBackend};

pub use crate::error::Error;
use crate::internal::Handle;

#[derive(Debug, Clone)]
pub struct DummyConfig {
    pub name: String,
    pub input_channel_names: Vec<String>,
    pub output_channel_names: Vec<String>,
    pub sample_rates: Vec<u32>,
    pub buffer_sizes: Vec<usize>,
    pub default_buffer_size: usize,
}

impl Default for DummyConfig {
    fn default() -> DummyConfig {
        DummyConfig {
            name: "Dummy Audio Device".into(),
            input_channel_names: vec!["Input 1".into(), "Input 2".into()],
            output_channel_names: vec!["Output 1".into(), "Output 2".into()],
            sample_rates: vec![44100, 48000, 88200, 96000],
            buffer_sizes: vec![64, 128, 256, 512, 1024, 2048],
            default_buffer_size: 512,
        }
    }
}

pub struct DummyBackend {
    descriptor: DeviceDescriptor,
    handle: Option<Handle>,
}

impl DummyBackend {
    pub fn new(config: DummyConfig) -> DummyBackend {
        DummyBackend {
            descriptor: DeviceDescriptor {
                name: config.name,
                type_name: "Dummy".into(),
                input_channel_names: config.input_channel_names,
                output_channel_names: config.output_channel_names,
                sample_rates: config.sample_rates,
                buffer_sizes: config.buffer_sizes,
                default_buffer_size: config.default_buffer_size,
            },
            handle: None,
        }
    }
}

impl DeviceBackend for DummyBackend {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn open(
        &mut self,
        config: &IoConfig,
        gate: Arc<CallbackGate>,
    ) -> Result<SessionInfo, OpenError> {
        let session = SessionInfo {
            sample_rate: config.sample_rate,
            buffer_size: config.buffer_size,
            bit_depth: 32,
            input_latency: config.buffer_size,
            output_latency: config.buffer_size,
            active_inputs: config.input_channels.clone(),
            active_outputs: config.output_channels.clone(),
        };

        let handle = Handle::spawn(
            session.clone(),
            self.descriptor.input_channel_names.len(),
            self.descriptor.output_channel_names.len(),
            gate,
        )
        .map_err(OpenError::backend)?;

        self.handle = Some(handle);
        Ok(session)
    }

    fn start(&mut self) -> Result<()> {
        match &self.handle {
            Some(handle) => handle.start().map_err(resona_api::Error::backend),
            None => Err(resona_api::Error::NotOpen),
        }
    }

    fn stop(&mut self) {
        if let Some(handle) = &self.handle {
            let _ = handle.stop();
        }
    }

    fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.terminate();
        }
    }
}

impl Drop for DummyBackend {
    fn drop(&mut self) {
        self.close();
    }
}
