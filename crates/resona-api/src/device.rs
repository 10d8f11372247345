use crate::channels::ChannelMask;

/// Fixed capabilities of one audio device instance, created by the backend at
/// construction time. The lists never change while the instance exists, even
/// across open/close cycles.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub name: String,
    /// Backend family, e.g. "Dummy", "PipeWire".
    pub type_name: String,
    pub input_channel_names: Vec<String>,
    pub output_channel_names: Vec<String>,
    pub sample_rates: Vec<u32>,
    pub buffer_sizes: Vec<usize>,
    /// Guaranteed to be accepted by open() without further negotiation.
    pub default_buffer_size: usize,
}

/// Requested configuration for opening a device.
#[derive(Debug, Clone)]
pub struct IoConfig {
    pub input_channels: ChannelMask,
    pub output_channels: ChannelMask,
    pub sample_rate: u32,
    pub buffer_size: usize,
}

/// Operating parameters of an open session, as actually negotiated by the
/// backend. Latencies are in samples.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub sample_rate: u32,
    pub buffer_size: usize,
    pub bit_depth: u32,
    pub input_latency: usize,
    pub output_latency: usize,
    pub active_inputs: ChannelMask,
    pub active_outputs: ChannelMask,
}
