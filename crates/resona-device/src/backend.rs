use std::sync::Arc;

use resona_api::{DeviceDescriptor, IoConfig, OpenError, Result, SessionInfo};

use crate::gate::CallbackGate;

/// Driver side of the contract, implemented once per backend family
/// (kernel sound API, vendor protocol, virtual bus, ...). Consumed
/// exclusively by [`Device`](crate::Device); applications never call these
/// methods directly.
pub trait DeviceBackend: Send + 'static {
    /// Capabilities fixed at construction time.
    fn descriptor(&self) -> &DeviceDescriptor;

    /// Map the requested configuration to an actual driver configuration and
    /// allocate driver resources. The request has already been bounds-checked
    /// against the descriptor; backends with coarser negotiation (e.g.
    /// nearest-rate policies) report what they actually configured in the
    /// returned [`SessionInfo`].
    ///
    /// The gate is the backend's handle for delivering blocks and reporting
    /// asynchronous failures; it stays valid until `close`.
    fn open(
        &mut self,
        config: &IoConfig,
        gate: Arc<CallbackGate>,
    ) -> Result<SessionInfo, OpenError>;

    /// Begin periodic delivery. Only called on an open backend with a
    /// consumer already installed in the gate.
    fn start(&mut self) -> Result<()>;

    /// Halt the delivery mechanism. A cycle may still be in flight when this
    /// returns; the controller's gate drain provides the completion
    /// guarantee.
    fn stop(&mut self);

    /// Release driver resources. Not called while playing.
    fn close(&mut self);

    fn has_control_panel(&self) -> bool {
        false
    }

    /// Present the backend's native settings panel, if any. Returns whether
    /// a panel was shown.
    fn show_control_panel(&mut self) -> bool {
        false
    }
}
