pub mod backend;
pub mod device;
pub mod gate;
pub mod registry;
mod state;

pub use self::backend::DeviceBackend;
pub use self::device::Device;
pub use self::gate::CallbackGate;
pub use self::registry::BackendRegistry;
