use ahash::HashMap;
use resona_api::{Error, Result};

use crate::backend::DeviceBackend;
use crate::device::Device;

type Constructor = Box<dyn Fn() -> Result<Box<dyn DeviceBackend>> + Send + Sync>;

/// Maps backend type-names to constructor functions. Populated once at
/// process start by the embedding application; device instantiation goes
/// through [`create`](Self::create).
#[derive(Default)]
pub struct BackendRegistry {
    constructors: HashMap<String, Constructor>,
}

impl BackendRegistry {
    pub fn new() -> BackendRegistry {
        BackendRegistry::default()
    }

    /// Register a backend family. A later registration under the same name
    /// replaces the earlier one.
    pub fn register<B, F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        B: DeviceBackend,
        F: Fn() -> Result<B> + Send + Sync + 'static,
    {
        self.constructors.insert(
            type_name.into(),
            Box::new(move || constructor().map(|b| Box::new(b) as Box<dyn DeviceBackend>)),
        );
    }

    pub fn create(&self, type_name: &str) -> Result<Device> {
        let constructor =
            self.constructors
                .get(type_name)
                .ok_or_else(|| Error::UnknownBackend {
                    name: type_name.to_owned(),
                })?;

        Ok(Device::new(constructor()?))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}
