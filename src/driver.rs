//! Host-facing storage driver contract and registry.
//!
//! Hosts build a [`DriverRegistry`] at startup and register each driver's
//! constructor explicitly; drivers are then created by name from the host's
//! JSON settings.

use std::collections::BTreeMap;
use std::io::Read;

use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::object::ExposedObject;
use crate::remote::transport::CancelToken;

/// Static driver metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverInfo {
    pub name: &'static str,
    /// Whether downloads must be proxied through the host.
    pub only_proxy: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkArgs {
    /// Resolve redirects and return the final download URL.
    pub redirect: bool,
}

/// A download location for a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveArgs {
    pub password: Option<String>,
    /// Path inside the archive; empty means the archive root.
    pub inner_path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArchiveMeta {
    pub comment: String,
    pub encrypted: bool,
    pub tree: Vec<ExposedObject>,
}

/// Operations a host can perform on a mounted storage.
///
/// Only listing and linking are required. Everything that mutates the
/// storage or looks inside archives defaults to
/// [`DriverError::NotImplemented`] without touching the network.
pub trait StorageDriver: Send + Sync {
    fn info(&self) -> DriverInfo;

    /// Path of the storage root as the host addresses it.
    fn root_path(&self) -> &str;

    /// Releases resources when the storage is unmounted.
    fn drop_storage(&self) -> Result<(), DriverError> {
        Ok(())
    }

    fn list(
        &self,
        dir: &ExposedObject,
        cancel: &CancelToken,
    ) -> Result<Vec<ExposedObject>, DriverError>;

    fn link(
        &self,
        file: &ExposedObject,
        args: LinkArgs,
        cancel: &CancelToken,
    ) -> Result<Link, DriverError>;

    fn make_dir(&self, _parent: &ExposedObject, _name: &str) -> Result<ExposedObject, DriverError> {
        Err(DriverError::NotImplemented { operation: "make dir" })
    }

    fn move_object(
        &self,
        _src: &ExposedObject,
        _dst_dir: &ExposedObject,
    ) -> Result<ExposedObject, DriverError> {
        Err(DriverError::NotImplemented { operation: "move" })
    }

    fn rename(&self, _src: &ExposedObject, _new_name: &str) -> Result<ExposedObject, DriverError> {
        Err(DriverError::NotImplemented { operation: "rename" })
    }

    fn copy(
        &self,
        _src: &ExposedObject,
        _dst_dir: &ExposedObject,
    ) -> Result<ExposedObject, DriverError> {
        Err(DriverError::NotImplemented { operation: "copy" })
    }

    fn remove(&self, _obj: &ExposedObject) -> Result<(), DriverError> {
        Err(DriverError::NotImplemented { operation: "remove" })
    }

    fn put(
        &self,
        _dst_dir: &ExposedObject,
        _name: &str,
        _contents: &mut dyn Read,
    ) -> Result<ExposedObject, DriverError> {
        Err(DriverError::NotImplemented { operation: "put" })
    }

    fn archive_meta(
        &self,
        _obj: &ExposedObject,
        _args: &ArchiveArgs,
    ) -> Result<ArchiveMeta, DriverError> {
        Err(DriverError::NotImplemented { operation: "archive meta" })
    }

    fn list_archive(
        &self,
        _obj: &ExposedObject,
        _args: &ArchiveArgs,
    ) -> Result<Vec<ExposedObject>, DriverError> {
        Err(DriverError::NotImplemented { operation: "list archive" })
    }

    fn extract(&self, _obj: &ExposedObject, _args: &ArchiveArgs) -> Result<Link, DriverError> {
        Err(DriverError::NotImplemented { operation: "extract" })
    }

    fn archive_decompress(
        &self,
        _src: &ExposedObject,
        _dst_dir: &ExposedObject,
        _args: &ArchiveArgs,
    ) -> Result<Vec<ExposedObject>, DriverError> {
        Err(DriverError::NotImplemented { operation: "archive decompress" })
    }
}

/// Builds a driver from validated-on-construction settings.
pub type DriverConstructor = fn(DriverConfig) -> Result<Box<dyn StorageDriver>, DriverError>;

/// Name → constructor table, populated by the host's bootstrap code.
#[derive(Default)]
pub struct DriverRegistry {
    constructors: BTreeMap<String, DriverConstructor>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: &str, constructor: DriverConstructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    /// Registered driver names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Creates a driver from the host's JSON settings.
    pub fn create(
        &self,
        name: &str,
        settings: serde_json::Value,
    ) -> Result<Box<dyn StorageDriver>, DriverError> {
        let config = DriverConfig::from_json_value(settings)?;
        self.create_with_config(name, config)
    }

    pub fn create_with_config(
        &self,
        name: &str,
        config: DriverConfig,
    ) -> Result<Box<dyn StorageDriver>, DriverError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| DriverError::UnknownDriver(name.to_string()))?;
        constructor(config)
    }
}
