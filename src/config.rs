//! Driver configuration.
//!
//! The host hands the driver a JSON object (`model_id`, `resource_type`,
//! `revision`, `default_root`). It is parsed leniently into [`DriverConfig`]
//! and then checked once by [`DriverConfig::validate`], which yields the
//! immutable [`ValidatedConfig`] the browser works from.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::object::trim_slashes;

/// Revision used when none is configured.
pub const DEFAULT_REVISION: &str = "master";

/// Raw, host-supplied driver settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub model_id: String,
    pub resource_type: String,
    pub revision: String,
    pub default_root: String,
}

/// Kind of repository being browsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    #[default]
    Model,
    Dataset,
}

impl ResourceKind {
    /// Parses a resource kind, case-insensitively. Empty input selects the default.
    pub fn parse(input: &str) -> Result<Self, DriverError> {
        let normalized = input.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "model" => Ok(ResourceKind::Model),
            "dataset" => Ok(ResourceKind::Dataset),
            _ => Err(DriverError::UnsupportedResourceKind(normalized)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Model => "model",
            ResourceKind::Dataset => "dataset",
        }
    }

    /// URL segments accepted by the API for this kind, primary first.
    pub fn segments(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Model => &["models", "model"],
            ResourceKind::Dataset => &["datasets", "dataset"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration after validation. Never changes once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub repo_id: String,
    pub kind: ResourceKind,
    pub revision: String,
    pub default_subpath: Option<String>,
}

impl DriverConfig {
    /// Reads a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, DriverError> {
        let file = File::open(path).map_err(DriverError::Io)?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader).map_err(|source| DriverError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds a config from the host's JSON "addition" object.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, DriverError> {
        serde_json::from_value(value).map_err(DriverError::ConfigValue)
    }

    /// Checks the settings and fills in defaults.
    ///
    /// # Errors
    /// Fails when `model_id` is blank or `resource_type` is neither
    /// `model` nor `dataset`.
    pub fn validate(&self) -> Result<ValidatedConfig, DriverError> {
        let repo_id = self.model_id.trim();
        if repo_id.is_empty() {
            return Err(DriverError::MissingRepoId);
        }

        let kind = ResourceKind::parse(&self.resource_type)?;

        let revision = match self.revision.trim() {
            "" => DEFAULT_REVISION.to_string(),
            other => other.to_string(),
        };

        let default_subpath = Some(trim_slashes(&self.default_root))
            .filter(|subpath| !subpath.is_empty())
            .map(str::to_string);

        Ok(ValidatedConfig {
            repo_id: repo_id.to_string(),
            kind,
            revision,
            default_subpath,
        })
    }
}
