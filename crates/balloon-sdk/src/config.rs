//! Balloon configuration.
//!
//! Loaded from an optional JSON file, overridden by `BALLOON__*` environment variables
//! (`BALLOON__HASHER=xor`, `BALLOON__STORAGE__BACKEND=sled`, `BALLOON__STORAGE__PATH=...`).

use std::path::{Path, PathBuf};

use balloon_core::base::HasherKind;
use schemars::{JsonSchema, Schema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "BALLOON";
const ENV_SEPARATOR: &str = "__";

/// Errors specific to balloon configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// The sled backend needs a directory.
    #[error("Sled storage path must not be empty.")]
    EmptySledPath,
}

/// Where the balloon keeps its tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Volatile in-process store.
    #[default]
    Memory,
    /// Persistent sled database.
    Sled {
        /// Database directory.
        path: PathBuf,
    },
}

/// Configuration of a balloon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct BalloonConfig {
    /// Hasher of the hyper tree. Fixed for the lifetime of a store.
    pub hasher: HasherKind,
    /// Storage backend.
    pub storage: StorageConfig,
}

/// Validated balloon configuration.
/// This is the only configuration in use, `BalloonConfig` is only used to build this after
/// validation.
#[derive(Debug, Clone)]
pub struct ValidatedBalloonConfig {
    inner: BalloonConfig,
}

impl std::ops::Deref for ValidatedBalloonConfig {
    type Target = BalloonConfig;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl BalloonConfig {
    /// Creates a new `BalloonConfig`.
    #[must_use]
    pub const fn new(hasher: HasherKind, storage: StorageConfig) -> Self {
        Self { hasher, storage }
    }

    /// Load the configuration from `file`, if given, and the environment.
    ///
    /// A missing file is not an error; every field falls back to its default.
    ///
    /// # Errors
    /// If the file is malformed or a value cannot be deserialized.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(
                config::File::new(&file.to_string_lossy(), config::FileFormat::Json)
                    .required(false),
            );
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Validates the configuration parameters.
    ///
    /// # Errors
    /// If the sled backend is selected with an empty path.
    pub fn validate(self) -> Result<ValidatedBalloonConfig, ConfigError> {
        if let StorageConfig::Sled { path } = &self.storage
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::EmptySledPath);
        }

        Ok(ValidatedBalloonConfig { inner: self })
    }

    /// Generates the JSON schema for the `BalloonConfig` struct.
    #[must_use]
    pub fn schema() -> Schema {
        schemars::schema_for!(BalloonConfig)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_default_config_validation() {
        let validated = BalloonConfig::default().validate();
        assert!(validated.is_ok());
        let validated = validated.expect("default is valid");
        assert_eq!(validated.hasher, HasherKind::Sha256);
        assert_eq!(validated.storage, StorageConfig::Memory);
    }

    #[test]
    fn test_empty_sled_path() {
        let config = BalloonConfig::new(
            HasherKind::Sha256,
            StorageConfig::Sled {
                path: PathBuf::new(),
            },
        );
        assert!(matches!(config.validate(), Err(ConfigError::EmptySledPath)));
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .expect("tempfile");
        write!(
            file,
            r#"{{"hasher": "blake2b256", "storage": {{"backend": "sled", "path": "/tmp/balloon"}}}}"#
        )
        .expect("write config");

        let config = BalloonConfig::load(Some(file.path())).expect("config loads");
        assert_eq!(config.hasher, HasherKind::Blake2b256);
        assert_eq!(
            config.storage,
            StorageConfig::Sled {
                path: PathBuf::from("/tmp/balloon")
            }
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config =
            BalloonConfig::load(Some(&dir.path().join("absent.json"))).expect("config loads");
        assert_eq!(config.storage, StorageConfig::Memory);
    }

    #[test]
    fn test_schema_names_every_field() {
        let schema = serde_json::to_value(BalloonConfig::schema()).expect("schema serializes");
        let properties = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .expect("schema has properties");
        assert!(properties.contains_key("hasher"));
        assert!(properties.contains_key("storage"));
    }
}
