//! Error types for configuration and setup failures.
//!
//! Lint failures are never errors; they are reported through `RunResult`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Config file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema.
    #[error("invalid TOML in {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Config file is not valid YAML for the expected schema.
    #[error("invalid YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A setting has a value outside its domain.
    #[error("invalid setting `{key}`: {message}")]
    InvalidSetting { key: String, message: String },

    /// The working directory could not be determined.
    #[error("failed to read current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// Failed to start the async runtime.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
