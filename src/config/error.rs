use crate::credentials::CredentialError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where a partial set of options was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    CommandLine,
    Environment,
    ConfigFile,
}

impl fmt::Display for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSource::CommandLine => f.write_str("command line"),
            OptionSource::Environment => f.write_str("environment"),
            OptionSource::ConfigFile => f.write_str("config file"),
        }
    }
}

/// Failure converting a raw string value into a typed option.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Invalid server address {value:?}: {source}")]
    InvalidAddress {
        value: String,
        source: std::net::AddrParseError,
    },

    #[error("Invalid boolean {value:?} for {field}")]
    InvalidBool { field: &'static str, value: String },

    #[error("Invalid private key: {0}")]
    Credential(#[from] CredentialError),
}

#[derive(Debug, Error)]
pub enum ConfigSourceError {
    /// Malformed or unknown command line flag. Carries the full usage text.
    #[error("{message}")]
    Flag { message: String, usage: String },

    #[error("Invalid {origin} option: {error}")]
    Conversion {
        origin: OptionSource,
        #[source]
        error: ConversionError,
    },

    #[error("Invalid environment variable {variable}: {error}")]
    Environment {
        variable: String,
        #[source]
        error: ConversionError,
    },

    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Environment prefixes collide: option prefix {option_prefix:?} overlaps deploy prefix {deploy_prefix:?}")]
    PrefixCollision {
        option_prefix: String,
        deploy_prefix: String,
    },
}

/// Every required option that was left unset, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required options: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

impl ConversionError {
    /// Name of the option whose value failed to convert.
    pub fn field(&self) -> &'static str {
        match self {
            ConversionError::InvalidAddress { .. } => "server",
            ConversionError::InvalidBool { field, .. } => field,
            ConversionError::Credential(_) => "private_key",
        }
    }
}
