//! String-valued options shared by the command line and environment loaders.

use crate::config::error::ConversionError;
use crate::config::options::DeployOptions;
use crate::credentials::Credential;
use std::net::IpAddr;
use std::path::PathBuf;

/// Every option as the raw string a user typed. `None` and `""` both mean unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOptions {
    pub registry: Option<String>,
    pub image: Option<String>,
    pub digest: Option<String>,
    pub server: Option<String>,
    pub username: Option<String>,
    pub root_dir: Option<String>,
    pub private_key: Option<String>,
    pub channel: Option<String>,
    pub path: Option<String>,
    pub env_vars: Option<String>,
    pub debug: Option<String>,
}

impl RawOptions {
    pub fn into_options(self) -> Result<DeployOptions, ConversionError> {
        let server = set(self.server).map(|s| parse_server(&s)).transpose()?;
        let private_key = set(self.private_key)
            .map(|s| Credential::decode(&s))
            .transpose()?;
        let debug = set(self.debug)
            .map(|s| parse_bool("debug", &s))
            .transpose()?;

        let options = DeployOptions {
            registry: set(self.registry),
            image: set(self.image),
            digest: set(self.digest),
            server,
            username: set(self.username),
            root_dir: set(self.root_dir),
            private_key,
            channel: set(self.channel),
            path: set(self.path).map(PathBuf::from),
            env_vars: set(self.env_vars).map(|s| split_list(&s)),
            debug,
        };

        Ok(options.normalized())
    }
}

fn set(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub fn parse_server(value: &str) -> Result<IpAddr, ConversionError> {
    value
        .trim()
        .parse()
        .map_err(|source| ConversionError::InvalidAddress {
            value: value.to_string(),
            source,
        })
}

/// Split a comma-joined list, trimming items and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accepts the same spellings as Go's `strconv.ParseBool`.
pub fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConversionError> {
    match value.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConversionError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}
