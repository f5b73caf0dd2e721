use crate::config::error::ConfigSourceError;
use crate::config::options::DeployOptions;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = ".sad.json";

/// Load options from a JSON config file.
///
/// A missing or blank file yields empty options. Keys are the snake_case option
/// names; the PascalCase spellings written by older tooling are accepted too.
pub fn load_file(path: &Path) -> Result<DeployOptions, ConfigSourceError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config file at {}", path.display());
            return Ok(DeployOptions::default());
        }
        Err(source) => {
            return Err(ConfigSourceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(DeployOptions::default());
    }

    let options: DeployOptions =
        serde_json::from_str(&content).map_err(|source| ConfigSourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    debug!("Loaded options from config file {}", path.display());
    Ok(options.normalized())
}
