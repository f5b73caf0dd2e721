//! Deployment options and the sources they are resolved from.
//!
//! Options come from the command line, the environment and a JSON config file.
//! Each source yields a partial [`DeployOptions`]; [`OptionSources::resolve`]
//! layers them with command line > environment > config file > defaults.

pub mod cli;
pub mod env;
pub mod error;
pub mod file;
pub mod options;
pub mod raw;
pub mod resolver;

pub use cli::{parse_args, CliArgs, CliOutcome};
pub use env::{load_env, EnvPrefixes, EnvSnapshot};
pub use error::{ConfigSourceError, ConversionError, OptionSource, ValidationError};
pub use file::{load_file, DEFAULT_CONFIG_FILE};
pub use options::{DeployOptions, VerifiedOptions};
pub use raw::RawOptions;
pub use resolver::{resolve, OptionSources};
