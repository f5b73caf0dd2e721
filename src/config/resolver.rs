use crate::config::cli::CliArgs;
use crate::config::env::{load_env, EnvPrefixes, EnvSnapshot};
use crate::config::error::ConfigSourceError;
use crate::config::file::load_file;
use crate::config::options::DeployOptions;
use tracing::debug;

/// The three partial option sets read for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSources {
    pub command_line: DeployOptions,
    pub environment: DeployOptions,
    pub config_file: DeployOptions,
}

impl OptionSources {
    /// Read every source. The config file path comes from the command line.
    pub fn load(
        cli: &CliArgs,
        snapshot: &EnvSnapshot,
        prefixes: &EnvPrefixes,
    ) -> Result<Self, ConfigSourceError> {
        Ok(Self {
            command_line: cli.options()?,
            environment: load_env(snapshot, prefixes.option())?,
            config_file: load_file(&cli.config)?,
        })
    }

    /// Merge with precedence command line > environment > config file >
    /// defaults.
    pub fn resolve(self) -> DeployOptions {
        let OptionSources {
            mut command_line,
            mut environment,
            config_file,
        } = self;

        environment.merge(&config_file);
        command_line.merge(&environment);
        command_line.merge_defaults();

        debug!("Resolved options: {:?}", command_line);
        command_line
    }
}

/// Load and merge all option sources.
pub fn resolve(
    cli: &CliArgs,
    snapshot: &EnvSnapshot,
    prefixes: &EnvPrefixes,
) -> Result<DeployOptions, ConfigSourceError> {
    Ok(OptionSources::load(cli, snapshot, prefixes)?.resolve())
}
