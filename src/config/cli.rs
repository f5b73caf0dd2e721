use crate::config::error::{ConfigSourceError, OptionSource};
use crate::config::file::DEFAULT_CONFIG_FILE;
use crate::config::options::DeployOptions;
use crate::config::raw::RawOptions;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Simple app deployment: ship a Docker Compose app to a server over SSH
#[derive(Debug, Clone, Parser)]
#[command(name = "sad")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct CliArgs {
    /// Registry hosting the image
    #[arg(long, allow_hyphen_values = true)]
    pub registry: Option<String>,

    /// Image to deploy
    #[arg(long, allow_hyphen_values = true)]
    pub image: Option<String>,

    /// Image digest to deploy
    #[arg(long, allow_hyphen_values = true)]
    pub digest: Option<String>,

    /// Server to deploy to
    #[arg(long, allow_hyphen_values = true)]
    pub server: Option<String>,

    /// User to login to on the server
    #[arg(long, allow_hyphen_values = true)]
    pub username: Option<String>,

    /// Root directory to deploy to on the server
    #[arg(long, allow_hyphen_values = true)]
    pub root_dir: Option<String>,

    /// Base64 encoded SSH private key to login to the user on the server
    #[arg(long, allow_hyphen_values = true)]
    pub private_key: Option<String>,

    /// Deployment channel
    #[arg(long, allow_hyphen_values = true)]
    pub channel: Option<String>,

    /// Path to the app to be deployed relative to the current directory
    #[arg(long, allow_hyphen_values = true)]
    pub path: Option<String>,

    /// Local environment variables to be injected into the app deployment
    #[arg(long, allow_hyphen_values = true)]
    pub env_vars: Option<String>,

    /// Debug mode
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub debug: Option<String>,

    /// JSON config file to read options from
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, allow_hyphen_values = true)]
    pub config: PathBuf,
}

/// Result of parsing the command line. Help and version requests are not errors.
#[derive(Debug, Clone)]
pub enum CliOutcome {
    Options(Box<CliArgs>),
    Help(String),
}

impl CliArgs {
    pub fn raw_options(&self) -> RawOptions {
        RawOptions {
            registry: self.registry.clone(),
            image: self.image.clone(),
            digest: self.digest.clone(),
            server: self.server.clone(),
            username: self.username.clone(),
            root_dir: self.root_dir.clone(),
            private_key: self.private_key.clone(),
            channel: self.channel.clone(),
            path: self.path.clone(),
            env_vars: self.env_vars.clone(),
            debug: self.debug.clone(),
        }
    }

    pub fn options(&self) -> Result<DeployOptions, ConfigSourceError> {
        self.raw_options()
            .into_options()
            .map_err(|error| ConfigSourceError::Conversion {
                origin: OptionSource::CommandLine,
                error,
            })
    }

    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}

/// Rewrite Go-style `-name` flags to `--name`. Short flags like `-h` are kept,
/// and the token after a flag that needs a value is passed through untouched.
fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let command = CliArgs::command();
    let mut normalized = Vec::new();
    let mut value_pending = false;

    for arg in args {
        if std::mem::take(&mut value_pending) {
            normalized.push(arg);
            continue;
        }

        let single_dash = !arg.starts_with("--");
        let flag = match arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) {
            Some(flag) if !flag.is_empty() && (!single_dash || flag.len() > 1) => flag,
            _ => {
                normalized.push(arg);
                continue;
            }
        };

        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag, false),
        };
        value_pending = !inline_value
            && command.get_arguments().any(|a| {
                a.get_long() == Some(name)
                    && a.get_action().takes_values()
                    && a.get_num_args().map_or(true, |r| r.min_values() > 0)
            });

        if single_dash {
            normalized.push(format!("-{arg}"));
        } else {
            normalized.push(arg);
        }
    }
    normalized
}

/// Parse process arguments, the first of which is the program name.
pub fn parse_args<I, T>(args: I) -> Result<CliOutcome, ConfigSourceError>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);
    let program = args.next().unwrap_or_else(|| "sad".to_string());
    let argv = std::iter::once(program).chain(normalize_args(args));

    match CliArgs::try_parse_from(argv) {
        Ok(cli) => Ok(CliOutcome::Options(Box::new(cli))),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Ok(CliOutcome::Help(e.render().to_string()))
            }
            _ => Err(ConfigSourceError::Flag {
                message: e.render().to_string(),
                usage: CliArgs::usage(),
            }),
        },
    }
}
