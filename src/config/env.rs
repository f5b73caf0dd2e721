use crate::config::error::ConfigSourceError;
use crate::config::options::DeployOptions;
use crate::config::raw::RawOptions;
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_OPTION_PREFIX: &str = "SAD_";
pub const DEFAULT_DEPLOY_PREFIX: &str = "SAD_DEPLOY_";

/// Variable name suffixes read by [`load_env`], in option declaration order.
pub const OPTION_VARIABLES: [&str; 11] = [
    "REGISTRY",
    "IMAGE",
    "DIGEST",
    "SERVER",
    "USERNAME",
    "ROOT_DIR",
    "PRIVATE_KEY",
    "CHANNEL",
    "PATH",
    "ENV_VARS",
    "DEBUG",
];

/// Point-in-time copy of the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Variables that are not valid
    /// unicode are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `name`, treating an empty value as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// The two environment namespaces: one for options, one for values forwarded
/// into the deployed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvPrefixes {
    option: String,
    deploy: String,
}

impl EnvPrefixes {
    /// Rejects prefix pairs where an option variable would also be a forwarded
    /// variable.
    pub fn new(
        option: impl Into<String>,
        deploy: impl Into<String>,
    ) -> Result<Self, ConfigSourceError> {
        let option = option.into();
        let deploy = deploy.into();

        let collides = deploy.is_empty()
            || option == deploy
            || OPTION_VARIABLES
                .iter()
                .any(|field| format!("{option}{field}").starts_with(&deploy));

        if collides {
            return Err(ConfigSourceError::PrefixCollision {
                option_prefix: option,
                deploy_prefix: deploy,
            });
        }

        Ok(Self { option, deploy })
    }

    pub fn option(&self) -> &str {
        &self.option
    }

    pub fn deploy(&self) -> &str {
        &self.deploy
    }
}

impl Default for EnvPrefixes {
    fn default() -> Self {
        Self {
            option: DEFAULT_OPTION_PREFIX.to_string(),
            deploy: DEFAULT_DEPLOY_PREFIX.to_string(),
        }
    }
}

/// Read `<prefix><FIELD>` variables into partial options. Absent variables are
/// left unset.
pub fn load_env(snapshot: &EnvSnapshot, prefix: &str) -> Result<DeployOptions, ConfigSourceError> {
    let var = |field: &str| snapshot.get(&format!("{prefix}{field}")).map(str::to_string);

    let raw = RawOptions {
        registry: var("REGISTRY"),
        image: var("IMAGE"),
        digest: var("DIGEST"),
        server: var("SERVER"),
        username: var("USERNAME"),
        root_dir: var("ROOT_DIR"),
        private_key: var("PRIVATE_KEY"),
        channel: var("CHANNEL"),
        path: var("PATH"),
        env_vars: var("ENV_VARS"),
        debug: var("DEBUG"),
    };

    let options = raw
        .into_options()
        .map_err(|error| ConfigSourceError::Environment {
            variable: format!("{prefix}{}", error.field().to_uppercase()),
            error,
        })?;

    debug!(prefix, empty = options.is_empty(), "Loaded options from environment");
    Ok(options)
}
