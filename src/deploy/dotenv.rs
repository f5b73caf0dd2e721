use crate::config::{EnvSnapshot, VerifiedOptions};
use crate::deploy::error::EnvMaterializationError;
use std::collections::BTreeMap;
use tracing::debug;

pub const CONTAINER_NAME_VAR: &str = "CONTAINER_NAME";
pub const IMAGE_VAR: &str = "IMAGE";

/// Variables written to the remote `.env` file, kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializedEnv {
    vars: BTreeMap<String, String>,
}

impl MaterializedEnv {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `NAME=VALUE` lines, each newline terminated, in name order.
    pub fn render(&self) -> String {
        self.vars
            .iter()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect()
    }
}

/// Resolve every forwarded variable from `<deploy_prefix><name>` and add the
/// synthesized `CONTAINER_NAME` and `IMAGE` entries, which take precedence over
/// forwarded variables of the same name.
pub fn materialize_env(
    options: &VerifiedOptions,
    snapshot: &EnvSnapshot,
    deploy_prefix: &str,
) -> Result<MaterializedEnv, EnvMaterializationError> {
    let mut vars = BTreeMap::new();

    for name in &options.env_vars {
        let variable = format!("{deploy_prefix}{name}");
        let value = snapshot
            .get(&variable)
            .ok_or_else(|| EnvMaterializationError {
                name: name.clone(),
                variable: variable.clone(),
            })?;
        debug!(%variable, "Forwarding variable {}", name);
        vars.insert(name.clone(), value.to_string());
    }

    vars.insert(CONTAINER_NAME_VAR.to_string(), options.deployment_name());
    vars.insert(IMAGE_VAR.to_string(), options.image_specifier());

    Ok(MaterializedEnv { vars })
}
