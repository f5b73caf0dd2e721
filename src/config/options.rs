use crate::config::error::ValidationError;
use crate::credentials::Credential;
use crate::deploy::naming;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

pub const DEFAULT_CHANNEL: &str = "beta";
pub const DEFAULT_PATH: &str = ".";

/// Deployment options as gathered from one or more sources.
///
/// Every field is optional: `None` means "unset, inherit from a
/// lower-precedence source". Loaders normalise empty strings, empty lists and
/// key-less credentials to `None`, so an explicit `debug: Some(false)` is the
/// only falsy value that survives a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployOptions {
    /// Registry hosting the image, e.g. `ghcr.io`.
    #[serde(alias = "Registry", skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Image name, also the identity the deployment is named after.
    #[serde(alias = "Image", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(alias = "Digest", skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    #[serde(
        alias = "Server",
        deserialize_with = "deserialize_server",
        skip_serializing_if = "Option::is_none"
    )]
    pub server: Option<IpAddr>,

    #[serde(alias = "Username", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Base directory on the server under which each deployment gets a folder.
    #[serde(alias = "RootDir", skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    #[serde(alias = "PrivateKey", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Credential>,

    #[serde(alias = "Channel", skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Local directory searched for the compose file.
    #[serde(alias = "Path", skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Names of local variables forwarded into the remote `.env`.
    #[serde(alias = "EnvVars", skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<String>>,

    #[serde(alias = "Debug", skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

/// Options that passed [`DeployOptions::verify`]. Immutable for the rest of the run.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedOptions {
    pub registry: Option<String>,
    pub image: String,
    pub digest: String,
    pub server: IpAddr,
    pub username: String,
    pub root_dir: String,
    pub private_key: Credential,
    pub channel: String,
    pub path: PathBuf,
    pub env_vars: Vec<String>,
    pub debug: bool,
}

// Blank addresses in config files mean unset rather than malformed.
fn deserialize_server<'de, D>(deserializer: D) -> Result<Option<IpAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(address) => address.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(other);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl DeployOptions {
    /// Baseline applied after every real source has been merged.
    pub fn defaults() -> Self {
        Self {
            channel: Some(DEFAULT_CHANNEL.to_string()),
            path: Some(PathBuf::from(DEFAULT_PATH)),
            debug: Some(false),
            ..Default::default()
        }
    }

    /// Fill every unset field from `other`. Set fields are never overwritten.
    pub fn merge(&mut self, other: &DeployOptions) {
        fill(&mut self.registry, &other.registry);
        fill(&mut self.image, &other.image);
        fill(&mut self.digest, &other.digest);
        fill(&mut self.server, &other.server);
        fill(&mut self.username, &other.username);
        fill(&mut self.root_dir, &other.root_dir);
        fill(&mut self.private_key, &other.private_key);
        fill(&mut self.channel, &other.channel);
        fill(&mut self.path, &other.path);
        fill(&mut self.env_vars, &other.env_vars);
        fill(&mut self.debug, &other.debug);
    }

    pub fn merge_defaults(&mut self) {
        self.merge(&Self::defaults());
    }

    /// Collapse empty values into `None`.
    pub fn normalized(self) -> Self {
        Self {
            registry: non_empty(self.registry),
            image: non_empty(self.image),
            digest: non_empty(self.digest),
            server: self.server,
            username: non_empty(self.username),
            root_dir: non_empty(self.root_dir),
            private_key: self.private_key.filter(|key| !key.is_empty()),
            channel: non_empty(self.channel),
            path: self.path.filter(|p| !p.as_os_str().is_empty()),
            env_vars: self
                .env_vars
                .map(|vars| {
                    vars.into_iter()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                        .collect::<Vec<_>>()
                })
                .filter(|vars| !vars.is_empty()),
            debug: self.debug,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Report every required option that is still unset.
    pub fn verify(&self) -> Result<(), ValidationError> {
        let required = [
            ("image", self.image.is_some()),
            ("digest", self.digest.is_some()),
            ("server", self.server.is_some()),
            ("username", self.username.is_some()),
            ("root_dir", self.root_dir.is_some()),
            ("private_key", self.private_key.is_some()),
            ("channel", self.channel.is_some()),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }

    pub fn into_verified(self) -> Result<VerifiedOptions, ValidationError> {
        self.verify()?;

        let required = |name: &'static str| ValidationError {
            missing: vec![name],
        };
        Ok(VerifiedOptions {
            image: self.image.ok_or_else(|| required("image"))?,
            digest: self.digest.ok_or_else(|| required("digest"))?,
            server: self.server.ok_or_else(|| required("server"))?,
            username: self.username.ok_or_else(|| required("username"))?,
            root_dir: self.root_dir.ok_or_else(|| required("root_dir"))?,
            private_key: self.private_key.ok_or_else(|| required("private_key"))?,
            channel: self.channel.ok_or_else(|| required("channel"))?,
            registry: self.registry,
            path: self.path.unwrap_or_else(|| PathBuf::from(DEFAULT_PATH)),
            env_vars: self.env_vars.unwrap_or_default(),
            debug: self.debug.unwrap_or(false),
        })
    }
}

impl VerifiedOptions {
    pub fn deployment_name(&self) -> String {
        naming::deployment_name(&self.image, &self.channel)
    }

    pub fn image_specifier(&self) -> String {
        naming::image_specifier(self.registry.as_deref(), &self.image, &self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn populated() -> DeployOptions {
        DeployOptions {
            registry: Some("ghcr.io".to_string()),
            image: Some("user/app".to_string()),
            digest: Some("sha256:abc".to_string()),
            server: Some(IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))),
            username: Some("deploy".to_string()),
            root_dir: Some("/srv".to_string()),
            private_key: Some(Credential::empty()),
            channel: Some("beta".to_string()),
            path: Some(PathBuf::from("app")),
            env_vars: Some(vec!["foo".to_string(), "bar".to_string()]),
            debug: Some(true),
        }
    }

    #[test]
    fn test_merge_only_fills_unset_fields() {
        let mut high = DeployOptions {
            username: Some("alice".to_string()),
            debug: Some(false),
            ..Default::default()
        };
        let low = populated();

        high.merge(&low);

        assert_eq!(high.username.as_deref(), Some("alice"));
        assert_eq!(high.debug, Some(false));
        assert_eq!(high.image, low.image);
        assert_eq!(high.root_dir, low.root_dir);
        assert_eq!(high.env_vars, low.env_vars);
    }

    #[test]
    fn test_merge_defaults_is_idempotent() {
        let mut once = DeployOptions::default();
        once.merge_defaults();
        let mut twice = once.clone();
        twice.merge_defaults();

        assert_eq!(once, twice);
        assert_eq!(once.channel.as_deref(), Some(DEFAULT_CHANNEL));
        assert_eq!(once.debug, Some(false));
    }

    #[test]
    fn test_defaults_do_not_override_sources() {
        let mut options = DeployOptions {
            channel: Some("stable".to_string()),
            debug: Some(true),
            ..Default::default()
        };
        options.merge_defaults();

        assert_eq!(options.channel.as_deref(), Some("stable"));
        assert_eq!(options.debug, Some(true));
    }

    #[test]
    fn test_verify_accepts_populated_options() {
        assert!(populated().verify().is_ok());
    }

    #[test]
    fn test_verify_reports_all_missing_fields() {
        let error = DeployOptions::default().verify().unwrap_err();
        assert_eq!(
            error.missing,
            vec![
                "image",
                "digest",
                "server",
                "username",
                "root_dir",
                "private_key",
                "channel"
            ]
        );
        assert!(error.to_string().starts_with("Missing required options: image, digest"));
    }

    #[test]
    fn test_verify_names_exactly_the_removed_field() {
        let cases: Vec<(&str, fn(&mut DeployOptions))> = vec![
            ("image", |o: &mut DeployOptions| o.image = None),
            ("digest", |o: &mut DeployOptions| o.digest = None),
            ("server", |o: &mut DeployOptions| o.server = None),
            ("username", |o: &mut DeployOptions| o.username = None),
            ("root_dir", |o: &mut DeployOptions| o.root_dir = None),
            ("private_key", |o: &mut DeployOptions| o.private_key = None),
            ("channel", |o: &mut DeployOptions| o.channel = None),
        ];

        for (name, remove) in cases {
            let mut options = populated();
            remove(&mut options);
            let error = options.verify().unwrap_err();
            assert_eq!(error.missing, vec![name]);
        }
    }

    #[test]
    fn test_into_verified_rejects_incomplete_options() {
        let mut options = populated();
        options.server = None;
        options.channel = None;
        assert_eq!(
            options.into_verified().unwrap_err().missing,
            vec!["server", "channel"]
        );

        let error = DeployOptions::default().into_verified().unwrap_err();
        assert_eq!(error.missing.len(), 7);
    }

    #[test]
    fn test_optional_fields_are_not_required() {
        let mut options = populated();
        options.registry = None;
        options.path = None;
        options.env_vars = None;
        options.debug = None;

        let verified = options.into_verified().unwrap();
        assert_eq!(verified.path, PathBuf::from(DEFAULT_PATH));
        assert!(verified.env_vars.is_empty());
        assert!(!verified.debug);
    }

    #[test]
    fn test_normalized_collapses_empty_values() {
        let options = DeployOptions {
            registry: Some(String::new()),
            image: Some("app".to_string()),
            private_key: Some(Credential::empty()),
            path: Some(PathBuf::new()),
            env_vars: Some(vec![String::new(), " ".to_string()]),
            debug: Some(false),
            ..Default::default()
        }
        .normalized();

        assert_eq!(options.registry, None);
        assert_eq!(options.image.as_deref(), Some("app"));
        assert_eq!(options.private_key, None);
        assert_eq!(options.path, None);
        assert_eq!(options.env_vars, None);
        assert_eq!(options.debug, Some(false));
    }

    #[test]
    fn test_verified_naming_helpers() {
        let verified = populated().into_verified().unwrap();
        assert_eq!(verified.deployment_name(), "user-app-beta");
        assert_eq!(verified.image_specifier(), "ghcr.io/user/app@sha256:abc");
    }
}
