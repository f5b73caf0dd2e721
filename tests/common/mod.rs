#![allow(dead_code)]

use once_cell::sync::Lazy;
use sad::config::DeployOptions;
use sad::credentials::Credential;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// Key generation is slow; share one key across a test binary.
pub static CREDENTIAL: Lazy<Credential> =
    Lazy::new(|| Credential::generate(1024).expect("Failed to generate test key"));

pub fn complete_options(path: &Path) -> DeployOptions {
    DeployOptions {
        registry: Some("ghcr.io".to_string()),
        image: Some("user/app".to_string()),
        digest: Some("sha256:abc".to_string()),
        server: Some(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))),
        username: Some("deploy".to_string()),
        root_dir: Some("/srv".to_string()),
        private_key: Some(CREDENTIAL.clone()),
        channel: Some("beta".to_string()),
        path: Some(path.to_path_buf()),
        env_vars: Some(vec!["TOKEN".to_string()]),
        debug: Some(false),
    }
}
