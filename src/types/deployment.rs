use crate::credentials::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub const SSH_PORT: u16 = 22;

/// Host and login the deployment is pushed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTarget {
    pub host: IpAddr,
    pub port: u16,
    pub username: String,
}

impl RemoteTarget {
    pub fn new(host: IpAddr, username: impl Into<String>) -> Self {
        Self {
            host,
            port: SSH_PORT,
            username: username.into(),
        }
    }

    /// `user@host`, as the ssh client expects it.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Display for RemoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.socket_addr())
    }
}

/// One file written into the remote deployment directory.
#[derive(Clone, PartialEq, Eq)]
pub struct DeployFile {
    pub remote_name: String,
    pub content: Vec<u8>,
    pub mode: u32,
}

impl fmt::Debug for DeployFile {
    // content may hold forwarded secrets
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployFile")
            .field("remote_name", &self.remote_name)
            .field("size", &self.content.len())
            .field("mode", &format_args!("{:04o}", self.mode))
            .finish()
    }
}

/// Everything the remote steps need, computed locally before connecting.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentPlan {
    pub name: String,
    pub target: RemoteTarget,
    pub credential: Credential,
    pub remote_dir: String,
    pub files: Vec<DeployFile>,
    pub start_command: String,
}

impl DeploymentPlan {
    pub fn remote_path(&self, remote_name: &str) -> String {
        format!("{}/{}", self.remote_dir, remote_name)
    }

    pub fn mkdir_command(&self) -> String {
        format!("mkdir -p {}", quote_remote_path(&self.remote_dir))
    }
}

/// Quote a path for the remote shell. A leading `~/` stays unquoted so the
/// remote shell still expands it to the login user's home directory.
pub fn quote_remote_path(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some("") => "~/".to_string(),
        Some(rest) => format!("~/{}", shell_words::quote(rest)),
        None if path == "~" => path.to_string(),
        None => shell_words::quote(path).into_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferredFile {
    pub remote_path: String,
    pub size: u64,
    pub sha256: String,
}

/// Outcome of a successful deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub deployment_name: String,
    pub target: String,
    pub remote_dir: String,
    pub files: Vec<TransferredFile>,
    pub start_output: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeploymentReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
