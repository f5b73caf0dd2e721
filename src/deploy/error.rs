use crate::credentials::CredentialError;
use crate::remote::TransportError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Remote steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeployStep {
    Connect,
    CreateRemoteDir,
    Transfer,
    StartCommand,
}

impl fmt::Display for DeployStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployStep::Connect => "connect",
            DeployStep::CreateRemoteDir => "create remote directory",
            DeployStep::Transfer => "transfer",
            DeployStep::StartCommand => "start command",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("File {filename} not found under {}", .root.display())]
    NotFound { filename: String, root: PathBuf },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A forwarded variable with no value under the deploy prefix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Forwarded variable {name} is not set (expected {variable})")]
pub struct EnvMaterializationError {
    pub name: String,
    pub variable: String,
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Compose file discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Environment materialization failed: {0}")]
    Env(#[from] EnvMaterializationError),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Authentication setup failed: {0}")]
    Auth(#[source] CredentialError),

    #[error("Failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: TransportError,
    },

    #[error("Remote channel failed during {step}: {source}")]
    Channel {
        step: DeployStep,
        #[source]
        source: TransportError,
    },

    #[error("Failed to transfer {file}: {source}")]
    Transfer {
        file: String,
        #[source]
        source: TransportError,
    },

    #[error("Remote command failed during {step} ({}): {command}", status_text(.status))]
    RemoteCommand {
        step: DeployStep,
        command: String,
        status: Option<i32>,
        output: String,
    },
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl DeployError {
    /// Remote step the error happened in. `None` for local preparation errors.
    pub fn step(&self) -> Option<DeployStep> {
        match self {
            DeployError::Discovery(_) | DeployError::Env(_) | DeployError::Io { .. } => None,
            DeployError::Auth(_) | DeployError::Connect { .. } => Some(DeployStep::Connect),
            DeployError::Channel { step, .. } | DeployError::RemoteCommand { step, .. } => {
                Some(*step)
            }
            DeployError::Transfer { .. } => Some(DeployStep::Transfer),
        }
    }

    /// Output captured from the remote side, if any.
    pub fn remote_output(&self) -> Option<&str> {
        match self {
            DeployError::RemoteCommand { output, .. } if !output.trim().is_empty() => {
                Some(output)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
