use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("SSH client not found: {0}")]
    ClientNotFound(#[from] which::Error),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Connection to {host} failed: {output}")]
    ConnectFailed { host: String, output: String },

    #[error("Connection to {host} timed out after {seconds}s")]
    Timeout { host: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote copy rejected: {message}")]
    CopyRejected { message: String },

    #[error("Unexpected scp response byte {0:#04x}")]
    Protocol(u8),

    #[error("Remote channel closed unexpectedly")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
