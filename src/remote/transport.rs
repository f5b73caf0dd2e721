use crate::remote::auth::AuthMethod;
use crate::remote::error::Result;
use crate::types::RemoteTarget;
use async_trait::async_trait;

/// Combined stdout and stderr of a remote command and its exit status.
/// `status` is `None` when the command was terminated by a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: String,
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Opens authenticated sessions to a remote host.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, target: &RemoteTarget, auth: &AuthMethod) -> Result<Box<dyn Session>>;
}

/// One authenticated connection. Every `run` and every copier uses its own
/// sub-channel on that connection.
#[async_trait]
pub trait Session: Send + Sync {
    async fn run(&self, command: &str) -> Result<CommandOutput>;

    /// The returned copier releases its sub-channel when dropped.
    async fn open_copier(&self) -> Result<Box<dyn Copier>>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait Copier: Send {
    async fn copy_file(&mut self, content: &[u8], remote_path: &str, mode: u32) -> Result<()>;
}
