use crate::remote::auth::AuthMethod;
use crate::remote::error::{Result, TransportError};
use crate::remote::scp;
use crate::remote::transport::{CommandOutput, Copier, Session, Transport};
use crate::types::{quote_remote_path, RemoteTarget};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Bound on establishing the master connection.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport backed by the system OpenSSH client.
///
/// `connect` starts a ControlMaster connection on a socket in a private
/// temporary directory. Commands and copies run as multiplexed sub-channels of
/// that connection, so authentication happens once per run.
#[derive(Debug, Clone)]
pub struct OpenSshTransport {
    program: Option<PathBuf>,
    dial_timeout: Duration,
}

impl Default for OpenSshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenSshTransport {
    pub fn new() -> Self {
        Self {
            program: None,
            dial_timeout: DIAL_TIMEOUT,
        }
    }

    /// Use a specific ssh binary instead of looking one up on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    fn program(&self) -> Result<PathBuf> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => Ok(which::which("ssh")?),
        }
    }
}

#[async_trait]
impl Transport for OpenSshTransport {
    async fn connect(&self, target: &RemoteTarget, auth: &AuthMethod) -> Result<Box<dyn Session>> {
        let program = self.program()?;
        let control_dir = tempfile::Builder::new().prefix("sad-ssh-").tempdir()?;
        let socket = control_dir.path().join("control.sock");
        let log = control_dir.path().join("master.log");

        warn!(
            "Host key verification is disabled for {}; any host key is accepted",
            target.host
        );
        info!("Opening SSH connection to {}", target);

        let mut cmd = Command::new(&program);
        cmd.arg("-M")
            .arg("-S")
            .arg(&socket)
            .arg("-f")
            .arg("-N")
            .arg("-E")
            .arg(&log)
            .arg("-p")
            .arg(target.port.to_string())
            .arg("-i")
            .arg(auth.identity_file())
            .args(connection_options(self.dial_timeout))
            .arg(target.destination())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        debug!("Executing: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

        // With -f the client forks into the background once authenticated,
        // so the foreground process exits as soon as the master is ready.
        let status = match tokio::time::timeout(self.dial_timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(TransportError::Timeout {
                    host: target.host.to_string(),
                    seconds: self.dial_timeout.as_secs(),
                });
            }
        };

        if !status.success() {
            let output = tokio::fs::read_to_string(&log).await.unwrap_or_default();
            return Err(TransportError::ConnectFailed {
                host: target.host.to_string(),
                output: output.trim().to_string(),
            });
        }

        debug!("Master connection ready at {}", socket.display());
        Ok(Box::new(OpenSshSession {
            program,
            socket,
            destination: target.destination(),
            control_dir: Some(control_dir),
        }))
    }
}

fn connection_options(dial_timeout: Duration) -> Vec<String> {
    [
        "BatchMode=yes".to_string(),
        "IdentitiesOnly=yes".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "LogLevel=ERROR".to_string(),
        format!("ConnectTimeout={}", dial_timeout.as_secs().max(1)),
    ]
    .into_iter()
    .flat_map(|option| ["-o".to_string(), option])
    .collect()
}

/// Sub-channel command on an existing master connection.
fn mux_command(program: &Path, socket: &Path, destination: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.arg("-S")
        .arg(socket)
        .arg("-o")
        .arg("ControlMaster=no")
        .arg("-o")
        .arg("BatchMode=yes")
        .arg(destination)
        .kill_on_drop(true);
    cmd
}

pub struct OpenSshSession {
    program: PathBuf,
    socket: PathBuf,
    destination: String,
    control_dir: Option<TempDir>,
}

impl OpenSshSession {
    fn is_closed(&self) -> bool {
        self.control_dir.is_none()
    }
}

#[async_trait]
impl Session for OpenSshSession {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        debug!("Running remote command: {}", command);

        let output = mux_command(&self.program, &self.socket, &self.destination)
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            output: combined,
            status: output.status.code(),
        })
    }

    async fn open_copier(&self) -> Result<Box<dyn Copier>> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(Box::new(OpenSshCopier {
            program: self.program.clone(),
            socket: self.socket.clone(),
            destination: self.destination.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }

        let status = Command::new(&self.program)
            .arg("-S")
            .arg(&self.socket)
            .arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        self.control_dir = None;
        match status {
            Ok(status) if !status.success() => {
                debug!("Master connection already gone ({})", status);
                Ok(())
            }
            Ok(_) => {
                debug!("Closed connection to {}", self.destination);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for OpenSshSession {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        // Must wait for `-O exit`: the control directory holding the socket
        // is removed once this returns, and the master is only reachable
        // through that socket.
        let _ = std::process::Command::new(&self.program)
            .arg("-S")
            .arg(&self.socket)
            .arg("-O")
            .arg("exit")
            .arg(&self.destination)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

/// Copies files with `scp -t` over a fresh sub-channel per file.
pub struct OpenSshCopier {
    program: PathBuf,
    socket: PathBuf,
    destination: String,
}

#[async_trait]
impl Copier for OpenSshCopier {
    async fn copy_file(&mut self, content: &[u8], remote_path: &str, mode: u32) -> Result<()> {
        let name = Path::new(remote_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| remote_path.to_string());
        let sink = format!("scp -t {}", quote_remote_path(remote_path));
        debug!("Copying {} bytes to {}", content.len(), remote_path);

        let mut child = mux_command(&self.program, &self.socket, &self.destination)
            .arg(&sink)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let (mut stdin, mut stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => return Err(TransportError::Closed),
        };

        scp::send_file(&mut stdout, &mut stdin, &name, content, mode).await?;
        drop(stdin);

        let status = child.wait().await?;
        if !status.success() {
            return Err(TransportError::CopyRejected {
                message: format!("scp sink exited with {status}"),
            });
        }
        Ok(())
    }
}
