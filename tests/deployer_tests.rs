mod common;

use async_trait::async_trait;
use sad::config::EnvSnapshot;
use sad::credentials::Credential;
use sad::deploy::{DeployError, DeployStep, Deployer, COMPOSE_FILE};
use sad::remote::{AuthMethod, CommandOutput, Copier, Session, Transport, TransportError};
use sad::types::{DeploymentPlan, RemoteTarget};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Connect(String),
    Run(String),
    OpenCopier(usize),
    Copy { copier: usize, path: String, mode: u32 },
    ReleaseCopier(usize),
    Close,
}

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }
}

/// Behaviour knobs for the stub remote host.
#[derive(Clone, Default)]
struct Script {
    fail_connect: bool,
    mkdir_status: i32,
    fail_copy_at: Option<usize>,
    start_status: i32,
    start_output: String,
}

struct StubTransport {
    recorder: Recorder,
    script: Script,
}

struct StubSession {
    recorder: Recorder,
    script: Script,
    copiers: AtomicUsize,
}

struct StubCopier {
    id: usize,
    recorder: Recorder,
    fail: bool,
}

#[async_trait]
impl Transport for StubTransport {
    async fn connect(
        &self,
        target: &RemoteTarget,
        auth: &AuthMethod,
    ) -> Result<Box<dyn Session>, TransportError> {
        assert!(auth.identity_file().exists());
        self.recorder.push(Event::Connect(target.to_string()));

        if self.script.fail_connect {
            return Err(TransportError::ConnectFailed {
                host: target.host.to_string(),
                output: "Permission denied (publickey).".to_string(),
            });
        }

        Ok(Box::new(StubSession {
            recorder: self.recorder.clone(),
            script: self.script.clone(),
            copiers: AtomicUsize::new(0),
        }))
    }
}

#[async_trait]
impl Session for StubSession {
    async fn run(&self, command: &str) -> Result<CommandOutput, TransportError> {
        self.recorder.push(Event::Run(command.to_string()));

        if command.starts_with("mkdir") {
            Ok(CommandOutput {
                output: String::new(),
                status: Some(self.script.mkdir_status),
            })
        } else {
            Ok(CommandOutput {
                output: self.script.start_output.clone(),
                status: Some(self.script.start_status),
            })
        }
    }

    async fn open_copier(&self) -> Result<Box<dyn Copier>, TransportError> {
        let id = self.copiers.fetch_add(1, Ordering::SeqCst);
        self.recorder.push(Event::OpenCopier(id));

        Ok(Box::new(StubCopier {
            id,
            recorder: self.recorder.clone(),
            fail: self.script.fail_copy_at == Some(id),
        }))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.recorder.push(Event::Close);
        Ok(())
    }
}

#[async_trait]
impl Copier for StubCopier {
    async fn copy_file(
        &mut self,
        _content: &[u8],
        remote_path: &str,
        mode: u32,
    ) -> Result<(), TransportError> {
        self.recorder.push(Event::Copy {
            copier: self.id,
            path: remote_path.to_string(),
            mode,
        });

        if self.fail {
            return Err(TransportError::CopyRejected {
                message: "No space left on device".to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for StubCopier {
    fn drop(&mut self) {
        self.recorder.push(Event::ReleaseCopier(self.id));
    }
}

fn plan() -> (TempDir, DeploymentPlan) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("app")).unwrap();
    std::fs::write(dir.path().join("app").join(COMPOSE_FILE), "services: {}\n").unwrap();

    let options = common::complete_options(dir.path()).into_verified().unwrap();
    let snapshot = EnvSnapshot::from_pairs([("SAD_DEPLOY_TOKEN", "t0k3n")]);
    let plan = DeploymentPlan::prepare(&options, &snapshot, "SAD_DEPLOY_").unwrap();

    (dir, plan)
}

fn deployer(script: Script) -> (Recorder, Deployer<StubTransport>) {
    let recorder = Recorder::default();
    let transport = StubTransport {
        recorder: recorder.clone(),
        script,
    };
    (recorder, Deployer::new(transport))
}

fn is_start(event: &Event) -> bool {
    matches!(event, Event::Run(command) if command.contains("docker-compose up -d"))
}

#[tokio::test]
async fn test_steps_run_in_order() {
    let (_dir, plan) = plan();
    let (recorder, deployer) = deployer(Script {
        start_output: "Creating user-app-beta ... done\n".to_string(),
        ..Default::default()
    });

    let report = deployer.deploy(&plan).await.unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            Event::Connect("deploy@192.0.2.10:22".to_string()),
            Event::Run("mkdir -p /srv/user-app-beta".to_string()),
            Event::OpenCopier(0),
            Event::Copy {
                copier: 0,
                path: "/srv/user-app-beta/docker-compose.yml".to_string(),
                mode: 0o644,
            },
            Event::ReleaseCopier(0),
            Event::OpenCopier(1),
            Event::Copy {
                copier: 1,
                path: "/srv/user-app-beta/.env".to_string(),
                mode: 0o600,
            },
            Event::ReleaseCopier(1),
            Event::Run("cd /srv/user-app-beta && docker-compose up -d".to_string()),
            Event::Close,
        ]
    );

    assert_eq!(report.deployment_name, "user-app-beta");
    assert_eq!(report.remote_dir, "/srv/user-app-beta");
    assert_eq!(report.start_output, "Creating user-app-beta ... done\n");
    assert!(report.finished_at >= report.started_at);
    assert_eq!(report.files.len(), 2);
    assert_eq!(report.files[0].size, 13);
    assert_eq!(
        report.files[0].sha256,
        format!("{:x}", Sha256::digest(b"services: {}\n"))
    );
}

#[tokio::test]
async fn test_env_file_content() {
    let (_dir, plan) = plan();
    let env = String::from_utf8(plan.files[1].content.clone()).unwrap();

    assert_eq!(
        env,
        "CONTAINER_NAME=user-app-beta\nIMAGE=ghcr.io/user/app@sha256:abc\nTOKEN=t0k3n\n"
    );
}

#[tokio::test]
async fn test_transfer_failure_skips_start_and_releases_copiers() {
    let (_dir, plan) = plan();
    let (recorder, deployer) = deployer(Script {
        fail_copy_at: Some(1),
        ..Default::default()
    });

    let error = deployer.deploy(&plan).await.unwrap_err();

    match &error {
        DeployError::Transfer { file, source } => {
            assert_eq!(file, ".env");
            assert!(source.to_string().contains("No space left on device"));
        }
        other => panic!("Expected Transfer error, got {other:?}"),
    }
    assert_eq!(error.step(), Some(DeployStep::Transfer));

    assert_eq!(recorder.count(is_start), 0);
    let opened = recorder.count(|e| matches!(e, Event::OpenCopier(_)));
    let released = recorder.count(|e| matches!(e, Event::ReleaseCopier(_)));
    assert_eq!(opened, 2);
    assert_eq!(released, opened);
    assert_eq!(recorder.events().last(), Some(&Event::Close));
}

#[tokio::test]
async fn test_start_command_failure_carries_output() {
    let (_dir, plan) = plan();
    let (recorder, deployer) = deployer(Script {
        start_status: 1,
        start_output: "ERROR: no such image\n".to_string(),
        ..Default::default()
    });

    let error = deployer.deploy(&plan).await.unwrap_err();

    match &error {
        DeployError::RemoteCommand {
            step,
            command,
            status,
            ..
        } => {
            assert_eq!(*step, DeployStep::StartCommand);
            assert_eq!(command, "cd /srv/user-app-beta && docker-compose up -d");
            assert_eq!(*status, Some(1));
        }
        other => panic!("Expected RemoteCommand error, got {other:?}"),
    }
    assert_eq!(error.remote_output(), Some("ERROR: no such image\n"));
    assert!(error.to_string().contains("exit status 1"));
    assert_eq!(recorder.events().last(), Some(&Event::Close));
}

#[tokio::test]
async fn test_mkdir_failure_stops_before_transfer() {
    let (_dir, plan) = plan();
    let (recorder, deployer) = deployer(Script {
        mkdir_status: 1,
        ..Default::default()
    });

    let error = deployer.deploy(&plan).await.unwrap_err();

    assert_eq!(error.step(), Some(DeployStep::CreateRemoteDir));
    assert_eq!(recorder.count(|e| matches!(e, Event::OpenCopier(_))), 0);
    assert_eq!(recorder.count(is_start), 0);
    assert_eq!(recorder.count(|e| *e == Event::Close), 1);
}

#[tokio::test]
async fn test_connect_failure() {
    let (_dir, plan) = plan();
    let (recorder, deployer) = deployer(Script {
        fail_connect: true,
        ..Default::default()
    });

    let error = deployer.deploy(&plan).await.unwrap_err();

    assert!(matches!(error, DeployError::Connect { .. }));
    assert_eq!(error.step(), Some(DeployStep::Connect));
    assert!(error.to_string().contains("Permission denied"));
    assert_eq!(recorder.events().len(), 1);
}

#[tokio::test]
async fn test_plan_without_key_never_connects() {
    let (_dir, mut plan) = plan();
    plan.credential = Credential::empty();
    let (recorder, deployer) = deployer(Script::default());

    let error = deployer.deploy(&plan).await.unwrap_err();

    assert!(matches!(error, DeployError::Auth(_)));
    assert_eq!(error.step(), Some(DeployStep::Connect));
    assert!(recorder.events().is_empty());
}
