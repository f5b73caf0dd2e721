use crate::deploy::error::{DeployError, DeployStep, Result};
use crate::remote::{to_auth_method, Session, Transport};
use crate::types::*;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

/// Runs a [`DeploymentPlan`] against one host:
/// connect, create the remote directory, transfer every file, start the app.
///
/// There are no retries. The first failing step aborts the rest, and the
/// session is closed whether or not the steps succeeded.
pub struct Deployer<T: Transport> {
    transport: T,
}

impl<T: Transport> Deployer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn deploy(&self, plan: &DeploymentPlan) -> Result<DeploymentReport> {
        let started_at = Utc::now();
        info!("Deploying {} to {}", plan.name, plan.target);

        let auth = to_auth_method(&plan.credential).map_err(DeployError::Auth)?;
        let mut session = self
            .transport
            .connect(&plan.target, &auth)
            .await
            .map_err(|source| DeployError::Connect {
                host: plan.target.to_string(),
                source,
            })?;
        info!("Connected to {}", plan.target);

        let result = self.run_steps(session.as_ref(), plan).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close connection to {}: {}", plan.target, e);
        }

        let (files, start_output) = result?;
        let report = DeploymentReport {
            deployment_name: plan.name.clone(),
            target: plan.target.to_string(),
            remote_dir: plan.remote_dir.clone(),
            files,
            start_output,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Deployed {} to {} in {}ms",
            report.deployment_name,
            report.target,
            report.duration().num_milliseconds()
        );
        Ok(report)
    }

    async fn run_steps(
        &self,
        session: &dyn Session,
        plan: &DeploymentPlan,
    ) -> Result<(Vec<TransferredFile>, String)> {
        info!("Creating remote directory {}", plan.remote_dir);
        self.run_checked(session, DeployStep::CreateRemoteDir, &plan.mkdir_command())
            .await?;

        let mut transferred = Vec::with_capacity(plan.files.len());
        for file in &plan.files {
            transferred.push(self.transfer(session, plan, file).await?);
        }

        info!("Starting {}", plan.name);
        let output = self
            .run_checked(session, DeployStep::StartCommand, &plan.start_command)
            .await?;

        Ok((transferred, output))
    }

    async fn run_checked(
        &self,
        session: &dyn Session,
        step: DeployStep,
        command: &str,
    ) -> Result<String> {
        debug!("Executing remote command for {}: {}", step, command);

        let result = session
            .run(command)
            .await
            .map_err(|source| DeployError::Channel { step, source })?;

        if !result.success() {
            return Err(DeployError::RemoteCommand {
                step,
                command: command.to_string(),
                status: result.status,
                output: result.output,
            });
        }

        Ok(result.output)
    }

    async fn transfer(
        &self,
        session: &dyn Session,
        plan: &DeploymentPlan,
        file: &DeployFile,
    ) -> Result<TransferredFile> {
        let remote_path = plan.remote_path(&file.remote_name);
        let transfer_error = |source| DeployError::Transfer {
            file: file.remote_name.clone(),
            source,
        };

        info!("Transferring {} to {}", file.remote_name, remote_path);

        let mut copier = session.open_copier().await.map_err(transfer_error)?;
        let copied = copier
            .copy_file(&file.content, &remote_path, file.mode)
            .await;
        drop(copier);
        copied.map_err(transfer_error)?;

        let mut hasher = Sha256::new();
        hasher.update(&file.content);
        let sha256 = format!("{:x}", hasher.finalize());
        debug!("Transferred {} ({} bytes, sha256 {})", remote_path, file.content.len(), sha256);

        Ok(TransferredFile {
            remote_path,
            size: file.content.len() as u64,
            sha256,
        })
    }
}
