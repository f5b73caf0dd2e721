use crate::config::{EnvSnapshot, VerifiedOptions};
use crate::deploy::discovery::{find_recursive, COMPOSE_FILE};
use crate::deploy::dotenv::materialize_env;
use crate::deploy::error::{DeployError, Result};
use crate::types::{quote_remote_path, DeployFile, DeploymentPlan, RemoteTarget};
use tracing::{debug, info};

pub const REMOTE_COMPOSE_FILE: &str = "docker-compose.yml";
pub const REMOTE_ENV_FILE: &str = ".env";
pub const COMPOSE_FILE_MODE: u32 = 0o644;
pub const ENV_FILE_MODE: u32 = 0o600;

/// Remote directory for a deployment: `<root_dir>/<name>`.
pub fn remote_dir(root_dir: &str, name: &str) -> String {
    format!("{}/{}", root_dir.trim_end_matches('/'), name)
}

pub fn start_command(remote_dir: &str) -> String {
    format!(
        "cd {} && docker-compose up -d",
        quote_remote_path(remote_dir)
    )
}

impl DeploymentPlan {
    /// Discover the compose file, materialize the env file and lay out the
    /// remote steps. Nothing touches the network here.
    pub fn prepare(
        options: &VerifiedOptions,
        snapshot: &EnvSnapshot,
        deploy_prefix: &str,
    ) -> Result<Self> {
        let name = options.deployment_name();
        let remote_dir = remote_dir(&options.root_dir, &name);

        let compose_path = find_recursive(&options.path, COMPOSE_FILE)?;
        let compose = std::fs::read(&compose_path).map_err(|source| DeployError::Io {
            path: compose_path.clone(),
            source,
        })?;
        debug!(
            "Using compose file {} ({} bytes)",
            compose_path.display(),
            compose.len()
        );

        let env = materialize_env(options, snapshot, deploy_prefix)?;
        debug!("Materialized {} environment variables", env.len());

        let plan = DeploymentPlan {
            target: RemoteTarget::new(options.server, options.username.clone()),
            credential: options.private_key.clone(),
            files: vec![
                DeployFile {
                    remote_name: REMOTE_COMPOSE_FILE.to_string(),
                    content: compose,
                    mode: COMPOSE_FILE_MODE,
                },
                DeployFile {
                    remote_name: REMOTE_ENV_FILE.to_string(),
                    content: env.render().into_bytes(),
                    mode: ENV_FILE_MODE,
                },
            ],
            start_command: start_command(&remote_dir),
            remote_dir,
            name,
        };

        info!(
            deployment = %plan.name,
            target = %plan.target,
            "Prepared deployment of {}",
            options.image_specifier()
        );
        Ok(plan)
    }
}
