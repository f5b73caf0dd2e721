//! sad - simple app deployment
//!
//! Resolves deployment options from the command line, the environment and a
//! JSON config file, then ships a Docker Compose app to a single server over
//! SSH: create the deployment directory, upload `docker-compose.yml` and a
//! generated `.env`, and start the app with `docker-compose up -d`.

pub mod config;
pub mod credentials;
pub mod deploy;
pub mod remote;
pub mod types;

pub use config::{DeployOptions, VerifiedOptions};
pub use deploy::{DeployError, Deployer};
pub use types::*;
