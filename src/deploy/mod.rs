pub mod deployer;
pub mod discovery;
pub mod dotenv;
pub mod error;
pub mod naming;
pub mod plan;

pub use deployer::Deployer;
pub use discovery::{find_recursive, COMPOSE_FILE};
pub use dotenv::{materialize_env, MaterializedEnv};
pub use error::*;
pub use naming::{deployment_name, image_specifier};
