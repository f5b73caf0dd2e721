//! Remote access: the narrow session interface the deployer drives, and an
//! implementation on top of the system OpenSSH client.

pub mod auth;
pub mod error;
pub mod openssh;
pub mod scp;
pub mod transport;

pub use auth::{to_auth_method, AuthMethod};
pub use error::TransportError;
pub use openssh::OpenSshTransport;
pub use transport::{CommandOutput, Copier, Session, Transport};
