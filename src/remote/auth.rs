use crate::credentials::{Credential, CredentialError};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Key-based authentication for the ssh client: the private key written to
/// an owner-only identity file that is removed when this value is dropped.
#[derive(Debug)]
pub struct AuthMethod {
    identity: NamedTempFile,
}

impl AuthMethod {
    pub fn identity_file(&self) -> &Path {
        self.identity.path()
    }
}

pub fn to_auth_method(credential: &Credential) -> Result<AuthMethod, CredentialError> {
    if credential.is_empty() {
        return Err(CredentialError::MissingKey);
    }

    // NamedTempFile is created with mode 0600 on unix
    let mut identity = tempfile::Builder::new()
        .prefix("sad-identity-")
        .tempfile()?;
    identity.write_all(credential.to_pem().as_bytes())?;
    identity.flush()?;

    debug!("Wrote identity file {}", identity.path().display());
    Ok(AuthMethod { identity })
}
