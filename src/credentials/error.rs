use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Private key is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Failed to parse PEM block containing RSA private key: {0}")]
    MissingPemBlock(#[from] pem::PemError),

    #[error("Unexpected PEM block label {label:?}, expected \"RSA PRIVATE KEY\"")]
    UnexpectedLabel { label: String },

    #[error("Invalid PKCS#1 RSA private key: {reason}")]
    InvalidKey { reason: String },

    #[error("Failed to generate RSA private key: {reason}")]
    Generation { reason: String },

    #[error("No private key is set")]
    MissingKey,

    #[error("Failed to write SSH identity file: {0}")]
    IdentityFile(#[from] std::io::Error),
}
