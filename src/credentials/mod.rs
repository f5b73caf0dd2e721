//! RSA private key credential and its transportable text form.
//!
//! A [`Credential`] is stored and exchanged as a base64-encoded PEM block
//! (`RSA PRIVATE KEY`, PKCS#1). Converting a credential into something the SSH
//! transport can authenticate with lives in [`crate::remote::auth`], keeping this
//! module free of transport concerns.

pub mod error;
pub mod key;

pub use error::CredentialError;
pub use key::{Credential, PEM_LABEL};
