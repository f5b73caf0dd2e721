use crate::credentials::CredentialError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pem::{EncodeConfig, LineEnding, Pem};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Label of the PEM block wrapping the PKCS#1 key bytes.
pub const PEM_LABEL: &str = "RSA PRIVATE KEY";

/// An RSA private key, or the absence of one.
///
/// The empty credential is a legitimate value: it encodes to a PEM block with no
/// payload and decodes back to "no key".
#[derive(Clone, Default)]
pub struct Credential {
    material: Option<KeyMaterial>,
}

#[derive(Clone)]
struct KeyMaterial {
    key: RsaPrivateKey,
    der: Zeroizing<Vec<u8>>,
}

impl Credential {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_key(key: RsaPrivateKey) -> Result<Self, CredentialError> {
        let document = key
            .to_pkcs1_der()
            .map_err(|e| CredentialError::InvalidKey {
                reason: e.to_string(),
            })?;
        let der = Zeroizing::new(document.as_bytes().to_vec());

        Ok(Self {
            material: Some(KeyMaterial { key, der }),
        })
    }

    /// Generate a fresh key of the given modulus size.
    pub fn generate(bits: usize) -> Result<Self, CredentialError> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|e| {
            CredentialError::Generation {
                reason: e.to_string(),
            }
        })?;
        Self::from_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.material.is_none()
    }

    pub fn private_key(&self) -> Option<&RsaPrivateKey> {
        self.material.as_ref().map(|m| &m.key)
    }

    /// Modulus size in bits, if a key is present.
    pub fn bits(&self) -> Option<usize> {
        self.private_key().map(|key| key.size() * 8)
    }

    /// The PEM block (LF line endings) holding the PKCS#1 key bytes.
    pub fn to_pem(&self) -> Zeroizing<String> {
        let contents = self
            .material
            .as_ref()
            .map(|m| m.der.to_vec())
            .unwrap_or_default();
        let block = Pem::new(PEM_LABEL, contents);

        Zeroizing::new(pem::encode_config(
            &block,
            EncodeConfig::new().set_line_ending(LineEnding::LF),
        ))
    }

    /// Encode as base64 of the PEM block. Never fails, even without a key.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_pem().as_bytes())
    }

    pub fn decode(text: &str) -> Result<Self, CredentialError> {
        let decoded = Zeroizing::new(STANDARD.decode(text.trim())?);
        let block = pem::parse(decoded.as_slice())?;

        if block.tag() != PEM_LABEL {
            return Err(CredentialError::UnexpectedLabel {
                label: block.tag().to_string(),
            });
        }

        if block.contents().is_empty() {
            return Ok(Self::empty());
        }

        let key = RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| {
            CredentialError::InvalidKey {
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            material: Some(KeyMaterial {
                key,
                der: Zeroizing::new(block.contents().to_vec()),
            }),
        })
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        match (&self.material, &other.material) {
            (None, None) => true,
            (Some(a), Some(b)) => a.der.as_slice() == b.der.as_slice(),
            _ => false,
        }
    }
}

impl Eq for Credential {}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits() {
            Some(bits) => write!(f, "Credential(rsa-{bits}, <redacted>)"),
            None => f.write_str("Credential(empty)"),
        }
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Credential {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = Zeroizing::new(String::deserialize(deserializer)?);
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        Self::decode(&text).map_err(serde::de::Error::custom)
    }
}
