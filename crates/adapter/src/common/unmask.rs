//! Best-effort reversal of client-side email encryption.
//!
//! Some sites encrypt the email field in the browser (RSA-OAEP, SHA-256) and
//! submit the ciphertext as base64. The plaintext is only needed for the spam
//! check; the stored comment always keeps the submitted value.

use crate::error::ConfigurationError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::{pkcs8::DecodePrivateKey, Oaep, RsaPrivateKey};
use sha2::Sha256;
use thiserror::Error;

const MIN_CIPHERTEXT_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum UnmaskError {
    #[error("not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decryption failed: {0}")]
    Decrypt(#[from] rsa::Error),
    #[error("plaintext is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug)]
pub enum Unmasked {
    Unmasked(String),
    /// The original value. `reason` is set when decryption was attempted and failed.
    Unchanged {
        value: String,
        reason: Option<UnmaskError>,
    },
}

impl Unmasked {
    pub fn into_value(self) -> String {
        match self {
            Unmasked::Unmasked(value) | Unmasked::Unchanged { value, .. } => value,
        }
    }
}

pub struct EmailKey {
    key: RsaPrivateKey,
}

impl EmailKey {
    /// Accepts a PKCS#8 PEM block, or the bare base64 body of one.
    pub fn from_pem(pem: &str) -> Result<Self, ConfigurationError> {
        let body: String = pem
            .lines()
            .filter(|line| !line.trim_start().starts_with("-----"))
            .flat_map(|line| line.chars())
            .filter(|c| !c.is_whitespace())
            .collect();

        let der = STANDARD
            .decode(body)
            .map_err(|e| ConfigurationError::InvalidKey(e.to_string()))?;
        let key = RsaPrivateKey::from_pkcs8_der(&der)
            .map_err(|e| ConfigurationError::InvalidKey(e.to_string()))?;

        Ok(Self { key })
    }

    pub fn unmask(&self, value: &str) -> Unmasked {
        if !looks_encrypted(value) {
            return Unmasked::Unchanged {
                value: value.to_string(),
                reason: None,
            };
        }

        match self.decrypt(value) {
            Ok(plain) => Unmasked::Unmasked(plain),
            Err(e) => Unmasked::Unchanged {
                value: value.to_string(),
                reason: Some(e),
            },
        }
    }

    fn decrypt(&self, value: &str) -> Result<String, UnmaskError> {
        let ciphertext = STANDARD.decode(value)?;
        let plain = self.key.decrypt(Oaep::new::<Sha256>(), &ciphertext)?;
        Ok(String::from_utf8(plain)?)
    }
}

fn looks_encrypted(value: &str) -> bool {
    value.len() >= MIN_CIPHERTEXT_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}
