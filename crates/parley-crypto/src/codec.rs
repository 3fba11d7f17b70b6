use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::encrypt;
use crate::keys::key_from_base64;

/// Reversible transform applied to message bodies at the store boundary.
pub trait TextCodec: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String>;
    fn decrypt(&self, stored: &str) -> Result<String>;
}

/// Stores text as-is. Used when no message key is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec;

impl TextCodec for PlainCodec {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, stored: &str) -> Result<String> {
        Ok(stored.to_string())
    }
}

/// AES-256-GCM codec. Output is base64(nonce || ciphertext).
#[derive(Clone)]
pub struct AesGcmCodec {
    key: [u8; 32],
}

impl AesGcmCodec {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        Ok(Self::new(key_from_base64(encoded)?))
    }
}

impl std::fmt::Debug for AesGcmCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCodec").finish_non_exhaustive()
    }
}

impl TextCodec for AesGcmCodec {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let sealed = encrypt::seal(&self.key, plaintext.as_bytes())?;
        Ok(BASE64.encode(sealed))
    }

    fn decrypt(&self, stored: &str) -> Result<String> {
        let sealed = BASE64.decode(stored)?;
        let plaintext = encrypt::open(&self.key, &sealed)?;
        String::from_utf8(plaintext).map_err(|e| anyhow!("Decrypted body is not UTF-8: {}", e))
    }
}
