use aes_gcm::aead::OsRng;
use aes_gcm::aead::rand_core::RngCore;
use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Generate a random 256-bit key for AES-256-GCM.
pub fn generate_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

/// Encode a key to base64, the form it takes in `PARLEY_MESSAGE_KEY`.
pub fn key_to_base64(key: &[u8; 32]) -> String {
    BASE64.encode(key)
}

/// Decode a base64 key. Surrounding whitespace and quotes are ignored, since
/// keys are usually pasted into .env files.
pub fn key_from_base64(encoded: &str) -> Result<[u8; 32]> {
    let cleaned = encoded.trim().trim_matches(|c| c == '\'' || c == '"');
    let bytes = BASE64.decode(cleaned)?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("Invalid key length"))?;
    Ok(key)
}
