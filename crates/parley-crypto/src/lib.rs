/// Parley Crypto Library
///
/// At-rest protection for direct-message bodies. The server holds a single
/// AES-256-GCM key and seals each body before it reaches the database.
/// Stored form is base64(nonce || ciphertext).

pub mod codec;
pub mod encrypt;
pub mod keys;

pub use codec::{AesGcmCodec, PlainCodec, TextCodec};
