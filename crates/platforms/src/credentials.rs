//! Encrypted credential storage.
//!
//! Secrets are stored as `hex(iv):hex(ciphertext)`, AES-256-CBC with PKCS#7
//! padding. The key comes from `CMS_ENCRYPTION_KEY` and is either 64 hex
//! characters or a raw 32-byte string.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use std::env;

use crate::error::CredentialError;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

pub const KEY_ENV: &str = "CMS_ENCRYPTION_KEY";

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Parse a key given as 64 hex characters or 32 raw bytes.
pub fn parse_key(raw: &str) -> Result<[u8; KEY_LEN], CredentialError> {
    let raw = raw.trim();
    let bytes = if raw.len() == KEY_LEN * 2 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
        hex::decode(raw).map_err(|e| CredentialError::InvalidKey(e.to_string()))?
    } else {
        raw.as_bytes().to_vec()
    };

    bytes.try_into().map_err(|bytes: Vec<u8>| {
        CredentialError::InvalidKey(format!(
            "expected 32 bytes or 64 hex characters, got {} bytes",
            bytes.len()
        ))
    })
}

/// Key from `CMS_ENCRYPTION_KEY`.
pub fn key_from_env() -> Result<[u8; KEY_LEN], CredentialError> {
    let raw = env::var(KEY_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(CredentialError::MissingKey)?;
    parse_key(&raw)
}

/// Encrypt with a fresh random IV.
pub fn encrypt(plaintext: &str, key: &[u8; KEY_LEN]) -> String {
    let iv: [u8; IV_LEN] = rand::random();
    let ciphertext =
        Encryptor::new(key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
}

pub fn decrypt(stored: &str, key: &[u8; KEY_LEN]) -> Result<String, CredentialError> {
    let (iv_hex, ct_hex) = stored
        .trim()
        .split_once(':')
        .ok_or_else(|| CredentialError::Malformed("expected iv:ciphertext".to_string()))?;

    let iv: [u8; IV_LEN] = hex::decode(iv_hex)
        .map_err(|e| CredentialError::Malformed(format!("iv: {e}")))?
        .try_into()
        .map_err(|_| CredentialError::Malformed("iv must be 16 bytes".to_string()))?;
    let ciphertext =
        hex::decode(ct_hex).map_err(|e| CredentialError::Malformed(format!("ciphertext: {e}")))?;

    let plaintext = Decryptor::new(key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CredentialError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| CredentialError::Decrypt)
}
