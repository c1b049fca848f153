use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use argon2::{password_hash::rand_core::RngCore, Argon2};
use std::error::Error;
use std::fmt;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;

#[derive(Debug, PartialEq)]
pub enum CryptError {
    Encryption,
    Decryption,
    KeyDerivation,
}

impl fmt::Display for CryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptError::Encryption => write!(f, "encryption failed"),
            CryptError::Decryption => write!(f, "decryption failed, wrong key?"),
            CryptError::KeyDerivation => write!(f, "key derivation failed"),
        }
    }
}

impl Error for CryptError {}

impl From<CryptError> for crate::errors::Error {
    fn from(err: CryptError) -> crate::errors::Error {
        crate::errors::Error::crypt(&err.to_string())
    }
}

/// Derives a 32-byte key from a passphrase and salt using Argon2id.
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; 32], CryptError> {
    let mut key = [0u8; 32];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|_| CryptError::KeyDerivation)?;
    Ok(key)
}

/// Encrypts with XChaCha20Poly1305.
/// Output layout: salt (16 bytes) | nonce (24 bytes) | ciphertext.
pub fn encrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>, CryptError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let key_bytes = derive_key(passphrase, &salt)?;
    let cipher = XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(&key_bytes));
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher.encrypt(&nonce, data).map_err(|_| CryptError::Encryption)?;

    let mut result = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    result.extend_from_slice(&salt);
    result.extend_from_slice(&nonce);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

pub fn decrypt(encrypted: &[u8], passphrase: &str) -> Result<Vec<u8>, CryptError> {
    if encrypted.len() < SALT_LEN + NONCE_LEN {
        return Err(CryptError::Decryption);
    }
    let (salt, rest) = encrypted.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key_bytes = derive_key(passphrase, salt)?;
    let cipher = XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(&key_bytes));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptError::Decryption)
}
