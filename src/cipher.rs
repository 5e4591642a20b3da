//! Symmetric envelope for the store file.
//!
//! The envelope is base64(nonce || AES-256-GCM ciphertext). The key is the
//! SHA-256 digest of the configured passphrase.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::Engine;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("envelope is not valid base64")]
    Encoding,
    #[error("envelope is shorter than a nonce ({0} bytes)")]
    Truncated(usize),
    #[error("encryption failed")]
    Seal,
    #[error("decryption failed")]
    Open,
}

#[derive(Clone)]
pub struct VaultCipher {
    key: [u8; 32],
}

impl VaultCipher {
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self {
            key: Sha256::digest(passphrase.as_bytes()).into(),
        }
    }

    fn aead(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }

    /// Encrypt `plaintext` under a fresh nonce and return the text envelope.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .aead()
            .encrypt(&nonce, plaintext)
            .map_err(|_| CipherError::Seal)?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    pub fn open(&self, envelope: &str) -> Result<Vec<u8>, CipherError> {
        let combined = base64::engine::general_purpose::STANDARD
            .decode(envelope.trim())
            .map_err(|_| CipherError::Encoding)?;
        if combined.len() < NONCE_LEN {
            return Err(CipherError::Truncated(combined.len()));
        }
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        self.aead()
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Open)
    }
}

impl fmt::Debug for VaultCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultCipher").field("key", &"[redacted]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_then_open() {
        let cipher = VaultCipher::from_passphrase("correct horse");
        let envelope = cipher.seal(b"[{\"id\":\"1\"}]").unwrap();
        assert_eq!(cipher.open(&envelope).unwrap(), b"[{\"id\":\"1\"}]");
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let cipher = VaultCipher::from_passphrase("correct horse");
        let a = cipher.seal(b"same").unwrap();
        let b = cipher.seal(b"same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_tolerates_trailing_newline() {
        let cipher = VaultCipher::from_passphrase("k");
        let envelope = format!("{}\n", cipher.seal(b"x").unwrap());
        assert_eq!(cipher.open(&envelope).unwrap(), b"x");
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let envelope = VaultCipher::from_passphrase("one").seal(b"data").unwrap();
        let err = VaultCipher::from_passphrase("two").open(&envelope).unwrap_err();
        assert!(matches!(err, CipherError::Open));
    }

    #[test]
    fn test_malformed_envelopes() {
        let cipher = VaultCipher::from_passphrase("k");
        assert!(matches!(cipher.open("not base64!!"), Err(CipherError::Encoding)));
        assert!(matches!(cipher.open("AAAA"), Err(CipherError::Truncated(3))));
    }

    #[test]
    fn test_debug_hides_key() {
        let cipher = VaultCipher::from_passphrase("hunter2");
        let shown = format!("{cipher:?}");
        assert!(shown.contains("redacted"));
        assert!(!shown.contains("hunter2"));
    }
}
