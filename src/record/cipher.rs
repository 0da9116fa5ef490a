//! Cipher Collaborator
//!
//! The encryption primitive is supplied by the embedding application; the
//! cache only decides when to call it.

use std::fmt;

use crate::error::Result;

/// Secret key handed to the cipher. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct DataKey(Vec<u8>);

impl DataKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey(<{} bytes redacted>)", self.0.len())
    }
}

// == Cipher Trait ==
/// Symmetric authenticated encryption.
///
/// `decrypt` must return `CacheError::Decryption` on any integrity failure.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], key: &DataKey) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8], key: &DataKey) -> Result<Vec<u8>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::CacheError;
    use sha2::{Digest, Sha256};

    /// XOR keystream with a SHA-256 tag. Test double only.
    pub struct TagCipher;

    fn tag(key: &DataKey, data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(data);
        hasher.finalize().into()
    }

    fn xor(data: &[u8], key: &DataKey) -> Vec<u8> {
        let k = key.as_bytes();
        data.iter()
            .enumerate()
            .map(|(i, b)| b ^ k[i % k.len()])
            .collect()
    }

    impl Cipher for TagCipher {
        fn encrypt(&self, plaintext: &[u8], key: &DataKey) -> Result<Vec<u8>> {
            let mut out = tag(key, plaintext).to_vec();
            out.extend(xor(plaintext, key));
            Ok(out)
        }

        fn decrypt(&self, ciphertext: &[u8], key: &DataKey) -> Result<Vec<u8>> {
            if ciphertext.len() < 32 {
                return Err(CacheError::Decryption("ciphertext too short".into()));
            }
            let (expected, body) = ciphertext.split_at(32);
            let plaintext = xor(body, key);
            if tag(key, &plaintext)[..] != expected[..] {
                return Err(CacheError::Decryption("authentication tag mismatch".into()));
            }
            Ok(plaintext)
        }
    }

    #[test]
    fn test_tag_cipher_detects_wrong_key() {
        let key = DataKey::new(b"alpha".to_vec());
        let sealed = TagCipher.encrypt(b"secret", &key).unwrap();
        assert_eq!(TagCipher.decrypt(&sealed, &key).unwrap(), b"secret");

        let other = DataKey::new(b"bravo".to_vec());
        assert!(matches!(
            TagCipher.decrypt(&sealed, &other),
            Err(CacheError::Decryption(_))
        ));
    }
}
