//! RSA session-key wrapping and AES-256-GCM per-message sealing.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng as AesOsRng},
};
use rand::rngs::OsRng;
use rsa::{Oaep, RsaPublicKey, pkcs1::DecodeRsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// AES-GCM nonce length in bytes (the algorithm's default, 96 bits).
pub const NONCE_SIZE: usize = 12;

/// Size of a session key, in bytes.
pub const SESSION_KEY_SIZE: usize = 32;

/// An RSA public key supplied by the client during the handshake.
///
/// Parsed from PKCS#1 DER wrapped in a PEM block labeled `RSA PUBLIC KEY`.
/// Used exactly once per connection, to wrap the freshly generated
/// [`SessionKey`].
pub struct ClientPublicKey {
    key: RsaPublicKey,
}

impl ClientPublicKey {
    /// Parse a client public key from PEM bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the PEM label is not
    /// `RSA PUBLIC KEY` or the DER payload does not decode as a PKCS#1 RSA
    /// public key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, CryptoError> {
        let text = std::str::from_utf8(pem)
            .map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))?;

        let key = RsaPublicKey::from_pkcs1_pem(text)
            .map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))?;

        Ok(Self { key })
    }

    /// Wrap `data` with RSA-OAEP/SHA-256, empty label.
    ///
    /// Used to wrap the session key during the handshake; the caller writes
    /// the returned bytes to the socket directly, without frame-length
    /// prefixing (see the secure channel's handshake asymmetry note).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Wrap`] if the underlying RSA-OAEP encryption
    /// fails (for example, if `data` exceeds the key's maximum message size).
    pub fn wrap(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let padding = Oaep::new::<Sha256>();

        self.key
            .encrypt(&mut OsRng, padding, data)
            .map_err(|err| CryptoError::Wrap(err.to_string()))
    }
}

/// A per-connection AES-256-GCM session key.
///
/// Generated fresh for every TCP connection during the handshake and never
/// persisted or rotated. Dropped (and zeroized) when the connection closes.
pub struct SessionKey {
    cipher: Aes256Gcm,
    raw: [u8; SESSION_KEY_SIZE],
}

impl SessionKey {
    /// Generate a fresh random session key from a cryptographically secure
    /// source.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut AesOsRng);
        let mut raw = [0u8; SESSION_KEY_SIZE];
        raw.copy_from_slice(key.as_slice());

        Self { cipher: Aes256Gcm::new(&key), raw }
    }

    /// The raw 32-byte key, as wrapped and sent to the client during the
    /// handshake.
    #[must_use]
    pub fn raw(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.raw
    }

    /// Reconstruct a session key from its raw bytes (client side of the
    /// handshake, and test fixtures).
    #[must_use]
    pub fn from_raw(raw: [u8; SESSION_KEY_SIZE]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&raw);
        Self { cipher: Aes256Gcm::new(key), raw }
    }

    /// Seal `plaintext`, returning `nonce || ciphertext || tag`.
    ///
    /// A fresh random nonce is drawn for every call and prepended to the
    /// output.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Seal`] if the underlying AEAD encryption fails.
    /// This cannot happen from untrusted input; it would indicate a
    /// misconfigured cipher.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut AesOsRng);

        let mut sealed = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|err| CryptoError::Seal(err.to_string()))?;

        let mut out = nonce.to_vec();
        out.append(&mut sealed);
        Ok(out)
    }

    /// Open a buffer produced by [`SessionKey::seal`].
    ///
    /// The first [`NONCE_SIZE`] bytes are taken as the nonce; the remainder
    /// is ciphertext plus authentication tag.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::BufferTooShort`] if `sealed` is shorter than
    ///   [`NONCE_SIZE`].
    /// - [`CryptoError::Open`] if the authentication tag does not verify.
    ///   This is a hard error: the caller must terminate the connection.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_SIZE {
            return Err(CryptoError::BufferTooShort { need: NONCE_SIZE, got: sealed.len() });
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher.decrypt(nonce, ciphertext).map_err(|err| CryptoError::Open(err.to_string()))
    }
}

impl Drop for SessionKey {
    fn drop(&mut self) {
        self.raw.zeroize();
    }
}
