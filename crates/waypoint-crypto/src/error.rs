//! Cryptographic error types.

use thiserror::Error;

/// Errors from the secure channel's cryptographic primitives.
///
/// Every variant here is fatal to the connection: there is no recoverable
/// path once a PEM fails to parse, a wrap fails, or an AEAD tag fails to
/// verify.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The PEM block was missing, had the wrong label, or did not contain
    /// valid PKCS#1 DER.
    #[error("invalid RSA public key PEM: {0}")]
    InvalidPublicKey(String),

    /// RSA-OAEP encryption of the session key failed.
    #[error("failed to wrap session key: {0}")]
    Wrap(String),

    /// AES-256-GCM encryption failed (only possible via misuse, never from
    /// untrusted input).
    #[error("failed to seal message: {0}")]
    Seal(String),

    /// AES-256-GCM decryption failed: either the buffer was too short to
    /// contain a nonce, or the authentication tag did not verify.
    #[error("failed to open message: {0}")]
    Open(String),

    /// A sealed buffer was shorter than the nonce size and could not
    /// possibly contain a valid message.
    #[error("sealed buffer too short: need at least {need} bytes, got {got}")]
    BufferTooShort {
        /// Minimum buffer length (the nonce size).
        need: usize,
        /// Bytes available.
        got: usize,
    },
}
