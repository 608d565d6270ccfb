//! Cryptographic primitives for the waypoint secure channel.
//!
//! Two independent keys are in play for any connection:
//!
//! - [`ClientPublicKey`]: the client's RSA public key, used exactly once
//!   during the handshake to wrap the session key.
//! - [`SessionKey`]: a fresh 256-bit AES-GCM key generated per connection,
//!   used for every subsequent framed packet in both directions.
//!
//! ```text
//! Client RSA public key (PEM)
//!        │
//!        ▼
//! ClientPublicKey::wrap(session_key.raw())  ──►  sent once, unframed
//!
//! SessionKey::seal(plaintext)  ──►  nonce || ciphertext || tag
//! SessionKey::open(sealed)     ──►  plaintext, or a hard error
//! ```
//!
//! # Security
//!
//! - RSA-OAEP/SHA-256 is used only to wrap the session key, never for bulk
//!   data; it is a one-shot operation per connection.
//! - AES-256-GCM nonces are drawn at random per message, never reused or
//!   derived from a counter. A single session is bounded by the lifetime of
//!   a TCP connection, keeping well clear of the ~2^32-message birthday
//!   bound for 96-bit nonces.
//! - Authentication failure on [`SessionKey::open`] is unconditionally a
//!   hard error; callers must close the connection rather than retry or
//!   fall back to any other behavior.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod keys;

pub use error::CryptoError;
pub use keys::{ClientPublicKey, NONCE_SIZE, SESSION_KEY_SIZE, SessionKey};
