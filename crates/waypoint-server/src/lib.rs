//! Waypoint telemetry archive server: TCP transport, secure channel,
//! configuration, and the accept loop built on top of `waypoint-core`'s
//! storage engine and `waypoint-crypto`'s primitives.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allowlist;
mod channel;
mod config;
mod error;
mod server;

pub use allowlist::AllowList;
pub use channel::{Packet, SecureChannel};
pub use config::Config;
pub use error::{BootstrapError, ChannelError};
pub use server::Server;
