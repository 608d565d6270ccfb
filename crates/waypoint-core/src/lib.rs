//! Storage engine and request dispatcher for the waypoint telemetry archive.
//!
//! This crate owns every synchronous filesystem concern: the on-disk
//! day-bucket layout, the per-path mutex that serializes concurrent writers,
//! fixed-width record scanning, and the dispatch from a decoded
//! [`waypoint_proto::RequestHeader`] to one of the three handlers. It knows
//! nothing about sockets, framing, or encryption — those live in
//! `waypoint-server`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatch;
mod error;
mod history;
mod mutex_registry;
mod storage;

pub use dispatch::dispatch;
pub use error::DispatchError;
pub use mutex_registry::FileMutexRegistry;
pub use storage::Storage;
