//! TCP accept loop: binds the listener, gates peers by IP, and spawns one
//! task per accepted connection.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use waypoint_core::{FileMutexRegistry, Storage};
use waypoint_proto::{ACK, ERR};

use crate::{allowlist::AllowList, channel::SecureChannel, config::Config, error::BootstrapError};

/// Bound listener plus the shared state every connection task needs.
pub struct Server {
    listener: TcpListener,
    storage: Arc<Storage>,
    registry: Arc<FileMutexRegistry>,
    allowlist: Arc<AllowList>,
}

impl Server {
    /// Bind the listener and initialize the storage root from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Storage`] if the archive root cannot be
    /// created, or [`BootstrapError::Listen`] if the address cannot be
    /// bound.
    pub async fn bind(config: &Config) -> Result<Self, BootstrapError> {
        let storage = Storage::new(&config.root)
            .map_err(|err| BootstrapError::Storage(format!("{}: {err}", config.root)))?;

        let listener = TcpListener::bind(config.bind_address())
            .await
            .map_err(|err| BootstrapError::Listen(format!("{}: {err}", config.bind_address())))?;

        Ok(Self {
            listener,
            storage: Arc::new(storage),
            registry: Arc::new(FileMutexRegistry::new()),
            allowlist: Arc::new(AllowList::new(config.allowed_ips.clone())),
        })
    }

    /// The address the listener is actually bound to (useful when the
    /// configured port is `0`).
    ///
    /// # Errors
    ///
    /// Propagates the underlying socket error.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the accept loop forever, spawning a task per accepted connection.
    ///
    /// This future only returns on a fatal listener error; individual
    /// connection failures are contained to their own task.
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, peer_addr) = self.listener.accept().await?;

            if !self.allowlist.is_allowed(&peer_addr.to_string()) {
                tracing::warn!(%peer_addr, "rejecting peer outside the allow-list");
                continue;
            }

            let storage = Arc::clone(&self.storage);
            let registry = Arc::clone(&self.registry);

            tokio::spawn(async move {
                tracing::info!(%peer_addr, "accepted connection");
                if let Err(err) = handle_connection(stream, &storage, &registry).await {
                    tracing::warn!(%peer_addr, %err, "connection closed");
                } else {
                    tracing::info!(%peer_addr, "connection closed");
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    storage: &Storage,
    registry: &FileMutexRegistry,
) -> Result<(), crate::error::ChannelError> {
    let mut channel = SecureChannel::handshake(stream).await?;

    loop {
        let packet = channel.read_packet().await?;

        let response = match waypoint_core::dispatch(storage, registry, &packet.payload) {
            Ok(None) => ACK.to_vec(),
            Ok(Some(body)) => body,
            Err(err) => {
                tracing::debug!(request_id = packet.request_id, %err, "request failed");
                ERR.to_vec()
            },
        };

        channel.write_packet(packet.request_id, &response).await?;
    }
}
