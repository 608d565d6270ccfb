//! IP allow-list matching for the accept loop.

/// A list of peer IPs permitted to connect, or the wildcard "allow any".
pub struct AllowList {
    entries: Vec<String>,
}

impl AllowList {
    /// Build an allow-list from config entries.
    ///
    /// An empty list or one beginning with `"*"` allows every peer.
    #[must_use]
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// `true` if `peer_addr` (a `host:port` string, as returned by
    /// [`std::net::SocketAddr::to_string`]) is permitted to connect.
    ///
    /// The port is stripped before comparison; entries are matched by exact
    /// string equality against the bare IP.
    #[must_use]
    pub fn is_allowed(&self, peer_addr: &str) -> bool {
        if self.entries.is_empty() || self.entries.first().is_some_and(|entry| entry == "*") {
            return true;
        }

        let Some(ip) = peer_addr.rsplit_once(':').map(|(ip, _port)| ip) else {
            return false;
        };

        self.entries.iter().any(|entry| entry == ip)
    }
}
