//! JSON configuration with create-default-if-absent bootstrap semantics.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::BootstrapError;

fn default_root() -> String {
    "./storage".to_string()
}

fn default_hostname() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4994
}

fn default_allowed_ips() -> Vec<String> {
    vec!["*".to_string()]
}

/// Server configuration, loaded from a JSON file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Archive root directory.
    #[serde(default = "default_root")]
    pub root: String,

    /// Address to bind the TCP listener to.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Port to bind the TCP listener to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Peer IPs allowed to connect. `["*"]` (the default) allows any peer;
    /// an empty list also allows any peer.
    #[serde(default = "default_allowed_ips")]
    pub allowed_ips: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            hostname: default_hostname(),
            port: default_port(),
            allowed_ips: default_allowed_ips(),
        }
    }
}

impl Config {
    /// The `hostname:port` string to bind to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Load config from `path`, writing and returning the default config if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Config`] if the file exists but is not
    /// valid JSON, or if a default config cannot be written to `path`.
    pub fn load(path: &Path) -> Result<Self, BootstrapError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| BootstrapError::Config(format!("{}: {err}", path.display()))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            },
            Err(err) => Err(BootstrapError::Config(format!("{}: {err}", path.display()))),
        }
    }

    /// Write this config to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Config`] if `path` cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), BootstrapError> {
        let json = serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| unreachable!("Config always serializes"));

        std::fs::write(path, json)
            .map_err(|err| BootstrapError::Config(format!("{}: {err}", path.display())))
    }
}
