//! Connectivity observer backed by a watch channel.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::ConnectivityGate;
use crate::error::{Error, Result};

/// How the device currently reaches the network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Wifi,
    Cellular,
    Ethernet,
    None,
    #[default]
    Unknown,
}

impl TransportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::Cellular => "cellular",
            Self::Ethernet => "ethernet",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wifi" => Ok(Self::Wifi),
            "cellular" => Ok(Self::Cellular),
            "ethernet" => Ok(Self::Ethernet),
            "none" => Ok(Self::None),
            "unknown" => Ok(Self::Unknown),
            other => Err(Error::InvalidInput(format!(
                "Unknown transport kind '{other}'"
            ))),
        }
    }
}

/// Snapshot of reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub connected: bool,
    pub transport: TransportKind,
}

impl NetworkStatus {
    #[must_use]
    pub const fn online(transport: TransportKind) -> Self {
        Self {
            connected: true,
            transport,
        }
    }

    #[must_use]
    pub const fn offline() -> Self {
        Self {
            connected: false,
            transport: TransportKind::None,
        }
    }
}

/// Holds the latest [`NetworkStatus`] and broadcasts every change.
#[derive(Clone)]
pub struct NetworkMonitor {
    status_tx: Arc<watch::Sender<NetworkStatus>>,
}

impl NetworkMonitor {
    #[must_use]
    pub fn new(initial: NetworkStatus) -> Self {
        let (status_tx, _status_rx) = watch::channel(initial);
        Self {
            status_tx: Arc::new(status_tx),
        }
    }

    /// Record a status reported by the platform. Returns whether it changed.
    pub fn report(&self, status: NetworkStatus) -> bool {
        let changed = self.status_tx.send_if_modified(|current| {
            let modified = *current != status;
            if modified {
                *current = status;
            }
            modified
        });

        if changed {
            tracing::info!(
                "Network is now {} ({})",
                if status.connected { "online" } else { "offline" },
                status.transport
            );
        }
        changed
    }

    #[must_use]
    pub fn status(&self) -> NetworkStatus {
        *self.status_tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status_tx.subscribe()
    }

    /// Check once whether `url` answers and report the result.
    ///
    /// Any HTTP response counts as reachable; only transport failures
    /// (DNS, refused connection, timeout) count as offline.
    pub async fn check_reachability(&self, url: &str, timeout: Duration) -> NetworkStatus {
        let reachable = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => match client.get(url).send().await {
                Ok(_) => true,
                Err(error) => {
                    tracing::debug!("Reachability check against {} failed: {}", url, error);
                    false
                }
            },
            Err(error) => {
                tracing::warn!("Failed to build reachability check client: {}", error);
                false
            }
        };

        let status = if reachable {
            NetworkStatus::online(TransportKind::Unknown)
        } else {
            NetworkStatus::offline()
        };
        self.report(status);
        status
    }
}

impl ConnectivityGate for NetworkMonitor {
    fn is_connected(&self) -> bool {
        self.status_tx.borrow().connected
    }
}
