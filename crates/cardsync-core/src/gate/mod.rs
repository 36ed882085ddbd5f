//! Preconditions for talking to the remote store: reachability and identity.

mod network;
mod session;

use std::sync::Arc;

pub use network::{NetworkMonitor, NetworkStatus, TransportKind};
pub use session::{Identity, SharedSession};

/// Current reachability of the remote store
pub trait ConnectivityGate {
    fn is_connected(&self) -> bool;
}

/// Current authenticated identity, if any
pub trait SessionGate {
    fn current_identity(&self) -> Option<Identity>;
}

/// Both preconditions a sync checks before touching the network
#[derive(Clone)]
pub struct Gate {
    connectivity: Arc<dyn ConnectivityGate + Send + Sync>,
    session: Arc<dyn SessionGate + Send + Sync>,
}

impl Gate {
    pub fn new(
        connectivity: impl ConnectivityGate + Send + Sync + 'static,
        session: impl SessionGate + Send + Sync + 'static,
    ) -> Self {
        Self {
            connectivity: Arc::new(connectivity),
            session: Arc::new(session),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connectivity.is_connected()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session.current_identity()
    }
}
