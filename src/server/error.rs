use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Fatal outcomes of the rendezvous server lifecycle.
/// A clean shutdown is not an error.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind rendezvous server to {addr} (is another portal server running?)")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to subscribe to termination signals")]
    Signal(#[source] io::Error),
    #[error("rendezvous listener failed: {0}")]
    Listener(String),
    #[error("shutdown grace period of {grace:?} elapsed with {outstanding} connection(s) still open")]
    ShutdownTimeout { grace: Duration, outstanding: usize },
}
