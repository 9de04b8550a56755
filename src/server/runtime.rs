//! Runtime lifecycle: bind, serve, wait for a stop request, then drain.
//!
//! NotStarted -> Listening -> ShuttingDown -> Stopped. ShuttingDown is
//! entered once, guarded by the one-shot `ShutdownSignal`.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::error::LifecycleError;
use super::listener;
use super::mailbox::MailboxStore;
use super::routes;
use super::shutdown::{watch_signals, ShutdownSignal, StopReason, TerminationSignal};
use super::timeout::TimeoutAcceptor;
use crate::config::{DEFAULT_PORT, READ_TIMEOUT, SHUTDOWN_GRACE, WRITE_TIMEOUT};

/// Listener address, per-connection deadlines and shutdown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    pub addr: SocketAddr,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            read_timeout: READ_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    Listening(SocketAddr),
    ShuttingDown,
    Stopped,
}

/// Owns the listener and the signal subscription for one server run.
pub struct ServerLifecycle {
    options: ServerOptions,
    app: Router,
    shutdown: ShutdownSignal,
    state: watch::Sender<LifecycleState>,
}

impl ServerLifecycle {
    pub fn new(options: ServerOptions, mailboxes: &MailboxStore) -> Self {
        Self::with_router(options, routes::create_router(mailboxes))
    }

    /// Lifecycle around an arbitrary router.
    pub fn with_router(options: ServerOptions, app: Router) -> Self {
        let (state, _) = watch::channel(LifecycleState::NotStarted);
        Self {
            options,
            app,
            shutdown: ShutdownSignal::new(),
            state,
        }
    }

    /// Handle for stopping the server from outside `start`.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Request shutdown. Only the first request has any effect.
    pub fn stop(&self, reason: StopReason) -> bool {
        self.shutdown.trigger(reason)
    }

    /// Bind, serve, and block until shutdown completes.
    ///
    /// Every value received on `signals` is a termination request; the first
    /// one starts shutdown and later ones are ignored. Returns the reason the
    /// server stopped on a clean shutdown.
    pub async fn start(
        self,
        signals: mpsc::Receiver<TerminationSignal>,
    ) -> Result<StopReason, LifecycleError> {
        let addr = self.options.addr;
        let tcp_listener = listener::bind(addr)?;
        let local_addr = tcp_listener
            .local_addr()
            .map_err(|source| LifecycleError::Bind { addr, source })?;

        let handle = axum_server::Handle::new();
        let acceptor = TimeoutAcceptor::new(self.options.read_timeout, self.options.write_timeout);
        let mut listener_task = listener::spawn_listener(
            tcp_listener,
            self.app,
            handle.clone(),
            acceptor,
            self.shutdown.clone(),
        );
        let signal_task = tokio::spawn(watch_signals(signals, self.shutdown.clone()));

        self.state.send_replace(LifecycleState::Listening(local_addr));
        tracing::info!("Rendezvous server started on {}", local_addr);

        self.shutdown.cancelled().await;

        self.state.send_replace(LifecycleState::ShuttingDown);
        let reason = self
            .shutdown
            .reason()
            .cloned()
            .unwrap_or(StopReason::Requested);
        tracing::info!("Rendezvous server shutting down ({})", reason);

        let drained = drain(&handle, &mut listener_task, self.options.shutdown_grace).await;
        signal_task.abort();
        self.state.send_replace(LifecycleState::Stopped);
        drained?;

        match reason {
            StopReason::ListenerFault(err) => Err(LifecycleError::Listener(err)),
            reason => {
                tracing::info!("Rendezvous server shutdown successfully");
                Ok(reason)
            }
        }
    }
}

/// Stop accepting and race in-flight connections against the grace period.
async fn drain(
    handle: &axum_server::Handle,
    listener_task: &mut JoinHandle<io::Result<()>>,
    grace: Duration,
) -> Result<(), LifecycleError> {
    handle.graceful_shutdown(None);
    tracing::info!("Server stopped accepting new connections");

    match tokio::time::timeout(grace, &mut *listener_task).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(join_err)) => {
            tracing::warn!("Listener task ended abnormally: {}", join_err);
            Ok(())
        }
        Err(_) => {
            let outstanding = handle.connection_count();
            tracing::error!(
                "Rendezvous shutdown failed: {} connection(s) still open after {:?}",
                outstanding,
                grace
            );
            // Forced close of everything still attached to the handle
            handle.shutdown();
            listener_task.abort();
            Err(LifecycleError::ShutdownTimeout { grace, outstanding })
        }
    }
}
