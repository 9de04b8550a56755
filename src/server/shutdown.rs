//! One-shot shutdown trigger shared by the listener, the signal watcher and
//! the runtime loop.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Process termination signals the server reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => write!(f, "SIGINT"),
            TerminationSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Why the server left the listening state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Signal(TerminationSignal),
    /// The listener task returned an error while the server was running
    ListenerFault(String),
    Requested,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StopReason::Signal(signal) => write!(f, "signal {}", signal),
            StopReason::ListenerFault(err) => write!(f, "listener fault: {}", err),
            StopReason::Requested => write!(f, "stop requested"),
        }
    }
}

/// Cancellation token paired with the reason that fired it.
///
/// Only the first `trigger` call cancels and records its reason; every later
/// call is a no-op, so repeated signals never start a second shutdown.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<StopReason>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `true` only for the call that started it.
    pub fn trigger(&self, reason: StopReason) -> bool {
        match self.reason.set(reason) {
            Ok(()) => {
                self.token.cancel();
                true
            }
            Err(ignored) => {
                tracing::debug!("Shutdown already requested, ignoring {}", ignored);
                false
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.reason.get().is_some()
    }

    /// Reason recorded by the first trigger.
    pub fn reason(&self) -> Option<&StopReason> {
        self.reason.get()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Token that other tasks can select on.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Subscribes to process termination signals and forwards every delivery.
///
/// Must be called from inside a Tokio runtime.
pub fn os_signals() -> std::io::Result<mpsc::Receiver<TerminationSignal>> {
    let (tx, rx) = mpsc::channel(4);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = interrupt.recv() => TerminationSignal::Interrupt,
                    _ = terminate.recv() => TerminationSignal::Terminate,
                };
                if tx.send(received).await.is_err() {
                    break;
                }
            }
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.send(TerminationSignal::Interrupt).await.is_err() {
                    break;
                }
            }
        });
    }

    Ok(rx)
}

/// Turns incoming termination signals into shutdown triggers.
/// Runs until the signal source closes.
pub(crate) async fn watch_signals(
    mut signals: mpsc::Receiver<TerminationSignal>,
    shutdown: ShutdownSignal,
) {
    while let Some(received) = signals.recv().await {
        if shutdown.trigger(StopReason::Signal(received)) {
            tracing::info!(
                "Rendezvous server shutting down due to signal: {}",
                received
            );
        } else {
            tracing::warn!("Received {} while already shutting down, ignoring", received);
        }
    }
}
