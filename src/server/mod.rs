// Submodules
mod error;
mod listener;
pub mod mailbox;
pub mod routes;
mod runtime;
pub mod shutdown;
pub mod timeout;

// Public API (what main.rs imports)
pub use error::LifecycleError;
pub use mailbox::{Mailbox, MailboxStore};
pub use runtime::{LifecycleState, ServerLifecycle, ServerOptions};
pub use shutdown::{os_signals, ShutdownSignal, StopReason, TerminationSignal};
