//! Receiver-side transfer display: a reducer over transfer, input and tick
//! events, a pure renderer, and the loop that drives them.
//!
//! Library-only: the transport that receives files feeds a
//! [`transfer_channel`] and calls [`run_terminal_receiver`] with the
//! `[receiver]` config section. The `portal` binary itself only serves.

mod event;
pub mod format;
mod handle;
mod model;
mod runtime;
mod styles;
mod view;

pub use event::{key_name, TransferEvent, UiEvent};
pub use handle::{transfer_channel, TransferEvents};
pub use model::{reduce, Command, Phase, ReceiverModel, DEFAULT_VIEWPORT_WIDTH};
pub use runtime::{drive, run_terminal_receiver, ReceiverExit};
pub use view::render;
