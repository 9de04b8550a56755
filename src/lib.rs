pub mod common;
pub mod receiver;
pub mod server;

/// Defaults shared by the server, the receiver display and the config schema
pub mod config {
    use std::time::Duration;

    pub const DEFAULT_PORT: u16 = 6969;
    pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
    pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
}
