//! Listener bootstrap: bind synchronously, serve on a background task.

use std::io;
use std::net::{SocketAddr, TcpListener};

use axum::Router;
use tokio::task::JoinHandle;

use super::error::LifecycleError;
use super::shutdown::{ShutdownSignal, StopReason};
use super::timeout::TimeoutAcceptor;

/// Bind the listening socket. Failure here is fatal to the lifecycle.
pub(crate) fn bind(addr: SocketAddr) -> Result<TcpListener, LifecycleError> {
    let listener = TcpListener::bind(addr).map_err(|source| LifecycleError::Bind { addr, source })?;

    listener
        .set_nonblocking(true)
        .map_err(|source| LifecycleError::Bind { addr, source })?;

    Ok(listener)
}

/// Serve `app` on its own task until the handle shuts it down.
/// An error from the server while running is reported as a stop request.
pub(crate) fn spawn_listener(
    listener: TcpListener,
    app: Router,
    handle: axum_server::Handle,
    acceptor: TimeoutAcceptor,
    shutdown: ShutdownSignal,
) -> JoinHandle<io::Result<()>> {
    tokio::spawn(async move {
        let result = axum_server::from_tcp(listener)
            .acceptor(acceptor)
            .handle(handle)
            .serve(app.into_make_service())
            .await;

        if let Err(err) = &result {
            tracing::error!("Serving rendezvous server: {}", err);
            shutdown.trigger(StopReason::ListenerFault(err.to_string()));
        }

        result
    })
}
