mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{routing::get, Router};
use portal::server::{
    LifecycleError, LifecycleState, MailboxStore, ServerLifecycle, ServerOptions, StopReason,
    TerminationSignal,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};

use common::{http_get, loopback_options, wait_listening};

//===============
// Test Helpers
//===============

/// Router with a handler that signals entry and then never answers.
fn hanging_router(entered: Arc<Notify>) -> Router {
    Router::new().route(
        "/hang",
        get(move || {
            let entered = entered.clone();
            async move {
                entered.notify_one();
                std::future::pending::<&'static str>().await
            }
        }),
    )
}

/// Router with a handler that takes `delay` to answer.
fn slow_router(entered: Arc<Notify>, delay: Duration) -> Router {
    Router::new().route(
        "/slow",
        get(move || {
            let entered = entered.clone();
            async move {
                entered.notify_one();
                tokio::time::sleep(delay).await;
                "done"
            }
        }),
    )
}

//===============
// Startup
//===============

#[tokio::test]
async fn serves_health_while_listening() {
    let lifecycle = ServerLifecycle::new(
        loopback_options(Duration::from_secs(1)),
        &MailboxStore::new(),
    );
    let mut state = lifecycle.subscribe();
    let (signal_tx, signal_rx) = mpsc::channel(4);
    let run = tokio::spawn(lifecycle.start(signal_rx));

    let addr = wait_listening(&mut state).await;
    let response = http_get(addr, "/health").await.expect("health request");
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("OK"));

    signal_tx
        .send(TerminationSignal::Terminate)
        .await
        .expect("send signal");
    let reason = run.await.expect("join").expect("clean shutdown");

    assert_eq!(reason, StopReason::Signal(TerminationSignal::Terminate));
    assert_eq!(*state.borrow(), LifecycleState::Stopped);
}

#[tokio::test]
async fn bind_failure_is_fatal() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    let options = ServerOptions {
        addr: taken.local_addr().expect("probe addr"),
        ..loopback_options(Duration::from_secs(1))
    };
    let lifecycle = ServerLifecycle::new(options, &MailboxStore::new());
    let state = lifecycle.subscribe();
    let (_signal_tx, signal_rx) = mpsc::channel(1);

    let result = lifecycle.start(signal_rx).await;

    assert!(matches!(result, Err(LifecycleError::Bind { .. })));
    assert_eq!(*state.borrow(), LifecycleState::NotStarted);
}

//===============
// Slow Peers
//===============

#[tokio::test]
async fn trickling_client_is_disconnected_after_read_timeout() {
    let options = ServerOptions {
        read_timeout: Duration::from_millis(500),
        ..loopback_options(Duration::from_secs(1))
    };
    let lifecycle = ServerLifecycle::new(options, &MailboxStore::new());
    let shutdown = lifecycle.shutdown_signal();
    let mut state = lifecycle.subscribe();
    let (_signal_tx, signal_rx) = mpsc::channel(1);
    let run = tokio::spawn(lifecycle.start(signal_rx));

    let addr = wait_listening(&mut state).await;
    let (mut reader, mut writer) = TcpStream::connect(addr)
        .await
        .expect("connect")
        .into_split();

    // One header line every 200ms: steady progress, never a complete request
    tokio::spawn(async move {
        if writer.write_all(b"GET /health HTTP/1.1\r\n").await.is_err() {
            return;
        }
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if writer.write_all(b"X-Slow: 1\r\n").await.is_err() {
                return;
            }
        }
    });

    let started = Instant::now();
    let mut received = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), reader.read_to_end(&mut received))
        .await
        .expect("server should drop the connection");

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!String::from_utf8_lossy(&received).contains("200 OK"));

    assert!(shutdown.trigger(StopReason::Requested));
    let reason = run.await.expect("join").expect("clean shutdown");
    assert_eq!(reason, StopReason::Requested);
}

//===============
// Cancellation
//===============

#[tokio::test]
async fn repeated_signals_shut_down_once() {
    let lifecycle = ServerLifecycle::new(
        loopback_options(Duration::from_secs(1)),
        &MailboxStore::new(),
    );
    let shutdown = lifecycle.shutdown_signal();
    let mut state = lifecycle.subscribe();
    let (signal_tx, signal_rx) = mpsc::channel(4);
    let run = tokio::spawn(lifecycle.start(signal_rx));

    wait_listening(&mut state).await;
    signal_tx.send(TerminationSignal::Interrupt).await.unwrap();
    // The watcher may already be gone once shutdown finishes
    let _ = signal_tx.send(TerminationSignal::Interrupt).await;
    let _ = signal_tx.send(TerminationSignal::Terminate).await;

    let reason = run.await.expect("join").expect("clean shutdown");

    assert_eq!(reason, StopReason::Signal(TerminationSignal::Interrupt));
    assert_eq!(
        shutdown.reason(),
        Some(&StopReason::Signal(TerminationSignal::Interrupt))
    );
    assert!(!shutdown.trigger(StopReason::Requested));
}

#[tokio::test]
async fn explicit_stop_after_signal_is_ignored() {
    let lifecycle = ServerLifecycle::new(
        loopback_options(Duration::from_secs(1)),
        &MailboxStore::new(),
    );
    let shutdown = lifecycle.shutdown_signal();
    let mut state = lifecycle.subscribe();
    let (signal_tx, signal_rx) = mpsc::channel(4);
    let run = tokio::spawn(lifecycle.start(signal_rx));

    wait_listening(&mut state).await;
    signal_tx.send(TerminationSignal::Terminate).await.unwrap();
    state
        .wait_for(|s| !matches!(s, LifecycleState::Listening(_)))
        .await
        .expect("left listening");
    assert!(!shutdown.trigger(StopReason::Requested));

    let reason = run.await.expect("join").expect("clean shutdown");
    assert_eq!(reason, StopReason::Signal(TerminationSignal::Terminate));
}

//===============
// Draining
//===============

#[tokio::test]
async fn in_flight_request_finishes_within_grace() {
    let entered = Arc::new(Notify::new());
    let lifecycle = ServerLifecycle::with_router(
        loopback_options(Duration::from_secs(5)),
        slow_router(entered.clone(), Duration::from_millis(200)),
    );
    let shutdown = lifecycle.shutdown_signal();
    let mut state = lifecycle.subscribe();
    let (_signal_tx, signal_rx) = mpsc::channel(1);
    let run = tokio::spawn(lifecycle.start(signal_rx));

    let addr = wait_listening(&mut state).await;
    let request = tokio::spawn(http_get(addr, "/slow"));
    entered.notified().await;

    assert!(shutdown.trigger(StopReason::Requested));
    let reason = run.await.expect("join").expect("drained cleanly");
    assert_eq!(reason, StopReason::Requested);

    let response = request.await.expect("join").expect("response");
    assert!(response.ends_with("done"));
}

#[tokio::test]
async fn stuck_request_hits_bounded_grace_period() {
    let grace = Duration::from_millis(300);
    let entered = Arc::new(Notify::new());
    let lifecycle =
        ServerLifecycle::with_router(loopback_options(grace), hanging_router(entered.clone()));
    let shutdown = lifecycle.shutdown_signal();
    let mut state = lifecycle.subscribe();
    let (_signal_tx, signal_rx) = mpsc::channel(1);
    let run = tokio::spawn(lifecycle.start(signal_rx));

    let addr = wait_listening(&mut state).await;
    let _request = tokio::spawn(http_get(addr, "/hang"));
    entered.notified().await;

    let started = Instant::now();
    assert!(shutdown.trigger(StopReason::Requested));
    let result = run.await.expect("join");
    let elapsed = started.elapsed();

    match result {
        Err(LifecycleError::ShutdownTimeout {
            grace: reported,
            outstanding,
        }) => {
            assert_eq!(reported, grace);
            assert!(outstanding >= 1);
        }
        other => panic!("expected shutdown timeout, got {:?}", other),
    }
    assert!(elapsed >= grace);
    assert!(
        elapsed < grace + Duration::from_secs(1),
        "shutdown took {:?}",
        elapsed
    );
    assert_eq!(*state.borrow(), LifecycleState::Stopped);
}
