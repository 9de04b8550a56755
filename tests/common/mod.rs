#![allow(dead_code)]

pub mod config_test_utils;

use std::net::SocketAddr;
use std::time::Duration;

use portal::server::{LifecycleState, ServerOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;

pub fn loopback_options(shutdown_grace: Duration) -> ServerOptions {
    ServerOptions {
        addr: "127.0.0.1:0".parse().expect("loopback addr"),
        shutdown_grace,
        ..ServerOptions::default()
    }
}

/// Wait until the lifecycle reports its bound address.
pub async fn wait_listening(state: &mut watch::Receiver<LifecycleState>) -> SocketAddr {
    let listening = state
        .wait_for(|s| matches!(s, LifecycleState::Listening(_)))
        .await
        .expect("lifecycle dropped before listening");
    match *listening {
        LifecycleState::Listening(addr) => addr,
        other => panic!("unexpected state {:?}", other),
    }
}

/// Minimal HTTP/1.1 GET that returns the raw response.
pub async fn http_get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        path
    );
    stream.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}
