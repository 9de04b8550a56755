//! Per-connection read/write deadlines.
//!
//! A connection alternates between reading a request and writing its
//! response. Each exchange gets one deadline, armed when the exchange starts
//! and never extended by partial progress: a request must arrive completely
//! within the read timeout and its response must go out within the write
//! timeout. A peer that misses either gets `TimedOut` and is dropped.
//!
//! The response deadline also covers the wait for the next request on a
//! kept-alive connection, so idle peers are released as well.

use std::future::{Future, Ready};
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use axum_server::accept::Accept;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{sleep, Sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    Request,
    Response,
}

/// Stream wrapper that fails requests and responses running past their deadline.
pub struct TimeoutStream<S> {
    inner: S,
    read_timeout: Duration,
    write_timeout: Duration,
    exchange: Exchange,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl<S> TimeoutStream<S> {
    pub fn new(inner: S, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            inner,
            read_timeout,
            write_timeout,
            exchange: Exchange::Request,
            deadline: None,
        }
    }

    /// Switch exchange; the new one gets a fresh deadline on its next poll.
    fn enter(&mut self, exchange: Exchange) {
        if self.exchange != exchange {
            self.exchange = exchange;
            self.deadline = None;
        }
    }

    /// Arms the current exchange's deadline on first use and fails once it
    /// has passed. Registers the waker with the timer either way.
    fn check_deadline(&mut self, cx: &mut Context<'_>) -> io::Result<()> {
        let (timeout, op) = match self.exchange {
            Exchange::Request => (self.read_timeout, "read"),
            Exchange::Response => (self.write_timeout, "write"),
        };
        let timer = self
            .deadline
            .get_or_insert_with(|| Box::pin(sleep(timeout)));

        if timer.as_mut().poll(cx).is_ready() {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection {} timed out after {:?}", op, timeout),
            ))
        } else {
            Ok(())
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TimeoutStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        this.check_deadline(cx)?;

        let filled_before = buf.filled().len();
        let result = ready!(Pin::new(&mut this.inner).poll_read(cx, buf));

        // Bytes after a response mean the peer started its next request
        if result.is_ok() && buf.filled().len() > filled_before {
            this.enter(Exchange::Request);
        }
        Poll::Ready(result)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TimeoutStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        if !buf.is_empty() {
            this.enter(Exchange::Response);
        }
        this.check_deadline(cx)?;

        Pin::new(&mut this.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;
        // hyper flushes on every pass, including while a request is still arriving
        if this.exchange == Exchange::Response {
            this.check_deadline(cx)?;
        }

        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// axum-server acceptor that wraps every accepted stream in a `TimeoutStream`.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutAcceptor {
    read_timeout: Duration,
    write_timeout: Duration,
}

impl TimeoutAcceptor {
    pub fn new(read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            read_timeout,
            write_timeout,
        }
    }
}

impl<I, S> Accept<I, S> for TimeoutAcceptor
where
    I: AsyncRead + AsyncWrite + Unpin,
{
    type Stream = TimeoutStream<I>;
    type Service = S;
    type Future = Ready<io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        std::future::ready(Ok((
            TimeoutStream::new(stream, self.read_timeout, self.write_timeout),
            service,
        )))
    }
}
