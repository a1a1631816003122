//! Listener enforcing connection-level read and idle deadlines.
//!
//! `axum::serve` exposes neither knob, so accepted streams are wrapped in
//! [`DeadlineStream`]:
//!
//! - the request head (request line and headers) must arrive within the
//!   read timeout, measured from its first byte;
//! - a connection with no traffic at all is dropped after the idle timeout.
//!
//! Either deadline fails the pending read with `TimedOut`, and hyper closes
//! the connection. Body reads are bounded separately by middleware.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::serve::Listener;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, Sleep};

/// End of an HTTP/1 request head.
const HEAD_TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// HTTP/2 prior-knowledge connections open with this.
const H2_PREFACE_START: &[u8] = b"PRI ";

/// TCP listener yielding deadline-limited streams.
pub struct DeadlineListener {
    inner: TcpListener,
    read: Duration,
    idle: Duration,
}

impl DeadlineListener {
    pub fn new(inner: TcpListener, read: Duration, idle: Duration) -> Self {
        Self { inner, read, idle }
    }
}

impl Listener for DeadlineListener {
    type Io = DeadlineStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        // TcpListener's Listener impl already retries transient accept errors.
        let (stream, addr) = Listener::accept(&mut self.inner).await;
        (DeadlineStream::new(stream, self.read, self.idle), addr)
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        self.inner.local_addr()
    }
}

/// Where the connection is in its current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Before the first request, or after a response started.
    Between,
    /// Receiving a request head; `matched` bytes of the terminator seen.
    Head { matched: usize },
    /// Head received; waiting on the handler.
    Handling,
    /// HTTP/2: requests are multiplexed, no head boundary to track.
    Multiplexed,
}

/// Stream wrapper with a per-request head deadline and an inactivity
/// deadline.
pub struct DeadlineStream<S> {
    io: S,
    read: Duration,
    idle: Duration,
    phase: Phase,
    first_read: bool,
    head_deadline: Option<Pin<Box<Sleep>>>,
    idle_deadline: Pin<Box<Sleep>>,
}

impl<S> DeadlineStream<S> {
    pub fn new(io: S, read: Duration, idle: Duration) -> Self {
        Self {
            io,
            read,
            idle,
            phase: Phase::Between,
            first_read: true,
            head_deadline: None,
            idle_deadline: Box::pin(tokio::time::sleep(idle)),
        }
    }

    fn touch(&mut self) {
        let next = Instant::now() + self.idle;
        self.idle_deadline.as_mut().reset(next);
    }

    fn on_read(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if std::mem::take(&mut self.first_read) && bytes.starts_with(H2_PREFACE_START) {
            self.phase = Phase::Multiplexed;
            return;
        }
        if self.phase == Phase::Between {
            self.phase = Phase::Head { matched: 0 };
            self.head_deadline = Some(Box::pin(tokio::time::sleep(self.read)));
        }
        if let Phase::Head { mut matched } = self.phase {
            for &byte in bytes {
                matched = if byte == HEAD_TERMINATOR[matched] {
                    matched + 1
                } else if byte == b'\r' {
                    1
                } else {
                    0
                };
                if matched == HEAD_TERMINATOR.len() {
                    self.phase = Phase::Handling;
                    self.head_deadline = None;
                    return;
                }
            }
            self.phase = Phase::Head { matched };
        }
    }

    fn on_write(&mut self) {
        if self.phase != Phase::Multiplexed {
            self.phase = Phase::Between;
            self.head_deadline = None;
        }
    }

    /// Registers both deadlines with `cx`; returns the one that has passed.
    fn poll_expired(&mut self, cx: &mut Context<'_>) -> Option<io::Error> {
        let head_expired = self
            .head_deadline
            .as_mut()
            .is_some_and(|deadline| deadline.as_mut().poll(cx).is_ready());
        let idle_expired = self.idle_deadline.as_mut().poll(cx).is_ready();

        if head_expired {
            Some(io::Error::new(io::ErrorKind::TimedOut, "request read timeout"))
        } else if idle_expired {
            Some(io::Error::new(io::ErrorKind::TimedOut, "connection idle timeout"))
        } else {
            None
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for DeadlineStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        match Pin::new(&mut this.io).poll_read(cx, buf) {
            Poll::Ready(Ok(())) => {
                this.on_read(&buf.filled()[before..]);
                this.touch();
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => match this.poll_expired(cx) {
                Some(e) => Poll::Ready(Err(e)),
                None => Poll::Pending,
            },
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeadlineStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.io).poll_write(cx, buf) {
            Poll::Ready(Ok(n)) => {
                if n > 0 {
                    this.on_write();
                }
                this.touch();
                Poll::Ready(Ok(n))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => match this.poll_expired(cx) {
                Some(e) => Poll::Ready(Err(e)),
                None => Poll::Pending,
            },
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_shutdown(cx)
    }
}
