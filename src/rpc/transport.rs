//! Transport abstraction: a lock-step, message-oriented channel.
//!
//! Concrete implementations:
//! - [`MemoryChannel`]: in-process pair, used by tests and embedded servers
//! - [`TcpChannel`](super::tcp::TcpChannel): length-prefixed frames over TCP
//!
//! The server loop and the call proxy are generic over [`Channel`], so
//! adding a transport requires no changes to the RPC logic. Exactly one
//! reply follows each request; the core never sends twice without
//! receiving in between.

use std::sync::mpsc;
use std::time::Duration;

use crate::error::TransportError;

/// Message-oriented request/reply channel.
pub trait Channel {
    /// Deliver one whole message.
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// Block until one whole message arrives.
    ///
    /// Returns [`TransportError::TimedOut`] if a configured timeout elapses
    /// and [`TransportError::Closed`] once the peer is gone.
    fn receive(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Largest message `send` accepts, if the transport has a limit.
    fn max_message_size(&self) -> Option<usize> {
        None
    }
}

impl<C: Channel + ?Sized> Channel for &mut C {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).receive()
    }

    fn max_message_size(&self) -> Option<usize> {
        (**self).max_message_size()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).receive()
    }

    fn max_message_size(&self) -> Option<usize> {
        (**self).max_message_size()
    }
}

/// One end of an in-process channel pair.
pub struct MemoryChannel {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
    recv_timeout: Option<Duration>,
}

impl MemoryChannel {
    /// Two connected ends: what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel();
        let (b_tx, a_rx) = mpsc::channel();
        (
            Self {
                tx: a_tx,
                rx: a_rx,
                recv_timeout: None,
            },
            Self {
                tx: b_tx,
                rx: b_rx,
                recv_timeout: None,
            },
        )
    }

    /// Bound every `receive` by `timeout` (`None` blocks forever).
    pub fn set_recv_timeout(&mut self, timeout: Option<Duration>) {
        self.recv_timeout = timeout;
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }
}

impl Channel for MemoryChannel {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send(message.to_vec())
            .map_err(|_| TransportError::Closed)
    }

    fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        match self.recv_timeout {
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => TransportError::TimedOut,
                mpsc::RecvTimeoutError::Disconnected => TransportError::Closed,
            }),
            None => self.rx.recv().map_err(|_| TransportError::Closed),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
