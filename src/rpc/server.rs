//! Serve loop: receive, dispatch, reply, repeat.
//!
//! ```text
//!  ┌──────────┐ request ┌──────────────────┐ payload ┌─────────┐
//!  │ Channel  │────────▶│ ServiceRegistry  │────────▶│ Reply   │──▶ Channel
//!  │ receive  │         │ decode→call→enc  │         │ envelope│    send
//!  └──────────┘         └──────────────────┘         └─────────┘
//! ```
//!
//! Strictly one request in flight per channel. Per-request failures turn
//! into error replies and never end the loop. A reply larger than the
//! channel's message limit is replaced by a `ReplyTooLarge` error reply.
//! The loop ends when the [`StopSignal`] is raised, the peer goes away, or
//! the transport fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::error::{Error, RemoteError, RemoteErrorKind, Result, TransportError};

use super::envelope::Reply;
use super::registry::ServiceRegistry;
use super::tcp::TcpAcceptor;
use super::transport::Channel;

/// Cloneable, thread-safe stop request for a running serve loop.
///
/// The loop observes it between requests and whenever a receive times out,
/// so a channel with no receive timeout only stops after its next request.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Why a serve loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// The stop signal was raised.
    Stopped,
    /// The peer closed the channel.
    ChannelClosed,
}

/// Lifecycle owner for a registry and its serve loop.
pub struct Server<'a> {
    registry: ServiceRegistry<'a>,
    stop: StopSignal,
    request_limit: Option<u64>,
    handled: u64,
}

impl<'a> Server<'a> {
    pub fn new(registry: ServiceRegistry<'a>) -> Self {
        Self {
            registry,
            stop: StopSignal::new(),
            request_limit: None,
            handled: 0,
        }
    }

    /// Share an externally owned stop signal.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Raise the stop signal after `limit` handled requests.
    pub fn with_request_limit(mut self, limit: u64) -> Self {
        self.request_limit = Some(limit);
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn registry_mut(&mut self) -> &mut ServiceRegistry<'a> {
        &mut self.registry
    }

    /// Requests answered since construction.
    pub fn requests_handled(&self) -> u64 {
        self.handled
    }

    /// Process one request message into reply bytes.
    pub fn handle(&mut self, request: &[u8]) -> Vec<u8> {
        let reply = self.registry.handle_request(request).encode();
        self.handled += 1;
        if self.request_limit.is_some_and(|limit| self.handled >= limit) {
            info!("server: request limit reached, stopping");
            self.stop.raise();
        }
        reply
    }

    /// Serve a single channel until stopped or closed.
    pub fn serve<C: Channel>(&mut self, channel: &mut C) -> Result<ServeExit> {
        loop {
            if self.stop.is_raised() {
                return Ok(ServeExit::Stopped);
            }

            let request = match channel.receive() {
                Ok(msg) => msg,
                Err(TransportError::TimedOut) => continue,
                Err(TransportError::Closed) => return Ok(ServeExit::ChannelClosed),
                Err(e) => return Err(e.into()),
            };

            debug!("server: request of {} bytes", request.len());
            let reply = fit_reply(self.handle(&request), channel.max_message_size());

            match channel.send(&reply) {
                Ok(()) => {}
                Err(TransportError::Closed) => return Ok(ServeExit::ChannelClosed),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Accept TCP peers one at a time and serve each until it disconnects.
    ///
    /// A failing peer connection is dropped and the next one accepted; only
    /// a listener failure or the stop signal ends the loop.
    pub fn serve_tcp(&mut self, acceptor: &TcpAcceptor) -> Result<ServeExit> {
        loop {
            let Some(mut channel) = acceptor.accept(&self.stop)? else {
                info!("server: stopped");
                return Ok(ServeExit::Stopped);
            };

            match self.serve(&mut channel) {
                Ok(ServeExit::Stopped) => {
                    info!("server: stopped");
                    return Ok(ServeExit::Stopped);
                }
                Ok(ServeExit::ChannelClosed) => {
                    info!("server: peer {} disconnected", channel.peer_label());
                }
                Err(e) => {
                    warn!("server: dropping peer {}: {}", channel.peer_label(), e);
                }
            }
        }
    }
}

/// Swap a reply the channel cannot carry for an error reply that it can.
fn fit_reply(reply: Vec<u8>, max: Option<usize>) -> Vec<u8> {
    let Some(max) = max else {
        return reply;
    };
    if reply.len() <= max {
        return reply;
    }

    let err = Error::ReplyTooLarge {
        len: reply.len(),
        max,
    };
    warn!("server: {}", err);
    let detailed = Reply::from_error(&err).encode();
    if detailed.len() <= max {
        return detailed;
    }
    Reply::Err(RemoteError {
        kind: RemoteErrorKind::ReplyTooLarge,
        message: String::new(),
    })
    .encode()
}

// ── Tests ────────────────────────────────────────────────────
