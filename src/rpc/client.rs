//! Call proxy: the client side of a request/reply exchange.
//!
//! `call::<R, _>(id, (a, b))` encodes the request envelope, sends it,
//! blocks for exactly one reply and decodes it as `R`. The caller picks `R`;
//! nothing on the wire checks it against the server's handler. With
//! `R = ()` the reply is still received so the channel stays in lock-step.

use log::{debug, warn};

use crate::config::RpcConfig;
use crate::error::{Result, TransportError};

use super::codec::{Decode, Encode, Reader};
use super::envelope::{Reply, encode_request};
use super::tcp::TcpChannel;
use super::transport::Channel;

/// Typed call proxy over any [`Channel`].
pub struct Client<C> {
    channel: C,
    in_sync: bool,
}

impl<C: Channel> Client<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            in_sync: true,
        }
    }

    /// Invoke `service_id` with an argument tuple and decode the result.
    ///
    /// Once a transport failure may have left part of a request or reply on
    /// the channel (a timeout, an oversized reply frame, an I/O error
    /// mid-write), request/reply pairing is lost and every later call fails
    /// with [`TransportError::OutOfSync`]. `Closed` and a request rejected
    /// as too large before any byte was written leave the client in sync.
    pub fn call<R, A>(&mut self, service_id: &str, args: A) -> Result<R>
    where
        R: Decode,
        A: Encode,
    {
        if !self.in_sync {
            return Err(TransportError::OutOfSync.into());
        }

        let request = encode_request(service_id, &args);
        debug!("client: '{}' ({} bytes)", service_id, request.len());
        if let Err(e) = self.channel.send(&request) {
            if !matches!(e, TransportError::Closed | TransportError::FrameTooLarge { .. }) {
                self.lose_sync(service_id, e);
            }
            return Err(e.into());
        }

        let reply = match self.channel.receive() {
            Ok(bytes) => bytes,
            Err(e) => {
                if e != TransportError::Closed {
                    self.lose_sync(service_id, e);
                }
                return Err(e.into());
            }
        };

        let payload = Reply::decode(&reply)?.into_result()?;
        let mut input = Reader::new(&payload);
        let value = R::decode(&mut input)?;
        if !input.is_empty() {
            warn!(
                "client: '{}' reply has {} unread bytes (return type mismatch?)",
                service_id,
                input.remaining()
            );
        }
        Ok(value)
    }

    fn lose_sync(&mut self, service_id: &str, cause: TransportError) {
        warn!("client: '{}' lost lock-step: {}", service_id, cause);
        self.in_sync = false;
    }

    /// False once a transport failure has broken request/reply pairing.
    pub fn is_in_sync(&self) -> bool {
        self.in_sync
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_inner(self) -> C {
        self.channel
    }
}

impl Client<TcpChannel> {
    /// Connect to `config.connect_addr` over TCP.
    pub fn connect(config: &RpcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(TcpChannel::connect(config)?))
    }
}

/// Call a remote service with positional arguments.
///
/// ```ignore
/// let sum: i32 = invoke!(client, "add", 2, 3)?;
/// ```
#[macro_export]
macro_rules! invoke {
    ($client:expr, $service:expr $(, $arg:expr)* $(,)?) => {
        $client.call($service, ($($arg,)*))
    };
}

// ── Tests ────────────────────────────────────────────────────
