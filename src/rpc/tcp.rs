//! TCP transport: one message per length-prefixed frame.
//!
//! The client side connects with explicit connect/read/write timeouts so
//! a lost reply surfaces as [`TransportError::TimedOut`] instead of blocking
//! forever. The server side polls a non-blocking listener so the serve loop
//! can observe its [`StopSignal`] between accepts.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;

use log::{debug, info};

use crate::config::RpcConfig;
use crate::error::{Error, Result, TransportError};

use super::frame::{FrameDecoder, encode_frame};
use super::server::StopSignal;
use super::transport::Channel;

const READ_BUF_SIZE: usize = 4096;

/// A connected TCP stream speaking length-prefixed frames.
pub struct TcpChannel {
    stream: TcpStream,
    decoder: FrameDecoder,
    max_frame_size: usize,
    peer: Option<SocketAddr>,
}

impl TcpChannel {
    /// Connect to `config.connect_addr`, trying each resolved address.
    pub fn connect(config: &RpcConfig) -> Result<Self> {
        let addr = config.connect_addr.as_str();
        let addrs = addr
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("invalid address '{addr}': {e}")))?;

        let mut last_err = TransportError::Io(std::io::ErrorKind::AddrNotAvailable);
        for socket_addr in addrs {
            match TcpStream::connect_timeout(&socket_addr, config.connect_timeout()) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(config.recv_timeout()))
                        .map_err(TransportError::from)?;
                    info!("tcp: connected to {}", socket_addr);
                    return Self::from_stream(stream, config).map_err(Error::from);
                }
                Err(e) => {
                    debug!("tcp: connect to {} failed: {}", socket_addr, e);
                    last_err = e.into();
                }
            }
        }
        Err(last_err.into())
    }

    /// Wrap an already-connected stream. The read timeout is left as is.
    pub fn from_stream(stream: TcpStream, config: &RpcConfig) -> Result<Self, TransportError> {
        stream.set_write_timeout(Some(config.send_timeout()))?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr().ok();
        Ok(Self {
            stream,
            decoder: FrameDecoder::new(config.max_frame_size()),
            max_frame_size: config.max_frame_size(),
            peer,
        })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Printable peer address for logs.
    pub fn peer_label(&self) -> String {
        self.peer
            .map_or_else(|| "<unknown>".to_owned(), |addr| addr.to_string())
    }

    pub fn set_recv_timeout(&mut self, timeout: Option<std::time::Duration>) -> Result<(), TransportError> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }
}

impl Channel for TcpChannel {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let mut frame = Vec::new();
        encode_frame(message, self.max_frame_size, &mut frame)?;
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut buf = [0u8; READ_BUF_SIZE];
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Ok(frame);
            }
            let n = self.stream.read(&mut buf)?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            self.decoder.feed(&buf[..n])?;
        }
    }

    fn max_message_size(&self) -> Option<usize> {
        Some(self.max_frame_size)
    }
}

/// Listening socket that hands out one [`TcpChannel`] per peer.
pub struct TcpAcceptor {
    listener: TcpListener,
    config: RpcConfig,
}

impl TcpAcceptor {
    /// Bind `config.bind_addr`.
    pub fn bind(config: &RpcConfig) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.bind_addr).map_err(TransportError::from)?;
        listener.set_nonblocking(true).map_err(TransportError::from)?;
        info!(
            "tcp: listening on {}",
            listener
                .local_addr()
                .map_or_else(|_| config.bind_addr.clone(), |a| a.to_string())
        );
        Ok(Self {
            listener,
            config: config.clone(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr().map_err(TransportError::from)?)
    }

    /// Wait for the next peer, polling every `poll_interval_ms`.
    ///
    /// Returns `Ok(None)` once `stop` is raised.
    pub fn accept(&self, stop: &StopSignal) -> Result<Option<TcpChannel>> {
        loop {
            if stop.is_raised() {
                return Ok(None);
            }
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("tcp: accepted {}", peer);
                    stream.set_nonblocking(false).map_err(TransportError::from)?;
                    // Short read timeout so the serve loop keeps checking `stop`.
                    stream
                        .set_read_timeout(Some(self.config.poll_interval()))
                        .map_err(TransportError::from)?;
                    return Ok(Some(TcpChannel::from_stream(stream, &self.config)?));
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(self.config.poll_interval());
                }
                Err(e) => return Err(TransportError::from(e).into()),
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
