//! Unified error types for the RPC framework.
//!
//! A single `Error` enum that every subsystem converts into, so the serve
//! loop and the call proxy handle failures uniformly. The codec, transport
//! and remote-reply failures each keep their own small enum and convert
//! upward via `From`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value could not be decoded from the byte stream.
    Decode(DecodeError),
    /// No handler is registered under the requested service id.
    UnknownService(String),
    /// The channel failed to send or receive a message.
    Transport(TransportError),
    /// The server answered with an error reply.
    Remote(RemoteError),
    /// A registered callable panicked; carries the panic message.
    HandlerPanicked(String),
    /// An encoded reply exceeds what the channel can carry.
    ReplyTooLarge { len: usize, max: usize },
    /// Configuration is invalid or could not be loaded.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::UnknownService(id) => write!(f, "unknown service '{id}'"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Remote(e) => write!(f, "remote: {e}"),
            Self::HandlerPanicked(msg) => write!(f, "handler panicked: {msg}"),
            Self::ReplyTooLarge { len, max } => {
                write!(f, "reply of {len} bytes exceeds maximum {max}")
            }
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes remain than the shape being decoded requires.
    Underrun { needed: usize, remaining: usize },
    /// A text body is not valid UTF-8.
    InvalidUtf8,
    /// A `bool` byte other than 0 or 1.
    InvalidBool(u8),
    /// A `char` scalar that is not a Unicode scalar value.
    InvalidChar(u32),
    /// A reply status byte this build does not understand.
    InvalidStatus(u8),
    /// A message decoded more zero-width container elements than allowed.
    ZeroWidthLimit { limit: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underrun { needed, remaining } => {
                write!(f, "underrun (needed {needed} bytes, {remaining} remaining)")
            }
            Self::InvalidUtf8 => write!(f, "text is not valid UTF-8"),
            Self::InvalidBool(b) => write!(f, "invalid bool byte 0x{b:02x}"),
            Self::InvalidChar(c) => write!(f, "invalid char scalar 0x{c:x}"),
            Self::InvalidStatus(b) => write!(f, "invalid reply status 0x{b:02x}"),
            Self::ZeroWidthLimit { limit } => {
                write!(f, "more than {limit} zero-width elements in one message")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// A configured send/receive timeout elapsed.
    TimedOut,
    /// The peer closed the channel.
    Closed,
    /// An earlier reply never arrived, so request/reply pairing is lost.
    OutOfSync,
    /// A frame header announced a payload above the configured maximum.
    FrameTooLarge { len: usize, max: usize },
    /// Any other I/O failure.
    Io(std::io::ErrorKind),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => write!(f, "timed out"),
            Self::Closed => write!(f, "channel closed"),
            Self::OutOfSync => write!(f, "channel out of lock-step after a lost reply"),
            Self::FrameTooLarge { len, max } => {
                write!(f, "frame of {len} bytes exceeds maximum {max}")
            }
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => Self::TimedOut,
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => Self::Closed,
            kind => Self::Io(kind),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Remote (error reply) errors
// ---------------------------------------------------------------------------

/// Category of a failure reported back to the caller in an error reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RemoteErrorKind {
    /// The service id has no registered handler.
    UnknownService = 1,
    /// The request ended before the argument tuple was complete.
    DecodeUnderrun = 2,
    /// The request could not be decoded for any other reason.
    BadRequest = 3,
    /// The handler panicked while serving the request.
    HandlerPanicked = 4,
    /// The handler's reply does not fit in one message.
    ReplyTooLarge = 5,
}

impl RemoteErrorKind {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Map a wire byte back to a kind. Unknown bytes collapse to
    /// `BadRequest` so newer servers stay readable by older clients.
    pub const fn from_u8(b: u8) -> Self {
        match b {
            1 => Self::UnknownService,
            2 => Self::DecodeUnderrun,
            4 => Self::HandlerPanicked,
            5 => Self::ReplyTooLarge,
            _ => Self::BadRequest,
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownService => write!(f, "unknown service"),
            Self::DecodeUnderrun => write!(f, "decode underrun"),
            Self::BadRequest => write!(f, "bad request"),
            Self::HandlerPanicked => write!(f, "handler panicked"),
            Self::ReplyTooLarge => write!(f, "reply too large"),
        }
    }
}

/// An error reply as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RemoteError {}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

impl From<&Error> for RemoteError {
    fn from(e: &Error) -> Self {
        let kind = match e {
            Error::UnknownService(_) => RemoteErrorKind::UnknownService,
            Error::Decode(DecodeError::Underrun { .. }) => RemoteErrorKind::DecodeUnderrun,
            Error::HandlerPanicked(_) => RemoteErrorKind::HandlerPanicked,
            Error::ReplyTooLarge { .. } => RemoteErrorKind::ReplyTooLarge,
            _ => RemoteErrorKind::BadRequest,
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
