//! Request and reply envelopes.
//!
//! ```text
//! Request:  [usize len][service id bytes][arg 0][arg 1]...[arg N]
//! Reply:    [0x00][return value bytes]            success (empty for void)
//!           [0x01][u8 kind][usize len][message]   error
//! ```
//!
//! The request is exactly the codec encoding of `(service_id, args...)`.
//! The reply status byte lets the server report an unknown service or a
//! malformed argument tuple without the client mistaking it for a value.

use crate::error::{DecodeError, Error, RemoteError, RemoteErrorKind};

use super::codec::{Decode, Encode, Reader};

/// Reply status: handler ran, payload follows.
pub const STATUS_OK: u8 = 0x00;
/// Reply status: request failed, `(kind, message)` follows.
pub const STATUS_ERR: u8 = 0x01;

/// Encode a request envelope for `service_id` with an argument tuple.
pub fn encode_request<A: Encode + ?Sized>(service_id: &str, args: &A) -> Vec<u8> {
    let mut out = Vec::new();
    service_id.encode(&mut out);
    args.encode(&mut out);
    out
}

/// A decoded request header with a cursor positioned at the argument tuple.
#[derive(Debug)]
pub struct Request<'a> {
    pub service_id: String,
    pub args: Reader<'a>,
}

impl<'a> Request<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let mut args = Reader::new(bytes);
        let service_id = String::decode(&mut args)?;
        Ok(Self { service_id, args })
    }
}

/// Outcome of one request as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Encoded return value; empty for void-equivalent handlers.
    Ok(Vec<u8>),
    Err(RemoteError),
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Ok(payload) => {
                let mut out = Vec::with_capacity(1 + payload.len());
                out.push(STATUS_OK);
                out.extend_from_slice(payload);
                out
            }
            Self::Err(e) => {
                let mut out = vec![STATUS_ERR];
                (e.kind.as_u8(), e.message.as_str()).encode(&mut out);
                out
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut input = Reader::new(bytes);
        match u8::decode(&mut input)? {
            STATUS_OK => Ok(Self::Ok(input.rest().to_vec())),
            STATUS_ERR => {
                let (kind, message) = <(u8, String)>::decode(&mut input)?;
                Ok(Self::Err(RemoteError {
                    kind: RemoteErrorKind::from_u8(kind),
                    message,
                }))
            }
            other => Err(DecodeError::InvalidStatus(other)),
        }
    }

    /// Build an error reply from a server-side failure.
    pub fn from_error(e: &Error) -> Self {
        Self::Err(RemoteError::from(e))
    }

    pub fn into_result(self) -> Result<Vec<u8>, RemoteError> {
        match self {
            Self::Ok(payload) => Ok(payload),
            Self::Err(e) => Err(e),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
