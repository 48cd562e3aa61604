//! Length-prefix framing for byte-stream transports.
//!
//! Wire format:
//! ```text
//! ┌────────────┬──────────────────────────┐
//! │ Length (4B)│ Message payload (N B)    │
//! │ LE u32     │                          │
//! └────────────┴──────────────────────────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete payloads.
//! This handles partial reads: a single socket read may return part of the
//! header, part of the payload, or several frames back to back. A zero
//! length is a valid (empty) message.

use std::collections::VecDeque;

use crate::error::TransportError;

/// Frame header size (4-byte little-endian length).
pub const HEADER_SIZE: usize = 4;

/// Decoder state machine.
enum DecoderState {
    /// Waiting for header bytes.
    ReadingHeader { collected: usize },
    /// Header received, reading payload.
    ReadingPayload { expected: usize },
}

/// Streaming frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    header_buf: [u8; HEADER_SIZE],
    payload_buf: Vec<u8>,
    ready: VecDeque<Vec<u8>>,
    max_frame_size: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            state: DecoderState::ReadingHeader { collected: 0 },
            header_buf: [0; HEADER_SIZE],
            payload_buf: Vec::new(),
            ready: VecDeque::new(),
            max_frame_size,
        }
    }

    /// Feed bytes into the decoder.
    ///
    /// Every frame completed by `data` is queued for [`next_frame`].
    /// An oversized header poisons the stream: the decoder resets and the
    /// caller is expected to drop the connection.
    ///
    /// [`next_frame`]: Self::next_frame
    pub fn feed(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut offset = 0;

        while offset < data.len() {
            match &mut self.state {
                DecoderState::ReadingHeader { collected } => {
                    let needed = HEADER_SIZE - *collected;
                    let to_copy = needed.min(data.len() - offset);

                    self.header_buf[*collected..*collected + to_copy]
                        .copy_from_slice(&data[offset..offset + to_copy]);

                    *collected += to_copy;
                    offset += to_copy;

                    if *collected == HEADER_SIZE {
                        let expected = u32::from_le_bytes(self.header_buf) as usize;
                        if expected > self.max_frame_size {
                            self.reset();
                            return Err(TransportError::FrameTooLarge {
                                len: expected,
                                max: self.max_frame_size,
                            });
                        }
                        self.begin_payload(expected);
                    }
                }

                DecoderState::ReadingPayload { expected } => {
                    let needed = *expected - self.payload_buf.len();
                    let to_copy = needed.min(data.len() - offset);

                    self.payload_buf
                        .extend_from_slice(&data[offset..offset + to_copy]);
                    offset += to_copy;

                    if self.payload_buf.len() == *expected {
                        self.finish_payload();
                    }
                }
            }
        }

        Ok(())
    }

    /// Pop the oldest complete payload, if any.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.ready.pop_front()
    }

    /// True when a partial frame is buffered.
    pub fn is_mid_frame(&self) -> bool {
        !matches!(self.state, DecoderState::ReadingHeader { collected: 0 })
    }

    /// Reset decoder state (e.g. after a reconnect).
    pub fn reset(&mut self) {
        self.state = DecoderState::ReadingHeader { collected: 0 };
        self.payload_buf.clear();
        self.ready.clear();
    }

    fn begin_payload(&mut self, expected: usize) {
        self.payload_buf = Vec::with_capacity(expected);
        if expected == 0 {
            self.finish_payload();
        } else {
            self.state = DecoderState::ReadingPayload { expected };
        }
    }

    fn finish_payload(&mut self) {
        let payload = std::mem::take(&mut self.payload_buf);
        self.ready.push_back(payload);
        self.state = DecoderState::ReadingHeader { collected: 0 };
    }
}

/// Append `[LE-u32 length][payload]` to `out`.
pub fn encode_frame(
    payload: &[u8],
    max_frame_size: usize,
    out: &mut Vec<u8>,
) -> Result<(), TransportError> {
    let too_large = TransportError::FrameTooLarge {
        len: payload.len(),
        max: max_frame_size,
    };
    if payload.len() > max_frame_size {
        return Err(too_large);
    }
    let len = u32::try_from(payload.len()).map_err(|_| too_large)?;

    out.reserve(HEADER_SIZE + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────
