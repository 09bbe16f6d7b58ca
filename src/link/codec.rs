//! SerialTransfer-compatible packet framing.
//!
//! Wire format:
//! ```text
//! ┌──────┬────┬──────────┬─────┬──────────────────┬──────┬──────┐
//! │ 0x7E │ id │ overhead │ len │ payload (len B)  │ crc8 │ 0x81 │
//! └──────┴────┴──────────┴─────┴──────────────────┴──────┴──────┘
//! ```
//!
//! The payload is start-byte stuffed: `overhead` is the index of the first
//! `0x7E` in the unstuffed payload (`0xFF` if there is none), and every
//! `0x7E` is replaced by the distance to the next one, or `0` for the last.
//! A distance of exactly 126 is itself `0x7E`; the decoder counts `len`
//! bytes rather than scanning for markers, so that is harmless.  The CRC
//! covers the stuffed payload.
//!
//! [`FrameDecoder`] is a byte-at-a-time state machine.  A single transport
//! read may hold part of a frame or several frames; the decoder handles
//! both, and after any error it resynchronises on the next start byte.

use crate::error::LinkError;

use super::crc::crc8;

pub const START_BYTE: u8 = 0x7E;
pub const STOP_BYTE: u8 = 0x81;
/// Largest payload a frame can carry.
pub const MAX_PAYLOAD: usize = 254;
/// Header (start, id, overhead, len) plus trailer (crc, stop).
pub const FRAME_OVERHEAD: usize = 6;
pub const MAX_FRAME: usize = MAX_PAYLOAD + FRAME_OVERHEAD;

/// Overhead byte meaning "payload contains no start byte".
const NO_START_BYTE: u8 = 0xFF;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Frame `payload` under `packet_id` into `out`.
///
/// Returns the number of bytes written.
pub fn encode_frame(packet_id: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, LinkError> {
    let len = payload.len();
    if len > MAX_PAYLOAD {
        return Err(LinkError::PayloadLength);
    }
    let total = len + FRAME_OVERHEAD;
    if out.len() < total {
        return Err(LinkError::BufferTooSmall);
    }

    let body = &mut out[4..4 + len];
    body.copy_from_slice(payload);
    let overhead = stuff(body);
    let crc = crc8(body);

    out[0] = START_BYTE;
    out[1] = packet_id;
    out[2] = overhead;
    out[3] = len as u8;
    out[4 + len] = crc;
    out[5 + len] = STOP_BYTE;
    Ok(total)
}

/// Frame into an owned fixed-capacity buffer.
pub fn frame(packet_id: u8, payload: &[u8]) -> Result<heapless::Vec<u8, MAX_FRAME>, LinkError> {
    let mut buf = [0u8; MAX_FRAME];
    let n = encode_frame(packet_id, payload, &mut buf)?;
    heapless::Vec::from_slice(&buf[..n]).map_err(|_| LinkError::BufferTooSmall)
}

/// Replace each start byte with the distance to the next one, walking
/// backwards.  Returns the overhead byte.
fn stuff(body: &mut [u8]) -> u8 {
    let overhead = body
        .iter()
        .position(|&b| b == START_BYTE)
        .map_or(NO_START_BYTE, |i| i as u8);

    let mut next: Option<usize> = None;
    for i in (0..body.len()).rev() {
        if body[i] == START_BYTE {
            body[i] = next.map_or(0, |n| (n - i) as u8);
            next = Some(i);
        }
    }
    overhead
}

/// Undo [`stuff`] in place.
fn unstuff(body: &mut [u8], overhead: u8) -> Result<(), LinkError> {
    if overhead == NO_START_BYTE {
        return Ok(());
    }
    let mut i = usize::from(overhead);
    loop {
        let Some(slot) = body.get_mut(i) else {
            return Err(LinkError::PayloadLength);
        };
        let delta = *slot;
        *slot = START_BYTE;
        if delta == 0 {
            return Ok(());
        }
        i += usize::from(delta);
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded frame.  Borrows the decoder's buffer until the next `push`.
#[derive(Debug, PartialEq, Eq)]
pub struct Packet<'a> {
    pub id: u8,
    pub payload: &'a [u8],
}

/// Decoder state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    FindStart,
    PacketId,
    Overhead,
    Length,
    Payload { collected: usize },
    Crc,
    Stop { crc: u8 },
}

/// Streaming frame decoder.
pub struct FrameDecoder {
    state: DecoderState,
    id: u8,
    overhead: u8,
    len: usize,
    payload: [u8; MAX_PAYLOAD],
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::FindStart,
            id: 0,
            overhead: 0,
            len: 0,
            payload: [0; MAX_PAYLOAD],
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some(Ok(packet))` when a frame completes, `Some(Err(_))`
    /// when one is rejected, and `None` while a frame is in progress or the
    /// decoder is hunting for a start byte.
    pub fn push(&mut self, byte: u8) -> Option<Result<Packet<'_>, LinkError>> {
        match self.state {
            DecoderState::FindStart => {
                if byte == START_BYTE {
                    self.state = DecoderState::PacketId;
                }
            }
            DecoderState::PacketId => {
                self.id = byte;
                self.state = DecoderState::Overhead;
            }
            DecoderState::Overhead => {
                self.overhead = byte;
                self.state = DecoderState::Length;
            }
            DecoderState::Length => {
                let len = usize::from(byte);
                if len > MAX_PAYLOAD {
                    self.state = DecoderState::FindStart;
                    return Some(Err(LinkError::PayloadLength));
                }
                self.len = len;
                self.state = if len == 0 {
                    DecoderState::Crc
                } else {
                    DecoderState::Payload { collected: 0 }
                };
            }
            DecoderState::Payload { collected } => {
                self.payload[collected] = byte;
                let collected = collected + 1;
                self.state = if collected == self.len {
                    DecoderState::Crc
                } else {
                    DecoderState::Payload { collected }
                };
            }
            DecoderState::Crc => {
                self.state = DecoderState::Stop { crc: byte };
            }
            DecoderState::Stop { crc } => {
                self.state = DecoderState::FindStart;
                return Some(self.finish(crc, byte));
            }
        }
        None
    }

    fn finish(&mut self, crc: u8, stop: u8) -> Result<Packet<'_>, LinkError> {
        if stop != STOP_BYTE {
            return Err(LinkError::StopByte);
        }
        let body = &mut self.payload[..self.len];
        if crc8(body) != crc {
            return Err(LinkError::Crc);
        }
        unstuff(body, self.overhead)?;
        Ok(Packet {
            id: self.id,
            payload: &self.payload[..self.len],
        })
    }

    /// True when no frame is partially received.
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::FindStart
    }

    /// Reset decoder state (e.g. after a transport reconnect).
    pub fn reset(&mut self) {
        self.state = DecoderState::FindStart;
    }
}
