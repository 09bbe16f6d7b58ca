//! Serial link to the host.
//!
//! Packet framing compatible with the SerialTransfer protocol used by the
//! host-side tooling, its CRC-8, and the byte transport underneath.

pub mod codec;
pub mod crc;
pub mod transport;

pub use codec::{FrameDecoder, Packet, encode_frame, frame};
pub use transport::Transport;
