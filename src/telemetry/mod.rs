//! Telemetry: one framed [`Readings`] snapshot per control cycle.
//!
//! The publisher encodes, frames and writes; delivery is best effort.  A
//! frame the transport refuses is counted and dropped, never retried: the
//! next cycle's snapshot supersedes it anyway.

pub mod encoder;

use log::warn;

use crate::error::LinkError;
use crate::link::codec::{FrameDecoder, MAX_FRAME, encode_frame};
use crate::link::transport::Transport;
use crate::readings::Readings;

pub use encoder::{READINGS_LEN, decode, encode};

/// Packet id carried by telemetry frames.
pub const TELEMETRY_PACKET_ID: u8 = 0;

/// Frames and sends snapshots over a [`Transport`].
#[derive(Debug, Default)]
pub struct TelemetryPublisher {
    sent: u32,
    dropped: u32,
}

impl TelemetryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send one snapshot.  A failed or short write is counted as dropped
    /// and reported as [`LinkError::Transport`].
    pub fn publish<T: Transport>(
        &mut self,
        readings: &Readings,
        transport: &mut T,
    ) -> Result<(), LinkError> {
        let payload = encode(readings);
        let mut frame = [0u8; MAX_FRAME];
        let len = encode_frame(TELEMETRY_PACKET_ID, &payload, &mut frame)?;

        match transport.write(&frame[..len]) {
            Ok(n) if n == len => {}
            Ok(n) => return Err(self.drop_frame(&format!("short write {n}/{len}"))),
            Err(e) => return Err(self.drop_frame(&format!("{e:?}"))),
        }
        if let Err(e) = transport.flush() {
            warn!("telemetry flush failed: {e:?}");
        }
        self.sent = self.sent.wrapping_add(1);
        Ok(())
    }

    fn drop_frame(&mut self, reason: &str) -> LinkError {
        self.dropped = self.dropped.wrapping_add(1);
        warn!("telemetry frame dropped ({reason}), {} dropped so far", self.dropped);
        LinkError::Transport
    }

    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

/// Host-side counterpart: turns a byte stream back into snapshots.
#[derive(Default)]
pub struct TelemetryReader {
    decoder: FrameDecoder,
}

impl TelemetryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes; `on_frame` runs once per completed frame.
    ///
    /// Frames with another packet id are skipped.
    pub fn feed(&mut self, bytes: &[u8], mut on_frame: impl FnMut(Result<Readings, LinkError>)) {
        for &b in bytes {
            match self.decoder.push(b) {
                Some(Ok(packet)) if packet.id == TELEMETRY_PACKET_ID => {
                    on_frame(decode(packet.payload));
                }
                Some(Ok(_)) | None => {}
                Some(Err(e)) => on_frame(Err(e)),
            }
        }
    }
}
