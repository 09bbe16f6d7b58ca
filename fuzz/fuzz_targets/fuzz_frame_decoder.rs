//! Fuzz target: `FrameDecoder::push`
//!
//! Drives arbitrary byte sequences into the streaming frame decoder and
//! asserts that it never panics, never yields an oversized payload, and
//! resynchronises cleanly after a reset.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use chiller::link::FrameDecoder;
use chiller::link::codec::MAX_PAYLOAD;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = FrameDecoder::new();

    for &b in data {
        if let Some(Ok(packet)) = decoder.push(b) {
            assert!(packet.payload.len() <= MAX_PAYLOAD, "payload exceeds MAX_PAYLOAD");
        }
    }

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert!(decoder.is_idle());
    for &b in data {
        let _ = decoder.push(b);
    }
});
