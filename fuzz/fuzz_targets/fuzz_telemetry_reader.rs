//! Fuzz target: `TelemetryReader::feed`
//!
//! Any decoded snapshot must re-encode to a frame that decodes to the same
//! snapshot.
//!
//! cargo fuzz run fuzz_telemetry_reader

#![no_main]

use chiller::telemetry::{TelemetryReader, decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = TelemetryReader::new();
    reader.feed(data, |result| {
        if let Ok(readings) = result {
            let bytes = encode(&readings);
            let again = decode(&bytes).expect("encoded payload has the right length");
            // NaN floats compare unequal, so compare the wire bytes.
            assert_eq!(encode(&again), bytes);
        }
    });
});
