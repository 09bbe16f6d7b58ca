//! Property tests for the control core and the serial link.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use chiller::config::{RuntimeConfig, Settings};
use chiller::control::{ControlContext, CoolingState, OutputCommands, thermal};
use chiller::link::{FrameDecoder, frame};
use chiller::readings::Readings;
use chiller::telemetry::{decode, encode};
use proptest::prelude::*;

// ── Dead band ─────────────────────────────────────────────────

fn arb_commands() -> impl Strategy<Value = OutputCommands> {
    prop_oneof![
        Just(OutputCommands::all_off()),
        Just(OutputCommands { valve: true, compressor: false, fan_pwm: 0 }),
        Just(OutputCommands { valve: true, compressor: true, fan_pwm: 255 }),
    ]
}

proptest! {
    /// Inside (SP − H, SP + H] the state machine never moves, whatever the
    /// state and however old the lockout timers are.
    #[test]
    fn dead_band_is_stable(
        commands in arb_commands(),
        offset in -1.99f32..=2.0,
        since_compressor in 0u32..=1_000_000,
        since_valve in 0u32..=1_000_000,
        cycles in 1usize..20,
    ) {
        let settings = Settings::default();
        let now = 2_000_000u32;
        let mut ctx = ControlContext::new(&RuntimeConfig::default(), now);
        ctx.commands = commands;
        ctx.timers.last_compressor_toggle = now - since_compressor;
        ctx.timers.last_valve_toggle = now - since_valve;
        ctx.readings.reservoir.temperature = ctx.readings.reservoir.setpoint + offset;

        let before = ctx.state();
        for i in 0..cycles as u32 {
            let t = now + i * 1_000;
            ctx.refresh_elapsed(t);
            prop_assert_eq!(thermal::step(&mut ctx, &settings, t), None);
        }
        prop_assert_eq!(ctx.state(), before);
        prop_assert_eq!(ctx.commands, commands);
    }

    /// A hot reservoir never runs the compressor before the valve has been
    /// open for the full valve lockout.
    #[test]
    fn compressor_never_precedes_valve_lockout(
        excess in 2.01f32..20.0,
        start in any::<u32>(),
        cycles in 1u32..120,
    ) {
        let settings = Settings::default();
        let mut ctx = ControlContext::new(&RuntimeConfig::default(), start);
        ctx.readings.reservoir.temperature = ctx.readings.reservoir.setpoint + excess;

        let mut valve_opened_at = None;
        for i in 1..=cycles {
            let t = start.wrapping_add(i * 1_000);
            ctx.refresh_elapsed(t);
            thermal::step(&mut ctx, &settings, t);
            if ctx.commands.valve && valve_opened_at.is_none() {
                valve_opened_at = Some(t);
            }
            if ctx.state() == CoolingState::Cooling {
                let opened = valve_opened_at.unwrap();
                prop_assert!(t.wrapping_sub(opened) >= settings.valve_lockout);
                prop_assert!(t.wrapping_sub(start) >= settings.compressor_lockout);
            }
        }
    }
}

// ── Framing ───────────────────────────────────────────────────

proptest! {
    /// Any payload, start bytes included, survives framing and arbitrary
    /// leading noise.
    #[test]
    fn frame_round_trip(
        id in any::<u8>(),
        payload in proptest::collection::vec(
            prop_oneof![Just(0x7Eu8), any::<u8>()], 0..=254),
        noise in proptest::collection::vec(0u8..0x7E, 0..16),
    ) {
        let f = frame(id, &payload).unwrap();
        let mut decoder = FrameDecoder::new();
        let mut got = Vec::new();
        for &b in noise.iter().chain(f.iter()) {
            if let Some(result) = decoder.push(b) {
                let packet = result.unwrap();
                got.push((packet.id, packet.payload.to_vec()));
            }
        }
        prop_assert_eq!(got, vec![(id, payload)]);
        prop_assert!(decoder.is_idle());
    }

    /// Random garbage never panics the decoder.
    #[test]
    fn decoder_survives_garbage(bytes in proptest::collection::vec(any::<u8>(), 0..1024)) {
        let mut decoder = FrameDecoder::new();
        for b in bytes {
            let _ = decoder.push(b);
        }
    }
}

// ── Telemetry payload ─────────────────────────────────────────

fn arb_readings() -> impl Strategy<Value = Readings> {
    (
        proptest::array::uniform7(-200.0f32..200.0),
        any::<u16>(),
        (0.0f32..5_000.0, 0.0f32..5_000.0, any::<u8>()),
        proptest::array::uniform6(any::<bool>()),
        (any::<u32>(), any::<u32>(), any::<u16>()),
    )
        .prop_map(|(f, dp, (top, bottom, pwm), b, (ct, vt, code))| {
            let mut r = Readings::default();
            r.reservoir.temperature = f[0];
            r.reservoir.setpoint = f[1];
            r.reservoir.level_sense = f[2];
            r.reservoir.level_ref = f[3];
            r.chassis.inside_temperature = f[4];
            r.chassis.outside_temperature = f[5];
            r.chassis.humidity = f[6];
            r.chassis.filter_dp = dp;
            r.chassis.fan.top_tach = top;
            r.chassis.fan.bottom_tach = bottom;
            r.chassis.fan.pwm = pwm;
            r.compressor.running = b[0];
            r.compressor.valve = b[1];
            r.compressor.compressor_time = ct;
            r.compressor.valve_time = vt;
            r.pump.running = b[2];
            r.pump.flow_ok = b[3];
            r.error.alert = b[4];
            r.error.code = code;
            r
        })
}

/// Every float field drawn from raw bit patterns: NaNs, infinities,
/// signed zeros and subnormals included.
fn arb_raw_readings() -> impl Strategy<Value = Readings> {
    (proptest::array::uniform9(any::<u32>()), arb_readings()).prop_map(|(bits, mut r)| {
        let f = bits.map(f32::from_bits);
        r.reservoir.temperature = f[0];
        r.reservoir.setpoint = f[1];
        r.reservoir.level_sense = f[2];
        r.reservoir.level_ref = f[3];
        r.chassis.inside_temperature = f[4];
        r.chassis.outside_temperature = f[5];
        r.chassis.humidity = f[6];
        r.chassis.fan.top_tach = f[7];
        r.chassis.fan.bottom_tach = f[8];
        r
    })
}

proptest! {
    #[test]
    fn telemetry_payload_round_trip(r in arb_readings()) {
        prop_assert_eq!(decode(&encode(&r)), Ok(r));
    }

    /// Decoding and re-encoding reproduces the payload byte for byte.
    #[test]
    fn telemetry_payload_is_bit_exact(r in arb_raw_readings()) {
        let bytes = encode(&r);
        let decoded = decode(&bytes).unwrap();
        prop_assert_eq!(encode(&decoded), bytes);
        prop_assert_eq!(
            decoded.reservoir.temperature.to_bits(),
            r.reservoir.temperature.to_bits()
        );
        prop_assert_eq!(
            decoded.chassis.fan.bottom_tach.to_bits(),
            r.chassis.fan.bottom_tach.to_bits()
        );
    }
}
