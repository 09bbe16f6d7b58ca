//! End-to-end tests for the ChillerService → state machine → relays
//! pipeline, driven by simulated time against the mock board.

use crate::mock_hw::{ActuatorCall, Bench};

use chiller::app::commands::AppCommand;
use chiller::app::events::AppEvent;
use chiller::config::Settings;
use chiller::control::CoolingState;
use chiller::error::{Error, FaultCode};

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_drives_safe_outputs_and_reports_idle() {
    let bench = Bench::new(25.0);
    assert_eq!(bench.app.state(), CoolingState::Idle);
    assert_eq!(bench.sink.events[0], AppEvent::Started(CoolingState::Idle));

    let relays = bench.hw.relays;
    assert!(!relays.valve && !relays.compressor && !relays.alarm);
    assert_eq!(relays.fan_pwm, 0);
}

// ── Engage sequence ───────────────────────────────────────────

#[test]
fn hot_reservoir_opens_valve_then_starts_compressor_after_lockout() {
    let mut bench = Bench::new(25.0);

    let r = bench.cycle();
    assert_eq!(bench.app.state(), CoolingState::ValveOpen);
    assert!(r.compressor.valve);
    assert!(!r.compressor.running);
    assert_eq!(r.compressor.valve_time, 0);

    // The compressor lockout runs from power-up.
    bench.run_until(59_000);
    assert_eq!(bench.app.state(), CoolingState::ValveOpen);
    assert_eq!(bench.hw.count(ActuatorCall::Compressor(true)), 0);

    let r = bench.cycle();
    assert_eq!(bench.now_ms, 60_000);
    assert_eq!(bench.app.state(), CoolingState::Cooling);
    assert!(r.compressor.running);
    assert_eq!(r.compressor.compressor_time, 0);
    assert_eq!(r.chassis.fan.pwm, 255);

    assert!(bench.sink.notable().contains(&&AppEvent::StateChanged {
        from: CoolingState::ValveOpen,
        to: CoolingState::Cooling,
    }));
}

#[test]
fn compressor_waits_full_valve_lockout_after_valve_opens() {
    let settings = Settings {
        compressor_lockout: 1_000,
        ..Settings::default()
    };
    let mut bench = Bench::with_settings(25.0, settings);

    bench.cycle(); // valve opens at t = 1000
    bench.run_until(30_000);
    assert_eq!(bench.app.state(), CoolingState::ValveOpen);

    bench.cycle();
    assert_eq!(bench.now_ms, 31_000);
    assert_eq!(bench.app.state(), CoolingState::Cooling);
}

#[test]
fn upper_threshold_is_exclusive() {
    let mut bench = Bench::new(22.0);
    bench.run_until(10_000);
    assert_eq!(bench.app.state(), CoolingState::Idle);

    bench.hw.reservoir_c = 22.1;
    bench.cycle();
    assert_eq!(bench.app.state(), CoolingState::ValveOpen);
}

// ── Dead band and disengage ───────────────────────────────────

#[test]
fn dead_band_holds_cooling_and_disengage_waits_for_lockout() {
    let mut bench = Bench::new(25.0);
    bench.run_until(60_000);
    assert_eq!(bench.app.state(), CoolingState::Cooling);

    // Inside the band: nothing changes.
    bench.hw.reservoir_c = 20.0;
    bench.run_until(100_000);
    assert_eq!(bench.app.state(), CoolingState::Cooling);

    // Cold enough, but the compressor started at 60 s.
    bench.hw.reservoir_c = 18.0;
    bench.run_until(119_000);
    assert_eq!(bench.app.state(), CoolingState::Cooling);

    let r = bench.cycle();
    assert_eq!(bench.app.state(), CoolingState::Idle);
    assert!(!r.compressor.running && !r.compressor.valve);
    assert_eq!(r.chassis.fan.pwm, 0);
    assert_eq!(r.error.code, 0, "stopping the fans must not look like a stall");
}

#[test]
fn running_override_off_keeps_outputs_idle() {
    let mut bench = Bench::new(25.0);
    bench
        .app
        .handle_command(AppCommand::SetRunning(false), &mut bench.hw, &mut bench.sink)
        .unwrap();
    bench.run_until(90_000);

    assert!(!bench.app.running());
    assert_eq!(bench.app.state(), CoolingState::Idle);
    assert_eq!(bench.hw.count(ActuatorCall::Valve(true)), 0);
}

#[test]
fn setpoint_command_moves_the_band() {
    let mut bench = Bench::new(25.0);
    bench
        .app
        .handle_command(AppCommand::SetSetpoint(24.0), &mut bench.hw, &mut bench.sink)
        .unwrap();
    let r = bench.cycle();
    assert_eq!(r.reservoir.setpoint, 24.0);
    assert_eq!(bench.app.state(), CoolingState::Idle);

    let err = bench
        .app
        .handle_command(AppCommand::SetSetpoint(f32::NAN), &mut bench.hw, &mut bench.sink)
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(bench.app.readings().reservoir.setpoint, 24.0);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn fan_stall_latches_alarm_without_stopping_cooling() {
    let mut bench = Bench::new(25.0);
    bench.run_until(70_000);
    assert_eq!(bench.app.state(), CoolingState::Cooling);
    assert!(bench.app.readings().chassis.fan.top_tach > 2_900.0);
    assert_eq!(bench.app.readings().error.code, 0);

    bench.hw.top_fan_stalled = true;
    let r = bench.cycle();
    assert!(r.error.alert);
    assert_eq!(r.error.code, FaultCode::TopFanStall.code());
    assert_eq!(r.chassis.fan.top_tach, 0.0);
    assert!(bench.hw.relays.alarm);
    assert_eq!(bench.app.state(), CoolingState::Cooling);

    // Both stalled: the later check owns the single slot.
    bench.hw.bottom_fan_stalled = true;
    let r = bench.cycle();
    assert_eq!(r.error.code, FaultCode::BottomFanStall.code());
    assert_eq!(
        bench.app.cycle_faults(),
        &[FaultCode::TopFanStall, FaultCode::BottomFanStall]
    );
}

#[test]
fn fans_stalled_from_the_start_latch_on_first_closed_window() {
    let mut bench = Bench::new(25.0);
    bench.hw.top_fan_stalled = true;
    bench.hw.bottom_fan_stalled = true;

    // Compressor and fans come on at 60 s; that cycle reads back PWM 0.
    let r = bench.run_until_then_cycle(60_000);
    assert_eq!(r.chassis.fan.pwm, 255);
    assert_eq!(r.error.code, 0);

    // The next window ran at full duty with no pulses.
    let r = bench.cycle();
    assert!(r.error.alert);
    assert_eq!(r.error.code, FaultCode::BottomFanStall.code());
    assert_eq!(r.chassis.fan.top_tach, 0.0);
    assert_eq!(r.chassis.fan.bottom_tach, 0.0);
    assert_eq!(
        bench.app.cycle_faults(),
        &[FaultCode::TopFanStall, FaultCode::BottomFanStall]
    );
    assert_eq!(bench.app.state(), CoolingState::Cooling);
}

#[test]
fn probe_disconnect_reports_its_own_code() {
    let mut bench = Bench::new(25.0);
    bench.hw.reservoir_disconnected = true;

    let r = bench.cycle();
    assert_eq!(r.reservoir.temperature, 0.0);
    assert_eq!(r.error.code, FaultCode::ReservoirProbeDisconnected.code());
    assert_eq!(bench.app.cycle_faults(), &[FaultCode::ReservoirProbeDisconnected]);
    assert_eq!(bench.app.state(), CoolingState::Idle);
}

#[test]
fn latched_fault_survives_recovery_until_cleared() {
    let mut bench = Bench::new(20.0);
    bench.hw.flowing = false;
    let r = bench.cycle();
    assert_eq!(r.error.code, FaultCode::PumpNoFlow.code());

    bench.hw.flowing = true;
    bench.run_until(5_000);
    assert!(bench.app.readings().error.alert);
    assert_eq!(bench.app.readings().error.code, FaultCode::PumpNoFlow.code());
    assert!(bench.app.cycle_faults().is_empty());

    bench
        .app
        .handle_command(AppCommand::ClearFault, &mut bench.hw, &mut bench.sink)
        .unwrap();
    assert!(!bench.hw.relays.alarm);
    assert_eq!(bench.sink.notable().last(), Some(&&AppEvent::FaultCleared));

    let r = bench.cycle();
    assert!(!r.error.alert);
    assert_eq!(r.error.code, 0);
}

#[test]
fn fault_event_emitted_once_per_latch() {
    let mut bench = Bench::new(20.0);
    bench.hw.outside_c = 101.0;
    bench.run_until(5_000);

    let latched: Vec<_> = bench
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::FaultLatched(_)))
        .collect();
    assert_eq!(latched, vec![&AppEvent::FaultLatched(FaultCode::OutsideTemperatureHigh)]);
}

// ── Actuator failures ─────────────────────────────────────────

#[test]
fn failed_relay_write_shows_in_readback_and_is_retried() {
    let mut bench = Bench::new(25.0);
    bench.hw.fail_compressor_writes = true;
    bench.run_until(62_000);

    // Commanded on, but the relay never moved.
    assert_eq!(bench.app.state(), CoolingState::Cooling);
    assert!(!bench.app.readings().compressor.running);
    assert!(bench.hw.count(ActuatorCall::Compressor(true)) >= 3);

    bench.hw.fail_compressor_writes = false;
    let r = bench.cycle();
    assert!(r.compressor.running);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn every_tick_emits_one_telemetry_snapshot() {
    let mut bench = Bench::new(20.0);
    let mut last = None;
    for _ in 0..5 {
        last = Some(bench.cycle());
    }
    let snapshots: Vec<_> = bench
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(r) => Some(*r),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 5);
    assert_eq!(snapshots.last().copied(), last);
    assert_eq!(bench.app.tick_count(), 5);
}
