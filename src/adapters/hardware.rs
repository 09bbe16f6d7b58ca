//! Hardware adapter: bridges board outputs to the [`ActuatorPort`].
//!
//! Generic over the `embedded-hal` 1.0 traits, so the same code drives the
//! MCU's GPIO/LEDC peripherals in firmware and the simulated pins on the
//! host.  Relays are active high.  The flow switch pulls its input low
//! while coolant is flowing.

use embedded_hal::digital::{InputPin, OutputPin, PinState, StatefulOutputPin};
use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{ActuatorPort, RelayState};
use crate::error::{ActuatorError, SensorError};

/// Full-scale fan duty as seen by the control core.
const FAN_DUTY_MAX: u16 = 255;

// ── Relay and PWM outputs ─────────────────────────────────────

/// The four relays and the fan PWM channel.
pub struct OutputBank<R, F> {
    valve: R,
    compressor: R,
    alarm: R,
    pump: R,
    fan: F,
    /// Last duty the PWM accepted.
    fan_duty: u8,
}

impl<R, F> OutputBank<R, F>
where
    R: StatefulOutputPin,
    F: SetDutyCycle,
{
    pub fn new(valve: R, compressor: R, alarm: R, pump: R, fan: F) -> Self {
        Self {
            valve,
            compressor,
            alarm,
            pump,
            fan,
            fan_duty: 0,
        }
    }

    /// Switch the coolant pump.  The control core only reads the pump
    /// back; the board layer decides when it runs.
    pub fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        drive(&mut self.pump, on)
    }
}

impl<R, F> ActuatorPort for OutputBank<R, F>
where
    R: StatefulOutputPin,
    F: SetDutyCycle,
{
    fn set_valve(&mut self, on: bool) -> Result<(), ActuatorError> {
        drive(&mut self.valve, on)
    }

    fn set_compressor(&mut self, on: bool) -> Result<(), ActuatorError> {
        drive(&mut self.compressor, on)
    }

    fn set_alarm(&mut self, on: bool) -> Result<(), ActuatorError> {
        drive(&mut self.alarm, on)
    }

    fn set_fan_pwm(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.fan
            .set_duty_cycle_fraction(u16::from(duty), FAN_DUTY_MAX)
            .map_err(|_| ActuatorError::PwmWriteFailed)?;
        self.fan_duty = duty;
        Ok(())
    }

    fn relay_state(&mut self) -> Result<RelayState, ActuatorError> {
        Ok(RelayState {
            valve: sense(&mut self.valve)?,
            compressor: sense(&mut self.compressor)?,
            alarm: sense(&mut self.alarm)?,
            pump: sense(&mut self.pump)?,
            fan_pwm: self.fan_duty,
        })
    }
}

fn drive(pin: &mut impl OutputPin, on: bool) -> Result<(), ActuatorError> {
    pin.set_state(PinState::from(on))
        .map_err(|_| ActuatorError::GpioWriteFailed)
}

fn sense(pin: &mut impl StatefulOutputPin) -> Result<bool, ActuatorError> {
    pin.is_set_high().map_err(|_| ActuatorError::GpioReadFailed)
}

// ── Flow switch ───────────────────────────────────────────────

/// Paddle flow switch on a pulled-up input.
pub struct FlowSwitch<I> {
    pin: I,
}

impl<I: InputPin> FlowSwitch<I> {
    pub fn new(pin: I) -> Self {
        Self { pin }
    }

    /// `true` while coolant is flowing (input pulled low).
    pub fn is_flowing(&mut self) -> Result<bool, SensorError> {
        self.pin.is_low().map_err(|_| SensorError::GpioReadFailed)
    }

    pub fn pin_mut(&mut self) -> &mut I {
        &mut self.pin
    }
}
