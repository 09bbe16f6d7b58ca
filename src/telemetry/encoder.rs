//! Fixed-layout telemetry payload.
//!
//! [`Readings`] serialised field by field in declaration order, little
//! endian, no padding: `f32` as 4 bytes, `u16` as 2, `u32` as 4, `u8` and
//! `bool` as 1.
//!
//! ```text
//! off  field                        off  field
//! ───  ──────────────────────────   ───  ───────────────────────────────
//!   0  reservoir.temperature  f32    38  chassis.fan.pwm             u8
//!   4  reservoir.setpoint     f32    39  compressor.running          bool
//!   8  reservoir.level_sense  f32    40  compressor.valve            bool
//!  12  reservoir.level_ref    f32    41  compressor.compressor_time  u32
//!  16  chassis.inside_temp    f32    45  compressor.valve_time       u32
//!  20  chassis.outside_temp   f32    49  pump.running                bool
//!  24  chassis.humidity       f32    50  pump.flow_ok                bool
//!  28  chassis.filter_dp      u16    51  error.alert                 bool
//!  30  chassis.fan.top_tach   f32    52  error.code                  u16
//!  34  chassis.fan.bottom_tach f32   54  (end)
//! ```

use crate::error::LinkError;
use crate::readings::Readings;

/// Encoded size of one [`Readings`] snapshot.
pub const READINGS_LEN: usize = 4 * 9 + 2 + 1 + 1 + 1 + 4 + 4 + 1 + 1 + 1 + 2;

struct Writer {
    buf: [u8; READINGS_LEN],
    pos: usize,
}

impl Writer {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn f32(&mut self, v: f32) {
        self.put(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    fn u16(&mut self, v: u16) {
        self.put(&v.to_le_bytes());
    }

    fn u8(&mut self, v: u8) {
        self.put(&[v]);
    }

    fn bool(&mut self, v: bool) {
        self.u8(u8::from(v));
    }
}

/// Serialise a snapshot.  Total: the output is always [`READINGS_LEN`]
/// bytes.
pub fn encode(r: &Readings) -> [u8; READINGS_LEN] {
    let mut w = Writer { buf: [0; READINGS_LEN], pos: 0 };

    w.f32(r.reservoir.temperature);
    w.f32(r.reservoir.setpoint);
    w.f32(r.reservoir.level_sense);
    w.f32(r.reservoir.level_ref);

    w.f32(r.chassis.inside_temperature);
    w.f32(r.chassis.outside_temperature);
    w.f32(r.chassis.humidity);
    w.u16(r.chassis.filter_dp);
    w.f32(r.chassis.fan.top_tach);
    w.f32(r.chassis.fan.bottom_tach);
    w.u8(r.chassis.fan.pwm);

    w.bool(r.compressor.running);
    w.bool(r.compressor.valve);
    w.u32(r.compressor.compressor_time);
    w.u32(r.compressor.valve_time);

    w.bool(r.pump.running);
    w.bool(r.pump.flow_ok);

    w.bool(r.error.alert);
    w.u16(r.error.code);

    debug_assert_eq!(w.pos, READINGS_LEN);
    w.buf
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    /// Any nonzero byte is `true`.
    fn bool(&mut self) -> bool {
        self.u8() != 0
    }
}

/// Parse a payload produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Readings, LinkError> {
    if bytes.len() != READINGS_LEN {
        return Err(LinkError::PayloadLength);
    }
    let mut rd = Reader { buf: bytes, pos: 0 };
    let mut r = Readings::default();

    r.reservoir.temperature = rd.f32();
    r.reservoir.setpoint = rd.f32();
    r.reservoir.level_sense = rd.f32();
    r.reservoir.level_ref = rd.f32();

    r.chassis.inside_temperature = rd.f32();
    r.chassis.outside_temperature = rd.f32();
    r.chassis.humidity = rd.f32();
    r.chassis.filter_dp = rd.u16();
    r.chassis.fan.top_tach = rd.f32();
    r.chassis.fan.bottom_tach = rd.f32();
    r.chassis.fan.pwm = rd.u8();

    r.compressor.running = rd.bool();
    r.compressor.valve = rd.bool();
    r.compressor.compressor_time = rd.u32();
    r.compressor.valve_time = rd.u32();

    r.pump.running = rd.bool();
    r.pump.flow_ok = rd.bool();

    r.error.alert = rd.bool();
    r.error.code = rd.u16();

    Ok(r)
}
