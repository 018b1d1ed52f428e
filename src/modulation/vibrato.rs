//! Vibrato Oscillator
//!
//! A stepped triangle oscillator producing a small signed offset that is
//! added to the voice's tone period each modulation tick. Rate and depth
//! come from the channel's controller state. A rate of 0 disables vibrato
//! entirely: the phase does not advance and the offset is exactly zero.

use crate::constants::VIBRATO_TABLE;

/// Per-voice vibrato phase accumulator
#[derive(Debug, Clone, Copy, Default)]
pub struct VibratoState {
    /// Phase accumulator; the table index is the top 5 bits of 12
    phase: u16,
}

impl VibratoState {
    /// Advance by `rate` and return the period offset for this tick
    ///
    /// `rate` 0 freezes the oscillator and yields zero. At rate 127 one
    /// full cycle takes about 32 ticks (~6 Hz at the 200 Hz tick).
    pub fn tick(&mut self, rate: u8, depth: u8) -> i16 {
        if rate == 0 || depth == 0 {
            return 0;
        }
        self.phase = (self.phase + rate as u16) & 0x0FFF;
        let step = VIBRATO_TABLE[(self.phase >> 7) as usize & 0x1F] as i32;
        (step * depth as i32 / 127) as i16
    }
}
