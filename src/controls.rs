//! Per-Channel Controller State
//!
//! Every MIDI channel carries a fixed block of modulation parameters written
//! by Control Change messages and read by the modulation engine each tick.
//! CC numbers 1-12 are meaningful; everything else is ignored. Out-of-range
//! values are clamped into their control range, never rejected.

use crate::constants::ARP_OCTAVE_STEPS;

/// The designated bank-select controller
///
/// CC8 is canonical here. Period documentation for this class of firmware
/// names CC9 in places; CC9 is treated as reserved and ignored.
pub const BANK_SELECT_CC: u8 = 8;

/// Named per-channel controller, decoded from a raw CC number
///
/// The enumerated dispatch keeps the per-channel state a fixed struct
/// instead of a sparse controller map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlParam {
    /// CC1: vibrato depth (0 = none)
    VibratoDepth,
    /// CC2: vibrato rate (0 = oscillator frozen, zero offset)
    VibratoRate,
    /// CC3: detune, centered at 64
    Detune,
    /// CC4: arpeggiator rate in ticks per step (0 = disabled)
    ArpRate,
    /// CC5: arpeggiator pattern select (value / 8)
    ArpPattern,
    /// CC6: arpeggiator octave shift (7 value ranges)
    ArpOctave,
    /// CC7: simultaneous-voice mode (>= 64 enables)
    Simultaneous,
    /// CC10: velocity sensitivity (0 = static volume)
    VelocitySense,
    /// CC11: envelope attack length in ticks (0 = instantaneous)
    Attack,
    /// CC12: envelope decay length in ticks (0 = instantaneous)
    Decay,
}

impl ControlParam {
    /// Decode a raw controller number; `None` for unassigned controllers
    ///
    /// [`BANK_SELECT_CC`] is deliberately absent: bank selection is global
    /// state handled by the dispatcher, not per-channel modulation state.
    pub fn from_cc(controller: u8) -> Option<Self> {
        match controller {
            1 => Some(ControlParam::VibratoDepth),
            2 => Some(ControlParam::VibratoRate),
            3 => Some(ControlParam::Detune),
            4 => Some(ControlParam::ArpRate),
            5 => Some(ControlParam::ArpPattern),
            6 => Some(ControlParam::ArpOctave),
            7 => Some(ControlParam::Simultaneous),
            10 => Some(ControlParam::VelocitySense),
            11 => Some(ControlParam::Attack),
            12 => Some(ControlParam::Decay),
            _ => None,
        }
    }
}

/// Modulation parameters of one MIDI channel
///
/// Boot defaults are all-zero/off; there is no implicit reset afterwards.
/// `attack_ticks`/`decay_ticks` stay `None` until the channel receives
/// CC11/CC12, letting the preset's default envelope apply until then.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelControls {
    /// Vibrato depth (0-127)
    pub vibrato_depth: u8,
    /// Vibrato rate (0-127)
    pub vibrato_rate: u8,
    /// Signed detune added to the computed tone period
    pub detune: i8,
    /// Arpeggiator ticks per step (0 = root only)
    pub arp_rate: u8,
    /// Arpeggiator pattern index (0-15)
    pub arp_pattern: u8,
    /// Arpeggiator octave shift in semitones
    pub arp_octave: i8,
    /// Simultaneous-voice mode flag
    pub simultaneous: bool,
    /// Velocity sensitivity (0-127)
    pub velocity_sense: u8,
    /// Envelope attack override in ticks, if CC11 was ever received
    pub attack_ticks: Option<u8>,
    /// Envelope decay override in ticks, if CC12 was ever received
    pub decay_ticks: Option<u8>,
}

impl ChannelControls {
    /// Apply a controller value, clamping into the parameter's range
    pub fn apply(&mut self, param: ControlParam, value: u8) {
        let value = value & 0x7F;
        match param {
            ControlParam::VibratoDepth => self.vibrato_depth = value,
            ControlParam::VibratoRate => self.vibrato_rate = value,
            ControlParam::Detune => self.detune = value as i8 - 64,
            ControlParam::ArpRate => self.arp_rate = value,
            ControlParam::ArpPattern => self.arp_pattern = (value / 8).min(15),
            ControlParam::ArpOctave => {
                let step = (value / 19).min(ARP_OCTAVE_STEPS.len() as u8 - 1);
                self.arp_octave = ARP_OCTAVE_STEPS[step as usize];
            }
            ControlParam::Simultaneous => self.simultaneous = value >= 64,
            ControlParam::VelocitySense => self.velocity_sense = value,
            ControlParam::Attack => self.attack_ticks = Some(value),
            ControlParam::Decay => self.decay_ticks = Some(value),
        }
    }
}
