//! Register Image Composition and Bus Writes
//!
//! The engine never talks to the chip piecemeal: every modulation tick it
//! rebuilds a full mirror of the 14 sound registers (R0-R13) from voice and
//! sample state and flushes it through the [`PsgBus`]. R13 is the exception
//! to the blanket flush: writing the envelope-shape register retriggers the
//! hardware envelope, so it is only written when its value changes.

use std::fmt;

use crate::constants::{MAX_NOISE_PERIOD, MAX_TONE_PERIOD};
use crate::sample::SampleEngine;
use crate::voice::{Voice, NUM_HW_CHANNELS, SAMPLE_HW_CHANNEL};

/// Number of sound registers mirrored in the image (R0-R13)
pub const NUM_REGISTERS: usize = 14;

/// YM2149 register address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Channel A tone period (low byte) - R0
    ToneALo = 0x00,
    /// Channel A tone period (high byte) - R1
    ToneAHi = 0x01,
    /// Channel B tone period (low byte) - R2
    ToneBLo = 0x02,
    /// Channel B tone period (high byte) - R3
    ToneBHi = 0x03,
    /// Channel C tone period (low byte) - R4
    ToneCLo = 0x04,
    /// Channel C tone period (high byte) - R5
    ToneCHi = 0x05,
    /// Noise period - R6
    NoisePeriod = 0x06,
    /// Mixer control - R7
    MixerCtrl = 0x07,
    /// Channel A amplitude - R8
    AmplitudeA = 0x08,
    /// Channel B amplitude - R9
    AmplitudeB = 0x09,
    /// Channel C amplitude - R10
    AmplitudeC = 0x0A,
    /// Envelope period (low byte) - R11
    EnvelopeLo = 0x0B,
    /// Envelope period (high byte) - R12
    EnvelopeHi = 0x0C,
    /// Envelope shape - R13
    EnvelopeShape = 0x0D,
}

impl Register {
    /// Register address value
    pub fn addr(&self) -> u8 {
        *self as u8
    }

    /// Amplitude register for a hardware channel index (0-2)
    pub fn amplitude(channel: usize) -> Register {
        match channel {
            0 => Register::AmplitudeA,
            1 => Register::AmplitudeB,
            _ => Register::AmplitudeC,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.addr())
    }
}

bitflags::bitflags! {
    /// Mixer control register (R7)
    ///
    /// Hardware semantics are inverted: a set bit *disables* the generator.
    /// An all-ones mask is silence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MixerMask: u8 {
        /// Tone disabled on channel A
        const TONE_A = 0b0000_0001;
        /// Tone disabled on channel B
        const TONE_B = 0b0000_0010;
        /// Tone disabled on channel C
        const TONE_C = 0b0000_0100;
        /// Noise disabled on channel A
        const NOISE_A = 0b0000_1000;
        /// Noise disabled on channel B
        const NOISE_B = 0b0001_0000;
        /// Noise disabled on channel C
        const NOISE_C = 0b0010_0000;
    }
}

impl MixerMask {
    /// Tone-disable bit for a hardware channel index (0-2)
    pub fn tone(channel: usize) -> MixerMask {
        match channel {
            0 => MixerMask::TONE_A,
            1 => MixerMask::TONE_B,
            _ => MixerMask::TONE_C,
        }
    }

    /// Noise-disable bit for a hardware channel index (0-2)
    pub fn noise(channel: usize) -> MixerMask {
        match channel {
            0 => MixerMask::NOISE_A,
            1 => MixerMask::NOISE_B,
            _ => MixerMask::NOISE_C,
        }
    }
}

/// Synchronous register-write capability of the chip driver
///
/// The electrical address-latch/data-latch sequencing lives behind this
/// trait; the engine only relies on the logical write completing before the
/// call returns.
pub trait PsgBus {
    /// Write one register (address 0-13)
    fn write_register(&mut self, addr: u8, value: u8);
}

/// In-memory mirror of the chip's sound registers
///
/// Rebuilt from scratch every modulation tick; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterImage {
    /// Register values R0-R13
    regs: [u8; NUM_REGISTERS],
}

impl RegisterImage {
    /// A fully silent image: zero amplitudes, all generators masked off
    pub fn silent() -> Self {
        let mut image = RegisterImage {
            regs: [0; NUM_REGISTERS],
        };
        image.regs[Register::MixerCtrl.addr() as usize] = MixerMask::all().bits();
        image
    }

    /// Read one mirrored register value
    pub fn get(&self, reg: Register) -> u8 {
        self.regs[reg.addr() as usize]
    }

    /// Set one mirrored register value
    pub fn set(&mut self, reg: Register, value: u8) {
        self.regs[reg.addr() as usize] = value;
    }

    /// Tone period for a channel as mirrored (12 bits)
    pub fn tone_period(&self, channel: usize) -> u16 {
        let lo = self.regs[channel * 2] as u16;
        let hi = self.regs[channel * 2 + 1] as u16;
        (hi << 8) | lo
    }

    /// Store a tone period, clamped to the 12-bit register range
    pub fn set_tone_period(&mut self, channel: usize, period: u16) {
        let period = period.min(MAX_TONE_PERIOD);
        self.regs[channel * 2] = (period & 0xFF) as u8;
        self.regs[channel * 2 + 1] = (period >> 8) as u8;
    }

    /// Compose the full image from the three voice slots and sample state
    ///
    /// Inactive tonal channels come out silent (zero amplitude, generators
    /// masked). While a sample is playing, its reserved channel's amplitude
    /// is driven by the sample level and its generators stay masked, so the
    /// attenuator acts as a DAC with no tone mixed in.
    pub fn compose(voices: &[Voice; NUM_HW_CHANNELS], sampler: &SampleEngine) -> Self {
        let mut image = RegisterImage::silent();
        let mut mixer = MixerMask::all();
        let mut noise_period = 0u8;

        for (ch, voice) in voices.iter().enumerate() {
            if sampler.is_active() && ch == SAMPLE_HW_CHANNEL {
                // Digidrum owns this channel's attenuator for now
                image.set(Register::amplitude(ch), sampler.level());
                continue;
            }
            if !voice.active {
                continue;
            }
            image.set_tone_period(ch, voice.period);
            image.set(Register::amplitude(ch), voice.amplitude & 0x0F);
            if voice.mix.tone {
                mixer.remove(MixerMask::tone(ch));
            }
            if voice.mix.noise {
                mixer.remove(MixerMask::noise(ch));
                // Lowest-numbered noise voice supplies the shared period
                if noise_period == 0 {
                    noise_period = voice.mix.noise_period.min(MAX_NOISE_PERIOD);
                }
            }
        }

        image.set(Register::NoisePeriod, noise_period);
        image.set(Register::MixerCtrl, mixer.bits());
        image
    }
}

impl Default for RegisterImage {
    fn default() -> Self {
        Self::silent()
    }
}

/// Flushes register images to the bus
///
/// Tracks the last written envelope shape so R13 is only touched when its
/// value actually changes.
#[derive(Debug, Clone, Default)]
pub struct RegisterWriter {
    last_shape: Option<u8>,
}

impl RegisterWriter {
    /// Create a writer that has not written any shape yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Write R0-R12 unconditionally, R13 on change only
    pub fn flush<B: PsgBus>(&mut self, image: &RegisterImage, bus: &mut B) {
        for addr in 0..(NUM_REGISTERS as u8 - 1) {
            bus.write_register(addr, image.regs[addr as usize]);
        }
        let shape = image.get(Register::EnvelopeShape);
        if self.last_shape != Some(shape) {
            bus.write_register(Register::EnvelopeShape.addr(), shape);
            self.last_shape = Some(shape);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleBank;

    /// Bus double that records every write in order
    pub(crate) struct RecordingBus {
        pub writes: Vec<(u8, u8)>,
    }

    impl RecordingBus {
        pub fn new() -> Self {
            RecordingBus { writes: Vec::new() }
        }

        pub fn last_value(&self, addr: u8) -> Option<u8> {
            self.writes
                .iter()
                .rev()
                .find(|(a, _)| *a == addr)
                .map(|(_, v)| *v)
        }
    }

    impl PsgBus for RecordingBus {
        fn write_register(&mut self, addr: u8, value: u8) {
            self.writes.push((addr, value));
        }
    }

    #[test]
    fn test_silent_image_masks_everything() {
        let image = RegisterImage::silent();
        assert_eq!(image.get(Register::MixerCtrl), 0b0011_1111);
        assert_eq!(image.get(Register::AmplitudeA), 0);
    }

    #[test]
    fn test_tone_period_round_trip_and_clamp() {
        let mut image = RegisterImage::silent();
        image.set_tone_period(1, 0x0234);
        assert_eq!(image.tone_period(1), 0x0234);
        image.set_tone_period(1, 0xFFFF);
        assert_eq!(image.tone_period(1), MAX_TONE_PERIOD);
    }

    #[test]
    fn test_compose_inactive_channels_silent() {
        let voices: [Voice; NUM_HW_CHANNELS] = Default::default();
        let sampler = SampleEngine::new(SampleBank::empty());
        let image = RegisterImage::compose(&voices, &sampler);
        assert_eq!(image, RegisterImage::silent());
    }

    #[test]
    fn test_flush_skips_unchanged_shape() {
        let image = RegisterImage::silent();
        let mut writer = RegisterWriter::new();
        let mut bus = RecordingBus::new();

        writer.flush(&image, &mut bus);
        assert_eq!(bus.writes.len(), NUM_REGISTERS); // first flush writes R13

        bus.writes.clear();
        writer.flush(&image, &mut bus);
        assert_eq!(bus.writes.len(), NUM_REGISTERS - 1); // R13 elided
        assert!(bus.writes.iter().all(|(a, _)| *a != 13));
    }
}
