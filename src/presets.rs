//! Preset and Bank Store
//!
//! Static, read-only mapping from (bank, MIDI channel) to a preset
//! definition. Presets describe how a note is realized across 1-3 hardware
//! channels: per-slot detune and tone/noise mix, a default software envelope
//! and a static volume. The store is built once at boot and never mutated by
//! the engine; only the bank selector changes at runtime.

use crate::constants::{MAX_AMPLITUDE, MAX_NOISE_PERIOD};
use crate::{Result, SynthError};

/// Number of MIDI channels addressed by the store
pub const MIDI_CHANNELS: usize = 16;

/// Globally selected preset bank
///
/// Selection only affects subsequent NoteOn routing; voices already
/// sounding keep the preset they were allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bank {
    /// Bank A (boot default)
    #[default]
    A,
    /// Bank B
    B,
}

/// Software envelope defaults carried by a preset
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvelopeConfig {
    /// Attack ramp length in modulation ticks (0 = instantaneous)
    pub attack_ticks: u8,
    /// Decay ramp length in modulation ticks (0 = instantaneous)
    pub decay_ticks: u8,
    /// Sustain floor the decay ramps down to (0-15)
    pub sustain: u8,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            attack_ticks: 0,
            decay_ticks: 0,
            sustain: MAX_AMPLITUDE,
        }
    }
}

/// One hardware-channel slot of a preset
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PresetSlot {
    /// Signed period offset against the other slots (fat detuned stacks)
    pub detune: i8,
    /// Tone generator enabled in the mixer for this slot
    pub tone: bool,
    /// Noise generator mixed into this slot
    pub noise: bool,
}

impl Default for PresetSlot {
    fn default() -> Self {
        PresetSlot {
            detune: 0,
            tone: true,
            noise: false,
        }
    }
}

/// Immutable preset definition
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Preset {
    /// Preset id (informational)
    pub id: u8,
    /// Ordered hardware-channel slots, 1-3 entries
    pub slots: Vec<PresetSlot>,
    /// Noise period written to R6 while a noise slot sounds (0-31)
    pub noise_period: u8,
    /// Default software envelope
    pub envelope: EnvelopeConfig,
    /// Static volume used when velocity sensitivity is off (0-15)
    pub volume: u8,
}

impl Preset {
    /// Single-slot square wave preset with the given id
    pub fn simple(id: u8) -> Self {
        Preset {
            id,
            slots: vec![PresetSlot::default()],
            noise_period: 0,
            envelope: EnvelopeConfig::default(),
            volume: MAX_AMPLITUDE,
        }
    }

    /// Number of hardware channels this preset occupies
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn validate(&self) -> Result<()> {
        if self.slots.is_empty() || self.slots.len() > 3 {
            return Err(SynthError::InvalidPreset(format!(
                "preset {} uses {} slots, expected 1-3",
                self.id,
                self.slots.len()
            )));
        }
        if self.volume > MAX_AMPLITUDE {
            return Err(SynthError::InvalidPreset(format!(
                "preset {} volume {} exceeds amplitude range",
                self.id, self.volume
            )));
        }
        if self.noise_period > MAX_NOISE_PERIOD {
            return Err(SynthError::InvalidPreset(format!(
                "preset {} noise period {} exceeds 5-bit range",
                self.id, self.noise_period
            )));
        }
        Ok(())
    }
}

/// Read-only preset table for both banks
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    banks: [[Option<Preset>; MIDI_CHANNELS]; 2],
}

impl PresetStore {
    /// Create an empty store (every NoteOn silently ignored)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assign a preset to a (bank, MIDI channel) entry
    ///
    /// Channel is 1-based as on the wire. The preset is validated here so
    /// the runtime path can trust every stored definition.
    pub fn set(&mut self, bank: Bank, channel: u8, preset: Preset) -> Result<()> {
        if !(1..=MIDI_CHANNELS as u8).contains(&channel) {
            return Err(SynthError::ConfigError(format!(
                "MIDI channel {channel} out of range 1-16"
            )));
        }
        preset.validate()?;
        self.banks[bank as usize][channel as usize - 1] = Some(preset);
        Ok(())
    }

    /// Look up the preset routed for (bank, channel); `None` silently
    /// ignores the note per the error-handling policy
    pub fn get(&self, bank: Bank, channel: u8) -> Option<&Preset> {
        if !(1..=MIDI_CHANNELS as u8).contains(&channel) {
            return None;
        }
        self.banks[bank as usize][channel as usize - 1].as_ref()
    }

    /// A small playable default table so the engine makes sound out of the
    /// box: plain squares on channels 1-3, a detuned two-slot stack on 4
    /// and a noise hit on 5, mirrored with softer envelopes in bank B.
    pub fn default_table() -> Self {
        let mut store = PresetStore::empty();

        for ch in 1..=3u8 {
            let mut p = Preset::simple(ch);
            p.envelope = EnvelopeConfig {
                attack_ticks: 0,
                decay_ticks: 40,
                sustain: 8,
            };
            store.set(Bank::A, ch, p).expect("static preset table");
        }

        let fat = Preset {
            id: 4,
            slots: vec![
                PresetSlot {
                    detune: 0,
                    tone: true,
                    noise: false,
                },
                PresetSlot {
                    detune: 3,
                    tone: true,
                    noise: false,
                },
            ],
            noise_period: 0,
            envelope: EnvelopeConfig {
                attack_ticks: 4,
                decay_ticks: 60,
                sustain: 10,
            },
            volume: MAX_AMPLITUDE,
        };
        store.set(Bank::A, 4, fat).expect("static preset table");

        let noise_hit = Preset {
            id: 5,
            slots: vec![PresetSlot {
                detune: 0,
                tone: false,
                noise: true,
            }],
            noise_period: 12,
            envelope: EnvelopeConfig {
                attack_ticks: 0,
                decay_ticks: 20,
                sustain: 0,
            },
            volume: MAX_AMPLITUDE,
        };
        store.set(Bank::A, 5, noise_hit).expect("static preset table");

        for ch in 1..=3u8 {
            let mut p = Preset::simple(0x10 | ch);
            p.envelope = EnvelopeConfig {
                attack_ticks: 20,
                decay_ticks: 80,
                sustain: 6,
            };
            p.volume = 13;
            store.set(Bank::B, ch, p).expect("static preset table");
        }

        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_routes_nothing() {
        let store = PresetStore::empty();
        assert!(store.get(Bank::A, 1).is_none());
        assert!(store.get(Bank::B, 16).is_none());
    }

    #[test]
    fn test_set_and_get_per_bank() {
        let mut store = PresetStore::empty();
        store.set(Bank::A, 2, Preset::simple(1)).unwrap();
        assert!(store.get(Bank::A, 2).is_some());
        assert!(store.get(Bank::B, 2).is_none());
    }

    #[test]
    fn test_invalid_channel_rejected() {
        let mut store = PresetStore::empty();
        assert!(store.set(Bank::A, 0, Preset::simple(1)).is_err());
        assert!(store.set(Bank::A, 17, Preset::simple(1)).is_err());
    }

    #[test]
    fn test_invalid_preset_rejected() {
        let mut store = PresetStore::empty();

        let mut too_many = Preset::simple(1);
        too_many.slots = vec![PresetSlot::default(); 4];
        assert!(store.set(Bank::A, 1, too_many).is_err());

        let mut no_slots = Preset::simple(2);
        no_slots.slots.clear();
        assert!(store.set(Bank::A, 1, no_slots).is_err());

        let mut loud = Preset::simple(3);
        loud.volume = 99;
        assert!(store.set(Bank::A, 1, loud).is_err());
    }

    #[test]
    fn test_default_table_is_playable() {
        let store = PresetStore::default_table();
        assert!(store.get(Bank::A, 1).is_some());
        assert!(store.get(Bank::B, 1).is_some());
        assert_eq!(store.get(Bank::A, 4).unwrap().slot_count(), 2);
    }
}
