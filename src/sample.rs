//! Digidrum Sample Engine
//!
//! Monophonic playback of short 4-bit samples by rewriting the amplitude
//! register of the reserved hardware channel at the sample tick rate,
//! using the chip's volume attenuator as a crude DAC. Samples live in one
//! packed read-only byte table, two 4-bit units per byte, high nibble
//! first, produced offline by the WAV conversion tool.
//!
//! Playback always runs to completion or is retriggered; NoteOff is
//! ignored. A retrigger replaces the in-progress sample and restarts the
//! cursor at zero. Each tick does one nibble fetch and one register write,
//! keeping the interrupt handler O(1).

use std::sync::Arc;

use crate::{Result, SynthError};

/// A sample's byte range within the packed table
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleRange {
    /// Byte offset of the first packed byte
    pub start: usize,
    /// Length in 4-bit units
    pub nibbles: usize,
    /// Sample-rate divisor: advance every Nth sample tick (1 = full rate)
    pub divisor: u8,
}

/// Read-only sample table keyed by note value
#[derive(Debug, Clone)]
pub struct SampleBank {
    data: Arc<[u8]>,
    map: [Option<SampleRange>; 128],
}

impl SampleBank {
    /// A bank with no data; every trigger is ignored
    pub fn empty() -> Self {
        SampleBank {
            data: Vec::<u8>::new().into(),
            map: [None; 128],
        }
    }

    /// Create a bank over a packed data table
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        SampleBank {
            data: data.into(),
            map: [None; 128],
        }
    }

    /// Map a note value to a range of the packed table
    pub fn assign(&mut self, note: u8, range: SampleRange) -> Result<()> {
        if note > 127 {
            return Err(SynthError::InvalidSample(format!(
                "note {note} out of range 0-127"
            )));
        }
        if range.nibbles == 0 {
            return Err(SynthError::InvalidSample(format!(
                "sample for note {note} has zero length"
            )));
        }
        if range.divisor == 0 {
            return Err(SynthError::InvalidSample(format!(
                "sample for note {note} has divisor 0"
            )));
        }
        let bytes_needed = range.nibbles.div_ceil(2);
        if range.start + bytes_needed > self.data.len() {
            return Err(SynthError::InvalidSample(format!(
                "sample for note {note} overruns table ({} + {} > {})",
                range.start,
                bytes_needed,
                self.data.len()
            )));
        }
        self.map[note as usize] = Some(range);
        Ok(())
    }

    /// Range assigned to a note, if any
    pub fn lookup(&self, note: u8) -> Option<SampleRange> {
        self.map.get(note as usize).copied().flatten()
    }

    /// Nibble at `cursor` within `range` (high nibble first)
    fn nibble(&self, range: &SampleRange, cursor: usize) -> u8 {
        let byte = self.data[range.start + cursor / 2];
        if cursor % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        }
    }
}

/// Result of one sample tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleTick {
    /// No sample playing
    Idle,
    /// Amplitude level to write this tick
    Level(u8),
    /// Playback just ended; the channel returns to tonal control
    Finished,
}

/// The single monophonic sample slot
#[derive(Debug, Clone, Copy, Default)]
struct SampleSlot {
    range: Option<SampleRange>,
    /// Playback cursor in 4-bit units
    cursor: usize,
    /// Countdown implementing the rate divisor
    divider: u8,
    /// Last level written (held between divided ticks)
    level: u8,
}

/// Monophonic digidrum player
#[derive(Debug, Clone)]
pub struct SampleEngine {
    bank: SampleBank,
    slot: SampleSlot,
}

impl SampleEngine {
    /// Create an engine over a sample bank
    pub fn new(bank: SampleBank) -> Self {
        SampleEngine {
            bank,
            slot: SampleSlot::default(),
        }
    }

    /// Whether a sample currently owns the reserved channel's amplitude
    pub fn is_active(&self) -> bool {
        self.slot.range.is_some()
    }

    /// Amplitude level of the current playback position
    pub fn level(&self) -> u8 {
        self.slot.level
    }

    /// Start (or restart) playback of the sample keyed by `note`
    ///
    /// Unknown notes are silently ignored. A retrigger during playback is
    /// a normal restart from cursor 0 with the newly selected sample; the
    /// previous tail is cut immediately.
    pub fn trigger(&mut self, note: u8) {
        if let Some(range) = self.bank.lookup(note) {
            self.slot = SampleSlot {
                range: Some(range),
                cursor: 0,
                divider: 0,
                level: self.bank.nibble(&range, 0),
            };
        }
    }

    /// Stop playback immediately (engine reset)
    pub fn stop(&mut self) {
        self.slot = SampleSlot::default();
    }

    /// Advance one sample tick: one nibble fetch, one level out
    pub fn tick(&mut self) -> SampleTick {
        let range = match self.slot.range {
            Some(range) => range,
            None => return SampleTick::Idle,
        };

        if self.slot.divider > 0 {
            self.slot.divider -= 1;
            return SampleTick::Level(self.slot.level);
        }
        self.slot.divider = range.divisor - 1;

        if self.slot.cursor >= range.nibbles {
            self.slot.range = None;
            self.slot.level = 0;
            return SampleTick::Finished;
        }

        self.slot.level = self.bank.nibble(&range, self.slot.cursor);
        self.slot.cursor += 1;
        SampleTick::Level(self.slot.level)
    }
}
