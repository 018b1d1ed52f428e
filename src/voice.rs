//! Voice Slots and Allocation
//!
//! Three fixed voice records, one per hardware channel, owned by the
//! [`VoiceAllocator`]. A voice exists only while active; its hardware
//! channel is fixed for its lifetime (index into the arena), and reuse
//! always goes through release or stealing. No allocation happens after
//! boot: the arena is plain fixed-size records indexed by channel number.

use crate::constants::note_to_period;
use crate::modulation::{ArpState, EnvelopeState, VibratoState};
use crate::presets::{EnvelopeConfig, Preset};

/// Number of tone channels on the chip
pub const NUM_HW_CHANNELS: usize = 3;

/// Hardware channel reserved for digidrum playback (channel C)
pub const SAMPLE_HW_CHANNEL: usize = 2;

/// Hardware channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HwChannel {
    /// Channel A
    A,
    /// Channel B
    B,
    /// Channel C (time-shared with the sample engine)
    C,
}

impl HwChannel {
    /// Channel index (0-2)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Channel for an arena index
    pub fn from_index(index: usize) -> HwChannel {
        match index {
            0 => HwChannel::A,
            1 => HwChannel::B,
            _ => HwChannel::C,
        }
    }
}

/// Tone/noise mix of one voice, taken from its preset slot
#[derive(Debug, Clone, Copy, Default)]
pub struct ToneMix {
    /// Tone generator audible
    pub tone: bool,
    /// Noise generator mixed in
    pub noise: bool,
    /// Shared noise period requested while this voice sounds
    pub noise_period: u8,
}

/// One active note bound to one hardware channel
///
/// Allocation fields (`active`, `midi_channel`, `note`, `stamp`, ...) are
/// written in the MIDI context; `period` and `amplitude` are recomputed by
/// the modulation tick and are never carried across ticks unrefreshed.
#[derive(Debug, Clone, Default)]
pub struct Voice {
    /// Slot in use
    pub active: bool,
    /// Source MIDI channel (1-16)
    pub midi_channel: u8,
    /// Root note number
    pub note: u8,
    /// NoteOn velocity
    pub velocity: u8,
    /// Tone period of the root note, before any modulation
    pub base_period: u16,
    /// Per-slot detune from the preset (stacked-oscillator presets)
    pub slot_detune: i8,
    /// Mixer contribution
    pub mix: ToneMix,
    /// Static volume from the preset (amplitude source when the envelope
    /// is bypassed)
    pub static_volume: u8,
    /// Resolved envelope configuration captured at NoteOn
    pub env_config: EnvelopeConfig,
    /// Software envelope state machine
    pub envelope: EnvelopeState,
    /// Vibrato oscillator state
    pub vibrato: VibratoState,
    /// Arpeggiator state
    pub arp: ArpState,
    /// Signed pitch-bend offset from center (-8192..8191)
    pub pitch_bend: i16,
    /// Allocation stamp; lower = older, first to be stolen
    pub stamp: u32,
    /// Effective tone period computed by the last modulation tick
    pub period: u16,
    /// Effective amplitude computed by the last modulation tick
    pub amplitude: u8,
}

impl Voice {
    /// Mark the slot free and zero its audible contribution
    pub fn release(&mut self) {
        self.active = false;
        self.amplitude = 0;
    }
}

/// Outcome of a NoteOn allocation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocOutcome {
    /// All requested channels were free
    Allocated,
    /// Allocation succeeded after stealing this many active voices
    Stolen(usize),
}

/// Owner of the three voice slots
///
/// Stealing is deterministic: the oldest active voice (lowest stamp) is
/// reclaimed first, ties broken by ascending channel id. A stolen voice has
/// its amplitude zeroed immediately so the reused channel does not click.
#[derive(Debug, Clone, Default)]
pub struct VoiceAllocator {
    slots: [Voice; NUM_HW_CHANNELS],
    next_stamp: u32,
}

impl VoiceAllocator {
    /// Create an allocator with all slots free
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable view of the voice arena (register composition)
    pub fn slots(&self) -> &[Voice; NUM_HW_CHANNELS] {
        &self.slots
    }

    /// Mutable view of the voice arena (modulation tick)
    pub fn slots_mut(&mut self) -> &mut [Voice; NUM_HW_CHANNELS] {
        &mut self.slots
    }

    /// Number of currently active voices
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|v| v.active).count()
    }

    /// Allocate voices for a NoteOn
    ///
    /// A preset occupying N hardware channels claims N slots; free slots are
    /// used first (ascending channel id), then the oldest active voices are
    /// stolen. In simultaneous-voice mode multi-slot presets collapse to
    /// their first slot so several notes can coexist. Every claimed voice
    /// has its envelope triggered toward `env_target`.
    #[allow(clippy::too_many_arguments)]
    pub fn allocate(
        &mut self,
        preset: &Preset,
        note: u8,
        velocity: u8,
        midi_channel: u8,
        simultaneous: bool,
        env_config: EnvelopeConfig,
        env_target: u8,
    ) -> AllocOutcome {
        let wanted = if simultaneous { 1 } else { preset.slot_count() };
        let mut claimed: Vec<usize> = Vec::with_capacity(wanted);
        let mut stolen = 0usize;

        for _ in 0..wanted {
            match self.claim_slot(&claimed) {
                Claim::Free(idx) => claimed.push(idx),
                Claim::Steal(idx) => {
                    // Zero the victim before reuse to avoid a click
                    self.slots[idx].release();
                    claimed.push(idx);
                    stolen += 1;
                }
            }
        }

        for (slot_no, &idx) in claimed.iter().enumerate() {
            let slot_def = &preset.slots[slot_no.min(preset.slots.len() - 1)];
            let voice = &mut self.slots[idx];
            *voice = Voice {
                active: true,
                midi_channel,
                note,
                velocity,
                base_period: note_to_period(note as f32),
                slot_detune: slot_def.detune,
                mix: ToneMix {
                    tone: slot_def.tone,
                    noise: slot_def.noise,
                    noise_period: preset.noise_period,
                },
                static_volume: preset.volume,
                env_config,
                envelope: EnvelopeState::default(),
                vibrato: VibratoState::default(),
                arp: ArpState::default(),
                pitch_bend: 0,
                stamp: self.next_stamp,
                period: 0,
                amplitude: 0,
            };
            voice.period = voice.base_period;
            voice.envelope.note_on(env_target, &voice.env_config);
            self.next_stamp = self.next_stamp.wrapping_add(1);
        }

        if stolen == 0 {
            AllocOutcome::Allocated
        } else {
            AllocOutcome::Stolen(stolen)
        }
    }

    /// Release every voice sounding `note` from `midi_channel`
    ///
    /// Registers are not touched here; the next composed image writes
    /// silence for the freed channels.
    pub fn release_note(&mut self, midi_channel: u8, note: u8) {
        for voice in &mut self.slots {
            if voice.active && voice.midi_channel == midi_channel && voice.note == note {
                voice.release();
            }
        }
    }

    /// Release every active voice (all-notes-off reset)
    pub fn release_all(&mut self) {
        for voice in &mut self.slots {
            voice.release();
        }
    }

    /// Iterate the active voices sourced from one MIDI channel
    ///
    /// This is how channel-scoped CC and pitch-bend updates reach every
    /// voice of that channel, across hardware channels.
    pub fn find_channel(&mut self, midi_channel: u8) -> impl Iterator<Item = &mut Voice> {
        self.slots
            .iter_mut()
            .filter(move |v| v.active && v.midi_channel == midi_channel)
    }

    fn claim_slot(&self, already_claimed: &[usize]) -> Claim {
        // Free slots first, ascending channel id
        for idx in 0..NUM_HW_CHANNELS {
            if !self.slots[idx].active && !already_claimed.contains(&idx) {
                return Claim::Free(idx);
            }
        }
        // Oldest active voice, ties by ascending channel id
        let mut victim = usize::MAX;
        let mut oldest = u32::MAX;
        for idx in 0..NUM_HW_CHANNELS {
            if already_claimed.contains(&idx) {
                continue;
            }
            if self.slots[idx].stamp < oldest {
                oldest = self.slots[idx].stamp;
                victim = idx;
            }
        }
        Claim::Steal(victim)
    }
}

enum Claim {
    Free(usize),
    Steal(usize),
}
