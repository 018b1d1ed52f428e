//! Per-Voice Modulation Engine
//!
//! Runs once per modulation tick for every active voice and recomputes its
//! effective tone period and amplitude from scratch. Nothing audible is
//! carried across ticks without passing through here:
//!
//! - arpeggiator and pitch bend shift the note before pitch conversion
//! - vibrato, channel detune and preset slot detune offset the period
//! - the software envelope (or the static volume) sets the amplitude
//!
//! In simultaneous-voice mode the envelope is bypassed and a fixed
//! attenuation is applied instead, trading dynamics for headroom when all
//! three channels carry independent notes.

mod arpeggio;
mod envelope;
mod vibrato;

pub use arpeggio::ArpState;
pub use envelope::{EnvelopeStage, EnvelopeState};
pub use vibrato::VibratoState;

use crate::constants::{
    note_to_period, MAX_AMPLITUDE, MAX_TONE_PERIOD, PITCH_BEND_RANGE, SIMULTANEOUS_ATTENUATION,
};
use crate::controls::ChannelControls;
use crate::presets::EnvelopeConfig;
use crate::voice::Voice;

/// Resolve the envelope configuration in effect for a NoteOn
///
/// The preset supplies defaults; CC11/CC12 override attack and decay once
/// the channel has received them (an explicit 0 means instantaneous).
pub fn resolve_envelope(preset_env: &EnvelopeConfig, controls: &ChannelControls) -> EnvelopeConfig {
    EnvelopeConfig {
        attack_ticks: controls.attack_ticks.unwrap_or(preset_env.attack_ticks),
        decay_ticks: controls.decay_ticks.unwrap_or(preset_env.decay_ticks),
        sustain: preset_env.sustain,
    }
}

/// Amplitude target for a NoteOn given the channel's velocity sensitivity
///
/// Sensitivity 0 ignores velocity entirely (static volume); 127 scales the
/// full range. In between, the loss below full volume is scaled.
pub fn velocity_target(volume: u8, velocity: u8, sensitivity: u8) -> u8 {
    let volume = volume.min(MAX_AMPLITUDE) as u16;
    if sensitivity == 0 {
        return volume as u8;
    }
    let scaled = velocity as u16 * volume / 127;
    let loss = (volume - scaled) * sensitivity as u16 / 127;
    (volume - loss) as u8
}

/// Advance one voice by one modulation tick
///
/// Recomputes `voice.period` and `voice.amplitude`; the register writer
/// reads them directly afterwards.
pub fn advance_voice(voice: &mut Voice, controls: &ChannelControls) {
    if !voice.active {
        return;
    }

    // Pitch path: root note + arpeggio, then bend, then period offsets.
    // The offset is read before advancing so a freshly allocated voice
    // spends its full first step on the root note.
    let arp_offset = voice
        .arp
        .offset(controls.arp_rate, controls.arp_pattern, controls.arp_octave);
    voice.arp.tick(controls.arp_rate);
    let bend = voice.pitch_bend as f32 / 8192.0 * PITCH_BEND_RANGE;
    let note = voice.note as f32 + arp_offset as f32 + bend;

    let base = if arp_offset == 0 && voice.pitch_bend == 0 {
        // Exact base period when nothing shifts the note
        voice.base_period
    } else {
        note_to_period(note)
    };

    let vibrato = voice
        .vibrato
        .tick(controls.vibrato_rate, controls.vibrato_depth);
    let period = base as i32 + vibrato as i32 + controls.detune as i32 + voice.slot_detune as i32;
    voice.period = period.clamp(1, MAX_TONE_PERIOD as i32) as u16;

    // Amplitude path: envelope, unless simultaneous mode bypasses it.
    voice.amplitude = if controls.simultaneous {
        voice
            .static_volume
            .min(MAX_AMPLITUDE)
            .saturating_sub(SIMULTANEOUS_ATTENUATION)
    } else {
        voice.envelope.tick(&voice.env_config)
    };
}
