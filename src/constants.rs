//! Engine Constants and Lookup Tables
//!
//! Tick rates, chip clock, pitch conversion and the fixed modulation tables
//! shared across the engine.

/// PSG master clock in Hz (2 MHz, the Atari ST reference wiring)
pub const MASTER_CLOCK: u32 = 2_000_000;

/// Modulation tick rate in Hz (envelope, vibrato, arpeggiator)
pub const MODULATION_TICK_HZ: u32 = 200;

/// Sample (digidrum) tick rate in Hz, matching the 4 kHz sample converter
pub const SAMPLE_TICK_HZ: u32 = 4_000;

/// Largest value the 12-bit tone period registers can hold
pub const MAX_TONE_PERIOD: u16 = 0x0FFF;

/// Largest value the 5-bit noise period register can hold
pub const MAX_NOISE_PERIOD: u8 = 0x1F;

/// Maximum amplitude register value (4-bit attenuator)
pub const MAX_AMPLITUDE: u8 = 0x0F;

/// MIDI channel reserved for digidrum sample playback (GM drum channel)
pub const SAMPLE_MIDI_CHANNEL: u8 = 10;

/// Pitch-bend range in semitones (applied symmetrically around center)
pub const PITCH_BEND_RANGE: f32 = 2.0;

/// Fixed attenuation (amplitude steps) applied in simultaneous-voice mode
///
/// Three unattenuated voices on the shared analog mixer clip audibly;
/// two steps of the logarithmic attenuator keep the sum inside headroom.
pub const SIMULTANEOUS_ATTENUATION: u8 = 2;

/// The 16 arpeggiator patterns, each 3 semitone offsets from the root note
///
/// Pattern 0 plays the root only. Pattern 1 is Root / Perfect Fifth / Octave,
/// the canonical chiptune arpeggio.
pub const ARP_PATTERNS: [[i8; 3]; 16] = [
    [0, 0, 0],    // 0: root only
    [0, 7, 12],   // 1: root, fifth, octave
    [0, 4, 7],    // 2: major triad
    [0, 3, 7],    // 3: minor triad
    [0, 4, 8],    // 4: augmented
    [0, 3, 6],    // 5: diminished
    [0, 5, 7],    // 6: sus4
    [0, 2, 7],    // 7: sus2
    [0, 4, 11],   // 8: major seventh
    [0, 3, 10],   // 9: minor seventh
    [0, 4, 10],   // 10: dominant seventh
    [0, 12, 24],  // 11: octaves
    [0, 5, 10],   // 12: stacked fourths
    [0, 7, 14],   // 13: stacked fifths
    [0, 12, 7],   // 14: octave-fifth turn
    [0, -12, 12], // 15: octave spread
];

/// Arpeggiator octave-shift steps selected by the octave CC (7 ranges)
pub const ARP_OCTAVE_STEPS: [i8; 7] = [-36, -24, -12, 0, 12, 24, 36];

/// Stepped triangle wave for vibrato, one full cycle in 32 steps
///
/// Peak of +/-64 keeps the scaled period offset small relative to the
/// 12-bit tone period even at full depth.
pub const VIBRATO_TABLE: [i8; 32] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 56, 48, 40, 32, 24, 16, 8, 0, -8, -16, -24, -32, -40, -48,
    -56, -64, -56, -48, -40, -32, -24, -16, -8,
];

/// Convert a (possibly fractional) MIDI note number to a PSG tone period
///
/// Equal temperament around A4 = 440 Hz (note 69); the PSG divides the
/// master clock by 16 times the period value. The result is clamped to the
/// valid 12-bit register range, so extreme notes saturate rather than wrap.
pub fn note_to_period(note: f32) -> u16 {
    let freq = 440.0 * ((note - 69.0) / 12.0).exp2();
    let period = (MASTER_CLOCK as f32 / 16.0 / freq).round();
    (period as u32).clamp(1, MAX_TONE_PERIOD as u32) as u16
}
