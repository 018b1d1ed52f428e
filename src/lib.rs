//! MIDI-to-YM2149 Synthesizer Engine
//!
//! The real-time core of a MIDI-controlled YM2149 PSG synthesizer. Incoming
//! MIDI bytes are parsed into events, routed by channel and bank to presets,
//! and realized as polyphonic control of the chip's 3 tone channels. A
//! dedicated sample engine time-shares one channel's amplitude register to
//! play short 4-bit drum samples (the classic "digidrum" technique).
//!
//! # Features
//! - Byte-level MIDI parser with running-status support
//! - Deterministic 3-slot voice allocator with oldest-first stealing
//! - Per-voice envelope, vibrato, arpeggiator, pitch bend and detune
//! - Two switchable preset banks selected via Control Change
//! - Monophonic 4-bit digidrum playback on hardware channel C
//! - Full register image composed and flushed every modulation tick
//!
//! # Execution model
//! On the original hardware the engine runs bare-metal: the main loop feeds
//! serial bytes while two timer interrupts drive the modulation tick (200 Hz)
//! and sample tick (4 kHz). This crate exposes those entry points directly:
//! [`SynthEngine::feed_byte`], [`SynthEngine::modulation_tick`] and
//! [`SynthEngine::sample_tick`]. The [`SharedSynth`] handle wraps the engine
//! in a mutex so tick and MIDI contexts can interleave from separate threads
//! with minimal critical sections.
//!
//! # Quick start
//! ```no_run
//! use ym2149_synth::{PresetStore, SampleBank, SynthEngine};
//!
//! struct LogBus;
//! impl ym2149_synth::PsgBus for LogBus {
//!     fn write_register(&mut self, addr: u8, value: u8) {
//!         println!("R{addr} <- {value:#04x}");
//!     }
//! }
//!
//! let mut synth = SynthEngine::new(PresetStore::default_table(), SampleBank::empty(), LogBus);
//! // Note On, channel 1, middle C, velocity 100
//! for byte in [0x90, 60, 100] {
//!     synth.feed_byte(byte);
//! }
//! synth.modulation_tick();
//! ```

#![warn(missing_docs)]

pub mod constants;
pub mod controls;
pub mod engine;
pub mod midi;
pub mod modulation;
pub mod presets;
pub mod registers;
pub mod sample;
pub mod voice;

/// Error types for synthesizer construction and configuration
///
/// The runtime audio path never returns errors: malformed MIDI is discarded,
/// out-of-range controller values are clamped and allocation pressure is
/// resolved by voice stealing. Errors are reserved for building preset and
/// sample tables before the engine starts.
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    /// Preset definition rejected (bad slot count, duplicate channels, ...)
    #[error("Invalid preset: {0}")]
    InvalidPreset(String),

    /// Sample table entry rejected (range outside data, zero length, ...)
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type for synthesizer operations
pub type Result<T> = std::result::Result<T, SynthError>;

// Public API exports
pub use controls::{ChannelControls, ControlParam};
pub use engine::{SharedSynth, SynthEngine};
pub use midi::{MidiEvent, MidiReceiver};
pub use presets::{Bank, EnvelopeConfig, Preset, PresetSlot, PresetStore};
pub use registers::{MixerMask, PsgBus, Register, RegisterImage};
pub use sample::{SampleBank, SampleEngine};
pub use voice::{HwChannel, Voice, VoiceAllocator};
