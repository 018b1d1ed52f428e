//! Synthesizer Engine and Event Dispatch
//!
//! Ties the parser, preset store, voice allocator, modulation engine,
//! sample engine and register writer together behind the three runtime
//! entry points of the firmware:
//!
//! - [`SynthEngine::feed_byte`] — main context, serial MIDI intake
//! - [`SynthEngine::modulation_tick`] — 200 Hz timer, voice modulation and
//!   full register flush
//! - [`SynthEngine::sample_tick`] — 4 kHz timer, one digidrum nibble
//!
//! Dispatch routes events by MIDI channel and the globally selected bank:
//! the bank-select CC mutates the bank, other CCs land in the per-channel
//! control block, and note events resolve a preset and go to the voice
//! allocator — or, for the dedicated sample channel, to the sample engine.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::constants::SAMPLE_MIDI_CHANNEL;
use crate::controls::{ChannelControls, ControlParam, BANK_SELECT_CC};
use crate::midi::{MidiEvent, MidiReceiver};
use crate::modulation::{advance_voice, resolve_envelope, velocity_target};
use crate::presets::{Bank, PresetStore, MIDI_CHANNELS};
use crate::registers::{PsgBus, Register, RegisterImage, RegisterWriter};
use crate::sample::{SampleBank, SampleEngine, SampleTick};
use crate::voice::{HwChannel, Voice, VoiceAllocator, SAMPLE_HW_CHANNEL};

/// The complete runtime engine
///
/// Owns the bus: every composed register image is flushed synchronously
/// from the tick that produced it.
pub struct SynthEngine<B: PsgBus> {
    bus: B,
    receiver: MidiReceiver,
    presets: PresetStore,
    bank: Bank,
    controls: [ChannelControls; MIDI_CHANNELS],
    allocator: VoiceAllocator,
    sampler: SampleEngine,
    writer: RegisterWriter,
}

impl<B: PsgBus> SynthEngine<B> {
    /// Create an engine with boot defaults: bank A, all controllers zero,
    /// no voices, no sample playing
    pub fn new(presets: PresetStore, samples: SampleBank, bus: B) -> Self {
        SynthEngine {
            bus,
            receiver: MidiReceiver::new(),
            presets,
            bank: Bank::A,
            controls: [ChannelControls::default(); MIDI_CHANNELS],
            allocator: VoiceAllocator::new(),
            sampler: SampleEngine::new(samples),
            writer: RegisterWriter::new(),
        }
    }

    /// Feed one serial MIDI byte (main context)
    pub fn feed_byte(&mut self, byte: u8) {
        if let Some(event) = self.receiver.receive(byte) {
            self.handle_event(event);
        }
    }

    /// Dispatch a complete MIDI event
    pub fn handle_event(&mut self, event: MidiEvent) {
        match event {
            MidiEvent::ControlChange {
                channel,
                controller,
                value,
            } => self.handle_control_change(channel, controller, value),
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
            } => self.handle_note_on(channel, note, velocity),
            MidiEvent::NoteOff { channel, note } => {
                // The sample channel runs to completion; NoteOff is ignored
                if channel != SAMPLE_MIDI_CHANNEL {
                    self.allocator.release_note(channel, note);
                }
            }
            MidiEvent::PitchBend { channel, value } => {
                // Channel policy: no bend on the sample channel
                if channel != SAMPLE_MIDI_CHANNEL {
                    let offset = value as i16 - 8192;
                    for voice in self.allocator.find_channel(channel) {
                        voice.pitch_bend = offset;
                    }
                }
            }
        }
    }

    fn handle_control_change(&mut self, channel: u8, controller: u8, value: u8) {
        if controller == BANK_SELECT_CC {
            // Global selector; active voices keep their current preset
            self.bank = if value <= 64 { Bank::A } else { Bank::B };
            return;
        }
        if let Some(param) = ControlParam::from_cc(controller) {
            let idx = (channel as usize).wrapping_sub(1);
            if let Some(controls) = self.controls.get_mut(idx) {
                controls.apply(param, value);
            }
        }
    }

    fn handle_note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        if channel == SAMPLE_MIDI_CHANNEL {
            self.sampler.trigger(note);
            return;
        }
        let preset = match self.presets.get(self.bank, channel) {
            Some(preset) => preset.clone(),
            // Unknown channel/bank combination: silently ignored
            None => return,
        };
        let controls = match self.controls.get((channel as usize).wrapping_sub(1)) {
            Some(controls) => *controls,
            None => return,
        };
        let env_config = resolve_envelope(&preset.envelope, &controls);
        let target = velocity_target(preset.volume, velocity, controls.velocity_sense);
        self.allocator.allocate(
            &preset,
            note,
            velocity,
            channel,
            controls.simultaneous,
            env_config,
            target,
        );
    }

    /// Modulation tick (200 Hz timer context)
    ///
    /// Recomputes every active voice, composes the full register image and
    /// flushes it to the bus.
    pub fn modulation_tick(&mut self) {
        for voice in self.allocator.slots_mut() {
            if !voice.active {
                continue;
            }
            let idx = (voice.midi_channel as usize).saturating_sub(1);
            let controls = self.controls[idx.min(MIDI_CHANNELS - 1)];
            advance_voice(voice, &controls);
        }
        let image = RegisterImage::compose(self.allocator.slots(), &self.sampler);
        self.writer.flush(&image, &mut self.bus);
    }

    /// Sample tick (4 kHz timer context), O(1) per call
    ///
    /// While a sample plays this writes exactly one amplitude register; on
    /// completion the register immediately returns to the tonal value of
    /// the reserved channel's voice.
    pub fn sample_tick(&mut self) {
        let addr = Register::amplitude(SAMPLE_HW_CHANNEL).addr();
        match self.sampler.tick() {
            SampleTick::Idle => {}
            SampleTick::Level(level) => self.bus.write_register(addr, level),
            SampleTick::Finished => {
                let voice = &self.allocator.slots()[SAMPLE_HW_CHANNEL];
                let restored = if voice.active { voice.amplitude } else { 0 };
                self.bus.write_register(addr, restored);
            }
        }
    }

    /// Explicit reset to boot defaults: all notes off, sample stopped,
    /// controllers cleared, bank A, silent image flushed
    pub fn reset(&mut self) {
        self.allocator.release_all();
        self.sampler.stop();
        self.controls = [ChannelControls::default(); MIDI_CHANNELS];
        self.bank = Bank::A;
        let image = RegisterImage::compose(self.allocator.slots(), &self.sampler);
        self.writer.flush(&image, &mut self.bus);
    }

    /// Currently selected bank
    pub fn bank(&self) -> Bank {
        self.bank
    }

    /// Voice bound to a hardware channel
    pub fn voice(&self, channel: HwChannel) -> &Voice {
        &self.allocator.slots()[channel.index()]
    }

    /// Number of active tonal voices
    pub fn active_voices(&self) -> usize {
        self.allocator.active_count()
    }

    /// Whether a digidrum sample is currently playing
    pub fn sample_active(&self) -> bool {
        self.sampler.is_active()
    }

    /// Controller block of a MIDI channel (1-16)
    pub fn controls(&self, channel: u8) -> Option<&ChannelControls> {
        self.controls.get((channel as usize).wrapping_sub(1))
    }

    /// Borrow the bus (test instrumentation)
    pub fn bus(&self) -> &B {
        &self.bus
    }
}

/// Thread-shareable engine handle
///
/// Models the firmware's interrupt/main split: the MIDI context and the two
/// timer contexts each take the lock only for one short, bounded operation,
/// mirroring the interrupt-disable critical sections of the bare-metal
/// original. No call blocks on anything but the lock itself.
pub struct SharedSynth<B: PsgBus> {
    inner: Arc<Mutex<SynthEngine<B>>>,
}

impl<B: PsgBus> SharedSynth<B> {
    /// Wrap an engine for cross-context use
    pub fn new(engine: SynthEngine<B>) -> Self {
        SharedSynth {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Feed one MIDI byte (main context)
    pub fn feed_byte(&self, byte: u8) {
        self.inner.lock().feed_byte(byte);
    }

    /// Run one modulation tick (timer context)
    pub fn modulation_tick(&self) {
        self.inner.lock().modulation_tick();
    }

    /// Run one sample tick (timer context)
    pub fn sample_tick(&self) {
        self.inner.lock().sample_tick();
    }

    /// Run a closure under the lock (setup, inspection)
    pub fn with<R>(&self, f: impl FnOnce(&mut SynthEngine<B>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<B: PsgBus> Clone for SharedSynth<B> {
    fn clone(&self) -> Self {
        SharedSynth {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBus;
    impl PsgBus for NullBus {
        fn write_register(&mut self, _addr: u8, _value: u8) {}
    }

    fn engine() -> SynthEngine<NullBus> {
        SynthEngine::new(PresetStore::default_table(), SampleBank::empty(), NullBus)
    }

    #[test]
    fn test_note_on_off_lifecycle() {
        let mut synth = engine();
        synth.handle_event(MidiEvent::NoteOn {
            channel: 1,
            note: 60,
            velocity: 100,
        });
        assert_eq!(synth.active_voices(), 1);
        synth.handle_event(MidiEvent::NoteOff {
            channel: 1,
            note: 60,
        });
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_bank_select_routes_subsequent_notes() {
        let mut synth = engine();
        synth.handle_event(MidiEvent::ControlChange {
            channel: 1,
            controller: BANK_SELECT_CC,
            value: 90,
        });
        assert_eq!(synth.bank(), Bank::B);
        synth.handle_event(MidiEvent::NoteOn {
            channel: 1,
            note: 60,
            velocity: 100,
        });
        // Bank B channel 1 preset has volume 13
        assert_eq!(synth.voice(HwChannel::A).static_volume, 13);
    }

    #[test]
    fn test_unknown_channel_ignored() {
        let mut synth = engine();
        // No preset on channel 9 in the default table
        synth.handle_event(MidiEvent::NoteOn {
            channel: 9,
            note: 60,
            velocity: 100,
        });
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_pitch_bend_reaches_channel_voices() {
        let mut synth = engine();
        synth.handle_event(MidiEvent::NoteOn {
            channel: 1,
            note: 60,
            velocity: 100,
        });
        synth.handle_event(MidiEvent::PitchBend {
            channel: 1,
            value: 16383,
        });
        assert_eq!(synth.voice(HwChannel::A).pitch_bend, 8191);
        // Other channels untouched
        synth.handle_event(MidiEvent::PitchBend {
            channel: 2,
            value: 0,
        });
        assert_eq!(synth.voice(HwChannel::A).pitch_bend, 8191);
    }

    #[test]
    fn test_reset_restores_boot_defaults() {
        let mut synth = engine();
        synth.handle_event(MidiEvent::ControlChange {
            channel: 1,
            controller: BANK_SELECT_CC,
            value: 127,
        });
        synth.handle_event(MidiEvent::NoteOn {
            channel: 1,
            note: 60,
            velocity: 100,
        });
        synth.reset();
        assert_eq!(synth.bank(), Bank::A);
        assert_eq!(synth.active_voices(), 0);
    }

    #[test]
    fn test_shared_handle_clones_refer_to_same_engine() {
        let shared = SharedSynth::new(engine());
        let other = shared.clone();
        for byte in [0x90, 60, 100] {
            shared.feed_byte(byte);
        }
        assert_eq!(other.with(|e| e.active_voices()), 1);
    }

    #[test]
    fn test_multi_slot_preset_from_dispatch() {
        let mut synth = engine();
        // Channel 4 of bank A is the detuned two-slot stack
        synth.handle_event(MidiEvent::NoteOn {
            channel: 4,
            note: 60,
            velocity: 100,
        });
        assert_eq!(synth.active_voices(), 2);
    }
}
