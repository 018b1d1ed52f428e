//! End-to-end engine behavior: raw MIDI bytes in, register writes out.

use ym2149_synth::constants::note_to_period;
use ym2149_synth::sample::SampleRange;
use ym2149_synth::{
    Bank, HwChannel, PresetStore, PsgBus, SampleBank, SynthEngine,
};

/// Bus double recording every register write in order
#[derive(Default)]
struct RecordingBus {
    writes: Vec<(u8, u8)>,
}

impl PsgBus for RecordingBus {
    fn write_register(&mut self, addr: u8, value: u8) {
        self.writes.push((addr, value));
    }
}

fn engine() -> SynthEngine<RecordingBus> {
    SynthEngine::new(
        PresetStore::default_table(),
        SampleBank::empty(),
        RecordingBus::default(),
    )
}

fn note_on(synth: &mut SynthEngine<RecordingBus>, channel: u8, note: u8, velocity: u8) {
    for byte in [0x90 | (channel - 1), note, velocity] {
        synth.feed_byte(byte);
    }
}

fn control_change(synth: &mut SynthEngine<RecordingBus>, channel: u8, cc: u8, value: u8) {
    for byte in [0xB0 | (channel - 1), cc, value] {
        synth.feed_byte(byte);
    }
}

#[test]
fn voice_count_never_exceeds_three_and_oldest_is_stolen() {
    let mut synth = engine();
    // Seven NoteOns across the three tonal channels of bank A
    for (i, note) in (60..67).enumerate() {
        let channel = (i % 3) as u8 + 1;
        note_on(&mut synth, channel, note, 100);
        synth.modulation_tick();
        assert!(synth.active_voices() <= 3);
    }
    // Surviving set is exactly the three most recent
    let mut notes: Vec<u8> = [HwChannel::A, HwChannel::B, HwChannel::C]
        .iter()
        .map(|&ch| synth.voice(ch).note)
        .collect();
    notes.sort_unstable();
    assert_eq!(notes, vec![64, 65, 66]);
}

#[test]
fn bank_select_cc8_switches_routing_without_touching_active_voices() {
    let mut synth = engine();
    control_change(&mut synth, 1, 8, 40);
    assert_eq!(synth.bank(), Bank::A);

    note_on(&mut synth, 1, 60, 100);
    let before = synth.voice(HwChannel::A).static_volume;

    control_change(&mut synth, 1, 8, 90);
    assert_eq!(synth.bank(), Bank::B);
    // The sounding voice keeps its bank A preset
    assert_eq!(synth.voice(HwChannel::A).static_volume, before);

    // Subsequent NoteOn routes against bank B (softer preset, volume 13)
    note_on(&mut synth, 1, 64, 100);
    assert_eq!(synth.voice(HwChannel::B).static_volume, 13);
}

#[test]
fn envelope_is_velocity_independent_when_sensitivity_is_zero() {
    let trajectory = |velocity: u8| -> Vec<u8> {
        let mut synth = engine();
        control_change(&mut synth, 1, 10, 0); // velocity sensitivity off
        note_on(&mut synth, 1, 60, velocity);
        (0..100)
            .map(|_| {
                synth.modulation_tick();
                synth.voice(HwChannel::A).amplitude
            })
            .collect()
    };
    assert_eq!(trajectory(1), trajectory(127));
}

#[test]
fn arpeggiator_pattern_one_cycles_c4_g4_c5() {
    let rate = 4u8;
    let mut synth = engine();
    control_change(&mut synth, 1, 4, rate); // arp rate
    control_change(&mut synth, 1, 5, 8); // pattern 1 (value / 8)
    control_change(&mut synth, 1, 6, 64); // octave shift 0
    note_on(&mut synth, 1, 60, 100);

    let expected = [
        note_to_period(60.0), // C4
        note_to_period(67.0), // G4
        note_to_period(72.0), // C5
    ];
    // Three full pattern cycles, each step held for `rate` ticks
    for cycle in 0..3 {
        for step in 0..3 {
            for tick in 0..rate {
                synth.modulation_tick();
                assert_eq!(
                    synth.voice(HwChannel::A).period,
                    expected[step],
                    "cycle {cycle} step {step} tick {tick}"
                );
            }
        }
    }
}

#[test]
fn vibrato_rate_zero_keeps_exact_base_frequency() {
    let mut synth = engine();
    control_change(&mut synth, 1, 1, 127); // full depth
    control_change(&mut synth, 1, 2, 0); // rate 0: disabled
    note_on(&mut synth, 1, 69, 100);
    let base = synth.voice(HwChannel::A).base_period;
    assert_eq!(base, note_to_period(69.0));
    for _ in 0..500 {
        synth.modulation_tick();
        assert_eq!(synth.voice(HwChannel::A).period, base);
    }
}

fn sample_synth(nibbles: usize) -> SynthEngine<RecordingBus> {
    // 8 packed bytes: 16 nibbles of ramp data
    let data: Vec<u8> = (0..8).map(|i| (i << 4) | (i + 1)).collect();
    let mut bank = SampleBank::new(data);
    bank.assign(
        36,
        SampleRange {
            start: 0,
            nibbles,
            divisor: 1,
        },
    )
    .unwrap();
    SynthEngine::new(PresetStore::default_table(), bank, RecordingBus::default())
}

#[test]
fn sample_of_length_l_completes_after_exactly_l_ticks() {
    let len = 10usize;
    let mut synth = sample_synth(len);
    note_on(&mut synth, 10, 36, 100); // sample channel
    assert!(synth.sample_active());

    for _ in 0..len {
        assert!(synth.sample_active());
        synth.sample_tick();
    }
    // Tick L+1 hands the amplitude register back to tonal control
    synth.sample_tick();
    assert!(!synth.sample_active());
    let (addr, value) = *synth.bus().writes.last().unwrap();
    assert_eq!(addr, 10); // R10, channel C amplitude
    assert_eq!(value, 0); // no tonal voice on channel C
}

#[test]
fn sample_retrigger_restarts_cursor_without_tail() {
    let mut synth = sample_synth(16);
    note_on(&mut synth, 10, 36, 100);
    for _ in 0..5 {
        synth.sample_tick();
    }
    // Retrigger mid-playback: next level is nibble 0 again
    note_on(&mut synth, 10, 36, 100);
    synth.sample_tick();
    let (addr, value) = *synth.bus().writes.last().unwrap();
    assert_eq!(addr, 10);
    assert_eq!(value, 0); // first nibble of the ramp
}

#[test]
fn sample_note_off_is_ignored() {
    let mut synth = sample_synth(16);
    note_on(&mut synth, 10, 36, 100);
    for byte in [0x89, 36, 0] {
        synth.feed_byte(byte);
    }
    assert!(synth.sample_active());
}

#[test]
fn sample_playback_masks_channel_c_in_the_mixer() {
    let mut synth = sample_synth(16);
    note_on(&mut synth, 10, 36, 100);
    synth.modulation_tick();
    let mixer = synth
        .bus()
        .writes
        .iter()
        .rev()
        .find(|(a, _)| *a == 7)
        .map(|(_, v)| *v)
        .unwrap();
    // Tone C (bit 2) and noise C (bit 5) both disabled
    assert_ne!(mixer & 0b0000_0100, 0);
    assert_ne!(mixer & 0b0010_0000, 0);
}

#[test]
fn running_status_drives_full_chords() {
    let mut synth = engine();
    // One status byte, three notes on channel 1
    for byte in [0x90, 60, 100, 64, 100, 67, 100] {
        synth.feed_byte(byte);
    }
    assert_eq!(synth.active_voices(), 3);
}

#[test]
fn malformed_bytes_resynchronize_silently() {
    let mut synth = engine();
    for byte in [0x12, 0x7F, 0xF1, 0x33, 0x90, 60, 100] {
        synth.feed_byte(byte);
    }
    assert_eq!(synth.active_voices(), 1);
}
