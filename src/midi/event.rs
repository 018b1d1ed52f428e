//! MIDI Event Definitions
//!
//! The subset of channel voice messages the synthesizer responds to.
//! Channels are carried 1-based (1-16) as on the wire.

/// A complete, validated MIDI channel voice message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Note On (a velocity of 0 is normalized to Note Off by the receiver)
    NoteOn {
        /// MIDI channel (1-16)
        channel: u8,
        /// Note number (0-127)
        note: u8,
        /// Key velocity (1-127)
        velocity: u8,
    },
    /// Note Off
    NoteOff {
        /// MIDI channel (1-16)
        channel: u8,
        /// Note number (0-127)
        note: u8,
    },
    /// Control Change
    ControlChange {
        /// MIDI channel (1-16)
        channel: u8,
        /// Controller number (0-127)
        controller: u8,
        /// Controller value (0-127)
        value: u8,
    },
    /// Pitch Bend with the raw 14-bit value (0-16383, center 8192)
    PitchBend {
        /// MIDI channel (1-16)
        channel: u8,
        /// 14-bit bend value
        value: u16,
    },
}

impl MidiEvent {
    /// The MIDI channel (1-16) this event arrived on
    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. } => channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_channel_accessor() {
        let ev = MidiEvent::NoteOn {
            channel: 5,
            note: 60,
            velocity: 100,
        };
        assert_eq!(ev.channel(), 5);

        let ev = MidiEvent::PitchBend {
            channel: 16,
            value: 8192,
        };
        assert_eq!(ev.channel(), 16);
    }
}
