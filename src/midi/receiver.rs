//! Byte-Level MIDI Parser
//!
//! A small state machine that consumes the serial MIDI stream one byte at a
//! time and emits a [`MidiEvent`] once a message is complete. Running status
//! is supported: after a complete message, further data bytes reuse the last
//! status. Anything malformed or unsupported is discarded and the parser
//! resynchronizes on the next valid status byte; it never blocks and never
//! faults.

use super::MidiEvent;

// Message types the receiver assembles events for
const STATUS_NOTE_OFF: u8 = 0x80;
const STATUS_NOTE_ON: u8 = 0x90;
const STATUS_CONTROL_CHANGE: u8 = 0xB0;
const STATUS_PITCH_BEND: u8 = 0xE0;

/// Parser state over the current message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// No message in progress; waiting for a status byte (or running status)
    WaitingForStatus,
    /// Status known, first data byte pending
    CollectingData1,
    /// First data byte stored, second data byte pending
    CollectingData2,
}

/// Incremental MIDI stream parser with running-status support
#[derive(Debug, Clone)]
pub struct MidiReceiver {
    state: ParserState,
    /// Last accepted status byte (0 = none, running status unavailable)
    status: u8,
    /// First data byte of a two-byte message
    data1: u8,
}

impl MidiReceiver {
    /// Create a receiver in the resynchronized idle state
    pub fn new() -> Self {
        MidiReceiver {
            state: ParserState::WaitingForStatus,
            status: 0,
            data1: 0,
        }
    }

    /// Consume one byte from the wire
    ///
    /// Returns a complete event when this byte finishes a message, `None`
    /// otherwise. Unsupported status bytes drop any message in progress.
    pub fn receive(&mut self, byte: u8) -> Option<MidiEvent> {
        // System real-time bytes (0xF8-0xFF) may appear anywhere and do not
        // disturb running status or a message in progress.
        if byte >= 0xF8 {
            return None;
        }

        if byte & 0x80 != 0 {
            return self.accept_status(byte);
        }

        match self.state {
            ParserState::WaitingForStatus => {
                // Running status: reuse the previous status byte, if any.
                if self.status == 0 {
                    return None;
                }
                self.data1 = byte;
                self.state = ParserState::CollectingData2;
                None
            }
            ParserState::CollectingData1 => {
                self.data1 = byte;
                self.state = ParserState::CollectingData2;
                None
            }
            ParserState::CollectingData2 => {
                self.state = ParserState::WaitingForStatus;
                self.assemble(byte)
            }
        }
    }

    /// Handle a status byte (0x80-0xF7)
    fn accept_status(&mut self, byte: u8) -> Option<MidiEvent> {
        match byte & 0xF0 {
            STATUS_NOTE_OFF | STATUS_NOTE_ON | STATUS_CONTROL_CHANGE | STATUS_PITCH_BEND => {
                self.status = byte;
                self.state = ParserState::CollectingData1;
            }
            _ => {
                // Unsupported message type (poly aftertouch, program change,
                // system common, ...): discard and resynchronize. Running
                // status is cleared so trailing data bytes are dropped too.
                self.status = 0;
                self.state = ParserState::WaitingForStatus;
            }
        }
        None
    }

    /// Build the event once both data bytes are in hand
    fn assemble(&mut self, data2: u8) -> Option<MidiEvent> {
        let channel = (self.status & 0x0F) + 1;
        match self.status & 0xF0 {
            STATUS_NOTE_ON => {
                if data2 == 0 {
                    // Note On with velocity 0 is a Note Off on the wire
                    Some(MidiEvent::NoteOff {
                        channel,
                        note: self.data1,
                    })
                } else {
                    Some(MidiEvent::NoteOn {
                        channel,
                        note: self.data1,
                        velocity: data2,
                    })
                }
            }
            STATUS_NOTE_OFF => Some(MidiEvent::NoteOff {
                channel,
                note: self.data1,
            }),
            STATUS_CONTROL_CHANGE => Some(MidiEvent::ControlChange {
                channel,
                controller: self.data1,
                value: data2,
            }),
            STATUS_PITCH_BEND => Some(MidiEvent::PitchBend {
                channel,
                value: ((data2 as u16) << 7) | self.data1 as u16,
            }),
            _ => None,
        }
    }
}

impl Default for MidiReceiver {
    fn default() -> Self {
        Self::new()
    }
}
