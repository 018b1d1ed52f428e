//! MIDI Input Handling
//!
//! Byte-level parsing of the serial MIDI stream into discrete events.

mod event;
mod receiver;

pub use event::MidiEvent;
pub use receiver::MidiReceiver;
