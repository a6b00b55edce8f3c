use crate::chord::Chord;

mod timeline_formatter;

pub use timeline_formatter::{format_midi_time, TimelineFormatter};

pub trait ChordFormatter {
    fn format(&self, index: usize, chord: &Chord) -> String;
}
