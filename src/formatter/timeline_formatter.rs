use crate::chord::Chord;
use crate::formatter::ChordFormatter;
use std::time::Duration;

/// Formats chords as `[chord 3@00:01.250: 60.64.67]`, optionally with the
/// longest note length of the chord appended.
pub struct TimelineFormatter {
    show_length: bool,
}

impl TimelineFormatter {
    pub fn new(show_length: bool) -> Self {
        Self { show_length }
    }
}

impl ChordFormatter for TimelineFormatter {
    fn format(&self, index: usize, chord: &Chord) -> String {
        let pitches: Vec<String> = chord.pitches().iter().map(|p| p.to_string()).collect();
        let mut line = format!(
            "[chord {index}@{timestamp}: {pitches}]",
            index = index + 1,
            timestamp = format_midi_time(chord.anchor_start()),
            pitches = pitches.join(".")
        );
        if self.show_length {
            let length = chord
                .notes()
                .iter()
                .map(|n| n.end_sec - n.start_sec)
                .fold(0.0, f64::max);
            line.push_str(&format!(" {:.3}s", length));
        }
        line
    }
}

pub fn format_midi_time(seconds: f64) -> String {
    let duration = Duration::from_secs_f64(seconds.max(0.0));
    let minutes = duration.as_secs() / 60;
    let seconds = duration.as_secs() % 60;
    let fractional = duration.subsec_millis();
    format!("{:02}:{:02}.{:03}", minutes, seconds, fractional)
}
