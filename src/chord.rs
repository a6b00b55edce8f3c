use std::collections::BTreeSet;

use crate::timeline::NoteEntry;

/// Notes whose starts all fall within the grouping window of the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    notes: Vec<NoteEntry>,
}

pub type ChordSequence = Vec<Chord>;

impl Chord {
    pub fn notes(&self) -> &[NoteEntry] {
        &self.notes
    }

    /// Start of the first note; the point where playback waits for the player.
    pub fn anchor_start(&self) -> f64 {
        self.notes[0].start_sec
    }

    pub fn pitches(&self) -> BTreeSet<u8> {
        self.notes.iter().map(|n| n.pitch).collect()
    }
}

/// Splits notes (ascending by start) into chords.
///
/// The window is measured from the chord's first note, not from the previous
/// note, so a slow run of closely spaced notes is cut as soon as it drifts
/// more than `window_sec` past its anchor.
pub fn group_chords(notes: &[NoteEntry], window_sec: f64) -> ChordSequence {
    let mut chords = Vec::new();
    let mut current: Vec<NoteEntry> = Vec::new();

    for note in notes {
        if let Some(anchor) = current.first() {
            if note.start_sec - anchor.start_sec > window_sec {
                chords.push(Chord {
                    notes: std::mem::take(&mut current),
                });
            }
        }
        current.push(*note);
    }
    if !current.is_empty() {
        chords.push(Chord { notes: current });
    }

    chords
}
