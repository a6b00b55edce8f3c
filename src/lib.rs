//! Timing core of a chord practice trainer.
//!
//! A midi file is turned into absolute-time notes through its tempo map, the
//! notes of one track are grouped into chords, and a frame-driven
//! [`PlaybackState`] holds the timeline at each chord until the player is
//! holding the right pitches.
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use midi_chord_trainer::{group_chords, parse_track, MatchPolicy, PlaybackState};
//!
//! let bytes = std::fs::read("song.mid")?;
//! let track = parse_track(&bytes, 0)?;
//! let chords = group_chords(&track.notes, 0.08);
//!
//! let mut state = PlaybackState::reset(track.total_length_sec);
//! let held = BTreeSet::from([60, 64, 67]);
//! state.advance(&chords, 1.0 / 60.0, &held, MatchPolicy::Lenient);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod chord;
pub mod config;
pub mod error;
pub mod event;
pub mod formatter;
pub mod input;
pub mod playback;
pub mod score;
pub mod session;
pub mod tempo;
pub mod timeline;

pub use chord::{group_chords, Chord, ChordSequence};
pub use config::TrainerConfig;
pub use error::ParseError;
pub use input::{HeldPitches, InputEvent, Transition};
pub use playback::{MatchPolicy, PlaybackState};
pub use score::{ParsedTrack, Score};
pub use session::{Session, Status};
pub use tempo::{TempoBreakpoint, TempoMap, DEFAULT_MICROS_PER_BEAT};
pub use timeline::{NoteEntry, NoteTimeline};

/// Notes of one track of a midi file held in memory, assuming 120 bpm until
/// the file sets a tempo.
pub fn parse_track(bytes: &[u8], track_index: usize) -> Result<ParsedTrack, ParseError> {
    Score::from_bytes(bytes, DEFAULT_MICROS_PER_BEAT)?.parse_track(track_index)
}

/// Notes of every track merged in start order.
pub fn parse_merged(bytes: &[u8]) -> Result<ParsedTrack, ParseError> {
    Ok(Score::from_bytes(bytes, DEFAULT_MICROS_PER_BEAT)?.parse_merged())
}
