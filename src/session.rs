use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::chord::{group_chords, Chord, ChordSequence};
use crate::config::TrainerConfig;
use crate::error::ParseError;
use crate::playback::{MatchPolicy, PlaybackState};
use crate::score::{ParsedTrack, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    Paused,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Playing => write!(f, "PLAYING"),
            Status::Paused => write!(f, "PAUSED (press chord)"),
        }
    }
}

/// One practice run over a single track of a loaded file.
///
/// Every load or track switch builds a complete replacement first, so a
/// failed load leaves the current session as it was.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    score: Score,
    track_index: usize,
    chords: ChordSequence,
    state: PlaybackState,
    window_sec: f64,
    policy: MatchPolicy,
    tail_grace_sec: f64,
}

impl Session {
    /// Loads `path` and selects `track_index`, clamped to the tracks present.
    pub fn load<P: AsRef<Path>>(
        path: P,
        track_index: usize,
        config: &TrainerConfig,
    ) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let score = Score::load(path, config.default_micros_per_beat)?;
        Self::from_score(path.to_path_buf(), score, track_index, config)
    }

    /// Like [`Session::load`], but when `path` can't be used falls back to
    /// the first track of `config.fallback_midi_path`. The error returned is
    /// the fallback's.
    pub fn load_or_fallback<P: AsRef<Path>>(
        path: P,
        track_index: usize,
        config: &TrainerConfig,
    ) -> Result<Self, ParseError> {
        let path = path.as_ref();
        Self::load(path, track_index, config).or_else(|err| {
            warn!(
                "Could not load {}: {}; falling back to {}",
                path.display(),
                err,
                config.fallback_midi_path.display()
            );
            Self::load(&config.fallback_midi_path, 0, config)
        })
    }

    pub fn from_score(
        path: PathBuf,
        score: Score,
        track_index: usize,
        config: &TrainerConfig,
    ) -> Result<Self, ParseError> {
        let track_index = clamp_track(track_index, score.track_count());
        let parsed = select(&score, track_index)?;

        let mut session = Self {
            path,
            score,
            track_index,
            chords: Vec::new(),
            state: PlaybackState::default(),
            window_sec: config.hit_window_sec,
            policy: config.match_policy(),
            tail_grace_sec: config.tail_grace_sec,
        };
        session.reset(group_chords(&parsed.notes, session.window_sec), parsed.total_length_sec);
        Ok(session)
    }

    /// Replaces the chord sequence and restarts playback from zero.
    pub fn reset(&mut self, chords: ChordSequence, total_length_sec: f64) {
        info!(
            "Track {}/{} of {}: {} chords, {:.3}s",
            self.track_index + 1,
            self.score.track_count(),
            self.path.display(),
            chords.len(),
            total_length_sec
        );
        self.chords = chords;
        self.state = PlaybackState::reset(total_length_sec);
    }

    /// Switches to another track of the same file, clamped into range.
    pub fn select_track(&mut self, track_index: usize) -> Result<(), ParseError> {
        let track_index = clamp_track(track_index, self.score.track_count());
        let parsed = select(&self.score, track_index)?;
        self.track_index = track_index;
        self.reset(group_chords(&parsed.notes, self.window_sec), parsed.total_length_sec);
        Ok(())
    }

    pub fn next_track(&mut self) -> Result<(), ParseError> {
        self.select_track(self.track_index.saturating_add(1))
    }

    pub fn previous_track(&mut self) -> Result<(), ParseError> {
        self.select_track(self.track_index.saturating_sub(1))
    }

    /// Advances one frame. `held` must reflect all input received so far.
    pub fn tick(&mut self, dt: f64, held: &BTreeSet<u8>) {
        let chord_index = self.state.chord_index;
        let was_paused = self.state.paused;
        self.state.advance(&self.chords, dt, held, self.policy);

        if self.state.chord_index != chord_index {
            info!(
                "Chord {}/{} matched at {:.3}s",
                self.state.chord_index,
                self.chords.len(),
                self.state.elapsed_sec
            );
        } else if self.state.paused && !was_paused {
            info!(
                "Waiting for {:?} at {:.3}s",
                self.required_pitches(),
                self.state.elapsed_sec
            );
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished(&self.chords, self.tail_grace_sec)
    }

    pub fn status(&self) -> Status {
        if self.state.paused {
            Status::Paused
        } else {
            Status::Playing
        }
    }

    pub fn required_pitches(&self) -> BTreeSet<u8> {
        self.state.required_pitches(&self.chords)
    }

    pub fn current_chord(&self) -> Option<&Chord> {
        self.state.current_chord(&self.chords)
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn track_index(&self) -> usize {
        self.track_index
    }

    pub fn track_count(&self) -> usize {
        self.score.track_count()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn clamp_track(track_index: usize, track_count: usize) -> usize {
    track_index.min(track_count.saturating_sub(1))
}

// a file without tracks has nothing to select and plays as an empty song
fn select(score: &Score, track_index: usize) -> Result<ParsedTrack, ParseError> {
    if score.track_count() == 0 {
        return Ok(score.parse_merged());
    }
    score.parse_track(track_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_track() {
        assert_eq!(clamp_track(0, 0), 0);
        assert_eq!(clamp_track(5, 3), 2);
        assert_eq!(clamp_track(1, 3), 1);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Playing.to_string(), "PLAYING");
        assert_eq!(Status::Paused.to_string(), "PAUSED (press chord)");
    }
}
