use std::collections::BTreeSet;

use crate::chord::Chord;

/// Seconds playback keeps running past the end of the song before it counts
/// as finished.
pub const DEFAULT_TAIL_GRACE_SEC: f64 = 2.0;

/// How held pitches are compared against the chord being waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Every required pitch must be held; extra pitches are fine.
    #[default]
    Lenient,
    /// Held pitches must be exactly the required ones.
    Strict,
}

impl MatchPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            MatchPolicy::Strict
        } else {
            MatchPolicy::Lenient
        }
    }

    pub fn matches(&self, required: &BTreeSet<u8>, held: &BTreeSet<u8>) -> bool {
        match self {
            MatchPolicy::Lenient => required.is_subset(held),
            MatchPolicy::Strict => required == held,
        }
    }
}

/// Position of a practice run: where the timeline is, which chord is next
/// and whether progress is frozen waiting for the player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub elapsed_sec: f64,
    pub chord_index: usize,
    pub paused: bool,
    pub total_length_sec: f64,
}

impl PlaybackState {
    /// Fresh state for a newly loaded track.
    pub fn reset(total_length_sec: f64) -> Self {
        Self {
            elapsed_sec: 0.0,
            chord_index: 0,
            paused: false,
            total_length_sec,
        }
    }

    /// Pure transition for one frame.
    ///
    /// `held` must already include every input event received before this
    /// frame. `dt` is used as given.
    pub fn tick(
        mut self,
        chords: &[Chord],
        dt: f64,
        held: &BTreeSet<u8>,
        policy: MatchPolicy,
    ) -> Self {
        self.advance(chords, dt, held, policy);
        self
    }

    /// In-place form of [`PlaybackState::tick`].
    pub fn advance(&mut self, chords: &[Chord], dt: f64, held: &BTreeSet<u8>, policy: MatchPolicy) {
        match chords.get(self.chord_index) {
            Some(chord) if self.elapsed_sec >= chord.anchor_start() => {
                let matched = policy.matches(&chord.pitches(), held);
                self.paused = !matched;
                // a match resumes in this same frame
                if matched {
                    self.chord_index += 1;
                }
            }
            _ => self.paused = false,
        }

        if !self.paused {
            self.elapsed_sec += dt;
        }
    }

    pub fn current_chord<'a>(&self, chords: &'a [Chord]) -> Option<&'a Chord> {
        chords.get(self.chord_index)
    }

    /// Time the timeline will stop at next, or the song length once every
    /// chord has been played.
    pub fn required_time(&self, chords: &[Chord]) -> f64 {
        self.current_chord(chords)
            .map_or(self.total_length_sec, Chord::anchor_start)
    }

    pub fn required_pitches(&self, chords: &[Chord]) -> BTreeSet<u8> {
        self.current_chord(chords)
            .map(Chord::pitches)
            .unwrap_or_default()
    }

    /// True once playback has run `tail_grace_sec` past the end of the song.
    /// A song with no length is finished as soon as no chord is left to play.
    pub fn is_finished(&self, chords: &[Chord], tail_grace_sec: f64) -> bool {
        if self.total_length_sec > 0.0 {
            self.elapsed_sec > self.total_length_sec + tail_grace_sec
        } else {
            self.chord_index >= chords.len()
        }
    }
}
