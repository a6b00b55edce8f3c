use std::io::Cursor;
use std::path::Path;

use log::info;
use midi_file::file::Division;
use midi_file::MidiFile;

use crate::error::ParseError;
use crate::event::{decode_track, tempo_changes, TimedEvent};
use crate::tempo::TempoMap;
use crate::timeline::{NoteEntry, NoteTimeline};

/// Notes of the selected track (or of every track in merge mode).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrack {
    pub notes: Vec<NoteEntry>,
    pub total_length_sec: f64,
    pub track_count: usize,
}

/// A decoded midi file: its division, its tracks reduced to timeline events
/// and the tempo map shared by all of them.
#[derive(Debug, Clone)]
pub struct Score {
    tracks: Vec<Vec<TimedEvent>>,
    tempo_map: TempoMap,
}

impl Score {
    pub fn load<P: AsRef<Path>>(path: P, default_micros_per_beat: u32) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        info!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes, default_micros_per_beat)
    }

    pub fn from_bytes(bytes: &[u8], default_micros_per_beat: u32) -> Result<Self, ParseError> {
        let midi_file =
            MidiFile::read(Cursor::new(bytes)).map_err(|e| ParseError::Malformed(e.to_string()))?;

        let ticks_per_beat: u16 = match midi_file.header().division() {
            Division::QuarterNote(qtr) => qtr.get(),
            Division::Smpte(smpte) => {
                return Err(ParseError::Malformed(format!(
                    "SMPTE division is not supported: {:?}",
                    smpte
                )))
            }
        };
        if ticks_per_beat == 0 {
            return Err(ParseError::Malformed(
                "division of 0 ticks per quarter note".to_string(),
            ));
        }

        let tracks: Vec<Vec<TimedEvent>> = midi_file.tracks().map(decode_track).collect();
        // tempo is global even when declared on a later track
        let tempo_map = TempoMap::build(
            tracks.iter().flat_map(|events| tempo_changes(events)),
            ticks_per_beat,
            default_micros_per_beat,
        );

        Ok(Self { tracks, tempo_map })
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo_map
    }

    pub fn parse_track(&self, track_index: usize) -> Result<ParsedTrack, ParseError> {
        let events = self
            .tracks
            .get(track_index)
            .ok_or(ParseError::TrackIndexOutOfRange {
                index: track_index,
                count: self.track_count(),
            })?;
        let timeline = NoteTimeline::from_track(events, &self.tempo_map);
        Ok(self.parsed(timeline))
    }

    /// Every track paired separately and merged into one start-ordered list,
    /// used when no track has been picked.
    pub fn parse_merged(&self) -> ParsedTrack {
        let timeline =
            NoteTimeline::merged(self.tracks.iter().map(Vec::as_slice), &self.tempo_map);
        self.parsed(timeline)
    }

    fn parsed(&self, timeline: NoteTimeline) -> ParsedTrack {
        ParsedTrack {
            notes: timeline.notes,
            total_length_sec: timeline.total_length_sec,
            track_count: self.track_count(),
        }
    }
}
