use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::event::{EventKind, TimedEvent};
use crate::tempo::TempoMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEntry {
    pub pitch: u8,
    pub start_sec: f64,
    pub end_sec: f64,
    pub velocity: u8,
}

/// Notes of one track (or of all tracks merged) ordered by start time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteTimeline {
    pub notes: Vec<NoteEntry>,
    pub total_length_sec: f64,
}

impl NoteTimeline {
    pub fn from_track(events: &[TimedEvent], tempo_map: &TempoMap) -> Self {
        let mut extractor = NoteExtractor::new(tempo_map);
        for event in events {
            extractor.process_event(event);
        }
        Self::from_notes(extractor.finish())
    }

    /// Merge mode: every track is paired on its own, then all notes are put
    /// back in start order. Ties keep track order.
    pub fn merged<'a, I>(tracks: I, tempo_map: &TempoMap) -> Self
    where
        I: IntoIterator<Item = &'a [TimedEvent]>,
    {
        let notes = tracks
            .into_iter()
            .flat_map(|events| Self::from_track(events, tempo_map).notes)
            .collect();
        Self::from_notes(notes)
    }

    fn from_notes(mut notes: Vec<NoteEntry>) -> Self {
        notes.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
        let total_length_sec = notes.iter().map(|n| n.end_sec).fold(0.0, f64::max);
        Self {
            notes,
            total_length_sec,
        }
    }
}

type PendingKey = (u8, u8); // (channel, pitch)

struct NoteExtractor<'a> {
    tempo_map: &'a TempoMap,
    ticks: u64,
    pending: HashMap<PendingKey, VecDeque<(f64, u8)>>,
    notes: Vec<NoteEntry>,
}

impl<'a> NoteExtractor<'a> {
    fn new(tempo_map: &'a TempoMap) -> Self {
        Self {
            tempo_map,
            ticks: 0,
            pending: HashMap::new(),
            notes: Vec::new(),
        }
    }

    fn process_event(&mut self, event: &TimedEvent) {
        self.ticks += u64::from(event.delta_ticks);
        let timestamp = self.tempo_map.seconds_at(self.ticks);
        match event.kind {
            EventKind::NoteOn {
                channel,
                pitch,
                velocity,
            } if velocity > 0 => self.handle_note_on(channel, pitch, velocity, timestamp),
            EventKind::NoteOn { channel, pitch, .. } | EventKind::NoteOff { channel, pitch } => {
                self.handle_note_off(channel, pitch, timestamp)
            }
            EventKind::TempoChange { .. } | EventKind::Other => (),
        }
    }

    fn handle_note_on(&mut self, channel: u8, pitch: u8, velocity: u8, timestamp: f64) {
        self.pending
            .entry((channel, pitch))
            .or_default()
            .push_back((timestamp, velocity));
    }

    fn handle_note_off(&mut self, channel: u8, pitch: u8, timestamp: f64) {
        // oldest open note closes first so retriggers pair in start order
        match self
            .pending
            .get_mut(&(channel, pitch))
            .and_then(VecDeque::pop_front)
        {
            Some((start_sec, velocity)) => self.notes.push(NoteEntry {
                pitch,
                start_sec,
                end_sec: timestamp,
                velocity,
            }),
            None => debug!(
                "-- Dropping note-off without note-on: ch {} pitch {} at {:.3}s",
                channel, pitch, timestamp
            ),
        }
    }

    fn finish(self) -> Vec<NoteEntry> {
        self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tempo::DEFAULT_MICROS_PER_BEAT;

    // 1 tick == 1ms at 120 bpm
    const TPB: u16 = 500;

    fn tempo_map() -> TempoMap {
        TempoMap::build(Vec::new(), TPB, DEFAULT_MICROS_PER_BEAT)
    }

    fn on(delta: u32, pitch: u8, velocity: u8) -> TimedEvent {
        TimedEvent::new(
            delta,
            EventKind::NoteOn {
                channel: 0,
                pitch,
                velocity,
            },
        )
    }

    fn off(delta: u32, pitch: u8) -> TimedEvent {
        TimedEvent::new(delta, EventKind::NoteOff { channel: 0, pitch })
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_fifo_pairing_of_retriggered_notes() {
        let events = vec![on(0, 60, 80), on(100, 60, 90), off(200, 60), off(200, 60)];
        let timeline = NoteTimeline::from_track(&events, &tempo_map());

        assert_eq!(timeline.notes.len(), 2);
        let first = timeline.notes[0];
        assert_eq!(first.pitch, 60);
        assert_close(first.start_sec, 0.0);
        assert_close(first.end_sec, 0.3);
        assert_eq!(first.velocity, 80);

        let second = timeline.notes[1];
        assert_close(second.start_sec, 0.1);
        assert_close(second.end_sec, 0.5);
        assert_eq!(second.velocity, 90);
        assert_close(timeline.total_length_sec, 0.5);
    }

    #[test]
    fn test_velocity_zero_is_note_off() {
        let events = vec![on(0, 64, 100), on(250, 64, 0)];
        let timeline = NoteTimeline::from_track(&events, &tempo_map());
        assert_eq!(timeline.notes.len(), 1);
        assert_close(timeline.notes[0].end_sec, 0.25);
        assert_eq!(timeline.notes[0].velocity, 100);
    }

    #[test]
    fn test_unmatched_note_off_is_dropped() {
        let events = vec![off(0, 61), on(10, 62, 70), off(10, 63), off(10, 62)];
        let timeline = NoteTimeline::from_track(&events, &tempo_map());
        assert_eq!(timeline.notes.len(), 1);
        assert_eq!(timeline.notes[0].pitch, 62);
    }

    #[test]
    fn test_channels_pair_independently() {
        let events = vec![
            TimedEvent::new(0, EventKind::NoteOn { channel: 0, pitch: 60, velocity: 50 }),
            TimedEvent::new(0, EventKind::NoteOn { channel: 1, pitch: 60, velocity: 60 }),
            TimedEvent::new(100, EventKind::NoteOff { channel: 1, pitch: 60 }),
            TimedEvent::new(100, EventKind::NoteOff { channel: 0, pitch: 60 }),
        ];
        let timeline = NoteTimeline::from_track(&events, &tempo_map());

        let velocities_and_ends: Vec<(u8, f64)> = timeline
            .notes
            .iter()
            .map(|n| (n.velocity, n.end_sec))
            .collect();
        assert_eq!(velocities_and_ends.len(), 2);
        assert!(velocities_and_ends.contains(&(60, 0.1)));
        assert!(velocities_and_ends.contains(&(50, 0.2)));
    }

    #[test]
    fn test_sorted_by_start_not_by_end() {
        // long note opened first, short note opened later but closed earlier
        let events = vec![on(0, 48, 90), on(100, 72, 90), off(100, 72), off(300, 48)];
        let timeline = NoteTimeline::from_track(&events, &tempo_map());
        let pitches: Vec<u8> = timeline.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![48, 72]);
        assert_close(timeline.total_length_sec, 0.5);
    }

    #[test]
    fn test_tempo_map_drives_timestamps() {
        let map = TempoMap::build(vec![(1000, 250_000)], TPB, DEFAULT_MICROS_PER_BEAT);
        let events = vec![on(1000, 60, 90), off(500, 60)];
        let timeline = NoteTimeline::from_track(&events, &map);
        assert_eq!(timeline.notes[0].start_sec, 1.0);
        assert_eq!(timeline.notes[0].end_sec, 1.25);
    }

    #[test]
    fn test_empty_track() {
        let timeline = NoteTimeline::from_track(&[], &tempo_map());
        assert!(timeline.notes.is_empty());
        assert_eq!(timeline.total_length_sec, 0.0);
    }

    #[test]
    fn test_merged_tracks() {
        let map = tempo_map();
        let melody = vec![on(100, 72, 90), off(100, 72)];
        let bass = vec![on(0, 36, 90), off(400, 36)];
        let timeline = NoteTimeline::merged([melody.as_slice(), bass.as_slice()], &map);

        let pitches: Vec<u8> = timeline.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![36, 72]);
        assert_close(timeline.total_length_sec, 0.4);
    }

    #[test]
    fn test_pending_notes_do_not_leak_across_tracks() {
        let map = tempo_map();
        let opens = vec![on(0, 60, 90)];
        let closes = vec![off(100, 60)];
        let timeline = NoteTimeline::merged([opens.as_slice(), closes.as_slice()], &map);
        assert!(timeline.notes.is_empty());
    }
}
