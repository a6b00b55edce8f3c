use midi_file::core::Message;
use midi_file::file::{Event, MetaEvent, Track};

/// A track event reduced to the kinds the timeline cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Velocity 0 is kept as-is here; the timeline treats it as a note-off.
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    TempoChange { micros_per_quarter: u32 },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub delta_ticks: u32,
    pub kind: EventKind,
}

impl TimedEvent {
    pub fn new(delta_ticks: u32, kind: EventKind) -> Self {
        Self { delta_ticks, kind }
    }
}

/// Decodes every event of a `midi_file` track, keeping delta times intact so
/// absolute positions can be rebuilt later.
pub fn decode_track(track: &Track) -> Vec<TimedEvent> {
    track
        .events()
        .map(|track_event| TimedEvent {
            delta_ticks: track_event.delta_time(),
            kind: decode_event(track_event.event()),
        })
        .collect()
}

fn decode_event(event: &Event) -> EventKind {
    match event {
        Event::Midi(Message::NoteOn(note)) => EventKind::NoteOn {
            channel: note.channel().get(),
            pitch: note.note_number().get(),
            velocity: note.velocity().get(),
        },
        Event::Midi(Message::NoteOff(note)) => EventKind::NoteOff {
            channel: note.channel().get(),
            pitch: note.note_number().get(),
        },
        Event::Meta(MetaEvent::SetTempo(tempo)) => EventKind::TempoChange {
            micros_per_quarter: tempo.get(),
        },
        _ => EventKind::Other,
    }
}

/// Tempo changes of one track as `(absolute tick, microseconds per quarter)`,
/// in scan order.
pub fn tempo_changes(events: &[TimedEvent]) -> Vec<(u64, u32)> {
    let mut ticks: u64 = 0;
    let mut changes = Vec::new();
    for event in events {
        ticks += u64::from(event.delta_ticks);
        if let EventKind::TempoChange { micros_per_quarter } = event.kind {
            changes.push((ticks, micros_per_quarter));
        }
    }
    changes
}
