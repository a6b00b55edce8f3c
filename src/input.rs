use std::collections::BTreeSet;

/// A live note message from the input device. Other messages are of no
/// interest to the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
}

impl InputEvent {
    /// Parses a raw channel message as delivered by a midi input port.
    pub fn parse(data: &[u8]) -> Option<Self> {
        // note messages are 3 bytes
        if data.len() < 3 {
            return None;
        }
        let pitch = data[1] & 0x7f;
        let velocity = data[2] & 0x7f;

        match data[0] & 0xf0 {
            0x80 => Some(Self::NoteOff { pitch }),
            0x90 if velocity == 0 => Some(Self::NoteOff { pitch }),
            0x90 => Some(Self::NoteOn { pitch, velocity }),
            _ => None,
        }
    }
}

/// Change in the held set caused by one event, for whoever starts and stops
/// tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pressed(u8),
    Released(u8),
}

/// Pitches currently held on the input device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeldPitches {
    pitches: BTreeSet<u8>,
}

impl HeldPitches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the transition if the event changed the held set. A repeated
    /// note-on or a note-off for a key that isn't down changes nothing.
    pub fn apply(&mut self, event: InputEvent) -> Option<Transition> {
        match event {
            InputEvent::NoteOn { pitch, .. } => {
                self.pitches.insert(pitch).then_some(Transition::Pressed(pitch))
            }
            InputEvent::NoteOff { pitch } => {
                self.pitches.remove(&pitch).then_some(Transition::Released(pitch))
            }
        }
    }

    pub fn pitches(&self) -> &BTreeSet<u8> {
        &self.pitches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_messages() {
        assert_eq!(
            InputEvent::parse(&[0x93, 60, 100]),
            Some(InputEvent::NoteOn { pitch: 60, velocity: 100 })
        );
        assert_eq!(
            InputEvent::parse(&[0x80, 60, 64]),
            Some(InputEvent::NoteOff { pitch: 60 })
        );
        assert_eq!(
            InputEvent::parse(&[0x90, 62, 0]),
            Some(InputEvent::NoteOff { pitch: 62 })
        );
        assert_eq!(InputEvent::parse(&[0xb0, 1, 64]), None);
        assert_eq!(InputEvent::parse(&[0x90, 60]), None);
    }

    #[test]
    fn test_held_transitions() {
        let mut held = HeldPitches::new();
        let on = |pitch| InputEvent::NoteOn { pitch, velocity: 90 };

        assert_eq!(held.apply(on(60)), Some(Transition::Pressed(60)));
        assert_eq!(held.apply(on(60)), None);
        assert_eq!(held.apply(on(64)), Some(Transition::Pressed(64)));
        assert_eq!(held.pitches(), &BTreeSet::from([60, 64]));

        assert_eq!(
            held.apply(InputEvent::NoteOff { pitch: 60 }),
            Some(Transition::Released(60))
        );
        assert_eq!(held.apply(InputEvent::NoteOff { pitch: 67 }), None);
        assert_eq!(held.pitches(), &BTreeSet::from([64]));
    }

    #[test]
    fn test_raw_messages_drive_held_set() {
        let mut held = HeldPitches::new();
        let messages: [&[u8]; 5] = [
            &[0x90, 60, 100],
            &[0x91, 64, 90],
            &[0xb0, 64, 127],
            &[0x90, 60, 0],
            &[0x80, 67, 64],
        ];
        let transitions: Vec<Transition> = messages
            .iter()
            .filter_map(|m| InputEvent::parse(m))
            .filter_map(|e| held.apply(e))
            .collect();

        assert_eq!(
            transitions,
            vec![
                Transition::Pressed(60),
                Transition::Pressed(64),
                Transition::Released(60),
            ]
        );
        assert_eq!(held.pitches(), &BTreeSet::from([64]));
    }
}
