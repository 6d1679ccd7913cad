//! Decodes standard MIDI 1.0 status+data wire bytes into [`MidiMessage`]s.
//!
//! The handler reads 3 bytes per event (status + two data bytes); running
//! status is not supported.

// -------------------------------------------------------------------------------------------------

/// A single decoded MIDI channel-voice message, with its data nibbles decoded
/// per the MIDI 1.0 spec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiMessage {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyphonicKeyPressure { channel: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8 },
    ChannelPressure { channel: u8 },
    PitchBend { channel: u8, lsb: u8, msb: u8 },
    /// Status byte did not match any known channel-voice message.
    Unknown,
}

/// An event carrying the sample-accurate offset (within the current audio
/// callback) a [`MidiMessage`] should be applied at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiEvent {
    pub time: usize,
    pub message: MidiMessage,
}

// -------------------------------------------------------------------------------------------------

/// Decode 3 raw MIDI bytes (status + two data bytes) into a [`MidiMessage`].
/// Status byte high nibble selects the handler; low nibble is the channel.
pub fn decode_message(data: [u8; 3]) -> MidiMessage {
    let status = data[0] & 0xf0;
    let channel = data[0] & 0x0f;
    match status {
        0x80 => MidiMessage::NoteOff {
            channel,
            note: data[1],
            velocity: data[2],
        },
        0x90 => MidiMessage::NoteOn {
            channel,
            note: data[1],
            velocity: data[2],
        },
        0xa0 => MidiMessage::PolyphonicKeyPressure { channel },
        0xb0 => MidiMessage::ControlChange {
            channel,
            controller: data[1],
            value: data[2],
        },
        0xc0 => MidiMessage::ProgramChange { channel },
        0xd0 => MidiMessage::ChannelPressure { channel },
        0xe0 => MidiMessage::PitchBend {
            channel,
            lsb: data[1],
            msb: data[2],
        },
        _ => MidiMessage::Unknown,
    }
}

/// Decode a timestamped 3-byte MIDI event.
pub fn decode_event(time: usize, data: [u8; 3]) -> MidiEvent {
    MidiEvent {
        time,
        message: decode_message(data),
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_and_off() {
        assert_eq!(
            decode_message([0x90, 60, 100]),
            MidiMessage::NoteOn {
                channel: 0,
                note: 60,
                velocity: 100
            }
        );
        assert_eq!(
            decode_message([0x83, 60, 0]),
            MidiMessage::NoteOff {
                channel: 3,
                note: 60,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_note_on_with_zero_velocity_is_not_special_cased() {
        // velocity=0 note-on stays a NoteOn; the caller decides what to do with it.
        assert_eq!(
            decode_message([0x90, 60, 0]),
            MidiMessage::NoteOn {
                channel: 0,
                note: 60,
                velocity: 0
            }
        );
    }

    #[test]
    fn test_control_change() {
        assert_eq!(
            decode_message([0xb1, 1, 64]),
            MidiMessage::ControlChange {
                channel: 1,
                controller: 1,
                value: 64
            }
        );
    }

    #[test]
    fn test_pitch_bend() {
        assert_eq!(
            decode_message([0xe0, 0x00, 0x40]),
            MidiMessage::PitchBend {
                channel: 0,
                lsb: 0x00,
                msb: 0x40
            }
        );
    }

    #[test]
    fn test_unknown_status_is_discarded() {
        assert_eq!(decode_message([0xf8, 0, 0]), MidiMessage::Unknown);
    }
}
