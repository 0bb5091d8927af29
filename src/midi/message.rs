// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Classification of raw MIDI input.
//!
//! The listener only decodes SysEx; everything else is parsed far enough to
//! be described in the traffic log.

use std::fmt;

use super::messages;
use crate::sysex;

/// Parsed MIDI message types
#[derive(Debug, Clone, PartialEq)]
pub enum MidiMessage {
    /// System Exclusive, delimiters included
    SysEx(Vec<u8>),
    /// Note On: channel (0-15), note (0-127), velocity (0-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },
    /// Pitch Bend: channel (0-15), value (-8192 to 8191)
    PitchBend { channel: u8, value: i16 },
    /// Channel Aftertouch: channel (0-15), pressure (0-127)
    ChannelAftertouch { channel: u8, pressure: u8 },
    /// Poly Aftertouch: channel (0-15), note (0-127), pressure (0-127)
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },
    /// MIDI Clock tick
    TimingClock,
    /// Start playback
    Start,
    /// Continue playback
    Continue,
    /// Stop playback
    Stop,
    /// Unknown/unparsed message
    Unknown(Vec<u8>),
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a MidiMessage
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let status = data[0];

        match status {
            messages::SYSEX_START => return Some(MidiMessage::SysEx(data.to_vec())),
            messages::TIMING_CLOCK => return Some(MidiMessage::TimingClock),
            messages::START => return Some(MidiMessage::Start),
            messages::CONTINUE => return Some(MidiMessage::Continue),
            messages::STOP => return Some(MidiMessage::Stop),
            _ => {}
        }

        // Channel messages
        let msg_type = status & 0xF0;
        let channel = status & 0x0F;

        match msg_type {
            messages::NOTE_OFF if data.len() >= 3 => Some(MidiMessage::NoteOff {
                channel,
                note: data[1] & 0x7F,
                velocity: data[2] & 0x7F,
            }),
            messages::NOTE_ON if data.len() >= 3 => {
                let velocity = data[2] & 0x7F;
                // Note On with velocity 0 is equivalent to Note Off
                if velocity == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data[1] & 0x7F,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: data[1] & 0x7F,
                        velocity,
                    })
                }
            }
            messages::CONTROL_CHANGE if data.len() >= 3 => Some(MidiMessage::ControlChange {
                channel,
                controller: data[1] & 0x7F,
                value: data[2] & 0x7F,
            }),
            messages::PROGRAM_CHANGE if data.len() >= 2 => Some(MidiMessage::ProgramChange {
                channel,
                program: data[1] & 0x7F,
            }),
            messages::PITCH_BEND if data.len() >= 3 => {
                let lsb = (data[1] & 0x7F) as i16;
                let msb = (data[2] & 0x7F) as i16;
                let value = ((msb << 7) | lsb) - 8192;
                Some(MidiMessage::PitchBend { channel, value })
            }
            messages::CHANNEL_AFTERTOUCH if data.len() >= 2 => {
                Some(MidiMessage::ChannelAftertouch {
                    channel,
                    pressure: data[1] & 0x7F,
                })
            }
            messages::POLY_AFTERTOUCH if data.len() >= 3 => Some(MidiMessage::PolyAftertouch {
                channel,
                note: data[1] & 0x7F,
                pressure: data[2] & 0x7F,
            }),
            _ => Some(MidiMessage::Unknown(data.to_vec())),
        }
    }

    /// Raw bytes for a Control Change
    pub fn control_change(channel: u8, controller: u8, value: u8) -> [u8; 3] {
        [
            messages::CONTROL_CHANGE | (channel & 0x0F),
            controller & 0x7F,
            value & 0x7F,
        ]
    }

    /// Check if this is a SysEx message
    pub fn is_sysex(&self) -> bool {
        matches!(self, MidiMessage::SysEx(_))
    }

    /// Check if this is a Control Change
    pub fn is_control_change(&self) -> bool {
        matches!(self, MidiMessage::ControlChange { .. })
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiMessage::SysEx(data) => f.write_str(&sysex::format_for_log(data)),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "note_on channel={} note={} velocity={}", channel, note, velocity),
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "note_off channel={} note={} velocity={}", channel, note, velocity),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => write!(
                f,
                "control_change channel={} control={} value={}",
                channel, controller, value
            ),
            MidiMessage::ProgramChange { channel, program } => {
                write!(f, "program_change channel={} program={}", channel, program)
            }
            MidiMessage::PitchBend { channel, value } => {
                write!(f, "pitchwheel channel={} pitch={}", channel, value)
            }
            MidiMessage::ChannelAftertouch { channel, pressure } => {
                write!(f, "aftertouch channel={} value={}", channel, pressure)
            }
            MidiMessage::PolyAftertouch {
                channel,
                note,
                pressure,
            } => write!(
                f,
                "polytouch channel={} note={} value={}",
                channel, note, pressure
            ),
            MidiMessage::TimingClock => f.write_str("clock"),
            MidiMessage::Start => f.write_str("start"),
            MidiMessage::Continue => f.write_str("continue"),
            MidiMessage::Stop => f.write_str("stop"),
            MidiMessage::Unknown(data) => {
                f.write_str("unknown")?;
                for byte in data {
                    write!(f, " {:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sysex() {
        let frame = sysex::encode_query(23, 0);
        let msg = MidiMessage::parse(&frame).unwrap();
        assert!(msg.is_sysex());
        assert_eq!(msg, MidiMessage::SysEx(frame));
    }

    #[test]
    fn test_parse_note_on_velocity_zero() {
        // Note On with velocity 0 should be treated as Note Off
        let msg = MidiMessage::parse(&[0x90, 60, 0]);
        assert_eq!(
            msg,
            Some(MidiMessage::NoteOff {
                channel: 0,
                note: 60,
                velocity: 0
            })
        );
    }

    #[test]
    fn test_parse_control_change() {
        let msg = MidiMessage::parse(&[0xB3, 1, 64]).unwrap();
        assert!(msg.is_control_change());
        assert_eq!(
            msg,
            MidiMessage::ControlChange {
                channel: 3,
                controller: 1,
                value: 64
            }
        );
    }

    #[test]
    fn test_parse_pitch_bend() {
        // Center position (0)
        let msg = MidiMessage::parse(&[0xE0, 0x00, 0x40]);
        assert_eq!(
            msg,
            Some(MidiMessage::PitchBend {
                channel: 0,
                value: 0
            })
        );
    }

    #[test]
    fn test_parse_clock_messages() {
        assert_eq!(
            MidiMessage::parse(&[0xF8]),
            Some(MidiMessage::TimingClock)
        );
        assert_eq!(MidiMessage::parse(&[0xFA]), Some(MidiMessage::Start));
        assert_eq!(MidiMessage::parse(&[0xFC]), Some(MidiMessage::Stop));
    }

    #[test]
    fn test_parse_truncated_is_unknown() {
        assert_eq!(
            MidiMessage::parse(&[0xB0, 1]),
            Some(MidiMessage::Unknown(vec![0xB0, 1]))
        );
        assert_eq!(MidiMessage::parse(&[]), None);
    }

    #[test]
    fn test_control_change_bytes() {
        assert_eq!(MidiMessage::control_change(0, 7, 100), [0xB0, 7, 100]);
        assert_eq!(MidiMessage::control_change(15, 1, 0), [0xBF, 1, 0]);
    }

    #[test]
    fn test_display_for_log() {
        let cc = MidiMessage::ControlChange {
            channel: 0,
            controller: 1,
            value: 64,
        };
        assert_eq!(cc.to_string(), "control_change channel=0 control=1 value=64");

        let sysex = MidiMessage::SysEx(vec![0xF0, 0x04, 0x17, 0xF7]);
        assert_eq!(sysex.to_string(), "SysEx: F0 04 17 F7");

        assert_eq!(MidiMessage::Unknown(vec![0xF1, 0x20]).to_string(), "unknown F1 20");
    }
}
