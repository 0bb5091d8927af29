// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The global parameter table.
//!
//! Ids follow the instrument's SysEx numbering. 33 and 34 were folded into
//! 30 and 32 by a firmware update and stay unused.

use super::display::{pitch_variance_cents, ppqn, semitones, swing_percentage};
use super::Category::*;
use super::ParameterDef;

const KNOB_MODES: &[(u16, &str)] = &[(0, "Snap"), (1, "Pass-Thru"), (2, "Relative")];

const NOTE_PRIORITIES: &[(u16, &str)] = &[(0, "Low"), (1, "High"), (2, "Last Note")];

const MIDI_PORTS: &[(u16, &str)] = &[
    (0, "None"),
    (1, "DIN Only"),
    (2, "USB Only"),
    (3, "Both DIN and USB"),
];

const MIDI_ECHO: &[(u16, &str)] = &[
    (0, "Off"),
    (1, "Echo to DIN Out"),
    (2, "Echo to USB Out"),
    (3, "Echo to Both"),
];

const PPQN_CHOICES: &[(u16, &str)] = &[
    (0, "1 PPQN"),
    (1, "2 PPQN"),
    (2, "3 PPQN"),
    (3, "4 PPQN"),
    (4, "5 PPQN"),
    (5, "6 PPQN"),
    (6, "7 PPQN"),
    (7, "8 PPQN"),
    (8, "9 PPQN"),
    (9, "10 PPQN"),
    (10, "11 PPQN"),
    (11, "12 PPQN"),
    (12, "24 PPQN"),
    (13, "48 PPQN"),
];

const BIPOLAR_CV: &[(u16, &str)] = &[(0, "-5V to +5V"), (1, "0V to +10V")];
const UNIPOLAR_CV: &[(u16, &str)] = &[(0, "0V to +5V"), (1, "0V to +10V")];
const GATE_CV: &[(u16, &str)] = &[(0, "+5V"), (1, "+10V")];

/// Every global parameter, sorted by id
#[rustfmt::skip]
pub static PARAMETERS: &[ParameterDef] = &[
    ParameterDef::range(0, "Unit ID", Advanced, 0, "MIDI Unit ID for SysEx communication", 0, 15)
        .with_tooltip("Unit ID for MIDI SysEx (usually 0)"),
    ParameterDef::range(1, "Tuning Scale", Advanced, 0, "Active tuning scale (0=12-TET)", 0, 31)
        .with_tooltip("Tuning table selection (0=12-tone equal temperament)"),
    ParameterDef::choice(2, "Knob Mode", Advanced, 2, "How panel knobs respond to value changes", KNOB_MODES),
    ParameterDef::choice(3, "Note Priority", PerformanceKeyboard, 2, "Which note takes priority in monophonic mode", NOTE_PRIORITIES),
    ParameterDef::toggle(4, "Send Program Change", MidiCommunication, 0, "Send MIDI Program Change when selecting sequences"),
    ParameterDef::toggle(5, "Receive Program Change", MidiCommunication, 1, "Respond to MIDI Program Change messages"),
    ParameterDef::choice(6, "MIDI Input Ports", MidiCommunication, 3, "Which MIDI input ports to use", MIDI_PORTS),
    ParameterDef::choice(7, "MIDI Output Ports", MidiCommunication, 3, "Which MIDI output ports to use", MIDI_PORTS),
    ParameterDef::choice(8, "MIDI Echo USB In", MidiCommunication, 0, "Echo USB MIDI input to outputs", MIDI_ECHO),
    ParameterDef::choice(9, "MIDI Echo DIN In", MidiCommunication, 0, "Echo DIN MIDI input to outputs", MIDI_ECHO),
    ParameterDef::channel(10, "MIDI Input Channel", MidiCommunication, 0, "MIDI input channel (1-16)"),
    ParameterDef::channel(11, "MIDI Output Channel", MidiCommunication, 0, "MIDI output channel (1-16)"),
    ParameterDef::toggle(12, "MIDI Out Filter - Keys", MidiCommunication, 1, "Send MIDI note messages from keyboard"),
    ParameterDef::toggle(13, "MIDI Out Filter - Wheels", MidiCommunication, 1, "Send MIDI CC from pitch/mod wheels"),
    ParameterDef::toggle(14, "MIDI Out Filter - Panel", MidiCommunication, 1, "Send MIDI CC from panel controls"),
    ParameterDef::toggle(15, "Output 14-bit MIDI CCs", MidiCommunication, 0, "Use 14-bit resolution for MIDI CC output"),
    ParameterDef::toggle(16, "Local Control: Keys", MidiCommunication, 1, "Keyboard controls internal synth engine"),
    ParameterDef::toggle(17, "Local Control: Wheels", MidiCommunication, 1, "Pitch/Mod wheels control internal synth engine"),
    ParameterDef::toggle(18, "Local Control: Panel", MidiCommunication, 1, "Panel controls affect internal synth engine"),
    ParameterDef::toggle(19, "Local Control: Arp/Seq", MidiCommunication, 1, "Arp/Sequencer controls internal synth engine"),
    ParameterDef::choice(20, "Sequence Transpose Mode", ArpSequencer, 0, "How sequences transpose with keyboard input",
        &[(0, "Relative to First Note"), (1, "Relative to Middle C")]),
    ParameterDef::toggle(21, "Arp/Seq Keyed Timing Reset", ArpSequencer, 0, "Reset master clock when key is pressed"),
    ParameterDef::toggle(22, "Arp FW/BW Repeats", ArpSequencer, 1, "Repeat end notes when direction changes"),
    ParameterDef::range(23, "Arp/Seq Swing", ArpSequencer, 8192, "Rhythmic swing amount for arp/sequencer", 0, 16383)
        .with_formatter(swing_percentage)
        .with_tooltip("Swing timing: 50% = straight, <50% = early, >50% = late"),
    ParameterDef::toggle(24, "Sequence Keyboard Control", ArpSequencer, 1, "Keyboard controls sequence playback"),
    ParameterDef::toggle(25, "Delay Sequence Change", ArpSequencer, 0, "Wait for sequence end before changing"),
    ParameterDef::toggle(26, "Sequence Keyed Restart", ArpSequencer, 0, "Restart sequence when keyboard control changes"),
    ParameterDef::choice(27, "Arp/Seq Clock Input Mode", ArpSequencer, 0, "How external clock input works",
        &[(0, "Clock"), (1, "Step-Advance Trigger")]),
    ParameterDef::choice(28, "Arp/Seq Clock Output", ArpSequencer, 1, "When to send clock output",
        &[(0, "Always"), (1, "Only When Playing")]),
    ParameterDef::toggle(29, "Arp MIDI Output", ArpSequencer, 1, "Send MIDI notes from arp/sequencer"),
    ParameterDef::choice(30, "MIDI Clock Input", MidiCommunication, 0, "MIDI clock and start/stop input behavior",
        &[(0, "Follow Clock + Start/Stop"), (1, "Follow Clock Only"), (2, "Ignore All")]),
    ParameterDef::choice(31, "MIDI Clock Output", MidiCommunication, 0, "MIDI clock and start/stop output behavior",
        &[(0, "Send Clock + Start/Stop"), (1, "Send Clock Only"), (2, "Send Nothing")]),
    ParameterDef::toggle(32, "Follow Song Position Pointer", MidiCommunication, 1, "Respond to MIDI song position"),
    ParameterDef::choice(35, "Clock Input PPQN", ArpSequencer, 3, "Clock input resolution", PPQN_CHOICES)
        .with_formatter(ppqn),
    ParameterDef::choice(36, "Clock Output PPQN", ArpSequencer, 3, "Clock output resolution", PPQN_CHOICES)
        .with_formatter(ppqn),
    ParameterDef::range(37, "Pitch Bend Range", PerformanceKeyboard, 2, "Pitch wheel bend range in semitones", 0, 12)
        .with_formatter(semitones),
    ParameterDef::choice(38, "Keyboard Octave Transpose", PerformanceKeyboard, 2, "Keyboard octave transpose setting",
        &[(0, "-2 Octaves"), (1, "-1 Octave"), (2, "Normal"), (3, "+1 Octave"), (4, "+2 Octaves")]),
    ParameterDef::toggle(39, "Delayed Keyboard Octave Shift", PerformanceKeyboard, 1, "Delay octave shifts until new notes"),
    ParameterDef::choice(40, "Glide Type", PerformanceKeyboard, 0, "Portamento/glide behavior type",
        &[(0, "Linear Constant Rate"), (1, "Linear Constant Time"), (2, "Exponential")]),
    ParameterDef::toggle(41, "Gated Glide", PerformanceKeyboard, 1, "Glide only occurs while keys are held"),
    ParameterDef::toggle(42, "Legato Glide", PerformanceKeyboard, 1, "Glide only when playing legato"),
    ParameterDef::range(43, "Osc 2 Freq Knob Range", AudioCv, 7, "Oscillator 2 frequency knob range in semitones", 0, 24)
        .with_formatter(semitones),
    ParameterDef::range(44, "Osc 3 Freq Knob Range", AudioCv, 7, "Oscillator 3 frequency knob range in semitones", 0, 24)
        .with_formatter(semitones),
    ParameterDef::range(45, "Osc 4 Freq Knob Range", AudioCv, 7, "Oscillator 4 frequency knob range in semitones", 0, 24)
        .with_formatter(semitones),
    ParameterDef::toggle(46, "Hard Sync Enable", AudioCv, 0, "Enable hard sync functionality"),
    ParameterDef::toggle(47, "Osc 2 Hard Sync", AudioCv, 0, "Sync Oscillator 2 to Oscillator 1"),
    ParameterDef::toggle(48, "Osc 3 Hard Sync", AudioCv, 0, "Sync Oscillator 3 to Oscillator 2"),
    ParameterDef::toggle(49, "Osc 4 Hard Sync", AudioCv, 0, "Sync Oscillator 4 to Oscillator 3"),
    ParameterDef::toggle(50, "Delay Ping Pong", AudioCv, 0, "Enable ping pong delay mode"),
    ParameterDef::toggle(51, "Delay Sync", AudioCv, 0, "Sync delay to clock"),
    ParameterDef::choice(52, "Delay Filter Brightness", AudioCv, 1, "Delay output filtering",
        &[(0, "Dark"), (1, "Bright")]),
    ParameterDef::toggle(53, "Delay CV Sync-Bend", AudioCv, 0, "Allow CV to bend sync'd delay time"),
    ParameterDef::toggle(54, "Tap-Tempo Clock Division Persistence", ArpSequencer, 0, "Maintain clock divisions when using tap tempo"),
    ParameterDef::choice(55, "Paraphony Mode", PerformanceKeyboard, 0, "Voice assignment mode",
        &[(0, "Mono (1 Voice)"), (1, "Duo (2 Voice)"), (2, "Quad (4 Voice)")]),
    ParameterDef::toggle(56, "Paraphonic Unison", PerformanceKeyboard, 0, "All oscillators sound even in paraphonic modes"),
    ParameterDef::toggle(57, "Multi Trig", PerformanceKeyboard, 0, "Envelope retriggering behavior"),
    ParameterDef::range(58, "Pitch Variance", Advanced, 0, "Random pitch variation per note", 0, 400)
        .with_formatter(pitch_variance_cents),
    ParameterDef::choice(59, "KB CV OUT Range", AudioCv, 0, "Keyboard CV output voltage range", BIPOLAR_CV),
    ParameterDef::choice(60, "Arp/Seq CV OUT Range", AudioCv, 0, "Arpeggiator/Sequencer CV output range", BIPOLAR_CV),
    ParameterDef::choice(61, "KB VEL OUT Range", AudioCv, 0, "Keyboard velocity CV output range", UNIPOLAR_CV),
    ParameterDef::choice(62, "Arp/Seq VEL OUT Range", AudioCv, 0, "Arp/Seq velocity CV output range", UNIPOLAR_CV),
    ParameterDef::choice(63, "KB AT OUT Range", AudioCv, 0, "Keyboard aftertouch CV output range", UNIPOLAR_CV),
    ParameterDef::choice(64, "MOD WHL OUT Range", AudioCv, 0, "Modulation wheel CV output range", UNIPOLAR_CV),
    ParameterDef::choice(65, "KB GATE OUT Range", AudioCv, 0, "Keyboard gate CV output voltage", GATE_CV),
    ParameterDef::choice(66, "Arp/Seq GATE OUT Range", AudioCv, 0, "Arp/Seq gate CV output voltage", GATE_CV),
    ParameterDef::choice(67, "Round-Robin Mode", PerformanceKeyboard, 1, "Voice assignment pattern in paraphonic mode",
        &[(0, "Off"), (1, "On with Reset"), (2, "On")]),
    ParameterDef::toggle(68, "Restore Stolen Voices", PerformanceKeyboard, 0, "Resume stolen voices when keys released"),
    ParameterDef::toggle(69, "Update Unison on Note-Off", PerformanceKeyboard, 0, "Reassign oscillators when notes released"),
    ParameterDef::choice(70, "Mod Oscillator Square Wave Polarity", Advanced, 1, "Modulation LFO square wave behavior",
        &[(0, "Unipolar"), (1, "Bipolar")]),
    ParameterDef::range(71, "Noise Filter Cutoff", AudioCv, 16383, "High-pass filter cutoff for noise generator", 0, 16383),
    ParameterDef::choice(72, "Arp/Seq Random Repeats", ArpSequencer, 1, "Allow repeated notes in random mode",
        &[(0, "No Repeats"), (1, "Allow Repeats")]),
    ParameterDef::toggle(73, "ARP/SEQ CV OUT Mirrors KB CV", AudioCv, 0, "Arp/Seq outputs mirror keyboard when not running"),
    ParameterDef::toggle(74, "KB CV OUT Mirrors ARP/SEQ CV", AudioCv, 0, "Keyboard outputs mirror arp/seq when running"),
    ParameterDef::choice(75, "MIDI Velocity Curves", MidiCommunication, 0, "Keyboard velocity response curve",
        &[(0, "Base"), (1, "Linear"), (2, "Hard"), (3, "Soft")]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterKind;
    use crate::sysex;
    use std::collections::HashSet;

    #[test]
    fn test_ids_sorted_and_unique() {
        assert!(PARAMETERS.windows(2).all(|w| w[0].id < w[1].id));
        let unique: HashSet<u8> = PARAMETERS.iter().map(|p| p.id).collect();
        assert_eq!(unique.len(), PARAMETERS.len());
        assert_eq!(PARAMETERS.len(), 74);
    }

    #[test]
    fn test_defaults_are_already_valid() {
        for param in PARAMETERS {
            assert_eq!(
                param.validate(i32::from(param.default)),
                param.default,
                "{} default changes under validation",
                param.name
            );
            assert!(param.accepts(i32::from(param.default)), "{}", param.name);
        }
    }

    #[test]
    fn test_choice_tables_sorted() {
        for param in PARAMETERS {
            if let ParameterKind::Choice(choices) = param.kind {
                assert!(!choices.is_empty());
                assert!(choices.windows(2).all(|w| w[0].0 < w[1].0), "{}", param.name);
            }
        }
    }

    #[test]
    fn test_every_range_value_round_trips() {
        for param in PARAMETERS {
            let (min, max) = param.bounds();
            assert!(max <= sysex::MAX_VALUE);
            for value in min..=max {
                let frame = sysex::encode_set(param.id, value, 0).unwrap();
                let decoded = sysex::decode_response(&frame).unwrap();
                assert_eq!((decoded.parameter_id, decoded.value), (param.id, value));
            }
        }
    }

    #[test]
    fn test_formatted_parameters() {
        let swing = crate::params::get(23).unwrap();
        assert_eq!(swing.display(8192), "50.0%");

        let bend = crate::params::get(37).unwrap();
        assert_eq!(bend.display(2), "2 semitones");

        let ppqn = crate::params::get(35).unwrap();
        assert_eq!(ppqn.display(12), "24 PPQN (Sixteenth Notes)");
    }
}
