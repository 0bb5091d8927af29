// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Value formatters for parameters whose raw numbers mean something else.

/// Swing 0-16383 as a percentage
pub fn swing_percentage(value: u16) -> String {
    let percent = f64::from(value) / 16383.0 * 100.0;
    format!("{:.1}%", percent)
}

/// Semitone count
pub fn semitones(value: u16) -> String {
    match value {
        0 => "None".to_string(),
        1 => "1 semitone".to_string(),
        n => format!("{} semitones", n),
    }
}

/// Clock resolution index as pulses per quarter note
pub fn ppqn(value: u16) -> String {
    let label = match value {
        0 => "1 PPQN (Whole Notes)",
        1 => "2 PPQN (Half Notes)",
        2 => "3 PPQN (Triplet Half Notes)",
        3 => "4 PPQN (Quarter Notes)",
        4 => "5 PPQN",
        5 => "6 PPQN (Triplet Quarter)",
        6 => "7 PPQN",
        7 => "8 PPQN (Eighth Notes)",
        8 => "9 PPQN",
        9 => "10 PPQN",
        10 => "11 PPQN",
        11 => "12 PPQN (Triplet Eighth)",
        12 => "24 PPQN (Sixteenth Notes)",
        13 => "48 PPQN (Thirty-second Notes)",
        other => return format!("{} PPQN", other),
    };
    label.to_string()
}

/// Pitch variance in tenths of a cent
pub fn pitch_variance_cents(value: u16) -> String {
    if value == 0 {
        return "Off".to_string();
    }
    format!("±{:.1} cents", f64::from(value) * 0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swing() {
        assert_eq!(swing_percentage(0), "0.0%");
        assert_eq!(swing_percentage(8192), "50.0%");
        assert_eq!(swing_percentage(16383), "100.0%");
    }

    #[test]
    fn test_semitones() {
        assert_eq!(semitones(0), "None");
        assert_eq!(semitones(1), "1 semitone");
        assert_eq!(semitones(12), "12 semitones");
    }

    #[test]
    fn test_ppqn() {
        assert_eq!(ppqn(3), "4 PPQN (Quarter Notes)");
        assert_eq!(ppqn(13), "48 PPQN (Thirty-second Notes)");
        assert_eq!(ppqn(20), "20 PPQN");
    }

    #[test]
    fn test_pitch_variance() {
        assert_eq!(pitch_variance_cents(0), "Off");
        assert_eq!(pitch_variance_cents(400), "±40.0 cents");
        assert_eq!(pitch_variance_cents(5), "±0.5 cents");
    }
}
