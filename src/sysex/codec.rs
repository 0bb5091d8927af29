// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Encoding and decoding of parameter query/set frames.
//!
//! Frame layout (offsets include the 0xF0 delimiter):
//!
//! ```text
//! F0 04 17 <cmd> <param> <msb> <lsb> 00 00 00 00 00 00 00 <flag> <unit> F7
//! ```
//!
//! Queries carry ten zero bytes after the parameter id instead of the value
//! pair. The instrument answers a query with a set-command frame whose flag
//! byte is 1.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::midi::messages::{SYSEX_END, SYSEX_START};

/// Moog Music manufacturer id
pub const MANUFACTURER_ID: [u8; 2] = [0x04, 0x17];

/// Set a parameter (host) or report a parameter (device)
pub const SET_PARAM_CMD: u8 = 0x23;

/// Query a parameter
pub const GET_PARAM_CMD: u8 = 0x3E;

/// Smallest full frame the decoder accepts
pub const MIN_FRAME_LEN: usize = 16;

/// Offset of the response flag within a full frame
pub const FLAG_OFFSET: usize = 14;

/// Largest value the set encoding can carry with 7-bit clean bytes
pub const MAX_VALUE: u16 = 16383;

/// Smallest payload (delimiters stripped) worth attempting to decode
const MIN_RECOGNIZED_PAYLOAD: usize = 14;

const QUERY_PADDING: usize = 10;
const SET_PADDING: usize = 8;

/// A decoded parameter frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysexResponse {
    pub parameter_id: u8,
    pub value: u16,
    /// Set by the instrument when answering a query
    pub is_response: bool,
    pub unit_id: u8,
}

/// Build a query for `parameter_id` addressed to `unit_id`.
pub fn encode_query(parameter_id: u8, unit_id: u8) -> Vec<u8> {
    let mut frame = Vec::with_capacity(6 + QUERY_PADDING + 1);
    frame.push(SYSEX_START);
    frame.extend_from_slice(&MANUFACTURER_ID);
    frame.push(GET_PARAM_CMD);
    frame.push(parameter_id);
    frame.extend_from_slice(&[0u8; QUERY_PADDING]);
    frame.push(unit_id);
    frame.push(SYSEX_END);
    frame
}

/// Build a set command for `parameter_id`.
///
/// The value is split as `value / 128` and `value % 128`, which the decoder
/// reverses as `msb * 128 + lsb`. Values above [`MAX_VALUE`] are rejected.
pub fn encode_set(parameter_id: u8, value: u16, unit_id: u8) -> Result<Vec<u8>> {
    build_set_frame(parameter_id, value, unit_id, false)
}

/// Build the frame the instrument sends in answer to a query.
pub fn encode_response(parameter_id: u8, value: u16, unit_id: u8) -> Result<Vec<u8>> {
    build_set_frame(parameter_id, value, unit_id, true)
}

fn build_set_frame(parameter_id: u8, value: u16, unit_id: u8, response: bool) -> Result<Vec<u8>> {
    if value > MAX_VALUE {
        return Err(Error::Validation {
            parameter: parameter_id,
            value: i32::from(value),
        });
    }

    let msb = if value >= 128 { value / 128 } else { 0 };
    let lsb = value % 128;

    let mut frame = Vec::with_capacity(MIN_FRAME_LEN + 1);
    frame.push(SYSEX_START);
    frame.extend_from_slice(&MANUFACTURER_ID);
    frame.push(SET_PARAM_CMD);
    frame.push(parameter_id);
    frame.push(msb as u8);
    frame.push(lsb as u8);
    frame.extend_from_slice(&[0u8; SET_PADDING]);
    frame.push(unit_id);
    frame.push(SYSEX_END);

    if response {
        frame[FLAG_OFFSET] = 1;
    }
    Ok(frame)
}

/// Decode a set/response frame into a parameter id and value.
pub fn decode_response(frame: &[u8]) -> Result<SysexResponse> {
    if frame.len() < MIN_FRAME_LEN {
        return Err(Error::FrameTooShort(frame.len()));
    }

    if frame[0] != SYSEX_START || frame[frame.len() - 1] != SYSEX_END {
        return Err(Error::BadFraming);
    }

    if frame[1..3] != MANUFACTURER_ID {
        return Err(Error::UnknownManufacturer(frame[1], frame[2]));
    }

    if frame[3] != SET_PARAM_CMD {
        return Err(Error::UnexpectedCommand(frame[3]));
    }

    let parameter_id = frame[4];
    let value = u16::from(frame[5]) * 128 + u16::from(frame[6]);
    let is_response = frame[FLAG_OFFSET] == 1;
    let unit_id = frame[frame.len() - 2];

    tracing::trace!(
        parameter_id,
        value,
        is_response,
        unit_id,
        "decoded parameter frame"
    );

    Ok(SysexResponse {
        parameter_id,
        value,
        is_response,
        unit_id,
    })
}

/// Quick filter run before a full decode.
///
/// True when the frame carries our manufacturer id and is long enough to be
/// a parameter frame.
pub fn is_recognized(frame: &[u8]) -> bool {
    let payload = strip_delimiters(frame);
    payload.len() >= MIN_RECOGNIZED_PAYLOAD && payload[..2] == MANUFACTURER_ID
}

/// Hex dump for the traffic log, delimiters included.
pub fn format_for_log(frame: &[u8]) -> String {
    let mut out = String::from("SysEx:");
    let framed = frame.first() == Some(&SYSEX_START);

    if !framed {
        let _ = write!(out, " {:02X}", SYSEX_START);
    }
    for byte in frame {
        let _ = write!(out, " {:02X}", byte);
    }
    if !framed {
        let _ = write!(out, " {:02X}", SYSEX_END);
    }
    out
}

fn strip_delimiters(frame: &[u8]) -> &[u8] {
    let frame = frame.strip_prefix(&[SYSEX_START]).unwrap_or(frame);
    frame.strip_suffix(&[SYSEX_END]).unwrap_or(frame)
}

/// Conventional 14-bit split (`value >> 7`, `value & 0x7F`).
///
/// Not used by the set encoding; see [`encode_set`].
pub fn split_14bit(value: u16) -> (u8, u8) {
    (((value >> 7) & 0x7F) as u8, (value & 0x7F) as u8)
}

/// Inverse of [`split_14bit`].
pub fn combine_7bit(msb: u8, lsb: u8) -> u16 {
    (u16::from(msb & 0x7F) << 7) | u16::from(lsb & 0x7F)
}

/// Whether every byte is a valid MIDI data byte
pub fn is_7bit_clean(data: &[u8]) -> bool {
    data.iter().all(|b| *b <= 0x7F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swing_query_frame() {
        let frame = encode_query(23, 0);
        assert_eq!(frame.len(), 17);
        assert_eq!(frame[0], 0xF0);
        assert_eq!(&frame[1..3], &[0x04, 0x17]);
        assert_eq!(frame[3], 0x3E);
        assert_eq!(frame[4], 23);
        assert!(frame[5..15].iter().all(|b| *b == 0));
        assert_eq!(frame[15], 0);
        assert_eq!(frame[16], 0xF7);
    }

    #[test]
    fn test_query_carries_unit_id() {
        let frame = encode_query(0, 7);
        assert_eq!(frame[frame.len() - 2], 7);
    }

    #[test]
    fn test_set_frame_layout() {
        let frame = encode_set(37, 300, 2).unwrap();
        assert_eq!(
            frame,
            vec![0xF0, 0x04, 0x17, 0x23, 37, 2, 44, 0, 0, 0, 0, 0, 0, 0, 0, 2, 0xF7]
        );
    }

    #[test]
    fn test_set_small_value_has_zero_msb() {
        let frame = encode_set(10, 127, 0).unwrap();
        assert_eq!(frame[5], 0);
        assert_eq!(frame[6], 127);

        let frame = encode_set(10, 128, 0).unwrap();
        assert_eq!(frame[5], 1);
        assert_eq!(frame[6], 0);
    }

    #[test]
    fn test_set_rejects_values_above_max() {
        assert!(encode_set(23, MAX_VALUE, 0).is_ok());
        assert!(matches!(
            encode_set(23, MAX_VALUE + 1, 0),
            Err(Error::Validation { parameter: 23, .. })
        ));
    }

    #[test]
    fn test_set_frames_are_7bit_clean() {
        for value in [0u16, 1, 127, 128, 255, 8192, 16383] {
            let frame = encode_set(71, value, 15).unwrap();
            assert!(is_7bit_clean(&frame[1..frame.len() - 1]), "value {}", value);
        }
    }

    #[test]
    fn test_decode_set_round_trip() {
        for value in [0u16, 1, 64, 127, 128, 129, 200, 255, 256, 8192, 16383] {
            let frame = encode_set(23, value, 0).unwrap();
            let decoded = decode_response(&frame).unwrap();
            assert_eq!(decoded.parameter_id, 23);
            assert_eq!(decoded.value, value);
            assert!(!decoded.is_response);
        }
    }

    #[test]
    fn test_decode_response_flag_and_unit() {
        let frame = encode_response(55, 2, 9).unwrap();
        let decoded = decode_response(&frame).unwrap();
        assert_eq!(
            decoded,
            SysexResponse {
                parameter_id: 55,
                value: 2,
                is_response: true,
                unit_id: 9,
            }
        );
    }

    #[test]
    fn test_decode_too_short() {
        let frame = encode_set(1, 1, 0).unwrap();
        for len in 0..MIN_FRAME_LEN {
            assert!(matches!(
                decode_response(&frame[..len]),
                Err(Error::FrameTooShort(n)) if n == len
            ));
        }
    }

    #[test]
    fn test_decode_bad_framing() {
        let mut frame = encode_set(1, 1, 0).unwrap();
        frame[0] = 0x00;
        assert!(matches!(decode_response(&frame), Err(Error::BadFraming)));

        let mut frame = encode_set(1, 1, 0).unwrap();
        frame.pop();
        frame.push(0x00);
        assert!(matches!(decode_response(&frame), Err(Error::BadFraming)));
    }

    #[test]
    fn test_decode_unknown_manufacturer() {
        let frame = encode_set(3, 2, 0).unwrap();
        for index in [1usize, 2] {
            let mut altered = frame.clone();
            altered[index] ^= 0x40;
            assert!(matches!(
                decode_response(&altered),
                Err(Error::UnknownManufacturer(..))
            ));
        }
    }

    #[test]
    fn test_decode_rejects_query_command() {
        let mut frame = encode_query(3, 0);
        assert!(matches!(
            decode_response(&frame),
            Err(Error::UnexpectedCommand(GET_PARAM_CMD))
        ));

        frame[3] = 0x10;
        assert!(matches!(
            decode_response(&frame),
            Err(Error::UnexpectedCommand(0x10))
        ));
    }

    #[test]
    fn test_is_recognized() {
        assert!(is_recognized(&encode_query(0, 0)));
        assert!(is_recognized(&encode_set(0, 0, 0).unwrap()));

        // Bare payload without delimiters
        let frame = encode_set(0, 0, 0).unwrap();
        assert!(is_recognized(&frame[1..frame.len() - 1]));

        // Other manufacturer
        let mut other = frame.clone();
        other[1] = 0x00;
        assert!(!is_recognized(&other));

        // Too short
        assert!(!is_recognized(&[0xF0, 0x04, 0x17, 0x23, 0xF7]));
        assert!(!is_recognized(&[]));
    }

    #[test]
    fn test_format_for_log() {
        let frame = [0xF0, 0x04, 0x17, 0x3E, 0x17, 0xF7];
        assert_eq!(format_for_log(&frame), "SysEx: F0 04 17 3E 17 F7");

        // Delimiters are re-attached for bare payloads
        assert_eq!(format_for_log(&[0x04, 0x17]), "SysEx: F0 04 17 F7");
    }

    #[test]
    fn test_conventional_14bit_helpers() {
        assert_eq!(split_14bit(16383), (0x7F, 0x7F));
        assert_eq!(split_14bit(128), (1, 0));
        assert_eq!(combine_7bit(0x7F, 0x7F), 16383);
        assert_eq!(combine_7bit(1, 0), 128);
    }
}
