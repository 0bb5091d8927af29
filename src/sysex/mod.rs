// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! SysEx codec for the Matriarch global parameter protocol.
//!
//! Frames are built and parsed with their 0xF0/0xF7 delimiters attached,
//! which is the form the MIDI backends deliver and accept.

pub mod codec;

pub use codec::{
    combine_7bit, decode_response, encode_query, encode_response, encode_set, format_for_log,
    is_7bit_clean, is_recognized, split_14bit, SysexResponse, FLAG_OFFSET, GET_PARAM_CMD,
    MANUFACTURER_ID, MAX_VALUE, MIN_FRAME_LEN, SET_PARAM_CMD,
};
