// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for the SysEx core.

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the instrument
#[derive(Debug, Error)]
pub enum Error {
    /// A MIDI port could not be opened (bad name, busy, backend failure)
    #[error("failed to open MIDI port '{port}': {reason}")]
    PortOpen { port: String, reason: String },

    /// A message could not be written to the output port
    #[error("failed to write MIDI message: {0}")]
    PortWrite(String),

    /// Frame is shorter than the smallest valid response
    #[error("SysEx frame too short: {0} bytes")]
    FrameTooShort(usize),

    /// Frame does not start with 0xF0 or end with 0xF7
    #[error("SysEx frame is missing its start/end delimiters")]
    BadFraming,

    /// Manufacturer bytes do not match
    #[error("unknown manufacturer ID {0:02X} {1:02X}")]
    UnknownManufacturer(u8, u8),

    /// Command byte is not the set/response command
    #[error("unexpected SysEx command {0:02X}")]
    UnexpectedCommand(u8),

    /// No response arrived for a query before its deadline
    #[error("query for parameter {0} timed out")]
    QueryTimeout(u8),

    /// A value falls outside the parameter's declared bounds
    #[error("value {value} is out of range for parameter {parameter}")]
    Validation { parameter: u8, value: i32 },

    /// Parameter id is not in the catalog
    #[error("unknown parameter {0}")]
    UnknownParameter(u8),

    /// Operation needs an open connection
    #[error("not connected")]
    NotConnected,

    /// Settings are structurally valid but semantically wrong
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Whether the error came from decoding a frame.
    ///
    /// Codec errors are dropped by the listener; everything else is reported.
    pub fn is_codec(&self) -> bool {
        matches!(
            self,
            Error::FrameTooShort(_)
                | Error::BadFraming
                | Error::UnknownManufacturer(..)
                | Error::UnexpectedCommand(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_classification() {
        assert!(Error::FrameTooShort(3).is_codec());
        assert!(Error::BadFraming.is_codec());
        assert!(Error::UnknownManufacturer(0, 0).is_codec());
        assert!(Error::UnexpectedCommand(0x3E).is_codec());
        assert!(!Error::QueryTimeout(5).is_codec());
        assert!(!Error::PortWrite("gone".into()).is_codec());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::UnknownManufacturer(0x00, 0x20);
        assert_eq!(err.to_string(), "unknown manufacturer ID 00 20");

        let err = Error::Validation {
            parameter: 37,
            value: 13,
        };
        assert_eq!(err.to_string(), "value 13 is out of range for parameter 37");
    }
}
