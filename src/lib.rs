// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Global-parameter SysEx control for the Moog Matriarch.
//!
//! - [`params`]: catalog of every global parameter
//! - [`sysex`]: query/set frame encoding and response decoding
//! - [`connection`]: port ownership, listener thread and blocking queries
//! - [`midi`]: port backends (midir hardware or a simulated instrument)

pub mod config;
pub mod connection;
pub mod error;
pub mod midi;
pub mod params;
pub mod sysex;

pub use config::Settings;
pub use connection::{ConnectionInfo, ConnectionManager, ConnectionState, PortList, QueryResults};
pub use error::{Error, Result};
