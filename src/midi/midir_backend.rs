// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! midir backend.
//!
//! This module provides the cross-platform implementation of [`Transport`],
//! opening ports by name and feeding received messages into an
//! [`InputPort`] channel from midir's callback thread.

use std::sync::mpsc;

use anyhow::{anyhow, Context, Result};
use midir::{Ignore, MidiInput, MidiOutput as MidirOutput, MidiOutputConnection};

use super::{InputPort, MidiOutput, OpenPorts, Transport};

const CLIENT_NAME: &str = "Matriarch Controller";

/// midir output connection
pub struct MidirOutputPort {
    connection: MidiOutputConnection,
}

impl MidiOutput for MidirOutputPort {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send MIDI message: {}", e))
    }
}

/// Transport over the platform MIDI API via midir
#[derive(Debug, Default, Clone, Copy)]
pub struct MidirTransport;

impl MidirTransport {
    pub fn new() -> Self {
        Self
    }

    fn open_output(&self, name: &str) -> Result<MidirOutputPort> {
        let midi_out = MidirOutput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI output client: {}", e))?;

        let port = midi_out
            .ports()
            .into_iter()
            .find(|p| midi_out.port_name(p).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow!("No MIDI output named '{}'", name))?;

        let connection = midi_out
            .connect(&port, "matriarch-out")
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", name, e))?;

        Ok(MidirOutputPort { connection })
    }

    fn open_input(&self, name: &str) -> Result<InputPort> {
        let mut midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI input client: {}", e))?;
        // SysEx is filtered by some backends unless asked for
        midi_in.ignore(Ignore::None);

        let port = midi_in
            .ports()
            .into_iter()
            .find(|p| midi_in.port_name(p).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow!("No MIDI input named '{}'", name))?;

        let (tx, rx) = mpsc::channel();
        let connection = midi_in
            .connect(
                &port,
                "matriarch-in",
                move |_stamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to '{}': {}", name, e))?;

        Ok(InputPort::new(rx, Some(Box::new(connection))))
    }
}

impl Transport for MidirTransport {
    fn list_inputs(&self) -> Result<Vec<String>> {
        let midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI input client: {}", e))?;

        let mut names = Vec::new();
        for (i, port) in midi_in.ports().iter().enumerate() {
            names.push(
                midi_in
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown {}", i)),
            );
        }
        Ok(names)
    }

    fn list_outputs(&self) -> Result<Vec<String>> {
        let midi_out = MidirOutput::new(CLIENT_NAME)
            .map_err(|e| anyhow!("Failed to create MIDI output client: {}", e))?;

        let mut names = Vec::new();
        for (i, port) in midi_out.ports().iter().enumerate() {
            names.push(
                midi_out
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown {}", i)),
            );
        }
        Ok(names)
    }

    fn open(&self, input_name: &str, output_name: &str) -> Result<OpenPorts> {
        let input = self
            .open_input(input_name)
            .with_context(|| format!("opening input '{}'", input_name))?;
        let output = self
            .open_output(output_name)
            .with_context(|| format!("opening output '{}'", output_name))?;

        Ok(OpenPorts {
            input,
            output: Box::new(output),
        })
    }
}
