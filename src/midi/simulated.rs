// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-process stand-in for the instrument.
//!
//! `SimulatedDevice` implements [`Transport`] and answers parameter queries
//! the way the hardware does, so the connection manager can be exercised
//! without a synthesizer attached. Clones share the same device state.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::messages::SYSEX_START;
use super::{InputPort, MidiOutput, OpenPorts, Transport};
use crate::params;
use crate::sysex::{self, GET_PARAM_CMD, SET_PARAM_CMD};

/// Port name used for both directions
pub const PORT_NAME: &str = "Simulated Matriarch";

/// Which queries the device answers
#[derive(Debug, Clone, PartialEq, Eq)]
enum Answers {
    All,
    Only(HashSet<u8>),
}

#[derive(Debug)]
struct DeviceState {
    values: HashMap<u8, u16>,
    unit_id: u8,
    answers: Answers,
    response_delay: Duration,
    fail_writes: bool,
    received: Vec<Vec<u8>>,
    input_tx: Option<Sender<Vec<u8>>>,
    open_count: usize,
}

impl DeviceState {
    fn answers(&self, parameter_id: u8) -> bool {
        match &self.answers {
            Answers::All => true,
            Answers::Only(ids) => ids.contains(&parameter_id),
        }
    }

    fn handle(&mut self, message: &[u8]) {
        if message.first() != Some(&SYSEX_START) || !sysex::is_recognized(message) {
            return;
        }
        // Trailing unit byte sits just before F7
        let unit = message[message.len() - 2];
        if unit != self.unit_id {
            return;
        }

        match message[3] {
            GET_PARAM_CMD => {
                let parameter_id = message[4];
                if !self.answers(parameter_id) {
                    return;
                }
                let Some(value) = self.values.get(&parameter_id).copied() else {
                    return;
                };
                if let Ok(frame) = sysex::encode_response(parameter_id, value, self.unit_id) {
                    self.reply(frame);
                }
            }
            SET_PARAM_CMD => {
                if let Ok(decoded) = sysex::decode_response(message) {
                    self.values.insert(decoded.parameter_id, decoded.value);
                }
            }
            _ => {}
        }
    }

    fn reply(&self, frame: Vec<u8>) {
        let Some(tx) = self.input_tx.clone() else {
            return;
        };
        if self.response_delay.is_zero() {
            let _ = tx.send(frame);
        } else {
            let delay = self.response_delay;
            thread::spawn(move || {
                thread::sleep(delay);
                let _ = tx.send(frame);
            });
        }
    }
}

/// Simulated Matriarch reachable through [`PORT_NAME`]
#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
}

impl SimulatedDevice {
    /// A device holding factory defaults that answers every known parameter
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DeviceState {
                values: params::defaults().into_iter().collect(),
                unit_id: 0,
                answers: Answers::All,
                response_delay: Duration::ZERO,
                fail_writes: false,
                received: Vec::new(),
                input_tx: None,
                open_count: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a stored value
    pub fn with_value(self, parameter_id: u8, value: u16) -> Self {
        self.lock().values.insert(parameter_id, value);
        self
    }

    /// Set the unit id the device responds to
    pub fn with_unit_id(self, unit_id: u8) -> Self {
        self.lock().unit_id = unit_id;
        self
    }

    /// Delay every response
    pub fn with_response_delay(self, delay: Duration) -> Self {
        self.lock().response_delay = delay;
        self
    }

    /// Answer only the given parameter ids
    pub fn answer_only(self, ids: impl IntoIterator<Item = u8>) -> Self {
        self.lock().answers = Answers::Only(ids.into_iter().collect());
        self
    }

    /// Never answer anything
    pub fn silent(self) -> Self {
        self.answer_only(std::iter::empty())
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Stored value for a parameter
    pub fn value(&self, parameter_id: u8) -> Option<u16> {
        self.lock().values.get(&parameter_id).copied()
    }

    /// Every message written to the device, in order
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.lock().received.clone()
    }

    /// How many queries for `parameter_id` were received
    pub fn query_count(&self, parameter_id: u8) -> usize {
        self.lock()
            .received
            .iter()
            .filter(|m| m.len() > 4 && m[3] == GET_PARAM_CMD && m[4] == parameter_id)
            .count()
    }

    /// How many times the ports were opened
    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    /// Push an arbitrary message towards the host.
    ///
    /// Returns false when no input port is open.
    pub fn inject(&self, message: &[u8]) -> bool {
        match &self.lock().input_tx {
            Some(tx) => tx.send(message.to_vec()).is_ok(),
            None => false,
        }
    }

    /// Drop the device side of the input stream, as if the cable was pulled
    pub fn unplug(&self) {
        self.lock().input_tx = None;
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

struct SimulatedOutput {
    state: Arc<Mutex<DeviceState>>,
}

impl MidiOutput for SimulatedOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.fail_writes {
            return Err(anyhow!("simulated write failure"));
        }
        state.received.push(message.to_vec());
        state.handle(message);
        Ok(())
    }
}

impl Transport for SimulatedDevice {
    fn list_inputs(&self) -> Result<Vec<String>> {
        Ok(vec![PORT_NAME.to_string()])
    }

    fn list_outputs(&self) -> Result<Vec<String>> {
        Ok(vec![PORT_NAME.to_string()])
    }

    fn open(&self, input_name: &str, output_name: &str) -> Result<OpenPorts> {
        if input_name != PORT_NAME {
            return Err(anyhow!("No MIDI input named '{}'", input_name));
        }
        if output_name != PORT_NAME {
            return Err(anyhow!("No MIDI output named '{}'", output_name));
        }

        let (tx, rx) = mpsc::channel();
        let mut state = self.lock();
        state.input_tx = Some(tx);
        state.open_count += 1;

        Ok(OpenPorts {
            input: InputPort::new(rx, None),
            output: Box::new(SimulatedOutput {
                state: Arc::clone(&self.state),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(device: &SimulatedDevice) -> OpenPorts {
        device.open(PORT_NAME, PORT_NAME).unwrap()
    }

    #[test]
    fn test_answers_query_with_response_frame() {
        let device = SimulatedDevice::new().with_value(23, 9000);
        let mut ports = open(&device);

        ports.output.send(&sysex::encode_query(23, 0)).unwrap();

        let reply = ports.input.try_recv().unwrap().unwrap();
        let decoded = sysex::decode_response(&reply).unwrap();
        assert_eq!(decoded.parameter_id, 23);
        assert_eq!(decoded.value, 9000);
        assert!(decoded.is_response);
        assert_eq!(device.query_count(23), 1);
    }

    #[test]
    fn test_set_updates_stored_value() {
        let device = SimulatedDevice::new();
        let mut ports = open(&device);

        ports
            .output
            .send(&sysex::encode_set(37, 12, 0).unwrap())
            .unwrap();
        assert_eq!(device.value(37), Some(12));
        // Sets are never acknowledged
        assert_eq!(ports.input.try_recv(), Ok(None));
    }

    #[test]
    fn test_ignores_other_unit_ids() {
        let device = SimulatedDevice::new().with_unit_id(3);
        let mut ports = open(&device);

        ports.output.send(&sysex::encode_query(0, 0)).unwrap();
        assert_eq!(ports.input.try_recv(), Ok(None));

        ports.output.send(&sysex::encode_query(0, 3)).unwrap();
        assert!(ports.input.try_recv().unwrap().is_some());
    }

    #[test]
    fn test_answer_only_filters() {
        let device = SimulatedDevice::new().answer_only([10]);
        let mut ports = open(&device);

        ports.output.send(&sysex::encode_query(5, 0)).unwrap();
        assert_eq!(ports.input.try_recv(), Ok(None));

        ports.output.send(&sysex::encode_query(10, 0)).unwrap();
        assert!(ports.input.try_recv().unwrap().is_some());
    }

    #[test]
    fn test_open_rejects_unknown_names() {
        let device = SimulatedDevice::new();
        assert!(device.open("nope", PORT_NAME).is_err());
        assert!(device.open(PORT_NAME, "nope").is_err());
        assert_eq!(device.open_count(), 0);
    }

    #[test]
    fn test_write_failure_and_unplug() {
        let device = SimulatedDevice::new();
        let mut ports = open(&device);

        device.set_fail_writes(true);
        assert!(ports.output.send(&[0xB0, 1, 1]).is_err());
        device.set_fail_writes(false);
        assert!(ports.output.send(&[0xB0, 1, 1]).is_ok());

        assert!(device.inject(&[0xF8]));
        device.unplug();
        assert!(!device.inject(&[0xF8]));
        assert_eq!(ports.input.try_recv(), Ok(Some(vec![0xF8])));
        assert!(ports.input.try_recv().is_err());
    }
}
