// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI I/O abstraction layer.
//!
//! This module provides a trait-based abstraction over MIDI ports so the
//! connection manager can run against real hardware (midir) or the
//! in-process simulated instrument interchangeably.

pub mod message;
pub mod midir_backend;
pub mod simulated;

use std::any::Any;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use anyhow::Result;

pub use message::MidiMessage;
pub use midir_backend::MidirTransport;
pub use simulated::SimulatedDevice;

/// Trait for MIDI output implementations.
pub trait MidiOutput: Send {
    /// Send a complete MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes, SysEx delimiters included
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if the message could not be sent
    fn send(&mut self, message: &[u8]) -> Result<()>;
}

/// Port enumeration and opening.
///
/// Implementations must be shareable between the caller and the listener.
pub trait Transport: Send + Sync {
    /// Names of available input ports
    fn list_inputs(&self) -> Result<Vec<String>>;

    /// Names of available output ports
    fn list_outputs(&self) -> Result<Vec<String>>;

    /// Open the named input and output ports.
    fn open(&self, input_name: &str, output_name: &str) -> Result<OpenPorts>;
}

/// A freshly opened input/output pair
pub struct OpenPorts {
    pub input: InputPort,
    pub output: Box<dyn MidiOutput>,
}

/// Why an input read produced nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClosed {
    /// The backend dropped its end of the stream
    Disconnected,
}

/// Receiving end of an open input port.
///
/// Messages arrive on a channel fed by the backend's callback. Dropping the
/// port closes the backend connection.
pub struct InputPort {
    receiver: Receiver<Vec<u8>>,
    _connection: Option<Box<dyn Any + Send>>,
}

impl InputPort {
    /// Wrap a receiver, keeping `connection` alive for as long as the port.
    pub fn new(receiver: Receiver<Vec<u8>>, connection: Option<Box<dyn Any + Send>>) -> Self {
        Self {
            receiver,
            _connection: connection,
        }
    }

    /// Try to receive the next message (non-blocking)
    pub fn try_recv(&self) -> std::result::Result<Option<Vec<u8>>, InputClosed> {
        match self.receiver.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(InputClosed::Disconnected),
        }
    }

    /// Wait up to `timeout` for the next message
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<Option<Vec<u8>>, InputClosed> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(InputClosed::Disconnected),
        }
    }
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;

    // System Real-Time Messages
    pub const TIMING_CLOCK: u8 = 0xF8;
    pub const START: u8 = 0xFA;
    pub const CONTINUE: u8 = 0xFB;
    pub const STOP: u8 = 0xFC;

    // System Common Messages
    pub const SYSEX_START: u8 = 0xF0;
    pub const SYSEX_END: u8 = 0xF7;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::connection::ConnectionManager;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    /// Output that records writes, behind a transport whose input stays open
    #[derive(Default)]
    struct RecordingTransport {
        written: Arc<Mutex<Vec<Vec<u8>>>>,
        input_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    }

    struct RecordingOutput {
        written: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl MidiOutput for RecordingOutput {
        fn send(&mut self, message: &[u8]) -> Result<()> {
            self.written.lock().unwrap().push(message.to_vec());
            Ok(())
        }
    }

    impl Transport for RecordingTransport {
        fn list_inputs(&self) -> Result<Vec<String>> {
            Ok(vec!["rec".to_string()])
        }

        fn list_outputs(&self) -> Result<Vec<String>> {
            Ok(vec!["rec".to_string()])
        }

        fn open(&self, _input_name: &str, _output_name: &str) -> Result<OpenPorts> {
            let (tx, rx) = mpsc::channel();
            *self.input_tx.lock().unwrap() = Some(tx);
            Ok(OpenPorts {
                input: InputPort::new(rx, None),
                output: Box::new(RecordingOutput {
                    written: Arc::clone(&self.written),
                }),
            })
        }
    }

    #[test]
    fn test_manager_writes_through_custom_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let written = Arc::clone(&transport.written);
        let manager = ConnectionManager::new(transport, Settings::default());
        assert!(manager.connect("rec", "rec"));

        assert!(manager.send_cc(7, 100));
        assert!(manager.set_parameter(37, 5));
        manager.disconnect();
        assert!(!manager.send_cc(7, 0));

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0], vec![messages::CONTROL_CHANGE, 7, 100]);
        assert_eq!(written[1], crate::sysex::encode_set(37, 5, 0).unwrap());
    }

    #[test]
    fn test_input_port_receives_in_order() {
        let (tx, rx) = mpsc::channel();
        let port = InputPort::new(rx, None);

        assert_eq!(port.try_recv(), Ok(None));

        tx.send(vec![0xF8]).unwrap();
        tx.send(vec![0xFA]).unwrap();
        assert_eq!(port.try_recv(), Ok(Some(vec![0xF8])));
        assert_eq!(
            port.recv_timeout(Duration::from_millis(10)),
            Ok(Some(vec![0xFA]))
        );
        assert_eq!(port.recv_timeout(Duration::from_millis(1)), Ok(None));
    }

    #[test]
    fn test_input_port_reports_disconnect() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let port = InputPort::new(rx, None);
        drop(tx);

        assert_eq!(port.try_recv(), Err(InputClosed::Disconnected));
        assert_eq!(
            port.recv_timeout(Duration::from_millis(1)),
            Err(InputClosed::Disconnected)
        );
    }
}
