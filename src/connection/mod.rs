// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Connection management.
//!
//! `ConnectionManager` owns one input/output port pair, a listener thread
//! decoding everything the instrument sends, and the table of queries waiting
//! for an answer. All methods take `&self`, so a manager can be shared between
//! threads behind an `Arc`.

pub mod events;
pub mod listener;
pub mod pending;
pub mod traffic;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::midi::{MidiMessage, MidiOutput, Transport};
use crate::params::{self, UNIT_ID_PARAMETER};
use crate::sysex;

pub use events::EventHandlers;
pub use listener::{Listener, ListenerState};
pub use pending::PendingQueries;
pub use traffic::{TrafficEntry, TrafficFilter, TrafficKind, TrafficLog};

use listener::ListenerContext;

/// Whether the manager currently has a usable link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Available port names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortList {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// Snapshot of the connection for status displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub connected: bool,
    pub input_port: Option<String>,
    pub output_port: Option<String>,
    pub unit_id: u8,
    /// 1-16
    pub midi_channel: u8,
    pub listening: bool,
}

/// Outcome of a bulk read or reset, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResults {
    values: Vec<(u8, Option<u16>)>,
}

impl QueryResults {
    fn push(&mut self, parameter_id: u8, value: Option<u16>) {
        self.values.push((parameter_id, value));
    }

    /// `Some(None)` for a parameter that was asked for but never answered
    pub fn get(&self, parameter_id: u8) -> Option<Option<u16>> {
        self.values
            .iter()
            .rev()
            .find(|(id, _)| *id == parameter_id)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Option<u16>)> + '_ {
        self.values.iter().copied()
    }

    /// Parameters with no value, for a "retry failed" pass
    pub fn failed_ids(&self) -> Vec<u8> {
        self.values
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Parameters that were answered
    pub fn succeeded(&self) -> HashMap<u8, u16> {
        self.values
            .iter()
            .filter_map(|(id, value)| value.map(|v| (*id, v)))
            .collect()
    }

    /// Fold a retry pass into these results
    pub fn merge(&mut self, retry: QueryResults) {
        for (id, value) in retry.values {
            match self.values.iter_mut().find(|(existing, _)| *existing == id) {
                Some(slot) => {
                    if value.is_some() {
                        slot.1 = value;
                    }
                }
                None => self.values.push((id, value)),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct Session {
    input_name: String,
    output_name: String,
    output: Box<dyn MidiOutput>,
    listener: Listener,
    link_alive: Arc<AtomicBool>,
}

impl Session {
    fn is_alive(&self) -> bool {
        self.link_alive.load(Ordering::SeqCst)
    }
}

/// Bidirectional SysEx link to one instrument
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    settings: Settings,
    unit_id: AtomicU8,
    channel: AtomicU8,
    session: Mutex<Option<Session>>,
    pending: Arc<PendingQueries>,
    cache: Arc<Mutex<HashMap<u8, u16>>>,
    events: Arc<EventHandlers>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>, settings: Settings) -> Self {
        let unit_id = AtomicU8::new(settings.midi.unit_id);
        let channel = AtomicU8::new(settings.midi.channel_index());
        Self {
            transport,
            settings,
            unit_id,
            channel,
            session: Mutex::new(None),
            pending: Arc::new(PendingQueries::new()),
            cache: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(EventHandlers::new()),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn unit_id(&self) -> u8 {
        self.unit_id.load(Ordering::SeqCst)
    }

    /// Channel index 0-15
    pub fn midi_channel(&self) -> u8 {
        self.channel.load(Ordering::SeqCst)
    }

    /// Enumerate ports. Failures are logged and yield empty lists.
    pub fn list_ports(&self) -> PortList {
        let inputs = self.transport.list_inputs().unwrap_or_else(|e| {
            error!("Error scanning MIDI input ports: {:#}", e);
            Vec::new()
        });
        let outputs = self.transport.list_outputs().unwrap_or_else(|e| {
            error!("Error scanning MIDI output ports: {:#}", e);
            Vec::new()
        });
        PortList { inputs, outputs }
    }

    /// Open both ports and start listening, replacing any current connection.
    pub fn connect(&self, input_name: &str, output_name: &str) -> bool {
        self.disconnect();

        let ports = match self.transport.open(input_name, output_name) {
            Ok(ports) => ports,
            Err(e) => {
                let err = Error::PortOpen {
                    port: format!("{} -> {}", input_name, output_name),
                    reason: format!("{:#}", e),
                };
                error!("{}", err);
                self.events.error(&format!("MIDI Connection Error: {}", err));
                return false;
            }
        };

        let link_alive = Arc::new(AtomicBool::new(true));
        let context = ListenerContext {
            pending: Arc::clone(&self.pending),
            cache: Arc::clone(&self.cache),
            events: Arc::clone(&self.events),
            link_alive: Arc::clone(&link_alive),
        };
        let listener = match Listener::spawn(
            ports.input,
            context,
            self.settings.listener.poll_interval(),
        ) {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to start MIDI listener: {}", e);
                self.events
                    .error(&format!("MIDI Connection Error: listener failed to start: {}", e));
                return false;
            }
        };

        let previous = self.lock_session().replace(Session {
            input_name: input_name.to_string(),
            output_name: output_name.to_string(),
            output: ports.output,
            listener,
            link_alive,
        });
        // Another thread connected between our disconnect and now
        if let Some(previous) = previous {
            self.shutdown(previous);
        }

        info!("Connected to MIDI ports: {} -> {}", input_name, output_name);
        true
    }

    /// Close the ports and stop the listener. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let session = self.lock_session().take();
        match session {
            Some(session) => {
                self.shutdown(session);
                info!("Disconnected from MIDI ports");
            }
            None => {
                self.pending.cancel_all();
            }
        }
    }

    fn shutdown(&self, session: Session) {
        let Session {
            output, listener, ..
        } = session;
        // Blocked queries must not wait for a listener stuck in a handler
        let mut cancelled = self.pending.cancel_all();
        listener.stop(self.settings.listener.join_timeout());
        drop(output);

        cancelled += self.pending.cancel_all();
        if cancelled > 0 {
            debug!("Cancelled {} pending queries", cancelled);
        }
    }

    pub fn state(&self) -> ConnectionState {
        match &*self.lock_session() {
            Some(session) if session.is_alive() => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    fn write(&self, message: &[u8]) -> Result<()> {
        let result = {
            let mut session = self.lock_session();
            match session.as_mut() {
                Some(session) if session.is_alive() => session.output.send(message),
                _ => return Err(Error::NotConnected),
            }
        };

        match result {
            Ok(()) => {
                if self.events.wants_traffic() {
                    self.events
                        .traffic(&format!("OUT: {}", describe(message)), false);
                }
                Ok(())
            }
            Err(e) => {
                error!("Error sending MIDI message: {:#}", e);
                self.events.error(&format!("MIDI Send Error: {:#}", e));
                Err(Error::PortWrite(format!("{:#}", e)))
            }
        }
    }

    /// Write raw bytes. Returns false when not connected or the write fails.
    pub fn send_raw(&self, message: &[u8]) -> bool {
        match self.write(message) {
            Ok(()) => true,
            Err(Error::NotConnected) => {
                warn!("Cannot send message: not connected");
                false
            }
            Err(_) => false,
        }
    }

    /// Validate, encode and send a SET. Fire-and-forget.
    pub fn try_set_parameter(&self, parameter_id: u8, value: i32) -> Result<()> {
        let def = params::get(parameter_id).ok_or(Error::UnknownParameter(parameter_id))?;
        let invalid = Error::Validation {
            parameter: parameter_id,
            value,
        };
        if !def.accepts(value) {
            return Err(invalid);
        }
        let value = u16::try_from(value).map_err(|_| invalid)?;

        let frame = sysex::encode_set(parameter_id, value, self.unit_id())?;
        self.write(&frame)?;

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(parameter_id, value);
        debug!("Set parameter {} = {}", parameter_id, value);
        Ok(())
    }

    pub fn set_parameter(&self, parameter_id: u8, value: i32) -> bool {
        match self.try_set_parameter(parameter_id, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Cannot set parameter {} to {}: {}", parameter_id, value, e);
                false
            }
        }
    }

    /// Send a Control Change on the configured channel
    pub fn send_cc(&self, controller: u8, value: u8) -> bool {
        if controller > 127 || value > 127 {
            warn!("Invalid CC parameters: CC{} = {}", controller, value);
            return false;
        }
        let message = MidiMessage::control_change(self.midi_channel(), controller, value);
        self.send_raw(&message)
    }

    /// Ask for one parameter and block for the answer.
    ///
    /// `timeout` defaults to the configured query timeout.
    pub fn try_query(&self, parameter_id: u8, timeout: Option<Duration>) -> Result<u16> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let timeout = timeout.unwrap_or_else(|| self.settings.query.timeout());

        // Register first so a fast reply cannot slip past us
        let ticket = self.pending.register(parameter_id);
        let frame = sysex::encode_query(parameter_id, self.unit_id());
        debug!(
            "Sending query for parameter {}: {}",
            parameter_id,
            sysex::format_for_log(&frame)
        );
        if let Err(e) = self.write(&frame) {
            self.pending.withdraw(ticket);
            return Err(e);
        }

        match self.pending.wait(ticket, timeout) {
            Some(value) => Ok(value),
            None if !self.is_connected() => Err(Error::NotConnected),
            None => Err(Error::QueryTimeout(parameter_id)),
        }
    }

    pub fn query_one(&self, parameter_id: u8, timeout: Option<Duration>) -> Option<u16> {
        match self.try_query(parameter_id, timeout) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Query for parameter {} failed: {}", parameter_id, e);
                None
            }
        }
    }

    /// Read parameters one after another with retries.
    ///
    /// The configured delay is slept before every query except the first of
    /// the batch. `progress(completed, total)` runs after each parameter.
    pub fn query_all<F>(&self, ids: &[u8], retry_count: u32, progress: F) -> QueryResults
    where
        F: FnMut(usize, usize),
    {
        self.query_all_with_delay(ids, retry_count, self.settings.query.delay(), progress)
    }

    /// [`query_all`](Self::query_all) with an explicit delay between queries
    pub fn query_all_with_delay<F>(
        &self,
        ids: &[u8],
        retry_count: u32,
        delay: Duration,
        mut progress: F,
    ) -> QueryResults
    where
        F: FnMut(usize, usize),
    {
        let attempts = retry_count.max(1);
        let total = ids.len();
        let mut results = QueryResults::default();
        let mut first_query = true;

        for (index, &parameter_id) in ids.iter().enumerate() {
            let mut value = None;

            for attempt in 1..=attempts {
                if !first_query && self.is_connected() {
                    thread::sleep(delay);
                }
                first_query = false;

                match self.try_query(parameter_id, None) {
                    Ok(v) => {
                        value = Some(v);
                        break;
                    }
                    Err(Error::NotConnected) => {
                        warn!("Not connected; skipping parameter {}", parameter_id);
                        break;
                    }
                    Err(e) => {
                        warn!(
                            "Query attempt {} failed for parameter {}: {}",
                            attempt, parameter_id, e
                        );
                    }
                }
            }

            if value.is_none() {
                warn!(
                    "Failed to query parameter {} after {} attempts",
                    parameter_id, attempts
                );
            }
            results.push(parameter_id, value);
            progress(index + 1, total);
        }

        results
    }

    /// Write every factory default, in id order.
    ///
    /// Each accepted write is reported through the parameter update handler.
    /// Rejected or failed writes come back as `None` in the results.
    pub fn reset_to_defaults(&self) -> QueryResults {
        let mut results = QueryResults::default();
        for (parameter_id, default) in params::defaults() {
            if self.set_parameter(parameter_id, i32::from(default)) {
                self.events.parameter_update(parameter_id, default);
                results.push(parameter_id, Some(default));
            } else {
                results.push(parameter_id, None);
            }
        }
        info!(
            "Reset {} parameters to defaults, {} failed",
            results.len(),
            results.failed_ids().len()
        );
        results
    }

    /// Query the unit id parameter as a liveness probe
    pub fn test_connection(&self) -> bool {
        if !self.is_connected() {
            return false;
        }
        self.query_one(UNIT_ID_PARAMETER, None).is_some()
    }

    /// Called for every decoded parameter response
    pub fn on_parameter_update<F>(&self, handler: F)
    where
        F: Fn(u8, u16) + Send + Sync + 'static,
    {
        self.events.set_parameter_handler(Some(Arc::new(handler)));
    }

    /// Called when a port fails to open, a write fails or the input vanishes
    pub fn on_error<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.events.set_error_handler(Some(Arc::new(handler)));
    }

    /// Called with every formatted message sent or received
    pub fn on_raw_traffic<F>(&self, handler: F)
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        self.events.set_traffic_handler(Some(Arc::new(handler)));
    }

    /// Record traffic into `log`
    pub fn record_traffic(&self, log: Arc<TrafficLog>) {
        self.events.set_traffic_log(Some(log));
    }

    /// Drop every registered handler and traffic log
    pub fn clear_handlers(&self) {
        self.events.set_parameter_handler(None);
        self.events.set_error_handler(None);
        self.events.set_traffic_handler(None);
        self.events.set_traffic_log(None);
    }

    /// Change addressing. `midi_channel` is an index 0-15.
    pub fn update_settings(&self, unit_id: Option<u8>, midi_channel: Option<u8>) -> Result<()> {
        if let Some(unit_id) = unit_id {
            if unit_id > 15 {
                return Err(Error::Config(format!("unit_id must be 0-15, got {}", unit_id)));
            }
        }
        if let Some(channel) = midi_channel {
            if channel > 15 {
                return Err(Error::Config(format!(
                    "MIDI channel index must be 0-15, got {}",
                    channel
                )));
            }
        }

        if let Some(unit_id) = unit_id {
            self.unit_id.store(unit_id, Ordering::SeqCst);
        }
        if let Some(channel) = midi_channel {
            self.channel.store(channel, Ordering::SeqCst);
        }
        Ok(())
    }

    pub fn connection_info(&self) -> ConnectionInfo {
        let session = self.lock_session();
        let session = session.as_ref();
        ConnectionInfo {
            connected: session.is_some_and(Session::is_alive),
            input_port: session.map(|s| s.input_name.clone()),
            output_port: session.map(|s| s.output_name.clone()),
            unit_id: self.unit_id(),
            midi_channel: self.midi_channel() + 1,
            listening: session.is_some_and(|s| s.listener.is_running()),
        }
    }

    /// Last value seen for a parameter, from a response or a successful set
    pub fn cached_value(&self, parameter_id: u8) -> Option<u16> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&parameter_id)
            .copied()
    }

    pub fn cached_values(&self) -> HashMap<u8, u16> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of queries still waiting for an answer
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn describe(message: &[u8]) -> String {
    match MidiMessage::parse(message) {
        Some(parsed) => parsed.to_string(),
        None => "(empty)".to_string(),
    }
}
