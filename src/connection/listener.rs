// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Background thread draining the input port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, trace, warn};

use super::events::EventHandlers;
use super::pending::PendingQueries;
use crate::midi::{InputClosed, InputPort, MidiMessage};
use crate::sysex;

const RUNNING: u8 = 0;
const STOP_REQUESTED: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of the listener thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Running,
    StopRequested,
    Stopped,
}

impl ListenerState {
    fn from_u8(value: u8) -> Self {
        match value {
            RUNNING => ListenerState::Running,
            STOP_REQUESTED => ListenerState::StopRequested,
            _ => ListenerState::Stopped,
        }
    }
}

/// State the listener shares with the manager
#[derive(Clone)]
pub struct ListenerContext {
    pub pending: Arc<PendingQueries>,
    pub cache: Arc<Mutex<HashMap<u8, u16>>>,
    pub events: Arc<EventHandlers>,
    /// Cleared when the input disappears underneath us
    pub link_alive: Arc<AtomicBool>,
}

impl ListenerContext {
    fn handle(&self, bytes: &[u8]) {
        let Some(message) = MidiMessage::parse(bytes) else {
            return;
        };

        if self.events.wants_traffic() {
            self.events.traffic(&format!("IN:  {}", message), true);
        }

        match message {
            MidiMessage::SysEx(frame) => self.handle_sysex(&frame),
            MidiMessage::ControlChange {
                channel,
                controller,
                value,
            } => {
                debug!("CC{} = {} on channel {}", controller, value, channel + 1);
            }
            other => trace!("Ignoring {}", other),
        }
    }

    fn handle_sysex(&self, frame: &[u8]) {
        if !sysex::is_recognized(frame) {
            debug!("Ignoring foreign SysEx ({} bytes)", frame.len());
            return;
        }

        let response = match sysex::decode_response(frame) {
            Ok(response) => response,
            Err(e) => {
                warn!("Dropping SysEx frame: {}", e);
                return;
            }
        };

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(response.parameter_id, response.value);

        let awaited = self.pending.resolve(response.parameter_id, response.value);
        debug!(
            "Parameter update: {} = {} (unit {}, awaited: {})",
            response.parameter_id, response.value, response.unit_id, awaited
        );

        self.events
            .parameter_update(response.parameter_id, response.value);
    }

    fn input_lost(&self) {
        error!("MIDI input closed unexpectedly");
        self.link_alive.store(false, Ordering::SeqCst);
        let cancelled = self.pending.cancel_all();
        if cancelled > 0 {
            debug!("Cancelled {} pending queries", cancelled);
        }
        self.events.error("MIDI input disconnected");
    }
}

/// Handle to a running listener thread
pub struct Listener {
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl Listener {
    /// Start draining `input` on a new thread.
    ///
    /// `poll_interval` bounds how long the thread waits on the port before
    /// checking whether it was asked to stop.
    pub fn spawn(
        input: InputPort,
        context: ListenerContext,
        poll_interval: Duration,
    ) -> std::io::Result<Self> {
        let state = Arc::new(AtomicU8::new(RUNNING));
        let thread_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name("midi-listener".to_string())
            .spawn(move || {
                debug!("MIDI listen thread started");
                run(&input, &context, &thread_state, poll_interval);
                thread_state.store(STOPPED, Ordering::SeqCst);
                debug!("MIDI listen thread stopped");
            })?;

        Ok(Self {
            state,
            handle: Some(handle),
        })
    }

    pub fn state(&self) -> ListenerState {
        ListenerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == ListenerState::Running
    }

    fn request_stop(&self) {
        let _ = self.state.compare_exchange(
            RUNNING,
            STOP_REQUESTED,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Ask the thread to exit and wait up to `timeout` for it.
    ///
    /// Returns false if the thread was still running at the deadline; it is
    /// then left to finish on its own.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.request_stop();

        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!("MIDI listen thread did not stop within {:?}", timeout);
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }

        if handle.join().is_err() {
            error!("MIDI listen thread panicked");
        }
        true
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.request_stop();
    }
}

fn run(input: &InputPort, context: &ListenerContext, state: &AtomicU8, poll_interval: Duration) {
    while state.load(Ordering::SeqCst) == RUNNING {
        match input.recv_timeout(poll_interval) {
            Ok(Some(bytes)) => context.handle(&bytes),
            Ok(None) => {}
            Err(InputClosed::Disconnected) => {
                if state.load(Ordering::SeqCst) == RUNNING {
                    context.input_lost();
                }
                break;
            }
        }
    }
}
