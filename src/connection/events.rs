// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Subscriber slots for connection events.
//!
//! Each slot holds at most one handler; registering again replaces it.
//! Handlers are cloned out of their slot before being called so no lock is
//! held while user code runs.

use std::sync::{Arc, Mutex, PoisonError};

use super::traffic::TrafficLog;

pub type ParameterHandler = Arc<dyn Fn(u8, u16) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&str) + Send + Sync>;
pub type TrafficHandler = Arc<dyn Fn(&str, bool) + Send + Sync>;

struct Slot<T: ?Sized>(Mutex<Option<Arc<T>>>);

impl<T: ?Sized> Slot<T> {
    fn new() -> Self {
        Self(Mutex::new(None))
    }

    fn set(&self, handler: Option<Arc<T>>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    fn get(&self) -> Option<Arc<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Registered handlers, shared between the manager and its listener
pub struct EventHandlers {
    parameter: Slot<dyn Fn(u8, u16) + Send + Sync>,
    error: Slot<dyn Fn(&str) + Send + Sync>,
    traffic: Slot<dyn Fn(&str, bool) + Send + Sync>,
    log: Slot<TrafficLog>,
}

impl Default for EventHandlers {
    fn default() -> Self {
        Self {
            parameter: Slot::new(),
            error: Slot::new(),
            traffic: Slot::new(),
            log: Slot::new(),
        }
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parameter_handler(&self, handler: Option<ParameterHandler>) {
        self.parameter.set(handler);
    }

    pub fn set_error_handler(&self, handler: Option<ErrorHandler>) {
        self.error.set(handler);
    }

    pub fn set_traffic_handler(&self, handler: Option<TrafficHandler>) {
        self.traffic.set(handler);
    }

    pub fn set_traffic_log(&self, log: Option<Arc<TrafficLog>>) {
        self.log.set(log);
    }

    pub fn parameter_update(&self, parameter_id: u8, value: u16) {
        if let Some(handler) = self.parameter.get() {
            handler(parameter_id, value);
        }
    }

    pub fn error(&self, message: &str) {
        if let Some(handler) = self.error.get() {
            handler(message);
        }
    }

    /// Report one line of raw traffic
    pub fn traffic(&self, text: &str, is_incoming: bool) {
        if let Some(log) = self.log.get() {
            log.record(text, is_incoming);
        }
        if let Some(handler) = self.traffic.get() {
            handler(text, is_incoming);
        }
    }

    /// Whether anyone consumes traffic lines, so formatting can be skipped
    pub fn wants_traffic(&self) -> bool {
        self.traffic.get().is_some() || self.log.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slots_are_noops() {
        let events = EventHandlers::new();
        events.parameter_update(1, 2);
        events.error("nothing listens");
        events.traffic("OUT: x", false);
        assert!(!events.wants_traffic());
    }

    #[test]
    fn test_register_replaces_handler() {
        let events = EventHandlers::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        events.set_parameter_handler(Some(Arc::new(move |id: u8, value: u16| {
            first.lock().unwrap().push(("first", id, value));
        })));
        events.parameter_update(1, 10);

        let second = Arc::clone(&seen);
        events.set_parameter_handler(Some(Arc::new(move |id: u8, value: u16| {
            second.lock().unwrap().push(("second", id, value));
        })));
        events.parameter_update(2, 20);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 1, 10), ("second", 2, 20)]
        );
    }

    #[test]
    fn test_handler_may_reenter() {
        let events = Arc::new(EventHandlers::new());
        let inner = Arc::clone(&events);
        events.set_error_handler(Some(Arc::new(move |_: &str| {
            // Replacing a slot from inside a handler must not deadlock
            inner.set_error_handler(None);
        })));
        events.error("boom");
        events.error("ignored");
    }

    #[test]
    fn test_traffic_goes_to_log_and_handler() {
        let events = EventHandlers::new();
        let log = Arc::new(TrafficLog::new());
        let lines = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&lines);
        events.set_traffic_handler(Some(Arc::new(move |text: &str, incoming: bool| {
            sink.lock().unwrap().push((text.to_string(), incoming));
        })));
        events.set_traffic_log(Some(Arc::clone(&log)));
        assert!(events.wants_traffic());

        events.traffic("IN:  SysEx: F0 F7", true);
        assert_eq!(log.len(), 1);
        assert_eq!(
            *lines.lock().unwrap(),
            vec![("IN:  SysEx: F0 F7".to_string(), true)]
        );
    }
}
