// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Bounded history of raw MIDI traffic.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default number of lines kept
pub const DEFAULT_CAPACITY: usize = 1000;

/// Coarse message class used for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficKind {
    SysEx,
    ControlChange,
    Other,
}

impl TrafficKind {
    /// Classify a formatted traffic line
    pub fn classify(text: &str) -> Self {
        if text.contains("SysEx:") {
            TrafficKind::SysEx
        } else if text.contains("control_change") {
            TrafficKind::ControlChange
        } else {
            TrafficKind::Other
        }
    }
}

/// A recorded traffic line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficEntry {
    /// Time since the log was created
    pub elapsed: Duration,
    pub text: String,
    pub is_incoming: bool,
    pub kind: TrafficKind,
}

impl TrafficEntry {
    /// `[seconds.millis] text`
    pub fn format(&self) -> String {
        format!(
            "[{:>4}.{:03}] {}",
            self.elapsed.as_secs(),
            self.elapsed.subsec_millis(),
            self.text
        )
    }
}

/// Which entries a view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficFilter {
    pub incoming: bool,
    pub outgoing: bool,
    pub sysex: bool,
    pub control_change: bool,
}

impl Default for TrafficFilter {
    fn default() -> Self {
        Self {
            incoming: true,
            outgoing: true,
            sysex: true,
            control_change: true,
        }
    }
}

impl TrafficFilter {
    pub fn matches(&self, entry: &TrafficEntry) -> bool {
        let direction = if entry.is_incoming {
            self.incoming
        } else {
            self.outgoing
        };
        let kind = match entry.kind {
            TrafficKind::SysEx => self.sysex,
            TrafficKind::ControlChange => self.control_change,
            TrafficKind::Other => true,
        };
        direction && kind
    }
}

struct Inner {
    entries: VecDeque<TrafficEntry>,
    capacity: usize,
}

/// Thread-safe ring of the most recent traffic lines
pub struct TrafficLog {
    inner: Mutex<Inner>,
    started: Instant,
}

impl TrafficLog {
    /// Create with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity),
                capacity,
            }),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line, evicting the oldest when full
    pub fn record(&self, text: &str, is_incoming: bool) {
        let entry = TrafficEntry {
            elapsed: self.started.elapsed(),
            text: text.to_string(),
            is_incoming,
            kind: TrafficKind::classify(text),
        };

        let mut inner = self.lock();
        while inner.entries.len() >= inner.capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry);
    }

    /// Change the capacity, dropping the oldest entries if needed
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.lock();
        inner.capacity = capacity.max(1);
        while inner.entries.len() > inner.capacity {
            inner.entries.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Entries passing `filter`, oldest first
    pub fn entries(&self, filter: &TrafficFilter) -> Vec<TrafficEntry> {
        self.lock()
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect()
    }

    /// Formatted lines passing `filter`
    pub fn lines(&self, filter: &TrafficFilter) -> Vec<String> {
        self.entries(filter).iter().map(TrafficEntry::format).collect()
    }
}

impl Default for TrafficLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSEX_IN: &str = "IN:  SysEx: F0 04 17 23 17 40 00 00 00 00 00 00 00 00 01 00 F7";
    const CC_OUT: &str = "OUT: control_change channel=0 control=1 value=64";
    const CLOCK_IN: &str = "IN:  clock";

    #[test]
    fn test_classify() {
        assert_eq!(TrafficKind::classify(SYSEX_IN), TrafficKind::SysEx);
        assert_eq!(TrafficKind::classify(CC_OUT), TrafficKind::ControlChange);
        assert_eq!(TrafficKind::classify(CLOCK_IN), TrafficKind::Other);
    }

    #[test]
    fn test_bounded() {
        let log = TrafficLog::with_capacity(3);
        for i in 0..5 {
            log.record(&format!("IN:  line {}", i), true);
        }
        assert_eq!(log.len(), 3);

        let texts: Vec<String> = log
            .entries(&TrafficFilter::default())
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["IN:  line 2", "IN:  line 3", "IN:  line 4"]);

        log.set_capacity(1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.capacity(), 1);
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(TrafficLog::new().capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_filters() {
        let log = TrafficLog::new();
        log.record(SYSEX_IN, true);
        log.record(CC_OUT, false);
        log.record(CLOCK_IN, true);

        let only_incoming = TrafficFilter {
            outgoing: false,
            ..TrafficFilter::default()
        };
        assert_eq!(log.entries(&only_incoming).len(), 2);

        let no_sysex = TrafficFilter {
            sysex: false,
            ..TrafficFilter::default()
        };
        let entries = log.entries(&no_sysex);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind != TrafficKind::SysEx));

        let no_cc = TrafficFilter {
            control_change: false,
            ..TrafficFilter::default()
        };
        assert_eq!(log.entries(&no_cc).len(), 2);
    }

    #[test]
    fn test_format_line() {
        let entry = TrafficEntry {
            elapsed: Duration::from_millis(12_345),
            text: CLOCK_IN.to_string(),
            is_incoming: true,
            kind: TrafficKind::Other,
        };
        assert_eq!(entry.format(), "[  12.345] IN:  clock");
    }

    #[test]
    fn test_clear() {
        let log = TrafficLog::new();
        log.record(CC_OUT, false);
        log.clear();
        assert!(log.is_empty());
        assert!(log.lines(&TrafficFilter::default()).is_empty());
    }
}
