// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Outstanding parameter queries.
//!
//! Each query registers a one-shot waiter keyed by parameter id before the
//! request goes out. The listener resolves the waiter when the matching
//! response arrives; the caller blocks on it with a deadline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

struct Waiter {
    ticket: u64,
    issued_at: Instant,
    sender: SyncSender<u16>,
}

/// Handle held by the caller of a registered query
#[derive(Debug)]
pub struct Ticket {
    parameter_id: u8,
    ticket: u64,
    receiver: Receiver<u16>,
}

impl Ticket {
    pub fn parameter_id(&self) -> u8 {
        self.parameter_id
    }
}

/// Table of queries awaiting a response
#[derive(Default)]
pub struct PendingQueries {
    waiters: Mutex<HashMap<u8, Waiter>>,
    next_ticket: AtomicU64,
}

impl PendingQueries {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u8, Waiter>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a waiter for `parameter_id`.
    ///
    /// An older waiter for the same id is dropped and its caller sees no value.
    pub fn register(&self, parameter_id: u8) -> Ticket {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::sync_channel(1);

        let replaced = self.lock().insert(
            parameter_id,
            Waiter {
                ticket,
                issued_at: Instant::now(),
                sender,
            },
        );
        if replaced.is_some() {
            debug!("Replaced pending query for parameter {}", parameter_id);
        }

        Ticket {
            parameter_id,
            ticket,
            receiver,
        }
    }

    /// Deliver a response. Returns false if nobody was waiting for it.
    pub fn resolve(&self, parameter_id: u8, value: u16) -> bool {
        let waiter = self.lock().remove(&parameter_id);
        match waiter {
            Some(waiter) => {
                debug!(
                    "Parameter {} answered after {:?}",
                    parameter_id,
                    waiter.issued_at.elapsed()
                );
                // Capacity is one and each waiter is resolved at most once
                waiter.sender.try_send(value).is_ok()
            }
            None => false,
        }
    }

    /// Block until the ticket resolves or `timeout` elapses.
    ///
    /// The entry is gone from the table when this returns.
    pub fn wait(&self, ticket: Ticket, timeout: Duration) -> Option<u16> {
        match ticket.receiver.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Disconnected) => None,
            Err(RecvTimeoutError::Timeout) => {
                if self.remove_own(&ticket) {
                    None
                } else {
                    // The listener took the entry between our deadline and the lock
                    ticket.receiver.try_recv().ok()
                }
            }
        }
    }

    /// Drop a ticket that will never be waited on (the request failed to send)
    pub fn withdraw(&self, ticket: Ticket) {
        self.remove_own(&ticket);
    }

    fn remove_own(&self, ticket: &Ticket) -> bool {
        let mut waiters = self.lock();
        let owned = waiters
            .get(&ticket.parameter_id)
            .is_some_and(|w| w.ticket == ticket.ticket);
        if owned {
            waiters.remove(&ticket.parameter_id);
        }
        owned
    }

    /// Cancel every outstanding query; blocked callers return immediately.
    pub fn cancel_all(&self) -> usize {
        let mut waiters = self.lock();
        let count = waiters.len();
        waiters.clear();
        count
    }

    pub fn contains(&self, parameter_id: u8) -> bool {
        self.lock().contains_key(&parameter_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
