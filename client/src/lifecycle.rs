// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single open/authenticate slot of a connection.

use alloc::sync::Arc;
use core::fmt;
use std::sync::Mutex;

use crate::config::Credentials;
use crate::engine::{ResultHandler, StreamEngine};
use crate::{lock, Error};

/// The operations that occupy the lifecycle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleKind {
    /// Opening the stream.
    Open,
    /// Authenticating on the stream.
    Authenticate,
}

impl fmt::Display for LifecycleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LifecycleKind::Open => "open",
            LifecycleKind::Authenticate => "authenticate",
        })
    }
}

/// Where a connection is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No stream.
    #[default]
    Closed,
    /// Open requested, not completed yet.
    Opening,
    /// Stream is open, not authenticated.
    Open,
    /// Authentication requested, not completed yet.
    Authenticating,
    /// Stream is open and authenticated.
    Authenticated,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Closed => "closed",
            ConnectionState::Opening => "opening",
            ConnectionState::Open => "open",
            ConnectionState::Authenticating => "authenticating",
            ConnectionState::Authenticated => "authenticated",
        })
    }
}

impl LifecycleKind {
    fn pending_state(self) -> ConnectionState {
        match self {
            LifecycleKind::Open => ConnectionState::Opening,
            LifecycleKind::Authenticate => ConnectionState::Authenticating,
        }
    }

    fn settled_state(self, success: bool) -> ConnectionState {
        match (self, success) {
            (LifecycleKind::Open, true) => ConnectionState::Open,
            (LifecycleKind::Open, false) => ConnectionState::Closed,
            (LifecycleKind::Authenticate, true) => ConnectionState::Authenticated,
            // A failed SASL exchange leaves the stream itself open.
            (LifecycleKind::Authenticate, false) => ConnectionState::Open,
        }
    }
}

/// Generation number of an armed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OperationId(u64);

struct InFlight {
    kind: LifecycleKind,
    op: OperationId,
    on_complete: ResultHandler,
}

#[derive(Default)]
struct Slot {
    in_flight: Option<InFlight>,
    next_op: u64,
    state: ConnectionState,
}

/// Holds at most one outstanding open or authenticate operation.
///
/// A completion clears the slot before its continuation runs, so the
/// continuation may immediately start the next operation. Completions
/// belonging to an operation that was abandoned are ignored.
#[derive(Default)]
pub struct Lifecycle {
    slot: Mutex<Slot>,
}

impl Lifecycle {
    /// Create an idle slot for a closed connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation currently waiting for its completion.
    pub fn in_flight(&self) -> Option<LifecycleKind> {
        lock(&self.slot).in_flight.as_ref().map(|op| op.kind)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        lock(&self.slot).state
    }

    /// Ask `engine` to open the stream; `on_complete` receives the outcome.
    pub fn open<E, F>(self: &Arc<Self>, engine: &E, on_complete: F) -> Result<(), Error>
    where
        E: StreamEngine + ?Sized,
        F: FnOnce(bool) + Send + 'static,
    {
        self.start(LifecycleKind::Open, Box::new(on_complete), |on_result| {
            engine.open(on_result)
        })
    }

    /// Open the stream and wait for the outcome.
    pub fn open_and_block<E: StreamEngine + ?Sized>(&self, engine: &E) -> Result<bool, Error> {
        self.block(LifecycleKind::Open, || engine.open_blocking())
    }

    /// Ask `engine` to authenticate; `on_complete` receives the outcome.
    pub fn authenticate<E, F>(
        self: &Arc<Self>,
        engine: &E,
        credentials: &Credentials,
        on_complete: F,
    ) -> Result<(), Error>
    where
        E: StreamEngine + ?Sized,
        F: FnOnce(bool) + Send + 'static,
    {
        self.start(
            LifecycleKind::Authenticate,
            Box::new(on_complete),
            |on_result| engine.authenticate(credentials, on_result),
        )
    }

    /// Authenticate and wait for the outcome.
    pub fn authenticate_and_block<E: StreamEngine + ?Sized>(
        &self,
        engine: &E,
        credentials: &Credentials,
    ) -> Result<bool, Error> {
        self.block(LifecycleKind::Authenticate, || {
            engine.authenticate_blocking(credentials)
        })
    }

    /// Close the stream. The slot is left as it is.
    pub fn close<E: StreamEngine + ?Sized>(&self, engine: &E) -> Result<(), Error> {
        engine.close()?;
        lock(&self.slot).state = ConnectionState::Closed;
        log::debug!("connection closed");
        Ok(())
    }

    /// Free the slot without invoking its continuation, and mark the
    /// connection closed.
    pub fn abandon(&self) -> Option<LifecycleKind> {
        let abandoned = {
            let mut slot = lock(&self.slot);
            slot.state = ConnectionState::Closed;
            slot.in_flight.take()
        };
        let kind = abandoned.as_ref().map(|op| op.kind);
        if let Some(op) = abandoned {
            log::warn!(
                "{} request {} abandoned, its continuation will not run",
                op.kind,
                op.op.0
            );
        }
        kind
    }

    /// Returns the new operation with the state it replaced, both taken
    /// under the same lock.
    fn arm(
        &self,
        kind: LifecycleKind,
        on_complete: ResultHandler,
    ) -> Result<(OperationId, ConnectionState), Error> {
        let mut slot = lock(&self.slot);
        if let Some(outstanding) = &slot.in_flight {
            log::warn!(
                "rejecting {} request: {} request {} still in progress",
                kind,
                outstanding.kind,
                outstanding.op.0
            );
            return Err(Error::OperationInFlight(outstanding.kind));
        }
        slot.next_op += 1;
        let op = OperationId(slot.next_op);
        slot.in_flight = Some(InFlight {
            kind,
            op,
            on_complete,
        });
        let previous = core::mem::replace(&mut slot.state, kind.pending_state());
        log::debug!("{} request {} started", kind, op.0);
        Ok((op, previous))
    }

    fn start<S>(
        self: &Arc<Self>,
        kind: LifecycleKind,
        on_complete: ResultHandler,
        submit: S,
    ) -> Result<(), Error>
    where
        S: FnOnce(ResultHandler) -> Result<(), Error>,
    {
        let (op, previous) = self.arm(kind, on_complete)?;
        let weak = Arc::downgrade(self);
        let on_result: ResultHandler = Box::new(move |success| {
            if let Some(lifecycle) = weak.upgrade() {
                lifecycle.complete(op, success);
            }
        });
        if let Err(e) = submit(on_result) {
            log::debug!("{} request {} refused by the engine: {}", kind, op.0, e);
            self.disarm(op, previous);
            return Err(e);
        }
        Ok(())
    }

    fn disarm(&self, op: OperationId, previous: ConnectionState) {
        let mut slot = lock(&self.slot);
        if slot.in_flight.as_ref().map(|armed| armed.op) == Some(op) {
            slot.in_flight = None;
            slot.state = previous;
        }
    }

    fn complete(&self, op: OperationId, success: bool) {
        let finished = {
            let mut slot = lock(&self.slot);
            match slot.in_flight.take() {
                Some(armed) if armed.op == op => {
                    slot.state = armed.kind.settled_state(success);
                    Some(armed)
                }
                other => {
                    slot.in_flight = other;
                    None
                }
            }
        };
        match finished {
            Some(armed) => {
                log::debug!(
                    "{} request {} completed: {}",
                    armed.kind,
                    op.0,
                    if success { "success" } else { "failure" }
                );
                (armed.on_complete)(success);
            }
            None => log::trace!("ignoring completion of stale request {}", op.0),
        }
    }

    fn block<B>(&self, kind: LifecycleKind, call: B) -> Result<bool, Error>
    where
        B: FnOnce() -> Result<bool, Error>,
    {
        let previous = {
            let mut slot = lock(&self.slot);
            if let Some(outstanding) = &slot.in_flight {
                log::warn!(
                    "rejecting blocking {} request: {} request {} still in progress",
                    kind,
                    outstanding.kind,
                    outstanding.op.0
                );
                return Err(Error::OperationInFlight(outstanding.kind));
            }
            let previous = slot.state;
            slot.state = kind.pending_state();
            previous
        };
        let result = call();
        {
            let mut slot = lock(&self.slot);
            if let Some(armed) = &slot.in_flight {
                log::debug!(
                    "blocking {} request finished while {} request {} is armed, keeping its state",
                    kind,
                    armed.kind,
                    armed.op.0
                );
            } else {
                slot.state = match result {
                    Ok(success) => kind.settled_state(success),
                    Err(_) => previous,
                };
            }
        }
        log::debug!("blocking {} request finished: {:?}", kind, result.as_ref().ok());
        result
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce(bool) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn open_completes_once() {
        let engine = MockEngine::new();
        let lifecycle = Arc::new(Lifecycle::new());
        let (count, on_complete) = counter();
        lifecycle.open(&engine, on_complete).unwrap();
        assert_eq!(lifecycle.in_flight(), Some(LifecycleKind::Open));
        assert_eq!(lifecycle.state(), ConnectionState::Opening);

        assert!(engine.complete_open(true));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.in_flight(), None);
        assert_eq!(lifecycle.state(), ConnectionState::Open);
    }

    #[test]
    fn second_request_is_rejected() {
        let engine = MockEngine::new();
        let lifecycle = Arc::new(Lifecycle::new());
        let (first, on_complete) = counter();
        lifecycle.open(&engine, on_complete).unwrap();

        let (second, on_complete) = counter();
        let credentials = Credentials::new("juliet", "r0m30", "balcony");
        match lifecycle.authenticate(&engine, &credentials, on_complete) {
            Err(Error::OperationInFlight(LifecycleKind::Open)) => (),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            lifecycle.open_and_block(&engine),
            Err(Error::OperationInFlight(LifecycleKind::Open))
        ));

        assert!(engine.complete_open(true));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refused_request_frees_slot() {
        let engine = MockEngine::new();
        let lifecycle = Arc::new(Lifecycle::new());
        engine.refuse_next();
        let (count, on_complete) = counter();
        assert!(matches!(
            lifecycle.open(&engine, on_complete),
            Err(Error::Engine(_))
        ));
        assert_eq!(lifecycle.in_flight(), None);
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refused_request_restores_previous_state() {
        let engine = MockEngine::new();
        let lifecycle = Arc::new(Lifecycle::new());
        let (_, on_complete) = counter();
        lifecycle.open(&engine, on_complete).unwrap();
        assert!(engine.complete_open(true));

        engine.refuse_next();
        let (count, on_complete) = counter();
        let credentials = Credentials::new("juliet", "r0m30", "balcony");
        assert!(lifecycle
            .authenticate(&engine, &credentials, on_complete)
            .is_err());
        assert_eq!(lifecycle.state(), ConnectionState::Open);
        assert_eq!(lifecycle.in_flight(), None);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn blocking_result_keeps_state_of_armed_request() {
        let engine = MockEngine::new();
        let lifecycle = Arc::new(Lifecycle::new());
        let (count, on_complete) = counter();
        // Another caller arms an open while the blocking call is running.
        let blocking = lifecycle.block(LifecycleKind::Open, || {
            lifecycle.open(&engine, on_complete)?;
            Ok(false)
        });
        assert!(!blocking.unwrap());
        assert_eq!(lifecycle.in_flight(), Some(LifecycleKind::Open));
        assert_eq!(lifecycle.state(), ConnectionState::Opening);

        assert!(engine.complete_open(true));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(lifecycle.state(), ConnectionState::Open);
    }

    #[test]
    fn abandoned_completion_is_ignored() {
        let engine = MockEngine::new();
        let lifecycle = Arc::new(Lifecycle::new());
        let (count, on_complete) = counter();
        lifecycle.open(&engine, on_complete).unwrap();
        let stale = engine.take_open_handler().unwrap();

        assert_eq!(lifecycle.abandon(), Some(LifecycleKind::Open));
        assert_eq!(lifecycle.state(), ConnectionState::Closed);

        let (fresh, on_complete) = counter();
        lifecycle.open(&engine, on_complete).unwrap();
        stale(true);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(fresh.load(Ordering::SeqCst), 0);
        assert_eq!(lifecycle.in_flight(), Some(LifecycleKind::Open));

        assert!(engine.complete_open(true));
        assert_eq!(fresh.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocking_variants_track_state() {
        let engine = MockEngine::new();
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.open_and_block(&engine).unwrap());
        assert_eq!(lifecycle.state(), ConnectionState::Open);

        engine.set_blocking_result(false);
        let credentials = Credentials::new("juliet", "wrong", "balcony");
        assert!(!lifecycle.authenticate_and_block(&engine, &credentials).unwrap());
        assert_eq!(lifecycle.state(), ConnectionState::Open);
        assert_eq!(lifecycle.in_flight(), None);

        lifecycle.close(&engine).unwrap();
        assert_eq!(lifecycle.state(), ConnectionState::Closed);
    }
}
