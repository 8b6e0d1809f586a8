// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Client side of an [XMPP](https://xmpp.org/) connection, on top of a
//! pluggable stream engine.
//!
//! The engine ([`StreamEngine`]) owns the socket: TCP, TLS, XML framing,
//! SASL. A [`Connection`] drives it and takes care of the rest:
//!
//! - the open and authenticate requests, at most one at a time,
//! - requests whose replies are routed to a one-shot handler or awaited as a
//!   [`ReplyToken`],
//! - fan-out of incoming messages, presences and IQs to subscribers, or as
//!   one [`EventStream`].
//!
//! Nothing here spawns a thread or polls: everything happens in reaction to
//! engine callbacks, on whichever thread the engine calls them.

#![deny(unsafe_code, missing_docs, bare_trait_objects)]

extern crate alloc;

use std::sync::{Mutex, MutexGuard, PoisonError};

mod config;
mod connection;
pub mod dispatch;
pub mod engine;
/// Detailed error types
pub mod error;
mod event;
pub mod lifecycle;
#[cfg(test)]
mod mock;
mod observer;
pub mod reply;

pub use crate::config::{ConnectionConfig, Credentials, DEFAULT_PORT};
pub use crate::connection::Connection;
pub use crate::engine::{Category, DisconnectReason, EngineError, StreamEngine};
#[doc(inline)]
/// Generic jabber_client Error
pub use crate::error::Error;
pub use crate::error::ReplyFailure;
pub use crate::event::{Event, EventStream, DEFAULT_EVENT_QUEUE_DEPTH};
pub use crate::lifecycle::{ConnectionState, LifecycleKind};
pub use crate::observer::SubscriptionId;
pub use crate::reply::{ReplyTable, ReplyToken};

// Re-exports
pub use jabber_stanza as stanza;
pub use jabber_stanza::{jid, Iq, Message, Presence, Stanza, StanzaNode};

/// Handlers never run under a lock, so a poisoned lock still guards
/// consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
