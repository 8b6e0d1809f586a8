// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Routing of incoming stanzas to reply handlers and subscribers.

use alloc::sync::Arc;
use core::ops::ControlFlow;
use core::sync::atomic::{AtomicU64, Ordering};

use jabber_stanza::{Iq, Message, Presence, Stanza, StanzaNode};

use crate::engine::DisconnectReason;
use crate::observer::{Observers, SubscriptionId};
use crate::reply::ReplyTable;

/// Turns what the engine delivers into calls on reply handlers and
/// subscribers.
pub struct Dispatcher {
    replies: Arc<ReplyTable>,
    messages: Observers<Message>,
    presences: Observers<Presence>,
    iqs: Observers<Iq>,
    disconnects: Observers<DisconnectReason>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher resolving replies through `replies`.
    pub fn new(replies: Arc<ReplyTable>) -> Self {
        Self {
            replies,
            messages: Observers::new(),
            presences: Observers::new(),
            iqs: Observers::new(),
            disconnects: Observers::new(),
            next_id: AtomicU64::new(0),
        }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to incoming messages.
    pub fn on_message<F: Fn(&Message) + Send + Sync + 'static>(&self, f: F) -> SubscriptionId {
        let id = self.allocate_id();
        self.messages.subscribe(id, Arc::new(f));
        id
    }

    /// Subscribe to incoming presences.
    pub fn on_presence<F: Fn(&Presence) + Send + Sync + 'static>(&self, f: F) -> SubscriptionId {
        let id = self.allocate_id();
        self.presences.subscribe(id, Arc::new(f));
        id
    }

    /// Subscribe to incoming IQs that do not answer a tracked request.
    pub fn on_iq<F: Fn(&Iq) + Send + Sync + 'static>(&self, f: F) -> SubscriptionId {
        let id = self.allocate_id();
        self.iqs.subscribe(id, Arc::new(f));
        id
    }

    /// Subscribe to the end of the stream.
    pub fn on_disconnected<F: Fn(&DisconnectReason) + Send + Sync + 'static>(
        &self,
        f: F,
    ) -> SubscriptionId {
        let id = self.allocate_id();
        self.disconnects.subscribe(id, Arc::new(f));
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.messages.unsubscribe(id)
            || self.presences.unsubscribe(id)
            || self.iqs.unsubscribe(id)
            || self.disconnects.unsubscribe(id)
    }

    /// Number of live subscriptions.
    pub fn subscriptions(&self) -> usize {
        self.messages.len() + self.presences.len() + self.iqs.len() + self.disconnects.len()
    }

    /// Handle a stanza the engine did not route to a tracked request.
    ///
    /// A stanza whose `id` is still tracked goes to its reply handler
    /// instead of the subscribers.
    pub fn deliver_untracked(&self, node: StanzaNode) {
        let Some(stanza) = Stanza::from_node(node) else {
            return;
        };
        let stanza = match self.replies.try_resolve(stanza) {
            ControlFlow::Break(()) => return,
            ControlFlow::Continue(stanza) => stanza,
        };
        match stanza {
            Stanza::Message(message) => {
                self.messages.notify(&message);
            }
            Stanza::Presence(presence) => {
                self.presences.notify(&presence);
            }
            Stanza::Iq(iq) => {
                self.iqs.notify(&iq);
            }
            other => log::trace!("no subscribers for {} stanzas", other.kind()),
        }
    }

    /// Handle the reply to the request tracked as `token`.
    ///
    /// Returns false, dropping the stanza, if the request was already
    /// answered or failed.
    pub fn deliver_tracked(&self, token: &str, node: StanzaNode) -> bool {
        self.replies.resolve(token, Stanza::wrap(node))
    }

    /// Tell every disconnect subscriber the stream went away.
    pub fn disconnected(&self, reason: DisconnectReason) {
        self.disconnects.notify(&reason);
    }
}
