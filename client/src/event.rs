// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use alloc::sync::{Arc, Weak};
use core::pin::Pin;
use core::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::{self, error::TrySendError};

use jabber_stanza::{Iq, Message, Presence};

use crate::dispatch::Dispatcher;
use crate::engine::DisconnectReason;
use crate::observer::SubscriptionId;

/// High-level event on the Stream implemented by [`EventStream`].
#[derive(Debug, Clone)]
pub enum Event {
    /// Incoming message.
    Message(Message),
    /// Incoming presence.
    Presence(Presence),
    /// Incoming IQ that does not answer a tracked request.
    Iq(Iq),
    /// The stream went away.
    Disconnected(DisconnectReason),
}

impl Event {
    /// `Disconnected` event?
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Event::Disconnected(_))
    }

    /// If this is a `Message`, return it.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Event::Message(message) => Some(message),
            _ => None,
        }
    }

    /// If this is a `Presence`, return it.
    pub fn as_presence(&self) -> Option<&Presence> {
        match self {
            Event::Presence(presence) => Some(presence),
            _ => None,
        }
    }

    /// If this is an `Iq`, return it.
    pub fn as_iq(&self) -> Option<&Iq> {
        match self {
            Event::Iq(iq) => Some(iq),
            _ => None,
        }
    }
}

/// Queue depth used by [`Connection::events`][`crate::Connection::events`].
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 64;

/// Every subscriber category merged into one `futures::Stream`.
///
/// Events wait in a bounded queue until polled. When the queue is full, new
/// events are dropped with a warning. Ends once the connection is dropped.
/// Dropping the stream removes its subscriptions.
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
    subscriptions: [SubscriptionId; 4],
    dispatcher: Weak<Dispatcher>,
}

impl EventStream {
    pub(crate) fn subscribe(dispatcher: &Arc<Dispatcher>, depth: usize) -> EventStream {
        let (tx, rx) = mpsc::channel(depth.max(1));
        let forward = |tx: &mpsc::Sender<Event>| {
            let tx = tx.clone();
            move |event: Event| match tx.try_send(event) {
                Ok(()) | Err(TrySendError::Closed(_)) => (),
                Err(TrySendError::Full(event)) => {
                    log::warn!("Event queue full, dropping {:?}", event);
                }
            }
        };
        let send = forward(&tx);
        let messages = dispatcher.on_message(move |m| send(Event::Message(m.clone())));
        let send = forward(&tx);
        let presences = dispatcher.on_presence(move |p| send(Event::Presence(p.clone())));
        let send = forward(&tx);
        let iqs = dispatcher.on_iq(move |iq| send(Event::Iq(iq.clone())));
        let send = forward(&tx);
        let disconnects =
            dispatcher.on_disconnected(move |reason| send(Event::Disconnected(*reason)));
        EventStream {
            rx,
            subscriptions: [messages, presences, iqs, disconnects],
            dispatcher: Arc::downgrade(dispatcher),
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        let Some(dispatcher) = self.dispatcher.upgrade() else {
            return;
        };
        for id in self.subscriptions {
            dispatcher.unsubscribe(id);
        }
    }
}
