// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use alloc::sync::{Arc, Weak};
use core::fmt;

use jabber_stanza::{Iq, Message, Presence, Stanza};

use crate::config::{ConnectionConfig, Credentials};
use crate::dispatch::Dispatcher;
use crate::engine::{Category, DisconnectReason, NodeHandler, StreamEngine};
use crate::event::{EventStream, DEFAULT_EVENT_QUEUE_DEPTH};
use crate::lifecycle::{ConnectionState, Lifecycle};
use crate::observer::SubscriptionId;
use crate::reply::{ReplyTable, ReplyToken};
use crate::{Error, ReplyFailure};

struct Inner<E> {
    engine: Arc<E>,
    lifecycle: Arc<Lifecycle>,
    replies: Arc<ReplyTable>,
    dispatcher: Arc<Dispatcher>,
}

impl<E: StreamEngine> Inner<E> {
    fn disconnected(&self, reason: DisconnectReason) {
        log::debug!("disconnected: {}", reason);
        self.lifecycle.abandon();
        self.replies.fail_all(ReplyFailure::Disconnected(reason));
        self.dispatcher.disconnected(reason);
    }
}

/// A client connection to an XMPP server, on top of a [`StreamEngine`].
///
/// Dropping the connection silences it: callbacks the engine still holds
/// only keep a weak reference and do nothing once it is gone.
pub struct Connection<E: StreamEngine + 'static> {
    inner: Arc<Inner<E>>,
}

impl<E: StreamEngine + 'static> Connection<E> {
    /// Push `config` to `engine` and start listening to it.
    pub fn new(engine: Arc<E>, config: &ConnectionConfig) -> Self {
        engine.set_server(&config.server);
        engine.set_port(config.port);
        engine.set_use_tls(config.use_tls);

        let replies = Arc::new(ReplyTable::new());
        let inner = Arc::new(Inner {
            engine,
            lifecycle: Arc::new(Lifecycle::new()),
            dispatcher: Arc::new(Dispatcher::new(replies.clone())),
            replies,
        });

        for category in Category::ALL {
            let dispatcher = Arc::downgrade(&inner.dispatcher);
            inner.engine.register_category_handler(
                category,
                Arc::new(move |node| {
                    if let Some(dispatcher) = dispatcher.upgrade() {
                        dispatcher.deliver_untracked(node);
                    }
                }),
            );
        }
        let weak: Weak<Inner<E>> = Arc::downgrade(&inner);
        inner
            .engine
            .set_disconnect_handler(Arc::new(move |reason| {
                if let Some(inner) = weak.upgrade() {
                    inner.disconnected(reason);
                }
            }));

        Connection { inner }
    }

    /// The engine this connection drives.
    pub fn engine(&self) -> &Arc<E> {
        &self.inner.engine
    }

    /// Host name of the server.
    pub fn server(&self) -> String {
        self.inner.engine.server()
    }

    /// Set the host name of the server, for the next open.
    pub fn set_server(&self, server: &str) {
        self.inner.engine.set_server(server)
    }

    /// TCP port of the server.
    pub fn port(&self) -> u16 {
        self.inner.engine.port()
    }

    /// Set the TCP port of the server, for the next open.
    pub fn set_port(&self, port: u16) {
        self.inner.engine.set_port(port)
    }

    /// Whether TLS is used.
    pub fn use_tls(&self) -> bool {
        self.inner.engine.use_tls()
    }

    /// Enable or disable TLS, for the next open.
    pub fn set_use_tls(&self, use_tls: bool) {
        self.inner.engine.set_use_tls(use_tls)
    }

    /// Whether the engine reports a completed authentication.
    pub fn is_authenticated(&self) -> bool {
        self.inner.engine.is_authenticated()
    }

    /// Where the connection is in its life.
    pub fn state(&self) -> ConnectionState {
        self.inner.lifecycle.state()
    }

    /// Start opening the stream. `on_complete` runs once with the outcome,
    /// unless the stream is disconnected first.
    ///
    /// Fails with [`Error::OperationInFlight`] while another open or
    /// authenticate request is outstanding.
    pub fn open<F: FnOnce(bool) + Send + 'static>(&self, on_complete: F) -> Result<(), Error> {
        self.inner
            .lifecycle
            .open(self.inner.engine.as_ref(), on_complete)
    }

    /// Open the stream and wait for the outcome.
    pub fn open_and_block(&self) -> Result<bool, Error> {
        self.inner
            .lifecycle
            .open_and_block(self.inner.engine.as_ref())
    }

    /// Start authenticating. `on_complete` runs once with the outcome,
    /// unless the stream is disconnected first.
    pub fn authenticate<F: FnOnce(bool) + Send + 'static>(
        &self,
        credentials: &Credentials,
        on_complete: F,
    ) -> Result<(), Error> {
        self.inner
            .lifecycle
            .authenticate(self.inner.engine.as_ref(), credentials, on_complete)
    }

    /// Authenticate and wait for the outcome.
    pub fn authenticate_and_block(&self, credentials: &Credentials) -> Result<bool, Error> {
        self.inner
            .lifecycle
            .authenticate_and_block(self.inner.engine.as_ref(), credentials)
    }

    /// Close the stream. Every request still waiting for its reply fails
    /// with [`ReplyFailure::Closed`].
    pub fn close(&self) -> Result<(), Error> {
        self.inner.lifecycle.close(self.inner.engine.as_ref())?;
        self.inner.replies.fail_all(ReplyFailure::Closed);
        Ok(())
    }

    /// Send a stanza.
    pub fn send<S: Into<Stanza>>(&self, stanza: S) -> Result<(), Error> {
        let stanza = stanza.into();
        self.inner.engine.send(stanza.node())
    }

    /// Send a stanza and run `handler` once with its reply.
    ///
    /// The request is tracked under the stanza's `id`, which is generated if
    /// missing and returned. If the engine refuses the stanza, nothing is
    /// tracked and `handler` is dropped.
    pub fn send_with_reply<S, F>(&self, stanza: S, handler: F) -> Result<String, Error>
    where
        S: Into<Stanza>,
        F: FnOnce(Result<Stanza, ReplyFailure>) + Send + 'static,
    {
        let mut stanza = stanza.into();
        let token = stanza.ensure_id().to_owned();
        self.inner.replies.track(token.clone(), Box::new(handler))?;
        self.submit_tracked(&stanza, token)
    }

    /// Send a stanza and return a future resolving with its reply.
    pub fn send_request<S: Into<Stanza>>(&self, stanza: S) -> Result<ReplyToken, Error> {
        let mut stanza = stanza.into();
        let token = stanza.ensure_id().to_owned();
        let reply = ReplyToken::track(&self.inner.replies, token.clone())?;
        self.submit_tracked(&stanza, token)?;
        Ok(reply)
    }

    fn submit_tracked(&self, stanza: &Stanza, token: String) -> Result<String, Error> {
        let dispatcher = Arc::downgrade(&self.inner.dispatcher);
        let routed = token.clone();
        let on_reply: NodeHandler = Arc::new(move |node| {
            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher.deliver_tracked(&routed, node);
            }
        });
        if let Err(e) = self
            .inner
            .engine
            .send_with_reply(stanza.node(), &token, on_reply)
        {
            self.inner.replies.abandon(&token);
            return Err(e);
        }
        log::debug!("sent {} request {:?}", stanza.kind(), token);
        Ok(token)
    }

    /// Send a stanza and wait for its reply.
    pub fn send_with_reply_and_block<S: Into<Stanza>>(&self, stanza: S) -> Result<Stanza, Error> {
        let mut stanza = stanza.into();
        stanza.ensure_id();
        let reply = self.inner.engine.send_with_reply_blocking(stanza.node())?;
        Ok(Stanza::wrap(reply))
    }

    /// Write `text` to the stream as is.
    pub fn send_raw(&self, text: &str) -> Result<(), Error> {
        self.inner.engine.send_raw(text)
    }

    /// Number of requests still waiting for their reply.
    pub fn pending_replies(&self) -> usize {
        self.inner.replies.len()
    }

    /// Run `f` for every incoming message.
    pub fn on_message<F: Fn(&Message) + Send + Sync + 'static>(&self, f: F) -> SubscriptionId {
        self.inner.dispatcher.on_message(f)
    }

    /// Run `f` for every incoming presence.
    pub fn on_presence<F: Fn(&Presence) + Send + Sync + 'static>(&self, f: F) -> SubscriptionId {
        self.inner.dispatcher.on_presence(f)
    }

    /// Run `f` for every incoming IQ that does not answer a tracked request.
    pub fn on_iq<F: Fn(&Iq) + Send + Sync + 'static>(&self, f: F) -> SubscriptionId {
        self.inner.dispatcher.on_iq(f)
    }

    /// Run `f` when the stream goes away.
    pub fn on_disconnected<F: Fn(&DisconnectReason) + Send + Sync + 'static>(
        &self,
        f: F,
    ) -> SubscriptionId {
        self.inner.dispatcher.on_disconnected(f)
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.dispatcher.unsubscribe(id)
    }

    /// Merge all subscriber categories into one stream of [`Event`][`crate::Event`]s.
    ///
    /// Up to [`DEFAULT_EVENT_QUEUE_DEPTH`] events are queued while the
    /// stream is not polled; later ones are dropped with a warning.
    pub fn events(&self) -> EventStream {
        self.events_with_depth(DEFAULT_EVENT_QUEUE_DEPTH)
    }

    /// Like [`events`][`Self::events`], queueing up to `depth` events
    /// (at least one).
    pub fn events_with_depth(&self, depth: usize) -> EventStream {
        EventStream::subscribe(&self.inner.dispatcher, depth)
    }
}

impl<E: StreamEngine + 'static> fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("server", &self.server())
            .field("port", &self.port())
            .field("use_tls", &self.use_tls())
            .field("lifecycle", &self.inner.lifecycle)
            .field("pending_replies", &self.pending_replies())
            .finish()
    }
}
