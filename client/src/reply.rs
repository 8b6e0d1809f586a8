// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Correlation of outgoing requests with their replies.

use alloc::collections::BTreeMap;
use core::future::Future;
use core::ops::ControlFlow;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Mutex;

use tokio::sync::oneshot;

use jabber_stanza::Stanza;

use crate::{lock, Error, ReplyFailure};

/// One-shot callback receiving the reply to a tracked request.
pub type ReplyHandler = Box<dyn FnOnce(Result<Stanza, ReplyFailure>) + Send>;

/// Requests waiting for their reply, keyed by the request's `id`.
///
/// Every handler is invoked at most once, always after its entry has been
/// removed and outside the table lock, so a handler may send a new request
/// through the same table.
pub struct ReplyTable {
    map: Mutex<BTreeMap<String, ReplyHandler>>,
}

impl Default for ReplyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            map: Mutex::new(BTreeMap::new()),
        }
    }

    /// Wait for the reply to `token`.
    ///
    /// Fails without touching the existing entry if `token` is already
    /// tracked.
    pub fn track(&self, token: impl Into<String>, handler: ReplyHandler) -> Result<(), Error> {
        let token = token.into();
        let mut map = lock(&self.map);
        if map.contains_key(&token) {
            log::warn!("refusing to track {:?} twice", token);
            return Err(Error::DuplicateToken(token));
        }
        log::debug!("tracking reply to {:?}", token);
        map.insert(token, handler);
        Ok(())
    }

    /// Hand `stanza` to the handler waiting on `token`.
    ///
    /// Returns false, dropping the stanza, if nothing waits on `token`.
    pub fn resolve(&self, token: &str, stanza: Stanza) -> bool {
        let handler = lock(&self.map).remove(token);
        match handler {
            Some(handler) => {
                handler(Ok(stanza));
                true
            }
            None => {
                log::trace!("dropping reply to {:?}: not tracked", token);
                false
            }
        }
    }

    /// Attempt to handle `stanza` as the reply to a tracked request, going
    /// by its `id` attribute.
    ///
    /// Returns the stanza unharmed if it does not answer any request which is
    /// still being tracked.
    pub fn try_resolve(&self, stanza: Stanza) -> ControlFlow<(), Stanza> {
        let handler = match stanza.id() {
            Some(id) => lock(&self.map).remove(id),
            None => None,
        };
        match handler {
            Some(handler) => {
                handler(Ok(stanza));
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(stanza),
        }
    }

    /// Stop waiting on `token` without invoking its handler.
    pub fn abandon(&self, token: &str) -> bool {
        lock(&self.map).remove(token).is_some()
    }

    /// Fail every tracked request with `failure`. Returns how many there
    /// were.
    pub fn fail_all(&self, failure: ReplyFailure) -> usize {
        let drained = core::mem::take(&mut *lock(&self.map));
        let count = drained.len();
        if count > 0 {
            log::debug!("failing {} pending replies: {}", count, failure);
        }
        for (_, handler) in drained {
            handler(Err(failure));
        }
        count
    }

    /// Number of requests waiting for a reply.
    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    /// Whether no request is waiting for a reply.
    pub fn is_empty(&self) -> bool {
        lock(&self.map).is_empty()
    }

    /// Whether something waits on `token`.
    pub fn is_tracked(&self, token: &str) -> bool {
        lock(&self.map).contains_key(token)
    }
}

/// Handle for awaiting the reply to a request.
///
/// There are no timeouts: if a reply never arrives and the connection stays
/// up, the future never completes. Combine it with something like
/// `tokio::time::timeout` where that matters.
///
/// Dropping a `ReplyToken` does not withdraw the request; its reply is
/// still consumed when it arrives.
#[derive(Debug)]
pub struct ReplyToken {
    id: String,
    inner: oneshot::Receiver<Result<Stanza, ReplyFailure>>,
}

impl ReplyToken {
    /// Track `id` in `table` and return a token resolving with its reply.
    pub(crate) fn track(table: &ReplyTable, id: String) -> Result<ReplyToken, Error> {
        let (tx, rx) = oneshot::channel();
        table.track(
            id.clone(),
            Box::new(move |result| {
                let _: Result<_, _> = tx.send(result);
            }),
        )?;
        Ok(ReplyToken { id, inner: rx })
    }

    /// The `id` of the request this token waits on.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for ReplyToken {
    type Output = Result<Stanza, ReplyFailure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.inner).poll(cx) {
            Poll::Ready(Ok(v)) => Poll::Ready(v),
            Poll::Ready(Err(_)) => {
                log::warn!("reply handler for {:?} dropped without an answer", self.id);
                Poll::Ready(Err(ReplyFailure::LostConnection))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
