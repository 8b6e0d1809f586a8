// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A recording StreamEngine for tests

use core::fmt;
use std::sync::Mutex;

use jabber_stanza::StanzaNode;

use crate::config::Credentials;
use crate::engine::{
    Category, DisconnectHandler, DisconnectReason, EngineError, NodeHandler, ResultHandler,
    StreamEngine,
};
use crate::Error;

#[derive(Debug)]
pub(crate) struct MockError;

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("refused by mock engine")
    }
}

impl core::error::Error for MockError {}
impl EngineError for MockError {}

#[derive(Default)]
struct State {
    server: String,
    port: u16,
    use_tls: bool,
    authenticated: bool,
    refuse_next: bool,
    blocking_result: Option<bool>,
    blocking_reply: Option<StanzaNode>,
    open_handler: Option<ResultHandler>,
    auth_handler: Option<ResultHandler>,
    credentials: Vec<Credentials>,
    sent: Vec<StanzaNode>,
    raw: Vec<String>,
    closed: usize,
    reply_handlers: Vec<(String, NodeHandler)>,
    category_handlers: Vec<(Category, NodeHandler)>,
    disconnect_handler: Option<DisconnectHandler>,
}

/// Stores every callback it is given until the test fires it.
#[derive(Default)]
pub(crate) struct MockEngine {
    state: Mutex<State>,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn refused(&self) -> Result<(), Error> {
        let mut state = self.state();
        if state.refuse_next {
            state.refuse_next = false;
            return Err(MockError.into());
        }
        Ok(())
    }

    /// Make the next request fail synchronously.
    pub(crate) fn refuse_next(&self) {
        self.state().refuse_next = true;
    }

    pub(crate) fn set_blocking_result(&self, result: bool) {
        self.state().blocking_result = Some(result);
    }

    pub(crate) fn set_blocking_reply(&self, reply: StanzaNode) {
        self.state().blocking_reply = Some(reply);
    }

    pub(crate) fn take_open_handler(&self) -> Option<ResultHandler> {
        self.state().open_handler.take()
    }

    pub(crate) fn take_auth_handler(&self) -> Option<ResultHandler> {
        self.state().auth_handler.take()
    }

    pub(crate) fn complete_open(&self, success: bool) -> bool {
        match self.take_open_handler() {
            Some(handler) => {
                handler(success);
                true
            }
            None => false,
        }
    }

    pub(crate) fn complete_auth(&self, success: bool) -> bool {
        let handler = self.take_auth_handler();
        if success && handler.is_some() {
            self.state().authenticated = true;
        }
        match handler {
            Some(handler) => {
                handler(success);
                true
            }
            None => false,
        }
    }

    /// Route `node` through the handler registered for `category`.
    pub(crate) fn deliver(&self, category: Category, node: StanzaNode) {
        let handlers: Vec<_> = self
            .state()
            .category_handlers
            .iter()
            .filter(|(registered, _)| *registered == category)
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(node.clone());
        }
    }

    /// Route `node` through the reply handler registered for `token`. The
    /// handler stays registered, so a test can deliver twice.
    pub(crate) fn reply(&self, token: &str, node: StanzaNode) -> bool {
        let handler = self
            .state()
            .reply_handlers
            .iter()
            .find(|(registered, _)| registered == token)
            .map(|(_, handler)| handler.clone());
        match handler {
            Some(handler) => {
                handler(node);
                true
            }
            None => false,
        }
    }

    pub(crate) fn disconnect(&self, reason: DisconnectReason) {
        let handler = {
            let mut state = self.state();
            state.authenticated = false;
            state.disconnect_handler.clone()
        };
        if let Some(handler) = handler {
            handler(reason);
        }
    }

    pub(crate) fn sent(&self) -> Vec<StanzaNode> {
        self.state().sent.clone()
    }

    pub(crate) fn raw(&self) -> Vec<String> {
        self.state().raw.clone()
    }

    pub(crate) fn closed(&self) -> usize {
        self.state().closed
    }

    pub(crate) fn credentials(&self) -> Vec<Credentials> {
        self.state().credentials.clone()
    }

    pub(crate) fn category_handlers(&self) -> Vec<Category> {
        self.state()
            .category_handlers
            .iter()
            .map(|(category, _)| *category)
            .collect()
    }
}

impl StreamEngine for MockEngine {
    fn server(&self) -> String {
        self.state().server.clone()
    }

    fn set_server(&self, server: &str) {
        self.state().server = server.to_owned();
    }

    fn port(&self) -> u16 {
        self.state().port
    }

    fn set_port(&self, port: u16) {
        self.state().port = port;
    }

    fn use_tls(&self) -> bool {
        self.state().use_tls
    }

    fn set_use_tls(&self, use_tls: bool) {
        self.state().use_tls = use_tls;
    }

    fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }

    fn open(&self, on_result: ResultHandler) -> Result<(), Error> {
        self.refused()?;
        self.state().open_handler = Some(on_result);
        Ok(())
    }

    fn open_blocking(&self) -> Result<bool, Error> {
        self.refused()?;
        Ok(self.state().blocking_result.unwrap_or(true))
    }

    fn close(&self) -> Result<(), Error> {
        self.refused()?;
        let mut state = self.state();
        state.closed += 1;
        state.authenticated = false;
        Ok(())
    }

    fn authenticate(
        &self,
        credentials: &Credentials,
        on_result: ResultHandler,
    ) -> Result<(), Error> {
        self.refused()?;
        let mut state = self.state();
        state.credentials.push(credentials.clone());
        state.auth_handler = Some(on_result);
        Ok(())
    }

    fn authenticate_blocking(&self, credentials: &Credentials) -> Result<bool, Error> {
        self.refused()?;
        let mut state = self.state();
        state.credentials.push(credentials.clone());
        let success = state.blocking_result.unwrap_or(true);
        state.authenticated = success;
        Ok(success)
    }

    fn send(&self, node: &StanzaNode) -> Result<(), Error> {
        self.refused()?;
        self.state().sent.push(node.clone());
        Ok(())
    }

    fn send_with_reply(
        &self,
        node: &StanzaNode,
        token: &str,
        on_reply: NodeHandler,
    ) -> Result<(), Error> {
        self.refused()?;
        let mut state = self.state();
        state.sent.push(node.clone());
        state.reply_handlers.push((token.to_owned(), on_reply));
        Ok(())
    }

    fn send_with_reply_blocking(&self, node: &StanzaNode) -> Result<StanzaNode, Error> {
        self.refused()?;
        let mut state = self.state();
        state.sent.push(node.clone());
        let mut reply = state
            .blocking_reply
            .take()
            .unwrap_or_else(|| StanzaNode::new("iq").with_attribute("type", "result"));
        if let Some(id) = node.attribute("id") {
            reply.set_attribute("id", id);
        }
        Ok(reply)
    }

    fn send_raw(&self, text: &str) -> Result<(), Error> {
        self.refused()?;
        self.state().raw.push(text.to_owned());
        Ok(())
    }

    fn register_category_handler(&self, category: Category, handler: NodeHandler) {
        self.state().category_handlers.push((category, handler));
    }

    fn set_disconnect_handler(&self, handler: DisconnectHandler) {
        self.state().disconnect_handler = Some(handler);
    }
}
