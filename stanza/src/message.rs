// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Envelope, Kind, MessageType};

/// A `<message/>` stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(pub(crate) Envelope);

impl Message {
    /// Create a message with a fresh id. `MessageType::Normal` leaves the
    /// `type` attribute out.
    pub fn new(to: Option<&str>, type_: MessageType) -> Message {
        Message(Envelope::build(to, Kind::Message, type_.into()))
    }

    /// Create a `type='chat'` message to `to` carrying `body`.
    pub fn chat(to: &str, body: &str) -> Message {
        let mut message = Message::new(Some(to), MessageType::Chat);
        message.set_body(body);
        message
    }

    /// The message type, or `None` if the recorded subtype belongs to
    /// another kind of stanza.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.sub_type()).ok()
    }

    /// Text of the first `<body/>` in the tree.
    pub fn body(&self) -> Option<&str> {
        self.node().find_child("body").and_then(|body| body.value())
    }

    /// Append a `<body/>` child.
    ///
    /// This always appends: calling it twice leaves two bodies, and
    /// [`body`][`Self::body`] keeps returning the first one.
    pub fn set_body(&mut self, body: &str) {
        self.node_mut().add_child("body", Some(body));
    }

    /// Text of the `<subject/>` child.
    pub fn subject(&self) -> Option<&str> {
        self.child_text("subject")
    }

    /// Text of the `<thread/>` child.
    pub fn thread(&self) -> Option<&str> {
        self.child_text("thread")
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.node().child(name).and_then(|child| child.value())
    }
}
