// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;
use core::ops::{Deref, DerefMut};

use jid::Jid;
use rand::{thread_rng, Rng};

use crate::{Error, Iq, Kind, Message, Presence, StanzaNode, SubType};

/// Generate a fresh stanza id.
pub fn make_id() -> String {
    let id: u64 = thread_rng().gen();
    format!("{}", id)
}

/// A root node together with the kind and subtype it was classified as.
///
/// The subtype is captured once, when the envelope is built, and is not
/// re-derived if the `type` attribute is edited later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: Kind,
    sub_type: SubType,
    node: StanzaNode,
}

impl Envelope {
    pub(crate) fn from_node(node: StanzaNode) -> Envelope {
        let kind = Kind::from_name(node.name());
        let sub_type = SubType::derive(kind, node.attribute("type"));
        Envelope {
            kind,
            sub_type,
            node,
        }
    }

    /// Build a fresh outgoing stanza with a random id.
    pub(crate) fn build(to: Option<&str>, kind: Kind, sub_type: SubType) -> Envelope {
        let mut node = StanzaNode::new(kind.as_name().unwrap_or("unknown"));
        node.set_attribute("id", make_id());
        if let Some(to) = to {
            node.set_attribute("to", to);
        }
        if let Some(type_) = sub_type.as_attr() {
            node.set_attribute("type", type_);
        }
        Envelope {
            kind,
            sub_type,
            node,
        }
    }

    /// The kind this stanza was classified as.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The subtype recorded when this stanza was built or received.
    pub fn sub_type(&self) -> SubType {
        self.sub_type
    }

    /// The root node.
    pub fn node(&self) -> &StanzaNode {
        &self.node
    }

    /// The root node, mutably.
    pub fn node_mut(&mut self) -> &mut StanzaNode {
        &mut self.node
    }

    /// Give up the classification and keep the tree.
    pub fn into_node(self) -> StanzaNode {
        self.node
    }

    /// Read an attribute of the root node.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.node.attribute(name)
    }

    /// Write an attribute of the root node.
    pub fn set_attribute<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.node.set_attribute(name, value);
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.node.attribute("id")
    }

    /// Set the `id` attribute.
    pub fn set_id<V: Into<String>>(&mut self, id: V) {
        self.node.set_attribute("id", id);
    }

    /// Assign a random id if the stanza has none (or an empty one), and
    /// return the id.
    pub fn ensure_id(&mut self) -> &str {
        if self.id().map_or(true, str::is_empty) {
            self.node.set_attribute("id", make_id());
        }
        self.node.attribute("id").unwrap_or_default()
    }

    /// The `to` attribute.
    pub fn to(&self) -> Option<&str> {
        self.node.attribute("to")
    }

    /// Set the `to` attribute.
    pub fn set_to<V: Into<String>>(&mut self, to: V) {
        self.node.set_attribute("to", to);
    }

    /// The `from` attribute.
    pub fn from(&self) -> Option<&str> {
        self.node.attribute("from")
    }

    /// Set the `from` attribute.
    pub fn set_from<V: Into<String>>(&mut self, from: V) {
        self.node.set_attribute("from", from);
    }

    /// The `to` attribute parsed as a Jabber-Id.
    pub fn to_jid(&self) -> Result<Option<Jid>, Error> {
        parse_jid(self.to())
    }

    /// The `from` attribute parsed as a Jabber-Id.
    pub fn from_jid(&self) -> Result<Option<Jid>, Error> {
        parse_jid(self.from())
    }
}

fn parse_jid(value: Option<&str>) -> Result<Option<Jid>, Error> {
    match value {
        Some(value) => Ok(Some(Jid::new(value)?)),
        None => Ok(None),
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}

/// A stanza received from or sent to the stream, classified by root name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stanza {
    /// Message stanza
    Message(Message),

    /// Presence stanza
    Presence(Presence),

    /// IQ stanza
    Iq(Iq),

    /// Stream header
    StreamOpen(Envelope),

    /// Stream-level error
    StreamError(Envelope),

    /// Anything else
    Unknown(Envelope),
}

impl Stanza {
    /// Classify a node as a message, presence or IQ.
    ///
    /// Any other root yields `None`; callers drop such nodes silently.
    pub fn from_node(node: StanzaNode) -> Option<Stanza> {
        match Kind::from_name(node.name()) {
            Kind::Message | Kind::Presence | Kind::Iq => Some(Stanza::wrap(node)),
            _ => {
                log::trace!(
                    "not classifying <{}/>: not a message, presence or iq",
                    node.name()
                );
                None
            }
        }
    }

    /// Classify any node, falling back to [`Stanza::Unknown`].
    pub fn wrap(node: StanzaNode) -> Stanza {
        let envelope = Envelope::from_node(node);
        match envelope.kind {
            Kind::Message => Stanza::Message(Message(envelope)),
            Kind::Presence => Stanza::Presence(Presence(envelope)),
            Kind::Iq => Stanza::Iq(Iq(envelope)),
            Kind::StreamOpen => Stanza::StreamOpen(envelope),
            Kind::StreamError => Stanza::StreamError(envelope),
            Kind::Unknown => Stanza::Unknown(envelope),
        }
    }
}

impl Deref for Stanza {
    type Target = Envelope;

    fn deref(&self) -> &Envelope {
        match self {
            Stanza::Message(st) => &st.0,
            Stanza::Presence(st) => &st.0,
            Stanza::Iq(st) => &st.0,
            Stanza::StreamOpen(st) | Stanza::StreamError(st) | Stanza::Unknown(st) => st,
        }
    }
}

impl DerefMut for Stanza {
    fn deref_mut(&mut self) -> &mut Envelope {
        match self {
            Stanza::Message(st) => &mut st.0,
            Stanza::Presence(st) => &mut st.0,
            Stanza::Iq(st) => &mut st.0,
            Stanza::StreamOpen(st) | Stanza::StreamError(st) | Stanza::Unknown(st) => st,
        }
    }
}

impl fmt::Display for Stanza {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.node(), f)
    }
}

impl From<Stanza> for StanzaNode {
    fn from(other: Stanza) -> StanzaNode {
        match other {
            Stanza::Message(st) => st.0.node,
            Stanza::Presence(st) => st.0.node,
            Stanza::Iq(st) => st.0.node,
            Stanza::StreamOpen(st) | Stanza::StreamError(st) | Stanza::Unknown(st) => st.node,
        }
    }
}

macro_rules! envelope_view {
    ($view:ident) => {
        impl Deref for $view {
            type Target = Envelope;

            fn deref(&self) -> &Envelope {
                &self.0
            }
        }

        impl DerefMut for $view {
            fn deref_mut(&mut self) -> &mut Envelope {
                &mut self.0
            }
        }

        impl From<$view> for Stanza {
            fn from(other: $view) -> Stanza {
                Stanza::$view(other)
            }
        }

        impl From<$view> for StanzaNode {
            fn from(other: $view) -> StanzaNode {
                other.0.node
            }
        }

        impl TryFrom<Stanza> for $view {
            type Error = Stanza;

            fn try_from(other: Stanza) -> Result<$view, Stanza> {
                match other {
                    Stanza::$view(st) => Ok(st),
                    other => Err(other),
                }
            }
        }

        impl TryFrom<StanzaNode> for $view {
            type Error = Error;

            fn try_from(node: StanzaNode) -> Result<$view, Error> {
                let found = Kind::from_name(node.name());
                if found != Kind::$view {
                    return Err(Error::WrongKind {
                        expected: Kind::$view,
                        found,
                    });
                }
                Ok($view(Envelope::from_node(node)))
            }
        }

        impl fmt::Display for $view {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.node, f)
            }
        }
    };
}

envelope_view!(Message);
envelope_view!(Presence);
envelope_view!(Iq);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_root_name() {
        let stanza = Stanza::from_node(StanzaNode::new("presence")).unwrap();
        assert_eq!(stanza.kind(), Kind::Presence);
        assert_eq!(stanza.sub_type(), SubType::Available);

        let node = StanzaNode::new("iq").with_attribute("type", "result");
        let stanza = Stanza::from_node(node).unwrap();
        assert!(matches!(stanza, Stanza::Iq(_)));
        assert_eq!(stanza.sub_type(), SubType::Result);
    }

    #[test]
    fn unknown_roots_are_not_classified() {
        assert!(Stanza::from_node(StanzaNode::new("stream:features")).is_none());
        assert!(Stanza::from_node(StanzaNode::new("stream:error")).is_none());
        let stanza = Stanza::wrap(StanzaNode::new("stream:error"));
        assert_eq!(stanza.kind(), Kind::StreamError);
        let stanza = Stanza::wrap(StanzaNode::new("r"));
        assert!(matches!(stanza, Stanza::Unknown(_)));
    }

    #[test]
    fn sub_type_is_not_rederived() {
        let node = StanzaNode::new("message").with_attribute("type", "chat");
        let mut stanza = Stanza::wrap(node);
        stanza.set_attribute("type", "headline");
        assert_eq!(stanza.sub_type(), SubType::Chat);
        assert_eq!(stanza.attribute("type"), Some("headline"));
    }

    #[test]
    fn ensure_id_keeps_existing() {
        let node = StanzaNode::new("iq").with_attribute("id", "abc");
        let mut stanza = Stanza::wrap(node);
        assert_eq!(stanza.ensure_id(), "abc");

        let mut stanza = Stanza::wrap(StanzaNode::new("iq").with_attribute("id", ""));
        let id = stanza.ensure_id().to_owned();
        assert!(!id.is_empty());
        assert_eq!(stanza.id(), Some(id.as_str()));
    }

    #[test]
    fn typed_conversions() {
        let stanza = Stanza::wrap(StanzaNode::new("message"));
        let stanza = Iq::try_from(stanza).unwrap_err();
        let message = Message::try_from(stanza).unwrap();
        assert_eq!(message.kind(), Kind::Message);

        match Presence::try_from(StanzaNode::new("iq")) {
            Err(Error::WrongKind { expected, found }) => {
                assert_eq!(expected, Kind::Presence);
                assert_eq!(found, Kind::Iq);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn jid_accessors() {
        let node = StanzaNode::new("message")
            .with_attribute("from", "juliet@capulet.example/balcony")
            .with_attribute("to", "@capulet.example");
        let stanza = Stanza::wrap(node);
        let from = stanza.from_jid().unwrap().unwrap();
        assert_eq!(from.to_string(), "juliet@capulet.example/balcony");
        assert!(matches!(stanza.to_jid(), Err(Error::JidParse(_))));
    }
}
