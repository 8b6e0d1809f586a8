// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

/// Top-level element category of a stanza, taken from its root name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `<message/>`
    Message,

    /// `<presence/>`
    Presence,

    /// `<iq/>`
    Iq,

    /// `<stream:stream>`, the stream header.
    StreamOpen,

    /// `<stream:error/>`
    StreamError,

    /// Any other root element.
    Unknown,
}

impl Kind {
    /// Classify a root element name.
    pub fn from_name(name: &str) -> Kind {
        match name {
            "message" => Kind::Message,
            "presence" => Kind::Presence,
            "iq" => Kind::Iq,
            "stream:stream" => Kind::StreamOpen,
            "stream:error" => Kind::StreamError,
            _ => Kind::Unknown,
        }
    }

    /// The root element name for this kind, `None` for [`Kind::Unknown`].
    pub fn as_name(self) -> Option<&'static str> {
        Some(match self {
            Kind::Message => "message",
            Kind::Presence => "presence",
            Kind::Iq => "iq",
            Kind::StreamOpen => "stream:stream",
            Kind::StreamError => "stream:error",
            Kind::Unknown => return None,
        })
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name().unwrap_or("unknown"))
    }
}

/// The `type` attribute of a stanza, in one value space shared by all kinds.
///
/// Which values make sense depends on the [`Kind`] of the stanza carrying
/// it; the typed views ([`MessageType`], [`PresenceType`], [`IqType`]) make
/// that pairing explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubType {
    /// No `type` attribute, on a kind without an implied default.
    NotSet,
    /// Presence without a `type`.
    Available,
    /// `normal`
    Normal,
    /// `chat`
    Chat,
    /// `groupchat`
    Groupchat,
    /// `headline`
    Headline,
    /// `unavailable`
    Unavailable,
    /// `probe`
    Probe,
    /// `subscribe`
    Subscribe,
    /// `unsubscribe`
    Unsubscribe,
    /// `subscribed`
    Subscribed,
    /// `unsubscribed`
    Unsubscribed,
    /// `get`
    Get,
    /// `set`
    Set,
    /// `result`
    Result,
    /// `error`, valid on every kind.
    Error,
}

const SUB_TYPE_NAMES: [(SubType, &str); 14] = [
    (SubType::Normal, "normal"),
    (SubType::Chat, "chat"),
    (SubType::Groupchat, "groupchat"),
    (SubType::Headline, "headline"),
    (SubType::Unavailable, "unavailable"),
    (SubType::Probe, "probe"),
    (SubType::Subscribe, "subscribe"),
    (SubType::Unsubscribe, "unsubscribe"),
    (SubType::Subscribed, "subscribed"),
    (SubType::Unsubscribed, "unsubscribed"),
    (SubType::Get, "get"),
    (SubType::Set, "set"),
    (SubType::Result, "result"),
    (SubType::Error, "error"),
];

impl SubType {
    /// Parse a `type` attribute value, ignoring ASCII case. Unrecognised
    /// values give [`SubType::NotSet`].
    pub fn from_attr(value: &str) -> SubType {
        SUB_TYPE_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(value))
            .map(|(sub_type, _)| *sub_type)
            .unwrap_or(SubType::NotSet)
    }

    /// The value to write into the `type` attribute. `NotSet` and
    /// `Available` are expressed by leaving the attribute out.
    pub fn as_attr(self) -> Option<&'static str> {
        SUB_TYPE_NAMES
            .iter()
            .find(|(sub_type, _)| *sub_type == self)
            .map(|(_, name)| *name)
    }

    /// The subtype a stanza of `kind` has when it carries no `type`.
    pub fn default_for(kind: Kind) -> SubType {
        match kind {
            Kind::Message => SubType::NotSet,
            Kind::Presence => SubType::Available,
            Kind::Iq => SubType::Get,
            _ => SubType::Normal,
        }
    }

    /// Derive the subtype of a stanza of `kind` from its `type` attribute.
    pub fn derive(kind: Kind, type_attr: Option<&str>) -> SubType {
        match type_attr {
            Some(value) => SubType::from_attr(value),
            None => SubType::default_for(kind),
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubType::NotSet => f.write_str("not-set"),
            SubType::Available => f.write_str("available"),
            other => f.write_str(other.as_attr().unwrap_or_default()),
        }
    }
}

/// Subtypes meaningful on a `<message/>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    /// No `type`, or `type='normal'`.
    #[default]
    Normal,
    /// One-to-one chat.
    Chat,
    /// Multi-user chat.
    Groupchat,
    /// Broadcast, no reply expected.
    Headline,
    /// Error reply.
    Error,
}

impl From<MessageType> for SubType {
    fn from(other: MessageType) -> SubType {
        match other {
            MessageType::Normal => SubType::NotSet,
            MessageType::Chat => SubType::Chat,
            MessageType::Groupchat => SubType::Groupchat,
            MessageType::Headline => SubType::Headline,
            MessageType::Error => SubType::Error,
        }
    }
}

impl TryFrom<SubType> for MessageType {
    type Error = SubType;

    fn try_from(other: SubType) -> Result<MessageType, SubType> {
        Ok(match other {
            SubType::NotSet | SubType::Normal => MessageType::Normal,
            SubType::Chat => MessageType::Chat,
            SubType::Groupchat => MessageType::Groupchat,
            SubType::Headline => MessageType::Headline,
            SubType::Error => MessageType::Error,
            other => return Err(other),
        })
    }
}

/// Subtypes meaningful on a `<presence/>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceType {
    /// No `type`: the sender is online.
    #[default]
    Available,
    /// The sender went offline.
    Unavailable,
    /// Server-side request for current presence.
    Probe,
    /// Subscription request.
    Subscribe,
    /// Unsubscription request.
    Unsubscribe,
    /// Subscription granted.
    Subscribed,
    /// Subscription denied or cancelled.
    Unsubscribed,
    /// Error reply.
    Error,
}

impl From<PresenceType> for SubType {
    fn from(other: PresenceType) -> SubType {
        match other {
            PresenceType::Available => SubType::Available,
            PresenceType::Unavailable => SubType::Unavailable,
            PresenceType::Probe => SubType::Probe,
            PresenceType::Subscribe => SubType::Subscribe,
            PresenceType::Unsubscribe => SubType::Unsubscribe,
            PresenceType::Subscribed => SubType::Subscribed,
            PresenceType::Unsubscribed => SubType::Unsubscribed,
            PresenceType::Error => SubType::Error,
        }
    }
}

impl TryFrom<SubType> for PresenceType {
    type Error = SubType;

    fn try_from(other: SubType) -> Result<PresenceType, SubType> {
        Ok(match other {
            SubType::Available => PresenceType::Available,
            SubType::Unavailable => PresenceType::Unavailable,
            SubType::Probe => PresenceType::Probe,
            SubType::Subscribe => PresenceType::Subscribe,
            SubType::Unsubscribe => PresenceType::Unsubscribe,
            SubType::Subscribed => PresenceType::Subscribed,
            SubType::Unsubscribed => PresenceType::Unsubscribed,
            SubType::Error => PresenceType::Error,
            other => return Err(other),
        })
    }
}

/// Subtypes meaningful on an `<iq/>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IqType {
    /// Request for information.
    #[default]
    Get,
    /// Request to change something.
    Set,
    /// Successful reply.
    Result,
    /// Error reply.
    Error,
}

impl IqType {
    /// Whether this is a reply rather than a request.
    pub fn is_response(self) -> bool {
        matches!(self, IqType::Result | IqType::Error)
    }
}

impl From<IqType> for SubType {
    fn from(other: IqType) -> SubType {
        match other {
            IqType::Get => SubType::Get,
            IqType::Set => SubType::Set,
            IqType::Result => SubType::Result,
            IqType::Error => SubType::Error,
        }
    }
}

impl TryFrom<SubType> for IqType {
    type Error = SubType;

    fn try_from(other: SubType) -> Result<IqType, SubType> {
        Ok(match other {
            SubType::Get => IqType::Get,
            SubType::Set => IqType::Set,
            SubType::Result => IqType::Result,
            SubType::Error => IqType::Error,
            other => return Err(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names() {
        assert_eq!(Kind::from_name("message"), Kind::Message);
        assert_eq!(Kind::from_name("stream:error"), Kind::StreamError);
        assert_eq!(Kind::from_name("stream:features"), Kind::Unknown);
        assert_eq!(Kind::Iq.as_name(), Some("iq"));
        assert_eq!(Kind::Unknown.as_name(), None);
    }

    #[test]
    fn sub_type_is_case_insensitive() {
        assert_eq!(SubType::from_attr("GroupChat"), SubType::Groupchat);
        assert_eq!(SubType::from_attr("RESULT"), SubType::Result);
        assert_eq!(SubType::from_attr("bogus"), SubType::NotSet);
    }

    #[test]
    fn defaults_depend_on_kind() {
        assert_eq!(SubType::derive(Kind::Message, None), SubType::NotSet);
        assert_eq!(SubType::derive(Kind::Presence, None), SubType::Available);
        assert_eq!(SubType::derive(Kind::Iq, None), SubType::Get);
        assert_eq!(SubType::derive(Kind::StreamError, None), SubType::Normal);
        assert_eq!(SubType::derive(Kind::Iq, Some("set")), SubType::Set);
    }

    #[test]
    fn implied_subtypes_have_no_attribute() {
        assert_eq!(SubType::NotSet.as_attr(), None);
        assert_eq!(SubType::Available.as_attr(), None);
        assert_eq!(SubType::Unsubscribed.as_attr(), Some("unsubscribed"));
    }

    #[test]
    fn typed_views_reject_other_kinds() {
        assert_eq!(MessageType::try_from(SubType::NotSet), Ok(MessageType::Normal));
        assert_eq!(MessageType::try_from(SubType::Normal), Ok(MessageType::Normal));
        assert_eq!(MessageType::try_from(SubType::Get), Err(SubType::Get));
        assert_eq!(PresenceType::try_from(SubType::Chat), Err(SubType::Chat));
        assert_eq!(IqType::try_from(SubType::Result), Ok(IqType::Result));
        assert_eq!(IqType::try_from(SubType::Available), Err(SubType::Available));
        assert_eq!(SubType::from(PresenceType::Error), SubType::Error);
    }
}
