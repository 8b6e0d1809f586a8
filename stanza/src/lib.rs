// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Typed model of [XMPP](https://xmpp.org/) stanzas.
//!
//! Every stanza is an owned [`StanzaNode`] tree, classified by its root name
//! into a [`Kind`] and by its `type` attribute into a [`SubType`]. The
//! [`Stanza`] union carries that classification, and [`Message`],
//! [`Presence`] and [`Iq`] give typed access to the parts a client cares
//! about.
//!
//! ```
//! use jabber_stanza::{Iq, IqType, Stanza, SubType};
//!
//! let mut iq = Iq::new(Some("capulet.example"), IqType::Get);
//! iq.set_xmlns("jabber:iq:version");
//!
//! let stanza = Stanza::from(iq);
//! assert_eq!(stanza.sub_type(), SubType::Get);
//! assert!(stanza.id().is_some());
//! ```

#![deny(unsafe_code, missing_docs, bare_trait_objects)]

mod error;
mod iq;
mod kind;
mod message;
pub mod node;
mod presence;
mod stanza;

pub use crate::error::{Error, Result};
pub use crate::iq::Iq;
pub use crate::kind::{IqType, Kind, MessageType, PresenceType, SubType};
pub use crate::message::Message;
pub use crate::node::StanzaNode;
pub use crate::presence::Presence;
pub use crate::stanza::{make_id, Envelope, Stanza};

// Re-exports
pub use jid;
pub use minidom;
