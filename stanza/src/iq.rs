// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Envelope, IqType, Kind, SubType};

/// An `<iq/>` stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iq(pub(crate) Envelope);

impl Iq {
    /// Create an IQ with a fresh id. The `type` attribute is always written.
    pub fn new(to: Option<&str>, type_: IqType) -> Iq {
        Iq(Envelope::build(to, Kind::Iq, type_.into()))
    }

    /// Create a `type='get'` IQ carrying an empty `<query/>` in namespace
    /// `xmlns`.
    pub fn query(to: Option<&str>, xmlns: &str) -> Iq {
        let mut iq = Iq::new(to, IqType::Get);
        iq.set_xmlns(xmlns);
        iq
    }

    /// The IQ type, or `None` if the recorded subtype belongs to another
    /// kind of stanza.
    pub fn iq_type(&self) -> Option<IqType> {
        IqType::try_from(self.sub_type()).ok()
    }

    /// Namespace of the first `<query/>` in the tree.
    pub fn xmlns(&self) -> Option<&str> {
        self.node()
            .find_child("query")
            .and_then(|query| query.attribute("xmlns"))
    }

    /// Set the namespace of the `<query/>` child, creating the child on
    /// first use.
    pub fn set_xmlns(&mut self, xmlns: &str) {
        let node = self.node_mut();
        match node.find_child_mut("query") {
            Some(query) => query.set_attribute("xmlns", xmlns),
            None => {
                node.add_child("query", None).set_attribute("xmlns", xmlns);
            }
        }
    }

    /// Build the empty `type='result'` reply to this request: same id,
    /// addressed back to the sender.
    pub fn make_result(&self) -> Iq {
        let mut reply = Iq(Envelope::build(self.from(), Kind::Iq, SubType::Result));
        match self.id() {
            Some(id) => reply.set_id(id),
            None => {
                reply.node_mut().remove_attribute("id");
            }
        }
        if let Some(to) = self.to() {
            reply.set_from(to);
        }
        reply
    }
}
