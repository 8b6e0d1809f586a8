// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Envelope, Kind, PresenceType};

/// A `<presence/>` stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence(pub(crate) Envelope);

impl Presence {
    /// Create a presence with a fresh id. `PresenceType::Available` leaves
    /// the `type` attribute out.
    pub fn new(to: Option<&str>, type_: PresenceType) -> Presence {
        Presence(Envelope::build(to, Kind::Presence, type_.into()))
    }

    /// The presence type, or `None` if the recorded subtype belongs to
    /// another kind of stanza.
    pub fn presence_type(&self) -> Option<PresenceType> {
        PresenceType::try_from(self.sub_type()).ok()
    }

    /// Text of the `<show/>` child (`away`, `chat`, `dnd` or `xa`).
    pub fn show(&self) -> Option<&str> {
        self.node().child("show").and_then(|child| child.value())
    }

    /// Text of the `<status/>` child.
    pub fn status(&self) -> Option<&str> {
        self.node().child("status").and_then(|child| child.value())
    }

    /// The `<priority/>` child, if present and in range.
    pub fn priority(&self) -> Option<i8> {
        self.node()
            .child("priority")
            .and_then(|child| child.value())
            .and_then(|value| value.trim().parse().ok())
    }
}
