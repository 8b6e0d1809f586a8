// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Provides an error type for this crate.

use core::{error::Error as StdError, fmt};

use crate::Kind;

/// Our main error type.
#[derive(Debug)]
pub enum Error {
    /// A `to` or `from` attribute did not hold a valid Jabber-Id.
    JidParse(jid::Error),

    /// A stanza was converted into a typed view of another kind.
    WrongKind {
        /// The kind the conversion asked for.
        expected: Kind,
        /// The kind the stanza actually has.
        found: Kind,
    },

    /// An element name, attribute key or prefix is not a valid XML name, or
    /// uses a prefix that was never declared.
    InvalidName(String),

    /// minidom refused to build, parse or write a tree.
    Xml(minidom::Error),
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::JidParse(e) => Some(e),
            Error::WrongKind { .. } | Error::InvalidName(_) => None,
            Error::Xml(e) => Some(e),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::JidParse(e) => write!(fmt, "jid parse error: {}", e),
            Error::WrongKind { expected, found } => {
                write!(fmt, "expected a {} stanza, found {}", expected, found)
            }
            Error::InvalidName(name) => write!(fmt, "invalid XML name: {:?}", name),
            Error::Xml(e) => write!(fmt, "XML error: {}", e),
        }
    }
}

impl From<jid::Error> for Error {
    fn from(err: jid::Error) -> Error {
        Error::JidParse(err)
    }
}

impl From<minidom::Error> for Error {
    fn from(err: minidom::Error) -> Error {
        Error::Xml(err)
    }
}

/// Our simplified Result type.
pub type Result<T> = ::core::result::Result<T, Error>;
