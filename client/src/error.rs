// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::error::Error as StdError;
use std::fmt;

use crate::engine::{DisconnectReason, EngineError};
use crate::lifecycle::LifecycleKind;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// An open or authenticate request is still waiting for its completion
    OperationInFlight(LifecycleKind),
    /// A request with this token is already waiting for its reply
    DuplicateToken(String),
    /// Error specific to the StreamEngine impl
    Engine(Box<dyn EngineError>),
    /// Error from the stanza model
    Stanza(jabber_stanza::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OperationInFlight(kind) => {
                write!(fmt, "{} request already in progress", kind)
            }
            Error::DuplicateToken(token) => {
                write!(fmt, "a reply to {:?} is already being waited for", token)
            }
            Error::Engine(e) => write!(fmt, "engine error: {}", e),
            Error::Stanza(e) => write!(fmt, "stanza error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Stanza(e) => Some(e),
            Error::OperationInFlight(_) | Error::DuplicateToken(_) | Error::Engine(_) => None,
        }
    }
}

impl<T: EngineError + 'static> From<T> for Error {
    fn from(e: T) -> Self {
        Error::Engine(Box::new(e))
    }
}

impl From<jabber_stanza::Error> for Error {
    fn from(e: jabber_stanza::Error) -> Self {
        Error::Stanza(e)
    }
}

/// Why a tracked request will never see its reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFailure {
    /// The application closed the connection.
    Closed,
    /// The stream went away.
    Disconnected(DisconnectReason),
    /// The connection was dropped before a reply arrived.
    ///
    /// Only [`ReplyToken`][`crate::ReplyToken`] observes this: plain handlers
    /// are dropped along with the connection.
    LostConnection,
}

impl fmt::Display for ReplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReplyFailure::Closed => f.write_str("connection closed before the reply arrived"),
            ReplyFailure::Disconnected(reason) => {
                write!(f, "disconnected before the reply arrived: {}", reason)
            }
            ReplyFailure::LostConnection => {
                f.write_str("connection dropped while waiting for the reply")
            }
        }
    }
}

impl StdError for ReplyFailure {}
