// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `StreamEngine` is the boundary to whatever owns the socket
//!
//! The engine does TCP, TLS, XML framing, SASL and keep-alive. This crate
//! only hands it callbacks and stanza trees, and reacts to what it delivers.

use alloc::sync::Arc;
use core::fmt;

use jabber_stanza::StanzaNode;

use crate::config::Credentials;
use crate::Error;

/// Trait that must be extended by the error type of a StreamEngine impl
pub trait EngineError: core::error::Error + Sync + Send {}

/// Called exactly once with the outcome of an open or authenticate request.
pub type ResultHandler = Box<dyn FnOnce(bool) + Send>;

/// Called with every stanza tree the engine routes to it.
pub type NodeHandler = Arc<dyn Fn(StanzaNode) + Send + Sync>;

/// Called when the stream goes away.
pub type DisconnectHandler = Arc<dyn Fn(DisconnectReason) + Send + Sync>;

/// The stanza categories an engine routes to handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `<message/>`
    Message,
    /// `<presence/>`
    Presence,
    /// `<iq/>`
    Iq,
}

impl Category {
    /// All categories, in the order handlers are registered.
    pub const ALL: [Category; 3] = [Category::Message, Category::Presence, Category::Iq];
}

/// Why the stream went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// The application asked for it.
    Ok,
    /// The server stopped answering keep-alive pings.
    PingTimeOut,
    /// The peer hung up.
    Hup,
    /// Generic transport error.
    Error,
    /// Another client logged in with the same resource.
    ResourceConflict,
    /// The server sent XML that could not be parsed.
    InvalidXml,
    /// The TCP connection was reset.
    ConnectionReset,
    /// Anything else.
    Unknown,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            DisconnectReason::Ok => "closed",
            DisconnectReason::PingTimeOut => "ping timed out",
            DisconnectReason::Hup => "hang up",
            DisconnectReason::Error => "transport error",
            DisconnectReason::ResourceConflict => "resource conflict",
            DisconnectReason::InvalidXml => "invalid XML",
            DisconnectReason::ConnectionReset => "connection reset",
            DisconnectReason::Unknown => "unknown reason",
        })
    }
}

/// Everything a connection needs from the layer that owns the stream.
///
/// All methods take `&self`: engines are shared between the connection and
/// the I/O side and keep their own state behind interior mutability.
/// Callbacks may be invoked from any thread, and may be invoked before the
/// call that registered them returns.
///
/// A request the engine refuses outright is reported as `Err`; a request
/// that was accepted but then failed is reported as `false` through its
/// [`ResultHandler`].
pub trait StreamEngine: Send + Sync {
    /// Host name of the server to connect to.
    fn server(&self) -> String;
    /// Set the host name of the server to connect to.
    fn set_server(&self, server: &str);
    /// TCP port to connect to.
    fn port(&self) -> u16;
    /// Set the TCP port to connect to.
    fn set_port(&self, port: u16);
    /// Whether the stream is wrapped in TLS.
    fn use_tls(&self) -> bool;
    /// Enable or disable TLS.
    fn set_use_tls(&self, use_tls: bool);
    /// Whether SASL authentication has completed on the current stream.
    fn is_authenticated(&self) -> bool;

    /// Start opening the stream.
    fn open(&self, on_result: ResultHandler) -> Result<(), Error>;
    /// Open the stream, returning once it is open or has failed.
    fn open_blocking(&self) -> Result<bool, Error>;
    /// Close the stream.
    fn close(&self) -> Result<(), Error>;

    /// Start authenticating on an open stream.
    fn authenticate(&self, credentials: &Credentials, on_result: ResultHandler)
        -> Result<(), Error>;
    /// Authenticate, returning once authentication succeeded or failed.
    fn authenticate_blocking(&self, credentials: &Credentials) -> Result<bool, Error>;

    /// Write a stanza to the stream.
    fn send(&self, node: &StanzaNode) -> Result<(), Error>;
    /// Write a stanza and route the stanza whose `id` is `token` to `on_reply`.
    fn send_with_reply(
        &self,
        node: &StanzaNode,
        token: &str,
        on_reply: NodeHandler,
    ) -> Result<(), Error>;
    /// Write a stanza and wait for the stanza answering it.
    fn send_with_reply_blocking(&self, node: &StanzaNode) -> Result<StanzaNode, Error>;
    /// Write a string to the stream as is.
    fn send_raw(&self, text: &str) -> Result<(), Error>;

    /// Route every incoming stanza of `category` that does not answer a
    /// tracked request to `handler`.
    fn register_category_handler(&self, category: Category, handler: NodeHandler);
    /// Report the end of the stream to `handler`.
    fn set_disconnect_handler(&self, handler: DisconnectHandler);
}
