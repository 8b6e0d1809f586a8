// Copyright (c) 2026 jabber-rs contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

use jabber_stanza::jid::Jid;

use crate::Error;

/// Standard client-to-server port.
pub const DEFAULT_PORT: u16 = 5222;

/// Where and how to connect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionConfig {
    /// Host name of the server.
    pub server: String,
    /// TCP port, [`DEFAULT_PORT`] unless set.
    pub port: u16,
    /// Wrap the stream in TLS.
    pub use_tls: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            port: DEFAULT_PORT,
            use_tls: false,
        }
    }
}

impl ConnectionConfig {
    /// Connect to `server` on the default port, without TLS.
    pub fn new(server: impl AsRef<str>) -> Self {
        Self {
            server: server.as_ref().into(),
            ..Self::default()
        }
    }

    /// Builder-style port setter.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder-style TLS setter.
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }
}

/// What to authenticate with.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credentials {
    /// Local part of the account's Jabber-Id.
    pub username: String,
    /// Account password, never printed by `Debug`.
    pub password: String,
    /// Resource to bind.
    pub resource: String,
}

impl Credentials {
    /// Bundle up a username, password and resource.
    pub fn new(
        username: impl AsRef<str>,
        password: impl AsRef<str>,
        resource: impl AsRef<str>,
    ) -> Self {
        Self {
            username: username.as_ref().into(),
            password: password.as_ref().into(),
            resource: resource.as_ref().into(),
        }
    }

    /// The full Jabber-Id these credentials bind to on `server`.
    pub fn jid(&self, server: &str) -> Result<Jid, Error> {
        let jid = format!("{}@{}/{}", self.username, server, self.resource);
        Jid::new(&jid).map_err(|e| Error::Stanza(e.into()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("resource", &self.resource)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.server, "");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.use_tls);

        let config = ConnectionConfig::new("capulet.example")
            .with_port(5223)
            .with_tls(true);
        assert_eq!(config.server, "capulet.example");
        assert_eq!(config.port, 5223);
        assert!(config.use_tls);
    }

    #[test]
    fn password_is_redacted() {
        let credentials = Credentials::new("juliet", "r0m30", "balcony");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("juliet"));
        assert!(debug.contains("balcony"));
        assert!(!debug.contains("r0m30"));
    }

    #[test]
    fn full_jid() {
        let credentials = Credentials::new("juliet", "r0m30", "balcony");
        let jid = credentials.jid("capulet.example").unwrap();
        assert_eq!(jid.to_string(), "juliet@capulet.example/balcony");

        let credentials = Credentials::new("", "r0m30", "balcony");
        assert!(matches!(
            credentials.jid("capulet.example"),
            Err(Error::Stanza(jabber_stanza::Error::JidParse(_)))
        ));
    }
}
