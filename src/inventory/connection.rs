//! Connection parameters attached to every resolved host.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::driver::{Driver, LocalDriver, SshDriver};

/// Port used for remote shell connections that do not name one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// How a host is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Commands run on the machine running the dashboard.
    #[default]
    Local,
    /// Commands run through an SSH session.
    RemoteShell,
}

impl Strategy {
    /// Returns the configuration keyword for this strategy.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Local => "local",
            Strategy::RemoteShell => "ssh",
        }
    }
}

/// Raw `connection` block as written in the configuration document.
///
/// Empty strings are treated the same as missing fields.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ConnectionBlock {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub private_key_passphrase: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Reasons a connection block cannot become a [`ConnectionSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionProblem {
    /// `type` is neither `ssh` nor `local`.
    UnknownType(String),
    /// Both `password` and `private_key_path` are set.
    ConflictingCredentials,
}

/// Resolved description of how to reach one host.
///
/// A spec is built once per inventory node and then cloned into every host
/// below that node, so each [`crate::inventory::Host`] owns its own copy.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionSpec {
    pub strategy: Strategy,
    pub username: Option<String>,
    pub password: Option<String>,
    pub private_key_path: Option<String>,
    pub private_key_passphrase: Option<String>,
    pub port: u16,
    pub target_host: String,
}

impl ConnectionSpec {
    /// A local connection with no credentials.
    pub fn local() -> Self {
        Self::default()
    }

    /// Build a spec from a raw block, applying the port default and the
    /// password/key exclusion rule.
    pub fn from_block(block: &ConnectionBlock) -> Result<Self, ConnectionProblem> {
        let strategy = match non_empty(&block.kind).as_deref() {
            None | Some("local") => Strategy::Local,
            Some("ssh") => Strategy::RemoteShell,
            Some(other) => return Err(ConnectionProblem::UnknownType(other.to_string())),
        };

        let mut spec = Self {
            strategy,
            username: non_empty(&block.username),
            password: non_empty(&block.password),
            private_key_path: non_empty(&block.private_key_path),
            private_key_passphrase: non_empty(&block.private_key_passphrase),
            port: block.port.unwrap_or(0),
            target_host: String::new(),
        };

        if spec.password.is_some() && spec.private_key_path.is_some() {
            return Err(ConnectionProblem::ConflictingCredentials);
        }

        if spec.strategy == Strategy::RemoteShell && spec.port == 0 {
            spec.port = DEFAULT_SSH_PORT;
        }

        Ok(spec)
    }

    /// Copy of this spec bound to a concrete host name.
    pub fn bound_to(&self, target_host: &str) -> Self {
        Self {
            target_host: target_host.to_string(),
            ..self.clone()
        }
    }

    /// Map this spec to an execution capability.
    ///
    /// No connection is opened here; the driver only does I/O when
    /// [`Driver::run`] is called.
    pub fn to_driver(&self) -> Arc<dyn Driver> {
        match self.strategy {
            Strategy::Local => Arc::new(LocalDriver::new()),
            Strategy::RemoteShell => Arc::new(
                SshDriver::new(self.target_host.clone(), self.port, self.username.clone())
                    .with_key(
                        self.private_key_path.clone(),
                        self.private_key_passphrase.clone(),
                    )
                    .with_password(self.password.clone()),
            ),
        }
    }
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("strategy", &self.strategy)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .field(
                "private_key_passphrase",
                &self.private_key_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("port", &self.port)
            .field("target_host", &self.target_host)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}
