//! Remote command execution over SSH.
//!
//! Commands are run through the system `ssh` client, one process per
//! command. When the host carries a password, or a passphrase for its
//! private key, the client is wrapped in `sshpass` which answers the prompt
//! from the `SSHPASS` environment variable.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::{run_command, Driver, DriverError};
use crate::inventory::DEFAULT_SSH_PORT;

/// Seconds `ssh` waits for the TCP connection before giving up.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Prompt `sshpass` waits for when unlocking a private key.
const PASSPHRASE_PROMPT: &str = "passphrase";

/// Whether `sshpass` is installed, checked once per process.
static SSHPASS_AVAILABLE: OnceCell<bool> = OnceCell::const_new();

async fn sshpass_available() -> bool {
    *SSHPASS_AVAILABLE
        .get_or_init(|| async {
            Command::new("sshpass")
                .arg("-V")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .is_ok()
        })
        .await
}

/// Secret that has to be typed into an interactive `ssh` prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Secret<'a> {
    Password(&'a str),
    Passphrase(&'a str),
}

/// Runs commands on a remote host through `ssh`.
pub struct SshDriver {
    host: String,
    port: u16,
    username: Option<String>,
    identity_file: Option<String>,
    passphrase: Option<String>,
    password: Option<String>,
}

impl SshDriver {
    pub fn new(host: String, port: u16, username: Option<String>) -> Self {
        Self {
            host,
            port,
            username,
            identity_file: None,
            passphrase: None,
            password: None,
        }
    }

    /// Authenticate with a private key, optionally protected by a passphrase.
    pub fn with_key(mut self, identity_file: Option<String>, passphrase: Option<String>) -> Self {
        self.identity_file = identity_file;
        self.passphrase = passphrase;
        self
    }

    /// Authenticate with a password.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// `user@host`, or just `host` when no user is configured.
    pub fn destination(&self) -> String {
        match self.username {
            Some(ref user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    fn secret(&self) -> Option<Secret<'_>> {
        match (&self.password, &self.passphrase) {
            (Some(password), _) => Some(Secret::Password(password)),
            (None, Some(passphrase)) => Some(Secret::Passphrase(passphrase)),
            (None, None) => None,
        }
    }

    /// Build the `ssh` invocation for `command`.
    ///
    /// A configured secret is never dropped: without `sshpass` to type it,
    /// the command is refused instead of falling back to key-only login.
    fn build(
        &self,
        command: &str,
        sshpass_available: bool,
    ) -> Result<(Command, &'static str), DriverError> {
        let (mut cmd, program) = match self.secret() {
            Some(secret) if !sshpass_available => {
                let reason = match secret {
                    Secret::Password(_) => "required for password login",
                    Secret::Passphrase(_) => "required to unlock the private key",
                };
                return Err(DriverError::Spawn {
                    program: "sshpass".to_string(),
                    reason: reason.to_string(),
                });
            }
            Some(secret) => {
                let mut cmd = Command::new("sshpass");
                let value = match secret {
                    Secret::Password(password) => password,
                    Secret::Passphrase(passphrase) => {
                        cmd.arg("-P").arg(PASSPHRASE_PROMPT);
                        passphrase
                    }
                };
                cmd.arg("-e").arg("ssh");
                cmd.env("SSHPASS", value);
                (cmd, "sshpass")
            }
            None => {
                let mut cmd = Command::new("ssh");
                cmd.arg("-o").arg("BatchMode=yes");
                (cmd, "ssh")
            }
        };

        cmd.arg("-o").arg("StrictHostKeyChecking=no");
        cmd.arg("-o").arg(format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS));

        if self.port != DEFAULT_SSH_PORT && self.port != 0 {
            cmd.arg("-p").arg(self.port.to_string());
        }
        if let Some(ref key) = self.identity_file {
            cmd.arg("-i").arg(key);
        }

        cmd.arg(self.destination());
        cmd.arg(command);
        Ok((cmd, program))
    }
}

#[async_trait]
impl Driver for SshDriver {
    async fn run(&self, command: &str, deadline: Duration) -> Result<String, DriverError> {
        let sshpass = match self.secret() {
            Some(_) => sshpass_available().await,
            None => false,
        };
        let (cmd, program) = self.build(command, sshpass)?;
        run_command(cmd, program, deadline).await
    }

    fn kind(&self) -> &'static str {
        "ssh"
    }
}

impl std::fmt::Debug for SshDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshDriver")
            .field("destination", &self.destination())
            .field("port", &self.port)
            .field("identity_file", &self.identity_file)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
