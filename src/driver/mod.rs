//! Execution backends for running sampling commands on hosts.
//!
//! A [`Driver`] runs a shell command on one host and returns its standard
//! output. Two implementations exist:
//!
//! - [`LocalDriver`]: runs the command with `sh -c` on this machine
//! - [`SshDriver`]: runs the command through the system `ssh` client
//!
//! Creating a driver never performs I/O; processes are only spawned when
//! [`Driver::run`] is awaited.

mod local;
mod ssh;

pub use local::LocalDriver;
pub use ssh::SshDriver;

use std::fmt::Debug;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors returned by a driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The process could not be started.
    #[error("Failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The command ran but exited unsuccessfully.
    #[error("Command failed ({status}): {stderr}")]
    Failed { status: String, stderr: String },

    /// The command did not finish before its deadline.
    #[error("Command timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The command printed something that is not UTF-8.
    #[error("Invalid UTF-8 in command output: {0}")]
    Encoding(String),
}

/// Capability to execute a command against one host.
#[async_trait]
pub trait Driver: Send + Sync + Debug {
    /// Run `command` and return its standard output.
    ///
    /// The child process is killed if it is still running when `deadline`
    /// elapses or when the returned future is dropped.
    async fn run(&self, command: &str, deadline: Duration) -> Result<String, DriverError>;

    /// Short label for the transport (`local`, `ssh`).
    fn kind(&self) -> &'static str;
}

/// Spawn a prepared command and collect its output within `deadline`.
async fn run_command(
    mut cmd: Command,
    program: &str,
    deadline: Duration,
) -> Result<String, DriverError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(deadline, cmd.output()).await {
        Ok(Ok(output)) => {
            if output.status.success() {
                String::from_utf8(output.stdout).map_err(|e| DriverError::Encoding(e.to_string()))
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(DriverError::Failed {
                    status: output.status.to_string(),
                    stderr: stderr.trim().to_string(),
                })
            }
        }
        Ok(Err(e)) => Err(DriverError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(DriverError::Timeout(deadline)),
    }
}
