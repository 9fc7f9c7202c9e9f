//! Local command execution.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::{run_command, Driver, DriverError};

/// Runs commands on the machine hosting the dashboard.
#[derive(Debug, Clone, Default)]
pub struct LocalDriver;

impl LocalDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for LocalDriver {
    async fn run(&self, command: &str, deadline: Duration) -> Result<String, DriverError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        run_command(cmd, "sh", deadline).await
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
