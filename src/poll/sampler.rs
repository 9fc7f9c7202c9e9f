//! Taking one sample of a metric on a host.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::driver::{Driver, DriverError};
use crate::inspector::{InspectError, Inspector, Reading};

/// Why a single sample failed. Recorded in the cell and retried next tick.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PollError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Inspect(#[from] InspectError),
}

/// Produces one reading per call.
#[async_trait]
pub trait Sampler: Send + Sync {
    async fn sample(&self) -> Result<Reading, PollError>;
}

/// Runs an inspector's command through a driver and parses the output.
#[derive(Debug, Clone)]
pub struct InspectorSampler {
    driver: Arc<dyn Driver>,
    inspector: Arc<dyn Inspector>,
    deadline: Duration,
}

impl InspectorSampler {
    pub fn new(driver: Arc<dyn Driver>, inspector: Arc<dyn Inspector>, deadline: Duration) -> Self {
        Self {
            driver,
            inspector,
            deadline,
        }
    }
}

#[async_trait]
impl Sampler for InspectorSampler {
    async fn sample(&self) -> Result<Reading, PollError> {
        let output = self.driver.run(self.inspector.command(), self.deadline).await?;
        Ok(self.inspector.parse(&output)?)
    }
}
