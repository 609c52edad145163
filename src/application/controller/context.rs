use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};

use crate::application::error::ControllerError;

/// Per-request context carried into every controller operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
}

impl OpContext {
    /// Context without a deadline.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// Tighten the deadline to at most `timeout` from now.
    pub fn shorten(self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(current) if current <= candidate => current,
            _ => candidate,
        };
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= Instant::now())
    }

    /// Await `fut` unless the deadline passes first.
    pub(crate) async fn guard<F>(&self, op: &'static str, fut: F) -> Result<F::Output, ControllerError>
    where
        F: Future,
    {
        match self.deadline {
            None => Ok(fut.await),
            Some(_) if self.is_expired() => Err(ControllerError::deadline(op)),
            Some(deadline) => timeout_at(deadline, fut)
                .await
                .map_err(|_| ControllerError::deadline(op)),
        }
    }
}
