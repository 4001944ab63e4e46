use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// How often, and how patiently, a compensating action is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between two consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Retry without pausing. Meant for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    #[error("{operation} was aborted: {reason}")]
    Aborted { operation: String, reason: String },
}

/// Runs fallible actions with a bounded number of attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `action` until it succeeds or the policy gives up.
    /// Returns the number of attempts it took.
    pub async fn run<F, Fut, E>(&self, operation: &str, mut action: F) -> Result<u32, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match action().await {
                Ok(()) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Retried operation succeeded");
                    }
                    return Ok(attempt);
                }
                Err(err) => {
                    warn!(operation, attempt, max_attempts, error = %err, "Attempt failed");
                    last_error = err.to_string();
                    if attempt < max_attempts && !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        error!(operation, attempts = max_attempts, error = %last_error, "Giving up");
        Err(RetryError::Exhausted {
            operation: operation.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }

    /// Run `action` on a background task. The caller is not made to wait;
    /// `held` (typically a lock guard) is kept alive until the task ends.
    pub fn spawn<F, Fut, E, H>(&self, operation: impl Into<String>, held: H, action: F) -> RetryHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
        H: Send + 'static,
    {
        let executor = *self;
        let operation = operation.into();
        let task_operation = operation.clone();

        let handle = tokio::spawn(async move {
            let _held = held;
            executor.run(&task_operation, action).await
        });

        RetryHandle { operation, handle }
    }
}

/// Completion signal of a spawned retry task.
#[derive(Debug)]
pub struct RetryHandle {
    operation: String,
    handle: JoinHandle<Result<u32, RetryError>>,
}

impl RetryHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> Result<u32, RetryError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_err) => Err(RetryError::Aborted {
                operation: self.operation,
                reason: join_err.to_string(),
            }),
        }
    }
}
