//! The platform screenshot capability, consumed as an injected
//! collaborator. A failure means "no new data this time", never a fatal
//! condition.

use std::fmt;
use std::time::Duration;

use crate::logger;
use crate::types::Screenshot;

/// Delay before the single automatic retry.
pub const RETRY_DELAY_MS: u64 = 120;

/// Capture failed after any retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureError {
    pub reason: String,
}

impl CaptureError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capture failed: {}", self.reason)
    }
}

impl std::error::Error for CaptureError {}

/// "Give me the current viewport image" boundary.
pub trait CaptureService: Send {
    fn capture(&mut self) -> Result<Screenshot, CaptureError>;
}

/// Wraps a service with one automatic retry after a short fixed delay,
/// the contract the scheduler relies on.
pub struct RetryOnce<C> {
    inner: C,
}

impl<C: CaptureService> RetryOnce<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: CaptureService> CaptureService for RetryOnce<C> {
    fn capture(&mut self) -> Result<Screenshot, CaptureError> {
        match self.inner.capture() {
            Ok(shot) => Ok(shot),
            Err(first) => {
                logger::warn_p("capture", &format!("{}, retrying once", first));
                std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
                self.inner.capture()
            }
        }
    }
}
