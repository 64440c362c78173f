//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::CounselError;

/// Wrap a fallible future with a deadline.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, CounselError>>,
) -> Result<T, CounselError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(CounselError::Timeout(duration.as_millis() as u64)),
    }
}
