//! Runs blocking engine work off the async runtime.
//!
//! A job waits for an engine permit, runs on the blocking pool, and is bounded by the request
//! timeout. The job's [`CancellationToken`] fires when the timeout elapses or the request future
//! is dropped; the job observes it between steps. The permit stays held until the blocking
//! work actually returns.

use imgserve_core::AppError;
use imgserve_processing::OperationError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub async fn run_engine_job<T, F>(
    permits: &Arc<Semaphore>,
    timeout: Duration,
    job: F,
) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> Result<T, OperationError> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let work = async {
        let permit = Arc::clone(permits)
            .acquire_owned()
            .await
            .map_err(|_| AppError::Internal("engine permits closed".to_string()))?;
        let token = cancel.clone();

        let joined = tokio::task::spawn_blocking(move || {
            let result = job(&token);
            drop(permit);
            result
        })
        .await;

        match joined {
            Ok(result) => result.map_err(AppError::from),
            Err(join_error) => Err(AppError::from(
                anyhow::Error::new(join_error).context("image worker task failed"),
            )),
        }
    };

    match tokio::time::timeout(timeout, work).await {
        Ok(result) => result,
        Err(_) => {
            cancel.cancel();
            tracing::warn!(timeout_secs = timeout.as_secs(), "Image operation timed out");
            Err(AppError::Timeout(format!(
                "Image operation exceeded {}s",
                timeout.as_secs()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgserve_core::ErrorMetadata;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_job_result_is_returned() {
        let permits = Arc::new(Semaphore::new(1));
        let value = run_engine_job(&permits, Duration::from_secs(5), |_| Ok(7))
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn test_operation_error_is_mapped() {
        let permits = Arc::new(Semaphore::new(1));
        let err = run_engine_job::<(), _>(&permits, Duration::from_secs(5), |_| {
            Err(OperationError::InvalidParameter("width".into()))
        })
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[tokio::test]
    async fn test_timeout_cancels_job() {
        let permits = Arc::new(Semaphore::new(1));
        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);

        let err = run_engine_job::<(), _>(&permits, Duration::from_millis(50), move |cancel| {
            let deadline = std::time::Instant::now() + Duration::from_secs(5);
            while std::time::Instant::now() < deadline {
                if cancel.is_cancelled() {
                    flag.store(true, Ordering::SeqCst);
                    return Err(OperationError::Cancelled);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        })
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), "TIMEOUT");
        let permit = permits.acquire().await.unwrap();
        drop(permit);
        assert!(observed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_job_is_internal_error() {
        let permits = Arc::new(Semaphore::new(1));
        let err = run_engine_job::<(), _>(&permits, Duration::from_secs(5), |_| {
            panic!("decoder exploded")
        })
        .await
        .unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert_eq!(permits.available_permits(), 1);
    }
}
