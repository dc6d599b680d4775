//! Retry with exponential backoff for collaborator HTTP calls

use reqwest::Response;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Run `operation` up to `max_retries + 1` times
///
/// Waits 1s, 2s, 4s, ... between attempts. Only errors for which `retryable`
/// returns true are retried; the last error is returned.
pub async fn retry_request<F, Fut, T>(
    label: &str,
    max_retries: u32,
    retryable: fn(&Error) -> bool,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_base_delay(label, max_retries, Duration::from_secs(1), retryable, operation).await
}

/// Transport failures, timeouts, 429 and 5xx responses are worth retrying
///
/// Status errors only arrive here as `Error::Http` when the client turned the
/// response into an error with `error_for_status`.
pub fn is_transient(error: &Error) -> bool {
    match error {
        Error::Http(e) => match e.status() {
            Some(status) => status.is_server_error() || status.as_u16() == 429,
            None => e.is_timeout() || e.is_connect() || e.is_request(),
        },
        _ => false,
    }
}

/// Pass successful responses through and turn failures into errors
///
/// 429 and 5xx become `Error::Http` (retryable); any other failure status is
/// wrapped with `wrap` together with the response body.
pub async fn check_status(response: Response, wrap: fn(String) -> Error) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.is_server_error() || status.as_u16() == 429 {
        return response.error_for_status().map_err(Error::Http);
    }

    let body = response.text().await.unwrap_or_default();
    Err(wrap(format!("HTTP {} - {}", status, body)))
}

async fn retry_with_base_delay<F, Fut, T>(
    label: &str,
    max_retries: u32,
    base_delay: Duration,
    retryable: fn(&Error) -> bool,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && retryable(&e) => {
                let delay = base_delay * 2u32.pow(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    label,
                    attempt + 1,
                    max_retries + 1,
                    delay,
                    e
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
