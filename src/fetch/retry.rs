// src/fetch/retry.rs

use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};
use url::Url;

use super::transport::{HttpResponse, Transport, TransportError};

/// Statuses PubChem uses for throttling and transient server trouble.
pub const RETRY_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Statuses whose `Retry-After` header is honoured.
pub const RETRY_AFTER_STATUSES: &[u16] = &[429, 503];

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each one after.
    pub backoff_base: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(3),
            retry_statuses: RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    pub fn is_retry_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.backoff_base.saturating_mul(factor)
    }

    /// Backoff for retry `retry`, stretched to the server's `Retry-After`
    /// when the response carries one.
    pub fn delay_for(&self, retry: u32, resp: Option<&HttpResponse>) -> Duration {
        let backoff = self.backoff(retry);
        match resp {
            Some(HttpResponse {
                status,
                retry_after: Some(wait),
                ..
            }) if RETRY_AFTER_STATUSES.contains(status) => backoff.max(*wait),
            _ => backoff,
        }
    }
}

/// GET `url`, retrying throttling/server statuses and transient transport
/// failures with exponential backoff (or longer, if the server asks via
/// `Retry-After`).
///
/// When retries run out on a status, that last response is returned so the
/// caller can still inspect it; when they run out on a transport failure the
/// error is returned.
pub async fn get_with_retry<T: Transport + ?Sized>(
    transport: &T,
    url: &Url,
    policy: &RetryPolicy,
) -> Result<HttpResponse, TransportError> {
    let mut retries = 0;
    loop {
        let outcome = transport.get(url).await;
        let retryable = match &outcome {
            Ok(resp) => policy.is_retry_status(resp.status),
            Err(e) => e.is_transient(),
        };
        if !retryable {
            return outcome;
        }
        if retries >= policy.max_retries {
            match &outcome {
                Ok(resp) => error!(%url, status = resp.status, attempts = retries + 1, "Exhausted retries"),
                Err(e) => error!(%url, error = %e, attempts = retries + 1, "Exhausted retries"),
            }
            return outcome;
        }

        retries += 1;
        let delay = policy.delay_for(retries, outcome.as_ref().ok());
        match &outcome {
            Ok(resp) => {
                warn!(%url, attempt = retries, delay_ms = delay.as_millis() as u64, status = resp.status, "Retrying")
            }
            Err(e) => {
                warn!(%url, attempt = retries, delay_ms = delay.as_millis() as u64, error = %e, "Retrying")
            }
        }
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{not_found, ok, server_error, throttled, ScriptedTransport};
    use tokio::time::Instant;

    fn url() -> Url {
        Url::parse("https://example.test/compound/cid/702/property/SMILES/JSON").unwrap()
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(3));
        assert_eq!(policy.backoff(2), Duration::from_secs(6));
        assert_eq!(policy.backoff(3), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_server_errors() {
        let transport = ScriptedTransport::new(vec![server_error(503), server_error(500), ok("{}")]);
        let start = Instant::now();

        let resp = get_with_retry(&transport, &url(), &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_retry_after_when_longer() {
        let transport = ScriptedTransport::new(vec![
            throttled(429, Duration::from_secs(30)),
            throttled(503, Duration::from_secs(1)),
            ok("{}"),
        ]);
        let start = Instant::now();

        let resp = get_with_retry(&transport, &url(), &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(transport.calls(), 3);
        // 30s requested, then the 6s backoff beats the 1s request
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(36));
        assert!(elapsed < Duration::from_secs(37));
    }

    #[test]
    fn retry_after_only_for_throttling_statuses() {
        let policy = RetryPolicy::default();
        let long = Duration::from_secs(60);
        let busy = HttpResponse {
            status: 503,
            body: String::new(),
            retry_after: Some(long),
        };
        let broken = HttpResponse {
            status: 500,
            ..busy.clone()
        };
        assert_eq!(policy.delay_for(1, Some(&busy)), long);
        assert_eq!(policy.delay_for(1, Some(&broken)), Duration::from_secs(3));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_client_errors() {
        let transport = ScriptedTransport::new(vec![not_found(), ok("{}")]);

        let resp = get_with_retry(&transport, &url(), &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(resp.status, 404);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let transport = ScriptedTransport::new(vec![
            server_error(500),
            server_error(500),
            server_error(500),
            Err(TransportError::Timeout("operation timed out".into())),
            ok("{}"),
        ]);

        let err = get_with_retry(&transport, &url(), &RetryPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Timeout(_)));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_status_when_exhausted() {
        let policy = RetryPolicy {
            max_retries: 1,
            backoff_base: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        let transport = ScriptedTransport::new(vec![server_error(429), server_error(429)]);

        let resp = get_with_retry(&transport, &url(), &policy).await.unwrap();

        assert_eq!(resp.status, 429);
        assert_eq!(transport.calls(), 2);
    }
}
