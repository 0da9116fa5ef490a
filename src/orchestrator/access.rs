//! Cacheable Data Access Module
//!
//! Get-or-populate: read through the orchestrator and only go to the origin
//! when nothing is cached at all.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::orchestrator::{CacheContext, CacheResult, CacheStatus};
use crate::record::{Body, CacheRequest, Headers};

// == Origin Response ==
/// Data returned by an origin fetch function.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginResponse {
    pub body: Body,
    pub headers: Headers,
    pub status_code: u16,
}

impl OriginResponse {
    pub fn new(status_code: u16, body: impl Into<Body>) -> Self {
        Self {
            body: body.into(),
            headers: Headers::new(),
            status_code,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Only 2xx responses are written through.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

// == Cacheable Data Access ==
#[derive(Debug, Clone)]
pub struct CacheableDataAccess {
    context: Arc<CacheContext>,
}

impl CacheableDataAccess {
    pub fn new(context: Arc<CacheContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<CacheContext> {
        &self.context
    }

    /// Returns cached data for `request`, calling `fetch(args)` on a miss.
    ///
    /// Only a `NO_CACHE` read goes to the origin; `CACHE_ERROR` results are
    /// returned as they are. A failed write-through is logged and the origin
    /// data is still returned. A failed origin fetch falls back to stale
    /// data, or an empty `CACHE_ERROR` record.
    pub async fn get_data<F, Fut, A>(
        &self,
        request: CacheRequest,
        fetch: F,
        args: A,
    ) -> Result<CacheResult>
    where
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<OriginResponse>>,
    {
        let mut orchestrator = self.context.orchestrator(request);
        let cached = orchestrator.read().await?;
        if cached.status != CacheStatus::NoCache {
            return Ok(cached);
        }

        let origin = match fetch(args).await {
            Ok(origin) => origin,
            Err(err) => {
                warn!(id_hash = %orchestrator.id_hash(), error = %err, "Origin fetch failed");
                return Ok(orchestrator.fall_back_to_stale());
            }
        };

        let cacheable = origin.is_success();
        let status_code = origin.status_code;
        let record =
            orchestrator.prepare(origin.body, &origin.headers, status_code.to_string())?;

        if cacheable {
            match orchestrator.store(&record).await {
                Ok(_) => {}
                Err(CacheError::Transport(message)) => {
                    warn!(id_hash = %record.id_hash, error = %message, "Write-through failed");
                }
                Err(err) => return Err(err),
            }
        } else {
            debug!(
                id_hash = %record.id_hash,
                status_code,
                "Origin response not cached"
            );
        }

        Ok(orchestrator.resolve(CacheStatus::NoCache, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::backend::InMemoryBackend;
    use crate::config::Config;
    use crate::record::{CacheProfile, Connection, Expiration};

    struct Fixture {
        access: CacheableDataAccess,
        primary: Arc<InMemoryBackend>,
        calls: Arc<AtomicUsize>,
    }

    fn fixture() -> Fixture {
        let primary = Arc::new(InMemoryBackend::new("primary"));
        let context = CacheContext::builder(Config::default())
            .primary(primary.clone())
            .secondary(Arc::new(InMemoryBackend::new("secondary")))
            .build()
            .unwrap();
        Fixture {
            access: CacheableDataAccess::new(Arc::new(context)),
            primary,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn request() -> CacheRequest {
        CacheRequest::new(
            Connection::new("api.example.com", "/scores").with_parameter("week", "3"),
            CacheProfile::new("scores", Expiration::Ttl(120)),
        )
    }

    async fn origin(args: (Arc<AtomicUsize>, u16)) -> Result<OriginResponse> {
        let (calls, status) = args;
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(OriginResponse::new(status, "fresh").with_header("Content-Type", "text/plain"))
    }

    async fn failing_origin(calls: Arc<AtomicUsize>) -> Result<OriginResponse> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Origin("upstream timed out".into()))
    }

    #[tokio::test]
    async fn test_miss_fetches_and_writes_through() {
        let f = fixture();
        let result = f
            .access
            .get_data(request(), origin, (f.calls.clone(), 200))
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::NoCache);
        assert_eq!(result.record.body, Body::from("fresh"));
        assert_eq!(result.record.headers["content-type"], "text/plain");
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.primary.put_count(), 1);
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let f = fixture();
        f.access
            .get_data(request(), origin, (f.calls.clone(), 200))
            .await
            .unwrap();

        let second = f
            .access
            .get_data(request(), origin, (f.calls.clone(), 200))
            .await
            .unwrap();
        assert_eq!(second.status, CacheStatus::Cache);
        assert_eq!(second.record.body, Body::from("fresh"));

        let third = f
            .access
            .get_data(request(), origin, (f.calls.clone(), 200))
            .await
            .unwrap();
        assert_eq!(third.status, CacheStatus::CacheInMem);
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_success_is_returned_but_not_stored() {
        let f = fixture();
        let result = f
            .access
            .get_data(request(), origin, (f.calls.clone(), 503))
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::NoCache);
        assert_eq!(result.record.status_code, "503");
        assert_eq!(f.primary.put_count(), 0);
    }

    #[tokio::test]
    async fn test_success_status_decides_write_through() {
        let f = fixture();
        let result = f
            .access
            .get_data(request(), origin, (f.calls.clone(), 204))
            .await
            .unwrap();
        assert_eq!(result.record.status_code, "204");
        assert_eq!(f.primary.put_count(), 1);

        let f = fixture();
        f.access
            .get_data(request(), origin, (f.calls.clone(), 304))
            .await
            .unwrap();
        assert_eq!(f.primary.put_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_through_still_returns_data() {
        let f = fixture();
        let req = request();
        // let the read see an empty store, then fail the write
        let access = f.access.clone();
        let primary = f.primary.clone();
        let result = access
            .get_data(
                req,
                |calls: Arc<AtomicUsize>| async move {
                    primary.set_unavailable(true);
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(OriginResponse::new(200, "fresh"))
                },
                f.calls.clone(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::NoCache);
        assert_eq!(result.record.body, Body::from("fresh"));
        assert_eq!(f.primary.put_count(), 1);
        assert!(f.primary.is_empty().await);
    }

    #[tokio::test]
    async fn test_origin_failure_without_stale_is_empty_cache_error() {
        let f = fixture();
        let result = f
            .access
            .get_data(request(), failing_origin, f.calls.clone())
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::CacheError);
        assert!(result.record.is_empty());
        assert_eq!(f.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backend_outage_skips_origin() {
        let f = fixture();
        f.primary.set_unavailable(true);
        let result = f
            .access
            .get_data(request(), origin, (f.calls.clone(), 200))
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::CacheError);
        assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_origin_response_success_range() {
        assert!(OriginResponse::new(200, "").is_success());
        assert!(OriginResponse::new(204, "").is_success());
        assert!(!OriginResponse::new(304, "").is_success());
        assert!(!OriginResponse::new(500, "").is_success());
    }
}
