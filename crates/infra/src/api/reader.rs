//! Cached, coalesced reads
//!
//! A read is served from the cache when a live entry exists, joins the
//! identical read already underway when there is one, and otherwise starts a
//! new fetch on its own task. The task settles the registry and fills the
//! cache under one lock, so no caller ever observes the gap between the two.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use lingua_common::Clock;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use super::cache::ResponseCache;
use super::errors::ApiError;
use super::fingerprint::Fingerprint;
use super::in_flight::{InFlightRegistry, SharedRead};

#[derive(Default)]
struct ReadState {
    cache: ResponseCache,
    in_flight: InFlightRegistry,
    /// Bumped by every invalidation; a fetch started under an older
    /// generation does not write its result back.
    generation: u64,
}

/// Cache plus in-flight registry behind one lock.
///
/// The lock is never held across an await point.
#[derive(Clone)]
pub struct CachedReader {
    state: Arc<Mutex<ReadState>>,
    clock: Arc<dyn Clock>,
}

impl CachedReader {
    /// Empty reader measuring expiry with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { state: Arc::new(Mutex::new(ReadState::default())), clock }
    }

    /// Resolve `fingerprint`, calling `fetch` only when neither the cache nor
    /// an in-flight read can answer.
    ///
    /// With `dedupe` off the caller never joins an existing read. It still
    /// registers itself when nothing else is pending, so later deduping
    /// callers can join it.
    pub async fn read<F>(
        &self,
        fingerprint: Fingerprint,
        ttl: Duration,
        dedupe: bool,
        fetch: F,
    ) -> Result<Value, ApiError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Value, ApiError>>,
    {
        let outcome = {
            let mut state = self.state.lock();

            if let Some(payload) = state.cache.get(&fingerprint, self.clock.now()) {
                debug!(%fingerprint, "cache hit");
                return Ok(payload);
            }

            match state.in_flight.get(&fingerprint) {
                Some(pending) if dedupe => {
                    debug!(%fingerprint, "joining in-flight read");
                    pending
                }
                pending => {
                    let registers = pending.is_none();
                    self.start(&mut state, fingerprint, ttl, registers, fetch())
                }
            }
        };

        outcome.await
    }

    fn start(
        &self,
        state: &mut ReadState,
        fingerprint: Fingerprint,
        ttl: Duration,
        registers: bool,
        request: BoxFuture<'static, Result<Value, ApiError>>,
    ) -> SharedRead {
        debug!(%fingerprint, ?ttl, registers, "dispatching read");

        let ticket = registers.then(|| state.in_flight.issue_ticket());
        let generation = state.generation;
        let shared_state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let key = fingerprint.clone();

        // Runs to completion even if every caller stops waiting.
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(request).catch_unwind().await.unwrap_or_else(|_| {
                Err(ApiError::Internal("read task panicked".into()))
            });

            let mut state = shared_state.lock();
            if let Some(ticket) = ticket {
                state.in_flight.settle(&key, ticket);
                if let Ok(payload) = &outcome {
                    if !ttl.is_zero() && state.generation == generation {
                        let now = clock.now();
                        let swept = state.cache.purge_expired(now);
                        state.cache.insert(key.clone(), payload.clone(), now + ttl);
                        debug!(fingerprint = %key, swept, "cached read response");
                    }
                }
            }
            outcome
        });

        let outcome: SharedRead = async move {
            task.await.unwrap_or_else(|err| Err(ApiError::Internal(format!("read task failed: {err}"))))
        }
        .boxed()
        .shared();

        if let Some(ticket) = ticket {
            state.in_flight.register(fingerprint, ticket, outcome.clone());
        }
        outcome
    }

    /// Drop every cached entry and fence off reads already underway.
    /// Returns how many entries were dropped.
    pub fn invalidate_all(&self) -> usize {
        let mut state = self.state.lock();
        state.generation += 1;
        state.cache.clear()
    }

    /// Number of entries that are still live.
    pub fn cached_entries(&self) -> usize {
        self.state.lock().cache.live_len(self.clock.now())
    }

    /// Number of registered reads not yet settled.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use lingua_common::MockClock;
    use reqwest::Method;
    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;
    use crate::api::request::Query;

    fn key(path: &str) -> Fingerprint {
        Fingerprint::new(&Method::GET, path, &Query::new())
    }

    fn counting(calls: &Arc<AtomicUsize>, value: Value) -> BoxFuture<'static, Result<Value, ApiError>> {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
        .boxed()
    }

    #[tokio::test]
    async fn cached_value_served_until_ttl_elapses() {
        let clock = MockClock::new();
        let reader = CachedReader::new(Arc::new(clock.clone()));
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_secs(1);

        let first = reader.read(key("/topics/"), ttl, true, || counting(&calls, json!(1))).await;
        let second = reader.read(key("/topics/"), ttl, true, || counting(&calls, json!(2))).await;
        assert_eq!(first, Ok(json!(1)));
        assert_eq!(second, Ok(json!(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(1));
        let third = reader.read(key("/topics/"), ttl, true, || counting(&calls, json!(3))).await;
        assert_eq!(third, Ok(json!(3)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_is_never_cached() {
        let reader = CachedReader::new(Arc::new(MockClock::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            reader.read(key("/words/"), Duration::ZERO, true, || counting(&calls, json!([]))).await.unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(reader.cached_entries(), 0);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let reader = CachedReader::new(Arc::new(MockClock::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();

        let first = {
            let calls = Arc::clone(&calls);
            reader.read(key("/lessons/"), Duration::ZERO, true, move || {
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let _ = gate.await;
                    Ok(json!("shared"))
                }
                .boxed()
            })
        };
        let second = reader.read(key("/lessons/"), Duration::ZERO, true, || counting(&calls, json!("own")));

        let releaser = async {
            tokio::task::yield_now().await;
            let _ = release.send(());
        };
        let (a, b, ()) = tokio::join!(first, second, releaser);

        assert_eq!(a, Ok(json!("shared")));
        assert_eq!(b, Ok(json!("shared")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(reader.in_flight(), 0);
    }

    #[tokio::test]
    async fn failures_are_shared_and_not_cached() {
        let reader = CachedReader::new(Arc::new(MockClock::new()));
        let ttl = Duration::from_secs(60);
        let failure = ApiError::Http { status: 500, body: json!("boom") };

        let err = {
            let failure = failure.clone();
            reader.read(key("/skills/"), ttl, true, move || async move { Err(failure) }.boxed()).await
        };
        assert_eq!(err, Err(failure));
        assert_eq!(reader.cached_entries(), 0);

        let calls = Arc::new(AtomicUsize::new(0));
        let ok = reader.read(key("/skills/"), ttl, true, || counting(&calls, json!("ok"))).await;
        assert_eq!(ok, Ok(json!("ok")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_fences_reads_in_flight() {
        let reader = CachedReader::new(Arc::new(MockClock::new()));
        let ttl = Duration::from_secs(60);
        let (release, gate) = oneshot::channel::<()>();

        let pending = reader.read(key("/courses/"), ttl, true, move || {
            async move {
                let _ = gate.await;
                Ok(json!("stale"))
            }
            .boxed()
        });
        let invalidate = async {
            tokio::task::yield_now().await;
            reader.invalidate_all();
            let _ = release.send(());
        };
        let (value, ()) = tokio::join!(pending, invalidate);

        assert_eq!(value, Ok(json!("stale")));
        assert_eq!(reader.cached_entries(), 0);
    }

    #[tokio::test]
    async fn caching_sweeps_expired_entries() {
        let clock = MockClock::new();
        let start = clock.now();
        let reader = CachedReader::new(Arc::new(clock.clone()));
        let calls = Arc::new(AtomicUsize::new(0));

        reader.read(key("/topics/"), Duration::from_secs(1), true, || counting(&calls, json!(1))).await.unwrap();
        clock.advance(Duration::from_secs(2));
        reader.read(key("/words/"), Duration::from_secs(60), true, || counting(&calls, json!(2))).await.unwrap();

        // Counted from `start`, a surviving /topics/ entry would still look live.
        assert_eq!(reader.state.lock().cache.live_len(start), 1);
    }
}
