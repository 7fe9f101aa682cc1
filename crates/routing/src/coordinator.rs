//! Route cache coordinator.
//!
//! Wraps a `RouteProvider` with the session's route cache and exposes the
//! resolution as an observable `RouteState`:
//! - cache hit: the state settles synchronously, no loading transition
//! - cache miss: loading is published, then exactly one provider call runs
//! - a new request aborts the in-flight fetch (cancelling the transport)
//!   and its result, even if it still arrives, is never applied
//!
//! Each request bumps a generation counter at issue time; a fetch re-checks
//! the counter when it settles, so a slow superseded resolution becomes
//! inert the instant a newer one starts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use geo::Coord;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{RouteCache, RouteKey};
use crate::provider::{RouteProvider, RouteResult};

/// What the consumer currently wants resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub from_id: String,
    pub to_id: String,
    pub from_coord: Coord,
    pub to_coord: Coord,
}

impl RouteRequest {
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.from_id.clone(), self.to_id.clone())
    }
}

/// Observable resolution state for the current request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub data: Option<RouteResult>,
    pub request: Option<RouteRequest>,
}

impl RouteState {
    pub fn idle() -> Self {
        Self::default()
    }

    fn loaded(request: RouteRequest, data: RouteResult) -> Self {
        Self {
            is_loading: false,
            error: None,
            data: Some(data),
            request: Some(request),
        }
    }

    fn loading(request: RouteRequest) -> Self {
        Self {
            is_loading: true,
            error: None,
            data: None,
            request: Some(request),
        }
    }

    fn failed(request: RouteRequest, error: String) -> Self {
        Self {
            is_loading: false,
            error: Some(error),
            data: None,
            request: Some(request),
        }
    }
}

/// Single-flight route resolution with cancellation of superseded requests.
pub struct RouteCoordinator {
    provider: Arc<dyn RouteProvider>,
    cache: Arc<RouteCache>,
    generation: Arc<AtomicU64>,
    tx: watch::Sender<RouteState>,
    inflight: Mutex<Option<JoinHandle<()>>>,
}

impl RouteCoordinator {
    pub fn new(provider: Arc<dyn RouteProvider>, cache: Arc<RouteCache>) -> Self {
        let (tx, _rx) = watch::channel(RouteState::idle());
        Self {
            provider,
            cache,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
            inflight: Mutex::new(None),
        }
    }

    /// Observes the resolution state over time.
    pub fn subscribe(&self) -> watch::Receiver<RouteState> {
        self.tx.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RouteState {
        self.tx.borrow().clone()
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    /// Makes `request` the current desired route.
    ///
    /// Invalidates any still-pending resolution immediately and
    /// synchronously: after this returns, a superseded fetch can no longer
    /// publish, whether or not its network call has completed.
    pub fn request(&self, request: Option<RouteRequest>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = self.inflight.lock().take() {
            previous.abort();
        }

        let Some(request) = request else {
            self.tx.send_replace(RouteState::idle());
            return;
        };

        let key = request.key();
        if let Some(data) = self.cache.get(&key) {
            debug!("route cache hit for {key}");
            self.tx.send_replace(RouteState::loaded(request, data));
            return;
        }

        debug!("route cache miss for {key}, fetching");
        self.tx.send_replace(RouteState::loading(request.clone()));

        let provider = self.provider.clone();
        let cache = self.cache.clone();
        let latest = self.generation.clone();
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let outcome = provider
                .fetch_route(request.from_coord, request.to_coord)
                .await;

            // If another request was issued while we were fetching, this
            // result is stale and must never be applied.
            if latest.load(Ordering::SeqCst) != generation {
                debug!("discarding stale route result for {key}");
                return;
            }

            match outcome {
                Ok(data) => {
                    cache.insert(key, data.clone());
                    tx.send_replace(RouteState::loaded(request, data));
                }
                Err(e) => {
                    // Failures are not cached; a later retry hits the
                    // provider again.
                    warn!("route resolution for {key} failed: {e}");
                    tx.send_replace(RouteState::failed(request, e.to_string()));
                }
            }
        });
        *self.inflight.lock() = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use geo::Coord;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;

    use super::{RouteCoordinator, RouteRequest, RouteState};
    use crate::cache::{RouteCache, RouteKey};
    use crate::error::RoutingError;
    use crate::provider::{BoxFuture, RouteProvider, RouteResult};

    fn request(from: &str, to: &str) -> RouteRequest {
        RouteRequest {
            from_id: from.to_string(),
            to_id: to.to_string(),
            from_coord: Coord::new(112.52, 27.92),
            to_coord: Coord::new(112.97, 28.19),
        }
    }

    fn result(distance_m: u64) -> RouteResult {
        RouteResult {
            distance_m,
            duration_s: distance_m / 10,
            path: vec![Coord::new(112.52, 27.92), Coord::new(112.97, 28.19)],
        }
    }

    /// Provider that answers immediately unless a gate has been queued for
    /// the call, in which case it waits for the gate to release.
    struct StubProvider {
        calls: AtomicUsize,
        gates: Mutex<VecDeque<oneshot::Receiver<Result<RouteResult, RoutingError>>>>,
        immediate: Result<RouteResult, RoutingError>,
    }

    impl StubProvider {
        fn answering(immediate: Result<RouteResult, RoutingError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gates: Mutex::new(VecDeque::new()),
                immediate,
            })
        }

        fn gate(&self) -> oneshot::Sender<Result<RouteResult, RoutingError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().push_back(rx);
            tx
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RouteProvider for StubProvider {
        fn fetch_route(
            &self,
            _origin: Coord,
            _destination: Coord,
        ) -> BoxFuture<'_, Result<RouteResult, RoutingError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gates.lock().pop_front();
            let immediate = self.immediate.clone();
            Box::pin(async move {
                match gate {
                    Some(rx) => rx.await.unwrap_or(Err(RoutingError::EmptyRoute)),
                    None => immediate,
                }
            })
        }
    }

    fn coordinator(provider: Arc<StubProvider>) -> RouteCoordinator {
        RouteCoordinator::new(provider, Arc::new(RouteCache::new()))
    }

    async fn settled(coordinator: &RouteCoordinator) -> RouteState {
        let mut rx = coordinator.subscribe();
        let state = rx.wait_for(|s| !s.is_loading).await.unwrap().clone();
        state
    }

    #[tokio::test]
    async fn null_request_is_immediately_idle() {
        let provider = StubProvider::answering(Ok(result(100)));
        let c = coordinator(provider.clone());

        c.request(None);
        assert_eq!(c.state(), RouteState::idle());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn cache_hit_settles_synchronously_without_a_second_fetch() {
        let provider = StubProvider::answering(Ok(result(100)));
        let c = coordinator(provider.clone());

        c.request(Some(request("A", "B")));
        let first = settled(&c).await;
        assert_eq!(first.data.as_ref().unwrap().distance_m, 100);
        assert_eq!(provider.calls(), 1);

        // Second request for the same key: no loading transition is ever
        // published; the state is already settled when `request` returns.
        c.request(Some(request("A", "B")));
        let state = c.state();
        assert!(!state.is_loading);
        assert_eq!(state.data.as_ref().unwrap().distance_m, 100);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn reversed_direction_is_a_distinct_key() {
        let provider = StubProvider::answering(Ok(result(100)));
        let c = coordinator(provider.clone());

        c.request(Some(request("A", "B")));
        settled(&c).await;
        c.request(Some(request("B", "A")));
        settled(&c).await;

        assert_eq!(provider.calls(), 2);
        assert_eq!(c.cache().len(), 2);
    }

    #[tokio::test]
    async fn superseded_result_is_never_applied() {
        let provider = StubProvider::answering(Ok(result(200)));
        let c = coordinator(provider.clone());

        // R1 is gated so it cannot settle on its own.
        let r1_gate = provider.gate();
        c.request(Some(request("A", "B")));
        tokio::task::yield_now().await;

        // R2 supersedes R1 and settles immediately.
        c.request(Some(request("C", "D")));
        let state = settled(&c).await;
        assert_eq!(state.request.as_ref().unwrap().from_id, "C");

        // R1 finally "arrives"; its result must be inert.
        let _ = r1_gate.send(Ok(result(999)));
        tokio::task::yield_now().await;

        let state = c.state();
        assert_eq!(state.request.as_ref().unwrap().from_id, "C");
        assert_eq!(state.data.as_ref().unwrap().distance_m, 200);
        assert!(c.cache().get(&RouteKey::new("A", "B")).is_none());
    }

    #[tokio::test]
    async fn failure_is_published_and_not_cached() {
        let provider = StubProvider::answering(Err(RoutingError::EmptyRoute));
        let c = coordinator(provider.clone());

        c.request(Some(request("A", "B")));
        let state = settled(&c).await;
        assert!(state.error.is_some());
        assert!(state.data.is_none());
        assert!(c.cache().is_empty());

        // A retry for the same key must hit the provider again.
        c.request(Some(request("A", "B")));
        settled(&c).await;
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn clearing_the_cache_forces_a_refetch() {
        let provider = StubProvider::answering(Ok(result(100)));
        let c = coordinator(provider.clone());

        c.request(Some(request("A", "B")));
        settled(&c).await;
        assert_eq!(provider.calls(), 1);

        c.cache().clear();
        c.request(Some(request("A", "B")));
        settled(&c).await;
        assert_eq!(provider.calls(), 2);
    }
}
