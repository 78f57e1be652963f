use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::chain::UniversalChainId;
use crate::error::TokenQueryError;
use crate::types::token_list::TokenList;

/// The collaborator that actually fetches a chain's token list.
#[async_trait]
pub trait TokenQuery: Send + Sync {
    async fn fetch(&self, chain_id: &UniversalChainId) -> Result<TokenList, TokenQueryError>;
}

#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    /// Upper bound on a single query; exceeding it stores [`TokenQueryError::Timeout`].
    pub fetch_timeout: Duration,
    /// Buffered events per subscriber before slow subscribers start lagging.
    pub event_capacity: usize,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            event_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEventKind {
    DataChanged,
    ErrorChanged,
    FetchStarted,
    FetchFinished,
    FetchCancelled,
}

/// Change notification for a single chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub chain_id: UniversalChainId,
    pub kind: StoreEventKind,
}

struct InFlight {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Entry {
    data: Option<TokenList>,
    error: Option<TokenQueryError>,
    in_flight: Option<InFlight>,
}

#[derive(Default)]
struct State {
    entries: HashMap<UniversalChainId, Entry>,
    next_generation: u64,
}

struct Inner {
    state: Mutex<State>,
    query: Arc<dyn TokenQuery>,
    config: TokenStoreConfig,
    events: broadcast::Sender<StoreEvent>,
}

/// The query runs in its own task so a panic surfaces as a `JoinError`.
/// Dropping the guard aborts it, which covers both timeout and cancellation.
struct QueryTask(JoinHandle<Result<TokenList, TokenQueryError>>);

impl Drop for QueryTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Reactive token-list cache keyed by chain. Cheap to clone; clones share state.
///
/// The store keeps the last token list and the last query error for every
/// chain, and runs at most one query per chain at a time. The task it spawns
/// reports back through the store, which writes the result and clears the
/// in-flight marker whether the query succeeded, failed, timed out or panicked.
/// Every mutation is announced on a broadcast channel.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

impl TokenStore {
    pub fn new(query: Arc<dyn TokenQuery>, config: TokenStoreConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                query,
                config,
                events,
            }),
        }
    }

    /// Receive a [`StoreEvent`] for every subsequent mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn set_data(&self, chain_id: &UniversalChainId, data: Option<TokenList>) {
        self.lock().entries.entry(chain_id.clone()).or_default().data = data;
        self.emit(chain_id, StoreEventKind::DataChanged);
    }

    pub fn set_error(&self, chain_id: &UniversalChainId, error: Option<TokenQueryError>) {
        self.lock().entries.entry(chain_id.clone()).or_default().error = error;
        self.emit(chain_id, StoreEventKind::ErrorChanged);
    }

    pub fn get_data(&self, chain_id: &UniversalChainId) -> Option<TokenList> {
        self.lock().entries.get(chain_id).and_then(|e| e.data.clone())
    }

    pub fn get_error(&self, chain_id: &UniversalChainId) -> Option<TokenQueryError> {
        self.lock().entries.get(chain_id).and_then(|e| e.error.clone())
    }

    pub fn is_fetching(&self, chain_id: &UniversalChainId) -> bool {
        self.lock()
            .entries
            .get(chain_id)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// Start fetching the token list for `chain_id` unless a fetch is already
    /// running. Returns immediately; returns `false` when no fetch was started
    /// (one is in flight, or there is no tokio runtime to run it on).
    pub fn fetch_tokens(&self, chain_id: &UniversalChainId) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                target: "tokens",
                chain = %chain_id,
                "no tokio runtime, fetch not started"
            );
            return false;
        };

        {
            let mut state = self.lock();
            if state
                .entries
                .get(chain_id)
                .is_some_and(|e| e.in_flight.is_some())
            {
                tracing::debug!(target: "tokens", chain = %chain_id, "fetch already in flight");
                return false;
            }

            state.next_generation += 1;
            let generation = state.next_generation;

            // The lock is held until the handle is recorded, so the task cannot
            // complete against a missing entry.
            let store = self.clone();
            let id = chain_id.clone();
            let handle = runtime.spawn(async move { store.run_fetch(id, generation).await });

            state.entries.entry(chain_id.clone()).or_default().in_flight =
                Some(InFlight { generation, handle });

            // Sent under the lock: completion events need the lock first.
            tracing::debug!(target: "tokens", chain = %chain_id, "fetch started");
            self.emit(chain_id, StoreEventKind::FetchStarted);
        }
        true
    }

    /// Abort the in-flight fetch for `chain_id`, if any. Its result is discarded.
    pub fn cancel(&self, chain_id: &UniversalChainId) -> bool {
        let in_flight = self
            .lock()
            .entries
            .get_mut(chain_id)
            .and_then(|e| e.in_flight.take());

        match in_flight {
            Some(fetch) => {
                fetch.handle.abort();
                tracing::debug!(target: "tokens", chain = %chain_id, "fetch cancelled");
                self.emit(chain_id, StoreEventKind::FetchCancelled);
                true
            }
            None => false,
        }
    }

    async fn run_fetch(self, chain_id: UniversalChainId, generation: u64) {
        let started = Instant::now();
        let query = Arc::clone(&self.inner.query);
        let id = chain_id.clone();
        let mut task = QueryTask(tokio::spawn(async move { query.fetch(&id).await }));

        let result = match tokio::time::timeout(self.inner.config.fetch_timeout, &mut task.0).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(TokenQueryError::Fetch(format!("token query task failed: {e}"))),
            Err(_) => Err(TokenQueryError::Timeout),
        };

        match &result {
            Ok(tokens) => tracing::info!(
                target: "tokens",
                chain = %chain_id,
                count = tokens.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "token list fetched"
            ),
            Err(e) => tracing::warn!(
                target: "tokens",
                chain = %chain_id,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "token list fetch failed"
            ),
        }

        self.complete(&chain_id, generation, result);
    }

    /// Record the outcome of fetch `generation` and clear its in-flight marker.
    /// Outcomes of cancelled or superseded fetches are dropped.
    fn complete(
        &self,
        chain_id: &UniversalChainId,
        generation: u64,
        result: Result<TokenList, TokenQueryError>,
    ) {
        let mut events = Vec::with_capacity(3);
        {
            let mut state = self.lock();
            let Some(entry) = state.entries.get_mut(chain_id) else {
                return;
            };
            if !entry
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == generation)
            {
                tracing::debug!(
                    target: "tokens",
                    chain = %chain_id,
                    generation,
                    "stale fetch result dropped"
                );
                return;
            }
            entry.in_flight = None;

            match result {
                Ok(tokens) => {
                    entry.data = Some(tokens);
                    entry.error = None;
                    events.push(StoreEventKind::DataChanged);
                    events.push(StoreEventKind::ErrorChanged);
                }
                Err(e) => {
                    entry.error = Some(e);
                    events.push(StoreEventKind::ErrorChanged);
                }
            }
            events.push(StoreEventKind::FetchFinished);
        }

        for kind in events {
            self.emit(chain_id, kind);
        }
    }

    fn emit(&self, chain_id: &UniversalChainId, kind: StoreEventKind) {
        // No subscribers is fine.
        let _ = self.inner.events.send(StoreEvent {
            chain_id: chain_id.clone(),
            kind,
        });
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;
    use crate::types::token_list::{Token, TokenRepresentation};

    /// Counts queries and holds each one until `release` is called.
    struct MockQuery {
        calls: AtomicUsize,
        gate: Notify,
        result: Result<TokenList, TokenQueryError>,
    }

    impl MockQuery {
        fn new(result: Result<TokenList, TokenQueryError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
                result,
            })
        }

        fn release(&self) {
            self.gate.notify_one();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenQuery for MockQuery {
        async fn fetch(&self, _chain_id: &UniversalChainId) -> Result<TokenList, TokenQueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.result.clone()
        }
    }

    struct PanickingQuery;

    #[async_trait]
    impl TokenQuery for PanickingQuery {
        async fn fetch(&self, _chain_id: &UniversalChainId) -> Result<TokenList, TokenQueryError> {
            panic!("indexer client blew up");
        }
    }

    struct InstantQuery;

    #[async_trait]
    impl TokenQuery for InstantQuery {
        async fn fetch(&self, _chain_id: &UniversalChainId) -> Result<TokenList, TokenQueryError> {
            Ok(vec![])
        }
    }

    fn tokens() -> TokenList {
        vec![Token {
            denom: "0x1c7d4b196cb0c7b01d743fbc6116a902379c7238".to_string(),
            representations: vec![TokenRepresentation {
                name: "USD Coin".to_string(),
                symbol: "USDC".to_string(),
                decimals: 6,
                logo_uri: None,
            }],
            wrapping: vec![],
        }]
    }

    fn sepolia() -> UniversalChainId {
        UniversalChainId::new("ethereum.11155111")
    }

    async fn wait_for(rx: &mut broadcast::Receiver<StoreEvent>, kind: StoreEventKind) {
        loop {
            if rx.recv().await.unwrap().kind == kind {
                return;
            }
        }
    }

    #[test]
    fn test_set_and_get() {
        let store = TokenStore::new(MockQuery::new(Ok(vec![])), TokenStoreConfig::default());
        let chain = sepolia();
        let other = UniversalChainId::new("babylon.bbn-1");

        assert_eq!(store.get_data(&chain), None);
        assert_eq!(store.get_error(&chain), None);

        store.set_data(&chain, Some(tokens()));
        store.set_error(&chain, Some(TokenQueryError::Timeout));
        assert_eq!(store.get_data(&chain), Some(tokens()));
        assert_eq!(store.get_error(&chain), Some(TokenQueryError::Timeout));
        assert_eq!(store.get_data(&other), None);

        // Overwrite with absence.
        store.set_data(&chain, None);
        assert_eq!(store.get_data(&chain), None);
        assert_eq!(store.get_error(&chain), Some(TokenQueryError::Timeout));
    }

    #[test]
    fn test_fetch_without_runtime_is_noop() {
        let query = MockQuery::new(Ok(vec![]));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        assert!(!store.fetch_tokens(&sepolia()));
        assert!(!store.is_fetching(&sepolia()));
    }

    #[tokio::test]
    async fn test_duplicate_fetch_is_dropped() {
        let query = MockQuery::new(Ok(tokens()));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();

        assert!(store.fetch_tokens(&chain));
        assert!(!store.fetch_tokens(&chain));
        assert!(store.is_fetching(&chain));

        query.release();
        wait_for(&mut rx, StoreEventKind::FetchFinished).await;

        assert_eq!(query.calls(), 1);
        assert!(!store.is_fetching(&chain));
        assert_eq!(store.get_data(&chain), Some(tokens()));
        assert_eq!(store.get_error(&chain), None);
    }

    #[tokio::test]
    async fn test_fetch_again_after_completion() {
        let query = MockQuery::new(Ok(tokens()));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();

        store.fetch_tokens(&chain);
        query.release();
        wait_for(&mut rx, StoreEventKind::FetchFinished).await;

        assert!(store.fetch_tokens(&chain));
        query.release();
        wait_for(&mut rx, StoreEventKind::FetchFinished).await;
        assert_eq!(query.calls(), 2);
    }

    #[tokio::test]
    async fn test_chains_fetch_independently() {
        let query = MockQuery::new(Ok(tokens()));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());

        assert!(store.fetch_tokens(&sepolia()));
        assert!(store.fetch_tokens(&UniversalChainId::new("babylon.bbn-1")));
        assert!(store.is_fetching(&sepolia()));
        assert!(store.is_fetching(&UniversalChainId::new("babylon.bbn-1")));
    }

    #[tokio::test]
    async fn test_failed_fetch_stores_error_and_keeps_data() {
        let query = MockQuery::new(Err(TokenQueryError::Fetch("502 Bad Gateway".to_string())));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();
        store.set_data(&chain, Some(tokens()));

        store.fetch_tokens(&chain);
        query.release();
        wait_for(&mut rx, StoreEventKind::FetchFinished).await;

        assert_eq!(
            store.get_error(&chain),
            Some(TokenQueryError::Fetch("502 Bad Gateway".to_string()))
        );
        assert_eq!(store.get_data(&chain), Some(tokens()));
        assert!(!store.is_fetching(&chain));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let query = MockQuery::new(Ok(tokens()));
        let config = TokenStoreConfig {
            fetch_timeout: Duration::from_millis(20),
            ..TokenStoreConfig::default()
        };
        let store = TokenStore::new(query.clone(), config);
        let mut rx = store.subscribe();
        let chain = sepolia();

        // Never released.
        store.fetch_tokens(&chain);
        wait_for(&mut rx, StoreEventKind::FetchFinished).await;

        assert_eq!(store.get_error(&chain), Some(TokenQueryError::Timeout));
        assert_eq!(store.get_data(&chain), None);
        assert!(!store.is_fetching(&chain));
    }

    #[tokio::test]
    async fn test_cancel_discards_result() {
        let query = MockQuery::new(Ok(tokens()));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();

        store.fetch_tokens(&chain);
        assert!(store.cancel(&chain));
        assert!(!store.cancel(&chain));
        assert!(!store.is_fetching(&chain));

        query.release();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.get_data(&chain), None);

        assert_eq!(rx.recv().await.unwrap().kind, StoreEventKind::FetchStarted);
        assert_eq!(rx.recv().await.unwrap().kind, StoreEventKind::FetchCancelled);

        // A new fetch may start once the old one is gone.
        assert!(store.fetch_tokens(&chain));
    }

    #[tokio::test]
    async fn test_stale_completion_is_ignored() {
        let query = MockQuery::new(Ok(tokens()));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        let chain = sepolia();

        store.fetch_tokens(&chain);
        store.cancel(&chain);
        store.fetch_tokens(&chain);

        // Generation 1 was cancelled; its late result must not clear generation 2.
        store.complete(&chain, 1, Ok(vec![]));
        assert!(store.is_fetching(&chain));
        assert_eq!(store.get_data(&chain), None);
    }

    #[tokio::test]
    async fn test_event_sequence() {
        let query = MockQuery::new(Ok(tokens()));
        let store = TokenStore::new(query.clone(), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();

        store.fetch_tokens(&chain);
        query.release();

        let mut kinds = Vec::new();
        for _ in 0..4 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.chain_id, chain);
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                StoreEventKind::FetchStarted,
                StoreEventKind::DataChanged,
                StoreEventKind::ErrorChanged,
                StoreEventKind::FetchFinished,
            ]
        );
    }

    #[test]
    fn test_direct_writes_emit_events() {
        let store = TokenStore::new(MockQuery::new(Ok(vec![])), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();
        let other = UniversalChainId::new("babylon.bbn-1");

        store.set_data(&chain, Some(tokens()));
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent {
                chain_id: chain.clone(),
                kind: StoreEventKind::DataChanged,
            }
        );
        assert!(rx.try_recv().is_err());

        store.set_error(&other, Some(TokenQueryError::Timeout));
        assert_eq!(
            rx.try_recv().unwrap(),
            StoreEvent {
                chain_id: other.clone(),
                kind: StoreEventKind::ErrorChanged,
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_panicking_query_clears_in_flight() {
        let store = TokenStore::new(Arc::new(PanickingQuery), TokenStoreConfig::default());
        let mut rx = store.subscribe();
        let chain = sepolia();
        store.set_data(&chain, Some(tokens()));

        assert!(store.fetch_tokens(&chain));
        wait_for(&mut rx, StoreEventKind::FetchFinished).await;

        assert!(!store.is_fetching(&chain));
        assert!(matches!(store.get_error(&chain), Some(TokenQueryError::Fetch(_))));
        assert_eq!(store.get_data(&chain), Some(tokens()));

        // The chain is not wedged.
        assert!(store.fetch_tokens(&chain));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fetch_started_precedes_completion() {
        let store = TokenStore::new(Arc::new(InstantQuery), TokenStoreConfig::default());
        let chain = sepolia();

        for _ in 0..200 {
            let mut rx = store.subscribe();
            assert!(store.fetch_tokens(&chain));
            assert_eq!(rx.recv().await.unwrap().kind, StoreEventKind::FetchStarted);
            wait_for(&mut rx, StoreEventKind::FetchFinished).await;
            assert!(!store.is_fetching(&chain));
        }
    }
}
