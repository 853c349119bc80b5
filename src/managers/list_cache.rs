//! List cache for Linkshelf.
//!
//! Maps a `QueryKey` (collection + parameters) to the last fetched list and
//! keeps views consistent after mutations:
//!
//! - `read` never blocks. It returns the last known data for the key (or, while
//!   a new key loads, the most recent data of the same collection) and starts a
//!   background fetch when the entry is missing or stale.
//! - `invalidate(collection)` marks observed keys of that collection stale and
//!   refetches them; unobserved keys are dropped and refetched on next read.
//! - Every fetch is tagged with a generation. A fetch that completes after a
//!   newer one was started for the same key is discarded, so the most recent
//!   request always wins.
//! - A key whose last fetch failed is not refetched by `read` or `observe`
//!   until it is invalidated again.
//!
//! The cache holds no lock across an await point.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;

use crate::remote::decode_all;
use crate::types::collection::Collection;
use crate::types::errors::StoreError;
use crate::types::query::QueryKey;

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<Value>, StoreError>> + Send>>;

/// Produces a fresh fetch of one cached list.
pub type Fetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Wraps an async closure as a `Fetcher`.
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Value>, StoreError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as FetchFuture)
}

/// How the data returned by a read relates to the requested key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadState {
    /// Current data for this exact key.
    Fresh,
    /// Data for this key, with a refetch in flight or due.
    Refetching,
    /// Data of another key of the same collection, shown while this key loads.
    Placeholder,
    /// Nothing to show yet.
    Pending,
}

/// Result of a non-blocking cache read.
#[derive(Debug, Clone)]
pub struct CacheRead {
    pub data: Option<Arc<Vec<Value>>>,
    pub state: ReadState,
}

/// A typed view over a `CacheRead`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedList<T> {
    pub items: Option<Vec<T>>,
    pub state: ReadState,
}

impl CacheRead {
    fn pending() -> Self {
        Self {
            data: None,
            state: ReadState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == ReadState::Pending
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<CachedList<T>, StoreError> {
        let items = match &self.data {
            Some(values) => Some(decode_all(values)?),
            None => None,
        };
        Ok(CachedList {
            items,
            state: self.state,
        })
    }
}

impl<T> CachedList<T> {
    pub fn items_or_empty(&self) -> &[T] {
        self.items.as_deref().unwrap_or(&[])
    }
}

struct Entry {
    data: Option<Arc<Vec<Value>>>,
    stale: bool,
    /// Generation of the most recently started fetch.
    generation: u64,
    in_flight: bool,
    observers: usize,
    fetcher: Fetcher,
    last_error: Option<StoreError>,
}

impl Entry {
    fn new(fetcher: Fetcher) -> Self {
        Self {
            data: None,
            stale: false,
            generation: 0,
            in_flight: false,
            observers: 0,
            fetcher,
            last_error: None,
        }
    }

    /// A failed entry is not retried by reads; it waits for the next
    /// invalidation or an explicit `fetch`.
    fn needs_fetch(&self) -> bool {
        !self.in_flight && self.last_error.is_none() && (self.data.is_none() || self.stale)
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    /// Last key per collection that received data; source of placeholders.
    latest: HashMap<Collection, QueryKey>,
    next_generation: u64,
}

impl State {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn placeholder(&self, collection: Collection) -> Option<Arc<Vec<Value>>> {
        self.latest
            .get(&collection)
            .and_then(|k| self.entries.get(k))
            .and_then(|e| e.data.clone())
    }

    fn snapshot(&self, key: &QueryKey) -> CacheRead {
        match self.entries.get(key) {
            Some(Entry {
                data: Some(data),
                stale,
                in_flight,
                ..
            }) => CacheRead {
                data: Some(data.clone()),
                state: if *stale || *in_flight {
                    ReadState::Refetching
                } else {
                    ReadState::Fresh
                },
            },
            _ => match self.placeholder(key.collection) {
                Some(data) => CacheRead {
                    data: Some(data),
                    state: ReadState::Placeholder,
                },
                None => CacheRead::pending(),
            },
        }
    }
}

struct Inner {
    state: Mutex<State>,
    settled: Notify,
}

/// Process-wide list cache. Cloning shares the same cache.
#[derive(Clone)]
pub struct ListCache {
    inner: Arc<Inner>,
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ListCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                settled: Notify::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns what is known for `key` right now and schedules a background
    /// fetch if the entry is missing or stale.
    pub fn read(&self, key: &QueryKey, fetcher: Fetcher) -> CacheRead {
        let mut state = self.lock();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(fetcher.clone()));
        entry.fetcher = fetcher;
        if entry.needs_fetch() {
            self.start_fetch(&mut state, key);
        }
        state.snapshot(key)
    }

    /// Like `read` but never schedules a fetch.
    pub fn peek(&self, key: &QueryKey) -> CacheRead {
        self.lock().snapshot(key)
    }

    /// Returns fresh data for `key`, fetching inline when the cached entry is
    /// missing or stale. An inline fetch supersedes any background fetch of the
    /// same key.
    pub async fn fetch(&self, key: &QueryKey, fetcher: Fetcher) -> Result<Arc<Vec<Value>>, StoreError> {
        let generation = {
            let mut state = self.lock();
            let generation = state.bump();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(fetcher.clone()));
            entry.fetcher = fetcher.clone();
            if let (Some(data), false) = (&entry.data, entry.stale) {
                return Ok(data.clone());
            }
            entry.generation = generation;
            entry.in_flight = true;
            generation
        };

        debug!("fetching {} inline (generation {})", key, generation);
        let result = fetcher().await;
        self.complete(key, generation, result.clone());
        result.map(Arc::new)
    }

    /// Registers an active view of `key`. While at least one observer exists,
    /// invalidation refetches the key instead of dropping it.
    pub fn observe(&self, key: &QueryKey, fetcher: Fetcher) -> Observer {
        let mut state = self.lock();
        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(fetcher.clone()));
        entry.fetcher = fetcher.clone();
        entry.observers += 1;
        if entry.needs_fetch() {
            self.start_fetch(&mut state, key);
        }
        Observer {
            cache: self.clone(),
            key: key.clone(),
            fetcher,
        }
    }

    /// Marks every cached key of `collection` stale. Observed keys are
    /// refetched in the background, the rest are dropped. Returns the number of
    /// keys affected. Invalidating twice only costs a redundant refetch.
    pub fn invalidate(&self, collection: Collection) -> usize {
        let mut state = self.lock();
        let keys: Vec<QueryKey> = state
            .entries
            .keys()
            .filter(|k| k.starts_with(collection))
            .cloned()
            .collect();

        for key in &keys {
            let observed = state.entries.get(key).map(|e| e.observers > 0).unwrap_or(false);
            if observed {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.stale = true;
                }
                self.start_fetch(&mut state, key);
            } else {
                state.entries.remove(key);
            }
        }

        if state
            .latest
            .get(&collection)
            .map(|k| !state.entries.contains_key(k))
            .unwrap_or(false)
        {
            state.latest.remove(&collection);
        }

        debug!("invalidated {} cached list(s) of {}", keys.len(), collection);
        keys.len()
    }

    /// Drops everything. Used on shutdown and sign-out.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.latest.clear();
        drop(state);
        self.inner.settled.notify_waiters();
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.lock().entries.get(key).map(|e| e.stale).unwrap_or(false)
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock().entries.get(key).map(|e| e.in_flight).unwrap_or(false)
    }

    /// The error of the last failed fetch for `key`, if the entry has not
    /// been refreshed since.
    pub fn last_error(&self, key: &QueryKey) -> Option<StoreError> {
        self.lock().entries.get(key).and_then(|e| e.last_error.clone())
    }

    /// Waits until no fetch for `key` is in flight.
    pub async fn settled(&self, key: &QueryKey) {
        loop {
            let notified = self.inner.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_fetching(key) {
                return;
            }
            notified.await;
        }
    }

    /// Waits until no fetch of any key is in flight.
    pub async fn settle_all(&self) {
        loop {
            let notified = self.inner.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.lock().entries.values().any(|e| e.in_flight) {
                return;
            }
            notified.await;
        }
    }

    /// Spawns a background fetch for `key`. Must be called with the state lock held.
    fn start_fetch(&self, state: &mut State, key: &QueryKey) {
        let generation = state.bump();
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("no async runtime available, not refetching {}", key);
                return;
            }
        };

        entry.generation = generation;
        entry.in_flight = true;
        let fetch = (entry.fetcher)();
        let cache = self.clone();
        let key = key.clone();
        debug!("refetching {} in background (generation {})", key, generation);
        handle.spawn(async move {
            let result = fetch.await;
            cache.complete(&key, generation, result);
        });
    }

    /// Applies a finished fetch unless a newer one superseded it.
    fn complete(&self, key: &QueryKey, generation: u64, result: Result<Vec<Value>, StoreError>) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let current = state
            .entries
            .get(key)
            .map(|e| e.generation == generation)
            .unwrap_or(false);

        if !current {
            debug!("discarding superseded fetch of {} (generation {})", key, generation);
        } else if let Some(entry) = state.entries.get_mut(key) {
            entry.in_flight = false;
            match result {
                Ok(list) => {
                    entry.data = Some(Arc::new(list));
                    entry.stale = false;
                    entry.last_error = None;
                    state.latest.insert(key.collection, key.clone());
                }
                Err(e) => {
                    warn!("failed to fetch {}: {}", key, e);
                    entry.last_error = Some(e);
                }
            }
        }

        drop(guard);
        self.inner.settled.notify_waiters();
    }

    fn release(&self, key: &QueryKey) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.observers = entry.observers.saturating_sub(1);
        }
    }
}

/// An active view of one cached list. Dropping it stops invalidation from
/// refetching the key on its behalf.
pub struct Observer {
    cache: ListCache,
    key: QueryKey,
    fetcher: Fetcher,
}

impl Observer {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn read(&self) -> CacheRead {
        self.cache.read(&self.key, self.fetcher.clone())
    }

    pub async fn settled(&self) {
        self.cache.settled(&self.key).await
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.cache.release(&self.key);
    }
}
