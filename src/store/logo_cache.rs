//! Two-tier (memory, then disk) logo cache with per-symbol request coalescing.
//!
//! At most one resolution runs per symbol. Callers arriving while it is in
//! flight join its waiter list and receive the same result. Successful handles
//! are memoized for the lifetime of the cache; failures are not, so a later
//! call may retry.

use crate::core::logo::cache_file_name;
use crate::core::{ByteStore, FetchOutcome, ImageFetcher, LogoHandle, LogoOrigin, LogoRequest};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

type Waiter = oneshot::Sender<Option<LogoHandle>>;

struct Pending {
    attempt: u64,
    waiters: Vec<Waiter>,
}

struct State {
    memory: HashMap<String, LogoHandle>,
    pending: HashMap<String, Pending>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
    store: Arc<dyn ByteStore>,
    next_attempt: u64,
    // Bumped by clear_cache and destroy. Results from an older epoch are delivered but not kept.
    epoch: u64,
}

struct Inner {
    cache_dir: PathBuf,
    state: Mutex<State>,
}

/// Everything a resolution task needs, captured when the attempt starts.
struct Resolution {
    symbol: String,
    urls: Vec<String>,
    path: PathBuf,
    attempt: u64,
    epoch: u64,
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<dyn ByteStore>,
}

enum Begin {
    Ready(Option<LogoHandle>),
    Wait(oneshot::Receiver<Option<LogoHandle>>),
}

#[derive(Clone)]
pub struct LogoCache {
    inner: Arc<Inner>,
}

impl LogoCache {
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<dyn ByteStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache_dir: cache_dir.into(),
                state: Mutex::new(State {
                    memory: HashMap::new(),
                    pending: HashMap::new(),
                    fetcher: Some(fetcher),
                    store,
                    next_attempt: 0,
                    epoch: 0,
                }),
            }),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.inner.cache_dir
    }

    pub fn cache_path(&self, symbol: &str) -> PathBuf {
        self.inner.cache_dir.join(cache_file_name(symbol))
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // The lock is never held across user code, so a poisoned guard is still consistent.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Memoized handle for `symbol`, without triggering a resolution.
    pub fn cached(&self, symbol: &str) -> Option<LogoHandle> {
        self.state().memory.get(symbol).cloned()
    }

    pub fn is_pending(&self, symbol: &str) -> bool {
        self.state().pending.contains_key(symbol)
    }

    /// Resolves the logo for `symbol`. `None` means no source produced an image.
    pub async fn load_logo(&self, symbol: &str, request: &LogoRequest) -> Option<LogoHandle> {
        match self.begin(symbol, request) {
            Begin::Ready(result) => result,
            // A dropped sender means the cache was destroyed mid-flight.
            Begin::Wait(receiver) => receiver.await.unwrap_or(None),
        }
    }

    /// Callback form of [`LogoCache::load_logo`]. The callback runs exactly once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn load_logo_with<F>(&self, symbol: &str, request: LogoRequest, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Option<LogoHandle>) + Send + 'static,
    {
        let cache = self.clone();
        let symbol = symbol.to_string();
        tokio::spawn(async move {
            let result = cache.load_logo(&symbol, &request).await;
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(result))).is_err() {
                error!(symbol = %symbol, "Logo callback panicked");
            }
        })
    }

    fn begin(&self, symbol: &str, request: &LogoRequest) -> Begin {
        if request.is_empty() {
            debug!(symbol = %symbol, "No logo sources");
            return Begin::Ready(None);
        }

        let mut state = self.state();
        if let Some(handle) = state.memory.get(symbol) {
            debug!(symbol = %symbol, "Logo cache HIT");
            return Begin::Ready(Some(handle.clone()));
        }

        let Some(fetcher) = state.fetcher.clone() else {
            debug!(symbol = %symbol, "Logo cache destroyed, ignoring request");
            return Begin::Ready(None);
        };

        let (sender, receiver) = oneshot::channel();
        if let Some(pending) = state.pending.get_mut(symbol) {
            debug!(symbol = %symbol, "Joining in-flight logo resolution");
            pending.waiters.push(sender);
            return Begin::Wait(receiver);
        }

        let attempt = state.next_attempt;
        state.next_attempt += 1;
        state.pending.insert(
            symbol.to_string(),
            Pending {
                attempt,
                waiters: vec![sender],
            },
        );

        let job = Resolution {
            symbol: symbol.to_string(),
            urls: request.candidate_urls(),
            path: self.cache_path(symbol),
            attempt,
            epoch: state.epoch,
            fetcher,
            store: Arc::clone(&state.store),
        };
        drop(state);

        let cache = self.clone();
        tokio::spawn(async move {
            let (symbol, attempt, epoch) = (job.symbol.clone(), job.attempt, job.epoch);
            let result = match AssertUnwindSafe(resolve(job)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!(symbol = %symbol, "Logo resolution panicked");
                    None
                }
            };
            cache.finish(&symbol, attempt, epoch, result);
        });

        Begin::Wait(receiver)
    }

    fn finish(&self, symbol: &str, attempt: u64, epoch: u64, result: Option<LogoHandle>) {
        let waiters = {
            let mut state = self.state();
            if let Some(handle) = &result {
                if state.epoch == epoch {
                    state.memory.insert(symbol.to_string(), handle.clone());
                } else {
                    debug!(symbol = %symbol, "Cache cleared during resolution, not memoizing");
                }
            }
            match state.pending.get(symbol) {
                Some(pending) if pending.attempt == attempt => state
                    .pending
                    .remove(symbol)
                    .map(|pending| pending.waiters)
                    .unwrap_or_default(),
                _ => Vec::new(),
            }
        };

        debug!(symbol = %symbol, waiters = waiters.len(), found = result.is_some(), "Logo resolved");
        for waiter in waiters {
            // The receiving caller may have gone away; nothing to do then.
            let _ = waiter.send(result.clone());
        }
    }

    /// Empties the memory tier and deletes every file in the cache directory.
    /// Returns the number of files removed.
    pub async fn clear_cache(&self) -> anyhow::Result<usize> {
        let store = {
            let mut state = self.state();
            state.memory.clear();
            state.epoch += 1;
            Arc::clone(&state.store)
        };

        let entries = store.list_entries(&self.inner.cache_dir).await?;
        let mut removed = 0;
        for path in entries {
            match store.delete(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete cached logo"),
            }
        }
        info!(removed, dir = %self.inner.cache_dir.display(), "Cleared logo cache");
        Ok(removed)
    }

    /// Drops memoized handles and waiter bookkeeping and releases the fetch transport.
    /// Files on disk are kept.
    pub fn destroy(&self) {
        let mut state = self.state();
        state.memory.clear();
        state.pending.clear();
        state.fetcher = None;
        state.epoch += 1;
        debug!("Logo cache destroyed");
    }
}

#[instrument(name = "LogoResolve", skip(job), fields(symbol = %job.symbol))]
async fn resolve(job: Resolution) -> Option<LogoHandle> {
    match job.store.exists(&job.path).await {
        Ok(true) => {
            debug!(path = %job.path.display(), "Logo found on disk");
            return Some(LogoHandle {
                symbol: job.symbol,
                path: job.path,
                origin: LogoOrigin::DiskCache,
            });
        }
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Disk cache check failed, fetching from network"),
    }

    for url in &job.urls {
        match job.fetcher.get(url).await {
            FetchOutcome::Image(bytes) => match job.store.write_all(&job.path, &bytes).await {
                Ok(()) => {
                    return Some(LogoHandle {
                        symbol: job.symbol,
                        path: job.path,
                        origin: LogoOrigin::Downloaded { url: url.clone() },
                    });
                }
                Err(e) => warn!(url = %url, error = %e, "Failed to write logo cache file"),
            },
            FetchOutcome::Rejected { status, len } => {
                debug!(url = %url, status, len, "Logo source rejected")
            }
            FetchOutcome::Failed(e) => debug!(url = %url, error = %e, "Logo source failed"),
        }
    }

    debug!(attempts = job.urls.len(), "All logo sources exhausted");
    None
}
