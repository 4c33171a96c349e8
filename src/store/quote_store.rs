//! Latest-quote-per-symbol store with synchronous change notification.
//!
//! Views register [`Listener`]s and re-read the store when notified. The store
//! also owns the quote fetcher and logo cache so every view shares one of each.

use crate::core::{Quote, QuoteFetcher};
use crate::store::logo_cache::LogoCache;
use anyhow::Result;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Change callback. Identity is the underlying allocation, so clones compare equal.
#[derive(Clone)]
pub struct Listener {
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl Listener {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    fn key(&self) -> usize {
        Arc::as_ptr(&self.callback) as *const () as usize
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Listener {}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("key", &self.key()).finish()
    }
}

/// Shared collaborators created on `init`.
#[derive(Clone)]
pub struct Services {
    pub fetcher: Arc<dyn QuoteFetcher>,
    pub logos: LogoCache,
}

pub trait ServiceFactory: Send + Sync {
    fn create(&self) -> Result<Services>;
}

impl<F> ServiceFactory for F
where
    F: Fn() -> Result<Services> + Send + Sync,
{
    fn create(&self) -> Result<Services> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Never initialized; services are created on first access.
    Fresh,
    Active,
    /// Torn down; reads see an empty store until `init` runs again.
    Destroyed,
}

struct State {
    lifecycle: Lifecycle,
    quotes: HashMap<String, Quote>,
    listeners: HashMap<usize, Listener>,
    services: Option<Services>,
}

pub struct QuoteStore {
    factory: Box<dyn ServiceFactory>,
    state: Mutex<State>,
}

impl QuoteStore {
    pub fn new(factory: impl ServiceFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            state: Mutex::new(State {
                lifecycle: Lifecycle::Fresh,
                quotes: HashMap::new(),
                listeners: HashMap::new(),
                services: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // Listeners run outside the lock, so a poisoned guard is still consistent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates the fetcher and logo cache. No-op when already initialized.
    pub fn init(&self) -> Result<()> {
        if self.state().services.is_some() {
            return Ok(());
        }
        // Built unlocked so the factory may call back into the store.
        let services = self.factory.create()?;

        let mut state = self.state();
        if state.services.is_some() {
            drop(state);
            debug!("Lost init race, discarding extra services");
            services.logos.destroy();
            return Ok(());
        }
        state.services = Some(services);
        state.lifecycle = Lifecycle::Active;
        info!("Quote store initialized");
        Ok(())
    }

    fn services(&self) -> Option<Services> {
        let lifecycle = {
            let state = self.state();
            if let Some(services) = &state.services {
                return Some(services.clone());
            }
            state.lifecycle
        };
        if lifecycle != Lifecycle::Fresh {
            return None;
        }
        match self.init() {
            Ok(()) => self.state().services.clone(),
            Err(e) => {
                error!(error = %e, "Failed to initialize quote store services");
                None
            }
        }
    }

    /// Shared quote fetcher, or `None` once the store has been destroyed.
    pub fn fetcher(&self) -> Option<Arc<dyn QuoteFetcher>> {
        self.services().map(|s| s.fetcher)
    }

    /// Shared logo cache, or `None` once the store has been destroyed.
    pub fn logo_cache(&self) -> Option<LogoCache> {
        self.services().map(|s| s.logos)
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().lifecycle == Lifecycle::Destroyed
    }

    /// Replaces the quote for `symbol`, then runs every listener before returning.
    pub fn set_quote(&self, symbol: &str, quote: Quote) {
        let listeners: Vec<Listener> = {
            let mut state = self.state();
            if state.lifecycle == Lifecycle::Destroyed {
                debug!(symbol = %symbol, "Store destroyed, dropping quote");
                return;
            }
            state.quotes.insert(symbol.to_string(), quote);
            state.listeners.values().cloned().collect()
        };

        debug!(symbol = %symbol, listeners = listeners.len(), "Quote updated");
        for listener in listeners {
            if std::panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)())).is_err() {
                error!(symbol = %symbol, "Quote listener panicked");
            }
        }
    }

    pub fn get_quote(&self, symbol: &str) -> Option<Quote> {
        self.state().quotes.get(symbol).cloned()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.state().quotes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state().quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().quotes.is_empty()
    }

    /// Registers `listener`. Returns false if it was already registered or the store is destroyed.
    pub fn add_listener(&self, listener: &Listener) -> bool {
        let mut state = self.state();
        if state.lifecycle == Lifecycle::Destroyed {
            debug!("Store destroyed, ignoring listener");
            return false;
        }
        state
            .listeners
            .insert(listener.key(), listener.clone())
            .is_none()
    }

    /// Unregisters `listener`. Unknown listeners are ignored.
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        self.state().listeners.remove(&listener.key()).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    /// Drops all quotes and listeners and tears down the fetcher and logo cache.
    pub fn destroy(&self) {
        let services = {
            let mut state = self.state();
            state.quotes.clear();
            state.listeners.clear();
            state.lifecycle = Lifecycle::Destroyed;
            state.services.take()
        };
        if let Some(services) = services {
            services.logos.destroy();
        }
        info!("Quote store destroyed");
    }
}
