//! Shared in-process state: quotes with change notification and the logo cache.

pub mod disk;
pub mod logo_cache;
pub mod quote_store;

pub use disk::FsByteStore;
pub use logo_cache::LogoCache;
pub use quote_store::{Listener, QuoteStore, ServiceFactory, Services};
