//! Logo resolution abstractions

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const DUCKDUCKGO_MARKER: &str = "duckduckgo";

/// Where to look for a symbol's logo, decided once by the source policy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogoRequest {
    #[default]
    Absent,
    /// Source prefixes completed with the company domain.
    Templated { domain: String, sources: Vec<String> },
    /// Full image URLs used verbatim.
    Direct { sources: Vec<String> },
}

impl LogoRequest {
    pub fn is_empty(&self) -> bool {
        match self {
            LogoRequest::Absent => true,
            LogoRequest::Templated { sources, .. } | LogoRequest::Direct { sources } => {
                sources.is_empty()
            }
        }
    }

    /// Ordered list of URLs to try.
    pub fn candidate_urls(&self) -> Vec<String> {
        match self {
            LogoRequest::Absent => Vec::new(),
            LogoRequest::Direct { sources } => sources.clone(),
            LogoRequest::Templated { domain, sources } => sources
                .iter()
                .map(|source| {
                    if source.contains(DUCKDUCKGO_MARKER) {
                        format!("{source}{domain}.ico")
                    } else {
                        format!("{source}{domain}")
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoOrigin {
    Downloaded { url: String },
    DiskCache,
}

/// File-backed reference to a symbol's icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoHandle {
    pub symbol: String,
    pub path: PathBuf,
    pub origin: LogoOrigin,
}

/// Cache file name for a symbol. The extension is nominal; the bytes are stored as fetched.
pub fn cache_file_name(symbol: &str) -> String {
    let sanitized: String = symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{sanitized}.png")
}

/// Outcome of a single image GET.
#[derive(Debug)]
pub enum FetchOutcome {
    Image(Vec<u8>),
    /// The server answered, but with a non-success status or a placeholder-sized body.
    Rejected { status: u16, len: usize },
    Failed(anyhow::Error),
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn get(&self, url: &str) -> FetchOutcome;
}

/// Durable byte storage backing the logo disk tier.
#[async_trait]
pub trait ByteStore: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool>;
    async fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    async fn delete(&self, path: &Path) -> Result<()>;
    async fn list_entries(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}
