use crate::error::TriplexError;
use crate::namespace::Namespace;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_CACHE_URL: &str = "memory";

/// Where the shared store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEndpoint {
    /// Ephemeral in-process store.
    Memory,
    /// In-process store persisted to a bincode snapshot between invocations.
    MemorySnapshot(PathBuf),
    /// Shared PostgreSQL database.
    Postgres(String),
}

impl FromStr for CacheEndpoint {
    type Err = TriplexError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        if url == "memory" {
            return Ok(CacheEndpoint::Memory);
        }
        if let Some(path) = url.strip_prefix("memory:") {
            if path.is_empty() {
                return Err(TriplexError::Config("memory: endpoint needs a snapshot path".to_string()));
            }
            return Ok(CacheEndpoint::MemorySnapshot(PathBuf::from(path)));
        }
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(CacheEndpoint::Postgres(url.to_string()));
        }
        Err(TriplexError::Config(format!(
            "unsupported cache endpoint {:?} (expected memory, memory:<path> or postgres://...)",
            url
        )))
    }
}

impl fmt::Display for CacheEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEndpoint::Memory => write!(f, "memory"),
            CacheEndpoint::MemorySnapshot(path) => write!(f, "memory:{}", path.display()),
            // credentials stay out of logs
            CacheEndpoint::Postgres(_) => write!(f, "postgres"),
        }
    }
}

/// Settings consumed by the ingestor and the pairing engine. Built once at
/// startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriplexerConfig {
    pub namespace: Namespace,
    pub workers: usize,
    pub cache: CacheEndpoint,
}

impl TriplexerConfig {
    pub fn new(namespace: &str, workers: usize, cache_url: &str) -> Result<Self, TriplexError> {
        if workers == 0 {
            return Err(TriplexError::Config("worker count must be at least 1".to_string()));
        }
        Ok(Self {
            namespace: Namespace::resolve(namespace)?,
            workers,
            cache: cache_url.parse()?,
        })
    }
}
