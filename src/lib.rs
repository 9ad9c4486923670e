pub mod cache;
pub mod config;
pub mod duplex;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod memory_cache;
pub mod namespace;
pub mod orchestrator;
pub mod pairing;
#[cfg(feature = "distributed")]
pub mod postgres_cache;
pub mod summary;

pub use cache::{CacheBackend, Connect, NamespaceCache};
pub use config::{CacheEndpoint, TriplexerConfig};
pub use error::*;
pub use ingest::{DuplexIngestor, IngestReport};
pub use logging::init_tracing;
pub use memory_cache::MemoryCache;
pub use namespace::Namespace;
pub use orchestrator::Orchestrator;
pub use pairing::PairingWorker;
pub use summary::{PairingCounters, RunSummary, WorkerSummary};
