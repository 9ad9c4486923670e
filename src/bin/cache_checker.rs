use dotenv::dotenv;
use std::env;
use triplexer::config::{DEFAULT_CACHE_URL, DEFAULT_WORKERS};
use triplexer::{CacheEndpoint, Connect, MemoryCache, NamespaceCache, TriplexError, TriplexerConfig};

fn main() {
    dotenv().ok();
    triplexer::init_tracing("cache_checker", false);

    let namespace = env::var("TRIPLEXER_NAMESPACE").unwrap_or_else(|_| "test".to_string());
    let cache_url = env::var("TRIPLEXER_CACHE_URL").unwrap_or_else(|_| DEFAULT_CACHE_URL.to_string());

    if let Err(e) = check(&namespace, &cache_url) {
        eprintln!("[cache_checker] {}", e);
        std::process::exit(1);
    }
}

fn check(namespace: &str, cache_url: &str) -> Result<(), TriplexError> {
    let config = TriplexerConfig::new(namespace, DEFAULT_WORKERS, cache_url)?;
    match &config.cache {
        CacheEndpoint::Memory => print_counts(&config, &MemoryCache::new()),
        CacheEndpoint::MemorySnapshot(path) => print_counts(&config, &MemoryCache::load_from_path(path)?),
        #[cfg(feature = "distributed")]
        CacheEndpoint::Postgres(url) => {
            print_counts(&config, &triplexer::postgres_cache::PostgresEndpoint { url: url.clone() })
        }
        #[cfg(not(feature = "distributed"))]
        CacheEndpoint::Postgres(_) => Err(TriplexError::Config(
            "postgres cache requires building with --features distributed".to_string(),
        )),
    }
}

fn print_counts<C: Connect>(config: &TriplexerConfig, connector: &C) -> Result<(), TriplexError> {
    let mut cache = NamespaceCache::new(config.namespace.clone(), connector.connect()?);
    println!("namespace: {}", config.namespace);
    println!("pending targets: {}", cache.pending_count()?);
    println!("qualifying targets: {}", cache.qualifying_count()?);
    Ok(())
}
