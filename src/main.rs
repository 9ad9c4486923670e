use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use triplexer::config::{DEFAULT_CACHE_URL, DEFAULT_WORKERS};
use triplexer::namespace::KNOWN_NAMESPACES;
use triplexer::{
    CacheEndpoint, Connect, DuplexIngestor, MemoryCache, NamespaceCache, Orchestrator, TriplexError,
    TriplexerConfig,
};

#[derive(Parser)]
#[command(name = "triplexer")]
#[command(version, about = "Predict putative RNA triplexes from miRNA-target duplexes", long_about = None)]
struct Cli {
    /// Dataset namespace: a shortcut (see `namespaces`) or source:release:organism:genome
    #[arg(short = 'n', long, env = "TRIPLEXER_NAMESPACE", default_value = "test", global = true)]
    namespace: String,

    /// Number of parallel pairing workers
    #[arg(short = 'c', long, env = "TRIPLEXER_CORES", default_value_t = DEFAULT_WORKERS, global = true)]
    cores: usize,

    /// Cache endpoint: memory, memory:<snapshot path> or postgres://...
    #[arg(short = 'd', long, env = "TRIPLEXER_CACHE_URL", default_value = DEFAULT_CACHE_URL, global = true)]
    cache: String,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Read a dataset into the cache
    Read { dataset: PathBuf },
    /// Pair the cached duplexes of every pending target
    Filtrate,
    /// Read a dataset, then filtrate it
    Init { dataset: PathBuf },
    /// Show pending and qualifying target counts
    Status,
    /// List known namespace shortcuts
    Namespaces,
}

fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    triplexer::init_tracing("triplexer", cli.verbose);

    if let Commands::Namespaces = cli.command {
        print_namespaces();
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "triplexer aborted");
            eprintln!("[triplexer] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<bool, TriplexError> {
    let config = TriplexerConfig::new(&cli.namespace, cli.cores, &cli.cache)?;
    info!(namespace = %config.namespace, cache = %config.cache, workers = config.workers, "starting");

    match &config.cache {
        CacheEndpoint::Memory => run_with(cli, &config, &MemoryCache::new()),
        CacheEndpoint::MemorySnapshot(path) => {
            let store = open_snapshot(path)?;
            let ok = run_with(cli, &config, &store)?;
            store.save_to_path(path)?;
            info!(snapshot = %path.display(), "cache snapshot saved");
            Ok(ok)
        }
        #[cfg(feature = "distributed")]
        CacheEndpoint::Postgres(url) => {
            let endpoint = triplexer::postgres_cache::PostgresEndpoint { url: url.clone() };
            run_with(cli, &config, &endpoint)
        }
        #[cfg(not(feature = "distributed"))]
        CacheEndpoint::Postgres(_) => Err(TriplexError::Config(
            "postgres cache requires building with --features distributed".to_string(),
        )),
    }
}

fn open_snapshot(path: &Path) -> Result<MemoryCache, TriplexError> {
    if path.exists() {
        info!(snapshot = %path.display(), "loading cache snapshot");
        MemoryCache::load_from_path(path)
    } else {
        Ok(MemoryCache::new())
    }
}

fn run_with<C: Connect>(cli: &Cli, config: &TriplexerConfig, connector: &C) -> Result<bool, TriplexError> {
    match &cli.command {
        Commands::Read { dataset } => {
            read(cli, config, connector, dataset)?;
            Ok(true)
        }
        Commands::Filtrate => filtrate(cli, config, connector),
        Commands::Init { dataset } => {
            read(cli, config, connector, dataset)?;
            filtrate(cli, config, connector)
        }
        Commands::Status => {
            let mut cache = NamespaceCache::new(config.namespace.clone(), connector.connect()?);
            println!("namespace: {}", config.namespace);
            println!("pending targets: {}", cache.pending_count()?);
            println!("qualifying targets: {}", cache.qualifying_count()?);
            Ok(true)
        }
        Commands::Namespaces => {
            print_namespaces();
            Ok(true)
        }
    }
}

fn read<C: Connect>(cli: &Cli, config: &TriplexerConfig, connector: &C, dataset: &Path) -> Result<(), TriplexError> {
    let mut cache = NamespaceCache::new(config.namespace.clone(), connector.connect()?);
    let report = DuplexIngestor::ingest_path(&mut cache, dataset)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "[triplexer][read] lines={} comments={} duplexes={} malformed={} targets={}",
            report.lines, report.comments, report.duplexes, report.malformed, report.targets
        );
    }
    Ok(())
}

fn filtrate<C: Connect>(cli: &Cli, config: &TriplexerConfig, connector: &C) -> Result<bool, TriplexError> {
    let summary = Orchestrator::from_config(config)?.run(connector)?;
    if cli.json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{}", summary);
    }
    Ok(summary.is_success())
}

fn print_namespaces() {
    println!("shortcut\tnamespace\tsource");
    for preset in KNOWN_NAMESPACES {
        println!("{}\t{}\t{}", preset.shortcut, preset.namespace(), preset.location);
    }
}
