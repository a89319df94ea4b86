//! Cache hierarchy simulator CLI.
//!
//! This binary replays a memory access trace through an I$/D$/L2$ hierarchy. It performs:
//! 1. **Configuration:** Levels from `--ic`/`--dc`/`--l2` geometry strings and/or a JSON file.
//! 2. **Replay:** Reads the trace from a file or stdin and feeds it through the memory tracers.
//! 3. **Reporting:** Prints per-level statistics as text or JSON at shutdown.

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use cachesim_core::CacheHierarchy;
use cachesim_core::common::error::{ConfigError, TraceError};
use cachesim_core::config::{CONFIG_HELP, CacheConfig, HierarchyConfig};
use cachesim_core::sim::MemAccess;
use cachesim_core::sim::trace::{parse_trace, parse_trace_file};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// Filter directive enabling the per-miss log regardless of `RUST_LOG`.
const MISS_LOG_DIRECTIVE: &str = "cachesim::miss=info";

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Trace-driven cache hierarchy simulator",
    long_about = "Replay a memory access trace through split L1 caches and an optional unified L2.\n\nCache geometries have the form sets:ways:blocksize[:policy], policy being R (random), L (LRU) or F (FIFO).\n\nExamples:\n  cachesim --ic 64:4:64:L --dc 64:4:64:L --l2 512:8:64:F trace.txt\n  cachesim --config hierarchy.json --json < trace.txt\n  cachesim --dc 1:16:64:R --log-cache-miss trace.txt"
)]
struct Cli {
    /// Instruction cache geometry.
    #[arg(long = "ic", value_name = "S:W:B[:P]")]
    icache: Option<String>,

    /// Data cache geometry.
    #[arg(long = "dc", value_name = "S:W:B[:P]")]
    dcache: Option<String>,

    /// Unified L2 cache geometry (miss handler of both L1s).
    #[arg(long = "l2", value_name = "S:W:B[:P]")]
    l2: Option<String>,

    /// JSON hierarchy description. Geometry flags override its entries.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log every cache miss to stderr.
    #[arg(long = "log-cache-miss")]
    log_cache_miss: bool,

    /// Print statistics as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Trace file. Reads stdin when omitted or `-`.
    trace: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let config = resolve_config(&cli).unwrap_or_else(|e| config_error(&e));
    init_tracing(config.log_misses);

    if config.is_empty() {
        tracing::warn!("no cache level configured; nothing to simulate");
    }
    let mut hierarchy = CacheHierarchy::new(&config).unwrap_or_else(|e| config_error(&e));

    let accesses = read_trace(cli.trace.as_deref()).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    tracing::debug!(accesses = accesses.len(), "trace loaded");

    hierarchy.run(&accesses);

    if cli.json {
        match serde_json::to_string_pretty(&hierarchy.reports()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: cannot encode statistics: {e}");
                process::exit(1);
            }
        }
    } else {
        print!("{}", hierarchy.report());
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the default `info` filter.
fn init_tracing(log_misses: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
            log_misses,
        ))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Builds the log filter from `RUST_LOG` (or `info`).
///
/// With miss logging on, the `cachesim::miss` target is always let through at
/// `info`, whatever `RUST_LOG` says.
fn log_filter(env: Option<&str>, log_misses: bool) -> EnvFilter {
    let filter = env
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    if !log_misses {
        return filter;
    }
    match MISS_LOG_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Reports a configuration error with usage guidance and terminates.
fn config_error(err: &ConfigError) -> ! {
    eprintln!("error: {err}");
    eprintln!("{CONFIG_HELP}");
    process::exit(1);
}

/// Merges the JSON description (if any) with the geometry flags.
fn resolve_config(cli: &Cli) -> Result<HierarchyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => HierarchyConfig::from_json_file(path)?,
        None => HierarchyConfig::default(),
    };
    let parse = |flag: &Option<String>| flag.as_deref().map(str::parse::<CacheConfig>).transpose();

    if let Some(icache) = parse(&cli.icache)? {
        config.icache = Some(icache);
    }
    if let Some(dcache) = parse(&cli.dcache)? {
        config.dcache = Some(dcache);
    }
    if let Some(l2) = parse(&cli.l2)? {
        config.l2 = Some(l2);
    }
    config.log_misses |= cli.log_cache_miss;
    Ok(config)
}

fn read_trace(path: Option<&Path>) -> Result<Vec<MemAccess>, TraceError> {
    match path {
        Some(path) if path != Path::new("-") => parse_trace_file(path),
        _ => parse_trace(io::stdin().lock()),
    }
}
