mod bench;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fp_core::{Engine, EngineConfig, FIELD_NAMES, Factorization, PageIndex, export_json};
use fp_store::{Store, config};
use num_bigint::{BigInt, BigUint, Sign};

#[derive(Parser)]
#[command(name = "fp", about = "Field-pattern factorization engine CLI")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the 8-field activation pattern of an integer
    Pattern {
        #[arg(allow_negative_numbers = true)]
        n: String,
    },

    /// Show the resonance of an integer
    Resonance {
        #[arg(allow_negative_numbers = true)]
        n: String,
    },

    /// List the field constants
    Constants,

    /// Show which 48-wide page an integer falls on
    Page {
        #[arg(allow_negative_numbers = true)]
        n: String,
    },

    /// Compare the patterns of two integers with that of their product
    Interference {
        #[arg(allow_negative_numbers = true)]
        a: String,
        #[arg(allow_negative_numbers = true)]
        b: String,
    },

    /// Factorize one or more integers concurrently
    Factorize {
        #[arg(required = true, allow_negative_numbers = true)]
        numbers: Vec<String>,

        /// Iteration budget per integer (overrides config)
        #[arg(long)]
        iterations: Option<u64>,

        /// Wall-clock deadline per integer (overrides config)
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Give up waiting for an integer after this long
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print a JSON snapshot instead of text
        #[arg(long)]
        json: bool,

        /// Don't record results in the ledger
        #[arg(long)]
        no_record: bool,
    },

    /// Time uncached, cached and concurrent factorization of one integer
    Bench {
        #[arg(default_value = "1000036000099")]
        n: String,

        #[arg(long, default_value_t = 1_000)]
        iterations: u64,

        #[arg(long, default_value_t = 5)]
        rounds: u32,

        /// Concurrent requests in the burst
        #[arg(long, default_value_t = 8)]
        threads: usize,
    },

    /// Show ledger statistics
    Stats,

    /// Delete every recorded result
    Clear,

    /// Export the ledger to a JSON snapshot
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Import a JSON snapshot into the ledger
    Import {
        /// Input file path
        path: PathBuf,
    },

    /// Show the effective engine config
    Config {
        /// Write the effective config to config.toml
        #[arg(long)]
        init: bool,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Pattern { n } => cmd_pattern(n),
        Commands::Resonance { n } => cmd_resonance(n),
        Commands::Constants => cmd_constants(),
        Commands::Page { n } => cmd_page(n),
        Commands::Interference { a, b } => cmd_interference(a, b),
        Commands::Factorize {
            numbers,
            iterations,
            deadline_ms,
            timeout_ms,
            json,
            no_record,
        } => {
            let opts = FactorizeOpts {
                iterations: *iterations,
                deadline_ms: *deadline_ms,
                timeout_ms: *timeout_ms,
                json: *json,
                record: !*no_record,
            };
            cmd_factorize(numbers, opts).await
        }
        Commands::Bench {
            n,
            iterations,
            rounds,
            threads,
        } => {
            let engine = Arc::new(open_engine(&base_dir())?);
            bench::run(engine, parse_unsigned(n)?, *iterations, *rounds, *threads).await
        }
        Commands::Stats => cmd_stats(),
        Commands::Clear => cmd_clear(),
        Commands::Export { path } => cmd_export(path),
        Commands::Import { path } => cmd_import(path),
        Commands::Config { init } => cmd_config(*init),
    }
}

// ---------------------------------------------------------------------------
// Input and setup
// ---------------------------------------------------------------------------

fn parse_signed(s: &str) -> Result<BigInt> {
    s.trim()
        .parse()
        .with_context(|| format!("not a decimal integer: {s:?}"))
}

fn parse_unsigned(s: &str) -> Result<BigUint> {
    let n = parse_signed(s)?;
    if n.sign() == Sign::Minus {
        bail!("{s}: negative integers are not accepted here");
    }
    Ok(n.magnitude().clone())
}

fn base_dir() -> PathBuf {
    config::resolve_base_dir()
}

fn open_engine(base: &Path) -> Result<Engine> {
    let engine_config = config::load_config(base).context("failed to load config")?;
    Engine::new(engine_config).context("failed to construct engine")
}

fn open_store(base: &Path) -> Result<Store> {
    config::open_ledger(base).context("failed to open ledger")
}

fn engine_for_pattern_queries() -> Result<Engine> {
    Engine::new(EngineConfig::default()).context("failed to construct engine")
}

// ---------------------------------------------------------------------------
// Pattern commands
// ---------------------------------------------------------------------------

fn cmd_pattern(n: &str) -> Result<()> {
    let n = parse_signed(n)?;
    let engine = engine_for_pattern_queries()?;
    let pattern = engine.field_pattern(&n);
    let active = pattern.active_indices();
    let names: Vec<&str> = active.iter().map(|&i| FIELD_NAMES[i]).collect();

    println!("residue:    {}", pattern.to_byte());
    println!("pattern:    {pattern}");
    println!("active:     {active:?}");
    println!("fields:     {}", names.join(", "));
    Ok(())
}

fn cmd_resonance(n: &str) -> Result<()> {
    let n = parse_signed(n)?;
    let engine = engine_for_pattern_queries()?;
    println!("{:.12}", engine.resonance(&n));
    Ok(())
}

fn cmd_constants() -> Result<()> {
    let engine = engine_for_pattern_queries()?;
    let values = engine.field_constants();
    for (i, (name, value)) in FIELD_NAMES.iter().zip(values).enumerate() {
        println!("{i}  {name:<13} {value:.15}");
    }
    println!("unity:     {:.15}", values[4] * values[5]);
    Ok(())
}

fn cmd_page(n: &str) -> Result<()> {
    let n = parse_unsigned(n)?;
    let pages = PageIndex::default();
    let position = pages.locate(&n);
    let (start, end) = pages.bounds(&position.page);
    println!("page:       {}", position.page);
    println!("offset:     {}", position.offset);
    println!("range:      {start}..={end}");
    Ok(())
}

fn cmd_interference(a: &str, b: &str) -> Result<()> {
    let (a, b) = (parse_signed(a)?, parse_signed(b)?);
    let engine = engine_for_pattern_queries()?;
    let i = engine.interference(&a, &b);
    println!("left:       {}", i.left);
    println!("right:      {}", i.right);
    println!("product:    {}", i.product);
    println!("vanished:   {:?}", i.vanished);
    println!("emerged:    {:?}", i.emerged);
    println!("disruption: {}", i.disruption());
    Ok(())
}

// ---------------------------------------------------------------------------
// Factorization
// ---------------------------------------------------------------------------

struct FactorizeOpts {
    iterations: Option<u64>,
    deadline_ms: Option<u64>,
    timeout_ms: Option<u64>,
    json: bool,
    record: bool,
}

async fn cmd_factorize(numbers: &[String], opts: FactorizeOpts) -> Result<()> {
    let inputs = numbers
        .iter()
        .map(|s| parse_unsigned(s))
        .collect::<Result<Vec<_>>>()?;

    let base = base_dir();
    let engine = Arc::new(open_engine(&base)?);
    let store = open_store(&base)?;
    let known = store.load_exact().context("failed to read ledger")?;
    let warmed = engine.warm(known);
    tracing::debug!(warmed, "cache warmed from ledger");

    let mut budget = engine.config().budget();
    if let Some(iterations) = opts.iterations {
        budget.max_iterations = iterations;
    }
    if let Some(ms) = opts.deadline_ms {
        budget.deadline = Some(Duration::from_millis(ms));
    }
    let timeout = opts.timeout_ms.map(Duration::from_millis);
    // The blocking task can't be cancelled, so the timeout also bounds the work.
    if let Some(t) = timeout
        && budget.deadline.is_none_or(|d| d > t)
    {
        budget.deadline = Some(t);
    }

    let tasks: Vec<_> = inputs
        .into_iter()
        .map(|n| {
            let engine = Arc::clone(&engine);
            let label = n.to_string();
            let handle =
                tokio::task::spawn_blocking(move || engine.factorize_with_budget(&n, budget));
            (label, handle)
        })
        .collect();

    let mut results: Vec<Arc<Factorization>> = Vec::with_capacity(tasks.len());
    let mut timed_out = Vec::new();
    for (label, handle) in tasks {
        let joined = match timeout {
            Some(t) => match tokio::time::timeout(t, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    timed_out.push(label);
                    continue;
                }
            },
            None => handle.await,
        };
        let result = joined.with_context(|| format!("factorization of {label} failed"))?;
        results.push(result);
    }

    if opts.json {
        let owned: Vec<Factorization> = results.iter().map(|r| (**r).clone()).collect();
        println!(
            "{}",
            export_json(&owned).context("failed to serialize results")?
        );
    } else {
        for result in &results {
            println!("{result}");
        }
    }

    if opts.record {
        let written = store
            .record_all(results.iter().map(|r| &**r))
            .context("failed to record results")?;
        tracing::debug!(written, "results recorded");
    }

    if !timed_out.is_empty() {
        bail!("timed out waiting for: {}", timed_out.join(", "));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

fn cmd_stats() -> Result<()> {
    let base = base_dir();
    let store = open_store(&base)?;
    let count = store.count().context("failed to count results")?;
    let exact = store.load_exact().context("failed to read ledger")?.len();
    let methods = store
        .method_counts()
        .context("failed to get method counts")?;
    let db_size = store.db_size().context("failed to read database size")?;

    println!("data_dir:   {}", base.display());
    println!("results:    {count}");
    println!("exact:      {exact}");
    println!("db_size:    {:.1}KB", db_size as f64 / 1024.0);
    for (method, n) in methods {
        println!("  {:<22}{n}", method.label());
    }
    Ok(())
}

fn cmd_clear() -> Result<()> {
    let store = open_store(&base_dir())?;
    let removed = store.clear().context("failed to clear ledger")?;
    println!("cleared {removed} results");
    Ok(())
}

fn cmd_export(path: &Path) -> Result<()> {
    let store = open_store(&base_dir())?;
    let count = store
        .export_json_file(path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!("exported {count} results to {}", path.display());
    Ok(())
}

fn cmd_import(path: &Path) -> Result<()> {
    let store = open_store(&base_dir())?;
    let count = store
        .import_json_file(path)
        .with_context(|| format!("failed to import {}", path.display()))?;
    println!("imported {count} results from {}", path.display());
    Ok(())
}

fn cmd_config(init: bool) -> Result<()> {
    let base = base_dir();
    let engine_config = config::load_config(&base).context("failed to load config")?;
    if init {
        let path = config::save_config(&base, &engine_config)
            .context("failed to write config")?;
        println!("wrote {}", path.display());
        return Ok(());
    }
    println!("# {}", config::config_path(&base).display());
    print!(
        "{}",
        config::render_config(&engine_config).context("failed to render config")?
    );
    Ok(())
}
