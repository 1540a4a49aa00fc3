mod inputs;

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zapline_core::cascade::Task;
use zapline_core::config::AppConfig;
use zapline_core::error::ZaplineError;
use zapline_core::logo_cache::LogoCache;
use zapline_core::models::RawLabel;
use zapline_core::resolver::{Resolver, Tasks};
use zapline_core::similarity;
use zapline_core::tables::ResolverTables;

/// Resolve IPTV channel labels to a country, a guide id and a logo.
#[derive(Parser)]
#[command(name = "zapline", version)]
struct Cli {
    /// Log debug output. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the user config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Table file merged over the built-in tables.
    #[arg(long, global = true)]
    tables: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve every label and print one JSON object per line.
    Resolve {
        /// Label file (plain names or JSON lines), or `-` for stdin.
        #[arg(short, long)]
        labels: PathBuf,

        /// Guide catalog: JSON array of `{"id", "displayNames"}` records.
        #[arg(long)]
        epg: Option<PathBuf>,

        /// Directory of logo images.
        #[arg(long)]
        logos: Option<PathBuf>,

        /// Tasks to run, comma separated.
        #[arg(long, value_delimiter = ',', default_value = "country,epg,logo")]
        tasks: Vec<Task>,

        /// Do not read or write the logo cache.
        #[arg(long)]
        no_cache: bool,
    },
    /// Print the normalized key of each argument.
    Normalize {
        /// Labels to normalize.
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Print the similarity of two labels after normalization.
    Score { a: String, b: String },
    /// Print the effective tables as TOML.
    Tables,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "zapline failed");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only results.
fn init_tracing(verbose: bool) {
    let default = if verbose { "zapline=debug" } else { "zapline=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), ZaplineError> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let tables_path = cli.tables.clone().or_else(|| config.tables.path.clone());
    let tables = ResolverTables::load(tables_path.as_deref())?;

    match cli.command {
        Command::Resolve {
            labels,
            epg,
            logos,
            tasks,
            no_cache,
        } => cmd_resolve(
            &config,
            &tables,
            &labels,
            epg.as_deref(),
            logos.as_deref(),
            Tasks::from_list(&tasks),
            no_cache,
        ),
        Command::Normalize { text } => cmd_normalize(&tables, &text),
        Command::Score { a, b } => cmd_score(&tables, &a, &b),
        Command::Tables => cmd_tables(&tables),
    }
}

fn cmd_resolve(
    config: &AppConfig,
    tables: &ResolverTables,
    labels_path: &Path,
    epg_path: Option<&Path>,
    logos_dir: Option<&Path>,
    tasks: Tasks,
    no_cache: bool,
) -> Result<(), ZaplineError> {
    let labels: Vec<RawLabel> = inputs::read_labels(labels_path)?;
    let epg_records = match epg_path {
        Some(path) => inputs::read_catalog(path)?,
        None => Vec::new(),
    };
    let logo_records = match logos_dir {
        Some(dir) => inputs::scan_logos(dir, config)?,
        None => Vec::new(),
    };

    let resolver = Resolver::new(config, tables, epg_records, logo_records);

    let cache_path = config.cache_path();
    let mut cache = (tasks.logo && !no_cache).then(|| LogoCache::load(&cache_path));

    let (channels, stats) = resolver.resolve_all(&labels, tasks, cache.as_mut());

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for channel in &channels {
        serde_json::to_writer(&mut out, channel)?;
        writeln!(out)?;
    }
    out.flush()?;

    if let Some(cache) = cache.as_mut() {
        if cache.is_dirty() {
            cache.save(&cache_path)?;
            tracing::debug!(path = %cache_path.display(), entries = cache.len(), "Logo cache saved");
        }
    }

    stats.log_summary();
    Ok(())
}

fn cmd_normalize(tables: &ResolverTables, text: &[String]) -> Result<(), ZaplineError> {
    let normalizer = tables.normalizer();
    let mut out = io::stdout().lock();
    for raw in text {
        let display = RawLabel::new(raw.as_str()).display_name().into_owned();
        writeln!(out, "{}\t{}", raw, normalizer.normalize(&display))?;
    }
    Ok(())
}

fn cmd_score(tables: &ResolverTables, a: &str, b: &str) -> Result<(), ZaplineError> {
    let normalizer = tables.normalizer();
    let (ka, kb) = (normalizer.normalize(a), normalizer.normalize(b));
    let score = similarity::score(&ka, &kb);
    println!("{score:.4}\t{ka}\t{kb}");
    Ok(())
}

fn cmd_tables(tables: &ResolverTables) -> Result<(), ZaplineError> {
    let content =
        toml::to_string_pretty(tables).map_err(|e| ZaplineError::Tables(e.to_string()))?;
    print!("{content}");
    Ok(())
}
