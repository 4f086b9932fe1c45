//! cablebox CLI - look up circuit boxes in the cable inventory

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cablebox::{
    BoxReport, InventoryCache, InventoryTable, LoadError, Loader, LoaderConfig, QueryOutcome,
    Resolver,
};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cablebox")]
#[command(
    author,
    version,
    about = "Look up theater circuit boxes in the cable inventory spreadsheet"
)]
struct Cli {
    #[command(flatten)]
    options: ConfigArgs,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options layered over the configuration file
#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the inventory spreadsheet
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Facility prefix of box ids (default: AV)
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// File-name keyword identifying the inventory file (repeatable)
    #[arg(short, long = "keyword", global = true)]
    keywords: Vec<String>,

    /// Candidate file extension (repeatable, default: xlsx)
    #[arg(long = "ext", global = true)]
    extensions: Vec<String>,

    /// Worksheet to read (default: first)
    #[arg(long, global = true)]
    sheet: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve box ids and print their connectors
    Lookup {
        /// Box ids, e.g. 04-01 or AV 04-01
        #[arg(required = true)]
        ids: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Read box ids from stdin, one per line (default)
    Repl,

    /// Show the selected source and what was loaded from it
    Info,

    /// Print the effective configuration as JSON
    Config,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = effective_config(&cli.options)?;
    debug!(
        source_dir = %config.source_dir.display(),
        prefix = %config.facility_prefix,
        "effective configuration"
    );

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Lookup { ids, json } => lookup(config, &ids, json),
        Commands::Repl => repl(config),
        Commands::Info => info(config),
        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn effective_config(args: &ConfigArgs) -> Result<LoaderConfig> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?,
        None => LoaderConfig::default(),
    };

    if let Some(dir) = &args.dir {
        config.source_dir = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.facility_prefix = prefix.clone();
    }
    if !args.keywords.is_empty() {
        config.keywords = args.keywords.clone();
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }
    if args.sheet.is_some() {
        config.sheet = args.sheet.clone();
    }
    Ok(config)
}

fn lookup(config: LoaderConfig, ids: &[String], json: bool) -> Result<ExitCode> {
    let resolver = Resolver::from_config(&config);
    let table = match Loader::new(config).load() {
        Ok(table) => table,
        Err(err) => {
            eprintln!("{}", describe_load_error(&err));
            return Ok(ExitCode::from(2));
        }
    };

    let mut all_found = true;
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let outcome = resolver.query(&table, id);
        all_found &= matches!(outcome, QueryOutcome::Found(_));
        outcomes.push(outcome);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &outcomes).context("Failed to write JSON")?;
        writeln!(out)?;
    } else {
        for outcome in &outcomes {
            write!(out, "{}", render_outcome(outcome, &table))?;
        }
    }

    Ok(if all_found {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn repl(config: LoaderConfig) -> Result<ExitCode> {
    let resolver = Resolver::from_config(&config);
    let cache = InventoryCache::new(Loader::new(config));

    // Load up front so a bad source is reported before the first query
    if let Err(err) = cache.get() {
        eprintln!("{}", describe_load_error(&err));
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match handle_line(&line, &cache, &resolver) {
            Reply::Quit => break,
            Reply::Print(text) => write!(stdout, "{}", text)?,
            Reply::Warn(text) => eprintln!("{}", text),
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// What the REPL does with one line of input
#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Quit,
    /// Text for stdout
    Print(String),
    /// Text for stderr
    Warn(String),
}

fn handle_line(line: &str, cache: &InventoryCache, resolver: &Resolver) -> Reply {
    match line.trim() {
        ":quit" | ":q" => Reply::Quit,
        // Empty input never reaches discovery or lookup
        "" => Reply::Print(render_ready(cache.cached().as_deref())),
        ":reload" => match cache.reload() {
            Ok(table) => {
                info!(rows = table.len(), boxes = table.box_count(), "inventory reloaded");
                Reply::Print(format!(
                    "reloaded {} rows, {} boxes\n",
                    table.len(),
                    table.box_count()
                ))
            }
            Err(err) => Reply::Warn(describe_load_error(&err)),
        },
        input => match cache.get() {
            Ok(table) => Reply::Print(render_outcome(&resolver.query(&table, input), &table)),
            // Reported now, retried on the next line
            Err(err) => {
                debug!(kind = ?err.kind(), "load failed");
                Reply::Warn(describe_load_error(&err))
            }
        },
    }
}

fn info(config: LoaderConfig) -> Result<ExitCode> {
    let table = match Loader::new(config).load() {
        Ok(table) => table,
        Err(err) => {
            eprintln!("{}", describe_load_error(&err));
            return Ok(ExitCode::from(2));
        }
    };

    if let Some(source) = table.source() {
        println!("Source: {}", source.display());
    }
    println!("Rows: {}", table.len());
    println!("Skipped rows: {}", table.skipped_rows());
    println!("Boxes: {}", table.box_count());
    Ok(ExitCode::SUCCESS)
}

/// Operator-facing message for each class of load failure
fn describe_load_error(err: &LoadError) -> String {
    match err {
        LoadError::SourceNotFound { directory, .. } => format!(
            "No inventory spreadsheet found in '{}'. Put the cable list there and try again.",
            directory.display()
        ),
        LoadError::Parse { path, source } => format!(
            "Could not read '{}': {}. Check that the file is a valid workbook and is not open for editing.",
            path.display(),
            source
        ),
        LoadError::SchemaMismatch { path, source } => format!(
            "'{}' does not look like the cable inventory: {}.",
            path.display(),
            source
        ),
    }
}

fn render_outcome(outcome: &QueryOutcome, table: &InventoryTable) -> String {
    match outcome {
        QueryOutcome::Idle => render_ready(Some(table)),
        QueryOutcome::NotFound { key } => format!("No circuit box matches {}.\n", key),
        QueryOutcome::Found(report) => render_report(report),
    }
}

fn render_ready(table: Option<&InventoryTable>) -> String {
    match table {
        Some(table) => format!("ready ({} boxes loaded)\n", table.box_count()),
        None => "ready (no inventory loaded)\n".to_string(),
    }
}

fn render_report(report: &BoxReport) -> String {
    let details = &report.details;
    let mut out = String::new();

    out.push_str(&format!("Box:      {} ({})\n", details.box_id, report.key));
    out.push_str(&format!("Hall:     {}\n", details.hall));
    out.push_str(&format!("Location: {}\n", details.location));
    if details.conflicting {
        out.push_str("Note:     rows for this box disagree; showing the first\n");
    }

    let headers = ("System", "Type", "Form");
    let groups = &report.interfaces;
    let w_sys = column_width(groups.iter().map(|g| g.system.as_str()), headers.0);
    let w_type = column_width(groups.iter().map(|g| g.connector_type.as_str()), headers.1);
    let w_form = column_width(groups.iter().map(|g| g.connector_form.as_str()), headers.2);

    out.push_str(&format!(
        "  {:<w_sys$}  {:<w_type$}  {:<w_form$}  Count\n",
        headers.0, headers.1, headers.2
    ));
    for g in &report.interfaces {
        out.push_str(&format!(
            "  {:<w_sys$}  {:<w_type$}  {:<w_form$}  {}\n",
            g.system, g.connector_type, g.connector_form, g.total
        ));
    }
    out
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &'a str) -> usize {
    values
        .chain(std::iter::once(header))
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
}
