//! Drug usage CLI
//!
//! Looks up an active ingredient in a reimbursement dataset and prints the
//! detail and rollup tables.

mod render;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use drug_usage_core::export::select_view;
use drug_usage_core::{
    AliasTable, Dataset, QueryEngine, QueryOutcome, ResolutionMethod, ResolverConfig, ViewKind,
};

use render::render_table;

#[derive(Parser, Debug)]
#[command(name = "drug-usage")]
#[command(about = "Query reimbursement drug usage by active ingredient")]
#[command(version)]
struct Cli {
    /// Active ingredient, alias or brand name
    query: String,

    /// Reimbursement dataset (CSV)
    #[arg(long, env = "DRUG_USAGE_DATASET")]
    dataset: PathBuf,

    /// Alias table (JSON object of canonical name to aliases); built-in table if omitted
    #[arg(long, env = "DRUG_USAGE_ALIASES")]
    aliases: Option<PathBuf>,

    /// Minimum similarity (0-1] for fuzzy correction
    #[arg(long, default_value_t = drug_usage_core::resolver::DEFAULT_MATCH_THRESHOLD)]
    threshold: f64,

    /// Which table to print
    #[arg(long, value_enum, default_value_t = ViewArg::All)]
    view: ViewArg,

    /// Write the selected view as CSV (by-name summary when --view=all)
    #[arg(long, num_args = 0..=1, require_equals = true)]
    export: Option<Option<PathBuf>>,

    /// Print the JSON report instead of tables
    #[arg(long)]
    json: bool,

    /// Number of "did you mean" suggestions when the query is not recognized
    #[arg(long, default_value = "3")]
    suggest: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    All,
    Detail,
    ByName,
    ByManufacturer,
}

impl ViewArg {
    fn kinds(self) -> Vec<ViewKind> {
        match self {
            ViewArg::All => vec![ViewKind::Detail, ViewKind::ByName, ViewKind::ByManufacturer],
            ViewArg::Detail => vec![ViewKind::Detail],
            ViewArg::ByName => vec![ViewKind::ByName],
            ViewArg::ByManufacturer => vec![ViewKind::ByManufacturer],
        }
    }

    fn export_kind(self) -> ViewKind {
        match self {
            ViewArg::All | ViewArg::ByName => ViewKind::ByName,
            ViewArg::Detail => ViewKind::Detail,
            ViewArg::ByManufacturer => ViewKind::ByManufacturer,
        }
    }
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    run(&cli, &mut stdout.lock())
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    if cli.query.trim().is_empty() {
        anyhow::bail!("query is required");
    }

    let aliases = match &cli.aliases {
        Some(path) => AliasTable::from_path(path)
            .with_context(|| format!("failed to load alias table {}", path.display()))?,
        None => AliasTable::builtin(),
    };
    let engine = QueryEngine::with_config(
        aliases,
        ResolverConfig {
            match_threshold: cli.threshold,
        },
    )?;

    let dataset = Dataset::from_path(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;

    let outcome = engine.query(&cli.query, &dataset)?;

    if cli.json {
        writeln!(out, "{}", outcome.report().to_json()?)?;
    } else {
        print_outcome(cli, &engine, &outcome, out)?;
    }

    if let Some(target) = &cli.export {
        let kind = cli.view.export_kind();
        let path = target
            .clone()
            .unwrap_or_else(|| PathBuf::from(outcome.export_file_name(kind)));
        let bytes = outcome.export_csv(kind)?;
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "exported view");
        if !cli.json {
            writeln!(out, "Exported to {}", path.display())?;
        }
    }

    Ok(())
}

fn print_outcome(
    cli: &Cli,
    engine: &QueryEngine,
    outcome: &QueryOutcome,
    out: &mut impl Write,
) -> Result<()> {
    let resolved = &outcome.resolved;
    match &resolved.method {
        ResolutionMethod::Fuzzy { matched, score } => writeln!(
            out,
            "Searching \"{}\" (corrected from \"{}\" via \"{}\", similarity {:.2})",
            resolved.term,
            resolved.original.as_deref().unwrap_or(&outcome.query),
            matched,
            score
        )?,
        ResolutionMethod::Alias { alias } => {
            writeln!(out, "Searching \"{}\" (alias \"{}\")", resolved.term, alias)?
        }
        ResolutionMethod::Exact | ResolutionMethod::Literal => {
            writeln!(out, "Searching \"{}\"", resolved.term)?
        }
    }

    if outcome.is_empty() {
        writeln!(out, "No matching records.")?;
        if resolved.method == ResolutionMethod::Literal && cli.suggest > 0 {
            let suggestions = engine.candidates(&outcome.query, cli.suggest);
            if !suggestions.is_empty() {
                let names: Vec<&str> = suggestions.iter().map(|c| c.canonical.as_str()).collect();
                writeln!(out, "Did you mean: {}", names.join(", "))?;
            }
        }
        return Ok(());
    }

    for kind in cli.view.kinds() {
        writeln!(out)?;
        writeln!(out, "{}", title(kind))?;
        write!(out, "{}", render_table(select_view(&outcome.views, kind)))?;
    }

    Ok(())
}

fn title(kind: ViewKind) -> &'static str {
    match kind {
        ViewKind::Detail => "Detail (per record)",
        ViewKind::ByName => "Summary by drug name",
        ViewKind::ByManufacturer => "Summary by manufacturer",
    }
}
