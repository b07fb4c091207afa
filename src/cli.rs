use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, error::ErrorKind};
use tracing::info;

use crate::cascade::{BuildSummary, Cascade, CascadeBuilder};
use crate::config::GeneratorConfig;
use crate::constants::duty::DEFAULT_REFERENCE_YEAR;
use crate::constants::pages::{DEFAULT_OUTPUT_DIR, DEFAULT_SITE_URL};
use crate::duty::{DutyCalculator, DutyOutcome, Ineligibility};
use crate::pages::{GenerationReport, PageEnumerator};
use crate::render::HtmlRenderer;
use crate::transport::fs::{
    FsPageSink, load_cascade, load_rate_config, load_records, write_cascade,
};
use crate::types::{Valuation, Year};
use crate::utils::format_kes;

#[derive(Debug, Parser)]
#[command(
    name = "dutycheck",
    version,
    disable_help_subcommand = true,
    about = "CRSP cascade builder and import-duty page generator",
    long_about = "Normalize extracted CRSP records into a category/make/model cascade, then compute import duty per manufacture year and write one static page per vehicle.",
    after_help = "Set RUST_LOG (for example RUST_LOG=info) to see progress logs."
)]
struct DutyCheckCli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the cascade artifact from extracted vehicle and motorcycle records.
    BuildCascade(BuildCascadeArgs),
    /// Generate static duty pages from a cascade artifact.
    Generate(GenerateArgs),
    /// Print the duty breakdown for one valuation and manufacture year.
    Quote(QuoteArgs),
}

#[derive(Debug, Args)]
struct BuildCascadeArgs {
    #[arg(long, value_name = "PATH", help = "Extracted motor-vehicle records (JSON array)")]
    vehicles: PathBuf,
    #[arg(long, value_name = "PATH", help = "Extracted motorcycle records (JSON array)")]
    motorcycles: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Where to write the compact cascade JSON")]
    out: PathBuf,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long, value_name = "PATH", help = "Cascade artifact written by build-cascade")]
    cascade: PathBuf,
    #[arg(long, value_name = "PATH", help = "Rate configuration JSON")]
    rates: PathBuf,
    #[arg(
        long = "out-dir",
        value_name = "DIR",
        default_value = DEFAULT_OUTPUT_DIR,
        help = "Output root for generated pages"
    )]
    out_dir: PathBuf,
    #[arg(
        long = "reference-year",
        value_name = "YEAR",
        help = "Reference year for vehicle ages (overrides the rate file)"
    )]
    reference_year: Option<Year>,
    #[arg(long = "year-pages", help = "Also write one page per eligible manufacture year")]
    year_pages: bool,
    #[arg(long, help = "Remove stale category pages not produced by this run")]
    prune: bool,
    #[arg(
        long = "site-url",
        value_name = "URL",
        default_value = DEFAULT_SITE_URL,
        help = "Canonical site origin used in page metadata"
    )]
    site_url: String,
}

#[derive(Debug, Args)]
struct QuoteArgs {
    #[arg(long, value_name = "PATH", help = "Rate configuration JSON; defaults apply when omitted")]
    rates: Option<PathBuf>,
    #[arg(
        long,
        value_name = "KES",
        value_parser = parse_positive_valuation,
        help = "CRSP base valuation in KES"
    )]
    crsp: Valuation,
    #[arg(long, value_name = "YEAR", help = "Manufacture year")]
    year: Year,
    #[arg(
        long = "reference-year",
        value_name = "YEAR",
        help = "Reference year for vehicle age (overrides the rate file)"
    )]
    reference_year: Option<Year>,
}

/// Entry point for the `dutycheck` binary. `args_iter` excludes the program name.
pub fn run<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) =
        parse_cli::<DutyCheckCli, _>(std::iter::once("dutycheck".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    match cli.command {
        Command::BuildCascade(args) => run_build_cascade(&args),
        Command::Generate(args) => run_generate(&args),
        Command::Quote(args) => run_quote(&args),
    }
}

fn run_build_cascade(args: &BuildCascadeArgs) -> Result<(), Box<dyn Error>> {
    let vehicles = load_records(&args.vehicles)?;
    let motorcycles = match &args.motorcycles {
        Some(path) => load_records(path)?,
        None => Vec::new(),
    };

    let mut builder = CascadeBuilder::new();
    builder.extend_vehicles(&vehicles);
    builder.extend_motorcycles(&motorcycles);
    let (cascade, summary) = builder.finish();
    write_cascade(&args.out, &cascade)?;
    info!(path = %args.out.display(), "[dutycheck:cli] cascade written");

    print_build_summary(&cascade, &summary, &args.out);
    Ok(())
}

fn run_generate(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let rates = load_rate_config(&args.rates)?;
    let cascade = load_cascade(&args.cascade)?;
    let reference_year = args
        .reference_year
        .or(rates.reference_year)
        .unwrap_or(DEFAULT_REFERENCE_YEAR);
    let calculator = DutyCalculator::new(rates, reference_year)?;

    let config = GeneratorConfig {
        site_url: args.site_url.clone(),
        year_pages: args.year_pages,
        prune_stale: args.prune,
    };
    let sink = FsPageSink::new(&args.out_dir);
    let report = PageEnumerator::new(&cascade, &calculator)
        .with_config(config)
        .generate(&HtmlRenderer, &sink)?;

    print_generation_report(&cascade, &report, sink.root(), &calculator);
    if !report.is_complete() {
        return Err(format!("{} page(s) failed to render or write", report.failures.len()).into());
    }
    Ok(())
}

fn run_quote(args: &QuoteArgs) -> Result<(), Box<dyn Error>> {
    let rates = match &args.rates {
        Some(path) => load_rate_config(path)?,
        None => Default::default(),
    };
    let reference_year = args
        .reference_year
        .or(rates.reference_year)
        .unwrap_or(DEFAULT_REFERENCE_YEAR);
    let calculator = DutyCalculator::new(rates, reference_year)?;

    println!("=== duty quote ===");
    println!("crsp: {}", format_kes(args.crsp));
    println!("manufacture year: {}", args.year);
    println!("reference year: {reference_year}");
    match calculator.compute(args.crsp, args.year)? {
        DutyOutcome::Eligible(breakdown) => {
            println!(
                "age: {} (depreciation {}%)",
                breakdown.age, breakdown.depreciation_pct
            );
            println!("  customs value: {}", format_kes(breakdown.customs_value));
            println!("  import duty:   {}", format_kes(breakdown.import_duty));
            println!("  excise duty:   {}", format_kes(breakdown.excise_duty));
            println!("  vat:           {}", format_kes(breakdown.vat));
            println!("  idf:           {}", format_kes(breakdown.idf));
            println!("  rdl:           {}", format_kes(breakdown.rdl));
            println!("  total duty:    {}", format_kes(breakdown.total));
        }
        DutyOutcome::Ineligible(Ineligibility::TooOld { age, max_age }) => {
            println!("not importable: {age} years old (limit {max_age})");
        }
        DutyOutcome::Ineligible(Ineligibility::NotYetManufactured { year, reference_year }) => {
            println!("not importable: {year} is after reference year {reference_year}");
        }
    }
    Ok(())
}

fn print_build_summary(cascade: &Cascade, summary: &BuildSummary, out: &Path) {
    println!("=== cascade build ===");
    println!("output: {}", out.display());
    println!(
        "records seen: {} vehicles, {} motorcycles",
        summary.vehicles_seen, summary.motorcycles_seen
    );
    println!(
        "skipped: {} unmapped body type, {} incomplete",
        summary.skipped_unmapped, summary.skipped_incomplete
    );
    println!("duplicates collapsed: {}", summary.duplicates_collapsed);
    println!();
    println!("[CATEGORIES]");
    for stats in cascade.stats() {
        println!(
            "  {:<16} {:>5} makes {:>6} models",
            stats.category.display_name(),
            stats.makes,
            stats.models
        );
    }
    println!(
        "  {:<16} {:>5} makes {:>6} models",
        "total",
        cascade.make_count(),
        cascade.leaf_count()
    );
    if !summary.unmapped_labels.is_empty() {
        println!();
        println!("[UNMAPPED BODY TYPES]");
        for (label, count) in &summary.unmapped_labels {
            let label = if label.is_empty() { "(empty)" } else { label.as_str() };
            println!("  {label}: {count}");
        }
    }
}

fn print_generation_report(
    cascade: &Cascade,
    report: &GenerationReport,
    root: &Path,
    calculator: &DutyCalculator,
) {
    println!("=== page generation ===");
    println!("output root: {}", root.display());
    println!(
        "reference year: {} (oldest importable: {})",
        calculator.reference_year(),
        calculator.oldest_eligible_year()
    );
    println!(
        "cascade: {} categories, {} makes, {} models",
        cascade.categories().len(),
        cascade.make_count(),
        cascade.leaf_count()
    );
    println!(
        "written: {} category, {} make, {} model, {} year pages",
        report.written.category_pages,
        report.written.make_pages,
        report.written.model_pages,
        report.written.year_pages
    );
    if report.pruned > 0 {
        println!("pruned stale pages: {}", report.pruned);
    }
    if !report.failures.is_empty() {
        println!();
        println!("[FAILURES]");
        for failure in &report.failures {
            println!("  {}: {}", failure.path, failure.error);
        }
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_positive_valuation(raw: &str) -> Result<Valuation, String> {
    let parsed = raw.replace(',', "").parse::<Valuation>().map_err(|_| {
        format!("Could not parse --crsp value '{raw}' as a positive whole KES amount")
    })?;
    if parsed == 0 {
        return Err("--crsp must be greater than zero".to_string());
    }
    Ok(parsed)
}
