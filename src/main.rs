//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner extraction engine.
//! It runs a rule-set file against a locally saved HTML document and prints
//! the extracted fields, emitted documents and surviving outlinks.

use chrono::{Local, NaiveDate, TimeZone};
use clap::Parser;
use gleaner::config::load_rulesets_with_hash;
use gleaner::rules::compile_rulesets;
use gleaner::{process_document, ExtractionContext, Freshness, HtmlDocument};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a rule-driven extraction engine
///
/// Gleaner applies declarative per-site rule-sets to HTML documents,
/// extracting structured fields, synthesizing documents from listing rows
/// and classifying outlinks by content freshness.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "0.1.0")]
#[command(about = "A rule-driven extraction engine", long_about = None)]
struct Cli {
    /// Path to TOML rule-set file
    #[arg(value_name = "RULES")]
    rules: PathBuf,

    /// Path to the HTML document to extract from
    #[arg(value_name = "HTML", required_unless_present = "dry_run")]
    html: Option<PathBuf>,

    /// URL the document was fetched from; outlinks resolve against it
    #[arg(short, long, default_value = "http://localhost/")]
    url: String,

    /// Last fetch date of the URL (YYYY-MM-DD); enables pagination analysis
    #[arg(long, value_name = "DATE")]
    last_fetch: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the rule-set and show what it declares without extracting
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate the rule-set file
    tracing::info!("Loading rule-sets from: {}", cli.rules.display());
    let (config, hash) = match load_rulesets_with_hash(&cli.rules) {
        Ok((config, hash)) => {
            tracing::info!("Rule-sets loaded successfully (hash: {})", hash);
            (config, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load rule-sets: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        return handle_dry_run(&config, &hash);
    }

    let rulesets = compile_rulesets(&config)?;

    // The HTML argument is mandatory outside --dry-run
    let Some(html_path) = cli.html else {
        return Err("an HTML document path is required".into());
    };
    let html = std::fs::read_to_string(&html_path)?;
    let doc = HtmlDocument::parse(&html);

    let mut ctx = ExtractionContext::new(cli.url.clone());
    if let Some(date) = &cli.last_fetch {
        ctx.last_fetch_time = Some(parse_last_fetch(date)?);
    }

    let outcome = process_document(&doc, &rulesets, &ctx)?;
    print_outcome(&outcome.result, outcome.freshness);

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Parses the --last-fetch date argument as local midnight.
fn parse_last_fetch(date: &str) -> Result<chrono::DateTime<Local>, Box<dyn std::error::Error>> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    let midnight = day.and_hms_opt(0, 0, 0).ok_or("invalid time of day")?;
    Local
        .from_local_datetime(&midnight)
        .single()
        .ok_or_else(|| format!("ambiguous local date: {}", date).into())
}

/// Handles the --dry-run mode: validates the rule-set file and shows what
/// each rule-set declares
fn handle_dry_run(
    config: &gleaner::EngineConfig,
    hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Gleaner Dry Run ===\n");
    println!("Rule-set hash: {}", hash);
    println!("Rule-sets ({}):", config.rulesets.len());

    for ruleset in &config.rulesets {
        println!("  - {}", ruleset.name.as_deref().unwrap_or("<unnamed>"));
        if let Some(url_filter) = &ruleset.url_filter_regex {
            println!("    URL filter: {}", url_filter);
        }
        if let Some(query) = &ruleset.content_filter_query {
            println!(
                "    Content filter: {} =~ {}",
                query,
                ruleset.content_filter_regex.as_deref().unwrap_or(".*")
            );
        }
        println!("    Fields ({}):", ruleset.fields.len());
        for field in &ruleset.fields {
            println!(
                "      * {} ({:?}) <- {}",
                field.name,
                field.kind,
                field.query.as_deref().unwrap_or("<supplied>")
            );
        }
        if !ruleset.outlink_filters.is_empty() {
            println!("    Outlink filters: {}", ruleset.outlink_filters.len());
        }
    }

    println!("\n✓ Rule-set file is valid");
    Ok(())
}

/// Prints an extraction outcome in a human-readable layout
fn print_outcome(result: &gleaner::ExtractionResult, freshness: Freshness) {
    println!("=== Extraction Result ===\n");

    println!("Freshness: {:?}", freshness);

    println!("\nFields:");
    for (name, values) in result.fields.iter() {
        for value in values {
            println!("  {} = {}", name, value);
        }
    }

    if !result.document_meta.is_empty() {
        println!("\nDocument metadata:");
        for (key, value) in result.document_meta.iter() {
            println!("  {} = {}", key, value);
        }
    }

    if !result.documents.is_empty() {
        println!("\nEmitted documents ({}):", result.documents.len());
        for doc in &result.documents {
            println!("  - {}", doc.url);
            for (key, value) in doc.metadata.iter() {
                println!("      {} = {}", key, value);
            }
        }
    }

    println!("\nOutlinks ({}):", result.outlinks.len());
    for link in &result.outlinks {
        println!("  - {} [{}]", link.url, link.anchor);
        for (key, value) in link.metadata.iter() {
            println!("      {} = {}", key, value);
        }
    }
}
