use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use elections_to_watch::config::Config;
use elections_to_watch::logging::init_logging;
use elections_to_watch::pipeline::processing::builder::ElectionRecordBuilder;
use elections_to_watch::pipeline::processing::deadline::DeadlineResolver;
use elections_to_watch::pipeline::processing::extract::CandidateExtractor;
use elections_to_watch::pipeline::processing::schema::DocumentSchema;
use elections_to_watch::pipeline::processing::validate::Validator;
use elections_to_watch::pipeline::{AggregationOptions, AggregationPipeline};
use elections_to_watch::registry::JurisdictionRegistry;
use elections_to_watch::sources::{
    CsvTabularReader, ElectionSource, ElectionsSheetSource, FilePageFetcher, HttpPageFetcher,
    LogisticsSheetSource, ScrapedPageSource,
};
use elections_to_watch::store::{DocumentManager, JsonFileStore};

#[derive(Parser)]
#[command(name = "elections_to_watch")]
#[command(about = "Aggregate per-state election data into one validated document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect all sources, merge, validate and write the document
    Aggregate(AggregateArgs),
    /// Validate an existing document
    Validate {
        /// Path to the document JSON file
        path: PathBuf,
        /// Also check against the JSON Schema
        #[arg(long)]
        schema: bool,
        /// Schema file to use instead of the bundled one
        #[arg(long, requires = "schema")]
        schema_file: Option<PathBuf>,
    },
    /// List known jurisdictions with their codes
    Registry,
}

#[derive(Args)]
struct AggregateArgs {
    /// Elections sheet exported as CSV
    #[arg(long)]
    elections_csv: Option<PathBuf>,
    /// Logistics sheet exported as CSV
    #[arg(long)]
    logistics_csv: Option<PathBuf>,
    /// Directory of pre-downloaded pages named <CODE>.html
    #[arg(long)]
    pages_dir: Option<PathBuf>,
    /// Fetch pages over HTTP using [sources] page_url_template
    #[arg(long)]
    pages_url: bool,
    /// Document to update (overrides config and environment)
    #[arg(long)]
    document: Option<PathBuf>,
    /// Configuration file (defaults to config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Build and validate without writing
    #[arg(long)]
    dry_run: bool,
    /// Write even if validation fails
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Aggregate(args) => aggregate(args),
        Commands::Validate {
            path,
            schema,
            schema_file,
        } => validate(path, schema, schema_file),
        Commands::Registry => {
            for entry in JurisdictionRegistry::new().entries() {
                println!(
                    "{}  {:<22} {}",
                    entry.code, entry.name, entry.default_registration_website
                );
            }
            Ok(())
        }
    }
}

fn aggregate(args: AggregateArgs) -> Result<()> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(document) = args.document {
        config.document.path = document;
    }
    info!(document = %config.document.path.display(), "Configuration loaded");

    let registry = JurisdictionRegistry::new();
    let calendar = config.calendar();
    let extractor = CandidateExtractor::default();
    let builder = ElectionRecordBuilder::new(&calendar, &extractor);
    let deadlines = DeadlineResolver::new(&calendar);
    let prefix = config.sources.reserved_row_prefix.as_str();

    let mut sources: Vec<Box<dyn ElectionSource + '_>> = Vec::new();
    if let Some(path) = &args.elections_csv {
        sources.push(Box::new(ElectionsSheetSource::new(
            CsvTabularReader::new(path),
            &registry,
            builder,
            prefix,
        )));
    }
    if let Some(path) = &args.logistics_csv {
        sources.push(Box::new(LogisticsSheetSource::new(
            CsvTabularReader::new(path),
            &registry,
            builder,
            deadlines,
            prefix,
        )));
    }
    if let Some(dir) = &args.pages_dir {
        sources.push(Box::new(ScrapedPageSource::new(
            FilePageFetcher::new(dir),
            &registry,
            builder,
        )));
    }
    if args.pages_url {
        let template = config
            .sources
            .page_url_template
            .clone()
            .context("--pages-url needs [sources] page_url_template in the configuration")?;
        let fetcher = HttpPageFetcher::new(
            template,
            Duration::from_secs(config.sources.page_timeout_secs),
        )?;
        sources.push(Box::new(ScrapedPageSource::new(fetcher, &registry, builder)));
    }

    let manager = DocumentManager::new(JsonFileStore::new(&config.document.path));
    let pipeline = AggregationPipeline::new(
        &registry,
        &calendar,
        manager,
        AggregationOptions {
            dry_run: args.dry_run,
            force: args.force,
        },
    );

    let refs: Vec<&dyn ElectionSource> = sources.iter().map(|s| s.as_ref()).collect();
    let report = pipeline.run(&refs)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate(path: PathBuf, schema: bool, schema_file: Option<PathBuf>) -> Result<()> {
    let data = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;

    let registry = JurisdictionRegistry::new();
    let mut problems: Vec<String> = match Validator::with_registry(&registry).validate(&document) {
        Ok(()) => Vec::new(),
        Err(violations) => violations.iter().map(ToString::to_string).collect(),
    };

    if schema {
        let compiled = match schema_file {
            Some(file) => DocumentSchema::from_path(&file)?,
            None => DocumentSchema::bundled()?,
        };
        if let Err(errors) = compiled.check(&document) {
            problems.extend(errors);
        }
    }

    if problems.is_empty() {
        println!("valid");
        return Ok(());
    }

    error!(count = problems.len(), path = %path.display(), "Document is invalid");
    eprintln!("invalid:");
    for problem in &problems {
        eprintln!("- {}", problem);
    }
    std::process::exit(1)
}
