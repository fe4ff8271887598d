use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Select;
use museum_caption::cli::{Cli, Commands, Language, PacingArgs};
use museum_caption::config::Config;
use museum_caption::error::CaptionError;
use museum_caption::export::RowSink;
use museum_caption::generator::GeminiClient;
use museum_caption::pipeline::{self, CancelFlag, RunContext, RunOptions};
use museum_caption::scanner::{self, ImageSource};
use museum_caption::spreadsheet::{self, clean, merge};
use museum_caption_common::schema::{LabelSchema, LanguageProfile, LANGUAGES};
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("museum_caption={0},museum_caption_common={0}", default_level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Language from the flag, or an interactive pick from the language table.
fn resolve_language(language: Option<Language>) -> Result<&'static LanguageProfile> {
    if let Some(Language(profile)) = language {
        return Ok(profile);
    }

    let names: Vec<&str> = LANGUAGES.iter().map(|l| l.name).collect();
    let index = Select::new()
        .with_prompt("Output language")
        .items(&names)
        .default(0)
        .interact()
        .context("language selection aborted")?;
    Ok(&LANGUAGES[index])
}

fn run_options(config: &Config, pacing: &PacingArgs) -> RunOptions {
    let mut options = RunOptions::from_config(config);
    if let Some(batch) = pacing.batch {
        options.batch = batch;
    }
    if let Some(window) = pacing.window {
        options.window = Duration::from_secs(window);
    }
    if let Some(max_images) = pacing.max_images {
        options.max_images = max_images;
    }
    options
}

/// Ctrl-C stops the run after the current object.
fn install_cancel_handler() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⚠ Ctrl-C received, finishing the current object...");
            flag.cancel();
        }
    });
    cancel
}

fn gemini_client(config: &Config) -> Result<GeminiClient> {
    let api_key = config.get_api_key()?;
    Ok(GeminiClient::new(config, api_key)?)
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn print_output(path: &Path) {
    println!("✔ Output: {}", path.display());
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Caption { input, output, language, recursive, pacing } => {
            println!("🖼  museum-caption - captions\n");
            let profile = resolve_language(language)?;
            let client = gemini_client(&config)?;

            println!("[1/2] Scanning images...");
            let source = ImageSource::open(&input, recursive)?;
            if source.images.is_empty() {
                return Err(CaptionError::FolderNotFound(format!("no images in {}", input.display())).into());
            }
            println!("✔ {} images found\n", source.images.len());

            println!("[2/2] Generating captions ({})...", profile.name);
            let schema = LabelSchema::for_language(profile);
            let mut sink = RowSink::create(&output, &headers(pipeline::CAPTION_HEADERS))?;
            let mut ctx = RunContext::new(&client, run_options(&config, &pacing), install_cancel_handler());
            let result = pipeline::run_caption(&mut ctx, &source.images, &schema, &mut sink).await;
            sink.finish()?;
            result?;

            ctx.summary.print();
            print_output(&output);
        }

        Commands::Enrich { images, sheet, output, language, with_category, pacing } => {
            println!("🏛  museum-caption - enriched descriptions\n");
            let profile = resolve_language(language)?;
            let client = gemini_client(&config)?;
            let options = run_options(&config, &pacing);

            println!("[1/3] Loading metadata...");
            let table = spreadsheet::read_sheet(&sheet)?;
            println!("✔ {} rows\n", table.len());

            println!("[2/3] Matching images to objects...");
            let source = ImageSource::open(&images, false)?;
            let (objects, stats) = pipeline::prepare_objects(&source.images, &table, &sheet, options.max_images)?;
            println!(
                "✔ {} objects ({} matched, {} without metadata, {} unused rows)\n",
                stats.groups, stats.matched, stats.unmatched, stats.unused_rows
            );
            if objects.is_empty() {
                println!("No object groups found (expected names like 1-1996-6864-000-a.jpg)");
                return Ok(());
            }

            println!("[3/3] Generating descriptions ({})...", profile.name);
            let schema = if with_category {
                LabelSchema::with_category(profile)
            } else {
                LabelSchema::for_language(profile)
            };
            let mut sink = RowSink::create(&output, &pipeline::enrich_headers(with_category))?;
            let mut ctx = RunContext::new(&client, options, install_cancel_handler());
            let result = pipeline::run_enrich(&mut ctx, &objects, &schema, &mut sink).await;
            sink.finish()?;
            result?;

            ctx.summary.print();
            print_output(&output);
        }

        Commands::Catalog { sheet, images, languages, output, pacing } => {
            println!("📚 museum-caption - catalog entries\n");
            let client = gemini_client(&config)?;
            let options = run_options(&config, &pacing);
            let profiles: Vec<&LanguageProfile> = languages.iter().map(|l| l.0).collect();

            println!("[1/2] Loading metadata...");
            let table = spreadsheet::read_sheet(&sheet)?;
            let objects = pipeline::collect_catalog_objects(&table, &sheet, &images, options.max_images)?;
            println!("✔ {} objects\n", objects.len());

            let names: Vec<&str> = profiles.iter().map(|p| p.name).collect();
            println!("[2/2] Generating entries ({})...", names.join(", "));
            let mut sink = RowSink::create(&output, &pipeline::catalog_headers(&profiles))?;
            let mut ctx = RunContext::new(&client, options, install_cancel_handler());
            let result = pipeline::run_catalog(&mut ctx, &objects, &profiles, &mut sink).await;
            sink.finish()?;
            result?;

            ctx.summary.print();
            print_output(&output);
        }

        Commands::Merge { inputs, output } => {
            println!("🔗 museum-caption - merge\n");
            let merged = merge::merge_files(&inputs, &output)?;
            println!("✔ {} files merged into {} objects", inputs.len(), merged.len());
            print_output(&output);
        }

        Commands::Clean { input, output } => {
            println!("🧹 museum-caption - clean\n");
            let raw = spreadsheet::read_sheet(&input)?;
            let cleaned = clean::clean_sheet(&raw);
            spreadsheet::write_csv(&cleaned, &output)?;
            println!("✔ {} rows cleaned", cleaned.len());
            print_output(&output);
        }

        Commands::CopyImages { sheet, from, to } => {
            println!("📁 museum-caption - copy images\n");
            let table = spreadsheet::read_sheet(&sheet)?;
            let identifiers = scanner::referenced_identifiers(&table, &sheet)?;
            println!("✔ {} object identifiers referenced", identifiers.len());

            let report = scanner::copy_images_by_id(&identifiers, &from, &to)?;
            println!("✔ {} images copied to {}", report.copied.len(), to.display());
            if report.duplicates > 0 {
                println!("  {} duplicate file names skipped", report.duplicates);
            }
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key stored");
            }

            if show {
                println!("Configuration ({}):", Config::config_path()?.display());
                println!("  model: {}", config.model);
                println!("  max image size: {}px", config.max_image_size);
                println!("  images per object: {}", config.max_images_per_object);
                println!(
                    "  pacing: {} requests / {}s (failure pause {}s)",
                    config.rate_limit_batch, config.rate_limit_window_secs, config.failure_pause_secs
                );
                println!("  retries: {}", config.max_retries);
                println!("  temperature: {}", config.temperature);
                println!(
                    "  API key: {}",
                    if config.get_api_key().is_ok() { "set" } else { "not set" }
                );
            }
        }
    }

    Ok(())
}
