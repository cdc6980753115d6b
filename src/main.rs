// src/main.rs
mod config;
mod extractors;
mod pdf;
mod sheets;
mod utils;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use config::{AppConfig, ExtractionMode, LoadOptions};
use extractors::KeywordExtractor;
use sheets::{CellValue, Endpoints, ServiceAccountKey, SheetsClient};
use utils::AppError;

/// Extracts balance-sheet figures from a PDF and writes them into a Google Sheet
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// PDF document to read
    #[arg(short, long, default_value = "BSC.pdf")]
    pdf: PathBuf,

    /// Keyword configuration file (JSON)
    #[arg(short, long, default_value = "config_BSC.json")]
    config: PathBuf,

    /// Google service account key file
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Print the extracted values as JSON instead of writing to the sheet
    #[arg(long)]
    dry_run: bool,

    /// Debug mode - verbose logging and dumps of the extracted text
    #[arg(short, long)]
    debug: bool,

    /// Directory for debug dumps
    #[arg(long, default_value = "./debug")]
    debug_dir: PathBuf,

    /// Accept between_phrases entries without both phrases (their cells are left as not found)
    #[arg(long)]
    lenient_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    // 1. Parse CLI Arguments
    let args = Args::parse();

    // 2. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging(args.debug);
    tracing::info!("Starting processing for args: {:?}", args);

    // 3. Load keyword configuration
    let config = config::load_config(
        &args.config,
        LoadOptions {
            lenient: args.lenient_config,
        },
    )?;

    // 4. Extract the document text
    let text = pdf::extract_text_from_pdf(&args.pdf)?;

    if args.debug {
        write_debug_dump(&args.debug_dir, &text, &config)?;
    }

    // 5. Find the tax identifier and run the keyword patterns
    let tax_id = extractors::find_tax_id(&text);
    println!(
        "First tax ID found: {}",
        tax_id.unwrap_or(&config.not_found_text)
    );

    let results = KeywordExtractor::new(&config.keywords).extract(&text);
    if results.is_empty() {
        tracing::warn!("No keywords configured; only the tax ID will be written");
    }
    tracing::info!(
        "Extracted {} cells ({} not found)",
        results.len(),
        results.miss_count()
    );

    if args.dry_run {
        print_dry_run(&config, tax_id, &results)?;
        return Ok(());
    }

    // 6. Write everything to the sheet
    let key = ServiceAccountKey::from_file(&args.credentials)?;
    let client = SheetsClient::connect(&key, Endpoints::default(), config.value_input_option).await?;
    let mut worksheet = client.open_worksheet(&config.sheet).await?;
    tracing::info!("Writing to spreadsheet {}", worksheet.spreadsheet_id());

    let summary = sheets::write_results(
        &mut worksheet,
        &config.identifier_cell,
        tax_id,
        &results,
        &config.not_found_text,
    )
    .await?;

    tracing::info!(
        "Processing finished. Written: {}, Not found: {}",
        summary.written,
        summary.misses
    );
    println!(
        "Data written to '{}' / '{}'.",
        config.sheet.sheet_name, config.sheet.worksheet_name
    );

    Ok(())
}

fn print_dry_run(
    config: &AppConfig,
    tax_id: Option<&str>,
    results: &extractors::ExtractionResult,
) -> Result<(), AppError> {
    let mut cells: BTreeMap<String, CellValue> = sheets::render_results(results, &config.not_found_text)
        .into_iter()
        .map(|(cell, value)| (cell.to_string(), value))
        .collect();
    cells.insert(
        config.identifier_cell.to_string(),
        CellValue::Text(tax_id.unwrap_or(&config.not_found_text).to_string()),
    );

    let report = serde_json::json!({
        "spreadsheet": config.sheet.sheet_name,
        "worksheet": config.sheet.worksheet_name,
        "cells": cells,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn write_debug_dump(debug_dir: &Path, text: &str, config: &AppConfig) -> Result<(), AppError> {
    std::fs::create_dir_all(debug_dir)?;

    let raw_path = debug_dir.join("extracted_text.txt");
    std::fs::write(&raw_path, text)?;
    tracing::info!("Saved extracted text to: {}", raw_path.display());

    let mut patterns = vec![(
        extractors::identifier::tax_id_pattern().to_string(),
        "tax_id".to_string(),
    )];
    for spec in &config.keywords {
        match &spec.mode {
            ExtractionMode::BetweenPhrases {
                start_phrase,
                end_phrase,
            } => {
                for (phrase, role) in [(start_phrase, "start"), (end_phrase, "end")] {
                    if let Some(phrase) = phrase {
                        patterns.push((regex::escape(phrase), format!("{}:{}", role, spec.keyword)));
                    }
                }
            }
            _ => patterns.push((regex::escape(&spec.keyword), format!("kw:{}", spec.keyword))),
        }
    }

    let annotated_path = debug_dir.join("annotated_text.txt");
    if let Err(e) = utils::text_debug::create_debug_text(text, &annotated_path, &patterns) {
        tracing::warn!("Failed to create annotated debug text: {}", e);
    }
    Ok(())
}
