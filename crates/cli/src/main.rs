// LabWired - Device Catalog Sync
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! `catalog-sync`: reconciles a CMSIS-SVD peripheral map against the
//! LabWired device catalog.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use catalog_config::SyncSettings;
use catalog_core::{sync_document, RunSummary, SyncOptions};
use catalog_store::http::HttpStore;
use catalog_store::memory::MemoryStore;
use clap::Parser;

const EXIT_OK: u8 = 0;
const EXIT_SYNC_ERROR: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

/// Reconcile a CMSIS-SVD peripheral map against the device catalog.
///
/// Records are created where missing and overwritten where their content
/// differs; records the document does not mention are left untouched.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to the SVD document to reconcile
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store base URL (overrides the configuration file)
    #[arg(long)]
    url: Option<String>,

    /// API token (overrides CATALOG_SYNC_TOKEN and the configuration file)
    #[arg(long)]
    token: Option<String>,

    /// Vendor name used when the document does not declare one
    #[arg(long)]
    vendor: Option<String>,

    /// Walk the document against an empty in-memory store instead of the
    /// service, reporting what a real run would create
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose tracing output
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.trace {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match run_sync(&cli, &settings) {
        Ok(summary) => {
            report(&summary);
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_SYNC_ERROR)
        }
    }
}

fn load_settings(cli: &Cli) -> anyhow::Result<SyncSettings> {
    let mut settings = match (&cli.config, &cli.url) {
        (Some(path), _) => SyncSettings::from_file(path)?,
        (None, Some(url)) => SyncSettings::for_url(url),
        (None, None) if cli.dry_run => SyncSettings::for_url("memory"),
        (None, None) => anyhow::bail!("either --config or --url is required"),
    };
    if let Some(url) = &cli.url {
        settings.store.base_url = url.clone();
    }
    if let Some(token) = resolve_token(cli) {
        settings.store.api_token = Some(token);
    }
    if let Some(vendor) = &cli.vendor {
        settings.vendor = Some(vendor.clone());
    }
    settings.validate()?;
    Ok(settings)
}

/// Token precedence: --token flag, then CATALOG_SYNC_TOKEN, then the
/// configuration file.
fn resolve_token(cli: &Cli) -> Option<String> {
    cli.token.clone().or_else(|| {
        std::env::var("CATALOG_SYNC_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
    })
}

fn run_sync(cli: &Cli, settings: &SyncSettings) -> anyhow::Result<RunSummary> {
    let xml = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read SVD document: {}", cli.input.display()))?;

    let options = SyncOptions {
        fallback_vendor: settings.vendor.clone(),
        default_protection: Some(settings.default_protection.clone()),
    };

    if cli.dry_run {
        let store = MemoryStore::new();
        let summary = sync_document(&xml, &store, &options)?;
        return Ok(summary);
    }

    let store = HttpStore::new(
        &settings.store.base_url,
        settings.store.api_token.clone(),
        Duration::from_secs(settings.store.timeout_secs),
    )?;
    let summary = sync_document(&xml, &store, &options)?;
    Ok(summary)
}

fn report(summary: &RunSummary) {
    for collection in summary.collections() {
        let counts = summary.counts(collection);
        tracing::info!(
            "{}: {} created, {} updated, {} unchanged",
            collection,
            counts.created,
            counts.updated,
            counts.unchanged
        );
    }
    if !summary.wrote() {
        tracing::info!("Store already up to date");
    }
}
