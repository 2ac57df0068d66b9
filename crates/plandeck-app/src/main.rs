//! Plandeck application binary - composition root.
//!
//! Ties the Plandeck crates together into a console client:
//! 1. Load configuration from TOML
//! 2. Build the reqwest backend client
//! 3. Wire the dashboard (filters, list, selection, detail, chat)
//! 4. Run one headless pass: reload, select, and optionally ask
//!
//! Voice capabilities are environment-provided and not wired here; the
//! assistant is driven with `--question` instead.

mod cli;

use std::sync::Arc;

use clap::Parser;

use plandeck_api::HttpBackend;
use plandeck_core::PlandeckConfig;
use plandeck_dashboard::Dashboard;

use cli::CliArgs;

fn print_transcript(dashboard: &Dashboard) {
    for turn in dashboard.transcript() {
        println!("[{:?}] {}", turn.role, turn.text);
        for citation in turn.displayed_citations() {
            match &citation.url {
                Some(url) => println!("    see {} ({})", citation.reference, url),
                None => println!("    see {}", citation.reference),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = PlandeckConfig::load_or_default(&config_file);
    if let Some(url) = args.resolve_backend() {
        config.backend.base_url = url;
    }

    // Tracing.
    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Plandeck v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), backend = %config.backend.base_url, "Configuration loaded");

    // Backend client + dashboard.
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let dashboard = Arc::new(Dashboard::new(backend, &config));

    // Filters from the command line; the reload below picks them up.
    if let Some(council) = &args.council {
        dashboard.filters().set_group_filter(council);
    }
    if let Some(search) = &args.search {
        dashboard.filters().set_search_text(search);
    }
    if let Some(raw) = &args.min_activity {
        let applied = dashboard.filters().set_min_activity_input(raw);
        tracing::debug!(applied, "Minimum-activity filter set");
    }

    // List + default selection.
    if let Err(e) = dashboard.reload_bundles().await {
        tracing::warn!(error = %e, "Bundle list unavailable");
    }
    let bundles = dashboard.bundles();
    println!("{} bundle(s)", bundles.len());
    for bundle in &bundles {
        println!(
            "  {}  {}  {} application(s)  {}",
            bundle.id, bundle.group_name, bundle.activity_count, bundle.sample_label
        );
    }

    // Explicit selection override.
    if let Some(bundle_id) = &args.bundle {
        if let Err(e) = dashboard.select(bundle_id).await {
            tracing::warn!(bundle = %bundle_id, error = %e, "Detail load failed");
        }
    }

    if let Some(selected) = dashboard.selected() {
        println!("\nSelected: {}", selected);
        if let Some(overview) = dashboard.overview() {
            println!("Stage: {}", overview.stage);
            println!("Records: {}", overview.commit_count);
            for insight in &overview.insights {
                println!("  - {}", insight);
            }
        }
        let history = dashboard.history();
        println!("History ({} record(s)):", history.len());
        for commit in &history {
            println!(
                "  {}  {}  {}  {}",
                commit.event_timestamp, commit.reference, commit.decision, commit.heading
            );
        }

        // One-shot question.
        if let Some(question) = &args.question {
            if let Err(e) = dashboard.ask(question).await {
                tracing::warn!(error = %e, "Question rejected");
            }
            println!();
            print_transcript(&dashboard);
        }
    } else if args.question.is_some() {
        tracing::warn!("No bundle selected; question skipped");
    }

    if let Some(message) = dashboard.last_error() {
        eprintln!("warning: {}", message);
    }

    Ok(())
}
