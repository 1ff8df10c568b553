//! # Hamro Khabar
//!
//! A Nepali news aggregator that scrapes headlines from a news portal,
//! voices every title and body through a text-to-speech API, and serves the
//! result over a paginated JSON API.
//!
//! ## Features
//!
//! - Periodic scrape of the portal's news cards and their detail sections
//! - Base64 speech for each title and body, cached across refreshes
//! - Atomic snapshot swap: readers never see a half-built list
//! - A separate ledger of submitted articles, merged in on the next refresh
//! - Daily rashifal (zodiac forecasts) on its own timer
//!
//! ## Usage
//!
//! ```sh
//! hamro_khabar --bind-addr 0.0.0.0:3001 --refresh-interval-secs 900
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: listing page, then each article's detail section
//! 2. **Synthesizing**: title and body audio, one article at a time
//! 3. **Swapping**: merge submissions and publish the new snapshot
//! 4. **Serving**: axum handlers read whichever snapshot is current

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod ledger;
mod models;
mod refresh;
mod routes;
mod scrapers;
mod speech;
mod state;
mod store;
mod timefmt;
mod utils;

use cli::Cli;
use config::Settings;
use ledger::SubmissionLedger;
use refresh::{ForecastRefresher, RefreshScheduler, spawn_periodic};
use scrapers::HttpPageFetcher;
use scrapers::hamropatro::SourceFetcher;
use speech::{MicMonsterApi, SpeechSynthesizer};
use state::AppState;
use store::{ArticleStore, ForecastStore};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("hamro_khabar starting up");

    let args = Cli::parse();
    let settings = Settings::resolve(&args).inspect_err(|e| error!(error = %e, "Bad settings"))?;

    // --- Components ---
    let pages = Arc::new(HttpPageFetcher::new(&settings.user_agent)?);
    let source = Arc::new(SourceFetcher::new(
        pages,
        &settings.source_url,
        &settings.rashifal_url,
    )?);
    let speech = Arc::new(SpeechSynthesizer::new(
        Arc::new(MicMonsterApi::new(&settings.tts_url, &settings.user_agent)?),
        settings.tts_locale.clone(),
        settings.tts_voice.clone(),
        settings.tts_client_ip.clone(),
    ));
    let store = Arc::new(ArticleStore::new());
    let forecasts = Arc::new(ForecastStore::new());
    let ledger = Arc::new(SubmissionLedger::new(speech.clone()));
    let scheduler = Arc::new(RefreshScheduler::new(
        source.clone(),
        speech.clone(),
        store.clone(),
        ledger.clone(),
    ));

    // --- Timers ---
    let news_timer = spawn_periodic(scheduler.clone(), settings.refresh_interval());
    let rashifal_timer = spawn_periodic(
        Arc::new(ForecastRefresher::new(source, forecasts.clone())),
        settings.rashifal_interval(),
    );

    // --- HTTP ---
    let app = routes::router(Arc::new(AppState {
        store,
        forecasts,
        ledger,
        speech,
        scheduler,
    }));
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .inspect_err(|e| error!(addr = %settings.bind_addr, error = %e, "Cannot bind"))?;
    info!(addr = %settings.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    news_timer.abort();
    rashifal_timer.abort();
    info!("hamro_khabar shut down");
    Ok(())
}
