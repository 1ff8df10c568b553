//! Command-line interface definitions for Hamro Khabar.
//!
//! Every option can also come from an environment variable. Options left
//! unset fall back to the YAML config file (if any) and then to built-in
//! defaults, see [`crate::config::Settings`].

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news server.
///
/// # Examples
///
/// ```sh
/// # Defaults: scrape every 15 minutes, listen on 0.0.0.0:3001
/// hamro_khabar
///
/// # With a config file and a faster refresh
/// hamro_khabar --config ./hamro_khabar.yaml --refresh-interval-secs 300
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "HAMRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address the HTTP API listens on
    #[arg(short, long, env = "HAMRO_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Portal homepage to scrape
    #[arg(long, env = "HAMRO_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Portal rashifal page
    #[arg(long, env = "HAMRO_RASHIFAL_URL")]
    pub rashifal_url: Option<String>,

    /// Speech synthesis endpoint
    #[arg(long, env = "TTS_URL")]
    pub tts_url: Option<String>,

    /// Speech locale
    #[arg(long, env = "TTS_LOCALE")]
    pub tts_locale: Option<String>,

    /// Speech voice name
    #[arg(long, env = "TTS_VOICE")]
    pub tts_voice: Option<String>,

    /// Client IP forwarded to the speech endpoint
    #[arg(long, env = "TTS_CLIENT_IP")]
    pub tts_client_ip: Option<String>,

    /// Seconds between news refresh passes
    #[arg(short, long, env = "REFRESH_INTERVAL_SECS")]
    pub refresh_interval_secs: Option<u64>,

    /// Seconds between rashifal refreshes
    #[arg(long, env = "RASHIFAL_INTERVAL_SECS")]
    pub rashifal_interval_secs: Option<u64>,
}
