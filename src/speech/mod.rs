//! Text-to-speech through the MicMonster `restapi/create` endpoint.
//!
//! # Architecture
//!
//! - [`SpeechApi`]: one raw form-encoded request, returning the response body
//! - [`MicMonsterApi`]: the `reqwest` implementation of [`SpeechApi`]
//! - [`SpeechSynthesizer`]: wraps text in the voice directive, sends it and
//!   digs the base64 audio out of the body
//! - [`cache::SpeechCache`]: memoises synthesizer output per exact text
//!
//! The upstream body is usually a JSON object carrying the audio under
//! `file`, `audio` or `data`. When it is not JSON at all, the longest run of
//! base64 characters is used instead. Either way the candidate must look
//! like real audio: a whole number of base64 quanta and at least
//! [`MIN_AUDIO_CHARS`] long, so an error word is never mistaken for speech.

use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::utils::truncate_for_log;

pub mod cache;

static BASE64_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9+/]{16,}={0,2}").expect("base64 run regex"));

/// JSON fields that may hold the audio, in lookup order.
const AUDIO_FIELDS: [&str; 3] = ["file", "audio", "data"];

/// Shortest base64 text accepted as audio (96 decoded bytes).
pub const MIN_AUDIO_CHARS: usize = 128;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("nothing to synthesize")]
    EmptyText,
    #[error("speech request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("speech API answered with status {0}")]
    Status(u16),
    #[error("no audio payload in speech response: {0}")]
    MissingPayload(String),
}

/// A speech backend that accepts a form and answers with a text body.
#[async_trait]
pub trait SpeechApi: Send + Sync {
    async fn create(&self, form: &[(&str, &str)]) -> Result<String, SpeechError>;
}

/// [`SpeechApi`] speaking to MicMonster over HTTP.
#[derive(Debug, Clone)]
pub struct MicMonsterApi {
    client: Client,
    url: String,
}

impl MicMonsterApi {
    pub fn new(url: &str, user_agent: &str) -> Result<Self, SpeechError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

/// `application/x-www-form-urlencoded` body for `form`.
fn encode_form(form: &[(&str, &str)]) -> String {
    form.iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .join("&")
}

#[async_trait]
impl SpeechApi for MicMonsterApi {
    #[instrument(level = "debug", skip_all, fields(url = %self.url))]
    async fn create(&self, form: &[(&str, &str)]) -> Result<String, SpeechError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_form(form))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Find the audio payload in a speech response body.
///
/// # Arguments
///
/// * `body` - Raw response text from the speech endpoint
///
/// # Returns
///
/// The base64 audio, or `None` when nothing in the body is plausible audio.
/// A JSON body is only searched through its audio fields; any other body is
/// scanned for base64 runs.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(extract_payload(r#"{"message":"InsufficientCredits"}"#), None);
/// ```
pub fn extract_payload(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json_payload(&json).map(str::to_string),
        Err(_) => BASE64_RUN
            .find_iter(body)
            .map(|m| m.as_str())
            .filter(|run| plausible_audio(run))
            .max_by_key(|run| run.len())
            .map(str::to_string),
    }
}

fn json_payload(json: &Value) -> Option<&str> {
    AUDIO_FIELDS
        .iter()
        .filter_map(|field| json.get(*field)?.as_str())
        .map(strip_data_uri)
        .find(|value| plausible_audio(value))
}

/// `data:audio/mpeg;base64,XXXX` -> `XXXX`.
fn strip_data_uri(value: &str) -> &str {
    value.split_once(";base64,").map_or(value, |(_, data)| data)
}

fn plausible_audio(candidate: &str) -> bool {
    candidate.len() >= MIN_AUDIO_CHARS
        && candidate.len() % 4 == 0
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Turns text into base64 speech.
pub struct SpeechSynthesizer {
    api: Arc<dyn SpeechApi>,
    locale: String,
    voice: String,
    client_ip: Option<String>,
}

impl SpeechSynthesizer {
    pub fn new(
        api: Arc<dyn SpeechApi>,
        locale: impl Into<String>,
        voice: impl Into<String>,
        client_ip: Option<String>,
    ) -> Self {
        Self {
            api,
            locale: locale.into(),
            voice: voice.into(),
            client_ip,
        }
    }

    /// Synthesize `text`, surfacing every failure.
    ///
    /// `locale` defaults to the configured one. The configured voice is only
    /// applied when speaking its own locale; other locales get the upstream
    /// default voice.
    #[instrument(level = "debug", skip_all, fields(chars = text.chars().count()))]
    pub async fn request(&self, text: &str, locale: Option<&str>) -> Result<String, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let locale = locale.unwrap_or(&self.locale);
        let content = if locale == self.locale {
            format!("<voice name=\"{}\">{}</voice>", self.voice, escape_markup(text))
        } else {
            escape_markup(text)
        };

        let mut form = vec![("locale", locale), ("content", content.as_str())];
        if let Some(ip) = &self.client_ip {
            form.push(("ip", ip.as_str()));
        }

        let t0 = Instant::now();
        let body = self.api.create(&form).await?;
        let audio = extract_payload(&body)
            .ok_or_else(|| SpeechError::MissingPayload(truncate_for_log(&body, 200)))?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            audio_bytes = audio.len(),
            "Synthesized speech"
        );
        Ok(audio)
    }

    /// Synthesize `text` in the configured locale; failures are logged and
    /// come back as `None`.
    pub async fn synthesize(&self, text: &str) -> Option<String> {
        match self.request(text, None).await {
            Ok(audio) => Some(audio),
            Err(SpeechError::EmptyText) => None,
            Err(e) => {
                warn!(text = %truncate_for_log(text, 60), error = %e, "Speech synthesis failed");
                None
            }
        }
    }
}
