//! Exact-text memo of synthesized speech.
//!
//! Entries are created on the first successful synthesis of a text and
//! survive only as long as that text keeps appearing in refresh passes:
//! [`SpeechCache::retain_texts`] drops everything the latest pass did not
//! display.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::debug;

use super::SpeechSynthesizer;

#[derive(Debug, Default)]
pub struct SpeechCache {
    entries: Mutex<HashMap<String, String>>,
}

impl SpeechCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<String> {
        self.lock().get(text).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Cached audio for `text`, or a fresh synthesis stored on success.
    pub async fn synthesize(&self, synth: &SpeechSynthesizer, text: &str) -> Option<String> {
        if let Some(audio) = self.get(text) {
            debug!(chars = text.chars().count(), "Speech cache hit");
            return Some(audio);
        }
        let audio = synth.synthesize(text).await?;
        self.lock().insert(text.to_string(), audio.clone());
        Some(audio)
    }

    /// Drop every entry whose text is not in `keep`. Returns how many were
    /// evicted.
    pub fn retain_texts(&self, keep: &HashSet<&str>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|text, _| keep.contains(text.as_str()));
        before - entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // The map stays consistent even if a holder panicked mid-insert.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
