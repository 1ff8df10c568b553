//! Articles submitted by editors rather than scraped.
//!
//! The ledger owns its own list. Changes are visible to [`SubmissionLedger::list`]
//! at once but only reach the published article list when the next refresh
//! pass takes a copy of the ledger and swaps the merged result in.

use serde::Deserialize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::models::{Article, ArticleOrigin};
use crate::speech::SpeechSynthesizer;
use crate::timefmt::{self, TimeFormatError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no submitted article with id {0:?}")]
    NotFound(String),
    #[error("a submitted article with id {0:?} already exists")]
    DuplicateId(String),
    #[error("id must not be empty")]
    EmptyId,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error(transparent)]
    InvalidDate(#[from] TimeFormatError),
}

/// Body of a new submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub source_image_url: Vec<String>,
    /// Timestamp or relative duration, see [`timefmt`].
    pub date: String,
}

/// Partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub urls: Option<Vec<String>>,
    pub source_image_url: Option<Vec<String>>,
    pub date: Option<String>,
}

pub struct SubmissionLedger {
    items: RwLock<Vec<Article>>,
    speech: Arc<SpeechSynthesizer>,
}

impl SubmissionLedger {
    pub fn new(speech: Arc<SpeechSynthesizer>) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            speech,
        }
    }

    /// Current submissions, in insertion order.
    pub fn list(&self) -> Vec<Article> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Validate, voice and append a submission.
    ///
    /// Audio is best-effort: a failed synthesis leaves the field `None`.
    #[instrument(level = "info", skip_all, fields(id = %input.id))]
    pub async fn create(&self, input: NewSubmission) -> Result<Article, LedgerError> {
        let id = input.id.trim().to_string();
        let title = input.title.trim().to_string();
        if id.is_empty() {
            return Err(LedgerError::EmptyId);
        }
        if title.is_empty() {
            return Err(LedgerError::EmptyTitle);
        }
        let date = timefmt::elapsed(&input.date)?;
        if self.position(&id).is_some() {
            return Err(LedgerError::DuplicateId(id));
        }

        let content = input.content.trim().to_string();
        let title_audio = self.speech.synthesize(&title).await;
        let content_audio = self.speech.synthesize(&content).await;

        let article = Article {
            id,
            title,
            content,
            image_url: input.image_url,
            source_image_url: input.source_image_url,
            urls: input.urls,
            date,
            title_audio,
            content_audio,
            nepali_date: None,
            tithi: None,
            panchanga: None,
            origin: ArticleOrigin::Submitted,
        };

        let mut items = self.write();
        // Another create may have claimed the id while we were synthesizing.
        if items.iter().any(|a| a.id == article.id) {
            return Err(LedgerError::DuplicateId(article.id));
        }
        items.push(article.clone());
        info!(count = items.len(), "Stored submission");
        Ok(article)
    }

    /// Apply `patch` to the submission `id`.
    ///
    /// # Arguments
    ///
    /// * `id` - Id the submission was created with
    /// * `patch` - Fields to replace; `None` leaves a field alone
    ///
    /// # Returns
    ///
    /// The updated article. A changed title or body is voiced again and a new
    /// `date` is relabelled. If the item is deleted while its audio is being
    /// synthesized the update fails with [`LedgerError::NotFound`] rather
    /// than bringing it back.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NotFound`], [`LedgerError::EmptyTitle`] or
    /// [`LedgerError::InvalidDate`].
    #[instrument(level = "info", skip_all, fields(id = %id))]
    pub async fn update(&self, id: &str, patch: SubmissionPatch) -> Result<Article, LedgerError> {
        let Some(current) = self.read().iter().find(|a| a.id == id).cloned() else {
            debug!("Update for unknown submission");
            return Err(LedgerError::NotFound(id.to_string()));
        };

        let title = patch.title.as_deref().map(str::trim);
        if title == Some("") {
            return Err(LedgerError::EmptyTitle);
        }
        let date = patch.date.as_deref().map(timefmt::elapsed).transpose()?;

        let title_audio = match title {
            Some(t) if t != current.title => Some(self.speech.synthesize(t).await),
            _ => None,
        };
        let content = patch.content.as_deref().map(str::trim);
        let content_audio = match content {
            Some(c) if c != current.content => Some(self.speech.synthesize(c).await),
            _ => None,
        };

        let mut items = self.write();
        let Some(item) = items.iter_mut().find(|a| a.id == id) else {
            return Err(LedgerError::NotFound(id.to_string()));
        };
        if let Some(t) = title {
            item.title = t.to_string();
        }
        if let Some(c) = content {
            item.content = c.to_string();
        }
        if let Some(audio) = title_audio {
            item.title_audio = audio;
        }
        if let Some(audio) = content_audio {
            item.content_audio = audio;
        }
        if let Some(image_url) = patch.image_url {
            item.image_url = image_url;
        }
        if let Some(urls) = patch.urls {
            item.urls = urls;
        }
        if let Some(source_image_url) = patch.source_image_url {
            item.source_image_url = source_image_url;
        }
        if let Some(date) = date {
            item.date = date;
        }
        info!("Updated submission");
        Ok(item.clone())
    }

    /// Remove the submission `id`, returning it.
    #[instrument(level = "info", skip(self))]
    pub fn delete(&self, id: &str) -> Result<Article, LedgerError> {
        let mut items = self.write();
        match items.iter().position(|a| a.id == id) {
            Some(i) => {
                let removed = items.remove(i);
                info!(remaining = items.len(), "Deleted submission");
                Ok(removed)
            }
            None => {
                debug!("Delete for unknown submission");
                Err(LedgerError::NotFound(id.to_string()))
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.read().iter().position(|a| a.id == id)
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Article>> {
        self.items.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Article>> {
        self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub(crate) fn submission(id: &str, title: &str) -> NewSubmission {
    NewSubmission {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{title} विवरण"),
        image_url: "https://img.example/s.jpg".to_string(),
        urls: vec!["https://a.example".to_string()],
        source_image_url: vec![],
        date: "45m".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::fake::FakeSpeechApi;
    use crate::speech::{SpeechApi, SpeechError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// Holds the next speech request until released.
    #[derive(Default)]
    struct GatedSpeech {
        inner: FakeSpeechApi,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SpeechApi for GatedSpeech {
        async fn create(&self, form: &[(&str, &str)]) -> Result<String, SpeechError> {
            if self.armed.swap(false, Ordering::AcqRel) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.create(form).await
        }
    }

    fn ledger() -> (SubmissionLedger, Arc<FakeSpeechApi>) {
        let api = Arc::new(FakeSpeechApi::default());
        let speech = SpeechSynthesizer::new(api.clone(), "ne-NP", "ne-NP-SagarNeural", None);
        (SubmissionLedger::new(Arc::new(speech)), api)
    }

    #[tokio::test]
    async fn test_create_voices_and_labels() {
        let (ledger, api) = ledger();
        let article = ledger.create(submission("s1", "शीर्षक")).await.unwrap();

        assert_eq!(article.origin, ArticleOrigin::Submitted);
        assert_eq!(article.date, "४५ मिनेट अघि");
        assert!(article.title_audio.is_some());
        assert!(article.content_audio.is_some());
        assert!(article.nepali_date.is_none());
        assert_eq!(api.calls(), 2);
        assert_eq!(ledger.list(), vec![article]);
    }

    #[tokio::test]
    async fn test_create_keeps_article_when_audio_fails() {
        let (ledger, api) = ledger();
        api.fail_on("विवरण");
        let article = ledger.create(submission("s1", "शीर्षक")).await.unwrap();
        assert!(article.title_audio.is_some());
        assert!(article.content_audio.is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let (ledger, api) = ledger();

        let mut no_title = submission("s1", "x");
        no_title.title = "  ".to_string();
        assert!(matches!(ledger.create(no_title).await, Err(LedgerError::EmptyTitle)));

        let mut no_id = submission("", "x");
        no_id.id = " ".to_string();
        assert!(matches!(ledger.create(no_id).await, Err(LedgerError::EmptyId)));

        let mut bad_date = submission("s1", "x");
        bad_date.date = "soon".to_string();
        assert!(matches!(ledger.create(bad_date).await, Err(LedgerError::InvalidDate(_))));

        ledger.create(submission("s1", "x")).await.unwrap();
        assert!(matches!(
            ledger.create(submission("s1", "y")).await,
            Err(LedgerError::DuplicateId(_))
        ));
        assert_eq!(ledger.len(), 1);
        // only the successful create reached the speech API
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let (ledger, api) = ledger();
        let created = ledger.create(submission("s1", "पुरानो")).await.unwrap();

        let updated = ledger
            .update(
                "s1",
                SubmissionPatch {
                    title: Some("नयाँ".to_string()),
                    urls: Some(vec![]),
                    date: Some("3h 0m".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "नयाँ");
        assert_ne!(updated.title_audio, created.title_audio);
        assert_eq!(updated.content, created.content);
        assert_eq!(updated.content_audio, created.content_audio);
        assert!(updated.urls.is_empty());
        assert_eq!(updated.image_url, created.image_url);
        assert_eq!(updated.date, "३ घण्टा अघि");
        assert_eq!(api.calls(), 3);
        assert_eq!(ledger.list()[0], updated);
    }

    #[tokio::test]
    async fn test_update_unchanged_title_is_not_revoiced() {
        let (ledger, api) = ledger();
        ledger.create(submission("s1", "same")).await.unwrap();
        let patch = SubmissionPatch {
            title: Some("same".to_string()),
            ..Default::default()
        };
        ledger.update("s1", patch).await.unwrap();
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let (ledger, _) = ledger();
        assert!(matches!(
            ledger.update("nope", SubmissionPatch::default()).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(ledger.delete("nope"), Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_id() {
        let (ledger, _) = ledger();
        ledger.create(submission("s1", "a")).await.unwrap();
        ledger.create(submission("s2", "b")).await.unwrap();

        let removed = ledger.delete("s1").unwrap();
        assert_eq!(removed.id, "s1");
        let left: Vec<_> = ledger.list().into_iter().map(|a| a.id).collect();
        assert_eq!(left, vec!["s2"]);
    }

    #[tokio::test]
    async fn test_update_racing_delete_does_not_resurrect() {
        let api = Arc::new(GatedSpeech::default());
        let speech = SpeechSynthesizer::new(api.clone(), "ne-NP", "ne-NP-SagarNeural", None);
        let ledger = Arc::new(SubmissionLedger::new(Arc::new(speech)));
        ledger.create(submission("s1", "पुरानो")).await.unwrap();

        api.armed.store(true, Ordering::Release);
        let racing = ledger.clone();
        let update = tokio::spawn(async move {
            let patch = SubmissionPatch {
                title: Some("नयाँ".to_string()),
                ..Default::default()
            };
            racing.update("s1", patch).await
        });

        // The update is voicing the new title; remove the item under it.
        api.entered.notified().await;
        ledger.delete("s1").unwrap();
        api.release.notify_one();

        assert!(matches!(
            update.await.unwrap(),
            Err(LedgerError::NotFound(id)) if id == "s1"
        ));
        assert!(ledger.list().is_empty());
    }
}
