//! Periodic refresh of the published article and rashifal snapshots.
//!
//! # Refresh pass
//!
//! `Idle → Fetching → Synthesizing → Swapping → Idle`
//!
//! 1. **Fetching**: scrape the listing and, one card at a time, the detail pages
//! 2. **Synthesizing**: voice each title and body through the [`SpeechCache`],
//!    then evict cached audio for text this pass no longer shows
//! 3. **Swapping**: append a copy of the ledger and publish the merged list in
//!    one replacement
//!
//! A failure before the swap leaves the published list untouched. So does a
//! pass that scrapes no stories at all (a reshaped listing, or every detail
//! page failing): it returns [`RefreshError::EmptyBatch`] without evicting
//! or publishing anything.
//!
//! # Timers
//!
//! [`spawn_periodic`] drives any [`Refresh`] job from a fixed interval. Each
//! tick runs on its own task; a tick that finds the job's [`InFlight`] flag
//! taken does nothing, so passes never overlap.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

use crate::ledger::SubmissionLedger;
use crate::models::{Article, ArticleOrigin, PageMeta};
use crate::scrapers::hamropatro::{ScrapedStory, SourceError, SourceFetcher};
use crate::speech::SpeechSynthesizer;
use crate::speech::cache::SpeechCache;
use crate::store::{ArticleStore, ForecastStore};

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("a refresh is already running")]
    Busy,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("{page} page yielded nothing usable ({dropped} dropped); keeping previous snapshot")]
    EmptyBatch { page: &'static str, dropped: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    Idle,
    Fetching,
    Synthesizing,
    Swapping,
}

/// Counters from one completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub scraped: usize,
    pub skipped: usize,
    pub dropped: usize,
    pub audio_failures: usize,
    pub evicted: usize,
    pub submitted: usize,
    pub withheld: usize,
}

/// Single-occupancy flag. Holding the guard marks the job as running.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

pub struct InFlightGuard<'a>(&'a AtomicBool);

impl InFlight {
    pub fn try_enter(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A job a repeating timer can drive.
#[async_trait]
pub trait Refresh: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Run once, logging rather than returning failures.
    async fn tick(&self);
}

/// Fire `job` now and then every `every`. Ticks are spawned so a long pass
/// cannot delay the timer; the job's own guard drops overlapping ticks.
pub fn spawn_periodic<R: Refresh>(job: Arc<R>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(job = job.name(), every_secs = every.as_secs(), "Timer started");
        loop {
            ticker.tick().await;
            let job = Arc::clone(&job);
            tokio::spawn(async move { job.tick().await });
        }
    })
}

/// Combine scraped and submitted articles; scraped ids win.
///
/// A submission whose non-empty id matches a scraped id is left out of this
/// list (it stays in the ledger). Returns the merged list and how many
/// submissions were withheld.
pub fn merge(scraped: Vec<Article>, submitted: Vec<Article>) -> (Vec<Article>, usize) {
    let scraped_ids: HashSet<String> = scraped
        .iter()
        .filter(|a| !a.id.is_empty())
        .map(|a| a.id.clone())
        .collect();

    let mut merged = scraped;
    let mut withheld = 0;
    for article in submitted {
        if !article.id.is_empty() && scraped_ids.contains(&article.id) {
            warn!(id = %article.id, "Submitted id collides with a scraped article; scraped wins");
            withheld += 1;
        } else {
            merged.push(article);
        }
    }
    (merged, withheld)
}

fn to_article(story: ScrapedStory, meta: &PageMeta) -> Article {
    let ScrapedStory { entry, detail } = story;
    Article {
        id: entry.id,
        title: entry.title,
        content: detail.body,
        image_url: entry.image_url,
        source_image_url: entry.source_image_url,
        urls: detail.source_urls,
        date: detail.published_date,
        title_audio: None,
        content_audio: None,
        nepali_date: meta.nepali_date.clone(),
        tithi: meta.tithi.clone(),
        panchanga: meta.panchanga.clone(),
        origin: ArticleOrigin::Scraped,
    }
}

/// Owns the scrape → voice → swap pipeline for articles.
pub struct RefreshScheduler {
    source: Arc<SourceFetcher>,
    speech: Arc<SpeechSynthesizer>,
    cache: SpeechCache,
    store: Arc<ArticleStore>,
    ledger: Arc<SubmissionLedger>,
    phase: Mutex<RefreshPhase>,
    in_flight: InFlight,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<SourceFetcher>,
        speech: Arc<SpeechSynthesizer>,
        store: Arc<ArticleStore>,
        ledger: Arc<SubmissionLedger>,
    ) -> Self {
        Self {
            source,
            speech,
            cache: SpeechCache::new(),
            store,
            ledger,
            phase: Mutex::new(RefreshPhase::Idle),
            in_flight: InFlight::default(),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        *self.phase.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[cfg(test)]
    pub fn cache(&self) -> &SpeechCache {
        &self.cache
    }

    fn enter(&self, phase: RefreshPhase) {
        debug!(?phase, "Refresh phase");
        *self.phase.lock().unwrap_or_else(|p| p.into_inner()) = phase;
    }

    /// Run one full pass: scrape, voice, evict, merge and publish.
    ///
    /// # Returns
    ///
    /// The [`PassReport`] counters of a pass that published a new snapshot.
    ///
    /// # Errors
    ///
    /// - [`RefreshError::Busy`] when another pass holds the in-flight flag
    /// - [`RefreshError::Source`] when the listing page cannot be fetched
    /// - [`RefreshError::EmptyBatch`] when no story survived scraping
    ///
    /// Every error leaves the published snapshot and the speech cache as
    /// they were.
    #[instrument(level = "info", skip_all)]
    pub async fn run_pass(&self) -> Result<PassReport, RefreshError> {
        let Some(_guard) = self.in_flight.try_enter() else {
            return Err(RefreshError::Busy);
        };
        let t0 = Instant::now();
        let result = self.pass().await;
        self.enter(RefreshPhase::Idle);

        if let Ok(report) = &result {
            info!(
                scraped = report.scraped,
                skipped = report.skipped,
                dropped = report.dropped,
                audio_failures = report.audio_failures,
                evicted = report.evicted,
                cached = self.cache.len(),
                submitted = report.submitted,
                withheld = report.withheld,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Refresh pass published"
            );
        }
        result
    }

    async fn pass(&self) -> Result<PassReport, RefreshError> {
        self.enter(RefreshPhase::Fetching);
        let batch = self.source.scrape().await?;
        if batch.stories.is_empty() {
            return Err(RefreshError::EmptyBatch {
                page: "news",
                dropped: batch.dropped,
            });
        }

        self.enter(RefreshPhase::Synthesizing);
        let meta = batch.meta;
        let scraped: Vec<(Article, usize)> = stream::iter(batch.stories)
            .then(|story| {
                let mut article = to_article(story, &meta);
                async move {
                    article.title_audio = self.cache.synthesize(&self.speech, &article.title).await;
                    article.content_audio =
                        self.cache.synthesize(&self.speech, &article.content).await;
                    let failures = [&article.title_audio, &article.content_audio]
                        .iter()
                        .filter(|audio| audio.is_none())
                        .count();
                    (article, failures)
                }
            })
            .collect()
            .await;
        let audio_failures = scraped.iter().map(|(_, f)| f).sum();
        let scraped: Vec<Article> = scraped.into_iter().map(|(a, _)| a).collect();

        let shown: HashSet<&str> = scraped
            .iter()
            .flat_map(|a| [a.title.as_str(), a.content.as_str()])
            .collect();
        let evicted = self.cache.retain_texts(&shown);

        self.enter(RefreshPhase::Swapping);
        let report_scraped = scraped.len();
        let submitted = self.ledger.list();
        let submitted_count = submitted.len();
        let (merged, withheld) = merge(scraped, submitted);
        self.store.publish(merged);

        Ok(PassReport {
            scraped: report_scraped,
            skipped: batch.skipped,
            dropped: batch.dropped,
            audio_failures,
            evicted,
            submitted: submitted_count,
            withheld,
        })
    }
}

#[async_trait]
impl Refresh for RefreshScheduler {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn tick(&self) {
        match self.run_pass().await {
            Ok(_) => {}
            Err(RefreshError::Busy) => debug!("News refresh still running; tick dropped"),
            Err(e @ RefreshError::EmptyBatch { .. }) => warn!(error = %e, "News refresh skipped"),
            Err(e) => error!(error = %e, "News refresh failed; keeping previous snapshot"),
        }
    }
}

/// Keeps the rashifal snapshot current on its own cadence.
pub struct ForecastRefresher {
    source: Arc<SourceFetcher>,
    forecasts: Arc<ForecastStore>,
    in_flight: InFlight,
}

impl ForecastRefresher {
    pub fn new(source: Arc<SourceFetcher>, forecasts: Arc<ForecastStore>) -> Self {
        Self {
            source,
            forecasts,
            in_flight: InFlight::default(),
        }
    }

    /// Fetch and publish once. A failed fetch or an empty page keeps the
    /// previous list.
    #[instrument(level = "info", skip_all)]
    pub async fn run_once(&self) -> Result<usize, RefreshError> {
        let Some(_guard) = self.in_flight.try_enter() else {
            return Err(RefreshError::Busy);
        };
        let entries = self.source.fetch_rashifal().await?;
        if entries.is_empty() {
            return Err(RefreshError::EmptyBatch {
                page: "rashifal",
                dropped: 0,
            });
        }
        let count = entries.len();
        self.forecasts.publish(entries);
        Ok(count)
    }
}

#[async_trait]
impl Refresh for ForecastRefresher {
    fn name(&self) -> &'static str {
        "rashifal"
    }

    async fn tick(&self) {
        match self.run_once().await {
            Ok(count) => info!(count, "Rashifal refreshed"),
            Err(RefreshError::Busy) => debug!("Rashifal refresh still running; tick dropped"),
            Err(e @ RefreshError::EmptyBatch { .. }) => warn!(error = %e, "Rashifal refresh skipped"),
            Err(e) => error!(error = %e, "Rashifal refresh failed; keeping previous list"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::submission;
    use crate::models::sample_article;
    use crate::scrapers::hamropatro::fixtures::*;
    use crate::scrapers::fake::FakeFetcher;
    use crate::scrapers::{FetchError, PageFetcher};
    use crate::speech::fake::FakeSpeechApi;
    use tokio::sync::Notify;

    /// Pauses the first detail request until released.
    #[derive(Default)]
    struct GatedFetcher {
        inner: FakeFetcher,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PageFetcher for GatedFetcher {
        async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
            if url == NEWS_PAGE && self.armed.swap(false, Ordering::AcqRel) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.fetch_html(url).await
        }
    }

    struct Harness {
        pages: Arc<GatedFetcher>,
        api: Arc<FakeSpeechApi>,
        store: Arc<ArticleStore>,
        ledger: Arc<SubmissionLedger>,
        scheduler: Arc<RefreshScheduler>,
    }

    fn harness() -> Harness {
        let pages = Arc::new(GatedFetcher::default());
        let api = Arc::new(FakeSpeechApi::default());
        let speech = Arc::new(SpeechSynthesizer::new(api.clone(), "ne-NP", "ne-NP-SagarNeural", None));
        let source = Arc::new(SourceFetcher::new(pages.clone(), BASE, RASHIFAL).unwrap());
        let store = Arc::new(ArticleStore::new());
        let ledger = Arc::new(SubmissionLedger::new(speech.clone()));
        let scheduler = Arc::new(RefreshScheduler::new(
            source,
            speech,
            store.clone(),
            ledger.clone(),
        ));
        Harness {
            pages,
            api,
            store,
            ledger,
            scheduler,
        }
    }

    impl Harness {
        fn serve(&self, stories: &[(&str, &str, &str)]) {
            let cards: Vec<String> = stories.iter().map(|(id, title, _)| card(id, title)).collect();
            let details: Vec<String> = stories.iter().map(|(id, _, body)| detail(id, body)).collect();
            self.pages.inner.set(BASE, &listing(&cards));
            self.pages.inner.set(NEWS_PAGE, &detail_page(&details));
        }

        fn titles(&self) -> Vec<String> {
            self.store.list(1, 100).news.into_iter().map(|a| a.title).collect()
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_pass_publishes_voiced_articles_with_page_meta() {
        let h = harness();
        h.serve(&[("n1", "पहिलो", "पहिलो विवरण"), ("n2", "दोस्रो", "दोस्रो विवरण")]);

        let report = h.scheduler.run_pass().await.unwrap();
        assert_eq!(report.scraped, 2);
        assert_eq!(report.audio_failures, 0);
        assert_eq!(h.scheduler.phase(), RefreshPhase::Idle);

        let page = h.store.list(1, 10);
        assert_eq!(page.total_news, 2);
        let first = &page.news[0];
        assert_eq!(first.id, "n1");
        assert_eq!(first.content, "पहिलो विवरण");
        assert_eq!(first.date, "३ घण्टा अघि");
        assert_eq!(first.urls, vec!["https://provider.example/n1"]);
        assert_eq!(first.nepali_date.as_deref(), Some("भदौ १६, २०८१"));
        assert!(first.title_audio.is_some());
        assert!(first.content_audio.is_some());
        assert_eq!(h.api.calls(), 4);
    }

    #[test_log::test(tokio::test)]
    async fn test_article_survives_content_audio_failure() {
        let h = harness();
        h.serve(&[("n1", "शीर्षक", "असफल विवरण")]);
        h.api.fail_on("असफल");

        let report = h.scheduler.run_pass().await.unwrap();
        assert_eq!(report.audio_failures, 1);

        let article = &h.store.list(1, 10).news[0];
        assert_eq!(article.title, "शीर्षक");
        assert_eq!(article.content, "असफल विवरण");
        assert!(article.title_audio.is_some());
        assert!(article.content_audio.is_none());
        assert_eq!(article.image_url, "https://portal.example/img/n1.jpg");
    }

    #[test_log::test(tokio::test)]
    async fn test_listing_failure_keeps_previous_snapshot() {
        let h = harness();
        h.serve(&[("n1", "a", "x")]);
        h.scheduler.run_pass().await.unwrap();
        let before = h.store.snapshot();

        h.pages.inner.remove(BASE);
        assert!(matches!(
            h.scheduler.run_pass().await,
            Err(RefreshError::Source(_))
        ));
        assert_eq!(h.scheduler.phase(), RefreshPhase::Idle);
        let after = h.store.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(h.titles(), vec!["a"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_reshaped_listing_keeps_snapshot_and_cache() {
        let h = harness();
        h.serve(&[("n1", "a", "x"), ("n2", "b", "y")]);
        h.scheduler.run_pass().await.unwrap();
        let before = h.store.snapshot();

        h.pages.inner.set(BASE, r#"<div class="new-layout"><a href="/x">x</a></div>"#);
        assert!(matches!(
            h.scheduler.run_pass().await,
            Err(RefreshError::EmptyBatch { dropped: 0, .. })
        ));
        assert!(Arc::ptr_eq(&before, &h.store.snapshot()));
        assert_eq!(h.titles(), vec!["a", "b"]);
        assert_eq!(h.scheduler.cache().len(), 4);
        assert_eq!(h.scheduler.phase(), RefreshPhase::Idle);
    }

    #[test_log::test(tokio::test)]
    async fn test_all_details_failing_keeps_snapshot() {
        let h = harness();
        h.serve(&[("n1", "a", "x")]);
        h.ledger.create(submission("s1", "submitted")).await.unwrap();
        h.scheduler.run_pass().await.unwrap();
        let before = h.store.snapshot();

        // Cards still parse but every detail request now fails.
        h.serve(&[("n1", "a", "x"), ("n2", "b", "y")]);
        h.pages.inner.remove(NEWS_PAGE);
        assert!(matches!(
            h.scheduler.run_pass().await,
            Err(RefreshError::EmptyBatch { dropped: 2, .. })
        ));
        assert!(Arc::ptr_eq(&before, &h.store.snapshot()));
        assert_eq!(h.titles(), vec!["a", "submitted"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_cache_survives_empty_pass_then_evicts_normally() {
        let h = harness();
        h.serve(&[("n1", "a", "x")]);
        h.scheduler.run_pass().await.unwrap();
        assert_eq!(h.api.calls(), 2);

        h.pages.inner.set(BASE, "<html><body></body></html>");
        assert!(h.scheduler.run_pass().await.is_err());
        assert_eq!(h.scheduler.cache().len(), 2);

        // The story comes back unchanged: no new speech requests.
        h.serve(&[("n1", "a", "x")]);
        let report = h.scheduler.run_pass().await.unwrap();
        assert_eq!(report.evicted, 0);
        assert_eq!(h.api.calls(), 2);

        // A real rotation still evicts.
        h.serve(&[("n2", "b", "y")]);
        let report = h.scheduler.run_pass().await.unwrap();
        assert_eq!(report.evicted, 2);
        assert_eq!(h.scheduler.cache().len(), 2);
        assert_eq!(h.api.calls(), 4);
    }

    #[test_log::test(tokio::test)]
    async fn test_cache_reuses_and_evicts_across_passes() {
        let h = harness();
        h.serve(&[("n1", "a", "x")]);
        h.scheduler.run_pass().await.unwrap();
        assert_eq!(h.api.calls(), 2);

        // Same text again: served from cache.
        h.scheduler.run_pass().await.unwrap();
        assert_eq!(h.api.calls(), 2);

        // Rotate the story out; its audio is evicted.
        h.serve(&[("n2", "b", "y")]);
        let report = h.scheduler.run_pass().await.unwrap();
        assert_eq!(report.evicted, 2);
        assert!(h.scheduler.cache().get("a").is_none());
        assert_eq!(h.api.calls(), 4);

        // Bringing it back costs fresh calls.
        h.serve(&[("n1", "a", "x")]);
        h.scheduler.run_pass().await.unwrap();
        assert_eq!(h.api.calls(), 6);
    }

    #[test_log::test(tokio::test)]
    async fn test_submission_appears_only_after_next_pass() {
        let h = harness();
        h.serve(&[("n1", "scraped", "x")]);
        h.scheduler.run_pass().await.unwrap();

        h.ledger.create(submission("s1", "submitted")).await.unwrap();
        assert_eq!(h.titles(), vec!["scraped"]);

        h.scheduler.run_pass().await.unwrap();
        assert_eq!(h.titles(), vec!["scraped", "submitted"]);

        h.ledger.delete("s1").unwrap();
        assert_eq!(h.titles(), vec!["scraped", "submitted"]);
        h.scheduler.run_pass().await.unwrap();
        assert_eq!(h.titles(), vec!["scraped"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_scraped_id_wins_collision() {
        let h = harness();
        h.serve(&[("n1", "scraped", "x")]);
        h.ledger.create(submission("n1", "submitted")).await.unwrap();
        h.ledger.create(submission("s2", "other")).await.unwrap();

        let report = h.scheduler.run_pass().await.unwrap();
        assert_eq!(report.withheld, 1);
        assert_eq!(h.titles(), vec!["scraped", "other"]);
        assert_eq!(h.ledger.len(), 2);
    }

    #[test]
    fn test_merge_keeps_order_and_empty_ids() {
        let scraped = vec![sample_article("a", "1"), sample_article("b", "2")];
        let mut blank = sample_article("", "3");
        blank.origin = ArticleOrigin::Submitted;
        let submitted = vec![blank, sample_article("b", "dup"), sample_article("c", "4")];

        let (merged, withheld) = merge(scraped, submitted);
        let titles: Vec<_> = merged.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["1", "2", "3", "4"]);
        assert_eq!(withheld, 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_readers_see_whole_snapshots_during_a_pass() {
        let h = harness();
        h.serve(&[("o1", "old 1", "x"), ("o2", "old 2", "y")]);
        h.scheduler.run_pass().await.unwrap();

        h.serve(&[("n1", "new 1", "z"), ("n2", "new 2", "w"), ("n3", "new 3", "v")]);
        h.pages.armed.store(true, Ordering::Release);

        let scheduler = h.scheduler.clone();
        let pass = tokio::spawn(async move { scheduler.run_pass().await });
        h.pages.entered.notified().await;

        assert_eq!(h.scheduler.phase(), RefreshPhase::Fetching);
        assert_eq!(h.titles(), vec!["old 1", "old 2"]);
        assert!(matches!(h.scheduler.run_pass().await, Err(RefreshError::Busy)));

        h.pages.release.notify_one();
        pass.await.unwrap().unwrap();
        assert_eq!(h.titles(), vec!["new 1", "new 2", "new 3"]);
        assert_eq!(h.scheduler.phase(), RefreshPhase::Idle);
    }

    #[test_log::test(tokio::test)]
    async fn test_forecast_refresh_keeps_old_list_on_failure() {
        let pages = Arc::new(FakeFetcher::default());
        pages.set(
            RASHIFAL,
            r#"<div class="item"><div class="title">Mesh</div><div class="desc">शुभ</div></div>"#,
        );
        let source = Arc::new(SourceFetcher::new(pages.clone(), BASE, RASHIFAL).unwrap());
        let forecasts = Arc::new(ForecastStore::new());
        let refresher = ForecastRefresher::new(source, forecasts.clone());

        assert_eq!(refresher.run_once().await.unwrap(), 1);
        pages.remove(RASHIFAL);
        assert!(refresher.run_once().await.is_err());
        assert_eq!(forecasts.find("mesh").unwrap().description, "शुभ");

        pages.set(RASHIFAL, "<div class=\"moved\"></div>");
        assert!(matches!(
            refresher.run_once().await,
            Err(RefreshError::EmptyBatch { page: "rashifal", .. })
        ));
        assert_eq!(forecasts.list().len(), 1);
    }

    #[test]
    fn test_in_flight_is_exclusive() {
        let flag = InFlight::default();
        let guard = flag.try_enter();
        assert!(guard.is_some());
        assert!(flag.try_enter().is_none());
        drop(guard);
        assert!(flag.try_enter().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_ticks_immediately_then_on_interval() {
        struct Counter(std::sync::atomic::AtomicUsize);

        #[async_trait]
        impl Refresh for Counter {
            fn name(&self) -> &'static str {
                "counter"
            }
            async fn tick(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counter = Arc::new(Counter(Default::default()));
        let handle = spawn_periodic(counter.clone(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        handle.abort();
    }
}
