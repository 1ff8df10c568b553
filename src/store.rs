//! Published snapshots that readers query.
//!
//! Both stores hold an `Arc` to an immutable snapshot behind a lock that is
//! only taken long enough to clone or replace the `Arc`. A refresh builds its
//! list off to the side and publishes it with one replacement, so a reader
//! sees either the previous list or the new one in full.

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::models::{Article, ArticleSummary, NewsPage, RashifalEntry};

/// One published article list.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub articles: Vec<Article>,
    /// `None` until the first refresh publishes.
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct ArticleStore {
    current: RwLock<Arc<Snapshot>>,
}

impl ArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replace the published list wholesale.
    pub fn publish(&self, articles: Vec<Article>) {
        let next = Arc::new(Snapshot {
            articles,
            published_at: Some(Utc::now()),
        });
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// One page of the published list.
    ///
    /// # Arguments
    ///
    /// * `page` - 1-indexed page number; 0 is treated as 1
    /// * `page_size` - Articles per page; 0 is treated as 1
    ///
    /// # Returns
    ///
    /// A [`NewsPage`] cut from a single snapshot. A page past the end has no
    /// articles but still reports the real totals.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // 23 articles published
    /// let page = store.list(3, 10);
    /// assert_eq!((page.total_pages, page.news.len()), (3, 3));
    /// ```
    pub fn list(&self, page: usize, page_size: usize) -> NewsPage {
        let snapshot = self.snapshot();
        paginate(&snapshot.articles, page, page_size)
    }

    /// The first `n` articles without their audio.
    pub fn top(&self, n: usize) -> Vec<ArticleSummary> {
        self.snapshot()
            .articles
            .iter()
            .take(n)
            .map(Article::summary)
            .collect()
    }
}

fn paginate(articles: &[Article], page: usize, page_size: usize) -> NewsPage {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total = articles.len();

    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    NewsPage {
        current_page: page,
        total_pages: total.div_ceil(page_size),
        total_news: total,
        news: articles[start..end].to_vec(),
    }
}

/// The published rashifal list.
#[derive(Debug, Default)]
pub struct ForecastStore {
    current: RwLock<Arc<Vec<RashifalEntry>>>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Arc<Vec<RashifalEntry>> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn publish(&self, entries: Vec<RashifalEntry>) {
        let next = Arc::new(entries);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Case-insensitive lookup by sign.
    pub fn find(&self, sign: &str) -> Option<RashifalEntry> {
        let wanted = sign.trim().to_lowercase();
        self.list()
            .iter()
            .find(|entry| entry.sign.to_lowercase() == wanted)
            .cloned()
    }
}
