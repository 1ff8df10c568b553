//! Hamro Patro news and rashifal scraper.
//!
//! The portal homepage carries a strip of `.news-story-card` anchors. Each
//! card links to a shared news page plus a `#fragment` naming the element
//! that holds the full story, so the fragment doubles as the article id.
//!
//! # Listing card
//!
//! ```html
//! <a class="news-story-card" href="/news#n123" style="background-image: url('/img/n123.jpg')">
//!   <div class="news-story-card-text">शीर्षक</div>
//!   <img src="https://logo.example/provider.png">
//! </a>
//! ```
//!
//! # Detail element
//!
//! ```html
//! <div id="n123">
//!   <span class="news-story-date">२ घण्टा अघि</span>
//!   <div class="news-story-card-text">पूरा समाचार ...</div>
//!   <div class="news-sources"><a href="https://provider.example/story">...</a></div>
//! </div>
//! ```
//!
//! Every extraction point yields an explicit `Option`; a card without a
//! title or link is skipped, a card without a fragment gets an empty id.

use crate::models::{PageMeta, RashifalEntry};
use crate::scrapers::{FetchError, PageFetcher};
use crate::utils::{collapse_whitespace, strip_css_quotes};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

static CARD: Lazy<Selector> = Lazy::new(|| selector(".news-story-card"));
static CARD_TEXT: Lazy<Selector> = Lazy::new(|| selector(".news-story-card-text"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static NEPALI_DATE: Lazy<Selector> = Lazy::new(|| selector(".logo .date .nep"));
static TITHI: Lazy<Selector> = Lazy::new(|| selector(".logo .tithi"));
static PANCHANGA: Lazy<Selector> = Lazy::new(|| selector(".logo .panchangaWrapper"));
static WITH_ID: Lazy<Selector> = Lazy::new(|| selector("[id]"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static STORY_DATE: Lazy<Selector> = Lazy::new(|| selector(".news-story-date"));
static TIME: Lazy<Selector> = Lazy::new(|| selector(".time"));
static SOURCE_LINKS: Lazy<Selector> = Lazy::new(|| selector(".news-sources a[href]"));
static ANY_LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static RASHIFAL_ITEM: Lazy<Selector> = Lazy::new(|| selector(".item"));
static RASHIFAL_TITLE: Lazy<Selector> = Lazy::new(|| selector(".title"));
static H3: Lazy<Selector> = Lazy::new(|| selector("h3"));
static RASHIFAL_DESC: Lazy<Selector> = Lazy::new(|| selector(".desc"));

static BACKGROUND_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"url\((.*?)\)").expect("background url regex"));

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid portal URL {url:?}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no element with id {id:?} on {link}")]
    MissingArticle { link: String, id: String },
}

/// One card from the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    /// Absolute link, fragment included.
    pub link: String,
    pub image_url: String,
    pub source_image_url: Vec<String>,
    /// Link fragment; empty when the link has none.
    pub id: String,
}

/// The parsed listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<ListingEntry>,
    pub meta: PageMeta,
}

/// Fields pulled from an article's detail element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDetail {
    pub published_date: String,
    pub body: String,
    pub source_urls: Vec<String>,
}

/// A card joined with its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedStory {
    pub entry: ListingEntry,
    pub detail: ArticleDetail,
}

/// Everything one listing walk produced.
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatch {
    pub stories: Vec<ScrapedStory>,
    pub meta: PageMeta,
    /// Cards skipped for an empty or repeated id.
    pub skipped: usize,
    /// Cards whose detail fetch or parse failed.
    pub dropped: usize,
}

/// Parse the portal homepage into cards and page-level metadata.
pub fn parse_listing(html: &str, base: &Url) -> Listing {
    let document = Html::parse_document(html);

    let entries = document
        .select(&CARD)
        .filter_map(|card| parse_card(card, base))
        .collect();

    let meta = PageMeta {
        nepali_date: first_text(&document.root_element(), &NEPALI_DATE),
        tithi: first_text(&document.root_element(), &TITHI),
        panchanga: first_text(&document.root_element(), &PANCHANGA),
    };

    Listing { entries, meta }
}

fn parse_card(card: ElementRef<'_>, base: &Url) -> Option<ListingEntry> {
    let Some(title) = first_text(&card, &CARD_TEXT) else {
        debug!("Card without title text; skipping");
        return None;
    };
    let Some(href) = card.value().attr("href") else {
        debug!(%title, "Card without href; skipping");
        return None;
    };
    let link = match base.join(href) {
        Ok(link) => link,
        Err(e) => {
            debug!(%href, error = %e, "Card href does not resolve; skipping");
            return None;
        }
    };

    let image_url = card
        .value()
        .attr("style")
        .and_then(background_image)
        .map(|raw| resolve(base, raw))
        .unwrap_or_default();

    let source_image_url = card
        .select(&IMG)
        .filter_map(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
        .map(|src| resolve(base, src))
        .collect();

    Some(ListingEntry {
        title,
        id: link.fragment().unwrap_or_default().to_string(),
        link: link.to_string(),
        image_url,
        source_image_url,
    })
}

/// Pull the first `url(...)` argument out of inline style text.
pub fn background_image(style: &str) -> Option<&str> {
    let raw = BACKGROUND_URL.captures(style)?.get(1)?.as_str();
    let url = strip_css_quotes(raw);
    (!url.is_empty()).then_some(url)
}

/// Parse the element whose `id` attribute equals `id` out of a detail page.
///
/// The id is compared by value so fragments that are not valid CSS
/// identifiers (leading digits, punctuation) still match.
pub fn parse_detail(html: &str, id: &str, base: &Url) -> Option<ArticleDetail> {
    if id.is_empty() {
        return None;
    }
    let document = Html::parse_document(html);
    let scope = document
        .select(&WITH_ID)
        .find(|el| el.value().id() == Some(id))?;

    let body = first_text(&scope, &CARD_TEXT).unwrap_or_else(|| {
        scope
            .select(&PARAGRAPH)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|p| !p.is_empty())
            .join("\n\n")
    });

    let published_date = first_text(&scope, &STORY_DATE)
        .or_else(|| first_text(&scope, &TIME))
        .unwrap_or_default();

    let mut links: Vec<String> = scope
        .select(&SOURCE_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| resolve(base, href))
        .collect();
    if links.is_empty() {
        links = scope
            .select(&ANY_LINK)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .filter(|url| url.host_str() != base.host_str())
            .map(String::from)
            .collect();
    }
    let source_urls = links.into_iter().unique().collect();

    Some(ArticleDetail {
        published_date,
        body,
        source_urls,
    })
}

/// Parse the rashifal page into forecasts. Blocks missing either the sign
/// or the description are skipped.
pub fn parse_rashifal(html: &str) -> Vec<RashifalEntry> {
    let document = Html::parse_document(html);
    document
        .select(&RASHIFAL_ITEM)
        .filter_map(|item| {
            let sign = first_text(&item, &RASHIFAL_TITLE).or_else(|| first_text(&item, &H3))?;
            let description = first_text(&item, &RASHIFAL_DESC)?;
            Some(RashifalEntry { sign, description })
        })
        .collect()
}

fn first_text(scope: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn resolve(base: &Url, raw: &str) -> String {
    base.join(raw)
        .map(String::from)
        .unwrap_or_else(|_| raw.to_string())
}

/// Reads the portal through a [`PageFetcher`].
pub struct SourceFetcher {
    pages: Arc<dyn PageFetcher>,
    base: Url,
    rashifal_url: Url,
}

impl SourceFetcher {
    pub fn new(
        pages: Arc<dyn PageFetcher>,
        source_url: &str,
        rashifal_url: &str,
    ) -> Result<Self, SourceError> {
        let parse = |url: &str| {
            Url::parse(url).map_err(|source| SourceError::BadUrl {
                url: url.to_string(),
                source,
            })
        };
        Ok(Self {
            pages,
            base: parse(source_url)?,
            rashifal_url: parse(rashifal_url)?,
        })
    }

    /// Fetch and parse the homepage.
    #[instrument(level = "info", skip_all, fields(url = %self.base))]
    pub async fn fetch_listing(&self) -> Result<Listing, SourceError> {
        let html = self.pages.fetch_html(self.base.as_str()).await?;
        let listing = parse_listing(&html, &self.base);
        info!(cards = listing.entries.len(), "Parsed listing page");
        Ok(listing)
    }

    /// Fetch `link` and parse the element named by `id`.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_detail(&self, link: &str, id: &str) -> Result<ArticleDetail, SourceError> {
        let mut page = Url::parse(link).map_err(|source| SourceError::BadUrl {
            url: link.to_string(),
            source,
        })?;
        page.set_fragment(None);

        let html = self.pages.fetch_html(page.as_str()).await?;
        parse_detail(&html, id, &self.base).ok_or_else(|| SourceError::MissingArticle {
            link: link.to_string(),
            id: id.to_string(),
        })
    }

    /// Walk the listing and fetch each surviving card's detail, one at a time.
    ///
    /// Cards with an empty id, or an id already seen in this walk, are
    /// skipped before any detail request. A failed detail drops only that
    /// card; a failed listing fails the whole batch.
    ///
    /// # Returns
    ///
    /// A [`ScrapeBatch`] with the stories in listing order, the page-level
    /// calendar metadata, and how many cards were skipped or dropped. The
    /// batch may hold no stories; deciding what that means is up to the
    /// caller.
    ///
    /// # Errors
    ///
    /// [`SourceError`] when the listing page cannot be fetched.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let batch = source.scrape().await?;
    /// info!(stories = batch.stories.len(), dropped = batch.dropped);
    /// ```
    #[instrument(level = "info", skip_all)]
    pub async fn scrape(&self) -> Result<ScrapeBatch, SourceError> {
        let Listing { entries, meta } = self.fetch_listing().await?;

        let mut seen = HashSet::new();
        let total = entries.len();
        let unique: Vec<ListingEntry> = entries
            .into_iter()
            .filter(|entry| !entry.id.is_empty() && seen.insert(entry.id.clone()))
            .collect();
        let skipped = total - unique.len();
        if skipped > 0 {
            debug!(skipped, "Skipped cards with empty or repeated ids");
        }

        let attempted = unique.len();
        let stories: Vec<ScrapedStory> = stream::iter(unique)
            .then(|entry| async move {
                match self.fetch_detail(&entry.link, &entry.id).await {
                    Ok(detail) => Some(ScrapedStory { entry, detail }),
                    Err(e) => {
                        warn!(id = %entry.id, link = %entry.link, error = %e, "Detail fetch failed; dropping article");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await;

        let dropped = attempted - stories.len();
        info!(stories = stories.len(), skipped, dropped, "Scraped portal");
        Ok(ScrapeBatch {
            stories,
            meta,
            skipped,
            dropped,
        })
    }

    /// Fetch and parse the rashifal page.
    #[instrument(level = "info", skip_all, fields(url = %self.rashifal_url))]
    pub async fn fetch_rashifal(&self) -> Result<Vec<RashifalEntry>, SourceError> {
        let html = self.pages.fetch_html(self.rashifal_url.as_str()).await?;
        let entries = parse_rashifal(&html);
        info!(count = entries.len(), "Parsed rashifal page");
        Ok(entries)
    }
}
