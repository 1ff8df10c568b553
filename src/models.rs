//! Data models for articles, forecasts and the shapes the API returns.
//!
//! - [`Article`]: a scraped or submitted story, as published to readers
//! - [`ArticleSummary`]: the audio-free projection used by the top-N list
//! - [`PageMeta`]: calendar details printed once on the listing page
//! - [`RashifalEntry`]: one zodiac forecast
//! - [`NewsPage`]: one page of the paginated article list
//!
//! Field names serialise in camelCase because the mobile and admin clients
//! already consume that shape.

use serde::Serialize;

/// Where an [`Article`] came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArticleOrigin {
    #[default]
    Scraped,
    Submitted,
}

/// A news story as served to clients.
///
/// `urls` and `source_image_url` are index-aligned on a best-effort basis;
/// the source portal does not guarantee equal lengths.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Fragment id taken from the portal link, or the id a submitter chose.
    pub id: String,
    pub title: String,
    pub content: String,
    /// Card image, empty when the card had no inline background image.
    pub image_url: String,
    /// Provider logos of the corroborating sources.
    pub source_image_url: Vec<String>,
    /// Outbound links to the corroborating sources.
    pub urls: Vec<String>,
    /// "Published X ago" text from the portal, or a computed label.
    pub date: String,
    /// Base64 speech for the title; `None` when synthesis failed.
    pub title_audio: Option<String>,
    /// Base64 speech for the body; `None` when synthesis failed.
    pub content_audio: Option<String>,
    pub nepali_date: Option<String>,
    pub tithi: Option<String>,
    pub panchanga: Option<String>,
    #[serde(skip)]
    pub origin: ArticleOrigin,
}

impl Article {
    /// The fields the top-N listing shows.
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            title: self.title.clone(),
            image_url: self.image_url.clone(),
            source_image_url: self.source_image_url.clone(),
            urls: self.urls.clone(),
            date: self.date.clone(),
            nepali_date: self.nepali_date.clone(),
            tithi: self.tithi.clone(),
            panchanga: self.panchanga.clone(),
        }
    }
}

/// Audio-free projection of an [`Article`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub title: String,
    pub image_url: String,
    pub source_image_url: Vec<String>,
    pub urls: Vec<String>,
    pub date: String,
    pub nepali_date: Option<String>,
    pub tithi: Option<String>,
    pub panchanga: Option<String>,
}

/// Calendar metadata shown once on the listing page and copied onto every
/// article scraped from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub nepali_date: Option<String>,
    pub tithi: Option<String>,
    pub panchanga: Option<String>,
}

/// A zodiac forecast. `sign` is matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RashifalEntry {
    pub sign: String,
    pub description: String,
}

/// One page of the article list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPage {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_news: usize,
    pub news: Vec<Article>,
}

#[cfg(test)]
pub(crate) fn sample_article(id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{title} content"),
        image_url: format!("https://img.example/{id}.jpg"),
        source_image_url: vec!["https://logo.example/a.png".to_string()],
        urls: vec!["https://a.example/story".to_string()],
        date: "२ घण्टा अघि".to_string(),
        title_audio: Some("VGl0bGVBdWRpbw==".to_string()),
        content_audio: Some("Q29udGVudEF1ZGlv".to_string()),
        nepali_date: Some("भदौ १६".to_string()),
        tithi: Some("चतुर्दशी".to_string()),
        panchanga: None,
        origin: ArticleOrigin::Scraped,
    }
}
