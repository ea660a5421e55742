//! Chapter sites: pluggable adapters for the remote novel sites we can read.
//!
//! Each adapter knows how to fetch one chapter page, extract the visible
//! chapter text (stripping markup and navigation chrome), and find the next
//! chapter's URL. The registry routes a persisted chapter URL to the adapter
//! whose base URL prefixes it.

pub mod biqu;
pub mod caimo;

use std::sync::Arc;

use crate::config::SitesConfig;
use crate::error::FetchError;

/// One fetched chapter: its extracted text and, unless this is the last
/// chapter of the book, the URL of the next one.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub text: String,
    pub next_url: Option<String>,
}

/// A supported remote site. Implementations fetch lazily and cache nothing;
/// the parser above them caches the current chapter.
pub trait ChapterSite: Send + Sync {
    /// Short name (e.g. "biqu").
    fn name(&self) -> &str;

    /// URL prefix this site answers for. The registry routes by it.
    fn url_prefix(&self) -> &str;

    /// Fetch and extract one chapter. Not retried internally.
    fn fetch_chapter(&self, url: &str) -> Result<Chapter, FetchError>;
}

/// The closed set of sites this build knows about.
pub struct SiteRegistry {
    sites: Vec<Arc<dyn ChapterSite>>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        Self { sites: Vec::new() }
    }

    /// Registry with the built-in adapters, base URLs taken from config.
    pub fn from_config(cfg: &SitesConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(biqu::BiquSite::new(cfg.biqu_url.clone())));
        registry.register(Arc::new(caimo::CaimoSite::new(cfg.caimo_url.clone())));
        registry
    }

    pub fn register(&mut self, site: Arc<dyn ChapterSite>) {
        self.sites.push(site);
    }

    /// Find the site responsible for `url`, by prefix.
    pub fn resolve(&self, url: &str) -> Option<Arc<dyn ChapterSite>> {
        self.sites
            .iter()
            .find(|s| url.starts_with(s.url_prefix()))
            .cloned()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// GET a page as text. Non-2xx statuses are errors; there is no timeout or
/// retry here, callers layer those if they need them.
pub(crate) fn fetch_html(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<String, FetchError> {
    tracing::debug!("Fetching chapter page {url}");
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "turnpage/0.1")
        .send()
        .map_err(|e| FetchError::Network {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().map_err(|e| FetchError::Network {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

/// Resolve an href against the page it appeared on. Fragment-only and
/// javascript pseudo-links are treated as "no link".
pub(crate) fn absolute_url(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let base = url::Url::parse(page_url).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}
