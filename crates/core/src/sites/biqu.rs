//! Biqu-style chapter site: chapter body in `#content`, next chapter reached
//! through the "下一章" navigation link.

use scraper::{Html, Selector};

use crate::error::FetchError;
use crate::sites::{absolute_url, fetch_html, Chapter, ChapterSite};

pub struct BiquSite {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl BiquSite {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl ChapterSite for BiquSite {
    fn name(&self) -> &str {
        "biqu"
    }

    fn url_prefix(&self) -> &str {
        &self.base_url
    }

    fn fetch_chapter(&self, url: &str) -> Result<Chapter, FetchError> {
        let html = fetch_html(&self.client, url)?;
        parse_chapter(&html, url)
    }
}

fn parse_chapter(html: &str, url: &str) -> Result<Chapter, FetchError> {
    let doc = Html::parse_document(html);

    let content_sel = Selector::parse("#content").unwrap();
    let content = doc
        .select(&content_sel)
        .next()
        .ok_or_else(|| FetchError::MissingContent {
            url: url.to_string(),
            selector: "#content".to_string(),
        })?;

    let mut text = String::new();
    for piece in content.text() {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(piece);
    }

    let a_sel = Selector::parse("a").unwrap();
    let next_url = doc
        .select(&a_sel)
        .find(|a| {
            let label: String = a.text().collect();
            label.contains("下一章") || label.contains("下一页")
        })
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolute_url(url, href));

    Ok(Chapter { text, next_url })
}
