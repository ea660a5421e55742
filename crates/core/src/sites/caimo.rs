//! Caimo-style chapter site: chapter body in `div.content`, next chapter via
//! the `a.next` pager link (falling back to the "下一章" label).

use scraper::{Html, Selector};

use crate::error::FetchError;
use crate::sites::{absolute_url, fetch_html, Chapter, ChapterSite};

pub struct CaimoSite {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl CaimoSite {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl ChapterSite for CaimoSite {
    fn name(&self) -> &str {
        "caimo"
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

    let content_sel = Selector::parse("div.content").unwrap();
    let content = doc
        .select(&content_sel)
        .next()
        .ok_or_else(|| FetchError::MissingContent {
            url: url.to_string(),
            selector: "div.content".to_string(),
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

    let next_sel = Selector::parse("a.next").unwrap();
    let a_sel = Selector::parse("a").unwrap();
    let next_url = doc
        .select(&next_sel)
        .next()
        .or_else(|| {
            doc.select(&a_sel).find(|a| {
                let label: String = a.text().collect();
                label.contains("下一章")
            })
        })
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolute_url(url, href));

    Ok(Chapter { text, next_url })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_and_pager_link() {
        let page = r#"<html><body>
          <div class="content"><p>春眠不觉晓，</p><p>处处闻啼鸟。</p></div>
          <div class="pager">
            <a class="prev" href="/read/7/1.html">上一章</a>
            <a class="next" href="/read/7/3.html">下一章</a>
          </div>
        </body></html>"#;
        let chapter = parse_chapter(page, "https://caimo.example.com/read/7/2.html").unwrap();
        assert_eq!(chapter.text, "春眠不觉晓，\n处处闻啼鸟。");
        assert_eq!(
            chapter.next_url.as_deref(),
            Some("https://caimo.example.com/read/7/3.html")
        );
    }

    #[test]
    fn falls_back_to_link_label() {
        let page = r#"<html><body>
          <div class="content">text</div>
          <a href="next.html">下一章</a>
        </body></html>"#;
        let chapter = parse_chapter(page, "https://caimo.example.com/read/7/2.html").unwrap();
        assert_eq!(
            chapter.next_url.as_deref(),
            Some("https://caimo.example.com/read/7/next.html")
        );
    }

    #[test]
    fn end_of_book_when_pager_links_nowhere() {
        let page = r#"<html><body>
          <div class="content">fin</div>
          <a class="next" href="javascript:void(0)">下一章</a>
        </body></html>"#;
        let chapter = parse_chapter(page, "https://caimo.example.com/read/7/99.html").unwrap();
        assert_eq!(chapter.next_url, None);
    }
}
