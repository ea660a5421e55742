//! Remote chapter parser: pages the text of a chapter chain fetched through a
//! site adapter. Only the current chapter is cached; chapters are fetched
//! lazily as reading (or a scan) crosses into them.
//!
//! Asymmetry, kept on purpose: paging forward crosses chapter boundaries by
//! fetching the next chapter, but paging backward clamps at the start of the
//! cached chapter rather than re-fetching the previous one.

use std::sync::Arc;

use crate::error::ReaderError;
use crate::history::PersistHistory;
use crate::parser::{format_percent, PagedParser};
use crate::sites::{Chapter, ChapterSite};

/// Character-addressed parser over one site's chapter chain. The offset is the
/// position within the current chapter; percent is chapter-relative since the
/// book's total length is unknown until the last chapter is reached.
pub struct WebChapterParser {
    site: Arc<dyn ChapterSite>,
    chapter_url: String,
    chapter: Option<Chapter>,
    offset: u64,
    scan: Option<ScanState>,
}

/// Search-scan cursor state, separate from the reading position.
struct ScanState {
    url: String,
    /// Characters consumed by the scan before this chapter.
    base: u64,
    chapter: Chapter,
}

impl WebChapterParser {
    /// Parser positioned at `read_offset` characters into the chapter at
    /// `chapter_url`. Nothing is fetched until the first read.
    pub fn new(site: Arc<dyn ChapterSite>, chapter_url: String, read_offset: u64) -> Self {
        Self {
            site,
            chapter_url,
            chapter: None,
            offset: read_offset,
            scan: None,
        }
    }

    pub fn chapter_url(&self) -> &str {
        &self.chapter_url
    }

    fn ensure_chapter(&mut self) -> Result<(), ReaderError> {
        if self.chapter.is_none() {
            let chapter = self.site.fetch_chapter(&self.chapter_url)?;
            self.chapter = Some(chapter);
        }
        Ok(())
    }

    fn chapter_len(&self) -> u64 {
        self.chapter
            .as_ref()
            .map(|c| c.text.chars().count() as u64)
            .unwrap_or(0)
    }
}

/// `count` characters of `text` starting at character `from`, plus how many
/// characters were actually taken.
fn take_chars(text: &str, from: u64, count: usize) -> (String, u64) {
    let taken: String = text.chars().skip(from as usize).take(count).collect();
    let consumed = taken.chars().count() as u64;
    (taken, consumed)
}

impl PagedParser for WebChapterParser {
    fn next_page(&mut self, page_size: usize) -> Result<String, ReaderError> {
        self.ensure_chapter()?;
        loop {
            let (text, consumed, next_url) = match &self.chapter {
                Some(chapter) => {
                    let (text, consumed) = take_chars(&chapter.text, self.offset, page_size);
                    (text, consumed, chapter.next_url.clone())
                }
                None => return Ok(String::new()),
            };

            if consumed > 0 {
                self.offset += consumed;
                return Ok(text);
            }

            match next_url {
                // Guard against a pager that links back to itself.
                Some(url) if url != self.chapter_url => {
                    // Fetch before committing, so a failure leaves the current
                    // chapter and offset intact for a retry.
                    let fetched = self.site.fetch_chapter(&url)?;
                    self.chapter_url = url;
                    self.chapter = Some(fetched);
                    self.offset = 0;
                }
                _ => return Ok(String::new()),
            }
        }
    }

    fn prev_page(&mut self, page_size: usize) -> Result<String, ReaderError> {
        self.offset = self.offset.saturating_sub(2 * page_size as u64);
        self.ensure_chapter()?;
        match &self.chapter {
            Some(chapter) => {
                let (text, consumed) = take_chars(&chapter.text, self.offset, page_size);
                self.offset += consumed;
                Ok(text)
            }
            None => Ok(String::new()),
        }
    }

    fn page_at(&mut self, page_size: usize, from: u64) -> Result<(String, u64), ReaderError> {
        // The scan starts at the current chapter and only moves forward; a
        // cursor that moves backwards restarts it.
        if self.scan.as_ref().map_or(true, |s| from < s.base) {
            let chapter = match &self.chapter {
                Some(c) => c.clone(),
                None => self.site.fetch_chapter(&self.chapter_url)?,
            };
            self.scan = Some(ScanState {
                url: self.chapter_url.clone(),
                base: 0,
                chapter,
            });
        }

        let site = Arc::clone(&self.site);
        let scan = match self.scan.as_mut() {
            Some(s) => s,
            None => return Ok((String::new(), 0)),
        };

        loop {
            let total = scan.chapter.text.chars().count() as u64;
            if from < scan.base + total {
                return Ok(take_chars(&scan.chapter.text, from - scan.base, page_size));
            }
            match scan.chapter.next_url.clone() {
                Some(url) if url != scan.url => {
                    let fetched = site.fetch_chapter(&url)?;
                    scan.base += total;
                    scan.url = url;
                    scan.chapter = fetched;
                }
                _ => return Ok((String::new(), 0)),
            }
        }
    }

    fn percent(&self) -> String {
        format_percent(self.offset.min(self.chapter_len()), self.chapter_len())
    }

    fn percent_at(&self, offset: u64) -> String {
        format_percent(offset.min(self.chapter_len()), self.chapter_len())
    }

    fn set_read_offset(&mut self, offset: u64) {
        self.offset = match self.chapter {
            Some(_) => offset.min(self.chapter_len()),
            None => offset,
        };
    }

    fn history(&self) -> PersistHistory {
        PersistHistory::online(self.chapter_url.clone(), self.offset)
    }

    fn close(&mut self) {
        self.chapter = None;
        self.scan = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedSite {
        prefix: String,
        chapters: HashMap<String, Chapter>,
        fetches: AtomicUsize,
    }

    impl ScriptedSite {
        fn new(chapters: Vec<(&str, &str, Option<&str>)>) -> Arc<Self> {
            let chapters = chapters
                .into_iter()
                .map(|(url, text, next)| {
                    (
                        url.to_string(),
                        Chapter {
                            text: text.to_string(),
                            next_url: next.map(String::from),
                        },
                    )
                })
                .collect();
            Arc::new(Self {
                prefix: "https://novel.test".to_string(),
                chapters,
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ChapterSite for ScriptedSite {
        fn name(&self) -> &str {
            "scripted"
        }

        fn url_prefix(&self) -> &str {
            &self.prefix
        }

        fn fetch_chapter(&self, url: &str) -> Result<Chapter, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.chapters
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Network {
                    url: url.to_string(),
                    detail: "connection refused".to_string(),
                })
        }
    }

    fn two_chapter_site() -> Arc<ScriptedSite> {
        ScriptedSite::new(vec![
            ("https://novel.test/1", "ABCDEFGH", Some("https://novel.test/2")),
            ("https://novel.test/2", "IJKL", None),
        ])
    }

    #[test]
    fn pages_across_chapter_boundary() {
        let site = two_chapter_site();
        let mut p = WebChapterParser::new(site.clone(), "https://novel.test/1".into(), 0);

        assert_eq!(p.next_page(5).unwrap(), "ABCDE");
        assert_eq!(p.next_page(5).unwrap(), "FGH");
        // Chapter 1 exhausted: the next read fetches chapter 2.
        assert_eq!(p.next_page(5).unwrap(), "IJKL");
        assert_eq!(p.history(), PersistHistory::online("https://novel.test/2".into(), 4));
        // End of book.
        assert_eq!(p.next_page(5).unwrap(), "");
        assert_eq!(site.fetch_count(), 2);
    }

    #[test]
    fn prev_clamps_at_chapter_start_without_refetch() {
        let site = two_chapter_site();
        let mut p = WebChapterParser::new(site.clone(), "https://novel.test/2".into(), 0);
        assert_eq!(p.next_page(4).unwrap(), "IJKL");
        let fetched = site.fetch_count();

        assert_eq!(p.prev_page(4).unwrap(), "IJKL");
        assert_eq!(p.prev_page(4).unwrap(), "IJKL");
        assert_eq!(site.fetch_count(), fetched);
    }

    #[test]
    fn scan_walks_chain_without_moving_reading_offset() {
        let site = two_chapter_site();
        let mut p = WebChapterParser::new(site.clone(), "https://novel.test/1".into(), 0);
        assert_eq!(p.next_page(3).unwrap(), "ABC");

        let mut cursor = 0u64;
        let mut joined = String::new();
        loop {
            let (text, consumed) = p.page_at(5, cursor).unwrap();
            if text.is_empty() && consumed == 0 {
                break;
            }
            cursor += consumed;
            joined.push_str(&text);
        }
        assert_eq!(joined, "ABCDEFGHIJKL");
        assert_eq!(cursor, 12);
        // Reading position untouched by the scan.
        assert_eq!(p.history(), PersistHistory::online("https://novel.test/1".into(), 3));
        assert_eq!(p.next_page(3).unwrap(), "DEF");
    }

    #[test]
    fn failed_fetch_leaves_state_for_retry() {
        let site = ScriptedSite::new(vec![(
            "https://novel.test/1",
            "AB",
            Some("https://novel.test/offline"),
        )]);
        let mut p = WebChapterParser::new(site, "https://novel.test/1".into(), 0);
        assert_eq!(p.next_page(2).unwrap(), "AB");

        let err = p.next_page(2).unwrap_err();
        assert!(matches!(err, ReaderError::Fetch(FetchError::Network { .. })));
        // Current chapter and offset unchanged, so the caller may retry.
        assert_eq!(p.history(), PersistHistory::online("https://novel.test/1".into(), 2));
    }

    #[test]
    fn percent_is_chapter_relative_and_total() {
        let site = two_chapter_site();
        let mut p = WebChapterParser::new(site, "https://novel.test/1".into(), 0);
        assert_eq!(p.percent(), "0.00%");
        p.next_page(4).unwrap();
        assert_eq!(p.percent(), "50.00%");
        assert_eq!(p.percent_at(2), "25.00%");
    }

    #[test]
    fn close_drops_cache_and_reads_refetch() {
        let site = two_chapter_site();
        let mut p = WebChapterParser::new(site.clone(), "https://novel.test/1".into(), 0);
        p.next_page(4).unwrap();
        p.close();
        p.close();
        assert_eq!(p.next_page(4).unwrap(), "EFGH");
        assert_eq!(site.fetch_count(), 2);
    }
}
