//! Streaming keyword search: scans a document page by page through the
//! parser's pure `page_at` reads, so the reading position is never disturbed
//! and the document is never held in memory whole.
//!
//! The matcher is a single-pass scanner with one match index, not a KMP
//! automaton: on a mismatch the index resets to zero without re-checking the
//! current character against the keyword's first character, so an occurrence
//! whose prefix overlaps the tail of a partial match can be missed. That
//! behavior is pinned by tests; do not "fix" it without changing the observable
//! search results.

use crate::error::ReaderError;
use crate::parser::PagedParser;

/// Sentinel snippet inserted when the scan stops early because too many pages
/// matched. Its offset is 0 and it is not a real hit.
pub const TOO_MANY_RESULTS: &str = "Too many results, narrow your keyword";

/// One matching page: the page's full text and the cumulative units consumed
/// when the match completed (i.e. the offset just past that page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub snippet: String,
    pub offset: u64,
}

/// Drives the scan and keeps a one-entry cache: repeating the immediately
/// preceding query returns the cached hits without re-reading any page.
pub struct SearchEngine {
    page_size: usize,
    max_results: usize,
    last: Option<(String, Vec<SearchHit>)>,
}

impl SearchEngine {
    pub fn new(page_size: usize, max_results: usize) -> Self {
        Self {
            page_size,
            max_results,
            last: None,
        }
    }

    /// Drop the cached query (called when a different document is loaded).
    pub fn clear(&mut self) {
        self.last = None;
    }

    /// Scan the whole document for `keyword`. An absent keyword yields an
    /// empty list, never an error. A page registers at most one hit even if
    /// the keyword occurs in it several times.
    pub fn search(
        &mut self,
        parser: &mut dyn PagedParser,
        keyword: &str,
    ) -> Result<Vec<SearchHit>, ReaderError> {
        if let Some((prev, hits)) = &self.last {
            if prev == keyword {
                return Ok(hits.clone());
            }
        }

        let needle: Vec<char> = keyword.chars().collect();
        let mut hits: Vec<SearchHit> = Vec::new();

        if !needle.is_empty() {
            let mut i = 0usize;
            let mut cursor = 0u64;
            loop {
                let (content, consumed) = parser.page_at(self.page_size, cursor)?;
                cursor += consumed;
                if content.is_empty() && consumed == 0 {
                    break;
                }
                if hits.len() >= self.max_results {
                    hits.push(SearchHit {
                        snippet: TOO_MANY_RESULTS.to_string(),
                        offset: 0,
                    });
                    break;
                }

                for c in content.chars() {
                    if c == needle[i] {
                        i += 1;
                        if i == needle.len() {
                            if hits.last().map_or(true, |h| h.offset != cursor) {
                                hits.push(SearchHit {
                                    snippet: content.clone(),
                                    offset: cursor,
                                });
                            }
                            i = 0;
                        }
                    } else {
                        // No re-check of `c` against needle[0]; see module docs.
                        i = 0;
                    }
                }
            }
        }

        self.last = Some((keyword.to_string(), hits.clone()));
        Ok(hits)
    }
}
