//! Paged parsers — each content source implements PagedParser to expose a
//! uniform forward/backward paging interface over its text.

pub mod txt;
pub mod web;

use crate::error::ReaderError;
use crate::history::PersistHistory;

/// One open document, paged by a caller-chosen page size.
///
/// Exactly one parser is active per session; callers must serialize operations
/// on it (no internal locking). Offsets are byte offsets for local files and
/// in-chapter character offsets for remote chapters; a parser never mixes the
/// two units within one instance.
pub trait PagedParser {
    /// Next `page_size` units from the current offset, advancing by the units
    /// actually returned. Empty string at end of document.
    fn next_page(&mut self, page_size: usize) -> Result<String, ReaderError>;

    /// Move back by up to `2 * page_size`, then serve `page_size` units
    /// forward, so "previous" shows the page before the last one shown.
    /// Never moves below 0.
    fn prev_page(&mut self, page_size: usize) -> Result<String, ReaderError>;

    /// Pure read for scanning callers: `(text, consumed)` for the slice at
    /// `from`, leaving the reading position untouched. `(empty, 0)` signals
    /// exhaustion.
    fn page_at(&mut self, page_size: usize, from: u64) -> Result<(String, u64), ReaderError>;

    /// Percent complete at the current offset, formatted (`"42.00%"`).
    /// Approximate for remote sources; never fails.
    fn percent(&self) -> String;

    /// Percent complete at an arbitrary offset (used before committing a
    /// search-result selection).
    fn percent_at(&self, offset: u64) -> String;

    /// Forcibly set the current offset (search-result pick).
    fn set_read_offset(&mut self, offset: u64);

    /// Snapshot for the history store.
    fn history(&self) -> PersistHistory;

    /// Release held resources. Idempotent; reads after close reacquire.
    fn close(&mut self);
}

/// Shared percent formatting: `part / whole` clamped to [0, 100].
pub(crate) fn format_percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "0.00%".to_string();
    }
    let pct = (part as f64 / whole as f64) * 100.0;
    format!("{:.2}%", pct.clamp(0.0, 100.0))
}
