//! Local file parser: pages a UTF-8 text file by byte ranges, without ever
//! holding the whole file in memory.

use std::fs::File;
use std::io::{Read as _, Seek as _, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::ReaderError;
use crate::history::PersistHistory;
use crate::parser::{format_percent, PagedParser};

/// Pages a file on disk. Byte-addressed: the percent denominator is the file
/// byte size, and page reads trim to UTF-8 boundaries so consecutive reads
/// partition the file exactly.
pub struct TxtFileParser {
    path: PathBuf,
    file: Option<File>,
    size: u64,
    offset: u64,
}

impl TxtFileParser {
    /// Open `path` positioned at `read_offset` (clamped to the file size).
    pub fn open(path: impl AsRef<Path>, read_offset: u64) -> Result<Self, ReaderError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            file: Some(file),
            size,
            offset: read_offset.min(size),
        })
    }

    fn file(&mut self) -> std::io::Result<&mut File> {
        match &mut self.file {
            Some(file) => Ok(file),
            slot => Ok(slot.insert(File::open(&self.path)?)),
        }
    }

    /// Read up to `max_bytes` from `from`, trimmed back to a UTF-8 boundary.
    /// Returns `(text, bytes consumed)`; `(empty, 0)` past end of file.
    fn read_span(&mut self, from: u64, max_bytes: usize) -> Result<(String, u64), ReaderError> {
        if from >= self.size || max_bytes == 0 {
            return Ok((String::new(), 0));
        }
        let want = max_bytes.min((self.size - from) as usize);
        let file = self.file()?;
        file.seek(SeekFrom::Start(from))?;
        let mut buf = vec![0u8; want];
        file.read_exact(&mut buf)?;

        match std::str::from_utf8(&buf) {
            Ok(s) => Ok((s.to_owned(), buf.len() as u64)),
            Err(err) if err.valid_up_to() > 0 => {
                // Trailing bytes are a split multibyte char (or garbage);
                // leave them for the next read.
                let valid = err.valid_up_to();
                let text = String::from_utf8_lossy(&buf[..valid]).into_owned();
                Ok((text, valid as u64))
            }
            // Not valid UTF-8 even at the start (offset forced mid-char, or a
            // binary file): consume the bytes lossily so scans still terminate.
            Err(_) => Ok((String::from_utf8_lossy(&buf).into_owned(), buf.len() as u64)),
        }
    }
}

impl PagedParser for TxtFileParser {
    fn next_page(&mut self, page_size: usize) -> Result<String, ReaderError> {
        let (text, consumed) = self.read_span(self.offset, page_size)?;
        self.offset += consumed;
        Ok(text)
    }

    fn prev_page(&mut self, page_size: usize) -> Result<String, ReaderError> {
        self.offset = self.offset.saturating_sub(2 * page_size as u64);
        self.next_page(page_size)
    }

    fn page_at(&mut self, page_size: usize, from: u64) -> Result<(String, u64), ReaderError> {
        self.read_span(from, page_size)
    }

    fn percent(&self) -> String {
        format_percent(self.offset, self.size)
    }

    fn percent_at(&self, offset: u64) -> String {
        format_percent(offset.min(self.size), self.size)
    }

    fn set_read_offset(&mut self, offset: u64) {
        self.offset = offset.min(self.size);
    }

    fn history(&self) -> PersistHistory {
        PersistHistory::local(self.offset)
    }

    fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write as _;

    fn book(content: &str) -> (tempfile::TempDir, TxtFileParser) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        (dir, TxtFileParser::open(&path, 0).unwrap())
    }

    #[test]
    fn pages_until_eof() {
        let (_dir, mut p) = book("ABCDEABCABCDE");
        assert_eq!(p.next_page(5).unwrap(), "ABCDE");
        assert_eq!(p.percent(), "38.46%");
        assert_eq!(p.next_page(5).unwrap(), "ABCAB");
        assert_eq!(p.percent(), "76.92%");
        assert_eq!(p.next_page(5).unwrap(), "CDE");
        assert_eq!(p.percent(), "100.00%");
        assert_eq!(p.next_page(5).unwrap(), "");
        assert_eq!(p.percent(), "100.00%");
    }

    #[test]
    fn prev_returns_to_prior_page() {
        let (_dir, mut p) = book("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(p.next_page(5).unwrap(), "ABCDE");
        assert_eq!(p.next_page(5).unwrap(), "FGHIJ");
        assert_eq!(p.prev_page(5).unwrap(), "ABCDE");
        assert_eq!(p.next_page(5).unwrap(), "FGHIJ");
    }

    #[test]
    fn prev_clamps_at_start() {
        let (_dir, mut p) = book("ABCDEFGH");
        assert_eq!(p.prev_page(5).unwrap(), "ABCDE");
        assert_eq!(p.history().read_offset, 5);
    }

    #[test]
    fn page_at_does_not_move_reading_offset() {
        let (_dir, mut p) = book("ABCDEABCABCDE");
        p.next_page(5).unwrap();
        let (text, consumed) = p.page_at(5, 10).unwrap();
        assert_eq!(text, "CDE");
        assert_eq!(consumed, 3);
        assert_eq!(p.history().read_offset, 5);
        assert_eq!(p.page_at(5, 13).unwrap(), (String::new(), 0));
    }

    #[test]
    fn percent_monotone_over_full_read() {
        let (_dir, mut p) = book("The quick brown fox jumps over the lazy dog");
        let mut last = 0.0f64;
        assert_eq!(p.percent(), "0.00%");
        loop {
            let page = p.next_page(7).unwrap();
            let pct: f64 = p.percent().trim_end_matches('%').parse().unwrap();
            assert!(pct >= last);
            last = pct;
            if page.is_empty() {
                break;
            }
        }
        assert_eq!(p.percent(), "100.00%");
    }

    #[test]
    fn multibyte_chars_never_split() {
        let content = "héllo wörld — ÀÉÎÕÜ";
        let (_dir, mut p) = book(content);
        let mut joined = String::new();
        loop {
            let page = p.next_page(3).unwrap();
            if page.is_empty() {
                break;
            }
            assert!(!page.contains('\u{FFFD}'));
            joined.push_str(&page);
        }
        assert_eq!(joined, content);
    }

    #[test]
    fn close_is_idempotent_and_reads_reopen() {
        let (_dir, mut p) = book("ABCDEFGH");
        p.close();
        p.close();
        assert_eq!(p.next_page(4).unwrap(), "ABCD");
    }

    #[test]
    fn set_read_offset_clamps_to_size() {
        let (_dir, mut p) = book("ABCDEFGH");
        p.set_read_offset(100);
        assert_eq!(p.history().read_offset, 8);
        assert_eq!(p.percent_at(3), "37.50%");
    }

    proptest! {
        // Successive page_at calls partition the file: no gaps, no overlaps,
        // concatenation reconstructs the original text. Page size stays at or
        // above the widest UTF-8 char so a page always fits one.
        #[test]
        fn pages_partition_file(content in "\\PC{0,200}", page_size in 4usize..17) {
            let (_dir, mut p) = book(&content);
            let mut cursor = 0u64;
            let mut joined = String::new();
            loop {
                let (text, consumed) = p.page_at(page_size, cursor).unwrap();
                if text.is_empty() && consumed == 0 {
                    break;
                }
                prop_assert_eq!(text.len() as u64, consumed);
                cursor += consumed;
                joined.push_str(&text);
            }
            prop_assert_eq!(cursor, content.len() as u64);
            prop_assert_eq!(joined, content);
        }
    }
}
