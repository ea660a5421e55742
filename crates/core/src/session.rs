//! Reading session: the explicit context object owning the one active parser,
//! the history store, the site registry, and the search cache.
//!
//! Exactly one document is open at a time; loading another closes the previous
//! parser first so no file handle leaks. All operations are sequential; state
//! is persisted only after an operation completes, so a failure mid-fetch
//! loses at most the in-progress navigation.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{LoadError, ReaderError};
use crate::history::{BookKind, HistoryStore, PersistHistory};
use crate::parser::txt::TxtFileParser;
use crate::parser::web::WebChapterParser;
use crate::parser::PagedParser;
use crate::search::{SearchEngine, SearchHit};
use crate::sites::{ChapterSite, SiteRegistry};

pub struct ReadingSession<S: HistoryStore> {
    page_size: usize,
    store: S,
    registry: SiteRegistry,
    book_path: Option<String>,
    parser: Option<Box<dyn PagedParser>>,
    search: SearchEngine,
}

impl<S: HistoryStore> ReadingSession<S> {
    pub fn new(config: &AppConfig, store: S) -> Self {
        Self {
            page_size: config.reading.page_size,
            store,
            registry: SiteRegistry::from_config(&config.sites),
            book_path: None,
            parser: None,
            search: SearchEngine::new(config.reading.page_size, config.reading.max_search_count),
        }
    }

    /// Add a site adapter beyond the built-ins (also used by tests).
    pub fn register_site(&mut self, site: Arc<dyn ChapterSite>) {
        self.registry.register(site);
    }

    pub fn book_path(&self) -> Option<&str> {
        self.book_path.as_deref()
    }

    /// Open a document by local path or chapter URL: closes any prior parser,
    /// restores the persisted position (accepting the legacy bare-integer
    /// form), and returns the first page.
    pub fn load(&mut self, path_or_url: &str) -> Result<String, ReaderError> {
        if let Some(parser) = self.parser.as_mut() {
            parser.close();
        }
        self.parser = None;
        self.book_path = None;
        self.search.clear();

        let history = self.stored_history(path_or_url)?;
        self.parser = Some(self.build_parser(path_or_url, &history)?);
        self.book_path = Some(path_or_url.to_string());
        self.store.set_current_book(path_or_url)?;
        self.next_page()
    }

    /// Next page, formatted `"<text>   <percent>"`. The empty string is the
    /// end-of-document sentinel (a normal terminal condition, not an error);
    /// nothing is persisted for it.
    pub fn next_page(&mut self) -> Result<String, ReaderError> {
        self.ensure_open()?;
        let page_size = self.page_size;
        let parser = self.parser_mut()?;
        let content = parser.next_page(page_size)?;
        if content.is_empty() {
            return Ok(String::new());
        }
        let percent = parser.percent();
        self.persist()?;
        Ok(format!("{content}   {percent}"))
    }

    /// Previous page, formatted like `next_page` (always carries a percent,
    /// even at the very start of the document).
    pub fn prev_page(&mut self) -> Result<String, ReaderError> {
        self.ensure_open()?;
        let page_size = self.page_size;
        let parser = self.parser_mut()?;
        let content = parser.prev_page(page_size)?;
        let percent = parser.percent();
        self.persist()?;
        Ok(format!("{content}   {percent}"))
    }

    /// Scan the open document for `keyword`. Does not move the reading
    /// position; the caller presents the hits and commits one via
    /// [`select_result`](Self::select_result).
    pub fn search(&mut self, keyword: &str) -> Result<Vec<SearchHit>, ReaderError> {
        self.ensure_open()?;
        let parser = match self.parser.as_mut() {
            Some(p) => p,
            None => return Err(LoadError::NoBookOpen.into()),
        };
        self.search.search(parser.as_mut(), keyword)
    }

    /// Commit a picked search hit as the new reading position and return
    /// `"<snippet> <percent>"`.
    pub fn select_result(&mut self, hit: &SearchHit) -> Result<String, ReaderError> {
        self.ensure_open()?;
        let parser = self.parser_mut()?;
        let percent = parser.percent_at(hit.offset);
        parser.set_read_offset(hit.offset);
        self.persist()?;
        Ok(format!("{} {}", hit.snippet, percent))
    }

    /// Jump to an absolute offset; returns the percent there.
    pub fn goto(&mut self, offset: u64) -> Result<String, ReaderError> {
        self.ensure_open()?;
        let parser = self.parser_mut()?;
        parser.set_read_offset(offset);
        let percent = parser.percent();
        self.persist()?;
        Ok(percent)
    }

    /// Release the active parser's resources. Idempotent.
    pub fn close(&mut self) {
        if let Some(parser) = self.parser.as_mut() {
            parser.close();
        }
    }

    fn parser_mut(&mut self) -> Result<&mut Box<dyn PagedParser>, ReaderError> {
        self.parser
            .as_mut()
            .ok_or_else(|| LoadError::NoBookOpen.into())
    }

    /// Reopen the book the store says is current (fresh process, no explicit
    /// load yet).
    fn ensure_open(&mut self) -> Result<(), ReaderError> {
        if self.parser.is_some() {
            return Ok(());
        }
        let key = self
            .store
            .current_book()
            .ok_or(LoadError::NoBookOpen)?;
        let history = self.stored_history(&key)?;
        self.parser = Some(self.build_parser(&key, &history)?);
        self.book_path = Some(key);
        Ok(())
    }

    fn stored_history(&self, key: &str) -> Result<PersistHistory, ReaderError> {
        match self.store.get(key) {
            Some(stored) => stored.resolve().map_err(ReaderError::Load),
            None => Ok(self.default_history(key)),
        }
    }

    /// First load of an unseen document: a URL matching a registered site is
    /// an online book starting at its given chapter; anything else is local.
    fn default_history(&self, key: &str) -> PersistHistory {
        if self.registry.resolve(key).is_some() {
            PersistHistory::online(key.to_string(), 0)
        } else {
            PersistHistory::local(0)
        }
    }

    fn build_parser(
        &self,
        key: &str,
        history: &PersistHistory,
    ) -> Result<Box<dyn PagedParser>, ReaderError> {
        match history.kind {
            BookKind::Local => Ok(Box::new(TxtFileParser::open(key, history.read_offset)?)),
            BookKind::Online => {
                let url = history
                    .section_path
                    .clone()
                    .ok_or_else(|| LoadError::UnsupportedDomain("(no section path)".to_string()))?;
                let site = self
                    .registry
                    .resolve(&url)
                    .ok_or_else(|| LoadError::UnsupportedDomain(url.clone()))?;
                Ok(Box::new(WebChapterParser::new(site, url, history.read_offset)))
            }
        }
    }

    fn persist(&mut self) -> Result<(), ReaderError> {
        if let (Some(path), Some(parser)) = (&self.book_path, &self.parser) {
            self.store.upsert(path, &parser.history())?;
        }
        Ok(())
    }
}

impl<S: HistoryStore> Drop for ReadingSession<S> {
    fn drop(&mut self) {
        self.close();
    }
}
