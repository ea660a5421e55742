/// Top-level error type. All public API functions return this.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors constructing a parser for a document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Persisted book kind '{0}' is not supported")]
    UnsupportedKind(String),

    #[error("Book url matches no registered site: {0}")]
    UnsupportedDomain(String),

    #[error("No book is currently open")]
    NoBookOpen,
}

/// Errors retrieving or extracting a remote chapter.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request for {url} failed: {detail}")]
    Network { url: String, detail: String },

    #[error("Server returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("No chapter content found at {url} (selector '{selector}')")]
    MissingContent { url: String, selector: String },
}

/// Errors reading or writing the persisted history store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
