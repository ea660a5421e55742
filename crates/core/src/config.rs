//! Config file parsing for `~/.config/turnpage/config.toml`.
//!
//! Reading options (page size, search cap) and per-site base URLs. Missing or
//! malformed config falls back to defaults so the reader always starts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub sites: SitesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingConfig {
    /// Characters served per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Cap on distinct search hits before the scan stops with a sentinel entry.
    #[serde(default = "default_max_search_count")]
    pub max_search_count: usize,
}

fn default_page_size() -> usize {
    50
}
fn default_max_search_count() -> usize {
    30
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_search_count: default_max_search_count(),
        }
    }
}

/// Base URLs of the supported chapter sites. A persisted online book is routed
/// to the site whose base URL prefixes its chapter URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesConfig {
    #[serde(default = "default_biqu_url")]
    pub biqu_url: String,
    #[serde(default = "default_caimo_url")]
    pub caimo_url: String,
}

fn default_biqu_url() -> String {
    "https://www.biquge.com".to_string()
}
fn default_caimo_url() -> String {
    "https://www.caimoge.net".to_string()
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            biqu_url: default_biqu_url(),
            caimo_url: default_caimo_url(),
        }
    }
}

/// Load config from the default path (`~/.config/turnpage/config.toml`).
pub fn load_config() -> AppConfig {
    let config_path = match config_path() {
        Some(p) => p,
        None => return AppConfig::default(),
    };

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(_) => return AppConfig::default(),
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("Ignoring malformed config {}: {}", config_path.display(), err);
            AppConfig::default()
        }
    }
}

/// Return the default config file path (for init and show).
pub fn config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|mut p| {
        p.push("turnpage");
        p.push("config.toml");
        p
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert!(cfg.reading.page_size > 0);
        assert!(cfg.reading.max_search_count > 0);
        assert!(cfg.sites.biqu_url.starts_with("http"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str("[reading]\npage_size = 7\n").unwrap();
        assert_eq!(cfg.reading.page_size, 7);
        assert_eq!(cfg.reading.max_search_count, default_max_search_count());
        assert_eq!(cfg.sites.caimo_url, default_caimo_url());
    }
}
