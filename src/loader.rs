//! Catalog acquisition: local JSON cache with download on miss.
//!
//! Endpoints, cache location and the HTTP identity all come from a
//! `LoaderConfig` value; nothing here reads globals.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::models::CatalogKind;
use crate::normalize::TextOptions;
use crate::progress::{create_spinner, finish};

/// Default PypyDance bundle endpoint.
pub const PYPY_URL: &str = "https://api.pypy.dance/bundle";

/// Default WannaDance song list endpoint.
pub const WD_URL: &str = "https://api.udon.dance/Api/Songs/list";

/// Both APIs reject requests without a browser-like User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where catalogs come from and where they are cached.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub cache_dir: PathBuf,
    pub pypy_url: String,
    pub wd_url: String,
    pub user_agent: String,
    /// Re-download even when a cache file exists.
    pub refresh: bool,
    /// Never touch the network; a missing cache file is an error.
    pub offline: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("."),
            pypy_url: PYPY_URL.to_string(),
            wd_url: WD_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            refresh: false,
            offline: false,
        }
    }
}

impl LoaderConfig {
    pub fn url(&self, kind: CatalogKind) -> &str {
        match kind {
            CatalogKind::PypyDance => &self.pypy_url,
            CatalogKind::WannaDance => &self.wd_url,
        }
    }

    pub fn cache_path(&self, kind: CatalogKind) -> PathBuf {
        self.cache_dir.join(kind.cache_file_name())
    }
}

/// Fetch `url` and store the body at `dest`. The body must parse as JSON
/// before anything is written. Returns the number of bytes stored.
pub fn download(url: &str, dest: &Path, user_agent: &str) -> Result<usize> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(user_agent)
        .timeout(HTTP_TIMEOUT)
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let body = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to download {}", url))?
        .bytes()
        .with_context(|| format!("Failed to read response body from {}", url))?;

    serde_json::from_slice::<serde_json::Value>(&body)
        .with_context(|| format!("Response from {} is not valid JSON", url))?;

    fs::write(dest, &body).with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(body.len())
}

/// Make sure the catalog's cache file exists, downloading it if needed.
pub fn ensure_cached(kind: CatalogKind, cfg: &LoaderConfig) -> Result<PathBuf> {
    let path = cfg.cache_path(kind);
    let present = path.is_file();

    if cfg.offline {
        if !present {
            bail!(
                "{} not found in {} and offline mode is set",
                kind.cache_file_name(),
                cfg.cache_dir.display()
            );
        }
        return Ok(path);
    }
    if present && !cfg.refresh {
        return Ok(path);
    }

    fs::create_dir_all(&cfg.cache_dir)
        .with_context(|| format!("Failed to create cache dir {}", cfg.cache_dir.display()))?;

    let url = cfg.url(kind);
    let spinner = create_spinner(&format!("Downloading {} from {}", kind.cache_file_name(), url));
    let bytes = download(url, &path, &cfg.user_agent)?;
    finish(
        &spinner,
        format!("Downloaded {} ({:.1} KB)", kind.cache_file_name(), bytes as f64 / 1024.0),
    );
    Ok(path)
}

/// Parse a cached catalog file.
pub fn read_catalog(kind: CatalogKind, path: &Path, opts: TextOptions) -> Result<Catalog> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Catalog::from_json_str(kind, &json, opts).with_context(|| format!("Failed to load {}", path.display()))
}

/// Cache-or-download, then parse.
pub fn load_catalog(kind: CatalogKind, cfg: &LoaderConfig, opts: TextOptions) -> Result<Catalog> {
    let path = ensure_cached(kind, cfg)?;
    let spinner = create_spinner(&format!("Loading {}", path.display()));
    let catalog = read_catalog(kind, &path, opts)?;
    finish(
        &spinner,
        format!(
            "Loaded {} songs from {} ({} duplicate IDs skipped)",
            catalog.len(),
            kind,
            catalog.duplicates()
        ),
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn offline_config(dir: &Path) -> LoaderConfig {
        LoaderConfig {
            cache_dir: dir.to_path_buf(),
            offline: true,
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn test_cache_paths_and_urls() {
        let cfg = LoaderConfig {
            cache_dir: PathBuf::from("/data/cache"),
            ..LoaderConfig::default()
        };
        assert_eq!(cfg.cache_path(CatalogKind::PypyDance), PathBuf::from("/data/cache/pypydance.json"));
        assert_eq!(cfg.cache_path(CatalogKind::WannaDance), PathBuf::from("/data/cache/wannadance.json"));
        assert_eq!(cfg.url(CatalogKind::PypyDance), PYPY_URL);
        assert_eq!(cfg.url(CatalogKind::WannaDance), WD_URL);
    }

    #[test]
    fn test_offline_missing_cache_errors() {
        let dir = tempdir().unwrap();
        let err = ensure_cached(CatalogKind::PypyDance, &offline_config(dir.path())).unwrap_err();
        assert!(err.to_string().contains("pypydance.json"));
    }

    #[test]
    fn test_existing_cache_is_used() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wannadance.json");
        fs::write(&path, "{}").unwrap();
        let cfg = LoaderConfig {
            cache_dir: dir.path().to_path_buf(),
            ..LoaderConfig::default()
        };
        assert_eq!(ensure_cached(CatalogKind::WannaDance, &cfg).unwrap(), path);
    }

    #[test]
    fn test_load_catalog_from_cache() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("pypydance.json"),
            r#"{"songs": [{"i": 1, "n": "Despacito (Remix)"}, {"i": 2, "n": "Gokuraku Jodo"}]}"#,
        )
        .unwrap();
        let catalog = load_catalog(CatalogKind::PypyDance, &offline_config(dir.path()), TextOptions::default()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().name_norm, "despacito");
    }

    #[test]
    fn test_malformed_cache_reports_file_and_record() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("pypydance.json"),
            r#"{"songs": [{"n": "Orphan"}]}"#,
        )
        .unwrap();
        let err = load_catalog(CatalogKind::PypyDance, &offline_config(dir.path()), TextOptions::default()).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("pypydance.json"), "{}", chain);
        assert!(chain.contains("Orphan"), "{}", chain);
    }

    #[test]
    fn test_invalid_json_cache_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("wannadance.json"), "not json").unwrap();
        assert!(load_catalog(CatalogKind::WannaDance, &offline_config(dir.path()), TextOptions::default()).is_err());
    }
}
