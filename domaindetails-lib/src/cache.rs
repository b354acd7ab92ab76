//! On-disk cache of the IANA RDAP bootstrap registry.
//!
//! The raw bootstrap document is stored next to a small metadata sidecar
//! recording when it was fetched, its source version and how many TLDs it
//! lists. Every lookup reads through [`BootstrapCache::load_registry`], which
//! refreshes the snapshot once it is older than the TTL and serves a stale
//! snapshot when the refresh fails.

use crate::error::DomainDetailsError;
use crate::protocols::registry::BootstrapRegistry;
use crate::types::LookupConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Cached bootstrap snapshot filename
pub const BOOTSTRAP_FILE: &str = "rdap-bootstrap.json";

/// Cache metadata filename
pub const META_FILE: &str = "cache-meta.json";

/// Bootstrap cache TTL: 24 hours
pub const BOOTSTRAP_TTL_HOURS: i64 = 24;

/// Metadata written alongside every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub last_updated: DateTime<Utc>,
    pub version: String,
    pub tld_count: usize,
}

/// Read-only report of the cache state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    pub path: PathBuf,
    pub last_updated: DateTime<Utc>,
    pub version: String,
    pub tld_count: usize,
    pub age: chrono::Duration,
    pub is_valid: bool,
}

/// Local bootstrap cache rooted at a directory.
#[derive(Clone)]
pub struct BootstrapCache {
    /// Directory holding the snapshot and metadata
    cache_dir: PathBuf,
    /// Where refreshes fetch the bootstrap document from
    bootstrap_url: String,
    /// Maximum snapshot age served without a refresh
    ttl: chrono::Duration,
    /// HTTP client for bootstrap fetches
    http_client: reqwest::Client,
    /// Timeout for bootstrap fetches
    timeout: Duration,
}

impl BootstrapCache {
    /// Create a cache from the shared lookup configuration.
    pub fn with_config(config: &LookupConfig) -> Result<Self, DomainDetailsError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.bootstrap_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                DomainDetailsError::fetch(
                    config.bootstrap_url.as_str(),
                    format!("Failed to create bootstrap HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            cache_dir: config.cache_dir.clone(),
            bootstrap_url: config.bootstrap_url.clone(),
            ttl: chrono::Duration::hours(BOOTSTRAP_TTL_HOURS),
            http_client,
            timeout: config.bootstrap_timeout,
        })
    }

    /// Override the TTL.
    pub fn with_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Directory holding the cache files.
    pub fn path(&self) -> &Path {
        &self.cache_dir
    }

    fn bootstrap_path(&self) -> PathBuf {
        self.cache_dir.join(BOOTSTRAP_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.cache_dir.join(META_FILE)
    }

    /// Look up the RDAP base URL for `tld`.
    ///
    /// # Errors
    ///
    /// Returns `DomainDetailsError::NotFound` if no entry lists the TLD, or
    /// the refresh error when no usable snapshot could be obtained.
    pub async fn resolve_server(&self, tld: &str) -> Result<String, DomainDetailsError> {
        let registry = self.load_registry().await?;

        registry
            .find_server(tld)
            .map(str::to_string)
            .ok_or_else(|| {
                DomainDetailsError::not_found(
                    tld.to_lowercase(),
                    "No RDAP server found for TLD in bootstrap registry",
                )
            })
    }

    /// Return the registry, refreshing it when stale or missing.
    ///
    /// Lookup flow:
    /// 1. Fresh metadata and a decodable snapshot: serve it
    /// 2. Otherwise refresh and serve the new snapshot
    /// 3. Refresh failed: serve whatever snapshot is on disk, if it decodes
    pub async fn load_registry(&self) -> Result<BootstrapRegistry, DomainDetailsError> {
        match self.read_metadata().await {
            Ok(meta) if is_fresh(meta.last_updated, Utc::now(), self.ttl) => {
                match self.read_registry().await {
                    Ok(registry) => return Ok(registry),
                    Err(e) => debug!("Cached bootstrap unreadable, refreshing: {}", e),
                }
            }
            Ok(meta) => debug!("Bootstrap cache expired (updated {})", meta.last_updated),
            Err(e) => debug!("No usable cache metadata: {}", e),
        }

        match self.fetch_and_persist().await {
            Ok((_, registry)) => Ok(registry),
            Err(refresh_err) => match self.read_registry().await {
                Ok(stale) => {
                    warn!(
                        "Bootstrap refresh failed ({}), using stale cached copy",
                        refresh_err
                    );
                    Ok(stale)
                }
                Err(_) => Err(refresh_err),
            },
        }
    }

    /// Fetch the bootstrap document and replace the snapshot.
    ///
    /// # Errors
    ///
    /// - `Fetch`/`Timeout` if the document cannot be retrieved
    /// - `Parse` if the body is not a bootstrap document (cache untouched)
    /// - `CacheIo` if the files cannot be written
    pub async fn refresh(&self) -> Result<CacheMetadata, DomainDetailsError> {
        self.fetch_and_persist().await.map(|(meta, _)| meta)
    }

    async fn fetch_and_persist(
        &self,
    ) -> Result<(CacheMetadata, BootstrapRegistry), DomainDetailsError> {
        debug!("Fetching bootstrap registry from {}", self.bootstrap_url);

        let response = self
            .http_client
            .get(&self.bootstrap_url)
            .send()
            .await
            .map_err(|e| DomainDetailsError::from_request(e, &self.bootstrap_url, self.timeout))?;

        if !response.status().is_success() {
            return Err(DomainDetailsError::fetch(
                self.bootstrap_url.as_str(),
                format!("Bootstrap registry returned HTTP {}", response.status()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DomainDetailsError::from_request(e, &self.bootstrap_url, self.timeout))?;

        // Validate before touching the disk
        let registry = BootstrapRegistry::from_slice(&body)?;

        let meta = CacheMetadata {
            last_updated: Utc::now(),
            version: registry.version.clone(),
            tld_count: registry.tld_count(),
        };

        self.persist(&body, &meta).await?;
        debug!(
            "Bootstrap cache updated: {} TLDs, version {}",
            meta.tld_count, meta.version
        );

        Ok((meta, registry))
    }

    /// Write the snapshot, then the metadata.
    async fn persist(&self, body: &[u8], meta: &CacheMetadata) -> Result<(), DomainDetailsError> {
        tokio::fs::create_dir_all(&self.cache_dir).await.map_err(|e| {
            DomainDetailsError::cache_io(
                self.cache_dir.to_string_lossy(),
                format!("Failed to create cache directory: {}", e),
            )
        })?;

        let meta_json = serde_json::to_vec_pretty(meta)?;

        write_replacing(&self.bootstrap_path(), body).await?;
        write_replacing(&self.meta_path(), &meta_json).await?;
        Ok(())
    }

    /// Report the cache state as of now.
    pub async fn inspect(&self) -> Result<CacheInfo, DomainDetailsError> {
        self.inspect_at(Utc::now()).await
    }

    /// Report the cache state as of `now`.
    ///
    /// # Errors
    ///
    /// Returns `DomainDetailsError::NotFound` if there is no readable metadata.
    pub async fn inspect_at(&self, now: DateTime<Utc>) -> Result<CacheInfo, DomainDetailsError> {
        let meta = self.read_metadata().await.map_err(|e| {
            DomainDetailsError::not_found(
                self.cache_dir.to_string_lossy(),
                format!("Cache not found or invalid: {}", e),
            )
        })?;

        Ok(CacheInfo {
            path: self.cache_dir.clone(),
            last_updated: meta.last_updated,
            version: meta.version,
            tld_count: meta.tld_count,
            age: now - meta.last_updated,
            is_valid: is_fresh(meta.last_updated, now, self.ttl),
        })
    }

    /// Remove the snapshot and metadata. Missing files are not an error.
    pub async fn clear(&self) {
        for path in [self.bootstrap_path(), self.meta_path()] {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }

    async fn read_metadata(&self) -> Result<CacheMetadata, DomainDetailsError> {
        let path = self.meta_path();
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| DomainDetailsError::cache_io(path.to_string_lossy(), e.to_string()))?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn read_registry(&self) -> Result<BootstrapRegistry, DomainDetailsError> {
        let path = self.bootstrap_path();
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| DomainDetailsError::cache_io(path.to_string_lossy(), e.to_string()))?;
        BootstrapRegistry::from_slice(&data)
    }
}

/// Whether a snapshot updated at `last_updated` is still within `ttl` at `now`.
pub fn is_fresh(last_updated: DateTime<Utc>, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
    now - last_updated < ttl
}

/// Write `data` to a sibling temp file, then rename it over `path`.
async fn write_replacing(path: &Path, data: &[u8]) -> Result<(), DomainDetailsError> {
    let tmp = path.with_extension("json.tmp");

    tokio::fs::write(&tmp, data).await.map_err(|e| {
        DomainDetailsError::cache_io(tmp.to_string_lossy(), format!("Failed to write: {}", e))
    })?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        DomainDetailsError::cache_io(path.to_string_lossy(), format!("Failed to replace: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DOC: &str = r#"{
        "description": "test",
        "publication": "2024-05-01T00:00:00Z",
        "services": [[["com", "net"], ["https://rdap.example/"]], [["org"], ["https://org.example/"]]],
        "version": "1.0"
    }"#;

    fn cache_in(dir: &TempDir) -> BootstrapCache {
        // Port 9 (discard) on loopback: any refresh attempt fails fast
        let config = LookupConfig::default()
            .with_cache_dir(dir.path())
            .with_bootstrap_url("http://127.0.0.1:9/dns.json")
            .with_bootstrap_timeout(Duration::from_secs(2));
        BootstrapCache::with_config(&config).unwrap()
    }

    fn write_snapshot(dir: &TempDir, last_updated: DateTime<Utc>) {
        fs::write(dir.path().join(BOOTSTRAP_FILE), DOC).unwrap();
        let meta = CacheMetadata {
            last_updated,
            version: "1.0".to_string(),
            tld_count: 3,
        };
        fs::write(
            dir.path().join(META_FILE),
            serde_json::to_vec_pretty(&meta).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_is_fresh_boundary() {
        let ttl = chrono::Duration::hours(BOOTSTRAP_TTL_HOURS);
        let t = Utc::now();

        assert!(!is_fresh(t, t + ttl, ttl));
        assert!(is_fresh(t, t + ttl - chrono::Duration::nanoseconds(1), ttl));
        assert!(is_fresh(t, t, ttl));
    }

    #[tokio::test]
    async fn test_inspect_reports_validity_at_boundary() {
        let dir = TempDir::new().unwrap();
        let updated = Utc::now() - chrono::Duration::hours(1);
        write_snapshot(&dir, updated);
        let cache = cache_in(&dir);
        let ttl = chrono::Duration::hours(BOOTSTRAP_TTL_HOURS);

        let at_ttl = cache.inspect_at(updated + ttl).await.unwrap();
        assert_eq!(at_ttl.age, ttl);
        assert!(!at_ttl.is_valid);

        let just_before = cache
            .inspect_at(updated + ttl - chrono::Duration::nanoseconds(1))
            .await
            .unwrap();
        assert!(just_before.is_valid);
        assert_eq!(just_before.tld_count, 3);
        assert_eq!(just_before.version, "1.0");
        assert_eq!(just_before.path, dir.path());
    }

    #[tokio::test]
    async fn test_inspect_without_metadata_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        assert!(matches!(
            cache.inspect().await,
            Err(DomainDetailsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_snapshot(&dir, Utc::now());
        let cache = cache_in(&dir);

        cache.clear().await;
        assert!(!dir.path().join(BOOTSTRAP_FILE).exists());
        assert!(!dir.path().join(META_FILE).exists());

        // Second clear on an empty directory must not panic or fail
        cache.clear().await;
        assert!(cache.inspect().await.is_err());
    }

    #[test]
    fn test_metadata_json_shape() {
        let meta = CacheMetadata {
            last_updated: "2024-05-01T12:00:00Z".parse().unwrap(),
            version: "1.0".to_string(),
            tld_count: 1191,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["lastUpdated"], "2024-05-01T12:00:00Z");
        assert_eq!(value["tldCount"], 1191);
        assert_eq!(value["version"], "1.0");
    }

    #[tokio::test]
    async fn test_fresh_snapshot_served_without_network() {
        let dir = TempDir::new().unwrap();
        write_snapshot(&dir, Utc::now());
        let cache = cache_in(&dir);

        let server = cache.resolve_server("NET").await.unwrap();
        assert_eq!(server, "https://rdap.example/");
    }

    #[tokio::test]
    async fn test_stale_snapshot_served_when_refresh_fails() {
        let dir = TempDir::new().unwrap();
        write_snapshot(&dir, Utc::now() - chrono::Duration::days(30));
        let cache = cache_in(&dir);

        let server = cache.resolve_server("org").await.unwrap();
        assert_eq!(server, "https://org.example/");
    }

    #[tokio::test]
    async fn test_unknown_tld_is_not_found() {
        let dir = TempDir::new().unwrap();
        write_snapshot(&dir, Utc::now());
        let cache = cache_in(&dir);

        assert!(matches!(
            cache.resolve_server("zz").await,
            Err(DomainDetailsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_no_snapshot_and_failed_refresh_is_fatal() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);

        let err = cache.resolve_server("com").await.unwrap_err();
        assert!(err.is_fetch_failure(), "unexpected error: {}", err);
    }
}
