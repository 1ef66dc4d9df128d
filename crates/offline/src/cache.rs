use std::collections::BTreeMap;

use crate::manifest::OfflineManifest;

/// Where a served resource came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ServeSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfflineError {
    InstallFailed { path: String, detail: String },
    Unavailable { path: String },
}

impl std::fmt::Display for OfflineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfflineError::InstallFailed { path, detail } => {
                write!(f, "precache install failed at {path}: {detail}")
            }
            OfflineError::Unavailable { path } => {
                write!(f, "resource unavailable offline: {path}")
            }
        }
    }
}

impl std::error::Error for OfflineError {}

/// The network side the cache falls back to. Kept as a trait so the cache is
/// testable without any transport.
pub trait ResourceFetcher {
    fn fetch(&mut self, path: &str) -> Result<Vec<u8>, String>;
}

/// Cache-first store for tour assets.
///
/// Stores are keyed by version tag, then by path, both in `BTreeMap`s for
/// stable traversal order. The lifecycle mirrors a service worker:
/// `install` pre-populates the allow-list, `serve` answers cache-first with
/// network fallback, `activate` purges stores left over from older versions.
#[derive(Debug, Default)]
pub struct OfflineCache {
    stores: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    refresh_queue: Vec<String>,
}

impl OfflineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate every allow-listed path into the manifest's store.
    ///
    /// Atomic: if any fetch fails the cache is left untouched and the error
    /// names the first failing path. Returns the number of cached resources.
    pub fn install(
        &mut self,
        manifest: &OfflineManifest,
        fetcher: &mut dyn ResourceFetcher,
    ) -> Result<usize, OfflineError> {
        let mut store: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for path in &manifest.precache {
            let bytes = fetcher
                .fetch(path)
                .map_err(|detail| OfflineError::InstallFailed {
                    path: path.clone(),
                    detail,
                })?;
            store.insert(path.clone(), bytes);
        }

        let count = store.len();
        self.stores.insert(manifest.version.clone(), store);
        Ok(count)
    }

    /// Serve one resource, cache-first.
    ///
    /// A hit returns the cached bytes and queues a background refresh
    /// attempt. A miss falls back to the fetcher and caches the response.
    /// If the network also fails, document requests fall back to the cached
    /// root; everything else is `Unavailable`.
    pub fn serve(
        &mut self,
        manifest: &OfflineManifest,
        path: &str,
        fetcher: &mut dyn ResourceFetcher,
    ) -> Result<(Vec<u8>, ServeSource), OfflineError> {
        let store = self.stores.entry(manifest.version.clone()).or_default();

        if let Some(bytes) = store.get(path) {
            let bytes = bytes.clone();
            self.refresh_queue.push(path.to_string());
            return Ok((bytes, ServeSource::Cache));
        }

        match fetcher.fetch(path) {
            Ok(bytes) => {
                store.insert(path.to_string(), bytes.clone());
                Ok((bytes, ServeSource::Network))
            }
            Err(_) => {
                if is_document(path) {
                    if let Some(root) = store.get("/") {
                        return Ok((root.clone(), ServeSource::Cache));
                    }
                }
                Err(OfflineError::Unavailable {
                    path: path.to_string(),
                })
            }
        }
    }

    /// Drain the paths whose cached copies should be refreshed in the
    /// background.
    pub fn take_refresh_queue(&mut self) -> Vec<String> {
        std::mem::take(&mut self.refresh_queue)
    }

    /// Best-effort refresh of one cached path. Failures leave the cached
    /// copy in place; returns whether the copy was updated.
    pub fn refresh(
        &mut self,
        manifest: &OfflineManifest,
        path: &str,
        fetcher: &mut dyn ResourceFetcher,
    ) -> bool {
        match fetcher.fetch(path) {
            Ok(bytes) => {
                self.stores
                    .entry(manifest.version.clone())
                    .or_default()
                    .insert(path.to_string(), bytes);
                true
            }
            Err(_) => false,
        }
    }

    /// Purge every store whose version tag differs from the manifest's.
    /// Returns the purged tags in order.
    pub fn activate(&mut self, manifest: &OfflineManifest) -> Vec<String> {
        let stale: Vec<String> = self
            .stores
            .keys()
            .filter(|v| *v != &manifest.version)
            .cloned()
            .collect();
        for version in &stale {
            self.stores.remove(version);
        }
        stale
    }

    pub fn cached(&self, version: &str, path: &str) -> Option<&[u8]> {
        self.stores
            .get(version)
            .and_then(|s| s.get(path))
            .map(|b| b.as_slice())
    }

    pub fn store_versions(&self) -> Vec<&str> {
        self.stores.keys().map(|s| s.as_str()).collect()
    }
}

// The service-worker original keys this off `request.destination`; outside a
// browser the path shape is all there is.
fn is_document(path: &str) -> bool {
    path == "/" || path.ends_with('/') || path.ends_with(".html")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::{OfflineCache, OfflineError, ResourceFetcher, ServeSource};
    use crate::manifest::OfflineManifest;

    /// Fetcher double backed by a response table, with a call log.
    struct FakeFetcher {
        responses: BTreeMap<String, Vec<u8>>,
        calls: Vec<String>,
    }

    impl FakeFetcher {
        fn new(responses: &[(&str, &[u8])]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(p, b)| (p.to_string(), b.to_vec()))
                    .collect(),
                calls: Vec::new(),
            }
        }

        fn offline() -> Self {
            Self::new(&[])
        }
    }

    impl ResourceFetcher for FakeFetcher {
        fn fetch(&mut self, path: &str) -> Result<Vec<u8>, String> {
            self.calls.push(path.to_string());
            self.responses
                .get(path)
                .cloned()
                .ok_or_else(|| "connection refused".to_string())
        }
    }

    fn manifest() -> OfflineManifest {
        OfflineManifest::new(
            "tour-v1",
            vec![
                "/".to_string(),
                "/tour.json".to_string(),
                "/panoramas/1.jpg".to_string(),
            ],
        )
    }

    fn online_fetcher() -> FakeFetcher {
        FakeFetcher::new(&[
            ("/", b"<html>"),
            ("/tour.json", b"{}"),
            ("/panoramas/1.jpg", b"jpeg-1"),
            ("/panoramas/2.jpg", b"jpeg-2"),
        ])
    }

    #[test]
    fn install_populates_the_allow_list() {
        let mut cache = OfflineCache::new();
        let count = cache
            .install(&manifest(), &mut online_fetcher())
            .expect("install");
        assert_eq!(count, 3);
        assert_eq!(cache.cached("tour-v1", "/tour.json"), Some(b"{}".as_slice()));
    }

    #[test]
    fn install_is_atomic_on_fetch_failure() {
        let mut cache = OfflineCache::new();
        let mut fetcher = FakeFetcher::new(&[("/", b"<html>"), ("/tour.json", b"{}")]);

        let err = cache.install(&manifest(), &mut fetcher).unwrap_err();
        assert_eq!(
            err,
            OfflineError::InstallFailed {
                path: "/panoramas/1.jpg".to_string(),
                detail: "connection refused".to_string(),
            }
        );
        assert!(cache.store_versions().is_empty());
    }

    #[test]
    fn serve_prefers_cache_and_queues_a_refresh() {
        let mut cache = OfflineCache::new();
        cache
            .install(&manifest(), &mut online_fetcher())
            .expect("install");

        let mut fetcher = FakeFetcher::offline();
        let (bytes, source) = cache
            .serve(&manifest(), "/panoramas/1.jpg", &mut fetcher)
            .expect("serve");
        assert_eq!(bytes, b"jpeg-1");
        assert_eq!(source, ServeSource::Cache);
        // Cache hits never touch the network inline.
        assert!(fetcher.calls.is_empty());
        assert_eq!(
            cache.take_refresh_queue(),
            vec!["/panoramas/1.jpg".to_string()]
        );
        assert!(cache.take_refresh_queue().is_empty());
    }

    #[test]
    fn serve_falls_back_to_network_and_caches_the_response() {
        let mut cache = OfflineCache::new();
        let mut fetcher = online_fetcher();

        let (bytes, source) = cache
            .serve(&manifest(), "/panoramas/2.jpg", &mut fetcher)
            .expect("serve");
        assert_eq!(bytes, b"jpeg-2");
        assert_eq!(source, ServeSource::Network);
        assert_eq!(
            cache.cached("tour-v1", "/panoramas/2.jpg"),
            Some(b"jpeg-2".as_slice())
        );

        // Second request is now a hit.
        let mut offline = FakeFetcher::offline();
        let (_, source) = cache
            .serve(&manifest(), "/panoramas/2.jpg", &mut offline)
            .expect("serve");
        assert_eq!(source, ServeSource::Cache);
    }

    #[test]
    fn offline_document_falls_back_to_cached_root() {
        let mut cache = OfflineCache::new();
        cache
            .install(&manifest(), &mut online_fetcher())
            .expect("install");

        let mut fetcher = FakeFetcher::offline();
        let (bytes, source) = cache
            .serve(&manifest(), "/gallery.html", &mut fetcher)
            .expect("document fallback");
        assert_eq!(bytes, b"<html>");
        assert_eq!(source, ServeSource::Cache);
    }

    #[test]
    fn offline_asset_miss_is_unavailable() {
        let mut cache = OfflineCache::new();
        cache
            .install(&manifest(), &mut online_fetcher())
            .expect("install");

        let mut fetcher = FakeFetcher::offline();
        let err = cache
            .serve(&manifest(), "/panoramas/9.jpg", &mut fetcher)
            .unwrap_err();
        assert_eq!(
            err,
            OfflineError::Unavailable {
                path: "/panoramas/9.jpg".to_string()
            }
        );
    }

    #[test]
    fn activate_purges_stale_versions() {
        let mut cache = OfflineCache::new();
        let old = OfflineManifest::new("tour-v1", vec!["/".to_string()]);
        let new = OfflineManifest::new("tour-v2", vec!["/".to_string()]);
        cache.install(&old, &mut online_fetcher()).expect("install");
        cache.install(&new, &mut online_fetcher()).expect("install");

        let purged = cache.activate(&new);
        assert_eq!(purged, vec!["tour-v1".to_string()]);
        assert_eq!(cache.store_versions(), vec!["tour-v2"]);
        assert!(cache.cached("tour-v1", "/").is_none());
    }

    #[test]
    fn refresh_updates_the_cached_copy_best_effort() {
        let mut cache = OfflineCache::new();
        cache
            .install(&manifest(), &mut online_fetcher())
            .expect("install");

        let mut updated = FakeFetcher::new(&[("/tour.json", b"{\"v\":2}")]);
        assert!(cache.refresh(&manifest(), "/tour.json", &mut updated));
        assert_eq!(
            cache.cached("tour-v1", "/tour.json"),
            Some(b"{\"v\":2}".as_slice())
        );

        // A failed refresh leaves the cached copy alone.
        let mut offline = FakeFetcher::offline();
        assert!(!cache.refresh(&manifest(), "/tour.json", &mut offline));
        assert_eq!(
            cache.cached("tour-v1", "/tour.json"),
            Some(b"{\"v\":2}".as_slice())
        );
    }
}
