use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::foundation::error::{ForgeError, ForgeResult};

/// Source of raw asset bytes (logos, portraits).
pub trait AssetFetcher {
    /// Return the bytes behind `location`, a URL or a filesystem path.
    fn fetch(&self, location: &str) -> ForgeResult<Vec<u8>>;
}

fn is_http(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Routes `http(s)://` locations to a blocking HTTP client and everything else to the filesystem.
pub struct DefaultFetcher {
    timeout: Duration,
    #[cfg(feature = "http")]
    client: reqwest::blocking::Client,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration) -> ForgeResult<Self> {
        #[cfg(feature = "http")]
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cardforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForgeError::asset_fetch(format!("build http client: {e}")))?;
        Ok(Self {
            timeout,
            #[cfg(feature = "http")]
            client,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(feature = "http")]
    fn fetch_http(&self, url: &str) -> ForgeResult<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ForgeError::asset_fetch(format!("GET {url}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ForgeError::asset_fetch(format!("GET {url}: HTTP {status}")));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| ForgeError::asset_fetch(format!("read body of {url}: {e}")))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    fn fetch_http(&self, url: &str) -> ForgeResult<Vec<u8>> {
        Err(ForgeError::asset_fetch(format!(
            "cannot fetch {url}: built without the `http` feature"
        )))
    }
}

impl AssetFetcher for DefaultFetcher {
    #[tracing::instrument(skip(self))]
    fn fetch(&self, location: &str) -> ForgeResult<Vec<u8>> {
        if is_http(location) {
            return self.fetch_http(location);
        }
        let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
        std::fs::read(path)
            .map_err(|e| ForgeError::asset_fetch(format!("read {}: {e}", path.display())))
    }
}

/// Fixed set of in-memory assets keyed by location. Unknown locations fail.
#[derive(Clone, Debug, Default)]
pub struct MemoryFetcher {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(location, bytes);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(location.into(), bytes);
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch(&self, location: &str) -> ForgeResult<Vec<u8>> {
        self.assets
            .get(location)
            .cloned()
            .ok_or_else(|| ForgeError::asset_fetch(format!("no asset at {location}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_paths_are_read() {
        let dir = std::env::temp_dir().join(format!("cardforge-fetch-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("logo.bin");
        std::fs::write(&file, b"abc").unwrap();

        let f = DefaultFetcher::new(Duration::from_secs(1)).unwrap();
        let loc = file.to_string_lossy().into_owned();
        assert_eq!(f.fetch(&loc).unwrap(), b"abc");
        assert_eq!(f.fetch(&format!("file://{loc}")).unwrap(), b"abc");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_asset_fetch_error() {
        let f = DefaultFetcher::new(Duration::from_secs(1)).unwrap();
        let err = f.fetch("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, ForgeError::AssetFetch(_)));
    }

    #[test]
    fn memory_fetcher_serves_known_locations_only() {
        let f = MemoryFetcher::new().with("mem://logo", vec![1, 2, 3]);
        assert_eq!(f.fetch("mem://logo").unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            f.fetch("mem://other"),
            Err(ForgeError::AssetFetch(_))
        ));
    }
}
