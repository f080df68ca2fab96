use std::{
    io,
    path::{Path, PathBuf},
};

use log::debug;

use crate::config::CoordinatorConfig;

use super::{Fetch, FetchError, SourceUri};

/// Reads paths from the local file system and URLs over HTTP.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    base_dir: PathBuf,
    #[cfg(feature = "http")]
    client: Option<reqwest::Client>,
}

impl DefaultFetcher {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
            #[cfg(feature = "http")]
            client: Some(reqwest::Client::new()),
        }
    }

    pub fn from_config(config: &CoordinatorConfig) -> Self {
        let fetcher = Self::new(config.base_dir.clone());
        if config.http {
            fetcher
        } else {
            fetcher.without_http()
        }
    }

    /// Refuse `http://` and `https://` sources.
    pub fn without_http(self) -> Self {
        Self {
            base_dir: self.base_dir,
            #[cfg(feature = "http")]
            client: None,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    async fn fetch_file(&self, path: &Path) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(path);
        debug!("Reading {}", path.display());
        tokio::fs::read(&path).await.map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                FetchError::NotFound(path.display().to_string())
            } else {
                FetchError::Io(path, error)
            }
        })
    }

    #[cfg(feature = "http")]
    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let Some(client) = &self.client else {
            return Err(FetchError::Unsupported(url.to_string()));
        };
        debug!("Requesting {}", url);
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|error| FetchError::Network(url.to_string(), Box::new(error)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(url.to_string(), status.as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|error| FetchError::Network(url.to_string(), Box::new(error)))?;
        Ok(body.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Unsupported(url.to_string()))
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

impl Fetch for DefaultFetcher {
    async fn fetch(&self, uri: &SourceUri) -> Result<Vec<u8>, FetchError> {
        match uri {
            SourceUri::Data { data, .. } => Ok(data.clone()),
            SourceUri::Path(path) => self.fetch_file(path).await,
            SourceUri::Http(url) => self.fetch_http(url).await,
        }
    }
}
