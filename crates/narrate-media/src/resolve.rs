//! Asset resolution: inline payloads and remote URLs become local files.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use narrate_models::{AssetKind, MediaReference};

use crate::error::{MediaError, MediaResult};

/// Default maximum asset size (512 MiB).
pub const DEFAULT_MAX_ASSET_BYTES: u64 = 512 * 1024 * 1024;

/// A materialized asset. The file is deleted when this handle is dropped.
#[derive(Debug)]
pub struct ResolvedAsset {
    path: TempPath,
    mime_type: Option<String>,
    size: u64,
}

impl ResolvedAsset {
    /// Wrap an already written file.
    pub fn new(path: TempPath, mime_type: Option<String>, size: u64) -> Self {
        Self {
            path,
            mime_type,
            size,
        }
    }

    /// Local path of the fully written file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// MIME type declared inline or reported by the server.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the file now.
    pub fn release(self) -> MediaResult<()> {
        self.path.close()?;
        Ok(())
    }
}

/// Materializes [`MediaReference`]s as local files inside a directory.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    client: Client,
    fetch_timeout: Duration,
    max_bytes: u64,
}

impl AssetResolver {
    /// Create a resolver with its own HTTP client.
    pub fn new(fetch_timeout: Duration, max_bytes: u64) -> MediaResult<Self> {
        let client = Client::builder()
            .timeout(fetch_timeout)
            .connect_timeout(fetch_timeout.min(Duration::from_secs(10)))
            .user_agent(concat!("narrate-media/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MediaError::fetch_failed(format!("Failed to build HTTP client: {}", e), None))?;

        Ok(Self::with_client(client, fetch_timeout, max_bytes))
    }

    /// Create a resolver around an existing HTTP client.
    pub fn with_client(client: Client, fetch_timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client,
            fetch_timeout,
            max_bytes,
        }
    }

    /// Resolve a reference into a file in `dir` whose name starts with `stem`.
    ///
    /// The suffix is chosen from `kind` and the MIME type. The reference
    /// itself is never modified.
    pub async fn resolve(
        &self,
        reference: &MediaReference,
        kind: AssetKind,
        dir: &Path,
        stem: &str,
    ) -> MediaResult<ResolvedAsset> {
        match reference {
            MediaReference::Inline { mime_type, data } => {
                let bytes = self.decode_inline(data)?;
                let suffix = kind.suffix_for(Some(mime_type));
                let asset = write_asset(dir, stem, suffix, &bytes, Some(mime_type.clone())).await?;
                debug!(
                    path = %asset.path().display(),
                    bytes = asset.size,
                    "Wrote inline asset"
                );
                Ok(asset)
            }
            MediaReference::Remote { url } => self.fetch(url, kind, dir, stem).await,
        }
    }

    fn decode_inline(&self, data: &str) -> MediaResult<Vec<u8>> {
        let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();

        let estimated = (compact.len() as u64 / 4) * 3;
        if estimated > self.max_bytes {
            return Err(MediaError::AssetTooLarge {
                size: estimated,
                limit: self.max_bytes,
            });
        }

        let bytes = STANDARD
            .decode(&compact)
            .or_else(|_| STANDARD_NO_PAD.decode(&compact))
            .map_err(|e| MediaError::InvalidPayload(e.to_string()))?;

        if bytes.is_empty() {
            return Err(MediaError::InvalidPayload("payload decodes to zero bytes".to_string()));
        }
        Ok(bytes)
    }

    async fn fetch(&self, url: &Url, kind: AssetKind, dir: &Path, stem: &str) -> MediaResult<ResolvedAsset> {
        info!(url = %url, "Fetching remote asset");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::fetch_failed(
                format!("GET {} returned {}", url, status),
                Some(status.as_u16()),
            ));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(MediaError::AssetTooLarge {
                    size: length,
                    limit: self.max_bytes,
                });
            }
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let suffix = kind.suffix_for(mime_type.as_deref());

        let (file, path) = new_asset_file(dir, stem, suffix)?;
        let mut file = tokio::fs::File::from_std(file);
        let mut size: u64 = 0;

        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(url, e))? {
            size += chunk.len() as u64;
            if size > self.max_bytes {
                return Err(MediaError::AssetTooLarge {
                    size,
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        if size == 0 {
            return Err(MediaError::fetch_failed(format!("GET {} returned an empty body", url), None));
        }

        debug!(url = %url, path = %path.display(), bytes = size, "Fetched remote asset");

        Ok(ResolvedAsset {
            path,
            mime_type,
            size,
        })
    }

    fn transport_error(&self, url: &Url, error: reqwest::Error) -> MediaError {
        if error.is_timeout() {
            MediaError::Timeout(self.fetch_timeout)
        } else {
            MediaError::fetch_failed(format!("GET {} failed: {}", url, error), None)
        }
    }
}

fn new_asset_file(dir: &Path, stem: &str, suffix: &str) -> MediaResult<(std::fs::File, TempPath)> {
    let file = tempfile::Builder::new()
        .prefix(&format!("{}-", stem))
        .suffix(suffix)
        .tempfile_in(dir)?;
    Ok(file.into_parts())
}

async fn write_asset(
    dir: &Path,
    stem: &str,
    suffix: &str,
    bytes: &[u8],
    mime_type: Option<String>,
) -> MediaResult<ResolvedAsset> {
    let (file, path) = new_asset_file(dir, stem, suffix)?;
    let mut file = tokio::fs::File::from_std(file);
    file.write_all(bytes).await?;
    file.flush().await?;

    Ok(ResolvedAsset {
        path,
        mime_type,
        size: bytes.len() as u64,
    })
}
