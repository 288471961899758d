// API client module: a small blocking HTTP client that talks to the
// similarity-search service and fetches images by URL.
//
// The controller only sees the `SimilarityService` trait, so tests can
// swap the network out for an in-memory fake.

use crate::config::Config;
use crate::error::ClientError;
use crate::render::dataset_url;
use crate::selection::SelectedImage;
use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Multipart field the service reads the upload from.
pub const UPLOAD_FIELD: &str = "file";

/// One hit returned by the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub path: String,
    pub score: f64,
}

/// Body of `POST /compare-image/`. Every key may be missing; failures
/// come back as `{"error": "..."}`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct CompareResponse {
    #[serde(default)]
    pub uploaded_file: Option<String>,
    #[serde(default)]
    pub most_similar: Option<Vec<MatchResult>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CompareResponse {
    /// Matches in the order the service sent them; absent means none.
    pub fn matches(&self) -> &[MatchResult] {
        self.most_similar.as_deref().unwrap_or(&[])
    }
}

/// What the controller needs from the outside world.
pub trait SimilarityService {
    /// Base address used to build dataset URLs for matches.
    fn base_url(&self) -> &str;

    /// Download an image by URL.
    fn fetch_image(&self, url: &str) -> Result<SelectedImage, ClientError>;

    /// Submit an image and return the parsed comparison response.
    fn compare_image(&self, image: &SelectedImage) -> Result<CompareResponse, ClientError>;
}

/// Blocking client holding a reqwest client and the service base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from resolved configuration. A `None` timeout
    /// disables reqwest's default request timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Download a matched reference image into `dir`, keeping the folders
    /// of its dataset path so equal file names in different categories do
    /// not collide. Returns the written path.
    pub fn download_match(&self, path: &str, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(local_match_path(path)?);
        let url = dataset_url(&self.base_url, path);
        debug!(%url, "downloading match");
        let res = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to request {}", url))?;
        if !res.status().is_success() {
            anyhow::bail!("Download failed: {} - {}", res.status(), url);
        }
        let bytes = res.bytes().context("Failed to read image body")?;

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, &bytes)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(target)
    }
}

/// Relative location of a match below the download folder. Empty and `.`
/// segments are skipped; `..` is refused so a match can never land
/// outside the folder.
pub fn local_match_path(path: &str) -> Result<PathBuf> {
    let normalized = path.replace('\\', "/");
    let mut out = PathBuf::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => anyhow::bail!("Refusing match path that leaves the target folder: {}", path),
            s => out.push(s),
        }
    }
    if out.as_os_str().is_empty() {
        anyhow::bail!("Match path has no file name: {:?}", path);
    }
    Ok(out)
}

impl SimilarityService for ApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_image(&self, url: &str) -> Result<SelectedImage, ClientError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ClientError::EmptyUrl);
        }
        debug!(%url, "fetching image");
        let fetch_err = |reason: String| ClientError::Fetch {
            url: url.to_string(),
            reason,
        };

        let res = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;
        if !res.status().is_success() {
            return Err(fetch_err(res.status().to_string()));
        }
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().map_err(|e| fetch_err(e.to_string()))?;
        Ok(SelectedImage::from_download(
            url,
            bytes.to_vec(),
            content_type.as_deref(),
        ))
    }

    fn compare_image(&self, image: &SelectedImage) -> Result<CompareResponse, ClientError> {
        let url = format!("{}/compare-image/", &self.base_url);
        debug!(%url, name = image.name(), bytes = image.len(), "submitting image");

        let part = multipart::Part::bytes(image.bytes().to_vec())
            .file_name(image.name().to_string())
            .mime_str(image.mime())?;
        let form = multipart::Form::new().part(UPLOAD_FIELD, part);

        let res = self.client.post(&url).multipart(form).send()?;
        parse_compare_response(res)
    }
}

fn parse_compare_response(res: Response) -> Result<CompareResponse, ClientError> {
    let status = res.status();
    let body = res.text()?;

    if !status.is_success() {
        // the service's own message, else the status line (never a raw HTML page)
        let message = serde_json::from_str::<CompareResponse>(&body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| status.to_string());
        return Err(ClientError::Service {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: CompareResponse = serde_json::from_str(&body)?;
    if let Some(message) = parsed.error.clone() {
        return Err(ClientError::Service {
            status: status.as_u16(),
            message,
        });
    }
    Ok(parsed)
}
