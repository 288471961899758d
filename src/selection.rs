// The image the user intends to submit, and the helpers that build one
// from a local file or a downloaded body.

use crate::error::ClientError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Cursor;
use std::path::Path;

pub const FALLBACK_MIME: &str = "application/octet-stream";
/// Name used for URL acquisitions whose path has no usable last segment.
pub const FALLBACK_URL_NAME: &str = "uploaded.jpg";

/// Raw bytes plus the metadata sent along with them. Replaced as a whole
/// on every acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    bytes: Vec<u8>,
    name: String,
    mime: String,
}

impl SelectedImage {
    pub fn new(bytes: Vec<u8>, name: impl Into<String>, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        Self {
            bytes,
            name: name.into(),
            mime: if mime.trim().is_empty() {
                FALLBACK_MIME.to_string()
            } else {
                mime
            },
        }
    }

    /// Read a local file. The MIME type is guessed from the extension;
    /// nothing checks that the content is actually an image.
    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        let bytes = std::fs::read(path).map_err(|source| ClientError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(FALLBACK_URL_NAME)
            .to_string();
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(FALLBACK_MIME);
        Ok(Self::new(bytes, name, mime))
    }

    /// Build a selection from a downloaded body and its reported content
    /// type (which may be missing).
    pub fn from_download(url: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        // drop parameters such as `; charset=...`
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or(FALLBACK_MIME);
        Self::new(bytes, name_from_url(url), mime)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Displayable form of the selection: `data:<mime>;base64,<payload>`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Pixel dimensions read from the image header, or `None` when the
    /// bytes are not a format we can probe.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }

    /// One-line description used by the terminal preview.
    pub fn describe(&self) -> String {
        let dims = match self.dimensions() {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "unknown size".to_string(),
        };
        format!("{} [{}, {}, {} bytes]", self.name, self.mime, dims, self.len())
    }
}

/// Last non-empty path segment of `url`, ignoring query and fragment.
pub fn name_from_url(url: &str) -> String {
    let without_tail = url.split(['?', '#']).next().unwrap_or("");
    let after_scheme = match without_tail.find("://") {
        Some(i) => &without_tail[i + 3..],
        None => without_tail,
    };
    // the first segment is the host, never a file name
    after_scheme
        .split('/')
        .skip(1)
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_URL_NAME.to_string())
}
