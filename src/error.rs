// Error taxonomy for the client. Every failure is handled at the
// controller boundary and turned into a `Notice` for the user; nothing
// here is fatal to the session.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while acquiring an image or talking to the
/// similarity-search service.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("no image selected")]
    NoImageSelected,
    #[error("image URL is empty")]
    EmptyUrl,
    #[error("failed to fetch image from {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to read image file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("request to similarity service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not parse similarity service response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("similarity service error ({status}): {message}")]
    Service { status: u16, message: String },
}

impl ClientError {
    /// Whether the error belongs to the acquisition step (URL or file).
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            ClientError::EmptyUrl | ClientError::Fetch { .. } | ClientError::Read { .. }
        )
    }

    /// Map the error to the message shown to the user.
    pub fn notice(&self) -> Notice {
        match self {
            ClientError::NoImageSelected => Notice::NoImageSelected,
            ClientError::EmptyUrl => Notice::AcquisitionFailed("no URL given".into()),
            ClientError::Fetch { url, reason } => {
                Notice::AcquisitionFailed(format!("{} ({})", url, reason))
            }
            ClientError::Read { path, source } => {
                Notice::AcquisitionFailed(format!("{} ({})", path.display(), source))
            }
            ClientError::Transport(_) | ClientError::Parse(_) => Notice::BackendUnreachable(None),
            ClientError::Service { message, .. } => {
                Notice::BackendUnreachable(Some(message.clone()))
            }
        }
    }
}

/// User-facing notice. Shared by acquisition and submission failures so
/// both paths surface something to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NoImageSelected,
    AcquisitionFailed(String),
    BackendUnreachable(Option<String>),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoImageSelected => write!(f, "Please upload an image first!"),
            Notice::AcquisitionFailed(what) => write!(f, "Could not load image: {}", what),
            Notice::BackendUnreachable(None) => write!(f, "Error connecting to backend."),
            Notice::BackendUnreachable(Some(msg)) => {
                write!(f, "Error connecting to backend. Server said: {}", msg)
            }
        }
    }
}
