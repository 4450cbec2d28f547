use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;

/// Convenient result alias for the shipspec library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The API answered a page request with a non-success HTTP status.
    #[error("page {page} unavailable: upstream answered with HTTP status {status}")]
    FetchFailed { page: u32, status: u16 },

    /// The request for a page failed before any HTTP status arrived
    /// (connection refused, reset, timeout).
    #[error("page {page} could not be fetched: {source}")]
    Transport {
        page: u32,
        #[source]
        source: Box<Error>,
    },

    /// A page body could not be decoded as a `{data, meta}` envelope.
    #[error("malformed response for page {page}: {message}")]
    MalformedResponse { page: u32, message: String },

    /// The API reported an application-level error inside a successful response.
    #[error("encyclopedia API rejected page {page}: {message} (code {code})")]
    Api {
        page: u32,
        code: u16,
        message: String,
    },

    /// Summed page counts did not reach the total announced by the first page.
    #[error("catalog incomplete: expected {expected} records, received {received}")]
    IncompleteCatalog { expected: u64, received: u64 },

    /// No application id was configured for the encyclopedia API.
    #[error("no API application id configured; set SHIPSPEC_API_KEY or pass --api-key")]
    MissingApiKey,

    /// Blob paths must be relative and stay inside the store root.
    #[error("invalid blob path {path}: must be relative without '..' components")]
    InvalidBlobPath { path: PathBuf },

    /// Requested blob does not exist in the store.
    #[error("blob not found at {path}")]
    BlobNotFound { path: PathBuf },

    /// No suitable cache directory could be resolved for storing catalog blobs.
    #[error("failed to resolve cache directories for catalog blobs")]
    CacheDirsUnavailable,

    /// A pipeline stage failed; later stages were not run.
    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for request URL construction errors.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Wrap this error as the failure of `stage`.
    pub fn in_stage(self, stage: Stage) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Stage that failed, when this error came out of a pipeline run.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
