use reqwest::StatusCode;
use sqlx::Error as SqlxError;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("model {model_id} references unknown make {make_id}")]
    UnknownMake { model_id: i64, make_id: i64 },

    #[error("make list {} not found; run the fetch step first", .0.display())]
    MissingMakeList(PathBuf),

    #[error("failed to replace {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<figment::Error> for CatalogError {
    fn from(e: figment::Error) -> Self {
        CatalogError::Config(Box::new(e))
    }
}

/// Whether an error is worth retrying against the remote catalog.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CatalogError {
    fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Reqwest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            CatalogError::UpstreamStatus(code) => {
                code.is_server_error() || *code == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
