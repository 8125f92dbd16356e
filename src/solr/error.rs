use thiserror::Error;

/// Errors raised by the Solr client
#[derive(Debug, Error)]
pub enum SolrError {
    #[error("Error: Solr is not running ({0})")]
    NotRunning(String),

    #[error("HTTP {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("invalid JSON in Solr response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid Solr URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("\"{0}\" is not a Solr collection or core")]
    UnknownName(String),

    #[error("Error: cannot post data \"{data}\" to field \"{field}\" type \"{field_type}\"")]
    FieldType {
        data: String,
        field: String,
        field_type: String,
    },

    #[error("Solr rejected the update: {0}")]
    Rejected(String),

    #[error("Error: cannot delete \"_default_\" config")]
    DefaultConfig,

    #[error("field definition is missing a name")]
    MissingFieldName,

    #[error("unexpected Solr response: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for SolrError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() {
            SolrError::NotRunning(error.to_string())
        } else if let Some(status) = error.status() {
            SolrError::Status {
                status,
                url: error
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
            }
        } else {
            SolrError::Transport(error)
        }
    }
}

impl SolrError {
    /// True for a non-2xx answer from a running server
    pub fn is_status(&self) -> bool {
        matches!(self, SolrError::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, SolrError>;
