use crate::model::ErrorInfo;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Operator error: {0}")]
    Operator(ErrorInfo),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { url: url::Url, status: u16 },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Malformed query string payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
