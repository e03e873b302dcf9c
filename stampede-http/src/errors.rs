//! HTTP error types

use stampede_resilience::{Classification, RetryClassifier, Retryable};

/// Error type for HTTP operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    /// The request never produced a response (connect, reset, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response lacked a field the workflow needs
    #[error("Response missing {field} (HTTP {status})")]
    MissingField { status: u16, field: &'static str },

    /// A 2xx response body did not have the expected shape
    #[error("Invalid response body (HTTP {status}): {message}")]
    InvalidBody { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Client build error: {0}")]
    Client(String),
}

impl HttpError {
    /// Status code of the response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. }
            | HttpError::MissingField { status, .. }
            | HttpError::InvalidBody { status, .. } => Some(*status),
            HttpError::Transport(_) | HttpError::InvalidUrl(_) | HttpError::Client(_) => None,
        }
    }

    /// Response body of a non-2xx answer
    pub fn body(&self) -> Option<&str> {
        match self {
            HttpError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport(_))
    }

    /// True when a 2xx response failed shape validation
    pub fn is_response_shape(&self) -> bool {
        matches!(
            self,
            HttpError::MissingField { .. } | HttpError::InvalidBody { .. }
        )
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return HttpError::Client(describe(&err));
        }
        HttpError::Transport(describe(&err))
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::InvalidUrl(err.to_string())
    }
}

impl Retryable for HttpError {
    fn classify(&self, classifier: &RetryClassifier) -> Classification {
        match self {
            HttpError::Transport(_) => classifier.classify(None, None),
            HttpError::Status { status, body } => classifier.classify(Some(*status), Some(body)),
            _ => Classification::Fatal,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            HttpError::Transport(_) => "transport",
            HttpError::Status { .. } => "http_status",
            HttpError::MissingField { .. } | HttpError::InvalidBody { .. } => "response_shape",
            HttpError::InvalidUrl(_) => "invalid_url",
            HttpError::Client(_) => "client",
        }
    }
}

// reqwest hides the interesting part (refused, timed out) in the source chain
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
