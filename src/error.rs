use thiserror::Error;

/// Why no timestamp could be taken from a filename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no valid date found in filename: {filename}")]
    NoPatternMatched { filename: String },

    #[error("invalid date in filename: {filename} (pattern {pattern})")]
    MalformedCapture {
        filename: String,
        pattern: &'static str,
    },

    #[error("implausible year {year} in filename: {filename} (pattern {pattern})")]
    ImplausibleValue {
        filename: String,
        pattern: &'static str,
        year: i32,
    },
}

impl ExtractError {
    pub fn filename(&self) -> &str {
        match self {
            ExtractError::NoPatternMatched { filename }
            | ExtractError::MalformedCapture { filename, .. }
            | ExtractError::ImplausibleValue { filename, .. } => filename,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unexpected status: {status} {status_text}, body: {body}")]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: &'static str },
}
