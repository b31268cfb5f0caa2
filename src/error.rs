use thiserror::Error;

/// Why a single message did not end up as a sheet row.
///
/// Every variant is terminal for the event being handled and nothing more.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("no JSON data found in message")]
    NoPayload,

    #[error("JSON format error ({category} at line {line}, column {column}): {message}")]
    Parse {
        category: &'static str,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("sheet backend error: {0:#}")]
    Backend(#[source] anyhow::Error),
}

impl ArchiveError {
    pub fn from_json(err: &serde_json::Error) -> Self {
        let category = match err.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        ArchiveError::Parse {
            category,
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
