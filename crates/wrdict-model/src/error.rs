use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("checkpoint {path} holds {found} data, but {expected} was requested")]
    LanguageMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },

    #[error("invalid language code '{0}'")]
    InvalidLanguage(String),

    #[error("language pair needs two different languages, got '{0}' twice")]
    SameLanguage(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
