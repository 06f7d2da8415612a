use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum SobsError {
    #[error("archive error: {0}")]
    Archive(String),

    #[error("malformed XML in {entry}: {message}")]
    Xml { entry: String, message: String },

    #[error("unexpected {record} shape for {accession}: {message}")]
    #[diagnostic(help("the archive contains data this loader does not understand"))]
    FieldShape {
        record: String,
        accession: String,
        message: String,
    },

    #[error("expected at most one {path} element, found {count}")]
    AmbiguousField { path: String, count: usize },

    #[error("<{element}> is missing attribute `{attribute}`")]
    MissingAttribute { element: String, attribute: String },

    #[error("bulk insert of {kind} records failed: {message}\nbatch: {batch}")]
    Insert {
        kind: String,
        message: String,
        batch: String,
    },

    #[error("store error: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("csv error: {0}")]
    Csv(String),
}

impl From<rusqlite::Error> for SobsError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(err.to_string())
    }
}
