use crate::DocumentId;
use thiserror::Error;

/// Errors raised by index and query operations.
///
/// None of them poison the index: a failing call leaves the index exactly as
/// it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("invalid document id {0}")]
    InvalidDocumentId(DocumentId),

    #[error("word {0:?} is invalid")]
    InvalidWord(String),

    #[error("query word {0:?} is invalid")]
    InvalidQueryWord(String),

    #[error("stop word {0:?} is invalid")]
    InvalidStopWord(String),

    #[error("document {0} not found")]
    DocumentNotFound(DocumentId),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad document id, malformed query token, invalid word or stop word.
    InvalidArgument,
    /// Lookup of a document that is not indexed.
    OutOfRange,
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::DocumentNotFound(_) => ErrorKind::OutOfRange,
            SearchError::InvalidDocumentId(_)
            | SearchError::InvalidWord(_)
            | SearchError::InvalidQueryWord(_)
            | SearchError::InvalidStopWord(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }
}
