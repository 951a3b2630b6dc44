use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PagerError {
    #[error("Unexpected offset \"{0}\"")]
    InvalidOffset(String),

    #[error("page sequence is empty")]
    EmptySequence,

    /// Entry at `position` does not come strictly after the one before it,
    /// or its secondary page is not above its primary page.
    #[error("page entry {position} is out of order")]
    UnorderedPages { position: usize },
}

pub type Result<T> = std::result::Result<T, PagerError>;
