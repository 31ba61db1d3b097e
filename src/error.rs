use thiserror::Error;

/// Errors surfaced by the catalog, matcher, ranker, and extractor.
///
/// Scoring operations degrade to empty results for merely uninteresting
/// input (empty query, no interests, nothing matched); an error here always
/// means the request itself was malformed or a source could not be used.
#[derive(Debug, Error)]
pub enum IntelError {
    /// Structurally invalid argument, e.g. a non-positive result limit.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Category filter label outside the closed category set.
    #[error("unknown category: {0}")]
    InvalidCategory(String),
    /// No catalog item with this id.
    #[error("item not found: {0}")]
    NotFound(String),
    /// The image reference did not resolve to readable bytes.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// The referenced bytes are not a decodable raster image.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// The extraction was abandoned by its caller between stages.
    #[error("extraction cancelled")]
    Cancelled,
}
