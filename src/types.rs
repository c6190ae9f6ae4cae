//! Shared types used across all engine stages.
//!
//! Every stage after the loader speaks in terms of [`DocumentId`] and
//! [`ImageReference`], so they live here rather than in any single module.

use std::fmt;
use std::str::FromStr;

/// Numeric identifier of a content document, taken from its filename stem.
///
/// `content/42.md` → `DocumentId(42)`. The identifier doubles as the sort and
/// grouping key and as the link target of every image the document contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a filename stem is not a plain non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("document identifier must be a non-negative integer, got {0:?}")]
pub struct InvalidDocumentId(pub String);

impl FromStr for DocumentId {
    type Err = InvalidDocumentId;

    /// Only ASCII digits are accepted: `"+7"`, `" 7"` and `"7a"` are all rejected,
    /// even where `u64::from_str` would be lenient.
    fn from_str(stem: &str) -> Result<Self, Self::Err> {
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidDocumentId(stem.to_string()));
        }
        stem.parse::<u64>()
            .map(DocumentId)
            .map_err(|_| InvalidDocumentId(stem.to_string()))
    }
}

/// Which reference syntax an image was found through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    /// `![alt](url)`
    Inline,
    /// `{{< lazyimage <hex> <count> >}}`
    LazyShortcode,
}

impl fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageOrigin::Inline => "inline",
            ImageOrigin::LazyShortcode => "lazy-shortcode",
        })
    }
}

/// One image found in a document body.
///
/// `url` is never empty: the extractor drops inline matches without a target,
/// and shortcode URLs are always synthesized from the asset host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub document: DocumentId,
    pub alt: String,
    pub url: String,
    pub origin: ImageOrigin,
}
