//! The curation pipeline: scan → front matter → classify → extract → aggregate.
//!
//! [`curate`] is the single entry point used by both `build` and `check`. It
//! is deterministic for a given corpus and instant: documents are processed in
//! identifier order and the clock only enters through the `now` argument.
//!
//! Per-document problems never abort the run. Misformatted front matter yields
//! a [`Validity::Misformatted`] entry; an unreadable file or an unparseable
//! date yields a [`Rejection`]. Only configuration and content-directory
//! errors are fatal.

use crate::aggregate::{ClassifiedDocument, GalleryViews, aggregate};
use crate::config::{ConfigError, GalleryConfig};
use crate::extract::Extractor;
use crate::frontmatter;
use crate::scan::{self, Corpus, Rejection, ScanError, SourceDocument};
use crate::validity::{Classifier, Validity, ValidityError};
use chrono::{DateTime, FixedOffset, Utc};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CurateError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
}

/// A labelled document and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub path: PathBuf,
    pub document: ClassifiedDocument,
}

/// Result of one curation run.
#[derive(Debug)]
pub struct Curation {
    /// Instant the classification was made against, in the canonical offset.
    pub evaluated_at: DateTime<FixedOffset>,
    /// Labelled documents, ascending by identifier.
    pub entries: Vec<Entry>,
    /// Files excluded before they could be labelled.
    pub rejected: Vec<Rejection>,
    pub views: GalleryViews,
}

impl Curation {
    pub fn count(&self, validity: Validity) -> usize {
        self.entries
            .iter()
            .filter(|e| e.document.validity == validity)
            .count()
    }
}

/// Run the pipeline over `config.content_dir` as of `now`.
pub fn curate(config: &GalleryConfig, now: DateTime<Utc>) -> Result<Curation, CurateError> {
    let classifier = Classifier::new(now, config.fixed_offset()?, config.max_age_days);
    let extractor = Extractor::new(&config.asset_host);
    let corpus = scan::scan(&config.content_dir, config.reserved_file_name())?;
    Ok(curate_corpus(corpus, &classifier, &extractor))
}

/// Label an already-loaded corpus and build the views.
pub fn curate_corpus(corpus: Corpus, classifier: &Classifier, extractor: &Extractor) -> Curation {
    let mut entries = Vec::with_capacity(corpus.documents.len());
    let mut rejected = corpus.rejected;

    for source in corpus.documents {
        match classify_document(&source, classifier, extractor) {
            Ok(document) => entries.push(Entry {
                path: source.path,
                document,
            }),
            Err(err) => {
                tracing::warn!(
                    id = %source.id,
                    path = %source.path.display(),
                    error = %err,
                    "excluding document"
                );
                rejected.push(Rejection {
                    path: source.path,
                    reason: err.into(),
                });
            }
        }
    }

    let views = aggregate(entries.iter().map(|e| &e.document));
    tracing::info!(
        documents = entries.len(),
        rejected = rejected.len(),
        sidebar = views.sidebar.len(),
        gallery = views.full.len(),
        "curation complete"
    );

    Curation {
        evaluated_at: classifier.now(),
        entries,
        rejected,
        views,
    }
}

/// Parse, classify and extract a single document.
///
/// Misformatted front matter is a label, not an error; only an unusable
/// `date` makes this fail.
pub fn classify_document(
    source: &SourceDocument,
    classifier: &Classifier,
    extractor: &Extractor,
) -> Result<ClassifiedDocument, ValidityError> {
    let parsed = match frontmatter::parse(&source.text) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(id = %source.id, error = %err, "misformatted front matter");
            return Ok(ClassifiedDocument {
                id: source.id,
                validity: Validity::Misformatted,
                images: Vec::new(),
            });
        }
    };

    let validity = classifier.classify(&parsed.metadata)?;
    let images = extractor.extract(source.id, parsed.body);
    tracing::debug!(id = %source.id, %validity, images = images.len(), "classified");

    Ok(ClassifiedDocument {
        id: source.id,
        validity,
        images,
    })
}
