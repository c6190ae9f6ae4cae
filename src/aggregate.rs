//! Grouping and ordering of extracted images into the two published views.
//!
//! - **sidebar**: images of [`Valid`](Validity::Valid) posts, oldest post
//!   first (ascending identifier), each post's images in extraction order.
//! - **full**: images of `Valid` and [`Old`](Validity::Old) posts, newest post
//!   first (descending identifier), each post's images in extraction order.
//!
//! Both views are built from an ordered map keyed by [`DocumentId`], so the
//! result does not depend on the order documents were handed in.

use crate::types::{DocumentId, ImageReference};
use crate::validity::Validity;
use std::collections::BTreeMap;

/// Images of one post, keyed by post.
pub type ImageGroups = BTreeMap<DocumentId, Vec<ImageReference>>;

/// A document after classification and extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDocument {
    pub id: DocumentId,
    pub validity: Validity,
    /// Empty for misformatted documents; populated (but unpublished) for drafts.
    pub images: Vec<ImageReference>,
}

/// The two ordered image lists rendered by [`crate::generate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryViews {
    pub sidebar: Vec<ImageReference>,
    pub full: Vec<ImageReference>,
}

pub fn aggregate<'a, I>(documents: I) -> GalleryViews
where
    I: IntoIterator<Item = &'a ClassifiedDocument>,
{
    let mut sidebar = ImageGroups::new();
    let mut full = ImageGroups::new();

    for doc in documents {
        if doc.validity.in_sidebar() {
            sidebar
                .entry(doc.id)
                .or_default()
                .extend(doc.images.iter().cloned());
        }
        if doc.validity.in_gallery() {
            full.entry(doc.id)
                .or_default()
                .extend(doc.images.iter().cloned());
        }
    }

    GalleryViews {
        sidebar: sidebar.into_values().flatten().collect(),
        full: full.into_values().rev().flatten().collect(),
    }
}
