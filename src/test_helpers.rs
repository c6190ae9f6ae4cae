//! Shared test utilities for the gallery-curator test suite.
//!
//! Builds throwaway sites on disk and provides the fixed evaluation instant
//! every pipeline test runs against.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_site(&[
//!     (3, post(Some(false), Some(LONG_AGO), "![cat](cat.png)")),
//!     (4, post(None, Some(RECENT), "![dog](dog.png)")),
//! ]);
//! let curation = curate(&site.config, fixed_now()).unwrap();
//! assert_eq!(image_urls(&curation.views.sidebar), vec!["dog.png"]);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::GalleryConfig;
use crate::types::ImageReference;

/// One day before [`fixed_now`]: inside the default two-day window.
pub const RECENT: &str = "2024-01-05T00:00:00Z";
/// Far outside any sensible window.
pub const LONG_AGO: &str = "2023-01-01T00:00:00Z";

/// The evaluation instant used by pipeline tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap()
}

// =========================================================================
// Site setup
// =========================================================================

/// A temporary site root and a config anchored to it.
pub struct Site {
    pub root: TempDir,
    pub config: GalleryConfig,
}

/// Create a site with the default layout and the given posts.
pub fn setup_site(posts: &[(u64, String)]) -> Site {
    let root = TempDir::new().unwrap();
    let config = GalleryConfig::default().anchored(root.path());
    fs::create_dir_all(&config.content_dir).unwrap();
    for (id, text) in posts {
        write_post(&config.content_dir, *id, text);
    }
    Site { root, config }
}

pub fn write_post(content_dir: &Path, id: u64, text: &str) {
    fs::write(content_dir.join(format!("{id}.md")), text).unwrap();
}

/// A post with a YAML header holding the given fields.
pub fn post(draft: Option<bool>, date: Option<&str>, body: &str) -> String {
    let mut text = String::from("---\ntitle: test\n");
    if let Some(draft) = draft {
        text.push_str(&format!("draft: {draft}\n"));
    }
    if let Some(date) = date {
        text.push_str(&format!("date: {date}\n"));
    }
    text.push_str("---\n");
    text.push_str(body);
    text
}

// =========================================================================
// Extractors
// =========================================================================

/// All image URLs in view order.
pub fn image_urls(images: &[ImageReference]) -> Vec<&str> {
    images.iter().map(|i| i.url.as_str()).collect()
}
