//! CLI output formatting for `check` and `build`.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every post is its number and publication state; the file it came from
//! is secondary context on an indented `Source:` line. This makes the output
//! readable as an inventory of what the sidebar and gallery will show while
//! still letting users trace every entry back to a file.
//!
//! # Entity Display Contract
//!
//! 1. **Header line**: positional index + post number + state (+ image count)
//! 2. **Context lines**: indented `Source:`, then one line per image
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Evaluated at 2024-01-06T09:00:00+09:00
//!
//! Documents
//! 001 #3 Old (1 image)
//!     Source: 3.md
//!     001 cat
//!         URL: https://example/cat.png
//! 002 #4 Draft (no images)
//!     Source: 4.md
//!
//! Rejected
//!     about.md: invalid document identifier "about"
//!
//! Views
//!     Sidebar: no images
//!     Gallery: 1 image
//! ```
//!
//! ## Build
//!
//! The check output, followed by:
//!
//! ```text
//! Sidebar → site/themes/devhouse-theme/layouts/partials/gallery.html (fallback message)
//! Gallery → site/content/gallery.md (1 image)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::aggregate::GalleryViews;
use crate::config::OutputConfig;
use crate::curate::Curation;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 image`, `3 images`, `no images`.
fn image_count(n: usize) -> String {
    match n {
        0 => "no images".to_string(),
        1 => "1 image".to_string(),
        n => format!("{} images", n),
    }
}

/// Format an image line: images with alt text show it, others show the URL.
///
/// ```text
/// 001 cat
/// 002 (https://static.devh.se/images/3fa9c0)
/// ```
fn image_line(index: usize, alt: &str, url: &str) -> String {
    if alt.is_empty() {
        format!("{} ({})", format_index(index), url)
    } else {
        format!("{} {}", format_index(index), alt)
    }
}

/// `path` relative to `base` when it lives under it.
fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// check
// ============================================================================

/// Format the curation report: every labelled document, every rejected file,
/// and the size of each view.
pub fn format_curation_output(curation: &Curation, content_dir: &Path) -> Vec<String> {
    let mut lines = vec![
        format!("Evaluated at {}", curation.evaluated_at.to_rfc3339()),
        String::new(),
        "Documents".to_string(),
    ];

    if curation.entries.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, entry) in curation.entries.iter().enumerate() {
        let doc = &entry.document;
        lines.push(format!(
            "{} #{} {} ({})",
            format_index(i + 1),
            doc.id,
            doc.validity,
            image_count(doc.images.len())
        ));
        lines.push(format!(
            "{}Source: {}",
            indent(1),
            display_path(&entry.path, content_dir)
        ));
        for (j, image) in doc.images.iter().enumerate() {
            lines.push(format!("{}{}", indent(1), image_line(j + 1, &image.alt, &image.url)));
            if !image.alt.is_empty() {
                lines.push(format!("{}URL: {}", indent(2), image.url));
            }
        }
    }

    if !curation.rejected.is_empty() {
        lines.push(String::new());
        lines.push("Rejected".to_string());
        for rejection in &curation.rejected {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                display_path(&rejection.path, content_dir),
                rejection.reason
            ));
        }
    }

    lines.push(String::new());
    lines.push("Views".to_string());
    lines.push(format!(
        "{}Sidebar: {}",
        indent(1),
        image_count(curation.views.sidebar.len())
    ));
    lines.push(format!(
        "{}Gallery: {}",
        indent(1),
        image_count(curation.views.full.len())
    ));

    lines
}

/// Print the curation report to stdout.
pub fn print_curation_output(curation: &Curation, content_dir: &Path) {
    for line in format_curation_output(curation, content_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// build
// ============================================================================

/// Format what `build` wrote and where.
pub fn format_generate_output(views: &GalleryViews, output: &OutputConfig, root: &Path) -> Vec<String> {
    let sidebar_detail = if views.sidebar.is_empty() {
        "fallback message".to_string()
    } else {
        image_count(views.sidebar.len())
    };

    vec![
        format!(
            "Sidebar \u{2192} {} ({})",
            display_path(&output.sidebar, root),
            sidebar_detail
        ),
        format!(
            "Gallery \u{2192} {} ({})",
            display_path(&output.gallery, root),
            image_count(views.full.len())
        ),
    ]
}

/// Print generate output to stdout.
pub fn print_generate_output(views: &GalleryViews, output: &OutputConfig, root: &Path) {
    for line in format_generate_output(views, output, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
