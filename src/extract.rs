//! Image reference extraction from post bodies.
//!
//! Two syntaxes are recognised:
//!
//! - Inline markdown images: `![alt](url)`
//! - The theme's lazy-loading shortcode: `{{< lazyimage 3fa9c0 4 >}}`, whose
//!   hex identifier names an image on the asset host. The trailing count is
//!   the number of pre-rendered sizes and is not needed here.
//!
//! ## Ordering
//!
//! All inline images come first, then all shortcode images, each group in
//! order of appearance. A post that interleaves the two syntaxes therefore
//! does not list its images in reading order. This matches the output the
//! blog has always published and is kept on purpose: switching to positional
//! order would reshuffle every existing gallery page.

use crate::types::{DocumentId, ImageOrigin, ImageReference};
use regex::Regex;
use std::sync::LazyLock;

/// Alt text given to every shortcode image.
pub const SHORTCODE_ALT: &str = "image";

/// `![alt](target)`, non-greedy and confined to a single line.
static INLINE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("inline image pattern"));

/// `{{< lazyimage <hex> <count> >}}`
static LAZY_SHORTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{<\s*lazyimage\s+([0-9A-Fa-f]+)\s+(\d+)\s*>\}\}").expect("shortcode pattern")
});

/// Extracts image references for one asset host.
#[derive(Debug, Clone)]
pub struct Extractor {
    asset_host: String,
}

impl Extractor {
    pub fn new(asset_host: &str) -> Self {
        Self {
            asset_host: asset_host.trim().trim_end_matches('/').to_string(),
        }
    }

    /// All images in `body`: inline ones first, then shortcodes.
    pub fn extract(&self, document: DocumentId, body: &str) -> Vec<ImageReference> {
        let mut images = inline_images(document, body);
        images.extend(self.shortcode_images(document, body));
        images
    }

    fn shortcode_images<'a>(
        &'a self,
        document: DocumentId,
        body: &'a str,
    ) -> impl Iterator<Item = ImageReference> + 'a {
        LAZY_SHORTCODE.captures_iter(body).map(move |caps| ImageReference {
            document,
            alt: SHORTCODE_ALT.to_string(),
            url: format!("{}/{}", self.asset_host, &caps[1]),
            origin: ImageOrigin::LazyShortcode,
        })
    }
}

fn inline_images(document: DocumentId, body: &str) -> Vec<ImageReference> {
    INLINE_IMAGE
        .captures_iter(body)
        .filter_map(|caps| {
            let url = link_destination(&caps[2])?;
            Some(ImageReference {
                document,
                alt: caps[1].to_string(),
                url: url.to_string(),
                origin: ImageOrigin::Inline,
            })
        })
        .collect()
}

/// The URL part of a link target, without any `"title"`. `None` if empty.
fn link_destination(target: &str) -> Option<&str> {
    let target = target.trim();
    let url = match target.strip_prefix('<') {
        Some(rest) => rest.split('>').next().unwrap_or_default(),
        None => target.split_whitespace().next().unwrap_or_default(),
    };
    (!url.is_empty()).then_some(url)
}
