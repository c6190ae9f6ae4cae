//! Engine configuration.
//!
//! Handles loading, validating, and merging the `gallery.toml` file. Every
//! value the engine needs (where the content lives, where the two artifacts
//! go, the staleness threshold, the canonical timezone and the asset host for
//! shortcode images) lives in [`GalleryConfig`] and is passed explicitly into
//! the pipeline.
//!
//! ## Config File Location
//!
//! The file is looked up at `<root>/gallery.toml`, where `<root>` is the site
//! root given on the command line (the current directory by default). It is
//! optional: without it the stock defaults describe the usual Hugo layout.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_dir = "site/content"         # Directory holding <id>.md documents
//! max_age_days = 2                     # Days after which a post is "old"
//! utc_offset = "+09:00"                # Timezone used for the age computation
//! asset_host = "https://static.devh.se/images"
//! empty_sidebar_message = "最近の写真はありません"
//!
//! [output]
//! sidebar = "site/themes/devhouse-theme/layouts/partials/gallery.html"
//! gallery = "site/content/gallery.md"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! max_age_days = 7
//! ```
//!
//! Unknown keys are rejected to catch typos early. Relative paths are
//! resolved against the site root, not the config file.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `gallery.toml`.
///
/// All fields have defaults matching the blog's Hugo layout. Unknown keys are
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Directory scanned for `<id>.md` documents.
    pub content_dir: PathBuf,
    /// Posts whose date is at least this many days old move from the sidebar
    /// to the gallery-only set.
    pub max_age_days: u32,
    /// Fixed UTC offset (`±HH:MM`) in which post ages are computed,
    /// independent of the host timezone.
    pub utc_offset: String,
    /// Base URL that lazy-image shortcode identifiers are appended to.
    pub asset_host: String,
    /// Sidebar content written when no post is currently valid.
    pub empty_sidebar_message: String,
    /// Where the two artifacts are written.
    pub output: OutputConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("site/content"),
            max_age_days: 2,
            utc_offset: "+09:00".to_string(),
            asset_host: "https://static.devh.se/images".to_string(),
            empty_sidebar_message: "最近の写真はありません".to_string(),
            output: OutputConfig::default(),
        }
    }
}

/// Output artifact locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// HTML partial holding the random-pick sidebar widget.
    pub sidebar: PathBuf,
    /// Markdown gallery page. Its file name is never read back as a document.
    pub gallery: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sidebar: PathBuf::from("site/themes/devhouse-theme/layouts/partials/gallery.html"),
            gallery: PathBuf::from("site/content/gallery.md"),
        }
    }
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age_days == 0 {
            return Err(ConfigError::Validation(
                "max_age_days must be at least 1".into(),
            ));
        }
        self.fixed_offset()?;
        if self.asset_host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "asset_host must not be empty".into(),
            ));
        }
        if self.output.sidebar.as_os_str().is_empty() || self.output.gallery.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "output.sidebar and output.gallery must not be empty".into(),
            ));
        }
        if self.output.sidebar == self.output.gallery {
            return Err(ConfigError::Validation(
                "output.sidebar and output.gallery must be different files".into(),
            ));
        }
        Ok(())
    }

    /// The canonical offset used when computing post ages.
    pub fn fixed_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.utc_offset).ok_or_else(|| {
            ConfigError::Validation(format!(
                "utc_offset must look like +09:00, got {:?}",
                self.utc_offset
            ))
        })
    }

    /// Resolve relative paths against the site root.
    pub fn anchored(mut self, root: &Path) -> Self {
        self.content_dir = root.join(&self.content_dir);
        self.output.sidebar = root.join(&self.output.sidebar);
        self.output.gallery = root.join(&self.output.gallery);
        self
    }

    /// File name the loader must skip: the engine's own gallery page.
    pub fn reserved_file_name(&self) -> Option<&std::ffi::OsStr> {
        self.output.gallery.file_name()
    }
}

/// Parse a `±HH:MM` (or `±HHMM`, or `Z`) offset.
pub fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    let sign = match text.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let rest = &text[1..];
    if !rest.bytes().all(|b| b.is_ascii_digit() || b == b':') {
        return None;
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 => rest.split_at(2),
        None => return None,
    };
    if hours.len() != 2 || minutes.len() != 2 || minutes.contains(':') {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GalleryConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GalleryConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
///
/// Paths inside the returned config are still relative; see
/// [`GalleryConfig::anchored`].
pub fn load_config(config_path: &Path) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(config_path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `gallery.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Curator Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Relative paths are resolved against the site root (--root, default ".").
# Unknown keys will cause an error.

# Directory scanned for <id>.md posts. Only files whose stem is a plain
# integer are treated as posts.
content_dir = "site/content"

# A post whose date is at least this many days old leaves the sidebar widget
# but stays on the gallery page.
max_age_days = 2

# Timezone in which post ages are computed, as a fixed offset from UTC.
# Naive dates in front matter are read in this offset too.
utc_offset = "+09:00"

# Base URL for {{< lazyimage <id> <count> >}} shortcodes; the identifier is
# appended after a slash.
asset_host = "https://static.devh.se/images"

# Written to the sidebar partial when no post is recent enough.
empty_sidebar_message = "最近の写真はありません"

# ---------------------------------------------------------------------------
# Output artifacts
# ---------------------------------------------------------------------------
[output]
# HTML partial with the random-pick widget.
sidebar = "site/themes/devhouse-theme/layouts/partials/gallery.html"

# Gallery markdown page. Its file name is skipped when scanning for posts.
gallery = "site/content/gallery.md"
"##
}
