//! # Gallery Curator
//!
//! Keeps a blog's photo widgets in sync with its posts. Every post is a
//! `<id>.md` file with a front-matter header; the curator reads them all,
//! decides which are recent, and regenerates two files for Hugo:
//!
//! - a sidebar partial that shows one recent photo at random, and
//! - a gallery page listing every published photo, newest post first.
//!
//! # Architecture: Curation Pipeline
//!
//! ```text
//! 1. Scan        content/*.md     →  raw text per post     (filesystem → corpus)
//! 2. Front matter  raw text       →  metadata + body
//! 3. Classify    metadata         →  Valid / Draft / Old / Misformatted
//! 4. Extract     body             →  image references
//! 5. Aggregate   labelled images  →  sidebar view + full view
//! 6. Generate    views            →  sidebar partial + gallery page
//! ```
//!
//! Stages 1 to 5 run inside [`curate::curate`]; stage 6 is
//! [`generate::generate`]. The only clock read happens in the CLI, which
//! passes the instant down, so a run is reproducible: the same posts at the
//! same instant always produce byte-identical files.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists `<id>.md` posts in the content directory and reads them |
//! | [`frontmatter`] | Splits the `---` YAML (or `+++` TOML) header from the body |
//! | [`validity`] | Labels each post from its `draft` flag and `date` |
//! | [`extract`] | Finds inline markdown images and `lazyimage` shortcodes |
//! | [`aggregate`] | Orders images into the sidebar and full views |
//! | [`generate`] | Renders both artifacts with Maud and writes them atomically |
//! | [`curate`] | Runs stages 1 to 5 for a config and an instant |
//! | [`config`] | `gallery.toml` loading, merging and validation |
//! | [`types`] | Shared identifiers and image references |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Fixed Offset, Not Host Timezone
//!
//! Post ages are computed in a configured UTC offset (`+09:00` by default).
//! The blog is written in Japan but built on CI runners in UTC; a fixed
//! offset means both agree on which posts have aged out of the sidebar.
//!
//! ## One Bad Post Never Breaks the Build
//!
//! A post with a broken header is labelled misformatted, and an unreadable
//! file or unparseable date is reported and skipped. Only a missing content
//! directory, a bad config or a failed write stops the run.

pub mod aggregate;
pub mod config;
pub mod curate;
pub mod extract;
pub mod frontmatter;
pub mod generate;
pub mod output;
pub mod scan;
pub mod types;
pub mod validity;

#[cfg(test)]
pub(crate) mod test_helpers;
