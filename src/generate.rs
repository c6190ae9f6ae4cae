//! Artifact rendering and writing.
//!
//! Final stage of the curation pipeline. Turns the two [`GalleryViews`] into
//! the files Hugo picks up on its next build.
//!
//! ## Generated Files
//!
//! - **Sidebar partial** (`output.sidebar`): a `<span id="daily-image">`
//!   placeholder plus a script that picks one recent image at random on every
//!   page load. With no recent images it is just the fallback message.
//! - **Gallery page** (`output.gallery`): a markdown page with a
//!   `type: gallery` header and one linked image per line, newest post first.
//!
//! Each image is rendered the same way in both files:
//!
//! ```html
//! <a href="42"><img src="https://static.devh.se/images/3fa9c0" alt="image"></a>
//! ```
//!
//! The link target is the bare post number, which Hugo resolves relative to
//! the page it is rendered on.
//!
//! ## Writing
//!
//! Rendering is pure: [`render`] returns both artifacts as strings and the
//! same views always render to the same bytes. [`write_artifacts`] stages
//! both files as temporaries next to their destinations and only renames
//! them into place once both are on disk. The previous sidebar is kept aside
//! until the gallery page is in place and is put back if that rename fails,
//! so a failed run leaves the previous outputs untouched.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for the image tags, so alt text and
//! URLs are escaped. The picker script is embedded at compile time from
//! `static/daily-image.js`.

use crate::aggregate::GalleryViews;
use crate::config::OutputConfig;
use crate::types::ImageReference;
use maud::{Markup, PreEscaped, html};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Front matter of the gallery page.
pub const GALLERY_HEADER: &str = "---\ntype: gallery\n---\n";

const PICKER_JS: &str = include_str!("../static/daily-image.js");

/// Both rendered outputs, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub sidebar: String,
    pub gallery: String,
}

/// Render both artifacts from the views.
pub fn render(views: &GalleryViews, empty_sidebar_message: &str) -> Result<Artifacts, GenerateError> {
    Ok(Artifacts {
        sidebar: render_sidebar(&views.sidebar, empty_sidebar_message)?,
        gallery: render_gallery_page(&views.full),
    })
}

/// Render, then write both artifacts to their configured locations.
pub fn generate(
    views: &GalleryViews,
    empty_sidebar_message: &str,
    output: &OutputConfig,
) -> Result<Artifacts, GenerateError> {
    let artifacts = render(views, empty_sidebar_message)?;
    write_artifacts(&artifacts, output)?;
    Ok(artifacts)
}

// ============================================================================
// Rendering
// ============================================================================

/// A single linked image.
pub fn image_tag(image: &ImageReference) -> Markup {
    html! {
        a href=(image.document.0) {
            img src=(image.url) alt=(image.alt);
        }
    }
}

/// The sidebar partial: a random-pick widget, or `empty_message` verbatim.
pub fn render_sidebar(
    images: &[ImageReference],
    empty_message: &str,
) -> Result<String, serde_json::Error> {
    if images.is_empty() {
        return Ok(empty_message.to_string());
    }

    let script = format!(
        "\nconst choices = {};\n{}",
        choices_literal(images)?,
        PICKER_JS
    );
    let widget = html! {
        span id="daily-image" {}
        script { (PreEscaped(script)) }
    };
    Ok(format!("{}\n", widget.into_string()))
}

/// The gallery page: header, then one image tag per line.
pub fn render_gallery_page(images: &[ImageReference]) -> String {
    let mut page = String::from(GALLERY_HEADER);
    for image in images {
        page.push_str(&image_tag(image).into_string());
        page.push('\n');
    }
    page
}

/// JSON array of rendered tags, safe to embed inside `<script>`.
fn choices_literal(images: &[ImageReference]) -> Result<String, serde_json::Error> {
    let tags: Vec<String> = images.iter().map(|i| image_tag(i).into_string()).collect();
    Ok(serde_json::to_string(&tags)?.replace("</", "<\\/"))
}

// ============================================================================
// Writing
// ============================================================================

/// Write both artifacts, replacing any previous versions atomically.
///
/// Both files are fully staged before either is moved into place. If the
/// gallery page cannot be moved into place, the sidebar is rolled back.
pub fn write_artifacts(artifacts: &Artifacts, output: &OutputConfig) -> Result<(), GenerateError> {
    let sidebar = stage(&output.sidebar, &artifacts.sidebar)?;
    let gallery = stage(&output.gallery, &artifacts.gallery)?;
    let previous_sidebar = Backup::take(&output.sidebar)?;

    commit(sidebar, &output.sidebar)?;
    if let Err(err) = commit(gallery, &output.gallery) {
        if let Err(restore_err) = previous_sidebar.restore(&output.sidebar) {
            tracing::error!(
                path = %output.sidebar.display(),
                error = %restore_err,
                "could not restore previous sidebar"
            );
        }
        return Err(err);
    }
    Ok(())
}

/// What a destination held before the run touched it.
enum Backup {
    Absent,
    Saved(NamedTempFile),
}

impl Backup {
    fn take(path: &Path) -> Result<Self, GenerateError> {
        if !path.is_file() {
            return Ok(Backup::Absent);
        }
        let wrap = |source| GenerateError::Write {
            path: path.to_path_buf(),
            source,
        };
        let copy = NamedTempFile::new_in(parent_dir(path)).map_err(wrap)?;
        // fs::copy carries the permissions along with the contents.
        fs::copy(path, copy.path()).map_err(wrap)?;
        Ok(Backup::Saved(copy))
    }

    /// Put the previous contents back, or remove a file that did not exist.
    fn restore(self, path: &Path) -> Result<(), GenerateError> {
        let result = match self {
            Backup::Absent => fs::remove_file(path),
            Backup::Saved(copy) => copy.persist(path).map(drop).map_err(|e| e.error),
        };
        result.map_err(|source| GenerateError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "restored previous artifact");
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn stage(path: &Path, contents: &str) -> Result<NamedTempFile, GenerateError> {
    let wrap = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = parent_dir(path);
    fs::create_dir_all(parent).map_err(wrap)?;

    let mut file = NamedTempFile::new_in(parent).map_err(wrap)?;
    file.write_all(contents.as_bytes()).map_err(wrap)?;
    file.as_file().sync_all().map_err(wrap)?;
    carry_permissions(&file, path).map_err(wrap)?;
    Ok(file)
}

fn commit(file: NamedTempFile, path: &Path) -> Result<(), GenerateError> {
    file.persist(path).map_err(|e| GenerateError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

/// Temp files are created owner-only; give the staged file the permissions a
/// normally written file would have.
fn carry_permissions(file: &NamedTempFile, path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(existing) if existing.is_file() => {
            file.as_file().set_permissions(existing.permissions())
        }
        _ => set_default_permissions(file),
    }
}

#[cfg(unix)]
fn set_default_permissions(file: &NamedTempFile) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.as_file()
        .set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &NamedTempFile) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentId, ImageOrigin};
    use tempfile::TempDir;

    const FALLBACK: &str = "最近の写真はありません";

    fn image(doc: u64, alt: &str, url: &str) -> ImageReference {
        ImageReference {
            document: DocumentId(doc),
            alt: alt.to_string(),
            url: url.to_string(),
            origin: ImageOrigin::Inline,
        }
    }

    fn outputs(tmp: &TempDir) -> OutputConfig {
        OutputConfig {
            sidebar: tmp.path().join("layouts/partials/gallery.html"),
            gallery: tmp.path().join("content/gallery.md"),
        }
    }

    // =========================================================================
    // Image tags
    // =========================================================================

    #[test]
    fn image_tag_links_to_post() {
        let tag = image_tag(&image(3, "cat", "https://example/cat.png")).into_string();
        assert_eq!(
            tag,
            r#"<a href="3"><img src="https://example/cat.png" alt="cat"></a>"#
        );
    }

    #[test]
    fn image_tag_escapes_attributes() {
        let tag = image_tag(&image(1, r#"a "quoted" <b>"#, "x.png?a=1&b=2")).into_string();
        assert!(tag.contains("alt=\"a &quot;quoted&quot; &lt;b&gt;\""));
        assert!(tag.contains("src=\"x.png?a=1&amp;b=2\""));
    }

    // =========================================================================
    // Sidebar
    // =========================================================================

    #[test]
    fn empty_sidebar_is_fallback_exactly() {
        assert_eq!(render_sidebar(&[], FALLBACK).unwrap(), FALLBACK);
    }

    #[test]
    fn sidebar_embeds_choices_and_picker() {
        let images = vec![image(2, "a", "a.png"), image(5, "b", "b.png")];
        let html = render_sidebar(&images, FALLBACK).unwrap();

        assert!(html.starts_with("<span id=\"daily-image\"></span><script>"));
        assert!(html.contains(
            r#"const choices = ["<a href=\"2\"><img src=\"a.png\" alt=\"a\"><\/a>","<a href=\"5\"><img src=\"b.png\" alt=\"b\"><\/a>"];"#
        ));
        assert!(html.contains("Math.random()"));
        assert!(html.contains("getElementById(\"daily-image\")"));
        assert!(html.ends_with("</script>\n"));
        assert!(!html.contains(FALLBACK));
    }

    #[test]
    fn sidebar_script_cannot_be_closed_early() {
        let images = vec![image(1, "</script><script>alert(1)", "a.png")];
        let html = render_sidebar(&images, FALLBACK).unwrap();
        assert_eq!(html.matches("</script>").count(), 1);
    }

    #[test]
    fn sidebar_keeps_view_order() {
        let images = vec![image(2, "", "first.png"), image(9, "", "second.png")];
        let html = render_sidebar(&images, FALLBACK).unwrap();
        let first = html.find("first.png").unwrap();
        let second = html.find("second.png").unwrap();
        assert!(first < second);
    }

    // =========================================================================
    // Gallery page
    // =========================================================================

    #[test]
    fn empty_gallery_is_header_only() {
        assert_eq!(render_gallery_page(&[]), GALLERY_HEADER);
    }

    #[test]
    fn gallery_one_line_per_image() {
        let images = vec![image(10, "x", "x.png"), image(2, "y", "y.png")];
        let page = render_gallery_page(&images);
        assert_eq!(
            page,
            "---\ntype: gallery\n---\n\
             <a href=\"10\"><img src=\"x.png\" alt=\"x\"></a>\n\
             <a href=\"2\"><img src=\"y.png\" alt=\"y\"></a>\n"
        );
    }

    #[test]
    fn render_is_deterministic() {
        let views = GalleryViews {
            sidebar: vec![image(1, "a", "a.png")],
            full: vec![image(1, "a", "a.png"), image(0, "b", "b.png")],
        };
        assert_eq!(render(&views, FALLBACK).unwrap(), render(&views, FALLBACK).unwrap());
    }

    // =========================================================================
    // Writing
    // =========================================================================

    #[test]
    fn write_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let output = outputs(&tmp);
        let artifacts = Artifacts {
            sidebar: "side".into(),
            gallery: "page".into(),
        };

        write_artifacts(&artifacts, &output).unwrap();
        assert_eq!(fs::read_to_string(&output.sidebar).unwrap(), "side");
        assert_eq!(fs::read_to_string(&output.gallery).unwrap(), "page");
    }

    #[test]
    fn write_replaces_existing_files_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let output = outputs(&tmp);
        fs::create_dir_all(output.gallery.parent().unwrap()).unwrap();
        fs::write(&output.gallery, "old").unwrap();

        let artifacts = Artifacts {
            sidebar: "side".into(),
            gallery: "new".into(),
        };
        write_artifacts(&artifacts, &output).unwrap();

        assert_eq!(fs::read_to_string(&output.gallery).unwrap(), "new");
        let names: Vec<_> = fs::read_dir(output.gallery.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("gallery.md")]);
    }

    #[test]
    fn failed_write_leaves_previous_outputs() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let output = OutputConfig {
            sidebar: blocker.join("gallery.html"),
            gallery: tmp.path().join("gallery.md"),
        };
        fs::write(&output.gallery, "old").unwrap();

        let artifacts = Artifacts {
            sidebar: "side".into(),
            gallery: "new".into(),
        };
        let result = write_artifacts(&artifacts, &output);

        assert!(matches!(result, Err(GenerateError::Write { .. })));
        assert_eq!(fs::read_to_string(&output.gallery).unwrap(), "old");
    }

    #[test]
    fn failed_gallery_rename_restores_previous_sidebar() {
        let tmp = TempDir::new().unwrap();
        let output = OutputConfig {
            sidebar: tmp.path().join("gallery.html"),
            gallery: tmp.path().join("gallery.md"),
        };
        fs::write(&output.sidebar, "old sidebar").unwrap();
        // A non-empty directory cannot be replaced by a file.
        fs::create_dir_all(&output.gallery).unwrap();
        fs::write(output.gallery.join("x"), "").unwrap();

        let artifacts = Artifacts {
            sidebar: "new sidebar".into(),
            gallery: "new gallery".into(),
        };
        let result = write_artifacts(&artifacts, &output);

        assert!(matches!(result, Err(GenerateError::Write { .. })));
        assert_eq!(fs::read_to_string(&output.sidebar).unwrap(), "old sidebar");
        let mut names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                std::ffi::OsString::from("gallery.html"),
                std::ffi::OsString::from("gallery.md"),
            ]
        );
    }

    #[test]
    fn failed_gallery_rename_removes_new_sidebar() {
        let tmp = TempDir::new().unwrap();
        let output = OutputConfig {
            sidebar: tmp.path().join("gallery.html"),
            gallery: tmp.path().join("gallery.md"),
        };
        fs::create_dir_all(&output.gallery).unwrap();
        fs::write(output.gallery.join("x"), "").unwrap();

        let artifacts = Artifacts {
            sidebar: "new sidebar".into(),
            gallery: "new gallery".into(),
        };

        assert!(write_artifacts(&artifacts, &output).is_err());
        assert!(!output.sidebar.exists());
    }

    #[cfg(unix)]
    #[test]
    fn new_files_are_world_readable() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let output = outputs(&tmp);
        let artifacts = Artifacts {
            sidebar: "side".into(),
            gallery: "page".into(),
        };
        write_artifacts(&artifacts, &output).unwrap();

        let mode = fs::metadata(&output.gallery).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn generate_writes_rendered_views() {
        let tmp = TempDir::new().unwrap();
        let output = outputs(&tmp);
        let views = GalleryViews::default();

        let artifacts = generate(&views, FALLBACK, &output).unwrap();
        assert_eq!(fs::read_to_string(&output.sidebar).unwrap(), FALLBACK);
        assert_eq!(fs::read_to_string(&output.gallery).unwrap(), artifacts.gallery);
    }
}
