//! Exports the [`build_site`] function which stitches together the steps of a
//! build: loading the post template ([`crate::page`]), walking the content
//! directory, converting each post ([`crate::frontmatter`],
//! [`crate::metadata`], [`crate::markdown`]), writing its page, and finally
//! flushing the [`Catalog`] to the index file.

use crate::catalog::{Catalog, CatalogEntry, Error as CatalogError};
use crate::config::{Config, FailurePolicy};
use crate::frontmatter;
use crate::markdown;
use crate::metadata::Metadata;
use crate::page::{Error as PageError, PageTemplate};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = ".md";

/// A summary of a completed walk.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// The number of pages written.
    pub built: usize,

    /// The number of entries flushed to the catalog.
    pub cataloged: usize,

    /// Posts that failed to build under [`FailurePolicy::Continue`]. Always
    /// empty under [`FailurePolicy::Abort`], where the first failure is
    /// returned as the error instead.
    pub failures: Vec<Error>,
}

/// Builds every post under [`Config::content_directory`] and writes the
/// catalog to [`Config::index_file`].
///
/// The template is loaded before anything is touched on disk; if that fails
/// nothing is written at all. Once the walk starts, the catalog is written
/// when it ends regardless of how it ended, so an aborted walk still flushes
/// the entries of the posts built before the failure.
pub fn build_site(config: &Config) -> Result<BuildReport> {
    let template = PageTemplate::load(&config.template_file)?;
    let mut catalog = Catalog::new();
    let mut report = BuildReport::default();

    let walked = walk_posts(config, &template, &mut catalog, &mut report);

    let flushed = catalog.write(&config.index_file);
    if flushed.is_ok() {
        report.cataloged = catalog.len();
        info!(
            "Catalog written: {} ({} entries)",
            config.index_file.display(),
            report.cataloged
        );
    }

    match (walked, flushed) {
        (Err(walk_err), Err(flush_err)) => {
            error!("{}", flush_err);
            Err(walk_err)
        }
        (Err(walk_err), Ok(())) => Err(walk_err),
        (Ok(()), Err(flush_err)) => Err(Error::Catalog(flush_err)),
        (Ok(()), Ok(())) => Ok(report),
    }
}

fn walk_posts(
    config: &Config,
    template: &PageTemplate,
    catalog: &mut Catalog,
    report: &mut BuildReport,
) -> Result<()> {
    let link_prefix = slash_segments(link_base(config));

    for result in WalkDir::new(&config.content_directory).sort_by_file_name() {
        let built = result
            .map_err(Error::from)
            .and_then(|entry| match is_post(&entry) {
                false => {
                    debug!("Skipping {}", entry.path().display());
                    Ok(())
                }
                true => {
                    let (category, entry) =
                        build_post(config, template, &link_prefix, entry.path())?;
                    catalog.add_entry(&category, entry);
                    report.built += 1;
                    Ok(())
                }
            });

        if let Err(err) = built {
            match config.on_failure {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::Continue => {
                    error!("{}", err);
                    report.failures.push(err);
                }
            }
        }
    }
    Ok(())
}

fn is_post(entry: &walkdir::DirEntry) -> bool {
    !entry.file_type().is_dir()
        && entry
            .file_name()
            .to_string_lossy()
            .ends_with(MARKDOWN_EXTENSION)
}

// Builds the page for the post at `source_path` and returns its category and
// catalog entry.
fn build_post(
    config: &Config,
    template: &PageTemplate,
    link_prefix: &[String],
    source_path: &Path,
) -> Result<(String, CatalogEntry)> {
    let file_name = source_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::InvalidFileName(source_path.to_owned()))?;
    let base_name = file_name
        .strip_suffix(MARKDOWN_EXTENSION)
        .unwrap_or(file_name);

    let source = std::fs::read(source_path).map_err(|err| Error::Read {
        path: source_path.to_owned(),
        err,
    })?;
    let source = String::from_utf8_lossy(&source);

    let source_name = source_path.display().to_string();
    let document = frontmatter::split(&source_name, &source);
    let body = markdown::to_html(document.body, &config.markdown);
    let metadata = Metadata::from_header(&document.header);

    let segments = category_segments(&metadata.category);
    let category_directory = segments
        .iter()
        .fold(config.output_directory.clone(), |dir, segment| dir.join(segment));
    std::fs::create_dir_all(&category_directory).map_err(|err| Error::CreateDirectory {
        path: category_directory.clone(),
        err,
    })?;

    let page_name = format!("{}.html", base_name);
    let output_path = category_directory.join(&page_name);
    let html = template
        .render(&body, &metadata)
        .map_err(|err| Error::Render {
            path: source_path.to_owned(),
            err,
        })?;
    std::fs::write(&output_path, html).map_err(|err| Error::WritePage {
        path: output_path.clone(),
        err,
    })?;
    info!("Built: {}", output_path.display());

    let link = link_prefix
        .iter()
        .chain(segments.iter())
        .map(String::as_str)
        .chain(std::iter::once(page_name.as_str()))
        .collect::<Vec<&str>>()
        .join("/");

    let Metadata {
        title,
        date,
        category,
        description,
        tags,
    } = metadata;
    Ok((
        category,
        CatalogEntry {
            title,
            date,
            description,
            link,
            tags,
        },
    ))
}

// Catalog links are relative to the directory holding the index file, so
// `posts/technical/a.html` for the default layout. An output directory
// outside of it is linked as configured.
fn link_base(config: &Config) -> &Path {
    let index_directory = config.index_file.parent().unwrap_or_else(|| Path::new(""));
    config
        .output_directory
        .strip_prefix(index_directory)
        .unwrap_or_else(|_| config.output_directory.as_path())
}

// Categories only contribute plain directory names, so a page can't be placed
// outside of the output directory.
fn category_segments(category: &str) -> Vec<String> {
    Path::new(category)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

// Splits a path into `/`-joinable segments. `.` segments are dropped and a
// root becomes a leading empty segment.
fn slash_segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|component| match component {
            Component::Prefix(prefix) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            Component::ParentDir => Some("..".to_owned()),
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
        })
        .collect()
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug)]
pub enum Error {
    /// Returned when the post template can't be loaded or parsed.
    Template(PageError),

    /// Returned for errors walking the content directory.
    Walk(walkdir::Error),

    /// Returned when a post source file isn't valid UTF-8 in its name.
    InvalidFileName(PathBuf),

    /// Returned when a post source file can't be read.
    Read { path: PathBuf, err: std::io::Error },

    /// Returned when a category directory can't be created.
    CreateDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when the template fails for a post.
    Render { path: PathBuf, err: PageError },

    /// Returned when a page can't be written.
    WritePage { path: PathBuf, err: std::io::Error },

    /// Returned when the catalog can't be written.
    Catalog(CatalogError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::Walk(err) => write!(f, "Walking content directory: {}", err),
            Error::InvalidFileName(path) => write!(f, "Invalid file name: {:?}", path),
            Error::Read { path, err } => {
                write!(f, "Reading post '{}': {}", path.display(), err)
            }
            Error::CreateDirectory { path, err } => {
                write!(f, "Creating directory '{}': {}", path.display(), err)
            }
            Error::Render { path, err } => {
                write!(f, "Rendering post '{}': {}", path.display(), err)
            }
            Error::WritePage { path, err } => {
                write!(f, "Writing page '{}': {}", path.display(), err)
            }
            Error::Catalog(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Walk(err) => Some(err),
            Error::InvalidFileName(_) => None,
            Error::Read { path: _, err } => Some(err),
            Error::CreateDirectory { path: _, err } => Some(err),
            Error::Render { path: _, err } => Some(err),
            Error::WritePage { path: _, err } => Some(err),
            Error::Catalog(err) => Some(err),
        }
    }
}

impl From<PageError> for Error {
    /// Converts [`PageError`]s into [`Error`]. This allows us to use the `?`
    /// operator when loading the template.
    fn from(err: PageError) -> Error {
        Error::Template(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts [`walkdir::Error`]s into [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}

impl From<CatalogError> for Error {
    /// Converts [`CatalogError`]s into [`Error`].
    fn from(err: CatalogError) -> Error {
        Error::Catalog(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::Category;
    use std::fs;
    use tempfile::TempDir;

    const TEMPLATE: &str =
        "<html><head><title>{{.Title}}</title></head><body><p>{{.Date}} {{.Category}}</p>{{.Content}}</body></html>";

    fn site(posts: &[(&str, &str)]) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::rooted_at(dir.path());
        fs::write(&config.template_file, TEMPLATE).unwrap();
        fs::create_dir_all(&config.content_directory).unwrap();
        for (path, contents) in posts {
            let path = config.content_directory.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        (dir, config)
    }

    fn read_catalog(config: &Config) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(&config.index_file).unwrap()).unwrap()
    }

    #[test]
    fn test_single_post() -> Result<()> {
        let (_dir, config) = site(&[(
            "technical/a.md",
            "---\ntitle: Hello\ncategory: technical\n---\n# Heading\n",
        )]);
        let report = build_site(&config)?;
        assert_eq!(report.built, 1);
        assert_eq!(report.cataloged, 1);

        let page = fs::read_to_string(config.output_directory.join("technical/a.html")).unwrap();
        assert!(page.contains("<title>Hello</title>"));
        assert!(page.contains("<h1>Heading</h1>"));

        let catalog = read_catalog(&config);
        assert_eq!(
            catalog["technical"],
            serde_json::json!([{
                "title": "Hello",
                "date": "",
                "description": "",
                "link": "posts/technical/a.html",
                "tags": [],
            }])
        );
        for category in &Category::ALL[1..] {
            assert_eq!(catalog[category.name()], serde_json::json!([]));
        }
        Ok(())
    }

    #[test]
    fn test_unrecognized_category_falls_back_to_technical() -> Result<()> {
        let (_dir, config) = site(&[("a.md", "---\ntitle: M\ncategory: misc\n---\nbody")]);
        build_site(&config)?;

        assert!(config.output_directory.join("misc/a.html").is_file());
        let catalog = read_catalog(&config);
        assert!(catalog.get("misc").is_none());
        assert_eq!(catalog["technical"][0]["title"], "M");
        assert_eq!(catalog["technical"][0]["link"], "posts/misc/a.html");
        Ok(())
    }

    #[test]
    fn test_basename_collision_keeps_both_entries() -> Result<()> {
        let (_dir, config) = site(&[
            ("x/a.md", "---\ntitle: From X\ncategory: technical\n---\nx"),
            ("y/a.md", "---\ntitle: From Y\ncategory: technical\n---\ny"),
        ]);
        let report = build_site(&config)?;
        assert_eq!(report.built, 2);

        let page = fs::read_to_string(config.output_directory.join("technical/a.html")).unwrap();
        assert!(page.contains("From Y"));
        let catalog = read_catalog(&config);
        assert_eq!(catalog["technical"].as_array().unwrap().len(), 2);
        assert_eq!(catalog["technical"][0]["title"], "From X");
        assert_eq!(catalog["technical"][1]["title"], "From Y");
        Ok(())
    }

    #[test]
    fn test_missing_template_writes_nothing() {
        let (_dir, config) = site(&[("a.md", "---\ntitle: A\n---\nbody")]);
        fs::remove_file(&config.template_file).unwrap();

        match build_site(&config) {
            Err(Error::Template(_)) => {}
            other => panic!("expected a template error, got {:?}", other.map(|r| r.built)),
        }
        assert!(!config.output_directory.exists());
        assert!(!config.index_file.exists());
    }

    #[test]
    fn test_malformed_template_writes_nothing() {
        let (_dir, config) = site(&[("a.md", "---\ntitle: A\n---\nbody")]);
        fs::write(&config.template_file, "{{.Title").unwrap();

        assert!(matches!(build_site(&config), Err(Error::Template(_))));
        assert!(!config.output_directory.exists());
        assert!(!config.index_file.exists());
    }

    #[test]
    fn test_non_markdown_files_are_skipped() -> Result<()> {
        let (_dir, config) = site(&[
            ("notes.txt", "not a post"),
            ("a.md", "---\ntitle: A\n---\nbody"),
            ("nested/deeper/b.md", "---\ntitle: B\ncategory: sat-notes\ntags: [x, 2]\n---\nbody"),
        ]);
        let report = build_site(&config)?;
        assert_eq!(report.built, 2);

        let catalog = read_catalog(&config);
        assert_eq!(catalog["sat-notes"][0]["tags"], serde_json::json!(["x", "2"]));
        assert_eq!(catalog["technical"][0]["link"], "posts/a.html");
        assert!(config.output_directory.join("a.html").is_file());
        assert!(config.output_directory.join("sat-notes/b.html").is_file());
        Ok(())
    }

    #[test]
    fn test_post_without_header() -> Result<()> {
        let (_dir, config) = site(&[("plain.md", "# Just markdown\n")]);
        build_site(&config)?;
        let catalog = read_catalog(&config);
        assert_eq!(catalog["technical"][0]["title"], "");
        assert_eq!(catalog["technical"][0]["tags"], serde_json::json!([]));
        Ok(())
    }

    #[test]
    fn test_metadata_is_escaped_in_page() -> Result<()> {
        let (_dir, config) = site(&[(
            "a.md",
            "---\ntitle: \"<script>alert(1)</script>\"\ncategory: technical\n---\n*body*",
        )]);
        build_site(&config)?;
        let page = fs::read_to_string(config.output_directory.join("technical/a.html")).unwrap();
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(page.contains("<em>body</em>"));
        Ok(())
    }

    #[test]
    fn test_rebuild_is_identical() -> Result<()> {
        let (_dir, config) = site(&[
            ("b.md", "---\ntitle: B\ncategory: book-reviews\n---\nb"),
            ("a.md", "---\ntitle: A\ncategory: book-reviews\n---\na"),
        ]);
        build_site(&config)?;
        let page = fs::read(config.output_directory.join("book-reviews/a.html")).unwrap();
        let catalog = fs::read(&config.index_file).unwrap();

        build_site(&config)?;
        assert_eq!(page, fs::read(config.output_directory.join("book-reviews/a.html")).unwrap());
        assert_eq!(catalog, fs::read(&config.index_file).unwrap());
        Ok(())
    }

    #[test]
    fn test_missing_content_directory_still_flushes_catalog() {
        let (_dir, config) = site(&[]);
        fs::remove_dir(&config.content_directory).unwrap();

        assert!(matches!(build_site(&config), Err(Error::Walk(_))));
        let catalog = read_catalog(&config);
        assert_eq!(catalog["technical"], serde_json::json!([]));
    }

    #[test]
    fn test_write_failure_aborts_but_flushes_earlier_entries() {
        let (_dir, config) = site(&[
            ("a.md", "---\ntitle: A\ncategory: technical\n---\na"),
            ("b.md", "---\ntitle: B\ncategory: technical\n---\nb"),
            ("c.md", "---\ntitle: C\ncategory: technical\n---\nc"),
        ]);
        // A directory where the page file should go makes the write fail.
        fs::create_dir_all(config.output_directory.join("technical/b.html")).unwrap();

        match build_site(&config) {
            Err(Error::WritePage { path, .. }) => assert!(path.ends_with("technical/b.html")),
            other => panic!("expected a write error, got {:?}", other.map(|r| r.built)),
        }
        assert!(config.output_directory.join("technical/a.html").is_file());
        assert!(!config.output_directory.join("technical/c.html").exists());

        let catalog = read_catalog(&config);
        let technical = catalog["technical"].as_array().unwrap();
        assert_eq!(technical.len(), 1);
        assert_eq!(technical[0]["title"], "A");
    }

    #[test]
    fn test_continue_policy_skips_failed_posts() -> Result<()> {
        let (_dir, mut config) = site(&[
            ("a.md", "---\ntitle: A\ncategory: technical\n---\na"),
            ("b.md", "---\ntitle: B\ncategory: technical\n---\nb"),
            ("c.md", "---\ntitle: C\ncategory: technical\n---\nc"),
        ]);
        config.on_failure = FailurePolicy::Continue;
        fs::create_dir_all(config.output_directory.join("technical/b.html")).unwrap();

        let report = build_site(&config)?;
        assert_eq!(report.built, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0], Error::WritePage { .. }));

        let catalog = read_catalog(&config);
        let titles: Vec<&str> = catalog["technical"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
        Ok(())
    }

    #[test]
    fn test_only_one_extension_is_stripped() -> Result<()> {
        let (_dir, config) = site(&[
            ("notes.md", "---\ntitle: Plain\ncategory: technical\n---\na"),
            ("notes.md.md", "---\ntitle: Doubled\ncategory: technical\n---\nb"),
        ]);
        build_site(&config)?;

        let plain = fs::read_to_string(config.output_directory.join("technical/notes.html")).unwrap();
        let doubled =
            fs::read_to_string(config.output_directory.join("technical/notes.md.html")).unwrap();
        assert!(plain.contains("Plain"));
        assert!(doubled.contains("Doubled"));

        let catalog = read_catalog(&config);
        assert_eq!(catalog["technical"][0]["link"], "posts/technical/notes.html");
        assert_eq!(catalog["technical"][1]["link"], "posts/technical/notes.md.html");
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_source_is_decoded_lossily() -> Result<()> {
        let (_dir, config) = site(&[]);
        fs::write(
            config.content_directory.join("a.md"),
            &b"---\ntitle: A\ncategory: technical\n---\nbad \xff byte"[..],
        )
        .unwrap();

        let report = build_site(&config)?;
        assert_eq!(report.built, 1);
        let page = fs::read_to_string(config.output_directory.join("technical/a.html")).unwrap();
        assert!(page.contains("bad \u{fffd} byte"));
        assert_eq!(read_catalog(&config)["technical"][0]["title"], "A");
        Ok(())
    }

    #[test]
    fn test_template_execution_failure_aborts() {
        let (_dir, config) = site(&[
            ("a.md", "---\ntitle: A\ncategory: technical\n---\na"),
            ("b.md", "---\ntitle: B\ncategory: technical\n---\nb"),
        ]);
        fs::write(&config.template_file, "<title>{{.Title.Missing}}</title>").unwrap();

        match build_site(&config) {
            Err(Error::Render { path, err: PageError::Execute(_) }) => {
                assert!(path.ends_with("a.md"))
            }
            other => panic!("expected a render error, got {:?}", other.map(|r| r.built)),
        }
        assert!(!config.output_directory.join("technical/a.html").exists());
        assert!(!config.output_directory.join("technical/b.html").exists());
        assert_eq!(read_catalog(&config)["technical"], serde_json::json!([]));
    }

    #[test]
    fn test_slash_segments() {
        assert_eq!(slash_segments(Path::new("posts/technical")), vec!["posts", "technical"]);
        assert_eq!(slash_segments(Path::new("./posts")), vec!["posts"]);
        assert!(slash_segments(Path::new("")).is_empty());
    }

    #[test]
    fn test_category_segments_stay_inside_output() {
        assert_eq!(category_segments("technical"), vec!["technical"]);
        assert_eq!(category_segments("guides/rust"), vec!["guides", "rust"]);
        assert_eq!(category_segments("../../etc"), vec!["etc"]);
        assert_eq!(category_segments("/abs"), vec!["abs"]);
        assert!(category_segments("").is_empty());
    }
}
