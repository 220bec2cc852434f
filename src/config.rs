//! Defines the build [`Config`]. The defaults are the fixed project layout:
//! posts are read from `content/`, pages are written under `posts/`, the
//! template is `_template.html` and the index is `posts.json`, all relative
//! to the working directory.

use crate::markdown::MarkdownOptions;
use std::path::PathBuf;

pub const CONTENT_DIRECTORY: &str = "content";
pub const OUTPUT_DIRECTORY: &str = "posts";
pub const TEMPLATE_FILE: &str = "_template.html";
pub const INDEX_FILE: &str = "posts.json";

/// What the build does when a single post fails to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the walk at the first failing post.
    Abort,

    /// Log the failure, record it, and move on to the next post.
    Continue,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Abort
    }
}

pub struct Config {
    /// The directory searched (recursively) for `.md` sources.
    pub content_directory: PathBuf,

    /// The root directory for generated pages. Pages land in
    /// `{output_directory}/{category}/{name}.html`.
    pub output_directory: PathBuf,

    /// The post template.
    pub template_file: PathBuf,

    /// The JSON catalog file.
    pub index_file: PathBuf,

    pub on_failure: FailurePolicy,

    pub markdown: MarkdownOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            content_directory: PathBuf::from(CONTENT_DIRECTORY),
            output_directory: PathBuf::from(OUTPUT_DIRECTORY),
            template_file: PathBuf::from(TEMPLATE_FILE),
            index_file: PathBuf::from(INDEX_FILE),
            on_failure: FailurePolicy::default(),
            markdown: MarkdownOptions::default(),
        }
    }
}

impl Config {
    /// A default [`Config`] with every path resolved under `root`.
    pub fn rooted_at(root: &std::path::Path) -> Config {
        Config {
            content_directory: root.join(CONTENT_DIRECTORY),
            output_directory: root.join(OUTPUT_DIRECTORY),
            template_file: root.join(TEMPLATE_FILE),
            index_file: root.join(INDEX_FILE),
            ..Config::default()
        }
    }
}
