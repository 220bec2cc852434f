//! Defines [`PageTemplate`], which fills the single post template with a
//! converted body and the post's metadata.
//!
//! The template uses Go template syntax and is given exactly four fields:
//! `{{.Title}}`, `{{.Date}}`, `{{.Category}}`, and `{{.Content}}`. The first
//! three are HTML-escaped before they reach the template. `Content` is markup
//! produced by [`crate::markdown`] and is inserted as-is.

use crate::metadata::Metadata;
use gtmpl::{Context, Template, Value};
use pulldown_cmark::escape::escape_html;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A parsed post template. Loaded once per build and shared by every page.
pub struct PageTemplate {
    template: Template,
}

impl PageTemplate {
    /// Reads and parses the template file at `path`.
    pub fn load(path: &Path) -> Result<PageTemplate> {
        let contents = std::fs::read_to_string(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        PageTemplate::parse(&contents)
    }

    /// Parses a template from text.
    pub fn parse(contents: &str) -> Result<PageTemplate> {
        let mut template = Template::default();
        template
            .parse(contents)
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(PageTemplate { template })
    }

    /// Renders a complete HTML document for one post.
    pub fn render(&self, content: &str, metadata: &Metadata) -> Result<String> {
        let mut fields: HashMap<String, Value> = HashMap::new();
        fields.insert("Title".to_owned(), escaped(&metadata.title)?);
        fields.insert("Date".to_owned(), escaped(&metadata.date)?);
        fields.insert("Category".to_owned(), escaped(&metadata.category)?);
        fields.insert("Content".to_owned(), Value::String(content.to_owned()));

        let context =
            Context::from(Value::Object(fields)).map_err(|e| Error::Execute(e.to_string()))?;
        let mut out: Vec<u8> = Vec::new();
        self.template
            .execute(&mut out, &context)
            .map_err(|e| Error::Execute(e.to_string()))?;
        String::from_utf8(out).map_err(|e| Error::Execute(e.to_string()))
    }
}

fn escaped(s: &str) -> Result<Value> {
    let mut out = String::with_capacity(s.len());
    escape_html(&mut out, s).map_err(|e| Error::Execute(e.to_string()))?;
    Ok(Value::String(out))
}

/// The result of a fallible templating operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or applying the post template.
#[derive(Debug)]
pub enum Error {
    /// Returned when the template file can't be read.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the template text is malformed.
    Parse(String),

    /// Returned when the template fails to execute against a post.
    Execute(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Reading template file '{}': {}", path.display(), err)
            }
            Error::Parse(err) => write!(f, "Parsing template: {}", err),
            Error::Execute(err) => write!(f, "Executing template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::Parse(_) => None,
            Error::Execute(_) => None,
        }
    }
}
