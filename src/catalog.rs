//! Defines the [`Catalog`], the JSON index of every page built in a run.
//!
//! The catalog has exactly four buckets, one per [`Category`]. Posts whose
//! category isn't recognized land in [`Category::Technical`].

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The recognized post categories. Each one names a catalog bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Technical,
    CaseStudies,
    BookReviews,
    SatNotes,
}

impl Category {
    /// All categories in catalog order.
    pub const ALL: [Category; 4] = [
        Category::Technical,
        Category::CaseStudies,
        Category::BookReviews,
        Category::SatNotes,
    ];

    /// Maps a header category to its bucket. Anything unrecognized, including
    /// the empty string, maps to [`Category::Technical`].
    pub fn from_name(name: &str) -> Category {
        match name {
            "case-studies" => Category::CaseStudies,
            "book-reviews" => Category::BookReviews,
            "sat-notes" => Category::SatNotes,
            _ => Category::Technical,
        }
    }

    /// The bucket's key in the serialized catalog.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::CaseStudies => "case-studies",
            Category::BookReviews => "book-reviews",
            Category::SatNotes => "sat-notes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The listing summary of one built page.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    pub date: String,
    pub description: String,

    /// Relative, `/`-separated path to the generated page.
    pub link: String,

    pub tags: Vec<String>,
}

/// The categorized index of built pages. Entries keep insertion order within
/// each bucket.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Catalog {
    technical: Vec<CatalogEntry>,

    #[serde(rename = "case-studies")]
    case_studies: Vec<CatalogEntry>,

    #[serde(rename = "book-reviews")]
    book_reviews: Vec<CatalogEntry>,

    #[serde(rename = "sat-notes")]
    sat_notes: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    /// Appends `entry` to the bucket for `category`.
    pub fn add_entry(&mut self, category: &str, entry: CatalogEntry) {
        self.bucket_mut(Category::from_name(category)).push(entry);
    }

    pub fn bucket(&self, category: Category) -> &[CatalogEntry] {
        match category {
            Category::Technical => &self.technical,
            Category::CaseStudies => &self.case_studies,
            Category::BookReviews => &self.book_reviews,
            Category::SatNotes => &self.sat_notes,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<CatalogEntry> {
        match category {
            Category::Technical => &mut self.technical,
            Category::CaseStudies => &mut self.case_studies,
            Category::BookReviews => &mut self.book_reviews,
            Category::SatNotes => &mut self.sat_notes,
        }
    }

    /// The total number of entries across all buckets.
    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.bucket(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the catalog as pretty-printed JSON with two-space
    /// indentation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the serialized catalog to `path`, creating or truncating it.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|err| Error::Write {
            path: path.to_owned(),
            err,
        })
    }
}

/// The result of a fallible catalog operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error persisting the [`Catalog`].
#[derive(Debug)]
pub enum Error {
    /// Returned when serialization fails.
    Serialize(serde_json::Error),

    /// Returned when the index file can't be written.
    Write { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Serialize(err) => write!(f, "Serializing catalog: {}", err),
            Error::Write { path, err } => {
                write!(f, "Writing catalog '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialize(err) => Some(err),
            Error::Write { path: _, err } => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator on serialization.
    fn from(err: serde_json::Error) -> Error {
        Error::Serialize(err)
    }
}
