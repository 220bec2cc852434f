//! The library code for the `catalogr` post builder. A build is a single
//! sequential pass over a content directory:
//!
//! 1. Each markdown source is split into its YAML header and body
//!    ([`crate::frontmatter`]), and the header is reduced to typed
//!    [`metadata::Metadata`] ([`crate::metadata`]).
//! 2. The body is converted to HTML ([`crate::markdown`]) and poured into the
//!    post template ([`crate::page`]), and the page is written to
//!    `{output}/{category}/{name}.html`.
//! 3. A summary of every page is appended to one of the four buckets of the
//!    [`catalog::Catalog`], which is written out as JSON once the walk is
//!    over.
//!
//! [`build::build_site`] drives the whole thing from a [`config::Config`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod catalog;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod metadata;
pub mod page;
