//! Converts markdown bodies to HTML with [`pulldown_cmark`].

use pulldown_cmark::{html, CowStr, Event, Options, Parser};

/// Placeholder emitted in place of raw HTML when [`MarkdownOptions::unsafe_html`]
/// is off.
pub const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Knobs for the markdown conversion.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkdownOptions {
    /// Pass raw HTML from the source through to the output. When false, each
    /// run of raw HTML is replaced with [`RAW_HTML_OMITTED`].
    pub unsafe_html: bool,

    /// Enable tables, footnotes, strikethrough, and task lists on top of
    /// CommonMark.
    pub extensions: bool,
}

/// Converts `markdown` to an HTML fragment.
pub fn to_html(markdown: &str, options: &MarkdownOptions) -> String {
    let mut parser_options = Options::empty();
    if options.extensions {
        parser_options.insert(Options::ENABLE_FOOTNOTES);
        parser_options.insert(Options::ENABLE_STRIKETHROUGH);
        parser_options.insert(Options::ENABLE_TABLES);
        parser_options.insert(Options::ENABLE_TASKLISTS);
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    let parser = Parser::new_ext(markdown, parser_options);
    if options.unsafe_html {
        html::push_html(&mut out, parser);
    } else {
        html::push_html(&mut out, omit_raw_html(parser));
    }
    out
}

// Consecutive raw HTML events (the lines of one HTML block) collapse into a
// single placeholder.
fn omit_raw_html<'a>(
    events: impl Iterator<Item = Event<'a>>,
) -> impl Iterator<Item = Event<'a>> {
    let mut in_html = false;
    events.filter_map(move |ev| match ev {
        Event::Html(_) if in_html => None,
        Event::Html(_) => {
            in_html = true;
            Some(Event::Html(CowStr::Borrowed(RAW_HTML_OMITTED)))
        }
        ev => {
            in_html = false;
            Some(ev)
        }
    })
}
