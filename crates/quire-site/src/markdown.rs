//! Markdown to HTML.

use pulldown_cmark::{Options, Parser, html};

/// Render Markdown with tables, footnotes, strikethrough and task lists.
pub(crate) fn render(text: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
