//! Markdown to preview markup.

use std::fmt;
use std::rc::Rc;

use loom_editor_core::ATTACHMENT_PREFIX;
use loom_editor_core::ast::default_md_options;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// Rendered preview markup. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Markup(Rc<str>);

impl Markup {
    pub fn new(markup: impl Into<Rc<str>>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Markup {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Markup {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns document text into preview markup.
pub trait MarkupRenderer {
    fn render(&self, text: &str) -> Markup;
}

impl<F: Fn(&str) -> Markup> MarkupRenderer for F {
    fn render(&self, text: &str) -> Markup {
        self(text)
    }
}

/// CommonMark to HTML, resolving `attachment:` destinations.
#[derive(Debug, Clone, Copy)]
pub struct HtmlRenderer {
    options: Options,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            options: default_md_options(),
        }
    }
}

impl HtmlRenderer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl MarkupRenderer for HtmlRenderer {
    fn render(&self, text: &str) -> Markup {
        let parser = Parser::new_ext(text, self.options).map(resolve_attachment_links);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, parser);
        Markup::from(out)
    }
}

/// Point `attachment:` links and images at the bare attachment name, which
/// resolves against the attachment storage directory.
pub fn resolve_attachment_links(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: strip_attachment_prefix(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: strip_attachment_prefix(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn strip_attachment_prefix(dest: CowStr<'_>) -> CowStr<'_> {
    if let Some(name) = dest.strip_prefix(ATTACHMENT_PREFIX) {
        return CowStr::from(name.to_owned());
    }
    dest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        HtmlRenderer::default().render(text).to_string()
    }

    #[test]
    fn test_attachment_image_resolved() {
        assert_eq!(
            render("![cat](attachment:cat.png)"),
            "<p><img src=\"cat.png\" alt=\"cat\" /></p>\n"
        );
    }

    #[test]
    fn test_attachment_link_resolved() {
        assert_eq!(
            render("[doc](attachment:doc.pdf)"),
            "<p><a href=\"doc.pdf\">doc</a></p>\n"
        );
    }

    #[test]
    fn test_other_links_untouched() {
        assert_eq!(
            render("[site](https://example.com)"),
            "<p><a href=\"https://example.com\">site</a></p>\n"
        );
    }

    #[test]
    fn test_empty_text_renders_empty() {
        assert!(HtmlRenderer::default().render("").is_empty());
    }

    #[test]
    fn test_closure_renderer() {
        let renderer = |text: &str| Markup::from(text.to_uppercase());
        assert_eq!(renderer.render("abc").as_str(), "ABC");
    }
}
