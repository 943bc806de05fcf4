//! Base syntax highlighting.
//!
//! Base spans are a pure function of the syntax tree. Precedence is the node's
//! depth, so an emphasis inside a heading outranks the heading.

use smol_str::SmolStr;

use crate::ast::{Ast, AstNode, NodeKind};
use crate::options::EditorOptions;
use crate::syntax::{OVERLAY_PRECEDENCE, Span, SpanKind};

/// Marker glyphs the user prefers when the editor writes markdown itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub emphasis: SmolStr,
    pub strong: SmolStr,
    pub bullet: SmolStr,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            emphasis: SmolStr::new_static("_"),
            strong: SmolStr::new_static("**"),
            bullet: SmolStr::new_static("-"),
        }
    }
}

/// Derives base style spans from a syntax tree.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    markers: Markers,
}

impl Highlighter {
    pub fn new(markers: Markers) -> Self {
        Self { markers }
    }

    pub fn from_options(options: &EditorOptions) -> Self {
        Self::new(options.markers())
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Compute base spans for `ast`, which must be the parse of `text`.
    pub fn base_spans(&self, ast: &Ast, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        ast.walk(&mut |node, depth| {
            if let Some(span) = node_span(node, depth, text) {
                spans.push(span);
            }
        });
        spans
    }
}

fn node_span(node: &AstNode, depth: usize, text: &str) -> Option<Span> {
    // Base spans never reach overlay precedence, however deep the tree.
    let precedence = depth.min(OVERLAY_PRECEDENCE as usize - 1) as u32;
    let kind = match &node.kind {
        NodeKind::Heading(level) => SpanKind::Heading(*level),
        NodeKind::Emphasis => SpanKind::Emphasis,
        NodeKind::Strong => SpanKind::Strong,
        NodeKind::Strikethrough => SpanKind::Strikethrough,
        NodeKind::Code => SpanKind::Code,
        NodeKind::CodeBlock => SpanKind::CodeBlock,
        NodeKind::BlockQuote => SpanKind::BlockQuote,
        NodeKind::Link { .. } => SpanKind::Link,
        NodeKind::Image { .. } => SpanKind::Image,
        NodeKind::Html | NodeKind::HtmlBlock => SpanKind::Html,
        NodeKind::Rule => SpanKind::Rule,
        NodeKind::Table => SpanKind::Table,
        NodeKind::FootnoteDefinition => SpanKind::FootnoteDefinition,
        NodeKind::Math => SpanKind::Math,
        NodeKind::Item => {
            return Span::new(list_marker_range(node, text)?, SpanKind::ListMarker, precedence);
        }
        _ => return None,
    };
    Span::new(node.range.clone(), kind, precedence)
}

/// Range of the bullet or number that opens a list item.
fn list_marker_range(item: &AstNode, text: &str) -> Option<std::ops::Range<usize>> {
    let source = text.get(item.range.clone())?;
    let len = source.find(char::is_whitespace).unwrap_or(source.len());
    Some(item.range.start..item.range.start + len)
}
