//! Markdown syntax tree.
//!
//! The grammar itself belongs to the parser; this module only defines the
//! owned tree the rest of the editor works with and the [`MarkdownParser`]
//! seam. [`CmarkParser`] builds the tree from pulldown-cmark's offset
//! event stream.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};
use smol_str::SmolStr;

/// Kind of a syntax tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    /// Heading with level 1-6.
    Heading(u8),
    BlockQuote,
    CodeBlock,
    HtmlBlock,
    List { ordered: bool },
    Item,
    Table,
    TableHead,
    TableRow,
    TableCell,
    FootnoteDefinition,
    Emphasis,
    Strong,
    Strikethrough,
    Link { dest: SmolStr },
    Image { dest: SmolStr },
    Text,
    Code,
    Html,
    Math,
    FootnoteReference,
    SoftBreak,
    HardBreak,
    Rule,
    TaskMarker { checked: bool },
    /// Constructs the editor has no use for (metadata blocks, definition lists).
    Other,
}

/// A node covering a byte range of the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: NodeKind,
    /// Byte range in the source text.
    pub range: Range<usize>,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn new(kind: NodeKind, range: Range<usize>) -> Self {
        Self {
            kind,
            range,
            children: Vec::new(),
        }
    }

    /// Depth-first pre-order walk. The callback receives each node and its
    /// depth (the node itself is depth 0).
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a AstNode, usize)) {
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            f(node, depth);
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }
}

/// Parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    root: AstNode,
}

impl Ast {
    /// An empty but valid document.
    pub fn empty() -> Self {
        Self {
            root: AstNode::new(NodeKind::Document, 0..0),
        }
    }

    pub fn from_root(root: AstNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &AstNode {
        &self.root
    }

    /// True when the document has no content nodes.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Total number of nodes including the document root.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.walk(&mut |_, _| count += 1);
        count
    }

    /// Walk every node with its depth below the root.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a AstNode, usize)) {
        self.root.walk(f);
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::empty()
    }
}

/// Turns text into a syntax tree.
///
/// Parsing is total: malformed input degrades to a best-effort tree and an
/// empty string yields [`Ast::empty`].
pub trait MarkdownParser {
    fn parse(&self, text: &str) -> Ast;
}

/// Deepest node the tree keeps. Constructs nested further are folded into
/// their ancestor at this depth: their children still appear, one level up.
pub const MAX_NESTING: usize = 256;

/// CommonMark parser backed by pulldown-cmark.
#[derive(Debug, Clone, Copy)]
pub struct CmarkParser {
    options: Options,
}

impl Default for CmarkParser {
    fn default() -> Self {
        Self {
            options: default_md_options(),
        }
    }
}

/// Markdown extensions enabled for editing and preview.
pub fn default_md_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

impl CmarkParser {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> Options {
        self.options
    }
}

impl MarkdownParser for CmarkParser {
    fn parse(&self, text: &str) -> Ast {
        if text.is_empty() {
            return Ast::empty();
        }

        let mut stack = vec![AstNode::new(NodeKind::Document, 0..text.len())];
        // Open containers beyond MAX_NESTING that were not given a node.
        let mut folded = 0usize;

        for (event, range) in Parser::new_ext(text, self.options).into_offset_iter() {
            match event {
                Event::Start(_) if stack.len() >= MAX_NESTING => folded += 1,
                Event::Start(tag) => stack.push(AstNode::new(tag_kind(&tag), range)),
                Event::End(_) if folded > 0 => folded -= 1,
                Event::End(_) => close_top(&mut stack),
                leaf => {
                    let node = AstNode::new(leaf_kind(&leaf), range);
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
            }
        }

        // Unbalanced streams should not happen, but never lose what was built.
        while stack.len() > 1 {
            close_top(&mut stack);
        }

        let root = stack
            .pop()
            .unwrap_or_else(|| AstNode::new(NodeKind::Document, 0..text.len()));
        tracing::trace!(target: "loom::pipeline", folded, "syntax tree built");
        Ast::from_root(root)
    }
}

fn close_top(stack: &mut Vec<AstNode>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(node) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(node);
        }
    }
}

fn tag_kind(tag: &Tag<'_>) -> NodeKind {
    match tag {
        Tag::Paragraph => NodeKind::Paragraph,
        Tag::Heading { level, .. } => NodeKind::Heading(*level as u8),
        Tag::BlockQuote(_) => NodeKind::BlockQuote,
        Tag::CodeBlock(_) => NodeKind::CodeBlock,
        Tag::HtmlBlock => NodeKind::HtmlBlock,
        Tag::List(start) => NodeKind::List {
            ordered: start.is_some(),
        },
        Tag::Item => NodeKind::Item,
        Tag::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
        Tag::Table(_) => NodeKind::Table,
        Tag::TableHead => NodeKind::TableHead,
        Tag::TableRow => NodeKind::TableRow,
        Tag::TableCell => NodeKind::TableCell,
        Tag::Emphasis => NodeKind::Emphasis,
        Tag::Strong => NodeKind::Strong,
        Tag::Strikethrough => NodeKind::Strikethrough,
        Tag::Link { dest_url, .. } => NodeKind::Link {
            dest: SmolStr::new(dest_url.as_ref()),
        },
        Tag::Image { dest_url, .. } => NodeKind::Image {
            dest: SmolStr::new(dest_url.as_ref()),
        },
        _ => NodeKind::Other,
    }
}

fn leaf_kind(event: &Event<'_>) -> NodeKind {
    match event {
        Event::Text(_) => NodeKind::Text,
        Event::Code(_) => NodeKind::Code,
        Event::Html(_) | Event::InlineHtml(_) => NodeKind::Html,
        Event::InlineMath(_) | Event::DisplayMath(_) => NodeKind::Math,
        Event::FootnoteReference(_) => NodeKind::FootnoteReference,
        Event::SoftBreak => NodeKind::SoftBreak,
        Event::HardBreak => NodeKind::HardBreak,
        Event::Rule => NodeKind::Rule,
        Event::TaskListMarker(checked) => NodeKind::TaskMarker { checked: *checked },
        _ => NodeKind::Other,
    }
}
