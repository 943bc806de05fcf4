//! Style spans and two-layer composition.
//!
//! Base spans come from the syntax tree, overlay spans from transient sources
//! such as find hits. The layers are kept apart: an overlay wins wherever it
//! covers text, but the base spans stay underneath and reappear untouched once
//! the overlay goes away.

use std::ops::Range;

/// Style tag carried by a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpanKind {
    /// Heading with level 1-6.
    Heading(u8),
    Emphasis,
    Strong,
    Strikethrough,
    Code,
    CodeBlock,
    BlockQuote,
    Link,
    Image,
    Html,
    Rule,
    ListMarker,
    Table,
    FootnoteDefinition,
    Math,
    /// A find hit.
    Hit,
    /// The find hit the user is on.
    HitActive,
}

impl SpanKind {
    /// Style class name for rendering surfaces.
    pub fn class_name(&self) -> &'static str {
        match self {
            SpanKind::Heading(1) => "h1",
            SpanKind::Heading(2) => "h2",
            SpanKind::Heading(3) => "h3",
            SpanKind::Heading(4) => "h4",
            SpanKind::Heading(5) => "h5",
            SpanKind::Heading(_) => "h6",
            SpanKind::Emphasis => "em",
            SpanKind::Strong => "strong",
            SpanKind::Strikethrough => "del",
            SpanKind::Code => "code",
            SpanKind::CodeBlock => "pre",
            SpanKind::BlockQuote => "blockquote",
            SpanKind::Link => "a",
            SpanKind::Image => "img",
            SpanKind::Html => "html",
            SpanKind::Rule => "hr",
            SpanKind::ListMarker => "li",
            SpanKind::Table => "table",
            SpanKind::FootnoteDefinition => "footnote",
            SpanKind::Math => "math",
            SpanKind::Hit => "hit",
            SpanKind::HitActive => "hit-active",
        }
    }
}

/// Precedence of plain overlay spans. Every base span ranks below it.
pub const OVERLAY_PRECEDENCE: u32 = 1 << 16;

/// A styled half-open byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    pub kind: SpanKind,
    pub precedence: u32,
}

impl Span {
    /// Create a span. Empty ranges have nothing to style and yield `None`.
    pub fn new(range: Range<usize>, kind: SpanKind, precedence: u32) -> Option<Self> {
        (range.end > range.start).then_some(Self {
            range,
            kind,
            precedence,
        })
    }

    /// Check if the span covers a byte offset.
    pub fn covers(&self, offset: usize) -> bool {
        self.range.contains(&offset)
    }
}

/// A maximal stretch of text with one stack of styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: Range<usize>,
    /// Kinds covering the run, lowest precedence first.
    pub kinds: Vec<SpanKind>,
}

impl StyleRun {
    /// The kind that wins for rendering.
    pub fn top(&self) -> Option<SpanKind> {
        self.kinds.last().copied()
    }
}

/// Base and overlay spans for one document state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSpans {
    base: Vec<Span>,
    overlay: Vec<Span>,
}

impl StyleSpans {
    pub fn new(mut base: Vec<Span>, mut overlay: Vec<Span>) -> Self {
        base.sort_by_key(|s| (s.range.start, s.precedence));
        overlay.sort_by_key(|s| (s.range.start, s.precedence));
        Self { base, overlay }
    }

    /// Spans derived from the syntax tree.
    pub fn base(&self) -> &[Span] {
        &self.base
    }

    /// Spans composed on top of the base layer.
    pub fn overlay(&self) -> &[Span] {
        &self.overlay
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.overlay.is_empty()
    }

    /// Same base layer with a different overlay.
    pub fn with_overlay(&self, overlay: Vec<Span>) -> Self {
        Self::new(self.base.clone(), overlay)
    }

    /// Iterate both layers, base first.
    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.base.iter().chain(self.overlay.iter())
    }

    /// The winning style at a byte offset.
    ///
    /// Highest precedence wins; among equals the later span wins.
    pub fn style_at(&self, offset: usize) -> Option<SpanKind> {
        self.iter()
            .filter(|s| s.covers(offset))
            .max_by_key(|s| s.precedence)
            .map(|s| s.kind)
    }

    /// Every style covering a byte offset, lowest precedence first.
    pub fn styles_at(&self, offset: usize) -> Vec<SpanKind> {
        let mut covering: Vec<&Span> = self.iter().filter(|s| s.covers(offset)).collect();
        covering.sort_by_key(|s| s.precedence);
        covering.into_iter().map(|s| s.kind).collect()
    }

    /// Split `0..len` into runs that each carry one style stack.
    ///
    /// Adjacent runs with identical stacks are merged. Unstyled stretches
    /// produce runs with no kinds so the runs always tile the text.
    pub fn runs(&self, len: usize) -> Vec<StyleRun> {
        let mut bounds: Vec<usize> = vec![0, len];
        for span in self.iter() {
            bounds.push(span.range.start.min(len));
            bounds.push(span.range.end.min(len));
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut runs: Vec<StyleRun> = Vec::new();
        for pair in bounds.windows(2) {
            let range = pair[0]..pair[1];
            if range.is_empty() {
                continue;
            }
            let kinds = self.styles_at(range.start);
            match runs.last_mut() {
                Some(prev) if prev.kinds == kinds => prev.range.end = range.end,
                _ => runs.push(StyleRun { range, kinds }),
            }
        }
        runs
    }
}
