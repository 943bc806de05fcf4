//! Find/replace hits as an overlay layer.

use std::ops::Range;

use regex::{Regex, RegexBuilder};

use crate::error::FindError;
use crate::syntax::{OVERLAY_PRECEDENCE, Span, SpanKind};

/// What the user is searching for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FindQuery {
    pub pattern: String,
    pub match_case: bool,
    /// Treat `pattern` as a regular expression.
    pub regex: bool,
}

impl FindQuery {
    /// Case-insensitive literal search.
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    fn matcher(&self) -> Result<Regex, FindError> {
        let source = if self.regex {
            self.pattern.clone()
        } else {
            regex::escape(&self.pattern)
        };
        RegexBuilder::new(&source)
            .case_insensitive(!self.match_case)
            .multi_line(true)
            .build()
            .map_err(|source| FindError::InvalidPattern {
                pattern: self.pattern.clone(),
                source,
            })
    }
}

/// Active query with its hits in the current text.
#[derive(Debug, Clone)]
pub struct FindState {
    query: FindQuery,
    matcher: Regex,
    hits: Vec<Range<usize>>,
    active: Option<usize>,
}

impl FindState {
    /// Compile `query` and search `text`. The first hit becomes active.
    pub fn new(query: FindQuery, text: &str) -> Result<Self, FindError> {
        let matcher = query.matcher()?;
        let mut state = Self {
            query,
            matcher,
            hits: Vec::new(),
            active: None,
        };
        state.text_changed(text);
        state.active = if state.hits.is_empty() { None } else { Some(0) };
        Ok(state)
    }

    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    /// Byte ranges of all hits in document order.
    pub fn hits(&self) -> &[Range<usize>] {
        &self.hits
    }

    pub fn has_hits(&self) -> bool {
        !self.hits.is_empty()
    }

    /// Index of the active hit.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn active_hit(&self) -> Option<Range<usize>> {
        self.active.and_then(|i| self.hits.get(i).cloned())
    }

    /// Re-run the query against new text, keeping the active index in range.
    pub fn text_changed(&mut self, text: &str) {
        self.hits = self
            .matcher
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
            .collect();
        self.active = match (self.active, self.hits.len()) {
            (_, 0) => None,
            (Some(i), n) => Some(i.min(n - 1)),
            (None, _) => Some(0),
        };
    }

    /// Move to the next hit, wrapping around.
    pub fn find_next(&mut self) -> Option<Range<usize>> {
        let n = self.hits.len();
        if n == 0 {
            return None;
        }
        self.active = Some(self.active.map_or(0, |i| (i + 1) % n));
        self.active_hit()
    }

    /// Move to the previous hit, wrapping around.
    pub fn find_previous(&mut self) -> Option<Range<usize>> {
        let n = self.hits.len();
        if n == 0 {
            return None;
        }
        self.active = Some(self.active.map_or(n - 1, |i| (i + n - 1) % n));
        self.active_hit()
    }

    /// Overlay spans: every hit, plus the active hit ranked above them.
    pub fn overlay_spans(&self) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .hits
            .iter()
            .filter_map(|r| Span::new(r.clone(), SpanKind::Hit, OVERLAY_PRECEDENCE))
            .collect();
        if let Some(active) = self.active_hit() {
            spans.extend(Span::new(active, SpanKind::HitActive, OVERLAY_PRECEDENCE + 1));
        }
        spans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_case_insensitive() {
        let state = FindState::new(FindQuery::literal("ab"), "ab Ab aB x").unwrap();
        assert_eq!(state.hits(), &[0..2, 3..5, 6..8]);
        assert_eq!(state.active(), Some(0));
    }

    #[test]
    fn test_literal_escapes_regex_chars() {
        let state = FindState::new(FindQuery::literal("a.b"), "axb a.b").unwrap();
        assert_eq!(state.hits(), &[4..7]);
    }

    #[test]
    fn test_invalid_regex() {
        let query = FindQuery {
            pattern: "(".into(),
            regex: true,
            ..Default::default()
        };
        assert!(matches!(
            FindState::new(query, "text"),
            Err(FindError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_active_clamped_on_text_change() {
        let mut state = FindState::new(FindQuery::literal("x"), "x x x").unwrap();
        state.find_next();
        state.find_next();
        assert_eq!(state.active(), Some(2));

        state.text_changed("x x");
        assert_eq!(state.active(), Some(1));

        state.text_changed("none");
        assert_eq!(state.active(), None);
        assert!(state.overlay_spans().is_empty());
    }

    #[test]
    fn test_navigation_wraps() {
        let mut state = FindState::new(FindQuery::literal("x"), "x x").unwrap();
        assert_eq!(state.find_next(), Some(2..3));
        assert_eq!(state.find_next(), Some(0..1));
        assert_eq!(state.find_previous(), Some(2..3));
    }

    #[test]
    fn test_overlay_spans() {
        let state = FindState::new(FindQuery::literal("x"), "x x").unwrap();
        let kinds: Vec<(Range<usize>, SpanKind)> = state
            .overlay_spans()
            .into_iter()
            .map(|s| (s.range, s.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (0..1, SpanKind::Hit),
                (2..3, SpanKind::Hit),
                (0..1, SpanKind::HitActive),
            ]
        );
    }
}
