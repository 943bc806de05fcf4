//! User options consumed by the editor.
//!
//! Font settings only affect how a surface draws text. The line separator
//! default and the marker glyphs feed the editor itself. Where options are
//! persisted is up to the host; the type is serde-friendly so any format works.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::highlight::Markers;
use crate::types::LineSeparator;

pub const DEFAULT_FONT_SIZE: u8 = 12;
pub const MIN_FONT_SIZE: u8 = 8;
pub const MAX_FONT_SIZE: u8 = 36;
pub const DEFAULT_FONT_FAMILY: &str = "Monospaced";

/// Editor options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    pub font_family: SmolStr,
    /// Point size, always within [`MIN_FONT_SIZE`]..=[`MAX_FONT_SIZE`] once normalized.
    pub font_size: u8,
    /// Separator used for text that contains no newline yet.
    pub line_separator_default: LineSeparator,
    pub emphasis_marker: SmolStr,
    pub strong_emphasis_marker: SmolStr,
    pub bullet_list_marker: SmolStr,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            font_family: SmolStr::new_static(DEFAULT_FONT_FAMILY),
            font_size: DEFAULT_FONT_SIZE,
            line_separator_default: LineSeparator::Lf,
            emphasis_marker: SmolStr::new_static("_"),
            strong_emphasis_marker: SmolStr::new_static("**"),
            bullet_list_marker: SmolStr::new_static("-"),
        }
    }
}

impl EditorOptions {
    /// Defaults overlaid with environment variables.
    ///
    /// - `LOOM_FONT_FAMILY`: font family name
    /// - `LOOM_FONT_SIZE`: integer point size (clamped)
    /// - `LOOM_LINE_SEPARATOR`: `lf` or `crlf`
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(family) = lookup("LOOM_FONT_FAMILY").filter(|f| !f.trim().is_empty()) {
            options.font_family = SmolStr::new(family.trim());
        }
        if let Some(size) = lookup("LOOM_FONT_SIZE") {
            match size.trim().parse::<i64>() {
                Ok(size) => options.set_font_size(size),
                Err(_) => tracing::warn!(
                    target: "loom::options",
                    value = %size,
                    "ignoring invalid LOOM_FONT_SIZE"
                ),
            }
        }
        if let Some(sep) = lookup("LOOM_LINE_SEPARATOR") {
            match LineSeparator::from_name(&sep) {
                Some(sep) => options.line_separator_default = sep,
                None => tracing::warn!(
                    target: "loom::options",
                    value = %sep,
                    "ignoring invalid LOOM_LINE_SEPARATOR"
                ),
            }
        }
        options
    }

    /// Set the font size, clamped to the supported range.
    pub fn set_font_size(&mut self, size: i64) {
        self.font_size = size.clamp(MIN_FONT_SIZE as i64, MAX_FONT_SIZE as i64) as u8;
    }

    pub fn increase_font_size(&mut self) {
        self.set_font_size(self.font_size as i64 + 1);
    }

    pub fn decrease_font_size(&mut self) {
        self.set_font_size(self.font_size as i64 - 1);
    }

    pub fn reset_font_size(&mut self) {
        self.font_size = DEFAULT_FONT_SIZE;
    }

    /// Copy with out-of-range values pulled back into range.
    ///
    /// Deserialized options bypass the setters, so hosts should normalize
    /// after loading.
    pub fn normalized(mut self) -> Self {
        self.set_font_size(self.font_size as i64);
        if self.font_family.trim().is_empty() {
            self.font_family = SmolStr::new_static(DEFAULT_FONT_FAMILY);
        }
        self
    }

    /// Marker glyphs for the highlighter and smart edits.
    pub fn markers(&self) -> Markers {
        Markers {
            emphasis: self.emphasis_marker.clone(),
            strong: self.strong_emphasis_marker.clone(),
            bullet: self.bullet_list_marker.clone(),
        }
    }
}
