//! The rich-text editor the daemons read from and format.
//!
//! Offsets and lengths are in characters. The daemons only need a text buffer
//! with a selection and inline formatting, so that is all `Editor` exposes.
//! Browser editors count UTF-16 code units instead; the `utf16` helpers
//! translate at that boundary.

use serde::{Deserialize, Serialize};
use std::mem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub index: usize,
    pub length: usize,
}

impl SelectionRange {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    /// An empty selection stands for the whole document.
    pub fn widen_if_empty(self, document_length: usize) -> Self {
        if self.length == 0 {
            Self::new(0, document_length)
        } else {
            self
        }
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Reads a range given in UTF-16 code units of `text` as character offsets.
    pub fn utf16_to_chars(self, text: &str) -> Self {
        let start = char_offset_from_utf16(text, self.index);
        let end = char_offset_from_utf16(text, self.end());
        Self::new(start, end - start)
    }

    /// Expresses a character range of `text` in UTF-16 code units.
    pub fn chars_to_utf16(self, text: &str) -> Self {
        let start = utf16_offset(text, self.index);
        let end = utf16_offset(text, self.end());
        Self::new(start, end - start)
    }
}

/// Character offset of the UTF-16 position `offset`. A position inside a
/// surrogate pair rounds up to the next character.
pub fn char_offset_from_utf16(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        if units >= offset {
            return index;
        }
        units += c.len_utf16();
    }
    text.chars().count()
}

/// UTF-16 position of the character offset `index`.
pub fn utf16_offset(text: &str, index: usize) -> usize {
    text.chars().take(index).map(char::len_utf16).sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "attribute", content = "value", rename_all = "lowercase")]
pub enum Format {
    Background(String),
    Color(String),
    Bold(bool),
}

impl Format {
    /// White-on-red bold used to point at a challenged sentence.
    pub fn emphasis() -> [Format; 3] {
        [
            Format::Background("red".to_string()),
            Format::Color("white".to_string()),
            Format::Bold(true),
        ]
    }

    /// Yellow highlight over a span that is being rewritten.
    pub fn rewrite_highlight() -> [Format; 3] {
        [
            Format::Background("yellow".to_string()),
            Format::Color("black".to_string()),
            Format::Bold(true),
        ]
    }

    /// Plain text appearance.
    pub fn plain() -> [Format; 3] {
        [
            Format::Background("white".to_string()),
            Format::Color("black".to_string()),
            Format::Bold(false),
        ]
    }
}

pub trait Editor {
    fn selection(&self) -> SelectionRange;
    fn text(&self, index: usize, length: usize) -> String;
    fn length(&self) -> usize;
    fn set_selection(&mut self, index: usize, length: usize);
    /// Applies `format` to the current selection.
    fn format(&mut self, format: Format);
    fn delete_text(&mut self, index: usize, length: usize);
    fn insert_text(&mut self, index: usize, text: &str);

    /// Selects `range` and applies every format in `formats` to it.
    fn format_range(&mut self, range: SelectionRange, formats: &[Format]) {
        self.set_selection(range.index, range.length);
        for format in formats {
            self.format(format.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpan {
    pub range: SelectionRange,
    pub format: Format,
}

/// Resolved formatting of a single character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharFormat {
    pub background: Option<String>,
    pub color: Option<String>,
    pub bold: bool,
}

/// In-memory editor buffer. Formats are kept as an ordered list of spans,
/// later spans win.
#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    selection: SelectionRange,
    spans: Vec<FormatSpan>,
}

impl Document {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            selection: SelectionRange::default(),
            spans: Vec::new(),
        }
    }

    pub fn contents(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[FormatSpan] {
        &self.spans
    }

    /// Replaces the buffer wholesale, dropping formatting.
    pub fn reset(&mut self, text: &str, selection: SelectionRange) {
        self.text = text.to_string();
        self.spans.clear();
        self.selection = self.clamp(selection.index, selection.length);
    }

    pub fn format_at(&self, index: usize) -> CharFormat {
        let mut resolved = CharFormat::default();
        for span in &self.spans {
            if index < span.range.index || index >= span.range.end() {
                continue;
            }
            match &span.format {
                Format::Background(value) => resolved.background = Some(value.clone()),
                Format::Color(value) => resolved.color = Some(value.clone()),
                Format::Bold(value) => resolved.bold = *value,
            }
        }
        resolved
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, index: usize) -> usize {
        self.text
            .char_indices()
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.text.len())
    }

    fn clamp(&self, index: usize, length: usize) -> SelectionRange {
        let total = self.char_count();
        let index = index.min(total);
        SelectionRange::new(index, length.min(total - index))
    }
}

impl Editor for Document {
    fn selection(&self) -> SelectionRange {
        self.selection
    }

    fn text(&self, index: usize, length: usize) -> String {
        self.text.chars().skip(index).take(length).collect()
    }

    fn length(&self) -> usize {
        self.char_count()
    }

    fn set_selection(&mut self, index: usize, length: usize) {
        self.selection = self.clamp(index, length);
    }

    fn format(&mut self, format: Format) {
        if self.selection.length == 0 {
            return;
        }
        let covered = self.selection;
        self.spans.retain(|span| {
            mem::discriminant(&span.format) != mem::discriminant(&format)
                || span.range.index < covered.index
                || span.range.end() > covered.end()
        });
        self.spans.push(FormatSpan {
            range: self.selection,
            format,
        });
    }

    fn delete_text(&mut self, index: usize, length: usize) {
        let range = self.clamp(index, length);
        let start = self.byte_offset(range.index);
        let end = self.byte_offset(range.end());
        self.text.replace_range(start..end, "");

        let shift = |offset: usize| {
            if offset >= range.end() {
                offset - range.length
            } else if offset > range.index {
                range.index
            } else {
                offset
            }
        };
        self.spans.retain_mut(|span| {
            let start = shift(span.range.index);
            let end = shift(span.range.end());
            span.range = SelectionRange::new(start, end - start);
            span.range.length > 0
        });
        self.selection = self.clamp(self.selection.index, self.selection.length);
    }

    fn insert_text(&mut self, index: usize, text: &str) {
        let index = index.min(self.char_count());
        let offset = self.byte_offset(index);
        self.text.insert_str(offset, text);

        let inserted = text.chars().count();
        for span in &mut self.spans {
            if span.range.index >= index {
                span.range.index += inserted;
            } else if span.range.end() > index {
                span.range.length += inserted;
            }
        }
    }
}
