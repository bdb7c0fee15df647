//! Offset/line/column mapping over an in-memory source buffer.

use crate::compiler::tokens::Span;

/// Default display name used in tracebacks.
pub const STDIN_NAME: &str = "<stdin>";

/// Maps byte offsets to `(line, column)` positions and back.
///
/// Columns are counted in chars, matching the spans produced by the
/// tokenizer.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    text: String,
    name: String,
    line_starts: Vec<usize>,
}

impl SourceIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text: text.to_string(), name: STDIN_NAME.to_string(), line_starts }
    }

    /// Replace the name shown in `File "..."` traceback lines.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. The offset one past the end is valid and
    /// maps to the end of the last line.
    pub fn line_col(&self, offset: usize) -> Option<(usize, usize)> {
        if offset > self.text.len() || !self.text.is_char_boundary(offset) {
            return None;
        }
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line_idx];
        Some((line_idx + 1, self.text[start..offset].chars().count()))
    }

    /// Byte offset of a `(line, column)` position.
    pub fn offset(&self, line: usize, col: usize) -> Option<usize> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let raw = self.raw_line(line)?;
        if col == 0 {
            return Some(start);
        }
        let mut chars = raw.char_indices().map(|(i, _)| i).chain(std::iter::once(raw.len()));
        chars.nth(col).map(|i| start + i)
    }

    /// Source covered by a span.
    pub fn slice(&self, span: Span) -> Option<&str> {
        let start = self.offset(span.start_line, span.start_col)?;
        let end = self.offset(span.end_line, span.end_col)?;
        self.text.get(start..end)
    }

    /// Text of a 1-based line with surrounding whitespace removed.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.raw_line(line).map(str::trim)
    }

    /// Count of leading whitespace chars that `line_text` strips.
    pub fn leading_trimmed(&self, line: usize) -> usize {
        self.raw_line(line)
            .map(|raw| raw.chars().take_while(|c| c.is_whitespace()).count())
            .unwrap_or(0)
    }

    /// Line content including the terminating newline, if any.
    fn raw_line(&self, line: usize) -> Option<&str> {
        let idx = line.checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = self.line_starts.get(idx + 1).copied().unwrap_or(self.text.len());
        Some(&self.text[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_positions() {
        let src = SourceIndex::new("ab\ncd\n");
        assert_eq!(src.line_col(0), Some((1, 0)));
        assert_eq!(src.line_col(2), Some((1, 2)));
        assert_eq!(src.line_col(3), Some((2, 0)));
        assert_eq!(src.line_col(6), Some((3, 0)));
        assert_eq!(src.line_col(7), None);
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn columns_count_chars_not_bytes() {
        let src = SourceIndex::new("名字 = 1");
        assert_eq!(src.line_col("名字".len()), Some((1, 2)));
        assert_eq!(src.offset(1, 2), Some("名字".len()));
        assert_eq!(src.line_col(1), None);
    }

    #[test]
    fn slices_multi_line_spans() {
        let src = SourceIndex::new("x = '''a\nb'''\n");
        assert_eq!(src.slice(Span::new(1, 4, 2, 4)), Some("'''a\nb'''"));
        assert_eq!(src.slice(Span::new(2, 4, 3, 0)), Some("\n"));
    }

    #[test]
    fn line_text_is_trimmed() {
        let src = SourceIndex::new("a\n    print(1)   \n");
        assert_eq!(src.line_text(2), Some("print(1)"));
        assert_eq!(src.leading_trimmed(2), 4);
        assert_eq!(src.line_text(3), Some(""));
        assert_eq!(src.line_text(0), None);
        assert_eq!(src.line_text(4), None);
    }

    #[test]
    fn default_name_is_stdin() {
        assert_eq!(SourceIndex::new("").name(), "<stdin>");
        assert_eq!(SourceIndex::new("").with_name("main.py").name(), "main.py");
    }
}
