//! Source positions and positioned-error minting.
//!
//! Parse-tree nodes carry byte-offset [`Span`]s; nothing in the
//! pipeline tracks lines directly. [`SourceText`] holds one file's
//! identity and newline layout and is the only place a span is ever
//! turned into the `(file, line, column)` triple of a [`SourceError`].

use serde::Serialize;

use crate::error::SourceError;

/// Byte-offset span into source text. Start is inclusive, end is
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// The zero-width span at offset 0, used for synthesized nodes.
    pub fn zero() -> Self {
        Self { start: 0, end: 0 }
    }
}

/// One source file's name and line layout.
///
/// Built once per compilation unit by whoever needs to report against
/// it (the analyzer per unit, the transformer per run). Every semantic
/// error with a span goes through [`SourceText::error_at`]; errors with
/// no span bypass this type entirely via `SourceError::bare`.
pub struct SourceText {
    name: String,
    /// Byte offset of each line start. The first entry is always 0, so
    /// every offset falls on some line.
    line_starts: Vec<u32>,
}

impl SourceText {
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        SourceText {
            name: name.into(),
            line_starts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The 1-based (line, column) of a byte offset. Column counts bytes
    /// from the start of the line.
    pub fn position(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let line = line_idx as u32 + 1;
        let column = offset - self.line_starts[line_idx] + 1;
        (line, column)
    }

    /// A semantic error positioned at the start of `span`.
    pub fn error_at(&self, span: Span, message: impl Into<String>) -> SourceError {
        let (line, column) = self.position(span.start);
        SourceError::semantic(&self.name, line, column, message)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_maps_offsets_to_lines() {
        let text = SourceText::new("main.gala", "val x = 1\nx = 2\n");
        assert_eq!(text.position(0), (1, 1));
        assert_eq!(text.position(10), (2, 1));
        assert_eq!(text.position(14), (2, 5));
        assert_eq!(text.line_count(), 3);
    }

    #[test]
    fn position_of_newline_stays_on_its_line() {
        let text = SourceText::new("a.gala", "ab\ncd");
        assert_eq!(text.position(2), (1, 3));
        assert_eq!(text.position(3), (2, 1));
    }

    #[test]
    fn error_at_carries_file_and_position() {
        let text = SourceText::new("main.gala", "val x = ghost\n");
        let err = text.error_at(Span::new(8, 13), "unknown variable ghost");
        assert_eq!(err.to_string(), "main.gala:1:9: unknown variable ghost");
    }

    #[test]
    fn empty_text_still_positions() {
        let text = SourceText::new("m.gala", "");
        assert_eq!(text.position(Span::zero().start), (1, 1));
    }
}
