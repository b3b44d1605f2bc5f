//! Ariadne-based rendering of source errors.
//!
//! Turns a [`SourceError`] into a formatted, labeled report against the
//! original source text. Callers that only want the terse one-line form
//! use the error's `Display` impl instead.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::SourceError;

/// Render an error as a labeled ariadne report over `source`.
///
/// The error's (line, column) is mapped back to a byte offset; errors
/// without position information are anchored to the start of the file.
pub fn render_error(err: &SourceError, source: &str) -> String {
    let offset = if err.has_position() {
        offset_of(source, err.line, err.column)
    } else {
        0
    };
    let end = (offset + 1).min(source.len().max(1));
    let range = offset..end;

    let config = Config::default().with_color(false);
    let report = Report::build(ReportKind::Error, range.clone())
        .with_message(&err.message)
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(&err.message)
                .with_color(Color::Red),
        )
        .finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Convert a 1-based (line, column) back into a byte offset.
fn offset_of(source: &str, line: u32, column: u32) -> usize {
    let mut offset = 0usize;
    for (i, l) in source.split('\n').enumerate() {
        if (i as u32) + 1 == line {
            break;
        }
        offset += l.len() + 1;
    }
    (offset + column.saturating_sub(1) as usize).min(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;

    #[test]
    fn render_contains_message() {
        let src = "val x = 1\nx = 2\n";
        let err = SourceError::semantic("main.gala", 2, 1, "cannot assign to immutable variable x");
        let out = render_error(&err, src);
        assert!(out.contains("cannot assign to immutable variable x"));
    }

    #[test]
    fn render_bare_error_anchors_to_start() {
        let err = SourceError::bare("unknown variable y");
        let out = render_error(&err, "y + 1\n");
        assert!(out.contains("unknown variable y"));
    }
}
