//! Source text, spans into it, and the line/column mapping used by the
//! (external) diagnostic renderer.

use std::fmt;
use std::rc::Rc;

/// A view into a source string: which buffer, and which byte range.
///
/// Cheap to clone (an `Rc` bump), so every token and AST node can carry its
/// own `Span` without borrowing from a lexer or parser that has since gone
/// out of scope. This is what lets the interpreter hold onto closures that
/// outlive the REPL fragment that defined them.
#[derive(Clone)]
pub struct Span {
    source: Rc<str>,
    offset: usize,
    len: usize,
}

impl Span {
    pub fn new(source: Rc<str>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= source.len());
        Self { source, offset, len }
    }

    /// A zero-length span at the end of `source`, used for EOF diagnostics.
    pub fn eof(source: Rc<str>) -> Self {
        let len = source.len();
        Self { source, offset: len, len: 0 }
    }

    pub fn text(&self) -> &str {
        &self.source[self.offset..self.offset + self.len]
    }

    pub fn source(&self) -> &Rc<str> {
        &self.source
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The span covering from the start of `self` to the end of `other`.
    /// Both must point into the same backing buffer.
    pub fn merge(&self, other: &Span) -> Span {
        debug_assert!(Rc::ptr_eq(&self.source, &other.source));
        let start = self.offset.min(other.offset);
        let end = (self.offset + self.len).max(other.offset + other.len);
        Span::new(Rc::clone(&self.source), start, end - start)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({:?}@{}..{})", self.text(), self.offset, self.offset + self.len)
    }
}

/// 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

/// A half-open `[start, end)` range of `Position`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Converts byte offsets within a source string into 1-based line/column
/// ranges. Precomputes line-end byte offsets at construction so repeated
/// lookups (one per diagnostic) are a binary search, not a full rescan.
pub struct SourceMap {
    source: Rc<str>,
    line_limits: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: Rc<str>) -> Self {
        let mut line_limits = Vec::new();
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_limits.push(i + 1);
            }
        }
        if line_limits.last().copied() != Some(source.len()) {
            line_limits.push(source.len());
        }
        Self { source, line_limits }
    }

    /// Maps a `Span` (which must point into this map's source) to a
    /// 1-based, end-exclusive line/column `Range`.
    pub fn span_to_range(&self, span: &Span) -> Range {
        debug_assert!(Rc::ptr_eq(&self.source, span.source()));
        let start = span.offset();
        let end = if span.is_empty() { start } else { start + span.len() - 1 };

        let find_line = |pos: usize| -> usize {
            for (i, &limit) in self.line_limits.iter().enumerate() {
                if pos < limit {
                    return i + 1;
                }
            }
            self.line_limits.len().max(1)
        };
        let find_col = |pos: usize, line: usize| -> usize {
            let line_start = if line > 1 { self.line_limits[line - 2] } else { 0 };
            pos - line_start + 1
        };

        let start_line = find_line(start);
        let start_col = find_col(start, start_line);
        let end_line = find_line(end);
        let end_col = find_col(end, end_line) + 1;

        Range {
            start: Position { line: start_line, col: start_col },
            end: Position { line: end_line, col: end_col },
        }
    }

    pub fn line(&self, line_num: usize) -> &str {
        debug_assert!(line_num >= 1 && line_num <= self.line_limits.len());
        let start = if line_num > 1 { self.line_limits[line_num - 2] } else { 0 };
        let end = self.line_limits[line_num - 1];
        self.source[start..end].trim_end_matches('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_of(source: &Rc<str>, offset: usize, len: usize) -> Span {
        Span::new(Rc::clone(source), offset, len)
    }

    #[test]
    fn single_line_span() {
        let src: Rc<str> = Rc::from("var x = 5;");
        let map = SourceMap::new(Rc::clone(&src));
        let span = span_of(&src, 4, 1); // "x"
        let range = map.span_to_range(&span);
        assert_eq!(range.start, Position { line: 1, col: 5 });
        assert_eq!(range.end, Position { line: 1, col: 6 });
    }

    #[test]
    fn multi_line_span() {
        let src: Rc<str> = Rc::from("var x = 1;\nvar y = 2;\n");
        let map = SourceMap::new(Rc::clone(&src));
        let span = span_of(&src, 15, 1); // "y" on line 2
        let range = map.span_to_range(&span);
        assert_eq!(range.start.line, 2);
        assert_eq!(range.start.col, 5);
    }

    #[test]
    fn line_text() {
        let src: Rc<str> = Rc::from("first\nsecond\nthird");
        let map = SourceMap::new(Rc::clone(&src));
        assert_eq!(map.line(1), "first");
        assert_eq!(map.line(2), "second");
        assert_eq!(map.line(3), "third");
    }
}
