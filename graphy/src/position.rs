//! Source positions and spanned values, shared by the lexer, parser and AST.

use std::cmp::Ordering;

/// A zero-based line/column/offset position in a GraphQL document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SourcePosition {
    index: usize,
    line: usize,
    column: usize,
}

impl SourcePosition {
    pub fn new(index: usize, line: usize, column: usize) -> SourcePosition {
        SourcePosition { index, line, column }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Zero-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Zero-based column number.
    pub fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn advance_newline(&mut self) {
        self.index += 1;
        self.line += 1;
        self.column = 0;
    }

    pub(crate) fn advance_col(&mut self) {
        self.index += 1;
        self.column += 1;
    }
}

impl PartialOrd for SourcePosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.index.cmp(&other.index))
    }
}

/// A value together with the source span it was parsed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanning<T> {
    pub item: T,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl<T> Spanning<T> {
    pub fn start_end(start: &SourcePosition, end: &SourcePosition, item: T) -> Spanning<T> {
        Spanning { item, start: start.clone(), end: end.clone() }
    }

    pub fn zero_width(pos: &SourcePosition, item: T) -> Spanning<T> {
        Spanning { item, start: pos.clone(), end: pos.clone() }
    }

    /// Construct a value with no meaningful source location, e.g. one that
    /// was synthesised rather than parsed.
    pub fn unlocated(item: T) -> Spanning<T> {
        Spanning { item, start: SourcePosition::default(), end: SourcePosition::default() }
    }

    pub fn map<O, F: FnOnce(T) -> O>(self, f: F) -> Spanning<O> {
        Spanning { item: f(self.item), start: self.start, end: self.end }
    }

    pub fn as_ref(&self) -> Spanning<&T> {
        Spanning { item: &self.item, start: self.start.clone(), end: self.end.clone() }
    }

    /// Turn a `Vec<Spanning<T>>` into a single `Spanning<Vec<T>>` spanning the
    /// whole list, or `None` if the list is empty.
    pub fn spanning(items: Vec<Spanning<T>>) -> Option<Spanning<Vec<T>>> {
        let start = items.first()?.start.clone();
        let end = items.last()?.end.clone();
        Some(Spanning {
            start,
            end,
            item: items.into_iter().map(|s| s.item).collect(),
        })
    }
}
