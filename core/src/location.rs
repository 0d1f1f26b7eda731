use serde::Serialize;

/// A single point in a source text. Lines and columns are 1-based, matching
/// what `pest` reports for a position.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Location {
    /// Name of the source the position belongs to.
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self { file: file.into(), line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}-{}", self.start, self.end.column)
        } else {
            write!(f, "{} - {}:{}", self.start, self.end.line, self.end.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display_collapses_single_line() {
        let span = Span::new(Location::new("a.sx", 3, 1), Location::new("a.sx", 3, 9));
        assert_eq!(span.to_string(), "a.sx:3:1-9");
        let long = Span::new(Location::new("a.sx", 3, 1), Location::new("a.sx", 5, 2));
        assert_eq!(long.to_string(), "a.sx:3:1 - 5:2");
    }
}
