use pest_derive::Parser;

use crate::location;

#[derive(Parser)]
#[grammar = "grammar.pest"]

pub struct SexpParser;

pub fn get_location_from_pair(
    rule: &pest::iterators::Pair<Rule>,
    source: &crate::source::Source,
) -> Option<location::Location> {
    let (line, column) = rule.as_span().start_pos().line_col();
    Some(location::Location::new(source.name.clone(), line, column))
}

pub fn get_span_from_pair(
    rule: &pest::iterators::Pair<Rule>,
    source: &crate::source::Source,
) -> Option<location::Span> {
    let span = rule.as_span();
    let (start_line, start_column) = span.start_pos().line_col();
    let (end_line, end_column) = span.end_pos().line_col();
    Some(location::Span::new(
        location::Location::new(source.name.clone(), start_line, start_column),
        location::Location::new(source.name.clone(), end_line, end_column),
    ))
}

/// Location of a pest parse failure.
pub(crate) fn get_location_from_error(
    error: &pest::error::Error<Rule>,
    source: &crate::source::Source,
) -> location::Location {
    let (line, column) = match error.line_col {
        pest::error::LineColLocation::Pos(pos) => pos,
        pest::error::LineColLocation::Span(start, _) => start,
    };
    location::Location::new(source.name.clone(), line, column)
}
