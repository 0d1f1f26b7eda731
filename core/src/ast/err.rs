use crate::cfg::BuildErrorKind;
use crate::error::{FlowgraphErrorExt, Stage};
use crate::location::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    /// Nothing but whitespace and comments.
    EmptySource,
    /// Text the s-expression grammar rejects, or an atom out of range.
    Malformed,
    /// A well-formed form that is not a known AST shape.
    UnknownForm,
    /// Lists nested deeper than `BuildOptions::max_depth`.
    TooDeep,
}

/// Failure to turn a dump into an AST.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    kind: SyntaxErrorKind,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl SyntaxError {
    pub fn with(
        kind: SyntaxErrorKind,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        SyntaxError { kind, message, issuer, location, span }
    }

    pub fn empty_source(name: &str, issuer: &str) -> Self {
        Self::with(
            SyntaxErrorKind::EmptySource,
            format!("{} contains no forms", name),
            issuer.to_string(),
            None,
            None,
        )
    }

    pub fn kind(&self) -> SyntaxErrorKind {
        self.kind
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} (at {})", self.message, loc),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for SyntaxError {}

impl FlowgraphErrorExt for SyntaxError {
    fn stage(&self) -> Stage {
        Stage::Read
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.span.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }

    fn build_kind(&self) -> Option<BuildErrorKind> {
        match self.kind {
            SyntaxErrorKind::TooDeep => Some(BuildErrorKind::DepthLimitExceeded),
            _ => None,
        }
    }
}
