use crate::ast::AstNode;
use crate::error::{FlowgraphErrorExt, Stage};
use crate::location::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildErrorKind {
    /// A node in a position neither walker accepts.
    UnsupportedConstruct,
    /// `break`, `next`, `redo` or `return` with no active target.
    InvalidJumpContext,
    /// Input whose lowering is deliberately left undefined.
    NotYetImplemented,
    /// A node lacks its scope, or a well-known type is not registered.
    MissingAnnotation,
    /// Nesting deeper than `BuildOptions::max_depth`, or deeper than a
    /// worker stack could be reserved for.
    DepthLimitExceeded,
}

impl std::fmt::Display for BuildErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BuildErrorKind::UnsupportedConstruct => "unsupported construct",
            BuildErrorKind::InvalidJumpContext => "invalid jump context",
            BuildErrorKind::NotYetImplemented => "not yet implemented",
            BuildErrorKind::MissingAnnotation => "missing annotation",
            BuildErrorKind::DepthLimitExceeded => "depth limit exceeded",
        };
        write!(f, "{}", s)
    }
}

/// Fatal graph construction failure. No partial graph is returned.
#[derive(Debug, Clone)]
pub struct BuildError {
    kind: BuildErrorKind,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl BuildError {
    pub fn with(
        kind: BuildErrorKind,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        BuildError { kind, message, issuer, location, span }
    }

    /// Error positioned at `node`.
    pub(crate) fn at(kind: BuildErrorKind, node: &AstNode, message: String, issuer: &str) -> Self {
        Self::with(kind, message, issuer.to_string(), node.location.clone(), node.span.clone())
    }

    pub fn kind(&self) -> BuildErrorKind {
        self.kind
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {} (at {})", self.kind, self.message, loc),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for BuildError {}

impl FlowgraphErrorExt for BuildError {
    fn stage(&self) -> Stage {
        Stage::Lower
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
        Some(self.kind)
    }
}
