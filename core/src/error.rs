//! file: core/src/error.rs
//! description: error surface shared by every stage of a graph build.
//!
//! A build reads a dump from disk, parses it into an AST and lowers the AST.
//! Each step fails with its own error type; all of them implement
//! `FlowgraphErrorExt` so a caller chaining the steps can hold one
//! `Box<dyn FlowgraphErrorExt>` and still tell where the build stopped.
use std::fmt;

use crate::cfg::BuildErrorKind;
use crate::location::{Location, Span};

/// Step of the pipeline that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Loading the dump from disk.
    Source,
    Config,
    /// Turning s-expression text into an AST.
    Read,
    /// Turning the AST into a graph.
    Lower,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Source => "source",
            Stage::Config => "config",
            Stage::Read => "read",
            Stage::Lower => "lower",
        };
        write!(f, "{}", name)
    }
}

/// Every error aborts the build that raised it; no partial AST or graph is
/// handed back. `Send` so a worker thread can return it.
pub trait FlowgraphErrorExt: Send {
    fn stage(&self) -> Stage;
    fn message(&self) -> String;
    /// Dotted path of the routine that raised the error.
    fn issuer(&self) -> String;
    fn span(&self) -> Option<Span>;
    fn location(&self) -> Option<Location>;

    /// Lowering failure class. The reader reports its nesting limit as
    /// `DepthLimitExceeded` too, so callers can treat both alike.
    fn build_kind(&self) -> Option<BuildErrorKind> {
        None
    }
}

impl fmt::Debug for dyn FlowgraphErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error", self.stage())?;
        if let Some(kind) = self.build_kind() {
            write!(f, " ({})", kind)?;
        }
        match (self.location(), self.span()) {
            (_, Some(span)) => write!(f, " at {}", span)?,
            (Some(loc), None) => write!(f, " at {}", loc)?,
            (None, None) => {}
        }
        write!(f, " [{}]: {}", self.issuer(), self.message())
    }
}

impl fmt::Display for dyn FlowgraphErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(loc) => write!(f, "{} error at {}: {}", self.stage(), loc, self.message()),
            None => write!(f, "{} error: {}", self.stage(), self.message()),
        }
    }
}

/// Raised while loading or validating `BuildOptions`.
#[derive(Debug, Clone)]
pub struct ConfigError {
    message: String,
    issuer: String,
}

impl ConfigError {
    pub fn new(message: String, issuer: &str) -> Self {
        ConfigError { message, issuer: issuer.to_string() }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl FlowgraphErrorExt for ConfigError {
    fn stage(&self) -> Stage {
        Stage::Config
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn location(&self) -> Option<Location> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_stage_and_location() {
        let err: Box<dyn FlowgraphErrorExt> = Box::new(ConfigError::new("bad depth".into(), "flowgraph.config"));
        assert_eq!(err.to_string(), "config error: bad depth");
        assert_eq!(format!("{:?}", err), "config error [flowgraph.config]: bad depth");
    }
}
