use std::path::PathBuf;

use crate::error::{FlowgraphErrorExt, Stage};

/// Text of an s-expression AST dump together with the name used in
/// locations reported against it.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub path: Option<PathBuf>,
    pub content: String,
}

impl Source {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Source { name: name.into(), path: None, content: content.into() }
    }

    pub fn from_path(path: PathBuf) -> Result<Self, Box<dyn FlowgraphErrorExt>> {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(cause) => {
                let err: Box<dyn FlowgraphErrorExt> = Box::new(SourceReadError { path, cause });
                return Err(err);
            }
        };
        Ok(Source { name, path: Some(path), content })
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "Source: {} at {:?}", self.name, path),
            None => write!(f, "Source: {}", self.name),
        }
    }
}

/// The dump could not be read from disk. Keeps the underlying I/O error
/// so "not found" and "permission denied" stay distinguishable.
#[derive(Debug)]
pub struct SourceReadError {
    pub path: PathBuf,
    pub cause: std::io::Error,
}

impl std::fmt::Display for SourceReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot read {}: {}", self.path.display(), self.cause)
    }
}

impl std::error::Error for SourceReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl FlowgraphErrorExt for SourceReadError {
    fn stage(&self) -> Stage {
        Stage::Source
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        "flowgraph.source.from_path".to_string()
    }

    fn span(&self) -> Option<crate::location::Span> {
        None
    }

    fn location(&self) -> Option<crate::location::Location> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_keeps_the_io_cause() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Source::from_path(dir.path().join("absent.sx")).expect_err("missing");
        assert_eq!(err.stage(), Stage::Source);
        assert!(err.message().starts_with("cannot read "), "{}", err.message());
        assert!(err.message().contains("absent.sx"));
    }

    #[test]
    fn io_error_kind_is_preserved() {
        let err = SourceReadError {
            path: PathBuf::from("locked.sx"),
            cause: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let cause = std::error::Error::source(&err)
            .and_then(|e| e.downcast_ref::<std::io::Error>())
            .expect("io cause");
        assert_eq!(cause.kind(), std::io::ErrorKind::PermissionDenied);
    }
}
