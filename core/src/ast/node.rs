use std::sync::Arc;

use crate::location;

use super::binding::{Binding, Scope};
use super::kind::AstNodeKind;

#[derive(Clone, PartialEq)]
pub struct AstNode {
    id: usize,
    pub kind: AstNodeKind,
    /// Storage location resolved for variable nodes.
    pub binding: Option<Binding>,
    /// Enclosing scope; used to find the implicit receiver and, for
    /// argument-less `super`, the enclosing method's parameters.
    pub scope: Option<Arc<Scope>>,
    pub location: Option<location::Location>,
    pub span: Option<location::Span>,
}

impl AstNode {

    fn create_id() -> usize {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static COUNTER: AtomicUsize = AtomicUsize::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    pub fn new(
        kind: AstNodeKind,
        location: Option<location::Location>,
        span: Option<location::Span>,
    ) -> Self {
        AstNode {
            id: Self::create_id(),
            kind,
            binding: None,
            scope: None,
            location,
            span,
        }
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn with_scope(mut self, scope: Arc<Scope>) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn get_kind(&self) -> &AstNodeKind {
        &self.kind
    }
    pub fn get_binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }
    pub fn get_scope(&self) -> Option<&Scope> {
        self.scope.as_deref()
    }
}

use std::fmt;

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} #{}", self.kind.tag(), self.id)?;
        if let Some(binding) = &self.binding {
            write!(f, " -> {}", binding)?;
        }
        if let Some(loc) = &self.location {
            write!(f, " @ {}", loc)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("binding", &self.binding)
            .field("location", &self.location)
            .finish()
    }
}
