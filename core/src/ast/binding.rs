//! file: core/src/ast/binding.rs
//! description: resolved storage locations and lexical scopes.
//!
//! Bindings and scopes are attached to AST nodes by the resolution pass
//! that runs before graph construction. Instructions refer to bindings by
//! value; a binding is only a name plus the kind of storage it names.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BindingKind {
    Local,
    Instance,
    Global,
    Constant,
    SelfRef,
    Temporary,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
}

impl Binding {
    pub fn new(name: impl Into<String>, kind: BindingKind) -> Self {
        Binding { name: name.into(), kind }
    }

    pub fn local(name: impl Into<String>) -> Self {
        Self::new(name, BindingKind::Local)
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::new(name, BindingKind::Constant)
    }

    pub fn self_ref(name: impl Into<String>) -> Self {
        Self::new(name, BindingKind::SelfRef)
    }

    pub fn temporary(index: usize) -> Self {
        Self::new(format!("%t{}", index), BindingKind::Temporary)
    }
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            BindingKind::SelfRef => write!(f, "self<{}>", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterKind {
    Required,
    Optional,
    Rest,
    /// Required parameter listed after a rest parameter.
    Post,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub binding: Binding,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(binding: Binding, kind: ParameterKind) -> Self {
        Parameter { binding, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<Parameter>,
}

impl MethodSignature {
    /// Index of the rest parameter within `positional()`.
    pub fn rest_index(&self) -> Option<usize> {
        self.positional().iter().position(|p| p.kind == ParameterKind::Rest)
    }

    /// Parameters passed positionally when the method is re-invoked through
    /// an implicit `super`. The block parameter is not part of that list.
    pub fn positional(&self) -> Vec<&Parameter> {
        self.params.iter().filter(|p| p.kind != ParameterKind::Block).collect()
    }
}

/// The lexical scope enclosing an expression: what `self` is, and the
/// method being defined when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub self_binding: Binding,
    pub method: Option<MethodSignature>,
}

impl Scope {
    pub fn new(self_binding: Binding) -> Self {
        Scope { self_binding, method: None }
    }

    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.method = Some(method);
        self
    }

    pub fn lookup_self(&self) -> &Binding {
        &self.self_binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_params_skip_block() {
        let sig = MethodSignature {
            name: "each_pair".into(),
            params: vec![
                Parameter::new(Binding::local("a"), ParameterKind::Required),
                Parameter::new(Binding::local("rest"), ParameterKind::Rest),
                Parameter::new(Binding::local("blk"), ParameterKind::Block),
            ],
        };
        assert_eq!(sig.positional().len(), 2);
        assert_eq!(sig.rest_index(), Some(1));
    }
}
