//! file: core/src/cfg/lower/declare_builtins.rs
//! description: well-known type lookup used while lowering.
//!
//! A handful of constructs lower to calls on built-in classes (`Array.new`
//! for splats and array literals, `Regexp.new` for regexp literals). The
//! builder resolves those classes through `WellKnownTypes` instead of a
//! global registry so callers can substitute their own.
//!
use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::Binding;

/// Consulted from the builder's worker thread, hence `Sync`.
pub trait WellKnownTypes: Sync {
    /// Binding through which the named class is reachable.
    fn lookup(&self, name: &str) -> Option<Binding>;
}

lazy_static! {
    static ref BUILTIN_TYPES: HashMap<&'static str, Binding> = {
        let names = [
            "Object", "Array", "String", "Symbol", "Regexp", "Hash", "Integer", "Float", "Proc", "NilClass",
        ];
        names.iter().map(|name| (*name, Binding::constant(*name))).collect()
    };
}

/// The core classes every program can reach, each bound as a constant of
/// the same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTypes;

impl WellKnownTypes for BuiltinTypes {
    fn lookup(&self, name: &str) -> Option<Binding> {
        BUILTIN_TYPES.get(name).cloned()
    }
}

impl WellKnownTypes for HashMap<String, Binding> {
    fn lookup(&self, name: &str) -> Option<Binding> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cover_array_and_regexp() {
        assert_eq!(BuiltinTypes.lookup("Array"), Some(Binding::constant("Array")));
        assert!(BuiltinTypes.lookup("Regexp").is_some());
        assert!(BuiltinTypes.lookup("Widget").is_none());
    }
}
