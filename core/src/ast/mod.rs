pub mod binding;
pub mod err;
pub mod kind;
pub mod node;
pub mod rules;
pub mod sexp;

pub use binding::{Binding, BindingKind, MethodSignature, Parameter, ParameterKind, Scope};
pub use kind::{AstNodeKind, BinaryOperator, UnaryOperator};
pub use node::AstNode;
pub use rules::{Rule, SexpParser};
pub use sexp::{read_source, read_source_with_options};
