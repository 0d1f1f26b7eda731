pub mod ast;
pub mod cfg;
pub mod config;
pub mod error;
pub mod location;
pub mod source;
pub mod stack;

pub use ast::{AstNode, AstNodeKind, read_source, read_source_with_options};
pub use cfg::{BuildError, BuildErrorKind, BuiltinTypes, ControlFlowGraph, GraphBuilder, WellKnownTypes, verify};
pub use config::BuildOptions;
pub use error::{ConfigError, FlowgraphErrorExt, Stage};
pub use location::{Location, Span};
pub use source::Source;

pub fn generate_error_report(error: &dyn FlowgraphErrorExt) -> String {
    let location = match error.location() {
        Some(loc) => loc.to_string(),
        None => "unknown location".to_string(),
    };
    let kind = match error.build_kind() {
        Some(kind) => kind.to_string(),
        None => "-".to_string(),
    };

    format!("FLOWGRAPH | {} | {} | {} | {}", error.stage(), kind, location, error.message())
}

/// Read an s-expression dump and lower it with the built-in type registry.
pub fn build_graph_from_source(source: &Source) -> Result<ControlFlowGraph, Box<dyn FlowgraphErrorExt>> {
    build_graph_with_options(source, BuildOptions::default())
}

pub fn build_graph_with_options(
    source: &Source,
    options: BuildOptions,
) -> Result<ControlFlowGraph, Box<dyn FlowgraphErrorExt>> {
    let ast = read_source_with_options(source, &options)?;
    GraphBuilder::new(&ast, &BuiltinTypes)
        .with_options(options)
        .build()
        .map_err(|e| Box::new(e) as Box<dyn FlowgraphErrorExt>)
}
