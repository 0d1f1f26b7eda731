//! file: core/src/cfg/lower/mod.rs
//! description: AST to control-flow-graph lowering.
//!
//! `GraphBuilder` walks an annotated AST in two modes. The value walk
//! (`lower_expr`) emits the instructions computing a node and returns the
//! binding holding the result; the no-value walk (`lower_stmt`) performs the
//! same side effects in the same order but produces nothing. Constructs
//! that introduce blocks live in `lower_control` and `lower_calls`, shared
//! by both walks through an optional result binding.
//!
pub mod declare_builtins;
pub mod err;
pub mod function_builder;
pub mod lowering_context;

mod lower_calls;
mod lower_control;
mod lower_expr;
mod lower_stmt;

pub use declare_builtins::{BuiltinTypes, WellKnownTypes};
pub use err::{BuildError, BuildErrorKind};
pub use function_builder::FunctionBuilder;
pub use lowering_context::{JumpKind, JumpTargets};

use crate::ast::{AstNode, Binding};
use crate::cfg::block::BlockName;
use crate::cfg::graph::ControlFlowGraph;
use crate::cfg::op::Instruction;
use crate::cfg::value::Constant;
use crate::config::BuildOptions;
use crate::stack;

pub type BuildResult<T> = Result<T, BuildError>;

/// Lowers one AST into one graph. `build` consumes the builder.
pub struct GraphBuilder<'a> {
    root: &'a AstNode,
    types: &'a dyn WellKnownTypes,
    options: BuildOptions,
    fb: FunctionBuilder,
    targets: JumpTargets,
    depth: usize,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(root: &'a AstNode, types: &'a dyn WellKnownTypes) -> Self {
        GraphBuilder {
            root,
            types,
            options: BuildOptions::default(),
            fb: FunctionBuilder::new(),
            targets: JumpTargets::default(),
            depth: 0,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Lower the whole AST. The walk runs on a worker whose stack is sized
    /// for `max_depth`, so nesting at the limit fails with
    /// `DepthLimitExceeded` instead of overflowing.
    pub fn build(self) -> BuildResult<ControlFlowGraph> {
        let max_depth = self.options.max_depth;
        let location = self.root.location.clone();
        let span = self.root.span.clone();
        match stack::run_with_stack("flowgraph-lower", max_depth, move || self.lower_root()) {
            Ok(result) => result,
            Err(e) => Err(BuildError::with(
                BuildErrorKind::DepthLimitExceeded,
                format!(
                    "cannot reserve {} bytes of stack for {} levels of nesting: {}",
                    stack::stack_size_for(max_depth),
                    max_depth,
                    e
                ),
                "flowgraph.lower.build".into(),
                location,
                span,
            )),
        }
    }

    fn lower_root(mut self) -> BuildResult<ControlFlowGraph> {
        log::debug!("building control-flow graph for {} (max depth {})", self.root, self.options.max_depth);
        self.targets.return_to = Some(BlockName::Exit);

        let root = self.root;
        let result = self.value_walk(root)?;
        self.fb.emit(Instruction::Return { value: result });
        self.fb.jump(BlockName::Exit);

        let temps = self.fb.temp_count();
        let graph = self.fb.finish();
        log::debug!(
            "built control-flow graph: {} blocks, {} edges, {} temporaries",
            graph.len(),
            graph.edges().len(),
            temps
        );
        Ok(graph)
    }

    /// Run `f` with `overrides` applied to the jump targets. The previous
    /// targets are restored whether or not `f` succeeds.
    pub(crate) fn with_jump_targets<T>(
        &mut self,
        overrides: JumpTargets,
        f: impl FnOnce(&mut Self) -> BuildResult<T>,
    ) -> BuildResult<T> {
        let saved = self.targets;
        self.targets = saved.overlay(&overrides);
        log::trace!("jump targets now {}", self.targets);
        let result = f(self);
        self.targets = saved;
        log::trace!("jump targets restored to {}", self.targets);
        result
    }

    /// No-value walk of all statements but the last, value walk of the
    /// last. An empty list evaluates to `nil`.
    pub(crate) fn walk_body(&mut self, body: &[AstNode]) -> BuildResult<Binding> {
        match body.split_last() {
            Some((last, init)) => {
                for stmt in init {
                    self.novalue_walk(stmt)?;
                }
                self.value_walk(last)
            }
            None => Ok(self.fb.const_temp(Constant::Nil)),
        }
    }

    pub(crate) fn walk_body_novalue(&mut self, body: &[AstNode]) -> BuildResult<()> {
        for stmt in body {
            self.novalue_walk(stmt)?;
        }
        Ok(())
    }

    /// Value walk of `body` copied into `result`, or a no-value walk when
    /// there is no result to fill.
    pub(crate) fn walk_body_into(&mut self, body: &[AstNode], result: Option<&Binding>) -> BuildResult<()> {
        match result {
            Some(dest) => {
                let value = self.walk_body(body)?;
                self.fb.copy(dest.clone(), value);
                Ok(())
            }
            None => self.walk_body_novalue(body),
        }
    }

    fn descend(&mut self, node: &AstNode) -> BuildResult<()> {
        if self.depth >= self.options.max_depth {
            return Err(BuildError::at(
                BuildErrorKind::DepthLimitExceeded,
                node,
                format!("AST nesting exceeds the limit of {} levels", self.options.max_depth),
                "flowgraph.lower.descend",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// The scope's `self`, copied into a fresh temporary.
    pub(crate) fn self_temp(&mut self, node: &AstNode) -> BuildResult<Binding> {
        let binding = self.self_binding(node)?;
        Ok(self.read_variable(&binding))
    }

    pub(crate) fn self_binding(&self, node: &AstNode) -> BuildResult<Binding> {
        match node.get_scope() {
            Some(scope) => Ok(scope.lookup_self().clone()),
            None => Err(BuildError::at(
                BuildErrorKind::MissingAnnotation,
                node,
                format!("`{}` has no enclosing scope to resolve `self`", node.get_kind().tag()),
                "flowgraph.lower.self_binding",
            )),
        }
    }

    /// Copy of `binding` in a fresh temporary.
    pub(crate) fn read_variable(&mut self, binding: &Binding) -> Binding {
        let t = self.fb.alloc_temp();
        self.fb.copy(t.clone(), binding.clone());
        t
    }

    pub(crate) fn resolved_binding(&self, node: &AstNode) -> BuildResult<Binding> {
        node.get_binding().cloned().ok_or_else(|| {
            BuildError::at(
                BuildErrorKind::MissingAnnotation,
                node,
                format!("`{}` has no resolved binding", node.get_kind().tag()),
                "flowgraph.lower.resolved_binding",
            )
        })
    }

    pub(crate) fn well_known(&self, name: &str, node: &AstNode) -> BuildResult<Binding> {
        self.types.lookup(name).ok_or_else(|| {
            BuildError::at(
                BuildErrorKind::MissingAnnotation,
                node,
                format!("well-known type `{}` is not registered", name),
                "flowgraph.lower.well_known",
            )
        })
    }

    pub(crate) fn unsupported(node: &AstNode, position: &str) -> BuildError {
        BuildError::at(
            BuildErrorKind::UnsupportedConstruct,
            node,
            format!("`{}` cannot appear in {} position", node.get_kind().tag(), position),
            "flowgraph.lower.unsupported",
        )
    }
}

/// Build a graph for `root` with the built-in type registry and default
/// options.
pub fn build_graph(root: &AstNode) -> BuildResult<ControlFlowGraph> {
    GraphBuilder::new(root, &BuiltinTypes).build()
}
