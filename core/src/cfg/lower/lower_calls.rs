//! file: core/src/cfg/lower/lower_calls.rs
//! description: method calls, super, block literals and aggregate values.
//!
//! A trailing block literal lowers to a `Closure` naming the body block,
//! the call referencing that body, and a nondeterministic branch from the
//! call site into the body or past it. The body ends by resuming the caller
//! and branching the same two ways, which covers zero, one or many
//! invocations of the block.
//!
use crate::ast::{AstNode, AstNodeKind, Binding, MethodSignature, Parameter, ParameterKind};
use crate::cfg::block::BlockName;
use crate::cfg::op::{BlockOperand, Instruction};
use crate::cfg::value::Constant;

use super::{BuildError, BuildErrorKind, BuildResult, GraphBuilder, JumpTargets};

/// Who receives a send.
enum Dispatch<'m> {
    Method { receiver: Binding, method: &'m str },
    Super,
}

/// Evaluated arguments: one binding each, or a single aggregated array.
enum ArgValues {
    Positional(Vec<Binding>),
    Vararg(Binding),
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn is_splat(node: &AstNode) -> bool {
        matches!(node.get_kind(), AstNodeKind::Splat { .. })
    }

    pub(crate) fn call_setter(&mut self, receiver: Binding, name: &str, value: Binding) {
        let setter = format!("{}=", name);
        self.fb.call(None, receiver, &setter, vec![value], BlockOperand::None);
    }

    /// Identifier without a binding: a zero-argument call on `self`.
    pub(crate) fn lower_self_call(&mut self, node: &AstNode, name: &str, dest: Option<Binding>) -> BuildResult<()> {
        let receiver = self.self_temp(node)?;
        self.fb.call(dest, receiver, name, Vec::new(), BlockOperand::None);
        Ok(())
    }

    pub(crate) fn lower_call(&mut self, node: &AstNode, dest: Option<Binding>) -> BuildResult<()> {
        let (receiver, method, args, block_pass, block) = match node.get_kind() {
            AstNodeKind::Call { receiver, method, args, block_pass, block } => (receiver, method, args, block_pass, block),
            _ => return Err(Self::unsupported(node, "call")),
        };
        let receiver = match receiver {
            Some(receiver) => self.value_walk(receiver)?,
            None => self.self_temp(node)?,
        };
        let dispatch = Dispatch::Method { receiver, method: method.as_str() };
        self.send(node, dispatch, args, block_pass.as_deref(), block.as_deref(), dest)
    }

    pub(crate) fn lower_super(&mut self, node: &AstNode, dest: Option<Binding>) -> BuildResult<()> {
        match node.get_kind() {
            AstNodeKind::Super { args, block_pass, block } => {
                self.send(node, Dispatch::Super, args, block_pass.as_deref(), block.as_deref(), dest)
            }
            _ => Err(Self::unsupported(node, "super")),
        }
    }

    /// Argument-less `super`: passes the enclosing method's parameters on.
    pub(crate) fn lower_zsuper(&mut self, node: &AstNode, dest: Option<Binding>) -> BuildResult<()> {
        let block = match node.get_kind() {
            AstNodeKind::ZSuper { block } => block.as_deref(),
            _ => return Err(Self::unsupported(node, "super")),
        };
        let method = node.get_scope().and_then(|scope| scope.method.as_ref()).ok_or_else(|| {
            BuildError::at(
                BuildErrorKind::MissingAnnotation,
                node,
                "implicit `super` outside of a method definition".to_string(),
                "flowgraph.lower.lower_zsuper",
            )
        })?;

        match block {
            Some(block) => {
                let (params, body) = Self::block_parts(block)?;
                self.with_block_literal(params, body, |b, body_block| {
                    let values = b.zsuper_args(node, method)?;
                    b.emit_dispatch(Dispatch::Super, values, BlockOperand::Body(body_block), dest);
                    Ok(())
                })
            }
            None => {
                let values = self.zsuper_args(node, method)?;
                self.emit_dispatch(Dispatch::Super, values, BlockOperand::None, dest);
                Ok(())
            }
        }
    }

    /// `for target in iterable` is `iterable.each { |target| ... }`.
    pub(crate) fn lower_for(&mut self, node: &AstNode, dest: Option<Binding>) -> BuildResult<()> {
        let (target, iterable, body) = match node.get_kind() {
            AstNodeKind::For { target, iterable, body } => (target, iterable, body),
            _ => return Err(Self::unsupported(node, "loop")),
        };
        let params = match target.get_kind() {
            AstNodeKind::VarField { .. } => {
                vec![Parameter::new(self.resolved_binding(target)?, ParameterKind::Required)]
            }
            AstNodeKind::Field { .. } => {
                return Err(BuildError::at(
                    BuildErrorKind::NotYetImplemented,
                    target,
                    "`for` loops assigning to a field are not supported yet".to_string(),
                    "flowgraph.lower.lower_for",
                ));
            }
            AstNodeKind::MultipleTarget { .. } => {
                return Err(BuildError::at(
                    BuildErrorKind::NotYetImplemented,
                    target,
                    "`for` loops with multiple targets are not supported yet".to_string(),
                    "flowgraph.lower.lower_for",
                ));
            }
            _ => return Err(Self::unsupported(target, "loop target")),
        };

        let receiver = self.value_walk(iterable)?;
        self.with_block_literal(&params, body, |b, body_block| {
            b.fb.call(dest, receiver, "each", Vec::new(), BlockOperand::Body(body_block));
            Ok(())
        })
    }

    /// `'' .concat(part)...`, one part at a time.
    pub(crate) fn build_string(&mut self, parts: &[AstNode]) -> BuildResult<Binding> {
        let mut acc = self.fb.const_temp(Constant::Str(String::new()));
        for part in parts {
            let value = self.value_walk(part)?;
            acc = self.fb.call_value(acc, "concat", vec![value]);
        }
        Ok(acc)
    }

    /// Backtick string: the built command is passed to `self.\``.
    pub(crate) fn lower_xstring(&mut self, node: &AstNode, parts: &[AstNode], dest: Option<Binding>) -> BuildResult<()> {
        let command = self.build_string(parts)?;
        let receiver = self.self_binding(node)?;
        self.fb.call(dest, receiver, "`", vec![command], BlockOperand::None);
        Ok(())
    }

    pub(crate) fn build_array(&mut self, node: &AstNode, elements: &[AstNode]) -> BuildResult<Binding> {
        let array_class = self.well_known("Array", node)?;
        let array = self.fb.call_value(array_class, "new", Vec::new());
        for element in elements {
            let value = self.value_walk(element)?;
            self.fb.call(None, array.clone(), "<<", vec![value], BlockOperand::None);
        }
        Ok(array)
    }

    /// One array holding `elements` in order, with each splatted value
    /// converted to an array and concatenated in place.
    pub(crate) fn compute_varargs(&mut self, node: &AstNode, elements: &[AstNode]) -> BuildResult<Binding> {
        let array_class = self.well_known("Array", node)?;
        let result = self.fb.call_value(array_class.clone(), "new", Vec::new());
        for element in elements {
            match element.get_kind() {
                AstNodeKind::Splat { value } => {
                    let starred = self.value_walk(value)?;
                    let converted = self.convert_type(starred, array_class.clone(), "to_a");
                    self.fb.call(None, result.clone(), "concat", vec![converted], BlockOperand::None);
                }
                _ => {
                    let value = self.value_walk(element)?;
                    self.fb.call(None, result.clone(), "<<", vec![value], BlockOperand::None);
                }
            }
        }
        Ok(result)
    }

    /// `klass === value ? value : value.method`
    pub(crate) fn convert_type(&mut self, value: Binding, klass: Binding, method: &str) -> Binding {
        let result = self.fb.alloc_temp();
        let is_klass = self.fb.create_block();
        let not_klass = self.fb.create_block();
        let after = self.fb.create_block();

        let test = self.fb.call_value(klass, "===", vec![value.clone()]);
        self.fb.branch(Some(test), is_klass, not_klass);

        self.fb.start_block(not_klass);
        let converted = self.fb.call_value(value.clone(), method, Vec::new());
        self.fb.copy(result.clone(), converted);
        self.fb.jump(after);

        self.fb.start_block(is_klass);
        self.fb.copy(result.clone(), value);
        self.fb.jump(after);

        self.fb.start_block(after);
        result
    }

    fn block_parts(block: &AstNode) -> BuildResult<(&[Parameter], &[AstNode])> {
        match block.get_kind() {
            AstNodeKind::BlockLiteral { params, body } => Ok((params, body)),
            _ => Err(Self::unsupported(block, "block")),
        }
    }

    fn send(
        &mut self,
        node: &AstNode,
        dispatch: Dispatch<'_>,
        args: &[AstNode],
        block_pass: Option<&AstNode>,
        block: Option<&AstNode>,
        dest: Option<Binding>,
    ) -> BuildResult<()> {
        match block {
            Some(block) => {
                if block_pass.is_some() {
                    return Err(BuildError::at(
                        BuildErrorKind::UnsupportedConstruct,
                        node,
                        "a call cannot take both a block argument and a block literal".to_string(),
                        "flowgraph.lower.send",
                    ));
                }
                let (params, body) = Self::block_parts(block)?;
                self.with_block_literal(params, body, |b, body_block| {
                    let values = b.evaluate_args(node, args)?;
                    b.emit_dispatch(dispatch, values, BlockOperand::Body(body_block), dest);
                    Ok(())
                })
            }
            None => {
                let values = self.evaluate_args(node, args)?;
                let block = match block_pass {
                    Some(block_pass) => BlockOperand::Value(self.value_walk(block_pass)?),
                    None => BlockOperand::None,
                };
                self.emit_dispatch(dispatch, values, block, dest);
                Ok(())
            }
        }
    }

    fn evaluate_args(&mut self, node: &AstNode, args: &[AstNode]) -> BuildResult<ArgValues> {
        if args.iter().any(Self::is_splat) {
            return Ok(ArgValues::Vararg(self.compute_varargs(node, args)?));
        }
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.value_walk(arg)?);
        }
        Ok(ArgValues::Positional(values))
    }

    fn zsuper_args(&mut self, node: &AstNode, method: &MethodSignature) -> BuildResult<ArgValues> {
        let params = method.positional();
        let rest = match method.rest_index() {
            Some(rest) => rest,
            None => {
                let values = params.iter().map(|p| self.read_variable(&p.binding)).collect();
                return Ok(ArgValues::Positional(values));
            }
        };

        let array_class = self.well_known("Array", node)?;
        let aggregate = self.fb.call_value(array_class.clone(), "new", Vec::new());
        for param in &params[..rest] {
            let value = self.read_variable(&param.binding);
            self.fb.call(None, aggregate.clone(), "<<", vec![value], BlockOperand::None);
        }
        let starred = self.read_variable(&params[rest].binding);
        let converted = self.convert_type(starred, array_class, "to_a");
        self.fb.call(None, aggregate.clone(), "concat", vec![converted], BlockOperand::None);
        for param in &params[rest + 1..] {
            let value = self.read_variable(&param.binding);
            self.fb.call(None, aggregate.clone(), "<<", vec![value], BlockOperand::None);
        }
        Ok(ArgValues::Vararg(aggregate))
    }

    fn emit_dispatch(&mut self, dispatch: Dispatch<'_>, args: ArgValues, block: BlockOperand, dest: Option<Binding>) {
        let instruction = match (dispatch, args) {
            (Dispatch::Method { receiver, method }, ArgValues::Positional(args)) => {
                Instruction::Call { dest, receiver, method: method.to_string(), args, block }
            }
            (Dispatch::Method { receiver, method }, ArgValues::Vararg(args)) => {
                Instruction::CallVararg { dest, receiver, method: method.to_string(), args, block }
            }
            (Dispatch::Super, ArgValues::Positional(args)) => Instruction::Super { dest, args, block },
            (Dispatch::Super, ArgValues::Vararg(args)) => Instruction::SuperVararg { dest, args, block },
        };
        self.fb.emit(instruction);
    }

    /// Lower a block literal around the send emitted by `issue`, which
    /// receives the body label to reference.
    ///
    /// Inside the body `break` leaves the call, `redo` restarts the body and
    /// `next` ends the current invocation.
    fn with_block_literal(
        &mut self,
        params: &[Parameter],
        body: &[AstNode],
        issue: impl FnOnce(&mut Self, BlockName) -> BuildResult<()>,
    ) -> BuildResult<()> {
        let after = self.fb.create_block();
        let closure = self.fb.alloc_temp();
        let body_block = self.fb.create_block();
        self.fb.emit(Instruction::Closure { dest: closure, params: params.to_vec(), body: body_block });
        issue(self, body_block)?;
        self.fb.branch(None, body_block, after);

        // Only added to the graph if the body contains a `next`.
        let next_landing = self.fb.reserve_block();
        let targets = JumpTargets {
            break_to: Some(after),
            next_to: Some(next_landing),
            redo_to: Some(body_block),
            return_to: None,
        };
        self.with_jump_targets(targets, |b| {
            b.fb.start_block(body_block);
            let value = b.walk_body(body)?;
            b.fb.emit(Instruction::Resume { value });
            b.fb.branch(None, body_block, after);
            Ok(())
        })?;

        if self.fb.is_materialized(next_landing) {
            self.fb.start_block(next_landing);
            let value = self.fb.const_temp(Constant::Nil);
            self.fb.emit(Instruction::Resume { value });
            self.fb.branch(None, body_block, after);
        }

        self.fb.start_block(after);
        Ok(())
    }
}
