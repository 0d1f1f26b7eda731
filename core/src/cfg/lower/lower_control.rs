//! file: core/src/cfg/lower/lower_control.rs
//! description: conditionals, loops, short-circuit operators and jumps.
//!
//! Each routine takes an optional result binding. With a result, every path
//! through the construct assigns it before joining at the shared after
//! block; without one, paths join without materializing anything.
//!
use crate::ast::{AstNode, AstNodeKind, BinaryOperator, Binding};
use crate::cfg::op::Instruction;
use crate::cfg::value::Constant;

use super::{BuildError, BuildErrorKind, BuildResult, GraphBuilder, JumpKind, JumpTargets};

impl<'a> GraphBuilder<'a> {
    /// `lhs && rhs` / `lhs || rhs` with `lhs` already evaluated.
    pub(crate) fn short_circuit(
        &mut self,
        op: BinaryOperator,
        lhs: Binding,
        rhs: &AstNode,
        result: Option<&Binding>,
    ) -> BuildResult<()> {
        let is_or = op == BinaryOperator::Or;
        match result {
            Some(result) => {
                let true_block = self.fb.create_block();
                let false_block = self.fb.create_block();
                let after = self.fb.create_block();
                self.fb.branch(Some(lhs.clone()), true_block, false_block);

                // The side that keeps the left operand, and the side that evaluates the right.
                let (keep, evaluate) = if is_or { (true_block, false_block) } else { (false_block, true_block) };

                self.fb.start_block(keep);
                self.fb.copy(result.clone(), lhs);
                self.fb.jump(after);

                self.fb.start_block(evaluate);
                let value = self.value_walk(rhs)?;
                self.fb.copy(result.clone(), value);
                self.fb.jump(after);

                self.fb.start_block(after);
            }
            None => {
                let evaluate = self.fb.create_block();
                let after = self.fb.create_block();
                if is_or {
                    self.fb.branch(Some(lhs), after, evaluate);
                } else {
                    self.fb.branch(Some(lhs), evaluate, after);
                }
                self.fb.start_block(evaluate);
                self.novalue_walk(rhs)?;
                self.fb.start_block(after);
            }
        }
        Ok(())
    }

    /// `target op= value`. A field receiver is evaluated once; `||=` and
    /// `&&=` on a field skip the setter when the current value decides.
    pub(crate) fn lower_opassign(
        &mut self,
        node: &AstNode,
        target: &AstNode,
        op: BinaryOperator,
        value: &AstNode,
        result: Option<&Binding>,
    ) -> BuildResult<()> {
        match target.get_kind() {
            AstNodeKind::Field { receiver, name } => {
                let receiver = self.value_walk(receiver)?;
                let current = self.fb.call_value(receiver.clone(), name, Vec::new());
                if !op.is_short_circuit() {
                    let rhs = self.value_walk(value)?;
                    let combined = self.fb.call_value(current, op.method_name(), vec![rhs]);
                    self.call_setter(receiver, name, combined.clone());
                    if let Some(result) = result {
                        self.fb.copy(result.clone(), combined);
                    }
                    return Ok(());
                }

                let is_or = op == BinaryOperator::Or;
                let after;
                let assign_block;
                match result {
                    Some(result) => {
                        let true_block = self.fb.create_block();
                        let false_block = self.fb.create_block();
                        after = self.fb.create_block();
                        self.fb.branch(Some(current.clone()), true_block, false_block);
                        let keep = if is_or { true_block } else { false_block };
                        assign_block = if is_or { false_block } else { true_block };

                        self.fb.start_block(keep);
                        self.fb.copy(result.clone(), current);
                        self.fb.jump(after);
                    }
                    None => {
                        assign_block = self.fb.create_block();
                        after = self.fb.create_block();
                        if is_or {
                            self.fb.branch(Some(current), after, assign_block);
                        } else {
                            self.fb.branch(Some(current), assign_block, after);
                        }
                    }
                }

                self.fb.start_block(assign_block);
                let rhs = self.value_walk(value)?;
                self.call_setter(receiver, name, rhs.clone());
                if let Some(result) = result {
                    self.fb.copy(result.clone(), rhs);
                }
                self.fb.jump(after);
                self.fb.start_block(after);
                Ok(())
            }
            AstNodeKind::VarField { .. } => {
                let binding = self.resolved_binding(target)?;
                let current = self.read_variable(&binding);
                let combined = if op.is_short_circuit() {
                    let combined = match result {
                        Some(result) => result.clone(),
                        None => self.fb.alloc_temp(),
                    };
                    self.short_circuit(op, current, value, Some(&combined))?;
                    combined
                } else {
                    let rhs = self.value_walk(value)?;
                    let combined = self.fb.call_value(current, op.method_name(), vec![rhs]);
                    if let Some(result) = result {
                        self.fb.copy(result.clone(), combined.clone());
                    }
                    combined
                };
                self.fb.copy(binding, combined);
                Ok(())
            }
            AstNodeKind::MultipleTarget { .. } => Err(BuildError::at(
                BuildErrorKind::NotYetImplemented,
                node,
                "compound assignment to multiple targets is not supported yet".to_string(),
                "flowgraph.lower.lower_opassign",
            )),
            _ => Err(Self::unsupported(target, "assignment target")),
        }
    }

    /// `if` with any number of `elsif` clauses and an optional `else`, or the
    /// modifier form.
    pub(crate) fn lower_if(&mut self, node: &AstNode, result: Option<&Binding>) -> BuildResult<()> {
        let after = self.fb.create_block();
        let mut current = Some(node);

        while let Some(clause) = current {
            let (condition, body, alternative) = match clause.get_kind() {
                AstNodeKind::If { condition, body, alternative }
                | AstNodeKind::Elsif { condition, body, alternative } => {
                    (&**condition, body.as_slice(), alternative.as_deref())
                }
                AstNodeKind::IfMod { condition, body } => (&**condition, std::slice::from_ref(&**body), None),
                AstNodeKind::Else { body } => {
                    // Emitted into the failure block of the previous clause.
                    self.walk_body_into(body, result)?;
                    self.fb.jump(after);
                    break;
                }
                _ => return Err(Self::unsupported(clause, "conditional clause")),
            };

            let true_block = self.fb.create_block();
            let next_block = if result.is_some() || alternative.is_some() {
                self.fb.create_block()
            } else {
                after
            };
            let cond = self.value_walk(condition)?;
            self.fb.branch(Some(cond), true_block, next_block);

            self.fb.start_block(true_block);
            self.walk_body_into(body, result)?;
            self.fb.jump(after);

            if next_block != after {
                self.fb.start_block(next_block);
                if alternative.is_none() {
                    if let Some(result) = result {
                        self.fb.load_const(result.clone(), Constant::Nil);
                    }
                    self.fb.jump(after);
                }
            }
            current = alternative;
        }

        self.fb.start_block(after);
        Ok(())
    }

    pub(crate) fn lower_unless(
        &mut self,
        condition: &AstNode,
        body: &[AstNode],
        else_body: Option<&[AstNode]>,
        result: Option<&Binding>,
    ) -> BuildResult<()> {
        let after = self.fb.create_block();
        let true_block = self.fb.create_block();
        let next_block = if result.is_some() || else_body.is_some() {
            self.fb.create_block()
        } else {
            after
        };

        let cond = self.value_walk(condition)?;
        self.fb.branch(Some(cond), next_block, true_block);

        self.fb.start_block(true_block);
        self.walk_body_into(body, result)?;
        self.fb.jump(after);

        if next_block != after {
            self.fb.start_block(next_block);
            match (else_body, result) {
                (Some(else_body), _) => self.walk_body_into(else_body, result)?,
                (None, Some(result)) => self.fb.load_const(result.clone(), Constant::Nil),
                (None, None) => {}
            }
            self.fb.jump(after);
        }

        self.fb.start_block(after);
        Ok(())
    }

    /// `case subject when a, b then ... else ... end`, testing each
    /// candidate with `candidate === subject`.
    pub(crate) fn lower_case(
        &mut self,
        subject: &AstNode,
        whens: &[AstNode],
        else_body: Option<&[AstNode]>,
        result: Option<&Binding>,
    ) -> BuildResult<()> {
        let after = self.fb.create_block();
        let subject = self.value_walk(subject)?;

        for when in whens {
            let (candidates, body) = match when.get_kind() {
                AstNodeKind::When { candidates, body } => (candidates, body),
                _ => return Err(Self::unsupported(when, "case clause")),
            };
            let body_block = self.fb.create_block();
            for candidate in candidates {
                let after_fail = self.fb.create_block();
                let value = self.value_walk(candidate)?;
                let matched = self.fb.call_value(value, "===", vec![subject.clone()]);
                self.fb.branch(Some(matched), body_block, after_fail);
                self.fb.start_block(after_fail);
            }
            let all_failed = self.fb.suspend();

            self.fb.start_block(body_block);
            self.walk_body_into(body, result)?;
            self.fb.jump(after);

            self.fb.resume(all_failed);
        }

        match (else_body, result) {
            (Some(else_body), _) => self.walk_body_into(else_body, result)?,
            (None, Some(result)) => self.fb.load_const(result.clone(), Constant::Nil),
            (None, None) => {}
        }
        self.fb.jump(after);
        self.fb.start_block(after);
        Ok(())
    }

    /// Pretest loop. The condition is evaluated in its own block and again
    /// at the end of the body; `until` swaps the branch targets.
    pub(crate) fn lower_loop(&mut self, condition: &AstNode, body: &[AstNode], until: bool) -> BuildResult<()> {
        let body_block = self.fb.create_block();
        let after = self.fb.create_block();
        let pretest = self.fb.create_block();
        let (on_true, on_false) = if until { (after, body_block) } else { (body_block, after) };

        let targets = JumpTargets {
            break_to: Some(after),
            next_to: Some(pretest),
            redo_to: Some(body_block),
            return_to: None,
        };
        self.with_jump_targets(targets, |b| {
            b.fb.start_block(pretest);
            let cond = b.value_walk(condition)?;
            b.fb.branch(Some(cond), on_true, on_false);

            b.fb.start_block(body_block);
            b.walk_body_novalue(body)?;
            let cond = b.value_walk(condition)?;
            b.fb.branch(Some(cond), on_true, on_false);
            Ok(())
        })?;

        self.fb.start_block(after);
        Ok(())
    }

    /// A body with an optional `ensure` clause. While the body runs, each
    /// active jump kind is redirected to a landing block that runs the
    /// ensure clause and then continues to the original target.
    pub(crate) fn lower_bodystmt(
        &mut self,
        body: &[AstNode],
        ensure: Option<&[AstNode]>,
        result: Option<&Binding>,
    ) -> BuildResult<()> {
        let body_block = self.fb.create_block();
        self.fb.jump(body_block);

        let ensure_body = match ensure {
            Some(ensure_body) => ensure_body,
            None => {
                self.fb.start_block(body_block);
                return self.walk_body_into(body, result);
            }
        };

        let mut redirected = JumpTargets::default();
        for kind in self.targets.active() {
            let original = match self.targets.get(kind) {
                Some(original) => original,
                None => continue,
            };
            let landing = self.fb.create_block();
            log::trace!("{} redirected through ensure landing {}", kind.keyword(), landing);
            self.fb.start_block(landing);
            self.walk_body_novalue(ensure_body)?;
            self.fb.jump(original);
            redirected.set(kind, landing);
        }

        self.with_jump_targets(redirected, |b| {
            b.fb.start_block(body_block);
            b.walk_body_into(body, result)
        })?;

        let ensure_block = self.fb.create_block();
        let after = self.fb.create_block();
        self.fb.start_block(ensure_block);
        self.walk_body_novalue(ensure_body)?;
        self.fb.start_block(after);
        Ok(())
    }

    /// `return`: no value is `nil`, one plain value is itself, several
    /// values or any splat become one array.
    pub(crate) fn lower_return(&mut self, node: &AstNode, args: &[AstNode]) -> BuildResult<()> {
        let target = self.jump_target(node, JumpKind::Return)?;
        let value = if args.iter().any(Self::is_splat) {
            self.compute_varargs(node, args)?
        } else if args.len() > 1 {
            self.build_array(node, args)?
        } else {
            match args.first() {
                Some(arg) => self.value_walk(arg)?,
                None => self.fb.const_temp(Constant::Nil),
            }
        };
        self.fb.emit(Instruction::Return { value });
        self.fb.jump(target);
        Ok(())
    }

    /// `break`, `next` or `redo`. Arguments are evaluated for their effects
    /// before the jump.
    pub(crate) fn lower_jump(&mut self, node: &AstNode, kind: JumpKind, args: &[AstNode]) -> BuildResult<()> {
        let target = self.jump_target(node, kind)?;
        for arg in args {
            match arg.get_kind() {
                AstNodeKind::Splat { value } => self.novalue_walk(value)?,
                _ => self.novalue_walk(arg)?,
            }
        }
        self.fb.jump(target);
        Ok(())
    }

    fn jump_target(&self, node: &AstNode, kind: JumpKind) -> BuildResult<crate::cfg::BlockName> {
        self.targets.get(kind).ok_or_else(|| {
            BuildError::at(
                BuildErrorKind::InvalidJumpContext,
                node,
                format!("`{}` has no enclosing target", kind.keyword()),
                "flowgraph.lower.jump_target",
            )
        })
    }
}
