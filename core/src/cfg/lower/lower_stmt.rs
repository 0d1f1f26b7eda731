//! Lowering of nodes whose value is discarded.
//!
//! Mirrors `lower_expr` arm for arm, with the same side effects in the same
//! order, but without materializing results: pure literals and variable
//! reads emit nothing, and calls are issued without a destination.

use crate::ast::{AstNode, AstNodeKind};
use crate::cfg::op::BlockOperand;

use super::{BuildError, BuildErrorKind, BuildResult, GraphBuilder, JumpKind};

impl<'a> GraphBuilder<'a> {
    pub(crate) fn novalue_walk(&mut self, node: &AstNode) -> BuildResult<()> {
        self.descend(node)?;
        let result = self.novalue_walk_node(node);
        self.ascend();
        result
    }

    fn novalue_walk_node(&mut self, node: &AstNode) -> BuildResult<()> {
        match node.get_kind() {
            AstNodeKind::Program { body } | AstNodeKind::Paren { body } => self.walk_body_novalue(body),
            AstNodeKind::Begin { body } => self.novalue_walk(body),
            AstNodeKind::VoidStmt | AstNodeKind::SelfRef | AstNodeKind::VarField { .. } => Ok(()),
            AstNodeKind::Literal { .. } | AstNodeKind::StringContent { .. } => Ok(()),

            AstNodeKind::StringLiteral { parts } | AstNodeKind::RegexpLiteral { parts, .. } => {
                self.walk_body_novalue(parts)
            }
            AstNodeKind::Interpolation { body } => self.walk_body_novalue(body),
            AstNodeKind::XStringLiteral { parts } => self.lower_xstring(node, parts, None),
            AstNodeKind::ArrayLiteral { elements } => {
                for element in elements {
                    match element.get_kind() {
                        AstNodeKind::Splat { value } => self.novalue_walk(value)?,
                        _ => self.novalue_walk(element)?,
                    }
                }
                Ok(())
            }

            AstNodeKind::VarRef { name } => match node.get_binding() {
                Some(_) => Ok(()),
                None => self.lower_self_call(node, name, None),
            },

            AstNodeKind::Assign { target, value } => match target.get_kind() {
                AstNodeKind::VarField { .. } => {
                    let binding = self.resolved_binding(target)?;
                    let rhs = self.value_walk(value)?;
                    self.fb.copy(binding, rhs);
                    Ok(())
                }
                AstNodeKind::Field { receiver, name } => {
                    let receiver = self.value_walk(receiver)?;
                    let rhs = self.value_walk(value)?;
                    self.call_setter(receiver, name, rhs);
                    Ok(())
                }
                AstNodeKind::MultipleTarget { .. } => Err(BuildError::at(
                    BuildErrorKind::NotYetImplemented,
                    node,
                    "multiple assignment is not supported yet".to_string(),
                    "flowgraph.lower.novalue_walk",
                )),
                _ => Err(Self::unsupported(target, "assignment target")),
            },
            AstNodeKind::OpAssign { target, op, value } => self.lower_opassign(node, target, *op, value, None),
            AstNodeKind::Binary { left, op, right } => {
                let lhs = self.value_walk(left)?;
                if op.is_short_circuit() {
                    self.short_circuit(*op, lhs, right, None)
                } else {
                    let rhs = self.value_walk(right)?;
                    self.fb.call(None, lhs, op.method_name(), vec![rhs], BlockOperand::None);
                    Ok(())
                }
            }
            AstNodeKind::Unary { op, operand } => {
                let value = self.value_walk(operand)?;
                self.fb.call(None, value, op.method_name(), Vec::new(), BlockOperand::None);
                Ok(())
            }

            AstNodeKind::If { .. } | AstNodeKind::IfMod { .. } => self.lower_if(node, None),
            AstNodeKind::Unless { condition, body, else_body } => {
                self.lower_unless(condition, body, else_body.as_deref(), None)
            }
            AstNodeKind::UnlessMod { condition, body } => {
                self.lower_unless(condition, std::slice::from_ref(&**body), None, None)
            }
            AstNodeKind::Case { subject, whens, else_body } => {
                self.lower_case(subject, whens, else_body.as_deref(), None)
            }

            AstNodeKind::While { condition, body } => self.lower_loop(condition, body, false),
            AstNodeKind::Until { condition, body } => self.lower_loop(condition, body, true),
            AstNodeKind::WhileMod { condition, body } => {
                self.lower_loop(condition, std::slice::from_ref(&**body), false)
            }
            AstNodeKind::UntilMod { condition, body } => {
                self.lower_loop(condition, std::slice::from_ref(&**body), true)
            }
            AstNodeKind::For { .. } => self.lower_for(node, None),

            AstNodeKind::BodyStmt { body, ensure } => self.lower_bodystmt(body, ensure.as_deref(), None),

            AstNodeKind::Return { args } => self.lower_return(node, args),
            AstNodeKind::Break { args } => self.lower_jump(node, JumpKind::Break, args),
            AstNodeKind::Next { args } => self.lower_jump(node, JumpKind::Next, args),
            AstNodeKind::Redo => self.lower_jump(node, JumpKind::Redo, &[]),

            AstNodeKind::Call { .. } => self.lower_call(node, None),
            AstNodeKind::Super { .. } => self.lower_super(node, None),
            AstNodeKind::ZSuper { .. } => self.lower_zsuper(node, None),

            AstNodeKind::Field { .. }
            | AstNodeKind::MultipleTarget { .. }
            | AstNodeKind::Splat { .. }
            | AstNodeKind::Elsif { .. }
            | AstNodeKind::Else { .. }
            | AstNodeKind::When { .. }
            | AstNodeKind::BlockLiteral { .. } => Err(Self::unsupported(node, "statement")),
        }
    }
}
