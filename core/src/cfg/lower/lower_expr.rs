//! file: core/src/cfg/lower/lower_expr.rs
//! description: value walk.
//!
//! Every arm leaves exactly one binding holding the node's value. Jumps
//! (`break`, `return`, ...) still yield a `nil` placeholder, loaded in the
//! unreachable block that follows the jump.
//!
use crate::ast::{AstNode, AstNodeKind, Binding};
use crate::cfg::value::Constant;

use super::{BuildError, BuildErrorKind, BuildResult, GraphBuilder, JumpKind};

impl<'a> GraphBuilder<'a> {
    pub(crate) fn value_walk(&mut self, node: &AstNode) -> BuildResult<Binding> {
        self.descend(node)?;
        let result = self.value_walk_node(node);
        self.ascend();
        result
    }

    fn value_walk_node(&mut self, node: &AstNode) -> BuildResult<Binding> {
        match node.get_kind() {
            AstNodeKind::Program { body } | AstNodeKind::Paren { body } => self.walk_body(body),
            AstNodeKind::Begin { body } => self.value_walk(body),
            AstNodeKind::VoidStmt => Ok(self.fb.const_temp(Constant::Nil)),

            AstNodeKind::Literal { value } => Ok(self.fb.const_temp(value.clone())),
            AstNodeKind::StringContent { value } => Ok(self.fb.const_temp(Constant::Str(value.clone()))),
            AstNodeKind::StringLiteral { parts } => self.build_string(parts),
            AstNodeKind::Interpolation { body } => {
                let value = self.walk_body(body)?;
                Ok(self.fb.call_value(value, "to_s", Vec::new()))
            }
            AstNodeKind::XStringLiteral { parts } => {
                let t = self.fb.alloc_temp();
                self.lower_xstring(node, parts, Some(t.clone()))?;
                Ok(t)
            }
            AstNodeKind::RegexpLiteral { parts, options } => {
                let body = self.build_string(parts)?;
                let options = self.fb.const_temp(Constant::Str(options.clone()));
                let regexp = self.well_known("Regexp", node)?;
                Ok(self.fb.call_value(regexp, "new", vec![body, options]))
            }
            AstNodeKind::ArrayLiteral { elements } => {
                if elements.iter().any(Self::is_splat) {
                    self.compute_varargs(node, elements)
                } else {
                    self.build_array(node, elements)
                }
            }

            AstNodeKind::SelfRef => self.self_temp(node),
            AstNodeKind::VarRef { name } => match node.get_binding() {
                Some(binding) => Ok(self.read_variable(binding)),
                None => {
                    let t = self.fb.alloc_temp();
                    self.lower_self_call(node, name, Some(t.clone()))?;
                    Ok(t)
                }
            },
            AstNodeKind::VarField { .. } => {
                let binding = self.resolved_binding(node)?;
                Ok(self.read_variable(&binding))
            }

            AstNodeKind::Assign { target, value } => self.lower_assign(node, target, value),
            AstNodeKind::OpAssign { target, op, value } => {
                let t = self.fb.alloc_temp();
                self.lower_opassign(node, target, *op, value, Some(&t))?;
                Ok(t)
            }
            AstNodeKind::Binary { left, op, right } => {
                if op.is_short_circuit() {
                    let result = self.fb.alloc_temp();
                    let lhs = self.value_walk(left)?;
                    self.short_circuit(*op, lhs, right, Some(&result))?;
                    Ok(result)
                } else {
                    let lhs = self.value_walk(left)?;
                    let rhs = self.value_walk(right)?;
                    Ok(self.fb.call_value(lhs, op.method_name(), vec![rhs]))
                }
            }
            AstNodeKind::Unary { op, operand } => {
                let value = self.value_walk(operand)?;
                Ok(self.fb.call_value(value, op.method_name(), Vec::new()))
            }

            AstNodeKind::If { .. } | AstNodeKind::IfMod { .. } => {
                let result = self.fb.alloc_temp();
                self.lower_if(node, Some(&result))?;
                Ok(result)
            }
            AstNodeKind::Unless { condition, body, else_body } => {
                let result = self.fb.alloc_temp();
                self.lower_unless(condition, body, else_body.as_deref(), Some(&result))?;
                Ok(result)
            }
            AstNodeKind::UnlessMod { condition, body } => {
                let result = self.fb.alloc_temp();
                self.lower_unless(condition, std::slice::from_ref(&**body), None, Some(&result))?;
                Ok(result)
            }
            AstNodeKind::Case { subject, whens, else_body } => {
                let result = self.fb.alloc_temp();
                self.lower_case(subject, whens, else_body.as_deref(), Some(&result))?;
                Ok(result)
            }

            AstNodeKind::While { condition, body } => {
                self.lower_loop(condition, body, false)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::Until { condition, body } => {
                self.lower_loop(condition, body, true)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::WhileMod { condition, body } => {
                self.lower_loop(condition, std::slice::from_ref(&**body), false)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::UntilMod { condition, body } => {
                self.lower_loop(condition, std::slice::from_ref(&**body), true)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::For { .. } => {
                let t = self.fb.alloc_temp();
                self.lower_for(node, Some(t.clone()))?;
                Ok(t)
            }

            AstNodeKind::BodyStmt { body, ensure } => {
                let result = self.fb.alloc_temp();
                self.lower_bodystmt(body, ensure.as_deref(), Some(&result))?;
                Ok(result)
            }

            AstNodeKind::Return { args } => {
                self.lower_return(node, args)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::Break { args } => {
                self.lower_jump(node, JumpKind::Break, args)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::Next { args } => {
                self.lower_jump(node, JumpKind::Next, args)?;
                Ok(self.fb.const_temp(Constant::Nil))
            }
            AstNodeKind::Redo => {
                self.lower_jump(node, JumpKind::Redo, &[])?;
                Ok(self.fb.const_temp(Constant::Nil))
            }

            AstNodeKind::Call { .. } => {
                let t = self.fb.alloc_temp();
                self.lower_call(node, Some(t.clone()))?;
                Ok(t)
            }
            AstNodeKind::Super { .. } => {
                let t = self.fb.alloc_temp();
                self.lower_super(node, Some(t.clone()))?;
                Ok(t)
            }
            AstNodeKind::ZSuper { .. } => {
                let t = self.fb.alloc_temp();
                self.lower_zsuper(node, Some(t.clone()))?;
                Ok(t)
            }

            AstNodeKind::Field { .. }
            | AstNodeKind::MultipleTarget { .. }
            | AstNodeKind::Splat { .. }
            | AstNodeKind::Elsif { .. }
            | AstNodeKind::Else { .. }
            | AstNodeKind::When { .. }
            | AstNodeKind::BlockLiteral { .. } => Err(Self::unsupported(node, "expression")),
        }
    }

    /// `target = value`. The value of the whole expression is the right-hand
    /// side, also for setter calls.
    fn lower_assign(&mut self, node: &AstNode, target: &AstNode, value: &AstNode) -> BuildResult<Binding> {
        match target.get_kind() {
            AstNodeKind::VarField { .. } => {
                let binding = self.resolved_binding(target)?;
                let rhs = self.value_walk(value)?;
                self.fb.copy(binding, rhs.clone());
                Ok(rhs)
            }
            AstNodeKind::Field { receiver, name } => {
                let receiver = self.value_walk(receiver)?;
                let rhs = self.value_walk(value)?;
                self.call_setter(receiver, name, rhs.clone());
                Ok(rhs)
            }
            AstNodeKind::MultipleTarget { .. } => Err(BuildError::at(
                BuildErrorKind::NotYetImplemented,
                node,
                "multiple assignment is not supported yet".to_string(),
                "flowgraph.lower.lower_assign",
            )),
            _ => Err(Self::unsupported(target, "assignment target")),
        }
    }
}
