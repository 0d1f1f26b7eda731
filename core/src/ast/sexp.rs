//! file: core/src/ast/sexp.rs
//! description: reader for the s-expression AST interchange format.
//!
//! The resolution pass that produces annotated ASTs can dump them as
//! s-expressions; this module reads such a dump back into `AstNode`s.
//! Reading happens in two steps: the `pest` grammar turns text into a
//! generic tree of lists and atoms, then `FormReader` maps each form onto an
//! `AstNodeKind`, attaching bindings (from the variable form tags) and the
//! scope declared by the root `(program (scope ...) ...)` header.
//!
//! Both steps recurse once per level of list nesting. Before either runs,
//! `check_nesting` scans the text iteratively and rejects anything nested
//! deeper than `BuildOptions::max_depth`; the steps then run on a worker
//! whose stack is sized for that depth.
//!
use std::sync::Arc;

use pest::Parser;

use crate::ast::binding::{Binding, BindingKind, MethodSignature, Parameter, ParameterKind, Scope};
use crate::ast::err::{SyntaxError, SyntaxErrorKind};
use crate::ast::rules::{self, Rule, SexpParser};
use crate::ast::{AstNode, AstNodeKind, BinaryOperator, UnaryOperator};
use crate::cfg::value::Constant;
use crate::config::BuildOptions;
use crate::error::FlowgraphErrorExt;
use crate::location::{Location, Span};
use crate::source::Source;
use crate::stack;

type ReadResult<T> = Result<T, Box<dyn FlowgraphErrorExt>>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Atom {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone)]
pub(crate) enum SexpValue {
    List(Vec<Sexp>),
    Atom(Atom),
}

#[derive(Debug, Clone)]
pub(crate) struct Sexp {
    value: SexpValue,
    location: Option<Location>,
    span: Option<Span>,
}

impl Sexp {
    fn as_symbol(&self) -> Option<&str> {
        match &self.value {
            SexpValue::Atom(Atom::Symbol(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Tag of a list form such as `(if ...)`.
    fn tag(&self) -> Option<&str> {
        match &self.value {
            SexpValue::List(items) => items.first().and_then(|head| head.as_symbol()),
            _ => None,
        }
    }
}

/// Read a whole source into the root `Program` node, with the default
/// nesting limit.
pub fn read_source(source: &Source) -> ReadResult<AstNode> {
    read_source_with_options(source, &BuildOptions::default())
}

pub fn read_source_with_options(source: &Source, options: &BuildOptions) -> ReadResult<AstNode> {
    if source.is_empty() {
        let err: Box<dyn FlowgraphErrorExt> =
            Box::new(SyntaxError::empty_source(&source.name, "flowgraph.ast.sexp.read_source"));
        return Err(err);
    }
    check_nesting(source, options.max_depth)?;

    let worker = stack::run_with_stack("flowgraph-read", options.max_depth, || read_root(source));
    match worker {
        Ok(result) => result,
        Err(e) => {
            let err: Box<dyn FlowgraphErrorExt> = Box::new(SyntaxError::with(
                SyntaxErrorKind::TooDeep,
                format!(
                    "cannot reserve {} bytes of stack for {} levels of nesting: {}",
                    stack::stack_size_for(options.max_depth),
                    options.max_depth,
                    e
                ),
                "flowgraph.ast.sexp.read_source".into(),
                None,
                None,
            ));
            Err(err)
        }
    }
}

fn read_root(source: &Source) -> ReadResult<AstNode> {
    let forms = read_forms(source)?;
    log::debug!("read {} top-level form(s) from {}", forms.len(), source.name);
    if forms.len() != 1 {
        let (location, span) = match forms.get(1) {
            Some(extra) => (extra.location.clone(), extra.span.clone()),
            None => (None, None),
        };
        let err: Box<dyn FlowgraphErrorExt> = Box::new(SyntaxError::with(
            SyntaxErrorKind::UnknownForm,
            format!("Expected exactly one top-level form, found {}.", forms.len()),
            "flowgraph.ast.sexp.read_source".into(),
            location,
            span,
        ));
        return Err(err);
    }

    let mut reader = FormReader { scope: Arc::new(Scope::new(Binding::self_ref("main"))) };
    reader.program(&forms[0])
}

/// Reject list nesting deeper than `max_depth`. Parentheses inside strings
/// and comments do not count. The error points at the first `(` past the
/// limit.
fn check_nesting(source: &Source, max_depth: usize) -> ReadResult<()> {
    let mut depth = 0usize;
    let (mut line, mut column) = (1usize, 0usize);
    let mut in_string = false;
    let mut in_comment = false;
    let mut chars = source.content.chars();
    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            column = 0;
            in_comment = false;
            continue;
        }
        column += 1;
        if in_comment {
            continue;
        }
        if in_string {
            match c {
                '\\' => match chars.next() {
                    Some('\n') => {
                        line += 1;
                        column = 0;
                    }
                    Some(_) => column += 1,
                    None => {}
                },
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            ';' => in_comment = true,
            '"' => in_string = true,
            '(' => {
                depth += 1;
                if depth > max_depth {
                    let err: Box<dyn FlowgraphErrorExt> = Box::new(SyntaxError::with(
                        SyntaxErrorKind::TooDeep,
                        format!("lists nest deeper than the limit of {} levels", max_depth),
                        "flowgraph.ast.sexp.check_nesting".into(),
                        Some(Location::new(source.name.clone(), line, column)),
                        None,
                    ));
                    return Err(err);
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

pub(crate) fn read_forms(source: &Source) -> ReadResult<Vec<Sexp>> {
    let mut pairs = SexpParser::parse(Rule::document, &source.content).map_err(|e| {
        let location = rules::get_location_from_error(&e, source);
        let err: Box<dyn FlowgraphErrorExt> = Box::new(SyntaxError::with(
            SyntaxErrorKind::Malformed,
            format!("Malformed s-expression: {}", e.variant.message()),
            "flowgraph.ast.sexp.read_forms".into(),
            Some(location),
            None,
        ));
        err
    })?;

    let mut forms = Vec::new();
    if let Some(document) = pairs.next() {
        for pair in document.into_inner() {
            if pair.as_rule() == Rule::EOI {
                continue;
            }
            forms.push(lower_pair(pair, source)?);
        }
    }
    Ok(forms)
}

fn lower_pair(pair: pest::iterators::Pair<Rule>, source: &Source) -> ReadResult<Sexp> {
    let location = rules::get_location_from_pair(&pair, source);
    let span = rules::get_span_from_pair(&pair, source);
    let bad_atom = |message: String| -> Box<dyn FlowgraphErrorExt> {
        Box::new(SyntaxError::with(
            SyntaxErrorKind::Malformed,
            message,
            "flowgraph.ast.sexp.lower_pair".into(),
            location.clone(),
            span.clone(),
        ))
    };

    let value = match pair.as_rule() {
        Rule::list => {
            let mut items = Vec::new();
            for inner in pair.into_inner() {
                items.push(lower_pair(inner, source)?);
            }
            SexpValue::List(items)
        }
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            SexpValue::Atom(Atom::Str(unescape(raw)))
        }
        Rule::integer => {
            let text = pair.as_str();
            let value = text
                .parse::<i64>()
                .map_err(|_| bad_atom(format!("Integer literal {} is out of range.", text)))?;
            SexpValue::Atom(Atom::Int(value))
        }
        Rule::float => {
            let text = pair.as_str();
            let value = text
                .parse::<f64>()
                .map_err(|_| bad_atom(format!("Invalid float literal {}.", text)))?;
            SexpValue::Atom(Atom::Float(value))
        }
        Rule::symbol => SexpValue::Atom(Atom::Symbol(pair.as_str().to_string())),
        other => return Err(bad_atom(format!("Unexpected rule {:?}.", other))),
    };

    Ok(Sexp { value, location, span })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

struct FormReader {
    scope: Arc<Scope>,
}

impl FormReader {
    fn error(&self, sexp: &Sexp, message: String, issuer: &str) -> Box<dyn FlowgraphErrorExt> {
        Box::new(SyntaxError::with(
            SyntaxErrorKind::UnknownForm,
            message,
            format!("flowgraph.ast.sexp.{}", issuer),
            sexp.location.clone(),
            sexp.span.clone(),
        ))
    }

    fn make(&self, sexp: &Sexp, kind: AstNodeKind) -> AstNode {
        AstNode::new(kind, sexp.location.clone(), sexp.span.clone()).with_scope(self.scope.clone())
    }

    /// Split a list form into its tag and arguments.
    fn form<'s>(&self, sexp: &'s Sexp) -> ReadResult<(&'s str, &'s [Sexp])> {
        match &sexp.value {
            SexpValue::List(items) => match items.split_first() {
                Some((head, rest)) => match head.as_symbol() {
                    Some(tag) => Ok((tag, rest)),
                    None => Err(self.error(sexp, "Form must start with a symbol tag.".into(), "form")),
                },
                None => Err(self.error(sexp, "Empty form.".into(), "form")),
            },
            SexpValue::Atom(_) => Err(self.error(sexp, "Expected a form, found an atom.".into(), "form")),
        }
    }

    fn arity(&self, sexp: &Sexp, tag: &str, args: &[Sexp], min: usize, max: Option<usize>) -> ReadResult<()> {
        let ok = args.len() >= min && max.map_or(true, |m| args.len() <= m);
        if ok {
            return Ok(());
        }
        let expected = match max {
            Some(m) if m == min => format!("{}", min),
            Some(m) => format!("{} to {}", min, m),
            None => format!("at least {}", min),
        };
        Err(self.error(
            sexp,
            format!("Form `{}` expects {} argument(s), found {}.", tag, expected, args.len()),
            "arity",
        ))
    }

    fn name(&self, sexp: &Sexp) -> ReadResult<String> {
        match &sexp.value {
            SexpValue::Atom(Atom::Symbol(s)) | SexpValue::Atom(Atom::Str(s)) => Ok(s.clone()),
            _ => Err(self.error(sexp, "Expected a name.".into(), "name")),
        }
    }

    fn string(&self, sexp: &Sexp) -> ReadResult<String> {
        match &sexp.value {
            SexpValue::Atom(Atom::Str(s)) => Ok(s.clone()),
            _ => Err(self.error(sexp, "Expected a string atom.".into(), "string")),
        }
    }

    fn exprs(&self, items: &[Sexp]) -> ReadResult<Vec<AstNode>> {
        items.iter().map(|item| self.expr(item)).collect()
    }

    /// `(seq S...)`
    fn seq(&self, sexp: &Sexp) -> ReadResult<Vec<AstNode>> {
        let (tag, args) = self.form(sexp)?;
        if tag != "seq" {
            return Err(self.error(sexp, format!("Expected a `seq` form, found `{}`.", tag), "seq"));
        }
        self.exprs(args)
    }

    fn program(&mut self, root: &Sexp) -> ReadResult<AstNode> {
        if root.tag() != Some("program") {
            let body = vec![self.expr(root)?];
            return Ok(self.make(root, AstNodeKind::Program { body }));
        }
        let (_, mut args) = self.form(root)?;
        if let Some(first) = args.first() {
            if first.tag() == Some("scope") {
                self.scope = Arc::new(self.scope_header(first)?);
                args = &args[1..];
            }
        }
        let body = self.exprs(args)?;
        Ok(self.make(root, AstNodeKind::Program { body }))
    }

    /// `(scope SELF [(def NAME P...)])`
    fn scope_header(&self, sexp: &Sexp) -> ReadResult<Scope> {
        let (tag, args) = self.form(sexp)?;
        self.arity(sexp, tag, args, 1, Some(2))?;
        let mut scope = Scope::new(Binding::self_ref(self.name(&args[0])?));
        if let Some(def) = args.get(1) {
            let (def_tag, def_args) = self.form(def)?;
            if def_tag != "def" {
                return Err(self.error(def, format!("Expected a `def` form, found `{}`.", def_tag), "scope_header"));
            }
            self.arity(def, def_tag, def_args, 1, None)?;
            let name = self.name(&def_args[0])?;
            let params = def_args[1..].iter().map(|p| self.param(p)).collect::<ReadResult<Vec<_>>>()?;
            scope = scope.with_method(MethodSignature { name, params });
        }
        Ok(scope)
    }

    fn param(&self, sexp: &Sexp) -> ReadResult<Parameter> {
        let (tag, args) = self.form(sexp)?;
        self.arity(sexp, tag, args, 1, Some(1))?;
        let kind = match tag {
            "req" => ParameterKind::Required,
            "opt" => ParameterKind::Optional,
            "rest" => ParameterKind::Rest,
            "post" => ParameterKind::Post,
            "block" => ParameterKind::Block,
            other => return Err(self.error(sexp, format!("Unknown parameter kind `{}`.", other), "param")),
        };
        Ok(Parameter::new(Binding::local(self.name(&args[0])?), kind))
    }

    fn variable_kind(tag: &str) -> Option<BindingKind> {
        match tag {
            "lvar" => Some(BindingKind::Local),
            "ivar" => Some(BindingKind::Instance),
            "gvar" => Some(BindingKind::Global),
            "const" => Some(BindingKind::Constant),
            _ => None,
        }
    }

    /// Assignment and loop targets.
    fn target(&self, sexp: &Sexp) -> ReadResult<AstNode> {
        let (tag, args) = self.form(sexp)?;
        if let Some(kind) = Self::variable_kind(tag) {
            self.arity(sexp, tag, args, 1, Some(1))?;
            let name = self.name(&args[0])?;
            let binding = Binding::new(name.clone(), kind);
            return Ok(self.make(sexp, AstNodeKind::VarField { name }).with_binding(binding));
        }
        match tag {
            "field" => {
                self.arity(sexp, tag, args, 2, Some(2))?;
                let receiver = Box::new(self.expr(&args[0])?);
                let name = self.name(&args[1])?;
                Ok(self.make(sexp, AstNodeKind::Field { receiver, name }))
            }
            "mlhs" => {
                let targets = args.iter().map(|t| self.target(t)).collect::<ReadResult<Vec<_>>>()?;
                Ok(self.make(sexp, AstNodeKind::MultipleTarget { targets }))
            }
            other => Err(self.error(sexp, format!("`{}` is not an assignable target.", other), "target")),
        }
    }

    /// `(elsif ...)` or `(else ...)` trailing an `if`.
    fn alternative(&self, sexp: &Sexp) -> ReadResult<AstNode> {
        let (tag, args) = self.form(sexp)?;
        match tag {
            "elsif" => {
                self.arity(sexp, tag, args, 2, Some(3))?;
                let condition = Box::new(self.expr(&args[0])?);
                let body = self.seq(&args[1])?;
                let alternative = match args.get(2) {
                    Some(alt) => Some(Box::new(self.alternative(alt)?)),
                    None => None,
                };
                Ok(self.make(sexp, AstNodeKind::Elsif { condition, body, alternative }))
            }
            "else" => {
                let body = self.exprs(args)?;
                Ok(self.make(sexp, AstNodeKind::Else { body }))
            }
            other => Err(self.error(sexp, format!("Expected `elsif` or `else`, found `{}`.", other), "alternative")),
        }
    }

    fn else_body(&self, sexp: &Sexp) -> ReadResult<Vec<AstNode>> {
        let (tag, args) = self.form(sexp)?;
        if tag != "else" {
            return Err(self.error(sexp, format!("Expected an `else` form, found `{}`.", tag), "else_body"));
        }
        self.exprs(args)
    }

    fn string_parts(&self, items: &[Sexp]) -> ReadResult<Vec<AstNode>> {
        let mut parts = Vec::new();
        for item in items {
            match &item.value {
                SexpValue::Atom(Atom::Str(text)) => {
                    parts.push(self.make(item, AstNodeKind::StringContent { value: text.clone() }));
                }
                _ => parts.push(self.expr(item)?),
            }
        }
        Ok(parts)
    }

    fn block_literal(&self, sexp: &Sexp) -> ReadResult<AstNode> {
        let (tag, args) = self.form(sexp)?;
        self.arity(sexp, tag, args, 1, None)?;
        let (params_tag, params_args) = self.form(&args[0])?;
        if params_tag != "params" {
            return Err(self.error(&args[0], "A `do-block` starts with a `params` form.".into(), "block_literal"));
        }
        let params = params_args.iter().map(|p| self.param(p)).collect::<ReadResult<Vec<_>>>()?;
        let body = self.exprs(&args[1..])?;
        Ok(self.make(sexp, AstNodeKind::BlockLiteral { params, body }))
    }

    /// Split call arguments into positional args, `&blk` and a trailing block.
    fn call_args(&self, items: &[Sexp]) -> ReadResult<(Vec<AstNode>, Option<Box<AstNode>>, Option<Box<AstNode>>)> {
        let mut args = Vec::new();
        let mut block_pass = None;
        let mut block = None;
        for item in items {
            match item.tag() {
                Some("block-pass") => {
                    let (tag, inner) = self.form(item)?;
                    self.arity(item, tag, inner, 1, Some(1))?;
                    block_pass = Some(Box::new(self.expr(&inner[0])?));
                }
                Some("do-block") => block = Some(Box::new(self.block_literal(item)?)),
                _ => args.push(self.expr(item)?),
            }
        }
        Ok((args, block_pass, block))
    }

    fn literal(&self, sexp: &Sexp, value: Constant) -> AstNode {
        self.make(sexp, AstNodeKind::Literal { value })
    }

    fn expr(&self, sexp: &Sexp) -> ReadResult<AstNode> {
        let atom = match &sexp.value {
            SexpValue::Atom(atom) => Some(atom),
            SexpValue::List(_) => None,
        };
        if let Some(atom) = atom {
            return match atom {
                Atom::Int(v) => Ok(self.literal(sexp, Constant::Integer(*v))),
                Atom::Float(v) => Ok(self.literal(sexp, Constant::Float(*v))),
                Atom::Str(text) => {
                    let part = self.make(sexp, AstNodeKind::StringContent { value: text.clone() });
                    Ok(self.make(sexp, AstNodeKind::StringLiteral { parts: vec![part] }))
                }
                Atom::Symbol(s) => match s.as_str() {
                    "nil" => Ok(self.literal(sexp, Constant::Nil)),
                    "true" => Ok(self.literal(sexp, Constant::Bool(true))),
                    "false" => Ok(self.literal(sexp, Constant::Bool(false))),
                    "self" => Ok(self.make(sexp, AstNodeKind::SelfRef)),
                    other => Err(self.error(sexp, format!("Bare symbol `{}` is not an expression.", other), "expr")),
                },
            };
        }

        let (tag, args) = self.form(sexp)?;
        if let Some(kind) = Self::variable_kind(tag) {
            self.arity(sexp, tag, args, 1, Some(1))?;
            let name = self.name(&args[0])?;
            let binding = Binding::new(name.clone(), kind);
            return Ok(self.make(sexp, AstNodeKind::VarRef { name }).with_binding(binding));
        }

        let kind = match tag {
            "nil" | "true" | "false" => {
                self.arity(sexp, tag, args, 0, Some(0))?;
                let value = match tag {
                    "nil" => Constant::Nil,
                    "true" => Constant::Bool(true),
                    _ => Constant::Bool(false),
                };
                AstNodeKind::Literal { value }
            }
            "int" | "float" => {
                self.arity(sexp, tag, args, 1, Some(1))?;
                let value = match (&args[0].value, tag) {
                    (SexpValue::Atom(Atom::Int(v)), "int") => Constant::Integer(*v),
                    (SexpValue::Atom(Atom::Float(v)), "float") => Constant::Float(*v),
                    (SexpValue::Atom(Atom::Int(v)), "float") => Constant::Float(*v as f64),
                    _ => return Err(self.error(&args[0], format!("Form `{}` expects a number.", tag), "expr")),
                };
                AstNodeKind::Literal { value }
            }
            "sym" | "label" => {
                self.arity(sexp, tag, args, 1, Some(1))?;
                AstNodeKind::Literal { value: Constant::Symbol(self.name(&args[0])?) }
            }
            "char" => {
                self.arity(sexp, tag, args, 1, Some(1))?;
                AstNodeKind::Literal { value: Constant::Str(self.string(&args[0])?) }
            }
            "str" => AstNodeKind::StringLiteral { parts: self.string_parts(args)? },
            "xstr" => AstNodeKind::XStringLiteral { parts: self.string_parts(args)? },
            "regexp" => {
                self.arity(sexp, tag, args, 1, None)?;
                let options = self.string(&args[0])?;
                AstNodeKind::RegexpLiteral { parts: self.string_parts(&args[1..])?, options }
            }
            "embed" => AstNodeKind::Interpolation { body: self.exprs(args)? },
            "array" => AstNodeKind::ArrayLiteral { elements: self.exprs(args)? },
            "splat" => {
                self.arity(sexp, tag, args, 1, Some(1))?;
                AstNodeKind::Splat { value: Box::new(self.expr(&args[0])?) }
            }
            "void" => AstNodeKind::VoidStmt,
            "self" => AstNodeKind::SelfRef,
            "begin" => {
                self.arity(sexp, tag, args, 1, Some(1))?;
                AstNodeKind::Begin { body: Box::new(self.expr(&args[0])?) }
            }
            "paren" => AstNodeKind::Paren { body: self.exprs(args)? },
            "bodystmt" => {
                self.arity(sexp, tag, args, 1, Some(2))?;
                let body = self.seq(&args[0])?;
                let ensure = match args.get(1) {
                    Some(ensure) => {
                        let (ensure_tag, ensure_args) = self.form(ensure)?;
                        if ensure_tag != "ensure" {
                            return Err(self.error(ensure, format!("Expected an `ensure` form, found `{}`.", ensure_tag), "expr"));
                        }
                        Some(self.exprs(ensure_args)?)
                    }
                    None => None,
                };
                AstNodeKind::BodyStmt { body, ensure }
            }
            "vcall" => {
                self.arity(sexp, tag, args, 1, Some(1))?;
                AstNodeKind::VarRef { name: self.name(&args[0])? }
            }
            "field" | "mlhs" => return self.target(sexp),
            "assign" => {
                self.arity(sexp, tag, args, 2, Some(2))?;
                AstNodeKind::Assign {
                    target: Box::new(self.target(&args[0])?),
                    value: Box::new(self.expr(&args[1])?),
                }
            }
            "opassign" | "binary" => {
                self.arity(sexp, tag, args, 3, Some(3))?;
                let op_text = self.name(&args[1])?;
                let op = BinaryOperator::from_str(&op_text)
                    .ok_or_else(|| self.error(&args[1], format!("Unknown binary operator `{}`.", op_text), "expr"))?;
                if tag == "opassign" {
                    AstNodeKind::OpAssign {
                        target: Box::new(self.target(&args[0])?),
                        op,
                        value: Box::new(self.expr(&args[2])?),
                    }
                } else {
                    AstNodeKind::Binary {
                        left: Box::new(self.expr(&args[0])?),
                        op,
                        right: Box::new(self.expr(&args[2])?),
                    }
                }
            }
            "unary" => {
                self.arity(sexp, tag, args, 2, Some(2))?;
                let op_text = self.name(&args[0])?;
                let op = UnaryOperator::from_str(&op_text)
                    .ok_or_else(|| self.error(&args[0], format!("Unknown unary operator `{}`.", op_text), "expr"))?;
                AstNodeKind::Unary { op, operand: Box::new(self.expr(&args[1])?) }
            }
            "if" => {
                self.arity(sexp, tag, args, 2, Some(3))?;
                let condition = Box::new(self.expr(&args[0])?);
                let body = self.seq(&args[1])?;
                let alternative = match args.get(2) {
                    Some(alt) => Some(Box::new(self.alternative(alt)?)),
                    None => None,
                };
                AstNodeKind::If { condition, body, alternative }
            }
            "elsif" | "else" => return self.alternative(sexp),
            "unless" => {
                self.arity(sexp, tag, args, 2, Some(3))?;
                let condition = Box::new(self.expr(&args[0])?);
                let body = self.seq(&args[1])?;
                let else_body = match args.get(2) {
                    Some(e) => Some(self.else_body(e)?),
                    None => None,
                };
                AstNodeKind::Unless { condition, body, else_body }
            }
            "if-mod" | "unless-mod" | "while-mod" | "until-mod" => {
                self.arity(sexp, tag, args, 2, Some(2))?;
                let condition = Box::new(self.expr(&args[0])?);
                let body = Box::new(self.expr(&args[1])?);
                match tag {
                    "if-mod" => AstNodeKind::IfMod { condition, body },
                    "unless-mod" => AstNodeKind::UnlessMod { condition, body },
                    "while-mod" => AstNodeKind::WhileMod { condition, body },
                    _ => AstNodeKind::UntilMod { condition, body },
                }
            }
            "while" | "until" => {
                self.arity(sexp, tag, args, 1, None)?;
                let condition = Box::new(self.expr(&args[0])?);
                let body = self.exprs(&args[1..])?;
                if tag == "while" {
                    AstNodeKind::While { condition, body }
                } else {
                    AstNodeKind::Until { condition, body }
                }
            }
            "for" => {
                self.arity(sexp, tag, args, 2, None)?;
                AstNodeKind::For {
                    target: Box::new(self.target(&args[0])?),
                    iterable: Box::new(self.expr(&args[1])?),
                    body: self.exprs(&args[2..])?,
                }
            }
            "case" => {
                self.arity(sexp, tag, args, 1, None)?;
                let subject = Box::new(self.expr(&args[0])?);
                let mut whens = Vec::new();
                let mut else_body = None;
                for (i, clause) in args[1..].iter().enumerate() {
                    match clause.tag() {
                        Some("when") => whens.push(self.when_clause(clause)?),
                        Some("else") if i == args.len() - 2 => else_body = Some(self.else_body(clause)?),
                        _ => return Err(self.error(clause, "Expected a `when` clause or a final `else`.".into(), "expr")),
                    }
                }
                AstNodeKind::Case { subject, whens, else_body }
            }
            "when" => return self.when_clause(sexp),
            "return" | "break" | "next" => {
                let args = self.exprs(args)?;
                match tag {
                    "return" => AstNodeKind::Return { args },
                    "break" => AstNodeKind::Break { args },
                    _ => AstNodeKind::Next { args },
                }
            }
            "return0" => {
                self.arity(sexp, tag, args, 0, Some(0))?;
                AstNodeKind::Return { args: Vec::new() }
            }
            "redo" => {
                self.arity(sexp, tag, args, 0, Some(0))?;
                AstNodeKind::Redo
            }
            "call" => {
                self.arity(sexp, tag, args, 2, None)?;
                let receiver = match args[0].as_symbol() {
                    Some("_") => None,
                    _ => Some(Box::new(self.expr(&args[0])?)),
                };
                let method = self.name(&args[1])?;
                let (call_args, block_pass, block) = self.call_args(&args[2..])?;
                AstNodeKind::Call { receiver, method, args: call_args, block_pass, block }
            }
            "do-block" => return self.block_literal(sexp),
            "super" => {
                let (call_args, block_pass, block) = self.call_args(args)?;
                AstNodeKind::Super { args: call_args, block_pass, block }
            }
            "zsuper" => {
                self.arity(sexp, tag, args, 0, Some(1))?;
                let block = match args.first() {
                    Some(b) => Some(Box::new(self.block_literal(b)?)),
                    None => None,
                };
                AstNodeKind::ZSuper { block }
            }
            other => return Err(self.error(sexp, format!("Unknown or misplaced form `{}`.", other), "expr")),
        };
        Ok(self.make(sexp, kind))
    }

    /// `(when (seq CAND...) S...)`
    fn when_clause(&self, sexp: &Sexp) -> ReadResult<AstNode> {
        let (tag, args) = self.form(sexp)?;
        self.arity(sexp, tag, args, 1, None)?;
        let candidates = self.seq(&args[0])?;
        let body = self.exprs(&args[1..])?;
        Ok(self.make(sexp, AstNodeKind::When { candidates, body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> AstNode {
        read_source(&Source::new("test.sx", text)).expect("read")
    }

    fn body(node: &AstNode) -> &[AstNode] {
        match node.get_kind() {
            AstNodeKind::Program { body } => body,
            other => panic!("expected program, got {:?}", other),
        }
    }

    #[test]
    fn bare_form_is_wrapped_in_program() {
        let root = read("(assign (lvar x) 1)");
        let stmts = body(&root);
        assert_eq!(stmts.len(), 1);
        match stmts[0].get_kind() {
            AstNodeKind::Assign { target, value } => {
                assert_eq!(target.get_binding(), Some(&Binding::local("x")));
                assert!(matches!(value.get_kind(), AstNodeKind::Literal { value: Constant::Integer(1) }));
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn scope_header_attaches_method_signature() {
        let root = read("(program (scope Widget (def resize (req w) (rest more))) (zsuper))");
        let scope = body(&root)[0].get_scope().expect("scope");
        assert_eq!(scope.lookup_self(), &Binding::self_ref("Widget"));
        let method = scope.method.as_ref().expect("method");
        assert_eq!(method.name, "resize");
        assert_eq!(method.rest_index(), Some(1));
    }

    #[test]
    fn strings_comments_and_escapes() {
        let root = read("; leading comment\n(str \"a\\\"b\" (embed (lvar x)))");
        match body(&root)[0].get_kind() {
            AstNodeKind::StringLiteral { parts } => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[0].get_kind(), AstNodeKind::StringContent { value } if value == "a\"b"));
                assert!(matches!(parts[1].get_kind(), AstNodeKind::Interpolation { .. }));
            }
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn call_arguments_are_classified() {
        let root = read("(call _ each (int 1) (block-pass (lvar b)) (do-block (params (req x)) (lvar x)))");
        match body(&root)[0].get_kind() {
            AstNodeKind::Call { receiver, method, args, block_pass, block } => {
                assert!(receiver.is_none());
                assert_eq!(method, "each");
                assert_eq!(args.len(), 1);
                assert!(block_pass.is_some());
                assert!(matches!(block.as_deref().map(|b| b.get_kind()), Some(AstNodeKind::BlockLiteral { .. })));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn nodes_carry_locations() {
        let root = read("(program\n  (void))");
        let loc = body(&root)[0].location.as_ref().expect("location");
        assert_eq!((loc.line, loc.column), (2, 3));
        assert_eq!(loc.file, "test.sx");
    }

    #[test]
    fn unknown_form_is_a_syntax_error() {
        let err = read_source(&Source::new("bad.sx", "(frobnicate 1)")).unwrap_err();
        assert!(err.message().contains("frobnicate"));
        assert_eq!(err.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn unbalanced_text_is_rejected() {
        let err = read_source(&Source::new("bad.sx", "(assign (lvar x) 1")).unwrap_err();
        assert!(err.message().starts_with("Malformed s-expression"));
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = read_source(&Source::new("empty.sx", "   \n")).unwrap_err();
        assert_eq!(err.issuer(), "flowgraph.ast.sexp.read_source");
    }

    #[test]
    fn arity_is_checked() {
        let err = read_source(&Source::new("bad.sx", "(assign (lvar x))")).unwrap_err();
        assert!(err.message().contains("expects 2 argument(s)"));
    }
}
