//! file: core/src/ast/kind.rs
//! description: AST node kind definitions and operator enums.
//!
//! Defines `AstNodeKind` along with `BinaryOperator` and `UnaryOperator`.
//! The set of kinds is closed; both graph walkers match on it exhaustively.
//!
use super::binding::Parameter;
use super::node::AstNode;
use crate::cfg::value::Constant;

/// Binary operators. Every operator except the short-circuit pair lowers to
/// a method call on the left operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    And,     // && / and
    Or,      // || / or
    Plus,    // +
    Minus,   // -
    Times,   // *
    Divide,  // /
    Modulo,  // %
    Power,   // **
    Eq,      // ==
    NotEq,   // !=
    Lt,      // <
    Le,      // <=
    Gt,      // >
    Ge,      // >=
    Cmp,     // <=>
    CaseEq,  // ===
    Match,   // =~
    NoMatch, // !~
    Shl,     // <<
    Shr,     // >>
    BitAnd,  // &
    BitOr,   // |
    BitXor,  // ^
}

impl BinaryOperator {
    pub fn from_str(op: &str) -> Option<BinaryOperator> {
        let op = match op {
            "&&" | "and" => BinaryOperator::And,
            "||" | "or" => BinaryOperator::Or,
            "+" => BinaryOperator::Plus,
            "-" => BinaryOperator::Minus,
            "*" => BinaryOperator::Times,
            "/" => BinaryOperator::Divide,
            "%" => BinaryOperator::Modulo,
            "**" => BinaryOperator::Power,
            "==" => BinaryOperator::Eq,
            "!=" => BinaryOperator::NotEq,
            "<" => BinaryOperator::Lt,
            "<=" => BinaryOperator::Le,
            ">" => BinaryOperator::Gt,
            ">=" => BinaryOperator::Ge,
            "<=>" => BinaryOperator::Cmp,
            "===" => BinaryOperator::CaseEq,
            "=~" => BinaryOperator::Match,
            "!~" => BinaryOperator::NoMatch,
            "<<" => BinaryOperator::Shl,
            ">>" => BinaryOperator::Shr,
            "&" => BinaryOperator::BitAnd,
            "|" => BinaryOperator::BitOr,
            "^" => BinaryOperator::BitXor,
            _ => return None,
        };
        Some(op)
    }

    /// Name of the method the operator dispatches to.
    pub fn method_name(&self) -> &'static str {
        match self {
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Times => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Cmp => "<=>",
            BinaryOperator::CaseEq => "===",
            BinaryOperator::Match => "=~",
            BinaryOperator::NoMatch => "!~",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
        }
    }

    pub fn is_short_circuit(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,    // ! / not
    Minus,  // -@
    Plus,   // +@
    BitNot, // ~
}

impl UnaryOperator {
    pub fn from_str(op: &str) -> Option<UnaryOperator> {
        match op {
            "!" | "not" => Some(UnaryOperator::Not),
            "-@" | "-" => Some(UnaryOperator::Minus),
            "+@" | "+" => Some(UnaryOperator::Plus),
            "~" => Some(UnaryOperator::BitNot),
            _ => None,
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Minus => "-@",
            UnaryOperator::Plus => "+@",
            UnaryOperator::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNodeKind {
    /// Root statement list of one build.
    Program { body: Vec<AstNode> },

    Literal { value: Constant },
    /// Literal text inside a string, xstring or regexp.
    StringContent { value: String },
    StringLiteral { parts: Vec<AstNode> },
    /// `#{...}` inside a string.
    Interpolation { body: Vec<AstNode> },
    XStringLiteral { parts: Vec<AstNode> },
    RegexpLiteral { parts: Vec<AstNode>, options: String },
    ArrayLiteral { elements: Vec<AstNode> },
    /// `*value`; only meaningful inside argument and element lists.
    Splat { value: Box<AstNode> },

    VoidStmt,
    SelfRef,
    Begin { body: Box<AstNode> },
    Paren { body: Vec<AstNode> },
    BodyStmt { body: Vec<AstNode>, ensure: Option<Vec<AstNode>> },

    /// Variable read. A reference with no binding is a zero-argument call
    /// on the implicit receiver.
    VarRef { name: String },
    /// Variable in target position (assignment, `for`).
    VarField { name: String },
    Field { receiver: Box<AstNode>, name: String },
    MultipleTarget { targets: Vec<AstNode> },

    Assign { target: Box<AstNode>, value: Box<AstNode> },
    OpAssign { target: Box<AstNode>, op: BinaryOperator, value: Box<AstNode> },
    Binary { left: Box<AstNode>, op: BinaryOperator, right: Box<AstNode> },
    Unary { op: UnaryOperator, operand: Box<AstNode> },

    If { condition: Box<AstNode>, body: Vec<AstNode>, alternative: Option<Box<AstNode>> },
    Elsif { condition: Box<AstNode>, body: Vec<AstNode>, alternative: Option<Box<AstNode>> },
    Else { body: Vec<AstNode> },
    IfMod { condition: Box<AstNode>, body: Box<AstNode> },
    Unless { condition: Box<AstNode>, body: Vec<AstNode>, else_body: Option<Vec<AstNode>> },
    UnlessMod { condition: Box<AstNode>, body: Box<AstNode> },

    While { condition: Box<AstNode>, body: Vec<AstNode> },
    WhileMod { condition: Box<AstNode>, body: Box<AstNode> },
    Until { condition: Box<AstNode>, body: Vec<AstNode> },
    UntilMod { condition: Box<AstNode>, body: Box<AstNode> },
    For { target: Box<AstNode>, iterable: Box<AstNode>, body: Vec<AstNode> },

    Case { subject: Box<AstNode>, whens: Vec<AstNode>, else_body: Option<Vec<AstNode>> },
    When { candidates: Vec<AstNode>, body: Vec<AstNode> },

    /// `return` with an empty argument list is the bare form.
    Return { args: Vec<AstNode> },
    Break { args: Vec<AstNode> },
    Next { args: Vec<AstNode> },
    Redo,

    Call {
        receiver: Option<Box<AstNode>>,
        method: String,
        args: Vec<AstNode>,
        block_pass: Option<Box<AstNode>>,
        block: Option<Box<AstNode>>,
    },
    BlockLiteral { params: Vec<Parameter>, body: Vec<AstNode> },
    Super { args: Vec<AstNode>, block_pass: Option<Box<AstNode>>, block: Option<Box<AstNode>> },
    /// Argument-less `super`: re-sends the enclosing method's parameters.
    ZSuper { block: Option<Box<AstNode>> },
}

impl AstNodeKind {
    /// Short tag used in diagnostics; matches the reader's form names.
    pub fn tag(&self) -> &'static str {
        match self {
            AstNodeKind::Program { .. } => "program",
            AstNodeKind::Literal { .. } => "literal",
            AstNodeKind::StringContent { .. } => "string-content",
            AstNodeKind::StringLiteral { .. } => "str",
            AstNodeKind::Interpolation { .. } => "embed",
            AstNodeKind::XStringLiteral { .. } => "xstr",
            AstNodeKind::RegexpLiteral { .. } => "regexp",
            AstNodeKind::ArrayLiteral { .. } => "array",
            AstNodeKind::Splat { .. } => "splat",
            AstNodeKind::VoidStmt => "void",
            AstNodeKind::SelfRef => "self",
            AstNodeKind::Begin { .. } => "begin",
            AstNodeKind::Paren { .. } => "paren",
            AstNodeKind::BodyStmt { .. } => "bodystmt",
            AstNodeKind::VarRef { .. } => "var-ref",
            AstNodeKind::VarField { .. } => "var-field",
            AstNodeKind::Field { .. } => "field",
            AstNodeKind::MultipleTarget { .. } => "mlhs",
            AstNodeKind::Assign { .. } => "assign",
            AstNodeKind::OpAssign { .. } => "opassign",
            AstNodeKind::Binary { .. } => "binary",
            AstNodeKind::Unary { .. } => "unary",
            AstNodeKind::If { .. } => "if",
            AstNodeKind::Elsif { .. } => "elsif",
            AstNodeKind::Else { .. } => "else",
            AstNodeKind::IfMod { .. } => "if-mod",
            AstNodeKind::Unless { .. } => "unless",
            AstNodeKind::UnlessMod { .. } => "unless-mod",
            AstNodeKind::While { .. } => "while",
            AstNodeKind::WhileMod { .. } => "while-mod",
            AstNodeKind::Until { .. } => "until",
            AstNodeKind::UntilMod { .. } => "until-mod",
            AstNodeKind::For { .. } => "for",
            AstNodeKind::Case { .. } => "case",
            AstNodeKind::When { .. } => "when",
            AstNodeKind::Return { .. } => "return",
            AstNodeKind::Break { .. } => "break",
            AstNodeKind::Next { .. } => "next",
            AstNodeKind::Redo => "redo",
            AstNodeKind::Call { .. } => "call",
            AstNodeKind::BlockLiteral { .. } => "do-block",
            AstNodeKind::Super { .. } => "super",
            AstNodeKind::ZSuper { .. } => "zsuper",
        }
    }
}
