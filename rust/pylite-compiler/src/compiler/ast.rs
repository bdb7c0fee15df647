use crate::compiler::tokens::Span;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// A complete parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Block(BlockStatement),
    Expression(ExpressionStatement),
    Empty(EmptyStatement),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(b) => b.span,
            Stmt::Expression(e) => e.span,
            Stmt::Empty(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Statements on the same line as the colon.
    SingleLine,
    /// An indented suite on the following lines.
    MultiLine,
}

/// Statements introduced by a colon.
///
/// `indent` is the width of the block body for multi-line blocks and the
/// enclosing width for single-line ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatement {
    pub body: Vec<Stmt>,
    pub indent: usize,
    pub kind: BlockKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Expr,
    pub span: Span,
}

/// A lone `;`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyStatement {
    pub span: Span,
}

/// Decoded value of a literal token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum LiteralValue {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// `name=value` in a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    /// `raw` keeps the source spelling; `is_complex` marks a `j` suffix, in
    /// which case `value` holds the imaginary magnitude.
    Literal { value: LiteralValue, raw: String, is_complex: bool, span: Span },
    Identifier { name: String, span: Span },
    List { elements: Vec<Expr>, span: Span },
    Tuple { elements: Vec<Expr>, span: Span },
    Set { elements: Vec<Expr>, span: Span },
    /// `keys[i]` maps to `values[i]`.
    Dict { keys: Vec<Expr>, values: Vec<Expr>, span: Span },
    Call { callee: Box<Expr>, args: Vec<Expr>, keywords: Vec<Keyword>, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::List { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Set { span, .. }
            | Expr::Dict { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }

    /// Copy of the expression with its outermost span replaced. Used to
    /// widen a parenthesized expression over its parentheses.
    pub fn with_span(mut self, new_span: Span) -> Expr {
        match &mut self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::List { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Set { span, .. }
            | Expr::Dict { span, .. }
            | Expr::Call { span, .. } => *span = new_span,
        }
        self
    }

    /// Node name as shown in AST dumps.
    pub fn node_name(&self) -> &'static str {
        match self {
            Expr::Literal { .. } => "Literal",
            Expr::Identifier { .. } => "Identifier",
            Expr::List { .. } => "List",
            Expr::Tuple { .. } => "Tuple",
            Expr::Set { .. } => "Set",
            Expr::Dict { .. } => "Dict",
            Expr::Call { .. } => "Call",
        }
    }
}
