//! Syntax tree of a compiled template script.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    /// Literal template text.
    Text(String),
    /// Evaluate and emit HTML-escaped.
    Escape(Expr),
    /// Evaluate and emit as is.
    Echo(Expr),
    Let(String, Expr),
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        otherwise: Vec<Stmt>,
    },
    /// `for value in ..` or `for key, value in ..`.
    For {
        key: Option<String>,
        value: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Var(String),
    Field(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    /// Function call; `x.f(a)` is stored as `f(x, a)`.
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}
