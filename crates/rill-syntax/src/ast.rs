use rill_common::types::Spanned;

use std::fmt::{self, Display, Formatter};

pub type StmtS = Spanned<Stmt>;
pub type ExprS = Spanned<Expr>;

#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub stmts: Vec<StmtS>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Expr(StmtExpr),
    Let(StmtLet),
}

/// An expression statement evaluates an expression and discards the result.
#[derive(Debug, PartialEq)]
pub struct StmtExpr {
    pub value: ExprS,
}

/// `let` introduces an immutable binding in the innermost scope.
#[derive(Debug, PartialEq)]
pub struct StmtLet {
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Block(Box<ExprBlock>),
    If(Box<ExprIf>),
    Infix(Box<ExprInfix>),
    Literal(ExprLiteral),
    Prefix(Box<ExprPrefix>),
    Variable(ExprVariable),
}

/// A block is an expression: its statements run in a child scope, and its
/// mandatory trailing expression yields the block's value.
#[derive(Debug, PartialEq)]
pub struct ExprBlock {
    pub stmts: Vec<StmtS>,
    pub value: ExprS,
}

/// Both branches are mandatory: an `if` always yields a value.
#[derive(Debug, PartialEq)]
pub struct ExprIf {
    pub cond: ExprS,
    pub then: ExprS,
    pub else_: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprInfix {
    pub lt: ExprS,
    pub op: OpInfix,
    pub rt: ExprS,
}

#[derive(Debug, PartialEq)]
pub enum ExprLiteral {
    Bool(bool),
    Int(i64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub struct ExprPrefix {
    pub op: OpPrefix,
    pub rt: ExprS,
}

#[derive(Debug, Eq, PartialEq)]
pub struct ExprVariable {
    pub name: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpInfix {
    LogicOr,
    LogicAnd,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl Display for OpInfix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            OpInfix::LogicOr => "||",
            OpInfix::LogicAnd => "&&",
            OpInfix::Equal => "==",
            OpInfix::NotEqual => "!=",
            OpInfix::Greater => ">",
            OpInfix::GreaterEqual => ">=",
            OpInfix::Less => "<",
            OpInfix::LessEqual => "<=",
            OpInfix::Add => "+",
            OpInfix::Subtract => "-",
            OpInfix::Multiply => "*",
            OpInfix::Divide => "/",
            OpInfix::Modulo => "%",
        };
        write!(f, "{}", op)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpPrefix {
    Negate,
    Not,
}

impl Display for OpPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            OpPrefix::Negate => "-",
            OpPrefix::Not => "!",
        };
        write!(f, "{}", op)
    }
}
