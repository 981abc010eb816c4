use crate::{string_storage::Intern, tokenizer::Token, types::VType};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt<'s> {
    pub kind: StmtKind<'s>,
    /// Where the statement's first token came from.
    pub file: Intern<'s>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind<'s> {
    Expression(Expr<'s>),
    Print(Expr<'s>),
    VarDecl {
        ty: VType,
        name: Token<'s>,
        initializer: Option<Expr<'s>>,
    },
    Assign {
        name: Token<'s>,
        value: Expr<'s>,
    },
    BlankLine,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'s> {
    Binary {
        left: Box<Expr<'s>>,
        op: Token<'s>,
        right: Box<Expr<'s>>,
    },
    Grouping(Box<Expr<'s>>),
    Literal(Value<'s>),
    Unary {
        op: Token<'s>,
        right: Box<Expr<'s>>,
    },
    Variable(Token<'s>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'s> {
    Nil,
    Int(i64),
    Double(f64),
    String(Intern<'s>),
    Bool(bool),
}

impl<'s> Value<'s> {
    pub fn ty(&self) -> VType {
        match self {
            Value::Nil => VType::Void,
            Value::Int(_) => VType::Int,
            Value::Double(_) => VType::Double,
            Value::String(_) => VType::String,
            Value::Bool(_) => VType::Bool,
        }
    }
}
