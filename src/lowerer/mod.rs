use tracing::{debug, debug_span};

use crate::{
    parser::{Expr, Stmt, StmtKind, Value},
    tokenizer::{Token, TokenKind},
    types::VType,
};

mod unit;
pub use unit::*;

pub const ENTRY_ROUTINE: &str = "Main";
pub const HOST_CLASS: &str = "VenaProgram";

/// Lowers a validated statement tree into a translation unit whose entry
/// routine runs the statements in order.
///
/// The tree must have come out of a parse that reported nothing: no
/// validation happens here, and an operator the parser could not have
/// produced is a compiler bug.
pub fn lower(file: &str, stmts: &[Stmt<'_>]) -> TranslationUnit {
    let _span = debug_span!("vena.lower", file, statements = stmts.len()).entered();

    let body: Vec<_> = stmts.iter().map(lower_stmt).collect();
    debug!(count = body.len(), "lowered statements");

    TranslationUnit {
        file: file.to_string(),
        imports: vec!["System".to_string()],
        class: HOST_CLASS.to_string(),
        entry: Routine {
            name: ENTRY_ROUTINE.to_string(),
            body,
        },
    }
}

fn lower_stmt(stmt: &Stmt<'_>) -> Statement {
    let kind = match &stmt.kind {
        StmtKind::Expression(expr) => StatementKind::Expression(lower_expr(expr)),
        StmtKind::Print(expr) => {
            StatementKind::Expression(Expression::Invoke(Builtin::Write, vec![lower_expr(expr)]))
        }
        StmtKind::VarDecl {
            ty,
            name,
            initializer,
        } => StatementKind::Local {
            ty: primitive(*ty),
            name: name.lexeme.to_string(),
            init: initializer.as_ref().map(lower_expr),
        },
        StmtKind::Assign { name, value } => StatementKind::Expression(Expression::Assign {
            target: name.lexeme.to_string(),
            value: Box::new(lower_expr(value)),
        }),
        StmtKind::BlankLine => StatementKind::Empty,
    };

    Statement {
        kind,
        origin: Some(Origin {
            file: stmt.file.to_string(),
            line: stmt.line,
        }),
    }
}

fn lower_expr(expr: &Expr<'_>) -> Expression {
    match expr {
        Expr::Binary { left, op, right } => Expression::Binary(
            binary_op(op),
            Box::new(lower_expr(left)),
            Box::new(lower_expr(right)),
        ),
        Expr::Grouping(inner) => Expression::Parenthesized(Box::new(lower_expr(inner))),
        Expr::Literal(value) => Expression::Literal(match *value {
            Value::Nil => Constant::Null,
            Value::Int(i) => Constant::Int(i),
            Value::Double(x) => Constant::Float(x),
            Value::String(s) => Constant::String(s.to_string()),
            Value::Bool(b) => Constant::Bool(b),
        }),
        Expr::Unary { op, right } => {
            let op = match op.kind {
                TokenKind::Minus => PrefixOp::Neg,
                TokenKind::Bang => PrefixOp::Not,
                _ => unreachable!("Compiler bug: '{}' is not a prefix operator", op.lexeme),
            };
            Expression::Prefix(op, Box::new(lower_expr(right)))
        }
        Expr::Variable(name) => Expression::Name(name.lexeme.to_string()),
    }
}

fn binary_op(op: &Token<'_>) -> BinaryOp {
    match op.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::NotEqual => BinaryOp::Neq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Leq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Geq,
        _ => unreachable!("Compiler bug: '{}' is not a binary operator", op.lexeme),
    }
}

fn primitive(ty: VType) -> PrimitiveType {
    match ty {
        VType::Int => PrimitiveType::I64,
        VType::Double => PrimitiveType::F64,
        VType::String => PrimitiveType::String,
        VType::Bool => PrimitiveType::Bool,
        VType::Void => unreachable!("Compiler bug: variables are never declared void"),
    }
}
