use thiserror::Error;
use tracing::{debug, debug_span};

use crate::{
    errors::ErrorStream,
    tokenizer::{Token, TokenKind},
    types::VType,
};

mod ast;
mod environment;
mod preds;

pub use ast::*;
pub use environment::{BindingError, Environment};
use preds::*;

#[derive(Debug)]
pub struct ParseError<'s> {
    pub kind: ParseErrorKind,
    pub token: Token<'s>,
}

#[derive(Debug, Error)]
pub enum ParseErrorKind {
    #[error("Expect {0}.")]
    Expected(&'static str),
    #[error("Unexpected ')'.")]
    UnexpectedCloseParen,
    #[error("Expect expression.")]
    ExpectedExpression,
}

type Result<'s, T> = std::result::Result<T, ParseError<'s>>;

/// Parses a scanned token stream into statements.
///
/// Grammar and binding errors go to `errors`. A statement that fails to parse
/// is left out of the result entirely and parsing resumes at the next
/// statement boundary, so the result only ever holds complete statements.
pub fn parse<'s>(tokens: &[Token<'s>], errors: &ErrorStream) -> Vec<Stmt<'s>> {
    let _span = debug_span!("vena.parse", tokens = tokens.len()).entered();

    let Some(last) = tokens.last() else {
        return Vec::new();
    };

    // the cursor relies on a trailing end-of-input marker
    let terminated;
    let tokens = if last.kind == TokenKind::Eof {
        tokens
    } else {
        terminated = tokens
            .iter()
            .copied()
            .chain(std::iter::once(Token {
                kind: TokenKind::Eof,
                ..*last
            }))
            .collect::<Vec<_>>();
        &terminated[..]
    };

    let stmts = Parser {
        tokens,
        current: 0,
        errors,
        environment: Environment::default(),
    }
    .parse();

    debug!(count = stmts.len(), "parsed statements");
    stmts
}

struct Parser<'s, 't> {
    tokens: &'t [Token<'s>],
    current: usize,
    errors: &'t ErrorStream,
    environment: Environment<'s>,
}

impl<'s, 't> Parser<'s, 't> {
    fn parse(mut self) -> Vec<Stmt<'s>> {
        let mut stmts = Vec::new();

        loop {
            let token = self.tokens[self.current];
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::NewLine => {
                    self.current += 1;
                    stmts.push(Stmt {
                        kind: StmtKind::BlankLine,
                        file: token.file,
                        line: token.line,
                    });
                }
                _ => match self.statement() {
                    Ok(stmt) => stmts.push(stmt),
                    Err(err) => {
                        self.errors.error(err);
                        self.synchronize();
                    }
                },
            }
        }

        stmts
    }

    fn statement(&mut self) -> Result<'s, Stmt<'s>> {
        let first = self.peek();

        let kind = if let Some(ty) = self.eat(vpred! {
            TokenKind::Int => VType::Int,
            TokenKind::Double => VType::Double,
            TokenKind::Str => VType::String,
            TokenKind::Bool => VType::Bool,
        }) {
            self.var_decl(ty)?
        } else if self.has_peek(bpred!(TokenKind::Identifier(_)))
            && self.peek_second().kind == TokenKind::Equal
        {
            self.assign()?
        } else if self.eat(bpred!(TokenKind::Print)).is_some() {
            let value = self.expression()?;
            self.require(bpred!(TokenKind::Semicolon), "';' after value")?;
            StmtKind::Print(value)
        } else {
            let expr = self.expression()?;
            self.require(bpred!(TokenKind::Semicolon), "';' after expression")?;
            StmtKind::Expression(expr)
        };

        Ok(Stmt {
            kind,
            file: first.file,
            line: first.line,
        })
    }

    fn var_decl(&mut self, ty: VType) -> Result<'s, StmtKind<'s>> {
        let name = self.require(tpred!(TokenKind::Identifier(_)), "variable name")?;
        let initializer = if self.eat(bpred!(TokenKind::Equal)).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        self.require(
            bpred!(TokenKind::Semicolon),
            "';' after variable declaration",
        )?;

        if let Some(initializer) = &initializer {
            let assigned = self.environment.static_type(initializer);
            if assigned != VType::Void && assigned != ty {
                self.errors.error((
                    name,
                    BindingError::InitializerMismatch {
                        name: name.lexeme,
                        declared: ty,
                        assigned,
                    },
                ));
            }
        }

        // a clashing declaration is reported but still kept in the tree
        if let Err(err) = self.environment.define(name.lexeme, ty) {
            self.errors.error((name, err));
        }

        Ok(StmtKind::VarDecl {
            ty,
            name,
            initializer,
        })
    }

    fn assign(&mut self) -> Result<'s, StmtKind<'s>> {
        let name = self.require(tpred!(TokenKind::Identifier(_)), "variable name")?;
        self.require(bpred!(TokenKind::Equal), "'=' after variable name")?;
        let value = self.expression()?;
        self.require(bpred!(TokenKind::Semicolon), "';' after assignment")?;

        let assigned = self.environment.static_type(&value);
        if let Err(err) = self.environment.check_assignment(name.lexeme, assigned) {
            self.errors.error((name, err));
        }

        Ok(StmtKind::Assign { name, value })
    }

    fn expression(&mut self) -> Result<'s, Expr<'s>> {
        self.equality()
    }

    fn equality(&mut self) -> Result<'s, Expr<'s>> {
        self.bin_op(
            Self::comparison,
            tpred!(TokenKind::EqualEqual | TokenKind::NotEqual),
        )
    }

    fn comparison(&mut self) -> Result<'s, Expr<'s>> {
        self.bin_op(
            Self::additive,
            tpred!(TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq),
        )
    }

    fn additive(&mut self) -> Result<'s, Expr<'s>> {
        self.bin_op(
            Self::multiplicative,
            tpred!(TokenKind::Plus | TokenKind::Minus),
        )
    }

    fn multiplicative(&mut self) -> Result<'s, Expr<'s>> {
        self.bin_op(Self::modulus, tpred!(TokenKind::Star | TokenKind::Slash))
    }

    fn modulus(&mut self) -> Result<'s, Expr<'s>> {
        self.bin_op(Self::unary, tpred!(TokenKind::Percent))
    }

    fn unary(&mut self) -> Result<'s, Expr<'s>> {
        if let Some(op) = self.eat(tpred!(TokenKind::Bang | TokenKind::Minus)) {
            let right = self.unary()?;

            Ok(Expr::Unary {
                op,
                right: Box::new(right),
            })
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<'s, Expr<'s>> {
        if let Some(value) = self.eat(vpred! {
            TokenKind::False => Value::Bool(false),
            TokenKind::True => Value::Bool(true),
            TokenKind::Nil => Value::Nil,
            TokenKind::Float(f) => Value::Double(f),
            TokenKind::Integer(i) => Value::Int(i),
            TokenKind::String(s) => Value::String(s),
        }) {
            Ok(Expr::Literal(value))
        } else if let Some(name) = self.eat(tpred!(TokenKind::Identifier(_))) {
            if self.environment.lookup(name.lexeme).is_none() {
                self.errors
                    .error((name, BindingError::Undefined { name: name.lexeme }));
            }

            Ok(Expr::Variable(name))
        } else if let Some(close) = self.eat(tpred!(TokenKind::CloseParen)) {
            Err(ParseError {
                kind: ParseErrorKind::UnexpectedCloseParen,
                token: close,
            })
        } else if self.eat(bpred!(TokenKind::OpenParen)).is_some() {
            let inner = self.expression()?;
            self.require(bpred!(TokenKind::CloseParen), "')' after expression")?;

            Ok(Expr::Grouping(Box::new(inner)))
        } else {
            Err(ParseError {
                kind: ParseErrorKind::ExpectedExpression,
                token: self.peek(),
            })
        }
    }

    fn bin_op(
        &mut self,
        next: impl Fn(&mut Self) -> Result<'s, Expr<'s>>,
        pred: impl Fn(&Token<'s>) -> Option<Token<'s>>,
    ) -> Result<'s, Expr<'s>> {
        let mut a = next(self)?;

        while let Some(op) = self.eat(&pred) {
            let b = next(self)?;

            a = Expr::Binary {
                left: Box::new(a),
                op,
                right: Box::new(b),
            }
        }

        Ok(a)
    }

    /// Discards tokens until just past a `;` or just before a token that can
    /// start a statement.
    fn synchronize(&mut self) {
        let mut previous = self.advance();

        while previous.kind != TokenKind::Semicolon {
            match self.peek().kind {
                TokenKind::Eof
                | TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Let
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
                | TokenKind::Int
                | TokenKind::Double
                | TokenKind::Str
                | TokenKind::Bool => return,
                _ => previous = self.advance(),
            }
        }
    }

    /// The next significant token. Blank-line markers only matter between
    /// statements, so they are skipped here.
    fn peek(&mut self) -> Token<'s> {
        while self.tokens[self.current].kind == TokenKind::NewLine
            && self.current + 1 < self.tokens.len()
        {
            self.current += 1;
        }

        self.tokens[self.current]
    }

    /// The significant token after [Parser::peek].
    fn peek_second(&mut self) -> Token<'s> {
        let peek = self.peek();
        self.tokens[self.current + 1..]
            .iter()
            .copied()
            .find(|t| t.kind != TokenKind::NewLine)
            .unwrap_or(peek)
    }

    /// Consumes and returns the next significant token; never moves past the end.
    fn advance(&mut self) -> Token<'s> {
        let token = self.peek();
        if token.kind != TokenKind::Eof && self.current + 1 < self.tokens.len() {
            self.current += 1;
        }

        token
    }

    /// Returns `true` if the current token peek satisfies `pred`.
    fn has_peek(&mut self, pred: impl Fn(&Token<'s>) -> Option<()>) -> bool {
        let token = self.peek();
        pred(&token).is_some()
    }

    /// Requires that the next token satisfies `pred` and errors otherwise,
    /// naming what was `expected`.
    ///
    /// Does not consume the token if it does not satisfy `pred`.
    fn require<T>(
        &mut self,
        pred: impl Fn(&Token<'s>) -> Option<T>,
        expected: &'static str,
    ) -> Result<'s, T> {
        let token = self.peek();
        if let Some(t) = pred(&token) {
            self.advance();
            Ok(t)
        } else {
            Err(ParseError {
                kind: ParseErrorKind::Expected(expected),
                token,
            })
        }
    }

    /// Checks if the next token satisfies `pred` and returns None otherwise.
    ///
    /// Does not consume the token if it does not satisfy `pred`.
    fn eat<T>(&mut self, pred: impl Fn(&Token<'s>) -> Option<T>) -> Option<T> {
        let token = self.peek();
        let t = pred(&token)?;
        self.advance();
        Some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{string_storage::StringStorage, tokenizer::scan};

    fn parse_source<'s>(
        storage: &'s StringStorage,
        errors: &ErrorStream,
        source: &str,
    ) -> Vec<Stmt<'s>> {
        let tokens = scan(source, "test.vena", storage, errors);
        assert!(!errors.has_errors(), "{:?}", errors.diagnostics());
        parse(&tokens, errors)
    }

    fn messages(errors: &ErrorStream) -> Vec<String> {
        errors.diagnostics().iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn statement_forms() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(
            &storage,
            &errors,
            "int a = 1; a = 2; print a; a + 1; bool b;",
        );

        assert!(!errors.has_errors(), "{:?}", messages(&errors));
        assert_eq!(stmts.len(), 5);
        assert!(matches!(
            stmts[0].kind,
            StmtKind::VarDecl {
                ty: VType::Int,
                initializer: Some(Expr::Literal(Value::Int(1))),
                ..
            }
        ));
        assert!(matches!(
            stmts[1].kind,
            StmtKind::Assign {
                value: Expr::Literal(Value::Int(2)),
                ..
            }
        ));
        assert!(matches!(stmts[2].kind, StmtKind::Print(Expr::Variable(_))));
        assert!(matches!(
            stmts[3].kind,
            StmtKind::Expression(Expr::Binary { .. })
        ));
        assert!(matches!(
            stmts[4].kind,
            StmtKind::VarDecl {
                ty: VType::Bool,
                initializer: None,
                ..
            }
        ));
    }

    #[test]
    fn redefinition_is_reported_but_kept() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "int a = 1;");
        assert_eq!(stmts.len(), 1);
        assert!(!errors.has_errors());

        let stmts = parse_source(&storage, &errors, "int a = 1;\nstring a = \"x\";");
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            messages(&errors),
            ["[test.vena line 2] Parse Error at 'a': Variable 'a' already defined with type 'int'."]
        );
    }

    #[test]
    fn assignment_type_must_match() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        parse_source(
            &storage,
            &errors,
            "double d = 1.5; d = 2.5; int n = 1; int m = n; m = n;",
        );
        assert!(!errors.has_errors(), "{:?}", messages(&errors));

        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "int n = 1; n = \"s\";");
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            messages(&errors),
            ["[test.vena line 1] Parse Error at 'n': Assigning type 'string' to already defined type 'int'."]
        );
    }

    #[test]
    fn untyped_right_hand_side_is_void() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        parse_source(&storage, &errors, "int n = 1; n = n + 1;");
        assert_eq!(errors.len(), 1);
        assert!(errors.diagnostics()[0]
            .message
            .starts_with("Assigning type 'void'"));
    }

    #[test]
    fn undefined_names_are_reported() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "x = 1; print y;");
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            messages(&errors),
            [
                "[test.vena line 1] Parse Error at 'x': Undefined variable 'x'.",
                "[test.vena line 1] Parse Error at 'y': Undefined variable 'y'.",
            ]
        );
    }

    #[test]
    fn initializer_type_is_checked_when_known() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        parse_source(&storage, &errors, "int a = 1.5; double b = nil; int c = 1 + 2;");
        assert_eq!(
            messages(&errors),
            ["[test.vena line 1] Parse Error at 'a': Initializing variable 'a' of type 'int' with type 'double'."]
        );
    }

    #[test]
    fn failed_statements_are_omitted() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "1 + ; print 2; 3;");

        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0].kind, StmtKind::Print(_)));
        assert!(matches!(stmts[1].kind, StmtKind::Expression(_)));
        assert_eq!(
            messages(&errors),
            ["[test.vena line 1] Parse Error at ';': Expect expression."]
        );
    }

    #[test]
    fn recovery_stops_before_statement_keywords() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "1 2 int a = 1; print a;");

        assert_eq!(errors.len(), 1);
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0].kind, StmtKind::VarDecl { .. }));
    }

    #[test]
    fn missing_tokens_name_the_expectation() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "print 1");
        assert!(stmts.is_empty());
        assert_eq!(
            messages(&errors),
            ["[test.vena line 1] Parse Error at end: Expect ';' after value."]
        );

        let errors = ErrorStream::new();
        parse_source(&storage, &errors, "(1 + 2;");
        assert_eq!(
            messages(&errors),
            ["[test.vena line 1] Parse Error at ';': Expect ')' after expression."]
        );

        let errors = ErrorStream::new();
        parse_source(&storage, &errors, "1 + );");
        assert_eq!(
            messages(&errors),
            ["[test.vena line 1] Parse Error at ')': Unexpected ')'."]
        );
    }

    #[test]
    fn blank_lines_are_kept_between_statements() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "int a = 1;\n\nprint\n\n a;");

        assert!(!errors.has_errors(), "{:?}", messages(&errors));
        let kinds: Vec<_> = stmts
            .iter()
            .map(|s| match s.kind {
                StmtKind::VarDecl { .. } => "var",
                StmtKind::BlankLine => "blank",
                StmtKind::Print(_) => "print",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["var", "blank", "print"]);
        assert_eq!(
            stmts.iter().map(|s| s.line).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn input_without_end_marker_is_terminated() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let mut tokens = scan("int a = 1;\nprint a;", "test.vena", &storage, &errors);
        assert_eq!(tokens.pop().map(|t| t.kind), Some(TokenKind::Eof));

        let stmts = parse(&tokens, &errors);
        assert!(!errors.has_errors(), "{:?}", messages(&errors));
        assert_eq!(stmts.len(), 2);

        let mut tokens = scan("print a", "test.vena", &storage, &errors);
        tokens.pop();
        parse(&tokens, &errors);
        assert_eq!(
            messages(&errors),
            [
                "[test.vena line 1] Parse Error at 'a': Undefined variable 'a'.",
                "[test.vena line 1] Parse Error at end: Expect ';' after value.",
            ]
        );

        assert!(parse(&[], &errors).is_empty());
    }

    #[test]
    fn binary_operators_associate_left() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let stmts = parse_source(&storage, &errors, "1 - 2 - 3;");

        let StmtKind::Expression(Expr::Binary { left, right, .. }) = &stmts[0].kind else {
            panic!("expected a binary expression, got {:?}", stmts[0].kind);
        };
        assert!(matches!(**left, Expr::Binary { .. }));
        assert_eq!(**right, Expr::Literal(Value::Int(3)));
    }
}
