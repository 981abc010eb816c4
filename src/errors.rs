use std::{cell::RefCell, fmt};

use thiserror::Error;
use tracing::debug;

use crate::{
    parser::{BindingError, ParseError},
    tokenizer::{Token, TokenKind},
};

/// Append-only sink for the diagnostics of one compilation unit.
///
/// Stages report through a shared reference; once anything has been reported
/// [ErrorStream::has_errors] stays `true` for the rest of the run, and the
/// driver checks it before starting the next stage.
#[derive(Debug, Default)]
pub struct ErrorStream {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl ErrorStream {
    pub fn new() -> ErrorStream {
        ErrorStream::default()
    }

    pub fn error(&self, error: impl Into<Diagnostic>) {
        let diagnostic = error.into();
        debug!(kind = ?diagnostic.kind, line = diagnostic.line, "{}", diagnostic);
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of everything reported so far, in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Parse,
    Compile,
}

/// Where on its line a parse diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum At {
    Lexeme(String),
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub line: usize,
    pub at: Option<At>,
    pub message: String,
}

impl Diagnostic {
    pub fn lexical(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Lexical,
            file: file.into(),
            line,
            at: None,
            message: message.into(),
        }
    }

    pub fn parse(token: &Token<'_>, message: impl Into<String>) -> Self {
        let at = match token.kind {
            TokenKind::Eof => At::End,
            _ => At::Lexeme(token.lexeme.to_string()),
        };

        Diagnostic {
            kind: DiagnosticKind::Parse,
            file: token.file.to_string(),
            line: token.line,
            at: Some(at),
            message: message.into(),
        }
    }

    /// Backend text is opaque, so compile diagnostics carry no coordinates.
    pub fn compile(message: impl Into<String>) -> Self {
        Diagnostic {
            kind: DiagnosticKind::Compile,
            file: String::new(),
            line: 0,
            at: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Lexical => write!(
                f,
                "[{} line {}] Lexical Error: {}",
                self.file, self.line, self.message
            ),
            DiagnosticKind::Parse => {
                write!(f, "[{} line {}] Parse Error", self.file, self.line)?;
                match &self.at {
                    Some(At::Lexeme(lexeme)) => write!(f, " at '{lexeme}'")?,
                    Some(At::End) => write!(f, " at end")?,
                    None => {}
                }
                write!(f, ": {}", self.message)
            }
            DiagnosticKind::Compile => f.write_str(&self.message),
        }
    }
}

impl<'s> From<ParseError<'s>> for Diagnostic {
    fn from(err: ParseError<'s>) -> Self {
        Diagnostic::parse(&err.token, err.kind.to_string())
    }
}

impl<'s> From<(Token<'s>, BindingError<'s>)> for Diagnostic {
    fn from((token, err): (Token<'s>, BindingError<'s>)) -> Self {
        Diagnostic::parse(&token, err.to_string())
    }
}

/// The reason a run stopped, carrying every diagnostic of the failing stage.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("scanning failed with {} error(s)", .0.len())]
    Lexical(Vec<Diagnostic>),
    #[error("parsing failed with {} error(s)", .0.len())]
    Parse(Vec<Diagnostic>),
    #[error("backend compilation failed with {} error(s)", .0.len())]
    Backend(Vec<Diagnostic>),
}

impl CompileError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Lexical(diagnostics)
            | CompileError::Parse(diagnostics)
            | CompileError::Backend(diagnostics) => diagnostics,
        }
    }
}
