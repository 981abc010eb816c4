//! Front end for the Vena scripting language: scanning, parsing with inline
//! type checks, and lowering to a translation unit for a pluggable backend.

pub mod backend;
pub mod config;
pub mod errors;
pub mod lowerer;
pub mod parser;
pub mod printer;
pub mod string_storage;
pub mod tokenizer;
pub mod types;

use tracing::{debug_span, info};

use crate::{
    backend::{Backend, Compilation},
    config::Config,
    errors::{CompileError, Diagnostic, ErrorStream},
    lowerer::TranslationUnit,
    parser::Stmt,
    string_storage::StringStorage,
};

pub use crate::{lowerer::lower, parser::parse, tokenizer::scan as lex};

/// Scans and parses `source`, then hands the tree to `then`. Stops at the
/// first stage that reported anything.
fn front_end<T>(
    source: &str,
    file: &str,
    then: impl for<'s> FnOnce(&[Stmt<'s>]) -> T,
) -> Result<T, CompileError> {
    let storage = StringStorage::new();
    let errors = ErrorStream::new();

    let tokens = lex(source, file, &storage, &errors);
    if errors.has_errors() {
        return Err(CompileError::Lexical(errors.into_diagnostics()));
    }

    let stmts = parse(&tokens, &errors);
    if errors.has_errors() {
        return Err(CompileError::Parse(errors.into_diagnostics()));
    }

    Ok(then(&stmts))
}

/// Runs the front end and lowers the result.
pub fn emit(source: &str, file: &str) -> Result<TranslationUnit, CompileError> {
    front_end(source, file, |stmts| lower(file, stmts))
}

/// Runs the front end and renders the tree in its parenthesized form.
pub fn print_tree(source: &str, file: &str) -> Result<String, CompileError> {
    front_end(source, file, printer::print)
}

/// Runs every stage and passes the unit to `backend`. A rejected unit yields
/// [CompileError::Backend] with the backend's messages unchanged.
pub fn compile(
    source: &str,
    file: &str,
    backend: &mut dyn Backend,
    config: &Config,
) -> Result<Compilation, CompileError> {
    let unit = emit(source, file)?;

    let _span = debug_span!("vena.backend", file).entered();
    let compilation = backend.compile(&unit, &config.build_request());
    if !compilation.success {
        return Err(CompileError::Backend(
            compilation
                .diagnostics
                .into_iter()
                .map(Diagnostic::compile)
                .collect(),
        ));
    }

    info!(artifacts = compilation.artifacts.len(), "compiled {file}");
    Ok(compilation)
}
