use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{string_storage::Intern, types::VType};

use super::Expr;

/// The declared type of every variable seen so far in one compilation unit.
/// There is a single flat scope; a name can be declared once.
#[derive(Debug, Default)]
pub struct Environment<'s> {
    types: FxHashMap<Intern<'s>, VType>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError<'s> {
    #[error("Variable '{name}' already defined with type '{defined}'.")]
    AlreadyDefined { name: Intern<'s>, defined: VType },
    #[error("Undefined variable '{name}'.")]
    Undefined { name: Intern<'s> },
    #[error("Assigning type '{assigned}' to already defined type '{declared}'.")]
    Mismatch {
        name: Intern<'s>,
        declared: VType,
        assigned: VType,
    },
    #[error("Initializing variable '{name}' of type '{declared}' with type '{assigned}'.")]
    InitializerMismatch {
        name: Intern<'s>,
        declared: VType,
        assigned: VType,
    },
}

impl<'s> Environment<'s> {
    pub fn define(&mut self, name: Intern<'s>, ty: VType) -> Result<(), BindingError<'s>> {
        if let Some(&defined) = self.types.get(&name) {
            return Err(BindingError::AlreadyDefined { name, defined });
        }

        self.types.insert(name, ty);
        Ok(())
    }

    pub fn lookup(&self, name: Intern<'s>) -> Option<VType> {
        self.types.get(&name).copied()
    }

    /// Checks that `name` exists and that a value of type `assigned` may be
    /// stored in it.
    pub fn check_assignment(
        &self,
        name: Intern<'s>,
        assigned: VType,
    ) -> Result<(), BindingError<'s>> {
        let Some(declared) = self.lookup(name) else {
            return Err(BindingError::Undefined { name });
        };

        if declared != assigned {
            return Err(BindingError::Mismatch {
                name,
                declared,
                assigned,
            });
        }

        Ok(())
    }

    /// The type an expression is known to have. Only literals and variable
    /// references are typed; everything else is `Void`.
    pub fn static_type(&self, expr: &Expr<'s>) -> VType {
        match expr {
            Expr::Literal(value) => value.ty(),
            Expr::Variable(name) => self.lookup(name.lexeme).unwrap_or(VType::Void),
            Expr::Binary { .. } | Expr::Grouping(_) | Expr::Unary { .. } => VType::Void,
        }
    }
}
