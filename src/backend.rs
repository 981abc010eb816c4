//! The seam to whatever toolchain turns a translation unit into a program.

use std::path::PathBuf;

use tracing::debug;

use crate::lowerer::TranslationUnit;

/// What the caller wants built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
    /// Library paths handed to the toolchain, in order.
    pub references: Vec<PathBuf>,
    pub output: PathBuf,
}

/// The toolchain's verdict. `diagnostics` is opaque text and is shown to the
/// user as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    pub success: bool,
    pub diagnostics: Vec<String>,
    /// Files written on success: the program and its runtime descriptor.
    pub artifacts: Vec<PathBuf>,
}

pub trait Backend {
    fn compile(&mut self, unit: &TranslationUnit, request: &BuildRequest) -> Compilation;

    /// Pretty-printed form of `unit`, for inspection.
    fn render(&self, unit: &TranslationUnit) -> String {
        unit.to_string()
    }
}

/// A backend that builds nothing and only renders the unit.
#[derive(Debug, Default)]
pub struct RenderBackend {
    pub last: Option<String>,
}

impl Backend for RenderBackend {
    fn compile(&mut self, unit: &TranslationUnit, request: &BuildRequest) -> Compilation {
        debug!(output = %request.output.display(), "rendering only, nothing is built");
        self.last = Some(self.render(unit));

        Compilation {
            success: true,
            diagnostics: Vec::new(),
            artifacts: Vec::new(),
        }
    }
}
