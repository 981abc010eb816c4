use std::fmt;

/// The static types of the language. `Void` doubles as the type of `nil` and
/// of every expression whose type is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VType {
    Void,
    Int,
    Double,
    String,
    Bool,
}

impl VType {
    pub fn name(self) -> &'static str {
        match self {
            VType::Void => "void",
            VType::Int => "int",
            VType::Double => "double",
            VType::String => "string",
            VType::Bool => "bool",
        }
    }
}

impl fmt::Display for VType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
