use std::fmt;

/// The backend-facing program: one host class holding a single parameterless
/// entry routine. Owns all of its text so it can outlive the source storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    /// Name of the source file the unit was lowered from.
    pub file: String,
    pub imports: Vec<String>,
    pub class: String,
    pub entry: Routine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub origin: Option<Origin>,
}

/// Source coordinates a lowered statement came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Local {
        ty: PrimitiveType,
        name: String,
        init: Option<Expression>,
    },
    Expression(Expression),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    Parenthesized(Box<Expression>),
    Literal(Constant),
    Prefix(PrefixOp, Box<Expression>),
    Name(String),
    Assign { target: String, value: Box<Expression> },
    Invoke(Builtin, Vec<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    I64,
    F64,
    String,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Neg,
    Not,
}

/// Primitives provided by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Write,
}

impl PrimitiveType {
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveType::I64 => "long",
            PrimitiveType::F64 => "double",
            PrimitiveType::String => "string",
            PrimitiveType::Bool => "bool",
        }
    }
}

impl BinaryOp {
    /// Binding strength in the rendered C-family text, where `%` shares a
    /// level with `*` and `/`.
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;

        match self {
            Eq | Neq => 1,
            Lt | Leq | Gt | Geq => 2,
            Add | Sub => 3,
            Mul | Div | Mod => 4,
        }
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOp::*;

        match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Eq => "==",
            Neq => "!=",
            Lt => "<",
            Leq => "<=",
            Gt => ">",
            Geq => ">=",
        }
    }
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Neg => "-",
            PrefixOp::Not => "!",
        }
    }
}

impl Builtin {
    pub fn path(self) -> &'static str {
        match self {
            Builtin::Write => "Console.WriteLine",
        }
    }
}

impl Expression {
    fn precedence(&self) -> u8 {
        match self {
            Expression::Assign { .. } => 0,
            Expression::Binary(op, _, _) => op.precedence(),
            Expression::Prefix(_, _) => 5,
            _ => 6,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

const INDENT: &str = "    ";

impl fmt::Display for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "using {import};")?;
        }
        if !self.imports.is_empty() {
            writeln!(f)?;
        }

        writeln!(f, "class {}", self.class)?;
        writeln!(f, "{{")?;
        writeln!(f, "{INDENT}public static void {}()", self.entry.name)?;
        writeln!(f, "{INDENT}{{")?;
        for stmt in &self.entry.body {
            match &stmt.kind {
                StatementKind::Empty => writeln!(f)?,
                kind => writeln!(f, "{INDENT}{INDENT}{kind}")?,
            }
        }
        writeln!(f, "{INDENT}}}")?;
        writeln!(f, "}}")
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Local { ty, name, init } => {
                write!(f, "{} {name}", ty.keyword())?;
                if let Some(init) = init {
                    write!(f, " = {init}")?;
                }
                f.write_str(";")
            }
            StatementKind::Expression(expr) => write!(f, "{expr};"),
            StatementKind::Empty => Ok(()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Binary(op, left, right) => {
                // operators are left-associative, so an equal right operand still needs parens
                let prec = op.precedence();
                left.fmt_operand(f, left.precedence() < prec)?;
                write!(f, " {} ", op.symbol())?;
                right.fmt_operand(f, right.precedence() <= prec)
            }
            Expression::Parenthesized(inner) => write!(f, "({inner})"),
            Expression::Literal(constant) => write!(f, "{constant}"),
            Expression::Prefix(op, operand) => {
                // `--x` would read as a decrement
                let text = operand.to_string();
                f.write_str(op.symbol())?;
                if operand.precedence() < 5 || text.starts_with(op.symbol()) {
                    write!(f, "({text})")
                } else {
                    f.write_str(&text)
                }
            }
            Expression::Name(name) => f.write_str(name),
            Expression::Assign { target, value } => write!(f, "{target} = {value}"),
            Expression::Invoke(builtin, args) => {
                write!(f, "{}(", builtin.path())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Int(i) => write!(f, "{i}"),
            // Debug keeps the decimal point on whole values
            Constant::Float(x) => write!(f, "{x:?}"),
            Constant::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        '\0' => f.write_str("\\0")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Constant::Bool(b) => write!(f, "{b}"),
        }
    }
}
