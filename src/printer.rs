//! Canonical parenthesized rendering of a statement tree, used to check what
//! the parser built.

use crate::parser::{Expr, Stmt, StmtKind, Value};

/// Renders every statement as `[Stmt ...]`, with no separator between them.
pub fn print(stmts: &[Stmt<'_>]) -> String {
    let mut printer = Printer::default();
    for stmt in stmts {
        printer.out.push_str("[Stmt ");
        printer.stmt(stmt);
        printer.out.push(']');
    }

    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn stmt(&mut self, stmt: &Stmt<'_>) {
        match &stmt.kind {
            StmtKind::Expression(expr) => self.expr(expr),
            StmtKind::Print(expr) => self.parenthesize("print", &[expr]),
            StmtKind::VarDecl { initializer, .. } => {
                let initializer: Vec<_> = initializer.iter().collect();
                self.parenthesize("var", &initializer)
            }
            StmtKind::Assign { value, .. } => self.parenthesize("assign", &[value]),
            StmtKind::BlankLine => self.out.push('\n'),
        }
    }

    fn expr(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Binary { left, op, right } => {
                self.parenthesize(op.lexeme.as_str(), &[&**left, &**right])
            }
            Expr::Grouping(inner) => self.parenthesize("group", &[&**inner]),
            Expr::Literal(value) => self.literal(value),
            Expr::Unary { op, right } => self.parenthesize(op.lexeme.as_str(), &[&**right]),
            Expr::Variable(name) => self.out.push_str(name.lexeme.as_str()),
        }
    }

    fn literal(&mut self, value: &Value<'_>) {
        match value {
            Value::Nil => self.out.push_str("nil"),
            Value::Int(i) => self.out.push_str(&i.to_string()),
            Value::Double(f) => self.out.push_str(&f.to_string()),
            Value::String(s) => self.out.push_str(s.as_str()),
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
        }
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expr<'_>]) {
        self.out.push('(');
        self.out.push_str(name);
        for expr in exprs {
            self.out.push(' ');
            self.expr(expr);
        }
        self.out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::ErrorStream, parser, string_storage::StringStorage, tokenizer::scan};

    fn render(source: &str) -> String {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let tokens = scan(source, "file.vena", &storage, &errors);
        let stmts = parser::parse(&tokens, &errors);
        assert!(!errors.has_errors(), "{:?}", errors.diagnostics());
        print(&stmts)
    }

    #[test]
    fn expressions() {
        for (source, expected) in [
            (
                "1 + 2 - (-3) * 9 / (5.6 + 8.0);",
                "[Stmt (- (+ 1 2) (/ (* (group (- 3)) 9) (group (+ 5.6 8))))]",
            ),
            (
                "9 * 9 * 9 * 9 * 9 * 9;",
                "[Stmt (* (* (* (* (* 9 9) 9) 9) 9) 9)]",
            ),
            (
                "((((1 + 2)))) + 1;",
                "[Stmt (+ (group (group (group (group (+ 1 2))))) 1)]",
            ),
            (
                "1 < 2 == !false != 7 % 3 >= 1;",
                "[Stmt (!= (== (< 1 2) (! false)) (>= (% 7 3) 1))]",
            ),
        ] {
            assert_eq!(render(source), expected, "{source}");
        }
    }

    #[test]
    fn statements_concatenate() {
        assert_eq!(render("1 + 1; 3 * 4;"), "[Stmt (+ 1 1)][Stmt (* 3 4)]");
        assert_eq!(render("1;\n\t2;"), "[Stmt 1][Stmt 2]");
    }

    #[test]
    fn statement_forms() {
        assert_eq!(
            render("string s = \"hi\"; int n; s = \"yo\"; print nil; print s;"),
            "[Stmt (var hi)][Stmt (var)][Stmt (assign yo)][Stmt (print nil)][Stmt (print s)]"
        );
    }

    #[test]
    fn blank_lines_render_as_newlines() {
        assert_eq!(render("1;\n\n2;"), "[Stmt 1][Stmt \n][Stmt 2]");
    }
}
