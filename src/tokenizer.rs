use std::{iter::Peekable, str::CharIndices};

use tracing::{debug, debug_span};

use crate::{
    errors::{Diagnostic, ErrorStream},
    string_storage::{Intern, StringInterner, StringStorage},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'s> {
    pub kind: TokenKind<'s>,
    /// The exact source text; for strings this includes the quotes.
    pub lexeme: Intern<'s>,
    pub file: Intern<'s>,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'s> {
    /* Punctuation */
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Percent,
    Bang,
    NotEqual,
    Equal,
    EqualEqual,
    Gt,
    GtEq,
    Lt,
    LtEq,

    /* Literals */
    Identifier(Intern<'s>),
    String(Intern<'s>),
    Integer(i64),
    Float(f64),

    /* Keywords */
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Let,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    While,

    /* Type keywords */
    Int,
    Double,
    Str,
    Bool,

    /// A line holding nothing but its terminator.
    NewLine,
    Eof,
}

/// The decoded value a literal token carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'s> {
    Int(i64),
    Float(f64),
    String(Intern<'s>),
    Bool(bool),
}

impl<'s> Token<'s> {
    pub fn literal(&self) -> Option<Literal<'s>> {
        match self.kind {
            TokenKind::Integer(i) => Some(Literal::Int(i)),
            TokenKind::Float(f) => Some(Literal::Float(f)),
            TokenKind::String(s) => Some(Literal::String(s)),
            TokenKind::True => Some(Literal::Bool(true)),
            TokenKind::False => Some(Literal::Bool(false)),
            _ => None,
        }
    }
}

/// Scans all of `source`, always ending the result with a single [TokenKind::Eof].
///
/// Malformed input is reported to `errors` and skipped; scanning itself never
/// stops early.
pub fn scan<'s>(
    source: &str,
    file: &str,
    storage: &'s StringStorage,
    errors: &ErrorStream,
) -> Vec<Token<'s>> {
    let _span = debug_span!("vena.scan", file).entered();

    let mut tokens = Tokens::of(source, file, storage, errors);
    let mut out = Vec::new();
    while let Some(token) = tokens.next() {
        out.push(token);
    }
    out.push(tokens.eof());

    debug!(count = out.len(), "scanned tokens");
    out
}

pub struct Tokens<'s, 'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    strings: StringInterner<'s>,
    errors: &'a ErrorStream,
    file: Intern<'s>,
    line: usize,
    line_start: usize,
}

impl<'s, 'a> Tokens<'s, 'a> {
    pub fn of(
        source: &'a str,
        file: &str,
        string_storage: &'s StringStorage,
        errors: &'a ErrorStream,
    ) -> Tokens<'s, 'a> {
        let mut strings = StringInterner::new(string_storage);
        let file = strings.intern_str(file);

        Tokens {
            source,
            chars: source.char_indices().peekable(),
            strings,
            errors,
            file,
            line: 1,
            line_start: 0,
        }
    }

    /// Reads the next token from the input, or `None` once it is exhausted.
    pub fn next(&mut self) -> Option<Token<'s>> {
        while let Some(&(start, ch)) = self.chars.peek() {
            let token = match ch {
                '\n' => self.line_break(start),
                _ if ch.is_whitespace() => {
                    self.chars.next();
                    None
                }
                '(' => self.advance_single(TokenKind::OpenParen),
                ')' => self.advance_single(TokenKind::CloseParen),
                '{' => self.advance_single(TokenKind::OpenBrace),
                '}' => self.advance_single(TokenKind::CloseBrace),
                ',' => self.advance_single(TokenKind::Comma),
                '.' => self.advance_single(TokenKind::Dot),
                '-' => self.advance_single(TokenKind::Minus),
                '+' => self.advance_single(TokenKind::Plus),
                ';' => self.advance_single(TokenKind::Semicolon),
                '*' => self.advance_single(TokenKind::Star),
                '%' => self.advance_single(TokenKind::Percent),
                '/' => self.slash(),
                '!' => self.advance_double(TokenKind::Bang, |ch| match ch {
                    '=' => Some(TokenKind::NotEqual),
                    _ => None,
                }),
                '=' => self.advance_double(TokenKind::Equal, |ch| match ch {
                    '=' => Some(TokenKind::EqualEqual),
                    _ => None,
                }),
                '<' => self.advance_double(TokenKind::Lt, |ch| match ch {
                    '=' => Some(TokenKind::LtEq),
                    _ => None,
                }),
                '>' => self.advance_double(TokenKind::Gt, |ch| match ch {
                    '=' => Some(TokenKind::GtEq),
                    _ => None,
                }),
                '"' => self.string(),
                _ if ch.is_ascii_alphabetic() || ch == '_' => Some(self.name()),
                _ if ch.is_ascii_digit() => self.number(),
                _ => {
                    self.chars.next();
                    self.error(format!("Unexpected character '{ch}'."));
                    None
                }
            };

            if token.is_some() {
                return token;
            }
        }

        None
    }

    pub fn eof(&mut self) -> Token<'s> {
        Token {
            kind: TokenKind::Eof,
            lexeme: self.strings.intern_str(""),
            file: self.file,
            line: self.line,
        }
    }
}

impl<'s, 'a> Tokens<'s, 'a> {
    fn line_break(&mut self, at: usize) -> Option<Token<'s>> {
        self.chars.next();

        let blank = matches!(&self.source[self.line_start..at], "" | "\r");
        let line = self.line;
        self.line += 1;
        self.line_start = at + 1;

        if blank {
            Some(self.token(TokenKind::NewLine, at, at + 1, line))
        } else {
            None
        }
    }

    fn slash(&mut self) -> Option<Token<'s>> {
        let (start, _) = self.chars.next()?;
        if let Some(&(_, '/')) = self.chars.peek() {
            while let Some(&(_, ch)) = self.chars.peek() {
                if ch == '\n' {
                    break;
                }
                self.chars.next();
            }
            None
        } else {
            Some(self.token(TokenKind::Slash, start, start + 1, self.line))
        }
    }

    fn string(&mut self) -> Option<Token<'s>> {
        let (start, _) = self.chars.next()?;
        let line = self.line;

        let mut string = std::string::String::new();
        let mut slash = false;
        loop {
            let Some((at, ch)) = self.chars.next() else {
                self.error("Unterminated string.");
                return None;
            };

            if ch == '\n' {
                self.line += 1;
                self.line_start = at + 1;
            }

            if slash {
                match ch {
                    '"' => string.push('"'),
                    '0' => string.push('\0'),
                    't' => string.push('\t'),
                    'n' => string.push('\n'),
                    'r' => string.push('\r'),
                    '\\' => string.push('\\'),
                    _ => {
                        self.error(format!("Unknown escape sequence '\\{ch}'."));
                        string.push(ch);
                    }
                }
                slash = false;
            } else if ch == '\\' {
                slash = true;
            } else if ch == '"' {
                break;
            } else {
                string.push(ch);
            }
        }

        let end = self.offset();
        let value = self.strings.intern(string);
        Some(self.token(TokenKind::String(value), start, end, line))
    }

    fn name(&mut self) -> Token<'s> {
        let start = self.offset();
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_ascii_alphanumeric() && ch != '_' {
                break;
            }
            self.chars.next();
        }
        let end = self.offset();

        let source = self.source;
        let name = &source[start..end];
        let kind = match name {
            "and" => TokenKind::And,
            "class" => TokenKind::Class,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "for" => TokenKind::For,
            "fun" => TokenKind::Fun,
            "if" => TokenKind::If,
            "let" => TokenKind::Let,
            "nil" => TokenKind::Nil,
            "or" => TokenKind::Or,
            "print" => TokenKind::Print,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "this" => TokenKind::This,
            "true" => TokenKind::True,
            "while" => TokenKind::While,
            "int" => TokenKind::Int,
            "double" => TokenKind::Double,
            "string" => TokenKind::Str,
            "bool" => TokenKind::Bool,
            _ => TokenKind::Identifier(self.strings.intern_str(name)),
        };

        self.token(kind, start, end, self.line)
    }

    fn number(&mut self) -> Option<Token<'s>> {
        let start = self.offset();
        self.digits();

        let mut seen_point = false;
        if self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            seen_point = true;
            self.chars.next();
            self.digits();
        }

        let end = self.offset();
        let source = self.source;
        let text = &source[start..end];

        if seen_point {
            let Ok(value) = text.parse::<f64>() else {
                unreachable!("Compiler bug: Unexpected error from parse::<f64>()")
            };

            Some(self.token(TokenKind::Float(value), start, end, self.line))
        } else if let Ok(value) = text.parse::<i64>() {
            Some(self.token(TokenKind::Integer(value), start, end, self.line))
        } else {
            self.error(format!("Integer literal '{text}' is out of range."));
            None
        }
    }

    fn digits(&mut self) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            self.chars.next();
        }
    }

    fn advance_single(&mut self, kind: TokenKind<'s>) -> Option<Token<'s>> {
        let (start, ch) = self.chars.next()?;
        Some(self.token(kind, start, start + ch.len_utf8(), self.line))
    }

    fn advance_double(
        &mut self,
        primary: TokenKind<'s>,
        secondary: impl FnOnce(char) -> Option<TokenKind<'s>>,
    ) -> Option<Token<'s>> {
        let (start, ch) = self.chars.next()?;
        if let Some(&(peek_start, peek)) = self.chars.peek() {
            if let Some(sec) = secondary(peek) {
                self.chars.next();
                return Some(self.token(sec, start, peek_start + peek.len_utf8(), self.line));
            }
        }

        Some(self.token(primary, start, start + ch.len_utf8(), self.line))
    }

    fn token(&mut self, kind: TokenKind<'s>, start: usize, end: usize, line: usize) -> Token<'s> {
        Token {
            kind,
            lexeme: self.strings.intern_str(&self.source[start..end]),
            file: self.file,
            line,
        }
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, ch)| ch)
    }

    fn error(&self, message: impl Into<String>) {
        self.errors
            .error(Diagnostic::lexical(self.file.as_str(), self.line, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DiagnosticKind;

    fn scan_kinds(source: &str) -> (Vec<String>, ErrorStream) {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let kinds = scan(source, "test.vena", &storage, &errors)
            .iter()
            .map(|t| format!("{:?}", t.kind))
            .collect();
        (kinds, errors)
    }

    #[test]
    fn operators_and_punctuation() {
        let (kinds, errors) = scan_kinds("== () {\n},.\r-+;\t*!!==<<=>>=%/");
        assert!(!errors.has_errors());
        assert_eq!(
            kinds,
            [
                "EqualEqual", "OpenParen", "CloseParen", "OpenBrace", "CloseBrace", "Comma", "Dot",
                "Minus", "Plus", "Semicolon", "Star", "Bang", "NotEqual", "Equal", "Lt", "LtEq",
                "Gt", "GtEq", "Percent", "Slash", "Eof",
            ]
        );
    }

    #[test]
    fn eof_is_always_last() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let tokens = scan("print 1 + 2;", "test.vena", &storage, &errors);

        assert_eq!(tokens.len(), 6);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));

        let tokens = scan("", "test.vena", &storage, &errors);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn invalid_character_is_skipped_and_flagged() {
        let (kinds, errors) = scan_kinds("1 & 2");
        assert_eq!(kinds, ["Integer(1)", "Integer(2)", "Eof"]);
        assert!(errors.has_errors());
        assert_eq!(errors.diagnostics()[0].kind, DiagnosticKind::Lexical);
    }

    #[test]
    fn comments_produce_no_tokens() {
        for (count, source) in [(0, "//asd"), (0, "// asd\n// comment 2"), (1, ">//asd")] {
            let (kinds, errors) = scan_kinds(source);
            assert!(!errors.has_errors());
            assert_eq!(kinds.len() - 1, count, "{source:?}");
        }
    }

    #[test]
    fn strings_decode_and_span_lines() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();

        for (expected, source) in [
            ("a", "\"a\""),
            ("abasdbasdbasd", "\"abasdbasdbasd\""),
            ("aba \rsdb as\ndb as//d", "\"aba \rsdb as\ndb as//d\""),
            ("tab\there \"quoted\"", r#""tab\there \"quoted\"""#),
        ] {
            let tokens = scan(source, "test.vena", &storage, &errors);
            assert_eq!(tokens.len(), 2);
            assert_eq!(tokens[0].lexeme.as_str(), source);
            match tokens[0].literal() {
                Some(Literal::String(s)) => assert_eq!(s.as_str(), expected),
                other => panic!("expected a string literal, got {other:?}"),
            }
        }
        assert!(!errors.has_errors());

        let tokens = scan("\"a\nb\" x", "test.vena", &storage, &errors);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_once() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let tokens = scan("print \"never closed", "test.vena", &storage, &errors);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.diagnostics()[0].message, "Unterminated string.");
        assert!(tokens
            .iter()
            .all(|t| !matches!(t.kind, TokenKind::String(_))));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn numbers_split_into_integers_and_floats() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let first = |source: &str| scan(source, "test.vena", &storage, &errors)[0].kind;

        assert_eq!(first("1"), TokenKind::Integer(1));
        assert_eq!(first("2"), TokenKind::Integer(2));
        assert_eq!(first("1234567890"), TokenKind::Integer(1234567890));
        assert_eq!(first("1.2"), TokenKind::Float(1.2));
        assert_eq!(first("1.0"), TokenKind::Float(1.0));
        assert_eq!(
            first("1234567890.1234567890"),
            TokenKind::Float(1234567890.1234567890)
        );
        assert!(!errors.has_errors());

        let tokens = scan("7.", "test.vena", &storage, &errors);
        assert_eq!(tokens[0].kind, TokenKind::Integer(7));
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn oversized_integer_is_rejected() {
        let (kinds, errors) = scan_kinds("99999999999999999999;");
        assert_eq!(kinds, ["Semicolon", "Eof"]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn identifiers_and_keywords() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        for name in ["asd", "var_iable", "verylongidentifierpleasebeokaywiththis_", "Print"] {
            let tokens = scan(name, "test.vena", &storage, &errors);
            match tokens[0].kind {
                TokenKind::Identifier(n) => assert_eq!(n.as_str(), name),
                other => panic!("expected identifier, got {other:?}"),
            }
        }

        let (kinds, _) = scan_kinds("int double string bool print nil true false");
        assert_eq!(
            kinds,
            ["Int", "Double", "Str", "Bool", "Print", "Nil", "True", "False", "Eof"]
        );
    }

    #[test]
    fn same_identifier_interns_once() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let tokens = scan("count count", "test.vena", &storage, &errors);
        assert_eq!(tokens[0].kind, tokens[1].kind);
    }

    #[test]
    fn lines_are_counted_exactly() {
        let storage = StringStorage::new();
        let errors = ErrorStream::new();
        let tokens = scan("a\nb\r\nc // tail\n  d", "test.vena", &storage, &errors);
        let lines: Vec<_> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, [1, 2, 3, 4, 4]);
    }

    #[test]
    fn blank_lines_become_new_line_tokens() {
        let (kinds, _) = scan_kinds("1;\n\n2;\r\n\r\n3;");
        assert_eq!(
            kinds,
            [
                "Integer(1)", "Semicolon", "NewLine", "Integer(2)", "Semicolon", "NewLine",
                "Integer(3)", "Semicolon", "Eof",
            ]
        );

        let (kinds, _) = scan_kinds("1;\n\t2;");
        assert!(!kinds.iter().any(|k| k == "NewLine"));
    }
}
