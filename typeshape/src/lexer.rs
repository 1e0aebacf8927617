//! Tolerant tokenizer for declaration source text.
//!
//! The lexer never fails. Declaration files may contain arbitrary code
//! around the type aliases we care about, so characters without a meaning
//! in the type grammar become [`TokenKind::Other`] and unterminated strings
//! end at the line break.

use crate::ast::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Num(f64),
    /// Template literal; content is not interpreted
    Template,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Lt,
    Gt,
    Pipe,
    Amp,
    Semi,
    Colon,
    Comma,
    Question,
    Eq,
    Dot,
    Ellipsis,
    Arrow,
    Minus,
    Other(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_ident(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(id) if id == word)
    }
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn span_here(&self) -> Span {
        Span::new(self.line, self.col)
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.current(), self.peek()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.current() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    while let Some(c) = self.advance() {
                        if c == '*' && self.current() == Some('/') {
                            self.advance();
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_string(&mut self, quote: char) -> TokenKind {
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.current() {
                None | Some('\n') => break,
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('r') => s.push('\r'),
                        Some(c) => s.push(c),
                        None => break,
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
        TokenKind::Str(s)
    }

    fn read_template(&mut self) -> TokenKind {
        self.advance(); // opening backtick
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '`' => break,
                _ => {}
            }
        }
        TokenKind::Template
    }

    fn read_number(&mut self) -> TokenKind {
        let mut ns = String::new();
        let mut seen_dot = false;
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                ns.push(ch);
            } else if ch == '.' && !seen_dot && matches!(self.peek(), Some(d) if d.is_ascii_digit())
            {
                seen_dot = true;
                ns.push(ch);
            } else if ch == '_' {
                // numeric separator
            } else if (ch == 'e' || ch == 'E') && !ns.is_empty() {
                ns.push(ch);
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.current() {
                    ns.push(sign);
                } else {
                    continue;
                }
            } else {
                break;
            }
            self.advance();
        }
        match ns.parse::<f64>() {
            Ok(n) => TokenKind::Num(n),
            Err(_) => TokenKind::Other('0'),
        }
    }

    fn read_ident(&mut self) -> TokenKind {
        let mut id = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                id.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Ident(id)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let span = self.span_here();
            let Some(ch) = self.current() else { break };
            let kind = match ch {
                '"' | '\'' => self.read_string(ch),
                '`' => self.read_template(),
                c if c.is_ascii_digit() => self.read_number(),
                c if c.is_alphabetic() || c == '_' || c == '$' => self.read_ident(),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '<' => self.single(TokenKind::Lt),
                '>' => self.single(TokenKind::Gt),
                '|' => self.single(TokenKind::Pipe),
                '&' => self.single(TokenKind::Amp),
                ';' => self.single(TokenKind::Semi),
                ':' => self.single(TokenKind::Colon),
                ',' => self.single(TokenKind::Comma),
                '?' => self.single(TokenKind::Question),
                '-' => self.single(TokenKind::Minus),
                '=' => {
                    self.advance();
                    if self.current() == Some('>') {
                        self.advance();
                        TokenKind::Arrow
                    } else {
                        TokenKind::Eq
                    }
                }
                '.' => {
                    if self.peek() == Some('.') && self.source.get(self.pos + 2) == Some(&'.') {
                        self.advance();
                        self.advance();
                        self.advance();
                        TokenKind::Ellipsis
                    } else if matches!(self.peek(), Some(d) if d.is_ascii_digit()) {
                        self.read_number()
                    } else {
                        self.single(TokenKind::Dot)
                    }
                }
                other => self.single(TokenKind::Other(other)),
            };
            tokens.push(Token::new(kind, span));
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_declaration() {
        assert_eq!(
            kinds("export type A = { x?: string };"),
            vec![
                TokenKind::Ident("export".into()),
                TokenKind::Ident("type".into()),
                TokenKind::Ident("A".into()),
                TokenKind::Eq,
                TokenKind::LBrace,
                TokenKind::Ident("x".into()),
                TokenKind::Question,
                TokenKind::Colon,
                TokenKind::Ident("string".into()),
                TokenKind::RBrace,
                TokenKind::Semi,
            ]
        );
    }

    #[test]
    fn test_lex_strings_and_numbers() {
        assert_eq!(
            kinds(r#"'air' "li\"quid" 42 3.5 1_000"#),
            vec![
                TokenKind::Str("air".into()),
                TokenKind::Str("li\"quid".into()),
                TokenKind::Num(42.0),
                TokenKind::Num(3.5),
                TokenKind::Num(1000.0),
            ]
        );
    }

    #[test]
    fn test_lex_skips_comments() {
        assert_eq!(
            kinds("// line\n/* block\n */ a"),
            vec![TokenKind::Ident("a".into())]
        );
    }

    #[test]
    fn test_lex_ellipsis_and_arrow() {
        assert_eq!(
            kinds("...x => y"),
            vec![
                TokenKind::Ellipsis,
                TokenKind::Ident("x".into()),
                TokenKind::Arrow,
                TokenKind::Ident("y".into()),
            ]
        );
    }

    #[test]
    fn test_lex_never_fails_on_foreign_code() {
        let tokens = kinds("const x = `a ${b}` + 1 % 2 # @");
        assert!(tokens.contains(&TokenKind::Template));
        assert!(tokens.contains(&TokenKind::Other('%')));
        assert!(tokens.contains(&TokenKind::Other('@')));
    }

    #[test]
    fn test_lex_tracks_positions() {
        let tokens = Lexer::new("a\n  b").tokenize();
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 3));
    }
}
