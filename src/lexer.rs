//! Lexer for UTL-X script source (§4.1).
//!
//! Character-at-a-time scanning with explicit line/column/offset
//! tracking: `position`, `line`, `column`, `current_char` fields and a
//! `next_token` that returns a tagged token plus its source position.

use crate::error::{LexError, Position, Span};

/// UTL-X tokens. Numeric literals preserve integer-vs-float distinction
/// from the lexeme itself (§3.1): a literal with no `.` and no exponent
/// lexes as `Integer`.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    String(String),
    Integer(i64),
    Float(f64),
    Identifier(String),

    KwInput,
    KwOutput,
    KwLet,
    KwIf,
    KwElse,
    KwMatch,
    KwTemplate,
    KwApply,
    KwTrue,
    KwFalse,
    KwNull,
    Underscore,

    /// `%utlx <version>` pragma, version text captured verbatim.
    Pragma(String),

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Colon,
    Dot,
    DotDot,
    At,
    Dollar,
    Equals,
    Arrow,    // =>
    Pipeline, // |>
    TripleDash,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,

    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::String(_) => "string literal".into(),
            Token::Integer(_) => "integer literal".into(),
            Token::Float(_) => "float literal".into(),
            Token::Identifier(s) => format!("identifier '{s}'"),
            Token::Eof => "end of input".into(),
            other => format!("'{:?}'", other),
        }
    }
}

#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    position: usize,
    line: usize,
    column: usize,
    current_char: Option<char>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Self {
            input,
            bytes: input.as_bytes(),
            position: 0,
            line: 1,
            column: 1,
            current_char: None,
        };
        lexer.current_char = lexer.input[lexer.position..].chars().next();
        lexer
    }

    pub fn current_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.current_char = self.input[self.position..].chars().next();
    }

    fn peek_at(&self, offset_chars: usize) -> Option<char> {
        self.input[self.position..].chars().nth(offset_chars)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            match self.current_char {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.current_char, None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let start = self.current_position();
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(c) = self.current_char {
                        if c == '*' && self.peek_at(1) == Some('/') {
                            self.advance();
                            self.advance();
                            closed = true;
                            break;
                        }
                        self.advance();
                    }
                    if !closed {
                        return Err(LexError::UnterminatedComment {
                            span: Span::single(start),
                        });
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Produces the next token and its span. Call repeatedly until
    /// [`Token::Eof`] is returned.
    pub fn next_token(&mut self) -> Result<(Token, Span), LexError> {
        self.skip_whitespace_and_comments()?;
        let start = self.current_position();

        let Some(c) = self.current_char else {
            return Ok((Token::Eof, Span::single(start)));
        };

        let tok = match c {
            '{' => {
                self.advance();
                Token::LBrace
            }
            '}' => {
                self.advance();
                Token::RBrace
            }
            '[' => {
                self.advance();
                Token::LBracket
            }
            ']' => {
                self.advance();
                Token::RBracket
            }
            '(' => {
                self.advance();
                Token::LParen
            }
            ')' => {
                self.advance();
                Token::RParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }
            ';' => {
                self.advance();
                Token::Semicolon
            }
            ':' => {
                self.advance();
                Token::Colon
            }
            '@' => {
                self.advance();
                Token::At
            }
            '$' => {
                self.advance();
                Token::Dollar
            }
            '.' => {
                self.advance();
                if self.current_char == Some('.') {
                    self.advance();
                    Token::DotDot
                } else {
                    Token::Dot
                }
            }
            '+' => {
                self.advance();
                Token::Plus
            }
            '-' => {
                if self.peek_at(1) == Some('-') && self.peek_at(2) == Some('-') {
                    self.advance();
                    self.advance();
                    self.advance();
                    Token::TripleDash
                } else {
                    self.advance();
                    Token::Minus
                }
            }
            '*' => {
                self.advance();
                Token::Star
            }
            '/' => {
                self.advance();
                Token::Slash
            }
            '%' => {
                if self.peek_at(1) == Some('u') {
                    return self.lex_pragma(start);
                }
                self.advance();
                Token::Percent
            }
            '=' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::EqEq
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::Arrow
                } else {
                    Token::Equals
                }
            }
            '!' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::Ne
                } else {
                    Token::Bang
                }
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.advance();
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '&' => {
                self.advance();
                if self.current_char == Some('&') {
                    self.advance();
                    Token::AndAnd
                } else {
                    return Err(LexError::UnexpectedCharacter {
                        character: '&',
                        span: Span::token(start, 1),
                    });
                }
            }
            '|' => {
                self.advance();
                if self.current_char == Some('|') {
                    self.advance();
                    Token::OrOr
                } else if self.current_char == Some('>') {
                    self.advance();
                    Token::Pipeline
                } else {
                    return Err(LexError::UnexpectedCharacter {
                        character: '|',
                        span: Span::token(start, 1),
                    });
                }
            }
            '"' | '\'' => return self.lex_string(c, start),
            c if c.is_ascii_digit() => return self.lex_number(start),
            c if c.is_alphabetic() || c == '_' => return self.lex_identifier(start),
            other => {
                return Err(LexError::UnexpectedCharacter {
                    character: other,
                    span: Span::token(start, other.len_utf8()),
                });
            }
        };

        let end = self.current_position();
        Ok((tok, Span::new(start, end)))
    }

    fn lex_pragma(&mut self, start: Position) -> Result<(Token, Span), LexError> {
        // consume "%utlx"
        for _ in 0..5 {
            self.advance();
        }
        while self.current_char == Some(' ') {
            self.advance();
        }
        let mut version = String::new();
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                break;
            }
            version.push(c);
            self.advance();
        }
        let end = self.current_position();
        Ok((Token::Pragma(version), Span::new(start, end)))
    }

    fn lex_identifier(&mut self, start: Position) -> Result<(Token, Span), LexError> {
        let mut text = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || (c == '-' && !text.is_empty()) {
                // hyphen allowed except at start (§4.1); stop if the
                // hyphen is followed by a digit-only suffix that looks
                // like subtraction (`x-1`), which callers disambiguate
                // by whitespace in practice — UTL-X keeps it simple and
                // always treats `-` inside a name as part of the name.
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let end = self.current_position();
        let span = Span::new(start, end);
        let tok = match text.as_str() {
            "input" => Token::KwInput,
            "output" => Token::KwOutput,
            "let" => Token::KwLet,
            "if" => Token::KwIf,
            "else" => Token::KwElse,
            "match" => Token::KwMatch,
            "template" => Token::KwTemplate,
            "apply" => Token::KwApply,
            "true" => Token::KwTrue,
            "false" => Token::KwFalse,
            "null" => Token::KwNull,
            "_" => Token::Underscore,
            _ => Token::Identifier(text),
        };
        Ok((tok, span))
    }

    fn lex_number(&mut self, start: Position) -> Result<(Token, Span), LexError> {
        let mut text = String::new();
        let mut is_float = false;
        while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
            text.push(self.current_char.unwrap());
            self.advance();
        }
        if self.current_char == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit())
        {
            is_float = true;
            text.push('.');
            self.advance();
            while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
                text.push(self.current_char.unwrap());
                self.advance();
            }
        }
        if matches!(self.current_char, Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if matches!(self.peek_at(lookahead), Some(c) if c.is_ascii_digit()) {
                is_float = true;
                text.push(self.current_char.unwrap());
                self.advance();
                if matches!(self.current_char, Some('+') | Some('-')) {
                    text.push(self.current_char.unwrap());
                    self.advance();
                }
                while matches!(self.current_char, Some(c) if c.is_ascii_digit()) {
                    text.push(self.current_char.unwrap());
                    self.advance();
                }
            }
        }
        let end = self.current_position();
        let span = Span::new(start, end);
        if is_float {
            text.parse::<f64>()
                .map(|f| (Token::Float(f), span))
                .map_err(|e| LexError::InvalidNumber {
                    message: e.to_string(),
                    span,
                })
        } else {
            text.parse::<i64>()
                .map(|i| (Token::Integer(i), span))
                .map_err(|e| LexError::InvalidNumber {
                    message: e.to_string(),
                    span,
                })
        }
    }

    fn lex_string(&mut self, quote: char, start: Position) -> Result<(Token, Span), LexError> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.current_char {
                None => {
                    return Err(LexError::UnterminatedString {
                        span: Span::new(start, self.current_position()),
                    });
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') if quote == '"' => {
                    let escape_start = self.current_position();
                    self.advance();
                    match self.current_char {
                        Some('n') => {
                            text.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            text.push('\t');
                            self.advance();
                        }
                        Some('r') => {
                            text.push('\r');
                            self.advance();
                        }
                        Some('\\') => {
                            text.push('\\');
                            self.advance();
                        }
                        Some('"') => {
                            text.push('"');
                            self.advance();
                        }
                        Some('\'') => {
                            text.push('\'');
                            self.advance();
                        }
                        Some('0') => {
                            text.push('\0');
                            self.advance();
                        }
                        Some('u') => {
                            self.advance();
                            if self.current_char != Some('{') {
                                return Err(LexError::InvalidEscape {
                                    sequence: "u".to_string(),
                                    span: Span::single(escape_start),
                                });
                            }
                            self.advance();
                            let mut hex = String::new();
                            while matches!(self.current_char, Some(c) if c != '}') {
                                hex.push(self.current_char.unwrap());
                                self.advance();
                            }
                            self.advance(); // closing brace
                            let code = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                            match code {
                                Some(ch) => text.push(ch),
                                None => {
                                    return Err(LexError::InvalidEscape {
                                        sequence: format!("u{{{hex}}}"),
                                        span: Span::single(escape_start),
                                    });
                                }
                            }
                        }
                        Some(other) => {
                            return Err(LexError::InvalidEscape {
                                sequence: other.to_string(),
                                span: Span::single(escape_start),
                            });
                        }
                        None => {
                            return Err(LexError::UnterminatedString {
                                span: Span::new(start, self.current_position()),
                            });
                        }
                    }
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        let end = self.current_position();
        Ok((Token::String(text), Span::new(start, end)))
    }

    pub fn source(&self) -> &'a str {
        self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let (tok, _) = lexer.next_token().unwrap();
            let done = tok == Token::Eof;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_pragma_and_directives() {
        let toks = tokens("%utlx 1.0\ninput json\noutput json\n---\nnull");
        assert_eq!(toks[0], Token::Pragma("1.0".to_string()));
        assert_eq!(toks[1], Token::KwInput);
        assert!(toks.contains(&Token::TripleDash));
    }

    #[test]
    fn integer_vs_float_preserved() {
        let toks = tokens("1 1.5 1e3 1.5e-2");
        assert_eq!(toks[0], Token::Integer(1));
        assert_eq!(toks[1], Token::Float(1.5));
        assert_eq!(toks[2], Token::Float(1000.0));
        assert_eq!(toks[3], Token::Float(0.015));
    }

    #[test]
    fn hyphenated_identifiers() {
        let toks = tokens("input-foo");
        assert_eq!(toks[0], Token::Identifier("input-foo".to_string()));
    }

    #[test]
    fn string_escapes() {
        let toks = tokens(r#""a\nb\u{41}""#);
        assert_eq!(toks[0], Token::String("a\nbA".to_string()));
    }

    #[test]
    fn operators_and_punctuation() {
        let toks = tokens("|> => == != <= >= && || .. @ $");
        assert_eq!(
            toks,
            vec![
                Token::Pipeline,
                Token::Arrow,
                Token::EqEq,
                Token::Ne,
                Token::Le,
                Token::Ge,
                Token::AndAnd,
                Token::OrOr,
                Token::DotDot,
                Token::At,
                Token::Dollar,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"abc");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedString { .. })
        ));
    }
}
