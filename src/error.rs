//! Error types and position tracking for the UTL-X runtime.
//!
//! Every layer (lexer, parser, interpreter, format adapters, engine
//! façade) raises one of the variants below. Errors carry a [`Span`]
//! wherever the failing construct has source text to point at; adapter
//! and engine errors that operate on foreign bytes carry a line/column
//! where the adapter can recover one.

use std::fmt;
use thiserror::Error;

/// A position in UTL-X script source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based).
    pub column: usize,
    /// Byte offset from the start of input (0-based).
    pub offset: usize,
}

impl Position {
    /// Position at the start of input.
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Advances the position by one character.
    pub fn advance(&mut self, c: char) {
        match c {
            '\n' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        self.offset += c.len_utf8();
    }

    /// Advances the position across a run of characters.
    pub fn advance_by(&mut self, text: &str) {
        for c in text.chars() {
            self.advance(c);
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of source text, used on every AST node for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn single(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn token(position: Position, length: usize) -> Self {
        let mut end = position;
        end.offset += length;
        end.column += length;
        Self { start: position, end }
    }

    /// Extends this span to also cover `other`.
    pub fn extend_to(&self, other: &Span) -> Self {
        Self {
            start: if self.start.offset <= other.start.offset {
                self.start
            } else {
                other.start
            },
            end: if self.end.offset >= other.end.offset {
                self.end
            } else {
                other.end
            },
        }
    }

    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Lexical analysis errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{character}' at {span}")]
    UnexpectedCharacter { character: char, span: Span },

    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("invalid escape sequence '\\{sequence}' at {span}")]
    InvalidEscape { sequence: String, span: Span },

    #[error("unterminated block comment at {span}")]
    UnterminatedComment { span: Span },

    #[error("invalid number literal at {span}: {message}")]
    InvalidNumber { message: String, span: Span },

    #[error("expected '%utlx' pragma at start of script, found {found} at {span}")]
    MissingPragma { found: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span, .. }
            | LexError::InvalidEscape { span, .. }
            | LexError::UnterminatedComment { span, .. }
            | LexError::InvalidNumber { span, .. }
            | LexError::MissingPragma { span, .. } => *span,
        }
    }
}

/// Parser (syntax) errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {token} at {span}, expected {expected}")]
    UnexpectedToken {
        token: String,
        expected: String,
        span: Span,
    },

    #[error("duplicate output directive at {span}")]
    DuplicateOutput { span: Span },

    #[error("attribute access '@{name}' is only valid as the final path segment, at {span}")]
    AttributeNotFinal { name: String, span: Span },

    #[error("malformed adapter option block at {span}: {message}")]
    InvalidOptions { message: String, span: Span },

    #[error("unknown format '{format}' at {span}")]
    UnknownFormat { format: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::DuplicateOutput { span }
            | ParseError::AttributeNotFinal { span, .. }
            | ParseError::InvalidOptions { span, .. }
            | ParseError::UnknownFormat { span, .. } => *span,
        }
    }
}

/// Interpreter (runtime evaluation) errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("'{function}' expects {min}..={max} argument(s), got {got}, at {span}")]
    ArityMismatch {
        function: String,
        min: usize,
        max: usize,
        got: usize,
        span: Span,
    },

    #[error("argument {index} to '{function}' has the wrong type: {hint}, at {span}")]
    ArgumentType {
        function: String,
        index: usize,
        hint: String,
        span: Span,
    },

    #[error("'{name}' is not a registered function or bound lambda, at {span}")]
    UnknownFunction { name: String, span: Span },

    #[error("attempted to use '{keyword}' as a path segment, at {span}")]
    PathKeyword { keyword: String, span: Span },

    #[error("maximum evaluation depth ({max_depth}) exceeded at {span}")]
    StackOverflow { max_depth: usize, span: Span },

    #[error("no template matches and no wildcard template is registered, at {span}")]
    NoMatchingTemplate { span: Span },

    #[error("division by zero at {span}")]
    DivisionByZero { span: Span },

    #[error("undefined identifier '{name}' at {span}")]
    UndefinedIdentifier { name: String, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::ArgumentType { span, .. }
            | RuntimeError::UnknownFunction { span, .. }
            | RuntimeError::PathKeyword { span, .. }
            | RuntimeError::StackOverflow { span, .. }
            | RuntimeError::NoMatchingTemplate { span }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::UndefinedIdentifier { span, .. } => *span,
        }
    }
}

/// Format adapter errors (parse side).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatParseError {
    #[error("[{adapter}] parse error at {line}:{column}: {message}")]
    Malformed {
        adapter: &'static str,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("[{adapter}] unsupported option '{option}'")]
    UnsupportedOption { adapter: &'static str, option: String },
}

/// Format adapter errors (serialize side).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormatSerializeError {
    #[error("[{adapter}] cannot serialize this value: {message}")]
    Unrepresentable { adapter: &'static str, message: String },
}

/// Compression/decompression errors (gzip, deflate, zip, jar).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompressionError {
    #[error("{algorithm} failed: {message}")]
    Failed { algorithm: &'static str, message: String },

    #[error("could not detect a compression algorithm from the leading bytes")]
    UnknownMagic,
}

/// Engine-façade errors: header/dispatch problems that are not lexical,
/// syntax, runtime, or adapter errors on their own.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("script declares no output directive")]
    NoOutputDirective,

    #[error("multi-output script called as single-output (use transform_multi)")]
    ExpectedMultiOutput,

    #[error("single-output script called as multi-output (use transform)")]
    ExpectedSingleOutput,

    #[error("no input named '{name}' was supplied")]
    MissingNamedInput { name: String },

    #[error("unknown output name '{name}' in multi-output script")]
    UnknownOutputName { name: String },
}

/// The single structured error type returned at the engine façade
/// boundary, wrapping every lower-layer error kind with an optional
/// chain of cause spans.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UtlxError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("format parse error: {0}")]
    FormatParse(#[from] FormatParseError),

    #[error("format serialize error: {0}")]
    FormatSerialize(#[from] FormatSerializeError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl UtlxError {
    /// The span of the failure, if the error kind carries one.
    pub fn span(&self) -> Option<Span> {
        match self {
            UtlxError::Lex(e) => Some(e.span()),
            UtlxError::Parse(e) => Some(e.span()),
            UtlxError::Runtime(e) => Some(e.span()),
            _ => None,
        }
    }
}

pub type UtlxResult<T> = Result<T, UtlxError>;

/// A source snippet renderer for a [`UtlxError`], for hosts (CLI, IDE
/// plugin) that want a human-readable diagnostic rather than the bare
/// `Display` message. Not produced automatically — a caller that has
/// both the error and the original source text builds one explicitly.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    source: String,
    span: Span,
}

impl ErrorContext {
    pub fn new(source: impl Into<String>, span: Span) -> Self {
        Self { source: source.into(), span }
    }

    /// The source line(s) the span covers, with a caret line under the
    /// offending column.
    pub fn snippet(&self) -> String {
        let lines: Vec<&str> = self.source.lines().collect();
        if lines.is_empty() || self.span.start.line == 0 || self.span.start.line > lines.len() {
            return String::new();
        }
        let line = lines[self.span.start.line - 1];
        let width = self.span.end.line.to_string().len();
        let caret_count = if self.span.start.line == self.span.end.line {
            self.span.end.column.saturating_sub(self.span.start.column).max(1)
        } else {
            1
        };
        let mut out = format!("{:width$} | {}\n", self.span.start.line, line, width = width);
        out.push_str(&" ".repeat(width + 3 + self.span.start.column.saturating_sub(1)));
        out.push_str(&"^".repeat(caret_count));
        out
    }

    /// `error_message` prefixed by location, followed by the snippet.
    pub fn format_error(&self, error_message: &str) -> String {
        format!("error at {}: {}\n{}", self.span.start, error_message, self.snippet())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_advance_tracks_lines_and_columns() {
        let mut pos = Position::new();
        pos.advance('a');
        assert_eq!((pos.line, pos.column, pos.offset), (1, 2, 1));
        pos.advance('\n');
        assert_eq!((pos.line, pos.column, pos.offset), (2, 1, 2));
        pos.advance('ü');
        assert_eq!((pos.line, pos.column, pos.offset), (2, 2, 4));
    }

    #[test]
    fn span_extend_to_covers_both() {
        let a = Span::single(Position {
            line: 1,
            column: 1,
            offset: 0,
        });
        let b = Span::single(Position {
            line: 1,
            column: 5,
            offset: 4,
        });
        let ext = a.extend_to(&b);
        assert_eq!(ext.start.offset, 0);
        assert_eq!(ext.end.offset, 4);
    }

    #[test]
    fn utlx_error_span_passthrough() {
        let e = UtlxError::from(RuntimeError::DivisionByZero {
            span: Span::single(Position::new()),
        });
        assert!(e.span().is_some());
    }

    #[test]
    fn error_context_snippet_points_at_the_span() {
        let source = "let x = 1 /\ny";
        let pos = Position { line: 1, column: 11, offset: 10 };
        let ctx = ErrorContext::new(source, Span::token(pos, 1));
        let snippet = ctx.snippet();
        assert!(snippet.contains("let x = 1 /"));
        assert!(snippet.contains('^'));
    }
}
