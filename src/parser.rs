//! Recursive-descent, precedence-climbing parser for UTL-X scripts
//! (§4.2). Builds the AST in `crate::ast` from the token stream in
//! `crate::lexer`, a two-phase lexer-wrapping-parser shape applied to
//! a header-plus-expression script grammar (§3.3, §6.1).

use indexmap::IndexMap;

use crate::ast::*;
use crate::error::{ParseError, Span, UtlxError};
use crate::lexer::{Lexer, Token};

#[derive(Clone)]
struct LexerState<'a> {
    lexer: Lexer<'a>,
    current: Token,
    current_span: Span,
}

pub struct Parser<'a> {
    state: LexerState<'a>,
    template_order: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, UtlxError> {
        let mut lexer = Lexer::new(source);
        let (current, current_span) = lexer.next_token().map_err(UtlxError::from)?;
        Ok(Self {
            state: LexerState {
                lexer,
                current,
                current_span,
            },
            template_order: 0,
        })
    }

    fn bump(&mut self) -> Result<(), UtlxError> {
        let (tok, span) = self.state.lexer.next_token().map_err(UtlxError::from)?;
        self.state.current = tok;
        self.state.current_span = span;
        Ok(())
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), UtlxError> {
        if &self.state.current == expected {
            self.bump()
        } else {
            Err(ParseError::UnexpectedToken {
                token: self.state.current.describe(),
                expected: what.to_string(),
                span: self.state.current_span,
            }
            .into())
        }
    }

    fn expect_identifier(&mut self) -> Result<String, UtlxError> {
        match self.state.current.clone() {
            Token::Identifier(name) => {
                self.bump()?;
                Ok(name)
            }
            other => Err(ParseError::UnexpectedToken {
                token: other.describe(),
                expected: "identifier".to_string(),
                span: self.state.current_span,
            }
            .into()),
        }
    }

    // ---- entry point --------------------------------------------------

    pub fn parse_script(source: &'a str) -> Result<Script, UtlxError> {
        let mut parser = Parser::new(source)?;
        let header = parser.parse_header()?;
        let body = parser.parse_body()?;
        Ok(Script { header, body })
    }

    fn parse_header(&mut self) -> Result<Header, UtlxError> {
        let version = match self.state.current.clone() {
            Token::Pragma(v) => {
                self.bump()?;
                v
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    token: other.describe(),
                    expected: "'%utlx' version pragma".to_string(),
                    span: self.state.current_span,
                }
                .into());
            }
        };

        let mut inputs = Vec::new();
        let mut output = None;

        loop {
            match self.state.current {
                Token::KwInput => {
                    inputs.push(self.parse_input_directive()?);
                }
                Token::KwOutput => {
                    if output.is_some() {
                        return Err(ParseError::DuplicateOutput {
                            span: self.state.current_span,
                        }
                        .into());
                    }
                    output = Some(self.parse_output_directive()?);
                }
                Token::TripleDash => {
                    self.bump()?;
                    break;
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        token: self.state.current.describe(),
                        expected: "'input', 'output', or '---'".to_string(),
                        span: self.state.current_span,
                    }
                    .into());
                }
            }
        }

        let output = output.ok_or(crate::error::EngineError::NoOutputDirective)?;
        Ok(Header {
            version,
            inputs,
            output,
        })
    }

    fn parse_input_directive(&mut self) -> Result<InputDirective, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwInput, "'input'")?;
        let format = self.expect_format_name()?;
        let name = if let Token::Identifier(n) = self.state.current.clone() {
            self.bump()?;
            Some(n)
        } else {
            None
        };
        let options = if self.state.current == Token::LBrace {
            self.parse_options_block()?
        } else {
            IndexMap::new()
        };
        let span = start.extend_to(&self.state.current_span);
        Ok(InputDirective {
            format,
            name,
            options,
            span,
        })
    }

    fn parse_output_directive(&mut self) -> Result<OutputSpec, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwOutput, "'output'")?;
        if self.state.current == Token::LBrace {
            self.bump()?;
            let mut targets = Vec::new();
            while self.state.current != Token::RBrace {
                let name_span = self.state.current_span;
                let name = self.expect_identifier()?;
                self.expect(&Token::Colon, "':'")?;
                let format = self.expect_format_name()?;
                let options = if self.state.current == Token::LBrace {
                    self.parse_options_block()?
                } else {
                    IndexMap::new()
                };
                targets.push(OutputTarget {
                    name: Some(name),
                    format,
                    options,
                    span: name_span.extend_to(&self.state.current_span),
                });
                if self.state.current == Token::Comma {
                    self.bump()?;
                }
            }
            self.expect(&Token::RBrace, "'}'")?;
            Ok(OutputSpec::Multi(targets))
        } else {
            let format = self.expect_format_name()?;
            let options = if self.state.current == Token::LBrace {
                self.parse_options_block()?
            } else {
                IndexMap::new()
            };
            let span = start.extend_to(&self.state.current_span);
            Ok(OutputSpec::Single(OutputTarget {
                name: None,
                format,
                options,
                span,
            }))
        }
    }

    fn expect_format_name(&mut self) -> Result<String, UtlxError> {
        match self.state.current.clone() {
            Token::Identifier(name) => {
                self.bump()?;
                Ok(name)
            }
            other => Err(ParseError::UnexpectedToken {
                token: other.describe(),
                expected: "a format name (json, xml, csv, yaml, xsd, jsch, auto)".to_string(),
                span: self.state.current_span,
            }
            .into()),
        }
    }

    fn parse_options_block(&mut self) -> Result<OptionsMap, UtlxError> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut map = IndexMap::new();
        while self.state.current != Token::RBrace {
            let key = self.expect_identifier()?;
            self.expect(&Token::Colon, "':'")?;
            let value = self.parse_option_value()?;
            map.insert(key, value);
            if self.state.current == Token::Comma {
                self.bump()?;
            }
        }
        self.expect(&Token::RBrace, "'}'")?;
        Ok(map)
    }

    fn parse_option_value(&mut self) -> Result<OptionValue, UtlxError> {
        match self.state.current.clone() {
            Token::String(s) => {
                self.bump()?;
                Ok(OptionValue::String(s))
            }
            Token::Integer(i) => {
                self.bump()?;
                Ok(OptionValue::Integer(i))
            }
            Token::Float(f) => {
                self.bump()?;
                Ok(OptionValue::Float(f))
            }
            Token::KwTrue => {
                self.bump()?;
                Ok(OptionValue::Boolean(true))
            }
            Token::KwFalse => {
                self.bump()?;
                Ok(OptionValue::Boolean(false))
            }
            Token::KwNull => {
                self.bump()?;
                Ok(OptionValue::Null)
            }
            Token::Identifier(ident) => {
                // bare words (e.g. `regionalFormat: european`) are
                // accepted as strings so enum-like options read
                // naturally without quoting.
                self.bump()?;
                Ok(OptionValue::String(ident))
            }
            Token::LBracket => {
                self.bump()?;
                let mut items = Vec::new();
                while self.state.current != Token::RBracket {
                    items.push(self.parse_option_value()?);
                    if self.state.current == Token::Comma {
                        self.bump()?;
                    }
                }
                self.expect(&Token::RBracket, "']'")?;
                Ok(OptionValue::List(items))
            }
            Token::LBrace => {
                let inner = self.parse_options_block_raw()?;
                Ok(OptionValue::Map(inner))
            }
            other => Err(ParseError::InvalidOptions {
                message: format!("unexpected {} in option value", other.describe()),
                span: self.state.current_span,
            }
            .into()),
        }
    }

    fn parse_options_block_raw(&mut self) -> Result<IndexMap<String, OptionValue>, UtlxError> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut map = IndexMap::new();
        while self.state.current != Token::RBrace {
            let key = self.expect_identifier()?;
            self.expect(&Token::Colon, "':'")?;
            let value = self.parse_option_value()?;
            map.insert(key, value);
            if self.state.current == Token::Comma {
                self.bump()?;
            }
        }
        self.expect(&Token::RBrace, "'}'")?;
        Ok(map)
    }

    // ---- body -----------------------------------------------------

    fn parse_body(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        let mut templates = Vec::new();
        while self.state.current == Token::KwTemplate {
            templates.push(self.parse_template_decl()?);
        }
        let result = self.parse_expr()?;
        let span = start.extend_to(&result.span);
        Ok(Expr::new(
            ExprKind::Program {
                templates,
                result: Box::new(result),
            },
            span,
        ))
    }

    fn parse_template_decl(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwTemplate, "'template'")?;
        // `match` is itself a reserved keyword (used by the `match`
        // expression), so the clause is recognized by token rather
        // than by `expect_identifier`.
        self.expect(&Token::KwMatch, "'match'")?;
        self.expect(&Token::Equals, "'='")?;
        let matcher = match self.state.current.clone() {
            Token::String(name) => {
                self.bump()?;
                TemplateMatcher::Name(name)
            }
            _ => TemplateMatcher::Predicate(Box::new(self.parse_expr()?)),
        };
        self.expect(&Token::LBrace, "'{'")?;
        let body = self.parse_expr()?;
        self.expect(&Token::RBrace, "'}'")?;
        let order = self.template_order;
        self.template_order += 1;
        let span = start.extend_to(&self.state.current_span);
        Ok(Expr::new(
            ExprKind::TemplateDecl(TemplateDecl {
                matcher,
                body: Box::new(body),
                order,
            }),
            span,
        ))
    }

    // ---- expression precedence chain -------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, UtlxError> {
        self.parse_pipeline()
    }

    fn parse_pipeline(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_or()?;
        while self.state.current == Token::Pipeline {
            self.bump()?;
            let right = self.parse_or()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Pipeline {
                    value: Box::new(left),
                    call: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_and()?;
        while self.state.current == Token::OrOr {
            self.bump()?;
            let right = self.parse_and()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_equality()?;
        while self.state.current == Token::AndAnd {
            self.bump()?;
            let right = self.parse_equality()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.state.current {
                Token::EqEq => BinaryOp::Eq,
                Token::Ne => BinaryOp::Ne,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_relational()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.state.current {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_additive()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.state.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_multiplicative()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, UtlxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.state.current {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_unary()?;
            let span = left.span.extend_to(&right.span);
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        match self.state.current {
            Token::Minus => {
                self.bump()?;
                let expr = self.parse_unary()?;
                let span = start.extend_to(&expr.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Neg,
                        expr: Box::new(expr),
                    },
                    span,
                ))
            }
            Token::Bang => {
                self.bump()?;
                let expr = self.parse_unary()?;
                let span = start.extend_to(&expr.span);
                Ok(Expr::new(
                    ExprKind::Unary {
                        op: UnaryOp::Not,
                        expr: Box::new(expr),
                    },
                    span,
                ))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, UtlxError> {
        let mut base = self.parse_primary()?;
        loop {
            match self.state.current.clone() {
                Token::Dot => {
                    let seg_start = self.state.current_span;
                    self.bump()?;
                    let (seg, seg_end) = match self.state.current.clone() {
                        Token::Star => {
                            let end = self.state.current_span;
                            self.bump()?;
                            (PathSegment::Wildcard, end)
                        }
                        Token::At => {
                            self.bump()?;
                            let end = self.state.current_span;
                            let name = self.expect_identifier()?;
                            (PathSegment::Attribute(name), end)
                        }
                        Token::Identifier(name) => {
                            let end = self.state.current_span;
                            self.bump()?;
                            (PathSegment::Property(name), end)
                        }
                        other => {
                            return Err(ParseError::UnexpectedToken {
                                token: other.describe(),
                                expected: "a property name, '@name', or '*'".to_string(),
                                span: self.state.current_span,
                            }
                            .into());
                        }
                    };
                    base = self.push_segment(base, seg, seg_start.extend_to(&seg_end))?;
                }
                Token::DotDot => {
                    let seg_start = self.state.current_span;
                    self.bump()?;
                    let seg_end = self.state.current_span;
                    let name = self.expect_identifier()?;
                    base = self.push_segment(
                        base,
                        PathSegment::Descendant(name),
                        seg_start.extend_to(&seg_end),
                    )?;
                }
                Token::LBracket => {
                    let seg_start = self.state.current_span;
                    self.bump()?;
                    base = self.parse_bracket_segment(base, seg_start)?;
                }
                Token::LParen => {
                    self.bump()?;
                    let args = self.parse_arg_list()?;
                    self.expect(&Token::RParen, "')'")?;
                    let span = base.span.extend_to(&self.state.current_span);
                    base = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(base),
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(base)
    }

    /// Disambiguates `[n]` (index), `["@name"]` (attribute shorthand),
    /// `["name"]` (computed property — needed for names bracket
    /// notation can express that dotted access can't, e.g. `xs:element`),
    /// and `[cond]` (predicate filter).
    fn parse_bracket_segment(&mut self, base: Expr, seg_start: Span) -> Result<Expr, UtlxError> {
        match self.state.current.clone() {
            Token::Integer(i) => {
                self.bump()?;
                let end = self.state.current_span;
                self.expect(&Token::RBracket, "']'")?;
                self.push_segment(base, PathSegment::Index(i), seg_start.extend_to(&end))
            }
            Token::Minus => {
                self.bump()?;
                if let Token::Integer(i) = self.state.current {
                    self.bump()?;
                    let end = self.state.current_span;
                    self.expect(&Token::RBracket, "']'")?;
                    self.push_segment(base, PathSegment::Index(-i), seg_start.extend_to(&end))
                } else {
                    Err(ParseError::UnexpectedToken {
                        token: self.state.current.describe(),
                        expected: "integer index".to_string(),
                        span: self.state.current_span,
                    }
                    .into())
                }
            }
            Token::String(s) => {
                self.bump()?;
                let end = self.state.current_span;
                self.expect(&Token::RBracket, "']'")?;
                let seg = if let Some(attr) = s.strip_prefix('@') {
                    PathSegment::Attribute(attr.to_string())
                } else {
                    PathSegment::Property(s)
                };
                self.push_segment(base, seg, seg_start.extend_to(&end))
            }
            _ => {
                let cond = self.parse_expr()?;
                self.expect(&Token::RBracket, "']'")?;
                let span = base.span.extend_to(&cond.span);
                Ok(Expr::new(
                    ExprKind::Predicate {
                        base: Box::new(base),
                        cond: Box::new(cond),
                    },
                    span,
                ))
            }
        }
    }

    fn push_segment(
        &self,
        base: Expr,
        seg: PathSegment,
        seg_span: Span,
    ) -> Result<Expr, UtlxError> {
        let new_span = base.span.extend_to(&seg_span);
        match base.kind {
            ExprKind::Path {
                base: inner,
                mut segments,
            } => {
                if matches!(segments.last(), Some(PathSegment::Attribute(_))) {
                    return Err(ParseError::AttributeNotFinal {
                        name: match &seg {
                            PathSegment::Attribute(n) | PathSegment::Property(n) => n.clone(),
                            _ => String::new(),
                        },
                        span: seg_span,
                    }
                    .into());
                }
                segments.push(seg);
                Ok(Expr::new(ExprKind::Path { base: inner, segments }, new_span))
            }
            other => Ok(Expr::new(
                ExprKind::Path {
                    base: Box::new(Expr::new(other, base.span)),
                    segments: vec![seg],
                },
                new_span,
            )),
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, UtlxError> {
        let mut args = Vec::new();
        while self.state.current != Token::RParen {
            args.push(self.parse_expr()?);
            if self.state.current == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        match self.state.current.clone() {
            Token::Integer(i) => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Literal(Literal::Integer(i)), start))
            }
            Token::Float(f) => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Literal(Literal::Float(f)), start))
            }
            Token::String(s) => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Literal(Literal::String(s)), start))
            }
            Token::KwTrue => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Literal(Literal::Boolean(true)), start))
            }
            Token::KwFalse => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Literal(Literal::Boolean(false)), start))
            }
            Token::KwNull => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Literal(Literal::Null), start))
            }
            Token::At => {
                self.bump()?;
                if let Token::Identifier(name) = self.state.current.clone() {
                    self.bump()?;
                    let span = start.extend_to(&self.state.current_span);
                    Ok(Expr::new(
                        ExprKind::Path {
                            base: Box::new(Expr::new(ExprKind::CurrentContext, start)),
                            segments: vec![PathSegment::Attribute(name)],
                        },
                        span,
                    ))
                } else {
                    Ok(Expr::new(ExprKind::CurrentContext, start))
                }
            }
            Token::Dollar => {
                self.bump()?;
                // `input` lexes as the reserved `KwInput` token even
                // here, so `$input` needs its own case alongside
                // `$input-name` (an ordinary hyphenated identifier).
                let name = match self.state.current.clone() {
                    Token::KwInput => {
                        self.bump()?;
                        "input".to_string()
                    }
                    Token::Identifier(n) => {
                        self.bump()?;
                        n
                    }
                    other => {
                        return Err(ParseError::UnexpectedToken {
                            token: other.describe(),
                            expected: "an input name after '$'".to_string(),
                            span: self.state.current_span,
                        }
                        .into());
                    }
                };
                let span = start.extend_to(&self.state.current_span);
                Ok(Expr::new(ExprKind::InputRef(name), span))
            }
            Token::Identifier(name) => {
                self.bump()?;
                Ok(Expr::new(ExprKind::Identifier(name), start))
            }
            Token::KwInput => {
                // `input` is also a reserved header keyword but reads
                // naturally as the default input's bare name too.
                self.bump()?;
                Ok(Expr::new(ExprKind::InputRef("input".to_string()), start))
            }
            Token::LBracket => self.parse_array_literal(),
            Token::LBrace => self.parse_object_literal(),
            Token::LParen => self.parse_paren_or_lambda(),
            Token::KwLet => self.parse_let(),
            Token::KwIf => self.parse_if(),
            Token::KwMatch => self.parse_match(),
            Token::KwApply => self.parse_apply(),
            other => Err(ParseError::UnexpectedToken {
                token: other.describe(),
                expected: "an expression".to_string(),
                span: self.state.current_span,
            }
            .into()),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::LBracket, "'['")?;
        let mut items = Vec::new();
        while self.state.current != Token::RBracket {
            items.push(self.parse_expr()?);
            if self.state.current == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        let end = self.state.current_span;
        self.expect(&Token::RBracket, "']'")?;
        Ok(Expr::new(ExprKind::ArrayLit(items), start.extend_to(&end)))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::LBrace, "'{'")?;
        let mut entries = Vec::new();
        while self.state.current != Token::RBrace {
            let key = match self.state.current.clone() {
                Token::At => {
                    self.bump()?;
                    let name = self.expect_identifier()?;
                    ObjectKey::Attribute(name)
                }
                Token::Identifier(name) => {
                    self.bump()?;
                    ObjectKey::Name(name)
                }
                Token::String(s) => {
                    self.bump()?;
                    ObjectKey::Name(s)
                }
                Token::LBracket => {
                    self.bump()?;
                    let e = self.parse_expr()?;
                    self.expect(&Token::RBracket, "']'")?;
                    ObjectKey::Computed(Box::new(e))
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        token: other.describe(),
                        expected: "an object key".to_string(),
                        span: self.state.current_span,
                    }
                    .into());
                }
            };
            self.expect(&Token::Colon, "':'")?;
            let value = self.parse_expr()?;
            entries.push(ObjectEntry {
                key,
                value: Box::new(value),
            });
            if self.state.current == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        let end = self.state.current_span;
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Expr::new(ExprKind::ObjectLit(entries), start.extend_to(&end)))
    }

    /// `(expr)` or `(a, b) => body`. Snapshots lexer state to try the
    /// lambda-parameter-list reading first, falling back to a grouped
    /// expression.
    fn parse_paren_or_lambda(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        let snapshot = self.state.clone();

        if let Some(lambda) = self.try_parse_lambda(start)? {
            return Ok(lambda);
        }
        self.state = snapshot;

        self.expect(&Token::LParen, "'('")?;
        let inner = self.parse_expr()?;
        self.expect(&Token::RParen, "')'")?;
        Ok(inner)
    }

    fn try_parse_lambda(&mut self, start: Span) -> Result<Option<Expr>, UtlxError> {
        self.expect(&Token::LParen, "'('")?;
        let mut params = Vec::new();
        while let Token::Identifier(name) = self.state.current.clone() {
            params.push(name);
            self.bump()?;
            if self.state.current == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        if self.state.current != Token::RParen {
            return Ok(None);
        }
        self.bump()?; // RParen
        if self.state.current != Token::Arrow {
            return Ok(None);
        }
        self.bump()?; // =>
        let body = self.parse_expr()?;
        let span = start.extend_to(&body.span);
        Ok(Some(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            span,
        )))
    }

    fn parse_let(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwLet, "'let'")?;
        let mut bindings = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect(&Token::Equals, "'='")?;
            let value = self.parse_expr()?;
            bindings.push(Binding {
                name,
                value: Box::new(value),
            });
            if self.state.current == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        self.expect(&Token::Arrow, "'=>'")?;
        let body = self.parse_expr()?;
        let span = start.extend_to(&body.span);
        Ok(Expr::new(
            ExprKind::Let {
                bindings,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_if(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwIf, "'if'")?;
        self.expect(&Token::LParen, "'('")?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen, "')'")?;
        let then_branch = self.parse_expr()?;
        self.expect(&Token::KwElse, "'else'")?;
        let else_branch = self.parse_expr()?;
        let span = start.extend_to(&else_branch.span);
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }

    fn parse_match(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwMatch, "'match'")?;
        let scrutinee = self.parse_expr()?;
        self.expect(&Token::LBrace, "'{'")?;
        let mut arms = Vec::new();
        while self.state.current != Token::RBrace {
            let pattern = match self.state.current.clone() {
                Token::Underscore => {
                    self.bump()?;
                    None
                }
                Token::Integer(i) => {
                    self.bump()?;
                    Some(Literal::Integer(i))
                }
                Token::Float(f) => {
                    self.bump()?;
                    Some(Literal::Float(f))
                }
                Token::String(s) => {
                    self.bump()?;
                    Some(Literal::String(s))
                }
                Token::KwTrue => {
                    self.bump()?;
                    Some(Literal::Boolean(true))
                }
                Token::KwFalse => {
                    self.bump()?;
                    Some(Literal::Boolean(false))
                }
                Token::KwNull => {
                    self.bump()?;
                    Some(Literal::Null)
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        token: other.describe(),
                        expected: "a scalar literal pattern or '_'".to_string(),
                        span: self.state.current_span,
                    }
                    .into());
                }
            };
            self.expect(&Token::Arrow, "'=>'")?;
            let body = self.parse_expr()?;
            arms.push(MatchArm {
                pattern,
                body: Box::new(body),
            });
            if self.state.current == Token::Comma {
                self.bump()?;
            } else {
                break;
            }
        }
        let end = self.state.current_span;
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Expr::new(
            ExprKind::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
            start.extend_to(&end),
        ))
    }

    fn parse_apply(&mut self) -> Result<Expr, UtlxError> {
        let start = self.state.current_span;
        self.expect(&Token::KwApply, "'apply'")?;
        self.expect(&Token::LParen, "'('")?;
        let path = self.parse_expr()?;
        self.expect(&Token::RParen, "')'")?;
        let span = start.extend_to(&self.state.current_span);
        Ok(Expr::new(
            ExprKind::Apply {
                path: Box::new(path),
            },
            span,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Script {
        Parser::parse_script(src).unwrap_or_else(|e| panic!("parse failed: {e}\nsource:\n{src}"))
    }

    #[test]
    fn parses_minimal_script() {
        let script = parse("%utlx 1.0\ninput json\noutput json\n---\nnull");
        assert_eq!(script.header.version, "1.0");
        assert_eq!(script.header.inputs.len(), 1);
        assert!(!script.header.output.is_multi());
    }

    #[test]
    fn parses_multi_output_header() {
        let script = parse(
            "%utlx 1.0\ninput json\noutput { a: json, b: xml }\n---\nnull",
        );
        assert!(script.header.output.is_multi());
    }

    #[test]
    fn parses_scenario_a_style_script() {
        let src = r#"%utlx 1.0
input xsd { arrays: ["xs:element"] }
output json
---
{ names: map($input["xs:element"], e => e["@name"]) }"#;
        let script = parse(src);
        assert_eq!(script.header.inputs[0].format, "xsd");
    }

    #[test]
    fn attribute_must_be_final_path_segment() {
        let src = "%utlx 1.0\ninput json\noutput json\n---\n$input.@id.foo";
        assert!(Parser::parse_script(src).is_err());
    }

    #[test]
    fn parses_pipeline_and_lambda() {
        let src = "%utlx 1.0\ninput json\noutput json\n---\n$input |> map(x => x + 1)";
        parse(src);
    }

    #[test]
    fn parses_let_if_match_apply() {
        let src = r#"%utlx 1.0
input xml
output json
---
template match="Items" { { items: apply(Item) } }
template match="Item" { { sku: @sku } }
let x = 1, y = if (x == 1) "one" else "many" => match y { "one" => 1, _ => 0 }"#;
        parse(src);
    }
}
