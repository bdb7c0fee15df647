//! Recursive descent parser with colon-introduced block tracking.
//!
//! The parser keeps its own indentation stack next to the one the tokenizer
//! used, so that INDENT/DEDENT tokens are validated against the blocks that
//! were actually opened. Nesting depth is bounded only by the call stack.

use crate::compiler::ast::*;
use crate::compiler::lexer::{MSG_INVALID_SYNTAX, MSG_UNINDENT_MISMATCH};
use crate::compiler::literal::parse_literal;
use crate::compiler::source::SourceIndex;
use crate::compiler::tokens::{Pattern, Span, Token, TokenKind, TokenValue};
use crate::diagnostics::{Diagnostic, ErrorKind};
use tracing::debug;

pub const MSG_EXPECTED_BLOCK: &str = "expected an indented block";
pub const MSG_UNEXPECTED_INDENT: &str = "unexpected indent";
pub const MSG_UNEXPECTED_DEDENT: &str = "unexpected dedent";
pub const MSG_UNEXPECTED_EOF: &str = "unexpected EOF while parsing";
pub const MSG_POSITIONAL_AFTER_KEYWORD: &str = "positional argument follows keyword argument";
pub const MSG_KEYWORD_REPEATED: &str = "keyword argument repeated";

/// Tokens that can begin an expression.
const EXPRESSION_START: Pattern = Pattern::AnyOf(&[
    TokenKind::Number,
    TokenKind::String,
    TokenKind::True,
    TokenKind::False,
    TokenKind::None,
    TokenKind::Identifier,
    TokenKind::Lpar,
    TokenKind::Lsqb,
    TokenKind::Lbrace,
]);

/// What the parser expects with respect to colon-introduced blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    NotExpecting,
    /// A colon was seen on `line`; a block body must follow.
    Expecting { line: usize },
    SingleLine,
    /// Inside one multi-line block.
    MultiLine,
    /// Inside a multi-line block that is itself inside another.
    Nested,
}

#[derive(Debug, Clone, Copy)]
struct BlockFrame {
    kind: BlockKind,
    indent: usize,
    start_line: usize,
}

pub struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
    source: &'s SourceIndex,
    indent_stack: Vec<usize>,
    current_indent: usize,
    mode: BlockMode,
    frames: Vec<BlockFrame>,
    /// Set when the statement just parsed is followed by a colon.
    header_ready: bool,
    /// Set when a single-line block closes; an INDENT right after its
    /// NEWLINE is an unexpected indent.
    single_line_block_ended: bool,
}

impl<'s> Parser<'s> {
    /// Trivia tokens are dropped; a missing EOF is synthesized.
    pub fn new(tokens: Vec<Token>, source: &'s SourceIndex) -> Self {
        let tokens: Vec<Token> = tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect();
        let eof = match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => last.clone(),
            Some(last) => Token::eof(Span::point(last.span.end_line, last.span.end_col)),
            None => Token::eof(Span::point(1, 0)),
        };
        Self {
            tokens,
            pos: 0,
            eof,
            source,
            indent_stack: vec![0],
            current_indent: 0,
            mode: BlockMode::NotExpecting,
            frames: Vec::new(),
            header_ready: false,
            single_line_block_ended: false,
        }
    }

    /// Block mode at the current position, or where parsing stopped.
    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn at(&self, pattern: impl Into<Pattern>) -> bool {
        pattern.into().matches(self.peek_kind())
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Diagnostic> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(self.current()))
        }
    }

    // ── Diagnostics ──

    fn error(&self, kind: ErrorKind, message: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic::parse_error(kind, message, span, self.source)
    }

    fn invalid_syntax(&self, span: Span) -> Diagnostic {
        self.error(ErrorKind::SyntaxError, MSG_INVALID_SYNTAX, span)
    }

    /// Diagnostic for a token that cannot appear where it was found.
    fn unexpected(&self, token: &Token) -> Diagnostic {
        match (&token.kind, &token.value) {
            (TokenKind::Error, TokenValue::Error { kind, message }) => self.error(*kind, message.clone(), token.span),
            (TokenKind::Eof | TokenKind::Dedent, _) => self.unexpected_eof(),
            _ => self.invalid_syntax(token.span),
        }
    }

    /// Points just past the last token that carried source text.
    fn unexpected_eof(&self) -> Diagnostic {
        let anchor = self.tokens[..self.pos.min(self.tokens.len())]
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Eof))
            .map(|t| Span::point(t.span.end_line, t.span.end_col))
            .unwrap_or(Span::point(1, 0));
        self.error(ErrorKind::SyntaxError, MSG_UNEXPECTED_EOF, anchor)
    }

    /// Only DEDENTs and EOF remain.
    fn at_end_of_input(&self) -> bool {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .all(|t| matches!(t.kind, TokenKind::Dedent | TokenKind::Eof))
    }

    // ── Block bookkeeping ──

    fn settle_mode(&mut self) {
        let open = self.frames.iter().filter(|f| f.kind == BlockKind::MultiLine).count();
        self.mode = match open {
            0 => BlockMode::NotExpecting,
            1 => BlockMode::MultiLine,
            _ => BlockMode::Nested,
        };
    }

    fn apply_dedent(&mut self, width: usize, span: Span) -> Result<(), Diagnostic> {
        if width >= self.current_indent || self.indent_stack.len() <= 1 {
            return Err(self.error(ErrorKind::IndentationError, MSG_UNEXPECTED_DEDENT, span));
        }
        self.indent_stack.pop();
        let top = self.indent_stack.last().copied().unwrap_or(0);
        if top != width {
            return Err(self.error(ErrorKind::IndentationError, MSG_UNINDENT_MISMATCH, span));
        }
        self.current_indent = top;
        Ok(())
    }

    // ── Program and block bodies ──

    pub fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let body = self.parse_body(None)?;
        let end = self.current().span;
        debug!(statements = body.len(), "parsed program");
        Ok(Program { body, span: Span::new(1, 0, end.end_line, end.end_col) })
    }

    /// Statement loop shared by the program and multi-line blocks.
    ///
    /// `block` is the width of the enclosing multi-line block; a DEDENT below
    /// it ends the body and is left for the caller.
    fn parse_body(&mut self, block: Option<usize>) -> Result<Vec<Stmt>, Diagnostic> {
        let mut body = Vec::new();
        loop {
            let token = self.current().clone();
            match token.kind {
                TokenKind::Error => return Err(self.unexpected(&token)),
                TokenKind::Eof => {
                    let open_levels = self.indent_stack.len() > 1 && block.is_none();
                    if matches!(self.mode, BlockMode::Expecting { .. }) || open_levels {
                        return Err(self.unexpected_eof());
                    }
                    return Ok(body);
                }
                TokenKind::Indent => {
                    let width = token.indent_width().unwrap_or(0);
                    let BlockMode::Expecting { line } = self.mode else {
                        return Err(self.error(ErrorKind::IndentationError, MSG_UNEXPECTED_INDENT, token.span));
                    };
                    if width <= self.current_indent {
                        return Err(self.error(ErrorKind::IndentationError, MSG_EXPECTED_BLOCK, token.span));
                    }
                    self.advance();
                    body.push(self.parse_multiline_block(width, line, token.span)?);
                }
                TokenKind::Dedent => {
                    let width = token.indent_width().unwrap_or(0);
                    self.single_line_block_ended = false;
                    if matches!(self.mode, BlockMode::Expecting { .. }) {
                        return Err(self.unexpected_eof());
                    }
                    if block.is_some_and(|b| width < b) {
                        return Ok(body);
                    }
                    self.advance();
                    self.apply_dedent(width, token.span)?;
                }
                TokenKind::Colon => {
                    if !std::mem::take(&mut self.header_ready) {
                        return Err(self.invalid_syntax(token.span));
                    }
                    self.advance();
                    self.mode = BlockMode::Expecting { line: token.span.start_line };
                }
                TokenKind::Newline => {
                    while self.at(TokenKind::Newline) {
                        self.advance();
                    }
                    if std::mem::take(&mut self.single_line_block_ended) && self.at(TokenKind::Indent) {
                        debug!(line = token.span.start_line, "indent after single-line block");
                        return Err(self.error(ErrorKind::IndentationError, MSG_UNEXPECTED_INDENT, self.current().span));
                    }
                    if matches!(self.mode, BlockMode::Expecting { .. })
                        && !self.at(TokenKind::Indent)
                        && !self.at_end_of_input()
                    {
                        return Err(self.error(ErrorKind::IndentationError, MSG_EXPECTED_BLOCK, self.current().span));
                    }
                }
                _ if matches!(self.mode, BlockMode::Expecting { .. }) => {
                    body.push(self.parse_single_line_block()?);
                }
                TokenKind::Semicolon => {
                    self.advance();
                    body.push(Stmt::Empty(EmptyStatement { span: token.span }));
                }
                _ => {
                    body.push(self.parse_statement()?);
                    self.finish_statement()?;
                }
            }
        }
    }

    /// Validate what follows a statement and consume a `;` separator.
    fn finish_statement(&mut self) -> Result<(), Diagnostic> {
        match self.peek_kind() {
            TokenKind::Semicolon => {
                self.advance();
            }
            TokenKind::Colon => self.header_ready = true,
            kind if Pattern::STATEMENT_END.matches(kind) => {}
            _ => return Err(self.unexpected(self.current())),
        }
        Ok(())
    }

    fn parse_multiline_block(&mut self, width: usize, header_line: usize, indent_span: Span) -> Result<Stmt, Diagnostic> {
        self.indent_stack.push(width);
        self.current_indent = width;
        self.frames.push(BlockFrame { kind: BlockKind::MultiLine, indent: width, start_line: header_line });
        self.settle_mode();
        debug!(width, line = header_line, depth = self.frames.len(), "enter block");

        let body = self.parse_body(Some(width))?;
        if self.at(TokenKind::Dedent) {
            let dedent = self.advance();
            self.apply_dedent(dedent.indent_width().unwrap_or(0), dedent.span)?;
        }

        if let Some(frame) = self.frames.pop() {
            debug!(width = frame.indent, line = frame.start_line, statements = body.len(), "exit block");
        }
        self.settle_mode();
        let span = match (body.first(), body.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => indent_span,
        };
        Ok(Stmt::Block(BlockStatement { body, indent: width, kind: BlockKind::MultiLine, span }))
    }

    /// Statements following a colon on the same line, up to the end of the
    /// line.
    fn parse_single_line_block(&mut self) -> Result<Stmt, Diagnostic> {
        let enclosing = self.current_indent;
        let start_line = self.current().span.start_line;
        self.mode = BlockMode::SingleLine;
        self.indent_stack.push(enclosing);
        self.frames.push(BlockFrame { kind: BlockKind::SingleLine, indent: enclosing, start_line });
        debug!(line = start_line, "enter single-line block");

        let mut body = Vec::new();
        loop {
            let token = self.current().clone();
            match token.kind {
                kind if Pattern::LINE_END.matches(kind) => break,
                TokenKind::Semicolon => {
                    self.advance();
                    body.push(Stmt::Empty(EmptyStatement { span: token.span }));
                }
                // A block header inside a single-line block.
                TokenKind::Colon => return Err(self.invalid_syntax(token.span)),
                TokenKind::Error => return Err(self.unexpected(&token)),
                _ => {
                    body.push(self.parse_statement()?);
                    match self.peek_kind() {
                        TokenKind::Semicolon => {
                            self.advance();
                        }
                        kind if Pattern::LINE_END.matches(kind) => {}
                        TokenKind::Colon => return Err(self.invalid_syntax(self.current().span)),
                        _ => return Err(self.unexpected(self.current())),
                    }
                }
            }
        }

        self.indent_stack.pop();
        self.frames.pop();
        self.settle_mode();
        self.single_line_block_ended = true;
        debug!(line = start_line, statements = body.len(), "exit single-line block");

        let span = match (body.first(), body.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => Span::point(start_line, 0),
        };
        Ok(Stmt::Block(BlockStatement { body, indent: enclosing, kind: BlockKind::SingleLine, span }))
    }

    // ── Statements and expressions ──

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expression = self.parse_expression_list()?;
        Ok(Stmt::Expression(ExpressionStatement { span: expression.span(), expression }))
    }

    /// An expression, or an implicit tuple when commas follow it.
    fn parse_expression_list(&mut self) -> Result<Expr, Diagnostic> {
        let first = self.parse_expression()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while self.at(TokenKind::Comma) {
            self.advance();
            if !self.at(EXPRESSION_START) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        let span = match (elements.first(), elements.last()) {
            (Some(first), Some(last)) => first.span().merge(last.span()),
            _ => self.current().span,
        };
        Ok(Expr::Tuple { elements, span })
    }

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        while matches!(expr, Expr::Identifier { .. } | Expr::Call { .. }) && self.at(TokenKind::Lpar) {
            expr = self.parse_call(expr)?;
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let token = self.current().clone();
        match token.kind {
            kind if kind.is_literal() => {
                self.advance();
                let raw = token.lexeme().to_string();
                let parsed = parse_literal(&raw)
                    .map_err(|e| self.error(ErrorKind::SyntaxError, e.to_string(), token.span))?;
                Ok(Expr::Literal { value: parsed.value, raw, is_complex: parsed.is_complex, span: token.span })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier { name: token.lexeme().to_string(), span: token.span })
            }
            TokenKind::Lsqb => self.parse_list(),
            TokenKind::Lpar => self.parse_parenthesized(),
            TokenKind::Lbrace => self.parse_braced(),
            _ => Err(self.unexpected(&token)),
        }
    }

    fn parse_list(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.expect(TokenKind::Lsqb)?.span;
        let mut elements = Vec::new();
        while !self.at(TokenKind::Rsqb) {
            elements.push(self.parse_expression()?);
            if !self.at(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        let end = self.expect(TokenKind::Rsqb)?.span;
        Ok(Expr::List { elements, span: start.merge(end) })
    }

    /// `()`, `(expr)` or a tuple. A parenthesized expression keeps its node
    /// but its span grows to cover the parentheses.
    fn parse_parenthesized(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.expect(TokenKind::Lpar)?.span;
        if self.at(TokenKind::Rpar) {
            let end = self.advance().span;
            return Ok(Expr::Tuple { elements: Vec::new(), span: start.merge(end) });
        }
        let first = self.parse_expression()?;
        if !self.at(TokenKind::Comma) {
            let end = self.expect(TokenKind::Rpar)?.span;
            return Ok(first.with_span(start.merge(end)));
        }
        let mut elements = vec![first];
        while self.at(TokenKind::Comma) {
            self.advance();
            if self.at(TokenKind::Rpar) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        let end = self.expect(TokenKind::Rpar)?.span;
        Ok(Expr::Tuple { elements, span: start.merge(end) })
    }

    /// `{}` is an empty dict; a colon after the first element makes a dict,
    /// otherwise the literal is a set.
    fn parse_braced(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.expect(TokenKind::Lbrace)?.span;
        if self.at(TokenKind::Rbrace) {
            let end = self.advance().span;
            return Ok(Expr::Dict { keys: Vec::new(), values: Vec::new(), span: start.merge(end) });
        }

        let first = self.parse_expression()?;
        if self.at(TokenKind::Colon) {
            self.advance();
            let mut keys = vec![first];
            let mut values = vec![self.parse_expression()?];
            while self.at(TokenKind::Comma) {
                self.advance();
                if self.at(TokenKind::Rbrace) {
                    break;
                }
                keys.push(self.parse_expression()?);
                self.expect(TokenKind::Colon)?;
                values.push(self.parse_expression()?);
            }
            let end = self.expect(TokenKind::Rbrace)?.span;
            return Ok(Expr::Dict { keys, values, span: start.merge(end) });
        }

        let mut elements = vec![first];
        while self.at(TokenKind::Comma) {
            self.advance();
            if self.at(TokenKind::Rbrace) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        let end = self.expect(TokenKind::Rbrace)?.span;
        Ok(Expr::Set { elements, span: start.merge(end) })
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, Diagnostic> {
        self.expect(TokenKind::Lpar)?;
        let mut args = Vec::new();
        let mut keywords: Vec<Keyword> = Vec::new();
        while !self.at(TokenKind::Rpar) {
            if self.at(TokenKind::Identifier) && self.peek_kind_at(1) == TokenKind::Assign {
                let name_tok = self.advance();
                self.advance();
                let name = name_tok.lexeme().to_string();
                if keywords.iter().any(|k| k.name == name) {
                    return Err(self.error(ErrorKind::SyntaxError, MSG_KEYWORD_REPEATED, name_tok.span));
                }
                let value = self.parse_expression()?;
                keywords.push(Keyword { name, span: name_tok.span.merge(value.span()), value });
            } else {
                let arg = self.parse_expression()?;
                if !keywords.is_empty() {
                    return Err(self.error(ErrorKind::SyntaxError, MSG_POSITIONAL_AFTER_KEYWORD, arg.span()));
                }
                args.push(arg);
            }
            if !self.at(TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        let end = self.expect(TokenKind::Rpar)?.span;
        let span = callee.span().merge(end);
        Ok(Expr::Call { callee: Box::new(callee), args, keywords, span })
    }
}
