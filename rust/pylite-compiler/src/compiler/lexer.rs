//! Indentation-aware tokenizer.
//!
//! Each physical line first goes through the [`IndentEngine`], then the rest
//! of the line is matched against [`RULES`] in priority order. The tokenizer
//! never fails: input no rule accepts becomes an `ERROR` token and scanning
//! resumes one char later.

use crate::compiler::indent::{IndentEngine, IndentEvent, DEFAULT_TAB_WIDTH};
use crate::compiler::tokens::{Span, Token, TokenKind};
use crate::diagnostics::ErrorKind;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

pub const MSG_INVALID_SYNTAX: &str = "invalid syntax";
pub const MSG_INVALID_CHARACTER: &str = "invalid character in identifier";
pub const MSG_UNINDENT_MISMATCH: &str = "unindent does not match any outer indentation level";
pub const MSG_UNTERMINATED_STRING: &str = "EOL while scanning string literal";
pub const MSG_UNTERMINATED_TRIPLE: &str = "EOF while scanning triple-quoted string literal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexOptions {
    /// Width a tab contributes to a line's indentation.
    pub tab_width: usize,
    /// Emit WHITESPACE/COMMENT/CONTINUATION tokens and keep every NEWLINE.
    pub keep_trivia: bool,
}

impl Default for LexOptions {
    fn default() -> Self {
        Self { tab_width: DEFAULT_TAB_WIDTH, keep_trivia: false }
    }
}

impl LexOptions {
    /// Options for a stream that covers every source char.
    pub fn lossless() -> Self {
        Self { keep_trivia: true, ..Self::default() }
    }
}

/// How a lexical rule recognizes its token.
enum Matcher {
    Pattern(Regex),
    Scan(fn(&str) -> Option<usize>),
}

pub struct LexRule {
    pub kind: TokenKind,
    matcher: Matcher,
}

impl LexRule {
    fn pattern(kind: TokenKind, re: &str) -> Self {
        let re = Regex::new(re).expect("lexical rule pattern must compile");
        Self { kind, matcher: Matcher::Pattern(re) }
    }

    fn scan(kind: TokenKind, f: fn(&str) -> Option<usize>) -> Self {
        Self { kind, matcher: Matcher::Scan(f) }
    }

    /// Byte length of the match at the start of `rest`, if any.
    pub fn match_len(&self, rest: &str) -> Option<usize> {
        let len = match &self.matcher {
            Matcher::Pattern(re) => re.find(rest).map(|m| m.end()),
            Matcher::Scan(f) => f(rest),
        }?;
        (len > 0).then_some(len)
    }
}

const NUMBER_PATTERN: &str = concat!(
    r"^(?:",
    r"0[bB](?:_?[01])+",
    r"|0[oO](?:_?[0-7])+",
    r"|0[xX](?:_?[0-9a-fA-F])+",
    r"|(?:[0-9]+(?:_[0-9]+)*\.(?:[0-9]+(?:_[0-9]+)*)?|\.[0-9]+(?:_[0-9]+)*)(?:[eE][+-]?[0-9]+(?:_[0-9]+)*)?[jJ]?",
    r"|[0-9]+(?:_[0-9]+)*[eE][+-]?[0-9]+(?:_[0-9]+)*[jJ]?",
    r"|(?:[1-9][0-9]*(?:_[0-9]+)*|0+(?:_0+)*)[jJ]?",
    r")",
);

/// Lexical rules in priority order; the first rule that matches wins.
pub static RULES: Lazy<Vec<LexRule>> = Lazy::new(|| {
    vec![
        LexRule::pattern(TokenKind::Comment, r"^#[^\n]*"),
        LexRule::pattern(TokenKind::Continuation, r"^\\\r?\n"),
        LexRule::pattern(TokenKind::Newline, r"^\r?\n"),
        LexRule::scan(TokenKind::String, scan_string),
        LexRule::pattern(TokenKind::Number, NUMBER_PATTERN),
        LexRule::pattern(TokenKind::True, r"^True\b"),
        LexRule::pattern(TokenKind::False, r"^False\b"),
        LexRule::pattern(TokenKind::None, r"^None\b"),
        LexRule::pattern(TokenKind::Assign, r"^="),
        LexRule::pattern(TokenKind::Semicolon, r"^;"),
        LexRule::pattern(TokenKind::Colon, r"^:"),
        LexRule::pattern(TokenKind::Comma, r"^,"),
        LexRule::pattern(TokenKind::Lpar, r"^\("),
        LexRule::pattern(TokenKind::Rpar, r"^\)"),
        LexRule::pattern(TokenKind::Lsqb, r"^\["),
        LexRule::pattern(TokenKind::Rsqb, r"^\]"),
        LexRule::pattern(TokenKind::Lbrace, r"^\{"),
        LexRule::pattern(TokenKind::Rbrace, r"^\}"),
        LexRule::pattern(
            TokenKind::Identifier,
            r"^[A-Za-z_\x{4e00}-\x{9fff}][A-Za-z0-9_\x{4e00}-\x{9fff}]*",
        ),
        LexRule::pattern(TokenKind::Whitespace, r"^[ \t\x0c]+"),
    ]
});

/// Length of the string-literal prefix (`r`, `b`, `rb`, `f`, ...) before
/// an opening quote.
fn string_prefix_len(rest: &str) -> Option<usize> {
    const PREFIXES: [&str; 8] = ["rb", "br", "rf", "fr", "r", "u", "f", "b"];
    let head: String = rest.chars().take(2).collect::<String>().to_ascii_lowercase();
    let quote_at = |n: usize| matches!(rest.as_bytes().get(n), Some(b'\'' | b'"'));
    PREFIXES
        .iter()
        .find(|p| head.starts_with(*p) && quote_at(p.len()))
        .map(|p| p.len())
        .or_else(|| quote_at(0).then_some(0))
}

/// Match a complete string literal. Backslash escapes are skipped, not
/// decoded; decoding happens when the literal node is built.
fn scan_string(rest: &str) -> Option<usize> {
    let prefix = string_prefix_len(rest)?;
    let body = &rest[prefix..];
    let quote = body.chars().next()?;
    let triple: String = std::iter::repeat(quote).take(3).collect();
    let (delim, multiline) = if body.starts_with(&triple) { (triple.as_str(), true) } else { (&body[..1], false) };

    let mut chars = body.char_indices().skip(delim.chars().count());
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '\n' if !multiline => return None,
            _ if body[i..].starts_with(delim) => return Some(prefix + i + delim.len()),
            _ => {}
        }
    }
    None
}

fn error_message_for(rest: &str) -> &'static str {
    let Some(c) = rest.chars().next() else {
        return MSG_INVALID_SYNTAX;
    };
    if ('\u{ff00}'..='\u{ffff}').contains(&c) {
        return MSG_INVALID_CHARACTER;
    }
    match string_prefix_len(rest) {
        Some(prefix) => {
            let body = &rest[prefix..];
            if body.starts_with("'''") || body.starts_with("\"\"\"") {
                MSG_UNTERMINATED_TRIPLE
            } else {
                MSG_UNTERMINATED_STRING
            }
        }
        None => MSG_INVALID_SYNTAX,
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    engine: IndentEngine,
    options: LexOptions,
    /// Open bracket count; newlines inside brackets are trivia.
    depth: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, options: LexOptions) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            col: 0,
            engine: IndentEngine::new(options.tab_width),
            options,
            depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        while self.pos < self.source.len() {
            if self.at_line_start {
                self.at_line_start = false;
                if self.depth == 0 {
                    self.handle_indentation();
                }
                continue;
            }
            let rest = &self.source[self.pos..];
            let matched = RULES.iter().find_map(|rule| rule.match_len(rest).map(|len| (rule.kind, len)));
            match matched {
                Some((kind, len)) => self.emit(kind, len),
                None => self.emit_error(),
            }
        }

        let at_end = Span::point(self.line, self.col);
        for event in self.engine.end_of_file() {
            if let IndentEvent::Dedent(width) = event {
                self.tokens.push(Token::level(TokenKind::Dedent, width, at_end));
            }
        }
        self.tokens.push(Token::eof(at_end));

        let tokens = if self.options.keep_trivia { self.tokens } else { collapse_newlines(self.tokens) };
        debug!(count = tokens.len(), "tokenized source");
        tokens
    }

    /// Measure the leading whitespace of a line with content and emit the
    /// structural tokens it implies.
    fn handle_indentation(&mut self) {
        let rest = &self.source[self.pos..];
        let indent_len = rest.find(|c: char| !matches!(c, ' ' | '\t' | '\x0c')).unwrap_or(rest.len());
        let content = &rest[indent_len..];
        let blank = content.is_empty()
            || content.starts_with('\n')
            || content.starts_with("\r\n")
            || content.starts_with('#');
        if blank {
            return;
        }

        let width = self.engine.measure(&rest[..indent_len]);
        let here = Span::point(self.line, self.col);
        for event in self.engine.process(width) {
            let token = match event {
                IndentEvent::Indent(w) => Token::level(TokenKind::Indent, w, here),
                IndentEvent::Dedent(w) => Token::level(TokenKind::Dedent, w, here),
                IndentEvent::Mismatch { expected, actual } => {
                    debug!(line = self.line, expected, actual, "inconsistent dedent");
                    Token::error(ErrorKind::IndentationError, MSG_UNINDENT_MISMATCH, here)
                }
            };
            self.tokens.push(token);
        }
        if indent_len > 0 {
            self.emit(TokenKind::Whitespace, indent_len);
        }
    }

    /// Consume `len` bytes and return the span they cover.
    fn advance(&mut self, len: usize) -> Span {
        let (line, col) = (self.line, self.col);
        for c in self.source[self.pos..self.pos + len].chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.pos += len;
        Span::new(line, col, self.line, self.col)
    }

    fn emit(&mut self, kind: TokenKind, len: usize) {
        let source = self.source;
        let text = &source[self.pos..self.pos + len];
        let span = self.advance(len);
        let kind = match kind {
            TokenKind::Newline if self.depth > 0 => TokenKind::Whitespace,
            TokenKind::Newline => {
                self.at_line_start = true;
                kind
            }
            TokenKind::Lpar | TokenKind::Lsqb | TokenKind::Lbrace => {
                self.depth += 1;
                kind
            }
            TokenKind::Rpar | TokenKind::Rsqb | TokenKind::Rbrace => {
                self.depth = self.depth.saturating_sub(1);
                kind
            }
            _ => kind,
        };
        if kind.is_trivia() && !self.options.keep_trivia {
            return;
        }
        trace!(%kind, %span, "token");
        self.tokens.push(Token::text(kind, text, span));
    }

    fn emit_error(&mut self) {
        let rest = &self.source[self.pos..];
        let message = error_message_for(rest);
        let len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        let span = self.advance(len);
        debug!(%span, message, "lexical error");
        self.tokens.push(Token::error(ErrorKind::SyntaxError, message, span));
    }
}

/// Drop leading NEWLINEs and merge runs of NEWLINEs into one.
fn collapse_newlines(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens.into_iter().skip_while(|t| t.kind == TokenKind::Newline) {
        let repeated =
            token.kind == TokenKind::Newline && out.last().is_some_and(|t| t.kind == TokenKind::Newline);
        if !repeated {
            out.push(token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::tokens::TokenValue;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src, LexOptions::default()).tokenize()
    }

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_is_a_single_eof() {
        let tokens = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].span, Span::point(1, 0));
    }

    #[test]
    fn call_tokens_and_spans() {
        let tokens = lex("print(1, 'a')\n");
        let k: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::Identifier,
                TokenKind::Lpar,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::String,
                TokenKind::Rpar,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].lexeme(), "print");
        assert_eq!(tokens[4].span, Span::new(1, 9, 1, 12));
        assert_eq!(tokens[6].span, Span::new(1, 13, 2, 0));
    }

    #[test]
    fn indent_and_dedent_carry_widths() {
        let tokens = lex("a:\n    b\nc\n");
        let structural: Vec<_> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Indent | TokenKind::Dedent))
            .map(|t| (t.kind, t.indent_width()))
            .collect();
        assert_eq!(structural, vec![(TokenKind::Indent, Some(4)), (TokenKind::Dedent, Some(0))]);
    }

    #[test]
    fn dedents_are_flushed_before_eof() {
        assert_eq!(
            kinds("a:\n  b:\n    c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Identifier,
                TokenKind::Dedent,
                TokenKind::Dedent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_dedent() {
        let k = kinds("a:\n    b\n\n# note\n    c\n");
        assert_eq!(k.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
        assert_eq!(k.iter().filter(|k| **k == TokenKind::Newline).count(), 3);
    }

    #[test]
    fn newlines_are_collapsed_and_leading_ones_dropped() {
        assert_eq!(
            kinds("\n\n1\n\n\n2\n"),
            vec![TokenKind::Number, TokenKind::Newline, TokenKind::Number, TokenKind::Newline, TokenKind::Eof]
        );
    }

    #[test]
    fn unindent_mismatch_becomes_indentation_error_token() {
        let tokens = lex("a:\n    b:\n        c\n  d\n");
        let err = tokens.iter().find(|t| t.kind == TokenKind::Error).unwrap();
        assert_eq!(
            err.value,
            TokenValue::Error { kind: ErrorKind::IndentationError, message: MSG_UNINDENT_MISMATCH.into() }
        );
        assert_eq!(err.span, Span::point(4, 0));
    }

    #[test]
    fn unknown_characters_become_width_one_errors() {
        let tokens = lex("a ? （");
        let errors: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Error).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].value,
            TokenValue::Error { kind: ErrorKind::SyntaxError, message: MSG_INVALID_SYNTAX.into() }
        );
        assert_eq!(errors[0].span, Span::new(1, 2, 1, 3));
        assert_eq!(
            errors[1].value,
            TokenValue::Error { kind: ErrorKind::SyntaxError, message: MSG_INVALID_CHARACTER.into() }
        );
        assert_eq!(errors[1].span, Span::new(1, 4, 1, 5));
    }

    #[test]
    fn continuation_joins_lines_without_tokens() {
        let tokens = lex("f(1, \\\n2)\n");
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Continuation));
        let two = tokens.iter().find(|t| t.lexeme() == "2").unwrap();
        assert_eq!(two.span, Span::new(2, 0, 2, 1));
    }

    #[test]
    fn newlines_inside_brackets_are_joined() {
        assert_eq!(
            kinds("[1,\n    2]\n"),
            vec![
                TokenKind::Lsqb,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::Rsqb,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_forms() {
        for src in ["0", "42", "1_000", "0x_ff", "0o17", "0b1010", "3.14", "1.", ".5", "1e10", "2.5E-3", "3j", "1.5J"] {
            let tokens = lex(src);
            assert_eq!(tokens[0].kind, TokenKind::Number, "{src}");
            assert_eq!(tokens[0].lexeme(), src, "{src}");
        }
    }

    #[test]
    fn string_forms() {
        for src in ["'a'", "\"b\"", "'''x\ny'''", "\"\"\"q\"\"\"", "r'\\d'", "b\"x\"", "Rb'x'", "f'{x}'", "'it\\'s'"] {
            let tokens = lex(src);
            assert_eq!(tokens[0].kind, TokenKind::String, "{src}");
            assert_eq!(tokens[0].lexeme(), src, "{src}");
        }
    }

    #[test]
    fn unterminated_string_reports_eol() {
        let tokens = lex("'abc\n");
        assert_eq!(
            tokens[0].value,
            TokenValue::Error { kind: ErrorKind::SyntaxError, message: MSG_UNTERMINATED_STRING.into() }
        );
    }

    #[test]
    fn keywords_need_word_boundaries() {
        assert_eq!(kinds("True")[0], TokenKind::True);
        assert_eq!(kinds("None")[0], TokenKind::None);
        assert_eq!(kinds("Truex")[0], TokenKind::Identifier);
        assert_eq!(kinds("False_")[0], TokenKind::Identifier);
    }

    #[test]
    fn cjk_identifiers() {
        let tokens = lex("打印(名字)");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme(), "打印");
        assert_eq!(tokens[2].span, Span::new(1, 3, 1, 5));
    }

    #[test]
    fn tabs_use_configured_width() {
        let options = LexOptions { tab_width: 8, ..LexOptions::default() };
        let tokens = Lexer::new("a:\n\tb\n", options).tokenize();
        let indent = tokens.iter().find(|t| t.kind == TokenKind::Indent).unwrap();
        assert_eq!(indent.indent_width(), Some(8));
    }

    #[test]
    fn lossless_mode_keeps_trivia() {
        let tokens = Lexer::new("x = 1  # c\n", LexOptions::lossless()).tokenize();
        let k: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            k,
            vec![
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Assign,
                TokenKind::Whitespace,
                TokenKind::Number,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }
}
