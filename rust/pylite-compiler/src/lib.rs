//! pylite compiler front end
//!
//! Turns off-side-rule source text into tokens and a syntax tree, and
//! reports failures as traceback-formatted [`Diagnostic`]s.

pub mod compiler;
pub mod diagnostics;

use compiler::ast::Program;
use compiler::indent::DEFAULT_TAB_WIDTH;
use compiler::lexer::{LexOptions, Lexer};
use compiler::parser::Parser;
use compiler::source::SourceIndex;
use compiler::tokens::Token;
pub use diagnostics::{Diagnostic, ErrorKind, Phase};

/// Options for [`parse_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Width a tab contributes to indentation.
    pub tab_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { tab_width: DEFAULT_TAB_WIDTH }
    }
}

/// Tokenize with default options: trivia dropped, newlines collapsed.
pub fn tokenize(source: &str) -> Vec<Token> {
    tokenize_with_options(source, LexOptions::default())
}

pub fn tokenize_with_options(source: &str, options: LexOptions) -> Vec<Token> {
    Lexer::new(source, options).tokenize()
}

/// Parse source text shown as `<stdin>` in diagnostics.
pub fn parse(source: &str) -> Result<Program, Diagnostic> {
    parse_source(&SourceIndex::new(source))
}

/// Parse an indexed source; its name appears in diagnostics.
pub fn parse_source(source: &SourceIndex) -> Result<Program, Diagnostic> {
    parse_with_options(source, ParseOptions::default())
}

pub fn parse_with_options(source: &SourceIndex, options: ParseOptions) -> Result<Program, Diagnostic> {
    let lex_options = LexOptions { tab_width: options.tab_width, keep_trivia: false };
    let tokens = tokenize_with_options(source.text(), lex_options);
    Parser::new(tokens, source).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use compiler::tokens::TokenKind;

    #[test]
    fn tokenize_empty_source() {
        let tokens = tokenize("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn parse_reports_stdin_name() {
        let err = parse("print(1 2)\n").unwrap_err();
        assert_eq!(err.file(), "<stdin>");
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
        assert_eq!(err.phase(), Phase::Parse);
    }

    #[test]
    fn parse_source_uses_given_name() {
        let index = SourceIndex::new("x:\n").with_name("main.py");
        let err = parse_source(&index).unwrap_err();
        assert!(err.to_string().starts_with("  File \"main.py\", line 1\n"), "{}", err);
    }

    #[test]
    fn tab_width_is_configurable() {
        // One tab then eight spaces: the same level only when a tab is eight wide.
        let src = "x:\n\ty\n        z\n";
        let index = SourceIndex::new(src);
        assert!(parse_with_options(&index, ParseOptions { tab_width: 8 }).is_ok());
        assert!(parse_with_options(&index, ParseOptions { tab_width: 4 }).is_err());
    }
}
