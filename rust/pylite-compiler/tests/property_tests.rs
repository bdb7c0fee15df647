//! Property-based tests for the tokenizer and parser.
//!
//! 1. **Lossless reconstruction**: trivia-mode token spans concatenate back
//!    to the input
//! 2. **Ordered spans**: trivia-mode spans never overlap or run backwards
//! 3. **Indentation balance**: every INDENT is matched by one DEDENT
//! 4. **Parser never panics**: arbitrary input yields a tree or a diagnostic
//! 5. **Well-formed blocks parse**: generated indented programs are accepted

use proptest::prelude::*;

use pylite_compiler::compiler::ast::{BlockKind, Stmt};
use pylite_compiler::compiler::lexer::LexOptions;
use pylite_compiler::compiler::source::SourceIndex;
use pylite_compiler::compiler::tokens::TokenKind;
use pylite_compiler::{parse, tokenize, tokenize_with_options};

// ============================================================================
// Generators
// ============================================================================

/// Text biased towards the characters the tokenizer treats specially.
fn noisy_source() -> impl Strategy<Value = String> {
    prop_oneof![
        r#"[ \t\n\r#:;,()\[\]{}'"a-c0-9=\\$ｘ_.]{0,80}"#,
        "\\PC{0,60}",
    ]
}

/// Programs of bare identifiers whose indentation opens and closes blocks
/// consistently: a line ends with `:` exactly when the next line is one
/// level deeper.
fn block_program() -> impl Strategy<Value = (String, usize)> {
    prop::collection::vec((0usize..4, "[a-z]{1,4}"), 1..16).prop_map(|lines| {
        let mut levels: Vec<usize> = Vec::with_capacity(lines.len());
        for (wanted, _) in &lines {
            let level = levels.last().map_or(0, |prev| (*wanted).min(prev + 1));
            levels.push(level);
        }
        let mut headers = 0;
        let mut text = String::new();
        for (i, (_, name)) in lines.iter().enumerate() {
            let opens = levels.get(i + 1).is_some_and(|next| *next > levels[i]);
            headers += usize::from(opens);
            text.push_str(&"    ".repeat(levels[i]));
            text.push_str(name);
            text.push_str(if opens { ":\n" } else { "\n" });
        }
        (text, headers)
    })
}

fn count_blocks(body: &[Stmt]) -> usize {
    body.iter()
        .map(|stmt| match stmt {
            Stmt::Block(b) => usize::from(b.kind == BlockKind::MultiLine) + count_blocks(&b.body),
            _ => 0,
        })
        .sum()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #[test]
    fn lossless_tokens_reconstruct_input(input in noisy_source()) {
        let index = SourceIndex::new(&input);
        let tokens = tokenize_with_options(&input, LexOptions::lossless());
        let mut rebuilt = String::new();
        for token in &tokens {
            let text = index.slice(token.span);
            prop_assert!(text.is_some(), "span {} outside {:?}", token.span, input);
            rebuilt.push_str(text.unwrap_or_default());
        }
        prop_assert_eq!(&rebuilt, &input);
        prop_assert_eq!(tokenize_with_options(&rebuilt, LexOptions::lossless()), tokens);
    }

    #[test]
    fn lossless_spans_are_ordered(input in noisy_source()) {
        let tokens = tokenize_with_options(&input, LexOptions::lossless());
        for pair in tokens.windows(2) {
            prop_assert!(
                pair[1].span.start() >= pair[0].span.end(),
                "{} overlaps {} for {:?}", pair[0], pair[1], input
            );
        }
    }

    #[test]
    fn indents_and_dedents_balance(input in noisy_source()) {
        let tokens = tokenize(&input);
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        prop_assert_eq!(indents, dedents);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn parser_never_panics(input in noisy_source()) {
        let _ = parse(&input);
    }

    #[test]
    fn well_formed_blocks_parse((src, headers) in block_program()) {
        let program = parse(&src);
        prop_assert!(program.is_ok(), "{:?} rejected: {:?}", src, program.err().map(|d| d.to_string()));
        if let Ok(program) = program {
            prop_assert_eq!(count_blocks(&program.body), headers);
        }
    }
}
