//! Front end: tokens, indentation, tokenizer, literal decoding, syntax tree
//! and parser.
//!
//! ```text
//!   source text
//!       │
//!       ▼
//!   lexer.rs  : Lexer (consults indent.rs per line)
//!       │
//!       ▼
//!   Vec<Token>
//!       │
//!       ▼
//!   parser.rs : Parser (decodes literals via literal.rs)
//!       │
//!       ▼
//!   ast::Program  or  diagnostics::Diagnostic
//! ```

pub mod ast;
pub mod indent;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod source;
pub mod tokens;
