//! js2cpp-lex - Lexical Analyzer
//!
//! Converts a line-oriented stream of JavaScript text into sequential
//! tokens. The lexer is context-sensitive in exactly one place: a `/` begins
//! a regular expression literal rather than a division operator when the
//! previous token was an assignment operator, `(`, `,`, or `:`.
//!
//! Two features serve the parser directly:
//!
//! - every token carries a `newline` flag, true when the token is the first
//!   on its line; the parser's automatic semicolon insertion is driven by it;
//! - an *include stack* lets the parser push the predefined preamble of
//!   external declarations in front of the user's file, so the preamble is
//!   consumed before the real input.
//!
//! Identifier tokens are retagged as keywords through the intern table:
//! every keyword text is pre-interned with a tag, so retagging is one range
//! check on the interned symbol.

pub mod lexer;
pub mod source;
pub mod token;

pub use lexer::Lexer;
pub use source::{FileText, SourceText, StrText};
pub use token::{keyword_kind, Token, TokenKind};
