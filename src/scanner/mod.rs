pub mod lexer;
pub mod token;

pub use lexer::{Lexer, MAX_BRACKET_DEPTH};
pub use token::{Token, TokenKind};

use crate::error::LexError;

/// Scan a source buffer into a token sequence.
///
/// `file` is used only for positions and diagnostics; no I/O happens here.
pub fn scan(file: &str, source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(file, source).tokenize()
}
