pub mod error;
pub mod repl;
pub mod scanner;

pub use error::LexError;
