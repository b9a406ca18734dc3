use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A positioned syntax error raised by the lexer.
///
/// Every variant carries the file name and the exact 1-based line/column of
/// the offending character, never the start of the surrounding scan. The
/// span and source fields feed miette's fancy terminal report; callers that
/// only need the position can use the plain accessors.
#[derive(Error, Debug, Diagnostic)]
pub enum LexError {
    #[error("{file}:{line}:{column}: unknown token: {message}")]
    #[diagnostic(code(quill::lex::unknown_token))]
    UnknownToken {
        file: String,
        line: u32,
        column: u32,
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("{file}:{line}:{column}: bracket overflow: {message}")]
    #[diagnostic(code(quill::lex::bracket_overflow))]
    BracketOverflow {
        file: String,
        line: u32,
        column: u32,
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("{file}:{line}:{column}: bracket mismatch: {message}")]
    #[diagnostic(code(quill::lex::bracket_mismatch))]
    BracketMismatch {
        file: String,
        line: u32,
        column: u32,
        message: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

impl LexError {
    pub fn unknown_token(
        file: impl Into<String>,
        line: u32,
        column: u32,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let file = file.into();
        Self::UnknownToken {
            src: NamedSource::new(&file, String::new()),
            span: SourceSpan::new(offset.into(), 1),
            message: message.into(),
            file,
            line,
            column,
        }
    }

    pub fn bracket_overflow(
        file: impl Into<String>,
        line: u32,
        column: u32,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let file = file.into();
        Self::BracketOverflow {
            src: NamedSource::new(&file, String::new()),
            span: SourceSpan::new(offset.into(), 1),
            message: message.into(),
            file,
            line,
            column,
        }
    }

    pub fn bracket_mismatch(
        file: impl Into<String>,
        line: u32,
        column: u32,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let file = file.into();
        Self::BracketMismatch {
            src: NamedSource::new(&file, String::new()),
            span: SourceSpan::new(offset.into(), 1),
            message: message.into(),
            file,
            line,
            column,
        }
    }

    /// Attach the source text for fancy miette diagnostics.
    pub fn with_source_code(self, source: impl Into<String>) -> Self {
        let source = source.into();
        match self {
            Self::UnknownToken {
                file,
                line,
                column,
                message,
                span,
                ..
            } => Self::UnknownToken {
                src: NamedSource::new(&file, source),
                file,
                line,
                column,
                message,
                span,
            },
            Self::BracketOverflow {
                file,
                line,
                column,
                message,
                span,
                ..
            } => Self::BracketOverflow {
                src: NamedSource::new(&file, source),
                file,
                line,
                column,
                message,
                span,
            },
            Self::BracketMismatch {
                file,
                line,
                column,
                message,
                span,
                ..
            } => Self::BracketMismatch {
                src: NamedSource::new(&file, source),
                file,
                line,
                column,
                message,
                span,
            },
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::UnknownToken { file, .. }
            | Self::BracketOverflow { file, .. }
            | Self::BracketMismatch { file, .. } => file,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            Self::UnknownToken { line, .. }
            | Self::BracketOverflow { line, .. }
            | Self::BracketMismatch { line, .. } => *line,
        }
    }

    pub fn column(&self) -> u32 {
        match self {
            Self::UnknownToken { column, .. }
            | Self::BracketOverflow { column, .. }
            | Self::BracketMismatch { column, .. } => *column,
        }
    }
}
