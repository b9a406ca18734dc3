use std::fmt;

use serde::Serialize;

/// Every kind of lexical unit the scanner can emit.
///
/// `Newline` is the soft statement separator: one is emitted per maximal run
/// of line breaks, unless bracket nesting currently suppresses them. The
/// comment-marker kinds (`Hash`, `BlockCommentOpen`, `BlockCommentClose`)
/// live in the symbol table even though the comment skipper intercepts `#`
/// and `/*` before symbol dispatch; only a stray `*/` reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // Literals
    Identifier,
    Number,
    String,
    Char,
    Newline,

    // Grouping delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,

    // Punctuation and operators
    Colon,
    ColonEqual,
    Semicolon,
    Plus,
    PlusEqual,
    Minus,
    MinusEqual,
    Star,
    StarEqual,
    StarStar,
    StarStarEqual,
    Slash,
    SlashEqual,
    SlashSlash,
    SlashSlashEqual,
    Backslash,
    Pipe,
    PipePipe,
    PipeEqual,
    Amp,
    AmpAmp,
    Dot,
    Equal,
    EqualEqual,
    EqualEqualEqual,
    Bang,
    BangEqual,
    BangEqualEqual,
    Caret,
    Tilde,
    Greater,
    GreaterEqual,
    GreaterGreater,
    GreaterGreaterEqual,
    Less,
    LessEqual,
    LessLess,
    LessLessEqual,
    Percent,
    PercentEqual,
    At,
    Ellipsis,
    Comma,
    Arrow,

    // Comment markers (see the type-level note)
    Hash,
    BlockCommentOpen,
    BlockCommentClose,
}

// Hand-written rather than derived: strum's Display derive cannot emit a
// bare `}`, which `RightBrace` needs.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::Char => "char",
            Self::Newline => "newline",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBracket => "[",
            Self::RightBracket => "]",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Colon => ":",
            Self::ColonEqual => ":=",
            Self::Semicolon => ";",
            Self::Plus => "+",
            Self::PlusEqual => "+=",
            Self::Minus => "-",
            Self::MinusEqual => "-=",
            Self::Star => "*",
            Self::StarEqual => "*=",
            Self::StarStar => "**",
            Self::StarStarEqual => "**=",
            Self::Slash => "/",
            Self::SlashEqual => "/=",
            Self::SlashSlash => "//",
            Self::SlashSlashEqual => "//=",
            Self::Backslash => "\\",
            Self::Pipe => "|",
            Self::PipePipe => "||",
            Self::PipeEqual => "|=",
            Self::Amp => "&",
            Self::AmpAmp => "&&",
            Self::Dot => ".",
            Self::Equal => "=",
            Self::EqualEqual => "==",
            Self::EqualEqualEqual => "===",
            Self::Bang => "!",
            Self::BangEqual => "!=",
            Self::BangEqualEqual => "!==",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::GreaterGreater => ">>",
            Self::GreaterGreaterEqual => ">>=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::LessLess => "<<",
            Self::LessLessEqual => "<<=",
            Self::Percent => "%",
            Self::PercentEqual => "%=",
            Self::At => "@",
            Self::Ellipsis => "...",
            Self::Comma => ",",
            Self::Arrow => "->",
            Self::Hash => "#",
            Self::BlockCommentOpen => "/*",
            Self::BlockCommentClose => "*/",
        })
    }
}

impl TokenKind {
    pub fn is_opening_delimiter(self) -> bool {
        matches!(self, Self::LeftParen | Self::LeftBracket | Self::LeftBrace)
    }

    pub fn is_closing_delimiter(self) -> bool {
        matches!(
            self,
            Self::RightParen | Self::RightBracket | Self::RightBrace
        )
    }
}

/// Fixed operator/punctuation spellings, 1 to 3 characters each.
///
/// This table is the single source of truth for symbol resolution; the
/// disambiguator scans it for the longest prefix available at the cursor.
pub const SYMBOLS: &[(&str, TokenKind)] = &[
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    (":", TokenKind::Colon),
    (":=", TokenKind::ColonEqual),
    (";", TokenKind::Semicolon),
    ("+", TokenKind::Plus),
    ("+=", TokenKind::PlusEqual),
    ("-", TokenKind::Minus),
    ("-=", TokenKind::MinusEqual),
    ("*", TokenKind::Star),
    ("*=", TokenKind::StarEqual),
    ("**", TokenKind::StarStar),
    ("**=", TokenKind::StarStarEqual),
    ("/", TokenKind::Slash),
    ("/=", TokenKind::SlashEqual),
    ("//", TokenKind::SlashSlash),
    ("//=", TokenKind::SlashSlashEqual),
    ("\\", TokenKind::Backslash),
    ("|", TokenKind::Pipe),
    ("||", TokenKind::PipePipe),
    ("|=", TokenKind::PipeEqual),
    ("&", TokenKind::Amp),
    ("&&", TokenKind::AmpAmp),
    (".", TokenKind::Dot),
    ("=", TokenKind::Equal),
    ("==", TokenKind::EqualEqual),
    ("===", TokenKind::EqualEqualEqual),
    ("!", TokenKind::Bang),
    ("!=", TokenKind::BangEqual),
    ("!==", TokenKind::BangEqualEqual),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    (">", TokenKind::Greater),
    (">=", TokenKind::GreaterEqual),
    (">>", TokenKind::GreaterGreater),
    (">>=", TokenKind::GreaterGreaterEqual),
    ("<", TokenKind::Less),
    ("<=", TokenKind::LessEqual),
    ("<<", TokenKind::LessLess),
    ("<<=", TokenKind::LessLessEqual),
    ("%", TokenKind::Percent),
    ("%=", TokenKind::PercentEqual),
    ("@", TokenKind::At),
    ("...", TokenKind::Ellipsis),
    (",", TokenKind::Comma),
    ("->", TokenKind::Arrow),
    ("#", TokenKind::Hash),
    ("/*", TokenKind::BlockCommentOpen),
    ("*/", TokenKind::BlockCommentClose),
];

/// Characters that start symbol dispatch. `#` is absent on purpose: the
/// comment skipper claims it earlier in the dispatch order.
pub const SYMBOL_CHARS: &str = "()[]{}<>\\|/:;+-.*=!@&%~^,";

pub fn symbol_kind(spelling: &str) -> Option<TokenKind> {
    SYMBOLS
        .iter()
        .find(|(s, _)| *s == spelling)
        .map(|(_, kind)| *kind)
}

/// A classified, positioned unit of lexical text.
///
/// `line` and `column` are 1-based, `offset` is the 0-based byte offset of
/// the first character. `text` holds the raw matched text for literals
/// (quotes included), `"\n"` for newline tokens, and is empty for
/// fixed-spelling symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: u32,
        offset: usize,
        kind: TokenKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            offset,
            kind,
            text: text.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} ({}) {:?} '{}'",
            self.file,
            self.line,
            self.column,
            self.offset,
            self.kind,
            self.text.escape_debug()
        )
    }
}
