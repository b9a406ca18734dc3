use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::{any, take_till, take_until, take_while};

use crate::error::LexError;
use crate::scanner::token::{SYMBOL_CHARS, Token, TokenKind, symbol_kind};

/// Deepest allowed grouping-delimiter nesting before BracketOverflow.
pub const MAX_BRACKET_DEPTH: usize = 256;

/// An open grouping delimiter awaiting its closer.
#[derive(Debug, Clone, Copy)]
struct BracketFrame {
    delimiter: char,
    line: u32,
    column: u32,
}

// Anchored recognizers. Each consumes exactly the matched text from the
// front of the remaining input and yields it as a slice.

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    // Underscore starts an identifier but may not continue one.
    (
        any.verify(|c: &char| c.is_ascii_alphabetic() || *c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric()),
    )
        .take()
        .parse_next(input)
}

fn number<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

fn string_literal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    // No escape sequences: the body is any run of non-quote characters.
    ('"', take_till(0.., '"'), '"').take().parse_next(input)
}

fn char_literal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    ('\'', any, '\'').take().parse_next(input)
}

fn line_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    ('#', take_till(0.., '\n'), opt('\n')).take().parse_next(input)
}

fn block_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    ("/*", take_until(0.., "*/"), "*/").take().parse_next(input)
}

fn expected_closer(opener: char) -> char {
    match opener {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => unreachable!("only grouping delimiters are pushed"),
    }
}

fn opener_for(closer: char) -> char {
    match closer {
        ')' => '(',
        ']' => '[',
        '}' => '{',
        _ => unreachable!("only grouping delimiters are popped"),
    }
}

/// One tokenize run over a single source buffer.
///
/// All scanning state lives here: the byte cursor, the 1-based line/column
/// counters, and the bracket stack that decides whether newlines are
/// currently significant. A run either consumes the whole buffer or stops
/// at the first positioned error.
pub struct Lexer<'src> {
    file: String,
    source: &'src str,
    offset: usize,
    line: u32,
    column: u32,
    brackets: Vec<BracketFrame>,
    suppress_newlines: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(file: impl Into<String>, source: &'src str) -> Self {
        Self {
            file: file.into(),
            source,
            offset: 0,
            line: 1,
            column: 1,
            brackets: Vec::new(),
            suppress_newlines: false,
        }
    }

    /// Convert the whole buffer into a token sequence.
    ///
    /// Dispatch priority per character: whitespace, newline run, `#` line
    /// comment, `/*` block comment, string, char, symbol (with bracket
    /// bookkeeping), number, identifier. Anything else is an UnknownToken
    /// error at that exact position.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                '\n' => self.newline_run(&mut tokens),
                c if c.is_whitespace() => {
                    self.offset += c.len_utf8();
                    self.column += 1;
                }
                '#' => self.skip_line_comment()?,
                '/' if self.rest().starts_with("/*") => self.skip_block_comment()?,
                '"' => {
                    let token = self.literal(TokenKind::String, string_literal)?;
                    tokens.push(token);
                }
                '\'' => {
                    let token = self.literal(TokenKind::Char, char_literal)?;
                    tokens.push(token);
                }
                c if SYMBOL_CHARS.contains(c) => {
                    let token = self.symbol(c)?;
                    tokens.push(token);
                }
                c if c.is_ascii_digit() => {
                    let token = self.literal(TokenKind::Number, number)?;
                    tokens.push(token);
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let token = self.literal(TokenKind::Identifier, identifier)?;
                    tokens.push(token);
                }
                c => {
                    return Err(self.error_here(format!("unexpected character '{c}'")));
                }
            }
        }
        if let Some(frame) = self.brackets.last().copied() {
            return Err(LexError::bracket_mismatch(
                self.file,
                self.line,
                self.column,
                self.offset,
                format!(
                    "unclosed '{}' opened at {}:{}",
                    frame.delimiter, frame.line, frame.column
                ),
            ));
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error_here(&self, message: String) -> LexError {
        LexError::unknown_token(self.file.clone(), self.line, self.column, self.offset, message)
    }

    /// Collapse a run of consecutive line breaks into at most one token.
    fn newline_run(&mut self, tokens: &mut Vec<Token>) {
        let (line, column, offset) = (self.line, self.column, self.offset);
        let run = self.rest().bytes().take_while(|&b| b == b'\n').count();
        self.offset += run;
        self.line += run as u32;
        self.column = 1;
        if !self.suppress_newlines {
            tokens.push(Token::new(
                &self.file,
                line,
                column,
                offset,
                TokenKind::Newline,
                "\n",
            ));
        }
    }

    fn skip_line_comment(&mut self) -> Result<(), LexError> {
        let mut rest = self.rest();
        let text = line_comment(&mut rest)
            .map_err(|_| self.error_here("malformed line comment".into()))?;
        self.offset += text.len();
        if text.ends_with('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            // Comment ran to end of input.
            self.column += text.chars().count() as u32;
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let mut rest = self.rest();
        let text = block_comment(&mut rest)
            .map_err(|_| self.error_here("unterminated block comment".into()))?;
        self.offset += text.len();
        if let Some(last) = text.rfind('\n') {
            self.line += text.matches('\n').count() as u32;
            self.column = text[last + 1..].chars().count() as u32 + 1;
        } else {
            self.column += text.chars().count() as u32;
        }
        Ok(())
    }

    /// Scan one literal with an anchored recognizer and emit its token.
    fn literal(
        &mut self,
        kind: TokenKind,
        recognize: fn(&mut &'src str) -> ModalResult<&'src str>,
    ) -> Result<Token, LexError> {
        let (line, column, offset) = (self.line, self.column, self.offset);
        let mut rest = self.rest();
        let text = recognize(&mut rest)
            .map_err(|_| self.error_here(format!("malformed {kind} literal")))?;
        self.offset += text.len();
        self.column += text.chars().count() as u32;
        Ok(Token::new(&self.file, line, column, offset, kind, text))
    }

    /// Resolve the longest symbol spelling available at the cursor.
    ///
    /// Tries the 3-byte prefix, then 2, then 1; the first table hit wins.
    /// A prefix that is cut short by end of input is simply skipped.
    fn symbol(&mut self, first: char) -> Result<Token, LexError> {
        let (line, column, offset) = (self.line, self.column, self.offset);
        let rest = self.rest();
        for len in (1..=3).rev() {
            let Some(spelling) = rest.get(..len) else {
                continue;
            };
            let Some(kind) = symbol_kind(spelling) else {
                continue;
            };
            self.offset += spelling.len();
            self.column += spelling.len() as u32;
            if kind.is_opening_delimiter() {
                self.open_bracket(first, line, column, offset)?;
            } else if kind.is_closing_delimiter() {
                self.close_bracket(first, line, column, offset)?;
            }
            return Ok(Token::new(&self.file, line, column, offset, kind, ""));
        }
        Err(self.error_here(format!("unexpected character '{first}'")))
    }

    fn open_bracket(
        &mut self,
        delimiter: char,
        line: u32,
        column: u32,
        offset: usize,
    ) -> Result<(), LexError> {
        if self.brackets.len() >= MAX_BRACKET_DEPTH {
            return Err(LexError::bracket_overflow(
                self.file.clone(),
                line,
                column,
                offset,
                format!("nesting deeper than {MAX_BRACKET_DEPTH} levels"),
            ));
        }
        self.brackets.push(BracketFrame {
            delimiter,
            line,
            column,
        });
        // Parentheses and square brackets make line breaks insignificant;
        // braces never do.
        if delimiter == '(' || delimiter == '[' {
            self.suppress_newlines = true;
        }
        Ok(())
    }

    fn close_bracket(
        &mut self,
        closer: char,
        line: u32,
        column: u32,
        offset: usize,
    ) -> Result<(), LexError> {
        let Some(frame) = self.brackets.pop() else {
            return Err(LexError::bracket_mismatch(
                self.file.clone(),
                line,
                column,
                offset,
                format!("'{closer}' has no opening bracket"),
            ));
        };
        let expected = expected_closer(frame.delimiter);
        if expected != closer {
            return Err(LexError::bracket_mismatch(
                self.file.clone(),
                line,
                column,
                offset,
                format!("expected '{expected}'"),
            ));
        }
        // Braces never toggle newline suppression; only the soft closers
        // re-evaluate the flag.
        if closer == ')' || closer == ']' {
            let any_soft = self
                .brackets
                .iter()
                .any(|f| matches!(f.delimiter, '(' | '['));
            if !any_soft {
                self.suppress_newlines = false;
            } else if self.brackets.last().map(|f| f.delimiter) == Some(opener_for(closer)) {
                self.suppress_newlines = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::token::SYMBOLS;
    use rstest::rstest;

    fn scan_ok(source: &str) -> Vec<Token> {
        Lexer::new("test.qll", source)
            .tokenize()
            .expect("scan should succeed")
    }

    fn scan_err(source: &str) -> LexError {
        Lexer::new("test.qll", source)
            .tokenize()
            .expect_err("scan should fail")
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(scan_ok("").is_empty());
    }

    #[test]
    fn space_and_tab_runs_emit_nothing() {
        assert!(scan_ok("  \t \t   ").is_empty());
    }

    #[test]
    fn newline_run_collapses_to_one_token() {
        let tokens = scan_ok("\n\n\n");
        assert_eq!(kinds(&tokens), vec![TokenKind::Newline]);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[0].offset, 0);
    }

    #[test]
    fn separated_newline_runs_emit_one_token_each() {
        let tokens = scan_ok("\n \n\n");
        assert_eq!(kinds(&tokens), vec![TokenKind::Newline, TokenKind::Newline]);
        assert_eq!((tokens[1].line, tokens[1].column), (2, 2));
        assert_eq!(tokens[1].offset, 2);
    }

    #[test]
    fn every_plain_symbol_round_trips() {
        for (spelling, kind) in SYMBOLS {
            // Brackets need balancing, `#` and `/*` belong to the comment
            // skipper; those are covered separately.
            if kind.is_opening_delimiter()
                || kind.is_closing_delimiter()
                || matches!(*kind, TokenKind::Hash | TokenKind::BlockCommentOpen)
            {
                continue;
            }
            let tokens = scan_ok(spelling);
            assert_eq!(kinds(&tokens), vec![*kind], "spelling {spelling:?}");
            assert_eq!(tokens[0].text, "", "spelling {spelling:?}");
        }
    }

    #[test]
    fn bracket_pairs_round_trip() {
        for (source, open, close) in [
            ("()", TokenKind::LeftParen, TokenKind::RightParen),
            ("[]", TokenKind::LeftBracket, TokenKind::RightBracket),
            ("{}", TokenKind::LeftBrace, TokenKind::RightBrace),
        ] {
            assert_eq!(kinds(&scan_ok(source)), vec![open, close]);
        }
    }

    #[test]
    fn stray_block_comment_close_resolves_through_table() {
        assert_eq!(kinds(&scan_ok("*/")), vec![TokenKind::BlockCommentClose]);
    }

    #[rstest]
    #[case("===", &[TokenKind::EqualEqualEqual])]
    #[case("====", &[TokenKind::EqualEqualEqual, TokenKind::Equal])]
    #[case("!==", &[TokenKind::BangEqualEqual])]
    #[case("**=", &[TokenKind::StarStarEqual])]
    #[case("<<=", &[TokenKind::LessLessEqual])]
    #[case(":=", &[TokenKind::ColonEqual])]
    #[case("...", &[TokenKind::Ellipsis])]
    #[case("....", &[TokenKind::Ellipsis, TokenKind::Dot])]
    #[case("->", &[TokenKind::Arrow])]
    #[case("+ +=", &[TokenKind::Plus, TokenKind::PlusEqual])]
    fn greedy_longest_prefix(#[case] source: &str, #[case] expected: &[TokenKind]) {
        assert_eq!(kinds(&scan_ok(source)), expected);
    }

    #[test]
    fn symbol_at_end_of_input_falls_back_to_shorter_spelling() {
        assert_eq!(kinds(&scan_ok("==")), vec![TokenKind::EqualEqual]);
        assert_eq!(kinds(&scan_ok("=")), vec![TokenKind::Equal]);
    }

    #[test]
    fn nested_brackets_balance() {
        let tokens = scan_ok("(a, [b, (c)], d)");
        assert_eq!(tokens.len(), 13);
        assert_eq!(tokens[0].kind, TokenKind::LeftParen);
        assert_eq!(tokens[12].kind, TokenKind::RightParen);
    }

    #[test]
    fn newlines_inside_parens_are_suppressed() {
        let tokens = scan_ok("(a,\nb)");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn newlines_inside_square_brackets_are_suppressed() {
        let tokens = scan_ok("[1,\n2]");
        assert!(!kinds(&tokens).contains(&TokenKind::Newline));
    }

    #[test]
    fn newline_significance_returns_after_closing() {
        let tokens = scan_ok("(\n)\nx");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Newline,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn closing_a_brace_inside_parens_keeps_suppression() {
        let tokens = scan_ok("({{}\n})");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::LeftParen,
                TokenKind::LeftBrace,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::RightBrace,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn braces_never_suppress_newlines() {
        let tokens = scan_ok("{\n}");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::LeftBrace, TokenKind::Newline, TokenKind::RightBrace]
        );
    }

    #[test]
    fn line_tracking_continues_through_suppressed_newlines() {
        let tokens = scan_ok("(a,\nb)\nx");
        let x = tokens.last().unwrap();
        assert_eq!(x.kind, TokenKind::Identifier);
        assert_eq!((x.line, x.column), (3, 1));
    }

    #[test]
    fn close_without_open_is_a_mismatch() {
        let err = scan_err(")");
        assert!(matches!(err, LexError::BracketMismatch { .. }));
        assert!(err.to_string().contains("no opening"));
        assert_eq!((err.line(), err.column()), (1, 1));
    }

    #[test]
    fn wrong_closer_names_the_expected_one() {
        let err = scan_err("[)");
        assert!(matches!(err, LexError::BracketMismatch { .. }));
        assert!(err.to_string().contains("']'"));
        assert_eq!((err.line(), err.column()), (1, 2));
    }

    #[test]
    fn too_deep_nesting_overflows() {
        let source = "(".repeat(MAX_BRACKET_DEPTH + 1);
        let err = scan_err(&source);
        assert!(matches!(err, LexError::BracketOverflow { .. }));
        assert_eq!(err.column(), MAX_BRACKET_DEPTH as u32 + 1);
    }

    #[test]
    fn nesting_at_the_limit_is_accepted() {
        let mut source = "(".repeat(MAX_BRACKET_DEPTH);
        source.push_str(&")".repeat(MAX_BRACKET_DEPTH));
        let tokens = scan_ok(&source);
        assert_eq!(tokens.len(), MAX_BRACKET_DEPTH * 2);
    }

    #[test]
    fn unclosed_bracket_at_end_of_input_is_a_mismatch() {
        let err = scan_err("(x");
        assert!(matches!(err, LexError::BracketMismatch { .. }));
        assert!(err.to_string().contains("unclosed '('"));
        assert!(err.to_string().contains("1:1"));
    }

    #[test]
    fn line_comment_is_transparent() {
        let tokens = scan_ok("# comment\nx");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier]);
        assert_eq!((tokens[0].line, tokens[0].column), (2, 1));
        assert_eq!(tokens[0].offset, 10);
    }

    #[test]
    fn line_comment_at_end_of_input_emits_nothing() {
        assert!(scan_ok("# trailing comment").is_empty());
    }

    #[test]
    fn block_comment_advances_lines() {
        let tokens = scan_ok("/* a\nb */x");
        assert_eq!(kinds(&tokens), vec![TokenKind::Identifier]);
        assert_eq!((tokens[0].line, tokens[0].column), (2, 5));
        assert_eq!(tokens[0].offset, 9);
    }

    #[test]
    fn block_comment_on_one_line_advances_column() {
        let tokens = scan_ok("/* a */x");
        assert_eq!((tokens[0].line, tokens[0].column), (1, 8));
    }

    #[test]
    fn unterminated_block_comment_fails() {
        let err = scan_err("/* never closed");
        assert!(matches!(err, LexError::UnknownToken { .. }));
        assert!(err.to_string().contains("unterminated"));
        assert_eq!((err.line(), err.column()), (1, 1));
    }

    #[rstest]
    #[case("\"abc\"", TokenKind::String, "\"abc\"")]
    #[case("\"\"", TokenKind::String, "\"\"")]
    #[case("123", TokenKind::Number, "123")]
    #[case("0", TokenKind::Number, "0")]
    #[case("'a'", TokenKind::Char, "'a'")]
    #[case("'''", TokenKind::Char, "'''")]
    #[case("abc", TokenKind::Identifier, "abc")]
    #[case("_tmp9", TokenKind::Identifier, "_tmp9")]
    fn literal_grammar(#[case] source: &str, #[case] kind: TokenKind, #[case] text: &str) {
        let tokens = scan_ok(source);
        assert_eq!(kinds(&tokens), vec![kind]);
        assert_eq!(tokens[0].text, text);
    }

    #[test]
    fn identifier_stops_before_underscore() {
        // Continuation excludes '_', so the underscore starts a fresh
        // identifier of its own.
        let tokens = scan_ok("abc_d");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(tokens[1].text, "_d");
        assert_eq!(tokens[1].column, 4);
    }

    #[test]
    fn number_stops_before_letters() {
        let tokens = scan_ok("123abc");
        assert_eq!(kinds(&tokens), vec![TokenKind::Number, TokenKind::Identifier]);
    }

    #[test]
    fn unterminated_string_fails() {
        let err = scan_err("\"abc");
        assert!(matches!(err, LexError::UnknownToken { .. }));
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn empty_char_literal_fails() {
        let err = scan_err("''");
        assert!(matches!(err, LexError::UnknownToken { .. }));
        assert!(err.to_string().contains("char"));
    }

    #[test]
    fn unknown_character_reports_its_exact_position() {
        let err = scan_err("ab\n  $");
        assert!(matches!(err, LexError::UnknownToken { .. }));
        assert!(err.to_string().contains('$'));
        assert_eq!((err.line(), err.column()), (2, 3));
    }

    #[test]
    fn offsets_are_monotonically_non_decreasing() {
        let tokens = scan_ok("x := 1\ny := x ** 2 # power\nprint(x, y)\n");
        for pair in tokens.windows(2) {
            assert!(pair[0].offset <= pair[1].offset);
        }
    }

    #[test]
    fn tokens_carry_the_file_name() {
        let tokens = scan_ok("x");
        assert_eq!(tokens[0].file, "test.qll");
    }
}
