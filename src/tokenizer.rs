//! Character stream to token stream, shared by both grammars.
//!
//! Hand-rolled, not built from `nom` combinators top to bottom: the keyword
//! set is mutable mid-parse and the parser needs a rewindable single-token
//! lookahead, neither of which a combinator grammar exposes cleanly. `nom`
//! is kept for exactly the piece that benefits from it: the digit/fraction/
//! exponent grammar of a number literal.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char as nom_char, digit1, one_of};
use nom::combinator::{opt, recognize};
use nom::multi::many1;
use nom::sequence::{pair, tuple};
use nom::IResult;

use crate::error::{ArithmeticError, ConvertError, Span};
use crate::rational::Rational;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    Equals,
    Comma,
    Colon,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Dollar,
    Number,
    Word,
    Keyword,
    Eof,
    Error,
}

/// A plain value: `(kind, text, position, line, column, length,
/// tokenizer_id)`, per the redesign flag against inner classes that close
/// over their tokenizer. Two tokens compare equal only when they came from
/// the same tokenizer (derived equality includes `tokenizer_id`).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub length: usize,
    tokenizer_id: u64,
}

impl Token {
    pub fn span(&self, filename: Option<String>) -> Span {
        Span::new(self.line, self.column, filename)
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Parses this token's text as a number, stripping the `_`/`'` digit
    /// separators the tokenizer's grammar allows inside one.
    pub fn number_value(&self) -> Result<Rational, ArithmeticError> {
        let cleaned: String = self.text.chars().filter(|c| *c != '_' && *c != '\'').collect();
        Rational::from_decimal_str(&cleaned)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn digits_with_separators(input: &str) -> IResult<&str, &str> {
    recognize(many1(alt((digit1, tag("_"), tag("'")))))(input)
}

/// `digits(.digits)?([eE][+-]?digits)?`, backing out of the fraction or
/// exponent group entirely (consuming nothing of it) if it doesn't fully
/// match — this is what lets the outer scanner tell a clean number from a
/// malformed one.
fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digits_with_separators,
        opt(pair(nom_char('.'), digits_with_separators)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digits_with_separators))),
    )))(input)
}

static NEXT_TOKENIZER_ID: AtomicU64 = AtomicU64::new(1);

/// A stateful scanner over a character buffer. Line/column tracking treats
/// `\n`, `\r\n`, and a bare `\r` as a single newline each; `\n\r` therefore
/// counts as two, since it is scanned as a `\n` newline followed by a bare
/// `\r` newline.
pub struct Tokenizer {
    chars: Vec<char>,
    filename: Option<String>,
    id: u64,
    pos: usize,
    line: usize,
    column: usize,
    keywords: HashSet<String>,
    history: Vec<Token>,
    cursor: Option<usize>,
}

impl Tokenizer {
    pub fn new(source: &str, filename: Option<String>) -> Self {
        Self {
            chars: source.chars().collect(),
            filename,
            id: NEXT_TOKENIZER_ID.fetch_add(1, Ordering::Relaxed),
            pos: 0,
            line: 1,
            column: 1,
            keywords: HashSet::new(),
            history: Vec::new(),
            cursor: None,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn register_keyword(&mut self, word: impl Into<String>) {
        self.keywords.insert(word.into());
    }

    pub fn unregister_keyword(&mut self, word: &str) {
        self.keywords.remove(word);
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.cursor.and_then(|index| self.history.get(index))
    }

    /// Advances and returns the next token, replaying from history if a
    /// prior `set_current` rewound the cursor.
    pub fn next_token(&mut self) -> Result<Token, ConvertError> {
        if let Some(cursor) = self.cursor {
            if cursor + 1 < self.history.len() {
                self.cursor = Some(cursor + 1);
                return Ok(self.history[cursor + 1].clone());
            }
        }
        let token = self.scan_next()?;
        self.history.push(token.clone());
        self.cursor = Some(self.history.len() - 1);
        Ok(token)
    }

    /// Rewinds so the next call to `next_token` returns whatever token
    /// originally followed `token`. Fails if `token` did not come from this
    /// tokenizer or is no longer in the replay history.
    pub fn set_current(&mut self, token: &Token) -> Result<(), ConvertError> {
        if token.tokenizer_id != self.id {
            return Err(ConvertError::illegal_state(
                "cannot rewind to a token produced by a different tokenizer",
            ));
        }
        match self
            .history
            .iter()
            .position(|t| t.position == token.position && t.kind == token.kind)
        {
            Some(index) => {
                self.cursor = Some(index);
                Ok(())
            }
            None => Err(ConvertError::illegal_state(
                "cannot rewind past the end of the token stream",
            )),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        let Some(c) = self.peek() else { return };
        if c == '\r' {
            if self.peek_at(1) == Some('\n') {
                self.pos += 2;
            } else {
                self.pos += 1;
            }
            self.line += 1;
            self.column = 1;
        } else if c == '\n' {
            self.pos += 1;
            self.line += 1;
            self.column = 1;
        } else {
            self.pos += 1;
            self.column += 1;
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ConvertError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('#') => self.skip_line_comment(),
                Some('/') if self.peek_at(1) == Some('/') => self.skip_line_comment(),
                Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ConvertError> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    return Err(ConvertError::syntax(
                        "unterminated block comment",
                        Span::new(start_line, start_column, self.filename.clone()),
                        "/*",
                    ));
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn scan_word(&mut self) -> String {
        let mut text = String::new();
        loop {
            while let Some(c) = self.peek() {
                if is_ident_continue(c) {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if self.peek() == Some('-') && self.peek_at(1).is_some_and(is_ident_start) {
                text.push('-');
                self.advance();
                continue;
            }
            break;
        }
        text
    }

    /// Scans a number literal, then detects malformed cases (`12et`, `345t`,
    /// `72ee`, `216e`, `34.5.2`, `23.`) by checking whether
    /// a `.` or identifier-start character sits immediately after an
    /// otherwise-clean number with no separating whitespace, and if so
    /// folding it into the token text and reporting the token as malformed.
    fn scan_number(&mut self) -> (String, bool) {
        let remaining: String = self.chars[self.pos..].iter().collect();
        let prefix_len = number_literal(&remaining).map(|(_, matched)| matched.len()).unwrap_or(0);

        let mut text: String = remaining.chars().take(prefix_len).collect();
        for _ in 0..prefix_len {
            self.advance();
        }

        let mut malformed = false;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                malformed = true;
                while let Some(c) = self.peek() {
                    if is_ident_continue(c) {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            Some('.') => {
                malformed = true;
                text.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
            _ => {}
        }
        (text, malformed)
    }

    fn scan_next(&mut self) -> Result<Token, ConvertError> {
        self.skip_trivia()?;

        let start_pos = self.pos;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek() else {
            return Ok(self.finish_token(TokenKind::Eof, String::new(), start_pos, start_line, start_column));
        };

        let (kind, text) = match c {
            '(' => {
                self.advance();
                (TokenKind::LParen, "(".to_string())
            }
            ')' => {
                self.advance();
                (TokenKind::RParen, ")".to_string())
            }
            '{' => {
                self.advance();
                (TokenKind::LBrace, "{".to_string())
            }
            '}' => {
                self.advance();
                (TokenKind::RBrace, "}".to_string())
            }
            '=' => {
                self.advance();
                (TokenKind::Equals, "=".to_string())
            }
            ',' => {
                self.advance();
                (TokenKind::Comma, ",".to_string())
            }
            ':' => {
                self.advance();
                (TokenKind::Colon, ":".to_string())
            }
            ';' => {
                self.advance();
                (TokenKind::Semicolon, ";".to_string())
            }
            '+' => {
                self.advance();
                (TokenKind::Plus, "+".to_string())
            }
            '-' => {
                self.advance();
                (TokenKind::Minus, "-".to_string())
            }
            '*' => {
                self.advance();
                (TokenKind::Star, "*".to_string())
            }
            '/' => {
                self.advance();
                (TokenKind::Slash, "/".to_string())
            }
            '^' => {
                self.advance();
                (TokenKind::Caret, "^".to_string())
            }
            '$' => {
                self.advance();
                (TokenKind::Dollar, "$".to_string())
            }
            c if c.is_ascii_digit() => {
                let (text, malformed) = self.scan_number();
                (if malformed { TokenKind::Error } else { TokenKind::Number }, text)
            }
            c if is_ident_start(c) => {
                let text = self.scan_word();
                let kind = if self.keywords.contains(&text) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Word
                };
                (kind, text)
            }
            other => {
                self.advance();
                (TokenKind::Error, other.to_string())
            }
        };

        Ok(self.finish_token(kind, text, start_pos, start_line, start_column))
    }

    fn finish_token(&self, kind: TokenKind, text: String, position: usize, line: usize, column: usize) -> Token {
        let length = text.chars().count();
        Token {
            kind,
            text,
            position,
            line,
            column,
            length,
            tokenizer_id: self.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut tokenizer = Tokenizer::new(source, None);
        let mut out = Vec::new();
        loop {
            let token = tokenizer.next_token().unwrap();
            let done = token.kind == TokenKind::Eof;
            out.push(token.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn symbols_are_recognized() {
        assert_eq!(
            kinds("(){}=,:;+-*/^$"),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Equals,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Caret,
                TokenKind::Dollar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_registered_mid_stream_reclassifies_later_occurrences() {
        let mut tokenizer = Tokenizer::new("per per", None);
        let first = tokenizer.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::Word);
        tokenizer.register_keyword("per");
        let second = tokenizer.next_token().unwrap();
        assert_eq!(second.kind, TokenKind::Keyword);
        tokenizer.unregister_keyword("per");
    }

    #[test]
    fn hyphenated_word_joins_when_followed_by_identifier_start() {
        let mut tokenizer = Tokenizer::new("first-word", None);
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Word);
        assert_eq!(token.text, "first-word");
    }

    #[test]
    fn hyphen_before_digit_does_not_join() {
        let mut tokenizer = Tokenizer::new("345-6", None);
        let first = tokenizer.next_token().unwrap();
        assert_eq!(first.kind, TokenKind::Number);
        assert_eq!(first.text, "345");
        let second = tokenizer.next_token().unwrap();
        assert_eq!(second.kind, TokenKind::Minus);
    }

    #[test]
    fn digit_separators_are_preserved_in_text_and_stripped_on_conversion() {
        let mut tokenizer = Tokenizer::new("9_460_730_472_580_800", None);
        let token = tokenizer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.number_value().unwrap(), Rational::from_integer(9_460_730_472_580_800i64));
    }

    #[test]
    fn rejects_malformed_numbers() {
        for malformed in ["12et", "345t", "72ee", "216e", "34.5.2", "23."] {
            let mut tokenizer = Tokenizer::new(malformed, None);
            let token = tokenizer.next_token().unwrap();
            assert_eq!(token.kind, TokenKind::Error, "expected {malformed} to be rejected");
            assert_eq!(token.text, malformed);
        }
    }

    #[test]
    fn accepts_well_formed_numbers() {
        for ok in ["100", "0.45", "1", "9460730472580800", "1e10", "1.5e-3", "1E+3"] {
            let mut tokenizer = Tokenizer::new(ok, None);
            let token = tokenizer.next_token().unwrap();
            assert_eq!(token.kind, TokenKind::Number, "expected {ok} to be accepted");
        }
    }

    #[test]
    fn line_tracking_treats_crlf_as_one_newline() {
        let mut tokenizer = Tokenizer::new("a\r\nb", None);
        let a = tokenizer.next_token().unwrap();
        assert_eq!(a.line, 1);
        let b = tokenizer.next_token().unwrap();
        assert_eq!(b.line, 2);
    }

    #[test]
    fn line_tracking_treats_bare_cr_as_one_newline() {
        let mut tokenizer = Tokenizer::new("a\rb", None);
        tokenizer.next_token().unwrap();
        let b = tokenizer.next_token().unwrap();
        assert_eq!(b.line, 2);
    }

    #[test]
    fn line_tracking_treats_lf_cr_as_two_newlines() {
        let mut tokenizer = Tokenizer::new("a\n\rb", None);
        tokenizer.next_token().unwrap();
        let b = tokenizer.next_token().unwrap();
        assert_eq!(b.line, 3);
    }

    #[test]
    fn unterminated_block_comment_is_a_syntax_error() {
        let mut tokenizer = Tokenizer::new("/* never closed", None);
        assert!(tokenizer.next_token().is_err());
    }

    #[test]
    fn line_comment_runs_to_end_of_line() {
        let mut tokenizer = Tokenizer::new("a // comment\nb", None);
        let a = tokenizer.next_token().unwrap();
        assert_eq!(a.text, "a");
        let b = tokenizer.next_token().unwrap();
        assert_eq!(b.text, "b");
        assert_eq!(b.line, 2);
    }

    #[test]
    fn set_current_replays_the_following_token() {
        let mut tokenizer = Tokenizer::new("a b c", None);
        let a = tokenizer.next_token().unwrap();
        let b = tokenizer.next_token().unwrap();
        tokenizer.set_current(&a).unwrap();
        let replayed_b = tokenizer.next_token().unwrap();
        assert_eq!(replayed_b, b);
        let c = tokenizer.next_token().unwrap();
        assert_eq!(c.text, "c");
    }

    #[test]
    fn set_current_from_a_different_tokenizer_is_illegal() {
        let mut a = Tokenizer::new("x", None);
        let token_a = a.next_token().unwrap();
        let mut b = Tokenizer::new("y", None);
        b.next_token().unwrap();
        assert!(b.set_current(&token_a).is_err());
    }
}
