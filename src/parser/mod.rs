//! Shared recursive-descent plumbing for both grammars: a thin `Parser`
//! wrapper over [`crate::tokenizer::Tokenizer`] with a one-token lookahead,
//! plus the grammar productions the definition and query grammars both
//! need — `name`, `name_list`, `number`, `exponent`, and the
//! `factor_expr`/`mul_expr`/`div_expr`/`factor` family parameterized over
//! whatever type a name resolves to (a `PropertyId` when parsing a
//! dimensional expression, a `UnitId` everywhere else).
//!
//! The "tree" here is built directly as a `Factorization<T>` rather than a
//! separate AST enum, since both grammars bottom out in exactly that shape
//! and an intermediate AST would just be re-walked once to produce it.

pub mod definition;
pub mod query;

use std::hash::Hash;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::error::{ConvertError, Result};
use crate::factorization::Factorization;
use crate::rational::Rational;
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// The rational approximation of π used by the `number` production's `PI`
/// constant: `428224593349304 / 136308121570117`, good to 29 significant
/// digits.
fn pi_constant() -> Rational {
    Rational::new(428224593349304i64, 136308121570117i64).expect("PI's denominator is a fixed nonzero literal")
}

pub(crate) struct Parser {
    tokenizer: Tokenizer,
    current: Token,
    filename: Option<String>,
}

impl Parser {
    pub(crate) fn new(source: &str, filename: Option<String>) -> Result<Self> {
        let mut tokenizer = Tokenizer::new(source, filename.clone());
        let current = tokenizer.next_token()?;
        Ok(Self { tokenizer, current, filename })
    }

    pub(crate) fn register_keyword(&mut self, word: &str) {
        self.tokenizer.register_keyword(word);
    }

    pub(crate) fn current_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Whether the current token is the registered keyword `text`.
    pub(crate) fn is_keyword(&self, text: &str) -> bool {
        self.current.kind == TokenKind::Keyword && self.current.text == text
    }

    pub(crate) fn current_span(&self) -> crate::error::Span {
        self.current.span(self.filename.clone())
    }

    pub(crate) fn current_text(&self) -> &str {
        &self.current.text
    }

    fn error_at(&self, message: impl Into<String>) -> ConvertError {
        ConvertError::syntax(message, self.current.span(self.filename.clone()), self.current.text.clone())
    }

    /// Consumes and returns the current token, advancing the lookahead.
    pub(crate) fn bump(&mut self) -> Result<Token> {
        let consumed = self.current.clone();
        self.current = self.tokenizer.next_token()?;
        Ok(consumed)
    }

    /// Snapshots the current lookahead so [`Parser::reset_to`] can later
    /// rewind to exactly this point — used by `parse_item_name`'s
    /// longest-match backtracking.
    pub(crate) fn mark(&self) -> Token {
        self.current.clone()
    }

    /// Rewinds to a previously taken [`Parser::mark`]: the next [`Parser::bump`]
    /// will return whatever token followed the mark originally.
    pub(crate) fn reset_to(&mut self, mark: Token) -> Result<()> {
        self.tokenizer.set_current(&mark)?;
        self.current = mark;
        Ok(())
    }

    /// Consumes the current token if it has `kind`, else fails.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind != kind {
            return Err(self.error_at(format!("expected {kind:?}, found {:?}", self.current.kind)));
        }
        self.bump()
    }

    /// Consumes a plain `WORD` token (not a registered keyword).
    fn expect_word(&mut self) -> Result<Token> {
        if self.current.kind != TokenKind::Word {
            return Err(self.error_at("expected a word"));
        }
        self.bump()
    }

    /// `name := WORD WORD*`, joining consecutive words with a single space.
    pub(crate) fn parse_name(&mut self) -> Result<String> {
        let mut words = vec![self.expect_word()?.text];
        while self.current_kind() == TokenKind::Word {
            words.push(self.bump()?.text);
        }
        Ok(words.join(" "))
    }

    /// `name_list := name (',' name)*`.
    pub(crate) fn parse_name_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.parse_name()?];
        while self.current_kind() == TokenKind::Comma {
            self.bump()?;
            names.push(self.parse_name()?);
        }
        Ok(names)
    }

    /// `prefix_list := WORD (',' WORD)*`.
    pub(crate) fn parse_prefix_list(&mut self) -> Result<Vec<String>> {
        let mut names = vec![self.expect_word()?.text];
        while self.current_kind() == TokenKind::Comma {
            self.bump()?;
            names.push(self.expect_word()?.text);
        }
        Ok(names)
    }

    fn parse_number_atom(&mut self) -> Result<Rational> {
        if self.current.kind == TokenKind::Word && self.current.text == "PI" {
            self.bump()?;
            return Ok(pi_constant());
        }
        let token = self.expect(TokenKind::Number)?;
        Ok(token.number_value()?)
    }

    pub(crate) fn starts_number(&self) -> bool {
        matches!(self.current.kind, TokenKind::Number | TokenKind::Plus | TokenKind::Minus)
            || (self.current.kind == TokenKind::Word && self.current.text == "PI")
    }

    /// `number := ('+'|'-')? (NUMBER | 'PI') ('*' (NUMBER|'PI'))? ('/' (NUMBER|'PI'))?`.
    pub(crate) fn parse_number(&mut self) -> Result<Rational> {
        let negative = match self.current.kind {
            TokenKind::Plus => {
                self.bump()?;
                false
            }
            TokenKind::Minus => {
                self.bump()?;
                true
            }
            _ => false,
        };

        let mut value = self.parse_number_atom()?;
        if self.current_kind() == TokenKind::Star {
            self.bump()?;
            value = value.mul(&self.parse_number_atom()?);
        }
        if self.current_kind() == TokenKind::Slash {
            self.bump()?;
            value = value.div(&self.parse_number_atom()?)?;
        }
        Ok(if negative { value.neg() } else { value })
    }

    /// `exponent := '^' ('+'|'-')? NUMBER`, or `1` when no `^` is present.
    pub(crate) fn parse_optional_exponent(&mut self) -> Result<i64> {
        if self.current_kind() != TokenKind::Caret {
            return Ok(1);
        }
        self.bump()?;
        let negative = match self.current_kind() {
            TokenKind::Plus => {
                self.bump()?;
                false
            }
            TokenKind::Minus => {
                self.bump()?;
                true
            }
            _ => false,
        };
        let token = self.expect(TokenKind::Number)?;
        let value = token.number_value()?;
        if value.denominator() != &BigInt::from(1) {
            return Err(self.error_at("an exponent must be a whole number"));
        }
        let n = value.numerator().to_i64().ok_or_else(|| self.error_at("exponent is out of range"))?;
        Ok(if negative { -n } else { n })
    }

    /// Consumes a word, forcing in one more unconditionally when it is
    /// `"square"`/`"cubic"`/`"inverse"` (stripped afterward with the
    /// corresponding exponent multiplier — 2, 3, −1 — square, cube,
    /// reciprocal), then greedily extends word-by-word for as long as the
    /// next token is a plain (non-keyword) word, remembering the *longest*
    /// prefix that resolves to a known name at each step.
    ///
    /// A single greedy join-everything read would misparse an implicit
    /// multiplication like `kg m` as the one unresolvable name `"kg m"`
    /// instead of two factors. Tracking the longest resolving prefix and
    /// rewinding the tokenizer to just past it (via [`Parser::mark`] /
    /// [`Parser::reset_to`]) lets `kg` win immediately while still allowing
    /// genuinely multi-word names (`light year`) to be found by looking one
    /// word further ahead.
    fn parse_item_name<T, F>(&mut self, resolve: &F) -> Result<(T, i64)>
    where
        F: Fn(&str) -> Option<T>,
    {
        let mut words = vec![self.expect_word()?.text];
        if matches!(words[0].as_str(), "square" | "cubic" | "inverse") {
            words.push(self.expect_word()?.text);
        }

        let exponent_multiplier = match words[0].as_str() {
            "cubic" => 3,
            "square" => 2,
            "inverse" => -1,
            _ => 1,
        };
        let mut candidate: Vec<String> = if exponent_multiplier != 1 { words[1..].to_vec() } else { words.clone() };

        let mut best: Option<(T, Token)> = resolve(&candidate.join(" ")).map(|item| (item, self.mark()));
        while self.current_kind() == TokenKind::Word {
            candidate.push(self.bump()?.text);
            if let Some(item) = resolve(&candidate.join(" ")) {
                best = Some((item, self.mark()));
            }
        }

        match best {
            Some((item, mark)) => {
                self.reset_to(mark)?;
                Ok((item, exponent_multiplier))
            }
            None => Err(self.error_at(format!("unknown name {:?}", candidate.join(" ")))),
        }
    }

    /// `factor := '(' factor_expr ')' exponent? | unit_name exponent?`.
    fn parse_factor<T, F>(&mut self, resolve: &F) -> Result<Factorization<T>>
    where
        T: Eq + Hash + Clone,
        F: Fn(&str) -> Option<T>,
    {
        if self.current_kind() == TokenKind::LParen {
            self.bump()?;
            let inner = self.parse_factor_expr(resolve)?;
            self.expect(TokenKind::RParen)?;
            let exp = self.parse_optional_exponent()?;
            Ok(inner.pow(exp))
        } else {
            let (item, name_exp) = self.parse_item_name(resolve)?;
            let exp = self.parse_optional_exponent()?;
            Ok(Factorization::single(item, name_exp * exp))
        }
    }

    /// Whether the current token can start another `factor` via implicit
    /// multiplication.
    fn continues_factor(&self) -> bool {
        matches!(self.current_kind(), TokenKind::LParen | TokenKind::Word)
    }

    /// `mul_expr := factor ( ('*' | LPAREN | WORD) factor )*`.
    fn parse_mul_expr<T, F>(&mut self, resolve: &F) -> Result<Factorization<T>>
    where
        T: Eq + Hash + Clone,
        F: Fn(&str) -> Option<T>,
    {
        let mut result = self.parse_factor(resolve)?;
        loop {
            if self.current_kind() == TokenKind::Star {
                self.bump()?;
                result = result.mul(&self.parse_factor(resolve)?);
            } else if self.continues_factor() {
                result = result.mul(&self.parse_factor(resolve)?);
            } else {
                break;
            }
        }
        Ok(result)
    }

    /// `div_expr := factor ( ('*'|'/'|'per'|LPAREN|WORD) factor )*`; every
    /// joiner multiplies the next factor into the (already-inverted, by the
    /// caller) denominator side — `'/'`/`'per'` are not further division
    /// here, they just chain another denominator term.
    fn parse_div_expr<T, F>(&mut self, resolve: &F) -> Result<Factorization<T>>
    where
        T: Eq + Hash + Clone,
        F: Fn(&str) -> Option<T>,
    {
        let mut result = self.parse_factor(resolve)?;
        loop {
            if matches!(self.current_kind(), TokenKind::Star | TokenKind::Slash) {
                self.bump()?;
                result = result.mul(&self.parse_factor(resolve)?);
            } else if self.is_keyword("per") {
                self.bump()?;
                result = result.mul(&self.parse_factor(resolve)?);
            } else if self.continues_factor() {
                result = result.mul(&self.parse_factor(resolve)?);
            } else {
                break;
            }
        }
        Ok(result)
    }

    /// `factor_expr := mul_expr (('/' | 'per') div_expr)?`.
    pub(crate) fn parse_factor_expr<T, F>(&mut self, resolve: &F) -> Result<Factorization<T>>
    where
        T: Eq + Hash + Clone,
        F: Fn(&str) -> Option<T>,
    {
        let numerator = self.parse_mul_expr(resolve)?;
        if self.current_kind() == TokenKind::Slash || self.is_keyword("per") {
            self.bump()?;
            let denominator = self.parse_div_expr(resolve)?;
            Ok(numerator.div(&denominator))
        } else {
            Ok(numerator)
        }
    }
}
