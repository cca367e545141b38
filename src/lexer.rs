use tracing::trace;

use crate::Real;
use crate::engine::Engine;
use crate::error::{ExprError, Result};
use crate::types::{KindSet, Token};

/// The tokenizer, which turns a formula string into infix tokens.
///
/// Characters are accumulated into a pending run until an operator, a parenthesis, a comma
/// or whitespace is reached. The run is then split, left to right, into number literals and
/// identifiers. Identifiers resolve against the engine's variables (becoming numbers) and
/// then its functions.
///
/// Every emitted token goes through two context rules that only look at the previously
/// emitted token:
///
/// - after a number or `)`, a number, `(` or function gets an implicit `*` in front of it
/// - a `+` or `-` at the start, or after an operator, `(` or `,`, is a sign (unary)
pub struct Lexer<'a> {
    input: &'a str,
    engine: &'a Engine,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, engine: &'a Engine) -> Self {
        Self {
            input,
            engine,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input into an infix sequence.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let input = self.input;
        let mut run_start: Option<usize> = None;

        for (pos, c) in input.char_indices() {
            if !self.is_boundary(c) {
                run_start.get_or_insert(pos);
                continue;
            }
            if let Some(start) = run_start.take() {
                self.split_run(&input[start..pos])?;
            }
            match c {
                '(' => self.push(Token::LeftParen),
                ')' => self.push(Token::RightParen),
                ',' => self.push(Token::Separator),
                c if c.is_whitespace() => {}
                symbol => self.push(Token::BinaryOp(symbol)),
            }
        }
        if let Some(start) = run_start {
            self.split_run(&input[start..])?;
        }

        trace!(count = self.tokens.len(), "tokenized formula");
        Ok(self.tokens)
    }

    /// Characters that end a pending run.
    fn is_boundary(&self, c: char) -> bool {
        c.is_whitespace() || matches!(c, '(' | ')' | ',') || self.engine.operator(c).is_some()
    }

    /// Split a run of characters into numbers and identifiers.
    fn split_run(&mut self, run: &str) -> Result<()> {
        let mut rest = run;
        while !rest.is_empty() {
            if let Some(len) = match_number(rest) {
                let text = &rest[..len];
                let value = text.parse::<Real>().map_err(|_| ExprError::UnknownToken {
                    token: text.to_string(),
                })?;
                self.push(Token::Number(value));
                rest = &rest[len..];
            } else if let Some(len) = match_identifier(rest) {
                let token = self.resolve(&rest[..len])?;
                self.push(token);
                rest = &rest[len..];
            } else {
                return Err(ExprError::UnknownToken {
                    token: rest.to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve(&self, ident: &str) -> Result<Token> {
        if let Some(value) = self.engine.variable(ident) {
            return Ok(Token::Number(value));
        }
        if self.engine.function(ident).is_some() {
            return Token::function(ident);
        }
        Err(ExprError::UnknownToken {
            token: ident.to_string(),
        })
    }

    /// Append a token, applying the sign and implicit multiplication rules.
    fn push(&mut self, token: Token) {
        let token = match token {
            Token::BinaryOp(symbol) if self.is_sign(symbol) => Token::UnaryOp(symbol),
            other => other,
        };
        if let Some(prev) = self.tokens.last() {
            if prev.is_any(KindSet::ENDS_VALUE) && token.is_any(KindSet::STARTS_VALUE) {
                self.tokens.push(Token::BinaryOp('*'));
            }
        }
        self.tokens.push(token);
    }

    fn is_sign(&self, symbol: char) -> bool {
        let has_unary_rule = self
            .engine
            .operator(symbol)
            .is_some_and(|op| op.unary.is_some());
        let expects_operand = self
            .tokens
            .last()
            .is_none_or(|prev| prev.is_any(KindSet::EXPECTS_OPERAND));
        has_unary_rule && expects_operand
    }
}

/// Length of the number literal at the start of `s`, if any.
///
/// Accepts `digits[.digits][e digits]` and `.digits[e digits]`. The exponent is unsigned
/// and only taken when at least one digit follows the `e`, so `2e` is `2` followed by `e`.
fn match_number(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            digits += 1;
        }
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > end + 1 {
            end = exp_end;
        }
    }
    Some(end)
}

/// Length of the run of letters at the start of `s`, if any.
fn match_identifier(s: &str) -> Option<usize> {
    let len: usize = s
        .chars()
        .take_while(|c| c.is_alphabetic())
        .map(char::len_utf8)
        .sum();
    (len > 0).then_some(len)
}
