//! Type definitions shared by the tokenizer, compiler and evaluator.
//!
//! This module contains the [`Token`] that flows between every stage, the token
//! classification helpers used for disambiguation, and the operator and function
//! descriptors stored in an [`Engine`](crate::Engine).

use core::fmt;

use bitflags::bitflags;
use rand::rngs::StdRng;

use crate::Real;
use crate::error::ExprError;

/// Maximum length of a function name stored in a token.
pub const FUNCTION_NAME_LEN: usize = 16;

/// Maximum number of arguments any function rule may take.
pub const MAX_FUNCTION_ARITY: usize = 4;

/// Precedence given to unary `+` and `-`.
///
/// Unary operators bind tighter than `*` and `/` but not tighter than `^`, so `-2^2`
/// is `-(2^2)`.
pub const UNARY_PRECEDENCE: u8 = 4;

/// Fixed-capacity function name carried by [`Token::Function`].
pub type FunctionName = heapless::String<FUNCTION_NAME_LEN>;

/// Random generator backing `random(min, max)`.
pub type FormulaRng = StdRng;

/// Rule applied by a unary operator.
pub type UnaryRule = fn(Real) -> Real;

/// Rule applied by a binary operator, as `rule(left, right)`.
pub type BinaryRule = fn(Real, Real) -> Real;

/// Rule applied by a function. Arguments arrive in left-to-right order.
///
/// `args` always holds exactly the [`FunctionDescriptor::arity`] the rule was registered
/// with; rules index it without checking, so a shorter slice panics.
pub type FunctionRule = fn(&[Real], &mut FormulaRng) -> Real;

/// A token produced by the tokenizer and rearranged by the compiler.
///
/// The same type is used for infix and RPN sequences. A `Number` always stands for a
/// single scalar; `Function` and `VectorMarker` carry the number of values they consume,
/// which the compiler fills in when their parenthesis group closes.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A literal or a resolved variable.
    Number(Real),
    /// A prefix `+` or `-`.
    UnaryOp(char),
    /// An infix operator such as `*` or `^`.
    BinaryOp(char),
    LeftParen,
    RightParen,
    /// The `,` between arguments or tuple components.
    Separator,
    /// A function call. `arity` is 0 until the call's group is closed.
    Function { name: FunctionName, arity: usize },
    /// Packs the top `arity` scalars into one tuple value.
    VectorMarker { arity: usize },
}

impl Token {
    /// Creates a function token with no arguments bound yet.
    pub fn function(name: &str) -> Result<Token, ExprError> {
        Ok(Token::Function {
            name: name.try_into_function_name()?,
            arity: 0,
        })
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Number(_) => TokenKind::Number,
            Token::UnaryOp(_) => TokenKind::UnaryOp,
            Token::BinaryOp(_) => TokenKind::BinaryOp,
            Token::LeftParen => TokenKind::LeftParen,
            Token::RightParen => TokenKind::RightParen,
            Token::Separator => TokenKind::Separator,
            Token::Function { .. } => TokenKind::Function,
            Token::VectorMarker { .. } => TokenKind::VectorMarker,
        }
    }

    /// Returns true if this token's kind is in `set`.
    pub fn is_any(&self, set: KindSet) -> bool {
        set.contains(self.kind().bit())
    }

    /// Number of values this token stands for (numbers) or consumes (calls, tuples).
    pub fn arity(&self) -> usize {
        match self {
            Token::Number(_) => 1,
            Token::Function { arity, .. } | Token::VectorMarker { arity } => *arity,
            _ => 0,
        }
    }

    /// The numeric payload, if this is a `Number`.
    pub fn value(&self) -> Option<Real> {
        match self {
            Token::Number(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(value) => write!(f, "{}", value),
            Token::UnaryOp(symbol) => write!(f, "u{}", symbol),
            Token::BinaryOp(symbol) => write!(f, "{}", symbol),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Separator => write!(f, ","),
            Token::Function { name, arity } => write!(f, "{}/{}", name, arity),
            Token::VectorMarker { arity } => write!(f, "vec/{}", arity),
        }
    }
}

/// Formats a token sequence as space-separated text, e.g. `2 3 4 * +`.
pub fn format_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| token.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifies a token without its payload.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Number,
    UnaryOp,
    BinaryOp,
    LeftParen,
    RightParen,
    Separator,
    Function,
    VectorMarker,
}

impl TokenKind {
    pub fn bit(self) -> KindSet {
        match self {
            TokenKind::Number => KindSet::NUMBER,
            TokenKind::UnaryOp => KindSet::UNARY_OP,
            TokenKind::BinaryOp => KindSet::BINARY_OP,
            TokenKind::LeftParen => KindSet::LEFT_PAREN,
            TokenKind::RightParen => KindSet::RIGHT_PAREN,
            TokenKind::Separator => KindSet::SEPARATOR,
            TokenKind::Function => KindSet::FUNCTION,
            TokenKind::VectorMarker => KindSet::VECTOR_MARKER,
        }
    }
}

bitflags! {
    /// A set of token kinds, used by the tokenizer's context rules.
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct KindSet: u8 {
        const NUMBER = 1 << 0;
        const UNARY_OP = 1 << 1;
        const BINARY_OP = 1 << 2;
        const LEFT_PAREN = 1 << 3;
        const RIGHT_PAREN = 1 << 4;
        const SEPARATOR = 1 << 5;
        const FUNCTION = 1 << 6;
        const VECTOR_MARKER = 1 << 7;

        /// Tokens after which a value-starting token implies `*`.
        const ENDS_VALUE = Self::NUMBER.bits() | Self::RIGHT_PAREN.bits();
        /// Tokens that begin a value and trigger implicit multiplication.
        const STARTS_VALUE = Self::NUMBER.bits() | Self::LEFT_PAREN.bits() | Self::FUNCTION.bits();
        /// Tokens after which `+` or `-` is a sign rather than an operator.
        const EXPECTS_OPERAND = Self::BINARY_OP.bits()
            | Self::UNARY_OP.bits()
            | Self::LEFT_PAREN.bits()
            | Self::SEPARATOR.bits();
    }
}

/// Grouping direction for operators of equal precedence.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Associativity {
    Left,
    Right,
}

/// Entry of the operator table.
#[derive(Copy, Clone, Debug)]
pub struct OperatorDescriptor {
    /// Higher binds tighter.
    pub precedence: u8,
    pub associativity: Associativity,
    /// Present for symbols usable as a sign.
    pub unary: Option<UnaryRule>,
    pub binary: Option<BinaryRule>,
}

impl OperatorDescriptor {
    pub const fn binary(precedence: u8, associativity: Associativity, rule: BinaryRule) -> Self {
        Self {
            precedence,
            associativity,
            unary: None,
            binary: Some(rule),
        }
    }

    pub const fn with_unary(mut self, rule: UnaryRule) -> Self {
        self.unary = Some(rule);
        self
    }
}

/// Entry of the function table.
#[derive(Copy, Clone, Debug)]
pub struct FunctionDescriptor {
    /// Exact number of arguments the rule consumes.
    pub arity: usize,
    pub rule: FunctionRule,
}

/// Conversion of a name into a [`FunctionName`].
pub trait TryIntoFunctionName {
    fn try_into_function_name(&self) -> Result<FunctionName, ExprError>;
}

impl TryIntoFunctionName for str {
    fn try_into_function_name(&self) -> Result<FunctionName, ExprError> {
        let mut name = FunctionName::new();
        name.push_str(self).map_err(|_| ExprError::InvalidFunction {
            name: self.to_string(),
        })?;
        Ok(name)
    }
}
