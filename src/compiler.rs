//! Infix to Reverse Polish Notation conversion.
//!
//! This is Dijkstra's shunting-yard algorithm extended for variable-arity calls. Next to
//! the operator stack, the compiler keeps one [`Group`] per open parenthesis (plus one for
//! the whole formula) recording whether the current argument has produced a value and how
//! many arguments were completed before it. When a group closes, that count becomes the
//! arity of the function that owns it, or of a `VectorMarker` when a bare group holds more
//! than one argument. The whole formula being a group is what makes `1, 0.5, 0.2` a tuple.

use tracing::debug;

use crate::engine::Engine;
use crate::error::{ExprError, Result};
use crate::types::{Associativity, Token, UNARY_PRECEDENCE};

/// Argument bookkeeping for one parenthesis group.
#[derive(Debug, Clone, Copy)]
struct Group {
    /// The current argument has produced a value
    has_value: bool,
    /// Arguments completed by a separator
    count: usize,
    /// Operator stack depth right above the group's `(`
    base: usize,
}

impl Group {
    fn new(base: usize) -> Self {
        Self {
            has_value: false,
            count: 0,
            base,
        }
    }

    fn arity(&self) -> usize {
        self.count + usize::from(self.has_value)
    }
}

/// Converts an infix token sequence into RPN.
///
/// # Errors
///
/// - `InvalidEquation` for empty input or input that compiles to nothing
/// - `UnbalancedParenthesis` for a `)` without `(` or a `(` never closed
/// - `MisplacedSeparator` for a `,` that does not follow a value
/// - `InvalidOperator` for a binary operator missing from the engine's table
pub fn to_rpn(engine: &Engine, infix: &[Token]) -> Result<Vec<Token>> {
    if infix.is_empty() {
        return Err(ExprError::InvalidEquation("empty expression".to_string()));
    }
    let mut compiler = ShuntingYard::new(engine, infix.len());
    for token in infix {
        compiler.push(token)?;
    }
    let rpn = compiler.finish()?;
    debug!(infix = infix.len(), rpn = rpn.len(), "compiled formula");
    Ok(rpn)
}

struct ShuntingYard<'a> {
    engine: &'a Engine,
    output: Vec<Token>,
    operators: Vec<Token>,
    groups: Vec<Group>,
}

impl<'a> ShuntingYard<'a> {
    fn new(engine: &'a Engine, capacity: usize) -> Self {
        Self {
            engine,
            output: Vec::with_capacity(capacity),
            operators: Vec::new(),
            // The formula itself is the outermost group
            groups: vec![Group::new(0)],
        }
    }

    fn push(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::Number(_) => {
                self.output.push(token.clone());
                self.mark_value();
            }
            Token::UnaryOp(_) => self.operators.push(token.clone()),
            Token::BinaryOp(symbol) => self.push_binary(*symbol)?,
            Token::LeftParen => {
                self.operators.push(Token::LeftParen);
                self.groups.push(Group::new(self.operators.len()));
            }
            Token::RightParen => self.close_group()?,
            Token::Separator => self.separate()?,
            Token::Function { name, .. } => self.operators.push(Token::Function {
                name: name.clone(),
                arity: 0,
            }),
            Token::VectorMarker { .. } => {
                return Err(ExprError::InvalidEquation(
                    "vector marker in infix input".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn precedence_of(&self, token: &Token) -> Option<u8> {
        match token {
            Token::UnaryOp(_) => Some(UNARY_PRECEDENCE),
            Token::BinaryOp(symbol) => self.engine.operator(*symbol).map(|op| op.precedence),
            _ => None,
        }
    }

    fn push_binary(&mut self, symbol: char) -> Result<()> {
        let op = self
            .engine
            .operator(symbol)
            .filter(|op| op.binary.is_some())
            .ok_or(ExprError::InvalidOperator { symbol })?;

        while let Some(top) = self.operators.last() {
            let Some(top_precedence) = self.precedence_of(top) else {
                break;
            };
            let pops = match op.associativity {
                Associativity::Left => op.precedence <= top_precedence,
                Associativity::Right => op.precedence < top_precedence,
            };
            if !pops {
                break;
            }
            if let Some(top) = self.operators.pop() {
                self.output.push(top);
            }
        }
        self.operators.push(Token::BinaryOp(symbol));
        Ok(())
    }

    /// Emit every operator above `base`.
    fn drain_to(&mut self, base: usize) {
        while self.operators.len() > base {
            if let Some(top) = self.operators.pop() {
                self.output.push(top);
            }
        }
    }

    fn mark_value(&mut self) {
        if let Some(group) = self.groups.last_mut() {
            group.has_value = true;
        }
    }

    fn separate(&mut self) -> Result<()> {
        let group = match self.groups.last() {
            Some(group) if group.has_value => *group,
            _ => return Err(ExprError::MisplacedSeparator),
        };
        self.drain_to(group.base);
        if let Some(group) = self.groups.last_mut() {
            group.count += 1;
            group.has_value = false;
        }
        Ok(())
    }

    fn close_group(&mut self) -> Result<()> {
        // The outermost group has no parenthesis to close
        if self.groups.len() < 2 {
            return Err(ExprError::UnbalancedParenthesis);
        }
        let group = self.groups.pop().ok_or(ExprError::UnbalancedParenthesis)?;
        self.drain_to(group.base);
        match self.operators.pop() {
            Some(Token::LeftParen) => {}
            _ => return Err(ExprError::UnbalancedParenthesis),
        }

        let arity = group.arity();
        if let Some(Token::Function { .. }) = self.operators.last() {
            if let Some(Token::Function { name, .. }) = self.operators.pop() {
                self.output.push(Token::Function { name, arity });
            }
        } else if arity > 1 {
            self.output.push(Token::VectorMarker { arity });
        } else if arity == 0 {
            // `()` produces nothing
            return Ok(());
        }
        self.mark_value();
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Token>> {
        if self.groups.len() != 1 {
            return Err(ExprError::UnbalancedParenthesis);
        }
        while let Some(top) = self.operators.pop() {
            if matches!(top, Token::LeftParen | Token::RightParen) {
                return Err(ExprError::UnbalancedParenthesis);
            }
            self.output.push(top);
        }
        let arity = self.groups[0].arity();
        if arity > 1 {
            self.output.push(Token::VectorMarker { arity });
        }
        if self.output.is_empty() {
            return Err(ExprError::InvalidEquation(
                "expression produces no value".to_string(),
            ));
        }
        Ok(self.output)
    }
}
