//! RPN stack machine.
//!
//! Walks an RPN sequence once, left to right, keeping a stack of [`Value`]s. Operators and
//! functions only accept scalars; a tuple can only be built by a `VectorMarker` and must be
//! the final result.

use heapless::Vec as ArgVec;
use tracing::debug;

use crate::Real;
use crate::engine::Engine;
use crate::error::{ExprError, Result};
use crate::types::{MAX_FUNCTION_ARITY, Token};

/// A value on the evaluation stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Real),
    /// Components packed by a `VectorMarker`, in source order.
    Tuple(Vec<Real>),
}

impl Value {
    /// Number of components.
    pub fn arity(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Tuple(components) => components.len(),
        }
    }

    pub fn into_components(self) -> Vec<Real> {
        match self {
            Value::Scalar(value) => vec![value],
            Value::Tuple(components) => components,
        }
    }
}

/// The evaluation stack, with checked pops.
#[derive(Debug, Default)]
struct ValueStack {
    values: Vec<Value>,
}

impl ValueStack {
    fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn pop_scalar(&mut self) -> Result<Real> {
        match self.values.pop() {
            Some(Value::Scalar(value)) => Ok(value),
            Some(Value::Tuple(components)) => Err(ExprError::InvalidOperand(format!(
                "a {}-component tuple cannot be used as an operand",
                components.len()
            ))),
            None => Err(ExprError::InvalidOperand("missing operand".to_string())),
        }
    }
}

/// Evaluates an RPN sequence produced by [`to_rpn`](crate::compiler::to_rpn).
///
/// Returns the components of the single remaining value: one for a scalar, N for a tuple.
///
/// # Errors
///
/// - `InvalidEquation` for empty input, parentheses or separators in the input, or when
///   anything other than exactly one value remains
/// - `InvalidOperand` for missing operands or a tuple used as an operand
/// - `InvalidOperator` / `InvalidFunction` for symbols missing from the engine's tables
/// - `NotEnoughFunctionParameters` / `InvalidFunctionParameters` for arity mismatches
pub fn evaluate(engine: &mut Engine, rpn: &[Token]) -> Result<Vec<Real>> {
    if rpn.is_empty() {
        return Err(ExprError::InvalidEquation("empty expression".to_string()));
    }

    let mut stack = ValueStack::default();
    for token in rpn {
        match token {
            Token::Number(value) => stack.push(Value::Scalar(*value)),
            Token::UnaryOp(symbol) => {
                let rule = engine
                    .operator(*symbol)
                    .and_then(|op| op.unary)
                    .ok_or(ExprError::InvalidOperator { symbol: *symbol })?;
                let operand = stack.pop_scalar()?;
                stack.push(Value::Scalar(rule(operand)));
            }
            Token::BinaryOp(symbol) => {
                let rule = engine
                    .operator(*symbol)
                    .and_then(|op| op.binary)
                    .ok_or(ExprError::InvalidOperator { symbol: *symbol })?;
                let right = stack.pop_scalar()?;
                let left = stack.pop_scalar()?;
                stack.push(Value::Scalar(rule(left, right)));
            }
            Token::Function { name, arity } => {
                let result = call_function(engine, &mut stack, name, *arity)?;
                stack.push(Value::Scalar(result));
            }
            Token::VectorMarker { arity } => {
                if stack.len() < *arity {
                    return Err(ExprError::InvalidOperand(format!(
                        "tuple of {} components has only {} values",
                        arity,
                        stack.len()
                    )));
                }
                let mut components = Vec::with_capacity(*arity);
                for _ in 0..*arity {
                    components.push(stack.pop_scalar()?);
                }
                components.reverse();
                stack.push(Value::Tuple(components));
            }
            Token::LeftParen | Token::RightParen | Token::Separator => {
                return Err(ExprError::InvalidEquation(format!(
                    "'{}' cannot appear in RPN",
                    token
                )));
            }
        }
    }

    if stack.len() != 1 {
        return Err(ExprError::InvalidEquation(format!(
            "expected a single result, found {} values",
            stack.len()
        )));
    }
    let result = stack
        .values
        .pop()
        .map(Value::into_components)
        .ok_or_else(|| ExprError::InvalidEquation("no result".to_string()))?;
    debug!(components = result.len(), "evaluated rpn");
    Ok(result)
}

fn call_function(
    engine: &mut Engine,
    stack: &mut ValueStack,
    name: &str,
    arity: usize,
) -> Result<Real> {
    let descriptor = *engine.function(name).ok_or_else(|| ExprError::InvalidFunction {
        name: name.to_string(),
    })?;

    if arity < descriptor.arity {
        return Err(ExprError::NotEnoughFunctionParameters {
            name: name.to_string(),
            expected: descriptor.arity,
            found: arity,
        });
    }
    if arity > descriptor.arity || arity > MAX_FUNCTION_ARITY {
        return Err(ExprError::InvalidFunctionParameters {
            name: name.to_string(),
            expected: descriptor.arity,
            found: arity,
        });
    }
    if stack.len() < arity {
        return Err(ExprError::NotEnoughFunctionParameters {
            name: name.to_string(),
            expected: descriptor.arity,
            found: stack.len(),
        });
    }

    // Popped right to left, handed to the rule left to right
    let mut args: ArgVec<Real, MAX_FUNCTION_ARITY> = ArgVec::new();
    for _ in 0..arity {
        let value = stack.pop_scalar()?;
        args.push(value)
            .map_err(|_| ExprError::InvalidFunctionParameters {
                name: name.to_string(),
                expected: descriptor.arity,
                found: arity,
            })?;
    }
    args.reverse();
    Ok((descriptor.rule)(&args, engine.rng_mut()))
}

/// Number of components an RPN sequence evaluates to, without evaluating it.
///
/// The last token produces the final value, so this is the arity of a trailing
/// `VectorMarker` and 1 for anything else.
pub fn result_arity(rpn: &[Token]) -> usize {
    match rpn.last() {
        Some(Token::VectorMarker { arity }) => *arity,
        Some(_) => 1,
        None => 0,
    }
}
