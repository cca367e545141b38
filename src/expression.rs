//! Compiled formulas for repeated evaluation.
//!
//! A host that evaluates the same formula every frame can compile it once and keep the
//! result. The infix form is kept alongside the RPN so the formula can be re-derived, and
//! the source text so it can be re-tokenized when host variables change.

use tracing::debug;

use crate::Real;
use crate::adapter::FromFormula;
use crate::engine::Engine;
use crate::error::{AdaptError, Result};
use crate::evaluator::{evaluate, result_arity};
use crate::types::{Token, format_tokens};

/// A formula compiled to RPN.
///
/// Variables are substituted at compile time, so after [`Engine::set_variable`] call
/// [`refresh`](Self::refresh) to pick up new values.
///
/// # Example
///
/// ```
/// use formula_rs::{CompiledExpression, Engine};
///
/// let mut engine = Engine::new();
/// engine.set_variable("speed", 2.0).unwrap();
///
/// let mut compiled = CompiledExpression::compile(&engine, "speed * 3").unwrap();
/// assert_eq!(compiled.eval(&mut engine).unwrap(), vec![6.0]);
///
/// engine.set_variable("speed", 4.0).unwrap();
/// compiled.refresh(&engine).unwrap();
/// assert_eq!(compiled.eval(&mut engine).unwrap(), vec![12.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    infix: Vec<Token>,
    rpn: Vec<Token>,
}

impl CompiledExpression {
    /// Tokenize and compile a formula.
    pub fn compile(engine: &Engine, source: &str) -> Result<Self> {
        let infix = engine.tokenize(source)?;
        let rpn = engine.to_rpn(&infix)?;
        debug!(source, rpn = %format_tokens(&rpn), "compiled expression");
        Ok(Self {
            source: source.to_string(),
            infix,
            rpn,
        })
    }

    /// Re-tokenize the source against the engine's current variables.
    pub fn refresh(&mut self, engine: &Engine) -> Result<()> {
        *self = Self::compile(engine, &self.source)?;
        Ok(())
    }

    /// Re-derive the RPN from the stored infix tokens.
    pub fn recompile(&mut self, engine: &Engine) -> Result<()> {
        self.rpn = engine.to_rpn(&self.infix)?;
        Ok(())
    }

    pub fn eval(&self, engine: &mut Engine) -> Result<Vec<Real>> {
        evaluate(engine, &self.rpn)
    }

    /// Evaluate into a typed value, see [`adapt`](crate::adapt).
    pub fn adapt<T: FromFormula>(
        &self,
        engine: &mut Engine,
    ) -> core::result::Result<T, AdaptError> {
        T::from_compiled(engine, self).map_err(|err| AdaptError::new(self.source.as_str(), err))
    }

    /// Number of components the formula evaluates to.
    pub fn arity(&self) -> usize {
        result_arity(&self.rpn)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn infix(&self) -> &[Token] {
        &self.infix
    }

    pub fn rpn(&self) -> &[Token] {
        &self.rpn
    }
}
