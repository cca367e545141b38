use std::collections::BTreeMap;

use rand::SeedableRng;
use tracing::{debug, trace};

use crate::Real;
use crate::compiler::to_rpn;
use crate::error::{ExprError, Result};
use crate::evaluator::evaluate;
use crate::functions;
use crate::lexer::Lexer;
use crate::types::{
    Associativity, FormulaRng, FunctionDescriptor, OperatorDescriptor, Token,
};

/// Seed used by [`Engine::new`].
pub const DEFAULT_SEED: u32 = 5489;

/// Formula engine: the variable, operator and function tables plus the random generator
/// behind `random(min, max)`.
///
/// An engine is created once and reused for every formula. Tokenizing and compiling only
/// read it; evaluating takes `&mut self` because `random` advances the generator. The
/// engine holds no lock, so concurrent evaluation needs one engine per thread or external
/// serialization.
///
/// # Examples
///
/// ```
/// use formula_rs::Engine;
///
/// let mut engine = Engine::with_seed(42);
/// engine.set_variable("speed", 2.0).unwrap();
///
/// let result = engine.interp("speed * max(1, 3)").unwrap();
/// assert_eq!(result, vec![6.0]);
/// ```
#[derive(Clone)]
pub struct Engine {
    /// Named values substituted during tokenization
    variables: BTreeMap<String, Real>,
    operators: BTreeMap<char, OperatorDescriptor>,
    functions: BTreeMap<&'static str, FunctionDescriptor>,
    rng: FormulaRng,
    seed: u32,
}

impl Engine {
    /// Creates an engine with the built-in tables, seeded with [`DEFAULT_SEED`].
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Creates an engine with the built-in tables and a specific seed.
    pub fn with_seed(seed: u32) -> Self {
        let mut engine = Self {
            variables: BTreeMap::new(),
            operators: BTreeMap::new(),
            functions: BTreeMap::new(),
            rng: FormulaRng::seed_from_u64(u64::from(seed)),
            seed,
        };
        engine.register_default_constants();
        engine.register_default_operators();
        engine.register_default_functions();
        engine
    }

    fn register_default_constants(&mut self) {
        self.variables.insert("pi".to_string(), crate::constants::PI);
        self.variables.insert("tau".to_string(), crate::constants::TAU);
        self.variables.insert("e".to_string(), crate::constants::E);
    }

    fn register_default_operators(&mut self) {
        use Associativity::{Left, Right};

        self.operators.insert(
            '+',
            OperatorDescriptor::binary(2, Left, functions::add).with_unary(functions::pos),
        );
        self.operators.insert(
            '-',
            OperatorDescriptor::binary(2, Left, functions::sub).with_unary(functions::neg),
        );
        self.operators
            .insert('*', OperatorDescriptor::binary(3, Left, functions::mul));
        self.operators
            .insert('/', OperatorDescriptor::binary(3, Left, functions::div));
        self.operators
            .insert('^', OperatorDescriptor::binary(4, Right, functions::pow));
    }

    fn register_default_functions(&mut self) {
        let table: [(&'static str, usize, crate::types::FunctionRule); 13] = [
            ("sin", 1, functions::sin),
            ("cos", 1, functions::cos),
            ("tan", 1, functions::tan),
            ("asin", 1, functions::asin),
            ("acos", 1, functions::acos),
            ("atan", 1, functions::atan),
            ("abs", 1, functions::abs),
            ("ceil", 1, functions::ceil),
            ("floor", 1, functions::floor),
            ("min", 2, functions::min),
            ("max", 2, functions::max),
            ("random", 2, functions::random),
            ("lerp", 3, functions::lerp),
        ];
        for (name, arity, rule) in table {
            self.functions
                .insert(name, FunctionDescriptor { arity, rule });
        }
    }

    /// Restarts the random sequence used by `random(min, max)`.
    ///
    /// Reseeding with the same value makes subsequent evaluations repeat the same values.
    pub fn reseed(&mut self, seed: u32) {
        trace!(seed, "reseeding formula rng");
        self.rng = FormulaRng::seed_from_u64(u64::from(seed));
        self.seed = seed;
    }

    /// The seed the generator was last (re)started with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Sets a named value that formulas can refer to.
    ///
    /// Names must consist of letters only. Variables are resolved when a formula is
    /// tokenized, so a [`CompiledExpression`](crate::CompiledExpression) keeps the value it
    /// was compiled with until it is refreshed. A variable shadows a function of the same
    /// name.
    ///
    /// Returns the previous value of the variable, if it existed.
    pub fn set_variable(&mut self, name: &str, value: Real) -> Result<Option<Real>> {
        if name.is_empty() || !name.chars().all(char::is_alphabetic) {
            return Err(ExprError::InvalidVariableName {
                name: name.to_string(),
            });
        }
        Ok(self.variables.insert(name.to_string(), value))
    }

    /// Removes a named value, returning it if it existed.
    pub fn remove_variable(&mut self, name: &str) -> Option<Real> {
        self.variables.remove(name)
    }

    pub fn variable(&self, name: &str) -> Option<Real> {
        self.variables.get(name).copied()
    }

    pub fn operator(&self, symbol: char) -> Option<&OperatorDescriptor> {
        self.operators.get(&symbol)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name)
    }

    pub(crate) fn rng_mut(&mut self) -> &mut FormulaRng {
        &mut self.rng
    }

    /// Turns a formula into infix tokens.
    pub fn tokenize(&self, expression: &str) -> Result<Vec<Token>> {
        Lexer::new(expression, self).tokenize()
    }

    /// Converts infix tokens into Reverse Polish Notation.
    pub fn to_rpn(&self, infix: &[Token]) -> Result<Vec<Token>> {
        to_rpn(self, infix)
    }

    /// Evaluates RPN tokens, returning one value per result component.
    pub fn evaluate(&mut self, rpn: &[Token]) -> Result<Vec<Real>> {
        evaluate(self, rpn)
    }

    /// Tokenizes, compiles and evaluates a formula in one go.
    pub fn interp(&mut self, expression: &str) -> Result<Vec<Real>> {
        let infix = self.tokenize(expression)?;
        let rpn = self.to_rpn(&infix)?;
        let result = self.evaluate(&rpn)?;
        debug!(expression, components = result.len(), "evaluated formula");
        Ok(result)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("variables", &self.variables)
            .field("operators", &self.operators.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("seed", &self.seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, constants};

    #[test]
    fn test_default_tables() {
        let engine = Engine::new();
        assert_eq!(engine.variable("pi"), Some(constants::PI));
        assert_eq!(engine.variable("tau"), Some(constants::TAU));
        assert_eq!(engine.variable("e"), Some(constants::E));

        let pow = engine.operator('^').unwrap();
        assert_eq!(pow.precedence, 4);
        assert_eq!(pow.associativity, Associativity::Right);
        assert!(pow.unary.is_none());
        assert!(engine.operator('-').unwrap().unary.is_some());
        assert!(engine.operator('%').is_none());

        assert_eq!(engine.function("sin").unwrap().arity, 1);
        assert_eq!(engine.function("random").unwrap().arity, 2);
        assert_eq!(engine.function("lerp").unwrap().arity, 3);
        assert!(engine.function("sqrt").is_none());
    }

    #[test]
    fn test_interp_basic() {
        let mut engine = Engine::new();
        assert_eq!(engine.interp("2+3*4").unwrap(), vec![14.0]);
        assert_approx_eq!(engine.interp("2*sin(tau*0.25) + lerp(1,2,0.5)").unwrap()[0], 3.5);
    }

    #[test]
    fn test_set_variable() {
        let mut engine = Engine::new();
        assert_eq!(engine.set_variable("red", 0.5).unwrap(), None);
        assert_eq!(engine.set_variable("red", 0.75).unwrap(), Some(0.5));
        assert_eq!(engine.interp("red*2").unwrap(), vec![1.5]);

        assert_eq!(engine.remove_variable("red"), Some(0.75));
        assert!(matches!(
            engine.interp("red"),
            Err(ExprError::UnknownToken { .. })
        ));
    }

    #[test]
    fn test_set_variable_rejects_bad_names() {
        let mut engine = Engine::new();
        for name in ["", "x1", "my_var", "a b"] {
            match engine.set_variable(name, 1.0) {
                Err(ExprError::InvalidVariableName { name: bad }) => assert_eq!(bad, name),
                other => panic!("Expected InvalidVariableName for '{}', got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_variable_shadows_function() {
        let mut engine = Engine::new();
        engine.set_variable("min", 3.0).unwrap();
        assert_eq!(engine.interp("min*2").unwrap(), vec![6.0]);
    }

    #[test]
    fn test_reseed_repeats_sequence() {
        let mut engine = Engine::with_seed(1);
        let first = engine.interp("random(0,1)").unwrap();
        let second = engine.interp("random(0,1)").unwrap();
        assert_ne!(first, second);

        engine.reseed(1);
        assert_eq!(engine.seed(), 1);
        assert_eq!(engine.interp("random(0,1)").unwrap(), first);
        assert_eq!(engine.interp("random(0,1)").unwrap(), second);
    }
}
