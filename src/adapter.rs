//! Typed results.
//!
//! [`adapt`] runs a formula and shapes its components into the type the caller asked for:
//!
//! - a single component is broadcast into every component of the target
//! - three components requested as a [`Quat`] are Euler angles (X, Y, Z) in radians
//! - N components fill an N-wide target one for one
//! - anything else is `InvalidReturnType`
//!
//! The result arity is read off the compiled RPN before evaluation, so a formula of the
//! wrong shape is rejected without advancing the engine's random generator. A `String`
//! target skips evaluation and receives the formula text verbatim.

use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};
use tracing::debug;

use crate::Real;
use crate::engine::Engine;
use crate::error::{AdaptError, ExprError, Result};
use crate::expression::CompiledExpression;

/// A type a formula can be evaluated into.
pub trait FromFormula: Sized {
    /// Name used in `InvalidReturnType` errors.
    const NAME: &'static str;

    /// Whether a result of `arity` components can become `Self`.
    fn accepts(arity: usize) -> bool;

    /// Builds the value from evaluated components.
    fn from_components(components: &[Real]) -> Result<Self>;

    fn from_compiled(engine: &mut Engine, compiled: &CompiledExpression) -> Result<Self> {
        let arity = compiled.arity();
        if !Self::accepts(arity) {
            return Err(ExprError::InvalidReturnType {
                found: arity,
                expected: Self::NAME,
            });
        }
        let components = compiled.eval(engine)?;
        Self::from_components(&components)
    }

    fn from_formula(engine: &mut Engine, expression: &str) -> Result<Self> {
        let compiled = CompiledExpression::compile(engine, expression)?;
        Self::from_compiled(engine, &compiled)
    }
}

/// Evaluates `expression` into a `T`.
///
/// Any failure is reported as one [`AdaptError`] carrying the formula text.
///
/// # Examples
///
/// ```
/// use formula_rs::{Engine, adapt};
/// use glam::Vec3;
///
/// let mut engine = Engine::new();
/// let offset: Vec3 = adapt(&mut engine, "(1, 2, 3)").unwrap();
/// assert_eq!(offset, Vec3::new(1.0, 2.0, 3.0));
///
/// let err = adapt::<Vec3>(&mut engine, "(1, 2)").unwrap_err();
/// assert_eq!(err.expression, "(1, 2)");
/// ```
pub fn adapt<T: FromFormula>(
    engine: &mut Engine,
    expression: &str,
) -> core::result::Result<T, AdaptError> {
    T::from_formula(engine, expression).map_err(|err| {
        debug!(expression, error = %err, output = T::NAME, "unable to evaluate expression");
        AdaptError::new(expression, err)
    })
}

/// Spreads one component over `N`, or copies exactly `N`.
fn broadcast<const N: usize>(components: &[Real], name: &'static str) -> Result<[Real; N]> {
    match components {
        [single] => Ok([*single; N]),
        _ if components.len() == N => {
            let mut out = [0.0; N];
            out.copy_from_slice(components);
            Ok(out)
        }
        _ => Err(ExprError::InvalidReturnType {
            found: components.len(),
            expected: name,
        }),
    }
}

fn scalar(components: &[Real], name: &'static str) -> Result<Real> {
    match components {
        [value] => Ok(*value),
        _ => Err(ExprError::InvalidReturnType {
            found: components.len(),
            expected: name,
        }),
    }
}

// Integer targets truncate toward zero and saturate at their bounds (NaN becomes 0)
macro_rules! impl_from_formula_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromFormula for $ty {
                const NAME: &'static str = stringify!($ty);

                fn accepts(arity: usize) -> bool {
                    arity == 1
                }

                fn from_components(components: &[Real]) -> Result<Self> {
                    scalar(components, Self::NAME).map(|value| value as $ty)
                }
            }
        )*
    };
}

impl_from_formula_scalar!(f32, f64, i32, i64, u32, u64);

impl FromFormula for Vec2 {
    const NAME: &'static str = "Vec2";

    fn accepts(arity: usize) -> bool {
        arity == 1 || arity == 2
    }

    fn from_components(components: &[Real]) -> Result<Self> {
        let [x, y] = broadcast::<2>(components, Self::NAME)?;
        Ok(Vec2::new(x as f32, y as f32))
    }
}

impl FromFormula for Vec3 {
    const NAME: &'static str = "Vec3";

    fn accepts(arity: usize) -> bool {
        arity == 1 || arity == 3
    }

    fn from_components(components: &[Real]) -> Result<Self> {
        let [x, y, z] = broadcast::<3>(components, Self::NAME)?;
        Ok(Vec3::new(x as f32, y as f32, z as f32))
    }
}

impl FromFormula for Vec4 {
    const NAME: &'static str = "Vec4";

    fn accepts(arity: usize) -> bool {
        arity == 1 || arity == 4
    }

    fn from_components(components: &[Real]) -> Result<Self> {
        let [x, y, z, w] = broadcast::<4>(components, Self::NAME)?;
        Ok(Vec4::new(x as f32, y as f32, z as f32, w as f32))
    }
}

/// Three components are Euler angles applied in X, Y, Z order; four are `x, y, z, w`
/// taken as is. A single component fills all four.
impl FromFormula for Quat {
    const NAME: &'static str = "Quat";

    fn accepts(arity: usize) -> bool {
        matches!(arity, 1 | 3 | 4)
    }

    fn from_components(components: &[Real]) -> Result<Self> {
        match components {
            [x, y, z] => Ok(Quat::from_euler(
                EulerRot::XYZ,
                *x as f32,
                *y as f32,
                *z as f32,
            )),
            _ => {
                let [x, y, z, w] = broadcast::<4>(components, Self::NAME)?;
                Ok(Quat::from_xyzw(x as f32, y as f32, z as f32, w as f32))
            }
        }
    }
}

/// Strings are not evaluated: the formula text is the value.
impl FromFormula for String {
    const NAME: &'static str = "String";

    fn accepts(_: usize) -> bool {
        true
    }

    fn from_components(components: &[Real]) -> Result<Self> {
        Err(ExprError::InvalidReturnType {
            found: components.len(),
            expected: Self::NAME,
        })
    }

    fn from_compiled(_: &mut Engine, compiled: &CompiledExpression) -> Result<Self> {
        Ok(compiled.source().to_string())
    }

    fn from_formula(_: &mut Engine, expression: &str) -> Result<Self> {
        Ok(expression.to_string())
    }
}
