//! Built-in operator and function rules.
//!
//! This module provides the rules behind the default operator table (`+ - * / ^`) and
//! the default function table (`sin`, `min`, `lerp`, `random`, ...). Function rules take
//! their arguments as a slice in left-to-right order together with the engine's random
//! generator, which only `random` uses.
//!
//! Math is done through the `libm` crate when the `libm` feature is enabled (the default),
//! otherwise through the standard library. The `f32` feature selects the single-precision
//! variants.

use rand::Rng;

use crate::Real;
use crate::types::FormulaRng;

#[cfg(all(feature = "libm", feature = "f32"))]
use libm::{
    acosf as libm_acos, asinf as libm_asin, atanf as libm_atan, ceilf as libm_ceil,
    cosf as libm_cos, fabsf as libm_abs, floorf as libm_floor, powf as libm_pow,
    sinf as libm_sin, tanf as libm_tan,
};

#[cfg(all(feature = "libm", not(feature = "f32")))]
use libm::{
    acos as libm_acos, asin as libm_asin, atan as libm_atan, ceil as libm_ceil, cos as libm_cos,
    fabs as libm_abs, floor as libm_floor, pow as libm_pow, sin as libm_sin, tan as libm_tan,
};

#[cfg(not(feature = "libm"))]
use self::std_math::*;

#[cfg(not(feature = "libm"))]
mod std_math {
    use crate::Real;

    pub fn libm_acos(a: Real) -> Real {
        a.acos()
    }
    pub fn libm_asin(a: Real) -> Real {
        a.asin()
    }
    pub fn libm_atan(a: Real) -> Real {
        a.atan()
    }
    pub fn libm_ceil(a: Real) -> Real {
        a.ceil()
    }
    pub fn libm_cos(a: Real) -> Real {
        a.cos()
    }
    pub fn libm_abs(a: Real) -> Real {
        a.abs()
    }
    pub fn libm_floor(a: Real) -> Real {
        a.floor()
    }
    pub fn libm_pow(a: Real, b: Real) -> Real {
        a.powf(b)
    }
    pub fn libm_sin(a: Real) -> Real {
        a.sin()
    }
    pub fn libm_tan(a: Real) -> Real {
        a.tan()
    }
}

// Operator rules

pub fn add(a: Real, b: Real) -> Real {
    a + b
}

pub fn sub(a: Real, b: Real) -> Real {
    a - b
}

pub fn mul(a: Real, b: Real) -> Real {
    a * b
}

/// Divides the first value by the second.
///
/// Division by zero follows IEEE 754: `x/0` is a signed infinity and `0/0` is NaN.
pub fn div(a: Real, b: Real) -> Real {
    a / b
}

/// Raises a value to a power.
///
/// `0^0` is 1 and a negative base with a non-integer exponent is NaN.
pub fn pow(a: Real, b: Real) -> Real {
    libm_pow(a, b)
}

pub fn neg(a: Real) -> Real {
    -a
}

pub fn pos(a: Real) -> Real {
    a
}

// Function rules
//
// Each rule indexes `args` directly and relies on the evaluator passing exactly the
// arity declared in the engine's function table.

pub(crate) fn sin(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_sin(args[0])
}

pub(crate) fn cos(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_cos(args[0])
}

pub(crate) fn tan(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_tan(args[0])
}

/// Arc sine, NaN outside `[-1, 1]`.
pub(crate) fn asin(args: &[Real], _: &mut FormulaRng) -> Real {
    if !(-1.0..=1.0).contains(&args[0]) {
        return Real::NAN;
    }
    libm_asin(args[0])
}

/// Arc cosine, NaN outside `[-1, 1]`.
pub(crate) fn acos(args: &[Real], _: &mut FormulaRng) -> Real {
    if !(-1.0..=1.0).contains(&args[0]) {
        return Real::NAN;
    }
    libm_acos(args[0])
}

pub(crate) fn atan(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_atan(args[0])
}

pub(crate) fn abs(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_abs(args[0])
}

pub(crate) fn ceil(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_ceil(args[0])
}

pub(crate) fn floor(args: &[Real], _: &mut FormulaRng) -> Real {
    libm_floor(args[0])
}

pub(crate) fn min(args: &[Real], _: &mut FormulaRng) -> Real {
    if args[0] < args[1] { args[0] } else { args[1] }
}

pub(crate) fn max(args: &[Real], _: &mut FormulaRng) -> Real {
    if args[0] > args[1] { args[0] } else { args[1] }
}

/// Uniform value in `[min, max)`.
///
/// The bounds may be given in either order; equal bounds return that bound.
pub(crate) fn random(args: &[Real], rng: &mut FormulaRng) -> Real {
    let (low, high) = (args[0], args[1]);
    let unit: Real = rng.r#gen();
    low + (high - low) * unit
}

/// Linear interpolation `a + (b - a) * t`, unclamped.
pub(crate) fn lerp(args: &[Real], _: &mut FormulaRng) -> Real {
    args[0] + (args[1] - args[0]) * args[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, constants};
    use rand::SeedableRng;

    fn rng() -> FormulaRng {
        FormulaRng::seed_from_u64(7)
    }

    #[test]
    fn test_operator_rules() {
        assert_eq!(add(2.0, 3.0), 5.0);
        assert_eq!(sub(2.0, 3.0), -1.0);
        assert_eq!(mul(2.0, 3.0), 6.0);
        assert_eq!(div(3.0, 2.0), 1.5);
        assert_eq!(neg(4.0), -4.0);
        assert_eq!(pos(4.0), 4.0);
        assert_approx_eq!(pow(2.0, 9.0), 512.0);
        assert_eq!(pow(0.0, 0.0), 1.0);
        assert!(pow(-8.0, 0.5).is_nan());
    }

    #[test]
    fn test_division_by_zero() {
        assert!(div(1.0, 0.0).is_infinite() && div(1.0, 0.0) > 0.0);
        assert!(div(-1.0, 0.0).is_infinite() && div(-1.0, 0.0) < 0.0);
        assert!(div(0.0, 0.0).is_nan());
    }

    #[test]
    fn test_trigonometry() {
        let mut rng = rng();
        assert_approx_eq!(sin(&[constants::PI / 2.0], &mut rng), 1.0);
        assert_approx_eq!(cos(&[0.0], &mut rng), 1.0);
        assert_approx_eq!(tan(&[0.0], &mut rng), 0.0);
        assert_approx_eq!(asin(&[1.0], &mut rng), constants::PI / 2.0);
        assert_approx_eq!(acos(&[1.0], &mut rng), 0.0);
        assert_approx_eq!(atan(&[1.0], &mut rng), constants::PI / 4.0);
        assert!(asin(&[2.0], &mut rng).is_nan());
        assert!(acos(&[-1.5], &mut rng).is_nan());
    }

    #[test]
    fn test_rounding_and_comparison() {
        let mut rng = rng();
        assert_eq!(abs(&[-2.5], &mut rng), 2.5);
        assert_eq!(ceil(&[1.2], &mut rng), 2.0);
        assert_eq!(floor(&[-1.2], &mut rng), -2.0);
        assert_eq!(min(&[1.0, 2.0], &mut rng), 1.0);
        assert_eq!(max(&[1.0, 2.0], &mut rng), 2.0);
        assert_eq!(lerp(&[0.0, 1.0, 0.5], &mut rng), 0.5);
        assert_eq!(lerp(&[2.0, 4.0, 2.0], &mut rng), 6.0);
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut rng = rng();
        for _ in 0..1000 {
            let value = random(&[-2.0, 3.0], &mut rng);
            assert!((-2.0..3.0).contains(&value));
            let reversed = random(&[3.0, -2.0], &mut rng);
            assert!(reversed > -2.0 && reversed <= 3.0);
        }
        assert_eq!(random(&[5.0, 5.0], &mut rng), 5.0);
    }
}
