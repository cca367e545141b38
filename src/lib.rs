#![doc = r#"
# formula-rs

A small runtime formula engine for designer-authored values.

## Overview

formula-rs compiles a short formula string such as `2*sin(tau*0.25) + lerp(1,2,0.5)`
or `1,0.5,red*0.2` into a number or a fixed-size numeric tuple. It is meant to sit
anywhere a host application lets a designer type a value instead of a literal:
material properties, transform offsets, light colors.

The pipeline has three stages, each usable on its own:

- **Tokenizer** ([`lexer`]): string to infix tokens, with implicit multiplication
  (`2(3+4)`, `2pi`) and unary `+`/`-` disambiguation.
- **Compiler** ([`compiler`]): infix to Reverse Polish Notation with an extended
  shunting-yard algorithm that tracks the arity of every function call and of
  bare parenthesized tuples (`(1,2,3)`).
- **Evaluator** ([`evaluator`]): a stack machine over the RPN tokens.

On top of these, the [`adapter`] module turns a formula into a typed value
(`f32`, `i32`, `glam::Vec3`, `glam::Quat`, ...) by broadcasting scalars and
checking tuple widths.

## Quick Start

```rust
use formula_rs::Engine;

let mut engine = Engine::new();
let result = engine.interp("2 + 3 * 4").unwrap();
assert_eq!(result, vec![14.0]);

let result = engine.interp("(1, 2, 3)").unwrap();
assert_eq!(result, vec![1.0, 2.0, 3.0]);
```

## Typed Values

```rust
use formula_rs::{Engine, adapt};
use glam::{Quat, Vec3};

let mut engine = Engine::new();

// A scalar is broadcast to every component
let v: Vec3 = adapt(&mut engine, "0.5").unwrap();
assert_eq!(v, Vec3::splat(0.5));

// Three components requested as a quaternion are Euler angles (X, Y, Z)
let q: Quat = adapt(&mut engine, "0, tau/4, 0").unwrap();
assert!((q.length() - 1.0).abs() < 1e-5);
```

## Host Variables

```rust
use formula_rs::{Engine, adapt};
use glam::Vec3;

let mut engine = Engine::new();
engine.set_variable("red", 0.8).unwrap();

let color: Vec3 = adapt(&mut engine, "1, 0.5, red*0.5").unwrap();
assert!((color.z - 0.4).abs() < 1e-6);
```

## Caching

Formulas evaluated every frame can be compiled once:

```rust
use formula_rs::{CompiledExpression, Engine};

let mut engine = Engine::new();
let compiled = CompiledExpression::compile(&engine, "lerp(0, 10, 0.25)").unwrap();
assert_eq!(compiled.eval(&mut engine).unwrap(), vec![2.5]);
```

## Grammar

| Precedence | Operators  | Associativity |
|------------|------------|---------------|
| 2          | `+` `-`    | Left          |
| 3          | `*` `/`    | Left          |
| 4          | unary `+` `-` | Right      |
| 4          | `^`        | Right         |

Constants: `pi`, `tau`, `e`.

Functions: `sin`, `cos`, `tan`, `asin`, `acos`, `atan`, `abs`, `ceil`, `floor` (1 argument),
`min`, `max`, `random` (2 arguments), `lerp` (3 arguments).

## Thread Safety

An [`Engine`] owns a pseudo-random generator that `random(min, max)` advances, so every
evaluation takes `&mut Engine`. Give each thread its own engine or serialize access.
"#]

pub mod adapter;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod functions;
pub mod lexer;
pub mod types;

pub use adapter::{FromFormula, adapt};
pub use engine::*;
pub use error::{AdaptError, ExprError};
pub use expression::CompiledExpression;
pub use types::*;

/// Define the floating-point type based on feature flags
#[cfg(feature = "f32")]
pub type Real = f32;

#[cfg(not(feature = "f32"))]
pub type Real = f64;

pub mod constants {
    use super::Real;

    #[cfg(feature = "f32")]
    pub const PI: Real = core::f32::consts::PI;
    #[cfg(feature = "f32")]
    pub const TAU: Real = core::f32::consts::TAU;
    #[cfg(feature = "f32")]
    pub const E: Real = core::f32::consts::E;
    #[cfg(feature = "f32")]
    pub const TEST_PRECISION: Real = 1e-5;

    #[cfg(not(feature = "f32"))]
    pub const PI: Real = core::f64::consts::PI;
    #[cfg(not(feature = "f32"))]
    pub const TAU: Real = core::f64::consts::TAU;
    #[cfg(not(feature = "f32"))]
    pub const E: Real = core::f64::consts::E;
    #[cfg(not(feature = "f32"))]
    pub const TEST_PRECISION: Real = 1e-10;
}

/// Utility macro to check if two floating point values are approximately equal
/// within a specified epsilon. Supports optional format arguments like assert_eq!.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $crate::constants::TEST_PRECISION)
    };
    ($left:expr, $right:expr, $epsilon:expr $(,)?) => {{
        let left_val: $crate::Real = $left;
        let right_val: $crate::Real = $right;
        let eps: $crate::Real = $epsilon;
        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // Same-signed infinities are equal
        } else {
            assert!(
                (left_val - right_val).abs() < eps,
                "assertion failed: `(left ≈ right)` (left: `{}`, right: `{}`, epsilon: `{}`)",
                left_val,
                right_val,
                eps
            );
        }
    }};
    ($left:expr, $right:expr, $epsilon:expr, $fmt:expr, $($arg:tt)+) => {{
        let left_val: $crate::Real = $left;
        let right_val: $crate::Real = $right;
        let eps: $crate::Real = $epsilon;
        if left_val.is_nan() && right_val.is_nan() {
            // NaN == NaN for our purposes
        } else if left_val.is_infinite()
            && right_val.is_infinite()
            && left_val.signum() == right_val.signum()
        {
            // Same-signed infinities are equal
        } else {
            assert!((left_val - right_val).abs() < eps, $fmt, $($arg)+);
        }
    }};
}
