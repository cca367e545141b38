//! Typed results through `adapt` and `CompiledExpression::adapt`


use formula_rs::error::ExprError;
use formula_rs::{CompiledExpression, Engine, adapt};
use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};
use test_helpers::{capture_logs, create_test_engine};

#[test]
fn test_vectors_from_tuples() {
    let mut engine = create_test_engine();
    assert_eq!(adapt::<Vec2>(&mut engine, "1, 2").unwrap(), Vec2::new(1.0, 2.0));
    assert_eq!(
        adapt::<Vec3>(&mut engine, "(1, 2, 3)").unwrap(),
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert_eq!(
        adapt::<Vec4>(&mut engine, "1, 0.5, 0.25, speed").unwrap(),
        Vec4::new(1.0, 0.5, 0.25, 3.0)
    );
}

#[test]
fn test_scalar_broadcasts_into_vectors() {
    let mut engine = create_test_engine();
    assert_eq!(adapt::<Vec2>(&mut engine, "2").unwrap(), Vec2::splat(2.0));
    assert_eq!(adapt::<Vec3>(&mut engine, "speed").unwrap(), Vec3::splat(3.0));
    assert_eq!(adapt::<Vec4>(&mut engine, "(0.5)").unwrap(), Vec4::splat(0.5));
}

#[test]
fn test_vector_arity_mismatch() {
    let mut engine = create_test_engine();
    let cases: [(&str, usize, &'static str); 3] = [
        ("1, 2", 2, "Vec3"),
        ("1, 2, 3", 3, "Vec4"),
        ("1, 2, 3, 4", 4, "Vec2"),
    ];
    for (expression, found, expected) in cases {
        let err = match expected {
            "Vec2" => adapt::<Vec2>(&mut engine, expression).map(|_| ()),
            "Vec3" => adapt::<Vec3>(&mut engine, expression).map(|_| ()),
            _ => adapt::<Vec4>(&mut engine, expression).map(|_| ()),
        }
        .unwrap_err();
        assert_eq!(err.expression, expression);
        assert_eq!(err.source, ExprError::InvalidReturnType { found, expected });
    }
}

#[test]
fn test_quaternion_from_euler_angles() {
    let mut engine = create_test_engine();
    let rotation: Quat = adapt(&mut engine, "0, tau/4, 0").unwrap();
    let expected = Quat::from_euler(EulerRot::XYZ, 0.0, core::f32::consts::FRAC_PI_2, 0.0);
    assert!(
        rotation.abs_diff_eq(expected, 1e-6),
        "{:?} != {:?}",
        rotation,
        expected
    );

    let identity: Quat = adapt(&mut engine, "0, 0, 0").unwrap();
    assert!(identity.abs_diff_eq(Quat::IDENTITY, 1e-6));
}

#[test]
fn test_quaternion_from_components() {
    let mut engine = create_test_engine();
    let rotation: Quat = adapt(&mut engine, "0, 0, 0, 1").unwrap();
    assert_eq!(rotation, Quat::IDENTITY);

    let err = adapt::<Quat>(&mut engine, "0, 1").unwrap_err();
    assert_eq!(
        err.source,
        ExprError::InvalidReturnType {
            found: 2,
            expected: "Quat"
        }
    );
}

#[test]
fn test_integer_targets() {
    let mut engine = create_test_engine();
    assert_eq!(adapt::<i32>(&mut engine, "speed * 2.9").unwrap(), 8);
    assert_eq!(adapt::<i64>(&mut engine, "-2.5").unwrap(), -2);
    assert_eq!(adapt::<u32>(&mut engine, "floor(7.9)").unwrap(), 7);
    assert_eq!(adapt::<u32>(&mut engine, "-5").unwrap(), 0);
    assert_eq!(adapt::<i32>(&mut engine, "10^12").unwrap(), i32::MAX);
}

#[test]
fn test_string_passes_through() {
    let mut engine = create_test_engine();
    for expression in ["hello world", "1, 2, 3", "(unbalanced", ""] {
        assert_eq!(adapt::<String>(&mut engine, expression).unwrap(), expression);
    }
}

#[test]
fn test_errors_carry_expression_text() {
    let mut engine = create_test_engine();
    let err = adapt::<f64>(&mut engine, "min(1)").unwrap_err();
    assert_eq!(err.expression, "min(1)");
    assert!(matches!(
        err.source,
        ExprError::NotEnoughFunctionParameters { .. }
    ));
    let message = err.to_string();
    assert!(message.starts_with("Unable to evaluate expression 'min(1)'"), "{}", message);

    let err = adapt::<Vec3>(&mut engine, "1 +* 2").unwrap_err();
    assert_eq!(err.expression, "1 +* 2");
}

#[test]
fn test_compiled_adapt_reuses_rpn() {
    let mut engine = Engine::with_seed(3);
    let compiled = CompiledExpression::compile(&engine, "random(0, 1), 1, 0").unwrap();
    let first: Vec3 = compiled.adapt(&mut engine).unwrap();
    let second: Vec3 = compiled.adapt(&mut engine).unwrap();
    assert_eq!(first.y, 1.0);
    assert_eq!(second.z, 0.0);
    assert_ne!(first.x, second.x);

    engine.reseed(3);
    let replay: Vec3 = compiled.adapt(&mut engine).unwrap();
    assert_eq!(replay, first);
}

#[test]
fn test_rejections_log_at_debug_only() {
    let mut engine = create_test_engine();
    let quiet = capture_logs(tracing::Level::INFO, || {
        for _ in 0..3 {
            assert!(adapt::<Vec3>(&mut engine, "1, 2").is_err());
        }
    });
    assert!(quiet.is_empty(), "unexpected output: {}", quiet);

    let verbose = capture_logs(tracing::Level::DEBUG, || {
        assert!(adapt::<Vec3>(&mut engine, "1, 2").is_err());
    });
    assert!(verbose.contains("unable to evaluate expression"), "{}", verbose);
    assert!(verbose.contains("DEBUG"), "{}", verbose);
}
