use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use formula_rs::{CompiledExpression, Engine, adapt};
use glam::Vec3;

const FORMULAS: [&str; 4] = [
    "2 + 3 * 4",
    "2*sin(tau*0.25) + lerp(1, 2, 0.5)",
    "1, 0.5, red*0.2",
    "(random(-1, 1), max(speed, 2), -speed^2)",
];

fn create_bench_engine() -> Engine {
    let mut engine = Engine::with_seed(1);
    engine.set_variable("red", 0.2).unwrap();
    engine.set_variable("speed", 3.0).unwrap();
    engine
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_stages");
    let engine = create_bench_engine();

    for (index, formula) in FORMULAS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("tokenize", index), formula, |b, formula| {
            b.iter(|| engine.tokenize(black_box(formula)).unwrap())
        });

        let infix = engine.tokenize(formula).unwrap();
        group.bench_with_input(BenchmarkId::new("to_rpn", index), &infix, |b, infix| {
            b.iter(|| engine.to_rpn(black_box(infix)).unwrap())
        });

        let rpn = engine.to_rpn(&infix).unwrap();
        group.bench_with_input(BenchmarkId::new("evaluate", index), &rpn, |b, rpn| {
            let mut engine = create_bench_engine();
            b.iter(|| engine.evaluate(black_box(rpn)).unwrap())
        });
    }
    group.finish();
}

fn bench_interp_vs_compiled(c: &mut Criterion) {
    let mut group = c.benchmark_group("interp_vs_compiled");

    for (index, formula) in FORMULAS.iter().enumerate() {
        group.bench_with_input(BenchmarkId::new("interp", index), formula, |b, formula| {
            let mut engine = create_bench_engine();
            b.iter(|| engine.interp(black_box(formula)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("compiled", index), formula, |b, formula| {
            let mut engine = create_bench_engine();
            let compiled = CompiledExpression::compile(&engine, formula).unwrap();
            b.iter(|| compiled.eval(black_box(&mut engine)).unwrap())
        });
    }
    group.finish();
}

fn bench_adapt(c: &mut Criterion) {
    let mut engine = create_bench_engine();
    c.bench_function("adapt_vec3", |b| {
        b.iter(|| adapt::<Vec3>(&mut engine, black_box("speed, 0, -speed")).unwrap())
    });
}

criterion_group!(
    benches,
    bench_pipeline_stages,
    bench_interp_vs_compiled,
    bench_adapt
);
criterion_main!(benches);
