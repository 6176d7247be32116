use criterion::{criterion_group, criterion_main, Criterion};
use liminal_ast::{Expr, LimitSide, UnaryFn};
use liminal_engine::Engine;
use liminal_num::Numeric;
use std::hint::black_box;

fn benchmark_polynomial(c: &mut Criterion) {
    let mut group = c.benchmark_group("polynomial");

    group.bench_function("combine_like_terms_20", |b| {
        b.iter(|| {
            // x + 2x + 3x + ... + 20x
            let mut eng = Engine::new();
            let x = eng.context.var("x");
            let mut sum = x;
            for i in 2..=20 {
                let k = eng.context.num(i);
                let term = eng.context.add(Expr::Mul(k, x));
                sum = eng.context.add(Expr::Add(sum, term));
            }
            black_box(eng.simplify(sum));
        })
    });

    group.bench_function("quotient_long_division", |b| {
        b.iter(|| {
            // (x^2 + 3x + 2) / (x + 1)
            let mut eng = Engine::new();
            let x = eng.context.var("x");
            let one = eng.context.num(1);
            let two = eng.context.num(2);
            let three = eng.context.num(3);
            let x2 = eng.context.add(Expr::Pow(x, two));
            let tx = eng.context.add(Expr::Mul(three, x));
            let s = eng.context.add(Expr::Add(x2, tx));
            let num = eng.context.add(Expr::Add(s, two));
            let den = eng.context.add(Expr::Add(x, one));
            let q = eng.context.add(Expr::Div(num, den));
            black_box(eng.simplify(q));
        })
    });

    group.finish();
}

fn benchmark_trigonometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("trigonometry");
    group.sample_size(20);

    group.bench_function("pythagorean_chain_5", |b| {
        b.iter(|| {
            // sin^2(x) + cos^2(x) + sin^2(2x) + cos^2(2x) + ...
            let mut eng = Engine::new();
            let x = eng.context.var("x");
            let two = eng.context.num(2);
            let mut sum = None;
            for i in 1..=5 {
                let k = eng.context.num(i);
                let angle = eng.context.add(Expr::Mul(k, x));
                let sin = eng.context.func(UnaryFn::Sin, angle);
                let cos = eng.context.func(UnaryFn::Cos, angle);
                let s2 = eng.context.add(Expr::Pow(sin, two));
                let c2 = eng.context.add(Expr::Pow(cos, two));
                let pair = eng.context.add(Expr::Add(s2, c2));
                sum = Some(match sum {
                    None => pair,
                    Some(acc) => eng.context.add(Expr::Add(acc, pair)),
                });
            }
            black_box(eng.simplify(sum.unwrap()));
        })
    });

    group.finish();
}

fn benchmark_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("limits");

    group.bench_function("rational_degree_comparison", |b| {
        b.iter(|| {
            // lim (x^2 + x) / (3x + 3) as x -> +oo
            let mut eng = Engine::new();
            let sym = eng.context.sym("x");
            let x = eng.context.var_id(sym);
            let two = eng.context.num(2);
            let three = eng.context.num(3);
            let x2 = eng.context.add(Expr::Pow(x, two));
            let num = eng.context.add(Expr::Add(x2, x));
            let tx = eng.context.add(Expr::Mul(three, x));
            let den = eng.context.add(Expr::Add(tx, three));
            let q = eng.context.add(Expr::Div(num, den));
            let inf = eng.context.number(Numeric::pos_inf());
            black_box(eng.limit(q, sym, inf, LimitSide::Both).unwrap());
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_polynomial,
    benchmark_trigonometry,
    benchmark_limits
);
criterion_main!(benches);
