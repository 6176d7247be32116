//! Directional limit laws, pinned through the public engine API.

use liminal_ast::{Expr, ExprId, LimitSide, SymbolId, UnaryFn};
use liminal_engine::Engine;
use liminal_num::Numeric;

fn setup() -> (Engine, SymbolId, ExprId) {
    let mut eng = Engine::new();
    let sym = eng.context.sym("x");
    let x = eng.context.var_id(sym);
    (eng, sym, x)
}

#[test]
fn reciprocal_vanishes_toward_infinity() {
    let (mut eng, sym, x) = setup();
    let one = eng.context.num(1);
    let rec = eng.context.add(Expr::Div(one, x));
    let inf = eng.context.number(Numeric::pos_inf());
    let out = eng.limit(rec, sym, inf, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(out.expr, eng.context.num(0));
}

#[test]
fn rational_quotient_with_higher_numerator_degree_diverges() {
    // (x^2 + x) / (3x + 3) -> +oo by degree comparison
    let (mut eng, sym, x) = setup();
    let two = eng.context.num(2);
    let three = eng.context.num(3);
    let x2 = eng.context.add(Expr::Pow(x, two));
    let num = eng.context.add(Expr::Add(x2, x));
    let tx = eng.context.add(Expr::Mul(three, x));
    let den = eng.context.add(Expr::Add(tx, three));
    let q = eng.context.add(Expr::Div(num, den));
    let inf = eng.context.number(Numeric::pos_inf());
    let out = eng.limit(q, sym, inf, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(
        eng.context.as_number(out.expr),
        Some(&Numeric::pos_inf())
    );
}

#[test]
fn sine_over_its_argument_tends_to_one() {
    let (mut eng, sym, x) = setup();
    let sin = eng.context.func(UnaryFn::Sin, x);
    let q = eng.context.add(Expr::Div(sin, x));
    let zero = eng.context.num(0);
    let out = eng.limit(q, sym, zero, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(out.expr, eng.context.num(1));
}

#[test]
fn continuous_identity_agrees_from_both_sides() {
    let (mut eng, sym, x) = setup();
    let three = eng.context.num(3);
    for side in [LimitSide::Left, LimitSide::Right, LimitSide::Both] {
        let out = eng.limit(x, sym, three, side).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, three);
    }
}

#[test]
fn reciprocal_splits_at_the_origin() {
    let (mut eng, sym, x) = setup();
    let one = eng.context.num(1);
    let rec = eng.context.add(Expr::Div(one, x));
    let zero = eng.context.num(0);

    let left = eng.limit(rec, sym, zero, LimitSide::Left).unwrap();
    assert!(left.resolved);
    assert_eq!(
        eng.context.as_number(left.expr),
        Some(&Numeric::neg_inf())
    );

    let right = eng.limit(rec, sym, zero, LimitSide::Right).unwrap();
    assert!(right.resolved);
    assert_eq!(
        eng.context.as_number(right.expr),
        Some(&Numeric::pos_inf())
    );

    // differing one-sided limits collapse to NaN
    let both = eng.limit(rec, sym, zero, LimitSide::Both).unwrap();
    assert!(both.resolved);
    assert!(eng
        .context
        .as_number(both.expr)
        .is_some_and(Numeric::is_nan));
}

#[test]
fn negative_infinity_mirrors_the_approach() {
    // 1/x -> 0 from below as x -> -oo
    let (mut eng, sym, x) = setup();
    let one = eng.context.num(1);
    let rec = eng.context.add(Expr::Div(one, x));
    let ninf = eng.context.number(Numeric::neg_inf());
    let out = eng.limit(rec, sym, ninf, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(out.expr, eng.context.num(0));
}

#[test]
fn bounded_oscillation_is_crushed_by_a_vanishing_factor() {
    // sin(x) * (1/x) -> 0 as x -> +oo
    let (mut eng, sym, x) = setup();
    let sin = eng.context.func(UnaryFn::Sin, x);
    let one = eng.context.num(1);
    let rec = eng.context.add(Expr::Div(one, x));
    let prod = eng.context.add(Expr::Mul(sin, rec));
    let inf = eng.context.number(Numeric::pos_inf());
    let out = eng.limit(prod, sym, inf, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(out.expr, eng.context.num(0));
}

#[test]
fn unresolved_factors_are_retained_while_finite_limits_substitute() {
    // sin(x) * 2^(-x) at +oo: 2^(-x) -> 0 substitutes, sin(x) is kept,
    // and the partially substituted product folds to 0
    let (mut eng, sym, x) = setup();
    let sin = eng.context.func(UnaryFn::Sin, x);
    let two = eng.context.num(2);
    let neg = eng.context.add(Expr::Neg(x));
    let decay = eng.context.add(Expr::Pow(two, neg));
    let prod = eng.context.add(Expr::Mul(sin, decay));
    let inf = eng.context.number(Numeric::pos_inf());
    let out = eng.limit(prod, sym, inf, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(out.expr, eng.context.num(0));
}

#[test]
fn bounded_oscillation_stays_residual() {
    let (mut eng, sym, x) = setup();
    let sin = eng.context.func(UnaryFn::Sin, x);
    let inf = eng.context.number(Numeric::pos_inf());
    let out = eng.limit(sin, sym, inf, LimitSide::Both).unwrap();
    assert!(!out.resolved);
    match eng.context.get(out.expr) {
        Expr::Limit { expr, var, side, .. } => {
            assert_eq!(*expr, sin);
            assert_eq!(*var, sym);
            assert_eq!(*side, LimitSide::Both);
        }
        other => panic!("expected a residual limit node, got {other:?}"),
    }
}

#[test]
fn limit_markers_resolve_during_simplification() {
    let (mut eng, sym, x) = setup();
    let one = eng.context.num(1);
    let rec = eng.context.add(Expr::Div(one, x));
    let inf = eng.context.number(Numeric::pos_inf());
    let marker = eng.context.limit(rec, sym, inf, LimitSide::Both);
    let out = eng.simplify(marker);
    assert_eq!(out, eng.context.num(0));
}

#[test]
fn absolute_value_forwards_the_inner_limit() {
    let (mut eng, sym, x) = setup();
    let one = eng.context.num(1);
    let rec = eng.context.add(Expr::Div(one, x));
    let abs = eng.context.func(UnaryFn::Abs, rec);
    let zero = eng.context.num(0);
    let out = eng.limit(abs, sym, zero, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(
        eng.context.as_number(out.expr),
        Some(&Numeric::pos_inf())
    );
}

#[test]
fn expressions_free_of_the_variable_pass_through() {
    let (mut eng, sym, _x) = setup();
    let y = eng.context.var("y");
    let seven = eng.context.num(7);
    let sum = eng.context.add(Expr::Add(y, seven));
    let dest = eng.context.num(2);
    let out = eng.limit(sum, sym, dest, LimitSide::Both).unwrap();
    assert!(out.resolved);
    assert_eq!(out.expr, sum);
}
