//! Property tests for the simplification and evaluation contracts.

use liminal_ast::{Expr, ExprId};
use liminal_engine::Engine;
use liminal_num::Numeric;
use proptest::prelude::*;

/// Context-free expression template; materialized into an [`Engine`]'s
/// arena per test case.
#[derive(Debug, Clone)]
enum Template {
    Int(i32),
    Rational(i32, u8),
    Var,
    Add(Box<Template>, Box<Template>),
    Sub(Box<Template>, Box<Template>),
    Mul(Box<Template>, Box<Template>),
    Div(Box<Template>, Box<Template>),
    Neg(Box<Template>),
    Pow(Box<Template>, u8),
}

fn arb_template() -> impl Strategy<Value = Template> {
    let leaf = prop_oneof![
        (-50i32..50).prop_map(Template::Int),
        ((-20i32..20), (1u8..9)).prop_map(|(p, q)| Template::Rational(p, q)),
        Just(Template::Var),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Template::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Template::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Template::Mul(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Template::Div(Box::new(a), Box::new(b))),
            inner.clone().prop_map(|a| Template::Neg(Box::new(a))),
            (inner, 0u8..4).prop_map(|(a, e)| Template::Pow(Box::new(a), e)),
        ]
    })
}

fn build(eng: &mut Engine, t: &Template) -> ExprId {
    match t {
        Template::Int(n) => eng.context.num(*n as i64),
        Template::Rational(p, q) => {
            let v = Numeric::rational(*p as i64, *q as i64).expect("nonzero denominator");
            eng.context.number(v)
        }
        Template::Var => eng.context.var("x"),
        Template::Add(a, b) => {
            let (a, b) = (build(eng, a), build(eng, b));
            eng.context.add(Expr::Add(a, b))
        }
        Template::Sub(a, b) => {
            let (a, b) = (build(eng, a), build(eng, b));
            eng.context.add(Expr::Sub(a, b))
        }
        Template::Mul(a, b) => {
            let (a, b) = (build(eng, a), build(eng, b));
            eng.context.add(Expr::Mul(a, b))
        }
        Template::Div(a, b) => {
            let (a, b) = (build(eng, a), build(eng, b));
            eng.context.add(Expr::Div(a, b))
        }
        Template::Neg(a) => {
            let a = build(eng, a);
            eng.context.add(Expr::Neg(a))
        }
        Template::Pow(a, e) => {
            let a = build(eng, a);
            let e = eng.context.num(*e as i64);
            eng.context.add(Expr::Pow(a, e))
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_simplify_is_idempotent(t in arb_template()) {
        let mut eng = Engine::new();
        let e = build(&mut eng, &t);
        let once = eng.simplify(e);
        let twice = eng.simplify(once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_simplify_never_worsens_the_score(t in arb_template()) {
        let mut eng = Engine::new();
        let e = build(&mut eng, &t);
        let baseline = eng.inner_simplify(e);
        let best = eng.simplify(e);
        prop_assert!(eng.score(best) <= eng.score(baseline));
    }

    #[test]
    fn prop_adding_zero_changes_nothing(t in arb_template()) {
        let mut eng = Engine::new();
        let e = build(&mut eng, &t);
        let zero = eng.context.num(0);
        let padded = eng.context.add(Expr::Add(e, zero));
        let s1 = eng.simplify(padded);
        let s2 = eng.simplify(e);
        prop_assert_eq!(s1, s2);
    }

    #[test]
    fn prop_multiplying_by_one_changes_nothing(t in arb_template()) {
        let mut eng = Engine::new();
        let e = build(&mut eng, &t);
        let one = eng.context.num(1);
        let scaled = eng.context.add(Expr::Mul(e, one));
        let s1 = eng.simplify(scaled);
        let s2 = eng.simplify(e);
        prop_assert_eq!(s1, s2);
    }

    #[test]
    fn prop_inner_eval_is_total(t in arb_template()) {
        // evaluation over the tower is total: division by zero folds to
        // NaN instead of panicking, and symbolic residue is fine
        let mut eng = Engine::new();
        let e = build(&mut eng, &t);
        let _ = eng.inner_eval(e);
    }

    #[test]
    fn prop_variable_free_trees_fold_to_literals(t in arb_template()) {
        let mut eng = Engine::new();
        let e = build(&mut eng, &t);
        if liminal_ast::collect_variables(&eng.context, e).is_empty() {
            let r = eng.inner_eval(e);
            prop_assert!(eng.context.as_number(r).is_some());
        }
    }
}
