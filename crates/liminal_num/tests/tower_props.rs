use liminal_num::{NumContext, Numeric};
use proptest::prelude::*;
use std::cmp::Ordering;

fn ctx() -> NumContext {
    NumContext::default().with_precision(30)
}

fn arb_exact() -> impl Strategy<Value = Numeric> {
    prop_oneof![
        any::<i32>().prop_map(|n| Numeric::int(n as i64)),
        (any::<i32>(), 1i64..500).prop_map(|(p, q)| Numeric::rational(p as i64, q).unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_narrowing_is_idempotent(v in arb_exact()) {
        let c = ctx();
        let once = v.narrowed(&c);
        prop_assert_eq!(once.clone().narrowed(&c), once);
    }

    #[test]
    fn prop_addition_commutes(a in arb_exact(), b in arb_exact()) {
        let c = ctx();
        prop_assert_eq!(a.add(&b, &c), b.add(&a, &c));
    }

    #[test]
    fn prop_multiplication_commutes(a in arb_exact(), b in arb_exact()) {
        let c = ctx();
        prop_assert_eq!(a.mul(&b, &c), b.mul(&a, &c));
    }

    #[test]
    fn prop_mul_then_div_round_trips(a in arb_exact(), b in arb_exact()) {
        let c = ctx();
        prop_assume!(!b.is_zero());
        prop_assert_eq!(a.mul(&b, &c).div(&b, &c), a);
    }

    #[test]
    fn prop_division_by_zero_is_nan(a in arb_exact()) {
        let c = ctx();
        prop_assert!(a.div(&Numeric::int(0), &c).is_nan());
    }

    #[test]
    fn prop_subtracting_self_gives_zero(a in arb_exact()) {
        let c = ctx();
        prop_assert!(a.sub(&a, &c).is_zero());
    }

    #[test]
    fn prop_exact_closed_under_ring_ops(a in arb_exact(), b in arb_exact()) {
        let c = ctx();
        prop_assert!(a.add(&b, &c).is_exact());
        prop_assert!(a.sub(&b, &c).is_exact());
        prop_assert!(a.mul(&b, &c).is_exact());
        if !b.is_zero() {
            prop_assert!(a.div(&b, &c).is_exact());
        }
    }

    #[test]
    fn prop_negation_is_involutive(a in arb_exact()) {
        prop_assert_eq!(a.neg().neg(), a);
    }

    #[test]
    fn prop_abs_is_non_negative(a in arb_exact()) {
        let c = ctx();
        let s = a.abs(&c).sign();
        prop_assert!(s == Some(Ordering::Greater) || s == Some(Ordering::Equal));
    }

    #[test]
    fn prop_perfect_squares_root_exactly(n in 0i64..1000) {
        let c = ctx();
        let sq = Numeric::int(n).mul(&Numeric::int(n), &c);
        prop_assert_eq!(sq.sqrt(&c), Numeric::int(n));
    }

    #[test]
    fn prop_canonical_order_is_antisymmetric(a in arb_exact(), b in arb_exact()) {
        prop_assert_eq!(a.canonical_cmp(&b), b.canonical_cmp(&a).reverse());
    }

    #[test]
    fn prop_tolerant_equality_is_reflexive(a in arb_exact()) {
        let c = ctx();
        prop_assert!(a.approx_eq(&a, &c));
        let inexact = a.to_real_checked(&c).unwrap();
        prop_assert!(a.approx_eq(&Numeric::Real(inexact), &c));
    }
}
