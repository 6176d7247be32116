//! Canonical expression ordering for sort passes.
//!
//! The order is total and deterministic: variant rank first, then a
//! structural comparison within the variant. Numbers use the tower's
//! canonical order, which is value-based for finite reals and places the
//! sentinels at the ends.

use std::cmp::Ordering;

use crate::expression::{Constant, Context, Expr, ExprId, LimitSide, UnaryFn};

pub fn compare_expr(ctx: &Context, a: ExprId, b: ExprId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let ea = ctx.get(a);
    let eb = ctx.get(b);

    let rank_a = get_rank(ea);
    let rank_b = get_rank(eb);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    use Expr::*;
    match (ea, eb) {
        (Number(n1), Number(n2)) => n1.canonical_cmp(n2),
        (Constant(c1), Constant(c2)) => constant_rank(*c1).cmp(&constant_rank(*c2)),
        (Variable(v1), Variable(v2)) => v1.cmp(v2),
        (Func(f1, a1), Func(f2, a2)) => match fn_rank(*f1).cmp(&fn_rank(*f2)) {
            Ordering::Equal => compare_expr(ctx, *a1, *a2),
            ord => ord,
        },
        (Log(b1, x1), Log(b2, x2)) => compare_pair(ctx, (*b1, *x1), (*b2, *x2)),
        (Neg(e1), Neg(e2)) => compare_expr(ctx, *e1, *e2),
        (Pow(b1, e1), Pow(b2, e2)) => compare_pair(ctx, (*b1, *e1), (*b2, *e2)),
        (Add(l1, r1), Add(l2, r2))
        | (Sub(l1, r1), Sub(l2, r2))
        | (Mul(l1, r1), Mul(l2, r2))
        | (Div(l1, r1), Div(l2, r2)) => compare_pair(ctx, (*l1, *r1), (*l2, *r2)),
        (
            Derivative {
                expr: e1,
                var: v1,
                order: o1,
            },
            Derivative {
                expr: e2,
                var: v2,
                order: o2,
            },
        )
        | (
            Integral {
                expr: e1,
                var: v1,
                order: o1,
            },
            Integral {
                expr: e2,
                var: v2,
                order: o2,
            },
        ) => compare_expr(ctx, *e1, *e2)
            .then(v1.cmp(v2))
            .then(o1.cmp(o2)),
        (
            Limit {
                expr: e1,
                var: v1,
                destination: d1,
                side: s1,
            },
            Limit {
                expr: e2,
                var: v2,
                destination: d2,
                side: s2,
            },
        ) => compare_expr(ctx, *e1, *e2)
            .then(v1.cmp(v2))
            .then_with(|| compare_expr(ctx, *d1, *d2))
            .then(side_rank(*s1).cmp(&side_rank(*s2))),
        // ranks matched, so the variants match; nothing else is reachable
        _ => Ordering::Equal,
    }
}

fn compare_pair(ctx: &Context, a: (ExprId, ExprId), b: (ExprId, ExprId)) -> Ordering {
    match compare_expr(ctx, a.0, b.0) {
        Ordering::Equal => compare_expr(ctx, a.1, b.1),
        ord => ord,
    }
}

fn get_rank(expr: &Expr) -> u8 {
    use Expr::*;
    match expr {
        Number(_) => 0,
        Constant(_) => 1,
        Variable(_) => 2,
        Func(_, _) => 3,
        Log(_, _) => 4,
        Neg(_) => 5,
        Pow(_, _) => 6,
        Mul(_, _) => 7,
        Div(_, _) => 8,
        Add(_, _) => 9,
        Sub(_, _) => 10,
        Derivative { .. } => 11,
        Integral { .. } => 12,
        Limit { .. } => 13,
    }
}

fn constant_rank(c: Constant) -> u8 {
    match c {
        Constant::Pi => 0,
        Constant::E => 1,
    }
}

fn fn_rank(f: UnaryFn) -> u8 {
    use UnaryFn::*;
    match f {
        Sin => 0,
        Cos => 1,
        Tan => 2,
        Cotan => 3,
        Arcsin => 4,
        Arccos => 5,
        Arctan => 6,
        Arccotan => 7,
        Abs => 8,
        Signum => 9,
        Factorial => 10,
    }
}

fn side_rank(s: LimitSide) -> u8 {
    match s {
        LimitSide::Left => 0,
        LimitSide::Right => 1,
        LimitSide::Both => 2,
    }
}

/// How aggressively a sort pass reorders operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortLevel {
    /// Full canonical order.
    High,
    /// Symbolic terms first, numbers last, canonical within each group.
    Middle,
    /// Variant rank only; ties keep their current order.
    Low,
}

pub fn compare_with_level(ctx: &Context, a: ExprId, b: ExprId, level: SortLevel) -> Ordering {
    match level {
        SortLevel::High => compare_expr(ctx, a, b),
        SortLevel::Middle => {
            let num_a = matches!(ctx.get(a), Expr::Number(_));
            let num_b = matches!(ctx.get(b), Expr::Number(_));
            match (num_a, num_b) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => compare_expr(ctx, a, b),
            }
        }
        SortLevel::Low => get_rank(ctx.get(a)).cmp(&get_rank(ctx.get(b))),
    }
}
