//! Symbolic differentiation.
//!
//! [`differentiate`] builds the raw derivative without cleaning it up;
//! callers simplify the result. It is deliberately partial: shapes with no
//! useful derivative (signum, factorial, mixed partials) return `None`
//! instead of a wrong or needlessly weak answer.

use liminal_ast::{depends_on, Constant, Context, Expr, ExprId, SymbolId, UnaryFn};
use liminal_num::Numeric;

use crate::engine::Engine;

/// Derivative of `expr` with respect to `var`, or `None` when the shape is
/// not differentiable by this table.
pub fn differentiate(ctx: &mut Context, expr: ExprId, var: SymbolId) -> Option<ExprId> {
    match ctx.get(expr).clone() {
        // marker arms come first: a derivative marker binding `var` shadows
        // it, so the free-variable short-circuit below would misjudge them
        Expr::Derivative { expr: inner, var: v, order } if v == var => Some(ctx.add(
            Expr::Derivative { expr: inner, var, order: order.saturating_add(1) },
        )),
        Expr::Derivative { .. } => free_or_none(ctx, expr, var),
        Expr::Integral { expr: inner, var: v, order } if v == var => match order {
            0 => differentiate(ctx, inner, var),
            1 => Some(inner),
            n => Some(ctx.add(Expr::Integral { expr: inner, var, order: n - 1 })),
        },
        Expr::Integral { .. } => free_or_none(ctx, expr, var),
        Expr::Limit { .. } => free_or_none(ctx, expr, var),
        _ if !depends_on(ctx, expr, var) => Some(ctx.num(0)),
        Expr::Variable(_) => Some(ctx.num(1)),
        Expr::Number(_) | Expr::Constant(_) => Some(ctx.num(0)),
        Expr::Add(a, b) => {
            let (da, db) = (differentiate(ctx, a, var)?, differentiate(ctx, b, var)?);
            Some(ctx.add(Expr::Add(da, db)))
        }
        Expr::Sub(a, b) => {
            let (da, db) = (differentiate(ctx, a, var)?, differentiate(ctx, b, var)?);
            Some(ctx.add(Expr::Sub(da, db)))
        }
        Expr::Neg(a) => {
            let da = differentiate(ctx, a, var)?;
            Some(ctx.add(Expr::Neg(da)))
        }
        Expr::Mul(a, b) => {
            let (da, db) = (differentiate(ctx, a, var)?, differentiate(ctx, b, var)?);
            let left = ctx.add(Expr::Mul(da, b));
            let right = ctx.add(Expr::Mul(a, db));
            Some(ctx.add(Expr::Add(left, right)))
        }
        Expr::Div(a, b) => {
            let (da, db) = (differentiate(ctx, a, var)?, differentiate(ctx, b, var)?);
            let left = ctx.add(Expr::Mul(da, b));
            let right = ctx.add(Expr::Mul(a, db));
            let numerator = ctx.add(Expr::Sub(left, right));
            let two = ctx.num(2);
            let denominator = ctx.add(Expr::Pow(b, two));
            Some(ctx.add(Expr::Div(numerator, denominator)))
        }
        Expr::Pow(f, g) => {
            let f_free = !depends_on(ctx, f, var);
            let g_free = !depends_on(ctx, g, var);
            if g_free {
                // g * f^(g-1) * f'
                let df = differentiate(ctx, f, var)?;
                let one = ctx.num(1);
                let g1 = ctx.add(Expr::Sub(g, one));
                let pow = ctx.add(Expr::Pow(f, g1));
                let coef = ctx.add(Expr::Mul(g, pow));
                Some(ctx.add(Expr::Mul(coef, df)))
            } else if f_free {
                // f^g * ln(f) * g'
                let dg = differentiate(ctx, g, var)?;
                let lf = ln(ctx, f);
                let pow = ctx.add(Expr::Pow(f, g));
                let coef = ctx.add(Expr::Mul(pow, lf));
                Some(ctx.add(Expr::Mul(coef, dg)))
            } else {
                // f^g * (g' * ln(f) + g * f'/f)
                let df = differentiate(ctx, f, var)?;
                let dg = differentiate(ctx, g, var)?;
                let lf = ln(ctx, f);
                let left = ctx.add(Expr::Mul(dg, lf));
                let quotient = ctx.add(Expr::Div(df, f));
                let right = ctx.add(Expr::Mul(g, quotient));
                let inner = ctx.add(Expr::Add(left, right));
                let pow = ctx.add(Expr::Pow(f, g));
                Some(ctx.add(Expr::Mul(pow, inner)))
            }
        }
        Expr::Log(base, u) => {
            if depends_on(ctx, base, var) {
                return None;
            }
            let du = differentiate(ctx, u, var)?;
            if matches!(ctx.get(base), Expr::Constant(Constant::E)) {
                return Some(ctx.add(Expr::Div(du, u)));
            }
            let lb = ln(ctx, base);
            let den = ctx.add(Expr::Mul(u, lb));
            Some(ctx.add(Expr::Div(du, den)))
        }
        Expr::Func(f, u) => {
            let du = differentiate(ctx, u, var)?;
            match f {
                UnaryFn::Sin => {
                    let c = ctx.func(UnaryFn::Cos, u);
                    Some(ctx.add(Expr::Mul(c, du)))
                }
                UnaryFn::Cos => {
                    let s = ctx.func(UnaryFn::Sin, u);
                    let m = ctx.add(Expr::Mul(s, du));
                    Some(ctx.add(Expr::Neg(m)))
                }
                UnaryFn::Tan => {
                    let c = ctx.func(UnaryFn::Cos, u);
                    let two = ctx.num(2);
                    let den = ctx.add(Expr::Pow(c, two));
                    Some(ctx.add(Expr::Div(du, den)))
                }
                UnaryFn::Cotan => {
                    let s = ctx.func(UnaryFn::Sin, u);
                    let two = ctx.num(2);
                    let den = ctx.add(Expr::Pow(s, two));
                    let d = ctx.add(Expr::Div(du, den));
                    Some(ctx.add(Expr::Neg(d)))
                }
                UnaryFn::Arcsin | UnaryFn::Arccos => {
                    // u' / sqrt(1 - u^2), negated for arccos
                    let one = ctx.num(1);
                    let two = ctx.num(2);
                    let u2 = ctx.add(Expr::Pow(u, two));
                    let diff = ctx.add(Expr::Sub(one, u2));
                    let half = ctx.number(Numeric::rational(1, 2).ok()?);
                    let root = ctx.add(Expr::Pow(diff, half));
                    let d = ctx.add(Expr::Div(du, root));
                    if f == UnaryFn::Arcsin {
                        Some(d)
                    } else {
                        Some(ctx.add(Expr::Neg(d)))
                    }
                }
                UnaryFn::Arctan | UnaryFn::Arccotan => {
                    // u' / (1 + u^2), negated for arccotan
                    let one = ctx.num(1);
                    let two = ctx.num(2);
                    let u2 = ctx.add(Expr::Pow(u, two));
                    let den = ctx.add(Expr::Add(one, u2));
                    let d = ctx.add(Expr::Div(du, den));
                    if f == UnaryFn::Arctan {
                        Some(d)
                    } else {
                        Some(ctx.add(Expr::Neg(d)))
                    }
                }
                UnaryFn::Abs => {
                    let s = ctx.func(UnaryFn::Signum, u);
                    Some(ctx.add(Expr::Mul(s, du)))
                }
                UnaryFn::Signum | UnaryFn::Factorial => None,
            }
        }
    }
}

fn free_or_none(ctx: &mut Context, expr: ExprId, var: SymbolId) -> Option<ExprId> {
    if depends_on(ctx, expr, var) {
        None
    } else {
        Some(ctx.num(0))
    }
}

fn ln(ctx: &mut Context, u: ExprId) -> ExprId {
    let e = ctx.constant(Constant::E);
    ctx.add(Expr::Log(e, u))
}

impl Engine {
    /// Derivative of `expr` with respect to `var`, simplified.
    pub fn differentiate(&mut self, expr: ExprId, var: SymbolId) -> Option<ExprId> {
        self.resolve_derivative(expr, var, 1)
    }

    /// Resolves an order-`order` derivative, re-simplifying between steps.
    pub(crate) fn resolve_derivative(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        order: u32,
    ) -> Option<ExprId> {
        let mut cur = expr;
        for _ in 0..order {
            let d = differentiate(&mut self.context, cur, var)?;
            cur = self.inner_simplify(d);
        }
        Some(cur)
    }
}
