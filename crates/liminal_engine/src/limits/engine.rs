//! Destination handling and structural propagation.

use std::cmp::Ordering;

use liminal_ast::{depends_on, substitute_var, Expr, ExprId, LimitSide, SymbolId, UnaryFn};
use liminal_num::Numeric;
use tracing::debug;

use crate::engine::Engine;
use crate::error::EngineError;

/// Simplification of a limit body may meet further limit markers; past
/// this nesting depth they stay symbolic.
const MAX_LIMIT_REENTRY: usize = 4;

/// Answer of a limit computation. `resolved` tells an actual answer apart
/// from a residual limit node handed back verbatim when no solver applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOutcome {
    pub expr: ExprId,
    pub resolved: bool,
}

/// Side of the approach along the real axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Engine {
    /// Computes `lim expr` as `var` approaches `destination` from `side`.
    ///
    /// An unresolved limit is not an error: the outcome then carries a
    /// residual limit node with `resolved` false. Errors are reserved for
    /// ill-posed inputs such as a complex infinite destination.
    pub fn limit(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        destination: ExprId,
        side: LimitSide,
    ) -> Result<LimitOutcome, EngineError> {
        match self.compute_limit(expr, var, destination, side, 0)? {
            Some(answer) => Ok(LimitOutcome {
                expr: answer,
                resolved: true,
            }),
            None => {
                let residual = self.context.limit(expr, var, destination, side);
                Ok(LimitOutcome {
                    expr: residual,
                    resolved: false,
                })
            }
        }
    }

    /// Resolves a limit marker met while simplifying or evaluating.
    /// Markers nested past the re-entry bound, and markers whose
    /// computation fails, stay symbolic.
    pub(crate) fn try_resolve_limit_marker(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        destination: ExprId,
        side: LimitSide,
    ) -> Option<ExprId> {
        if self.limit_reentry >= MAX_LIMIT_REENTRY {
            return None;
        }
        self.limit_reentry += 1;
        let outcome = self.compute_limit(expr, var, destination, side, 0);
        self.limit_reentry -= 1;
        outcome.ok().flatten()
    }

    fn compute_limit(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        destination: ExprId,
        side: LimitSide,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        if depth > self.options.max_depth {
            return Err(EngineError::RecursionDepthExceeded(depth));
        }
        let dest = self.inner_simplify(destination);
        match side {
            LimitSide::Left => self.propagate_limit(expr, var, dest, Dir::Left, depth),
            LimitSide::Right => self.propagate_limit(expr, var, dest, Dir::Right, depth),
            LimitSide::Both => {
                // At an infinite destination the two sides coincide.
                if matches!(self.as_number(dest), Some(n) if !n.is_finite()) {
                    return self.propagate_limit(expr, var, dest, Dir::Left, depth);
                }
                let left = self.propagate_limit(expr, var, dest, Dir::Left, depth)?;
                let right = self.propagate_limit(expr, var, dest, Dir::Right, depth)?;
                Ok(match (left, right) {
                    (Some(l), Some(r)) if l == r => Some(l),
                    (Some(_), Some(_)) => Some(self.number(Numeric::nan())),
                    _ => None,
                })
            }
        }
    }

    /// Structural pass. Subexpressions with fully-finite limits are
    /// replaced by them; a child whose limit is unresolved or infinite is
    /// kept verbatim, and the destination solvers get another try on the
    /// partially substituted node.
    fn propagate_limit(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        dest: ExprId,
        dir: Dir,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        if depth > self.options.max_depth {
            return Err(EngineError::RecursionDepthExceeded(depth));
        }
        let expr = self.inner_simplify(expr);
        if !depends_on(&self.context, expr, var) {
            return Ok(Some(expr));
        }
        if matches!(self.context.get(expr), Expr::Variable(v) if *v == var) {
            return self.solve_at_destination(expr, var, dest, dir, depth);
        }
        // |f| passes through the limit of f.
        if let Expr::Func(UnaryFn::Abs, inner) = *self.context.get(expr) {
            return Ok(match self.propagate_limit(inner, var, dest, dir, depth + 1)? {
                Some(l) => {
                    let wrapped = self.context.func(UnaryFn::Abs, l);
                    Some(self.inner_simplify(wrapped))
                }
                None => None,
            });
        }
        if let Some(answer) = self.solve_at_destination(expr, var, dest, dir, depth)? {
            return Ok(Some(answer));
        }
        let kids = self.context.children(expr);
        let mut resolved = Vec::with_capacity(kids.len());
        for &kid in kids.iter() {
            match self.propagate_limit(kid, var, dest, dir, depth + 1)? {
                Some(l) if self.fully_finite(l) => resolved.push(l),
                _ => resolved.push(kid),
            }
        }
        let rebuilt = self.context.rebuild(expr, &resolved);
        if rebuilt == expr {
            return Ok(None);
        }
        let folded = self.inner_simplify(rebuilt);
        self.solve_at_destination(folded, var, dest, dir, depth)
    }

    /// Dispatch on the destination. Infinite destinations go straight to
    /// the solver chain, mirrored for negative infinity; finite ones try
    /// direct substitution, then shift the approach to positive infinity
    /// through `dest -/+ 1/var`.
    fn solve_at_destination(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        dest: ExprId,
        dir: Dir,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        if matches!(self.as_number(dest), Some(n) if n.is_nan()) {
            return Ok(Some(self.number(Numeric::nan())));
        }
        let infinite_sign = match self.as_number(dest) {
            Some(n) if !n.is_finite() => Some(n.sign()),
            _ => None,
        };
        if let Some(sign) = infinite_sign {
            return match sign {
                Some(Ordering::Greater) => self.solve_at_pos_infinity(expr, var, depth),
                Some(Ordering::Less) => {
                    let v = self.context.var_id(var);
                    let neg = self.context.add(Expr::Neg(v));
                    let mirrored = substitute_var(&mut self.context, expr, var, neg);
                    let mirrored = self.inner_simplify(mirrored);
                    self.solve_at_pos_infinity(mirrored, var, depth)
                }
                _ => Err(EngineError::ComplexInfiniteDestination),
            };
        }
        if let Some(answer) = self.limit_by_substitution(expr, var, dest)? {
            return Ok(Some(answer));
        }
        let v = self.context.var_id(var);
        let one = self.context.num(1);
        let step = self.context.add(Expr::Div(one, v));
        let shifted = match dir {
            Dir::Left => self.context.add(Expr::Sub(dest, step)),
            Dir::Right => self.context.add(Expr::Add(dest, step)),
        };
        let moved = substitute_var(&mut self.context, expr, var, shifted);
        let moved = self.inner_simplify(moved);
        self.solve_at_pos_infinity(moved, var, depth)
    }

    /// Ordered solver chain for `var -> +oo`, cheapest rule first.
    /// `None` means every rule declined.
    pub(crate) fn solve_at_pos_infinity(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        if depth > self.options.max_depth {
            return Ok(None);
        }
        let expr = self.inner_simplify(expr);
        debug!(?expr, "limit solver chain at +oo");
        let inf = self.number(Numeric::pos_inf());
        if let Some(answer) = self.limit_by_substitution(expr, var, inf)? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.limit_of_polynomial(expr, var)? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.limit_of_rational(expr, var)? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.limit_of_logarithm(expr, var, depth)? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.limit_of_log_ratio(expr, var, depth)? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.limit_of_bounded_quotient(expr, var, depth)? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.limit_of_product(expr, var, depth)? {
            return Ok(Some(answer));
        }
        self.limit_by_lhopital(expr, var, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liminal_num::{BigDecimal, Complex, Real};

    fn setup() -> (Engine, SymbolId, ExprId) {
        let mut eng = Engine::new();
        let sym = eng.context.sym("x");
        let x = eng.context.var_id(sym);
        (eng, sym, x)
    }

    #[test]
    fn reciprocal_vanishes_at_infinity() {
        let (mut eng, sym, x) = setup();
        let one = eng.context.num(1);
        let rec = eng.context.add(Expr::Div(one, x));
        let inf = eng.number(Numeric::pos_inf());
        let out = eng.limit(rec, sym, inf, LimitSide::Both).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, eng.context.num(0));
    }

    #[test]
    fn reciprocal_splits_at_zero() {
        let (mut eng, sym, x) = setup();
        let one = eng.context.num(1);
        let rec = eng.context.add(Expr::Div(one, x));
        let zero = eng.context.num(0);

        let left = eng.limit(rec, sym, zero, LimitSide::Left).unwrap();
        assert!(left.resolved);
        assert_eq!(left.expr, eng.number(Numeric::neg_inf()));

        let right = eng.limit(rec, sym, zero, LimitSide::Right).unwrap();
        assert!(right.resolved);
        assert_eq!(right.expr, eng.number(Numeric::pos_inf()));

        let both = eng.limit(rec, sym, zero, LimitSide::Both).unwrap();
        assert!(both.resolved);
        assert!(eng.as_number(both.expr).is_some_and(Numeric::is_nan));
    }

    #[test]
    fn identity_lands_on_the_destination() {
        let (mut eng, sym, x) = setup();
        let three = eng.context.num(3);
        let out = eng.limit(x, sym, three, LimitSide::Both).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, three);
    }

    #[test]
    fn symbolic_destination_passes_through() {
        let (mut eng, sym, x) = setup();
        let y = eng.context.var("y");
        let out = eng.limit(x, sym, y, LimitSide::Both).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, y);
    }

    #[test]
    fn var_free_body_is_its_own_limit() {
        let (mut eng, sym, _x) = setup();
        let seven = eng.context.num(7);
        let five = eng.context.num(5);
        let out = eng.limit(seven, sym, five, LimitSide::Both).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, seven);
    }

    #[test]
    fn absolute_value_passes_the_limit_through() {
        let (mut eng, sym, x) = setup();
        let one = eng.context.num(1);
        let rec = eng.context.add(Expr::Div(one, x));
        let abs = eng.context.func(UnaryFn::Abs, rec);
        let zero = eng.context.num(0);
        let out = eng.limit(abs, sym, zero, LimitSide::Both).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, eng.number(Numeric::pos_inf()));
    }

    #[test]
    fn oscillation_stays_residual() {
        let (mut eng, sym, x) = setup();
        let sine = eng.context.func(UnaryFn::Sin, x);
        let inf = eng.number(Numeric::pos_inf());
        let out = eng.limit(sine, sym, inf, LimitSide::Both).unwrap();
        assert!(!out.resolved);
        assert!(matches!(eng.context.get(out.expr), Expr::Limit { .. }));
    }

    #[test]
    fn partially_substituted_products_still_collapse() {
        // sin(x) * 2^(-x): the decaying factor substitutes to 0 while the
        // oscillating one is kept, and the rebuilt product folds away
        let (mut eng, sym, x) = setup();
        let sine = eng.context.func(UnaryFn::Sin, x);
        let two = eng.context.num(2);
        let neg = eng.context.add(Expr::Neg(x));
        let decay = eng.context.add(Expr::Pow(two, neg));
        let m = eng.context.add(Expr::Mul(sine, decay));
        let inf = eng.number(Numeric::pos_inf());
        let out = eng.limit(m, sym, inf, LimitSide::Both).unwrap();
        assert!(out.resolved);
        assert_eq!(out.expr, eng.context.num(0));
    }

    #[test]
    fn complex_infinite_destination_is_rejected() {
        let (mut eng, sym, x) = setup();
        let dest = eng.number(Numeric::Complex(Complex::new(
            Real::PosInfinity,
            Real::Finite(BigDecimal::from(1)),
        )));
        let err = eng.limit(x, sym, dest, LimitSide::Both).unwrap_err();
        assert!(matches!(err, EngineError::ComplexInfiniteDestination));
    }
}
