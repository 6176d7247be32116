//! The solver chain for approaches toward positive infinity.

use std::cmp::Ordering;

use liminal_ast::{depends_on, substitute_var, Constant, Expr, ExprId, SymbolId, UnaryFn};
use liminal_num::Numeric;

use crate::engine::Engine;
use crate::error::EngineError;

impl Engine {
    /// Direct substitution of the destination. Declines when the
    /// substituted form does not evaluate or evaluates to NaN. A finite
    /// value keeps the simplified symbolic shape as the answer; an
    /// infinite one becomes its literal.
    pub(crate) fn limit_by_substitution(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        at: ExprId,
    ) -> Result<Option<ExprId>, EngineError> {
        let substituted = substitute_var(&mut self.context, expr, var, at);
        let simp = self.simplify_level(substituted, -1);
        let Ok(value) = self.eval_numeric(simp) else {
            return Ok(None);
        };
        if value.is_nan() {
            return Ok(None);
        }
        let value = match value {
            // real projection of a directed infinity with bounded
            // imaginary drift
            Numeric::Complex(c) if !c.re.is_finite() && c.im.is_finite() => Numeric::Real(c.re),
            v => v,
        };
        if !value.is_finite() {
            return Ok(Some(self.number(value)));
        }
        if self.fully_finite(simp) {
            return Ok(Some(simp));
        }
        // A finite value read off an infinity-laden tree, e.g. 1/e^oo.
        // Keep it only when it is exact; a decimal would trade a clean
        // symbolic answer for an approximation.
        if value.is_exact() {
            return Ok(Some(self.number(value)));
        }
        Ok(None)
    }

    /// Polynomial and Laurent tails: the highest power of `var` wins.
    pub(crate) fn limit_of_polynomial(
        &mut self,
        expr: ExprId,
        var: SymbolId,
    ) -> Result<Option<ExprId>, EngineError> {
        let Some(monomials) = self.cleaned_monomials(expr, var) else {
            return Ok(None);
        };
        let Some((&power, &lead)) = monomials.last_key_value() else {
            return Ok(Some(self.context.num(0)));
        };
        Ok(Some(match power.cmp(&0) {
            Ordering::Less => self.context.num(0),
            Ordering::Equal => lead,
            Ordering::Greater => {
                let inf = self.number(Numeric::pos_inf());
                let scaled = self.context.add(Expr::Mul(lead, inf));
                self.inner_simplify(scaled)
            }
        }))
    }

    /// Quotients of polynomials, decided by comparing degrees.
    pub(crate) fn limit_of_rational(
        &mut self,
        expr: ExprId,
        var: SymbolId,
    ) -> Result<Option<ExprId>, EngineError> {
        let Expr::Div(num, den) = *self.context.get(expr) else {
            return Ok(None);
        };
        let Some(nm) = self.cleaned_monomials(num, var) else {
            return Ok(None);
        };
        let Some(dm) = self.cleaned_monomials(den, var) else {
            return Ok(None);
        };
        let Some((&dp, &dl)) = dm.last_key_value() else {
            return Ok(None);
        };
        let Some((&np, &nl)) = nm.last_key_value() else {
            return Ok(Some(self.context.num(0)));
        };
        Ok(Some(match np.cmp(&dp) {
            Ordering::Less => self.context.num(0),
            Ordering::Equal => {
                let ratio = self.context.add(Expr::Div(nl, dl));
                self.inner_simplify(ratio)
            }
            Ordering::Greater => {
                let ratio = self.context.add(Expr::Div(nl, dl));
                let inf = self.number(Numeric::pos_inf());
                let scaled = self.context.add(Expr::Mul(ratio, inf));
                self.inner_simplify(scaled)
            }
        }))
    }

    /// `log_b(f)`: a fixed base passes the log through the inner limit;
    /// a variable base is rewritten as a ratio of natural logs first.
    pub(crate) fn limit_of_logarithm(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        let Expr::Log(base, arg) = *self.context.get(expr) else {
            return Ok(None);
        };
        if depends_on(&self.context, base, var) {
            let e = self.context.constant(Constant::E);
            let ln_arg = self.context.add(Expr::Log(e, arg));
            let ln_base = self.context.add(Expr::Log(e, base));
            let ratio = self.context.add(Expr::Div(ln_arg, ln_base));
            return self.limit_of_log_ratio(ratio, var, depth);
        }
        let Some(inner) = self.solve_at_pos_infinity(arg, var, depth + 1)? else {
            return Ok(None);
        };
        if self.infinite_literal(inner) {
            // the log runs to +oo alongside its argument's magnitude
            return Ok(Some(self.number(Numeric::pos_inf())));
        }
        if self.is_num_zero(inner) {
            return Ok(Some(self.number(Numeric::neg_inf())));
        }
        let wrapped = self.context.add(Expr::Log(base, inner));
        Ok(Some(self.inner_simplify(wrapped)))
    }

    /// Ratios of logarithms whose arguments both run to a boundary.
    /// `ln p / ln q` is then oo/oo and one l'Hopital step turns it into
    /// `(p' q)/(p q')`; differing bases contribute a constant factor.
    pub(crate) fn limit_of_log_ratio(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        let Expr::Div(top, bottom) = *self.context.get(expr) else {
            return Ok(None);
        };
        let Expr::Log(b1, p) = *self.context.get(top) else {
            return Ok(None);
        };
        let Expr::Log(b2, q) = *self.context.get(bottom) else {
            return Ok(None);
        };
        if depends_on(&self.context, b1, var) || depends_on(&self.context, b2, var) {
            return Ok(None);
        }
        let Some(lp) = self.solve_at_pos_infinity(p, var, depth + 1)? else {
            return Ok(None);
        };
        let Some(lq) = self.solve_at_pos_infinity(q, var, depth + 1)? else {
            return Ok(None);
        };
        if !(self.log_boundary(lp) && self.log_boundary(lq)) {
            return Ok(None);
        }
        let Some(dp) = self.differentiate(p, var) else {
            return Ok(None);
        };
        let Some(dq) = self.differentiate(q, var) else {
            return Ok(None);
        };
        let top2 = self.context.add(Expr::Mul(dp, q));
        let bottom2 = self.context.add(Expr::Mul(p, dq));
        let ratio = self.context.add(Expr::Div(top2, bottom2));
        let ratio = self.inner_simplify(ratio);
        let Some(inner) = self.solve_at_pos_infinity(ratio, var, depth + 1)? else {
            return Ok(None);
        };
        if b1 == b2 {
            return Ok(Some(inner));
        }
        let e = self.context.constant(Constant::E);
        let ln_b2 = self.context.add(Expr::Log(e, b2));
        let ln_b1 = self.context.add(Expr::Log(e, b1));
        let scale = self.context.add(Expr::Div(ln_b2, ln_b1));
        let scaled = self.context.add(Expr::Mul(scale, inner));
        Ok(Some(self.inner_simplify(scaled)))
    }

    /// A bounded numerator over a divergent denominator decays to zero,
    /// however wildly the numerator oscillates.
    pub(crate) fn limit_of_bounded_quotient(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        let Expr::Div(num, den) = *self.context.get(expr) else {
            return Ok(None);
        };
        if !self.is_bounded(num) {
            return Ok(None);
        }
        let Some(ld) = self.solve_at_pos_infinity(den, var, depth + 1)? else {
            return Ok(None);
        };
        if !self.infinite_literal(ld) {
            return Ok(None);
        }
        Ok(Some(self.context.num(0)))
    }

    /// Syntactic boundedness: the value stays in a fixed interval no
    /// matter where the argument goes.
    fn is_bounded(&self, id: ExprId) -> bool {
        match self.context.get(id) {
            Expr::Number(n) => n.is_finite(),
            Expr::Constant(_) => true,
            Expr::Func(f, arg) => match f {
                UnaryFn::Sin
                | UnaryFn::Cos
                | UnaryFn::Signum
                | UnaryFn::Arcsin
                | UnaryFn::Arccos
                | UnaryFn::Arctan
                | UnaryFn::Arccotan => true,
                UnaryFn::Abs => self.is_bounded(*arg),
                UnaryFn::Tan | UnaryFn::Cotan | UnaryFn::Factorial => false,
            },
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
                self.is_bounded(*a) && self.is_bounded(*b)
            }
            Expr::Neg(a) => self.is_bounded(*a),
            _ => false,
        }
    }

    /// 0 * oo products: pit the vanishing factor against the reciprocal of
    /// the divergent one, turning the product into a 0/0 quotient.
    pub(crate) fn limit_of_product(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        let Expr::Mul(a, b) = *self.context.get(expr) else {
            return Ok(None);
        };
        let Some(la) = self.solve_at_pos_infinity(a, var, depth + 1)? else {
            return Ok(None);
        };
        let Some(lb) = self.solve_at_pos_infinity(b, var, depth + 1)? else {
            return Ok(None);
        };
        let (f, g) = if self.is_num_zero(la) && self.infinite_literal(lb) {
            (a, b)
        } else if self.is_num_zero(lb) && self.infinite_literal(la) {
            (b, a)
        } else {
            return Ok(None);
        };
        let one = self.context.num(1);
        let recip = self.context.add(Expr::Div(one, g));
        let recip = self.inner_simplify(recip);
        let Some(next) = self.lhopital_step(f, recip, var, depth)? else {
            return Ok(None);
        };
        self.solve_at_pos_infinity(next, var, depth + 1)
    }

    /// One l'Hopital step on 0/0 and oo/oo quotients.
    pub(crate) fn limit_by_lhopital(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        let Expr::Div(f, g) = *self.context.get(expr) else {
            return Ok(None);
        };
        let Some(next) = self.lhopital_step(f, g, var, depth)? else {
            return Ok(None);
        };
        if next == expr {
            return Ok(None);
        }
        self.solve_at_pos_infinity(next, var, depth + 1)
    }

    /// Differentiates an indeterminate `f / g` pair once. `None` when the
    /// pair is not 0/0 or oo/oo, or a derivative is unavailable.
    fn lhopital_step(
        &mut self,
        f: ExprId,
        g: ExprId,
        var: SymbolId,
        depth: usize,
    ) -> Result<Option<ExprId>, EngineError> {
        let Some(lf) = self.solve_at_pos_infinity(f, var, depth + 1)? else {
            return Ok(None);
        };
        let Some(lg) = self.solve_at_pos_infinity(g, var, depth + 1)? else {
            return Ok(None);
        };
        let zeros = self.is_num_zero(lf) && self.is_num_zero(lg);
        let infinite = self.infinite_literal(lf) && self.infinite_literal(lg);
        if !zeros && !infinite {
            return Ok(None);
        }
        let Some(df) = self.differentiate(f, var) else {
            return Ok(None);
        };
        let Some(dg) = self.differentiate(g, var) else {
            return Ok(None);
        };
        let next = self.context.add(Expr::Div(df, dg));
        Ok(Some(self.inner_simplify(next)))
    }

    fn infinite_literal(&self, id: ExprId) -> bool {
        matches!(self.as_number(id), Some(n) if !n.is_finite() && !n.is_nan())
    }

    /// Arguments sliding to zero or infinity push their logs to the
    /// infinite boundary.
    fn log_boundary(&self, id: ExprId) -> bool {
        match self.as_number(id) {
            Some(n) if n.is_nan() => false,
            Some(n) => n.is_zero() || !n.is_finite(),
            None => false,
        }
    }
}
