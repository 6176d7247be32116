//! Exactness-preserving evaluation and full numeric evaluation.
//!
//! `inner_eval` folds numeric subtrees only when the tower can represent the
//! result without silent approximation: arithmetic always folds (the tower is
//! closed over exact layers), powers and logarithms fold when an exact path
//! exists, and transcendental functions of exact arguments stay symbolic.
//! `eval_numeric` is the opposite knob: every constant becomes a decimal at
//! the configured precision and every function folds through the tower.

use liminal_ast::{Constant, Expr, ExprId, UnaryFn};
use liminal_num::{consts, NumContext, Numeric};

use crate::engine::Engine;
use crate::error::EngineError;

/// Largest integer literal whose factorial is folded eagerly.
pub const MAX_EXACT_FACTORIAL: i64 = 1000;

// ============================================================================
// Exactness-preserving evaluation
// ============================================================================

impl Engine {
    /// Evaluates everything that can be represented exactly and leaves the
    /// rest untouched. Memoized per node and options fingerprint.
    pub fn inner_eval(&mut self, id: ExprId) -> ExprId {
        self.eval_rec(id, 0)
    }

    fn eval_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        if let Some(&hit) = self.eval_cache.get(&(id, self.fingerprint)) {
            return hit;
        }
        let result = match self.context.get(id).clone() {
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => id,
            Expr::Derivative { expr, var, order } => {
                let inner = self.eval_rec(expr, depth + 1);
                if order == 0 {
                    inner
                } else if let Some(resolved) = self.resolve_derivative(inner, var, order) {
                    resolved
                } else {
                    self.context.add(Expr::Derivative { expr: inner, var, order })
                }
            }
            Expr::Integral { expr, var, order } => {
                let inner = self.eval_rec(expr, depth + 1);
                if order == 0 {
                    inner
                } else {
                    self.context.add(Expr::Integral { expr: inner, var, order })
                }
            }
            Expr::Limit { expr, var, destination, side } => {
                let dest = self.eval_rec(destination, depth + 1);
                match self.try_resolve_limit_marker(expr, var, dest, side) {
                    Some(resolved) => resolved,
                    None => self.context.limit(expr, var, dest, side),
                }
            }
            _ => {
                let kids: Vec<ExprId> = self
                    .context
                    .children(id)
                    .iter()
                    .map(|&k| self.eval_rec(k, depth + 1))
                    .collect();
                let rebuilt = self.context.rebuild(id, &kids);
                match self.fold_numeric(rebuilt) {
                    Some(v) => {
                        let folded = self.number(v);
                        if self.fits_value_domain(folded) {
                            folded
                        } else {
                            rebuilt
                        }
                    }
                    None => rebuilt,
                }
            }
        };
        self.eval_cache.insert((id, self.fingerprint), result);
        self.eval_cache.insert((result, self.fingerprint), result);
        result
    }

    /// Folds a node whose children are all numeric literals, or returns
    /// `None` when the node must stay symbolic to preserve exactness.
    pub(crate) fn fold_numeric(&self, id: ExprId) -> Option<Numeric> {
        let num = self.options.num;
        match self.context.get(id) {
            Expr::Add(a, b) => Some(self.as_number(*a)?.add(self.as_number(*b)?, &num)),
            Expr::Sub(a, b) => Some(self.as_number(*a)?.sub(self.as_number(*b)?, &num)),
            Expr::Mul(a, b) => Some(self.as_number(*a)?.mul(self.as_number(*b)?, &num)),
            Expr::Div(a, b) => Some(self.as_number(*a)?.div(self.as_number(*b)?, &num)),
            Expr::Neg(a) => Some(self.as_number(*a)?.neg()),
            Expr::Pow(a, b) => {
                let (base, exp) = (self.as_number(*a)?, self.as_number(*b)?);
                self.fold_pow(base, exp)
            }
            Expr::Log(b, x) => {
                let (base, arg) = (self.as_number(*b)?, self.as_number(*x)?);
                self.fold_log(base, arg)
            }
            Expr::Func(f, a) => self.fold_unary(*f, self.as_number(*a)?),
            _ => None,
        }
    }

    pub(crate) fn fold_pow(&self, base: &Numeric, exp: &Numeric) -> Option<Numeric> {
        // 0^w resolves by exponent sign, 0^0 to NaN; pow_exact declines
        // zero bases so route them to the full tower here
        if base.is_exact_zero() {
            return Some(base.pow(exp, &self.options.num));
        }
        if let Some(v) = base.pow_exact(exp, &self.options.num) {
            return Some(v);
        }
        if !base.is_finite() || !exp.is_finite() || !base.is_exact() || !exp.is_exact() {
            return Some(base.pow(exp, &self.options.num));
        }
        None
    }

    pub(crate) fn fold_log(&self, base: &Numeric, arg: &Numeric) -> Option<Numeric> {
        if let Some(v) = Numeric::log_exact(base, arg) {
            return Some(v);
        }
        // ln(0) is a definite sentinel, not an approximation.
        if !base.is_finite()
            || !arg.is_finite()
            || !base.is_exact()
            || !arg.is_exact()
            || arg.is_zero()
        {
            return Some(Numeric::log(base, arg, &self.options.num));
        }
        None
    }

    pub(crate) fn fold_unary(&self, f: UnaryFn, arg: &Numeric) -> Option<Numeric> {
        let num = self.options.num;
        match f {
            UnaryFn::Abs | UnaryFn::Signum => Some(apply_unary(f, arg, &num)),
            UnaryFn::Factorial => {
                if !arg.is_exact() || !arg.is_finite() {
                    return Some(arg.factorial(&num));
                }
                if arg.is_integer_value() {
                    match arg.to_i64_exact() {
                        Some(v) if v <= MAX_EXACT_FACTORIAL => Some(arg.factorial(&num)),
                        _ => None,
                    }
                } else {
                    None
                }
            }
            UnaryFn::Sin | UnaryFn::Cos | UnaryFn::Tan | UnaryFn::Cotan => {
                if !arg.is_exact() || !arg.is_finite() {
                    return Some(apply_unary(f, arg, &num));
                }
                if arg.is_zero() {
                    return Some(match f {
                        UnaryFn::Sin | UnaryFn::Tan => Numeric::int(0),
                        UnaryFn::Cos => Numeric::int(1),
                        // cot(0) has no two-sided value
                        _ => Numeric::nan(),
                    });
                }
                None
            }
            UnaryFn::Arctan => {
                if !arg.is_exact() {
                    return Some(apply_unary(f, arg, &num));
                }
                if arg.is_nan() {
                    return Some(Numeric::nan());
                }
                // atan at an infinity is pi/2 up to sign; left for the
                // symbolic rewrites so the closed form survives.
                if !arg.is_finite() {
                    return None;
                }
                if arg.is_zero() {
                    return Some(Numeric::int(0));
                }
                None
            }
            UnaryFn::Arccotan => {
                if !arg.is_exact() {
                    return Some(apply_unary(f, arg, &num));
                }
                if arg.is_nan() {
                    return Some(Numeric::nan());
                }
                if !arg.is_finite() {
                    return Some(Numeric::int(0));
                }
                None
            }
            UnaryFn::Arcsin | UnaryFn::Arccos => {
                if !arg.is_exact() {
                    return Some(apply_unary(f, arg, &num));
                }
                if !arg.is_finite() {
                    return Some(Numeric::nan());
                }
                match f {
                    UnaryFn::Arcsin if arg.is_zero() => Some(Numeric::int(0)),
                    UnaryFn::Arccos if arg.is_one() => Some(Numeric::int(0)),
                    _ => None,
                }
            }
        }
    }
}

// ============================================================================
// Full numeric evaluation
// ============================================================================

impl Engine {
    /// Collapses `id` to a single number, approximating where it must.
    /// Unbound variables and unresolved calculus markers are errors.
    pub fn eval_numeric(&mut self, id: ExprId) -> Result<Numeric, EngineError> {
        self.numeric_rec(id, 0)
    }

    fn numeric_rec(&mut self, id: ExprId, depth: usize) -> Result<Numeric, EngineError> {
        if depth > self.options.max_depth {
            return Err(EngineError::RecursionDepthExceeded(depth));
        }
        let num = self.options.num;
        match self.context.get(id).clone() {
            Expr::Number(n) => Ok(n),
            Expr::Constant(c) => {
                let d = match c {
                    Constant::Pi => consts::pi(num.precision),
                    Constant::E => consts::e(num.precision),
                };
                Ok(Numeric::from_decimal((*d).clone()))
            }
            Expr::Variable(s) => {
                let name = self.context.sym_name(s).to_string();
                Err(EngineError::UnboundVariable(name))
            }
            Expr::Add(a, b) => {
                let (x, y) = (self.numeric_rec(a, depth + 1)?, self.numeric_rec(b, depth + 1)?);
                Ok(x.add(&y, &num))
            }
            Expr::Sub(a, b) => {
                let (x, y) = (self.numeric_rec(a, depth + 1)?, self.numeric_rec(b, depth + 1)?);
                Ok(x.sub(&y, &num))
            }
            Expr::Mul(a, b) => {
                let (x, y) = (self.numeric_rec(a, depth + 1)?, self.numeric_rec(b, depth + 1)?);
                Ok(x.mul(&y, &num))
            }
            Expr::Div(a, b) => {
                let (x, y) = (self.numeric_rec(a, depth + 1)?, self.numeric_rec(b, depth + 1)?);
                Ok(x.div(&y, &num))
            }
            Expr::Pow(a, b) => {
                let (x, y) = (self.numeric_rec(a, depth + 1)?, self.numeric_rec(b, depth + 1)?);
                Ok(x.pow(&y, &num))
            }
            Expr::Neg(a) => Ok(self.numeric_rec(a, depth + 1)?.neg()),
            Expr::Log(b, x) => {
                let (base, arg) =
                    (self.numeric_rec(b, depth + 1)?, self.numeric_rec(x, depth + 1)?);
                Ok(Numeric::log(&base, &arg, &num))
            }
            Expr::Func(UnaryFn::Factorial, a) => {
                let v = self.numeric_rec(a, depth + 1)?;
                if v.is_exact() && v.is_integer_value() {
                    match v.to_i64_exact() {
                        Some(i) if i <= MAX_EXACT_FACTORIAL => Ok(v.factorial(&num)),
                        // negative integers are poles regardless of magnitude
                        None if v.sign() == Some(std::cmp::Ordering::Less) => Ok(Numeric::nan()),
                        _ => Err(EngineError::NonNumeric("factorial argument too large")),
                    }
                } else {
                    Ok(v.factorial(&num))
                }
            }
            Expr::Func(f, a) => {
                let v = self.numeric_rec(a, depth + 1)?;
                Ok(apply_unary(f, &v, &num))
            }
            Expr::Derivative { expr, var, order } => {
                if order == 0 {
                    self.numeric_rec(expr, depth + 1)
                } else {
                    match self.resolve_derivative(expr, var, order) {
                        Some(r) => self.numeric_rec(r, depth + 1),
                        None => Err(EngineError::NonNumeric("unresolved derivative")),
                    }
                }
            }
            Expr::Integral { expr, order: 0, .. } => self.numeric_rec(expr, depth + 1),
            Expr::Integral { .. } => Err(EngineError::NonNumeric("unresolved integral")),
            Expr::Limit { expr, var, destination, side } => {
                match self.try_resolve_limit_marker(expr, var, destination, side) {
                    Some(r) => self.numeric_rec(r, depth + 1),
                    None => Err(EngineError::NonNumeric("unresolved limit")),
                }
            }
        }
    }
}

pub(crate) fn apply_unary(f: UnaryFn, v: &Numeric, num: &NumContext) -> Numeric {
    match f {
        UnaryFn::Sin => v.sin(num),
        UnaryFn::Cos => v.cos(num),
        UnaryFn::Tan => v.tan(num),
        UnaryFn::Cotan => v.cot(num),
        UnaryFn::Arcsin => v.asin(num),
        UnaryFn::Arccos => v.acos(num),
        UnaryFn::Arctan => v.atan(num),
        UnaryFn::Arccotan => v.acot(num),
        UnaryFn::Abs => v.abs(num),
        UnaryFn::Signum => v.signum(num),
        UnaryFn::Factorial => v.factorial(num),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn engine() -> Engine {
        Engine::new()
    }

    #[test]
    fn arithmetic_folds_exactly() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let three = eng.context.num(3);
        let sum = eng.context.add(Expr::Add(two, three));
        let r = eng.inner_eval(sum);
        assert_eq!(eng.as_number(r), Some(&Numeric::int(5)));
    }

    #[test]
    fn exact_power_folds_and_irrational_power_stays() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let ten = eng.context.num(10);
        let p = eng.context.add(Expr::Pow(two, ten));
        let r = eng.inner_eval(p);
        assert_eq!(eng.as_number(r), Some(&Numeric::int(1024)));

        let half = eng.number(Numeric::rational(1, 2).unwrap());
        let root = eng.context.add(Expr::Pow(two, half));
        assert_eq!(eng.inner_eval(root), root);
    }

    #[test]
    fn division_by_exact_zero_folds_to_nan() {
        let mut eng = engine();
        let one = eng.context.num(1);
        let zero = eng.context.num(0);
        let q = eng.context.add(Expr::Div(one, zero));
        let r = eng.inner_eval(q);
        assert!(eng.as_number(r).is_some_and(Numeric::is_nan));
    }

    #[test]
    fn sine_of_exact_nonzero_stays_symbolic() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let s = eng.context.func(UnaryFn::Sin, two);
        assert_eq!(eng.inner_eval(s), s);
    }

    #[test]
    fn sine_at_zero_and_infinity_folds() {
        let mut eng = engine();
        let zero = eng.context.num(0);
        let s0 = eng.context.func(UnaryFn::Sin, zero);
        let r0 = eng.inner_eval(s0);
        assert_eq!(eng.as_number(r0), Some(&Numeric::int(0)));

        let inf = eng.number(Numeric::pos_inf());
        let si = eng.context.func(UnaryFn::Sin, inf);
        let ri = eng.inner_eval(si);
        assert!(eng.as_number(ri).is_some_and(Numeric::is_nan));
    }

    #[test]
    fn log_of_exact_power_folds() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let eight = eng.context.num(8);
        let l = eng.context.add(Expr::Log(two, eight));
        let r = eng.inner_eval(l);
        assert_eq!(eng.as_number(r), Some(&Numeric::int(3)));
    }

    #[test]
    fn log_of_zero_folds_to_negative_infinity() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let zero = eng.context.num(0);
        let l = eng.context.add(Expr::Log(two, zero));
        let r = eng.inner_eval(l);
        assert_eq!(eng.as_number(r), Some(&Numeric::neg_inf()));
    }

    #[test]
    fn factorial_of_small_literal_folds() {
        let mut eng = engine();
        let five = eng.context.num(5);
        let f = eng.context.func(UnaryFn::Factorial, five);
        let r = eng.inner_eval(f);
        assert_eq!(eng.as_number(r), Some(&Numeric::int(120)));
    }

    #[test]
    fn factorial_of_huge_literal_stays() {
        let mut eng = engine();
        let big = eng.number(Numeric::from(BigInt::from(10).pow(9)));
        let f = eng.context.func(UnaryFn::Factorial, big);
        assert_eq!(eng.inner_eval(f), f);
    }

    #[test]
    fn symbolic_children_are_left_alone() {
        let mut eng = engine();
        let x = eng.context.var("x");
        let zero = eng.context.num(0);
        let sum = eng.context.add(Expr::Add(x, zero));
        // identity elimination is simplification, not evaluation
        assert_eq!(eng.inner_eval(sum), sum);
    }

    #[test]
    fn zero_order_derivative_collapses() {
        let mut eng = engine();
        let x = eng.context.var("x");
        let sym = eng.context.sym("x");
        let d = eng.context.add(Expr::Derivative { expr: x, var: sym, order: 0 });
        assert_eq!(eng.inner_eval(d), x);
    }

    #[test]
    fn eval_numeric_approximates_pi() {
        let mut eng = engine();
        let pi = eng.context.constant(Constant::Pi);
        let v = eng.eval_numeric(pi).unwrap();
        let f = v.to_f64().unwrap();
        assert!((f - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn eval_numeric_rejects_unbound_variables() {
        let mut eng = engine();
        let x = eng.context.var("x");
        assert!(matches!(
            eng.eval_numeric(x),
            Err(EngineError::UnboundVariable(name)) if name == "x"
        ));
    }

    #[test]
    fn eval_numeric_folds_transcendentals() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let s = eng.context.func(UnaryFn::Sin, two);
        let v = eng.eval_numeric(s).unwrap();
        let f = v.to_f64().unwrap();
        assert!((f - 2f64.sin()).abs() < 1e-12);
    }

    #[test]
    fn repeated_eval_hits_the_cache() {
        let mut eng = engine();
        let two = eng.context.num(2);
        let three = eng.context.num(3);
        let sum = eng.context.add(Expr::Add(two, three));
        let first = eng.inner_eval(sum);
        let before = eng.context.stats().nodes_created;
        let second = eng.inner_eval(sum);
        assert_eq!(first, second);
        assert_eq!(eng.context.stats().nodes_created, before);
    }
}
