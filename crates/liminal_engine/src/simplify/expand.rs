//! Distribution of products over sums.

use liminal_ast::{Expr, ExprId};
use liminal_num::Numeric;

use crate::engine::Engine;
use crate::poly::linear_children;

/// Most terms a single distribution step may produce.
const EXPAND_TERM_LIMIT: usize = 64;
/// Largest literal exponent unrolled into repeated products.
const MAX_EXPAND_POW: i64 = 6;

impl Engine {
    /// Multiply out products, small integer powers and quotients of sums.
    /// The result is deliberately raw; the driver folds it and keeps it
    /// only when the simplified form scores better.
    pub fn expand(&mut self, id: ExprId) -> ExprId {
        self.expand_rec(id, 0)
    }

    fn expand_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        let kids: Vec<ExprId> = self
            .context
            .children(id)
            .iter()
            .map(|&k| self.expand_rec(k, depth + 1))
            .collect();
        let node = self.context.rebuild(id, &kids);
        match *self.context.get(node) {
            Expr::Mul(a, b) => self.distribute(a, b).unwrap_or(node),
            Expr::Pow(base, exp) => self.expand_pow(node, base, exp),
            Expr::Neg(inner) => self.expand_neg(node, inner),
            Expr::Div(num, den) => self.expand_div(node, num, den),
            _ => node,
        }
    }

    /// Cross product of both operands' terms; `None` when neither side is
    /// a sum or the result would blow past the term limit.
    fn distribute(&mut self, a: ExprId, b: ExprId) -> Option<ExprId> {
        let left = linear_children(&self.context, a);
        let right = linear_children(&self.context, b);
        if left.len() == 1 && right.len() == 1 {
            return None;
        }
        let total = left.len().checked_mul(right.len())?;
        if total > EXPAND_TERM_LIMIT {
            return None;
        }
        let mut terms = Vec::with_capacity(total);
        for &(ta, na) in &left {
            for &(tb, nb) in &right {
                let prod = self.context.add(Expr::Mul(ta, tb));
                terms.push((prod, na != nb));
            }
        }
        Some(self.rebuild_sum(&terms))
    }

    fn expand_pow(&mut self, node: ExprId, base: ExprId, exp: ExprId) -> ExprId {
        if !matches!(self.context.get(base), Expr::Add(..) | Expr::Sub(..)) {
            return node;
        }
        let Some(k) = self.as_number(exp).and_then(Numeric::to_i64_exact) else {
            return node;
        };
        if !(2..=MAX_EXPAND_POW).contains(&k) {
            return node;
        }
        let mut acc = base;
        for _ in 1..k {
            // all or nothing: a partial unroll is worse than the power
            match self.distribute(acc, base) {
                Some(next) => acc = next,
                None => return node,
            }
        }
        acc
    }

    fn expand_neg(&mut self, node: ExprId, inner: ExprId) -> ExprId {
        if !matches!(self.context.get(inner), Expr::Add(..) | Expr::Sub(..)) {
            return node;
        }
        let mut terms = linear_children(&self.context, inner);
        for term in &mut terms {
            term.1 = !term.1;
        }
        self.rebuild_sum(&terms)
    }

    fn expand_div(&mut self, node: ExprId, num: ExprId, den: ExprId) -> ExprId {
        if !matches!(self.context.get(num), Expr::Add(..) | Expr::Sub(..)) {
            return node;
        }
        let terms = linear_children(&self.context, num);
        if terms.len() > EXPAND_TERM_LIMIT {
            return node;
        }
        let mut out = Vec::with_capacity(terms.len());
        for &(t, negated) in &terms {
            let d = self.context.add(Expr::Div(t, den));
            out.push((d, negated));
        }
        self.rebuild_sum(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_product_distributes() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let one = eng.context.num(1);
        let y = eng.context.var("y");
        let sum = eng.context.add(Expr::Add(x, one));
        let m = eng.context.add(Expr::Mul(sum, y));
        let out = eng.expand(m);
        let expected = {
            let xy = eng.context.add(Expr::Mul(x, y));
            let oy = eng.context.add(Expr::Mul(one, y));
            eng.context.add(Expr::Add(xy, oy))
        };
        assert_eq!(out, expected);
    }

    #[test]
    fn difference_signs_survive_distribution() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let y = eng.context.var("y");
        let sum = eng.context.add(Expr::Add(x, y));
        let diff = eng.context.add(Expr::Sub(x, y));
        let m = eng.context.add(Expr::Mul(sum, diff));
        let out = eng.expand(m);
        // x*x + x*(-y) + y*x + y*(-y)
        let expected = {
            let xx = eng.context.add(Expr::Mul(x, x));
            let xy = eng.context.add(Expr::Mul(x, y));
            let yx = eng.context.add(Expr::Mul(y, x));
            let yy = eng.context.add(Expr::Mul(y, y));
            let s1 = eng.context.add(Expr::Sub(xx, xy));
            let s2 = eng.context.add(Expr::Add(s1, yx));
            eng.context.add(Expr::Sub(s2, yy))
        };
        assert_eq!(out, expected);
    }

    #[test]
    fn square_of_sum_unrolls() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let one = eng.context.num(1);
        let two = eng.context.num(2);
        let sum = eng.context.add(Expr::Add(x, one));
        let p = eng.context.add(Expr::Pow(sum, two));
        let out = eng.expand(p);
        assert_ne!(out, p);
        // four cross terms, no power nodes left
        let terms = linear_children(&eng.context, out);
        assert_eq!(terms.len(), 4);
    }

    #[test]
    fn large_exponents_stay_packed() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let one = eng.context.num(1);
        let big = eng.context.num(40);
        let sum = eng.context.add(Expr::Add(x, one));
        let p = eng.context.add(Expr::Pow(sum, big));
        assert_eq!(eng.expand(p), p);
    }

    #[test]
    fn negation_of_sum_flips_terms() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let y = eng.context.var("y");
        let sum = eng.context.add(Expr::Sub(x, y));
        let n = eng.context.add(Expr::Neg(sum));
        let out = eng.expand(n);
        let expected = {
            let nx = eng.context.add(Expr::Neg(x));
            eng.context.add(Expr::Add(nx, y))
        };
        assert_eq!(out, expected);
    }

    #[test]
    fn quotient_splits_over_numerator_terms() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let y = eng.context.var("y");
        let z = eng.context.var("z");
        let sum = eng.context.add(Expr::Add(x, y));
        let d = eng.context.add(Expr::Div(sum, z));
        let out = eng.expand(d);
        let expected = {
            let xz = eng.context.add(Expr::Div(x, z));
            let yz = eng.context.add(Expr::Div(y, z));
            eng.context.add(Expr::Add(xz, yz))
        };
        assert_eq!(out, expected);
    }
}
