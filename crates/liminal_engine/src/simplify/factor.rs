//! Common-factor extraction from sums.

use liminal_ast::{Expr, ExprId};
use liminal_num::Numeric;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::engine::Engine;
use crate::poly::{linear_children, mul_children};

/// Sums wider than this are left alone; the quadratic base intersection
/// is not worth it on huge expressions.
const MAX_FACTOR_TERMS: usize = 16;

/// One additive term, split into a positive rational coefficient and the
/// non-numeric factors it multiplies, each with its literal exponent.
struct TermView {
    negated: bool,
    coeff: BigRational,
    bases: Vec<(ExprId, i64)>,
}

fn push_base(bases: &mut Vec<(ExprId, i64)>, base: ExprId, exp: i64) {
    if let Some(entry) = bases.iter_mut().find(|(b, _)| *b == base) {
        entry.1 += exp;
    } else {
        bases.push((base, exp));
    }
}

impl Engine {
    /// Pull the numeric content and the shared bases out of every sum in
    /// the tree, e.g. `2*x + 2*y` into `2*(x + y)` and `x^2*y + x*y^2`
    /// into `x*y*(x + y)`. Sums with nothing in common come back as is.
    pub fn factorize(&mut self, id: ExprId) -> ExprId {
        self.factor_rec(id, 0)
    }

    fn factor_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        let kids: Vec<ExprId> = self
            .context
            .children(id)
            .iter()
            .map(|&k| self.factor_rec(k, depth + 1))
            .collect();
        let node = self.context.rebuild(id, &kids);
        if matches!(self.context.get(node), Expr::Add(..) | Expr::Sub(..)) {
            self.factor_sum(node)
        } else {
            node
        }
    }

    fn factor_sum(&mut self, node: ExprId) -> ExprId {
        let terms = linear_children(&self.context, node);
        if terms.len() < 2 || terms.len() > MAX_FACTOR_TERMS {
            return node;
        }
        let mut views = Vec::with_capacity(terms.len());
        for &(term, negated) in &terms {
            match self.term_view(term, negated) {
                Some(view) => views.push(view),
                None => return node,
            }
        }

        let mut num_gcd = BigInt::zero();
        let mut den_lcm = BigInt::one();
        for view in &views {
            num_gcd = num_gcd.gcd(view.coeff.numer());
            den_lcm = den_lcm.lcm(view.coeff.denom());
        }
        let content = BigRational::new(num_gcd, den_lcm);

        let mut commons: Vec<(ExprId, i64)> = views[0].bases.clone();
        for view in &views[1..] {
            commons.retain_mut(|entry| match view.bases.iter().find(|(b, _)| *b == entry.0) {
                Some(&(_, e)) => {
                    entry.1 = entry.1.min(e);
                    true
                }
                None => false,
            });
        }

        if content.is_one() && commons.is_empty() {
            return node;
        }

        let mut residual: Vec<(ExprId, bool)> = Vec::with_capacity(views.len());
        for view in &views {
            let mut factors: Vec<ExprId> = Vec::new();
            let scaled = &view.coeff / &content;
            if !scaled.is_one() {
                let n = self.number(Numeric::from(scaled));
                factors.push(n);
            }
            for &(base, exp) in &view.bases {
                let shared = commons
                    .iter()
                    .find(|(b, _)| *b == base)
                    .map(|&(_, e)| e)
                    .unwrap_or(0);
                let left = exp - shared;
                if left == 0 {
                    continue;
                }
                let f = if left == 1 {
                    base
                } else {
                    let e = self.context.num(left);
                    self.context.add(Expr::Pow(base, e))
                };
                factors.push(f);
            }
            let term = if factors.is_empty() {
                self.context.num(1)
            } else {
                self.rebuild_product(&factors)
            };
            residual.push((term, view.negated));
        }

        let outer_neg = residual.iter().all(|&(_, n)| n);
        if outer_neg {
            for term in &mut residual {
                term.1 = false;
            }
        }

        let mut outer: Vec<ExprId> = Vec::new();
        if !content.is_one() {
            let n = self.number(Numeric::from(content));
            outer.push(n);
        }
        for &(base, exp) in &commons {
            let f = if exp == 1 {
                base
            } else {
                let e = self.context.num(exp);
                self.context.add(Expr::Pow(base, e))
            };
            outer.push(f);
        }
        let sum = self.rebuild_sum(&residual);
        outer.push(sum);
        let product = self.rebuild_product(&outer);
        if outer_neg {
            self.context.add(Expr::Neg(product))
        } else {
            product
        }
    }

    /// Decompose one term into sign, rational coefficient and base powers.
    /// Exact numeric factors and literal-denominator quotients fold into
    /// the coefficient; everything else becomes an opaque base. `None`
    /// when the term carries an exact zero factor.
    fn term_view(&self, term: ExprId, negated: bool) -> Option<TermView> {
        let mut negated = negated;
        let mut coeff = BigRational::one();
        let mut bases: Vec<(ExprId, i64)> = Vec::new();
        let mut queue = mul_children(&self.context, term);
        queue.reverse();
        while let Some(start) = queue.pop() {
            let mut f = start;
            while let Expr::Neg(inner) = self.context.get(f) {
                negated = !negated;
                f = *inner;
            }
            match self.context.get(f) {
                Expr::Number(n) => match n.to_rational_exact() {
                    Ok(r) => {
                        if r.is_zero() {
                            return None;
                        }
                        if r.is_negative() {
                            negated = !negated;
                            coeff *= -r;
                        } else {
                            coeff *= r;
                        }
                    }
                    Err(_) => push_base(&mut bases, f, 1),
                },
                Expr::Div(num, den) => {
                    let (num, den) = (*num, *den);
                    let literal = self
                        .as_number(den)
                        .and_then(|n| n.to_rational_exact().ok())
                        .filter(|d| !d.is_zero());
                    match literal {
                        Some(d) => {
                            if d.is_negative() {
                                negated = !negated;
                                coeff /= -d;
                            } else {
                                coeff /= d;
                            }
                            for part in mul_children(&self.context, num).into_iter().rev() {
                                queue.push(part);
                            }
                        }
                        None => push_base(&mut bases, f, 1),
                    }
                }
                Expr::Pow(b, e) => {
                    let (b, e) = (*b, *e);
                    match self.as_number(e).and_then(Numeric::to_i64_exact) {
                        Some(k) if k >= 1 => push_base(&mut bases, b, k),
                        _ => push_base(&mut bases, f, 1),
                    }
                }
                _ => push_base(&mut bases, f, 1),
            }
        }
        Some(TermView {
            negated,
            coeff,
            bases,
        })
    }
}
