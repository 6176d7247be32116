//! Scored simplification driver.
//!
//! `simplify` explores rewrites rather than trusting any single pass: each
//! round runs the restructuring passes over the current expression, records
//! every outcome as a scored candidate, and the cheapest form wins. Ties
//! never displace an earlier candidate, and the incumbent is always
//! recorded first, so re-simplifying a result returns it unchanged.

use std::collections::{BTreeMap, BTreeSet};

use liminal_ast::{
    collect_variables, count_nodes_matching, Expr, ExprId, SortLevel, SymbolId, UnaryFn,
};
use tracing::debug;

use crate::engine::Engine;
use crate::poly::{dense_coeffs, gather_monomials, monomials_to_expr, poly_divide, poly_to_expr};

/// Upper bound on adopt-and-research rounds. The score drops strictly on
/// every adoption, so this only cuts off degenerate inputs.
const MAX_REFINE_ROUNDS: usize = 32;

impl Engine {
    /// Simplify at the engine's configured effort level.
    pub fn simplify(&mut self, id: ExprId) -> ExprId {
        let level = self.options.level;
        self.simplify_level(id, level)
    }

    /// Simplify at an explicit effort level. The magnitude sets the number
    /// of pass rounds; positive levels additionally try expanded and
    /// factored detours, negative levels are the cheap inner form those
    /// detours recurse with.
    pub fn simplify_level(&mut self, id: ExprId, level: i32) -> ExprId {
        let mut cur = id;
        for _ in 0..MAX_REFINE_ROUNDS {
            let candidates = self.search(cur, level);
            let best = match candidates.iter().next() {
                Some(&(_, _, best)) => best,
                None => break,
            };
            if best == cur {
                break;
            }
            cur = best;
        }
        cur
    }

    /// The simplified expression followed by the other forms the search
    /// considered, cheapest first.
    pub fn alternate(&mut self, id: ExprId, level: i32) -> Vec<ExprId> {
        let best = self.simplify_level(id, level);
        let candidates = self.search(best, level);
        let mut out: Vec<ExprId> = Vec::with_capacity(candidates.len());
        for &(_, _, e) in candidates.iter() {
            if !out.contains(&e) {
                out.push(e);
            }
        }
        out
    }

    fn search(&mut self, id: ExprId, level: i32) -> BTreeSet<(u64, u64, ExprId)> {
        let mut set = BTreeSet::new();
        let mut seq: u64 = 0;
        let base = self.inner_simplify(id);
        set.insert((self.score(base), seq, base));
        seq += 1;
        if self.context.get(base).is_leaf() {
            return set;
        }

        let rounds = level.unsigned_abs() as usize;
        let mut cur = base;
        for round in 0..rounds {
            let sort_level = [SortLevel::High, SortLevel::Middle, SortLevel::Low][round % 3];
            debug!(round, ?sort_level, "search round");

            let sorted = self.sort_canonical(cur, sort_level);
            let sorted = self.inner_simplify(sorted);
            self.record(&mut set, &mut seq, sorted);

            let combined = self.combine_powers(cur);
            let combined = self.inner_simplify(combined);
            self.record(&mut set, &mut seq, combined);

            let signed = self.normalize_signs(cur);
            let signed = self.inner_simplify(signed);
            self.record(&mut set, &mut seq, signed);

            if let Some(divided) = self.poly_division_stage(cur) {
                let divided = self.inner_simplify(divided);
                self.record(&mut set, &mut seq, divided);
                cur = divided;
            }

            if self.contains_trig(cur) {
                let trigged = self.trig_pass(cur);
                if trigged != cur {
                    let trigged = self.inner_simplify(trigged);
                    self.record(&mut set, &mut seq, trigged);
                }
            }

            if self.contains_factorial(cur) {
                let collapsed = self.factorial_pass(cur);
                if collapsed != cur {
                    let collapsed = self.inner_simplify(collapsed);
                    self.record(&mut set, &mut seq, collapsed);
                }
            }

            let mut vars: Vec<SymbolId> =
                collect_variables(&self.context, cur).into_iter().collect();
            vars.sort();
            for var in vars {
                if let Some(rebuilt) = self.poly_reconstruct(cur, var) {
                    let rebuilt = self.inner_simplify(rebuilt);
                    self.record(&mut set, &mut seq, rebuilt);
                    if self.score(rebuilt) < self.score(cur) {
                        cur = rebuilt;
                    }
                }
            }
        }

        if level > 0 {
            let best = match set.iter().next() {
                Some(&(_, _, e)) => e,
                None => base,
            };
            let expanded = self.expand(best);
            let expanded = self.simplify_level(expanded, -level);
            self.record(&mut set, &mut seq, expanded);
            let factored = self.factorize(best);
            let factored = self.simplify_level(factored, -level);
            self.record(&mut set, &mut seq, factored);
        }
        set
    }

    /// Record a candidate and, when the canonical sort rearranges it into a
    /// cheaper shape, that shape as well. Later sequence numbers lose ties.
    fn record(&mut self, set: &mut BTreeSet<(u64, u64, ExprId)>, seq: &mut u64, id: ExprId) {
        set.insert((self.score(id), *seq, id));
        *seq += 1;
        let sorted = self.sort_canonical(id, SortLevel::High);
        if sorted != id {
            set.insert((self.score(sorted), *seq, sorted));
            *seq += 1;
        }
    }

    fn contains_trig(&self, id: ExprId) -> bool {
        count_nodes_matching(&self.context, id, |e| {
            matches!(
                e,
                Expr::Func(
                    UnaryFn::Sin
                        | UnaryFn::Cos
                        | UnaryFn::Tan
                        | UnaryFn::Cotan
                        | UnaryFn::Arcsin
                        | UnaryFn::Arccos
                        | UnaryFn::Arctan
                        | UnaryFn::Arccotan,
                    _,
                )
            )
        }) > 0
    }

    fn contains_factorial(&self, id: ExprId) -> bool {
        count_nodes_matching(&self.context, id, |e| {
            matches!(e, Expr::Func(UnaryFn::Factorial, _))
        }) > 0
    }

    /// Monomial map of `id` in `var` with folded coefficients; zero
    /// coefficients drop out.
    pub(crate) fn cleaned_monomials(
        &mut self,
        id: ExprId,
        var: SymbolId,
    ) -> Option<BTreeMap<i64, ExprId>> {
        let raw = gather_monomials(&mut self.context, id, var)?;
        let mut out = BTreeMap::new();
        for (power, coeff) in raw {
            let c = self.inner_simplify(coeff);
            if self.is_num_zero(c) {
                continue;
            }
            out.insert(power, c);
        }
        Some(out)
    }

    /// Long division over a univariate rational quotient: `(x^2+3x+2)/(x+1)`
    /// becomes `x+2`, keeping a remainder fraction when one survives.
    fn poly_division_stage(&mut self, id: ExprId) -> Option<ExprId> {
        let Expr::Div(num, den) = *self.context.get(id) else {
            return None;
        };
        let vars: Vec<SymbolId> = collect_variables(&self.context, id).into_iter().collect();
        let &[var] = &vars[..] else {
            return None;
        };
        let num_map = self.cleaned_monomials(num, var)?;
        let den_map = self.cleaned_monomials(den, var)?;
        let nc = dense_coeffs(&self.context, &num_map)?;
        let dc = dense_coeffs(&self.context, &den_map)?;
        if dc.is_empty() || nc.len() < dc.len() {
            return None;
        }
        let (quot, rem) = poly_divide(&nc, &dc)?;
        if quot.is_empty() {
            return None;
        }
        let qe = poly_to_expr(&mut self.context, &quot, var);
        if rem.is_empty() {
            return Some(qe);
        }
        let re = poly_to_expr(&mut self.context, &rem, var);
        let frac = self.context.add(Expr::Div(re, den));
        Some(self.context.add(Expr::Add(qe, frac)))
    }

    /// Rebuild as a descending monomial chain when at least two terms
    /// gather; catches the like-term merges the shallow rules miss.
    fn poly_reconstruct(&mut self, id: ExprId, var: SymbolId) -> Option<ExprId> {
        let map = self.cleaned_monomials(id, var)?;
        if map.len() < 2 {
            return None;
        }
        Some(monomials_to_expr(&mut self.context, &map, var))
    }
}
