//! The engine owns the expression arena and the rewrite caches.
//!
//! Evaluation, simplification and limits are implemented as `impl Engine`
//! blocks spread over the modules that host them; this file only defines
//! the struct, its caches and a handful of helpers everything shares.

use liminal_ast::{Codomain, Context, Expr, ExprId};
use liminal_num::Numeric;
use rustc_hash::FxHashMap;

use crate::options::{EngineOptions, ValueDomain};

/// Rewrite engine over a [`Context`] arena.
///
/// Both caches are keyed by `(node, options fingerprint)` so results remain
/// valid across option changes without being flushed.
pub struct Engine {
    pub context: Context,
    pub options: EngineOptions,
    pub(crate) eval_cache: FxHashMap<(ExprId, u64), ExprId>,
    pub(crate) simp_cache: FxHashMap<(ExprId, u64), ExprId>,
    pub(crate) fingerprint: u64,
    /// Guard against limit markers re-entering the limit engine from inside
    /// a simplification triggered by the limit engine itself.
    pub(crate) limit_reentry: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let fingerprint = options.fingerprint();
        Engine {
            context: Context::new(),
            options,
            eval_cache: FxHashMap::default(),
            simp_cache: FxHashMap::default(),
            fingerprint,
            limit_reentry: 0,
        }
    }

    /// Installs new options and refreshes the cache fingerprint.
    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
        self.fingerprint = self.options.fingerprint();
    }

    /// Complexity of `id` under the configured measure.
    pub fn score(&self, id: ExprId) -> u64 {
        self.options.score(&self.context, id)
    }

    pub(crate) fn number(&mut self, n: Numeric) -> ExprId {
        self.context.number(n)
    }

    pub(crate) fn as_number(&self, id: ExprId) -> Option<&Numeric> {
        self.context.as_number(id)
    }

    pub(crate) fn is_num_zero(&self, id: ExprId) -> bool {
        self.as_number(id).map(Numeric::is_zero).unwrap_or(false)
    }

    pub(crate) fn is_num_one(&self, id: ExprId) -> bool {
        self.as_number(id).map(Numeric::is_one).unwrap_or(false)
    }

    /// Whether committing `candidate` would violate the configured value
    /// domain. Only rewrites are gated; literals already present in the
    /// input are never rejected.
    pub(crate) fn fits_value_domain(&self, candidate: ExprId) -> bool {
        match self.options.value_domain {
            ValueDomain::Complex => true,
            ValueDomain::RealOnly => match self.context.codomain(candidate) {
                Codomain::Complex => false,
                // unbound variables classify as Any; fall back to scanning
                // for complex literals
                Codomain::Any => !self.contains_complex_number(candidate),
                _ => true,
            },
        }
    }

    fn contains_complex_number(&self, root: ExprId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Expr::Number(n) = self.context.get(id) {
                if matches!(n, Numeric::Complex(_)) {
                    return true;
                }
            }
            stack.extend(self.context.children(id));
        }
        false
    }

    /// True when every literal under `root` is a finite number. Symbolic
    /// leaves are fine; infinities and NaN are not.
    pub(crate) fn fully_finite(&self, root: ExprId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Expr::Number(n) = self.context.get(id) {
                if !n.is_finite() {
                    return false;
                }
            }
            stack.extend(self.context.children(id));
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_uses_configured_measure() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let y = eng.context.var("y");
        let sum = eng.context.add(Expr::Add(x, y));
        assert_eq!(eng.score(sum), 3);
    }

    #[test]
    fn fully_finite_rejects_sentinels() {
        let mut eng = Engine::new();
        let x = eng.context.var("x");
        let inf = eng.number(Numeric::pos_inf());
        let sum = eng.context.add(Expr::Add(x, inf));
        assert!(eng.fully_finite(x));
        assert!(!eng.fully_finite(sum));
    }

    #[test]
    fn value_domain_gate_spots_complex_literals() {
        let mut eng = Engine::with_options(
            EngineOptions::default().with_value_domain(ValueDomain::RealOnly),
        );
        let i = eng.number(Numeric::imaginary_unit());
        let three = eng.context.num(3);
        assert!(!eng.fits_value_domain(i));
        assert!(eng.fits_value_domain(three));
    }

    #[test]
    fn value_domain_gate_follows_the_codomain_classification() {
        use liminal_ast::UnaryFn;
        let mut eng = Engine::with_options(
            EngineOptions::default().with_value_domain(ValueDomain::RealOnly),
        );
        let i = eng.number(Numeric::imaginary_unit());
        // |i| is real no matter what sits underneath
        let mag = eng.context.func(UnaryFn::Abs, i);
        assert!(eng.fits_value_domain(mag));

        let three = eng.context.num(3);
        let mixed = eng.context.add(Expr::Add(three, i));
        assert!(!eng.fits_value_domain(mixed));

        // a complex literal under an unbound variable still trips the gate
        let x = eng.context.var("x");
        let tainted = eng.context.add(Expr::Add(x, i));
        assert!(!eng.fits_value_domain(tainted));
    }
}
