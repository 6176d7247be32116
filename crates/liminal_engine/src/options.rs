//! Engine configuration.
//!
//! [`EngineOptions`] bundles everything a rewrite is allowed to depend on:
//! the numeric context, the value domain ceiling, the search effort level
//! and the complexity measure used to rank candidate forms. Results cached
//! inside the engine are keyed by a fingerprint of the semantically relevant
//! fields, so changing options never resurfaces stale rewrites.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use liminal_ast::{Context, Expr, ExprId};
use liminal_num::NumContext;
use rustc_hash::FxHasher;

/// Default search level for [`crate::Engine::simplify`].
pub const DEFAULT_LEVEL: i32 = 2;

/// Default bound on structural recursion depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Codomain ceiling for rewrites.
///
/// Under `RealOnly` a rewrite whose result introduces a complex number is
/// discarded and the pre-rewrite form kept, so `sqrt(-4)` stays symbolic
/// instead of folding to `2*i`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueDomain {
    /// Complex results are acceptable.
    #[default]
    Complex,
    /// Rewrites must not introduce complex numbers.
    RealOnly,
}

/// Complexity measure used to rank candidate forms. Lower is simpler.
pub type ComplexityFn = dyn Fn(&Context, ExprId) -> u64 + Send + Sync;

#[derive(Clone)]
pub struct EngineOptions {
    /// Numeric tower context used for every fold.
    pub num: NumContext,
    pub value_domain: ValueDomain,
    /// Search level used by `simplify`. Positive levels additionally explore
    /// expanded and factored forms of the best candidate.
    pub level: i32,
    /// Bound on structural recursion depth. Walks past the bound return the
    /// expression unchanged rather than overflow.
    pub max_depth: usize,
    complexity: Arc<ComplexityFn>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            num: NumContext::default(),
            value_domain: ValueDomain::default(),
            level: DEFAULT_LEVEL,
            max_depth: DEFAULT_MAX_DEPTH,
            complexity: Arc::new(default_complexity),
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("num", &self.num)
            .field("value_domain", &self.value_domain)
            .field("level", &self.level)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

impl EngineOptions {
    pub fn with_num(mut self, num: NumContext) -> Self {
        self.num = num;
        self
    }

    pub fn with_value_domain(mut self, domain: ValueDomain) -> Self {
        self.value_domain = domain;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replaces the complexity measure used to rank candidates.
    pub fn with_complexity(mut self, complexity: Arc<ComplexityFn>) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn score(&self, ctx: &Context, id: ExprId) -> u64 {
        (self.complexity)(ctx, id)
    }

    /// Hash of the fields cached rewrites depend on. The search level and
    /// the complexity measure only influence candidate ranking, never the
    /// meaning of a single cached rewrite, so they are left out.
    pub fn fingerprint(&self) -> u64 {
        let mut h = FxHasher::default();
        self.num.precision.hash(&mut h);
        self.num.downcast.hash(&mut h);
        self.num.zero_tolerance_exp.hash(&mut h);
        self.num.max_rational_magnitude.hash(&mut h);
        self.value_domain.hash(&mut h);
        self.max_depth.hash(&mut h);
        h.finish()
    }
}

/// Default complexity measure: a weighted node count.
///
/// Divisions and negative exponents cost extra so that `x^-2` ranks behind
/// `1/x^2` only through its shape, unresolved calculus markers are heavily
/// penalized, and non-finite literals rank behind any finite form so the
/// search prefers `pi/2` over `atan(+oo)`.
pub fn default_complexity(ctx: &Context, root: ExprId) -> u64 {
    let mut cost = 0u64;
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        cost += match ctx.get(id) {
            Expr::Number(n) if !n.is_finite() => 4,
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => 1,
            Expr::Div(_, _) => 2,
            Expr::Pow(_, e) => {
                let negative = ctx
                    .as_number(*e)
                    .map(|n| n.sign() == Some(std::cmp::Ordering::Less))
                    .unwrap_or(false);
                if negative {
                    3
                } else {
                    1
                }
            }
            Expr::Derivative { .. } | Expr::Integral { .. } | Expr::Limit { .. } => 3,
            _ => 1,
        };
        stack.extend(ctx.children(id));
    }
    cost
}
