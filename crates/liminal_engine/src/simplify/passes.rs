//! Whole-tree restructuring passes.
//!
//! Each pass walks bottom-up and rewrites one family of shapes: canonical
//! operand order, shared-base power merging, sign placement, the exact
//! trigonometric tables and factorial quotients. Passes leave folding and
//! identity cleanup to `inner_simplify`; the driver always re-simplifies
//! after a pass and keeps a candidate only when it scores better.

use std::cmp::Ordering;

use liminal_ast::{
    collect_variables, compare_with_level, Constant, Context, Expr, ExprId, SortLevel, UnaryFn,
};
use liminal_num::Numeric;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::engine::Engine;
use crate::poly::{linear_children, mul_children};

// ============================================================
// Canonical ordering
// ============================================================

impl Engine {
    /// Reorder the operands of commutative chains into canonical order.
    pub(crate) fn sort_canonical(&mut self, id: ExprId, level: SortLevel) -> ExprId {
        self.sort_rec(id, level, 0)
    }

    fn sort_rec(&mut self, id: ExprId, level: SortLevel, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        match self.context.get(id) {
            Expr::Add(..) | Expr::Sub(..) => {
                let mut terms = linear_children(&self.context, id);
                for term in &mut terms {
                    term.0 = self.sort_rec(term.0, level, depth + 1);
                }
                terms.sort_by(|a, b| compare_with_level(&self.context, a.0, b.0, level));
                self.rebuild_sum(&terms)
            }
            Expr::Mul(..) => {
                let mut factors = mul_children(&self.context, id);
                for factor in &mut factors {
                    *factor = self.sort_rec(*factor, level, depth + 1);
                }
                factors.sort_by(|a, b| compare_with_level(&self.context, *a, *b, level));
                self.rebuild_product(&factors)
            }
            _ => {
                let kids: Vec<ExprId> = self
                    .context
                    .children(id)
                    .iter()
                    .map(|&k| self.sort_rec(k, level, depth + 1))
                    .collect();
                self.context.rebuild(id, &kids)
            }
        }
    }

    /// Left-associated sum from signed terms; the leading term carries its
    /// own negation.
    pub(crate) fn rebuild_sum(&mut self, terms: &[(ExprId, bool)]) -> ExprId {
        let mut acc: Option<ExprId> = None;
        for &(term, negated) in terms {
            acc = Some(match acc {
                None if negated => self.context.add(Expr::Neg(term)),
                None => term,
                Some(a) if negated => self.context.add(Expr::Sub(a, term)),
                Some(a) => self.context.add(Expr::Add(a, term)),
            });
        }
        match acc {
            Some(a) => a,
            None => self.context.num(0),
        }
    }

    pub(crate) fn rebuild_product(&mut self, factors: &[ExprId]) -> ExprId {
        let mut acc: Option<ExprId> = None;
        for &factor in factors {
            acc = Some(match acc {
                None => factor,
                Some(a) => self.context.add(Expr::Mul(a, factor)),
            });
        }
        match acc {
            Some(a) => a,
            None => self.context.num(1),
        }
    }
}

// ============================================================
// Power combining
// ============================================================

impl Engine {
    /// Merge factors over a shared base into one power and cancel power
    /// quotients: `x * y * x^2` becomes `x^(1+2) * y`, `x^5 / x^2` becomes
    /// `x^(5-2)`. Exponent arithmetic is left for the follow-up simplify.
    pub(crate) fn combine_powers(&mut self, id: ExprId) -> ExprId {
        self.combine_rec(id, 0)
    }

    fn combine_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        match *self.context.get(id) {
            Expr::Mul(..) => {
                let raw = mul_children(&self.context, id);
                let mut factors = Vec::with_capacity(raw.len());
                for factor in raw {
                    factors.push(self.combine_rec(factor, depth + 1));
                }
                self.merge_product(&factors)
            }
            Expr::Div(a, b) => {
                let a = self.combine_rec(a, depth + 1);
                let b = self.combine_rec(b, depth + 1);
                let (ba, ea) = base_exp(&self.context, a);
                let (bb, eb) = base_exp(&self.context, b);
                if ba == bb && (ea.is_some() || eb.is_some()) {
                    let one = self.context.num(1);
                    let ea = ea.unwrap_or(one);
                    let eb = eb.unwrap_or(one);
                    let e = self.context.add(Expr::Sub(ea, eb));
                    self.context.add(Expr::Pow(ba, e))
                } else {
                    self.context.rebuild(id, &[a, b])
                }
            }
            _ => {
                let kids: Vec<ExprId> = self
                    .context
                    .children(id)
                    .iter()
                    .map(|&k| self.combine_rec(k, depth + 1))
                    .collect();
                self.context.rebuild(id, &kids)
            }
        }
    }

    fn merge_product(&mut self, factors: &[ExprId]) -> ExprId {
        // group by base in first-appearance order
        let mut groups: Vec<(ExprId, Vec<(ExprId, Option<ExprId>)>)> = Vec::new();
        for &factor in factors {
            let (base, exp) = base_exp(&self.context, factor);
            match groups.iter_mut().find(|(b, _)| *b == base) {
                Some((_, members)) => members.push((factor, exp)),
                None => groups.push((base, vec![(factor, exp)])),
            }
        }
        let mut rebuilt = Vec::with_capacity(groups.len());
        for (base, members) in groups {
            if members.len() == 1 {
                rebuilt.push(members[0].0);
                continue;
            }
            let mut total: Option<ExprId> = None;
            for (_, exp) in members {
                let e = match exp {
                    Some(e) => e,
                    None => self.context.num(1),
                };
                total = Some(match total {
                    None => e,
                    Some(t) => self.context.add(Expr::Add(t, e)),
                });
            }
            if let Some(e) = total {
                rebuilt.push(self.context.add(Expr::Pow(base, e)));
            }
        }
        self.rebuild_product(&rebuilt)
    }
}

fn base_exp(ctx: &Context, id: ExprId) -> (ExprId, Option<ExprId>) {
    match ctx.get(id) {
        Expr::Pow(b, e) => (*b, Some(*e)),
        _ => (id, None),
    }
}

// ============================================================
// Sign normalization
// ============================================================

impl Engine {
    /// Pull negations outward and rewrite negative exponents as quotients:
    /// `(-a)*(-b)` loses both signs, `a*(-b)` becomes `-(a*b)`, `x^-n`
    /// becomes `1/x^n`, `a + (-b)` becomes `a - b`.
    pub(crate) fn normalize_signs(&mut self, id: ExprId) -> ExprId {
        self.signs_rec(id, 0)
    }

    fn signs_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        let kids: Vec<ExprId> = self
            .context
            .children(id)
            .iter()
            .map(|&k| self.signs_rec(k, depth + 1))
            .collect();
        let node = self.context.rebuild(id, &kids);
        self.sign_rules(node)
    }

    fn sign_rules(&mut self, id: ExprId) -> ExprId {
        match *self.context.get(id) {
            Expr::Mul(a, b) => {
                let (na, ca) = self.strip_negation(a);
                let (nb, cb) = self.strip_negation(b);
                if !na && !nb {
                    return id;
                }
                let core = match (ca, cb) {
                    (Some(x), Some(y)) => self.context.add(Expr::Mul(x, y)),
                    (Some(x), None) | (None, Some(x)) => x,
                    (None, None) => self.context.num(1),
                };
                if na != nb {
                    self.context.add(Expr::Neg(core))
                } else {
                    core
                }
            }
            Expr::Div(a, b) => {
                let (na, ca) = self.strip_negation(a);
                let (nb, cb) = self.strip_negation(b);
                if !na && !nb {
                    return id;
                }
                let numer = match ca {
                    Some(x) => x,
                    None => self.context.num(1),
                };
                let core = match cb {
                    Some(y) => self.context.add(Expr::Div(numer, y)),
                    None => numer,
                };
                if na != nb {
                    self.context.add(Expr::Neg(core))
                } else {
                    core
                }
            }
            Expr::Pow(base, exp) => match self.context.get(exp).clone() {
                Expr::Neg(inner) => {
                    let one = self.context.num(1);
                    let p = self.context.add(Expr::Pow(base, inner));
                    self.context.add(Expr::Div(one, p))
                }
                Expr::Number(n) if n.sign() == Some(Ordering::Less) => {
                    let magnitude = n.neg();
                    let one = self.context.num(1);
                    let den = if magnitude.is_one() {
                        base
                    } else {
                        let e = self.number(magnitude);
                        self.context.add(Expr::Pow(base, e))
                    };
                    self.context.add(Expr::Div(one, den))
                }
                _ => id,
            },
            Expr::Add(a, b) => {
                if let Expr::Neg(nb) = *self.context.get(b) {
                    return self.context.add(Expr::Sub(a, nb));
                }
                if let Some(n) = self.negative_literal(b) {
                    let p = self.number(n.neg());
                    return self.context.add(Expr::Sub(a, p));
                }
                id
            }
            Expr::Sub(a, b) => {
                if let Expr::Neg(nb) = *self.context.get(b) {
                    return self.context.add(Expr::Add(a, nb));
                }
                if let Some(n) = self.negative_literal(b) {
                    let p = self.number(n.neg());
                    return self.context.add(Expr::Add(a, p));
                }
                id
            }
            _ => id,
        }
    }

    /// `(true, core)` when `id` wraps a negation: a `Neg` node or a negative
    /// literal. A bare `-1` strips to no factor at all.
    fn strip_negation(&mut self, id: ExprId) -> (bool, Option<ExprId>) {
        if let Expr::Neg(x) = *self.context.get(id) {
            return (true, Some(x));
        }
        if let Some(n) = self.negative_literal(id) {
            let magnitude = n.neg();
            if magnitude.is_one() {
                return (true, None);
            }
            let p = self.number(magnitude);
            return (true, Some(p));
        }
        (false, Some(id))
    }

    fn negative_literal(&self, id: ExprId) -> Option<Numeric> {
        self.as_number(id)
            .filter(|n| n.sign() == Some(Ordering::Less))
            .cloned()
    }
}

// ============================================================
// Trigonometric tables
// ============================================================

impl Engine {
    /// Exact trigonometry beyond the quarter-turn grid: values at rational
    /// multiples of pi down to twelfths, the inverse-function lookup table,
    /// the Pythagorean identity and the sine double angle.
    pub(crate) fn trig_pass(&mut self, id: ExprId) -> ExprId {
        self.trig_rec(id, 0)
    }

    fn trig_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        let kids: Vec<ExprId> = self
            .context
            .children(id)
            .iter()
            .map(|&k| self.trig_rec(k, depth + 1))
            .collect();
        let node = self.context.rebuild(id, &kids);
        self.trig_rules(node)
    }

    fn trig_rules(&mut self, id: ExprId) -> ExprId {
        match *self.context.get(id) {
            Expr::Func(f, u) => match f {
                UnaryFn::Sin | UnaryFn::Cos | UnaryFn::Tan | UnaryFn::Cotan => {
                    let q = as_pi_rational(&self.context, u);
                    match q.and_then(|q| self.eval_pi_twelfth(f, &q)) {
                        Some(out) => out,
                        None => id,
                    }
                }
                UnaryFn::Arcsin | UnaryFn::Arccos | UnaryFn::Arctan | UnaryFn::Arccotan => {
                    self.inverse_trig_table(id, f, u)
                }
                _ => id,
            },
            Expr::Add(..) | Expr::Sub(..) => self.pythagorean(id),
            Expr::Mul(..) => self.double_angle(id),
            _ => id,
        }
    }

    fn eval_pi_twelfth(&mut self, f: UnaryFn, q: &BigRational) -> Option<ExprId> {
        let t = q * BigRational::from_integer(BigInt::from(12));
        if !t.is_integer() {
            return None;
        }
        let i = t.to_integer().mod_floor(&BigInt::from(24)).to_i64()?;
        match f {
            UnaryFn::Sin => self.sin_at(i),
            // cos is sin shifted a quarter turn
            UnaryFn::Cos => self.sin_at((i + 6) % 24),
            UnaryFn::Tan => self.tan_at(i % 12, false),
            UnaryFn::Cotan => self.tan_at(i % 12, true),
            _ => None,
        }
    }

    fn sin_at(&mut self, i: i64) -> Option<ExprId> {
        let (negated, j) = if i >= 12 { (true, i - 12) } else { (false, i) };
        let body = self.sin_twelfth(j)?;
        if negated && j != 0 && j != 12 {
            Some(self.context.add(Expr::Neg(body)))
        } else {
            Some(body)
        }
    }

    /// `sin(j * pi/12)` for `j` in `0..=12`; `None` outside the supported
    /// sixth/quarter grid.
    fn sin_twelfth(&mut self, j: i64) -> Option<ExprId> {
        match j {
            0 | 12 => Some(self.context.num(0)),
            6 => Some(self.context.num(1)),
            2 | 10 => {
                let half = Numeric::rational(1, 2).ok()?;
                Some(self.number(half))
            }
            3 | 9 => {
                let rt = self.sqrt_of(2)?;
                let two = self.context.num(2);
                Some(self.context.add(Expr::Div(rt, two)))
            }
            4 | 8 => {
                let rt = self.sqrt_of(3)?;
                let two = self.context.num(2);
                Some(self.context.add(Expr::Div(rt, two)))
            }
            _ => None,
        }
    }

    /// `tan(j * pi/12)` (or cotangent) for `j` in `0..12`.
    fn tan_at(&mut self, j: i64, cot: bool) -> Option<ExprId> {
        let (denom, negated) = match (cot, j) {
            (false, 0) | (true, 6) => return Some(self.context.num(0)),
            (false, 6) | (true, 0) => return Some(self.number(Numeric::nan())),
            (false, 3) | (true, 3) => return Some(self.context.num(1)),
            (false, 9) | (true, 9) => {
                let one = self.context.num(1);
                return Some(self.context.add(Expr::Neg(one)));
            }
            (false, 2) | (true, 4) => (Some(3), false),
            (false, 4) | (true, 2) => (None, false),
            (false, 10) | (true, 8) => (Some(3), true),
            (false, 8) | (true, 10) => (None, true),
            _ => return None,
        };
        let rt = self.sqrt_of(3)?;
        let body = match denom {
            Some(d) => {
                let d = self.context.num(d);
                self.context.add(Expr::Div(rt, d))
            }
            None => rt,
        };
        if negated {
            Some(self.context.add(Expr::Neg(body)))
        } else {
            Some(body)
        }
    }

    fn sqrt_of(&mut self, n: i64) -> Option<ExprId> {
        let base = self.context.num(n);
        let half = self.number(Numeric::rational(1, 2).ok()?);
        Some(self.context.add(Expr::Pow(base, half)))
    }

    /// Exact inverse-trigonometric values at rational arguments.
    fn inverse_trig_table(&mut self, id: ExprId, f: UnaryFn, u: ExprId) -> ExprId {
        let Some(r) = self.as_number(u).and_then(|n| n.to_rational_exact().ok()) else {
            return id;
        };
        let hit = match f {
            UnaryFn::Arcsin => {
                if r == ratio(1, 1) {
                    Some((false, self.pi_fraction(1, 2)))
                } else if r == ratio(-1, 1) {
                    Some((true, self.pi_fraction(1, 2)))
                } else if r == ratio(1, 2) {
                    Some((false, self.pi_fraction(1, 6)))
                } else if r == ratio(-1, 2) {
                    Some((true, self.pi_fraction(1, 6)))
                } else {
                    None
                }
            }
            UnaryFn::Arccos => {
                if r.is_zero() {
                    Some((false, self.pi_fraction(1, 2)))
                } else if r == ratio(-1, 1) {
                    Some((false, self.context.constant(Constant::Pi)))
                } else if r == ratio(1, 2) {
                    Some((false, self.pi_fraction(1, 3)))
                } else if r == ratio(-1, 2) {
                    Some((false, self.pi_fraction(2, 3)))
                } else {
                    None
                }
            }
            UnaryFn::Arctan => {
                if r == ratio(1, 1) {
                    Some((false, self.pi_fraction(1, 4)))
                } else if r == ratio(-1, 1) {
                    Some((true, self.pi_fraction(1, 4)))
                } else {
                    None
                }
            }
            UnaryFn::Arccotan => {
                if r.is_zero() {
                    Some((false, self.pi_fraction(1, 2)))
                } else if r == ratio(1, 1) {
                    Some((false, self.pi_fraction(1, 4)))
                } else if r == ratio(-1, 1) {
                    Some((true, self.pi_fraction(1, 4)))
                } else {
                    None
                }
            }
            _ => None,
        };
        match hit {
            Some((true, e)) => self.context.add(Expr::Neg(e)),
            Some((false, e)) => e,
            None => id,
        }
    }

    fn pi_fraction(&mut self, numer: i64, denom: i64) -> ExprId {
        let pi = self.context.constant(Constant::Pi);
        let scaled = if numer == 1 {
            pi
        } else {
            let n = self.context.num(numer);
            self.context.add(Expr::Mul(n, pi))
        };
        if denom == 1 {
            scaled
        } else {
            let d = self.context.num(denom);
            self.context.add(Expr::Div(scaled, d))
        }
    }

    /// `sin(u)^2 + cos(u)^2` collapses to `1`; the mixed-sign pairs fold to
    /// the cosine double angle.
    fn pythagorean(&mut self, id: ExprId) -> ExprId {
        let mut terms = linear_children(&self.context, id);
        let mut changed = false;
        'rescan: loop {
            for ia in 0..terms.len() {
                let Some((fa, ua)) = self.trig_square(terms[ia].0) else {
                    continue;
                };
                for ib in (ia + 1)..terms.len() {
                    let Some((fb, ub)) = self.trig_square(terms[ib].0) else {
                        continue;
                    };
                    if ua != ub || fa == fb {
                        continue;
                    }
                    let sin_neg = if fa == UnaryFn::Sin { terms[ia].1 } else { terms[ib].1 };
                    let cos_neg = if fa == UnaryFn::Cos { terms[ia].1 } else { terms[ib].1 };
                    let replacement = match (sin_neg, cos_neg) {
                        (false, false) => (self.context.num(1), false),
                        (true, true) => (self.context.num(1), true),
                        _ => {
                            // cos^2 - sin^2 = cos(2u), sign follows the cosine
                            let two = self.context.num(2);
                            let double = self.context.add(Expr::Mul(two, ua));
                            (self.context.func(UnaryFn::Cos, double), cos_neg)
                        }
                    };
                    terms.remove(ib);
                    terms[ia] = replacement;
                    changed = true;
                    continue 'rescan;
                }
            }
            break;
        }
        if changed {
            self.rebuild_sum(&terms)
        } else {
            id
        }
    }

    fn trig_square(&self, id: ExprId) -> Option<(UnaryFn, ExprId)> {
        if let Expr::Pow(b, e) = self.context.get(id) {
            let squared = self
                .as_number(*e)
                .and_then(Numeric::to_i64_exact)
                .is_some_and(|v| v == 2);
            if !squared {
                return None;
            }
            if let Expr::Func(f @ (UnaryFn::Sin | UnaryFn::Cos), u) = self.context.get(*b) {
                return Some((*f, *u));
            }
        }
        None
    }

    /// `sin(u) * cos(u)` inside a product becomes `sin(2u)/2`, halving an
    /// existing numeric coefficient when one is present.
    fn double_angle(&mut self, id: ExprId) -> ExprId {
        let factors = mul_children(&self.context, id);
        let mut pair: Option<(usize, usize, ExprId)> = None;
        'search: for (si, &f) in factors.iter().enumerate() {
            if let Expr::Func(UnaryFn::Sin, u) = self.context.get(f) {
                let su = *u;
                for (ci, &g) in factors.iter().enumerate() {
                    if ci == si {
                        continue;
                    }
                    if let Expr::Func(UnaryFn::Cos, v) = self.context.get(g) {
                        if *v == su {
                            pair = Some((si, ci, su));
                            break 'search;
                        }
                    }
                }
            }
        }
        let Some((si, ci, u)) = pair else {
            return id;
        };
        let two = self.context.num(2);
        let double = self.context.add(Expr::Mul(two, u));
        let sin2 = self.context.func(UnaryFn::Sin, double);
        let mut halved = false;
        let mut rest = Vec::with_capacity(factors.len() - 1);
        for (ix, &factor) in factors.iter().enumerate() {
            if ix == si || ix == ci {
                continue;
            }
            if !halved {
                if let Some(n) = self.as_number(factor).cloned() {
                    let h = n.div(&Numeric::int(2), &self.options.num);
                    rest.push(self.number(h));
                    halved = true;
                    continue;
                }
            }
            rest.push(factor);
        }
        if halved {
            rest.push(sin2);
        } else {
            let two = self.context.num(2);
            rest.push(self.context.add(Expr::Div(sin2, two)));
        }
        self.rebuild_product(&rest)
    }
}

fn ratio(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}

// ============================================================
// Factorial quotients
// ============================================================

impl Engine {
    /// Collapse factorial quotients with a literal shift and absorb a
    /// successor factor: `(n+1)!/n!` becomes `n+1`, `(n+1)*n!` becomes
    /// `(n+1)!`.
    pub(crate) fn factorial_pass(&mut self, id: ExprId) -> ExprId {
        self.factorial_rec(id, 0)
    }

    fn factorial_rec(&mut self, id: ExprId, depth: usize) -> ExprId {
        if depth > self.options.max_depth {
            return id;
        }
        let kids: Vec<ExprId> = self
            .context
            .children(id)
            .iter()
            .map(|&k| self.factorial_rec(k, depth + 1))
            .collect();
        let node = self.context.rebuild(id, &kids);
        self.factorial_rules(node)
    }

    fn factorial_rules(&mut self, id: ExprId) -> ExprId {
        const MAX_SHIFT: i64 = 12;
        match *self.context.get(id) {
            Expr::Div(a, b) => {
                let fa = match *self.context.get(a) {
                    Expr::Func(UnaryFn::Factorial, inner) => inner,
                    _ => return id,
                };
                let fb = match *self.context.get(b) {
                    Expr::Func(UnaryFn::Factorial, inner) => inner,
                    _ => return id,
                };
                let Some(k) = self.literal_shift(fa, fb) else {
                    return id;
                };
                if k == 0 {
                    return self.context.num(1);
                }
                if k > 0 && k <= MAX_SHIFT {
                    return self.rising_product(fb, k);
                }
                if k < 0 && k >= -MAX_SHIFT {
                    let prod = self.rising_product(fa, -k);
                    let one = self.context.num(1);
                    return self.context.add(Expr::Div(one, prod));
                }
                id
            }
            Expr::Mul(a, b) => {
                for (u, v) in [(a, b), (b, a)] {
                    if let Expr::Func(UnaryFn::Factorial, inner) = *self.context.get(v) {
                        let one = self.context.num(1);
                        let succ = self.context.add(Expr::Add(inner, one));
                        if self.literal_shift(u, succ) == Some(0) {
                            return self.context.func(UnaryFn::Factorial, u);
                        }
                    }
                }
                id
            }
            _ => id,
        }
    }

    /// Integer value of `a - b` when the difference reduces to a literal,
    /// through the single-variable monomial view when plain folding cannot
    /// see it.
    fn literal_shift(&mut self, a: ExprId, b: ExprId) -> Option<i64> {
        let delta = self.context.add(Expr::Sub(a, b));
        let delta = self.inner_simplify(delta);
        if let Some(k) = self.as_number(delta).and_then(Numeric::to_i64_exact) {
            return Some(k);
        }
        let vars: Vec<_> = collect_variables(&self.context, delta).into_iter().collect();
        let &[var] = &vars[..] else {
            return None;
        };
        let map = self.cleaned_monomials(delta, var)?;
        match map.len() {
            0 => Some(0),
            1 => {
                let (&power, &coeff) = map.iter().next()?;
                if power != 0 {
                    return None;
                }
                self.as_number(coeff).and_then(Numeric::to_i64_exact)
            }
            _ => None,
        }
    }

    /// `(base+1)(base+2)...(base+k)`.
    fn rising_product(&mut self, base: ExprId, k: i64) -> ExprId {
        let mut acc: Option<ExprId> = None;
        for i in 1..=k {
            let step = self.context.num(i);
            let term = self.context.add(Expr::Add(base, step));
            let term = self.inner_simplify(term);
            acc = Some(match acc {
                None => term,
                Some(p) => self.context.add(Expr::Mul(p, term)),
            });
        }
        match acc {
            Some(p) => p,
            None => self.context.num(1),
        }
    }
}

// ============================================================
// Pi-multiple recognition
// ============================================================

/// Rational `q` such that the expression equals `q * pi`, when it has that
/// shape syntactically. A literal zero counts as `0 * pi`.
pub(crate) fn as_pi_rational(ctx: &Context, id: ExprId) -> Option<BigRational> {
    match ctx.get(id) {
        Expr::Constant(Constant::Pi) => Some(BigRational::one()),
        Expr::Number(n) if n.is_exact_zero() => Some(BigRational::zero()),
        Expr::Neg(inner) => as_pi_rational(ctx, *inner).map(|q| -q),
        Expr::Mul(a, b) => {
            if let Some(q) = as_pi_rational(ctx, *b) {
                if let Expr::Number(n) = ctx.get(*a) {
                    return n.to_rational_exact().ok().map(|r| r * q);
                }
            }
            if let Some(q) = as_pi_rational(ctx, *a) {
                if let Expr::Number(n) = ctx.get(*b) {
                    return n.to_rational_exact().ok().map(|r| r * q);
                }
            }
            None
        }
        Expr::Div(a, b) => {
            let q = as_pi_rational(ctx, *a)?;
            if let Expr::Number(n) = ctx.get(*b) {
                let r = n.to_rational_exact().ok()?;
                if r.is_zero() {
                    return None;
                }
                return Some(q / r);
            }
            None
        }
        _ => None,
    }
}

/// Exact value on the quarter-turn grid: `q` counts half-turns in units of
/// pi, so `q*2` must be an integer. Poles come back as NaN.
pub(crate) fn quarter_turn(f: UnaryFn, q: &BigRational) -> Option<Numeric> {
    let h = q * BigRational::from_integer(BigInt::from(2));
    if !h.is_integer() {
        return None;
    }
    let idx = h.to_integer().mod_floor(&BigInt::from(4)).to_i64()?;
    let v = match (f, idx) {
        (UnaryFn::Sin, 0 | 2) => Numeric::int(0),
        (UnaryFn::Sin, 1) => Numeric::int(1),
        (UnaryFn::Sin, 3) => Numeric::int(-1),
        (UnaryFn::Cos, 0) => Numeric::int(1),
        (UnaryFn::Cos, 1 | 3) => Numeric::int(0),
        (UnaryFn::Cos, 2) => Numeric::int(-1),
        (UnaryFn::Tan, 0 | 2) => Numeric::int(0),
        (UnaryFn::Tan, 1 | 3) => Numeric::nan(),
        (UnaryFn::Cotan, 0 | 2) => Numeric::nan(),
        (UnaryFn::Cotan, 1 | 3) => Numeric::int(0),
        _ => return None,
    };
    Some(v)
}
