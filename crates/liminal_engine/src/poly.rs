//! Polynomial views over the arena.
//!
//! `gather_monomials` splits an expression into `power -> coefficient`
//! monomials in one variable, with negative powers kept first-class so
//! rational shapes like `2/x + 3/x^2` stay visible to the limit solvers.
//! The dense helpers convert between exact-rational coefficient vectors and
//! canonical descending-power expressions.

use std::collections::BTreeMap;

use liminal_ast::{depends_on, Context, Expr, ExprId, SymbolId};
use liminal_num::Numeric;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// Monomial powers beyond this are treated as non-polynomial.
const MAX_MONOMIAL_POWER: i64 = 1_000_000;

/// Degree cap for the dense coefficient representation.
const MAX_DENSE_DEGREE: i64 = 512;

/// Flattens nested sums into `(term, negated)` pairs.
pub fn linear_children(ctx: &Context, id: ExprId) -> Vec<(ExprId, bool)> {
    let mut out = Vec::new();
    split_sum(ctx, id, false, &mut out);
    out
}

fn split_sum(ctx: &Context, id: ExprId, negated: bool, out: &mut Vec<(ExprId, bool)>) {
    match ctx.get(id) {
        Expr::Add(a, b) => {
            let (a, b) = (*a, *b);
            split_sum(ctx, a, negated, out);
            split_sum(ctx, b, negated, out);
        }
        Expr::Sub(a, b) => {
            let (a, b) = (*a, *b);
            split_sum(ctx, a, negated, out);
            split_sum(ctx, b, !negated, out);
        }
        Expr::Neg(a) => {
            let a = *a;
            split_sum(ctx, a, !negated, out);
        }
        _ => out.push((id, negated)),
    }
}

/// Flattens nested products into a factor list. Negations are kept on the
/// factors; sign extraction is the sign-normalization pass's job.
pub fn mul_children(ctx: &Context, id: ExprId) -> Vec<ExprId> {
    let mut out = Vec::new();
    split_product(ctx, id, &mut out);
    out
}

fn split_product(ctx: &Context, id: ExprId, out: &mut Vec<ExprId>) {
    if let Expr::Mul(a, b) = ctx.get(id) {
        let (a, b) = (*a, *b);
        split_product(ctx, a, out);
        split_product(ctx, b, out);
    } else {
        out.push(id);
    }
}

/// Splits `id` into monomials in `var`, mapping each power to its
/// coefficient expression. Coefficients are built raw; callers fold them.
/// `None` when any additive term is not a monomial in `var`.
pub fn gather_monomials(
    ctx: &mut Context,
    id: ExprId,
    var: SymbolId,
) -> Option<BTreeMap<i64, ExprId>> {
    let mut map: BTreeMap<i64, ExprId> = BTreeMap::new();
    for (term, negated) in linear_children(ctx, id) {
        let (power, mut coeff) = parse_monomial(ctx, term, var)?;
        if negated {
            coeff = ctx.add(Expr::Neg(coeff));
        }
        let merged = match map.remove(&power) {
            Some(acc) => ctx.add(Expr::Add(acc, coeff)),
            None => coeff,
        };
        map.insert(power, merged);
    }
    Some(map)
}

fn parse_monomial(ctx: &mut Context, id: ExprId, var: SymbolId) -> Option<(i64, ExprId)> {
    if !depends_on(ctx, id, var) {
        return Some((0, id));
    }
    match ctx.get(id).clone() {
        Expr::Variable(s) if s == var => {
            let one = ctx.num(1);
            Some((1, one))
        }
        Expr::Pow(b, e) => {
            if !matches!(ctx.get(b), Expr::Variable(s) if *s == var) {
                return None;
            }
            let power = literal_int(ctx, e)?;
            if power.abs() > MAX_MONOMIAL_POWER {
                return None;
            }
            let one = ctx.num(1);
            Some((power, one))
        }
        Expr::Mul(a, b) => {
            let (pa, ca) = parse_monomial(ctx, a, var)?;
            let (pb, cb) = parse_monomial(ctx, b, var)?;
            let power = pa.checked_add(pb)?;
            if power.abs() > MAX_MONOMIAL_POWER {
                return None;
            }
            Some((power, mul_coeff(ctx, ca, cb)))
        }
        Expr::Div(a, b) => {
            let (pa, ca) = parse_monomial(ctx, a, var)?;
            let (pb, cb) = parse_monomial(ctx, b, var)?;
            let power = pa.checked_sub(pb)?;
            if power.abs() > MAX_MONOMIAL_POWER {
                return None;
            }
            if is_literal_one(ctx, cb) {
                Some((power, ca))
            } else {
                Some((power, ctx.add(Expr::Div(ca, cb))))
            }
        }
        Expr::Neg(a) => {
            let (power, coeff) = parse_monomial(ctx, a, var)?;
            Some((power, ctx.add(Expr::Neg(coeff))))
        }
        _ => None,
    }
}

fn literal_int(ctx: &Context, id: ExprId) -> Option<i64> {
    match ctx.get(id) {
        Expr::Number(n) => n.to_i64_exact(),
        Expr::Neg(a) => match ctx.get(*a) {
            Expr::Number(n) => n.to_i64_exact()?.checked_neg(),
            _ => None,
        },
        _ => None,
    }
}

fn mul_coeff(ctx: &mut Context, a: ExprId, b: ExprId) -> ExprId {
    if is_literal_one(ctx, a) {
        return b;
    }
    if is_literal_one(ctx, b) {
        return a;
    }
    ctx.add(Expr::Mul(a, b))
}

fn is_literal_one(ctx: &Context, id: ExprId) -> bool {
    ctx.as_number(id).map(Numeric::is_one).unwrap_or(false)
}

/// Dense ascending coefficients of an already-folded monomial map. Requires
/// every coefficient to be an exact rational literal and every power to be
/// non-negative.
pub fn dense_coeffs(ctx: &Context, map: &BTreeMap<i64, ExprId>) -> Option<Vec<BigRational>> {
    if map.is_empty() {
        return Some(Vec::new());
    }
    let (&min, _) = map.iter().next()?;
    let (&max, _) = map.iter().next_back()?;
    if min < 0 || max > MAX_DENSE_DEGREE {
        return None;
    }
    let mut out = vec![BigRational::zero(); max as usize + 1];
    for (&power, &coeff) in map {
        let n = ctx.as_number(coeff)?;
        out[power as usize] = n.to_rational_exact().ok()?;
    }
    Some(out)
}

/// Euclidean long division: `num = quot * den + rem` with
/// `deg(rem) < deg(den)`. `None` when the denominator is the zero
/// polynomial. Trailing zero coefficients are trimmed from the remainder.
pub fn poly_divide(
    num: &[BigRational],
    den: &[BigRational],
) -> Option<(Vec<BigRational>, Vec<BigRational>)> {
    let dd = degree_of(den)?;
    let dn = match degree_of(num) {
        Some(d) => d,
        None => return Some((Vec::new(), Vec::new())),
    };
    if dn < dd {
        return Some((Vec::new(), num.to_vec()));
    }
    let mut rem = num.to_vec();
    let mut quot = vec![BigRational::zero(); dn - dd + 1];
    let lead = &den[dd];
    for k in (0..=dn - dd).rev() {
        let c = rem[dd + k].clone();
        if c.is_zero() {
            continue;
        }
        let q = &c / lead;
        for (j, d) in den.iter().enumerate().take(dd + 1) {
            rem[j + k] = &rem[j + k] - &(d * &q);
        }
        quot[k] = q;
    }
    while rem.last().is_some_and(Zero::is_zero) {
        rem.pop();
    }
    Some((quot, rem))
}

fn degree_of(p: &[BigRational]) -> Option<usize> {
    p.iter().rposition(|c| !c.is_zero())
}

/// Rebuilds a dense coefficient vector as a descending-power sum.
pub fn poly_to_expr(ctx: &mut Context, coeffs: &[BigRational], var: SymbolId) -> ExprId {
    let mut acc: Option<ExprId> = None;
    for power in (0..coeffs.len()).rev() {
        let c = &coeffs[power];
        if c.is_zero() {
            continue;
        }
        let term = dense_term(ctx, c, power, var);
        acc = Some(match acc {
            Some(a) => ctx.add(Expr::Add(a, term)),
            None => term,
        });
    }
    match acc {
        Some(a) => a,
        None => ctx.num(0),
    }
}

fn dense_term(ctx: &mut Context, coeff: &BigRational, power: usize, var: SymbolId) -> ExprId {
    if power == 0 {
        return ctx.number(Numeric::from(coeff.clone()));
    }
    let x = ctx.var_id(var);
    let base = if power == 1 {
        x
    } else {
        let e = ctx.num(power as i64);
        ctx.add(Expr::Pow(x, e))
    };
    if coeff.is_one() {
        base
    } else if (-coeff).is_one() {
        ctx.add(Expr::Neg(base))
    } else {
        let c = ctx.number(Numeric::from(coeff.clone()));
        ctx.add(Expr::Mul(c, base))
    }
}

/// Rebuilds a monomial map as a descending-power sum. Negative powers come
/// back as divisions.
pub fn monomials_to_expr(
    ctx: &mut Context,
    map: &BTreeMap<i64, ExprId>,
    var: SymbolId,
) -> ExprId {
    let mut acc: Option<ExprId> = None;
    for (&power, &coeff) in map.iter().rev() {
        let term = sparse_term(ctx, coeff, power, var);
        acc = Some(match acc {
            Some(a) => ctx.add(Expr::Add(a, term)),
            None => term,
        });
    }
    match acc {
        Some(a) => a,
        None => ctx.num(0),
    }
}

fn sparse_term(ctx: &mut Context, coeff: ExprId, power: i64, var: SymbolId) -> ExprId {
    if power == 0 {
        return coeff;
    }
    let x = ctx.var_id(var);
    let mag = power.abs();
    let base = if mag == 1 {
        x
    } else {
        let e = ctx.num(mag);
        ctx.add(Expr::Pow(x, e))
    };
    if power > 0 {
        if is_literal_one(ctx, coeff) {
            base
        } else {
            ctx.add(Expr::Mul(coeff, base))
        }
    } else {
        ctx.add(Expr::Div(coeff, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn rat(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    fn quadratic(ctx: &mut Context) -> (ExprId, SymbolId) {
        // x^2 + 3x + 2
        let x = ctx.var("x");
        let sym = ctx.sym("x");
        let two = ctx.num(2);
        let three = ctx.num(3);
        let x2 = ctx.add(Expr::Pow(x, two));
        let tx = ctx.add(Expr::Mul(three, x));
        let s = ctx.add(Expr::Add(x2, tx));
        (ctx.add(Expr::Add(s, two)), sym)
    }

    #[test]
    fn gathers_monomials_by_power() {
        let mut ctx = Context::new();
        let (p, sym) = quadratic(&mut ctx);
        let map = gather_monomials(&mut ctx, p, sym).unwrap();
        assert_eq!(map.len(), 3);
        assert!(map.contains_key(&0) && map.contains_key(&1) && map.contains_key(&2));
    }

    #[test]
    fn negative_powers_are_tracked() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let sym = ctx.sym("x");
        let one = ctx.num(1);
        let recip = ctx.add(Expr::Div(one, x));
        let map = gather_monomials(&mut ctx, recip, sym).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key(&-1));
    }

    #[test]
    fn trig_terms_are_not_monomials() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let sym = ctx.sym("x");
        let s = ctx.func(liminal_ast::UnaryFn::Sin, x);
        assert!(gather_monomials(&mut ctx, s, sym).is_none());
    }

    #[test]
    fn long_division_splits_quotient_and_remainder() {
        // (x^2 + 3x + 2) / (x + 1) = x + 2
        let num = vec![rat(2, 1), rat(3, 1), rat(1, 1)];
        let den = vec![rat(1, 1), rat(1, 1)];
        let (q, r) = poly_divide(&num, &den).unwrap();
        assert_eq!(q, vec![rat(2, 1), rat(1, 1)]);
        assert!(r.is_empty());
    }

    #[test]
    fn long_division_keeps_remainder() {
        // (x^2 + 1) / (x + 1) = (x - 1) rem 2
        let num = vec![rat(1, 1), rat(0, 1), rat(1, 1)];
        let den = vec![rat(1, 1), rat(1, 1)];
        let (q, r) = poly_divide(&num, &den).unwrap();
        assert_eq!(q, vec![rat(-1, 1), rat(1, 1)]);
        assert_eq!(r, vec![rat(2, 1)]);
    }

    #[test]
    fn division_by_zero_polynomial_is_rejected() {
        let num = vec![rat(1, 1)];
        let den = vec![rat(0, 1)];
        assert!(poly_divide(&num, &den).is_none());
    }

    #[test]
    fn dense_round_trip() {
        let mut ctx = Context::new();
        let sym = ctx.sym("x");
        let coeffs = vec![rat(2, 1), rat(3, 1), rat(1, 1)];
        let e = poly_to_expr(&mut ctx, &coeffs, sym);
        let map = gather_monomials(&mut ctx, e, sym).unwrap();
        let back = dense_coeffs(&ctx, &map).unwrap();
        assert_eq!(back, coeffs);
    }
}
