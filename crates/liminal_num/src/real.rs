//! Arbitrary-precision real layer: finite decimals plus ±∞/NaN sentinels.
//!
//! Arithmetic is total. Indeterminate combinations (`∞ − ∞`, `0 · ∞`,
//! division by zero) yield [`Real::Nan`] instead of panicking or erroring.
//!
//! `BigDecimal` addition and multiplication are exact; results are rounded
//! back to the context precision here. Division and square root control
//! their own digit budget (`div_prec`, `sqrt_prec`) instead of relying on
//! the crate-global default context.

use std::cmp::Ordering;
use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

use crate::context::{NumContext, GUARD_DIGITS};

/// A real number: an arbitrary-precision finite decimal or a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Real {
    Finite(BigDecimal),
    PosInfinity,
    NegInfinity,
    Nan,
}

/// `10^k` as a `BigInt`.
pub(crate) fn ten_to_the(k: u64) -> BigInt {
    use num_traits::Pow;
    Pow::pow(BigInt::from(10), k as u32)
}

/// Number of decimal digits of `n` (1 for zero).
pub(crate) fn decimal_digits(n: &BigInt) -> u64 {
    BigDecimal::new(n.clone(), 0).digits()
}

/// Round to `precision` significant digits, stripping trailing zeros.
pub(crate) fn rounded(d: BigDecimal, precision: u32) -> BigDecimal {
    if d.digits() > precision as u64 {
        d.with_prec(precision as u64).normalized()
    } else {
        d.normalized()
    }
}

/// `d · 10^k` by adjusting the exponent only.
pub(crate) fn mul_pow10(d: &BigDecimal, k: i64) -> BigDecimal {
    let (n, s) = d.as_bigint_and_exponent();
    BigDecimal::new(n, s - k)
}

/// `d / 2`, exactly.
pub(crate) fn half(d: &BigDecimal) -> BigDecimal {
    mul_pow10(&(d * BigDecimal::from(5)), -1)
}

/// True when `|d| < 10^exp`.
pub(crate) fn below_pow10(d: &BigDecimal, exp: i32) -> bool {
    if d.is_zero() {
        return true;
    }
    let (n, s) = d.as_bigint_and_exponent();
    let shifted = s + exp as i64;
    if shifted < 0 {
        return false;
    }
    n.abs() < ten_to_the(shifted as u64)
}

/// Round to the nearest integer, halves away from zero.
pub(crate) fn round_half(d: &BigDecimal) -> BigInt {
    let half = BigDecimal::new(BigInt::from(5), 1);
    let shifted = if d.is_negative() { d - &half } else { d + &half };
    // with_scale(0) truncates toward zero
    let (n, _) = shifted.with_scale(0).as_bigint_and_exponent();
    n
}

/// Long-division core. The divisor must be nonzero; like integer `/`,
/// a zero divisor panics (callers guard or go through [`div_prec`]).
pub(crate) fn div_core(a: &BigDecimal, b: &BigDecimal, precision: u32) -> BigDecimal {
    if a.is_zero() {
        return BigDecimal::zero();
    }
    let (na, sa) = a.as_bigint_and_exponent();
    let (nb, sb) = b.as_bigint_and_exponent();
    let da = decimal_digits(&na) as i64;
    let db = decimal_digits(&nb) as i64;
    let target = (precision + GUARD_DIGITS) as i64;
    let shift = (target + db - da).max(0);
    let q = na * ten_to_the(shift as u64) / nb;
    rounded(BigDecimal::new(q, shift + sa - sb), precision)
}

/// Quotient of two decimals carried to `precision` significant digits.
///
/// Returns `None` only for a zero divisor. The quotient is computed by
/// integer long division with guard digits, then rounded.
pub fn div_prec(a: &BigDecimal, b: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    if b.is_zero() {
        return None;
    }
    Some(div_core(a, b, precision))
}

/// `x^e` for a non-negative integer exponent, by squaring.
pub fn powi_prec(x: &BigDecimal, mut e: u64, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    let mut base = rounded(x.clone(), p);
    let mut acc = BigDecimal::one();
    while e > 0 {
        if e & 1 == 1 {
            acc = rounded(&acc * &base, p);
        }
        e >>= 1;
        if e > 0 {
            base = rounded(&base * &base, p);
        }
    }
    rounded(acc, precision)
}

/// Newton square root for a known-positive argument.
///
/// The argument is split as `m · 10^(2k)` with `m ∈ [1, 100)` so an `f64`
/// seed is always in range; each iteration doubles the correct digits.
pub(crate) fn sqrt_positive(x: &BigDecimal, precision: u32) -> BigDecimal {
    if x.is_zero() {
        return BigDecimal::zero();
    }
    let p = precision + GUARD_DIGITS + 2;
    let (n, s) = x.normalized().as_bigint_and_exponent();
    let e = decimal_digits(&n) as i64 - s;
    let k = (e - 1).div_euclid(2);
    let m = mul_pow10(x, -2 * k);
    let seed = m.to_f64().unwrap_or(1.0).sqrt();
    let mut y = BigDecimal::from_f64(seed).unwrap_or_else(BigDecimal::one);
    let mut good: u32 = 12;
    while good < p {
        // y stays positive: m >= 1 and the mean of positives is positive
        let q = div_core(&m, &y, p);
        y = rounded(half(&(&y + &q)), p);
        good = good.saturating_mul(2);
    }
    rounded(mul_pow10(&y, k), precision)
}

/// Square root by Newton's method. Returns `None` for negative input.
pub fn sqrt_prec(x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    if x.is_negative() {
        return None;
    }
    Some(sqrt_positive(x, precision))
}

impl Real {
    pub fn zero() -> Real {
        Real::Finite(BigDecimal::zero())
    }

    pub fn one() -> Real {
        Real::Finite(BigDecimal::one())
    }

    pub fn from_bigint(n: &BigInt) -> Real {
        Real::Finite(BigDecimal::from(n.clone()))
    }

    pub fn from_i64(n: i64) -> Real {
        Real::Finite(BigDecimal::from(n))
    }

    /// Decimal rendering of a rational at context precision.
    pub fn from_rational(r: &BigRational, ctx: &NumContext) -> Real {
        let num = BigDecimal::from(r.numer().clone());
        let den = BigDecimal::from(r.denom().clone());
        match div_prec(&num, &den, ctx.precision) {
            Some(d) => Real::Finite(d),
            None => Real::Nan,
        }
    }

    /// Wrap a finite decimal, rounding to context precision.
    pub fn finite(d: BigDecimal, ctx: &NumContext) -> Real {
        Real::Finite(rounded(d, ctx.precision))
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Real::Finite(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Real::Nan)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Real::PosInfinity | Real::NegInfinity)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Real::Finite(d) if d.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Real::Finite(d) if d.is_one())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Real::Finite(d) => d.is_negative(),
            Real::NegInfinity => true,
            _ => false,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Real::Finite(d) => d.is_positive(),
            Real::PosInfinity => true,
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Real::Finite(d) if d.is_integer())
    }

    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Real::Finite(d) => Some(d),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Real::Finite(d) => d.to_f64(),
            Real::PosInfinity => Some(f64::INFINITY),
            Real::NegInfinity => Some(f64::NEG_INFINITY),
            Real::Nan => Some(f64::NAN),
        }
    }

    pub fn neg(&self) -> Real {
        match self {
            Real::Finite(d) => Real::Finite(-d),
            Real::PosInfinity => Real::NegInfinity,
            Real::NegInfinity => Real::PosInfinity,
            Real::Nan => Real::Nan,
        }
    }

    pub fn abs(&self) -> Real {
        match self {
            Real::Finite(d) => Real::Finite(d.abs()),
            Real::PosInfinity | Real::NegInfinity => Real::PosInfinity,
            Real::Nan => Real::Nan,
        }
    }

    pub fn signum(&self) -> Real {
        match self {
            Real::Finite(d) => {
                if d.is_zero() {
                    Real::zero()
                } else if d.is_negative() {
                    Real::Finite(BigDecimal::from(-1))
                } else {
                    Real::one()
                }
            }
            Real::PosInfinity => Real::one(),
            Real::NegInfinity => Real::Finite(BigDecimal::from(-1)),
            Real::Nan => Real::Nan,
        }
    }

    pub fn add(&self, other: &Real, ctx: &NumContext) -> Real {
        use Real::*;
        match (self, other) {
            (Nan, _) | (_, Nan) => Nan,
            (PosInfinity, NegInfinity) | (NegInfinity, PosInfinity) => Nan,
            (PosInfinity, _) | (_, PosInfinity) => PosInfinity,
            (NegInfinity, _) | (_, NegInfinity) => NegInfinity,
            (Finite(a), Finite(b)) => Real::finite(a + b, ctx),
        }
    }

    pub fn sub(&self, other: &Real, ctx: &NumContext) -> Real {
        self.add(&other.neg(), ctx)
    }

    pub fn mul(&self, other: &Real, ctx: &NumContext) -> Real {
        use Real::*;
        match (self, other) {
            (Nan, _) | (_, Nan) => Nan,
            (Finite(a), Finite(b)) => Real::finite(a * b, ctx),
            // 0 · ∞ is indeterminate; otherwise signs multiply
            (Finite(f), inf) | (inf, Finite(f)) => {
                if f.is_zero() {
                    Nan
                } else if f.is_negative() {
                    inf.neg()
                } else {
                    inf.clone()
                }
            }
            (a, b) => {
                if a.is_negative() == b.is_negative() {
                    PosInfinity
                } else {
                    NegInfinity
                }
            }
        }
    }

    /// Total division: zero divisor and ∞/∞ yield NaN.
    pub fn div(&self, other: &Real, ctx: &NumContext) -> Real {
        use Real::*;
        match (self, other) {
            (Nan, _) | (_, Nan) => Nan,
            (_, Finite(b)) if b.is_zero() => Nan,
            (Finite(a), Finite(b)) => match div_prec(a, b, ctx.precision) {
                Some(d) => Real::Finite(d),
                None => Nan,
            },
            (Finite(_), PosInfinity) | (Finite(_), NegInfinity) => Real::zero(),
            (PosInfinity, PosInfinity)
            | (PosInfinity, NegInfinity)
            | (NegInfinity, PosInfinity)
            | (NegInfinity, NegInfinity) => Nan,
            (inf, Finite(b)) => {
                if b.is_negative() {
                    inf.neg()
                } else {
                    inf.clone()
                }
            }
        }
    }

    /// Numeric comparison. `None` when either side is NaN.
    pub fn partial_cmp_val(&self, other: &Real) -> Option<Ordering> {
        use Real::*;
        match (self, other) {
            (Nan, _) | (_, Nan) => None,
            (PosInfinity, PosInfinity) | (NegInfinity, NegInfinity) => Some(Ordering::Equal),
            (PosInfinity, _) => Some(Ordering::Greater),
            (_, PosInfinity) => Some(Ordering::Less),
            (NegInfinity, _) => Some(Ordering::Less),
            (_, NegInfinity) => Some(Ordering::Greater),
            (Finite(a), Finite(b)) => Some(a.cmp(b)),
        }
    }

    /// Equality up to the context zero tolerance for finite values;
    /// sentinel variants compare by identity (NaN equals NaN here).
    pub fn approx_eq(&self, other: &Real, ctx: &NumContext) -> bool {
        match (self, other) {
            (Real::Finite(a), Real::Finite(b)) => {
                below_pow10(&(a - b), ctx.zero_tolerance_exp)
            }
            (a, b) => a == b,
        }
    }

    /// True when `|self| < 10^(ctx.zero_tolerance_exp)`.
    pub fn is_negligible(&self, ctx: &NumContext) -> bool {
        match self {
            Real::Finite(d) => below_pow10(d, ctx.zero_tolerance_exp),
            _ => false,
        }
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Real::Finite(d) => write!(f, "{}", d),
            Real::PosInfinity => write!(f, "inf"),
            Real::NegInfinity => write!(f, "-inf"),
            Real::Nan => write!(f, "NaN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn ctx() -> NumContext {
        NumContext::default().with_precision(30)
    }

    #[test]
    fn test_div_prec_one_third() {
        let a = BigDecimal::one();
        let b = BigDecimal::from(3);
        let q = div_prec(&a, &b, 30).unwrap();
        assert!(q.to_string().starts_with("0.33333333333333333333333333333"));
    }

    #[test]
    fn test_div_prec_zero_divisor() {
        assert!(div_prec(&BigDecimal::one(), &BigDecimal::zero(), 30).is_none());
    }

    #[test]
    fn test_sqrt_two() {
        let s = sqrt_prec(&BigDecimal::from(2), 30).unwrap();
        assert!(s.to_string().starts_with("1.4142135623730950488016887242"));
    }

    #[test]
    fn test_sqrt_small() {
        // 0.25 -> 0.5 exactly
        let x = BigDecimal::from_str("0.25").unwrap();
        let s = sqrt_prec(&x, 30).unwrap();
        let err = (&s - BigDecimal::from_str("0.5").unwrap()).abs();
        assert!(below_pow10(&err, -25));
    }

    #[test]
    fn test_sqrt_negative_is_none() {
        assert!(sqrt_prec(&BigDecimal::from(-4), 30).is_none());
    }

    #[test]
    fn test_powi() {
        let p = powi_prec(&BigDecimal::from(3), 5, 30);
        assert_eq!(p, BigDecimal::from(243));
    }

    #[test]
    fn test_infinity_tables() {
        let c = ctx();
        assert_eq!(Real::PosInfinity.add(&Real::NegInfinity, &c), Real::Nan);
        assert_eq!(Real::PosInfinity.add(&Real::one(), &c), Real::PosInfinity);
        assert_eq!(Real::zero().mul(&Real::PosInfinity, &c), Real::Nan);
        assert_eq!(
            Real::from_i64(-3).mul(&Real::PosInfinity, &c),
            Real::NegInfinity
        );
        assert_eq!(Real::PosInfinity.div(&Real::PosInfinity, &c), Real::Nan);
        assert_eq!(Real::one().div(&Real::PosInfinity, &c), Real::zero());
    }

    #[test]
    fn test_division_by_zero_is_nan() {
        let c = ctx();
        assert_eq!(Real::one().div(&Real::zero(), &c), Real::Nan);
        assert_eq!(Real::PosInfinity.div(&Real::zero(), &c), Real::Nan);
    }

    #[test]
    fn test_approx_eq_tolerance() {
        let c = ctx();
        let a = Real::Finite(BigDecimal::from_str("1.00000000000000000001").unwrap());
        assert!(a.approx_eq(&Real::one(), &c));
        let b = Real::Finite(BigDecimal::from_str("1.001").unwrap());
        assert!(!b.approx_eq(&Real::one(), &c));
    }

    #[test]
    fn test_round_half() {
        assert_eq!(round_half(&BigDecimal::from_str("2.5").unwrap()), BigInt::from(3));
        assert_eq!(round_half(&BigDecimal::from_str("-2.5").unwrap()), BigInt::from(-3));
        assert_eq!(round_half(&BigDecimal::from_str("2.4").unwrap()), BigInt::from(2));
    }

    #[test]
    fn test_decimal_digits() {
        assert_eq!(decimal_digits(&BigInt::from(999)), 3);
        assert_eq!(decimal_digits(&BigInt::from(1000)), 4);
        assert_eq!(decimal_digits(&BigInt::from(-7)), 1);
    }
}
