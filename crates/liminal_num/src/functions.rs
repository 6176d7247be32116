//! Hand-rolled decimal transcendentals.
//!
//! Each function reduces its argument into a small convergence region and
//! runs a bounded series at working precision (guard digits on top of the
//! caller's), rounding the accumulator every iteration. The `Real` wrappers
//! at the bottom extend everything over the ±∞/NaN sentinels.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::consts;
use crate::context::{NumContext, GUARD_DIGITS, MAX_SERIES_ITERS};
use crate::real::{
    below_pow10, decimal_digits, div_core, div_prec, half, mul_pow10, powi_prec, round_half,
    rounded, sqrt_positive, Real,
};

/// ln for arguments near 1 (callers reduce into (0, 2]).
///
/// Uses `ln y = 2·atanh((y−1)/(y+1))`; the series argument stays below 1/3.
pub(crate) fn ln_near_one(y: &BigDecimal, p: u32) -> BigDecimal {
    let one = BigDecimal::one();
    let t = div_core(&(y - &one), &(y + &one), p);
    let t2 = rounded(&t * &t, p);
    let mut term = t.clone();
    let mut sum = t;
    let mut k = 0u64;
    while k < MAX_SERIES_ITERS as u64 {
        term = rounded(&term * &t2, p);
        if below_pow10(&term, -(p as i32)) {
            break;
        }
        k += 1;
        let add = div_core(&term, &BigDecimal::from(2 * k + 1), p);
        sum = rounded(sum + add, p);
    }
    rounded(sum * BigDecimal::from(2), p)
}

fn exp_integer(m: &BigInt, p: u32) -> BigDecimal {
    if m.is_zero() {
        return BigDecimal::one();
    }
    // saturating cast: callers bound the argument before getting here
    let mag = m.magnitude().to_u64().unwrap_or(u64::MAX);
    let pw = powi_prec(&consts::e(p), mag, p);
    if m.is_negative() {
        div_core(&BigDecimal::one(), &pw, p)
    } else {
        pw
    }
}

/// e^x.
pub fn exp(x: &BigDecimal, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    if x.is_zero() {
        return BigDecimal::one();
    }
    // x = m + f with integer m and |f| ≤ 1/2
    let m = round_half(x);
    let f = x - BigDecimal::from(m.clone());
    let mut term = BigDecimal::one();
    let mut sum = BigDecimal::one();
    for k in 1..MAX_SERIES_ITERS as u64 {
        term = div_core(&rounded(&term * &f, p), &BigDecimal::from(k), p);
        if below_pow10(&term, -(p as i32)) {
            break;
        }
        sum = rounded(sum + &term, p);
    }
    rounded(&sum * exp_integer(&m, p), precision)
}

/// Natural logarithm; `None` for non-positive input.
pub fn ln(x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    if !x.is_positive() {
        return None;
    }
    let p = precision + GUARD_DIGITS;
    // x = m · 10^(e−1) with m ∈ [1, 10)
    let (n, s) = x.normalized().as_bigint_and_exponent();
    let e = decimal_digits(&n) as i64 - s;
    let m = mul_pow10(x, -(e - 1));
    // two square roots bring m into the series band near 1
    let root = sqrt_positive(&sqrt_positive(&m, p), p);
    let ln_m = rounded(ln_near_one(&root, p) * BigDecimal::from(4), p);
    let ln_pow = BigDecimal::from(e - 1) * &*consts::ln10(p);
    Some(rounded(ln_m + ln_pow, precision))
}

/// log of `x` in base `base`; `None` when either log is undefined or the
/// base is 1.
pub fn log(base: &BigDecimal, x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    let lb = ln(base, p)?;
    if lb.is_zero() {
        return None;
    }
    let lx = ln(x, p)?;
    div_prec(&lx, &lb, precision)
}

/// x^y for positive x; `None` otherwise.
pub fn pow(x: &BigDecimal, y: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    let l = ln(x, p)?;
    Some(rounded(exp(&rounded(&l * y, p), p), precision))
}

/// Reduce into [−π, π]. The reduction precision grows with the integer
/// digits of the argument so the remainder keeps its absolute accuracy.
fn mod_two_pi(x: &BigDecimal, p: u32) -> BigDecimal {
    let (n, s) = x.normalized().as_bigint_and_exponent();
    let int_digits = (decimal_digits(&n) as i64 - s).max(1) as u32;
    let pr = p + int_digits + 5;
    let two_pi = rounded(&*consts::pi(pr) * BigDecimal::from(2), pr);
    let k = round_half(&div_core(x, &two_pi, pr));
    if k.is_zero() {
        return x.clone();
    }
    rounded(x - BigDecimal::from(k) * two_pi, p)
}

fn sin_reduced(r: &BigDecimal, p: u32) -> BigDecimal {
    let r2 = rounded(r * r, p);
    let mut term = r.clone();
    let mut sum = r.clone();
    for k in 1..MAX_SERIES_ITERS as u64 {
        term = rounded(&term * &r2, p);
        term = -div_core(&term, &BigDecimal::from((2 * k) * (2 * k + 1)), p);
        if below_pow10(&term, -(p as i32)) {
            break;
        }
        sum = rounded(sum + &term, p);
    }
    sum
}

fn cos_reduced(r: &BigDecimal, p: u32) -> BigDecimal {
    let r2 = rounded(r * r, p);
    let mut term = BigDecimal::one();
    let mut sum = BigDecimal::one();
    for k in 1..MAX_SERIES_ITERS as u64 {
        term = rounded(&term * &r2, p);
        term = -div_core(&term, &BigDecimal::from((2 * k - 1) * (2 * k)), p);
        if below_pow10(&term, -(p as i32)) {
            break;
        }
        sum = rounded(sum + &term, p);
    }
    sum
}

pub fn sin(x: &BigDecimal, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    let r = mod_two_pi(x, p);
    rounded(sin_reduced(&r, p), precision)
}

pub fn cos(x: &BigDecimal, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    let r = mod_two_pi(x, p);
    rounded(cos_reduced(&r, p), precision)
}

/// tan; `None` when the argument sits within working precision of a pole.
pub fn tan(x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    let r = mod_two_pi(x, p);
    div_prec(&sin_reduced(&r, p), &cos_reduced(&r, p), precision)
}

/// cot; `None` at poles (multiples of π within working precision).
pub fn cot(x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    let r = mod_two_pi(x, p);
    div_prec(&cos_reduced(&r, p), &sin_reduced(&r, p), precision)
}

fn atan_small(x: &BigDecimal, p: u32) -> BigDecimal {
    // two halvings: atan x = 2·atan(x / (1 + √(1+x²)))
    let one = BigDecimal::one();
    let mut y = x.clone();
    for _ in 0..2 {
        if y.is_zero() {
            break;
        }
        let y2 = rounded(&y * &y, p);
        let root = sqrt_positive(&(&one + &y2), p);
        y = div_core(&y, &(&one + &root), p);
    }
    let y2 = rounded(&y * &y, p);
    let mut term = y.clone();
    let mut sum = y;
    for k in 1..MAX_SERIES_ITERS as u64 {
        term = -rounded(&term * &y2, p);
        if below_pow10(&term, -(p as i32)) {
            break;
        }
        let add = div_core(&term, &BigDecimal::from(2 * k + 1), p);
        sum = rounded(sum + add, p);
    }
    rounded(sum * BigDecimal::from(4), p)
}

pub fn atan(x: &BigDecimal, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    if x.is_negative() {
        return rounded(-atan(&(-x.clone()), p), precision);
    }
    let one = BigDecimal::one();
    if *x > one {
        let half_pi = half(&consts::pi(p));
        let inv = div_core(&one, x, p);
        return rounded(half_pi - atan_small(&inv, p), precision);
    }
    rounded(atan_small(x, p), precision)
}

/// arcsin; `None` outside [−1, 1].
pub fn asin(x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    let one = BigDecimal::one();
    if x.abs() > one {
        return None;
    }
    if x.abs() == one {
        let half_pi = half(&consts::pi(p));
        let r = if x.is_negative() { -half_pi } else { half_pi };
        return Some(rounded(r, precision));
    }
    let x2 = rounded(x * x, p);
    let root = sqrt_positive(&(&one - &x2), p);
    if root.is_zero() {
        // |x| indistinguishable from 1 at working precision
        let half_pi = half(&consts::pi(p));
        let r = if x.is_negative() { -half_pi } else { half_pi };
        return Some(rounded(r, precision));
    }
    Some(rounded(atan(&div_core(x, &root, p), p), precision))
}

/// arccos; `None` outside [−1, 1].
pub fn acos(x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    let a = asin(x, p)?;
    Some(rounded(half(&consts::pi(p)) - a, precision))
}

/// Quadrant-aware arctangent; `None` only at the origin.
pub fn atan2(y: &BigDecimal, x: &BigDecimal, precision: u32) -> Option<BigDecimal> {
    let p = precision + GUARD_DIGITS;
    if x.is_zero() && y.is_zero() {
        return None;
    }
    let r = if x.is_zero() {
        let half_pi = half(&consts::pi(p));
        if y.is_positive() {
            half_pi
        } else {
            -half_pi
        }
    } else {
        let base = atan(&div_core(y, x, p), p);
        if x.is_positive() {
            base
        } else if y.is_negative() {
            base - &*consts::pi(p)
        } else {
            base + &*consts::pi(p)
        }
    };
    Some(rounded(r, precision))
}

pub fn sinh(x: &BigDecimal, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    let ex = exp(x, p);
    let enx = div_core(&BigDecimal::one(), &ex, p);
    rounded(half(&(ex - enx)), precision)
}

pub fn cosh(x: &BigDecimal, precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    let ex = exp(x, p);
    let enx = div_core(&BigDecimal::one(), &ex, p);
    rounded(half(&(ex + enx)), precision)
}

/// Arguments whose magnitude exceeds this saturate `Real::exp` directly;
/// the integer part would not fit the squaring exponent.
fn exp_saturates(x: &BigDecimal) -> bool {
    x.abs() >= BigDecimal::new(BigInt::one(), -19)
}

fn bigdecimal_to_bigint_exact(d: &BigDecimal) -> BigInt {
    // caller checks is_integer, so truncation is exact
    let (n, _) = d.with_scale(0).as_bigint_and_exponent();
    n
}

impl Real {
    pub fn exp(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => {
                if exp_saturates(d) {
                    if d.is_negative() {
                        Real::zero()
                    } else {
                        Real::PosInfinity
                    }
                } else {
                    Real::Finite(exp(d, ctx.precision))
                }
            }
            Real::PosInfinity => Real::PosInfinity,
            Real::NegInfinity => Real::zero(),
            Real::Nan => Real::Nan,
        }
    }

    /// Natural log. `ln 0 = −∞`; negative input is NaN at this layer
    /// (the tower lifts it to the complex plane before getting here).
    pub fn ln(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => {
                if d.is_zero() {
                    Real::NegInfinity
                } else {
                    match ln(d, ctx.precision) {
                        Some(l) => Real::Finite(l),
                        None => Real::Nan,
                    }
                }
            }
            Real::PosInfinity => Real::PosInfinity,
            Real::NegInfinity | Real::Nan => Real::Nan,
        }
    }

    pub fn sqrt(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => {
                if d.is_negative() {
                    Real::Nan
                } else {
                    Real::Finite(sqrt_positive(d, ctx.precision))
                }
            }
            Real::PosInfinity => Real::PosInfinity,
            Real::NegInfinity | Real::Nan => Real::Nan,
        }
    }

    pub fn sin(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => Real::Finite(sin(d, ctx.precision)),
            _ => Real::Nan,
        }
    }

    pub fn cos(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => Real::Finite(cos(d, ctx.precision)),
            _ => Real::Nan,
        }
    }

    pub fn tan(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => match tan(d, ctx.precision) {
                Some(t) => Real::Finite(t),
                None => Real::Nan,
            },
            _ => Real::Nan,
        }
    }

    pub fn cot(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => match cot(d, ctx.precision) {
                Some(t) => Real::Finite(t),
                None => Real::Nan,
            },
            _ => Real::Nan,
        }
    }

    pub fn atan(&self, ctx: &NumContext) -> Real {
        let p = ctx.precision + GUARD_DIGITS;
        match self {
            Real::Finite(d) => Real::Finite(atan(d, ctx.precision)),
            Real::PosInfinity => Real::Finite(rounded(half(&consts::pi(p)), ctx.precision)),
            Real::NegInfinity => Real::Finite(rounded(-half(&consts::pi(p)), ctx.precision)),
            Real::Nan => Real::Nan,
        }
    }

    /// arccot as `atan(1/x)`, the odd branch; `acot(0) = pi/2`.
    pub fn acot(&self, ctx: &NumContext) -> Real {
        let p = ctx.precision + GUARD_DIGITS;
        match self {
            Real::Finite(d) => {
                if d.is_zero() {
                    return Real::Finite(rounded(half(&consts::pi(p)), ctx.precision));
                }
                let recip = div_core(&BigDecimal::one(), d, p);
                Real::Finite(atan(&recip, ctx.precision))
            }
            Real::PosInfinity | Real::NegInfinity => Real::zero(),
            Real::Nan => Real::Nan,
        }
    }

    pub fn asin(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => match asin(d, ctx.precision) {
                Some(a) => Real::Finite(a),
                None => Real::Nan,
            },
            _ => Real::Nan,
        }
    }

    pub fn acos(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => match acos(d, ctx.precision) {
                Some(a) => Real::Finite(a),
                None => Real::Nan,
            },
            _ => Real::Nan,
        }
    }

    pub fn atan2(&self, x: &Real, ctx: &NumContext) -> Real {
        let p = ctx.precision + GUARD_DIGITS;
        let quarter_pi = || half(&half(&consts::pi(p)));
        let r = match (self, x) {
            (Real::Nan, _) | (_, Real::Nan) => return Real::Nan,
            (Real::Finite(y), Real::Finite(x)) => {
                return match atan2(y, x, ctx.precision) {
                    Some(a) => Real::Finite(a),
                    None => Real::Nan,
                }
            }
            (Real::PosInfinity, Real::PosInfinity) => quarter_pi(),
            (Real::PosInfinity, Real::NegInfinity) => &*consts::pi(p) - quarter_pi(),
            (Real::NegInfinity, Real::PosInfinity) => -quarter_pi(),
            (Real::NegInfinity, Real::NegInfinity) => quarter_pi() - &*consts::pi(p),
            (Real::PosInfinity, Real::Finite(_)) => half(&consts::pi(p)),
            (Real::NegInfinity, Real::Finite(_)) => -half(&consts::pi(p)),
            (Real::Finite(y), Real::NegInfinity) => {
                if y.is_negative() {
                    -&*consts::pi(p)
                } else {
                    consts::pi(p).as_ref().clone()
                }
            }
            (Real::Finite(_), Real::PosInfinity) => BigDecimal::zero(),
        };
        Real::Finite(rounded(r, ctx.precision))
    }

    pub fn sinh(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => {
                if exp_saturates(d) {
                    if d.is_negative() {
                        Real::NegInfinity
                    } else {
                        Real::PosInfinity
                    }
                } else {
                    Real::Finite(sinh(d, ctx.precision))
                }
            }
            Real::PosInfinity => Real::PosInfinity,
            Real::NegInfinity => Real::NegInfinity,
            Real::Nan => Real::Nan,
        }
    }

    pub fn cosh(&self, ctx: &NumContext) -> Real {
        match self {
            Real::Finite(d) => {
                if exp_saturates(d) {
                    Real::PosInfinity
                } else {
                    Real::Finite(cosh(d, ctx.precision))
                }
            }
            Real::PosInfinity | Real::NegInfinity => Real::PosInfinity,
            Real::Nan => Real::Nan,
        }
    }

    /// x^y over the sentinel table; finite cases follow `exp(y·ln x)` with
    /// exact handling of integer exponents on negative bases.
    pub fn pow(&self, other: &Real, ctx: &NumContext) -> Real {
        use Real::*;
        match (self, other) {
            (Nan, _) | (_, Nan) => Nan,
            (_, Finite(y)) if y.is_zero() => {
                // 0^0 and ∞^0 are indeterminate
                match self {
                    Finite(x) if !x.is_zero() => Real::one(),
                    _ => Nan,
                }
            }
            (Finite(x), _) if x.is_one() => Real::one(),
            (PosInfinity, y) => {
                if y.is_positive() {
                    PosInfinity
                } else {
                    Real::zero()
                }
            }
            (NegInfinity, Finite(y)) => {
                if !y.is_integer() {
                    return Nan;
                }
                let n = bigdecimal_to_bigint_exact(y);
                if y.is_negative() {
                    Real::zero()
                } else if n.is_odd() {
                    NegInfinity
                } else {
                    PosInfinity
                }
            }
            // sign oscillates without bound
            (NegInfinity, PosInfinity) => Nan,
            // magnitude collapses regardless of sign
            (NegInfinity, NegInfinity) => Real::zero(),
            (Finite(x), PosInfinity) => {
                let mag = x.abs();
                if mag > BigDecimal::one() {
                    PosInfinity
                } else if mag < BigDecimal::one() {
                    Real::zero()
                } else {
                    Nan
                }
            }
            (Finite(x), NegInfinity) => {
                let mag = x.abs();
                if mag > BigDecimal::one() {
                    Real::zero()
                } else if mag < BigDecimal::one() && !x.is_zero() {
                    PosInfinity
                } else {
                    Nan
                }
            }
            (Finite(x), Finite(y)) => {
                if x.is_zero() {
                    return if y.is_positive() { Real::zero() } else { Nan };
                }
                if x.is_negative() {
                    if !y.is_integer() {
                        return Nan; // lifted to the complex plane upstream
                    }
                    let n = bigdecimal_to_bigint_exact(y);
                    let mag = match pow(&x.abs(), y, ctx.precision) {
                        Some(m) => m,
                        None => return Nan,
                    };
                    return if n.is_odd() {
                        Real::Finite(-mag)
                    } else {
                        Real::Finite(mag)
                    };
                }
                match pow(x, y, ctx.precision) {
                    Some(r) => Real::Finite(r),
                    None => Nan,
                }
            }
        }
    }
}
