//! Γ and factorial.
//!
//! Positive integers fold to exact factorials and half-integers come from
//! Γ(1/2) = √π by the recurrence; everything else runs Spouge's series,
//! whose coefficient table depends only on the working precision and is
//! built once per precision behind a mutex-guarded cache. Arguments left
//! of Re(z) = 1/2 go through the reflection formula first.

use std::cmp::Ordering;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive};
use rustc_hash::FxHashMap;

use crate::complex::Complex;
use crate::consts;
use crate::context::{NumContext, GUARD_DIGITS};
use crate::real::{div_core, half, powi_prec, rounded, sqrt_positive, Real};
use crate::value::Numeric;

/// Longest half-integer recurrence walked before handing over to Spouge.
const MAX_HALF_STEPS: i64 = 10_000;

struct SpougeTable {
    a: u32,
    /// `coeffs[0]` is c₀ = √(2π), then c₁ … c_{a−1}.
    coeffs: Vec<BigDecimal>,
    /// Elevated precision the coefficients carry (and evaluation runs at).
    precision: u32,
}

static SPOUGE: LazyLock<Mutex<FxHashMap<u32, Arc<SpougeTable>>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

fn lock() -> MutexGuard<'static, FxHashMap<u32, Arc<SpougeTable>>> {
    // a poisoned table still holds only complete entries
    SPOUGE.lock().unwrap_or_else(|e| e.into_inner())
}

/// Spouge parameter for the target digit count; the relative error is
/// about (2π)^(−a−1/2), so a grows as digits / log₁₀(2π).
fn spouge_a(precision: u32) -> u32 {
    (((precision as f64) * 1.26).ceil() as u32 + 1).max(3)
}

fn spouge_table(precision: u32) -> Arc<SpougeTable> {
    let mut entries = lock();
    if let Some(t) = entries.get(&precision) {
        return Arc::clone(t);
    }
    tracing::debug!(precision, "building spouge coefficient table");
    let t = Arc::new(build_table(precision));
    entries.insert(precision, Arc::clone(&t));
    t
}

/// c_k = (−1)^(k−1)/(k−1)! · (a−k)^(k−1/2) · e^(a−k). The alternating sum
/// cancels about as many digits as the target precision carries (the
/// coefficients grow with `a`), so the table and the evaluation run at
/// roughly twice the target and round back at the end.
fn build_table(precision: u32) -> SpougeTable {
    let a = spouge_a(precision);
    let pc = precision * 2 + GUARD_DIGITS;
    let mut coeffs = Vec::with_capacity(a as usize);
    coeffs.push(consts::sqrt_two_pi(pc).as_ref().clone());
    let e = consts::e(pc);
    let mut e_pow = powi_prec(&e, (a - 1) as u64, pc);
    let mut fact = BigInt::one();
    for k in 1..a {
        if k > 1 {
            fact *= BigInt::from(k - 1);
            e_pow = div_core(&e_pow, &e, pc);
        }
        let base = BigDecimal::from(a - k);
        let num = rounded(powi_prec(&base, k as u64, pc) * &e_pow, pc);
        let den = rounded(sqrt_positive(&base, pc) * BigDecimal::from(fact.clone()), pc);
        let mut c = div_core(&num, &den, pc);
        if k % 2 == 0 {
            c = -c;
        }
        coeffs.push(c);
    }
    SpougeTable {
        a,
        coeffs,
        precision: pc,
    }
}

/// Γ(z) for Re(z) ≥ 1/2: (z+a−1)^(z−1/2) · e^(−(z+a−1)) · Σ, evaluated
/// as exp((z−1/2)·ln w − w) · Σ so huge arguments stay in range.
fn direct(z: &Real, table: &SpougeTable, c: &NumContext) -> Real {
    let mut sum = Real::Finite(table.coeffs[0].clone());
    for (k, ck) in table.coeffs.iter().enumerate().skip(1) {
        let shifted = z.add(&Real::Finite(BigDecimal::from(k as u32 - 1)), c);
        sum = sum.add(&Real::Finite(ck.clone()).div(&shifted, c), c);
    }
    let w = z.add(&Real::Finite(BigDecimal::from(table.a - 1)), c);
    let half_one = Real::Finite(half(&BigDecimal::one()));
    let t = z.sub(&half_one, c).mul(&w.ln(c), c).sub(&w, c);
    t.exp(c).mul(&sum, c)
}

/// Γ(z) = π / (sin(πz) · Γ(1−z)) for Re(z) < 1/2.
fn reflect(z: &Real, table: &SpougeTable, c: &NumContext) -> Real {
    let pi = Real::Finite(consts::pi(c.precision + GUARD_DIGITS).as_ref().clone());
    let s = z.mul(&pi, c).sin(c);
    if s.is_zero() {
        return Real::Nan;
    }
    let g = direct(&Real::one().sub(z, c), table, c);
    pi.div(&s.mul(&g, c), c)
}

fn direct_complex(z: &Complex, table: &SpougeTable, c: &NumContext) -> Complex {
    let mut sum = Complex::from_real(Real::Finite(table.coeffs[0].clone()));
    for (k, ck) in table.coeffs.iter().enumerate().skip(1) {
        let shifted = z.add(
            &Complex::from_real(Real::Finite(BigDecimal::from(k as u32 - 1))),
            c,
        );
        let term = Complex::from_real(Real::Finite(ck.clone())).div(&shifted, c);
        sum = sum.add(&term, c);
    }
    let w = z.add(
        &Complex::from_real(Real::Finite(BigDecimal::from(table.a - 1))),
        c,
    );
    let half_one = Complex::from_real(Real::Finite(half(&BigDecimal::one())));
    let t = z.sub(&half_one, c).mul(&w.ln(c), c).sub(&w, c);
    t.exp(c).mul(&sum, c)
}

fn reflect_complex(z: &Complex, table: &SpougeTable, c: &NumContext) -> Complex {
    let pi = Complex::from_real(Real::Finite(
        consts::pi(c.precision + GUARD_DIGITS).as_ref().clone(),
    ));
    let s = z.mul(&pi, c).sin(c);
    if s.is_zero() {
        return Complex::nan();
    }
    let g = direct_complex(&Complex::one().sub(z, c), table, c);
    pi.div(&s.mul(&g, c), c)
}

fn to_bigint(d: &BigDecimal) -> BigInt {
    let (n, _) = d.with_scale(0).as_bigint_and_exponent();
    n
}

fn int_factorial(n: &BigInt) -> BigInt {
    let mut acc = BigInt::one();
    let mut k = BigInt::from(2u32);
    while k <= *n {
        acc *= &k;
        k += 1u32;
    }
    acc
}

/// Γ at m + 1/2, by the recurrence from Γ(1/2) = √π. The walk builds an
/// exact rational factor; `None` hands long walks back to Spouge.
fn half_integer_gamma(d: &BigDecimal, ctx: &NumContext) -> Option<Real> {
    let doubled = d * &BigDecimal::from(2u32);
    if !doubled.is_integer() {
        return None;
    }
    let m = ((to_bigint(&doubled) - 1u32) / 2u32).to_i64()?;
    if m.abs() > MAX_HALF_STEPS {
        return None;
    }
    let mut factor = BigRational::from_integer(BigInt::one());
    if m >= 0 {
        for j in 0..m {
            factor *= BigRational::new(BigInt::from(2 * j + 1), BigInt::from(2));
        }
    } else {
        for j in 1..=(-m) {
            factor /= BigRational::new(BigInt::from(1 - 2 * j), BigInt::from(2));
        }
    }
    let p = ctx.precision + GUARD_DIGITS;
    let root_pi = sqrt_positive(&consts::pi(p), p);
    let num = rounded(root_pi * BigDecimal::from(factor.numer().clone()), p);
    let scaled = div_core(&num, &BigDecimal::from(factor.denom().clone()), p);
    Some(Real::Finite(rounded(scaled, ctx.precision)))
}

fn gamma_finite(d: &BigDecimal, ctx: &NumContext) -> Real {
    if d.is_integer() {
        let n = to_bigint(d);
        if n.is_positive() {
            return Real::finite(BigDecimal::from(int_factorial(&(n - 1u32))), ctx);
        }
        return Real::Nan; // poles at the non-positive integers
    }
    if let Some(r) = half_integer_gamma(d, ctx) {
        return r;
    }
    let table = spouge_table(ctx.precision);
    let c = NumContext::default().with_precision(table.precision);
    let z = Real::Finite(d.clone());
    let half_one = Real::Finite(half(&BigDecimal::one()));
    let g = if z.partial_cmp_val(&half_one) == Some(Ordering::Less) {
        reflect(&z, &table, &c)
    } else {
        direct(&z, &table, &c)
    };
    match g {
        Real::Finite(v) => Real::finite(v, ctx),
        other => other,
    }
}

pub(crate) fn gamma_real(x: &Real, ctx: &NumContext) -> Real {
    match x {
        Real::Finite(d) => gamma_finite(d, ctx),
        Real::PosInfinity => Real::PosInfinity,
        Real::NegInfinity | Real::Nan => Real::Nan,
    }
}

pub(crate) fn gamma_complex(z: &Complex, ctx: &NumContext) -> Complex {
    if !z.is_finite() {
        return Complex::nan();
    }
    let table = spouge_table(ctx.precision);
    let c = NumContext::default().with_precision(table.precision);
    let half_one = Real::Finite(half(&BigDecimal::one()));
    let g = if z.re.partial_cmp_val(&half_one) == Some(Ordering::Less) {
        reflect_complex(z, &table, &c)
    } else {
        direct_complex(z, &table, &c)
    };
    let re = match g.re {
        Real::Finite(v) => Real::finite(v, ctx),
        other => other,
    };
    let im = match g.im {
        Real::Finite(v) => Real::finite(v, ctx),
        other => other,
    };
    Complex::new(re, im)
}

impl Numeric {
    /// Γ(x). Positive integers fold exactly; non-positive integers are
    /// poles and come back NaN.
    pub fn gamma(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Integer(n) => {
                if n.is_positive() {
                    Numeric::Integer(int_factorial(&(n - 1u32)))
                } else {
                    Numeric::nan()
                }
            }
            Numeric::Complex(c) if !c.is_real() => {
                Numeric::Complex(gamma_complex(c, ctx)).narrowed(ctx)
            }
            other => Numeric::Real(gamma_real(&other.to_real_widened(ctx), ctx)).narrowed(ctx),
        }
    }

    /// x! as Γ(x + 1), computed at doubled precision and rounded back.
    pub fn factorial(&self, ctx: &NumContext) -> Numeric {
        if let Numeric::Integer(n) = self {
            return if n.is_negative() {
                Numeric::nan()
            } else {
                Numeric::Integer(int_factorial(n))
            };
        }
        let wide = ctx.with_precision(ctx.precision * 2);
        self.add(&Numeric::int(1), &wide).gamma(&wide).rounded_to(ctx)
    }
}
