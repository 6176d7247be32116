//! The numeric tower.
//!
//! `Numeric` holds a value at the lowest layer that can represent it
//! exactly; arithmetic widens both operands to a common layer, dispatches
//! there, and narrows the result back down. Narrowing (`narrowed`) is the
//! factory invariant: every value handed out by this module has already
//! been narrowed under the context's downcast policy.

use std::cmp::Ordering;
use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::complex::Complex;
use crate::context::NumContext;
use crate::error::NumError;
use crate::real::{ten_to_the, Real};

/// Largest exponent magnitude folded exactly; beyond this the decimal
/// layer takes over.
const MAX_ABS_POW: i64 = 1000;
/// Largest root index attempted for exact fractional powers.
const MAX_ROOT: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Numeric {
    Integer(BigInt),
    Rational(BigRational),
    Real(Real),
    Complex(Complex),
}

/// Tower layers, ordered by width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Layer {
    Integer,
    Rational,
    Real,
    Complex,
}

impl Numeric {
    pub fn int(n: i64) -> Numeric {
        Numeric::Integer(BigInt::from(n))
    }

    /// Exact rational; reduces and collapses whole values to `Integer`.
    pub fn rational(num: i64, den: i64) -> Result<Numeric, NumError> {
        if den == 0 {
            return Err(NumError::ZeroDenominator);
        }
        let r = BigRational::new(BigInt::from(num), BigInt::from(den));
        if r.is_integer() {
            Ok(Numeric::Integer(r.to_integer()))
        } else {
            Ok(Numeric::Rational(r))
        }
    }

    pub fn from_decimal(d: BigDecimal) -> Numeric {
        Numeric::Real(Real::Finite(d))
    }

    pub fn nan() -> Numeric {
        Numeric::Real(Real::Nan)
    }

    pub fn pos_inf() -> Numeric {
        Numeric::Real(Real::PosInfinity)
    }

    pub fn neg_inf() -> Numeric {
        Numeric::Real(Real::NegInfinity)
    }

    pub fn imaginary_unit() -> Numeric {
        Numeric::Complex(Complex::i())
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Numeric::Integer(n) => n.is_zero(),
            Numeric::Rational(r) => r.is_zero(),
            Numeric::Real(r) => r.is_zero(),
            Numeric::Complex(c) => c.is_zero(),
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Numeric::Integer(n) => *n == BigInt::from(1),
            Numeric::Rational(r) => r.is_integer() && r.to_integer() == BigInt::from(1),
            Numeric::Real(r) => r.is_one(),
            Numeric::Complex(c) => c.is_real() && c.re.is_one(),
        }
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Numeric::Real(r) => r.is_nan(),
            Numeric::Complex(c) => c.has_nan(),
            _ => false,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Numeric::Integer(_) | Numeric::Rational(_) => true,
            Numeric::Real(r) => r.is_finite(),
            Numeric::Complex(c) => c.is_finite(),
        }
    }

    /// Exact values carry no precision error: the exact layers always,
    /// the sentinels as exact statements, finite decimals never.
    pub fn is_exact(&self) -> bool {
        match self {
            Numeric::Integer(_) | Numeric::Rational(_) => true,
            Numeric::Real(r) => !r.is_finite(),
            Numeric::Complex(c) => !c.re.is_finite() && !c.im.is_finite(),
        }
    }

    pub fn is_integer_value(&self) -> bool {
        match self {
            Numeric::Integer(_) => true,
            Numeric::Rational(r) => r.is_integer(),
            Numeric::Real(r) => r.is_integer(),
            Numeric::Complex(c) => c.is_real() && c.re.is_integer(),
        }
    }

    /// Sign relative to zero; `None` for NaN and genuinely complex values.
    pub fn sign(&self) -> Option<Ordering> {
        match self {
            Numeric::Integer(n) => Some(n.cmp(&BigInt::zero())),
            Numeric::Rational(r) => Some(r.cmp(&BigRational::zero())),
            Numeric::Real(r) => r.partial_cmp_val(&Real::zero()),
            Numeric::Complex(c) => {
                if c.is_real() {
                    c.re.partial_cmp_val(&Real::zero())
                } else {
                    None
                }
            }
        }
    }

    /// A stored zero at any layer (never a tolerance judgement).
    pub fn is_exact_zero(&self) -> bool {
        self.is_zero()
    }

    pub(crate) fn layer(&self) -> Layer {
        match self {
            Numeric::Integer(_) => Layer::Integer,
            Numeric::Rational(_) => Layer::Rational,
            Numeric::Real(_) => Layer::Real,
            Numeric::Complex(_) => Layer::Complex,
        }
    }

    fn lifted(&self, target: Layer, ctx: &NumContext) -> Numeric {
        if self.layer() >= target {
            return self.clone();
        }
        match (self, target) {
            (Numeric::Integer(n), Layer::Rational) => {
                Numeric::Rational(BigRational::from_integer(n.clone()))
            }
            (Numeric::Integer(n), Layer::Real) => Numeric::Real(Real::from_bigint(n)),
            (Numeric::Integer(n), Layer::Complex) => {
                Numeric::Complex(Complex::from_real(Real::from_bigint(n)))
            }
            (Numeric::Rational(r), Layer::Real) => Numeric::Real(Real::from_rational(r, ctx)),
            (Numeric::Rational(r), Layer::Complex) => {
                Numeric::Complex(Complex::from_real(Real::from_rational(r, ctx)))
            }
            (Numeric::Real(r), Layer::Complex) => Numeric::Complex(Complex::from_real(r.clone())),
            _ => self.clone(),
        }
    }

    pub(crate) fn to_real_widened(&self, ctx: &NumContext) -> Real {
        match self {
            Numeric::Integer(n) => Real::from_bigint(n),
            Numeric::Rational(r) => Real::from_rational(r, ctx),
            Numeric::Real(r) => r.clone(),
            Numeric::Complex(c) => {
                if c.is_real() {
                    c.re.clone()
                } else {
                    Real::Nan
                }
            }
        }
    }

    pub(crate) fn to_complex_widened(&self, ctx: &NumContext) -> Complex {
        match self {
            Numeric::Complex(c) => c.clone(),
            other => Complex::from_real(other.to_real_widened(ctx)),
        }
    }

    /// Narrow to the lowest layer that holds the value (the `Create`
    /// invariant). Idempotent; a no-op when downcasting is disabled,
    /// except that a complex value with a NaN part always collapses to NaN.
    pub fn narrowed(self, ctx: &NumContext) -> Numeric {
        if let Numeric::Complex(c) = &self {
            if c.has_nan() {
                return Numeric::nan();
            }
        }
        if !ctx.downcast {
            return self;
        }
        match self {
            Numeric::Integer(_) => self,
            Numeric::Rational(r) => {
                if r.is_integer() {
                    Numeric::Integer(r.to_integer())
                } else {
                    Numeric::Rational(r)
                }
            }
            Numeric::Real(Real::Finite(d)) => narrow_decimal(d, ctx),
            Numeric::Real(_) => self,
            Numeric::Complex(c) => {
                if c.im.is_zero() || c.im.is_negligible(ctx) {
                    Numeric::Real(c.re).narrowed(ctx)
                } else {
                    Numeric::Complex(c)
                }
            }
        }
    }

    pub fn neg(&self) -> Numeric {
        match self {
            Numeric::Integer(n) => Numeric::Integer(-n),
            Numeric::Rational(r) => Numeric::Rational(-r),
            Numeric::Real(r) => Numeric::Real(r.neg()),
            Numeric::Complex(c) => Numeric::Complex(c.neg()),
        }
    }

    pub fn abs(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Integer(n) => Numeric::Integer(n.abs()),
            Numeric::Rational(r) => Numeric::Rational(r.abs()),
            Numeric::Real(r) => Numeric::Real(r.abs()),
            Numeric::Complex(c) => Numeric::Real(c.abs(ctx)).narrowed(ctx),
        }
    }

    /// sgn(x); for complex arguments `z / |z|`.
    pub fn signum(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Integer(n) => Numeric::Integer(n.signum()),
            Numeric::Rational(r) => Numeric::Integer(r.numer().signum()),
            Numeric::Real(r) => Numeric::Real(r.signum()).narrowed(ctx),
            Numeric::Complex(c) => {
                if c.is_zero() {
                    Numeric::int(0)
                } else {
                    let m = Complex::from_real(c.abs(ctx));
                    Numeric::Complex(c.div(&m, ctx)).narrowed(ctx)
                }
            }
        }
    }

    pub fn add(&self, other: &Numeric, ctx: &NumContext) -> Numeric {
        use Numeric::*;
        let r = match (self, other) {
            (Integer(a), Integer(b)) => Integer(a + b),
            (Rational(a), Rational(b)) => Rational(a + b),
            (Real(a), Real(b)) => Real(a.add(b, ctx)),
            (Complex(a), Complex(b)) => Complex(a.add(b, ctx)),
            _ => {
                let (a, b) = widen_pair(self, other, ctx);
                return a.add(&b, ctx);
            }
        };
        r.narrowed(ctx)
    }

    pub fn sub(&self, other: &Numeric, ctx: &NumContext) -> Numeric {
        self.add(&other.neg(), ctx)
    }

    pub fn mul(&self, other: &Numeric, ctx: &NumContext) -> Numeric {
        use Numeric::*;
        let r = match (self, other) {
            (Integer(a), Integer(b)) => Integer(a * b),
            (Rational(a), Rational(b)) => Rational(a * b),
            (Real(a), Real(b)) => Real(a.mul(b, ctx)),
            (Complex(a), Complex(b)) => Complex(a.mul(b, ctx)),
            _ => {
                let (a, b) = widen_pair(self, other, ctx);
                return a.mul(&b, ctx);
            }
        };
        r.narrowed(ctx)
    }

    /// Total division: an exact-zero divisor yields NaN at every layer.
    pub fn div(&self, other: &Numeric, ctx: &NumContext) -> Numeric {
        if other.is_exact_zero() {
            return Numeric::nan();
        }
        use Numeric::*;
        let r = match (self, other) {
            (Integer(a), Integer(b)) => Rational(BigRational::new(a.clone(), b.clone())),
            (Rational(a), Rational(b)) => Rational(a / b),
            (Real(a), Real(b)) => Real(a.div(b, ctx)),
            (Complex(a), Complex(b)) => Complex(a.div(b, ctx)),
            _ => {
                let (a, b) = widen_pair(self, other, ctx);
                return a.div(&b, ctx);
            }
        };
        r.narrowed(ctx)
    }

    fn as_exact_rational(&self) -> Option<BigRational> {
        match self {
            Numeric::Integer(n) => Some(BigRational::from_integer(n.clone())),
            Numeric::Rational(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// Exact power, when one exists: bounded integer exponents by squaring,
    /// fractional exponents by perfect roots. The base must be nonzero.
    pub fn pow_exact(&self, other: &Numeric, ctx: &NumContext) -> Option<Numeric> {
        let base = self.as_exact_rational()?;
        let exp = other.as_exact_rational()?;
        if base.is_zero() {
            return None;
        }
        if exp.is_integer() {
            let e = exp.to_integer().to_i64()?;
            if e.abs() > MAX_ABS_POW {
                return None;
            }
            return Some(rational_powi(&base, e).narrowed(ctx));
        }
        let q = exp.denom().to_u32()?;
        if q > MAX_ROOT {
            return None;
        }
        let p = exp.numer().to_i64()?;
        if p.abs() > MAX_ABS_POW {
            return None;
        }
        let negative = base.is_negative();
        if negative && q % 2 == 0 {
            return None; // even root of a negative stays complex
        }
        let mag = base.abs();
        let root_n = nth_root_exact(mag.numer(), q)?;
        let root_d = nth_root_exact(mag.denom(), q)?;
        let mut root = BigRational::new(root_n, root_d);
        if negative {
            root = -root;
        }
        Some(rational_powi(&root, p).narrowed(ctx))
    }

    pub fn pow(&self, other: &Numeric, ctx: &NumContext) -> Numeric {
        if self.is_exact_zero() {
            // 0^w follows the sign of the exponent's real part
            return match other {
                o if o.is_exact_zero() => Numeric::nan(),
                Numeric::Complex(c) if !c.is_real() => {
                    if c.re.is_positive() {
                        Numeric::int(0)
                    } else {
                        Numeric::nan()
                    }
                }
                o => match o.sign() {
                    Some(Ordering::Greater) => Numeric::int(0),
                    _ => Numeric::nan(),
                },
            };
        }
        if other.is_exact_zero() {
            return if self.is_finite() {
                Numeric::int(1)
            } else {
                Numeric::nan()
            };
        }
        if let Some(e) = self.pow_exact(other, ctx) {
            return e;
        }
        if matches!(self.layer(), Layer::Complex) || matches!(other.layer(), Layer::Complex) {
            let a = self.to_complex_widened(ctx);
            let b = other.to_complex_widened(ctx);
            return Numeric::Complex(a.pow(&b, ctx)).narrowed(ctx);
        }
        let a = self.to_real_widened(ctx);
        let b = other.to_real_widened(ctx);
        if matches!(a, Real::Finite(_)) && a.is_negative() && matches!(b, Real::Finite(_)) && !b.is_integer()
        {
            // negative base, fractional exponent: principal complex branch
            let z = Complex::from_real(a);
            let w = Complex::from_real(b);
            return Numeric::Complex(z.pow(&w, ctx)).narrowed(ctx);
        }
        Numeric::Real(a.pow(&b, ctx)).narrowed(ctx)
    }

    pub fn sqrt(&self, ctx: &NumContext) -> Numeric {
        if let Numeric::Complex(c) = self {
            return Numeric::Complex(c.sqrt(ctx)).narrowed(ctx);
        }
        if !self.is_zero() {
            if let Ok(half) = Numeric::rational(1, 2) {
                if let Some(e) = self.pow_exact(&half, ctx) {
                    return e;
                }
            }
        }
        let a = self.to_real_widened(ctx);
        if a.is_negative() && a.is_finite() {
            return Numeric::Complex(Complex::from_real(a).sqrt(ctx)).narrowed(ctx);
        }
        Numeric::Real(a.sqrt(ctx)).narrowed(ctx)
    }

    pub fn exp(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.exp(ctx)).narrowed(ctx),
            _ => Numeric::Real(self.to_real_widened(ctx).exp(ctx)).narrowed(ctx),
        }
    }

    pub fn ln(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.ln(ctx)).narrowed(ctx),
            _ => {
                let a = self.to_real_widened(ctx);
                if matches!(a, Real::Finite(_)) && a.is_negative() {
                    return Numeric::Complex(Complex::from_real(a).ln(ctx)).narrowed(ctx);
                }
                Numeric::Real(a.ln(ctx)).narrowed(ctx)
            }
        }
    }

    /// Exact integer logarithm: the `k` with `base^k = x`, if one exists.
    pub fn log_exact(base: &Numeric, x: &Numeric) -> Option<Numeric> {
        let b = base.as_exact_rational()?;
        let v = x.as_exact_rational()?;
        if b.is_zero() || v.is_zero() || b.is_negative() || v.is_negative() {
            return None;
        }
        let bf = b.to_f64()?;
        let vf = v.to_f64()?;
        if !bf.is_finite() || !vf.is_finite() || bf == 1.0 {
            return None;
        }
        let k = (vf.ln() / bf.ln()).round();
        if !k.is_finite() || k.abs() > MAX_ABS_POW as f64 {
            return None;
        }
        let k = k as i64;
        if rational_powi(&b, k).as_exact_rational()? == v {
            Some(Numeric::Integer(BigInt::from(k)))
        } else {
            None
        }
    }

    /// log base `base` of `x`, as `ln x / ln base` (total; base 1 → NaN).
    pub fn log(base: &Numeric, x: &Numeric, ctx: &NumContext) -> Numeric {
        if let Some(k) = Numeric::log_exact(base, x) {
            return k;
        }
        let w = ctx.working();
        x.ln(&w).div(&base.ln(&w), ctx)
    }

    pub fn sin(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.sin(ctx)).narrowed(ctx),
            _ => Numeric::Real(self.to_real_widened(ctx).sin(ctx)).narrowed(ctx),
        }
    }

    pub fn cos(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.cos(ctx)).narrowed(ctx),
            _ => Numeric::Real(self.to_real_widened(ctx).cos(ctx)).narrowed(ctx),
        }
    }

    pub fn tan(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.tan(ctx)).narrowed(ctx),
            _ => Numeric::Real(self.to_real_widened(ctx).tan(ctx)).narrowed(ctx),
        }
    }

    pub fn cot(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.cot(ctx)).narrowed(ctx),
            _ => Numeric::Real(self.to_real_widened(ctx).cot(ctx)).narrowed(ctx),
        }
    }

    pub fn atan(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(c.atan(ctx)).narrowed(ctx),
            _ => Numeric::Real(self.to_real_widened(ctx).atan(ctx)).narrowed(ctx),
        }
    }

    pub fn acot(&self, ctx: &NumContext) -> Numeric {
        match self {
            Numeric::Complex(c) => {
                let recip = Complex::one().div(c, ctx);
                Numeric::Complex(recip.atan(ctx)).narrowed(ctx)
            }
            _ => Numeric::Real(self.to_real_widened(ctx).acot(ctx)).narrowed(ctx),
        }
    }

    pub fn asin(&self, ctx: &NumContext) -> Numeric {
        self.inverse_trig(ctx, Complex::asin, Real::asin)
    }

    pub fn acos(&self, ctx: &NumContext) -> Numeric {
        self.inverse_trig(ctx, Complex::acos, Real::acos)
    }

    fn inverse_trig(
        &self,
        ctx: &NumContext,
        complex_f: fn(&Complex, &NumContext) -> Complex,
        real_f: fn(&Real, &NumContext) -> Real,
    ) -> Numeric {
        match self {
            Numeric::Complex(c) => Numeric::Complex(complex_f(c, ctx)).narrowed(ctx),
            _ => {
                let a = self.to_real_widened(ctx);
                let beyond_one = matches!(a, Real::Finite(_))
                    && a.abs().partial_cmp_val(&Real::one()) == Some(Ordering::Greater);
                if beyond_one {
                    let z = Complex::from_real(a);
                    return Numeric::Complex(complex_f(&z, ctx)).narrowed(ctx);
                }
                Numeric::Real(real_f(&a, ctx)).narrowed(ctx)
            }
        }
    }

    /// Numeric comparison; `None` for NaN or genuinely complex operands.
    pub fn partial_cmp_num(&self, other: &Numeric, ctx: &NumContext) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_exact_rational(), other.as_exact_rational()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Numeric::Complex(c), _) if !c.is_real() => None,
            (_, Numeric::Complex(c)) if !c.is_real() => None,
            _ => self
                .to_real_widened(ctx)
                .partial_cmp_val(&other.to_real_widened(ctx)),
        }
    }

    /// Tolerant equality: exact pairs compare exactly, anything inexact
    /// within the context zero tolerance.
    pub fn approx_eq(&self, other: &Numeric, ctx: &NumContext) -> bool {
        if let (Some(a), Some(b)) = (self.as_exact_rational(), other.as_exact_rational()) {
            return a == b;
        }
        if self.layer() == Layer::Complex || other.layer() == Layer::Complex {
            let a = self.to_complex_widened(ctx);
            let b = other.to_complex_widened(ctx);
            return a.re.approx_eq(&b.re, ctx) && a.im.approx_eq(&b.im, ctx);
        }
        self.to_real_widened(ctx)
            .approx_eq(&other.to_real_widened(ctx), ctx)
    }

    /// Total deterministic order for canonical sorting (not a numeric
    /// order: NaN sorts first, complex values by real then imaginary part).
    pub fn canonical_cmp(&self, other: &Numeric) -> Ordering {
        type PartKey = (u8, Option<BigRational>);
        fn real_key(r: &Real) -> PartKey {
            match r {
                Real::Nan => (0, None),
                Real::NegInfinity => (1, None),
                Real::Finite(d) => (2, Some(decimal_to_rational(d))),
                Real::PosInfinity => (3, None),
            }
        }
        fn parts(v: &Numeric) -> (PartKey, PartKey) {
            let zero: PartKey = (2, Some(BigRational::zero()));
            match v {
                Numeric::Integer(n) => {
                    ((2, Some(BigRational::from_integer(n.clone()))), zero)
                }
                Numeric::Rational(r) => ((2, Some(r.clone())), zero),
                Numeric::Real(r) => (real_key(r), zero),
                Numeric::Complex(c) => (real_key(&c.re), real_key(&c.im)),
            }
        }
        let (a_re, a_im) = parts(self);
        let (b_re, b_im) = parts(other);
        a_re.cmp(&b_re).then_with(|| a_im.cmp(&b_im))
    }

    pub fn to_bigint(&self) -> Result<BigInt, NumError> {
        match self {
            Numeric::Integer(n) => Ok(n.clone()),
            Numeric::Rational(r) => {
                if r.is_integer() {
                    Ok(r.to_integer())
                } else {
                    Err(self.cast_err("Integer"))
                }
            }
            Numeric::Real(Real::Finite(d)) if d.is_integer() => {
                let (n, _) = d.with_scale(0).as_bigint_and_exponent();
                Ok(n)
            }
            Numeric::Complex(c) if c.is_real() => {
                Numeric::Real(c.re.clone()).to_bigint().map_err(|_| self.cast_err("Integer"))
            }
            _ => Err(self.cast_err("Integer")),
        }
    }

    /// Exact rational form; finite decimals convert losslessly as
    /// `p / 10^k`, sentinels have none.
    pub fn to_rational_exact(&self) -> Result<BigRational, NumError> {
        match self {
            Numeric::Integer(n) => Ok(BigRational::from_integer(n.clone())),
            Numeric::Rational(r) => Ok(r.clone()),
            Numeric::Real(Real::Finite(d)) => Ok(decimal_to_rational(d)),
            Numeric::Real(_) => Err(NumError::NonFiniteRational),
            Numeric::Complex(c) if c.is_real() => {
                Numeric::Real(c.re.clone()).to_rational_exact()
            }
            _ => Err(self.cast_err("Rational")),
        }
    }

    pub fn to_real_checked(&self, ctx: &NumContext) -> Result<Real, NumError> {
        match self {
            Numeric::Complex(c) => {
                if c.is_real() || c.im.is_negligible(ctx) {
                    Ok(c.re.clone())
                } else {
                    Err(self.cast_err("Real"))
                }
            }
            other => Ok(other.to_real_widened(ctx)),
        }
    }

    pub fn to_i64_exact(&self) -> Option<i64> {
        self.to_bigint().ok().and_then(|n| n.to_i64())
    }

    /// Re-round inexact parts to the context precision; exact layers pass
    /// through untouched. Used after internal work at widened precision.
    pub fn rounded_to(&self, ctx: &NumContext) -> Numeric {
        fn round_real(r: &Real, ctx: &NumContext) -> Real {
            match r {
                Real::Finite(d) => Real::finite(d.clone(), ctx),
                other => other.clone(),
            }
        }
        match self {
            Numeric::Real(r) => Numeric::Real(round_real(r, ctx)).narrowed(ctx),
            Numeric::Complex(c) => {
                let z = Complex::new(round_real(&c.re, ctx), round_real(&c.im, ctx));
                Numeric::Complex(z).narrowed(ctx)
            }
            other => other.clone(),
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Numeric::Integer(n) => n.to_f64(),
            Numeric::Rational(r) => r.to_f64(),
            Numeric::Real(r) => r.to_f64(),
            Numeric::Complex(c) => {
                if c.is_real() {
                    c.re.to_f64()
                } else {
                    None
                }
            }
        }
    }

    fn cast_err(&self, target: &'static str) -> NumError {
        NumError::Cast {
            value: self.to_string(),
            target,
        }
    }
}

fn widen_pair(a: &Numeric, b: &Numeric, ctx: &NumContext) -> (Numeric, Numeric) {
    let layer = a.layer().max(b.layer());
    (a.lifted(layer, ctx), b.lifted(layer, ctx))
}

fn narrow_decimal(d: BigDecimal, ctx: &NumContext) -> Numeric {
    if d.is_integer() {
        let (n, _) = d.with_scale(0).as_bigint_and_exponent();
        return Numeric::Integer(n);
    }
    let (n, s) = d.normalized().as_bigint_and_exponent();
    if s > 0 {
        let r = BigRational::new(n, ten_to_the(s as u64));
        let bound = BigInt::from(ctx.max_rational_magnitude);
        if r.numer().abs() <= bound && *r.denom() <= bound {
            return Numeric::Rational(r);
        }
    }
    Numeric::Real(Real::Finite(d))
}

/// Exact rational form of a finite decimal.
fn decimal_to_rational(d: &BigDecimal) -> BigRational {
    let (n, s) = d.normalized().as_bigint_and_exponent();
    if s >= 0 {
        BigRational::new(n, ten_to_the(s as u64))
    } else {
        BigRational::from_integer(n * ten_to_the((-s) as u64))
    }
}

fn nth_root_exact(n: &BigInt, q: u32) -> Option<BigInt> {
    use num_traits::Pow;
    let r = n.nth_root(q);
    if Pow::pow(&r, q) == *n {
        Some(r)
    } else {
        None
    }
}

fn rational_powi(base: &BigRational, e: i64) -> Numeric {
    let mut m = e.unsigned_abs();
    let mut b = base.clone();
    let mut acc = BigRational::from_integer(BigInt::from(1));
    while m > 0 {
        if m & 1 == 1 {
            acc = &acc * &b;
        }
        m >>= 1;
        if m > 0 {
            b = &b * &b;
        }
    }
    if e < 0 {
        acc = acc.recip(); // base nonzero, so acc is nonzero
    }
    if acc.is_integer() {
        Numeric::Integer(acc.to_integer())
    } else {
        Numeric::Rational(acc)
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Numeric {
        Numeric::int(n)
    }
}

impl From<BigInt> for Numeric {
    fn from(n: BigInt) -> Numeric {
        Numeric::Integer(n)
    }
}

impl From<BigRational> for Numeric {
    fn from(r: BigRational) -> Numeric {
        if r.is_integer() {
            Numeric::Integer(r.to_integer())
        } else {
            Numeric::Rational(r)
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(n) => write!(f, "{}", n),
            Numeric::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Numeric::Real(r) => write!(f, "{}", r),
            Numeric::Complex(c) => write!(f, "{}", c),
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

    fn dec(s: &str) -> Numeric {
        Numeric::from_decimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_narrow_whole_decimal_to_integer() {
        let c = ctx();
        assert_eq!(dec("2.0").narrowed(&c), Numeric::int(2));
        assert_eq!(dec("-17.000").narrowed(&c), Numeric::int(-17));
    }

    #[test]
    fn test_narrow_terminating_decimal_to_rational() {
        let c = ctx();
        match dec("1.5").narrowed(&c) {
            Numeric::Rational(r) => {
                assert_eq!(r, BigRational::new(BigInt::from(3), BigInt::from(2)));
            }
            other => panic!("expected rational, got {other}"),
        }
    }

    #[test]
    fn test_narrow_respects_magnitude_bound() {
        let c = ctx().with_max_rational_magnitude(100);
        // 1/128 needs denominator 128 > 100, so it stays a decimal
        assert!(matches!(
            dec("0.0078125").narrowed(&c),
            Numeric::Real(Real::Finite(_))
        ));
    }

    #[test]
    fn test_narrowing_is_idempotent() {
        let c = ctx();
        let v = dec("3.25").narrowed(&c);
        assert_eq!(v.clone().narrowed(&c), v);
    }

    #[test]
    fn test_narrow_disabled_keeps_layer() {
        let c = ctx().with_downcast(false);
        assert!(matches!(
            dec("2.0").narrowed(&c),
            Numeric::Real(Real::Finite(_))
        ));
    }

    #[test]
    fn test_complex_with_negligible_im_collapses() {
        let c = ctx();
        let z = Numeric::Complex(Complex::new(
            Real::from_i64(3),
            Real::Finite(BigDecimal::from_str("1e-30").unwrap()),
        ));
        assert_eq!(z.narrowed(&c), Numeric::int(3));
    }

    #[test]
    fn test_complex_with_nan_part_is_nan() {
        let c = ctx();
        let z = Numeric::Complex(Complex::new(Real::from_i64(3), Real::Nan));
        assert_eq!(z.narrowed(&c), Numeric::nan());
    }

    #[test]
    fn test_rational_den_one_is_integer() {
        assert_eq!(Numeric::rational(6, 3).unwrap(), Numeric::int(2));
        assert!(Numeric::rational(1, 0).is_err());
    }

    #[test]
    fn test_mixed_addition_widens() {
        let c = ctx();
        let r = Numeric::rational(1, 2).unwrap();
        assert_eq!(
            Numeric::int(1).add(&r, &c),
            Numeric::rational(3, 2).unwrap()
        );
    }

    #[test]
    fn test_division_is_total() {
        let c = ctx();
        assert_eq!(Numeric::int(1).div(&Numeric::int(0), &c), Numeric::nan());
        assert_eq!(
            Numeric::int(1).div(&dec("0.0"), &c),
            Numeric::nan()
        );
        // a tiny but nonzero inexact divisor divides fine
        assert!(!Numeric::int(1).div(&dec("1e-40"), &c).is_nan());
    }

    #[test]
    fn test_integer_division_narrows() {
        let c = ctx();
        assert_eq!(Numeric::int(6).div(&Numeric::int(3), &c), Numeric::int(2));
        assert_eq!(
            Numeric::int(1).div(&Numeric::int(3), &c),
            Numeric::rational(1, 3).unwrap()
        );
    }

    #[test]
    fn test_pow_exact_integer() {
        let c = ctx();
        assert_eq!(
            Numeric::int(2).pow(&Numeric::int(10), &c),
            Numeric::int(1024)
        );
        assert_eq!(
            Numeric::int(2).pow(&Numeric::int(-2), &c),
            Numeric::rational(1, 4).unwrap()
        );
    }

    #[test]
    fn test_pow_exact_roots() {
        let c = ctx();
        assert_eq!(
            Numeric::int(8).pow(&Numeric::rational(1, 3).unwrap(), &c),
            Numeric::int(2)
        );
        assert_eq!(
            Numeric::int(-27).pow(&Numeric::rational(1, 3).unwrap(), &c),
            Numeric::int(-3)
        );
        // 2^(1/2) has no exact form; it falls to the decimal layer
        assert!(matches!(
            Numeric::int(2).pow(&Numeric::rational(1, 2).unwrap(), &c),
            Numeric::Real(Real::Finite(_))
        ));
    }

    #[test]
    fn test_pow_zero_cases() {
        let c = ctx();
        assert_eq!(Numeric::int(0).pow(&Numeric::int(0), &c), Numeric::nan());
        assert_eq!(Numeric::int(0).pow(&Numeric::int(3), &c), Numeric::int(0));
        assert_eq!(Numeric::int(0).pow(&Numeric::int(-1), &c), Numeric::nan());
        assert_eq!(Numeric::int(5).pow(&Numeric::int(0), &c), Numeric::int(1));
        assert_eq!(Numeric::pos_inf().pow(&Numeric::int(0), &c), Numeric::nan());
    }

    #[test]
    fn test_sqrt_negative_goes_complex() {
        let c = ctx();
        match Numeric::int(-4).sqrt(&c) {
            Numeric::Complex(z) => {
                assert!(z.re.is_zero());
                assert!(z.im.approx_eq(&Real::from_i64(2), &c));
            }
            other => panic!("expected complex, got {other}"),
        }
    }

    #[test]
    fn test_log_exact() {
        assert_eq!(
            Numeric::log_exact(&Numeric::int(2), &Numeric::int(8)),
            Some(Numeric::int(3))
        );
        assert_eq!(
            Numeric::log_exact(&Numeric::int(10), &Numeric::rational(1, 100).unwrap()),
            Some(Numeric::int(-2))
        );
        assert_eq!(Numeric::log_exact(&Numeric::int(2), &Numeric::int(7)), None);
    }

    #[test]
    fn test_exactness() {
        assert!(Numeric::int(3).is_exact());
        assert!(Numeric::rational(1, 3).unwrap().is_exact());
        assert!(!dec("1.5").is_exact());
        assert!(Numeric::pos_inf().is_exact());
        assert!(Numeric::nan().is_exact());
    }

    #[test]
    fn test_casts() {
        let c = ctx();
        assert_eq!(dec("42.0").to_bigint().unwrap(), BigInt::from(42));
        assert!(dec("1.5").to_bigint().is_err());
        assert_eq!(
            dec("0.75").to_rational_exact().unwrap(),
            BigRational::new(BigInt::from(3), BigInt::from(4))
        );
        assert!(Numeric::pos_inf().to_rational_exact().is_err());
        assert!(Numeric::imaginary_unit().to_real_checked(&c).is_err());
    }

    #[test]
    fn test_signum_complex() {
        let c = ctx();
        let z = Numeric::Complex(Complex::new(Real::from_i64(3), Real::from_i64(4)));
        match z.signum(&c) {
            Numeric::Complex(s) => {
                let m = s.abs(&c);
                assert!(m.approx_eq(&Real::one(), &c));
            }
            other => panic!("expected complex signum, got {other}"),
        }
    }

    #[test]
    fn test_tolerant_equality() {
        let c = ctx();
        assert!(dec("1.00000000000000000002").approx_eq(&Numeric::int(1), &c));
        assert!(!dec("1.1").approx_eq(&Numeric::int(1), &c));
        assert!(Numeric::rational(1, 3)
            .unwrap()
            .approx_eq(&Numeric::rational(1, 3).unwrap(), &c));
    }
}
