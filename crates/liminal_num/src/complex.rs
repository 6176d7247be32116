//! Complex layer: a pair of reals.
//!
//! Every function takes the real-only fast path when the imaginary part is
//! zero, so real arguments never pay for the general formulas. The
//! magnitude factors out the larger component before squaring (`hypot`
//! style) to avoid overflow and needless precision loss.

use std::fmt;

use bigdecimal::BigDecimal;
use num_traits::{One, Zero};

use crate::consts;
use crate::context::{NumContext, GUARD_DIGITS};
use crate::real::{div_core, half, rounded, sqrt_positive, Real};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Complex {
    pub re: Real,
    pub im: Real,
}

impl Complex {
    pub fn new(re: Real, im: Real) -> Complex {
        Complex { re, im }
    }

    pub fn from_real(re: Real) -> Complex {
        Complex {
            re,
            im: Real::zero(),
        }
    }

    /// The imaginary unit.
    pub fn i() -> Complex {
        Complex {
            re: Real::zero(),
            im: Real::one(),
        }
    }

    pub fn zero() -> Complex {
        Complex::from_real(Real::zero())
    }

    pub fn one() -> Complex {
        Complex::from_real(Real::one())
    }

    pub fn nan() -> Complex {
        Complex {
            re: Real::Nan,
            im: Real::Nan,
        }
    }

    pub fn is_real(&self) -> bool {
        self.im.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.re.is_zero() && self.im.is_zero()
    }

    pub fn has_nan(&self) -> bool {
        self.re.is_nan() || self.im.is_nan()
    }

    pub fn is_finite(&self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    pub fn conj(&self) -> Complex {
        Complex {
            re: self.re.clone(),
            im: self.im.neg(),
        }
    }

    pub fn neg(&self) -> Complex {
        Complex {
            re: self.re.neg(),
            im: self.im.neg(),
        }
    }

    pub fn add(&self, o: &Complex, ctx: &NumContext) -> Complex {
        Complex {
            re: self.re.add(&o.re, ctx),
            im: self.im.add(&o.im, ctx),
        }
    }

    pub fn sub(&self, o: &Complex, ctx: &NumContext) -> Complex {
        Complex {
            re: self.re.sub(&o.re, ctx),
            im: self.im.sub(&o.im, ctx),
        }
    }

    pub fn mul(&self, o: &Complex, ctx: &NumContext) -> Complex {
        let w = ctx.working();
        let ac = self.re.mul(&o.re, &w);
        let bd = self.im.mul(&o.im, &w);
        let ad = self.re.mul(&o.im, &w);
        let bc = self.im.mul(&o.re, &w);
        Complex {
            re: ac.sub(&bd, ctx),
            im: ad.add(&bc, ctx),
        }
    }

    /// Total division: a zero divisor yields NaN parts.
    pub fn div(&self, o: &Complex, ctx: &NumContext) -> Complex {
        let w = ctx.working();
        let n = o.re.mul(&o.re, &w).add(&o.im.mul(&o.im, &w), &w);
        if n.is_zero() {
            return Complex::nan();
        }
        let num = self.mul(&o.conj(), &w);
        Complex {
            re: num.re.div(&n, ctx),
            im: num.im.div(&n, ctx),
        }
    }

    /// |z|, factoring out the larger component before squaring.
    pub fn abs(&self, ctx: &NumContext) -> Real {
        if self.re.is_nan() || self.im.is_nan() {
            return Real::Nan;
        }
        if self.re.is_infinite() || self.im.is_infinite() {
            return Real::PosInfinity;
        }
        let (Some(a), Some(b)) = (self.re.as_decimal(), self.im.as_decimal()) else {
            return Real::Nan;
        };
        let p = ctx.precision + GUARD_DIGITS;
        let (big, small) = if a.abs() >= b.abs() {
            (a.abs(), b.abs())
        } else {
            (b.abs(), a.abs())
        };
        if big.is_zero() {
            return Real::zero();
        }
        let r = div_core(&small, &big, p);
        let s = sqrt_positive(&(BigDecimal::one() + rounded(&r * &r, p)), p);
        Real::Finite(rounded(big * s, ctx.precision))
    }

    /// Principal argument via atan2.
    pub fn arg(&self, ctx: &NumContext) -> Real {
        self.im.atan2(&self.re, ctx)
    }

    pub fn sqrt(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            if !self.re.is_negative() {
                return Complex::from_real(self.re.sqrt(ctx));
            }
            return Complex::new(Real::zero(), self.re.neg().sqrt(ctx));
        }
        // half-angle polar form
        let w = ctx.working();
        let r = self.abs(&w).sqrt(&w);
        let t = self.arg(&w).mul(&half_real(), &w);
        Complex {
            re: r.mul(&t.cos(&w), ctx),
            im: r.mul(&t.sin(&w), ctx),
        }
    }

    pub fn exp(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            return Complex::from_real(self.re.exp(ctx));
        }
        let w = ctx.working();
        let ea = self.re.exp(&w);
        Complex {
            re: ea.mul(&self.im.cos(&w), ctx),
            im: ea.mul(&self.im.sin(&w), ctx),
        }
    }

    pub fn ln(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() && self.re.is_positive() {
            return Complex::from_real(self.re.ln(ctx));
        }
        let w = ctx.working();
        Complex {
            re: self.abs(&w).ln(ctx),
            im: self.arg(ctx),
        }
    }

    pub fn pow(&self, e: &Complex, ctx: &NumContext) -> Complex {
        if self.is_zero() {
            // 0^w: collapses for positive real part, indeterminate otherwise
            if e.re.is_positive() {
                return Complex::zero();
            }
            return Complex::nan();
        }
        if self.im.is_zero() && e.im.is_zero() {
            let r = self.re.pow(&e.re, ctx);
            if !r.is_nan() {
                return Complex::from_real(r);
            }
            // e.g. (−2)^(1/2): fall through to the general formula
        }
        let w = ctx.working();
        self.ln(&w).mul(e, &w).exp(ctx)
    }

    pub fn sin(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            return Complex::from_real(self.re.sin(ctx));
        }
        let w = ctx.working();
        Complex {
            re: self.re.sin(&w).mul(&self.im.cosh(&w), ctx),
            im: self.re.cos(&w).mul(&self.im.sinh(&w), ctx),
        }
    }

    pub fn cos(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            return Complex::from_real(self.re.cos(ctx));
        }
        let w = ctx.working();
        Complex {
            re: self.re.cos(&w).mul(&self.im.cosh(&w), ctx),
            im: self.re.sin(&w).mul(&self.im.sinh(&w), ctx).neg(),
        }
    }

    pub fn tan(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            return Complex::from_real(self.re.tan(ctx));
        }
        let w = ctx.working();
        self.sin(&w).div(&self.cos(&w), ctx)
    }

    pub fn cot(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            return Complex::from_real(self.re.cot(ctx));
        }
        let w = ctx.working();
        self.cos(&w).div(&self.sin(&w), ctx)
    }

    /// asin z = −i·ln(iz + √(1−z²)).
    pub fn asin(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            let r = self.re.asin(ctx);
            if !r.is_nan() {
                return Complex::from_real(r);
            }
        }
        let w = ctx.working();
        let root = Complex::one().sub(&self.mul(self, &w), &w).sqrt(&w);
        let iz = self.mul(&Complex::i(), &w);
        iz.add(&root, &w).ln(&w).mul(&neg_i(), ctx)
    }

    pub fn acos(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            let r = self.re.acos(ctx);
            if !r.is_nan() {
                return Complex::from_real(r);
            }
        }
        let w = ctx.working();
        let p = w.precision + GUARD_DIGITS;
        let half_pi = Complex::from_real(Real::Finite(half(&consts::pi(p))));
        half_pi.sub(&self.asin(&w), ctx)
    }

    /// atan z = (i/2)·(ln(1−iz) − ln(1+iz)).
    pub fn atan(&self, ctx: &NumContext) -> Complex {
        if self.im.is_zero() {
            return Complex::from_real(self.re.atan(ctx));
        }
        let w = ctx.working();
        let iz = self.mul(&Complex::i(), &w);
        let a = Complex::one().sub(&iz, &w).ln(&w);
        let b = Complex::one().add(&iz, &w).ln(&w);
        let halved = a.sub(&b, &w).mul(&Complex::i(), &w);
        halved.mul(&Complex::from_real(half_real()), ctx)
    }
}

fn half_real() -> Real {
    Real::Finite(half(&BigDecimal::one()))
}

fn neg_i() -> Complex {
    Complex {
        re: Real::zero(),
        im: Real::Finite(BigDecimal::from(-1)),
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_zero() {
            return write!(f, "{}", self.re);
        }
        let im_mag = self.im.abs();
        let sign = if self.im.is_negative() { "-" } else { "+" };
        if self.re.is_zero() {
            if self.im.is_negative() {
                return write!(f, "-{}i", im_mag);
            }
            return write!(f, "{}i", im_mag);
        }
        write!(f, "{} {} {}i", self.re, sign, im_mag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> NumContext {
        NumContext::default().with_precision(30)
    }

    #[test]
    fn test_abs_pythagorean() {
        let c = ctx();
        let z = Complex::new(Real::from_i64(3), Real::from_i64(4));
        assert_eq!(z.abs(&c), Real::from_i64(5));
    }

    #[test]
    fn test_i_squared() {
        let c = ctx();
        let z = Complex::i().mul(&Complex::i(), &c);
        assert_eq!(z.re, Real::from_i64(-1));
        assert!(z.im.is_zero());
    }

    #[test]
    fn test_sqrt_negative_real() {
        let c = ctx();
        let z = Complex::from_real(Real::from_i64(-4)).sqrt(&c);
        assert!(z.re.is_zero());
        assert!(z.im.approx_eq(&Real::from_i64(2), &c));
    }

    #[test]
    fn test_euler_identity() {
        let c = ctx();
        let pi = Real::Finite(consts::pi(40).as_ref().clone());
        let z = Complex::new(Real::zero(), pi).exp(&c);
        assert!(z.re.approx_eq(&Real::from_i64(-1), &c));
        assert!(z.im.is_negligible(&c));
    }

    #[test]
    fn test_division() {
        let c = ctx();
        // (1 + i) / (1 − i) = i
        let a = Complex::new(Real::one(), Real::one());
        let b = Complex::new(Real::one(), Real::from_i64(-1));
        let q = a.div(&b, &c);
        assert!(q.re.is_negligible(&c));
        assert!(q.im.approx_eq(&Real::one(), &c));
    }

    #[test]
    fn test_division_by_zero_is_nan() {
        let c = ctx();
        let q = Complex::one().div(&Complex::zero(), &c);
        assert!(q.has_nan());
    }

    #[test]
    fn test_asin_beyond_one_goes_complex() {
        let c = ctx();
        let z = Complex::from_real(Real::from_i64(2)).asin(&c);
        assert!(!z.im.is_zero());
        assert!(z.re.is_finite() && z.im.is_finite());
    }

    #[test]
    fn test_real_fast_path_stays_real() {
        let c = ctx();
        let z = Complex::from_real(Real::from_i64(9)).sqrt(&c);
        assert!(z.im.is_zero());
        assert_eq!(z.re, Real::from_i64(3));
    }
}
