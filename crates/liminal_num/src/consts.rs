//! Per-precision cached constants.
//!
//! π (Machin's formula), e (exponential series), ln 10 and √(2π) are
//! computed once per requested precision and shared behind mutex-guarded
//! tables. A second request at the same precision clones the stored `Arc`;
//! the insert is atomic under the lock, so concurrent first use cannot
//! corrupt an entry.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Zero;
use rustc_hash::FxHashMap;

use crate::context::GUARD_DIGITS;
use crate::functions::ln_near_one;
use crate::real::{rounded, sqrt_positive, ten_to_the};

type Table = Mutex<FxHashMap<u32, Arc<BigDecimal>>>;

static PI: LazyLock<Table> = LazyLock::new(|| Mutex::new(FxHashMap::default()));
static E: LazyLock<Table> = LazyLock::new(|| Mutex::new(FxHashMap::default()));
static LN10: LazyLock<Table> = LazyLock::new(|| Mutex::new(FxHashMap::default()));
static SQRT_TWO_PI: LazyLock<Table> = LazyLock::new(|| Mutex::new(FxHashMap::default()));

fn lock(table: &Table) -> MutexGuard<'_, FxHashMap<u32, Arc<BigDecimal>>> {
    // a poisoned table still holds only complete entries
    table.lock().unwrap_or_else(|e| e.into_inner())
}

fn cached(table: &Table, precision: u32, compute: impl FnOnce() -> BigDecimal) -> Arc<BigDecimal> {
    let mut entries = lock(table);
    if let Some(v) = entries.get(&precision) {
        return Arc::clone(v);
    }
    let v = Arc::new(compute());
    entries.insert(precision, Arc::clone(&v));
    v
}

/// `atan(1/x) · scale` by the alternating series, in scaled integers.
fn atan_inv_scaled(x: u64, scale: &BigInt) -> BigInt {
    let x2 = BigInt::from(x * x);
    let mut power = scale / BigInt::from(x);
    let mut sum = power.clone();
    let mut k = 1u64;
    while !power.is_zero() {
        power = &power / &x2;
        if power.is_zero() {
            break;
        }
        let term = &power / BigInt::from(2 * k + 1);
        if k % 2 == 1 {
            sum -= term;
        } else {
            sum += term;
        }
        k += 1;
    }
    sum
}

fn compute_pi(precision: u32) -> BigDecimal {
    tracing::debug!(precision, "computing pi");
    let p = precision + GUARD_DIGITS;
    let scale = ten_to_the(p as u64);
    // Machin: π = 16·atan(1/5) − 4·atan(1/239)
    let a = atan_inv_scaled(5, &scale);
    let b = atan_inv_scaled(239, &scale);
    let pi = a * 16u32 - b * 4u32;
    rounded(BigDecimal::new(pi, p as i64), precision)
}

fn compute_e(precision: u32) -> BigDecimal {
    tracing::debug!(precision, "computing e");
    let p = precision + GUARD_DIGITS;
    let scale = ten_to_the(p as u64);
    let mut term = scale.clone();
    let mut sum = scale;
    let mut k = 1u64;
    while !term.is_zero() {
        term /= k;
        sum += &term;
        k += 1;
    }
    rounded(BigDecimal::new(sum, p as i64), precision)
}

fn compute_ln10(precision: u32) -> BigDecimal {
    tracing::debug!(precision, "computing ln 10");
    let p = precision + GUARD_DIGITS;
    // 10^(1/4) lies in [1, 2) where the atanh series converges quickly
    let root = sqrt_positive(&sqrt_positive(&BigDecimal::from(10), p), p);
    rounded(ln_near_one(&root, p) * BigDecimal::from(4), precision)
}

fn compute_sqrt_two_pi(precision: u32) -> BigDecimal {
    let p = precision + GUARD_DIGITS;
    let two_pi = &*pi(p) * BigDecimal::from(2);
    rounded(sqrt_positive(&two_pi, p), precision)
}

/// π at `precision` significant digits.
pub fn pi(precision: u32) -> Arc<BigDecimal> {
    cached(&PI, precision, || compute_pi(precision))
}

/// e at `precision` significant digits.
pub fn e(precision: u32) -> Arc<BigDecimal> {
    cached(&E, precision, || compute_e(precision))
}

/// ln 10 at `precision` significant digits.
pub fn ln10(precision: u32) -> Arc<BigDecimal> {
    cached(&LN10, precision, || compute_ln10(precision))
}

/// √(2π) at `precision` significant digits.
pub fn sqrt_two_pi(precision: u32) -> Arc<BigDecimal> {
    cached(&SQRT_TWO_PI, precision, || compute_sqrt_two_pi(precision))
}
