/// Ambient numeric settings, passed explicitly into every tower operation.
///
/// A `NumContext` is `Copy`; scoped overrides are modified copies
/// (`ctx.with_precision(2 * ctx.precision)`), so the caller's settings are
/// restored on every exit path by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumContext {
    /// Significant decimal digits carried by inexact results.
    pub precision: u32,
    /// Whether results are narrowed to the lowest layer that holds them.
    pub downcast: bool,
    /// `|x| < 10^zero_tolerance_exp` counts as zero in tolerant comparisons
    /// and when collapsing a complex value with a negligible imaginary part.
    pub zero_tolerance_exp: i32,
    /// Bound on numerator and denominator magnitude when narrowing a finite
    /// decimal to a rational.
    pub max_rational_magnitude: u64,
}

/// Guard digits added to the working precision of internal computations.
pub(crate) const GUARD_DIGITS: u32 = 10;

/// Hard cap on series iterations; every convergent loop also breaks when
/// its term drops below the working precision.
pub(crate) const MAX_SERIES_ITERS: u32 = 100_000;

impl Default for NumContext {
    fn default() -> Self {
        NumContext {
            precision: 100,
            downcast: true,
            zero_tolerance_exp: -16,
            max_rational_magnitude: 100_000_000,
        }
    }
}

impl NumContext {
    pub fn with_precision(self, precision: u32) -> Self {
        NumContext { precision, ..self }
    }

    pub fn with_downcast(self, downcast: bool) -> Self {
        NumContext { downcast, ..self }
    }

    pub fn with_zero_tolerance_exp(self, zero_tolerance_exp: i32) -> Self {
        NumContext {
            zero_tolerance_exp,
            ..self
        }
    }

    pub fn with_max_rational_magnitude(self, max_rational_magnitude: u64) -> Self {
        NumContext {
            max_rational_magnitude,
            ..self
        }
    }

    /// Working context for internal series: same settings, guard digits added.
    pub(crate) fn working(self) -> Self {
        self.with_precision(self.precision + GUARD_DIGITS)
    }
}
