//! Layered numeric tower: Integer ⊂ Rational ⊂ Real ⊂ Complex.
//!
//! Exact layers (`Integer`, `Rational`) never lose information; the `Real`
//! layer is an arbitrary-precision decimal with ±∞/NaN sentinels; `Complex`
//! is a pair of reals. Arithmetic widens both operands to a common layer,
//! dispatches there, and narrows the result back down (`Numeric::narrowed`).
//!
//! All precision-sensitive operations take an explicit [`NumContext`];
//! there is no process-wide numeric state apart from the per-precision
//! constant caches in [`consts`].

pub mod complex;
pub mod consts;
pub mod context;
pub mod error;
pub mod functions;
pub mod gamma;
pub mod real;
pub mod value;

pub use complex::Complex;
pub use context::NumContext;
pub use error::NumError;
pub use real::Real;
pub use value::Numeric;

// Backing types, re-exported so downstream crates match on tower contents
// without naming the num crates directly.
pub use bigdecimal::BigDecimal;
pub use num_bigint::BigInt;
pub use num_rational::BigRational;
