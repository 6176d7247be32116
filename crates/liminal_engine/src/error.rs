//! Engine-level error type.
//!
//! Most engine entry points are total: simplification returns the best form
//! it found and an unresolved limit comes back as a residual limit node.
//! Errors are reserved for the cases where no expression answer exists at
//! all, such as numeric evaluation of an unbound variable.

use liminal_num::NumError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Num(#[from] NumError),

    /// The destination of a limit is a complex infinity. Directional limits
    /// are only defined along the real line.
    #[error("limit destination is a complex infinity")]
    ComplexInfiniteDestination,

    /// Structural recursion exceeded the configured depth bound. This only
    /// fires for pathological inputs; ordinary deep expressions are handled
    /// by the iterative walkers.
    #[error("recursion depth {0} exceeded")]
    RecursionDepthExceeded(usize),

    #[error("variable '{0}' has no bound value")]
    UnboundVariable(String),

    /// Numeric evaluation reached a node that does not collapse to a number,
    /// for example an unresolved integral marker.
    #[error("expression does not reduce to a number: {0}")]
    NonNumeric(&'static str),
}
