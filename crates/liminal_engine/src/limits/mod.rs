//! Directional limits.
//!
//! Every destination is reduced to an approach toward positive infinity
//! and handed to an ordered chain of solvers, from plain substitution up
//! to one l'Hopital step. Unresolved limits come back as residual limit
//! nodes, never as errors.

mod engine;
mod solvers;

pub use engine::LimitOutcome;
