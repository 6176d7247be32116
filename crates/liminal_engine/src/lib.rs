//! Simplification, evaluation and limits over the liminal expression arena.
//!
//! The [`Engine`] owns a [`liminal_ast::Context`] together with its rewrite
//! caches and exposes the main operations: [`Engine::simplify`] (a scored
//! search over local rewrites and global passes), [`Engine::inner_eval`] and
//! [`Engine::eval_numeric`] (exact folding and decimal approximation through
//! the numeric tower), [`Engine::limit`] (directional limit resolution) and
//! [`Engine::differentiate`]. Every rewrite is a function of the expression
//! and the configured [`EngineOptions`] alone; there is no global state.

pub mod diff;
pub mod error;
pub mod options;
pub mod poly;

mod engine;
mod eval;
mod limits;
mod simplify;

pub use diff::differentiate;
pub use engine::Engine;
pub use error::EngineError;
pub use limits::LimitOutcome;
pub use options::{
    default_complexity, ComplexityFn, EngineOptions, ValueDomain, DEFAULT_LEVEL, DEFAULT_MAX_DEPTH,
};
