//! Expression arena and AST for the liminal CAS.
//!
//! Expressions live in a [`Context`] arena and are referenced by [`ExprId`].
//! `Context::add` hash-conses: structurally equal nodes share one id, so id
//! equality is structural equality and downstream caches can key on ids.
//!
//! The variant set is closed (see [`Expr`]); numeric payloads come from
//! `liminal_num` and carry their own exact/inexact distinction, including
//! the ±∞/NaN sentinels, so the AST has no separate infinity constants.

pub mod display;
pub mod expression;
pub mod ordering;
pub mod symbol;
pub mod traversal;
pub mod visitor;

pub use display::DisplayExpr;
pub use expression::{Codomain, Constant, Context, ContextStats, Expr, ExprId, LimitSide, UnaryFn};
pub use ordering::{compare_expr, compare_with_level, SortLevel};
pub use symbol::{SymbolId, SymbolTable};
pub use traversal::{
    collect_variables, count_all_nodes, count_nodes_matching, depends_on, substitute_var,
};
pub use visitor::{Transformer, Visitor};
