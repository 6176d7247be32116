//! Traversal helpers and variable substitution.
//!
//! The counting and collection walks are iterative (explicit stacks), so
//! arbitrarily deep trees cannot overflow the call stack. Substitution is
//! recursive but memoized per call: the arena is a DAG, and the memo keeps
//! shared subtrees from being rewritten more than once.
//!
//! Substitution respects binders. `Limit`, `Derivative` and `Integral`
//! bind their variable inside `expr`; a limit's `destination` belongs to
//! the enclosing scope and is substituted normally.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::expression::{Context, Expr, ExprId};
use crate::symbol::SymbolId;

pub fn count_all_nodes(ctx: &Context, root: ExprId) -> usize {
    count_nodes_matching(ctx, root, |_| true)
}

/// Count nodes matching a predicate. Shared subtrees count once per
/// occurrence, not once per id.
pub fn count_nodes_matching<F>(ctx: &Context, root: ExprId, mut pred: F) -> usize
where
    F: FnMut(&Expr) -> bool,
{
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if pred(ctx.get(id)) {
            count += 1;
        }
        stack.extend(ctx.children(id));
    }
    count
}

/// Node count and maximum depth in one pass; the root has depth 0.
pub fn count_nodes_and_max_depth(ctx: &Context, root: ExprId) -> (usize, usize) {
    let mut count = 0;
    let mut max_depth = 0;
    let mut stack: Vec<(ExprId, usize)> = vec![(root, 0)];
    while let Some((id, depth)) = stack.pop() {
        count += 1;
        max_depth = max_depth.max(depth);
        for child in ctx.children(id) {
            stack.push((child, depth + 1));
        }
    }
    (count, max_depth)
}

/// Every variable occurring in the tree, bound occurrences included.
pub fn collect_variables(ctx: &Context, root: ExprId) -> FxHashSet<SymbolId> {
    let mut vars = FxHashSet::default();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if let Expr::Variable(sym) = ctx.get(id) {
            vars.insert(*sym);
        }
        stack.extend(ctx.children(id));
    }
    vars
}

/// Does `var` occur free in `root`?
pub fn depends_on(ctx: &Context, root: ExprId, var: SymbolId) -> bool {
    match ctx.get(root) {
        Expr::Variable(sym) => *sym == var,
        Expr::Derivative {
            expr, var: bound, ..
        }
        | Expr::Integral {
            expr, var: bound, ..
        } => {
            if *bound == var {
                false
            } else {
                depends_on(ctx, *expr, var)
            }
        }
        Expr::Limit {
            expr,
            var: bound,
            destination,
            ..
        } => {
            let in_body = *bound != var && depends_on(ctx, *expr, var);
            in_body || depends_on(ctx, *destination, var)
        }
        _ => ctx
            .children(root)
            .into_iter()
            .any(|c| depends_on(ctx, c, var)),
    }
}

/// Replace free occurrences of `var` with `replacement`.
///
/// Returns the original id when nothing changed. Bound regions are left
/// untouched without being walked; a limit node still substitutes into its
/// destination even when its binder shadows `var`.
pub fn substitute_var(
    ctx: &mut Context,
    root: ExprId,
    var: SymbolId,
    replacement: ExprId,
) -> ExprId {
    let mut memo: FxHashMap<ExprId, ExprId> = FxHashMap::default();
    substitute_inner(ctx, root, var, replacement, &mut memo)
}

fn substitute_inner(
    ctx: &mut Context,
    id: ExprId,
    var: SymbolId,
    replacement: ExprId,
    memo: &mut FxHashMap<ExprId, ExprId>,
) -> ExprId {
    if let Some(&done) = memo.get(&id) {
        return done;
    }
    let result = match ctx.get(id).clone() {
        Expr::Variable(sym) if sym == var => replacement,
        Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => id,
        Expr::Derivative {
            expr,
            var: bound,
            order,
        } => {
            if bound == var {
                id
            } else {
                let ne = substitute_inner(ctx, expr, var, replacement, memo);
                ctx.add(Expr::Derivative {
                    expr: ne,
                    var: bound,
                    order,
                })
            }
        }
        Expr::Integral {
            expr,
            var: bound,
            order,
        } => {
            if bound == var {
                id
            } else {
                let ne = substitute_inner(ctx, expr, var, replacement, memo);
                ctx.add(Expr::Integral {
                    expr: ne,
                    var: bound,
                    order,
                })
            }
        }
        Expr::Limit {
            expr,
            var: bound,
            destination,
            side,
        } => {
            let ne = if bound == var {
                expr
            } else {
                substitute_inner(ctx, expr, var, replacement, memo)
            };
            let nd = substitute_inner(ctx, destination, var, replacement, memo);
            ctx.add(Expr::Limit {
                expr: ne,
                var: bound,
                destination: nd,
                side,
            })
        }
        _ => {
            let mut new_kids = ctx.children(id);
            for slot in new_kids.iter_mut() {
                *slot = substitute_inner(ctx, *slot, var, replacement, memo);
            }
            ctx.rebuild(id, &new_kids)
        }
    };
    memo.insert(id, result);
    result
}
