//! Read-only and rebuilding traversal traits.
//!
//! [`Visitor`] walks a tree without changing it; [`Transformer`] rebuilds
//! bottom-up, returning the original id wherever nothing changed so callers
//! can detect no-op passes by id comparison.

use liminal_num::Numeric;

use crate::expression::{Constant, Context, Expr, ExprId};
use crate::symbol::SymbolId;

pub trait Visitor {
    fn visit_expr(&mut self, context: &Context, id: ExprId) {
        match context.get(id) {
            Expr::Number(n) => self.visit_number(n),
            Expr::Constant(c) => self.visit_constant(*c),
            Expr::Variable(sym) => self.visit_variable(*sym),
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r)
            | Expr::Log(l, r) => {
                let (l, r) = (*l, *r);
                self.visit_expr(context, l);
                self.visit_expr(context, r);
            }
            Expr::Neg(e) | Expr::Func(_, e) => {
                let e = *e;
                self.visit_expr(context, e);
            }
            Expr::Derivative { expr, .. } | Expr::Integral { expr, .. } => {
                let expr = *expr;
                self.visit_expr(context, expr);
            }
            Expr::Limit {
                expr, destination, ..
            } => {
                let (expr, destination) = (*expr, *destination);
                self.visit_expr(context, expr);
                self.visit_expr(context, destination);
            }
        }
    }

    fn visit_number(&mut self, _n: &Numeric) {}
    fn visit_constant(&mut self, _c: Constant) {}
    fn visit_variable(&mut self, _sym: SymbolId) {}
}

pub trait Transformer {
    /// Bottom-up rebuild. Children are transformed first, then
    /// [`Transformer::transform_node`] sees the rebuilt node.
    fn transform_expr(&mut self, context: &mut Context, id: ExprId) -> ExprId {
        let rebuilt = match context.get(id).clone() {
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => id,
            Expr::Add(l, r) => {
                let (nl, nr) = self.transform_pair(context, l, r);
                context.add(Expr::Add(nl, nr))
            }
            Expr::Sub(l, r) => {
                let (nl, nr) = self.transform_pair(context, l, r);
                context.add(Expr::Sub(nl, nr))
            }
            Expr::Mul(l, r) => {
                let (nl, nr) = self.transform_pair(context, l, r);
                context.add(Expr::Mul(nl, nr))
            }
            Expr::Div(l, r) => {
                let (nl, nr) = self.transform_pair(context, l, r);
                context.add(Expr::Div(nl, nr))
            }
            Expr::Pow(b, e) => {
                let (nb, ne) = self.transform_pair(context, b, e);
                context.add(Expr::Pow(nb, ne))
            }
            Expr::Log(b, a) => {
                let (nb, na) = self.transform_pair(context, b, a);
                context.add(Expr::Log(nb, na))
            }
            Expr::Neg(e) => {
                let ne = self.transform_expr(context, e);
                context.add(Expr::Neg(ne))
            }
            Expr::Func(f, e) => {
                let ne = self.transform_expr(context, e);
                context.add(Expr::Func(f, ne))
            }
            Expr::Derivative { expr, var, order } => {
                let ne = self.transform_expr(context, expr);
                context.add(Expr::Derivative {
                    expr: ne,
                    var,
                    order,
                })
            }
            Expr::Integral { expr, var, order } => {
                let ne = self.transform_expr(context, expr);
                context.add(Expr::Integral {
                    expr: ne,
                    var,
                    order,
                })
            }
            Expr::Limit {
                expr,
                var,
                destination,
                side,
            } => {
                let ne = self.transform_expr(context, expr);
                let nd = self.transform_expr(context, destination);
                context.add(Expr::Limit {
                    expr: ne,
                    var,
                    destination: nd,
                    side,
                })
            }
        };
        self.transform_node(context, rebuilt)
    }

    /// Hook applied to every node after its children were rebuilt.
    /// The default is the identity.
    fn transform_node(&mut self, _context: &mut Context, id: ExprId) -> ExprId {
        id
    }

    fn transform_pair(
        &mut self,
        context: &mut Context,
        l: ExprId,
        r: ExprId,
    ) -> (ExprId, ExprId) {
        let nl = self.transform_expr(context, l);
        let nr = self.transform_expr(context, r);
        (nl, nr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VariableCounter(usize);

    impl Visitor for VariableCounter {
        fn visit_variable(&mut self, _sym: SymbolId) {
            self.0 += 1;
        }
    }

    struct NegStripper;

    impl Transformer for NegStripper {
        fn transform_node(&mut self, context: &mut Context, id: ExprId) -> ExprId {
            match context.get(id) {
                Expr::Neg(inner) => {
                    let inner = *inner;
                    match context.get(inner) {
                        Expr::Neg(e) => *e,
                        _ => id,
                    }
                }
                _ => id,
            }
        }
    }

    #[test]
    fn test_visitor_reaches_all_leaves() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let two = ctx.num(2);
        let m = ctx.add(Expr::Mul(two, x));
        let sum = ctx.add(Expr::Add(m, y));
        let mut counter = VariableCounter(0);
        counter.visit_expr(&ctx, sum);
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn test_transformer_rewrites_bottom_up() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let n1 = ctx.add(Expr::Neg(x));
        let n2 = ctx.add(Expr::Neg(n1));
        let rewritten = NegStripper.transform_expr(&mut ctx, n2);
        assert_eq!(rewritten, x);
    }

    #[test]
    fn test_transformer_identity_keeps_ids() {
        struct Identity;
        impl Transformer for Identity {}

        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let sum = ctx.add(Expr::Add(x, y));
        assert_eq!(Identity.transform_expr(&mut ctx, sum), sum);
    }
}
