//! Plain-text rendering with precedence-driven parentheses.

use std::fmt;

use crate::expression::{Context, Expr, ExprId, LimitSide};

/// Renders an id against its context; ids alone carry no structure.
pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(self.context, self.id, f)
    }
}

fn write_child(
    ctx: &Context,
    id: ExprId,
    f: &mut fmt::Formatter<'_>,
    needs_parens: bool,
) -> fmt::Result {
    if needs_parens {
        write!(f, "(")?;
        write_expr(ctx, id, f)?;
        write!(f, ")")
    } else {
        write_expr(ctx, id, f)
    }
}

fn write_expr(ctx: &Context, id: ExprId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let expr = ctx.get(id);
    let prio = expr.priority();
    match expr {
        Expr::Number(n) => write!(f, "{}", n),
        Expr::Constant(c) => f.write_str(c.name()),
        Expr::Variable(sym) => f.write_str(ctx.sym_name(*sym)),
        Expr::Add(l, r) => {
            write_child(ctx, *l, f, ctx.get(*l).priority() < prio)?;
            write!(f, " + ")?;
            write_child(ctx, *r, f, ctx.get(*r).priority() < prio)
        }
        Expr::Sub(l, r) => {
            write_child(ctx, *l, f, ctx.get(*l).priority() < prio)?;
            write!(f, " - ")?;
            // right side needs parens at equal precedence: a - (b - c)
            write_child(ctx, *r, f, ctx.get(*r).priority() <= prio)
        }
        Expr::Mul(l, r) => {
            write_child(ctx, *l, f, ctx.get(*l).priority() < prio)?;
            write!(f, " * ")?;
            write_child(ctx, *r, f, ctx.get(*r).priority() < prio)
        }
        Expr::Div(l, r) => {
            write_child(ctx, *l, f, ctx.get(*l).priority() < prio)?;
            write!(f, " / ")?;
            write_child(ctx, *r, f, ctx.get(*r).priority() <= prio)
        }
        Expr::Pow(b, e) => {
            write_child(ctx, *b, f, ctx.get(*b).priority() <= prio)?;
            write!(f, "^")?;
            // nested powers keep their parens so towers read unambiguously
            write_child(ctx, *e, f, ctx.get(*e).priority() <= prio)
        }
        Expr::Neg(e) => {
            write!(f, "-")?;
            write_child(ctx, *e, f, ctx.get(*e).priority() < prio)
        }
        Expr::Func(func, arg) => {
            write!(f, "{}(", func.name())?;
            write_expr(ctx, *arg, f)?;
            write!(f, ")")
        }
        Expr::Log(base, arg) => {
            write!(f, "log(")?;
            write_expr(ctx, *base, f)?;
            write!(f, ", ")?;
            write_expr(ctx, *arg, f)?;
            write!(f, ")")
        }
        Expr::Derivative { expr, var, order } => {
            write!(f, "derivative(")?;
            write_expr(ctx, *expr, f)?;
            write!(f, ", {}, {})", ctx.sym_name(*var), order)
        }
        Expr::Integral { expr, var, order } => {
            write!(f, "integral(")?;
            write_expr(ctx, *expr, f)?;
            write!(f, ", {}, {})", ctx.sym_name(*var), order)
        }
        Expr::Limit {
            expr,
            var,
            destination,
            side,
        } => {
            let name = match side {
                LimitSide::Left => "limit_left",
                LimitSide::Right => "limit_right",
                LimitSide::Both => "limit",
            };
            write!(f, "{}(", name)?;
            write_expr(ctx, *expr, f)?;
            write!(f, ", {}, ", ctx.sym_name(*var))?;
            write_expr(ctx, *destination, f)?;
            write!(f, ")")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::UnaryFn;

    fn render(ctx: &Context, id: ExprId) -> String {
        DisplayExpr { context: ctx, id }.to_string()
    }

    #[test]
    fn test_precedence_omits_redundant_parens() {
        let mut ctx = Context::new();
        let one = ctx.num(1);
        let x = ctx.var("x");
        let two = ctx.num(2);
        let m = ctx.add(Expr::Mul(x, two));
        let e = ctx.add(Expr::Add(one, m));
        assert_eq!(render(&ctx, e), "1 + x * 2");
    }

    #[test]
    fn test_pow_of_sum_is_parenthesized() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        let b = ctx.var("b");
        let two = ctx.num(2);
        let sum = ctx.add(Expr::Add(a, b));
        let p = ctx.add(Expr::Pow(sum, two));
        assert_eq!(render(&ctx, p), "(a + b)^2");
    }

    #[test]
    fn test_nested_sub_keeps_right_parens() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        let b = ctx.var("b");
        let c = ctx.var("c");
        let inner = ctx.add(Expr::Sub(b, c));
        let outer = ctx.add(Expr::Sub(a, inner));
        assert_eq!(render(&ctx, outer), "a - (b - c)");
    }

    #[test]
    fn test_function_and_limit_rendering() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let xs = ctx.sym("x");
        let s = ctx.func(UnaryFn::Sin, x);
        let q = ctx.add(Expr::Div(s, x));
        let zero = ctx.num(0);
        let lim = ctx.limit(q, xs, zero, LimitSide::Both);
        assert_eq!(render(&ctx, lim), "limit(sin(x) / x, x, 0)");

        let right = ctx.limit(q, xs, zero, LimitSide::Right);
        assert_eq!(render(&ctx, right), "limit_right(sin(x) / x, x, 0)");
    }

    #[test]
    fn test_pow_tower_binds_right() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let two = ctx.num(2);
        let three = ctx.num(3);
        let inner = ctx.add(Expr::Pow(two, three));
        let tower = ctx.add(Expr::Pow(x, inner));
        assert_eq!(render(&ctx, tower), "x^(2^3)");
    }
}
