//! Expression nodes and the hash-consing arena.
//!
//! [`Context::add`] interns every node: structurally equal expressions get
//! the same [`ExprId`], so id equality is structural equality and rebuilds
//! that change nothing return the id they started from. Ids are only
//! meaningful together with the context that produced them.

use std::fmt;

use liminal_num::Numeric;
use rustc_hash::FxHashMap;
use smallvec::{smallvec, SmallVec};

use crate::symbol::{SymbolId, SymbolTable};

/// Index of a node in its [`Context`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Symbolic constants that stay unevaluated through exact simplification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
        }
    }
}

/// The built-in unary functions. A closed set: the engine matches on it
/// exhaustively, so growing it is a compile-time checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryFn {
    Sin,
    Cos,
    Tan,
    Cotan,
    Arcsin,
    Arccos,
    Arctan,
    Arccotan,
    Abs,
    Signum,
    Factorial,
}

impl UnaryFn {
    pub fn name(self) -> &'static str {
        match self {
            UnaryFn::Sin => "sin",
            UnaryFn::Cos => "cos",
            UnaryFn::Tan => "tan",
            UnaryFn::Cotan => "cotan",
            UnaryFn::Arcsin => "arcsin",
            UnaryFn::Arccos => "arccos",
            UnaryFn::Arctan => "arctan",
            UnaryFn::Arccotan => "arccotan",
            UnaryFn::Abs => "abs",
            UnaryFn::Signum => "signum",
            UnaryFn::Factorial => "factorial",
        }
    }
}

impl fmt::Display for UnaryFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Approach side of a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSide {
    Left,
    Right,
    Both,
}

/// Value-domain classification of a node's results. A small lattice
/// ordered `Boolean < Integer < Real < Complex < Any`; `Any` is the top
/// element for subtrees whose values depend on unbound variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Codomain {
    Boolean,
    Integer,
    Real,
    Complex,
    Any,
}

impl Codomain {
    /// Least upper bound.
    pub fn join(self, other: Codomain) -> Codomain {
        self.max(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(Numeric),
    Constant(Constant),
    Variable(SymbolId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Neg(ExprId),
    Func(UnaryFn, ExprId),
    /// log base `.0` of `.1`.
    Log(ExprId, ExprId),
    /// Unevaluated n-th derivative with respect to `var`.
    Derivative {
        expr: ExprId,
        var: SymbolId,
        order: u32,
    },
    /// Unevaluated n-fold antiderivative with respect to `var`.
    Integral {
        expr: ExprId,
        var: SymbolId,
        order: u32,
    },
    /// `var` is a binder: it is bound inside `expr` and free occurrences
    /// elsewhere are unrelated. `destination` lives in the enclosing scope.
    Limit {
        expr: ExprId,
        var: SymbolId,
        destination: ExprId,
        side: LimitSide,
    },
}

impl Expr {
    /// Display precedence; higher binds tighter.
    pub fn priority(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Pow(_, _) => 3,
            Expr::Neg(_) => 4,
            _ => 5,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_)
        )
    }

    /// Declared codomain of this node, joined over its children.
    /// Quotients, powers and the transcendental functions leave the
    /// integers even for integer operands; `abs` is real whatever sits
    /// underneath.
    pub fn codomain(&self, ctx: &Context) -> Codomain {
        match self {
            Expr::Number(n) => match n {
                Numeric::Integer(_) => Codomain::Integer,
                Numeric::Rational(_) | Numeric::Real(_) => Codomain::Real,
                Numeric::Complex(_) => Codomain::Complex,
            },
            Expr::Constant(_) => Codomain::Real,
            Expr::Variable(_) => Codomain::Any,
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) => {
                ctx.codomain(*a).join(ctx.codomain(*b))
            }
            Expr::Div(a, b) | Expr::Pow(a, b) | Expr::Log(a, b) => Codomain::Real
                .join(ctx.codomain(*a))
                .join(ctx.codomain(*b)),
            Expr::Neg(a) => ctx.codomain(*a),
            Expr::Func(f, a) => match f {
                UnaryFn::Abs => Codomain::Real,
                UnaryFn::Factorial => Codomain::Integer.join(ctx.codomain(*a)),
                _ => Codomain::Real.join(ctx.codomain(*a)),
            },
            Expr::Derivative { expr, .. }
            | Expr::Integral { expr, .. }
            | Expr::Limit { expr, .. } => ctx.codomain(*expr),
        }
    }
}

/// Arena counters; `interner_hits` measures how much sharing pays off.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStats {
    pub nodes_created: u64,
    pub interner_hits: u64,
}

/// Arena, interner and symbol table for one expression universe.
#[derive(Debug, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    interner: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
    stats: ContextStats,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node. Structurally equal nodes share one id.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interner.get(&expr) {
            self.stats.interner_hits += 1;
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.interner.insert(expr, id);
        self.stats.nodes_created += 1;
        id
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn stats(&self) -> ContextStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn sym(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    #[inline]
    pub fn sym_name(&self, id: SymbolId) -> &str {
        self.symbols.resolve(id)
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(Numeric::int(n)))
    }

    pub fn number(&mut self, value: Numeric) -> ExprId {
        self.add(Expr::Number(value))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Variable(sym))
    }

    pub fn var_id(&mut self, sym: SymbolId) -> ExprId {
        self.add(Expr::Variable(sym))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    pub fn func(&mut self, f: UnaryFn, arg: ExprId) -> ExprId {
        self.add(Expr::Func(f, arg))
    }

    pub fn limit(
        &mut self,
        expr: ExprId,
        var: SymbolId,
        destination: ExprId,
        side: LimitSide,
    ) -> ExprId {
        self.add(Expr::Limit {
            expr,
            var,
            destination,
            side,
        })
    }

    /// Declared codomain of the subtree at `id`.
    pub fn codomain(&self, id: ExprId) -> Codomain {
        self.get(id).codomain(self)
    }

    #[inline]
    pub fn as_number(&self, id: ExprId) -> Option<&Numeric> {
        match self.get(id) {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Children in evaluation order. A limit's bound variable is metadata,
    /// not a child; its destination counts because it lives in the
    /// enclosing scope.
    pub fn children(&self, id: ExprId) -> SmallVec<[ExprId; 2]> {
        match self.get(id) {
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => smallvec![],
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r)
            | Expr::Log(l, r) => smallvec![*l, *r],
            Expr::Neg(e) | Expr::Func(_, e) => smallvec![*e],
            Expr::Derivative { expr, .. } | Expr::Integral { expr, .. } => smallvec![*expr],
            Expr::Limit {
                expr, destination, ..
            } => smallvec![*expr, *destination],
        }
    }

    /// Rebuild `id` with the given children (in [`Context::children`]
    /// order). Interning makes this identity-preserving: unchanged children
    /// give back the original id.
    pub fn rebuild(&mut self, id: ExprId, children: &[ExprId]) -> ExprId {
        let rebuilt = match self.get(id).clone() {
            Expr::Number(_) | Expr::Constant(_) | Expr::Variable(_) => return id,
            Expr::Add(_, _) => Expr::Add(children[0], children[1]),
            Expr::Sub(_, _) => Expr::Sub(children[0], children[1]),
            Expr::Mul(_, _) => Expr::Mul(children[0], children[1]),
            Expr::Div(_, _) => Expr::Div(children[0], children[1]),
            Expr::Pow(_, _) => Expr::Pow(children[0], children[1]),
            Expr::Log(_, _) => Expr::Log(children[0], children[1]),
            Expr::Neg(_) => Expr::Neg(children[0]),
            Expr::Func(f, _) => Expr::Func(f, children[0]),
            Expr::Derivative { var, order, .. } => Expr::Derivative {
                expr: children[0],
                var,
                order,
            },
            Expr::Integral { var, order, .. } => Expr::Integral {
                expr: children[0],
                var,
                order,
            },
            Expr::Limit { var, side, .. } => Expr::Limit {
                expr: children[0],
                var,
                destination: children[1],
                side,
            },
        };
        self.add(rebuilt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_deduplicates_nodes() {
        let mut ctx = Context::new();
        let x1 = ctx.var("x");
        let x2 = ctx.var("x");
        assert_eq!(x1, x2);
        assert_eq!(ctx.stats().nodes_created, 1);
        assert_eq!(ctx.stats().interner_hits, 1);
    }

    #[test]
    fn test_structural_sharing_of_subtrees() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let a = ctx.add(Expr::Add(x, y));
        let b = ctx.add(Expr::Add(x, y));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rebuild_preserves_identity() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let sum = ctx.add(Expr::Add(x, y));
        let same = ctx.rebuild(sum, &[x, y]);
        assert_eq!(same, sum);
    }

    #[test]
    fn test_rebuild_with_new_child() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let z = ctx.var("z");
        let sum = ctx.add(Expr::Add(x, y));
        let swapped = ctx.rebuild(sum, &[x, z]);
        assert_ne!(swapped, sum);
        assert!(matches!(ctx.get(swapped), Expr::Add(l, r) if *l == x && *r == z));
        // the original node is untouched
        assert!(matches!(ctx.get(sum), Expr::Add(l, r) if *l == x && *r == y));
    }

    #[test]
    fn test_limit_children_skip_the_binder() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let xv = ctx.sym("x");
        let zero = ctx.num(0);
        let lim = ctx.limit(x, xv, zero, LimitSide::Both);
        let kids = ctx.children(lim);
        assert_eq!(kids.as_slice(), &[x, zero]);
    }

    #[test]
    fn test_codomain_lattice_classification() {
        let mut ctx = Context::new();
        let three = ctx.num(3);
        assert_eq!(ctx.codomain(three), Codomain::Integer);

        let half = ctx.number(Numeric::rational(1, 2).unwrap());
        let sum = ctx.add(Expr::Add(three, half));
        assert_eq!(ctx.codomain(sum), Codomain::Real);

        let quot = ctx.add(Expr::Div(three, three));
        assert_eq!(ctx.codomain(quot), Codomain::Real);

        let x = ctx.var("x");
        assert_eq!(ctx.codomain(x), Codomain::Any);
        let mixed = ctx.add(Expr::Mul(x, sum));
        assert_eq!(ctx.codomain(mixed), Codomain::Any);
    }

    #[test]
    fn test_codomain_of_abs_is_real_even_over_complex_operands() {
        let mut ctx = Context::new();
        let i = ctx.number(Numeric::imaginary_unit());
        assert_eq!(ctx.codomain(i), Codomain::Complex);
        let mag = ctx.func(UnaryFn::Abs, i);
        assert_eq!(ctx.codomain(mag), Codomain::Real);
    }

    #[test]
    fn test_equal_numbers_share_one_node() {
        let mut ctx = Context::new();
        let a = ctx.num(7);
        let b = ctx.number(Numeric::int(7));
        assert_eq!(a, b);
    }
}
