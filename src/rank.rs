//! Ranking functions.

crate::prelude!();


/// A ranking function over current-state symbols.
///
/// The minimum of a ranking function is `0`, and it decreases by at least `delta` on each ranked
/// step. All the predicates it exposes are built once, at construction:
///
/// - `is_ranked`: `0 < expr`;
/// - `is_min`: `expr = 0`;
/// - `is_const`: `expr' = expr`;
/// - `is_decr`: `expr' <= expr - delta`.
///
/// ```rust
/// # use hintsys::{prelude::*, rank::RankFun};
/// let env = Env::new();
/// let x = env.declare("x", Typ::Int);
/// let symbs: Set<Symbol> = Some(x.clone()).into_iter().collect();
/// let rf = RankFun::new(&env, env.var(&x), None, symbs);
/// assert_eq!(&rf.is_ranked().to_string(), "(< 0 x)");
/// assert_eq!(&rf.is_decr().to_string(), "(<= x' (- x 1))");
/// ```
#[derive(Debug, Clone)]
pub struct RankFun {
    expr: Term,
    delta: Term,
    symbs: Set<Symbol>,
    is_ranked: Term,
    is_min: Term,
    is_const: Term,
    is_decr: Term,
}
impl RankFun {
    /// Constructor, `delta` defaults to `1`.
    ///
    /// Panics if
    ///
    /// - `expr` is not arithmetic or mentions symbols not in `symbs`;
    /// - `symbs` contains next-state symbols;
    /// - `delta` is not a positive constant of the same type as `expr`.
    pub fn new(env: &Env, expr: Term, delta: Option<Term>, symbs: Set<Symbol>) -> Self {
        env.check(&expr);
        let typ = expr.typ();
        assert!(typ.is_arith(), "illegal non-arithmetic ranking function `{}`", expr);
        let delta = delta.unwrap_or_else(|| env.num(typ, &Rat::one()));
        env.check(&delta);
        let delta_ok = delta.typ() == typ
            && delta
                .cst()
                .and_then(Cst::to_rat)
                .map(|val| val.is_positive())
                .unwrap_or(false);
        assert!(
            delta_ok,
            "illegal ranking function delta `{}`, expected a positive constant",
            delta
        );
        assert!(
            expr.free_vars().is_subset(&symbs) && symbs.iter().all(|sym| !sym.is_next()),
            "illegal ranking function `{}` over {:?}",
            expr,
            symbs,
        );

        let min = env.num(typ, &Rat::zero());
        let x_expr = env.to_next(&expr, &symbs);
        let is_ranked = env.lt(min.clone(), expr.clone());
        let is_min = env.eq(expr.clone(), min);
        let is_const = env.eq(x_expr.clone(), expr.clone());
        let is_decr = env.le(x_expr, env.minus(expr.clone(), delta.clone()));

        Self {
            expr,
            delta,
            symbs,
            is_ranked,
            is_min,
            is_const,
            is_decr,
        }
    }

    /// Ranking expression.
    pub fn expr(&self) -> &Term {
        &self.expr
    }
    /// Minimal decrease of a ranked step.
    pub fn delta(&self) -> &Term {
        &self.delta
    }
    /// Symbols the ranking function is over.
    pub fn symbs(&self) -> &Set<Symbol> {
        &self.symbs
    }

    /// `0 < expr`.
    pub fn is_ranked(&self) -> &Term {
        &self.is_ranked
    }
    /// `expr = 0`.
    pub fn is_min(&self) -> &Term {
        &self.is_min
    }
    /// `expr' = expr`.
    pub fn is_const(&self) -> &Term {
        &self.is_const
    }
    /// `expr' <= expr - delta`.
    pub fn is_decr(&self) -> &Term {
        &self.is_decr
    }

    /// Same ranking function in another environment.
    pub fn to_env(&self, env: &Env) -> Self {
        Self::new(
            env,
            env.import(&self.expr),
            Some(env.import(&self.delta)),
            self.symbs.iter().map(|sym| env.import_symbol(sym)).collect(),
        )
    }
}
impl fmt::Display for RankFun {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "rank({}, delta: {})", self.expr, self.delta)
    }
}
