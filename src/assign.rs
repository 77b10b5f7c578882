//! Solving equalities for one of their symbols.

crate::prelude!();

use lin::LinExpr;
use term::Distributor;


/// Result of [`eq2assign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assign {
    /// The equality is trivially true.
    Trivial,
    /// No symbol can be isolated without leaving the type of the equality.
    Failed,
    /// The equality is equivalent to `sym = expr`, and `sym` does not appear in `expr`.
    Assign {
        /// Isolated symbol.
        sym: Symbol,
        /// Value of the symbol.
        expr: Term,
        /// True if `sym` is a next-state symbol.
        is_next: bool,
    },
}
impl Assign {
    /// True on [`Assign::Trivial`].
    pub fn is_trivial(&self) -> bool {
        *self == Self::Trivial
    }
    /// True on [`Assign::Failed`].
    pub fn is_failed(&self) -> bool {
        *self == Self::Failed
    }
    /// Equality corresponding to the assignment, `None` on [`Assign::Failed`].
    pub fn to_term(&self, env: &Env) -> Option<Term> {
        match self {
            Self::Trivial => Some(env.tru()),
            Self::Failed => None,
            Self::Assign { sym, expr, .. } => Some(env.eq(env.var(sym), expr.clone())),
        }
    }
}

/// Turns an equality into an assignment to one of its symbols.
///
/// Next-state symbols are preferred over current-state ones, and symbols with a `1` or `-1`
/// coefficient over others. On real equalities, among symbols of the same state, a negative
/// coefficient is preferred, then the one closest to zero. For integer equalities the symbol must
/// have a unit coefficient, otherwise the result is [`Assign::Failed`].
///
/// Panics if `equality` is neither `true` nor an arithmetic equality.
///
/// ```rust
/// # use hintsys::{prelude::*, term::{self, Distributor}, assign::{eq2assign, Assign}};
/// let env = Env::new();
/// let td = Distributor::new(&env);
/// let t = term::build!(env, (= (x @ 1: int) (+ (x: int) 1)));
/// match eq2assign(&td, &t) {
///     Assign::Assign { sym, expr, is_next } => {
///         assert_eq!(&sym.to_string(), "x'");
///         assert_eq!(&expr.to_string(), "(+ 1 x)");
///         assert!(is_next);
///     }
///     res => panic!("unexpected result {:?}", res),
/// }
/// ```
pub fn eq2assign(td: &Distributor, equality: &Term) -> Assign {
    let env = td.env();
    env.check(equality);
    if equality.is_true() {
        return Assign::Trivial;
    }
    assert!(
        equality.is_app_of(Op::Eq) && equality.args()[0].typ().is_arith(),
        "expected an arithmetic equality, found `{}`",
        equality,
    );
    let (lft, rgt) = (&equality.args()[0], &equality.args()[1]);
    let typ = lft.typ();
    let mut expr = LinExpr::of_term(td, &env.minus(lft.clone(), rgt.clone()));

    if expr.is_zero() {
        env.debug_check_equiv(equality, &env.tru(), || {
            format!("trivial equality `{}`", equality)
        });
        return Assign::Trivial;
    }

    let mut best: Option<(&Term, &Symbol, &Rat)> = None;
    let mut best_is_next = false;
    for (key, coef) in expr.coefs().iter() {
        let sym = match key.sym() {
            Some(sym) if !coef.is_zero() => sym,
            _ => continue,
        };
        let is_next = sym.is_next();
        if best_is_next && !is_next {
            continue;
        }
        if coef.abs().is_one() || (!best_is_next && is_next) {
            best = Some((key, sym, coef));
            best_is_next = is_next;
        }
        if typ == Typ::Real {
            let better = match best {
                None => true,
                Some((_, _, best_coef)) => {
                    (coef.is_negative() && best_coef.is_positive())
                        || (best_coef.is_negative() && coef > best_coef)
                        || (best_coef.is_positive() && coef < best_coef)
                }
            };
            if better {
                best = Some((key, sym, coef));
                best_is_next = is_next;
            }
        }
        if is_next && best.map(|(_, _, coef)| *coef == -Rat::one()).unwrap_or(false) {
            break;
        }
    }

    let (key, sym, coef) = match best {
        Some((key, sym, coef)) => (key.clone(), sym.clone(), coef.clone()),
        None => {
            trace!(%equality, "no symbol to isolate");
            return Assign::Failed;
        }
    };
    let mult = if coef.abs().is_one() {
        -coef
    } else {
        -coef.recip()
    };
    if typ == Typ::Int && !mult.is_integer() {
        trace!(%equality, %sym, "isolating the symbol requires a non-integer multiplier");
        return Assign::Failed;
    }

    let _ = expr.remove(&key);
    expr.times(env, [&LinExpr::of_cst(env, typ, &mult)]);
    let rhs = expr.to_term(env);
    debug_assert!(!rhs.free_vars().contains(&sym));
    env.debug_check_equiv(equality, &env.eq(key, rhs.clone()), || {
        format!("isolating `{}` in `{}`", sym, equality)
    });

    Assign::Assign {
        sym,
        expr: rhs,
        is_next: best_is_next,
    }
}
