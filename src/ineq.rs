//! Normalized equalities and inequalities.
//!
//! An [`Ineq`] represents `sum(coef_i * m_i) OP k` where
//!
//! - `OP` is `=`, `<=` or `<` (see [`IneqKind`]),
//! - the `m_i` are monomials over non-parameter symbols,
//! - the `coef_i` are [linear expressions](LinExpr) over the parameters, and
//! - `k` is a linear expression over the parameters.
//!
//! Everything that only mentions parameters, constants included, goes to the right-hand side.
//! For equalities the sign convention minimizes the number of negative coefficients on the
//! left-hand side.
//!
//! ```rust
//! # use hintsys::{prelude::*, term::{self, Distributor}, ineq::Ineq};
//! let env = Env::new();
//! let td = Distributor::new(&env);
//! let t = term::build!(env, (<= (+ (x: int) 3) (* 2 (y: int))));
//! let ineq = Ineq::new(&td, &t, None);
//! assert_eq!(&ineq.to_string(), "1 * x + -2 * y <= -3");
//! assert_eq!(&ineq.to_term(&env).to_string(), "(<= (+ x (* y (- 2))) (- 3))");
//! ```

crate::prelude!();

use lin::LinExpr;
use term::Distributor;


/// Kinds of inequalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IneqKind {
    /// Equality.
    Eq,
    /// Less than or equal.
    Le,
    /// Strictly less than.
    Lt,
}
impl IneqKind {
    /// Kind corresponding to an operator, if any.
    pub fn of_op(op: Op) -> Option<Self> {
        match op {
            Op::Eq => Some(Self::Eq),
            Op::Le => Some(Self::Le),
            Op::Lt => Some(Self::Lt),
            _ => None,
        }
    }
    /// Operator corresponding to a kind.
    pub fn op(self) -> Op {
        match self {
            Self::Eq => Op::Eq,
            Self::Le => Op::Le,
            Self::Lt => Op::Lt,
        }
    }
}
impl fmt::Display for IneqKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.op().fmt(fmt)
    }
}

/// A normalized (in)equality, see the [module-level documentation](self).
#[derive(Debug, Clone)]
pub struct Ineq {
    params: Set<Symbol>,
    kind: IneqKind,
    lhs: Map<Term, LinExpr>,
    rhs: LinExpr,
}
impl Ineq {
    /// Normalizes an `=`, `<=` or `<` over arithmetic arguments.
    ///
    /// Panics on anything else.
    pub fn new(
        td: &Distributor,
        term: &Term,
        params: impl IntoIterator<Item = Symbol>,
    ) -> Self {
        let kind = match term.op().and_then(IneqKind::of_op) {
            Some(kind) if term.args()[0].typ().is_arith() => kind,
            _ => panic!("expected an arithmetic (in)equality, found `{}`", term),
        };
        let params: Set<Symbol> = params.into_iter().collect();
        let (lhs, rhs) = Self::parse(td, term, &params, kind);
        let res = Self {
            params,
            kind,
            lhs,
            rhs,
        };
        let env = td.env();
        env.debug_check_equiv(term, &res.to_term(env), || {
            format!("normalizing inequality `{}`", term)
        });
        res
    }

    fn parse(
        td: &Distributor,
        term: &Term,
        params: &Set<Symbol>,
        kind: IneqKind,
    ) -> (Map<Term, LinExpr>, LinExpr) {
        let env = td.env();
        let (lft, rgt) = (&term.args()[0], &term.args()[1]);
        let typ = lft.typ();
        let one = Rat::one();
        let minus_one = env.num(typ, &-Rat::one());

        let mut lhs: Map<Term, LinExpr> = Map::new();
        let mut rhs = LinExpr::new(typ);
        let mut stack = vec![
            td.distribute(lft),
            td.distribute(&env.times(vec![minus_one.clone(), rgt.clone()])),
        ];

        while let Some(curr) = stack.pop() {
            if curr.free_vars().is_subset(params) {
                rhs.plus_term(td, &curr);
                continue;
            }
            match curr.node() {
                Node::Var(_) | Node::App { op: Op::Div, .. } | Node::App { op: Op::ToReal, .. } => {
                    lhs.entry(curr.clone())
                        .or_insert_with(|| LinExpr::new(typ))
                        .plus_cst(env, &one)
                }
                Node::App { op: Op::Add, args } => stack.extend(args.iter().cloned()),
                Node::App { op: Op::Sub, args } => {
                    stack.push(args[0].clone());
                    stack.push(td.distribute(&env.times(vec![minus_one.clone(), args[1].clone()])))
                }
                Node::App { op: Op::Mul, args } => {
                    let mut todo = args.to_vec();
                    let mut cst = Rat::one();
                    let mut symbs = vec![];
                    let mut coef = vec![];
                    while let Some(factor) = todo.pop() {
                        let is_param = match factor.node() {
                            Node::Var(sym) => params.contains(sym),
                            Node::App {
                                op: Op::ToReal,
                                args,
                            } => args[0].sym().map(|sym| params.contains(sym)).unwrap_or(false),
                            _ => false,
                        };
                        match factor.node() {
                            Node::App { op: Op::Mul, args } => todo.extend(args.iter().cloned()),
                            Node::Cst(val) => match val.to_rat() {
                                Some(val) => cst *= val,
                                None => panic!("illegal factor `{}`", factor),
                            },
                            _ if is_param => coef.push(factor.clone()),
                            Node::Var(_)
                            | Node::App {
                                op: Op::Div | Op::ToReal,
                                ..
                            } => symbs.push(factor.clone()),
                            _ => panic!("unexpected factor `{}` in `{}`", factor, term),
                        }
                    }
                    assert!(!symbs.is_empty(), "non-parametric monomial without symbols");
                    symbs.sort();
                    coef.insert(0, env.num(typ, &cst));
                    lhs.entry(env.times(symbs))
                        .or_insert_with(|| LinExpr::new(typ))
                        .plus_term(td, &env.times(coef))
                }
                _ => panic!("unexpected term `{}` in `{}`", curr, term),
            }
        }

        if kind == IneqKind::Eq {
            let (mut total, mut negative) = (0, 0);
            for (_, coef) in lhs.values().flat_map(|expr| expr.coefs().nonzero()) {
                total += 1;
                if coef.is_negative() {
                    negative += 1
                }
            }
            if 2 * negative > total {
                for expr in lhs.values_mut() {
                    expr.negate()
                }
                return (lhs, rhs);
            }
        }
        rhs.negate();
        (lhs, rhs)
    }

    /// Converts an integer (in)equality to reals.
    ///
    /// Strict integer inequalities `lhs < k` become `lhs <= k - 1` first. Does nothing on real
    /// (in)equalities.
    pub fn to_real(&mut self, env: &Env) {
        if self.rhs.typ() != Typ::Real {
            if self.kind == IneqKind::Lt {
                self.rhs.plus_cst(env, &-Rat::one());
                self.kind = IneqKind::Le;
            }
            self.rhs = self.rhs.to_real(env);
            self.lhs = std::mem::take(&mut self.lhs)
                .into_iter()
                .map(|(key, coef)| {
                    assert_eq!(key.typ(), Typ::Int, "ill-typed monomial `{}`", key);
                    (env.to_real(key), coef.to_real(env))
                })
                .collect();
        }
        debug_assert!(self
            .lhs
            .iter()
            .all(|(key, coef)| key.typ() == Typ::Real && coef.typ() == Typ::Real));
    }

    /// Term representation.
    pub fn to_term(&self, env: &Env) -> Term {
        let mut summands: Vec<Term> = self
            .lhs
            .iter()
            .filter(|(_, coef)| !coef.is_zero())
            .map(|(key, coef)| {
                if coef.is_one() {
                    key.clone()
                } else {
                    env.times(vec![key.clone(), coef.to_term(env)])
                }
            })
            .collect();
        summands.sort();
        let lhs = if summands.is_empty() {
            env.num(self.rhs.typ(), &Rat::zero())
        } else {
            env.plus(summands)
        };
        env.app(self.kind.op(), vec![lhs, self.rhs.to_term(env)])
    }

    /// Left-hand side: maps monomials to their coefficient.
    pub fn lhs(&self) -> &Map<Term, LinExpr> {
        &self.lhs
    }
    /// Right-hand side.
    pub fn rhs(&self) -> &LinExpr {
        &self.rhs
    }
    /// Kind of the (in)equality.
    pub fn kind(&self) -> IneqKind {
        self.kind
    }
    /// Parameters.
    pub fn params(&self) -> &Set<Symbol> {
        &self.params
    }
    /// True if `self` is an equality.
    pub fn is_eq(&self) -> bool {
        self.kind == IneqKind::Eq
    }
    /// True if `self` is a non-strict inequality.
    pub fn is_le(&self) -> bool {
        self.kind == IneqKind::Le
    }
    /// True if `self` is a strict inequality.
    pub fn is_lt(&self) -> bool {
        self.kind == IneqKind::Lt
    }
}
impl PartialEq for Ineq {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.rhs == other.rhs && self.lhs == other.lhs
    }
}
impl fmt::Display for Ineq {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.lhs.is_empty() {
            write!(fmt, "0")?
        }
        for (idx, (key, coef)) in self.lhs.iter().enumerate() {
            if idx > 0 {
                write!(fmt, " + ")?
            }
            write!(fmt, "{} * {}", coef, key)?
        }
        write!(fmt, " {} {}", self.kind, self.rhs)
    }
}
