//! Linear expressions: sums of monomials with rational coefficients.
//!
//! A [`LinExpr`] maps *monomials* to coefficients. A monomial is either the constant `1` of the
//! expression's type (the key of the constant part), or a product of *opaque* factors: symbols,
//! integer-to-real conversions and divisions. Building a [`LinExpr`] from a term goes through a
//! [`Distributor`] so that products are pushed to the leaves first.
//!
//! ```rust
//! # use hintsys::{prelude::*, term::{self, Distributor}, lin::LinExpr};
//! let env = Env::new();
//! let td = Distributor::new(&env);
//! let t = term::build!(env, (- (* 3 (+ (x: int) 1)) (+ (x: int) (y: int))));
//! let expr = LinExpr::of_term(&td, &t);
//! assert_eq!(&expr.to_string(), "3 + 2 * x + -1 * y");
//! assert_eq!(&expr.to_term(&env).to_string(), "(+ 3 (* x 2) (* y (- 1)))");
//! ```

crate::prelude!();

use term::Distributor;

#[cfg(test)]
pub mod test;

/// Ordered map from monomials to coefficients.
///
/// Lookups of absent keys yield zero. Additions never remove keys, even when the resulting
/// coefficient is zero: see [`Coefs::prune`]. Equality ignores zero coefficients.
#[derive(Debug, Clone, Default)]
pub struct Coefs {
    map: Map<Term, Rat>,
}
impl Coefs {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficient of a monomial, zero if absent.
    pub fn get(&self, key: &Term) -> Rat {
        self.map.get(key).cloned().unwrap_or_else(Rat::zero)
    }

    /// Adds `val` to the coefficient of `key`.
    pub fn add(&mut self, key: Term, val: &Rat) {
        let coef = self.map.entry(key).or_insert_with(Rat::zero);
        *coef += val;
    }

    /// Adds `val` to the coefficient of `key`, removes `key` if its coefficient becomes zero.
    pub fn add_pruning(&mut self, key: Term, val: &Rat) {
        let coef = self.map.entry(key.clone()).or_insert_with(Rat::zero);
        *coef += val;
        if coef.is_zero() {
            self.map.remove(&key);
        }
    }

    /// Removes a monomial.
    pub fn remove(&mut self, key: &Term) -> Option<Rat> {
        self.map.remove(key)
    }

    /// Removes all zero coefficients.
    pub fn prune(&mut self) {
        self.map.retain(|_, coef| !coef.is_zero())
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.map.clear()
    }

    /// Number of entries, including zero ones.
    pub fn len(&self) -> usize {
        self.map.len()
    }
    /// True if there are no entries at all.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterator over all entries, in monomial order.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, &Rat)> {
        self.map.iter()
    }
    /// Iterator over the entries with a non-zero coefficient, in monomial order.
    pub fn nonzero(&self) -> impl Iterator<Item = (&Term, &Rat)> {
        self.map.iter().filter(|(_, coef)| !coef.is_zero())
    }
}
impl PartialEq for Coefs {
    fn eq(&self, other: &Self) -> bool {
        self.nonzero().eq(other.nonzero())
    }
}
impl Eq for Coefs {}

/// Factors of a monomial.
fn factors_of(key: &Term) -> Vec<Term> {
    if key.is_app_of(Op::Mul) {
        key.args().to_vec()
    } else if key.is_one() {
        vec![]
    } else {
        vec![key.clone()]
    }
}

/// Monomial for some factors.
fn monomial(env: &Env, typ: Typ, mut factors: Vec<Term>) -> Term {
    if factors.is_empty() {
        return env.num(typ, &Rat::one());
    }
    factors.sort();
    env.times(factors)
}

/// Value of a ground arithmetic term.
fn ground_value(env: &Env, term: &Term) -> Rat {
    match env.simplify_cst(term).to_rat() {
        Some(val) => val,
        None => panic!("expected arithmetic constant, found `{}`", term),
    }
}

/// A linear expression, see the [module-level documentation](self).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinExpr {
    typ: Typ,
    coefs: Coefs,
}
impl LinExpr {
    /// The zero expression of some type.
    pub fn new(typ: Typ) -> Self {
        assert!(typ.is_arith(), "linear expressions cannot have type `{}`", typ);
        Self {
            typ,
            coefs: Coefs::new(),
        }
    }

    /// A constant expression.
    pub fn of_cst(env: &Env, typ: Typ, val: &Rat) -> Self {
        let mut res = Self::new(typ);
        res.plus_cst(env, val);
        res
    }

    /// Normalizes a term.
    pub fn of_term(td: &Distributor, term: &Term) -> Self {
        Self::of_term_as(td, term.typ(), term)
    }

    /// Normalizes a term as an expression of type `typ`.
    ///
    /// If `typ` is real and `term` is an integer term, the monomials are converted to reals.
    pub fn of_term_as(td: &Distributor, typ: Typ, term: &Term) -> Self {
        let env = td.env();
        let mut res = Self::new(typ);
        res.plus_term(td, term);
        env.debug_check_equiv(&env.to_real_if(typ, term), &res.to_term(env), || {
            format!("normalizing `{}`", term)
        });
        res
    }

    /// Type of the expression.
    pub fn typ(&self) -> Typ {
        self.typ
    }
    /// Coefficient map.
    pub fn coefs(&self) -> &Coefs {
        &self.coefs
    }
    /// Coefficient of a monomial.
    pub fn coef(&self, key: &Term) -> Rat {
        self.coefs.get(key)
    }
    /// Removes a monomial, yields its coefficient.
    pub fn remove(&mut self, key: &Term) -> Rat {
        self.coefs.remove(key).unwrap_or_else(Rat::zero)
    }
    /// Removes all monomials with a zero coefficient.
    pub fn prune(&mut self) {
        self.coefs.prune()
    }

    /// True if all coefficients are zero.
    pub fn is_zero(&self) -> bool {
        self.coefs.nonzero().next().is_none()
    }

    /// True if the expression is the constant one.
    pub fn is_one(&self) -> bool {
        let mut nonzero = self.coefs.nonzero();
        match (nonzero.next(), nonzero.next()) {
            (Some((key, coef)), None) => key.is_one() && coef.is_one(),
            _ => false,
        }
    }

    /// Adds a constant.
    ///
    /// Panics if the expression has type `int` and `val` is not an integer.
    pub fn plus_cst(&mut self, env: &Env, val: &Rat) {
        assert!(
            self.typ == Typ::Real || val.is_integer(),
            "cannot add `{}` to an integer expression",
            val,
        );
        self.coefs.add(env.num(self.typ, &Rat::one()), val)
    }

    /// Adds a term.
    ///
    /// The term must have the same type as the expression, or be an integer term if the
    /// expression is real. Panics if the term is not linear arithmetic over opaque factors.
    pub fn plus_term(&mut self, td: &Distributor, term: &Term) {
        let env = td.env();
        assert!(
            self.typ == Typ::Real || term.typ() == self.typ,
            "cannot add `{}` of type `{}` to an expression of type `{}`",
            term,
            term.typ(),
            self.typ,
        );
        let lift = self.typ == Typ::Real && term.typ() == Typ::Int;
        let one = env.num(self.typ, &Rat::one());
        let mut stack = vec![td.distribute(term)];

        while let Some(curr) = stack.pop() {
            if curr.is_ground() {
                self.coefs.add_pruning(one.clone(), &ground_value(env, &curr));
                continue;
            }
            match curr.node() {
                Node::Var(_) | Node::App { op: Op::ToReal, .. } | Node::App { op: Op::Div, .. } => {
                    let key = if lift && curr.typ() == Typ::Int {
                        env.to_real(curr.clone())
                    } else {
                        curr.clone()
                    };
                    self.coefs.add(key, &Rat::one())
                }
                Node::App { op: Op::Add, args } => stack.extend(args.iter().cloned()),
                Node::App { op: Op::Sub, args } => {
                    stack.push(args[0].clone());
                    let minus_one = env.num(args[1].typ(), &-Rat::one());
                    stack.push(td.distribute(&env.times(vec![minus_one, args[1].clone()])))
                }
                Node::App { op: Op::Mul, args } => {
                    let (cst, factors) = Self::split_product(env, args);
                    let mut key = monomial(env, curr.typ(), factors);
                    if lift && !key.is_cst() {
                        key = env.to_real(key)
                    } else if key.is_cst() {
                        key = one.clone()
                    }
                    self.coefs.add_pruning(key, &cst)
                }
                _ => panic!("unexpected term `{}` in linear expression", curr),
            }
        }
    }

    /// Splits the factors of a distributed product into a constant and opaque factors.
    fn split_product(env: &Env, args: &[Term]) -> (Rat, Vec<Term>) {
        let mut todo = args.to_vec();
        let mut cst = Rat::one();
        let mut factors = vec![];
        while let Some(factor) = todo.pop() {
            match factor.node() {
                Node::App { op: Op::Mul, args } => todo.extend(args.iter().cloned()),
                Node::App {
                    op: Op::Add | Op::Sub,
                    ..
                } => panic!("illegal factor `{}`, products are not distributed", factor),
                _ if factor.is_ground() => cst *= ground_value(env, &factor),
                Node::Var(_)
                | Node::App {
                    op: Op::ToReal | Op::Div,
                    ..
                } => factors.push(factor.clone()),
                _ => {
                    warn!(%factor, "unexpected factor, treating it as opaque");
                    factors.push(factor.clone())
                }
            }
        }
        (cst, factors)
    }

    /// Adds some expressions.
    pub fn plus<'a>(&mut self, others: impl IntoIterator<Item = &'a LinExpr>) -> &mut Self {
        for other in others {
            assert_eq!(self.typ, other.typ, "cannot add expressions of different types");
            for (key, coef) in other.coefs.iter() {
                self.coefs.add(key.clone(), coef)
            }
        }
        self
    }

    /// Multiplies by some expressions.
    ///
    /// Integer expressions are converted to reals when multiplied into a real expression.
    pub fn times<'a>(
        &mut self,
        env: &Env,
        others: impl IntoIterator<Item = &'a LinExpr>,
    ) -> &mut Self {
        if self.is_zero() {
            return self;
        }
        for other in others {
            assert!(
                self.typ == Typ::Real || other.typ == self.typ,
                "cannot multiply `{}` by real expression `{}`",
                self,
                other,
            );
            if other.is_zero() {
                self.coefs.clear();
                return self;
            }
            if other.is_one() {
                continue;
            }
            let lifted;
            let other = if other.typ == Typ::Int && self.typ == Typ::Real {
                lifted = other.to_real(env);
                &lifted
            } else {
                other
            };
            let lhs = std::mem::take(&mut self.coefs);
            for (lkey, lcoef) in lhs.iter() {
                for (rkey, rcoef) in other.coefs.iter() {
                    let mut factors = factors_of(lkey);
                    factors.extend(factors_of(rkey));
                    let key = monomial(env, self.typ, factors);
                    self.coefs.add(key, &(lcoef * rcoef))
                }
            }
        }
        self
    }

    /// Multiplies by a term of the same type.
    pub fn times_term(&mut self, td: &Distributor, term: &Term) {
        assert_eq!(
            term.typ(),
            self.typ,
            "cannot multiply `{}` by `{}` of a different type",
            self,
            term
        );
        if !term.is_one() {
            let other = Self::of_term(td, term);
            self.times(td.env(), [&other]);
        }
    }

    /// Multiplies all coefficients by `-1`.
    pub fn negate(&mut self) {
        for coef in self.coefs.map.values_mut() {
            *coef = -&*coef
        }
    }

    /// Converts an integer expression to a real one.
    pub fn to_real(&self, env: &Env) -> Self {
        assert_eq!(self.typ, Typ::Int, "`{}` is already a real expression", self);
        let mut res = Self::new(Typ::Real);
        for (key, coef) in self.coefs.nonzero() {
            res.coefs.add(env.to_real(key.clone()), coef)
        }
        res
    }

    fn scaled(&self, env: &Env, key: &Term, coef: &Rat) -> Term {
        if coef.is_one() {
            key.clone()
        } else if key.is_one() {
            env.num(self.typ, coef)
        } else {
            let mut factors = if key.is_app_of(Op::Mul) {
                key.args().to_vec()
            } else {
                vec![key.clone()]
            };
            factors.push(env.num(self.typ, coef));
            env.times(factors)
        }
    }

    /// Term representation, in monomial order.
    pub fn to_term(&self, env: &Env) -> Term {
        let summands: Vec<Term> = self
            .coefs
            .nonzero()
            .map(|(key, coef)| self.scaled(env, key, coef))
            .collect();
        if summands.is_empty() {
            env.num(self.typ, &Rat::zero())
        } else {
            env.plus(summands)
        }
    }
}
impl fmt::Display for LinExpr {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut empty = true;
        for (key, coef) in self.coefs.nonzero() {
            if !empty {
                write!(fmt, " + ")?
            }
            empty = false;
            if key.is_one() {
                write!(fmt, "{}", coef)?
            } else if coef.is_one() {
                write!(fmt, "{}", key)?
            } else {
                write!(fmt, "{} * {}", coef, key)?
            }
        }
        if empty {
            write!(fmt, "0")?
        }
        Ok(())
    }
}

impl Env {
    /// Converts an integer term to real if `typ` is real.
    pub fn to_real_if(&self, typ: Typ, term: &Term) -> Term {
        if typ == Typ::Real {
            self.to_real(term.clone())
        } else {
            term.clone()
        }
    }
}
