//! Tests over linear expressions.

use super::*;

use proptest::prelude::*;

use crate::term::{self, eval::enumerate, Model};

/// Small arithmetic terms, built in some environment by [`Arith::to_term`].
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum Arith {
    Cst(i64),
    Var(usize),
    Add(Vec<Arith>),
    Sub(Box<Arith>, Box<Arith>),
    Mul(Box<Arith>, Box<Arith>),
    Scale(i64, Box<Arith>),
    /// Division by a non-zero constant.
    Div(Box<Arith>, i64),
}
impl Arith {
    /// Identifiers of the symbols.
    pub const VARS: [&'static str; 3] = ["x", "y", "z"];

    /// Term of type `typ`, symbols are declared on the fly.
    pub fn to_term(&self, env: &Env, typ: Typ) -> Term {
        let num = |n: i64| env.num(typ, &Rat::from(Int::from(n)));
        match self {
            Self::Cst(n) => num(*n),
            Self::Var(idx) => env.symbol(Self::VARS[*idx], typ),
            Self::Add(kids) => env.plus(kids.iter().map(|kid| kid.to_term(env, typ))),
            Self::Sub(lft, rgt) => env.minus(lft.to_term(env, typ), rgt.to_term(env, typ)),
            Self::Mul(lft, rgt) => {
                env.times(vec![lft.to_term(env, typ), rgt.to_term(env, typ)])
            }
            Self::Scale(n, kid) => env.times(vec![num(*n), kid.to_term(env, typ)]),
            Self::Div(kid, n) => env.div(kid.to_term(env, typ), num(*n)),
        }
    }
}

/// Strategy for [`Arith`].
pub fn arb_arith() -> impl Strategy<Value = Arith> {
    let leaf = prop_oneof![
        (-4i64..=4).prop_map(Arith::Cst),
        (0..Arith::VARS.len()).prop_map(Arith::Var),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..=3).prop_map(Arith::Add),
            (inner.clone(), inner.clone())
                .prop_map(|(lft, rgt)| Arith::Sub(Box::new(lft), Box::new(rgt))),
            (inner.clone(), inner.clone())
                .prop_map(|(lft, rgt)| Arith::Mul(Box::new(lft), Box::new(rgt))),
            (-3i64..=3, inner.clone()).prop_map(|(n, kid)| Arith::Scale(n, Box::new(kid))),
            (inner, 1i64..=3).prop_map(|(kid, n)| Arith::Div(Box::new(kid), n)),
        ]
    })
}

/// Models where arithmetic symbols range over `[-3, 3]`.
pub fn models(terms: &[&Term]) -> Vec<Model> {
    let symbs: Set<Symbol> = terms.iter().flat_map(|term| term.free_vars()).collect();
    let domain: Vec<Rat> = (-3..=3).map(|n| Rat::from(Int::from(n))).collect();
    enumerate(&symbs, &domain)
}

/// Index of the first model on which `lft` and `rgt` disagree.
pub fn disagree(lft: &Term, rgt: &Term) -> Option<usize> {
    models(&[lft, rgt]).iter().position(|model| {
        let (l, r) = (lft.eval(model), rgt.eval(model));
        l.as_ref().and_then(Cst::to_rat) != r.as_ref().and_then(Cst::to_rat)
            || l.as_ref().and_then(Cst::to_bool) != r.as_ref().and_then(Cst::to_bool)
    })
}

fn one(env: &Env) -> Term {
    env.int(1)
}

#[test]
fn coefs_keep_zeros() {
    let env = Env::new();
    let x = env.symbol("x", Typ::Int);
    let mut coefs = Coefs::new();
    assert_eq!(coefs.get(&x), Rat::zero());

    coefs.add(x.clone(), &Rat::from(Int::from(2)));
    coefs.add(x.clone(), &Rat::from(Int::from(-2)));
    assert_eq!(coefs.len(), 1);
    assert_eq!(coefs.get(&x), Rat::zero());
    assert_eq!(coefs, Coefs::new());
    assert_eq!(coefs.nonzero().count(), 0);

    coefs.prune();
    assert!(coefs.is_empty());

    coefs.add_pruning(x.clone(), &Rat::one());
    coefs.add_pruning(x.clone(), &-Rat::one());
    assert!(coefs.is_empty());
}

#[test]
fn constant_part() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let t = term::build!(env, (+ 3 (- 4 (* 2 5))));
    let expr = LinExpr::of_term(&td, &t);
    assert_eq!(expr.coef(&one(&env)), Rat::from(Int::from(-3)));
    assert_eq!(&expr.to_string(), "-3");
    assert_eq!(&expr.to_term(&env).to_string(), "(- 3)");

    let zero = LinExpr::of_term(&td, &term::build!(env, (- (x: int) (x: int))));
    assert!(zero.is_zero());
    assert_eq!(&zero.to_string(), "0");
    assert_eq!(&zero.to_term(&env).to_string(), "0");
}

#[test]
fn monomials_are_sorted() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let t = term::build!(env, (+ (* (y: int) 3 (x: int)) (* (x: int) (y: int))));
    let expr = LinExpr::of_term(&td, &t);
    let key = term::build!(env, (* (x: int) (y: int)));
    assert_eq!(expr.coef(&key), Rat::from(Int::from(4)));
    assert_eq!(&expr.to_string(), "4 * (* x y)");
    assert_eq!(&expr.to_term(&env).to_string(), "(* x y 4)");
}

#[test]
fn divisions_are_opaque() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let t = term::build!(env, (+ (/ (x: int) 2) (* 3 (/ (x: int) 2)) (x: int)));
    let expr = LinExpr::of_term(&td, &t);
    let key = term::build!(env, (/ (x: int) 2));
    assert_eq!(expr.coef(&key), Rat::from(Int::from(4)));
    assert_eq!(expr.coef(&env.symbol("x", Typ::Int)), Rat::one());
    assert_eq!(expr.coefs().nonzero().count(), 2);
}

#[test]
fn times() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let lft = LinExpr::of_term(&td, &term::build!(env, (+ (x: int) 1)));
    let rgt = LinExpr::of_term(&td, &term::build!(env, (- (y: int) 2)));

    let mut prod = lft.clone();
    prod.times(&env, [&rgt]);
    assert_eq!(&prod.to_string(), "-2 + -2 * x + y + (* x y)");
    let key = term::build!(env, (* (x: int) (y: int)));
    assert_eq!(prod.coef(&key), Rat::one());

    let mut prod = lft.clone();
    prod.times(&env, [&LinExpr::new(Typ::Int)]);
    assert!(prod.is_zero());

    let mut prod = lft.clone();
    prod.times(&env, [&LinExpr::of_cst(&env, Typ::Int, &Rat::one())]);
    assert_eq!(prod, lft);

    let mut prod = lft.clone();
    prod.times_term(&td, &term::build!(env, (- 0 1)));
    let mut neg = lft.clone();
    neg.negate();
    assert_eq!(prod, neg);
    assert_eq!(&neg.to_string(), "-1 + -1 * x");
}

#[test]
fn plus() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let lft = LinExpr::of_term(&td, &term::build!(env, (+ (x: int) 1)));
    let rgt = LinExpr::of_term(&td, &term::build!(env, (- 2 (x: int))));
    let mut sum = lft;
    sum.plus([&rgt]);
    assert_eq!(&sum.to_string(), "3");
    // zero entries survive until pruned
    assert_eq!(sum.coefs().len(), 2);
    sum.prune();
    assert_eq!(sum.coefs().len(), 1);
}

#[test]
fn to_real() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let t = term::build!(env, (+ (x: int) 1));
    let expr = LinExpr::of_term(&td, &t).to_real(&env);
    assert_eq!(expr.typ(), Typ::Real);
    assert_eq!(&expr.to_string(), "1 + (to_real x)");
    assert_eq!(&expr.to_term(&env).to_string(), "(+ 1.0 (to_real x))");

    let lifted = LinExpr::of_term_as(&td, Typ::Real, &t);
    assert_eq!(lifted, expr);
}

#[test]
#[should_panic(expected = "division by zero in `(/ 1 0)`")]
fn ground_division_by_zero() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let _ = LinExpr::of_term(&td, &term::build!(env, (+ (x: int) (/ 1 0))));
}

#[test]
#[should_panic]
fn not_arithmetic() {
    let _ = LinExpr::new(Typ::Bool);
}

#[test]
fn with_sampled_equiv() {
    let env = Env::new();
    env.set_equiv_hook(Rc::new(term::SampledEquiv::default()));
    let td = Distributor::new(&env);
    let t = term::build!(env, (* (- (x: int) (y: int)) (+ (x: int) (y: int))));
    let expr = LinExpr::of_term(&td, &t);
    assert_eq!(&expr.to_string(), "(* x x) + -1 * (* y y)");
}

proptest! {
    #[test]
    fn int_normalization(arith in arb_arith()) {
        let env = Env::new();
        let td = Distributor::new(&env);
        let term = arith.to_term(&env, Typ::Int);
        let expr = LinExpr::of_term(&td, &term);
        prop_assert_eq!(disagree(&term, &expr.to_term(&env)), None);
    }

    #[test]
    fn real_normalization(arith in arb_arith()) {
        let env = Env::new();
        let td = Distributor::new(&env);
        let term = arith.to_term(&env, Typ::Real);
        let expr = LinExpr::of_term(&td, &term);
        prop_assert_eq!(disagree(&term, &expr.to_term(&env)), None);
    }

    #[test]
    fn lifted_normalization(arith in arb_arith()) {
        let env = Env::new();
        let td = Distributor::new(&env);
        let term = arith.to_term(&env, Typ::Int);
        let expr = LinExpr::of_term_as(&td, Typ::Real, &term);
        prop_assert_eq!(expr.typ(), Typ::Real);
        prop_assert_eq!(disagree(&env.to_real(term), &expr.to_term(&env)), None);
    }
}
