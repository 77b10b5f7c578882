//! Pushes products to the leaves of arithmetic terms.

crate::prelude!();

use std::{cell::RefCell, collections::HashMap};

/// Distributes products over sums and differences.
///
/// After distribution
///
/// - no argument of a product is a sum or a difference, and nested products are flattened;
/// - integer-to-real conversions only apply to symbols and integer divisions.
///
/// Divisions are opaque: their arguments are distributed but the division itself is left as is.
/// Results are memoized, a distributor is meant to be reused.
///
/// ```rust
/// # use hintsys::term::{self, Env, Distributor};
/// let env = Env::new();
/// let td = Distributor::new(&env);
/// let t = term::build!(env, (* 2 (- (x: int) (y: int))));
/// assert_eq!(&td.distribute(&t).to_string(), "(+ (* 2 x) (* 2 (- 1) y))");
/// ```
pub struct Distributor<'env> {
    env: &'env Env,
    memo: RefCell<HashMap<Term, Term>>,
}
impl<'env> Distributor<'env> {
    /// Constructor.
    pub fn new(env: &'env Env) -> Self {
        Self {
            env,
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Environment of the distributor.
    pub fn env(&self) -> &'env Env {
        self.env
    }

    /// Distributes products in a term.
    pub fn distribute(&self, term: &Term) -> Term {
        self.env.check(term);
        if let Some(res) = self.memo.borrow().get(term) {
            return res.clone();
        }
        let res = match term.node() {
            Node::Cst(_) | Node::Var(_) => term.clone(),
            Node::App { op, args } => {
                let args: Vec<Term> = args.iter().map(|arg| self.distribute(arg)).collect();
                match op {
                    Op::Mul => self.product(args),
                    Op::ToReal => self.lift(&args[0]),
                    _ => self.env.app(*op, args),
                }
            }
        };
        self.memo.borrow_mut().insert(term.clone(), res.clone());
        res
    }

    /// Signed summands of a distributed term.
    fn summands(&self, term: &Term, out: &mut Vec<Term>) {
        match term.node() {
            Node::App { op: Op::Add, args } => {
                for arg in args {
                    self.summands(arg, out)
                }
            }
            Node::App { op: Op::Sub, args } => {
                self.summands(&args[0], out);
                let mut neg = vec![];
                self.summands(&args[1], &mut neg);
                out.extend(neg.into_iter().map(|summand| self.negate(summand)))
            }
            _ => out.push(term.clone()),
        }
    }

    fn negate(&self, term: Term) -> Term {
        let minus_one = self.env.num(term.typ(), &-Rat::one());
        let mut factors = vec![minus_one];
        push_factor(&mut factors, &term);
        self.env.times(factors)
    }

    /// Product of distributed terms.
    fn product(&self, args: Vec<Term>) -> Term {
        let mut products: Vec<Vec<Term>> = vec![vec![]];
        for arg in &args {
            let mut summands = vec![];
            self.summands(arg, &mut summands);
            products = products
                .iter()
                .flat_map(|factors| {
                    summands.iter().map(move |summand| {
                        let mut factors = factors.clone();
                        push_factor(&mut factors, summand);
                        factors
                    })
                })
                .collect();
        }
        let products: Vec<Term> = products
            .into_iter()
            .map(|factors| self.env.times(factors))
            .collect();
        self.env.plus(products)
    }

    /// Integer-to-real conversion of a distributed term.
    fn lift(&self, term: &Term) -> Term {
        let env = self.env;
        match term.node() {
            Node::App { op: Op::Add, args } => env.plus(args.iter().map(|arg| self.lift(arg))),
            Node::App { op: Op::Sub, args } => env.minus(self.lift(&args[0]), self.lift(&args[1])),
            Node::App { op: Op::Mul, args } => env.times(args.iter().map(|arg| self.lift(arg))),
            _ => env.to_real(term.clone()),
        }
    }
}

fn push_factor(factors: &mut Vec<Term>, factor: &Term) {
    if factor.is_app_of(Op::Mul) {
        factors.extend(factor.args().iter().cloned())
    } else {
        factors.push(factor.clone())
    }
}
