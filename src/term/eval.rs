//! Evaluation of terms under a model, and a sampling-based equivalence check.

crate::prelude!();

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::term::EquivHook;

/// A model, maps symbols to constants.
pub type Model = Map<Symbol, Cst>;

impl Term {
    /// Evaluates a term under a model.
    ///
    /// Returns `None` if the term mentions a symbol the model does not assign, or if a division by
    /// zero occurs. Integer division follows SMT-LIB: the remainder is always non-negative.
    ///
    /// ```rust
    /// # use hintsys::{prelude::*, term::{self, Model}};
    /// let env = Env::new();
    /// let t = term::build!(env, (+ (/ (x: int) 2) 1));
    /// let mut model = Model::new();
    /// assert_eq!(t.eval(&model), None);
    /// model.insert(env.declare("x", Typ::Int), Cst::int(-7));
    /// assert_eq!(t.eval(&model), Some(Cst::int(-3)));
    /// ```
    pub fn eval(&self, model: &Model) -> Option<Cst> {
        match self.node() {
            Node::Cst(cst) => Some(cst.clone()),
            Node::Var(sym) => model.get(sym).cloned(),
            Node::App { op, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.eval(model))
                    .collect::<Option<Vec<_>>>()?;
                eval_app(*op, self.typ(), &args)
            }
        }
    }
}

fn bools(args: &[Cst]) -> Option<Vec<bool>> {
    args.iter().map(Cst::to_bool).collect()
}
fn rats(args: &[Cst]) -> Option<Vec<Rat>> {
    args.iter().map(Cst::to_rat).collect()
}

/// SMT-LIB integer division.
fn int_div(num: &Int, den: &Int) -> Int {
    if den.is_positive() {
        num.div_floor(den)
    } else {
        -num.div_floor(&-den)
    }
}

fn eval_app(op: Op, typ: Typ, args: &[Cst]) -> Option<Cst> {
    let res = match op {
        Op::And => Cst::B(bools(args)?.into_iter().all(|b| b)),
        Op::Or => Cst::B(bools(args)?.into_iter().any(|b| b)),
        Op::Not => Cst::B(!args[0].to_bool()?),
        Op::Implies => {
            let args = bools(args)?;
            Cst::B(!args[0] || args[1])
        }
        Op::Eq => Cst::B(args[0] == args[1]),
        Op::Le => {
            let args = rats(args)?;
            Cst::B(args[0] <= args[1])
        }
        Op::Lt => {
            let args = rats(args)?;
            Cst::B(args[0] < args[1])
        }
        Op::Add => Cst::num(typ, &rats(args)?.into_iter().fold(Rat::zero(), |acc, r| acc + r)),
        Op::Sub => {
            let args = rats(args)?;
            Cst::num(typ, &(&args[0] - &args[1]))
        }
        Op::Mul => Cst::num(typ, &rats(args)?.into_iter().fold(Rat::one(), |acc, r| acc * r)),
        Op::Div => {
            let args = rats(args)?;
            if args[1].is_zero() {
                return None;
            }
            match typ {
                Typ::Int => Cst::I(int_div(&args[0].to_integer(), &args[1].to_integer())),
                _ => Cst::R(&args[0] / &args[1]),
            }
        }
        Op::ToReal => Cst::R(args[0].to_rat()?),
    };
    Some(res)
}

impl Env {
    /// Folds a ground term to a constant.
    ///
    /// ```rust
    /// # use hintsys::{prelude::*, term};
    /// let env = Env::new();
    /// let err = env.try_simplify_cst(&term::build!(env, (+ 1 (/ 3 0)))).unwrap_err();
    /// assert_eq!(&err.to_string(), "division by zero in `(+ 1 (/ 3 0))`");
    /// ```
    pub fn try_simplify_cst(&self, term: &Term) -> Res<Cst> {
        self.check(term);
        if !term.is_ground() {
            bail!("cannot fold non-ground term `{}` to a constant", term)
        }
        match term.eval(&Model::new()) {
            Some(cst) => Ok(cst),
            None => bail!(ErrorKind::DivisionByZero(term.to_string())),
        }
    }

    /// Folds a ground term to a constant, panics on the errors of [`Env::try_simplify_cst`].
    pub fn simplify_cst(&self, term: &Term) -> Cst {
        match self.try_simplify_cst(term) {
            Ok(cst) => cst,
            Err(e) => panic!("{}", e),
        }
    }
}

/// All models of `symbs` where booleans take both values and arithmetic symbols range over
/// `domain`.
///
/// Integer symbols only take the integral values of `domain`. The number of models is exponential
/// in the number of symbols.
pub fn enumerate(symbs: &Set<Symbol>, domain: &[Rat]) -> Vec<Model> {
    let mut models = vec![Model::new()];
    for sym in symbs {
        let vals: Vec<Cst> = match sym.typ() {
            Typ::Bool => vec![Cst::B(false), Cst::B(true)],
            Typ::Int => domain
                .iter()
                .filter(|val| val.is_integer())
                .map(|val| Cst::I(val.to_integer()))
                .collect(),
            Typ::Real => domain.iter().cloned().map(Cst::R).collect(),
        };
        models = models
            .into_iter()
            .flat_map(|model| {
                vals.iter().map(move |val| {
                    let mut model = model.clone();
                    model.insert(sym.clone(), val.clone());
                    model
                })
            })
            .collect();
    }
    models
}

fn same_value(lft: &Cst, rgt: &Cst) -> bool {
    match (lft.to_rat(), rgt.to_rat()) {
        (Some(lft), Some(rgt)) => lft == rgt,
        _ => lft == rgt,
    }
}

/// Checks equivalence of two terms by evaluating them on a bounded number of models.
///
/// Arithmetic symbols take values in `[-3, 3]`, by steps of `1` for integers and `1/2` for reals.
/// When the whole space of models over these values is smaller than the number of samples it is
/// enumerated, otherwise models are drawn from a [`StdRng`] seeded with a fixed seed.
///
/// This is a refutation procedure: a success only means no counterexample was found.
#[derive(Debug, Clone)]
pub struct SampledEquiv {
    samples: usize,
    seed: u64,
}
impl Default for SampledEquiv {
    fn default() -> Self {
        Self::new(256)
    }
}
impl SampledEquiv {
    /// Constructor.
    pub fn new(samples: usize) -> Self {
        Self {
            samples,
            seed: 0x2545_f491_4f6c_dd1d,
        }
    }
    /// Sets the seed of the sampler.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn domain() -> Vec<Rat> {
        (-6..=6)
            .map(|n: i64| Rat::new(n.into(), Int::from(2)))
            .collect()
    }

    fn space_size(symbs: &Set<Symbol>) -> usize {
        symbs.iter().fold(1usize, |acc, sym| {
            acc.saturating_mul(match sym.typ() {
                Typ::Bool => 2,
                Typ::Int => 7,
                Typ::Real => 13,
            })
        })
    }

    fn sample(symbs: &Set<Symbol>, rng: &mut StdRng) -> Model {
        symbs
            .iter()
            .map(|sym| {
                let val = match sym.typ() {
                    Typ::Bool => Cst::B(rng.gen_bool(0.5)),
                    Typ::Int => Cst::int(rng.gen_range(-3i64..=3)),
                    Typ::Real => Cst::R(Rat::new(rng.gen_range(-6i64..=6).into(), Int::from(2))),
                };
                (sym.clone(), val)
            })
            .collect()
    }

    /// Looks for a model on which `lft` and `rgt` evaluate to different values.
    pub fn counterexample(&self, lft: &Term, rgt: &Term) -> Option<Model> {
        let mut symbs = lft.free_vars();
        symbs.extend(rgt.free_vars());
        let differ = |model: &Model| match (lft.eval(model), rgt.eval(model)) {
            (Some(l), Some(r)) => !same_value(&l, &r),
            _ => false,
        };
        if Self::space_size(&symbs) <= self.samples {
            return enumerate(&symbs, &Self::domain())
                .into_iter()
                .find(|model| differ(model));
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.samples)
            .map(|_| Self::sample(&symbs, &mut rng))
            .find(|model| differ(model))
    }
}
impl EquivHook for SampledEquiv {
    fn check_equiv(&self, _env: &Env, lft: &Term, rgt: &Term) -> Result<(), String> {
        match self.counterexample(lft, rgt) {
            None => Ok(()),
            Some(model) => {
                let mut msg = format!("`{}` and `{}` differ on", lft, rgt);
                for (sym, val) in &model {
                    msg.push_str(&format!(" {} = {},", sym, val));
                }
                msg.pop();
                Err(msg)
            }
        }
    }
}
