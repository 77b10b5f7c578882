//! Satisfiability oracles.
//!
//! The [`check`] module only needs two kinds of queries, captured by the [`Oracle`] trait: plain
//! satisfiability of a conjunction, and satisfiability of an exists-forall-exists formula.
//! [`SmtOracle`] answers them with z3 through `rsmt2`.

crate::prelude!();

use rsmt2::{
    print::{Expr2Smt, Sort2Smt, Sym2Smt},
    Solver,
};

use conf::Conf;
use term::EquivHook;


/// Result of a satisfiability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatRes {
    /// Satisfiable.
    Sat,
    /// Unsatisfiable.
    Unsat,
    /// The oracle could not decide, for instance because of a timeout.
    Unknown,
}
impl SatRes {
    /// Conversion from `rsmt2`'s `check_sat_or_unk` result.
    pub fn of_opt(res: Option<bool>) -> Self {
        match res {
            Some(true) => Self::Sat,
            Some(false) => Self::Unsat,
            None => Self::Unknown,
        }
    }
}
impl fmt::Display for SatRes {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Sat => "sat",
            Self::Unsat => "unsat",
            Self::Unknown => "unknown",
        }
        .fmt(fmt)
    }
}

/// Answers satisfiability queries.
pub trait Oracle {
    /// Satisfiability of the conjunction of some terms.
    fn check_sat(&mut self, terms: &[Term]) -> Res<SatRes>;

    /// Satisfiability of `exists X, forall Y, exists Z, formula`.
    ///
    /// - `Y` is `forall`;
    /// - `Z` is `inner_exists`;
    /// - `X` is all the other free variables of `formula`.
    fn efe_check(
        &mut self,
        forall: &Set<Symbol>,
        inner_exists: &Set<Symbol>,
        formula: &Term,
    ) -> Res<SatRes>;
}
impl<'a, O: Oracle + ?Sized> Oracle for &'a mut O {
    fn check_sat(&mut self, terms: &[Term]) -> Res<SatRes> {
        (**self).check_sat(terms)
    }
    fn efe_check(
        &mut self,
        forall: &Set<Symbol>,
        inner_exists: &Set<Symbol>,
        formula: &Term,
    ) -> Res<SatRes> {
        (**self).efe_check(forall, inner_exists, formula)
    }
}

/// Quantified formula, only used for printing.
struct Quantified<'a> {
    forall: &'a Set<Symbol>,
    exists: &'a Set<Symbol>,
    body: &'a Term,
}
impl Quantified<'_> {
    fn write_binder<W: Write>(w: &mut W, quant: &str, symbs: &Set<Symbol>) -> SmtRes<()> {
        write!(w, "({} (", quant)?;
        for sym in symbs {
            write!(w, " (")?;
            sym.sym_to_smt2(w, ())?;
            write!(w, " ")?;
            sym.typ().sort_to_smt2(w)?;
            write!(w, ")")?;
        }
        write!(w, " ) ")?;
        Ok(())
    }
}
impl Expr2Smt<()> for Quantified<'_> {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        let mut closing = 0;
        for (quant, symbs) in [("forall", self.forall), ("exists", self.exists)] {
            if !symbs.is_empty() {
                Self::write_binder(w, quant, symbs)?;
                closing += 1;
            }
        }
        self.body.expr_to_smt2(w, ())?;
        for _ in 0..closing {
            write!(w, ")")?
        }
        Ok(())
    }
}

/// A z3 process, killed when dropped.
struct Session {
    solver: Solver<()>,
}
impl Session {
    fn new(conf: &Conf) -> Res<Self> {
        let mut solver = conf
            .to_smt_conf()?
            .spawn(())
            .chain_err(|| "while spawning z3 solver")?;
        if let Some(path) = conf.tee() {
            solver
                .path_tee(path)
                .chain_err(|| format!("while setting up tee file `{}`", path.display()))?
        }
        Ok(Self { solver })
    }

    fn declare<'a>(&mut self, symbs: impl IntoIterator<Item = &'a Symbol>) -> Res<()> {
        for sym in symbs {
            self.solver
                .declare_const(sym, &sym.typ())
                .chain_err(|| format!("while declaring symbol `{}`", sym))?
        }
        Ok(())
    }

    fn assert(&mut self, expr: &impl Expr2Smt<()>) -> Res<()> {
        self.solver
            .assert(expr)
            .chain_err(|| "while asserting a query")?;
        Ok(())
    }

    fn check(&mut self) -> Res<SatRes> {
        let res = self
            .solver
            .check_sat_or_unk()
            .chain_err(|| "during check-sat")?;
        Ok(SatRes::of_opt(res))
    }
}
impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.solver.kill() {
            warn!(error = %e, "failed to kill solver")
        }
    }
}

/// Oracle running a fresh z3 process for each query.
#[derive(Debug, Clone, Default)]
pub struct SmtOracle {
    conf: Conf,
}
impl SmtOracle {
    /// Constructor.
    pub fn new(conf: Conf) -> Self {
        Self { conf }
    }
    /// Configuration.
    pub fn conf(&self) -> &Conf {
        &self.conf
    }

    fn sat(&self, terms: &[Term]) -> Res<SatRes> {
        let mut session = Session::new(&self.conf)?;
        let symbs: Set<Symbol> = terms.iter().flat_map(Term::free_vars).collect();
        session.declare(&symbs)?;
        for term in terms {
            session.assert(term)?
        }
        let res = session.check()?;
        trace!(terms = terms.len(), %res, "check-sat");
        Ok(res)
    }

    fn efe(
        &self,
        forall: &Set<Symbol>,
        inner_exists: &Set<Symbol>,
        formula: &Term,
    ) -> Res<SatRes> {
        let mut session = Session::new(&self.conf)?;
        let outer: Set<Symbol> = formula
            .free_vars()
            .into_iter()
            .filter(|sym| !forall.contains(sym) && !inner_exists.contains(sym))
            .collect();
        session.declare(&outer)?;
        session.assert(&Quantified {
            forall,
            exists: inner_exists,
            body: formula,
        })?;
        let res = session.check()?;
        trace!(
            outer = outer.len(),
            forall = forall.len(),
            inner = inner_exists.len(),
            %res,
            "exists-forall-exists check"
        );
        Ok(res)
    }
}
impl Oracle for SmtOracle {
    fn check_sat(&mut self, terms: &[Term]) -> Res<SatRes> {
        self.sat(terms)
    }
    fn efe_check(
        &mut self,
        forall: &Set<Symbol>,
        inner_exists: &Set<Symbol>,
        formula: &Term,
    ) -> Res<SatRes> {
        self.efe(forall, inner_exists, formula)
    }
}

impl EquivHook for SmtOracle {
    fn check_equiv(&self, env: &Env, lft: &Term, rgt: &Term) -> Result<(), String> {
        let query = env.not(env.eq(lft.clone(), rgt.clone()));
        match self.sat(&[query]) {
            Ok(SatRes::Unsat) => Ok(()),
            Ok(SatRes::Sat) => Err(format!("`{}` and `{}` are not equivalent", lft, rgt)),
            Ok(SatRes::Unknown) => {
                warn!(%lft, %rgt, "could not decide equivalence");
                Ok(())
            }
            Err(e) => Err(format!("solver failure: {}", e)),
        }
    }
}
