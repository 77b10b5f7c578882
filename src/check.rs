//! Correctness checks for hints.
//!
//! A hint is correct if each of its transitions can actually be taken whenever its source
//! location holds. The hint picks the next values of the symbols it owns first, then the rest of
//! the system picks the next values of the other symbols, constrained by the assumption of the
//! target location only.
//!
//! Each check first makes sure the transition is not trivially empty with a satisfiability
//! query. Then it asks the [oracle](oracle::Oracle) for a counterexample, that is
//!
//! ```text
//! ∃ curr. ∀ owned'. ∃ others'. ¬constr(curr, owned', others')
//! ```
//!
//! where `constr` states that if `curr` is in the source region and `others'` satisfies the
//! assumption, then the transition is taken and the target region holds. A `sat` answer means
//! there is a current state where every choice of the hint can be defeated, and the check
//! fails.

crate::prelude!();

use hint::Hint;
use oracle::{Oracle, SatRes};

#[cfg(test)]
mod test;

/// Result of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The check succeeded.
    Correct,
    /// The check failed.
    Violated(String),
    /// The oracle could not decide.
    Unknown(String),
}
impl Verdict {
    /// True on [`Verdict::Correct`].
    pub fn is_correct(&self) -> bool {
        *self == Self::Correct
    }
    /// True on [`Verdict::Violated`].
    pub fn is_violated(&self) -> bool {
        matches!(self, Self::Violated(_))
    }
    /// True on [`Verdict::Unknown`].
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
    /// Message explaining the verdict, if any.
    pub fn msg(&self) -> Option<&str> {
        match self {
            Self::Correct => None,
            Self::Violated(msg) | Self::Unknown(msg) => Some(msg),
        }
    }
    /// `Some(true)` if correct, `Some(false)` if violated, `None` if unknown.
    pub fn to_opt(&self) -> Option<bool> {
        match self {
            Self::Correct => Some(true),
            Self::Violated(_) => Some(false),
            Self::Unknown(_) => None,
        }
    }
}

/// Aggregated result of several checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// `Some(true)` if all checks succeeded, `Some(false)` if some failed, `None` otherwise.
    pub verdict: Option<bool>,
    /// Messages of the checks that did not succeed.
    pub msgs: Vec<String>,
}
impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}
impl Report {
    /// Empty report, its verdict is `Some(true)`.
    pub fn new() -> Self {
        Self {
            verdict: Some(true),
            msgs: vec![],
        }
    }
    /// Adds the result of a check.
    pub fn add(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Correct => (),
            Verdict::Violated(msg) => {
                self.verdict = Some(false);
                self.msgs.push(msg)
            }
            Verdict::Unknown(msg) => {
                if self.verdict == Some(true) {
                    self.verdict = None
                }
                self.msgs.push(msg)
            }
        }
    }
    /// True if all checks succeeded.
    pub fn is_correct(&self) -> bool {
        self.verdict == Some(true)
    }
}

/// Outcome of checking one transition.
enum Edge {
    /// Satisfiability of the transition is unknown.
    MaybeEmpty,
    Correct,
    Violated,
    Unknown,
}

/// Checks the transitions of a hint against an oracle.
pub struct Checker<'h, 'env, O> {
    hint: &'h Hint<'env>,
    oracle: O,
    /// Next-state version of the symbols owned by the hint.
    x_owned: Set<Symbol>,
    /// Next-state version of the symbols mentioned but not owned by the hint.
    x_others: Set<Symbol>,
}
impl<'h, 'env, O: Oracle> Checker<'h, 'env, O> {
    /// Constructor.
    pub fn new(hint: &'h Hint<'env>, oracle: O) -> Self {
        let (x_owned, x_others) = hint
            .all_symbs()
            .iter()
            .map(Symbol::to_next)
            .partition(|sym| hint.owned_symbs().contains(&sym.to_curr()));
        Self {
            hint,
            oracle,
            x_owned,
            x_others,
        }
    }

    /// Hint being checked.
    pub fn hint(&self) -> &'h Hint<'env> {
        self.hint
    }
    /// Yields the oracle.
    pub fn into_oracle(self) -> O {
        self.oracle
    }

    fn x(&self, term: &Term) -> Term {
        self.hint.env().to_next(term, self.hint.all_symbs())
    }

    /// Checks a transition, `constr` is the constraint that must be valid.
    fn check_edge(&mut self, nonempty: &[Term], constr: Term) -> Res<Edge> {
        match self
            .oracle
            .check_sat(nonempty)
            .chain_err(|| "while checking a transition is not empty")?
        {
            SatRes::Unsat => return Ok(Edge::Correct),
            SatRes::Unknown => return Ok(Edge::MaybeEmpty),
            SatRes::Sat => (),
        }
        let query = self.hint.env().not(constr);
        let res = self
            .oracle
            .efe_check(&self.x_owned, &self.x_others, &query)
            .chain_err(|| "while looking for a counterexample")?;
        trace!(hint = %self.hint, %res, "counterexample query");
        Ok(match res {
            SatRes::Unsat => Edge::Correct,
            SatRes::Sat => Edge::Violated,
            SatRes::Unknown => Edge::Unknown,
        })
    }

    /// Checks the stutter transition of each location.
    ///
    /// A stutter transition must keep the hint in the region of its location, without changing
    /// the ranking function.
    pub fn stutter(&mut self) -> Res<Verdict> {
        let (hint, env) = (self.hint, self.hint.env());
        debug!(%hint, "checking stutter transitions");
        for (idx, loc) in hint.iter().enumerate() {
            let (region, assume) = (loc.region().clone(), loc.assume().clone());
            let (x_region, x_assume) = (self.x(&region), self.x(&assume));
            let stutter_t = match loc.rf() {
                None => loc.stutter_t().clone(),
                Some(rf) => env.and(vec![loc.stutter_t().clone(), rf.is_const().clone()]),
            };
            let nonempty = [
                region.clone(),
                assume.clone(),
                stutter_t.clone(),
                x_region.clone(),
                x_assume.clone(),
            ];
            let constr = env.implies(
                env.and(vec![region, assume, x_assume]),
                env.and(vec![stutter_t, x_region]),
            );
            let verdict = match self.check_edge(&nonempty, constr)? {
                Edge::Correct => continue,
                Edge::MaybeEmpty => {
                    Verdict::Unknown(format!("{}: stutter on {} might be empty", hint, idx))
                }
                Edge::Unknown => {
                    Verdict::Unknown(format!("{}: stutter condition on {} unknown", hint, idx))
                }
                Edge::Violated => {
                    Verdict::Violated(format!("{}: stutter condition on {} violated", hint, idx))
                }
            };
            return Ok(verdict);
        }
        Ok(Verdict::Correct)
    }

    /// Checks the ranked transition of each location with a ranking function.
    ///
    /// From the ranked region, a ranked transition must decrease the ranking function and stay in
    /// the region.
    pub fn rank(&mut self) -> Res<Verdict> {
        let (hint, env) = (self.hint, self.hint.env());
        debug!(%hint, "checking ranked transitions");
        for (idx, loc) in hint.iter().enumerate() {
            let rf = match loc.rf() {
                Some(rf) => rf,
                None => continue,
            };
            let region = loc.ranked_region(env);
            let assume = loc.assume().clone();
            let (x_region, x_assume) = (self.x(loc.region()), self.x(&assume));
            let rank_t = env.and(vec![loc.rank_t().clone(), rf.is_decr().clone()]);
            let nonempty = [
                region.clone(),
                assume.clone(),
                rank_t.clone(),
                x_region.clone(),
                x_assume.clone(),
            ];
            let constr = env.implies(
                env.and(vec![region, assume, x_assume]),
                env.and(vec![rank_t, x_region]),
            );
            let verdict = match self.check_edge(&nonempty, constr)? {
                Edge::Correct => continue,
                Edge::MaybeEmpty => {
                    Verdict::Unknown(format!("{}: ranked trans on {} might be empty", hint, idx))
                }
                Edge::Unknown => {
                    Verdict::Unknown(format!("{}: ranked condition on {} unknown", hint, idx))
                }
                Edge::Violated => {
                    Verdict::Violated(format!("{}: ranked condition on {} violated", hint, idx))
                }
            };
            return Ok(verdict);
        }
        Ok(Verdict::Correct)
    }

    /// Message for the first progress transition towards a location that does not exist, if any.
    pub fn unknown_dst(&self) -> Option<String> {
        let hint = self.hint;
        hint.iter().enumerate().find_map(|(idx, loc)| {
            loc.dsts().find(|dst| *dst >= hint.len()).map(|dst| {
                format!(
                    "{}: progress transition {} -> {} targets an unknown location",
                    hint, idx, dst
                )
            })
        })
    }

    /// Checks the progress transitions of each location.
    ///
    /// Outside of the ranked region of its source, a progress transition must reach the region of
    /// its destination.
    pub fn progress(&mut self) -> Res<Verdict> {
        let (hint, env) = (self.hint, self.hint.env());
        debug!(%hint, "checking progress transitions");
        if let Some(msg) = self.unknown_dst() {
            return Ok(Verdict::Violated(msg));
        }
        for (src_idx, src) in hint.iter().enumerate() {
            let mut src_pred = vec![src.region().clone(), src.assume().clone()];
            if let Some(rf) = src.rf() {
                src_pred.push(env.not(rf.is_ranked().clone()))
            }
            let src_pred = env.and(src_pred);
            for (dst_idx, progress_t) in src.progress_t() {
                let dst = hint.get(*dst_idx);
                let (x_region, x_assume) = (self.x(dst.region()), self.x(dst.assume()));
                let nonempty = [
                    src_pred.clone(),
                    progress_t.clone(),
                    x_region.clone(),
                    x_assume.clone(),
                ];
                let constr = env.implies(
                    env.and(vec![src_pred.clone(), x_assume]),
                    env.and(vec![progress_t.clone(), x_region]),
                );
                let verdict = match self.check_edge(&nonempty, constr)? {
                    Edge::Correct => continue,
                    Edge::MaybeEmpty => Verdict::Unknown(format!(
                        "{}: progress trans {} - {} might be empty",
                        hint, src_idx, dst_idx
                    )),
                    Edge::Unknown => Verdict::Unknown(format!(
                        "{}: progress condition {} -> {} validity unknown",
                        hint, src_idx, dst_idx
                    )),
                    Edge::Violated => Verdict::Violated(format!(
                        "{}: progress condition {} -> {} violated",
                        hint, src_idx, dst_idx
                    )),
                };
                return Ok(verdict);
            }
        }
        Ok(Verdict::Correct)
    }

    /// Runs all the checks.
    pub fn check_all(&mut self) -> Res<Report> {
        let mut report = Report::new();
        let dsts_ok = match self.unknown_dst() {
            None => true,
            Some(msg) => {
                report.add(Verdict::Violated(msg));
                false
            }
        };
        report.add(self.stutter()?);
        report.add(self.rank()?);
        if dsts_ok {
            report.add(self.progress()?);
        }
        debug!(hint = %self.hint, verdict = ?report.verdict, "done checking");
        Ok(report)
    }
}
