//! Tests over an oracle enumerating small domains.

use super::*;

use crate::{
    hint::Location,
    rank::RankFun,
    term::{
        self,
        eval::{enumerate, Model},
    },
};

/// Decides queries by enumerating integers in `[-2, 2]`.
struct BoundedOracle {
    domain: Vec<Rat>,
}
impl BoundedOracle {
    fn new() -> Self {
        Self {
            domain: (-2..=2).map(|n| Rat::from(Int::from(n))).collect(),
        }
    }
    fn models(&self, symbs: &Set<Symbol>) -> Vec<Model> {
        enumerate(symbs, &self.domain)
    }
    fn holds(term: &Term, models: &[&Model]) -> bool {
        let mut model = Model::new();
        for m in models {
            model.extend(m.iter().map(|(sym, val)| (sym.clone(), val.clone())))
        }
        term.eval(&model) == Some(Cst::B(true))
    }
}
impl Oracle for BoundedOracle {
    fn check_sat(&mut self, terms: &[Term]) -> Res<SatRes> {
        let symbs: Set<Symbol> = terms.iter().flat_map(Term::free_vars).collect();
        let sat = self
            .models(&symbs)
            .iter()
            .any(|model| terms.iter().all(|term| Self::holds(term, &[model])));
        Ok(if sat { SatRes::Sat } else { SatRes::Unsat })
    }
    fn efe_check(
        &mut self,
        forall: &Set<Symbol>,
        inner_exists: &Set<Symbol>,
        formula: &Term,
    ) -> Res<SatRes> {
        let outer: Set<Symbol> = formula
            .free_vars()
            .into_iter()
            .filter(|sym| !forall.contains(sym) && !inner_exists.contains(sym))
            .collect();
        let (outer, forall, inner) = (
            self.models(&outer),
            self.models(forall),
            self.models(inner_exists),
        );
        let sat = outer.iter().any(|o| {
            forall
                .iter()
                .all(|f| inner.iter().any(|i| Self::holds(formula, &[o, f, i])))
        });
        Ok(if sat { SatRes::Sat } else { SatRes::Unsat })
    }
}

/// Replays fixed answers.
struct ScriptedOracle {
    sat: SatRes,
    efe: SatRes,
}
impl Oracle for ScriptedOracle {
    fn check_sat(&mut self, _: &[Term]) -> Res<SatRes> {
        Ok(self.sat)
    }
    fn efe_check(&mut self, _: &Set<Symbol>, _: &Set<Symbol>, _: &Term) -> Res<SatRes> {
        Ok(self.efe)
    }
}

/// Hint owning `x`, also mentioning `y`.
fn base_hint(env: &Env) -> Hint {
    let x = env.declare("x", Typ::Int);
    let y = env.declare("y", Typ::Int);
    Hint::new(
        env,
        "h",
        Some(x.clone()).into_iter().collect(),
        vec![x, y].into_iter().collect(),
    )
}

fn counter(env: &Env) -> Hint {
    let mut hint = base_hint(env);
    let x = env.declare("x", Typ::Int);
    let rf = RankFun::new(env, env.var(&x), None, hint.owned_symbs().clone());
    hint.add(
        Location::new(env, term::build!(env, (<= 0 (x: int))))
            .with_stutter(term::build!(env, (= (x @ 1: int) (x: int))))
            .with_rank(env.tru(), rf)
            .with_progress(1, term::build!(env, (= (x @ 1: int) 2))),
    );
    hint.add(
        Location::new(env, term::build!(env, (<= 0 (x: int))))
            .with_progress(0, term::build!(env, (= (x @ 1: int) (x: int)))),
    );
    hint
}

#[test]
fn correct_hint() {
    let env = Env::new();
    let hint = counter(&env);
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert_eq!(checker.stutter().unwrap(), Verdict::Correct);
    assert_eq!(checker.rank().unwrap(), Verdict::Correct);
    assert_eq!(checker.progress().unwrap(), Verdict::Correct);
    let report = checker.check_all().unwrap();
    assert!(report.is_correct());
    assert!(report.msgs.is_empty());
}

#[test]
fn stutter_violation() {
    let env = Env::new();
    let mut hint = base_hint(&env);
    hint.add(
        Location::new(&env, term::build!(env, (<= (x: int) 0)))
            .with_stutter(term::build!(env, (= (x @ 1: int) (+ (x: int) 1)))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert_eq!(
        checker.stutter().unwrap(),
        Verdict::Violated("h: stutter condition on 0 violated".into()),
    );
    assert_eq!(checker.progress().unwrap(), Verdict::Correct);
}

#[test]
fn empty_stutter_is_vacuous() {
    let env = Env::new();
    let mut hint = base_hint(&env);
    // the stutter transition leaves the region
    hint.add(
        Location::new(&env, term::build!(env, (= (x: int) 0)))
            .with_stutter(term::build!(env, (= (x @ 1: int) (+ (x: int) 1)))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert_eq!(checker.stutter().unwrap(), Verdict::Correct);
}

#[test]
fn rank_violation() {
    let env = Env::new();
    let mut hint = base_hint(&env);
    let x = env.declare("x", Typ::Int);
    let rf = RankFun::new(&env, env.var(&x), None, hint.owned_symbs().clone());
    // decreasing by one from the ranked region can leave the region
    hint.add(
        Location::new(&env, term::build!(env, (<= 1 (x: int))))
            .with_stutter(term::build!(env, (= (x @ 1: int) (x: int))))
            .with_rank(env.tru(), rf),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert_eq!(checker.stutter().unwrap(), Verdict::Correct);
    assert_eq!(
        checker.rank().unwrap(),
        Verdict::Violated("h: ranked condition on 0 violated".into()),
    );
}

#[test]
fn progress_violation() {
    let env = Env::new();
    let mut hint = base_hint(&env);
    hint.add(
        Location::new(&env, term::build!(env, (<= 0 (x: int))))
            .with_progress(1, term::build!(env, (= (x @ 1: int) (- (x: int) 1)))),
    );
    hint.add(
        Location::new(&env, term::build!(env, (<= 0 (x: int))))
            .with_stutter(term::build!(env, (= (x @ 1: int) (x: int)))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert_eq!(
        checker.progress().unwrap(),
        Verdict::Violated("h: progress condition 0 -> 1 violated".into()),
    );
    let report = checker.check_all().unwrap();
    assert_eq!(report.verdict, Some(false));
    assert_eq!(report.msgs, vec!["h: progress condition 0 -> 1 violated".to_string()]);
}

#[test]
fn other_symbols_are_adversarial() {
    let env = Env::new();
    let mut hint = base_hint(&env);
    // `y` is not owned, the hint cannot force `y' = x'`
    hint.add(
        Location::new(&env, env.tru())
            .with_stutter(term::build!(env, (= (y @ 1: int) (x @ 1: int)))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert!(checker.stutter().unwrap().is_violated());

    let env = Env::new();
    let mut hint = base_hint(&env);
    // the hint can follow the current value of `y`
    hint.add(
        Location::new(&env, env.tru())
            .with_stutter(term::build!(env, (= (x @ 1: int) (y: int)))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert!(checker.stutter().unwrap().is_correct());

    let env = Env::new();
    let mut hint = base_hint(&env);
    // `y'` is chosen after `x'`, but the assumption pins it
    hint.add(
        Location::new(&env, env.tru())
            .with_assume(term::build!(env, (= (y: int) 1)))
            .with_stutter(term::build!(env, (= (y @ 1: int) (x @ 1: int)))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    assert!(checker.stutter().unwrap().is_correct());
}

#[test]
fn unknown_answers() {
    let env = Env::new();
    let hint = counter(&env);

    let oracle = ScriptedOracle {
        sat: SatRes::Unknown,
        efe: SatRes::Unsat,
    };
    let mut checker = Checker::new(&hint, oracle);
    assert_eq!(
        checker.stutter().unwrap(),
        Verdict::Unknown("h: stutter on 0 might be empty".into()),
    );
    assert_eq!(
        checker.rank().unwrap(),
        Verdict::Unknown("h: ranked trans on 0 might be empty".into()),
    );
    assert_eq!(
        checker.progress().unwrap(),
        Verdict::Unknown("h: progress trans 0 - 1 might be empty".into()),
    );
    let report = checker.check_all().unwrap();
    assert_eq!(report.verdict, None);
    assert_eq!(report.msgs.len(), 3);

    let oracle = ScriptedOracle {
        sat: SatRes::Sat,
        efe: SatRes::Unknown,
    };
    let mut checker = Checker::new(&hint, oracle);
    assert_eq!(
        checker.stutter().unwrap(),
        Verdict::Unknown("h: stutter condition on 0 unknown".into()),
    );
    assert_eq!(
        checker.rank().unwrap(),
        Verdict::Unknown("h: ranked condition on 0 unknown".into()),
    );
    assert_eq!(
        checker.progress().unwrap(),
        Verdict::Unknown("h: progress condition 0 -> 1 validity unknown".into()),
    );
}

#[test]
fn violation_dominates_unknown() {
    let mut report = Report::new();
    report.add(Verdict::Unknown("unknown".into()));
    assert_eq!(report.verdict, None);
    report.add(Verdict::Violated("violated".into()));
    assert_eq!(report.verdict, Some(false));
    report.add(Verdict::Unknown("unknown again".into()));
    report.add(Verdict::Correct);
    assert_eq!(report.verdict, Some(false));
    assert_eq!(report.msgs.len(), 3);
}

#[test]
fn unknown_destination() {
    let env = Env::new();
    let mut hint = base_hint(&env);
    hint.add(
        Location::new(&env, env.tru())
            .with_stutter(term::build!(env, (= (x @ 1: int) (x: int))))
            .with_progress(3, term::build!(env, (= (x @ 1: int) 0))),
    );
    let mut checker = Checker::new(&hint, BoundedOracle::new());
    let msg = "h: progress transition 0 -> 3 targets an unknown location".to_string();
    assert_eq!(checker.progress().unwrap(), Verdict::Violated(msg.clone()));
    let report = checker.check_all().unwrap();
    assert_eq!(report.verdict, Some(false));
    assert_eq!(report.msgs, vec![msg]);
}
