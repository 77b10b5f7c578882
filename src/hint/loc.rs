//! Hint locations.

crate::prelude!();

use hint::Encoding;
use rank::RankFun;

/// A location of a hint.
///
/// - `region`: holds whenever the hint is in this location;
/// - `assume`: what the location requires from the environment, `true` by default;
/// - `stutter_t`: self-loop leaving the ranking function unchanged, `false` (none) by default;
/// - `rank_t`: self-loop decreasing the ranking function, `false` (none) by default;
/// - `rf`: ranking function, present iff `rank_t` is not `false`;
/// - `progress_t`: maps destination location indices to progress transitions.
///
/// Locations are built with [`Location::new`] and the `with_*` functions.
///
/// ```rust
/// # use hintsys::{prelude::*, term, hint::Location};
/// let env = Env::new();
/// let loc = Location::new(&env, term::build!(env, (<= 0 (x: int))))
///     .with_stutter(term::build!(env, (= (x @ 1: int) (x: int))))
///     .with_progress(1, term::build!(env, (= (x @ 1: int) (+ (x: int) 1))));
/// assert_eq!(loc.dsts().collect::<Vec<_>>(), vec![1]);
/// assert!(loc.rank_t().is_false());
/// ```
#[derive(Debug, Clone)]
pub struct Location {
    env: usize,
    region: Term,
    assume: Term,
    stutter_t: Term,
    rank_t: Term,
    rf: Option<RankFun>,
    progress_t: Map<usize, Term>,
}
impl Location {
    /// Constructor, panics if `region` is not a boolean term.
    pub fn new(env: &Env, region: Term) -> Self {
        env.check(&region);
        assert_eq!(region.typ(), Typ::Bool, "illegal region `{}`", region);
        Self {
            env: env.uid(),
            region,
            assume: env.tru(),
            stutter_t: env.fls(),
            rank_t: env.fls(),
            rf: None,
            progress_t: Map::new(),
        }
    }

    fn check(&self, desc: &str, term: &Term) {
        assert_eq!(
            term.env_uid(),
            self.env,
            "{} `{}` belongs to another environment",
            desc,
            term,
        );
        assert_eq!(term.typ(), Typ::Bool, "illegal {} `{}`", desc, term);
    }

    /// Sets the assumption.
    pub fn with_assume(mut self, assume: Term) -> Self {
        self.check("assumption", &assume);
        self.assume = assume;
        self
    }
    /// Sets the stutter transition.
    pub fn with_stutter(mut self, trans: Term) -> Self {
        self.check("stutter transition", &trans);
        self.stutter_t = trans;
        self
    }
    /// Sets the ranked transition and its ranking function, see [`Self::set_rank`].
    pub fn with_rank(mut self, trans: Term, rf: RankFun) -> Self {
        self.set_rank(trans, rf);
        self
    }
    /// Adds a progress transition, see [`Self::set_progress`].
    pub fn with_progress(mut self, dst: usize, trans: Term) -> Self {
        self.set_progress(dst, trans);
        self
    }

    /// Sets the ranked transition and its ranking function.
    ///
    /// Panics if `trans` is `false`.
    pub fn set_rank(&mut self, trans: Term, rf: RankFun) {
        self.check("ranked transition", &trans);
        self.check("ranking function", rf.is_ranked());
        assert!(!trans.is_false(), "a ranked transition cannot be `false`");
        self.rank_t = trans;
        self.rf = Some(rf);
    }

    /// Sets the progress transition towards `dst`.
    ///
    /// A `false` transition removes the progress transition towards `dst`, if any.
    pub fn set_progress(&mut self, dst: usize, trans: Term) {
        self.check("progress transition", &trans);
        if trans.is_false() {
            self.progress_t.remove(&dst);
        } else {
            self.progress_t.insert(dst, trans);
        }
    }

    /// Region of the location.
    pub fn region(&self) -> &Term {
        &self.region
    }
    /// Assumption of the location.
    pub fn assume(&self) -> &Term {
        &self.assume
    }
    /// Stutter transition, `false` if none.
    pub fn stutter_t(&self) -> &Term {
        &self.stutter_t
    }
    /// Ranked transition, `false` if none.
    pub fn rank_t(&self) -> &Term {
        &self.rank_t
    }
    /// Ranking function, if any.
    pub fn rf(&self) -> Option<&RankFun> {
        self.rf.as_ref()
    }
    /// Progress transition towards `dst`, if any.
    pub fn progress(&self, dst: usize) -> Option<&Term> {
        self.progress_t.get(&dst)
    }
    /// Destinations of the progress transitions, in increasing order.
    pub fn dsts(&self) -> impl Iterator<Item = usize> + '_ {
        self.progress_t.keys().cloned()
    }
    /// Progress transitions.
    pub fn progress_t(&self) -> &Map<usize, Term> {
        &self.progress_t
    }

    /// Part of the region where the ranking function is not at its minimum, `false` if none.
    pub fn ranked_region(&self, env: &Env) -> Term {
        match &self.rf {
            None => env.fls(),
            Some(rf) => env.and(vec![self.region.clone(), rf.is_ranked().clone()]),
        }
    }
    /// Part of the region where the ranking function is at its minimum, the region if none.
    pub fn minrf_region(&self, env: &Env) -> Term {
        match &self.rf {
            None => self.region.clone(),
            Some(rf) => env.and(vec![self.region.clone(), rf.is_min().clone()]),
        }
    }

    /// Transition clauses of the location.
    ///
    /// - `idx`: index of the location in its hint;
    /// - `enc`: encoding of the hint;
    /// - `x_lvals`: next-state version of the location values of `enc`.
    ///
    /// Panics if the location has neither a stutter transition nor a progress transition.
    pub fn get_trans(&self, env: &Env, idx: usize, enc: &Encoding, x_lvals: &[Term]) -> Vec<Term> {
        assert_eq!(env.uid(), self.env, "location belongs to another environment");
        assert!(
            !self.stutter_t.is_false() || !self.progress_t.is_empty(),
            "location {} has no stutter transition and no progress transition",
            idx,
        );
        assert!(self.rf.is_none() || !enc.t_is_ranked().is_false());
        let (lval, x_lval) = (&enc.lvals()[idx], &x_lvals[idx]);
        let (is_stutter, is_ranked, is_progress) =
            (enc.t_is_stutter(), enc.t_is_ranked(), enc.t_is_progress());
        let mut res = vec![];

        // loc => (loc' and one of the self-loop types) or (dst' and progress)
        let min_rf = self.rf.as_ref().map(|rf| rf.is_min().clone());
        let with_min_rf = |term: Term| match &min_rf {
            None => term,
            Some(min_rf) => env.and(vec![term, min_rf.clone()]),
        };
        let mut t_types = vec![];
        if !self.stutter_t.is_false() {
            t_types.push(is_stutter.clone())
        }
        if let Some(rf) = &self.rf {
            t_types.push(env.and(vec![is_ranked.clone(), rf.is_ranked().clone()]))
        }
        if self.progress(idx).is_some() {
            t_types.push(with_min_rf(is_progress.clone()))
        }
        let mut x_locs = vec![env.and(vec![x_lval.clone(), env.or(t_types)])];
        for dst in self.dsts().filter(|dst| *dst != idx) {
            x_locs.push(with_min_rf(env.and(vec![
                x_lvals[dst].clone(),
                is_progress.clone(),
            ])))
        }
        res.push(env.implies(lval.clone(), env.or(x_locs)));

        let lval_x_lval = |kind: &Term| env.and(vec![lval.clone(), x_lval.clone(), kind.clone()]);

        if !self.stutter_t.is_false() {
            let rhs = match &self.rf {
                None => self.stutter_t.clone(),
                Some(rf) => env.and(vec![self.stutter_t.clone(), rf.is_const().clone()]),
            };
            res.push(env.implies(lval_x_lval(is_stutter), rhs))
        }

        if let Some(rf) = &self.rf {
            res.push(env.implies(
                lval_x_lval(is_ranked),
                env.and(vec![
                    self.rank_t.clone(),
                    rf.is_ranked().clone(),
                    rf.is_decr().clone(),
                ]),
            ))
        }

        for (dst, trans) in &self.progress_t {
            res.push(env.implies(
                env.and(vec![lval.clone(), x_lvals[*dst].clone(), is_progress.clone()]),
                trans.clone(),
            ))
        }

        if let (Some(rf), Some(x_is_rank_decr)) = (&self.rf, enc.x_is_rank_decr(env)) {
            let is_rank_decr = enc.is_rank_decr();
            // still ranked: the flag stays up
            res.push(env.implies(
                env.and(vec![lval.clone(), is_rank_decr.clone(), rf.is_ranked().clone()]),
                x_is_rank_decr.clone(),
            ));
            // minimum reached: the flag goes down
            res.push(env.implies(
                env.and(vec![lval.clone(), is_rank_decr.clone(), rf.is_min().clone()]),
                env.not(x_is_rank_decr),
            ));
        }

        res
    }

    /// Same location in another environment.
    pub fn to_env(&self, env: &Env) -> Self {
        Self {
            env: env.uid(),
            region: env.import(&self.region),
            assume: env.import(&self.assume),
            stutter_t: env.import(&self.stutter_t),
            rank_t: env.import(&self.rank_t),
            rf: self.rf.as_ref().map(|rf| rf.to_env(env)),
            progress_t: self
                .progress_t
                .iter()
                .map(|(dst, trans)| (*dst, env.import(trans)))
                .collect(),
        }
    }
}
