//! Hints: activable automata over a subset of the state variables of a system.
//!
//! A [`Hint`] is a list of [`Location`]s. It starts *open*: locations can be added or replaced.
//! The first call to [`Hint::get_trans_system`] *compiles* it, allocating the fresh symbols that
//! encode its current location and the type of its current transition. A compiled hint cannot be
//! modified anymore.
//!
//! Each step of a compiled hint has a type among
//!
//! - *stutter*: self-loop, the ranking function of the location (if any) does not change;
//! - *ranked*: self-loop, the ranking function decreases;
//! - *progress*: moves to a destination location, only when the ranking function (if any) is at
//!   its minimum.
//!
//! When its activation flag is false, a hint sits in an extra *inactive* location and stutters
//! forever, constraining nothing.

crate::prelude!();

pub mod loc;


pub use self::loc::Location;

use trans::TransSystem;

/// Fresh symbols and values encoding the state of a compiled hint.
#[derive(Debug, Clone)]
pub struct Encoding {
    loc_symbs: Vec<Symbol>,
    lvals: Vec<Term>,
    type_symbs: Vec<Symbol>,
    t_is_stutter: Term,
    t_is_ranked: Term,
    t_is_progress: Term,
    is_rank_decr: Term,
}
impl Encoding {
    /// Symbols encoding the current location.
    pub fn loc_symbs(&self) -> &[Symbol] {
        &self.loc_symbs
    }
    /// One value per location, the last one is the inactive location.
    pub fn lvals(&self) -> &[Term] {
        &self.lvals
    }
    /// Value of the inactive location.
    pub fn inactive(&self) -> &Term {
        // `lvals` has one more value than there are locations
        &self.lvals[self.lvals.len() - 1]
    }
    /// Symbols encoding the type of the current transition.
    pub fn type_symbs(&self) -> &[Symbol] {
        &self.type_symbs
    }
    /// Current transition is a stutter one.
    pub fn t_is_stutter(&self) -> &Term {
        &self.t_is_stutter
    }
    /// Current transition is a ranked one, `false` if the hint has no ranking function.
    pub fn t_is_ranked(&self) -> &Term {
        &self.t_is_ranked
    }
    /// Current transition is a progress one.
    pub fn t_is_progress(&self) -> &Term {
        &self.t_is_progress
    }
    /// Rank-decrease flag, `false` if the hint has no ranking function.
    ///
    /// Raised by ranked transitions, and stays up until a ranking function reaches its minimum.
    pub fn is_rank_decr(&self) -> &Term {
        &self.is_rank_decr
    }
    /// Next-state version of the rank-decrease flag, if any.
    pub fn x_is_rank_decr(&self, env: &Env) -> Option<Term> {
        self.is_rank_decr.sym().map(|sym| env.var(&sym.to_next()))
    }

    /// All the fresh symbols of the encoding.
    pub fn symbs(&self) -> impl Iterator<Item = &Symbol> {
        self.loc_symbs
            .iter()
            .chain(self.type_symbs.iter())
            .chain(self.is_rank_decr.sym())
    }
}

/// Compilation phase of a hint.
#[derive(Debug, Clone)]
pub enum Phase {
    /// Locations can still change.
    Open,
    /// The hint is compiled, its locations are frozen.
    Compiled(Encoding),
}

/// A hint, see the [module-level documentation](self).
#[derive(Debug, Clone)]
pub struct Hint<'env> {
    env: &'env Env,
    name: String,
    owned_symbs: Set<Symbol>,
    all_symbs: Set<Symbol>,
    locs: Vec<Location>,
    phase: Phase,
}
impl<'env> Hint<'env> {
    /// Constructor.
    ///
    /// - `owned_symbs`: symbols the hint constrains;
    /// - `all_symbs`: symbols the hint mentions, must contain `owned_symbs`.
    ///
    /// Panics if `name` is empty, if some symbols are next-state symbols, or if `owned_symbs` is not
    /// a subset of `all_symbs`.
    pub fn new(
        env: &'env Env,
        name: impl Into<String>,
        owned_symbs: Set<Symbol>,
        all_symbs: Set<Symbol>,
    ) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "hint names cannot be empty");
        assert!(
            all_symbs.iter().all(|sym| !sym.is_next()),
            "hint `{}` mentions next-state symbols",
            name,
        );
        assert!(
            owned_symbs.is_subset(&all_symbs),
            "hint `{}` owns symbols it does not mention",
            name,
        );
        Self {
            env,
            name,
            owned_symbs,
            all_symbs,
            locs: vec![],
            phase: Phase::Open,
        }
    }

    /// Name of the hint.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Environment of the hint.
    pub fn env(&self) -> &'env Env {
        self.env
    }
    /// Symbols the hint constrains.
    pub fn owned_symbs(&self) -> &Set<Symbol> {
        &self.owned_symbs
    }
    /// Symbols the hint mentions.
    pub fn all_symbs(&self) -> &Set<Symbol> {
        &self.all_symbs
    }
    /// Number of locations.
    pub fn len(&self) -> usize {
        self.locs.len()
    }
    /// True if the hint has no locations.
    pub fn is_empty(&self) -> bool {
        self.locs.is_empty()
    }
    /// Location at some index, panics if out of bounds.
    pub fn get(&self, idx: usize) -> &Location {
        &self.locs[idx]
    }
    /// Iterator over the locations.
    pub fn iter(&self) -> std::slice::Iter<Location> {
        self.locs.iter()
    }
    /// Encoding of the hint, if compiled.
    pub fn encoding(&self) -> Option<&Encoding> {
        match &self.phase {
            Phase::Open => None,
            Phase::Compiled(enc) => Some(enc),
        }
    }
    /// True if the hint is compiled.
    pub fn is_compiled(&self) -> bool {
        self.encoding().is_some()
    }

    fn compiled(&self) -> &Encoding {
        match self.encoding() {
            Some(enc) => enc,
            None => panic!("hint `{}` is not compiled", self.name),
        }
    }
    fn assert_open(&self) {
        assert!(
            !self.is_compiled(),
            "hint `{}` is compiled, its locations cannot change",
            self.name,
        )
    }

    /// Adds a location, panics if the hint is compiled.
    pub fn add(&mut self, loc: Location) {
        self.assert_open();
        self.locs.push(loc)
    }
    /// Replaces the locations, panics if the hint is compiled.
    pub fn set_locs(&mut self, locs: Vec<Location>) {
        self.assert_open();
        self.locs = locs
    }

    fn compile(&mut self) -> &Encoding {
        if let Phase::Open = self.phase {
            let env = self.env;
            for (idx, loc) in self.locs.iter().enumerate() {
                if let Some(dst) = loc.dsts().find(|dst| *dst >= self.locs.len()) {
                    panic!(
                        "hint `{}`: location {} progresses to unknown location {}",
                        self.name, idx, dst,
                    )
                }
            }

            let (loc_symbs, lvals) = env.new_enum(&format!("{}_", self.name), self.locs.len() + 1);
            let (type_symbs, type_vals) = env.new_enum(&format!("{}_type_", self.name), 3);
            let (t_is_stutter, mut t_is_ranked, t_is_progress) = (
                type_vals[0].clone(),
                type_vals[1].clone(),
                type_vals[2].clone(),
            );
            let is_rank_decr = if self.locs.iter().all(|loc| loc.rf().is_none()) {
                debug_assert!(self.locs.iter().all(|loc| loc.rank_t().is_false()));
                t_is_ranked = env.fls();
                env.fls()
            } else {
                env.symbol(format!("_{}_dec_rank", self.name), Typ::Bool)
            };
            debug!(
                hint = %self.name,
                locs = self.locs.len(),
                loc_symbs = loc_symbs.len(),
                ranked = !t_is_ranked.is_false(),
                "compiling hint"
            );

            self.phase = Phase::Compiled(Encoding {
                loc_symbs,
                lvals,
                type_symbs,
                t_is_stutter,
                t_is_ranked,
                t_is_progress,
                is_rank_decr,
            })
        }
        self.compiled()
    }

    /// Compiles the hint (if needed) to an activable transition system.
    ///
    /// Yields the transition system and a predicate that holds iff the hint is active. When
    /// `active` is false the hint is in its inactive location and stutters.
    ///
    /// Panics if `active` is not a current-state boolean symbol, or if a location progresses to a
    /// location that does not exist.
    pub fn get_trans_system(&mut self, active: &Symbol) -> (TransSystem, Term) {
        assert!(
            active.typ() == Typ::Bool && !active.is_next(),
            "illegal activation symbol `{}`",
            active
        );
        let env = self.env;
        let active = env.var(active);
        let enc = self.compile().clone();

        let mut fresh: Set<Symbol> = enc.symbs().cloned().collect();
        fresh.extend(active.sym().cloned());
        let x_lvals: Vec<Term> = enc
            .lvals()
            .iter()
            .map(|lval| env.to_next(lval, &fresh))
            .collect();
        let symbs: Set<Symbol> = self.all_symbs.union(&fresh).cloned().collect();
        let mut res = TransSystem::new(symbs.iter().cloned());

        let inactive = enc.inactive();
        let x_inactive = &x_lvals[x_lvals.len() - 1];
        let x_t_is_stutter = env.to_next(enc.t_is_stutter(), &symbs);

        // invariant: in location `i` => region and assumption of `i`
        res.ext_init(
            enc.lvals()
                .iter()
                .zip(self.locs.iter())
                .map(|(lval, loc)| {
                    env.implies(
                        lval.clone(),
                        env.and(vec![loc.region().clone(), loc.assume().clone()]),
                    )
                }),
        );
        // invariant: in some location (possibly the inactive one)
        res.add_init(env.or(enc.lvals().iter().cloned()));
        let invariants: Vec<Term> = res
            .init()
            .iter()
            .map(|inv| env.to_next(inv, &symbs))
            .collect();
        res.ext_trans(invariants);

        let not_active = env.not(active);
        res.add_init(env.implies(
            not_active.clone(),
            env.and(vec![inactive.clone(), enc.t_is_stutter().clone()]),
        ));
        res.add_trans(env.implies(
            not_active,
            env.and(vec![x_inactive.clone(), x_t_is_stutter]),
        ));

        if let Some(x_is_rank_decr) = enc.x_is_rank_decr(env) {
            res.add_init(env.iff(enc.is_rank_decr().clone(), enc.t_is_ranked().clone()));
            res.add_trans(env.implies(enc.t_is_ranked().clone(), x_is_rank_decr.clone()));
            res.add_trans(env.implies(
                x_is_rank_decr,
                env.or(vec![enc.is_rank_decr().clone(), enc.t_is_ranked().clone()]),
            ));
        }

        for (idx, loc) in self.locs.iter().enumerate() {
            res.ext_trans(loc.get_trans(env, idx, &enc, &x_lvals))
        }

        debug!(
            hint = %self.name,
            init = res.init().len(),
            trans = res.trans().len(),
            "hint transition system ready"
        );
        (res, env.not(inactive.clone()))
    }

    /// Constraints forbidding hints with common owned symbols to be active at the same time.
    ///
    /// `active[i]` is the activation predicate of `hints[i]`. Yields `active[i] => !active[j]` (as
    /// one conjunction per `i`) for all `i < j` such that `hints[i]` and `hints[j]` own a common
    /// symbol.
    pub fn disjoint_symbs(env: &Env, hints: &[Hint], active: &[Term]) -> Vec<Term> {
        assert_eq!(hints.len(), active.len(), "one activation predicate per hint expected");
        let mut res = vec![];
        for (idx, (h0, h0_active)) in hints.iter().zip(active).enumerate() {
            env.check(h0_active);
            let conflicts: Vec<Term> = hints[idx + 1..]
                .iter()
                .zip(&active[idx + 1..])
                .filter(|(h1, _)| !h0.owned_symbs.is_disjoint(&h1.owned_symbs))
                .map(|(_, h1_active)| env.not(h1_active.clone()))
                .collect();
            if !conflicts.is_empty() {
                res.push(env.implies(h0_active.clone(), env.and(conflicts)))
            }
        }
        res
    }

    /// Constraints allowing at most one hint to be in a ranked phase at a time.
    ///
    /// For each hint `h` with a ranking function, yields `h.t_is_ranked or h.is_rank_decr =>
    /// o.t_is_stutter` for all the other hints `o`. Panics if some hints are not compiled.
    ///
    /// The constraints do not mention `active`, an inactive hint is in its inactive location
    /// where the transition type is stutter. `active` is only checked to have one predicate per
    /// hint, so that both arbitration functions take the same arguments.
    pub fn at_most_1_ranked(env: &Env, hints: &[Hint], active: &[Term]) -> Vec<Term> {
        assert_eq!(hints.len(), active.len(), "one activation predicate per hint expected");
        let encs: Vec<&Encoding> = hints.iter().map(Hint::compiled).collect();
        let mut res = vec![];
        for (idx, enc) in encs.iter().enumerate() {
            if enc.t_is_ranked().is_false() {
                continue;
            }
            debug_assert!(!enc.is_rank_decr().is_false());
            let others = encs
                .iter()
                .enumerate()
                .filter(|(o_idx, _)| *o_idx != idx)
                .map(|(_, o)| o.t_is_stutter().clone());
            res.push(env.implies(
                env.or(vec![enc.t_is_ranked().clone(), enc.is_rank_decr().clone()]),
                env.and(others),
            ))
        }
        res
    }

    /// Same hint in another environment, not compiled.
    pub fn to_env<'new>(&self, env: &'new Env) -> Hint<'new> {
        let import = |symbs: &Set<Symbol>| -> Set<Symbol> {
            symbs.iter().map(|sym| env.import_symbol(sym)).collect()
        };
        let mut res = Hint::new(
            env,
            self.name.clone(),
            import(&self.owned_symbs),
            import(&self.all_symbs),
        );
        res.set_locs(self.locs.iter().map(|loc| loc.to_env(env)).collect());
        res
    }
}

impl<'a, 'env> IntoIterator for &'a Hint<'env> {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;
    fn into_iter(self) -> Self::IntoIter {
        self.locs.iter()
    }
}

impl fmt::Display for Hint<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.name.fmt(fmt)
    }
}
