//! Transition system fragments.
//!
//! A [`TransSystem`] is what a hint compiles to. It is composed of
//!
//! - the (current-state) symbols it introduces,
//! - a list of *initial* conjuncts, over current-state symbols, and
//! - a list of *transition* conjuncts, over current and next-state symbols.
//!
//! Fragments are meant to be conjoined with the main system and other fragments by the prover
//! driving them.

crate::prelude!();


/// A transition system fragment, see the [module-level documentation](self).
#[derive(Debug, Clone, Default)]
pub struct TransSystem {
    symbs: Set<Symbol>,
    init: Vec<Term>,
    trans: Vec<Term>,
}
impl TransSystem {
    /// Constructor.
    pub fn new(symbs: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            symbs: symbs.into_iter().collect(),
            init: vec![],
            trans: vec![],
        }
    }

    /// Adds an initial conjunct.
    pub fn add_init(&mut self, term: Term) {
        debug_assert!(term.free_vars().iter().all(|sym| !sym.is_next()));
        self.init.push(term)
    }
    /// Adds some initial conjuncts.
    pub fn ext_init(&mut self, terms: impl IntoIterator<Item = Term>) {
        for term in terms {
            self.add_init(term)
        }
    }
    /// Adds a transition conjunct.
    pub fn add_trans(&mut self, term: Term) {
        self.trans.push(term)
    }
    /// Adds some transition conjuncts.
    pub fn ext_trans(&mut self, terms: impl IntoIterator<Item = Term>) {
        self.trans.extend(terms)
    }

    /// Symbols introduced by the fragment.
    pub fn symbs(&self) -> &Set<Symbol> {
        &self.symbs
    }
    /// Initial conjuncts.
    pub fn init(&self) -> &[Term] {
        &self.init
    }
    /// Transition conjuncts.
    pub fn trans(&self) -> &[Term] {
        &self.trans
    }

    /// Conjunction of the initial conjuncts.
    pub fn init_term(&self, env: &Env) -> Term {
        env.and(self.init.iter().cloned())
    }
    /// Conjunction of the transition conjuncts.
    pub fn trans_term(&self, env: &Env) -> Term {
        env.and(self.trans.iter().cloned())
    }

    /// Symbol declarations, one per line.
    pub fn decls_to_ml_string(&self) -> String {
        self.symbs
            .iter()
            .map(|sym| format!("{}: {}", sym, sym.typ()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Pretty, multi-line string representation of the fragment.
    pub fn to_ml_string(&self) -> String {
        let mut s = String::new();
        s.push_str("decls {");
        for line in self.decls_to_ml_string().lines() {
            s.push_str("\n    ");
            s.push_str(line);
        }
        s.push_str("\n}");
        for (title, terms) in [("init", &self.init), ("trans", &self.trans)] {
            s.push('\n');
            s.push_str(title);
            s.push(':');
            for term in terms {
                s.push_str("\n    ");
                s.push_str(&term.to_string())
            }
        }
        s
    }
}
impl fmt::Display for TransSystem {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        self.to_ml_string().fmt(fmt)
    }
}
