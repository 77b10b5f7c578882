//! Hash-consed terms and the environments that own them.
//!
//! A [`Term`] lives in exactly one [`Env`]. Terms are hash-consed: building the same node twice in
//! the same environment yields the same term, so equality and hashing are by unique identifier.
//! The ordering of terms on the other hand is structural and total, which is what the normalizers
//! rely on to produce canonical output.
//!
//! # Examples
//!
//! ```rust
//! use hintsys::term::{Env, Typ};
//! let env = Env::new();
//! let x = env.symbol("x", Typ::Int);
//! let t1 = env.plus(vec![x.clone(), env.int(1)]);
//! let t2 = env.plus(vec![x, env.int(1)]);
//! assert_eq!(t1, t2);
//! assert_eq!(t1.uid(), t2.uid());
//! assert_eq!(&t1.to_string(), "(+ x 1)");
//! ```

crate::prelude!();

use std::{
    cell::{Cell, RefCell},
    cmp::Ordering,
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::atomic::{AtomicUsize, Ordering as AtomicOrdering},
};

use hashconsing::{HConsed, HConsign, HashConsign};
use rsmt2::print::{Expr2Smt, Sort2Smt, Sym2Smt};

pub mod distrib;
pub mod eval;

#[cfg(test)]
mod test;

pub use self::{
    distrib::Distributor,
    eval::{Model, SampledEquiv},
};
pub use crate::{build_term as build, build_typ};

/// A type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Typ {
    /// Bool type.
    Bool,
    /// Integer type.
    Int,
    /// Real type.
    Real,
}
impl Typ {
    /// True if the type is an arithmetic one.
    pub fn is_arith(self) -> bool {
        match self {
            Self::Bool => false,
            Self::Int | Self::Real => true,
        }
    }
}
impl Sort2Smt for Typ {
    fn sort_to_smt2<W: Write>(&self, w: &mut W) -> SmtRes<()> {
        write!(
            w,
            "{}",
            match self {
                Self::Bool => "Bool",
                Self::Int => "Int",
                Self::Real => "Real",
            }
        )?;
        Ok(())
    }
}

/// Trait implemented by everything that has a type.
pub trait HasTyp: fmt::Display {
    /// Type accessor.
    fn typ(&self) -> Typ;
}

/// Constants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cst {
    /// Bool constant.
    B(bool),
    /// Integer constant.
    I(Int),
    /// Real constant.
    R(Rat),
}
impl HasTyp for Cst {
    fn typ(&self) -> Typ {
        match self {
            Self::B(_) => Typ::Bool,
            Self::I(_) => Typ::Int,
            Self::R(_) => Typ::Real,
        }
    }
}
impl Cst {
    /// Creates a boolean constant.
    pub fn bool(b: bool) -> Self {
        Self::B(b)
    }
    /// Creates an integer constant.
    pub fn int(i: impl Into<Int>) -> Self {
        Self::I(i.into())
    }
    /// Creates a real constant.
    pub fn real(r: impl Into<Rat>) -> Self {
        Self::R(r.into())
    }

    /// Creates an arithmetic constant of some type from a rational.
    ///
    /// Panics if `typ` is not arithmetic, or if `typ` is `int` and `n` is not an integer.
    ///
    /// ```rust
    /// # use hintsys::{prelude::*, term::Cst};
    /// let two = Rat::from(Int::from(2));
    /// assert_eq!(Cst::num(Typ::Int, &two), Cst::int(2));
    /// assert_eq!(Cst::num(Typ::Real, &two), Cst::real(two.clone()));
    /// ```
    pub fn num(typ: Typ, n: &Rat) -> Self {
        match typ {
            Typ::Int => {
                assert!(n.is_integer(), "cannot build an integer out of `{}`", n);
                Self::I(n.to_integer())
            }
            Typ::Real => Self::R(n.clone()),
            Typ::Bool => panic!("cannot build a boolean out of `{}`", n),
        }
    }

    /// Rational value of an arithmetic constant.
    pub fn to_rat(&self) -> Option<Rat> {
        match self {
            Self::I(i) => Some(Rat::from(i.clone())),
            Self::R(r) => Some(r.clone()),
            Self::B(_) => None,
        }
    }
    /// Value of a boolean constant.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::B(b) => Some(*b),
            Self::I(_) | Self::R(_) => None,
        }
    }

    /// True if the constant is an arithmetic zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::I(i) => i.is_zero(),
            Self::R(r) => r.is_zero(),
            Self::B(_) => false,
        }
    }
    /// True if the constant is an arithmetic one.
    pub fn is_one(&self) -> bool {
        match self {
            Self::I(i) => i.is_one(),
            Self::R(r) => r.is_one(),
            Self::B(_) => false,
        }
    }
}
impl Expr2Smt<()> for Cst {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "{}", self)?;
        Ok(())
    }
}

/// Operators.
///
/// There is no `>=` or `>`: the [`Env::ge`] and [`Env::gt`] builders swap their arguments and
/// produce `<=` and `<` applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Negation.
    Not,
    /// Implication.
    Implies,
    /// Equality, also used for boolean equivalence.
    Eq,
    /// Less than or equal.
    Le,
    /// Strictly less than.
    Lt,
    /// Sum.
    Add,
    /// Binary subtraction.
    Sub,
    /// Product.
    Mul,
    /// Division, integer division on integers.
    Div,
    /// Integer to real conversion.
    ToReal,
}
impl Op {
    /// Minimal arity of `self`.
    pub fn min_arity(self) -> usize {
        match self {
            Self::Not | Self::ToReal => 1,
            Self::And
            | Self::Or
            | Self::Implies
            | Self::Eq
            | Self::Le
            | Self::Lt
            | Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div => 2,
        }
    }

    /// Maximal arity for `self`, `None` if infinite.
    pub fn max_arity(self) -> Option<usize> {
        match self {
            Self::Not | Self::ToReal => Some(1),
            Self::Implies | Self::Eq | Self::Le | Self::Lt | Self::Sub | Self::Div => Some(2),
            Self::And | Self::Or | Self::Add | Self::Mul => None,
        }
    }

    /// True if `self` is an arithmetic relation.
    pub fn is_arith_relation(self) -> bool {
        match self {
            Self::Le | Self::Lt => true,
            Self::And
            | Self::Or
            | Self::Not
            | Self::Implies
            | Self::Eq
            | Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::ToReal => false,
        }
    }

    /// SMT-LIB symbol of the operator, `arg_typ` is the type of the first argument.
    pub fn smt_str(self, arg_typ: Typ) -> &'static str {
        match self {
            Self::Div if arg_typ == Typ::Int => "div",
            Self::ToReal => "to_real",
            _ => self.str(),
        }
    }

    fn str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Implies => "=>",
            Self::Eq => "=",
            Self::Le => "<=",
            Self::Lt => "<",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::ToReal => "to_real",
        }
    }

    /// Type-checks an operator application.
    pub fn type_check(self, args: &[Term]) -> Res<Typ> {
        if args.len() < self.min_arity() {
            bail!(
                "`{}` expects at least {} argument(s)",
                self,
                self.min_arity(),
            )
        }
        if let Some(max) = self.max_arity() {
            if args.len() > max {
                bail!("`{}` expects at most {} argument(s)", self, max)
            }
        }
        let first = args[0].typ();

        let typ = match self {
            Self::And | Self::Or | Self::Not | Self::Implies => {
                if let Some(arg) = args.iter().find(|arg| arg.typ() != Typ::Bool) {
                    bail!(
                        "`{}`'s arguments must all be boolean, found `{}` of type `{}`",
                        self,
                        arg,
                        arg.typ(),
                    )
                }
                Typ::Bool
            }
            Self::ToReal => {
                if first != Typ::Int {
                    bail!("`{}` expects an integer argument, found `{}`", self, first)
                }
                Typ::Real
            }
            Self::Eq | Self::Le | Self::Lt | Self::Add | Self::Sub | Self::Mul | Self::Div => {
                if self != Self::Eq && !first.is_arith() {
                    bail!(
                        "`{}`'s arguments must have an arithmetic type, unexpected type `{}`",
                        self,
                        first,
                    )
                }
                for arg in &args[1..] {
                    if arg.typ() != first {
                        bail!(
                            "`{}`'s arguments must all have the same type, found `{}` and `{}`",
                            self,
                            first,
                            arg.typ(),
                        )
                    }
                }
                if self == Self::Eq || self.is_arith_relation() {
                    Typ::Bool
                } else {
                    first
                }
            }
        };

        Ok(typ)
    }
}

/// A symbol, *i.e.* a declared variable in its current or next state version.
///
/// Symbols are created by [`Env::declare`], which always yields current-state symbols. The
/// next-state version is obtained with [`Symbol::to_next`].
///
/// ```rust
/// # use hintsys::term::{Env, Typ};
/// let env = Env::new();
/// let x = env.declare("x", Typ::Int);
/// let x_next = x.to_next();
/// assert!(!x.is_next());
/// assert!(x_next.is_next());
/// assert_eq!(x_next.to_curr(), x);
/// assert_eq!(&x_next.to_string(), "x'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    id: Rc<str>,
    nxt: bool,
    typ: Typ,
}
impl Symbol {
    fn new(id: Rc<str>, typ: Typ, nxt: bool) -> Self {
        Self { id, nxt, typ }
    }

    /// Identifier accessor, does not depend on the state the symbol refers to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// True if the symbol is a next-state symbol.
    pub fn is_next(&self) -> bool {
        self.nxt
    }

    /// Next-state version of the symbol.
    pub fn to_next(&self) -> Self {
        Self::new(self.id.clone(), self.typ, true)
    }
    /// Current-state version of the symbol.
    pub fn to_curr(&self) -> Self {
        Self::new(self.id.clone(), self.typ, false)
    }
}
impl HasTyp for Symbol {
    fn typ(&self) -> Typ {
        self.typ
    }
}
impl Sym2Smt<()> for Symbol {
    fn sym_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "|{}@{}|", self.id, if self.nxt { 1 } else { 0 })?;
        Ok(())
    }
}

/// Term nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// A constant.
    Cst(Cst),
    /// A symbol.
    Var(Symbol),
    /// An operator application.
    App {
        /// The operator.
        op: Op,
        /// The arguments.
        args: Vec<Term>,
    },
}

/// What the consign of an environment stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TermData {
    env: usize,
    typ: Typ,
    node: Node,
}

/// A hash-consed term.
///
/// Cloning a term is cheap. Equality and hashing are by environment and hash-consing identifier,
/// see the [module-level documentation](self).
#[derive(Clone)]
pub struct Term {
    hc: HConsed<TermData>,
}
impl Term {
    /// Node of the term.
    pub fn node(&self) -> &Node {
        &self.hc.node
    }
    /// Unique identifier of the term in its environment.
    pub fn uid(&self) -> u64 {
        self.hc.uid()
    }
    /// Unique identifier of the environment the term lives in.
    pub fn env_uid(&self) -> usize {
        self.hc.env
    }

    /// Constant value, if any.
    pub fn cst(&self) -> Option<&Cst> {
        match self.node() {
            Node::Cst(cst) => Some(cst),
            Node::Var(_) | Node::App { .. } => None,
        }
    }
    /// True if the term is a constant.
    pub fn is_cst(&self) -> bool {
        self.cst().is_some()
    }
    /// True if the term is the `true` constant.
    pub fn is_true(&self) -> bool {
        self.cst() == Some(&Cst::B(true))
    }
    /// True if the term is the `false` constant.
    pub fn is_false(&self) -> bool {
        self.cst() == Some(&Cst::B(false))
    }
    /// True if the term is an arithmetic zero constant.
    pub fn is_zero(&self) -> bool {
        self.cst().map(Cst::is_zero).unwrap_or(false)
    }
    /// True if the term is an arithmetic one constant.
    pub fn is_one(&self) -> bool {
        self.cst().map(Cst::is_one).unwrap_or(false)
    }

    /// Symbol, if the term is one.
    pub fn sym(&self) -> Option<&Symbol> {
        match self.node() {
            Node::Var(sym) => Some(sym),
            Node::Cst(_) | Node::App { .. } => None,
        }
    }
    /// True if the term is a symbol.
    pub fn is_sym(&self) -> bool {
        self.sym().is_some()
    }

    /// Operator of the term, if it is an application.
    pub fn op(&self) -> Option<Op> {
        match self.node() {
            Node::App { op, .. } => Some(*op),
            Node::Cst(_) | Node::Var(_) => None,
        }
    }
    /// True if the term is an application of `op`.
    pub fn is_app_of(&self, op: Op) -> bool {
        self.op() == Some(op)
    }
    /// Arguments of the term, empty if it is not an application.
    pub fn args(&self) -> &[Term] {
        match self.node() {
            Node::App { args, .. } => args,
            Node::Cst(_) | Node::Var(_) => &[],
        }
    }

    /// Free symbols appearing in the term.
    ///
    /// ```rust
    /// # use hintsys::term::{self, Env};
    /// let env = Env::new();
    /// let t = term::build!(env, (and (<= (x: int) (y @ 1: int)) (b: bool)));
    /// let fvs: Vec<String> = t.free_vars().iter().map(|s| s.to_string()).collect();
    /// assert_eq!(fvs, vec!["b", "x", "y'"]);
    /// ```
    pub fn free_vars(&self) -> Set<Symbol> {
        let mut res = Set::new();
        let mut known = std::collections::HashSet::new();
        let mut stack = vec![self];
        while let Some(term) = stack.pop() {
            if !known.insert(term.uid()) {
                continue;
            }
            match term.node() {
                Node::Cst(_) => (),
                Node::Var(sym) => {
                    res.insert(sym.clone());
                }
                Node::App { args, .. } => stack.extend(args.iter()),
            }
        }
        res
    }

    /// True if the term mentions no symbol.
    pub fn is_ground(&self) -> bool {
        self.free_vars().is_empty()
    }
}
impl HasTyp for Term {
    fn typ(&self) -> Typ {
        self.hc.typ
    }
}
impl Expr2Smt<()> for Term {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        match self.node() {
            Node::Cst(cst) => cst.expr_to_smt2(w, ()),
            Node::Var(sym) => sym.sym_to_smt2(w, ()),
            Node::App { op, args } => {
                write!(w, "({}", op.smt_str(args[0].typ()))?;
                for arg in args {
                    write!(w, " ")?;
                    arg.expr_to_smt2(w, ())?
                }
                write!(w, ")")?;
                Ok(())
            }
        }
    }
}

/// Checks that two terms are equivalent.
///
/// The normalizers call the hook of their environment, if any, on their input and output when
/// compiled with debug assertions. See [`Env::set_equiv_hook`].
pub trait EquivHook {
    /// Checks that `lft` and `rgt` are equivalent, produces a description of the problem if not.
    fn check_equiv(&self, env: &Env, lft: &Term, rgt: &Term) -> Result<(), String>;
}

/// Environment counter, used to give each environment a unique identifier.
static ENV_COUNT: AtomicUsize = AtomicUsize::new(0);

/// An environment: hash-consing pool, symbol declarations and fresh-symbol generator.
///
/// All term construction goes through an environment. Building a term out of terms from another
/// environment is a logic error and panics, use [`Env::import`] to move terms around.
///
/// The pool is a [`HConsign`], which only keeps weak references to its terms: a term is freed
/// once nothing else refers to it, and building it again later yields a new identifier. Dead
/// entries stay in the table, an environment is meant for a bounded amount of work.
pub struct Env {
    uid: usize,
    pool: RefCell<HConsign<TermData>>,
    decls: RefCell<Map<Rc<str>, Typ>>,
    fresh: Cell<usize>,
    hook: RefCell<Option<Rc<dyn EquivHook>>>,
}
impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Debug for Env {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Env")
            .field("uid", &self.uid)
            .field("symbols", &self.decls.borrow().len())
            .finish()
    }
}

/// Basic construction functions.
impl Env {
    /// Constructor.
    pub fn new() -> Self {
        Self {
            uid: ENV_COUNT.fetch_add(1, AtomicOrdering::SeqCst),
            pool: RefCell::new(HConsign::empty()),
            decls: RefCell::new(Map::new()),
            fresh: Cell::new(0),
            hook: RefCell::new(None),
        }
    }

    /// Unique identifier of the environment.
    pub fn uid(&self) -> usize {
        self.uid
    }

    /// Panics if `term` does not live in this environment.
    pub fn check(&self, term: &Term) {
        assert!(
            term.env_uid() == self.uid,
            "term `{}` belongs to environment #{}, not #{}",
            term,
            term.env_uid(),
            self.uid,
        )
    }

    fn mk(&self, node: Node, typ: Typ) -> Term {
        let mut pool = self.pool.borrow_mut();
        let hc = pool.mk(TermData {
            env: self.uid,
            typ,
            node,
        });
        Term { hc }
    }

    /// Builds a constant.
    pub fn cst(&self, cst: impl Into<Cst>) -> Term {
        let cst = cst.into();
        let typ = cst.typ();
        self.mk(Node::Cst(cst), typ)
    }
    /// The `true` constant.
    pub fn tru(&self) -> Term {
        self.cst(true)
    }
    /// The `false` constant.
    pub fn fls(&self) -> Term {
        self.cst(false)
    }
    /// A boolean constant.
    pub fn bool(&self, b: bool) -> Term {
        self.cst(b)
    }
    /// An integer constant.
    pub fn int(&self, i: impl Into<Int>) -> Term {
        self.cst(Cst::int(i))
    }
    /// A real constant.
    pub fn real(&self, r: impl Into<Rat>) -> Term {
        self.cst(Cst::real(r))
    }
    /// An arithmetic constant of type `typ`, see [`Cst::num`].
    pub fn num(&self, typ: Typ, n: &Rat) -> Term {
        self.cst(Cst::num(typ, n))
    }

    /// Declares a symbol, yields its current-state version.
    ///
    /// Declaring the same identifier twice with the same type is fine and yields the same symbol.
    /// Panics if the identifier is already declared with a different type.
    pub fn declare(&self, id: impl AsRef<str>, typ: Typ) -> Symbol {
        let id = id.as_ref();
        let mut decls = self.decls.borrow_mut();
        if let Some((id, prev)) = decls.get_key_value(id) {
            assert!(
                *prev == typ,
                "symbol `{}` is already declared with type `{}`, cannot redeclare it as `{}`",
                id,
                prev,
                typ,
            );
            return Symbol::new(id.clone(), typ, false);
        }
        let id: Rc<str> = id.into();
        decls.insert(id.clone(), typ);
        Symbol::new(id, typ, false)
    }

    /// Type of a declared identifier.
    pub fn declared(&self, id: &str) -> Option<Typ> {
        self.decls.borrow().get(id).cloned()
    }

    /// Term for a declared symbol.
    pub fn var(&self, sym: &Symbol) -> Term {
        assert!(
            self.declared(sym.id()) == Some(sym.typ()),
            "symbol `{}: {}` is not declared in environment #{}",
            sym,
            sym.typ(),
            self.uid,
        );
        self.mk(Node::Var(sym.clone()), sym.typ())
    }

    /// Declares a symbol and yields its (current-state) term.
    pub fn symbol(&self, id: impl AsRef<str>, typ: Typ) -> Term {
        let sym = self.declare(id, typ);
        self.var(&sym)
    }

    /// Declares a fresh symbol, its identifier is `prefix` followed by a number.
    pub fn fresh(&self, prefix: &str, typ: Typ) -> Symbol {
        loop {
            let cnt = self.fresh.get();
            self.fresh.set(cnt + 1);
            let id = format!("{}{}", prefix, cnt);
            if self.declared(&id).is_none() {
                return self.declare(id, typ);
            }
        }
    }

    /// Builds an operator application.
    pub fn try_app(&self, op: Op, args: Vec<Term>) -> Res<Term> {
        for arg in &args {
            self.check(arg)
        }
        let typ = op.type_check(&args)?;
        Ok(self.mk(Node::App { op, args }, typ))
    }

    /// Builds an operator application, panics if the application is ill-typed.
    pub fn app(&self, op: Op, args: Vec<Term>) -> Term {
        match self.try_app(op, args) {
            Ok(term) => term,
            Err(e) => panic!("illegal operator application: {}", e),
        }
    }
}

/// Operator-specific construction functions.
impl Env {
    fn nary(&self, op: Op, args: impl IntoIterator<Item = Term>, empty: Option<Term>) -> Term {
        let mut args: Vec<Term> = args.into_iter().collect();
        match (args.len(), empty) {
            (0, Some(empty)) => empty,
            (1, _) => args.remove(0),
            _ => self.app(op, args),
        }
    }

    /// Conjunction, `true` if empty.
    pub fn and(&self, args: impl IntoIterator<Item = Term>) -> Term {
        self.nary(Op::And, args, Some(self.tru()))
    }
    /// Disjunction, `false` if empty.
    pub fn or(&self, args: impl IntoIterator<Item = Term>) -> Term {
        self.nary(Op::Or, args, Some(self.fls()))
    }
    /// Negation.
    pub fn not(&self, term: Term) -> Term {
        self.app(Op::Not, vec![term])
    }
    /// Implication.
    pub fn implies(&self, lhs: Term, rhs: Term) -> Term {
        self.app(Op::Implies, vec![lhs, rhs])
    }
    /// Boolean equivalence.
    pub fn iff(&self, lhs: Term, rhs: Term) -> Term {
        assert!(lhs.typ() == Typ::Bool, "`iff` expects boolean arguments");
        self.app(Op::Eq, vec![lhs, rhs])
    }
    /// Equality.
    pub fn eq(&self, lhs: Term, rhs: Term) -> Term {
        self.app(Op::Eq, vec![lhs, rhs])
    }
    /// Less than or equal.
    pub fn le(&self, lhs: Term, rhs: Term) -> Term {
        self.app(Op::Le, vec![lhs, rhs])
    }
    /// Strictly less than.
    pub fn lt(&self, lhs: Term, rhs: Term) -> Term {
        self.app(Op::Lt, vec![lhs, rhs])
    }
    /// Greater than or equal, produces `rhs <= lhs`.
    pub fn ge(&self, lhs: Term, rhs: Term) -> Term {
        self.le(rhs, lhs)
    }
    /// Strictly greater than, produces `rhs < lhs`.
    pub fn gt(&self, lhs: Term, rhs: Term) -> Term {
        self.lt(rhs, lhs)
    }
    /// Sum, panics if empty.
    pub fn plus(&self, args: impl IntoIterator<Item = Term>) -> Term {
        self.nary(Op::Add, args, None)
    }
    /// Subtraction.
    pub fn minus(&self, lhs: Term, rhs: Term) -> Term {
        self.app(Op::Sub, vec![lhs, rhs])
    }
    /// Product, panics if empty.
    pub fn times(&self, args: impl IntoIterator<Item = Term>) -> Term {
        self.nary(Op::Mul, args, None)
    }
    /// Division.
    pub fn div(&self, lhs: Term, rhs: Term) -> Term {
        self.app(Op::Div, vec![lhs, rhs])
    }
    /// Integer to real conversion.
    ///
    /// Identity on real terms, integer constants are converted directly.
    pub fn to_real(&self, term: Term) -> Term {
        match term.typ() {
            Typ::Real => term,
            Typ::Int => match term.cst() {
                Some(Cst::I(i)) => self.real(Rat::from(i.clone())),
                _ => self.app(Op::ToReal, vec![term]),
            },
            Typ::Bool => panic!("cannot convert boolean term `{}` to real", term),
        }
    }
}

/// Rewriting functions.
impl Env {
    /// Replaces sub-terms of `term` according to `map`, bottom-up.
    ///
    /// Replaced sub-terms are not traversed.
    pub fn substitute(&self, term: &Term, map: &HashMap<Term, Term>) -> Term {
        let mut memo = HashMap::new();
        self.substitute_memo(term, map, &mut memo)
    }
    fn substitute_memo(
        &self,
        term: &Term,
        map: &HashMap<Term, Term>,
        memo: &mut HashMap<Term, Term>,
    ) -> Term {
        if let Some(res) = map.get(term) {
            return res.clone();
        }
        if let Some(res) = memo.get(term) {
            return res.clone();
        }
        let res = match term.node() {
            Node::Cst(_) | Node::Var(_) => term.clone(),
            Node::App { op, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.substitute_memo(arg, map, memo))
                    .collect();
                self.app(*op, args)
            }
        };
        memo.insert(term.clone(), res.clone());
        res
    }

    /// Renames the (current-state) symbols of `symbs` to their next-state version in `term`.
    ///
    /// ```rust
    /// # use hintsys::{prelude::*, term};
    /// let env = Env::new();
    /// let t = term::build!(env, (<= (x: int) (+ (y: int) 1)));
    /// let x = env.declare("x", Typ::Int);
    /// let symbs: Set<Symbol> = vec![x].into_iter().collect();
    /// assert_eq!(&env.to_next(&t, &symbs).to_string(), "(<= x' (+ y 1))");
    /// ```
    pub fn to_next(&self, term: &Term, symbs: &Set<Symbol>) -> Term {
        let map: HashMap<Term, Term> = symbs
            .iter()
            .map(|sym| {
                assert!(
                    !sym.is_next(),
                    "cannot apply `to_next` on next-state symbol `{}`",
                    sym
                );
                (self.var(sym), self.var(&sym.to_next()))
            })
            .collect();
        self.substitute(term, &map)
    }

    /// Version of a symbol from another environment in this one, declares it if needed.
    pub fn import_symbol(&self, sym: &Symbol) -> Symbol {
        let curr = self.declare(sym.id(), sym.typ());
        if sym.is_next() {
            curr.to_next()
        } else {
            curr
        }
    }

    /// Rebuilds a term from another environment in this one.
    pub fn import(&self, term: &Term) -> Term {
        if term.env_uid() == self.uid {
            return term.clone();
        }
        let mut memo = HashMap::new();
        self.import_memo(term, &mut memo)
    }
    fn import_memo(&self, term: &Term, memo: &mut HashMap<Term, Term>) -> Term {
        if let Some(res) = memo.get(term) {
            return res.clone();
        }
        let res = match term.node() {
            Node::Cst(cst) => self.cst(cst.clone()),
            Node::Var(sym) => self.var(&self.import_symbol(sym)),
            Node::App { op, args } => {
                let args = args.iter().map(|arg| self.import_memo(arg, memo)).collect();
                self.app(*op, args)
            }
        };
        memo.insert(term.clone(), res.clone());
        res
    }

    /// Creates a fresh finite encoding of `n` values.
    ///
    /// Yields the fresh boolean symbols the encoding is over, and one term per value. The encoding
    /// is binary over `max(1, ceil(log2(n)))` symbols: value `j` is the conjunction of the literals
    /// of the bits of `j`, hence values are pairwise exclusive. If `n` is not a power of two some
    /// assignments of the symbols correspond to no value.
    ///
    /// ```rust
    /// # use hintsys::term::Env;
    /// let env = Env::new();
    /// let (symbs, vals) = env.new_enum("loc_", 3);
    /// assert_eq!(symbs.len(), 2);
    /// assert_eq!(vals.len(), 3);
    /// assert_eq!(&vals[1].to_string(), "(and loc_0 (not loc_1))");
    /// ```
    pub fn new_enum(&self, prefix: &str, n: usize) -> (Vec<Symbol>, Vec<Term>) {
        assert!(n > 0, "cannot create an empty enumeration");
        let mut bits = 1;
        while (1usize << bits) < n {
            bits += 1
        }
        let symbs: Vec<Symbol> = (0..bits).map(|_| self.fresh(prefix, Typ::Bool)).collect();
        let vals = (0..n)
            .map(|val| {
                self.and(symbs.iter().enumerate().map(|(bit, sym)| {
                    let lit = self.var(sym);
                    if (val >> bit) & 1 == 1 {
                        lit
                    } else {
                        self.not(lit)
                    }
                }))
            })
            .collect();
        trace!(prefix, n, bits, "new enumeration");
        (symbs, vals)
    }
}

/// Equivalence-checking hook.
impl Env {
    /// Sets the hook used to check the normalizers when debug assertions are on.
    pub fn set_equiv_hook(&self, hook: Rc<dyn EquivHook>) {
        *self.hook.borrow_mut() = Some(hook)
    }
    /// Removes the equivalence-checking hook.
    pub fn clear_equiv_hook(&self) {
        *self.hook.borrow_mut() = None
    }

    /// Checks `lft` and `rgt` are equivalent, only when debug assertions are on.
    ///
    /// Does nothing if no hook is set. Panics with `ctx` and the hook's explanation on failure.
    pub fn debug_check_equiv(&self, lft: &Term, rgt: &Term, ctx: impl FnOnce() -> String) {
        if !cfg!(debug_assertions) {
            return;
        }
        let hook = self.hook.borrow().clone();
        if let Some(hook) = hook {
            if let Err(e) = hook.check_equiv(self, lft, rgt) {
                panic!("{}: {}", ctx(), e)
            }
        }
    }
}

/// Packs basic trait implementations.
mod trait_impls {
    use super::*;

    /// Identifiers are only unique within a consign.
    impl PartialEq for Term {
        fn eq(&self, other: &Self) -> bool {
            self.hc.env == other.hc.env && self.hc == other.hc
        }
    }
    impl Eq for Term {}
    impl Hash for Term {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.hc.env.hash(state);
            self.hc.hash(state);
        }
    }

    impl PartialOrd for Term {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }
    /// Structural order: constants, then symbols, then applications.
    impl Ord for Term {
        fn cmp(&self, other: &Self) -> Ordering {
            if self == other {
                return Ordering::Equal;
            }
            self.env_uid()
                .cmp(&other.env_uid())
                .then_with(|| match (self.node(), other.node()) {
                    (Node::Cst(c1), Node::Cst(c2)) => c1.cmp(c2),
                    (Node::Cst(_), _) => Ordering::Less,
                    (_, Node::Cst(_)) => Ordering::Greater,
                    (Node::Var(s1), Node::Var(s2)) => s1.cmp(s2),
                    (Node::Var(_), _) => Ordering::Less,
                    (_, Node::Var(_)) => Ordering::Greater,
                    (
                        Node::App { op: o1, args: a1 },
                        Node::App { op: o2, args: a2 },
                    ) => o1.cmp(o2).then_with(|| a1.cmp(a2)),
                })
        }
    }

    impl fmt::Display for Typ {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Bool => write!(fmt, "bool"),
                Self::Int => write!(fmt, "int"),
                Self::Real => write!(fmt, "real"),
            }
        }
    }

    impl fmt::Display for Op {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            self.str().fmt(fmt)
        }
    }

    impl fmt::Display for Cst {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::B(b) => b.fmt(fmt),
                Self::I(i) => {
                    if i.sign() == Sign::Minus {
                        write!(fmt, "(- {})", -i)
                    } else {
                        i.fmt(fmt)
                    }
                }
                Self::R(r) => {
                    let (num, den) = (r.numer(), r.denom());
                    match (num.sign(), den.is_one()) {
                        (Sign::Minus, true) => write!(fmt, "(- {}.0)", -num),
                        (Sign::Minus, false) => write!(fmt, "(- (/ {} {}))", -num, den),
                        (_, true) => write!(fmt, "{}.0", num),
                        (_, false) => write!(fmt, "(/ {} {})", num, den),
                    }
                }
            }
        }
    }
    impl From<bool> for Cst {
        fn from(b: bool) -> Self {
            Self::B(b)
        }
    }
    impl From<Int> for Cst {
        fn from(i: Int) -> Self {
            Self::I(i)
        }
    }
    impl From<i32> for Cst {
        fn from(n: i32) -> Self {
            Self::I(n.into())
        }
    }
    impl From<i64> for Cst {
        fn from(n: i64) -> Self {
            Self::I(n.into())
        }
    }
    impl From<usize> for Cst {
        fn from(n: usize) -> Self {
            Self::I(n.into())
        }
    }
    impl From<(i64, i64)> for Cst {
        fn from((num, den): (i64, i64)) -> Self {
            Rat::new(num.into(), den.into()).into()
        }
    }
    impl From<Rat> for Cst {
        fn from(r: Rat) -> Self {
            Self::R(r)
        }
    }

    impl fmt::Display for Symbol {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "{}{}", self.id, if self.nxt { "'" } else { "" })
        }
    }

    impl fmt::Display for Term {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self.node() {
                Node::Cst(cst) => cst.fmt(fmt),
                Node::Var(sym) => sym.fmt(fmt),
                Node::App { op, args } => {
                    write!(fmt, "({}", op)?;
                    for arg in args {
                        write!(fmt, " {}", arg)?
                    }
                    write!(fmt, ")")
                }
            }
        }
    }
    impl fmt::Debug for Term {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            fmt::Display::fmt(self, fmt)
        }
    }
}
