//! Activable hint automata over SMT terms, and the linear normalizers they rely on.
//!
//! A [*hint*](hint::Hint) is a small automaton whose [locations](hint::Location) describe how a
//! subset of the state variables of a system can evolve: by *stuttering*, by taking a *ranked*
//! step that decreases a [ranking function](rank::RankFun), or by *progressing* to another
//! location. A hint compiles to an *activable* [transition system](trans::TransSystem): when its
//! activation flag is false it does not constrain anything, so that a prover can compose many
//! hints with a main system and let the solver pick which ones to follow.
//!
//! The normalizers turn arbitrary linear arithmetic [terms](term::Term) into canonical forms:
//!
//! - [`lin::LinExpr`]: a map from monomials to rational coefficients;
//! - [`ineq::Ineq`]: `sum of coef * monomial OP constant` with `OP` one of `=`, `<=`, `<`;
//! - [`assign::eq2assign`]: solves an equality for one of its symbols.
//!
//! Correctness of a hint can be checked against an SMT [oracle](oracle::Oracle), see
//! [`check::Checker`].

#![warn(missing_docs)]

pub extern crate rsmt2;

mod macros;

pub mod prelude;

pub mod assign;
pub mod check;
pub mod conf;
pub mod hint;
pub mod ineq;
pub mod lin;
pub mod oracle;
pub mod rank;
pub mod term;
pub mod trans;
