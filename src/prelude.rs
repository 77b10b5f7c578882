//! Common imports throughout this project.

pub use std::{
    collections::{BTreeMap as Map, BTreeSet as Set},
    fmt,
    io::Write,
    ops::{Deref, DerefMut},
    rc::Rc,
};

pub use error_chain::bail;
pub use num::{bigint::Sign, BigInt as Int, BigRational as Rat, Integer, One, Signed, Zero};
pub use rsmt2::SmtRes;
pub use tracing::{debug, trace, warn};

pub use crate::{
    assign, check, conf, hint, ineq, lin, oracle, rank,
    term::{self, Cst, Env, HasTyp, Node, Op, Symbol, Term, Typ},
    trans,
};

error_chain::error_chain! {
    types {
        Error, ErrorKind, ResExt, Res;
    }

    links {
        Smt2(rsmt2::errors::Error, rsmt2::errors::ErrorKind)
        /// An error from the `rsmt2` crate.
        ;
    }

    foreign_links {
        Io(std::io::Error)
        /// I/O error.
        ;
    }

    errors {
        /// A ground term divides by zero.
        DivisionByZero(term: String) {
            description("division by zero")
            display("division by zero in `{}`", term)
        }
        /// The solver answered something the checkers cannot interpret.
        SolverAnswer(msg: String) {
            description("unexpected solver answer")
            display("unexpected solver answer: {}", msg)
        }
    }
}
