//! Term-building macros.

/// Imports this crate's prelude.
#[macro_export]
macro_rules! prelude {
    {} => { use $crate::prelude::*; };
    { pub } => { pub use $crate::prelude::*; };
}

/// Convenience macro, provides a DSL for writing terms in some environment.
///
/// - the first token is the environment, given as an identifier;
/// - symbols must be written as `(var_name: var_typ)`, without any quotes, and are declared on
///   the fly;
/// - next-state symbols are written `(var_name @ 1: var_typ)`;
/// - `>=` and `>` are rewritten as `<=` and `<` with swapped arguments.
///
/// ```rust
/// use hintsys::term::{self, Env};
/// let env = Env::new();
/// let t = term::build!(env, (and (>= (x: int) 0) (< (x @ 1: int) (+ (x: int) 3))));
/// assert_eq!(t.to_string(), "(and (<= 0 x) (< x' (+ x 3)))");
/// ```
#[macro_export]
macro_rules! build_term {
    (@op +) => ( $crate::term::Op::Add );
    (@op -) => ( $crate::term::Op::Sub );
    (@op *) => ( $crate::term::Op::Mul );
    (@op /) => ( $crate::term::Op::Div );
    (@op <=) => ( $crate::term::Op::Le );
    (@op <) => ( $crate::term::Op::Lt );
    (@op =) => ( $crate::term::Op::Eq );
    (@op =>) => ( $crate::term::Op::Implies );
    (@op not) => ( $crate::term::Op::Not );
    (@op and) => ( $crate::term::Op::And );
    (@op or) => ( $crate::term::Op::Or );
    (@op to_real) => ( $crate::term::Op::ToReal );

    ($env:ident, true) => ( $env.tru() );
    ($env:ident, false) => ( $env.fls() );

    ($env:ident, ($var:ident : $typ:ident)) => (
        $env.symbol(stringify!($var), $crate::build_typ!($typ))
    );
    ($env:ident, ($var:ident @ 0 : $typ:ident)) => (
        $env.symbol(stringify!($var), $crate::build_typ!($typ))
    );
    ($env:ident, ($var:ident @ 1 : $typ:ident)) => (
        $env.var(&$env.declare(stringify!($var), $crate::build_typ!($typ)).to_next())
    );

    ($env:ident, (- $cst:literal)) => ( $env.cst(-$cst) );
    ($env:ident, (>= $lft:tt $rgt:tt)) => (
        $env.ge($crate::build_term!($env, $lft), $crate::build_term!($env, $rgt))
    );
    ($env:ident, (> $lft:tt $rgt:tt)) => (
        $env.gt($crate::build_term!($env, $lft), $crate::build_term!($env, $rgt))
    );

    ($env:ident, ($op:tt $($args:tt)*)) => (
        $env.app(
            $crate::build_term!(@op $op),
            vec![ $($crate::build_term!($env, $args)),* ],
        )
    );

    ($env:ident, $cst:expr) => ( $env.cst($cst) );
}

/// Builds a type.
#[macro_export]
macro_rules! build_typ {
    (bool) => {
        $crate::term::Typ::Bool
    };
    (int) => {
        $crate::term::Typ::Int
    };
    (real) => {
        $crate::term::Typ::Real
    };
}
