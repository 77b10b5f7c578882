//! Tests over terms and environments.

use super::*;

use crate::term::eval::enumerate;

fn smt(term: &Term) -> String {
    let mut buf: Vec<u8> = vec![];
    term.expr_to_smt2(&mut buf, ()).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn hash_consing() {
    let env = Env::new();
    let t1 = build!(env, (and (<= (x: int) 7) (b: bool)));
    let t2 = build!(env, (and (<= (x: int) 7) (b: bool)));
    assert_eq!(t1, t2);
    assert_eq!(t1.uid(), t2.uid());
    assert_eq!(t1.args()[0].uid(), t2.args()[0].uid());

    let other = Env::new();
    let t3 = build!(other, (and (<= (x: int) 7) (b: bool)));
    assert_ne!(t1, t3);
    assert_eq!(t1.to_string(), t3.to_string());
    assert_ne!(t1.env_uid(), t3.env_uid());
}

#[test]
fn dead_terms_are_freed() {
    let env = Env::new();
    let x = env.symbol("x", Typ::Int);
    let t = env.plus(vec![x.clone(), env.int(41)]);
    let (uid, arg_uid) = (t.uid(), t.args()[0].uid());
    drop(t);
    let t = env.plus(vec![x, env.int(41)]);
    assert_ne!(t.uid(), uid);
    // `x` is still alive, it keeps its identifier
    assert_eq!(t.args()[0].uid(), arg_uid);
}

#[test]
fn identifiers_are_per_environment() {
    let env = Env::new();
    let other = Env::new();
    let t1 = env.int(7);
    let t2 = other.int(7);
    // first term of both consigns
    assert_eq!(t1.uid(), t2.uid());
    assert_ne!(t1, t2);
    let set: std::collections::HashSet<Term> = vec![t1.clone(), t2, env.int(7)].into_iter().collect();
    assert_eq!(set.len(), 2);
    assert!(set.contains(&t1));
}

#[test]
#[should_panic]
fn foreign_terms() {
    let env = Env::new();
    let other = Env::new();
    let x = other.symbol("x", Typ::Int);
    let _ = env.plus(vec![x, env.int(1)]);
}

#[test]
fn structural_order() {
    let env = Env::new();
    let app = build!(env, (+ (a: int) 1));
    let var = env.symbol("z", Typ::Int);
    let cst = env.int(100);
    let mut terms = vec![app.clone(), var.clone(), cst.clone()];
    terms.sort();
    assert_eq!(terms, vec![cst, var, app]);

    let (a, b) = (env.symbol("a", Typ::Int), env.symbol("b", Typ::Int));
    assert!(a < b);
    let a_next = env.var(&env.declare("a", Typ::Int).to_next());
    assert!(a < a_next);
    assert!(a_next < b);
    assert!(build!(env, (+ (a: int) 1)) < build!(env, (+ (b: int) 1)));
    assert!(build!(env, (+ (b: int) 1)) < build!(env, (* (a: int) 1)));
}

#[test]
fn typing_errors() {
    let env = Env::new();
    let (x, r, b) = (
        env.symbol("x", Typ::Int),
        env.symbol("r", Typ::Real),
        env.symbol("b", Typ::Bool),
    );

    let err = env.try_app(Op::Add, vec![b.clone(), b.clone()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "`+`'s arguments must have an arithmetic type, unexpected type `bool`",
    );

    let err = env.try_app(Op::Le, vec![x.clone(), r.clone()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "`<=`'s arguments must all have the same type, found `int` and `real`",
    );

    let err = env.try_app(Op::Not, vec![]).unwrap_err();
    assert_eq!(err.to_string(), "`not` expects at least 1 argument(s)");

    let err = env.try_app(Op::Sub, vec![x.clone(), x.clone(), x.clone()]).unwrap_err();
    assert_eq!(err.to_string(), "`-` expects at most 2 argument(s)");

    let err = env.try_app(Op::ToReal, vec![r.clone()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "`to_real` expects an integer argument, found `real`",
    );

    let err = env.try_app(Op::And, vec![b.clone(), x.clone()]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "`and`'s arguments must all be boolean, found `x` of type `int`",
    );

    let eq = env.try_app(Op::Eq, vec![b.clone(), b]).unwrap();
    assert_eq!(eq.typ(), Typ::Bool);
    let real = env.try_app(Op::ToReal, vec![x]).unwrap();
    assert_eq!(real.typ(), Typ::Real);
}

#[test]
fn declarations() {
    let env = Env::new();
    let x1 = env.declare("x", Typ::Int);
    let x2 = env.declare("x", Typ::Int);
    assert_eq!(x1, x2);
    assert_eq!(env.declared("x"), Some(Typ::Int));
    assert_eq!(env.declared("y"), None);

    let v0 = env.fresh("v", Typ::Bool);
    assert_eq!(v0.id(), "v0");
    let _ = env.declare("v1", Typ::Int);
    let v2 = env.fresh("v", Typ::Bool);
    assert_eq!(v2.id(), "v2");
}

#[test]
#[should_panic]
fn redeclaration() {
    let env = Env::new();
    let _ = env.declare("x", Typ::Int);
    let _ = env.declare("x", Typ::Real);
}

#[test]
fn next_state() {
    let env = Env::new();
    let t = build!(env, (and (<= (x: int) (y: int)) (b: bool)));
    let symbs: Set<Symbol> = vec![env.declare("x", Typ::Int), env.declare("b", Typ::Bool)]
        .into_iter()
        .collect();
    let next = env.to_next(&t, &symbs);
    assert_eq!(&next.to_string(), "(and (<= x' y) b')");
    assert_eq!(&smt(&next), "(and (<= |x@1| |y@0|) |b@1|)");
    let fvs: Vec<String> = next.free_vars().iter().map(Symbol::to_string).collect();
    assert_eq!(fvs, vec!["b'", "x'", "y"]);
}

#[test]
fn substitution() {
    let env = Env::new();
    let t = build!(env, (+ (* (x: int) 2) (* (x: int) (y: int))));
    let x = env.symbol("x", Typ::Int);
    let map: HashMap<Term, Term> = vec![
        (x, build!(env, (+ (z: int) 1))),
        (build!(env, (* (x: int) 2)), env.int(0)),
    ]
    .into_iter()
    .collect();
    let res = env.substitute(&t, &map);
    assert_eq!(&res.to_string(), "(+ 0 (* (+ z 1) y))");
}

#[test]
fn smt_printing() {
    let env = Env::new();
    let t = build!(env, (<= (/ (x: int) 2) (- (y @ 1: int) (- 3))));
    assert_eq!(&t.to_string(), "(<= (/ x 2) (- y' (- 3)))");
    assert_eq!(&smt(&t), "(<= (div |x@0| 2) (- |y@1| (- 3)))");

    let r = build!(env, (/ (r: real) (to_real (x: int))));
    assert_eq!(&smt(&r), "(/ |r@0| (to_real |x@0|))");
}

#[test]
fn constants() {
    let env = Env::new();
    assert_eq!(&env.int(-3).to_string(), "(- 3)");
    assert_eq!(&env.int(3).to_string(), "3");
    let rat = |num: i64, den: i64| env.real(Rat::new(num.into(), den.into()));
    assert_eq!(&rat(3, 2).to_string(), "(/ 3 2)");
    assert_eq!(&rat(-1, 2).to_string(), "(- (/ 1 2))");
    assert_eq!(&rat(-4, 2).to_string(), "(- 2.0)");
    assert_eq!(&rat(0, 5).to_string(), "0.0");
    assert!(rat(2, 2).is_one());
    assert!(env.int(0).is_zero());
    assert!(!env.tru().is_zero());
    assert_eq!(env.to_real(env.int(5)), rat(5, 1));
}

#[test]
fn enumerations() {
    for n in 1..=9 {
        let env = Env::new();
        let (symbs, vals) = env.new_enum("e_", n);
        assert_eq!(vals.len(), n);
        assert_eq!(symbs.len(), std::cmp::max(1, (n as f64).log2().ceil() as usize));
        assert!(symbs.iter().all(|sym| sym.typ() == Typ::Bool));

        let symbs: Set<Symbol> = symbs.into_iter().collect();
        let models = enumerate(&symbs, &[]);
        assert_eq!(models.len(), 1 << symbs.len());
        for val in &vals {
            assert!(models.iter().any(|model| val.eval(model) == Some(Cst::B(true))));
        }
        for model in &models {
            let count = vals
                .iter()
                .filter(|val| val.eval(model) == Some(Cst::B(true)))
                .count();
            assert!(count <= 1);
        }
    }
}

#[test]
fn import() {
    let src = Env::new();
    let t = build!(src, (and (= (x @ 1: int) (+ (x: int) 1)) (b: bool)));
    let tgt = Env::new();
    let imported = tgt.import(&t);
    assert_eq!(imported.env_uid(), tgt.uid());
    assert_eq!(imported.to_string(), t.to_string());
    assert_eq!(tgt.declared("x"), Some(Typ::Int));
    assert_eq!(tgt.declared("b"), Some(Typ::Bool));
    assert_eq!(tgt.import(&imported), imported);
    assert_eq!(imported, build!(tgt, (and (= (x @ 1: int) (+ (x: int) 1)) (b: bool))));
}

#[test]
fn evaluation() {
    let env = Env::new();
    let (x, y) = (env.declare("x", Typ::Int), env.declare("y", Typ::Int));
    let div = build!(env, (/ (x: int) (y: int)));
    let mut model = Model::new();
    for (num, den, res) in [(-7, 2, -4), (7, -2, -3), (-7, -2, 4), (7, 2, 3)] {
        model.insert(x.clone(), Cst::int(num));
        model.insert(y.clone(), Cst::int(den));
        assert_eq!(div.eval(&model), Some(Cst::int(res)), "{} / {}", num, den);
    }
    model.insert(y.clone(), Cst::int(0));
    assert_eq!(div.eval(&model), None);

    let t = build!(env, (=> (< (x: int) (y: int)) (not (b: bool))));
    model.insert(y, Cst::int(8));
    assert_eq!(t.eval(&model), None);
    model.insert(env.declare("b", Typ::Bool), Cst::B(true));
    assert_eq!(t.eval(&model), Some(Cst::B(false)));

    let r = env.div(env.to_real(env.var(&x)), env.real(Rat::from(Int::from(2))));
    assert_eq!(r.eval(&model), Some(Cst::real(Rat::new(7.into(), 2.into()))));

    assert_eq!(env.simplify_cst(&build!(env, (* 2 (+ 3 1)))), Cst::int(8));
}

#[test]
fn ground_folding_errors() {
    let env = Env::new();
    let t = build!(env, (- 2 (/ 1 0)));
    match env.try_simplify_cst(&t) {
        Err(e) => match e.kind() {
            ErrorKind::DivisionByZero(term) => assert_eq!(term, "(- 2 (/ 1 0))"),
            kind => panic!("unexpected error kind: {}", kind),
        },
        Ok(cst) => panic!("folded `{}` to {}", t, cst),
    }
    assert_eq!(
        &env.try_simplify_cst(&t).unwrap_err().to_string(),
        "division by zero in `(- 2 (/ 1 0))`",
    );
    assert!(env.try_simplify_cst(&build!(env, (+ (x: int) 1))).is_err());
}

#[test]
#[should_panic(expected = "division by zero in `(/ ")]
fn ground_division_by_zero() {
    let env = Env::new();
    let t = env.div(env.real(Rat::one()), env.real(Rat::zero()));
    let _ = env.simplify_cst(&t);
}

#[test]
fn distribution() {
    let env = Env::new();
    let td = Distributor::new(&env);
    let t = build!(env, (* (+ (x: int) 1) (- (y: int) 2)));
    assert_eq!(
        &td.distribute(&t).to_string(),
        "(+ (* x y) (* x (- 1) 2) (* 1 y) (* 1 (- 1) 2))",
    );
    let t = build!(env, (to_real (+ (x: int) (* 2 (y: int)))));
    assert_eq!(
        &td.distribute(&t).to_string(),
        "(+ (to_real x) (* 2.0 (to_real y)))",
    );
    let t = build!(env, (/ (* 2 (+ (x: int) 1)) 3));
    assert_eq!(&td.distribute(&t).to_string(), "(/ (+ (* 2 x) (* 2 1)) 3)");
}

#[test]
fn sampled_equivalence() {
    let env = Env::new();
    let hook = SampledEquiv::default();
    let lft = build!(env, (+ (x: int) (x: int)));
    let rgt = build!(env, (* 2 (x: int)));
    assert_eq!(hook.counterexample(&lft, &rgt), None);
    assert!(hook.check_equiv(&env, &lft, &rgt).is_ok());

    let rgt = build!(env, (+ (x: int) 1));
    assert!(hook.counterexample(&lft, &rgt).is_some());
    assert!(hook.check_equiv(&env, &lft, &rgt).is_err());

    // too many symbols to enumerate, sampling finds the counterexample anyway
    let lft = build!(env, (+ (a: real) (b: real) (c: real) (d: real)));
    let rgt = build!(env, (+ (a: real) (b: real) (c: real)));
    assert!(hook.counterexample(&lft, &rgt).is_some());
}

#[test]
fn seeded_sampling() {
    let env = Env::new();
    let lft = build!(env, (+ (a: real) (b: real) (c: real) (d: real)));
    let rgt = build!(env, (+ (a: real) (b: real) (c: real)));
    let hook = SampledEquiv::new(64);
    let cex = hook.counterexample(&lft, &rgt);
    assert!(cex.is_some());
    assert_eq!(cex, hook.counterexample(&lft, &rgt));

    for seed in 0..8 {
        let cex = SampledEquiv::new(64)
            .with_seed(seed)
            .counterexample(&lft, &rgt)
            .expect("sampling should find a counterexample");
        assert_eq!(cex.len(), 4);
        let d = env.declare("d", Typ::Real);
        assert_ne!(cex[&d].to_rat(), Some(Rat::zero()));
    }
}

struct Refuse;
impl EquivHook for Refuse {
    fn check_equiv(&self, _: &Env, _: &Term, _: &Term) -> Result<(), String> {
        Err("refused".into())
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "normalizing: refused")]
fn failing_hook() {
    let env = Env::new();
    env.set_equiv_hook(Rc::new(Refuse));
    let t = env.tru();
    env.debug_check_equiv(&t, &t, || "normalizing".into());
}

#[test]
fn cleared_hook() {
    let env = Env::new();
    env.set_equiv_hook(Rc::new(Refuse));
    env.clear_equiv_hook();
    let t = env.tru();
    env.debug_check_equiv(&t, &t, || "normalizing".into());
}
