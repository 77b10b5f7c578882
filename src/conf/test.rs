//! Tests over solver configuration.

use super::*;

#[test]
fn defaults() {
    let conf = Conf::default();
    assert_eq!(conf.cmd(), "z3");
    assert_eq!(conf.timeout(), Duration::from_secs(20));
    assert!(conf.tee().is_none());
    assert!(conf.to_smt_conf().is_ok());

    let conf = conf.with_tee("queries.smt2");
    assert_eq!(conf.tee(), Some(&PathBuf::from("queries.smt2")));
}

#[test]
fn illegal_command() {
    let conf = Conf::default().with_cmd("   ");
    let err = match conf.to_smt_conf() {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };
    assert_eq!(err.to_string(), "illegal z3 command `   `");
}
