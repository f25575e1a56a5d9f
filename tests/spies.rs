// Spies injected into code under test, asserted through the spy family.

use predicates::prelude::*;
use verity::prelude::*;

/// Code under test: notifies every recipient and reports how many succeeded.
fn broadcast(send: &Callable, recipients: &[&str]) -> Outcome<Value> {
    let mut delivered = 0;
    for recipient in recipients {
        match send.call(&args![*recipient; urgent = false]) {
            Ok(_) => delivered += 1,
            Err(e) if e.is_instance_of(&KEY_ERROR) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(Value::from(delivered))
}

#[test]
fn matches_calls_with_keyword_arguments() {
    let r = ExpectationRegistry::with_defaults();
    let send = Spy::new("send");
    broadcast(&send.as_callable(), &["ada", "grace"]).unwrap();

    r.expect(&send)
        .to_have_been_called_with(args!["ada"; urgent = false])
        .unwrap();
    r.expect(&send)
        .not()
        .to_have_been_called_with(args!["ada"; urgent = true])
        .unwrap();
    r.expect(&send)
        .not()
        .to_have_been_called_with(args!["ada"])
        .unwrap();
}

#[test]
fn call_number_failures_name_the_call() {
    let r = ExpectationRegistry::with_defaults();
    let send = Spy::new("send");
    broadcast(&send.as_callable(), &["ada", "grace"]).unwrap();

    let err = r
        .expect(&send)
        .for_call_number(1)
        .to_have_been_called_with(args![3])
        .unwrap_err();
    assert!(predicate::str::contains("1st call").eval(err.message()));
    assert!(err.message().contains("but the 1st call was made with (\"ada\", urgent=false)"));

    r.expect(&send)
        .for_call_number(2)
        .to_have_been_called_with(args!["grace"; urgent = false])
        .unwrap();

    let err = r
        .expect(&send)
        .for_call_number(3)
        .to_have_been_called_with(args!["x"])
        .unwrap_err();
    assert!(err.message().contains("on its 3rd call, but it was only called twice"));

    r.expect(&send).for_call_number(2).to_have_been_called().unwrap();
    r.expect(&send).for_call_number(3).not().to_have_been_called().unwrap();
}

#[test]
fn call_number_zero_is_rejected() {
    let r = ExpectationRegistry::with_defaults();
    let send = Spy::new("send");
    let err = r
        .expect(&send)
        .for_call_number(0)
        .not()
        .to_have_been_called()
        .unwrap_err();
    assert!(err.is_instance_of(&VALUE_ERROR));
}

#[test]
fn counting_assertions_chain_into_times() {
    let r = ExpectationRegistry::with_defaults();
    let send = Spy::new("send");
    broadcast(&send.as_callable(), &["a", "b", "c"]).unwrap();

    r.expect(&send).to_have_been_called_exactly(3).unwrap().times();
    r.expect(&send).to_have_been_called_at_least(1).unwrap().time();
    r.expect(&send).to_have_been_called_at_most(3).unwrap().times();
    r.expect(&send).not().to_have_been_called_at_most(2).unwrap();

    let err = r.expect(&send).to_have_been_called_exactly(1).unwrap_err();
    assert_eq!(
        err.message(),
        "Expected <spy send> to have been called exactly once, but it was called 3 times"
    );

    let quiet = Spy::new("quiet");
    let err = r.expect(&quiet).to_have_been_called().unwrap_err();
    assert_eq!(
        err.message(),
        "Expected <spy quiet> to have been called, but it was called 0 times"
    );
}

#[test]
fn behaviours_drive_the_code_under_test() {
    let send = Spy::new("send");
    send.and_raise(&KEY_ERROR, "unknown recipient");
    assert_eq!(
        broadcast(&send.as_callable(), &["x", "y"]).unwrap(),
        Value::from(0)
    );

    send.and_raise(&VALUE_ERROR, "down");
    let err = broadcast(&send.as_callable(), &["x"]).unwrap_err();
    assert_eq!(err.message(), "down");

    send.and_return("ok");
    assert_eq!(
        broadcast(&send.as_callable(), &["x"]).unwrap(),
        Value::from(1)
    );
    assert_eq!(send.call_count(), 4);
}

#[test]
fn call_through_reaches_the_real_implementation() {
    let r = ExpectationRegistry::with_defaults();
    let real = Callable::new("len", |args| {
        let n = args.positional.first().and_then(Value::len).unwrap_or(0);
        Ok(Value::from(n))
    });
    let spy = Spy::on("len", real);
    assert_eq!(spy.call(args!["abc"]).unwrap(), Value::Nil);
    spy.and_call_through().unwrap();
    assert_eq!(spy.call(args!["abc"]).unwrap(), Value::from(3));
    r.expect(&spy).to_have_been_called_exactly(2).unwrap();
}

#[test]
fn raising_spies_satisfy_to_raise() {
    let r = ExpectationRegistry::with_defaults();
    let spy = Spy::new("explode");
    spy.and_raise(&KEY_ERROR, "gone");
    r.expect(&spy).to_raise(&KEY_ERROR).unwrap();
    r.expect(&spy).to_have_been_called_exactly(1).unwrap();
}
