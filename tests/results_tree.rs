// Bookkeeping of the hierarchical result tree.

use verity::results::{TestResults, AFTER_CLASS, BEFORE_CLASS};
use verity::ResultsError;

fn assert_invariant(node: &TestResults) {
    assert_eq!(
        node.count_tests(),
        node.count_passes() + node.count_failures() + node.count_errors() + node.count_ignored(),
        "invariant broken at {}",
        node.name()
    );
    node.children().iter().for_each(assert_invariant);
}

fn run(results: &mut TestResults, suite: &str, test: &str, outcome: &str) {
    results.register_test_started(suite, test);
    let finished = match outcome {
        "pass" => results.register_test_passed(suite, test),
        "fail" => results.register_test_failed(suite, test, format!("{} failed", test)),
        "error" => results.register_test_error(suite, test, format!("{} broke", test)),
        _ => results.register_test_ignored(suite, test),
    };
    finished.unwrap();
}

#[test]
fn parents_roll_up_every_descendant() {
    let mut root = TestResults::new();
    run(&mut root, "top", "t0", "pass");

    root.register_suite_started("a");
    run(&mut root, "a", "t1", "fail");
    root.register_suite_started("a.b");
    run(&mut root, "a.b", "t2", "error");
    run(&mut root, "a.b", "t3", "skip");
    root.register_suite_completed("a.b").unwrap();
    run(&mut root, "a", "t4", "pass");
    root.register_suite_completed("a").unwrap();

    root.register_suite_started("c");
    run(&mut root, "c", "t5", "pass");
    root.register_suite_completed("c").unwrap();

    assert_eq!(root.count_tests(), 6);
    assert_eq!(root.count_passes(), 3);
    assert_eq!(root.count_failures(), 1);
    assert_eq!(root.count_errors(), 1);
    assert_eq!(root.count_ignored(), 1);
    assert_invariant(&root);

    let a = &root.children()[0];
    assert_eq!(a.name(), "a");
    assert_eq!(a.count_tests(), 4);
    assert_eq!(a.records().len(), 2);
    assert_eq!(a.children()[0].count_tests(), 2);
    assert_eq!(root.active_depth(), 0);
}

#[test]
fn traces_are_listed_in_suite_order() {
    let mut root = TestResults::new();
    root.register_suite_started("first");
    run(&mut root, "first", "x", "fail");
    root.register_suite_completed("first").unwrap();
    root.register_suite_started("second");
    run(&mut root, "second", "y", "error");
    root.register_suite_completed("second").unwrap();

    let summary = root.summary();
    let x = summary.find("FAIL: first.x").unwrap();
    let y = summary.find("ERROR: second.y").unwrap();
    assert!(x < y);
    assert!(summary.contains("x failed"));
    assert!(summary.contains("Ran 2 tests in"));
    assert!(summary.contains("FAILED (1 failure, 1 error)"));
    assert!(!root.was_successful());
}

#[test]
fn returned_child_and_parent_routing_agree() {
    let mut root = TestResults::new();
    {
        let child = root.register_suite_started("direct");
        run(child, "direct", "a", "pass");
        run(child, "direct", "b", "fail");
    }
    run(&mut root, "direct", "c", "pass");
    root.register_suite_completed("direct").unwrap();

    let child = &root.children()[0];
    assert_eq!(child.count_tests(), 3);
    assert_eq!(child.records().len(), 3);
    assert_eq!(root.records().len(), 0);
    assert_invariant(&root);
}

#[test]
fn suite_hook_phases_bypass_the_start_check() {
    let mut root = TestResults::new();
    root.register_suite_started("s");
    root.register_test_error("s", BEFORE_CLASS, "setup").unwrap();
    root.register_test_error("s", AFTER_CLASS, "teardown").unwrap();
    assert_eq!(
        root.register_test_error("s", "regular", "x").unwrap_err(),
        ResultsError::NotStarted {
            suite: "s".into(),
            test: "regular".into()
        }
    );
    root.register_suite_completed("s").unwrap();
    assert_eq!(root.count_errors(), 2);
    assert_invariant(&root);
}

#[test]
fn state_description_tracks_the_active_scope() {
    let mut root = TestResults::new();
    root.register_suite_started("bad");
    run(&mut root, "bad", "e", "error");
    root.register_suite_completed("bad").unwrap();

    root.register_suite_started("good");
    run(&mut root, "good", "p", "pass");
    assert_eq!(root.state_description(), "passed");
    root.register_suite_completed("good").unwrap();

    assert_eq!(root.state_description(), "error");
}

#[test]
fn durations_and_reports() {
    let mut root = TestResults::new();
    root.register_suite_started("s");
    run(&mut root, "s", "a", "pass");
    run(&mut root, "s", "b", "skip");
    root.register_suite_completed("s").unwrap();
    root.mark_finished();

    assert!(root.duration() >= root.children()[0].duration());
    let report = root.to_report();
    assert_eq!(report.tests, 2);
    assert_eq!(report.children[0].records.len(), 2);
    assert!(report.was_successful());

    let json = root.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["children"][0]["records"][1]["state"], "ignored");
    assert_eq!(parsed["ignored"], 1);
}
