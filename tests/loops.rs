//! While loops: eager phis, back-edge patching, break and continue.

use eddyc::compile;
use indoc::indoc;

#[test]
fn summing_loop() {
    let source = indoc! {"
        int sum = 0;
        int i = 0;
        while (i < arg) {
            sum = sum + i;
            i = i + 1;
        }
        return sum;
    "};
    let compilation = compile(source).unwrap();
    let out = compilation.print();
    assert!(out.starts_with("return Phi(Loop"), "{out}");
    assert_eq!(compilation.evaluate(4), Some(6));
    assert_eq!(compilation.evaluate(0), Some(0));
    assert_eq!(compilation.evaluate(10), Some(45));
}

#[test]
fn never_taken_loop_folds_to_the_entry_value() {
    let source = "int a = 1; while (false) { a = 2; } return a;";
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.print(), "return 1;");
}

#[test]
fn names_the_body_never_touches_shed_their_phi() {
    let source = indoc! {"
        int a = 7;
        int i = 0;
        while (i < 3) {
            i = i + 1;
        }
        return a;
    "};
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.print(), "return 7;");
}

#[test]
fn break_and_continue() {
    let source = indoc! {"
        int sum = 0;
        int i = 0;
        while (true) {
            i = i + 1;
            if (i == arg) break;
            if (i == 3) continue;
            sum = sum + i;
        }
        return sum;
    "};
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.evaluate(6), Some(12));
    assert_eq!(compilation.evaluate(2), Some(1));
    assert_eq!(compilation.evaluate(1), Some(0));
}

#[test]
fn nested_loops() {
    let source = indoc! {"
        int sum = 0;
        int i = 0;
        while (i < arg) {
            int j = 0;
            while (j < i) {
                sum = sum + j;
                j = j + 1;
            }
            i = i + 1;
        }
        return sum;
    "};
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.evaluate(4), Some(4));
    assert_eq!(compilation.evaluate(1), Some(0));
}

#[test]
fn infinite_loop_never_returns() {
    let source = "while (true) { arg = arg + 1; } return arg;";
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.print(), "Stop[ ]");
    assert_eq!(compilation.evaluate_with_fuel(0, 50), None);
}

#[test]
fn loop_exit_sees_the_final_phi() {
    let source = indoc! {"
        int i = 0;
        while (i < arg) {
            i = i + 1;
        }
        return i;
    "};
    let compilation = compile(source).unwrap();
    let out = compilation.print();
    assert!(out.starts_with("return Phi(Loop"), "{out}");
    assert_eq!(compilation.evaluate(0), Some(0));
    assert_eq!(compilation.evaluate(7), Some(7));
}

#[test]
fn body_local_definitions_are_rejected() {
    let err = compile("while (arg) int x = 1; return 0;").unwrap_err();
    assert_eq!(err.to_string(), "Cannot define a new name in a while loop");
}

#[test]
fn breaks_need_a_loop() {
    let err = compile("break; return 0;").unwrap_err();
    assert_eq!(err.to_string(), "No active loop for a break or continue");
    let err = compile("continue; return 0;").unwrap_err();
    assert_eq!(err.to_string(), "No active loop for a break or continue");
}
