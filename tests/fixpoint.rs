//! The worklist driver: fixpoints, canonical forms, raw construction.

use eddyc::{Parser, compile};
use indoc::indoc;

#[test]
fn iterate_reaches_a_true_fixpoint() {
    let source = indoc! {"
        int sum = 0;
        int i = 0;
        while (i < arg) {
            sum = sum + i;
            i = i + 1;
        }
        if (sum == 0) return arg;
        return sum;
    "};
    let mut compilation = compile(source).unwrap();
    assert!(compilation.graph.progress_on_list().unwrap());
}

#[test]
fn canonical_forms_are_idempotent() {
    for source in [
        "return 1+arg+2;",
        "return arg+0+arg;",
        "return (1+arg)*3;",
        "return arg-(-3);",
        "return 1+2*3+-5;",
    ] {
        let once = compile(source).unwrap().print();
        let twice = compile(&once).unwrap().print();
        assert_eq!(once, twice, "program: {source}");
    }
}

#[test]
fn disabled_peepholes_keep_the_raw_shape() {
    let compilation = Parser::new("return 1+2;")
        .disable_peephole()
        .parse()
        .unwrap();
    assert_eq!(compilation.print(), "return (1+2);");
    // The interpreter agrees with the folded answer.
    assert_eq!(compilation.evaluate(0), Some(3));
    assert_eq!(compile("return 1+2;").unwrap().print(), "return 3;");
}

#[test]
fn optimization_preserves_behavior() {
    let source = indoc! {"
        int a = 2;
        int b = 1;
        if (arg < 0) {
            a = b + arg;
        } else {
            b = a + arg;
        }
        return a * b;
    "};
    let raw = Parser::new(source).disable_peephole().parse().unwrap();
    let opt = compile(source).unwrap();
    for arg in [-3, -1, 0, 1, 5] {
        assert_eq!(raw.evaluate(arg), opt.evaluate(arg), "arg: {arg}");
    }
}

#[test]
fn known_argument_folds_the_whole_program() {
    let compilation = eddyc::compile_with_arg("return arg*2+1;", 10).unwrap();
    assert_eq!(compilation.print(), "return 21;");
}
