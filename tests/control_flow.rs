//! If/else merging, phi creation and dead-branch folding.

use eddyc::compile;
use indoc::indoc;

#[test]
fn if_else_merges_with_a_phi() {
    let source = indoc! {"
        int a = 1;
        if (arg == 1)
            a = arg+2;
        else {
            a = arg-3;
        }
        return a;
    "};
    let compilation = compile(source).unwrap();
    let out = compilation.print();
    assert!(out.starts_with("return Phi(Region"), "{out}");
    assert!(out.contains("(arg+2)"), "{out}");
    assert!(out.contains("(arg+-3)"), "{out}");
    assert_eq!(compilation.evaluate(1), Some(3));
    assert_eq!(compilation.evaluate(2), Some(-1));
}

#[test]
fn if_without_else_keeps_the_entry_value() {
    let source = "int a = 1; if (arg == 1) a = 2; return a;";
    let compilation = compile(source).unwrap();
    let out = compilation.print();
    assert!(out.starts_with("return Phi(Region"), "{out}");
    assert!(out.ends_with(",2,1);"), "{out}");
    assert_eq!(compilation.evaluate(1), Some(2));
    assert_eq!(compilation.evaluate(0), Some(1));
}

#[test]
fn constant_test_folds_the_branch_away() {
    let compilation = compile("if(true) return 2; return 1;").unwrap();
    assert_eq!(compilation.print(), "return 2;");
    let compilation = compile("if(false) return 2; return 1;").unwrap();
    assert_eq!(compilation.print(), "return 1;");
}

#[test]
fn constants_push_up_through_merged_phis() {
    let compilation = compile("int a = 1; if (arg) a = 2; return a+3;").unwrap();
    let out = compilation.print();
    assert!(out.starts_with("return Phi(Region"), "{out}");
    assert!(out.ends_with(",5,4);"), "{out}");
    assert_eq!(compilation.evaluate(1), Some(5));
    assert_eq!(compilation.evaluate(0), Some(4));

    let compilation = compile("int a = 1; if (arg) a = 2; return a*3;").unwrap();
    let out = compilation.print();
    assert!(out.ends_with(",6,3);"), "{out}");
    assert_eq!(compilation.evaluate(1), Some(6));
    assert_eq!(compilation.evaluate(0), Some(3));

    let compilation = compile("int a = 1; if (arg) a = 2; return a==2;").unwrap();
    let out = compilation.print();
    assert!(out.ends_with(",1,0);"), "{out}");
    assert_eq!(compilation.evaluate(1), Some(1));
    assert_eq!(compilation.evaluate(0), Some(0));
}

#[test]
fn untouched_names_need_no_phi() {
    let source = "int a = 7; if (arg) arg = arg+1; return a;";
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.print(), "return 7;");
}

#[test]
fn repeated_test_is_decided_by_its_dominator() {
    let source = indoc! {"
        int a = 0;
        if (arg) {
            if (arg) a = 1;
            else     a = 2;
        }
        return a;
    "};
    let compilation = compile(source).unwrap();
    let out = compilation.print();
    assert!(out.starts_with("return Phi(Region"), "{out}");
    assert!(out.ends_with(",1,0);"), "{out}");
    assert_eq!(compilation.evaluate(5), Some(1));
    assert_eq!(compilation.evaluate(0), Some(0));
}

#[test]
fn every_path_may_return() {
    let source = indoc! {"
        if( arg==1 ) return 3;
        if( arg==2 ) return 4;
        return 5;
    "};
    let compilation = compile(source).unwrap();
    assert_eq!(
        compilation.print(),
        "Stop[ return 3; return 4; return 5; ]"
    );
    assert_eq!(compilation.evaluate(1), Some(3));
    assert_eq!(compilation.evaluate(2), Some(4));
    assert_eq!(compilation.evaluate(9), Some(5));
}

#[test]
fn nested_ifs_merge_bottom_up() {
    let source = indoc! {"
        int a = 0;
        if (arg < 10) {
            if (arg < 5) a = 1;
            else         a = 2;
        } else {
            a = 3;
        }
        return a;
    "};
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.evaluate(3), Some(1));
    assert_eq!(compilation.evaluate(7), Some(2));
    assert_eq!(compilation.evaluate(12), Some(3));
}

#[test]
fn arm_local_definitions_are_rejected() {
    let err = compile("if (arg) int b = 2; return arg;").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot define a new name on one arm of an if"
    );
}

#[test]
fn arms_may_scope_their_own_names() {
    let source = indoc! {"
        int a = 0;
        if (arg) {
            int b = 2;
            a = b;
        }
        return a;
    "};
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.evaluate(1), Some(2));
    assert_eq!(compilation.evaluate(0), Some(0));
}
