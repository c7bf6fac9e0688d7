//! Golden tests for expression parsing and arithmetic folding.

use eddyc::compile;

fn golden(source: &str, expected: &str) {
    let compilation = compile(source).unwrap();
    assert_eq!(compilation.print(), expected, "program: {source}");
}

fn error(source: &str, expected: &str) {
    let err = compile(source).unwrap_err();
    assert_eq!(err.to_string(), expected, "program: {source}");
}

#[test]
fn returns_a_constant() {
    golden("return 1;", "return 1;");
}

#[test]
fn folds_constant_arithmetic() {
    golden("return 1+2*3+-5;", "return 2;");
    golden("return 6/2;", "return 3;");
    golden("return 2-1;", "return 1;");
    golden("return (1+2)*3;", "return 9;");
}

#[test]
fn constants_flow_through_names() {
    golden("int a = 1; int b = 2; return a+b;", "return 3;");
    golden("int a = 1; a = a + 2; return a;", "return 3;");
}

#[test]
fn gathers_constants_across_the_add_spine() {
    golden("return 1+arg+2;", "return (arg+3);");
    golden("return (1+arg)+2;", "return (arg+3);");
    golden("return 0+arg;", "return arg;");
    golden("return arg+1-1;", "return arg;");
}

#[test]
fn strength_reduces() {
    golden("return arg+0+arg;", "return (arg*2);");
    golden("return arg-arg;", "return 0;");
    golden("return arg*1;", "return arg;");
    golden("return arg*0;", "return 0;");
    golden("return arg/1;", "return arg;");
    golden("return -(-arg);", "return arg;");
    golden("return arg-(-3);", "return (arg+3);");
}

#[test]
fn folds_comparisons() {
    golden("return 3<4;", "return 1;");
    golden("return 3>4;", "return 0;");
    golden("return 3<=3;", "return 1;");
    golden("return 3>=4;", "return 0;");
    golden("return 3==3;", "return 1;");
    golden("return 3!=3;", "return 0;");
    golden("return arg==arg;", "return 1;");
    golden("return arg!=arg;", "return 0;");
}

#[test]
fn booleans_are_integers() {
    golden("return true;", "return 1;");
    golden("return false;", "return 0;");
    golden("return arg!=1;", "return (!(arg==1));");
}

#[test]
fn division_by_constant_zero_is_a_compile_error() {
    error("return 1/0;", "Division by zero");
    error("return arg/0;", "Division by zero");
}

#[test]
fn integer_literals_reject_leading_zeros() {
    error(
        "return 017;",
        "Syntax error: integer values cannot start with '0'",
    );
}

#[test]
fn name_errors() {
    error("return x;", "Undefined name 'x'");
    error("x = 1; return x;", "Undefined name 'x'");
    error("int a = 1; int a = 2; return a;", "Redefining name 'a'");
}

#[test]
fn shadowing_across_blocks_is_allowed() {
    golden(
        "int a = 1; { int a = 2; } return a;",
        "return 1;",
    );
    golden(
        "int a = 1; int b = 0; { int a = 2; b = a; } return b;",
        "return 2;",
    );
}

#[test]
fn syntax_errors() {
    let err = compile("return 1").unwrap_err();
    assert!(
        err.to_string().starts_with("Syntax error, expected ;"),
        "{err}"
    );
    let err = compile("int 1 = 2; return 1;").unwrap_err();
    assert!(
        err.to_string().starts_with("Syntax error, expected an identifier"),
        "{err}"
    );
    let err = compile("return 1; }").unwrap_err();
    assert!(
        err.to_string().starts_with("Syntax error, unexpected }"),
        "{err}"
    );
}
