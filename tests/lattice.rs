//! Algebraic laws of the type lattice, checked over a representative
//! sample closed under duals.

use eddyc::ir::ty::{Ty, Types};

#[test]
fn meet_is_commutative() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        for &b in &ts {
            assert_eq!(
                types.meet(a, b),
                types.meet(b, a),
                "meet({}, {})",
                types.str(a),
                types.str(b)
            );
        }
    }
}

#[test]
fn meet_is_associative() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        for &b in &ts {
            for &c in &ts {
                let ab = types.meet(a, b);
                let bc = types.meet(b, c);
                assert_eq!(
                    types.meet(ab, c),
                    types.meet(a, bc),
                    "meet({}, {}, {})",
                    types.str(a),
                    types.str(b),
                    types.str(c)
                );
            }
        }
    }
}

#[test]
fn meet_is_idempotent() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        assert_eq!(types.meet(a, a), a);
    }
}

#[test]
fn dual_is_an_involution() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        let d = types.dual(a);
        assert_eq!(types.dual(d), a, "dual({})", types.str(a));
    }
}

#[test]
fn meet_is_a_lower_bound() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        for &b in &ts {
            let m = types.meet(a, b);
            assert!(types.isa(a, m), "{} isa {}", types.str(a), types.str(m));
            assert!(types.isa(b, m), "{} isa {}", types.str(b), types.str(m));
        }
    }
}

#[test]
fn meet_is_monotone() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        for &b in &ts {
            if !types.isa(a, b) {
                continue;
            }
            for &c in &ts {
                let ac = types.meet(a, c);
                let bc = types.meet(b, c);
                assert!(
                    types.isa(ac, bc),
                    "{} isa {} broke under meet with {}",
                    types.str(a),
                    types.str(b),
                    types.str(c)
                );
            }
        }
    }
}

#[test]
fn join_mirrors_meet_through_duals() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        for &b in &ts {
            assert_eq!(types.join(a, b), types.join(b, a));
            let j = types.join(a, b);
            assert!(types.isa(j, a), "{} isa {}", types.str(j), types.str(a));
            assert!(types.isa(j, b), "{} isa {}", types.str(j), types.str(b));
        }
    }
}

#[test]
fn extremes_absorb() {
    let mut types = Types::new();
    let ts = types.gather();
    for &a in &ts {
        assert_eq!(types.meet(Ty::BOT, a), Ty::BOT);
        assert_eq!(types.meet(Ty::TOP, a), a);
    }
}

#[test]
fn integer_constants_print_as_their_value() {
    let mut types = Types::new();
    let seven = types.int_con(7);
    assert_eq!(types.str(seven), "7");
    assert!(types.is_constant(seven));
    assert_eq!(types.int_value(seven), Some(7));
}
