//! The type lattice.
//!
//! Every node in the graph carries a lattice element describing what the
//! optimizer has proven about its value. Elements are interned in a
//! per-compilation [`Types`] store, so a type is a copyable 4-byte handle
//! and equality is a handle compare.

use hashbrown::HashMap;
use itertools::Itertools;

use crate::index::IndexVec;

crate::simple_index! {
    /// Interned handle into a [`Types`] store. Structurally equal types
    /// always receive the same handle.
    pub struct Ty;
}

// The store seeds these in a fixed order, so the handles are constants.
impl Ty {
    /// Bottom of the lattice: all values, no information.
    pub const BOT: Ty = Ty(0);
    /// Top of the lattice: dual of [`Ty::BOT`].
    pub const TOP: Ty = Ty(1);
    /// A reachable control edge.
    pub const CTRL: Ty = Ty(2);
    /// An unreachable (dead) control edge.
    pub const XCTRL: Ty = Ty(3);
    /// Some integer, value unknown.
    pub const INT_BOT: Ty = Ty(4);
    /// Any integer, optimistically undetermined.
    pub const INT_TOP: Ty = Ty(5);
}

/// The structure of a lattice element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// All values.
    Bot,
    /// No value (dual of `Bot`).
    Top,
    /// Live control.
    Ctrl,
    /// Dead control.
    XCtrl,
    /// 64-bit signed integers.
    Int(IntVal),
    /// Fixed-arity product, used by nodes producing multiple values
    /// (`Start`, `If`).
    Tuple(Vec<Ty>),
    /// Possibly-nil reference to a named object. No memory operations are
    /// built on these yet; they participate in the lattice only.
    Ptr(PtrTy),
}

/// The integer sub-lattice: a flat lattice of constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntVal {
    Top,
    Bot,
    Con(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PtrTy {
    pub obj: PtrObj,
    /// True if nil is included in the value set.
    pub nil: bool,
}

/// Referent sub-lattice: another flat lattice, with named objects between
/// "points at nothing" and "points at anything".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PtrObj {
    Top,
    Named(String),
    Bot,
}

/// Per-compilation intern store for lattice elements.
pub struct Types {
    kinds: IndexVec<Ty, TypeKind>,
    intern: HashMap<TypeKind, Ty>,
}

impl Types {
    pub fn new() -> Types {
        let mut types = Types {
            kinds: IndexVec::new(),
            intern: HashMap::new(),
        };
        // Seed order must agree with the handle constants above.
        let seeds = [
            (TypeKind::Bot, Ty::BOT),
            (TypeKind::Top, Ty::TOP),
            (TypeKind::Ctrl, Ty::CTRL),
            (TypeKind::XCtrl, Ty::XCTRL),
            (TypeKind::Int(IntVal::Bot), Ty::INT_BOT),
            (TypeKind::Int(IntVal::Top), Ty::INT_TOP),
        ];
        for (kind, want) in seeds {
            let got = types.make(kind);
            assert_eq!(got, want);
        }
        types
    }

    fn make(&mut self, kind: TypeKind) -> Ty {
        if let Some(&t) = self.intern.get(&kind) {
            return t;
        }
        let t = self.kinds.push(kind.clone());
        self.intern.insert(kind, t);
        t
    }

    pub fn kind(&self, t: Ty) -> &TypeKind {
        &self.kinds[t]
    }

    pub fn int(&mut self, v: IntVal) -> Ty {
        self.make(TypeKind::Int(v))
    }

    pub fn int_con(&mut self, value: i64) -> Ty {
        self.make(TypeKind::Int(IntVal::Con(value)))
    }

    pub fn tuple(&mut self, elems: Vec<Ty>) -> Ty {
        self.make(TypeKind::Tuple(elems))
    }

    pub fn ptr(&mut self, obj: PtrObj, nil: bool) -> Ty {
        self.make(TypeKind::Ptr(PtrTy { obj, nil }))
    }

    /// The nil constant: points at nothing and may be nil.
    pub fn ptr_null(&mut self) -> Ty {
        self.ptr(PtrObj::Top, true)
    }

    pub fn ptr_bot(&mut self) -> Ty {
        self.ptr(PtrObj::Bot, true)
    }

    /// If `t` is an integer constant, its value.
    pub fn int_value(&self, t: Ty) -> Option<i64> {
        match self.kind(t) {
            TypeKind::Int(IntVal::Con(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn is_constant(&self, t: Ty) -> bool {
        match self.kind(t) {
            TypeKind::Int(IntVal::Con(_)) => true,
            TypeKind::Ptr(p) => p.obj == PtrObj::Top && p.nil,
            _ => false,
        }
    }

    /// High types sit above every value of their family and belong to
    /// unreachable or not-yet-resolved code.
    pub fn is_high(&self, t: Ty) -> bool {
        match self.kind(t) {
            TypeKind::Top | TypeKind::XCtrl | TypeKind::Int(IntVal::Top) => true,
            TypeKind::Ptr(p) => p.obj == PtrObj::Top && !p.nil,
            _ => false,
        }
    }

    /// Nodes whose type is high or constant are replaced by constants
    /// during peephole.
    pub fn is_high_or_const(&self, t: Ty) -> bool {
        self.is_high(t) || self.is_constant(t)
    }

    /// Greatest lower bound of `a` and `b`: commutative, associative,
    /// idempotent.
    pub fn meet(&mut self, a: Ty, b: Ty) -> Ty {
        if a == b {
            return a;
        }
        // Clone out the kinds; interning below may grow the store.
        let ka = self.kinds[a].clone();
        let kb = self.kinds[b].clone();
        use TypeKind::*;
        match (ka, kb) {
            (Bot, _) | (_, Bot) => Ty::BOT,
            (Top, _) => b,
            (_, Top) => a,
            (Ctrl, XCtrl) | (XCtrl, Ctrl) => Ty::CTRL,
            (Int(x), Int(y)) => {
                let v = int_meet(x, y);
                self.int(v)
            }
            (Tuple(xs), Tuple(ys)) => {
                if xs.len() != ys.len() {
                    return Ty::BOT;
                }
                let mut elems = Vec::with_capacity(xs.len());
                for (&x, &y) in xs.iter().zip(ys.iter()) {
                    elems.push(self.meet(x, y));
                }
                self.tuple(elems)
            }
            (Ptr(x), Ptr(y)) => {
                let obj = obj_meet(x.obj, y.obj);
                self.ptr(obj, x.nil | y.nil)
            }
            // Unrelated families fall to the bottom.
            _ => Ty::BOT,
        }
    }

    /// Lattice inversion: an involution mapping meet onto join.
    pub fn dual(&mut self, t: Ty) -> Ty {
        let kind = self.kinds[t].clone();
        use TypeKind::*;
        match kind {
            Bot => Ty::TOP,
            Top => Ty::BOT,
            Ctrl => Ty::XCTRL,
            XCtrl => Ty::CTRL,
            Int(IntVal::Bot) => Ty::INT_TOP,
            Int(IntVal::Top) => Ty::INT_BOT,
            Int(IntVal::Con(_)) => t,
            Tuple(xs) => {
                let mut elems = Vec::with_capacity(xs.len());
                for &x in xs.iter() {
                    elems.push(self.dual(x));
                }
                self.tuple(elems)
            }
            Ptr(p) => {
                let obj = match p.obj {
                    PtrObj::Top => PtrObj::Bot,
                    PtrObj::Bot => PtrObj::Top,
                    named => named,
                };
                self.ptr(obj, !p.nil)
            }
        }
    }

    /// Least upper bound, defined through the duals.
    pub fn join(&mut self, a: Ty, b: Ty) -> Ty {
        if a == b {
            return a;
        }
        let da = self.dual(a);
        let db = self.dual(b);
        let m = self.meet(da, db);
        self.dual(m)
    }

    /// Subtype test: `a` is a subset of `b` exactly when falling `a` to `b`
    /// loses nothing.
    pub fn isa(&mut self, a: Ty, b: Ty) -> bool {
        self.meet(a, b) == b
    }

    pub fn str(&self, t: Ty) -> String {
        match self.kind(t) {
            TypeKind::Bot => "Bot".to_string(),
            TypeKind::Top => "Top".to_string(),
            TypeKind::Ctrl => "Ctrl".to_string(),
            TypeKind::XCtrl => "~Ctrl".to_string(),
            TypeKind::Int(IntVal::Bot) => "IntBot".to_string(),
            TypeKind::Int(IntVal::Top) => "IntTop".to_string(),
            TypeKind::Int(IntVal::Con(v)) => v.to_string(),
            TypeKind::Tuple(xs) => {
                format!("[{}]", xs.iter().map(|&x| self.str(x)).join(","))
            }
            TypeKind::Ptr(p) => match (&p.obj, p.nil) {
                (PtrObj::Top, true) => "null".to_string(),
                (PtrObj::Top, false) => "~nil".to_string(),
                (PtrObj::Named(n), nil) => format!("*{}{}", n, if nil { "?" } else { "" }),
                (PtrObj::Bot, nil) => format!("*bot{}", if nil { "?" } else { "" }),
            },
        }
    }

    /// A representative sample of the lattice, closed under `dual`, for
    /// exhaustively checking the lattice laws in tests.
    pub fn gather(&mut self) -> Vec<Ty> {
        let mut ts = vec![
            Ty::BOT,
            Ty::CTRL,
            Ty::XCTRL,
            Ty::INT_BOT,
            self.int_con(0),
            self.int_con(17),
        ];
        let null = self.ptr_null();
        let pbot = self.ptr_bot();
        let named = self.ptr(PtrObj::Named("Test".to_string()), false);
        let tup = self.tuple(vec![Ty::CTRL, Ty::INT_BOT]);
        ts.extend([null, pbot, named, tup]);
        for i in 0..ts.len() {
            let d = self.dual(ts[i]);
            ts.push(d);
        }
        ts.sort();
        ts.dedup();
        ts
    }
}

fn int_meet(a: IntVal, b: IntVal) -> IntVal {
    use IntVal::*;
    match (a, b) {
        (Top, x) | (x, Top) => x,
        (Bot, _) | (_, Bot) => Bot,
        (Con(x), Con(y)) => {
            if x == y {
                Con(x)
            } else {
                Bot
            }
        }
    }
}

fn obj_meet(a: PtrObj, b: PtrObj) -> PtrObj {
    use PtrObj::*;
    match (a, b) {
        (Top, x) | (x, Top) => x,
        (Bot, _) | (_, Bot) => Bot,
        (Named(x), Named(y)) => {
            if x == y {
                Named(x)
            } else {
                Bot
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_identity() {
        let mut types = Types::new();
        let a = types.int_con(7);
        let b = types.int_con(7);
        assert_eq!(a, b);
        assert_ne!(a, types.int_con(8));
        let t1 = types.tuple(vec![Ty::CTRL, a]);
        let t2 = types.tuple(vec![Ty::CTRL, b]);
        assert_eq!(t1, t2);
    }

    #[test]
    fn integer_meets() {
        let mut types = Types::new();
        let three = types.int_con(3);
        let four = types.int_con(4);
        assert_eq!(types.meet(three, three), three);
        assert_eq!(types.meet(three, four), Ty::INT_BOT);
        assert_eq!(types.meet(Ty::INT_TOP, three), three);
        assert_eq!(types.meet(Ty::INT_BOT, three), Ty::INT_BOT);
    }

    #[test]
    fn control_meets() {
        let mut types = Types::new();
        assert_eq!(types.meet(Ty::CTRL, Ty::XCTRL), Ty::CTRL);
        assert_eq!(types.meet(Ty::XCTRL, Ty::XCTRL), Ty::XCTRL);
        assert_eq!(types.meet(Ty::CTRL, Ty::INT_BOT), Ty::BOT);
    }

    #[test]
    fn isa_is_reflexive_and_directional() {
        let mut types = Types::new();
        let three = types.int_con(3);
        assert!(types.isa(three, three));
        assert!(types.isa(three, Ty::INT_BOT));
        assert!(!types.isa(Ty::INT_BOT, three));
        assert!(types.isa(Ty::TOP, three));
        assert!(types.isa(three, Ty::BOT));
    }
}
