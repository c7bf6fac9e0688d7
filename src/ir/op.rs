//! The closed set of node kinds.

use hashbrown::HashMap;

use crate::index::Index;

use super::ty::Ty;

/// Comparison operators carried by a `Bool` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum BoolOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
}

impl BoolOp {
    pub fn label(self) -> &'static str {
        match self {
            BoolOp::Eq => "EQ",
            BoolOp::Lt => "LT",
            BoolOp::Le => "LE",
        }
    }

    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        let hit = match self {
            BoolOp::Eq => lhs == rhs,
            BoolOp::Lt => lhs < rhs,
            BoolOp::Le => lhs <= rhs,
        };
        hit as i64
    }
}

/// A tuple projection: which component, and a print label (`$ctrl`, `arg`,
/// `True`, `False`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjOp {
    pub index: usize,
    pub label: &'static str,
}

/// Symbol-table payload of a `Scope` node: a stack of lexical frames
/// mapping each visible name to the input slot holding its definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopeData {
    pub frames: Vec<HashMap<String, usize>>,
}

/// What a node does. Control and data live in the one graph; `Start`, the
/// `Proj`s of `If`, `Region`, `Loop`, `Return` and `Stop` are the control
/// subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Graph entry; produces the tuple of initial control plus arguments.
    Start { ty: Ty },
    /// Graph exit; one input per `Return`.
    Stop,
    Return,
    Constant(Ty),
    Add,
    Sub,
    Mul,
    Div,
    /// Unary negation.
    Minus,
    /// Logical not over integers.
    Not,
    Bool(BoolOp),
    If,
    Proj(ProjOp),
    /// Merge point of several control paths.
    Region,
    /// A region whose second input is the back edge; the back edge is
    /// `None` while the loop body is still being built.
    Loop,
    /// Merge of one value per incoming control path of its region.
    Phi(String),
    /// Parser bookkeeping node tracking the current definition of every
    /// visible name; never survives into a finished graph.
    Scope(ScopeData),
}

impl Op {
    pub fn label(&self) -> String {
        match self {
            Op::Start { .. } => "Start".to_string(),
            Op::Stop => "Stop".to_string(),
            Op::Return => "Return".to_string(),
            Op::Constant(_) => "Con".to_string(),
            Op::Add => "Add".to_string(),
            Op::Sub => "Sub".to_string(),
            Op::Mul => "Mul".to_string(),
            Op::Div => "Div".to_string(),
            Op::Minus => "Minus".to_string(),
            Op::Not => "Not".to_string(),
            Op::Bool(op) => op.label().to_string(),
            Op::If => "If".to_string(),
            Op::Proj(p) => p.label.to_string(),
            Op::Region => "Region".to_string(),
            Op::Loop => "Loop".to_string(),
            Op::Phi(name) => format!("Phi_{name}"),
            Op::Scope(_) => "Scope".to_string(),
        }
    }

    /// Value-numbering equivalence over the payload alone; inputs are
    /// compared separately. Phi labels are cosmetic. Singleton ops and
    /// scopes never value-number.
    pub fn gvn_eq(&self, other: &Op) -> bool {
        use Op::*;
        match (self, other) {
            (Constant(a), Constant(b)) => a == b,
            (Proj(a), Proj(b)) => a.index == b.index,
            (Bool(a), Bool(b)) => a == b,
            (Phi(_), Phi(_)) => true,
            (Add, Add) | (Sub, Sub) | (Mul, Mul) | (Div, Div) => true,
            (Minus, Minus) | (Not, Not) | (If, If) | (Return, Return) => true,
            (Region, Region) | (Loop, Loop) => true,
            _ => false,
        }
    }

    /// Payload contribution to the value-numbering hash. Must agree with
    /// [`Op::gvn_eq`].
    pub fn gvn_tag(&self) -> u32 {
        use Op::*;
        match self {
            Start { .. } => 1,
            Stop => 2,
            Return => 3,
            Constant(t) => 0x1000 ^ (t.index() as u32).wrapping_mul(0x9E37),
            Add => 4,
            Sub => 5,
            Mul => 6,
            Div => 7,
            Minus => 8,
            Not => 9,
            Bool(BoolOp::Eq) => 10,
            Bool(BoolOp::Lt) => 11,
            Bool(BoolOp::Le) => 12,
            If => 13,
            Proj(p) => 0x2000 ^ p.index as u32,
            Region => 14,
            Loop => 15,
            Phi(_) => 16,
            Scope(_) => 17,
        }
    }
}
