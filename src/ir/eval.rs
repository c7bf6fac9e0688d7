//! A small reference interpreter over the finished graph.
//!
//! Walks the control subgraph from `Start`, latching phi values at each
//! region entry, until it hits a `Return` or runs out of loop fuel. Used
//! by tests to check that rewrites preserve program behavior.

use hashbrown::HashMap;

use super::{
    Graph, NodeId,
    op::Op,
};

pub const DEFAULT_FUEL: usize = 1000;

/// Run the program from the graph containing `node`, with `arg` bound to
/// the program argument. `None` means the loop fuel ran out.
pub fn evaluate(g: &Graph, node: NodeId, arg: i64, fuel: usize) -> Option<i64> {
    let start = g
        .reachable(node)
        .into_iter()
        .find(|&n| matches!(g.op(n), Op::Start { .. }))?;
    Evaluator {
        graph: g,
        cache: HashMap::new(),
    }
    .run(start, arg, fuel)
}

struct Evaluator<'a> {
    graph: &'a Graph,
    /// Values of latched phis and the argument projection.
    cache: HashMap<NodeId, i64>,
}

impl Evaluator<'_> {
    fn run(&mut self, start: NodeId, arg: i64, mut fuel: usize) -> Option<i64> {
        if let Some(p) = self.find_projection(start, 1) {
            self.cache.insert(p, arg);
        }
        let mut control = self.find_projection(start, 0);
        let mut prev = start;
        while let Some(c) = control {
            let next = match self.graph.op(c) {
                Op::Region | Op::Loop => {
                    let back_edge = matches!(self.graph.op(c), Op::Loop)
                        && self.graph.input(c, 1) != Some(prev);
                    if back_edge {
                        if fuel == 0 {
                            return None;
                        }
                        fuel -= 1;
                        self.latch_loop_phis(c, prev);
                    } else {
                        self.latch_phis(c, prev);
                    }
                    self.find_control(c)
                }
                Op::If => {
                    let pred = self.operand(c, 1);
                    self.find_projection(c, if pred != 0 { 0 } else { 1 })
                }
                Op::Return => return Some(self.operand(c, 1)),
                Op::Proj(_) => self.find_control(c),
                _ => unreachable!("non-control node reached by the control walk"),
            };
            prev = c;
            control = next;
        }
        // Control fell off the graph: no return was reachable.
        Some(0)
    }

    fn value(&mut self, n: NodeId) -> i64 {
        if let Some(&v) = self.cache.get(&n) {
            return v;
        }
        match self.graph.op(n) {
            Op::Constant(t) => self.graph.types.int_value(*t).unwrap_or(0),
            Op::Add => self.operand(n, 1).wrapping_add(self.operand(n, 2)),
            Op::Sub => self.operand(n, 1).wrapping_sub(self.operand(n, 2)),
            Op::Mul => self.operand(n, 1).wrapping_mul(self.operand(n, 2)),
            Op::Div => {
                // Runtime division by zero evaluates to zero.
                let divisor = self.operand(n, 2);
                if divisor == 0 {
                    0
                } else {
                    self.operand(n, 1).wrapping_div(divisor)
                }
            }
            Op::Minus => self.operand(n, 1).wrapping_neg(),
            Op::Not => (self.operand(n, 1) == 0) as i64,
            Op::Bool(op) => {
                let op = *op;
                let lhs = self.operand(n, 1);
                let rhs = self.operand(n, 2);
                op.apply(lhs, rhs)
            }
            _ => unreachable!("node has no runtime value"),
        }
    }

    fn operand(&mut self, n: NodeId, i: usize) -> i64 {
        match self.graph.input(n, i) {
            Some(d) => self.value(d),
            None => unreachable!("evaluated node with a vacant operand"),
        }
    }

    /// Latch every phi of `region` to the value flowing in from the path
    /// we arrived by.
    fn latch_phis(&mut self, region: NodeId, prev: NodeId) {
        let idx = self.arrival_path(region, prev);
        for i in 0..self.graph.outputs(region).len() {
            let u = self.graph.outputs(region)[i];
            if u != NodeId::KEEP && matches!(self.graph.op(u), Op::Phi(_)) {
                let v = self.operand(u, idx);
                self.cache.insert(u, v);
            }
        }
    }

    /// Loop phis may read each other, so compute every new value against
    /// the previous iteration before latching any of them.
    fn latch_loop_phis(&mut self, region: NodeId, prev: NodeId) {
        let idx = self.arrival_path(region, prev);
        let mut next = Vec::new();
        for i in 0..self.graph.outputs(region).len() {
            let u = self.graph.outputs(region)[i];
            if u != NodeId::KEEP && matches!(self.graph.op(u), Op::Phi(_)) {
                let v = self.operand(u, idx);
                next.push((u, v));
            }
        }
        for (phi, v) in next {
            self.cache.insert(phi, v);
        }
    }

    fn arrival_path(&self, region: NodeId, prev: NodeId) -> usize {
        let idx = self
            .graph
            .inputs(region)
            .iter()
            .position(|&d| d == Some(prev));
        match idx {
            Some(i) => {
                debug_assert!(i > 0);
                i
            }
            None => unreachable!("arrived at a region from an unknown path"),
        }
    }

    fn find_control(&self, n: NodeId) -> Option<NodeId> {
        self.graph
            .outputs(n)
            .iter()
            .copied()
            .find(|&u| u != NodeId::KEEP && self.graph.is_cfg(u))
    }

    fn find_projection(&self, n: NodeId, idx: usize) -> Option<NodeId> {
        self.graph.outputs(n).iter().copied().find(|&u| {
            u != NodeId::KEEP && matches!(self.graph.op(u), Op::Proj(p) if p.index == idx)
        })
    }
}
