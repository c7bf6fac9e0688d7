//! The sea-of-nodes intermediate representation.
//!
//! Control and data live in one graph. Each node's `inputs` are the values
//! it consumes (slot 0 is reserved for control), and `outputs` is the
//! mirrored use list. Nodes are arena-allocated and addressed by dense
//! [`NodeId`]s; a killed node leaves a tombstone and ids are never reused.

pub mod eval;
pub mod iter;
pub mod op;
mod peephole;
pub mod print;
pub mod scope;
pub mod ty;

use hashbrown::HashTable;

use crate::{
    error::CResult,
    index::{Index, IndexVec},
};

use self::{
    iter::WorkList,
    op::Op,
    ty::{Ty, Types},
};

crate::simple_index! {
    /// Dense handle of a node in a [`Graph`] arena.
    pub struct NodeId;
}

impl NodeId {
    /// Sentinel use recorded by [`Graph::keep`]; pins a node against
    /// dead-code elimination without being a real edge.
    pub(crate) const KEEP: NodeId = NodeId(u32::MAX);
}

pub struct Node {
    pub op: Op,
    /// Ordered def edges; slot 0 is control. `None` marks a vacant slot
    /// (no control dependence, or an unfinished loop back edge).
    inputs: Vec<Option<NodeId>>,
    /// Mirrored use edges, duplicates allowed. Unordered: removal swaps
    /// with the last element.
    outputs: Vec<NodeId>,
    /// Type cached by the last peephole; `None` until first visit and
    /// after death.
    ty: Option<Ty>,
    /// Value-numbering hash; 0 means "not in the table".
    hash: u32,
    /// Nodes to re-peephole when this node's type changes, for rewrites
    /// that inspected something other than their immediate neighbors.
    deps: Vec<NodeId>,
    /// Caches for the dominator tree walk.
    idepth: u32,
    idom: Option<NodeId>,
}

/// A per-compilation graph: node arena, type store, value-numbering table
/// and the peephole worklist.
pub struct Graph {
    pub(crate) nodes: IndexVec<NodeId, Node>,
    pub types: Types,
    pub(crate) work: WorkList,
    gvn: HashTable<NodeId>,
    pub start: NodeId,
    pub stop: NodeId,
    /// When set, peephole only computes types and never rewrites; used to
    /// inspect the raw construction graph.
    pub disable_peephole: bool,
    /// Set while the no-progress invariant sweep runs, to suppress the
    /// dependency-recording side effects of `compute`.
    pub(crate) mid_assert: bool,
}

impl Graph {
    /// A fresh graph holding only `Start` and `Stop`. `arg` constrains the
    /// type of the implicit program argument.
    pub fn new(arg: Option<i64>) -> Graph {
        let mut types = Types::new();
        let arg_ty = match arg {
            Some(v) => types.int_con(v),
            None => Ty::INT_BOT,
        };
        let mut graph = Graph {
            nodes: IndexVec::new(),
            types,
            work: WorkList::default(),
            gvn: HashTable::new(),
            start: NodeId::KEEP,
            stop: NodeId::KEEP,
            disable_peephole: false,
            mid_assert: false,
        };
        let start_ty = graph.types.tuple(vec![Ty::CTRL, arg_ty]);
        graph.start = graph.create(Op::Start { ty: start_ty }, vec![]);
        // Start's type never changes; set it up front so projections can
        // read it before any peephole runs.
        graph.nodes[graph.start].ty = Some(start_ty);
        graph.stop = graph.create(Op::Stop, vec![]);
        graph
    }

    pub fn create(&mut self, op: Op, inputs: Vec<Option<NodeId>>) -> NodeId {
        let id = self.nodes.next_index();
        for &d in inputs.iter().flatten() {
            self.nodes[d].outputs.push(id);
        }
        self.nodes.push(Node {
            op,
            inputs,
            outputs: Vec::new(),
            ty: None,
            hash: 0,
            deps: Vec::new(),
            idepth: 0,
            idom: None,
        });
        id
    }

    // ------------------------------------------------------------------
    // Accessors

    pub fn op(&self, n: NodeId) -> &Op {
        &self.nodes[n].op
    }

    pub fn ty(&self, n: NodeId) -> Option<Ty> {
        self.nodes[n].ty
    }

    pub fn input(&self, n: NodeId, i: usize) -> Option<NodeId> {
        self.nodes[n].inputs.get(i).copied().flatten()
    }

    pub fn n_ins(&self, n: NodeId) -> usize {
        self.nodes[n].inputs.len()
    }

    pub fn inputs(&self, n: NodeId) -> &[Option<NodeId>] {
        &self.nodes[n].inputs
    }

    pub fn outputs(&self, n: NodeId) -> &[NodeId] {
        &self.nodes[n].outputs
    }

    /// No uses at all, not even a keep pin.
    pub fn is_unused(&self, n: NodeId) -> bool {
        self.nodes[n].outputs.is_empty()
    }

    /// Tombstone check: killed nodes keep their id and op but lose all
    /// edges and their type.
    pub fn is_dead(&self, n: NodeId) -> bool {
        let node = &self.nodes[n];
        node.outputs.is_empty() && node.inputs.is_empty() && node.ty.is_none()
    }

    /// A region or phi still waiting for its loop back edge. Such nodes
    /// refuse value numbering and idealization until the edge lands.
    pub fn in_progress(&self, n: NodeId) -> bool {
        node_in_progress(&self.nodes, n)
    }

    pub fn is_cfg(&self, n: NodeId) -> bool {
        match &self.nodes[n].op {
            Op::Start { .. } | Op::Stop | Op::Return | Op::If | Op::Region | Op::Loop => true,
            Op::Proj(p) => {
                p.index == 0
                    || matches!(
                        self.input(n, 0).map(|c| &self.nodes[c].op),
                        Some(Op::If)
                    )
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Edge mutation. Every mutator unlocks the node out of the value table
    // first, since its hash is about to change.

    /// Point input `idx` of `n` at `def`, keeping use lists mirrored. If
    /// the old def loses its last use it is killed, cascading.
    pub fn set_def(&mut self, n: NodeId, idx: usize, def: Option<NodeId>) {
        self.unlock(n);
        let old = self.nodes[n].inputs[idx];
        if old == def {
            return;
        }
        // New use first, so the old def's death cannot collect it.
        if let Some(d) = def {
            self.nodes[d].outputs.push(n);
        }
        if let Some(o) = old {
            if self.del_use(o, n) {
                self.kill(o);
            }
        }
        self.nodes[n].inputs[idx] = def;
    }

    pub fn add_def(&mut self, n: NodeId, def: Option<NodeId>) {
        self.unlock(n);
        self.nodes[n].inputs.push(def);
        if let Some(d) = def {
            self.nodes[d].outputs.push(n);
        }
    }

    /// Remove input `idx` by swapping the last input into its place.
    /// Callers relying on input order (regions and their phis) must apply
    /// the same index everywhere.
    pub fn del_def(&mut self, n: NodeId, idx: usize) {
        self.unlock(n);
        if let Some(o) = self.nodes[n].inputs[idx] {
            if self.del_use(o, n) {
                self.kill(o);
            } else {
                // The def lost a use; distant patterns watching it may
                // now apply.
                self.move_deps_to_work(o);
            }
        }
        self.nodes[n].inputs.swap_remove(idx);
    }

    /// Drop the last `count` inputs.
    pub fn pop_n(&mut self, n: NodeId, count: usize) {
        self.unlock(n);
        for _ in 0..count {
            if let Some(Some(o)) = self.nodes[n].inputs.pop() {
                if self.del_use(o, n) {
                    self.kill(o);
                }
            }
        }
    }

    /// Swap inputs 1 and 2; used by commutative canonicalization.
    pub fn swap12(&mut self, n: NodeId) -> NodeId {
        self.unlock(n);
        self.nodes[n].inputs.swap(1, 2);
        n
    }

    /// Remove one `user` entry from `def`'s use list; true if that was the
    /// last use.
    fn del_use(&mut self, def: NodeId, user: NodeId) -> bool {
        let outs = &mut self.nodes[def].outputs;
        if let Some(i) = outs.iter().position(|&u| u == user) {
            outs.swap_remove(i);
        }
        outs.is_empty()
    }

    /// Tombstone an unused node, releasing its inputs; any def losing its
    /// last use dies with it.
    pub fn kill(&mut self, n: NodeId) {
        if self.is_dead(n) {
            return;
        }
        self.unlock(n);
        debug_assert!(self.is_unused(n));
        self.nodes[n].ty = None;
        while let Some(slot) = self.nodes[n].inputs.pop() {
            if let Some(o) = slot {
                self.work.push(o);
                if self.del_use(o, n) {
                    self.kill(o);
                }
            }
        }
        debug_assert!(self.is_dead(n));
    }

    /// Rewrite every use of `old` to use `new` instead, then kill `old`.
    pub fn subsume(&mut self, old: NodeId, new: NodeId) {
        debug_assert_ne!(old, new);
        while let Some(&u) = self.nodes[old].outputs.last() {
            debug_assert_ne!(u, NodeId::KEEP, "cannot subsume a kept node");
            self.nodes[old].outputs.pop();
            self.unlock(u);
            let node = &mut self.nodes[u];
            if let Some(slot) = node.inputs.iter_mut().find(|s| **s == Some(old)) {
                *slot = Some(new);
            }
            self.nodes[new].outputs.push(u);
        }
        self.kill(old);
    }

    /// Pin `n` against dead-code elimination while it is briefly unused.
    pub fn keep(&mut self, n: NodeId) -> NodeId {
        self.nodes[n].outputs.push(NodeId::KEEP);
        n
    }

    pub fn unkeep(&mut self, n: NodeId) -> NodeId {
        let outs = &mut self.nodes[n].outputs;
        let i = outs
            .iter()
            .rposition(|&u| u == NodeId::KEEP)
            .expect("unkeep of a node that was never kept");
        outs.swap_remove(i);
        n
    }

    // ------------------------------------------------------------------
    // Types and dependencies

    /// Install a freshly computed type. Types only ever rise: the new type
    /// must be at least as precise as the old one. On change, every user
    /// and every recorded dependent goes back on the worklist.
    pub(crate) fn set_type(&mut self, n: NodeId, t: Ty) -> Option<Ty> {
        let old = self.nodes[n].ty;
        if let Some(o) = old {
            debug_assert!(
                self.types.isa(t, o),
                "monotonicity: type fell from {} to {}",
                self.types.str(o),
                self.types.str(t)
            );
            if o == t {
                return old;
            }
        }
        self.nodes[n].ty = Some(t);
        for i in 0..self.nodes[n].outputs.len() {
            let u = self.nodes[n].outputs[i];
            self.work.push(u);
        }
        self.move_deps_to_work(n);
        old
    }

    /// Record that `dep` must be re-peepholed if `n`'s type changes.
    /// Suppressed during the invariant sweep, which must not mutate.
    pub(crate) fn add_dep(&mut self, n: NodeId, dep: NodeId) {
        if self.mid_assert || n == dep {
            return;
        }
        let node = &self.nodes[n];
        if node.deps.contains(&dep)
            || node.inputs.contains(&Some(dep))
            || node.outputs.contains(&dep)
        {
            return;
        }
        self.nodes[n].deps.push(dep);
    }

    pub(crate) fn move_deps_to_work(&mut self, n: NodeId) {
        while let Some(dep) = self.nodes[n].deps.pop() {
            self.work.push(dep);
        }
    }

    // ------------------------------------------------------------------
    // The peephole protocol

    /// Run a node to its local fixpoint: compute a type, fold to a
    /// constant, value-number, idealize, and recurse on any replacement.
    /// The original node is dead-code eliminated if the result replaced it.
    pub fn peephole(&mut self, n: NodeId) -> CResult<NodeId> {
        if self.disable_peephole {
            let t = self.compute(n)?;
            self.nodes[n].ty = Some(t);
            return Ok(n);
        }
        match self.peephole_opt(n)? {
            None => Ok(n),
            Some(x) => {
                let m = self.peephole(x)?;
                Ok(self.dead_code_elim(n, m))
            }
        }
    }

    /// One peephole step. `None` means no progress; `Some(x)` is either a
    /// replacement or `n` itself after a type change.
    pub(crate) fn peephole_opt(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let t = self.compute(n)?;
        let old = self.set_type(n, t);

        // Fold anything the types have already decided into a constant.
        if !matches!(self.nodes[n].op, Op::Constant(_) | Op::Scope(_))
            && self.types.is_high_or_const(t)
        {
            let start = self.start;
            let c = self.create(Op::Constant(t), vec![Some(start)]);
            return Ok(Some(self.peephole(c)?));
        }

        // Value numbering: hash 0 means not yet in the table.
        if self.nodes[n].hash == 0 {
            let hash = self.gvn_hash(n) as u64;
            let Graph { nodes, gvn, .. } = self;
            let found = gvn.find(hash, |&m| nodes_gvn_eq(nodes, m, n)).copied();
            match found {
                None => {
                    let Graph { nodes, gvn, .. } = self;
                    gvn.insert_unique(hash, n, |&m| nodes[m].hash as u64);
                }
                Some(m) => {
                    // The two equal nodes may carry different (both valid)
                    // types; keep the more precise of the two.
                    let tm = self.nodes[m].ty.unwrap_or(t);
                    self.nodes[m].ty = Some(self.types.join(tm, t));
                    self.nodes[n].hash = 0;
                    return Ok(Some(self.dead_code_elim(n, m)));
                }
            }
        }

        if let Some(x) = self.idealize(n)? {
            return Ok(Some(x));
        }

        Ok(if old == Some(t) { None } else { Some(n) })
    }

    /// If `new` ended up replacing `old`, release `old` (its uses were
    /// already moved); `new` is pinned across the kill in case its only
    /// use was inside the dying subgraph.
    pub(crate) fn dead_code_elim(&mut self, old: NodeId, new: NodeId) -> NodeId {
        if new != old && self.is_unused(old) && !self.is_dead(old) {
            self.keep(new);
            self.kill(old);
            self.unkeep(new);
        }
        new
    }

    // ------------------------------------------------------------------
    // Value numbering plumbing

    fn gvn_hash(&mut self, n: NodeId) -> u32 {
        if self.nodes[n].hash != 0 {
            return self.nodes[n].hash;
        }
        let node = &self.nodes[n];
        let mut hash = node.op.gvn_tag();
        for d in node.inputs.iter().flatten() {
            hash = hash ^ (hash << 17) ^ (hash >> 13) ^ d.index() as u32;
        }
        if hash == 0 {
            hash = 0xDEAD_BEEF;
        }
        self.nodes[n].hash = hash;
        hash
    }

    /// Drop `n` from the value table before an edge mutation invalidates
    /// its hash.
    pub(crate) fn unlock(&mut self, n: NodeId) {
        let hash = self.nodes[n].hash;
        if hash == 0 {
            return;
        }
        let Graph { gvn, .. } = self;
        if let Ok(entry) = gvn.find_entry(hash as u64, |&m| m == n) {
            entry.remove();
        }
        self.nodes[n].hash = 0;
    }

    // ------------------------------------------------------------------
    // Constants and dominators

    pub fn con_int(&mut self, value: i64) -> CResult<NodeId> {
        let t = self.types.int_con(value);
        self.con_ty(t)
    }

    pub fn con_ty(&mut self, t: Ty) -> CResult<NodeId> {
        let start = self.start;
        let c = self.create(Op::Constant(t), vec![Some(start)]);
        self.peephole(c)
    }

    /// Immediate dominator of a control node: input 0 by default, the
    /// entry for loops, the shallower-walks-up meet for two-path regions.
    pub(crate) fn idom(&mut self, n: NodeId) -> Option<NodeId> {
        match self.nodes[n].op {
            Op::Start { .. } | Op::Stop | Op::Constant(_) => None,
            Op::Loop => self.input(n, 1),
            Op::Region => {
                if let Some(cached) = self.nodes[n].idom {
                    if !self.is_dead(cached) {
                        return Some(cached);
                    }
                }
                if self.n_ins(n) == 2 {
                    return self.input(n, 1);
                }
                if self.n_ins(n) != 3 {
                    return None;
                }
                let mut lhs = self.input(n, 1)?;
                let mut rhs = self.input(n, 2)?;
                while lhs != rhs {
                    let (dl, dr) = (self.idepth(lhs), self.idepth(rhs));
                    if dl >= dr {
                        lhs = self.idom(lhs)?;
                    } else {
                        rhs = self.idom(rhs)?;
                    }
                }
                self.nodes[n].idom = Some(lhs);
                Some(lhs)
            }
            _ => self.input(n, 0),
        }
    }

    fn idepth(&mut self, n: NodeId) -> u32 {
        if self.nodes[n].idepth != 0 {
            return self.nodes[n].idepth;
        }
        let d = match self.idom(n) {
            Some(i) => self.idepth(i) + 1,
            None => 1,
        };
        self.nodes[n].idepth = d;
        d
    }

    // ------------------------------------------------------------------

    /// All live nodes reachable from `root` over both def and use edges.
    pub(crate) fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut visit = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        let mut out = Vec::new();
        while let Some(n) = stack.pop() {
            if n == NodeId::KEEP || visit[n.index()] || self.is_dead(n) {
                continue;
            }
            visit[n.index()] = true;
            out.push(n);
            stack.extend(self.nodes[n].inputs.iter().flatten());
            stack.extend(self.nodes[n].outputs.iter().filter(|&&u| u != NodeId::KEEP));
        }
        out
    }
}

fn node_in_progress(nodes: &IndexVec<NodeId, Node>, n: NodeId) -> bool {
    let node = &nodes[n];
    match node.op {
        Op::Region | Op::Loop => node.inputs.len() > 1 && node.inputs.last() == Some(&None),
        Op::Phi(_) => node.inputs.last() == Some(&None),
        _ => false,
    }
}

/// Value-numbering equality: same op payload, same inputs in the same
/// slots. Unfinished regions and phis never merge.
fn nodes_gvn_eq(nodes: &IndexVec<NodeId, Node>, a: NodeId, b: NodeId) -> bool {
    if a == b {
        return true;
    }
    let (na, nb) = (&nodes[a], &nodes[b]);
    if !na.op.gvn_eq(&nb.op) {
        return false;
    }
    if na.inputs.len() != nb.inputs.len() {
        return false;
    }
    if node_in_progress(nodes, a) || node_in_progress(nodes, b) {
        return false;
    }
    na.inputs == nb.inputs
}

#[cfg(test)]
mod tests {
    use super::{op::Op, ty::Ty, *};

    #[test]
    fn edges_stay_mirrored() {
        let mut g = Graph::new(None);
        let one = g.con_int(1).unwrap();
        let two = g.con_int(2).unwrap();
        g.keep(one);
        g.keep(two);
        let add = g.create(Op::Add, vec![None, Some(one), Some(two)]);
        assert_eq!(g.input(add, 1), Some(one));
        assert!(g.outputs(one).contains(&add));
        g.set_def(add, 1, Some(two));
        assert!(!g.outputs(one).contains(&add));
        assert_eq!(g.outputs(two).iter().filter(|&&u| u == add).count(), 2);
    }

    #[test]
    fn kill_cascades_to_unused_defs() {
        let mut g = Graph::new(None);
        let one = g.con_int(1).unwrap();
        let two = g.con_int(2).unwrap();
        let add = g.create(Op::Add, vec![None, Some(one), Some(two)]);
        assert!(!g.is_dead(one));
        g.kill(add);
        assert!(g.is_dead(add));
        assert!(g.is_dead(one));
        assert!(g.is_dead(two));
    }

    #[test]
    fn keep_pins_across_kill() {
        let mut g = Graph::new(None);
        let one = g.con_int(1).unwrap();
        let two = g.con_int(2).unwrap();
        g.keep(two);
        let add = g.create(Op::Add, vec![None, Some(one), Some(two)]);
        g.kill(add);
        assert!(g.is_dead(one));
        assert!(!g.is_dead(two));
        g.unkeep(two);
    }

    #[test]
    fn subsume_moves_all_uses() {
        let mut g = Graph::new(None);
        let one = g.con_int(1).unwrap();
        let two = g.con_int(2).unwrap();
        g.keep(two);
        let a = g.create(Op::Add, vec![None, Some(one), Some(one)]);
        g.keep(a);
        g.subsume(one, two);
        assert!(g.is_dead(one));
        assert_eq!(g.input(a, 1), Some(two));
        assert_eq!(g.input(a, 2), Some(two));
    }

    #[test]
    fn constants_value_number() {
        let mut g = Graph::new(None);
        let a = g.con_int(42).unwrap();
        g.keep(a);
        let b = g.con_int(42).unwrap();
        assert_eq!(a, b);
        let c = g.con_int(43).unwrap();
        assert_ne!(a, c);
        assert_eq!(g.ty(a), Some(g.types.int_con(42)));
    }
}
