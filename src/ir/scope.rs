//! Symbol-table operations on `Scope` nodes.
//!
//! The parser's scope is itself a node: its inputs are the current
//! definition of every visible name (control at slot 0), so name bindings
//! participate in the same use-edge bookkeeping as any other edge and dead
//! definitions are collected as bindings go out of scope.

use hashbrown::HashMap;

use crate::error::{CResult, CompileError};

use super::{
    Graph, NodeId,
    op::{Op, ScopeData},
    ty::Ty,
};

/// Name of the current-control binding, slot 0 of every scope.
pub const CTRL: &str = "$ctrl";
/// Name of the implicit program argument.
pub const ARG: &str = "arg";

impl Graph {
    pub fn new_scope(&mut self) -> NodeId {
        let s = self.create(Op::Scope(ScopeData::default()), vec![]);
        self.nodes[s].ty = Some(Ty::BOT);
        s
    }

    fn scope_data(&self, s: NodeId) -> &ScopeData {
        match &self.nodes[s].op {
            Op::Scope(data) => data,
            _ => unreachable!("not a scope node"),
        }
    }

    fn scope_data_mut(&mut self, s: NodeId) -> &mut ScopeData {
        match &mut self.nodes[s].op {
            Op::Scope(data) => data,
            _ => unreachable!("not a scope node"),
        }
    }

    /// Open a nested lexical frame.
    pub fn scope_push(&mut self, s: NodeId) {
        self.scope_data_mut(s).frames.push(HashMap::new());
    }

    /// Close the innermost frame, releasing its definitions.
    pub fn scope_pop(&mut self, s: NodeId) {
        let count = self
            .scope_data_mut(s)
            .frames
            .pop()
            .map(|f| f.len())
            .unwrap_or(0);
        self.pop_n(s, count);
    }

    pub fn scope_depth(&self, s: NodeId) -> usize {
        self.scope_data(s).frames.len()
    }

    pub fn scope_ctrl(&self, s: NodeId) -> Option<NodeId> {
        self.input(s, 0)
    }

    pub fn scope_set_ctrl(&mut self, s: NodeId, c: NodeId) {
        self.set_def(s, 0, Some(c));
    }

    /// Bind a new name in the innermost frame. Shadowing an outer frame is
    /// fine; a duplicate in the same frame is an error.
    pub fn scope_define(&mut self, s: NodeId, name: &str, def: NodeId) -> CResult<()> {
        let slot = self.n_ins(s);
        {
            let data = self.scope_data_mut(s);
            let frame = data.frames.last_mut().expect("no open scope frame");
            if frame.contains_key(name) {
                return Err(CompileError::new(format!("Redefining name '{name}'")));
            }
            frame.insert(name.to_string(), slot);
        }
        self.add_def(s, Some(def));
        Ok(())
    }

    fn scope_slot(&self, s: NodeId, name: &str) -> Option<usize> {
        for frame in self.scope_data(s).frames.iter().rev() {
            if let Some(&slot) = frame.get(name) {
                return Some(slot);
            }
        }
        None
    }

    pub fn scope_lookup(&self, s: NodeId, name: &str) -> CResult<NodeId> {
        match self.scope_slot(s, name).and_then(|slot| self.input(s, slot)) {
            Some(def) => Ok(def),
            None => Err(CompileError::new(format!("Undefined name '{name}'"))),
        }
    }

    pub fn scope_update(&mut self, s: NodeId, name: &str, def: NodeId) -> CResult<()> {
        match self.scope_slot(s, name) {
            Some(slot) => {
                self.set_def(s, slot, Some(def));
                Ok(())
            }
            None => Err(CompileError::new(format!("Undefined name '{name}'"))),
        }
    }

    /// Slot-indexed names, for phi labels and printing.
    pub(crate) fn scope_names(&self, s: NodeId) -> Vec<String> {
        let mut names = vec![String::new(); self.n_ins(s)];
        for frame in &self.scope_data(s).frames {
            for (name, &slot) in frame {
                names[slot] = name.clone();
            }
        }
        names
    }

    /// Clone the scope at a control split. With `loop_head` set, every
    /// name gets an eager placeholder phi on the new loop whose back-edge
    /// operand stays open until [`Graph::end_loop`]; both the head scope
    /// and the clone then refer to the phi.
    pub fn scope_dup(&mut self, s: NodeId, loop_head: bool) -> CResult<NodeId> {
        let frames = self.scope_data(s).frames.clone();
        let dup = self.create(Op::Scope(ScopeData { frames }), vec![]);
        self.nodes[dup].ty = Some(Ty::BOT);
        let ctrl = self.input(s, 0);
        self.add_def(dup, ctrl);
        let names = if loop_head {
            self.scope_names(s)
        } else {
            Vec::new()
        };
        for i in 1..self.n_ins(s) {
            let def = self.input(s, i);
            if !loop_head {
                self.add_def(dup, def);
            } else {
                let phi = self.create(Op::Phi(names[i].clone()), vec![ctrl, def, None]);
                let phi = self.peephole(phi)?;
                self.add_def(dup, Some(phi));
                self.set_def(s, i, Some(phi));
            }
        }
        Ok(dup)
    }

    /// Merge `that` into `this` with a fresh region; names whose
    /// definitions differ get a phi. Kills `that`. Returns the merged
    /// control, which the caller installs as the current control.
    pub fn merge_scopes(&mut self, this: NodeId, that: NodeId) -> CResult<NodeId> {
        let c1 = self.input(this, 0);
        let c2 = self.input(that, 0);
        let region = self.create(Op::Region, vec![None, c1, c2]);
        self.keep(region);
        self.scope_set_ctrl(this, region);
        let names = self.scope_names(this);
        for i in 1..self.n_ins(this) {
            let a = self.input(this, i);
            let b = self.input(that, i);
            if a != b {
                let phi = self.create(Op::Phi(names[i].clone()), vec![Some(region), a, b]);
                let phi = self.peephole(phi)?;
                self.set_def(this, i, Some(phi));
            }
        }
        self.kill(that);
        self.unkeep(region);
        self.peephole(region)
    }

    /// Close a loop: `head` is the loop-head scope holding the placeholder
    /// phis, `back` the scope at the bottom of the body. Patches the loop
    /// back edge and each phi's second operand, then re-peepholes the phis
    /// so names the body never touched collapse to their entry value.
    pub fn end_loop(&mut self, head: NodeId, back: NodeId) -> CResult<()> {
        let ctrl = self.input(head, 0).expect("loop head scope lost control");
        debug_assert!(matches!(self.nodes[ctrl].op, Op::Loop) && self.in_progress(ctrl));
        let back_ctrl = self.input(back, 0);
        self.set_def(ctrl, 2, back_ctrl);
        for i in 1..self.n_ins(head) {
            let phi = self.input(head, i).expect("loop head scope lost a name");
            debug_assert!(matches!(self.nodes[phi].op, Op::Phi(_)));
            debug_assert_eq!(self.input(phi, 0), Some(ctrl));
            debug_assert_eq!(self.input(phi, 2), None);
            let b = self.input(back, i);
            self.set_def(phi, 2, b);
            let m = self.peephole(phi)?;
            if m != phi {
                self.subsume(phi, m);
            }
        }
        self.kill(back);
        Ok(())
    }
}
