//! Type transfer functions and local rewrite rules.
//!
//! `compute` is a pure function of the cached input types; `idealize`
//! reports a better replacement or `None`. Both are driven by
//! [`Graph::peephole`] during construction and by [`Graph::iterate`]
//! afterwards, so no rule may depend on when it runs.

use crate::error::{CResult, CompileError};

use super::{
    Graph, NodeId,
    op::{BoolOp, Op},
    ty::{Ty, TypeKind},
};

impl Graph {
    /// Cached type of input `i`, bottom if the slot is vacant.
    fn in_ty(&self, n: NodeId, i: usize) -> Ty {
        self.input(n, i)
            .and_then(|d| self.ty(d))
            .unwrap_or(Ty::BOT)
    }

    // ------------------------------------------------------------------
    // compute

    pub(crate) fn compute(&mut self, n: NodeId) -> CResult<Ty> {
        let op = self.nodes[n].op.clone();
        match op {
            Op::Start { ty } => Ok(ty),
            Op::Stop | Op::Scope(_) => Ok(Ty::BOT),
            Op::Constant(t) => Ok(t),
            Op::Return => {
                let c = self.in_ty(n, 0);
                let v = self.in_ty(n, 1);
                Ok(self.types.tuple(vec![c, v]))
            }
            Op::Add | Op::Sub | Op::Mul | Op::Div => self.compute_arith(n, &op),
            Op::Minus => {
                let t1 = self.in_ty(n, 1);
                if self.types.is_high(t1) {
                    return Ok(Ty::INT_TOP);
                }
                Ok(match self.types.kind(t1) {
                    TypeKind::Int(_) => match self.types.int_value(t1) {
                        Some(v) => self.types.int_con(v.wrapping_neg()),
                        None => Ty::INT_BOT,
                    },
                    _ => Ty::BOT,
                })
            }
            Op::Not => {
                let t1 = self.in_ty(n, 1);
                if self.types.is_high(t1) {
                    return Ok(Ty::INT_TOP);
                }
                Ok(match self.types.kind(t1) {
                    TypeKind::Int(_) => match self.types.int_value(t1) {
                        Some(v) => self.types.int_con((v == 0) as i64),
                        None => Ty::INT_BOT,
                    },
                    _ => Ty::BOT,
                })
            }
            Op::Bool(bop) => {
                let t1 = self.in_ty(n, 1);
                let t2 = self.in_ty(n, 2);
                if self.types.is_high(t1) || self.types.is_high(t2) {
                    return Ok(Ty::INT_TOP);
                }
                match (self.types.kind(t1), self.types.kind(t2)) {
                    (TypeKind::Int(_), TypeKind::Int(_)) => {
                        match (self.types.int_value(t1), self.types.int_value(t2)) {
                            (Some(a), Some(b)) => Ok(self.types.int_con(bop.apply(a, b))),
                            _ => Ok(Ty::INT_BOT),
                        }
                    }
                    _ => Ok(Ty::BOT),
                }
            }
            Op::If => {
                // A dead test produces two dead arms.
                let ctrl = self.in_ty(n, 0);
                if ctrl != Ty::CTRL && ctrl != Ty::BOT {
                    return Ok(self.if_tuple(Ty::XCTRL, Ty::XCTRL));
                }
                let pred = self.in_ty(n, 1);
                if self.types.is_high(pred) {
                    return Ok(self.if_tuple(Ty::XCTRL, Ty::XCTRL));
                }
                if let Some(v) = self.types.int_value(pred) {
                    return Ok(if v == 0 {
                        self.if_tuple(Ty::XCTRL, Ty::CTRL)
                    } else {
                        self.if_tuple(Ty::CTRL, Ty::XCTRL)
                    });
                }
                Ok(self.if_tuple(Ty::CTRL, Ty::CTRL))
            }
            Op::Proj(p) => {
                let t = self.in_ty(n, 0);
                if let TypeKind::Tuple(xs) = self.types.kind(t) {
                    Ok(xs[p.index])
                } else {
                    Ok(Ty::BOT)
                }
            }
            Op::Region => {
                if self.in_progress(n) {
                    return Ok(Ty::CTRL);
                }
                let mut t = Ty::XCTRL;
                for i in 1..self.n_ins(n) {
                    let ti = self.in_ty(n, i);
                    t = self.types.meet(t, ti);
                }
                Ok(t)
            }
            Op::Loop => {
                if self.in_progress(n) {
                    Ok(Ty::CTRL)
                } else {
                    Ok(self.in_ty(n, 1))
                }
            }
            Op::Phi(_) => self.compute_phi(n),
        }
    }

    fn compute_arith(&mut self, n: NodeId, op: &Op) -> CResult<Ty> {
        let t1 = self.in_ty(n, 1);
        let t2 = self.in_ty(n, 2);
        if self.types.is_high(t1) || self.types.is_high(t2) {
            return Ok(Ty::INT_TOP);
        }
        if !matches!(self.types.kind(t1), TypeKind::Int(_))
            || !matches!(self.types.kind(t2), TypeKind::Int(_))
        {
            return Ok(Ty::BOT);
        }
        let v1 = self.types.int_value(t1);
        let v2 = self.types.int_value(t2);
        // Multiply by zero annihilates even an unknown side.
        if matches!(op, Op::Mul) && (v1 == Some(0) || v2 == Some(0)) {
            return Ok(self.types.int_con(0));
        }
        // A zero divisor that survives to here is a program error, found
        // at compile time rather than crashing at run time.
        if matches!(op, Op::Div) && v2 == Some(0) {
            return Err(CompileError::new("Division by zero"));
        }
        if let (Some(a), Some(b)) = (v1, v2) {
            let v = match op {
                Op::Add => a.wrapping_add(b),
                Op::Sub => a.wrapping_sub(b),
                Op::Mul => a.wrapping_mul(b),
                Op::Div => a.wrapping_div(b),
                _ => unreachable!(),
            };
            return Ok(self.types.int_con(v));
        }
        Ok(self.types.meet(t1, t2))
    }

    fn compute_phi(&mut self, n: NodeId) -> CResult<Ty> {
        let Some(region) = self.input(n, 0) else {
            return Ok(Ty::BOT);
        };
        if !matches!(self.nodes[region].op, Op::Region | Op::Loop) {
            // The merge collapsed under us; hold position until the phi
            // itself folds.
            return Ok(if self.ty(region) == Some(Ty::XCTRL) {
                Ty::TOP
            } else {
                self.ty(n).unwrap_or(Ty::BOT)
            });
        }
        if self.in_progress(region) {
            return Ok(Ty::BOT);
        }
        let mut t = Ty::TOP;
        for i in 1..self.n_ins(n) {
            // Watch each incoming path; if one dies this phi can shrink.
            if let Some(c) = self.input(region, i) {
                self.add_dep(c, n);
            }
            if self.in_ty(region, i) == Ty::XCTRL {
                continue;
            }
            if let Some(d) = self.input(n, i) {
                if d != n {
                    let td = self.ty(d).unwrap_or(Ty::BOT);
                    t = self.types.meet(t, td);
                }
            }
        }
        Ok(t)
    }

    fn if_tuple(&mut self, t: Ty, f: Ty) -> Ty {
        self.types.tuple(vec![t, f])
    }

    // ------------------------------------------------------------------
    // idealize

    pub(crate) fn idealize(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let op = self.nodes[n].op.clone();
        match op {
            Op::Add => self.idealize_add(n),
            Op::Sub => self.idealize_sub(n),
            Op::Mul => self.idealize_mul(n),
            Op::Div => self.idealize_div(n),
            Op::Minus => self.idealize_minus(n),
            Op::Bool(bop) => self.idealize_bool(n, bop),
            Op::Phi(_) => self.idealize_phi(n),
            Op::Region => self.idealize_region(n, false),
            Op::Loop => self.idealize_region(n, true),
            Op::Proj(p) => self.idealize_proj(n, p.index),
            Op::If => self.idealize_if(n),
            Op::Stop => self.idealize_stop(n),
            _ => Ok(None),
        }
    }

    /// Goal shape for additions: a left spine of adds with constants on
    /// the right, so the constants meet and fold.
    fn idealize_add(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let (Some(lhs), Some(rhs)) = (self.input(n, 1), self.input(n, 2)) else {
            return Ok(None);
        };
        let t1 = self.ty(lhs).unwrap_or(Ty::BOT);
        let t2 = self.ty(rhs).unwrap_or(Ty::BOT);
        debug_assert!(!(self.types.is_constant(t1) && self.types.is_constant(t2)));

        // x + 0 => x. (0 + x) already canonicalized to (x + 0).
        if self.types.int_value(t2) == Some(0) {
            return Ok(Some(lhs));
        }

        // x + x => x * 2
        if lhs == rhs {
            let two = self.con_int(2)?;
            return Ok(Some(self.create(Op::Mul, vec![None, Some(lhs), Some(two)])));
        }

        let lhs_add = matches!(self.nodes[lhs].op, Op::Add);
        let rhs_add = matches!(self.nodes[rhs].op, Op::Add);

        // Move the non-add to the right.
        if !lhs_add && rhs_add {
            return Ok(Some(self.swap12(n)));
        }

        // Rotate x + (y + z) into (x + y) + z.
        if rhs_add {
            let y = self.input(rhs, 1);
            let z = self.input(rhs, 2);
            let inner = self.create(Op::Add, vec![None, Some(lhs), y]);
            let inner = self.peephole(inner)?;
            return Ok(Some(self.create(Op::Add, vec![None, Some(inner), z])));
        }

        // Neither side is an add: order the operands, else push a
        // constant up through a phi-of-constants on the left.
        if !lhs_add {
            if self.spline_cmp(lhs, rhs) {
                return Ok(Some(self.swap12(n)));
            }
            return self.phi_con(n, true);
        }

        // Only (add add non) remains.
        let x = self.input(lhs, 1);
        let Some(l2) = self.input(lhs, 2) else {
            return Ok(None);
        };
        let tl2 = self.ty(l2).unwrap_or(Ty::BOT);

        // (x + con1) + con2 => x + (con1 + con2)
        if self.types.is_constant(tl2) && self.types.is_constant(t2) {
            let folded = self.create(Op::Add, vec![None, Some(l2), Some(rhs)]);
            let folded = self.peephole(folded)?;
            return Ok(Some(self.create(Op::Add, vec![None, x, Some(folded)])));
        }

        // (x + phi-of-cons) + con, or (x + phi-of-cons) + phi-of-cons of
        // the same region: push the constant up through the phi. The
        // reverse of the phi pulling a common op down; no cycle because
        // the constants fold first.
        if let Some(phi) = self.phi_con(n, true)? {
            return Ok(Some(phi));
        }

        // Sort along the spine: (x + hi) + lo => (x + lo) + hi.
        if self.spline_cmp(l2, rhs) {
            let inner = self.create(Op::Add, vec![None, x, Some(rhs)]);
            let inner = self.peephole(inner)?;
            return Ok(Some(self.create(Op::Add, vec![None, Some(inner), Some(l2)])));
        }

        Ok(None)
    }

    fn idealize_sub(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let (Some(lhs), Some(rhs)) = (self.input(n, 1), self.input(n, 2)) else {
            return Ok(None);
        };
        // x - x => 0
        if lhs == rhs {
            return Ok(Some(self.con_int(0)?));
        }
        // x - (-y) => x + y
        if matches!(self.nodes[rhs].op, Op::Minus) {
            let y = self.input(rhs, 1);
            return Ok(Some(self.create(Op::Add, vec![None, Some(lhs), y])));
        }
        // x - con => x + (-con), joining the add spine.
        let t2 = self.ty(rhs).unwrap_or(Ty::BOT);
        if let Some(c) = self.types.int_value(t2) {
            let neg = self.con_int(c.wrapping_neg())?;
            return Ok(Some(self.create(Op::Add, vec![None, Some(lhs), Some(neg)])));
        }
        Ok(None)
    }

    fn idealize_mul(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let (Some(lhs), Some(rhs)) = (self.input(n, 1), self.input(n, 2)) else {
            return Ok(None);
        };
        let t1 = self.ty(lhs).unwrap_or(Ty::BOT);
        let t2 = self.ty(rhs).unwrap_or(Ty::BOT);
        // con * x => x * con
        if self.types.is_constant(t1) && !self.types.is_constant(t2) {
            return Ok(Some(self.swap12(n)));
        }
        // x * 1 => x. (x * 0) already folded by compute.
        if self.types.int_value(t2) == Some(1) {
            return Ok(Some(lhs));
        }
        self.phi_con(n, true)
    }

    fn idealize_div(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let t2 = self.in_ty(n, 2);
        if self.types.int_value(t2) == Some(1) {
            return Ok(self.input(n, 1));
        }
        Ok(None)
    }

    fn idealize_minus(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let Some(x) = self.input(n, 1) else {
            return Ok(None);
        };
        // -(-y) => y
        if matches!(self.nodes[x].op, Op::Minus) {
            return Ok(self.input(x, 1));
        }
        Ok(None)
    }

    fn idealize_bool(&mut self, n: NodeId, bop: BoolOp) -> CResult<Option<NodeId>> {
        let (Some(lhs), Some(rhs)) = (self.input(n, 1), self.input(n, 2)) else {
            return Ok(None);
        };
        // Comparing a value against itself has a fixed answer.
        if lhs == rhs {
            return Ok(Some(self.con_int(bop.apply(3, 3))?));
        }
        self.phi_con(n, false)
    }

    /// `(x op phi-of-cons) op con` and friends: push the constant through
    /// the phi so it folds on every path.
    fn phi_con(&mut self, n: NodeId, rotate: bool) -> CResult<Option<NodeId>> {
        let (Some(lhs), Some(rhs)) = (self.input(n, 1), self.input(n, 2)) else {
            return Ok(None);
        };
        let mut lphi = self.pcon(lhs, n);
        if rotate && lphi.is_none() && self.n_ins(lhs) > 2 {
            // Rotation is only sound between the same associative op.
            if !self.nodes[lhs].op.gvn_eq(&self.nodes[n].op) {
                return Ok(None);
            }
            if let Some(l2) = self.input(lhs, 2) {
                lphi = self.pcon(l2, n);
            }
        }
        let Some(lphi) = lphi else {
            return Ok(None);
        };
        // A phi on a two-input region is collapsing anyway; let it fold
        // before pushing anything through.
        if let Some(region) = self.input(lphi, 0) {
            if self.n_ins(region) <= 2 {
                return Ok(None);
            }
        }
        let t2 = self.ty(rhs).unwrap_or(Ty::BOT);
        let rhs_phi = matches!(self.nodes[rhs].op, Op::Phi(_));
        if !self.types.is_constant(t2) && self.pcon(rhs, n).is_none() {
            return Ok(None);
        }
        if rhs_phi && self.input(lphi, 0) != self.input(rhs, 0) {
            return Ok(None);
        }
        let len = self.n_ins(lphi);
        let mut ns: Vec<Option<NodeId>> = Vec::with_capacity(len);
        ns.push(self.input(lphi, 0));
        for i in 1..len {
            let a = self.input(lphi, i);
            let b = if rhs_phi {
                self.input(rhs, i)
            } else {
                Some(rhs)
            };
            let c = self.copy_binop(n, a, b);
            ns.push(Some(self.peephole(c)?));
        }
        let mut label = self.phi_label(lphi);
        if rhs_phi {
            label.push_str(&self.phi_label(rhs));
        }
        let phi = self.create(Op::Phi(label), ns);
        let phi = self.peephole(phi)?;
        Ok(Some(if lphi == lhs {
            phi
        } else {
            let x = self.input(lhs, 1);
            self.copy_binop(n, x, Some(phi))
        }))
    }

    fn idealize_phi(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let Some(region) = self.input(n, 0) else {
            return Ok(None);
        };
        if !matches!(self.nodes[region].op, Op::Region | Op::Loop) || self.in_progress(region) {
            return Ok(None);
        }

        // Phi(x, ..., x) is just x.
        if let Some(live) = self.single_unique_input(n) {
            return Ok(Some(live));
        }

        // Phi(op(a,b), op(q,r)) => op(Phi(a,q), Phi(b,r)), trading several
        // ops for one.
        let Some(op1) = self.input(n, 1) else {
            return Ok(None);
        };
        if self.n_ins(op1) == 3
            && self.input(op1, 0).is_none()
            && !self.is_cfg(op1)
            && self.same_op_inputs(n)
        {
            let len = self.n_ins(n);
            let mut lhss: Vec<Option<NodeId>> = Vec::with_capacity(len);
            let mut rhss: Vec<Option<NodeId>> = Vec::with_capacity(len);
            lhss.push(Some(region));
            rhss.push(Some(region));
            for i in 1..len {
                let Some(ini) = self.input(n, i) else {
                    return Ok(None);
                };
                lhss.push(self.input(ini, 1));
                rhss.push(self.input(ini, 2));
            }
            let label = self.phi_label(n);
            let phi_l = self.create(Op::Phi(label.clone()), lhss);
            let phi_l = self.peephole(phi_l)?;
            let phi_r = self.create(Op::Phi(label), rhss);
            let phi_r = self.peephole(phi_r)?;
            return Ok(Some(self.copy_binop(op1, Some(phi_l), Some(phi_r))));
        }
        Ok(None)
    }

    fn single_unique_input(&mut self, n: NodeId) -> Option<NodeId> {
        let region = self.input(n, 0)?;
        // A loop with a dead entry collapses as a whole; don't fold its
        // phis piecemeal.
        if matches!(self.nodes[region].op, Op::Loop) && self.in_ty(region, 1) == Ty::XCTRL {
            return None;
        }
        let mut live = None;
        for i in 1..self.n_ins(n) {
            if let Some(c) = self.input(region, i) {
                self.add_dep(c, n);
            }
            if self.in_ty(region, i) == Ty::XCTRL {
                continue;
            }
            let d = self.input(n, i)?;
            if d == n {
                continue;
            }
            match live {
                None => live = Some(d),
                Some(l) if l == d => {}
                Some(_) => return None,
            }
        }
        live
    }

    fn same_op_inputs(&self, n: NodeId) -> bool {
        let Some(first) = self.input(n, 1) else {
            return false;
        };
        for i in 2..self.n_ins(n) {
            let Some(d) = self.input(n, i) else {
                return false;
            };
            if !self.nodes[first].op.gvn_eq(&self.nodes[d].op) {
                return false;
            }
        }
        true
    }

    fn idealize_region(&mut self, n: NodeId, is_loop: bool) -> CResult<Option<NodeId>> {
        if self.in_progress(n) {
            return Ok(None);
        }

        // Fold away a path that can never be taken, along with the
        // matching operand of every attached phi. Loop entries never fold;
        // a dead entry kills the whole loop through its type instead.
        if let Some(path) = self.find_dead_input(n) {
            if !(is_loop && path == 1) {
                let n_ins = self.n_ins(n);
                let phis: Vec<NodeId> = self.nodes[n]
                    .outputs
                    .iter()
                    .copied()
                    .filter(|&u| u != NodeId::KEEP && matches!(self.nodes[u].op, Op::Phi(_)))
                    .collect();
                for phi in phis {
                    // A phi can die while a sibling sheds its operand.
                    if !self.is_dead(phi) && self.n_ins(phi) == n_ins {
                        self.del_def(phi, path);
                    }
                }
                if self.is_dead(n) {
                    let start = self.start;
                    return Ok(Some(
                        self.create(Op::Constant(Ty::XCTRL), vec![Some(start)]),
                    ));
                }
                self.del_def(n, path);
                return Ok(Some(n));
            }
        }

        // A merge of one path with no phis is that path.
        if self.n_ins(n) == 2 && !self.has_phi(n) {
            return Ok(self.input(n, 1));
        }
        Ok(None)
    }

    fn find_dead_input(&self, n: NodeId) -> Option<usize> {
        (1..self.n_ins(n)).find(|&i| self.in_ty(n, i) == Ty::XCTRL)
    }

    fn has_phi(&self, n: NodeId) -> bool {
        self.nodes[n]
            .outputs
            .iter()
            .any(|&u| u != NodeId::KEEP && matches!(self.nodes[u].op, Op::Phi(_)))
    }

    fn idealize_proj(&mut self, n: NodeId, index: usize) -> CResult<Option<NodeId>> {
        let Some(iff) = self.input(n, 0) else {
            return Ok(None);
        };
        if !matches!(self.nodes[iff].op, Op::If) {
            return Ok(None);
        }
        // If the other arm is dead the test decides nothing; this arm is
        // just the control entering the If.
        let t = self.ty(iff).unwrap_or(Ty::BOT);
        if let TypeKind::Tuple(xs) = self.types.kind(t) {
            if xs[1 - index] == Ty::XCTRL {
                return Ok(self.input(iff, 0));
            }
        }
        Ok(None)
    }

    fn idealize_if(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        let Some(pred) = self.input(n, 1) else {
            return Ok(None);
        };
        let tp = self.ty(pred).unwrap_or(Ty::BOT);
        if self.types.is_high_or_const(tp) {
            return Ok(None);
        }
        // Walk up the dominator tree looking for the same test; the
        // projection we came through tells which way it went.
        let mut prior = n;
        let mut dom = self.idom(n);
        while let Some(d) = dom {
            self.add_dep(d, n);
            if matches!(self.nodes[d].op, Op::If) && self.input(d, 1) == Some(pred) {
                self.add_dep(pred, n);
                let prior_index = match &self.nodes[prior].op {
                    Op::Proj(p) if self.input(prior, 0) == Some(d) => Some(p.index),
                    _ => None,
                };
                if let Some(idx) = prior_index {
                    let c = self.con_int(if idx == 0 { 1 } else { 0 })?;
                    self.set_def(n, 1, Some(c));
                    return Ok(Some(n));
                }
            }
            prior = d;
            dom = self.idom(d);
        }
        Ok(None)
    }

    fn idealize_stop(&mut self, n: NodeId) -> CResult<Option<NodeId>> {
        // Drop returns whose control went dead.
        let mut progress = false;
        let mut i = 0;
        while i < self.n_ins(n) {
            let dead = self
                .input(n, i)
                .and_then(|ret| self.ty(ret))
                .is_some_and(|t| {
                    matches!(self.types.kind(t), TypeKind::Tuple(xs) if xs[0] == Ty::XCTRL)
                });
            if dead {
                self.del_def(n, i);
                progress = true;
            } else {
                i += 1;
            }
        }
        Ok(if progress { Some(n) } else { None })
    }

    // ------------------------------------------------------------------
    // Shared helpers

    /// True when every data input of `n` carries a constant type. On
    /// failure the offending input learns that `dep` cares about it.
    fn all_cons(&mut self, n: NodeId, dep: Option<NodeId>) -> bool {
        if matches!(self.nodes[n].op, Op::Phi(_)) {
            let Some(region) = self.input(n, 0) else {
                return false;
            };
            if !matches!(self.nodes[region].op, Op::Region | Op::Loop)
                || self.in_progress(region)
            {
                return false;
            }
        }
        for i in 1..self.n_ins(n) {
            let ti = self.in_ty(n, i);
            if !self.types.is_constant(ti) {
                if let (Some(d), Some(dep)) = (self.input(n, i), dep) {
                    self.add_dep(d, dep);
                }
                return false;
            }
        }
        true
    }

    fn pcon(&mut self, x: NodeId, dep: NodeId) -> Option<NodeId> {
        if matches!(self.nodes[x].op, Op::Phi(_)) && self.all_cons(x, Some(dep)) {
            Some(x)
        } else {
            None
        }
    }

    /// Ordering along an add spine: constants to the right, then
    /// phi-of-constants, then phis, ties by node id. True if `hi` and `lo`
    /// should swap.
    fn spline_cmp(&mut self, hi: NodeId, lo: NodeId) -> bool {
        let thi = self.ty(hi).unwrap_or(Ty::BOT);
        let tlo = self.ty(lo).unwrap_or(Ty::BOT);
        if self.types.is_constant(tlo) {
            return false;
        }
        if self.types.is_constant(thi) {
            return true;
        }
        let lo_phi = matches!(self.nodes[lo].op, Op::Phi(_));
        let hi_phi = matches!(self.nodes[hi].op, Op::Phi(_));
        if lo_phi && self.all_cons(lo, None) {
            return false;
        }
        if hi_phi && self.all_cons(hi, None) {
            return true;
        }
        if lo_phi && !hi_phi {
            return true;
        }
        if hi_phi && !lo_phi {
            return false;
        }
        lo > hi
    }

    fn phi_label(&self, n: NodeId) -> String {
        match &self.nodes[n].op {
            Op::Phi(label) => label.clone(),
            _ => String::new(),
        }
    }

    fn copy_binop(&mut self, template: NodeId, lhs: Option<NodeId>, rhs: Option<NodeId>) -> NodeId {
        let op = self.nodes[template].op.clone();
        self.create(op, vec![None, lhs, rhs])
    }
}
