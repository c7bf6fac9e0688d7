//! Graph printing.
//!
//! Two views: [`print_node`] renders a node as the expression it computes,
//! which is what the golden tests compare against, and [`pretty_print`]
//! produces a columnar whole-graph listing grouped into rough basic
//! blocks.

use std::fmt::Write as _;

use crate::index::Index;

use super::{Graph, NodeId, op::Op};

/// The canonical expression form of `n`: shared subexpressions print in
/// full once and by label after that, vacant inputs print as `____`.
pub fn print_node(g: &Graph, n: NodeId) -> String {
    let mut out = String::new();
    let mut visited = vec![false; g.nodes.len()];
    print0(g, Some(n), &mut out, &mut visited);
    out
}

fn print0(g: &Graph, n: Option<NodeId>, out: &mut String, visited: &mut [bool]) {
    let Some(n) = n else {
        out.push_str("____");
        return;
    };
    // Constants are cheap enough to repeat; everything else prints its
    // label on a revisit.
    if visited[n.index()] && !matches!(g.op(n), Op::Constant(_)) {
        out.push_str(&g.op(n).label());
        return;
    }
    visited[n.index()] = true;
    if g.is_dead(n) {
        let _ = write!(out, "{}{}:DEAD", g.op(n).label(), n.index());
        return;
    }
    print1(g, n, out, visited);
}

fn print_binop(g: &Graph, n: NodeId, op: &str, out: &mut String, visited: &mut [bool]) {
    out.push('(');
    print0(g, g.input(n, 1), out, visited);
    out.push_str(op);
    print0(g, g.input(n, 2), out, visited);
    out.push(')');
}

fn print1(g: &Graph, n: NodeId, out: &mut String, visited: &mut [bool]) {
    match g.op(n) {
        Op::Start { .. } => out.push_str("Start"),
        Op::Stop => {
            if g.n_ins(n) == 1 {
                print0(g, g.input(n, 0), out, visited);
                return;
            }
            out.push_str("Stop[ ");
            for i in 0..g.n_ins(n) {
                print0(g, g.input(n, i), out, visited);
                out.push(' ');
            }
            out.push(']');
        }
        Op::Return => {
            out.push_str("return ");
            print0(g, g.input(n, 1), out, visited);
            out.push(';');
        }
        Op::Constant(t) => out.push_str(&g.types.str(*t)),
        Op::Add => print_binop(g, n, "+", out, visited),
        Op::Sub => print_binop(g, n, "-", out, visited),
        Op::Mul => print_binop(g, n, "*", out, visited),
        Op::Div => print_binop(g, n, "/", out, visited),
        Op::Bool(op) => print_binop(g, n, &op.to_string(), out, visited),
        Op::Minus => {
            out.push_str("(-");
            print0(g, g.input(n, 1), out, visited);
            out.push(')');
        }
        Op::Not => {
            out.push_str("(!");
            print0(g, g.input(n, 1), out, visited);
            out.push(')');
        }
        Op::If => {
            out.push_str("if( ");
            print0(g, g.input(n, 1), out, visited);
            out.push_str(" )");
        }
        Op::Proj(p) => out.push_str(p.label),
        Op::Region | Op::Loop => {
            let _ = write!(out, "{}{}", g.op(n).label(), n.index());
        }
        Op::Phi(_) => {
            let region_ok = matches!(
                g.input(n, 0).map(|r| g.op(r)),
                Some(Op::Region | Op::Loop)
            ) && !g.in_progress(g.input(n, 0).unwrap_or(n));
            if !region_ok {
                out.push('Z');
            }
            out.push_str("Phi(");
            for i in 0..g.n_ins(n) {
                if i > 0 {
                    out.push(',');
                }
                print0(g, g.input(n, i), out, visited);
            }
            out.push(')');
        }
        Op::Scope(data) => {
            out.push_str("Scope");
            for frame in &data.frames {
                let mut entries: Vec<_> = frame.iter().collect();
                entries.sort_by_key(|&(_, &slot)| slot);
                out.push('[');
                for (i, (name, &slot)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{name}:");
                    print0(g, g.input(n, slot), out, visited);
                }
                out.push(']');
            }
        }
    }
}

// ----------------------------------------------------------------------
// Columnar whole-graph listing.

fn is_multi_head(g: &Graph, n: NodeId) -> bool {
    matches!(g.op(n), Op::Start { .. } | Op::Region | Op::Loop | Op::If)
}

fn is_multi_tail(g: &Graph, n: NodeId) -> bool {
    matches!(g.op(n), Op::Constant(_) | Op::Proj(_) | Op::Phi(_))
}

/// A bulk pretty-printer grouping nodes into basic blocks: breadth-first
/// search up the def edges from `node` to `depth`, then a reverse
/// post-order walk over the visited set, control heads starting blocks
/// and their projections and phis listed right under them.
pub fn pretty_print(g: &Graph, node: NodeId, depth: usize) -> String {
    let bfs = Bfs::new(g, node, depth);
    let mut rpos = Vec::new();
    let mut visit = vec![false; g.nodes.len()];
    for i in bfs.lim..bfs.order.len() {
        post_ord(g, bfs.order[i], &mut rpos, &mut visit, &bfs.on);
    }
    let mut out = String::new();
    let mut gap = false;
    let mut i = rpos.len();
    while i > 0 {
        i -= 1;
        let n = rpos[i];
        if g.is_cfg(n) || is_multi_head(g, n) {
            if !gap {
                out.push('\n');
            }
            print_line(g, n, &mut out);
            while i > 0 {
                let t = rpos[i - 1];
                if !is_multi_tail(g, t) {
                    break;
                }
                print_line(g, t, &mut out);
                i -= 1;
            }
            out.push('\n');
            gap = true;
        } else {
            print_line(g, n, &mut out);
            gap = false;
        }
    }
    out
}

fn post_ord(g: &Graph, n: NodeId, rpos: &mut Vec<NodeId>, visit: &mut [bool], on: &[bool]) {
    if !on[n.index()] || visit[n.index()] {
        return;
    }
    visit[n.index()] = true;
    // Control first, so blocks come out in schedule order.
    if g.is_cfg(n) {
        for &use_ in g.outputs(n) {
            if use_ == NodeId::KEEP || !g.is_cfg(use_) {
                continue;
            }
            let first = g.outputs(use_).first().copied();
            let tail_loops = matches!(first, Some(f) if f != NodeId::KEEP && matches!(g.op(f), Op::Loop));
            if first.is_some() && !tail_loops {
                post_ord(g, use_, rpos, visit, on);
            }
        }
        for &use_ in g.outputs(n) {
            if use_ != NodeId::KEEP && g.is_cfg(use_) {
                post_ord(g, use_, rpos, visit, on);
            }
        }
    }
    for &use_ in g.outputs(n) {
        if use_ != NodeId::KEEP {
            post_ord(g, use_, rpos, visit, on);
        }
    }
    rpos.push(n);
}

fn print_line(g: &Graph, n: NodeId, out: &mut String) {
    let _ = write!(out, "{:4} {:<7.7} ", n.index(), g.op(n).label());
    if g.is_dead(n) {
        out.push_str("DEAD\n");
        return;
    }
    for slot in g.inputs(n) {
        match slot {
            None => out.push_str("____ "),
            Some(d) => {
                let _ = write!(out, "{:4} ", d.index());
            }
        }
    }
    for _ in g.n_ins(n)..3 {
        out.push_str("     ");
    }
    out.push_str(" [[  ");
    for &u in g.outputs(n) {
        if u == NodeId::KEEP {
            out.push_str("KEEP ");
        } else {
            let _ = write!(out, "{:4} ", u.index());
        }
    }
    let lim = 5usize.saturating_sub(g.n_ins(n).max(3));
    for _ in g.outputs(n).len()..lim {
        out.push_str("     ");
    }
    out.push_str(" ]]  ");
    if let Some(t) = g.ty(n) {
        out.push_str(&g.types.str(t));
    }
    out.push('\n');
}

/// Breadth-first search up the def edges, depth-limited, keeping heads
/// whose tails made the cut. Ends with a root set (nodes none of whose
/// defs were visited) swapped to the back.
struct Bfs {
    order: Vec<NodeId>,
    on: Vec<bool>,
    lim: usize,
}

impl Bfs {
    fn new(g: &Graph, base: NodeId, mut depth: usize) -> Bfs {
        let mut bfs = Bfs {
            order: Vec::new(),
            on: vec![false; g.nodes.len()],
            lim: 0,
        };
        bfs.add(base);
        let mut idx = 0;
        let mut lim = 1;
        while idx < bfs.order.len() {
            let n = bfs.order[idx];
            idx += 1;
            for &def in g.inputs(n).iter().flatten() {
                if !bfs.on[def.index()] {
                    bfs.add(def);
                }
            }
            if idx == lim {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                lim = bfs.order.len();
            }
        }
        // Toss things past the depth limit except multi-heads.
        while idx < bfs.order.len() {
            let n = bfs.order[idx];
            if is_multi_head(g, n) {
                idx += 1;
            } else {
                bfs.on[n.index()] = false;
                bfs.order.swap_remove(idx);
            }
        }
        // Root set goes to the back.
        let mut lim = bfs.order.len();
        for i in (0..bfs.order.len()).rev() {
            let n = bfs.order[i];
            let any_visited = g
                .inputs(n)
                .iter()
                .flatten()
                .any(|&d| bfs.on[d.index()]);
            if !any_visited {
                lim -= 1;
                bfs.order.swap(i, lim);
            }
        }
        bfs.lim = lim;
        bfs
    }

    fn add(&mut self, n: NodeId) {
        self.order.push(n);
        self.on[n.index()] = true;
    }
}
