//! Recursive-descent parser that builds the node graph directly.
//!
//! There is no AST: each grammar production creates nodes and immediately
//! peepholes them, so the graph under construction is always in canonical
//! form. Name bindings live in a scope node (see [`crate::ir::scope`]),
//! control flow splits and merges by cloning and merging scopes.

use hashbrown::HashSet;
use once_cell::sync::Lazy;

use crate::{
    Compilation,
    error::{CResult, CompileError},
    ir::{
        Graph, NodeId,
        op::{BoolOp, Op, ProjOp},
        scope,
        ty::Ty,
    },
};

use super::lexer::Lexer;

/// Names that cannot be used as identifiers.
static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from_iter([
        "break", "continue", "else", "false", "if", "int", "return", "true", "while",
    ])
});

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    graph: Graph,
    /// The current scope; changes as control flow branches.
    scope: NodeId,
    /// Merge target for `break`, cloned from the scope at loop entry.
    /// `None` outside any loop.
    break_scope: Option<NodeId>,
    /// Merge target for `continue`; created lazily by the first continue.
    continue_scope: Option<NodeId>,
}

impl<'a> Parser<'a> {
    /// A parser for a program whose argument is unknown at compile time.
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser::make(source, None)
    }

    /// A parser that compiles the program for one known argument value.
    pub fn with_arg(source: &'a str, arg: i64) -> Parser<'a> {
        Parser::make(source, Some(arg))
    }

    /// Build the graph without rewriting: every node keeps its computed
    /// type but no folding happens. For inspecting raw construction.
    pub fn disable_peephole(mut self) -> Parser<'a> {
        self.graph.disable_peephole = true;
        self
    }

    fn make(source: &'a str, arg: Option<i64>) -> Parser<'a> {
        let mut graph = Graph::new(arg);
        let scope = graph.new_scope();
        Parser {
            lexer: Lexer::new(source),
            graph,
            scope,
            break_scope: None,
            continue_scope: None,
        }
    }

    /// Parse the whole program. The outermost frame binds the incoming
    /// control and the program argument as projections off `Start`.
    pub fn parse(mut self) -> CResult<Compilation> {
        self.graph.scope_push(self.scope);
        let start = self.graph.start;
        let c = self.graph.create(
            Op::Proj(ProjOp {
                index: 0,
                label: scope::CTRL,
            }),
            vec![Some(start)],
        );
        let c = self.graph.peephole(c)?;
        self.graph.scope_define(self.scope, scope::CTRL, c)?;
        let arg = self.graph.create(
            Op::Proj(ProjOp {
                index: 1,
                label: scope::ARG,
            }),
            vec![Some(start)],
        );
        let arg = self.graph.peephole(arg)?;
        self.graph.scope_define(self.scope, scope::ARG, arg)?;

        self.parse_block()?;
        self.graph.scope_pop(self.scope);
        if !self.lexer.is_eof() {
            return Err(CompileError::new(format!(
                "Syntax error, unexpected {}",
                self.lexer.any_next_token()
            )));
        }
        let stop = self.graph.stop;
        self.graph.peephole(stop)?;
        Ok(Compilation {
            graph: self.graph,
            stop,
        })
    }

    fn ctrl(&self) -> NodeId {
        self.graph
            .scope_ctrl(self.scope)
            .expect("scope always binds control")
    }

    fn set_ctrl(&mut self, c: NodeId) {
        let scope = self.scope;
        self.graph.scope_set_ctrl(scope, c);
    }

    // ------------------------------------------------------------------
    // Statements

    fn parse_block(&mut self) -> CResult<()> {
        self.graph.scope_push(self.scope);
        while !self.lexer.peek_is('}') && !self.lexer.is_eof() {
            self.parse_statement()?;
        }
        self.graph.scope_pop(self.scope);
        Ok(())
    }

    fn parse_statement(&mut self) -> CResult<()> {
        if self.lexer.eat_word("return") {
            self.parse_return()
        } else if self.lexer.eat_word("int") {
            self.parse_decl()
        } else if self.lexer.eat("{") {
            self.parse_block()?;
            self.require("}")
        } else if self.lexer.eat_word("if") {
            self.parse_if()
        } else if self.lexer.eat_word("while") {
            self.parse_while()
        } else if self.lexer.eat_word("break") {
            self.parse_break()
        } else if self.lexer.eat_word("continue") {
            self.parse_continue()
        } else {
            self.parse_expression_statement()
        }
    }

    /// `return expr ;` hangs a `Return` off `Stop` and kills the current
    /// control, so anything after it folds away as unreachable.
    fn parse_return(&mut self) -> CResult<()> {
        let expr = self.parse_expression()?;
        self.require(";")?;
        let ctrl = self.ctrl();
        let ret = self
            .graph
            .create(Op::Return, vec![Some(ctrl), Some(expr)]);
        let ret = self.graph.peephole(ret)?;
        let stop = self.graph.stop;
        self.graph.add_def(stop, Some(ret));
        let dead = self.graph.con_ty(Ty::XCTRL)?;
        self.set_ctrl(dead);
        Ok(())
    }

    fn parse_decl(&mut self) -> CResult<()> {
        let name = self.require_id()?;
        self.require("=")?;
        let expr = self.parse_expression()?;
        self.require(";")?;
        let scope = self.scope;
        self.graph.scope_define(scope, &name, expr)
    }

    fn parse_expression_statement(&mut self) -> CResult<()> {
        let name = self.require_id()?;
        self.require("=")?;
        let expr = self.parse_expression()?;
        self.require(";")?;
        let scope = self.scope;
        self.graph.scope_update(scope, &name, expr)
    }

    fn parse_if(&mut self) -> CResult<()> {
        self.require("(")?;
        let pred = self.parse_expression()?;
        self.require(")")?;
        let ctrl = self.ctrl();
        let iff = self.graph.create(Op::If, vec![Some(ctrl), Some(pred)]);
        // Pin the test while its projections are built; the first
        // projection may fold and take the test's last use with it.
        self.graph.keep(iff);
        let iff = self.graph.peephole(iff)?;
        let if_t = self.graph.create(
            Op::Proj(ProjOp {
                index: 0,
                label: "True",
            }),
            vec![Some(iff)],
        );
        let if_t = self.graph.peephole(if_t)?;
        self.graph.unkeep(iff);
        let if_f = self.graph.create(
            Op::Proj(ProjOp {
                index: 1,
                label: "False",
            }),
            vec![Some(iff)],
        );
        let if_f = self.graph.peephole(if_f)?;

        let ndefs = self.graph.n_ins(self.scope);
        let false_scope = self.graph.scope_dup(self.scope, false)?;

        // True side.
        self.set_ctrl(if_t);
        self.parse_statement()?;
        let true_scope = self.scope;

        // False side.
        self.scope = false_scope;
        self.set_ctrl(if_f);
        let mut false_scope = false_scope;
        if self.lexer.eat_word("else") {
            self.parse_statement()?;
            false_scope = self.scope;
        }

        if self.graph.n_ins(true_scope) != ndefs || self.graph.n_ins(false_scope) != ndefs {
            return Err(CompileError::new(
                "Cannot define a new name on one arm of an if",
            ));
        }

        self.scope = true_scope;
        let merged = self.graph.merge_scopes(true_scope, false_scope)?;
        self.graph.scope_set_ctrl(true_scope, merged);
        Ok(())
    }

    fn parse_while(&mut self) -> CResult<()> {
        self.require("(")?;

        let saved_continue = self.continue_scope.take();
        let saved_break = self.break_scope.take();

        // The loop's back edge stays open until the body is parsed;
        // the open edge disables peepholes on the loop and its phis.
        let entry = self.ctrl();
        let head_ctrl = self
            .graph
            .create(Op::Loop, vec![None, Some(entry), None]);
        let head_ctrl = self.graph.peephole(head_ctrl)?;
        self.set_ctrl(head_ctrl);

        // The head scope pins the eager loop phis; the body parses in a
        // clone of it.
        let head = self.graph.keep(self.scope);
        self.scope = self.graph.scope_dup(head, true)?;

        let pred = self.parse_expression()?;
        self.require(")")?;
        let ctrl = self.ctrl();
        let iff = self.graph.create(Op::If, vec![Some(ctrl), Some(pred)]);
        self.graph.keep(iff);
        let iff = self.graph.peephole(iff)?;
        let if_t = self.graph.create(
            Op::Proj(ProjOp {
                index: 0,
                label: "True",
            }),
            vec![Some(iff)],
        );
        let if_t = self.graph.peephole(if_t)?;
        self.graph.unkeep(iff);
        let if_f = self.graph.create(
            Op::Proj(ProjOp {
                index: 1,
                label: "False",
            }),
            vec![Some(iff)],
        );
        let if_f = self.graph.peephole(if_f)?;

        // The exit scope is cloned after the predicate so it sees any of
        // its side effects; its control is the test's false arm.
        self.set_ctrl(if_f);
        let exit = self.graph.scope_dup(self.scope, false)?;
        self.break_scope = Some(exit);
        self.continue_scope = None;

        self.set_ctrl(if_t);
        self.parse_statement()?;

        // Merge the loop bottom into any continue statements.
        if let Some(cont) = self.continue_scope.take() {
            let cont = self.jump_to(Some(cont))?;
            let body = self.scope;
            self.graph.kill(body);
            self.scope = cont;
        }

        if self.graph.n_ins(self.scope) != self.graph.n_ins(head) {
            return Err(CompileError::new("Cannot define a new name in a while loop"));
        }

        // Whatever control reaches the loop bottom becomes the back edge;
        // the eager phis get their second operand and fold if redundant.
        let body = self.scope;
        self.graph.end_loop(head, body)?;
        self.graph.unkeep(head);
        self.graph.kill(head);

        let exit = self
            .break_scope
            .take()
            .expect("break scope survives its own loop");
        self.continue_scope = saved_continue;
        self.break_scope = saved_break;
        self.scope = exit;
        Ok(())
    }

    fn parse_break(&mut self) -> CResult<()> {
        self.check_loop_active()?;
        let target = self.jump_to(self.break_scope)?;
        self.break_scope = Some(target);
        self.require(";")
    }

    fn parse_continue(&mut self) -> CResult<()> {
        self.check_loop_active()?;
        let target = self.jump_to(self.continue_scope)?;
        self.continue_scope = Some(target);
        self.require(";")
    }

    fn check_loop_active(&self) -> CResult<()> {
        if self.break_scope.is_none() {
            return Err(CompileError::new("No active loop for a break or continue"));
        }
        Ok(())
    }

    /// Route the current control into `target` (a break or continue merge
    /// scope) and kill the fallthrough path. The first continue has no
    /// target yet and just becomes one.
    fn jump_to(&mut self, target: Option<NodeId>) -> CResult<NodeId> {
        let cur = self.graph.scope_dup(self.scope, false)?;
        let dead = self.graph.con_ty(Ty::XCTRL)?;
        self.set_ctrl(dead);
        // Unwind frames opened inside the loop body; the break scope
        // carries the depth at loop entry.
        let break_depth = self.graph.scope_depth(
            self.break_scope
                .expect("loop activity was checked"),
        );
        while self.graph.scope_depth(cur) > break_depth {
            self.graph.scope_pop(cur);
        }
        match target {
            None => Ok(cur),
            Some(t) => {
                debug_assert!(self.graph.scope_depth(t) <= break_depth);
                let merged = self.graph.merge_scopes(t, cur)?;
                self.graph.scope_set_ctrl(t, merged);
                Ok(t)
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions. Each level builds its node with the right-hand side
    // still vacant, so the left-hand side is hooked as an input and safe
    // from collection while the right-hand side parses.

    fn parse_expression(&mut self) -> CResult<NodeId> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> CResult<NodeId> {
        let mut lhs = self.parse_addition()?;
        loop {
            // Order matters below: two-character operators first.
            let (op, idx, negate) = if self.lexer.eat("==") {
                (BoolOp::Eq, 2, false)
            } else if self.lexer.eat("!=") {
                (BoolOp::Eq, 2, true)
            } else if self.lexer.eat("<=") {
                (BoolOp::Le, 2, false)
            } else if self.lexer.eat("<") {
                (BoolOp::Lt, 2, false)
            } else if self.lexer.eat(">=") {
                (BoolOp::Le, 1, false)
            } else if self.lexer.eat(">") {
                (BoolOp::Lt, 1, false)
            } else {
                break;
            };
            // Greater-than swaps its operands into a less-than.
            let inputs = if idx == 2 {
                vec![None, Some(lhs), None]
            } else {
                vec![None, None, Some(lhs)]
            };
            let node = self.graph.create(Op::Bool(op), inputs);
            let rhs = self.parse_addition()?;
            self.graph.set_def(node, idx, Some(rhs));
            lhs = self.graph.peephole(node)?;
            if negate {
                let not = self.graph.create(Op::Not, vec![None, Some(lhs)]);
                lhs = self.graph.peephole(not)?;
            }
        }
        Ok(lhs)
    }

    fn parse_addition(&mut self) -> CResult<NodeId> {
        let mut lhs = self.parse_multiplication()?;
        loop {
            let op = if self.lexer.eat("+") {
                Op::Add
            } else if self.lexer.eat("-") {
                Op::Sub
            } else {
                break;
            };
            let node = self.graph.create(op, vec![None, Some(lhs), None]);
            let rhs = self.parse_multiplication()?;
            self.graph.set_def(node, 2, Some(rhs));
            lhs = self.graph.peephole(node)?;
        }
        Ok(lhs)
    }

    fn parse_multiplication(&mut self) -> CResult<NodeId> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = if self.lexer.eat("*") {
                Op::Mul
            } else if self.lexer.eat("/") {
                Op::Div
            } else {
                break;
            };
            let node = self.graph.create(op, vec![None, Some(lhs), None]);
            let rhs = self.parse_unary()?;
            self.graph.set_def(node, 2, Some(rhs));
            lhs = self.graph.peephole(node)?;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> CResult<NodeId> {
        if self.lexer.eat("-") {
            let operand = self.parse_unary()?;
            let neg = self.graph.create(Op::Minus, vec![None, Some(operand)]);
            return self.graph.peephole(neg);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> CResult<NodeId> {
        if self.lexer.peek_number() {
            let value = self.lexer.parse_number()?;
            return self.graph.con_int(value);
        }
        if self.lexer.eat("(") {
            let expr = self.parse_expression()?;
            self.require(")")?;
            return Ok(expr);
        }
        if self.lexer.eat_word("true") {
            return self.graph.con_int(1);
        }
        if self.lexer.eat_word("false") {
            return self.graph.con_int(0);
        }
        match self.lexer.match_id() {
            None => Err(self.error_syntax("an identifier or expression")),
            Some(name) => self.graph.scope_lookup(self.scope, &name),
        }
    }

    // ------------------------------------------------------------------
    // Token helpers

    fn require(&mut self, syntax: &str) -> CResult<()> {
        if self.lexer.eat(syntax) {
            Ok(())
        } else {
            Err(self.error_syntax(syntax))
        }
    }

    fn require_id(&mut self) -> CResult<String> {
        match self.lexer.match_id() {
            Some(id) if !KEYWORDS.contains(id.as_str()) => Ok(id),
            Some(id) => Err(CompileError::new(format!(
                "Expected an identifier, found '{id}'"
            ))),
            None => Err(self.error_syntax("an identifier")),
        }
    }

    fn error_syntax(&mut self, expected: &str) -> CompileError {
        CompileError::new(format!(
            "Syntax error, expected {expected}: {}",
            self.lexer.any_next_token()
        ))
    }
}
