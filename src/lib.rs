//! Eddy: a sea-of-nodes optimizing compiler front end.
//!
//! Programs are parsed straight into a graph intermediate representation
//! where control and data flow share one node space. Local rewrites run
//! during construction and a worklist pass drives them to a global
//! fixpoint afterwards.

pub mod error;
pub mod frontend;
pub mod index;
pub mod ir;

pub use error::{CResult, CompileError};
pub use frontend::parser::Parser;
pub use ir::{Graph, NodeId};

/// A parsed program: the graph plus its `Stop` node.
pub struct Compilation {
    pub graph: Graph,
    pub stop: NodeId,
}

impl std::fmt::Debug for Compilation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.print())
    }
}

impl Compilation {
    /// Drive the pending peephole worklist to a fixpoint.
    pub fn iterate(&mut self) -> CResult<()> {
        self.graph.iterate()
    }

    /// The canonical expression form of the program.
    pub fn print(&self) -> String {
        ir::print::print_node(&self.graph, self.stop)
    }

    /// A columnar whole-graph listing.
    pub fn pretty_print(&self) -> String {
        ir::print::pretty_print(&self.graph, self.stop, 99)
    }

    /// Interpret the program with the default loop fuel; `None` means it
    /// ran too long.
    pub fn evaluate(&self, arg: i64) -> Option<i64> {
        ir::eval::evaluate(&self.graph, self.stop, arg, ir::eval::DEFAULT_FUEL)
    }

    pub fn evaluate_with_fuel(&self, arg: i64, fuel: usize) -> Option<i64> {
        ir::eval::evaluate(&self.graph, self.stop, arg, fuel)
    }
}

/// Parse and fully optimize a program.
pub fn compile(source: &str) -> CResult<Compilation> {
    let mut compilation = Parser::new(source).parse()?;
    compilation.iterate()?;
    Ok(compilation)
}

/// Parse and fully optimize a program against one known argument value.
pub fn compile_with_arg(source: &str, arg: i64) -> CResult<Compilation> {
    let mut compilation = Parser::with_arg(source, arg).parse()?;
    compilation.iterate()?;
    Ok(compilation)
}
