//! The tagged AST for the TouIST core (spec §3), shared by the evaluator
//! (`touist-eval`), the CNF converter (`touist-cnf`), and the clause emitter
//! (`touist-emit`).

mod ast;
mod display;

pub use ast::{Ast, VarList};
pub use touist_span::{Pos, Span};
