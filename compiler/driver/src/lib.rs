//! The `Context` owning a single run's mutable state, and the `compile`
//! pipeline sequencing evaluator -> CNF converter -> clause emitter
//! (spec §5, §6).
//!
//! One `Context` is constructed per `compile()` call; nothing here is
//! shared across calls, so reentrancy (compiling two independent programs
//! concurrently on separate threads) is safe by construction rather than by
//! locking (spec §9: "Mutable globals → explicit context").

pub use touist_eval::{EmptyGeneratorPolicy, Options};

use touist_ast::Ast;
use touist_cnf::{Clause, FreshNames};
use touist_emit::{to_int_clauses, write_dimacs, write_table, IntClause, NameTable};
use touist_errors::{DiagnosticSink, Result};
use touist_eval::{eval_program, GlobalEnv};

/// Per-run state: the global environment populated from top-level `Affect`s,
/// the Tseytin fresh-name counter, and the accumulated diagnostics.
#[derive(Default)]
pub struct Context {
    pub globals: GlobalEnv,
    pub fresh: FreshNames,
    pub sink: DiagnosticSink,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the full pipeline over a parsed program: evaluate to a ground
    /// formula, Tseytin-convert to clauses, then intern proposition names
    /// into a DIMACS-ready table.
    ///
    /// Matches spec §2's data flow: "... -> Evaluator (global + local env) ->
    /// normalised formula AST -> CNF converter -> clause set + name table ->
    /// DIMACS/QDIMACS emitter".
    pub fn compile(&mut self, program: &Ast, opts: &Options) -> Result<CompileOutput> {
        let formula = eval_program(program, &mut self.globals, opts, &mut self.sink)?;
        log::debug!("evaluator produced a ground formula: {formula}");

        let clauses = touist_cnf::to_cnf(&formula, &mut self.fresh)?;
        log::debug!("CNF conversion produced {} clauses", clauses.len());

        let mut table = NameTable::new();
        let int_clauses = to_int_clauses(&clauses, &mut table)?;

        Ok(CompileOutput { formula, clauses, table, int_clauses })
    }
}

/// The result of a full `compile()` run: every intermediate artefact a
/// caller might want, so a linter can stop after `formula` and a DIMACS
/// writer can go all the way to `dimacs()`.
pub struct CompileOutput {
    pub formula: Ast,
    pub clauses: Vec<Clause>,
    pub table: NameTable,
    pub int_clauses: Vec<IntClause>,
}

impl CompileOutput {
    pub fn dimacs(&self) -> String {
        write_dimacs(&self.int_clauses, &self.table)
    }

    pub fn table_file(&self, as_comments: bool) -> String {
        write_table(&self.table, as_comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use touist_ast::Ast;

    fn prop(name: &str) -> Ast {
        Ast::UnexpProp { name: name.into(), indices: None }
    }

    #[test]
    fn compiling_a_simple_conjunction_yields_two_unit_clauses() {
        let program = Ast::TouistCode(vec![Ast::And(Box::new(prop("a")), Box::new(prop("b")))]);
        let mut ctx = Context::new();
        let output = ctx.compile(&program, &Options::new()).unwrap();
        assert_eq!(output.clauses.len(), 2);
        assert_eq!(output.table.len(), 2);
        let dimacs = output.dimacs();
        assert!(dimacs.starts_with("p cnf 2 2\n"));
    }

    #[test]
    fn compiling_an_exact_constraint_produces_the_expected_clause_shape() {
        // exact(1, [a, b]) over a two-element propset: at-least-one clause
        // plus the pairwise at-most-one clause.
        let program = Ast::TouistCode(vec![Ast::Exact {
            n: Box::new(Ast::Int(1)),
            set: Box::new(Ast::PropSet(vec!["a".into(), "b".into()])),
        }]);
        let mut ctx = Context::new();
        let output = ctx.compile(&program, &Options::new()).unwrap();
        assert_eq!(output.clauses.len(), 2);
    }

    #[test]
    fn an_unbound_name_surfaces_as_an_error_from_compile() {
        let program = Ast::TouistCode(vec![Ast::Var { prefix: "$missing".into(), indices: None }]);
        let mut ctx = Context::new();
        assert!(ctx.compile(&program, &Options::new()).is_err());
    }
}
