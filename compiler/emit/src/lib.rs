//! Clause emitter: name/integer table and DIMACS/QDIMACS writers (spec §4.9).
//!
//! Takes the clause list `touist-cnf` produces (`Vec<Vec<Ast>>` of `Prop`/
//! `Not(Prop)` literals) and turns it into the integer-keyed form a DIMACS or
//! QDIMACS solver expects: every distinct proposition name is assigned a
//! unique positive integer on first encounter, literals become signed
//! integers, and the result is serialised with the preamble line the format
//! requires.

mod table;

pub use table::NameTable;

use touist_ast::Ast;
use touist_cnf::Clause;
use touist_errors::{Result, TouistError};

/// A clause rewritten as signed integers: positive for an asserted
/// proposition, negative for its negation, matching DIMACS literal encoding.
pub type IntClause = Vec<i64>;

/// Walks `clauses`, interning every proposition name into `table` in
/// first-encounter order, and returns the same clauses rewritten as signed
/// integers.
pub fn to_int_clauses(clauses: &[Clause], table: &mut NameTable) -> Result<Vec<IntClause>> {
    clauses
        .iter()
        .map(|clause| {
            clause
                .iter()
                .map(|literal| int_literal(literal, table))
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn int_literal(literal: &Ast, table: &mut NameTable) -> Result<i64> {
    match literal {
        Ast::Prop(name) => Ok(table.intern(name) as i64),
        Ast::Not(inner) => match inner.as_ref() {
            Ast::Prop(name) => Ok(-(table.intern(name) as i64)),
            _ => Err(TouistError::shape(format!("expected a negated proposition literal, found `{inner}`"))),
        },
        other => Err(TouistError::shape(format!("expected a CNF literal (Prop or Not(Prop)), found `{other}`"))),
    }
}

/// Renders `clauses` as a DIMACS CNF stream: a `p cnf <vars> <clauses>`
/// preamble followed by one space-separated, `0`-terminated line per clause.
pub fn write_dimacs(clauses: &[IntClause], table: &NameTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", table.len(), clauses.len()));
    for clause in clauses {
        for lit in clause {
            out.push_str(&lit.to_string());
            out.push(' ');
        }
        out.push_str("0\n");
    }
    out
}

/// Renders the name table as `c <name> <int>` comment lines, in assignment
/// order, suitable for interleaving into a DIMACS stream or writing as a
/// standalone table file (spec §6.2: "one line per proposition, formatted
/// `<name> <int>`; if mixed with the CNF stream, each table line is prefixed
/// by `c `").
pub fn write_table(table: &NameTable, as_comments: bool) -> String {
    let mut out = String::new();
    for (name, id) in table.entries() {
        if as_comments {
            out.push_str(&format!("c {name} {id}\n"));
        } else {
            out.push_str(&format!("{name} {id}\n"));
        }
    }
    out
}

/// A QBF quantifier kind, for grouping the QDIMACS prefix's `a`/`e` lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantifier {
    Forall,
    Exists,
}

/// One block of the prenex quantifier prefix: a kind plus the variable ids
/// it binds, in binding order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantifierBlock {
    pub kind: Quantifier,
    pub vars: Vec<u32>,
}

/// Renders `clauses` as QDIMACS: the DIMACS preamble, then one `a`/`e` line
/// per entry of `prefix` (consecutive same-kind blocks are not merged here —
/// callers are expected to have already grouped consecutive same-kind
/// quantifiers per spec §4.9), then the clause lines.
///
/// Every name interned in `table` that is not already bound by `prefix` is
/// folded into a trailing existential block — this is how Tseytin auxiliary
/// propositions (never part of the user's original quantifier prefix) end up
/// "existentially quantified at the innermost scope", per spec §4.9, without
/// every caller having to remember to add them by hand.
pub fn write_qdimacs(clauses: &[IntClause], table: &NameTable, prefix: &[QuantifierBlock]) -> String {
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", table.len(), clauses.len()));

    let bound: std::collections::HashSet<u32> = prefix.iter().flat_map(|b| b.vars.iter().copied()).collect();
    for block in prefix {
        write_quantifier_line(&mut out, block.kind, &block.vars);
    }
    let trailing: Vec<u32> = table.entries().map(|(_, id)| id).filter(|id| !bound.contains(id)).collect();
    if !trailing.is_empty() {
        write_quantifier_line(&mut out, Quantifier::Exists, &trailing);
    }

    for clause in clauses {
        for lit in clause {
            out.push_str(&lit.to_string());
            out.push(' ');
        }
        out.push_str("0\n");
    }
    out
}

fn write_quantifier_line(out: &mut String, kind: Quantifier, vars: &[u32]) {
    out.push_str(match kind {
        Quantifier::Forall => "a ",
        Quantifier::Exists => "e ",
    });
    for v in vars {
        out.push_str(&v.to_string());
        out.push(' ');
    }
    out.push_str("0\n");
}

/// True for a Tseytin auxiliary name (`&1`, `&2`, ...), i.e. a name that
/// cannot have come from user source (spec §4.8: user propositions cannot
/// start with `&`).
pub fn is_auxiliary_name(name: &str) -> bool {
    name.starts_with('&')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Ast {
        Ast::Prop(name.to_string())
    }
    fn np(name: &str) -> Ast {
        Ast::Not(Box::new(p(name)))
    }

    #[test]
    fn names_are_assigned_integers_in_first_encounter_order() {
        let clauses = vec![vec![p("b"), np("a")], vec![p("a")]];
        let mut table = NameTable::new();
        let int_clauses = to_int_clauses(&clauses, &mut table).unwrap();
        assert_eq!(table.id_of("b"), Some(1));
        assert_eq!(table.id_of("a"), Some(2));
        assert_eq!(int_clauses, vec![vec![1, -2], vec![2]]);
    }

    #[test]
    fn dimacs_preamble_reports_variable_and_clause_counts() {
        let clauses = vec![vec![p("a"), p("b")], vec![np("a")]];
        let mut table = NameTable::new();
        let int_clauses = to_int_clauses(&clauses, &mut table).unwrap();
        let dimacs = write_dimacs(&int_clauses, &table);
        let mut lines = dimacs.lines();
        assert_eq!(lines.next(), Some("p cnf 2 2"));
        assert_eq!(lines.next(), Some("1 2 0"));
        assert_eq!(lines.next(), Some("-1 0"));
    }

    #[test]
    fn a_non_literal_clause_member_is_a_shape_error() {
        let clauses = vec![vec![Ast::Top]];
        let mut table = NameTable::new();
        assert!(to_int_clauses(&clauses, &mut table).is_err());
    }

    #[test]
    fn table_file_lines_are_comment_prefixed_when_interleaved() {
        let mut table = NameTable::new();
        table.intern("p(1)");
        table.intern("q");
        assert_eq!(write_table(&table, true), "c p(1) 1\nc q 2\n");
        assert_eq!(write_table(&table, false), "p(1) 1\nq 2\n");
    }

    #[test]
    fn qdimacs_groups_the_given_prefix_and_folds_auxiliaries_into_a_trailing_existential_block() {
        let clauses = vec![vec![p("x"), p("&1")], vec![np("&1"), p("y")]];
        let mut table = NameTable::new();
        let int_clauses = to_int_clauses(&clauses, &mut table).unwrap();
        let x_id = table.id_of("x").unwrap();
        let y_id = table.id_of("y").unwrap();
        let prefix = vec![
            QuantifierBlock { kind: Quantifier::Forall, vars: vec![x_id] },
            QuantifierBlock { kind: Quantifier::Exists, vars: vec![y_id] },
        ];
        let qdimacs = write_qdimacs(&int_clauses, &table, &prefix);
        let mut lines = qdimacs.lines();
        assert_eq!(lines.next(), Some("p cnf 3 2"));
        assert_eq!(lines.next(), Some(format!("a {x_id} 0")).as_deref());
        assert_eq!(lines.next(), Some(format!("e {y_id} 0")).as_deref());
        let aux_line = lines.next().unwrap();
        assert!(aux_line.starts_with("e "));
        let aux_id = table.id_of("&1").unwrap();
        assert!(aux_line.contains(&aux_id.to_string()));
    }

    #[test]
    fn qdimacs_prefix_is_empty_for_a_purely_propositional_problem() {
        let clauses = vec![vec![p("a")]];
        let mut table = NameTable::new();
        let int_clauses = to_int_clauses(&clauses, &mut table).unwrap();
        let qdimacs = write_qdimacs(&int_clauses, &table, &[]);
        let mut lines = qdimacs.lines();
        assert_eq!(lines.next(), Some("p cnf 1 1"));
        assert_eq!(lines.next(), Some("e 1 0"));
        assert_eq!(lines.next(), Some("1 0"));
    }

    #[test]
    fn is_auxiliary_name_matches_the_fresh_name_prefix() {
        assert!(is_auxiliary_name("&42"));
        assert!(!is_auxiliary_name("p"));
    }
}
