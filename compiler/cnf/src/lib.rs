//! Tseytin CNF conversion (spec §4.8).
//!
//! Takes an evaluated formula (`Top`/`Bottom`/`Prop`/`Not`/`And`/`Or`/`Xor`/
//! `Implies`/`Equiv`) and produces an equisatisfiable formula built only of
//! `Top`/`Bottom`/`Prop`/`Not`/`And`/`Or` — the shape [`touist_ast::Ast::is_forbidden_in_cnf`]
//! checks for. Connectives other than `And`/`Or`/`Not` are rewritten away
//! first; once a disjunction's operands are themselves conjunctions, fresh
//! auxiliary propositions are introduced so the result stays CNF-sized
//! instead of exploding through naive distribution.

use touist_ast::Ast;
use touist_errors::{Result, TouistError};

/// Hands out fresh auxiliary proposition names (`&1`, `&2`, ...), mirroring
/// the `&`-prefixed naming the reference implementation uses for Tseytin
/// variables so they can never collide with a user-written proposition
/// (which cannot start with `&`).
#[derive(Default, Debug)]
pub struct FreshNames {
    next: u64,
}

impl FreshNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> String {
        self.next += 1;
        format!("&{}", self.next)
    }
}

/// A CNF clause: a disjunction of literals, each either `Prop(name)` or
/// `Not(Prop(name))`.
pub type Clause = Vec<Ast>;

/// Converts `formula` (already evaluated, see `touist-eval`) into a list of
/// clauses equisatisfiable with it, introducing fresh auxiliaries from
/// `fresh` as needed.
///
/// `Top`/`Bottom` at the root produce the textbook tautology/contradiction
/// encoding over a fresh auxiliary (`a ∨ ¬a`, `a ∧ ¬a`) rather than an empty
/// clause list, matching the DIMACS convention that an empty CNF has no
/// constraints at all but a contradiction must still be representable as a
/// clause.
pub fn to_cnf(formula: &Ast, fresh: &mut FreshNames) -> Result<Vec<Clause>> {
    let nnf = to_nnf(formula, false);
    match &nnf {
        Ast::Top => {
            let a = fresh.next();
            Ok(vec![vec![Ast::Prop(a.clone()), Ast::Not(Box::new(Ast::Prop(a)))]])
        }
        Ast::Bottom => {
            let a = fresh.next();
            Ok(vec![vec![Ast::Prop(a.clone())], vec![Ast::Not(Box::new(Ast::Prop(a)))]])
        }
        _ => {
            let mut clauses = Vec::new();
            let mut aux_clauses = Vec::new();
            collect_and(&nnf, &mut clauses, &mut aux_clauses, fresh)?;
            clauses.extend(aux_clauses);
            Ok(clauses)
        }
    }
}

/// Converts `formula` to negation normal form: `Not` pushed down to literals
/// via De Morgan, `Implies`/`Equiv`/`Xor` rewritten in terms of `And`/`Or`/
/// `Not` first. `negate` tracks whether the enclosing context has an odd
/// number of pending negations still to push through.
fn to_nnf(formula: &Ast, negate: bool) -> Ast {
    match formula {
        Ast::Top => lit(negate, Ast::Top, Ast::Bottom),
        Ast::Bottom => lit(negate, Ast::Bottom, Ast::Top),
        Ast::Prop(_) => {
            if negate {
                Ast::Not(Box::new(formula.clone()))
            } else {
                formula.clone()
            }
        }
        Ast::Not(a) => to_nnf(a, !negate),
        Ast::And(a, b) => {
            let (l, r) = (to_nnf(a, negate), to_nnf(b, negate));
            if negate {
                Ast::Or(Box::new(l), Box::new(r))
            } else {
                Ast::And(Box::new(l), Box::new(r))
            }
        }
        Ast::Or(a, b) => {
            let (l, r) = (to_nnf(a, negate), to_nnf(b, negate));
            if negate {
                Ast::And(Box::new(l), Box::new(r))
            } else {
                Ast::Or(Box::new(l), Box::new(r))
            }
        }
        // a => b  ==  -a or b
        Ast::Implies(a, b) => to_nnf(&Ast::Or(Box::new(Ast::Not(a.clone())), b.clone()), negate),
        // a <=> b  ==  (a => b) and (b => a), never the duplicated-clause
        // shortcut some references take.
        Ast::Equiv(a, b) => to_nnf(
            &Ast::And(
                Box::new(Ast::Implies(a.clone(), b.clone())),
                Box::new(Ast::Implies(b.clone(), a.clone())),
            ),
            negate,
        ),
        // a xor b  ==  (a or b) and (-a or -b)
        Ast::Xor(a, b) => to_nnf(
            &Ast::And(
                Box::new(Ast::Or(a.clone(), b.clone())),
                Box::new(Ast::Or(Box::new(Ast::Not(a.clone())), Box::new(Ast::Not(b.clone())))),
            ),
            negate,
        ),
        other => other.clone(),
    }
}

fn lit(negate: bool, if_false: Ast, if_true: Ast) -> Ast {
    if negate {
        if_true
    } else {
        if_false
    }
}

/// The result of forcing an arbitrarily-nested sub-formula down to a single
/// literal (or a known constant), used whenever a node appears in a position
/// whose polarity doesn't match its own connective (an `And` found inside an
/// `Or`, or vice versa).
enum Reduced {
    True,
    False,
    Lit(Ast),
}

/// Splits the top-level conjunction chain of an NNF formula into clauses.
/// Recurses through `And` at any depth — conjunction is associative, so
/// `And(And(a,b),c)` and `And(a,And(b,c))` both just flatten to three
/// conjuncts. Each conjunct becomes one clause via [`collect_or`]; clauses
/// defining an auxiliary introduced along the way are appended to
/// `aux_clauses` rather than `clauses`, so a branch later in the chain can't
/// see an earlier branch's auxiliaries.
fn collect_and(node: &Ast, clauses: &mut Vec<Clause>, aux_clauses: &mut Vec<Clause>, fresh: &mut FreshNames) -> Result<()> {
    for conjunct in flatten_and(node) {
        match &conjunct {
            Ast::Top => {}
            Ast::Bottom => clauses.push(vec![]),
            _ => {
                if let Some(clause) = collect_or(&conjunct, aux_clauses, fresh)? {
                    clauses.push(clause);
                }
            }
        }
    }
    Ok(())
}

/// Flattens a disjunction into a single clause. Recurses through `Or` at any
/// depth the same way [`collect_and`] recurses through `And`. An `And`
/// operand can't be flattened into the clause directly (that would change
/// its meaning), so it is reduced to a single literal via
/// [`ensure_and_literal`] first — introducing a Tseytin auxiliary only when
/// the conjunction has more than one literal. Returns `None` when the
/// disjunction is tautological (a `Top` operand anywhere), signalling the
/// caller to drop the clause entirely rather than emit a vacuous one.
fn collect_or(node: &Ast, aux_clauses: &mut Vec<Clause>, fresh: &mut FreshNames) -> Result<Option<Clause>> {
    let mut clause = Vec::new();
    for disjunct in flatten_or(node) {
        match &disjunct {
            Ast::Top => return Ok(None),
            Ast::Bottom => {}
            Ast::Prop(_) | Ast::Not(_) => clause.push(disjunct),
            Ast::And(_, _) => match ensure_and_literal(&disjunct, aux_clauses, fresh)? {
                Reduced::True => return Ok(None),
                Reduced::False => {}
                Reduced::Lit(l) => clause.push(l),
            },
            other => return Err(TouistError::shape(format!("formula contains a non-clausal node after NNF conversion: {other}"))),
        }
    }
    Ok(Some(clause))
}

/// Reduces an arbitrarily-nested conjunction to a single literal, avoiding an
/// auxiliary variable when the conjunction already boils down to zero or one
/// literals (the common case for a cardinality constraint's singleton
/// conjuncts).
fn ensure_and_literal(node: &Ast, aux_clauses: &mut Vec<Clause>, fresh: &mut FreshNames) -> Result<Reduced> {
    let mut literals = Vec::new();
    for conjunct in flatten_and(node) {
        match &conjunct {
            Ast::Top => {}
            Ast::Bottom => return Ok(Reduced::False),
            Ast::Prop(_) | Ast::Not(_) => literals.push(conjunct),
            Ast::Or(_, _) => match reduce_or(&conjunct, aux_clauses, fresh)? {
                Reduced::True => {}
                Reduced::False => return Ok(Reduced::False),
                Reduced::Lit(l) => literals.push(l),
            },
            other => return Err(TouistError::shape(format!("formula contains a non-clausal node after NNF conversion: {other}"))),
        }
    }
    match literals.len() {
        0 => Ok(Reduced::True),
        1 => Ok(Reduced::Lit(literals.into_iter().next().expect("len checked"))),
        _ => {
            let aux = fresh.next();
            let aux_prop = Ast::Prop(aux);
            // z => l_i for each literal, i.e. (-z or l_i).
            for lit in &literals {
                aux_clauses.push(vec![Ast::Not(Box::new(aux_prop.clone())), lit.clone()]);
            }
            // (l1 and l2 and ...) => z, i.e. (-l1 or -l2 or ... or z).
            let mut reverse = vec![aux_prop.clone()];
            reverse.extend(literals.into_iter().map(negate_literal));
            aux_clauses.push(reverse);
            Ok(Reduced::Lit(aux_prop))
        }
    }
}

/// Reduces an arbitrarily-nested disjunction to a single literal; the mirror
/// image of [`ensure_and_literal`], used when an `Or` turns up as an operand
/// of an enclosing `And`.
fn reduce_or(node: &Ast, aux_clauses: &mut Vec<Clause>, fresh: &mut FreshNames) -> Result<Reduced> {
    let mut literals = Vec::new();
    for disjunct in flatten_or(node) {
        match &disjunct {
            Ast::Bottom => {}
            Ast::Top => return Ok(Reduced::True),
            Ast::Prop(_) | Ast::Not(_) => literals.push(disjunct),
            Ast::And(_, _) => match ensure_and_literal(&disjunct, aux_clauses, fresh)? {
                Reduced::True => return Ok(Reduced::True),
                Reduced::False => {}
                Reduced::Lit(l) => literals.push(l),
            },
            other => return Err(TouistError::shape(format!("formula contains a non-clausal node after NNF conversion: {other}"))),
        }
    }
    match literals.len() {
        0 => Ok(Reduced::False),
        1 => Ok(Reduced::Lit(literals.into_iter().next().expect("len checked"))),
        _ => {
            let aux = fresh.next();
            let aux_prop = Ast::Prop(aux);
            // z => (l1 or ... or lk), i.e. (-z, l1, ..., lk).
            let mut implied = vec![Ast::Not(Box::new(aux_prop.clone()))];
            implied.extend(literals.iter().cloned());
            aux_clauses.push(implied);
            // l_i => z for each literal, i.e. (-l_i or z).
            for lit in &literals {
                aux_clauses.push(vec![negate_literal(lit.clone()), aux_prop.clone()]);
            }
            Ok(Reduced::Lit(aux_prop))
        }
    }
}

/// Peels nested `And` nodes at any depth, returning the maximal non-`And`
/// subterms in left-to-right order.
fn flatten_and(node: &Ast) -> Vec<Ast> {
    match node {
        Ast::And(a, b) => {
            let mut out = flatten_and(a);
            out.extend(flatten_and(b));
            out
        }
        other => vec![other.clone()],
    }
}

/// As [`flatten_and`], peeling `Or` instead.
fn flatten_or(node: &Ast) -> Vec<Ast> {
    match node {
        Ast::Or(a, b) => {
            let mut out = flatten_or(a);
            out.extend(flatten_or(b));
            out
        }
        other => vec![other.clone()],
    }
}

fn negate_literal(literal: Ast) -> Ast {
    match literal {
        Ast::Not(inner) => *inner,
        other => Ast::Not(Box::new(other)),
    }
}

/// Re-exported so a caller that wants to pretty-print or re-serialize a
/// clause list can format a literal without re-deriving `Prop`/`Not` naming.
pub fn literal_name(literal: &Ast) -> Option<(&str, bool)> {
    match literal {
        Ast::Prop(name) => Some((name, true)),
        Ast::Not(inner) => match inner.as_ref() {
            Ast::Prop(name) => Some((name, false)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> Ast {
        Ast::Prop(name.into())
    }

    fn has_literal(clause: &Clause, name: &str, polarity: bool) -> bool {
        clause.iter().any(|l| literal_name(l) == Some((name, polarity)))
    }

    #[test]
    fn top_level_conjunction_of_literals_is_one_clause_per_conjunct() {
        let formula = Ast::And(Box::new(p("a")), Box::new(p("b")));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        assert_eq!(clauses, vec![vec![p("a")], vec![p("b")]]);
    }

    #[test]
    fn simple_disjunction_is_a_single_clause() {
        let formula = Ast::Or(Box::new(p("a")), Box::new(Ast::Not(Box::new(p("b")))));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        assert_eq!(clauses.len(), 1);
        assert!(has_literal(&clauses[0], "a", true));
        assert!(has_literal(&clauses[0], "b", false));
    }

    #[test]
    fn top_and_bottom_become_single_variable_tautology_and_contradiction() {
        let top = to_cnf(&Ast::Top, &mut FreshNames::new()).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].len(), 2);

        let bottom = to_cnf(&Ast::Bottom, &mut FreshNames::new()).unwrap();
        assert_eq!(bottom.len(), 2);
        assert!(bottom.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn equiv_uses_the_two_implications_encoding_not_duplicated_clauses() {
        let formula = Ast::Equiv(Box::new(p("a")), Box::new(p("b")));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        assert_eq!(clauses.len(), 2);
        assert!(clauses.iter().any(|c| has_literal(c, "a", false) && has_literal(c, "b", true)));
        assert!(clauses.iter().any(|c| has_literal(c, "b", false) && has_literal(c, "a", true)));
    }

    #[test]
    fn disjunction_of_conjunctions_introduces_tseytin_auxiliaries() {
        let formula = Ast::Or(
            Box::new(Ast::And(Box::new(p("a")), Box::new(p("b")))),
            Box::new(Ast::And(Box::new(p("c")), Box::new(p("d")))),
        );
        let mut fresh = FreshNames::new();
        let clauses = to_cnf(&formula, &mut fresh).unwrap();
        // One clause for the top-level disjunction of two auxiliaries, plus
        // 3 defining clauses per auxiliary (2 implications in, 1 out).
        assert_eq!(clauses.len(), 1 + 3 + 3);
        assert!(clauses[0].iter().all(|l| matches!(literal_name(l), Some((name, true)) if name.starts_with('&'))));
    }

    #[test]
    fn fresh_names_never_repeat_and_cannot_collide_with_user_props() {
        let mut fresh = FreshNames::new();
        let a = fresh.next();
        let b = fresh.next();
        assert_ne!(a, b);
        assert!(a.starts_with('&'));
    }

    #[test]
    fn double_negation_cancels_during_nnf_conversion() {
        let formula = Ast::Not(Box::new(Ast::Not(Box::new(p("a")))));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        assert_eq!(clauses, vec![vec![p("a")]]);
    }

    #[test]
    fn xor_produces_two_clauses() {
        let formula = Ast::Xor(Box::new(p("a")), Box::new(p("b")));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn deeply_nested_and_within_or_within_and_still_reduces_to_valid_clauses() {
        // (((a or b) and c) or d) and e
        let inner_or = Ast::Or(Box::new(p("a")), Box::new(p("b")));
        let inner_and = Ast::And(Box::new(inner_or), Box::new(p("c")));
        let outer_or = Ast::Or(Box::new(inner_and), Box::new(p("d")));
        let formula = Ast::And(Box::new(outer_or), Box::new(p("e")));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        // Every clause is a flat list of literals (Prop/Not(Prop)), never a
        // nested And/Or — the defining property this test actually checks.
        for clause in &clauses {
            for literal in clause {
                assert!(literal_name(literal).is_some(), "non-literal survived CNF conversion: {literal}");
            }
        }
        assert!(clauses.iter().any(|c| has_literal(c, "e", true)));
    }

    #[test]
    fn conjunction_reducing_to_a_single_literal_introduces_no_auxiliary() {
        // (a or top) and b  ==  b, but exercised through the Or-inside-And path.
        let formula = Ast::And(Box::new(Ast::Or(Box::new(p("a")), Box::new(Ast::Bottom))), Box::new(p("b")));
        let clauses = to_cnf(&formula, &mut FreshNames::new()).unwrap();
        assert_eq!(clauses, vec![vec![p("a")], vec![p("b")]]);
    }
}
