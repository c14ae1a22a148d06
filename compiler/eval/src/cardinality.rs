//! Cardinality constraint expansion (spec §4.6): `exact`/`atleast`/`atmost`
//! over a proposition set unrolled into a disjunction of conjunctions via
//! combinations, the way the formula evaluator unrolls `bigand`/`bigor`.

use itertools::Itertools;
use touist_ast::Ast;
use touist_errors::{Result, TouistError};
use touist_span::Span;

/// A conjunction of every proposition in `literals`, negated where `negate`
/// is true. Reduces to `Top` on an empty slice (spec's vacuous-conjunction
/// convention, shared with the generator unroller).
fn conj(literals: &[String], negate: bool) -> Ast {
    literals
        .iter()
        .map(|name| {
            let p = Ast::Prop(name.clone());
            if negate {
                Ast::Not(Box::new(p))
            } else {
                p
            }
        })
        .fold(None, |acc, lit| match acc {
            None => Some(lit),
            Some(acc) => Some(Ast::And(Box::new(acc), Box::new(lit))),
        })
        .unwrap_or(Ast::Top)
}

/// A disjunction of `terms`. Reduces to `Bottom` when `terms` is empty (the
/// "no way to satisfy this" case, e.g. `atleast(n, S)` with `n > |S|`).
fn disj(terms: Vec<Ast>) -> Ast {
    terms
        .into_iter()
        .fold(None, |acc, term| match acc {
            None => Some(term),
            Some(acc) => Some(Ast::Or(Box::new(acc), Box::new(term))),
        })
        .unwrap_or(Ast::Bottom)
}

fn prop_names(set: &Ast, span: &Span) -> Result<Vec<String>> {
    match set {
        Ast::PropSet(xs) => Ok(xs.clone()),
        Ast::EmptySet => Ok(vec![]),
        other => Err(TouistError::ty(
            format!("cardinality constraints range over a proposition set, found `{other}`"),
            span.clone(),
        )),
    }
}

fn require_n(n: &Ast, span: &Span) -> Result<i64> {
    match n {
        Ast::Int(n) => Ok(*n),
        other => Err(TouistError::ty(format!("cardinality bound must be an int, found `{other}`"), span.clone())),
    }
}

/// "Exactly `n` of `set` are true." Built as the conjunction of `atleast` and
/// `atmost` so the degenerate cases (§8: `exact(0, {})` is `Top`, `exact(n>0,
/// {})` is `Bottom`) fall out of the same two combinatorial building blocks
/// rather than a third special case.
pub fn eval_exact(n: &Ast, set: &Ast, span: &Span) -> Result<Ast> {
    let lo = eval_atleast(n, set, span)?;
    let hi = eval_atmost(n, set, span)?;
    Ok(Ast::And(Box::new(lo), Box::new(hi)))
}

/// "At least `n` of `set` are true": there exists some `n`-subset all true.
pub fn eval_atleast(n: &Ast, set: &Ast, span: &Span) -> Result<Ast> {
    let n = require_n(n, span)?;
    let names = prop_names(set, span)?;
    if n < 0 {
        return Ok(Ast::Top);
    }
    if n == 0 {
        return Ok(Ast::Top);
    }
    if n as usize > names.len() {
        return Ok(Ast::Bottom);
    }
    let terms = names
        .into_iter()
        .combinations(n as usize)
        .map(|combo| conj(&combo, false))
        .collect();
    Ok(disj(terms))
}

/// "At most `n` of `set` are true": equivalently, at least `|set| - n` of
/// them are false. `n >= |set|` is trivially satisfied (`Top`) and is guarded
/// explicitly so `|set| - n` never underflows.
pub fn eval_atmost(n: &Ast, set: &Ast, span: &Span) -> Result<Ast> {
    let n = require_n(n, span)?;
    let names = prop_names(set, span)?;
    if n < 0 {
        return Ok(Ast::Bottom);
    }
    if n as usize >= names.len() {
        return Ok(Ast::Top);
    }
    let k_false = names.len() - n as usize;
    let terms = names
        .into_iter()
        .combinations(k_false)
        .map(|combo| conj(&combo, true))
        .collect();
    Ok(disj(terms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::make_propset;

    fn names(ast: &Ast) -> Vec<String> {
        let mut out = vec![];
        fn walk(ast: &Ast, out: &mut Vec<String>) {
            match ast {
                Ast::Prop(p) => out.push(p.clone()),
                Ast::Not(a) => walk(a, out),
                Ast::And(a, b) | Ast::Or(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
                _ => {}
            }
        }
        walk(ast, &mut out);
        out
    }

    fn span() -> Span {
        Span::synthetic()
    }

    #[test]
    fn exact_zero_of_empty_set_is_top() {
        let r = eval_exact(&Ast::Int(0), &make_propset(vec![]), &span()).unwrap();
        assert!(matches!(r, Ast::And(a, b) if *a == Ast::Top && *b == Ast::Top));
    }

    #[test]
    fn exact_positive_of_empty_set_is_bottom() {
        let r = eval_atleast(&Ast::Int(1), &make_propset(vec![]), &span()).unwrap();
        assert_eq!(r, Ast::Bottom);
    }

    #[test]
    fn atleast_one_of_three_has_three_disjuncts() {
        let set = make_propset(vec!["a".into(), "b".into(), "c".into()]);
        let r = eval_atleast(&Ast::Int(1), &set, &span()).unwrap();
        assert_eq!(names(&r).len(), 3);
    }

    #[test]
    fn atmost_n_at_least_cardinality_is_top() {
        let set = make_propset(vec!["a".into(), "b".into()]);
        let r = eval_atmost(&Ast::Int(5), &set, &span()).unwrap();
        assert_eq!(r, Ast::Top);
    }

    #[test]
    fn atmost_zero_is_the_all_negated_conjunction() {
        let set = make_propset(vec!["a".into(), "b".into()]);
        let r = eval_atmost(&Ast::Int(0), &set, &span()).unwrap();
        match r {
            Ast::And(l, r) => {
                assert!(matches!(*l, Ast::Not(_)));
                assert!(matches!(*r, Ast::Not(_)));
            }
            other => panic!("expected a conjunction of negations, found {other:?}"),
        }
    }

    #[test]
    fn exact_n_equals_cardinality_requires_all_true() {
        let set = make_propset(vec!["a".into(), "b".into()]);
        let r = eval_exact(&Ast::Int(2), &set, &span()).unwrap();
        let Ast::And(lo, hi) = r else { panic!("expected And") };
        assert_eq!(names(&lo).len(), 2);
        assert_eq!(*hi, Ast::Top);
    }
}
