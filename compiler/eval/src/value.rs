//! Typed set values, empty-set polymorphism (spec §4.3), and set algebra.

use touist_ast::Ast;
use touist_errors::{Result, TouistError};
use touist_span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetFlavor {
    Int,
    Float,
    Prop,
}

impl SetFlavor {
    fn name(self) -> &'static str {
        match self {
            SetFlavor::Int => "int set",
            SetFlavor::Float => "float set",
            SetFlavor::Prop => "proposition set",
        }
    }
}

pub fn flavor_of(set: &Ast) -> Option<SetFlavor> {
    match set {
        Ast::ISet(_) => Some(SetFlavor::Int),
        Ast::FSet(_) => Some(SetFlavor::Float),
        Ast::PropSet(_) => Some(SetFlavor::Prop),
        Ast::EmptySet => None,
        _ => None,
    }
}

pub fn is_set(ast: &Ast) -> bool {
    matches!(ast, Ast::ISet(_) | Ast::FSet(_) | Ast::PropSet(_) | Ast::EmptySet)
}

pub fn make_iset(mut items: Vec<i64>) -> Ast {
    items.sort_unstable();
    items.dedup();
    Ast::ISet(items)
}

pub fn make_fset(mut items: Vec<f64>) -> Ast {
    items.sort_by(f64::total_cmp);
    items.dedup_by(|a, b| a == b);
    Ast::FSet(items)
}

pub fn make_propset(mut items: Vec<String>) -> Ast {
    items.sort();
    items.dedup();
    Ast::PropSet(items)
}

fn empty_of(flavor: SetFlavor) -> Ast {
    match flavor {
        SetFlavor::Int => Ast::ISet(vec![]),
        SetFlavor::Float => Ast::FSet(vec![]),
        SetFlavor::Prop => Ast::PropSet(vec![]),
    }
}

/// Promotes `EmptySet` operands to match a typed sibling, per spec §4.3.
/// If both sides are `EmptySet`, both are promoted to an empty `ISet`
/// (chosen arbitrarily; the result is the empty set of any flavor).
pub fn promote_pair(a: Ast, b: Ast, span: &Span) -> Result<(Ast, Ast, SetFlavor)> {
    match (flavor_of(&a), flavor_of(&b)) {
        (Some(fa), Some(fb)) if fa == fb => Ok((a, b, fa)),
        (Some(fa), Some(fb)) => Err(TouistError::ty(
            format!("cannot combine a {} with a {}", fa.name(), fb.name()),
            span.clone(),
        )),
        (Some(fa), None) => Ok((a, empty_of(fa), fa)),
        (None, Some(fb)) => Ok((empty_of(fb), b, fb)),
        (None, None) => Ok((empty_of(SetFlavor::Int), empty_of(SetFlavor::Int), SetFlavor::Int)),
    }
}

macro_rules! set_binop {
    ($name:ident, $iop:expr, $fop:expr, $pop:expr) => {
        pub fn $name(a: Ast, b: Ast, span: &Span) -> Result<Ast> {
            let (a, b, flavor) = promote_pair(a, b, span)?;
            match flavor {
                SetFlavor::Int => {
                    let (Ast::ISet(xs), Ast::ISet(ys)) = (a, b) else { unreachable!() };
                    Ok(make_iset($iop(xs, ys)))
                }
                SetFlavor::Float => {
                    let (Ast::FSet(xs), Ast::FSet(ys)) = (a, b) else { unreachable!() };
                    Ok(make_fset($fop(xs, ys)))
                }
                SetFlavor::Prop => {
                    let (Ast::PropSet(xs), Ast::PropSet(ys)) = (a, b) else { unreachable!() };
                    Ok(make_propset($pop(xs, ys)))
                }
            }
        }
    };
}

fn union_vec<T: Clone>(mut xs: Vec<T>, ys: Vec<T>) -> Vec<T> {
    xs.extend(ys);
    xs
}
fn inter_vec<T: PartialEq + Clone>(xs: Vec<T>, ys: Vec<T>) -> Vec<T> {
    xs.into_iter().filter(|x| ys.contains(x)).collect()
}
fn diff_vec<T: PartialEq + Clone>(xs: Vec<T>, ys: Vec<T>) -> Vec<T> {
    xs.into_iter().filter(|x| !ys.contains(x)).collect()
}

set_binop!(set_union, union_vec, union_vec, union_vec);
set_binop!(set_inter, inter_vec, inter_vec, inter_vec);
set_binop!(set_diff, diff_vec, diff_vec, diff_vec);

pub fn set_subset(a: Ast, b: Ast, span: &Span) -> Result<bool> {
    let (a, b, flavor) = promote_pair(a, b, span)?;
    Ok(match flavor {
        SetFlavor::Int => {
            let (Ast::ISet(xs), Ast::ISet(ys)) = (a, b) else { unreachable!() };
            xs.iter().all(|x| ys.contains(x))
        }
        SetFlavor::Float => {
            let (Ast::FSet(xs), Ast::FSet(ys)) = (a, b) else { unreachable!() };
            xs.iter().all(|x| ys.contains(x))
        }
        SetFlavor::Prop => {
            let (Ast::PropSet(xs), Ast::PropSet(ys)) = (a, b) else { unreachable!() };
            xs.iter().all(|x| ys.contains(x))
        }
    })
}

pub fn set_equal(a: Ast, b: Ast, span: &Span) -> Result<bool> {
    let (a, b, _) = promote_pair(a, b, span)?;
    Ok(a == b)
}

pub fn set_card(set: &Ast) -> usize {
    match set {
        Ast::ISet(xs) => xs.len(),
        Ast::FSet(xs) => xs.len(),
        Ast::PropSet(xs) => xs.len(),
        Ast::EmptySet => 0,
        _ => 0,
    }
}

pub fn set_is_empty(set: &Ast) -> bool {
    set_card(set) == 0
}

/// `In`: the element's flavor must match the set's flavor (spec §4.2).
pub fn set_member(elem: &Ast, set: &Ast, span: &Span) -> Result<bool> {
    match (elem, set) {
        (Ast::Int(x), Ast::ISet(xs)) => Ok(xs.contains(x)),
        (Ast::Float(x), Ast::FSet(xs)) => Ok(xs.iter().any(|y| y == x)),
        (Ast::Prop(x), Ast::PropSet(xs)) => Ok(xs.iter().any(|y| y == x)),
        (_, Ast::EmptySet) => Ok(false),
        (elem, set) => Err(TouistError::ty(
            format!("`{elem}` is not a valid element of `{set}`"),
            span.clone(),
        )),
    }
}

/// Enumerates a set's elements in the "natural order of their flavor"
/// required by spec §4.5 (ascending for numbers, lexicographic for
/// propositions). All three constructors already keep their payload sorted,
/// so this is just a projection into `Ast` leaf values.
pub fn enumerate(set: &Ast) -> Vec<Ast> {
    match set {
        Ast::ISet(xs) => xs.iter().copied().map(Ast::Int).collect(),
        Ast::FSet(xs) => xs.iter().copied().map(Ast::Float).collect(),
        Ast::PropSet(xs) => xs.iter().cloned().map(Ast::Prop).collect(),
        Ast::EmptySet => vec![],
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::synthetic()
    }

    #[test]
    fn union_with_empty_set_adopts_other_flavor() {
        let result = set_union(Ast::EmptySet, make_iset(vec![1, 2]), &span()).unwrap();
        assert_eq!(result, make_iset(vec![1, 2]));
    }

    #[test]
    fn inter_diff_with_empty_set_are_empty() {
        let set = make_iset(vec![1, 2]);
        assert_eq!(set_inter(Ast::EmptySet, set.clone(), &span()).unwrap(), make_iset(vec![]));
        assert_eq!(set_diff(set, Ast::EmptySet, &span()).unwrap(), make_iset(vec![]));
    }

    #[test]
    fn subset_of_empty_set_is_true_only_for_empty() {
        assert!(set_subset(Ast::EmptySet, make_iset(vec![1]), &span()).unwrap());
        assert!(!set_subset(make_iset(vec![1]), Ast::EmptySet, &span()).unwrap());
    }

    #[test]
    fn mismatched_flavors_are_type_errors() {
        let err = set_union(make_iset(vec![1]), make_propset(vec!["a".into()]), &span()).unwrap_err();
        assert!(matches!(err, TouistError::TypeError { .. }));
    }

    #[test]
    fn enumerate_is_sorted_ascending_and_lexicographic() {
        assert_eq!(enumerate(&make_iset(vec![3, 1, 2])), vec![Ast::Int(1), Ast::Int(2), Ast::Int(3)]);
        assert_eq!(
            enumerate(&make_propset(vec!["b".into(), "a".into()])),
            vec![Ast::Prop("a".into()), Ast::Prop("b".into())]
        );
    }
}
