//! Set-indexed proposition name expansion (spec §4.7): `p([a,b],c)` denotes
//! the Cartesian product `{p(a,c), p(b,c)}`, materialised into a `PropSet`
//! when any index evaluates to a set.

use touist_ast::Ast;
use touist_errors::Result;
use touist_span::Span;

use crate::env::{compose_name, render_index, GlobalEnv, LocalEnv};
use crate::expr::eval_expr;
use crate::options::Options;
use crate::value::{self, make_propset};

/// Evaluates `name(indices...)`. Each index is evaluated first; if none of
/// them are sets the result is a single ground `Prop`. If one or more are
/// sets, the Cartesian product of their elements (set-valued indices
/// enumerated in ascending/lexicographic order, scalar indices held fixed)
/// yields a `PropSet` of every combination, leftmost index varying slowest
/// (spec §4.7: "nesting order matches textual left-to-right order").
pub fn expand_prop_name(
    name: &str,
    indices: Option<&[Ast]>,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
) -> Result<Ast> {
    let Some(indices) = indices else {
        return Ok(Ast::Prop(name.to_string()));
    };

    let mut factors: Vec<Vec<Ast>> = Vec::with_capacity(indices.len());
    let mut any_set = false;
    for idx in indices {
        let value = eval_expr(idx, locals, globals, opts, span)?;
        if value::is_set(&value) {
            any_set = true;
            factors.push(value::enumerate(&value));
        } else {
            factors.push(vec![value]);
        }
    }

    if !any_set {
        let scalars: Vec<Ast> = factors.into_iter().map(|mut f| f.remove(0)).collect();
        let ground = compose_name(name, &scalars, span)?;
        return Ok(Ast::Prop(ground));
    }

    let mut names = vec![String::new()];
    for factor in &factors {
        let mut next = Vec::with_capacity(names.len() * factor.len());
        for prefix in &names {
            for value in factor {
                let rendered = render_index(value, span)?;
                let joined = if prefix.is_empty() {
                    rendered
                } else {
                    format!("{prefix}, {rendered}")
                };
                next.push(joined);
            }
        }
        names = next;
    }

    let props = names.into_iter().map(|args| format!("{name}({args})")).collect();
    Ok(make_propset(props))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, indices: Vec<Ast>) -> Ast {
        let mut locals = LocalEnv::new();
        let globals = GlobalEnv::new();
        expand_prop_name(name, Some(&indices), &mut locals, &globals, &Options::new(), &Span::synthetic()).unwrap()
    }

    #[test]
    fn scalar_indices_yield_a_ground_prop() {
        assert_eq!(run("p", vec![Ast::Int(1), Ast::Int(2)]), Ast::Prop("p(1, 2)".into()));
    }

    #[test]
    fn no_indices_yields_the_bare_name() {
        let mut locals = LocalEnv::new();
        let globals = GlobalEnv::new();
        let r = expand_prop_name("p", None, &mut locals, &globals, &Options::new(), &Span::synthetic()).unwrap();
        assert_eq!(r, Ast::Prop("p".into()));
    }

    #[test]
    fn one_set_index_expands_to_a_propset() {
        let set = int_set(vec![1, 2]);
        let result = run("p", vec![set]);
        assert_eq!(result, make_propset(vec!["p(1)".into(), "p(2)".into()]));
    }

    #[test]
    fn set_index_mixed_with_scalar_keeps_left_to_right_nesting() {
        let set = int_set(vec![1, 2]);
        let result = run("p", vec![set, Ast::Int(9)]);
        assert_eq!(result, make_propset(vec!["p(1, 9)".into(), "p(2, 9)".into()]));
    }

    #[test]
    fn two_set_indices_yield_the_full_cartesian_product() {
        let a = int_set(vec![1, 2]);
        let b = int_set(vec![10, 20]);
        let result = run("p", vec![a, b]);
        assert_eq!(
            result,
            make_propset(vec!["p(1, 10)".into(), "p(1, 20)".into(), "p(2, 10)".into(), "p(2, 20)".into()])
        );
    }

    fn int_set(xs: Vec<i64>) -> Ast {
        crate::value::make_iset(xs)
    }
}
