//! The formula evaluator (spec §4.4-§4.5): resolves `Var`s and computed
//! proposition names, short-circuits `Top`/`Bottom` through the connectives,
//! eliminates `If`/`Let`, and unrolls `bigand`/`bigor` generators and
//! cardinality constraints into plain propositional (or, in `smt` mode,
//! mixed arithmetic/propositional) formulas.

use itertools::Itertools;
use touist_ast::Ast;
use touist_errors::{DiagnosticSink, Result, TouistError};
use touist_span::Span;

use crate::cardinality;
use crate::env::{compose_name, resolve, GlobalEnv, LocalEnv};
use crate::expr::{compare_equal, compare_order, eval_expr};
use crate::options::Options;
use crate::propname::expand_prop_name;
use crate::value;

/// Evaluates `ast` to a node built only of `Top`/`Bottom`/`Prop`/`Not`/`And`/
/// `Or`/`Xor`/`Implies`/`Equiv`, plus (in `smt` mode only) retained numeric
/// comparison nodes over folded `Int`/`Float` operands.
#[allow(clippy::too_many_arguments)]
pub fn eval_formula(
    ast: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    sink: &mut DiagnosticSink,
    outer_span: &Span,
) -> Result<Ast> {
    let (node, own_span) = ast.peel_loc_ref();
    let span = own_span.cloned().unwrap_or_else(|| outer_span.clone());

    match node {
        Ast::Top | Ast::Bottom => Ok(node.clone()),
        Ast::Bool(true) => Ok(Ast::Top),
        Ast::Bool(false) => Ok(Ast::Bottom),
        Ast::Prop(name) => Ok(Ast::Prop(name.clone())),

        Ast::Paren(inner) => eval_formula(inner, locals, globals, opts, sink, &span),

        Ast::Var { prefix, indices } => {
            let value = resolve_named_value(prefix, indices.as_deref(), locals, globals, opts, &span)?;
            value_to_formula(value, opts, &span)
        }
        Ast::UnexpProp { name, indices } => {
            let value = expand_prop_name(name, indices.as_deref(), locals, globals, opts, &span)?;
            match value {
                Ast::Prop(p) => Ok(Ast::Prop(p)),
                Ast::PropSet(_) => Err(TouistError::shape(format!(
                    "`{name}` expands to a set of propositions outside of a generator; wrap it in bigand/bigor"
                ))),
                other => value_to_formula(other, opts, &span),
            }
        }

        Ast::Not(a) => Ok(mk_not(eval_formula(a, locals, globals, opts, sink, &span)?)),
        Ast::And(a, b) => {
            let l = eval_formula(a, locals, globals, opts, sink, &span)?;
            let r = eval_formula(b, locals, globals, opts, sink, &span)?;
            Ok(mk_and(l, r))
        }
        Ast::Or(a, b) => {
            let l = eval_formula(a, locals, globals, opts, sink, &span)?;
            let r = eval_formula(b, locals, globals, opts, sink, &span)?;
            Ok(mk_or(l, r))
        }
        Ast::Xor(a, b) => {
            let l = eval_formula(a, locals, globals, opts, sink, &span)?;
            let r = eval_formula(b, locals, globals, opts, sink, &span)?;
            Ok(Ast::Xor(Box::new(l), Box::new(r)))
        }
        Ast::Implies(a, b) => {
            let l = eval_formula(a, locals, globals, opts, sink, &span)?;
            let r = eval_formula(b, locals, globals, opts, sink, &span)?;
            Ok(match (&l, &r) {
                (Ast::Bottom, _) => Ast::Top,
                (Ast::Top, _) => r,
                (_, Ast::Top) => Ast::Top,
                (_, Ast::Bottom) => mk_not(l),
                _ => Ast::Implies(Box::new(l), Box::new(r)),
            })
        }
        Ast::Equiv(a, b) => {
            let l = eval_formula(a, locals, globals, opts, sink, &span)?;
            let r = eval_formula(b, locals, globals, opts, sink, &span)?;
            Ok(Ast::Equiv(Box::new(l), Box::new(r)))
        }

        Ast::If { cond, then, else_ } => {
            if eval_bool_expr(cond, locals, globals, opts, &span)? {
                eval_formula(then, locals, globals, opts, sink, &span)
            } else {
                eval_formula(else_, locals, globals, opts, sink, &span)
            }
        }
        Ast::Let { var, value, body } => {
            let value = eval_expr(value, locals, globals, opts, &span)?;
            locals.with_binding(var.clone(), (value, span.clone()), |locals| {
                eval_formula(body, locals, globals, opts, sink, &span)
            })
        }

        Ast::Equal(a, b) => eval_comparison(a, b, locals, globals, opts, &span, Ast::Equal, |o| o.is_eq(), true),
        Ast::NotEqual(a, b) => eval_comparison(a, b, locals, globals, opts, &span, Ast::NotEqual, |o| o.is_ne(), true),
        Ast::Lesser(a, b) => eval_comparison(a, b, locals, globals, opts, &span, Ast::Lesser, |o| o.is_lt(), false),
        Ast::LesserEq(a, b) => eval_comparison(a, b, locals, globals, opts, &span, Ast::LesserEq, |o| o.is_le(), false),
        Ast::Greater(a, b) => eval_comparison(a, b, locals, globals, opts, &span, Ast::Greater, |o| o.is_gt(), false),
        Ast::GreaterEq(a, b) => eval_comparison(a, b, locals, globals, opts, &span, Ast::GreaterEq, |o| o.is_ge(), false),

        Ast::Exact { n, set } => eval_cardinality(n, set, locals, globals, opts, &span, cardinality::eval_exact),
        Ast::Atleast { n, set } => eval_cardinality(n, set, locals, globals, opts, &span, cardinality::eval_atleast),
        Ast::Atmost { n, set } => eval_cardinality(n, set, locals, globals, opts, &span, cardinality::eval_atmost),

        Ast::Bigand { vars, sets, when, body } => {
            eval_generator(vars, sets, when.as_deref(), body, locals, globals, opts, sink, &span, true)
        }
        Ast::Bigor { vars, sets, when, body } => {
            eval_generator(vars, sets, when.as_deref(), body, locals, globals, opts, sink, &span, false)
        }

        other => Err(TouistError::shape(format!("`{other}` is not valid in a formula position"))),
    }
}

fn value_to_formula(value: Ast, opts: &Options, span: &Span) -> Result<Ast> {
    match value {
        Ast::Prop(p) => Ok(Ast::Prop(p)),
        Ast::Bool(true) => Ok(Ast::Top),
        Ast::Bool(false) => Ok(Ast::Bottom),
        other @ (Ast::Int(_) | Ast::Float(_)) if opts.smt_mode => Ok(other),
        other => Err(TouistError::ty(
            format!("formula position expects a proposition or boolean, found `{other}`"),
            span.clone(),
        )),
    }
}

fn resolve_named_value<'a>(
    prefix: &str,
    indices: Option<&[Ast]>,
    locals: &'a mut LocalEnv,
    globals: &'a GlobalEnv,
    opts: &Options,
    span: &Span,
) -> Result<Ast> {
    let evaluated_indices = match indices {
        Some(idx) => {
            let mut evaluated = Vec::with_capacity(idx.len());
            for i in idx {
                evaluated.push(eval_expr(i, locals, globals, opts, span)?);
            }
            Some(evaluated)
        }
        None => None,
    };
    let canonical = match &evaluated_indices {
        Some(idx) => compose_name(prefix, idx, span)?,
        None => prefix.to_string(),
    };
    match resolve(&canonical, locals, globals, span) {
        Ok((value, _)) => Ok(value.clone()),
        // Computed-name fallback (spec §4.1), mirroring `touist_eval::expr`'s
        // expression-position handling: `$f($i)` with `$f` bound to a
        // proposition `q` becomes `q($i)` when `$f($i)` itself is unbound.
        Err(err) => match (&evaluated_indices, resolve(prefix, locals, globals, span)) {
            (Some(idx), Ok((Ast::Prop(name), _))) => {
                let name = name.clone();
                Ok(Ast::Prop(compose_name(&name, idx, span)?))
            }
            _ => Err(err),
        },
    }
}

fn eval_bool_expr(a: &Ast, locals: &mut LocalEnv, globals: &GlobalEnv, opts: &Options, span: &Span) -> Result<bool> {
    match eval_expr(a, locals, globals, opts, span)? {
        Ast::Bool(b) => Ok(b),
        other => Err(TouistError::ty(format!("expected a boolean, found `{other}`"), span.clone())),
    }
}

#[allow(clippy::too_many_arguments)]
fn eval_comparison(
    a: &Ast,
    b: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
    retain: impl Fn(Box<Ast>, Box<Ast>) -> Ast,
    accept_eq: impl Fn(std::cmp::Ordering) -> bool,
    is_equality: bool,
) -> Result<Ast> {
    let l = eval_expr(a, locals, globals, opts, span)?;
    let r = eval_expr(b, locals, globals, opts, span)?;
    let numeric = matches!((&l, &r), (Ast::Int(_), Ast::Int(_)) | (Ast::Float(_), Ast::Float(_)));
    if opts.smt_mode && numeric {
        return Ok(retain(Box::new(l), Box::new(r)));
    }
    let truth = if is_equality {
        let eq = compare_equal(&l, &r, span)?;
        accept_eq(if eq { std::cmp::Ordering::Equal } else { std::cmp::Ordering::Less })
    } else {
        accept_eq(compare_order(&l, &r, span)?)
    };
    Ok(if truth { Ast::Top } else { Ast::Bottom })
}

fn eval_cardinality(
    n: &Ast,
    set: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
    f: impl Fn(&Ast, &Ast, &Span) -> Result<Ast>,
) -> Result<Ast> {
    let n = eval_expr(n, locals, globals, opts, span)?;
    let set = eval_expr(set, locals, globals, opts, span)?;
    if !value::is_set(&set) {
        return Err(TouistError::ty(format!("cardinality constraints range over a set, found `{set}`"), span.clone()));
    }
    f(&n, &set, span)
}

#[allow(clippy::too_many_arguments)]
fn eval_generator(
    vars: &[String],
    sets: &[Ast],
    when: Option<&Ast>,
    body: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    sink: &mut DiagnosticSink,
    span: &Span,
    is_and: bool,
) -> Result<Ast> {
    if vars.len() != sets.len() {
        return Err(TouistError::arity(
            format!(
                "generator binds {} variable(s) but ranges over {} set(s)",
                vars.len(),
                sets.len()
            ),
            Some(span.clone()),
        ));
    }

    let mut domains = Vec::with_capacity(sets.len());
    for set_expr in sets {
        let set = eval_expr(set_expr, locals, globals, opts, span)?;
        if !value::is_set(&set) {
            return Err(TouistError::ty(format!("generator range must be a set, found `{set}`"), span.clone()));
        }
        domains.push(value::enumerate(&set));
    }

    let mut results = Vec::new();
    for combo in domains.into_iter().multi_cartesian_product() {
        let mark = locals.len();
        for (var, value) in vars.iter().zip(combo.into_iter()) {
            locals.push(var.clone(), (value, span.clone()));
        }
        let keep = match when {
            Some(guard) => eval_bool_expr(guard, locals, globals, opts, span)?,
            None => true,
        };
        let result = if keep { Some(eval_formula(body, locals, globals, opts, sink, span)) } else { None };
        locals.truncate(mark);
        if let Some(result) = result {
            results.push(result?);
        }
    }

    if results.is_empty() {
        let neutral = if is_and { "bigand" } else { "bigor" };
        let message = format!("{neutral} ranges over an empty domain; using its neutral element");
        match opts.empty_generator_policy {
            crate::options::EmptyGeneratorPolicy::Warn => {
                sink.warn("eval", message, Some(span.clone()));
                return Ok(if is_and { Ast::Top } else { Ast::Bottom });
            }
            crate::options::EmptyGeneratorPolicy::Fatal => {
                return Err(TouistError::arity(message, Some(span.clone())));
            }
        }
    }

    let fold = if is_and { mk_and } else { mk_or };
    Ok(results.into_iter().reduce(fold).expect("checked non-empty above"))
}

fn mk_not(a: Ast) -> Ast {
    match a {
        Ast::Top => Ast::Bottom,
        Ast::Bottom => Ast::Top,
        other => Ast::Not(Box::new(other)),
    }
}

fn mk_and(l: Ast, r: Ast) -> Ast {
    match (&l, &r) {
        (Ast::Top, _) => r,
        (_, Ast::Top) => l,
        (Ast::Bottom, _) | (_, Ast::Bottom) => Ast::Bottom,
        _ => Ast::And(Box::new(l), Box::new(r)),
    }
}

fn mk_or(l: Ast, r: Ast) -> Ast {
    match (&l, &r) {
        (Ast::Bottom, _) => r,
        (_, Ast::Bottom) => l,
        (Ast::Top, _) | (_, Ast::Top) => Ast::Top,
        _ => Ast::Or(Box::new(l), Box::new(r)),
    }
}
