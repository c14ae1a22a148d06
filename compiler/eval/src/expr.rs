//! The expression evaluator (spec §4.2): folds arithmetic/boolean/set/range/
//! comparison nodes to values, rejecting ill-typed operands with located
//! diagnostics.

use touist_ast::Ast;
use touist_errors::{Result, TouistError};
use touist_span::Span;

use crate::env::{compose_name, resolve, GlobalEnv, LocalEnv};
use crate::options::Options;
use crate::propname::expand_prop_name;
use crate::value::{self, make_fset, make_iset, make_propset};

/// Evaluates `ast` to a value-shaped node (`Int`/`Float`/`Bool`/`Prop`/`Set`).
/// `outer_span` is the nearest enclosing location, used for diagnostics when
/// `ast` is not itself `Loc`-wrapped.
pub fn eval_expr(ast: &Ast, locals: &mut LocalEnv, globals: &GlobalEnv, opts: &Options, outer_span: &Span) -> Result<Ast> {
    let (node, own_span) = ast.peel_loc_ref();
    let span = own_span.cloned().unwrap_or_else(|| outer_span.clone());

    match node {
        Ast::Int(_) | Ast::Float(_) | Ast::Bool(_) | Ast::Prop(_) | Ast::ISet(_) | Ast::FSet(_) | Ast::PropSet(_)
        | Ast::EmptySet => Ok(node.clone()),

        Ast::Paren(inner) => eval_expr(inner, locals, globals, opts, &span),

        Ast::Var { prefix, indices } => eval_var(prefix, indices.as_deref(), locals, globals, opts, &span),

        Ast::UnexpProp { name, indices } => expand_prop_name(name, indices.as_deref(), locals, globals, opts, &span),

        Ast::Neg(a) => match eval_expr(a, locals, globals, opts, &span)? {
            Ast::Int(x) => Ok(Ast::Int(-x)),
            Ast::Float(x) => Ok(Ast::Float(-x)),
            other => Err(type_err(&other, &span, "negation expects an int or float")),
        },
        Ast::Sqrt(a) => match eval_expr(a, locals, globals, opts, &span)? {
            Ast::Int(x) => Ok(Ast::Float((x as f64).sqrt())),
            Ast::Float(x) => Ok(Ast::Float(x.sqrt())),
            other => Err(type_err(&other, &span, "sqrt expects an int or float")),
        },
        Ast::ToInt(a) => match eval_expr(a, locals, globals, opts, &span)? {
            Ast::Int(x) => Ok(Ast::Int(x)),
            Ast::Float(x) => Ok(Ast::Int(x as i64)),
            other => Err(type_err(&other, &span, "int() expects an int or float")),
        },
        Ast::ToFloat(a) => match eval_expr(a, locals, globals, opts, &span)? {
            Ast::Int(x) => Ok(Ast::Float(x as f64)),
            Ast::Float(x) => Ok(Ast::Float(x)),
            other => Err(type_err(&other, &span, "float() expects an int or float")),
        },
        Ast::Abs(a) => match eval_expr(a, locals, globals, opts, &span)? {
            Ast::Int(x) => Ok(Ast::Int(x.abs())),
            Ast::Float(x) => Ok(Ast::Float(x.abs())),
            other => Err(type_err(&other, &span, "abs() expects an int or float")),
        },

        Ast::Add(a, b) => numeric_binop(a, b, locals, globals, opts, &span, "+", |x, y| x.checked_add(y), |x, y| x + y),
        Ast::Sub(a, b) => numeric_binop(a, b, locals, globals, opts, &span, "-", |x, y| x.checked_sub(y), |x, y| x - y),
        Ast::Mul(a, b) => numeric_binop(a, b, locals, globals, opts, &span, "*", |x, y| x.checked_mul(y), |x, y| x * y),
        Ast::Div(a, b) => {
            let l = eval_expr(a, locals, globals, opts, &span)?;
            let r = eval_expr(b, locals, globals, opts, &span)?;
            match (l, r) {
                (Ast::Int(_), Ast::Int(0)) => Err(TouistError::ty("division by zero", span.clone())),
                (Ast::Int(x), Ast::Int(y)) => Ok(Ast::Int(x / y)),
                (Ast::Float(x), Ast::Float(y)) => Ok(Ast::Float(x / y)),
                (l, r) => Err(mixed_numeric_err(&l, &r, &span)),
            }
        }
        Ast::Mod(a, b) => {
            let l = eval_expr(a, locals, globals, opts, &span)?;
            let r = eval_expr(b, locals, globals, opts, &span)?;
            match (l, r) {
                (Ast::Int(_), Ast::Int(0)) => Err(TouistError::ty("modulo by zero", span.clone())),
                (Ast::Int(x), Ast::Int(y)) => Ok(Ast::Int(x % y)),
                (l, r) => Err(TouistError::ty(
                    format!("mod expects two ints, found `{l}` and `{r}`"),
                    span.clone(),
                )),
            }
        }

        Ast::Not(a) => Ok(Ast::Bool(!eval_bool(a, locals, globals, opts, &span)?)),
        Ast::And(a, b) => {
            let (l, r) = eval_bool_pair(a, b, locals, globals, opts, &span)?;
            Ok(Ast::Bool(l && r))
        }
        Ast::Or(a, b) => {
            let (l, r) = eval_bool_pair(a, b, locals, globals, opts, &span)?;
            Ok(Ast::Bool(l || r))
        }
        Ast::Xor(a, b) => {
            let (l, r) = eval_bool_pair(a, b, locals, globals, opts, &span)?;
            Ok(Ast::Bool(l ^ r))
        }
        Ast::Implies(a, b) => {
            let (l, r) = eval_bool_pair(a, b, locals, globals, opts, &span)?;
            Ok(Ast::Bool(!l || r))
        }
        Ast::Equiv(a, b) => {
            let (l, r) = eval_bool_pair(a, b, locals, globals, opts, &span)?;
            Ok(Ast::Bool(l == r))
        }
        Ast::If { cond, then, else_ } => {
            if eval_bool(cond, locals, globals, opts, &span)? {
                eval_expr(then, locals, globals, opts, &span)
            } else {
                eval_expr(else_, locals, globals, opts, &span)
            }
        }

        Ast::Equal(a, b) => Ok(Ast::Bool(eval_eq(a, b, locals, globals, opts, &span)?)),
        Ast::NotEqual(a, b) => Ok(Ast::Bool(!eval_eq(a, b, locals, globals, opts, &span)?)),
        Ast::Lesser(a, b) => eval_order(a, b, locals, globals, opts, &span, |o| o.is_lt()),
        Ast::LesserEq(a, b) => eval_order(a, b, locals, globals, opts, &span, |o| o.is_le()),
        Ast::Greater(a, b) => eval_order(a, b, locals, globals, opts, &span, |o| o.is_gt()),
        Ast::GreaterEq(a, b) => eval_order(a, b, locals, globals, opts, &span, |o| o.is_ge()),

        Ast::SetDecl(items) => eval_set_decl(items, locals, globals, opts, &span),
        Ast::Range(a, b) => eval_range(a, b, locals, globals, opts, &span),
        Ast::Union(a, b) => {
            let (l, r) = eval_set_pair(a, b, locals, globals, opts, &span)?;
            value::set_union(l, r, &span)
        }
        Ast::Inter(a, b) => {
            let (l, r) = eval_set_pair(a, b, locals, globals, opts, &span)?;
            value::set_inter(l, r, &span)
        }
        Ast::Diff(a, b) => {
            let (l, r) = eval_set_pair(a, b, locals, globals, opts, &span)?;
            value::set_diff(l, r, &span)
        }
        Ast::Subset(a, b) => {
            let (l, r) = eval_set_pair(a, b, locals, globals, opts, &span)?;
            Ok(Ast::Bool(value::set_subset(l, r, &span)?))
        }
        Ast::In(elem, set) => {
            let elem = eval_expr(elem, locals, globals, opts, &span)?;
            let set = eval_expr(set, locals, globals, opts, &span)?;
            Ok(Ast::Bool(value::set_member(&elem, &set, &span)?))
        }
        Ast::Card(a) => {
            let set = eval_expr(a, locals, globals, opts, &span)?;
            if !value::is_set(&set) {
                return Err(type_err(&set, &span, "card() expects a set"));
            }
            Ok(Ast::Int(value::set_card(&set) as i64))
        }
        Ast::Empty(a) => {
            let set = eval_expr(a, locals, globals, opts, &span)?;
            if !value::is_set(&set) {
                return Err(type_err(&set, &span, "empty() expects a set"));
            }
            Ok(Ast::Bool(value::set_is_empty(&set)))
        }

        Ast::Let { var, value, body } => {
            let value = eval_expr(value, locals, globals, opts, &span)?;
            let decl_span = span.clone();
            locals.with_binding(var.clone(), (value, decl_span), |locals| {
                eval_expr(body, locals, globals, opts, &span)
            })
        }

        other => Err(TouistError::shape(format!(
            "`{other}` is not valid in an expression position"
        ))),
    }
}

fn type_err(got: &Ast, span: &Span, message: &str) -> TouistError {
    TouistError::ty(format!("{message}, found `{got}`"), span.clone())
}

fn mixed_numeric_err(l: &Ast, r: &Ast, span: &Span) -> TouistError {
    TouistError::ty(format!("cannot mix int and float: `{l}` and `{r}`"), span.clone())
}

#[allow(clippy::too_many_arguments)]
fn numeric_binop(
    a: &Ast,
    b: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
    op_name: &str,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Ast> {
    let l = eval_expr(a, locals, globals, opts, span)?;
    let r = eval_expr(b, locals, globals, opts, span)?;
    match (l, r) {
        (Ast::Int(x), Ast::Int(y)) => int_op(x, y)
            .map(Ast::Int)
            .ok_or_else(|| TouistError::ty(format!("integer overflow in `{x} {op_name} {y}`"), span.clone())),
        (Ast::Float(x), Ast::Float(y)) => Ok(Ast::Float(float_op(x, y))),
        (l, r) => Err(mixed_numeric_err(&l, &r, span)),
    }
}

fn eval_bool(a: &Ast, locals: &mut LocalEnv, globals: &GlobalEnv, opts: &Options, span: &Span) -> Result<bool> {
    match eval_expr(a, locals, globals, opts, span)? {
        Ast::Bool(b) => Ok(b),
        other => Err(type_err(&other, span, "expected a boolean")),
    }
}

fn eval_bool_pair(
    a: &Ast,
    b: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
) -> Result<(bool, bool)> {
    // Both operands are evaluated before combining (spec §4.2: "evaluated
    // strictly... no short-circuit at the value level").
    let l = eval_bool(a, locals, globals, opts, span)?;
    let r = eval_bool(b, locals, globals, opts, span)?;
    Ok((l, r))
}

fn eval_eq(a: &Ast, b: &Ast, locals: &mut LocalEnv, globals: &GlobalEnv, opts: &Options, span: &Span) -> Result<bool> {
    let l = eval_expr(a, locals, globals, opts, span)?;
    let r = eval_expr(b, locals, globals, opts, span)?;
    compare_equal(&l, &r, span)
}

/// The value-level half of `=`/`!=`, reused by the formula evaluator once it
/// has already folded both sides with [`eval_expr`] (spec §4.4: comparisons
/// in `smt` mode keep the comparison node but still need folded operands
/// compared the same way a plain expression would).
pub(crate) fn compare_equal(l: &Ast, r: &Ast, span: &Span) -> Result<bool> {
    match (l, r) {
        (Ast::Int(_), Ast::Float(_)) | (Ast::Float(_), Ast::Int(_)) => {
            Err(TouistError::ty(format!("cannot compare int to float: `{l}` = `{r}`"), span.clone()))
        }
        (a, b) if value::is_set(a) && value::is_set(b) => value::set_equal(l.clone(), r.clone(), span),
        (Ast::Int(x), Ast::Int(y)) => Ok(x == y),
        (Ast::Float(x), Ast::Float(y)) => Ok(x == y),
        (Ast::Bool(x), Ast::Bool(y)) => Ok(x == y),
        (Ast::Prop(x), Ast::Prop(y)) => Ok(x == y),
        (l, r) => Err(TouistError::ty(format!("cannot compare `{l}` to `{r}`"), span.clone())),
    }
}

fn eval_order(
    a: &Ast,
    b: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
    accept: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Ast> {
    let l = eval_expr(a, locals, globals, opts, span)?;
    let r = eval_expr(b, locals, globals, opts, span)?;
    Ok(Ast::Bool(accept(compare_order(&l, &r, span)?)))
}

/// The value-level half of `<`/`<=`/`>`/`>=`; see [`compare_equal`].
pub(crate) fn compare_order(l: &Ast, r: &Ast, span: &Span) -> Result<std::cmp::Ordering> {
    match (l, r) {
        (Ast::Int(x), Ast::Int(y)) => Ok(x.cmp(y)),
        (Ast::Float(x), Ast::Float(y)) => Ok(x.total_cmp(y)),
        (l, r) => Err(TouistError::ty(format!("cannot order `{l}` and `{r}`"), span.clone())),
    }
}

fn eval_set_pair(
    a: &Ast,
    b: &Ast,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
) -> Result<(Ast, Ast)> {
    let l = eval_expr(a, locals, globals, opts, span)?;
    let r = eval_expr(b, locals, globals, opts, span)?;
    if !value::is_set(&l) {
        return Err(type_err(&l, span, "expected a set"));
    }
    if !value::is_set(&r) {
        return Err(type_err(&r, span, "expected a set"));
    }
    Ok((l, r))
}

fn eval_set_decl(items: &[Ast], locals: &mut LocalEnv, globals: &GlobalEnv, opts: &Options, span: &Span) -> Result<Ast> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        values.push(eval_expr(item, locals, globals, opts, span)?);
    }
    if values.is_empty() {
        return Ok(Ast::EmptySet);
    }
    match &values[0] {
        Ast::Int(_) => {
            let mut out = Vec::with_capacity(values.len());
            for v in values {
                match v {
                    Ast::Int(x) => out.push(x),
                    other => return Err(type_err(&other, span, "set elements must share a flavor (expected int)")),
                }
            }
            Ok(make_iset(out))
        }
        Ast::Float(_) => {
            let mut out = Vec::with_capacity(values.len());
            for v in values {
                match v {
                    Ast::Float(x) => out.push(x),
                    other => return Err(type_err(&other, span, "set elements must share a flavor (expected float)")),
                }
            }
            Ok(make_fset(out))
        }
        Ast::Prop(_) => {
            let mut out = Vec::with_capacity(values.len());
            for v in values {
                match v {
                    Ast::Prop(x) => out.push(x),
                    other => return Err(type_err(&other, span, "set elements must share a flavor (expected proposition)")),
                }
            }
            Ok(make_propset(out))
        }
        other => Err(type_err(other, span, "set elements must be ints, floats, or propositions")),
    }
}

fn eval_range(a: &Ast, b: &Ast, locals: &mut LocalEnv, globals: &GlobalEnv, opts: &Options, span: &Span) -> Result<Ast> {
    let lo = eval_expr(a, locals, globals, opts, span)?;
    let hi = eval_expr(b, locals, globals, opts, span)?;
    match (lo, hi) {
        (Ast::Int(lo), Ast::Int(hi)) => {
            if opts.check_only {
                return Ok(make_iset(vec![lo]));
            }
            if lo > hi {
                return Ok(Ast::ISet(vec![]));
            }
            Ok(make_iset((lo..=hi).collect()))
        }
        (Ast::Float(lo), Ast::Float(hi)) => {
            if opts.check_only {
                return Ok(make_fset(vec![lo]));
            }
            if lo > hi {
                return Ok(Ast::FSet(vec![]));
            }
            let steps = (hi - lo).floor() as i64;
            let items = (0..=steps).map(|i| lo + i as f64).collect();
            Ok(make_fset(items))
        }
        (l, r) => Err(mixed_numeric_err(&l, &r, span)),
    }
}

fn eval_var(
    prefix: &str,
    indices: Option<&[Ast]>,
    locals: &mut LocalEnv,
    globals: &GlobalEnv,
    opts: &Options,
    span: &Span,
) -> Result<Ast> {
    let indices_evaluated = match indices {
        Some(idx) => {
            let mut out = Vec::with_capacity(idx.len());
            for i in idx {
                out.push(eval_expr(i, locals, globals, opts, span)?);
            }
            Some(out)
        }
        None => None,
    };
    let canonical = match &indices_evaluated {
        Some(idx) => compose_name(prefix, idx, span)?,
        None => prefix.to_string(),
    };
    match resolve(&canonical, locals, globals, span) {
        Ok((value, _)) => Ok(value.clone()),
        // Computed-name fallback (spec §4.1): `$v(a,b,c)` with no such
        // composite name bound retries with just `$v`; if that resolves to
        // a proposition `q`, the expression becomes `q(a,b,c)`. This is what
        // lets `bigand $f in $F: $f($i)` apply an index to whichever
        // proposition `$f` is currently bound to.
        Err(err) => match (&indices_evaluated, resolve(prefix, locals, globals, span)) {
            (Some(idx), Ok((Ast::Prop(name), _))) => {
                let name = name.clone();
                Ok(Ast::Prop(compose_name(&name, idx, span)?))
            }
            _ => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(ast: &Ast) -> Result<Ast> {
        let mut locals = LocalEnv::new();
        let globals = GlobalEnv::new();
        eval_expr(ast, &mut locals, &globals, &Options::new(), &Span::synthetic())
    }

    #[test]
    fn computed_name_fallback_indexes_whatever_the_bare_prefix_is_bound_to() {
        let mut locals = LocalEnv::new();
        locals.push("$f".into(), (Ast::Prop("a".into()), Span::synthetic()));
        let globals = GlobalEnv::new();
        let ast = Ast::Var { prefix: "$f".into(), indices: Some(vec![Ast::Int(1)]) };
        let result = eval_expr(&ast, &mut locals, &globals, &Options::new(), &Span::synthetic()).unwrap();
        assert_eq!(result, Ast::Prop("a(1)".into()));
    }

    #[test]
    fn a_directly_bound_composite_name_wins_over_the_fallback() {
        let mut locals = LocalEnv::new();
        locals.push("$f".into(), (Ast::Prop("a".into()), Span::synthetic()));
        locals.push("$f(1)".into(), (Ast::Prop("z".into()), Span::synthetic()));
        let globals = GlobalEnv::new();
        let ast = Ast::Var { prefix: "$f".into(), indices: Some(vec![Ast::Int(1)]) };
        let result = eval_expr(&ast, &mut locals, &globals, &Options::new(), &Span::synthetic()).unwrap();
        assert_eq!(result, Ast::Prop("z".into()));
    }

    #[test]
    fn comparisons_scenario_1() {
        let gt = Ast::Greater(Box::new(Ast::Int(1)), Box::new(Ast::Int(10)));
        assert_eq!(eval(&gt).unwrap(), Ast::Bool(false));
        let lt = Ast::Lesser(Box::new(Ast::Int(1)), Box::new(Ast::Int(10)));
        assert_eq!(eval(&lt).unwrap(), Ast::Bool(true));
        let mixed = Ast::Equal(Box::new(Ast::Int(1)), Box::new(Ast::Float(1.0)));
        assert!(matches!(eval(&mixed), Err(TouistError::TypeError { .. })));
    }

    #[test]
    fn division_is_truncating_on_ints_and_ieee_on_floats() {
        assert_eq!(eval(&Ast::Div(Box::new(Ast::Int(7)), Box::new(Ast::Int(2)))).unwrap(), Ast::Int(3));
        assert_eq!(
            eval(&Ast::Div(Box::new(Ast::Float(7.0)), Box::new(Ast::Float(2.0)))).unwrap(),
            Ast::Float(3.5)
        );
    }

    #[test]
    fn mixed_arithmetic_is_type_error() {
        let add = Ast::Add(Box::new(Ast::Int(1)), Box::new(Ast::Float(2.0)));
        assert!(matches!(eval(&add), Err(TouistError::TypeError { .. })));
    }

    #[test]
    fn range_is_inclusive_and_empty_when_reversed() {
        assert_eq!(eval(&Ast::Range(Box::new(Ast::Int(1)), Box::new(Ast::Int(3)))).unwrap(), make_iset(vec![1, 2, 3]));
        assert_eq!(eval(&Ast::Range(Box::new(Ast::Int(3)), Box::new(Ast::Int(1)))).unwrap(), Ast::ISet(vec![]));
    }

    #[test]
    fn float_range_steps_by_one_from_lo() {
        let r = eval(&Ast::Range(Box::new(Ast::Float(1.0)), Box::new(Ast::Float(3.4)))).unwrap();
        assert_eq!(r, make_fset(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn check_only_truncates_range_to_singleton() {
        let mut locals = LocalEnv::new();
        let globals = GlobalEnv::new();
        let opts = Options::new().check_only(true);
        let r = eval_expr(
            &Ast::Range(Box::new(Ast::Int(1)), Box::new(Ast::Int(100))),
            &mut locals,
            &globals,
            &opts,
            &Span::synthetic(),
        )
        .unwrap();
        assert_eq!(r, make_iset(vec![1]));
    }

    #[test]
    fn if_evaluates_exactly_one_branch() {
        let expr = Ast::If {
            cond: Box::new(Ast::Bool(true)),
            then: Box::new(Ast::Int(1)),
            else_: Box::new(Ast::Div(Box::new(Ast::Int(1)), Box::new(Ast::Int(0)))),
        };
        assert_eq!(eval(&expr).unwrap(), Ast::Int(1));
    }
}
