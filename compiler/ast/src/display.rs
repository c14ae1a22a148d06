//! A minimal, best-effort renderer for [`Ast`] nodes, used only to embed the
//! "offending sub-expression" text in diagnostics (spec §7). The real
//! pretty-printer is an external collaborator (spec §1, out of scope).

use std::fmt;

use crate::Ast;

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Int(n) => write!(f, "{n}"),
            Ast::Float(x) => write!(f, "{x}"),
            Ast::Bool(b) => write!(f, "{b}"),
            Ast::Prop(name) => write!(f, "{name}"),
            Ast::Top => write!(f, "top"),
            Ast::Bottom => write!(f, "bottom"),
            Ast::Var { prefix, indices } => write_named(f, prefix, indices.as_deref()),
            Ast::UnexpProp { name, indices } => write_named(f, name, indices.as_deref()),
            Ast::Neg(a) => write!(f, "-{a}"),
            Ast::Add(a, b) => write!(f, "({a} + {b})"),
            Ast::Sub(a, b) => write!(f, "({a} - {b})"),
            Ast::Mul(a, b) => write!(f, "({a} * {b})"),
            Ast::Div(a, b) => write!(f, "({a} / {b})"),
            Ast::Mod(a, b) => write!(f, "({a} mod {b})"),
            Ast::Sqrt(a) => write!(f, "sqrt({a})"),
            Ast::ToInt(a) => write!(f, "int({a})"),
            Ast::ToFloat(a) => write!(f, "float({a})"),
            Ast::Abs(a) => write!(f, "abs({a})"),
            Ast::Not(a) => write!(f, "not {a}"),
            Ast::And(a, b) => write!(f, "({a} and {b})"),
            Ast::Or(a, b) => write!(f, "({a} or {b})"),
            Ast::Xor(a, b) => write!(f, "({a} xor {b})"),
            Ast::Implies(a, b) => write!(f, "({a} => {b})"),
            Ast::Equiv(a, b) => write!(f, "({a} <=> {b})"),
            Ast::If { cond, then, else_ } => write!(f, "if {cond} then {then} else {else_}"),
            Ast::Equal(a, b) => write!(f, "({a} = {b})"),
            Ast::NotEqual(a, b) => write!(f, "({a} != {b})"),
            Ast::Lesser(a, b) => write!(f, "({a} < {b})"),
            Ast::LesserEq(a, b) => write!(f, "({a} <= {b})"),
            Ast::Greater(a, b) => write!(f, "({a} > {b})"),
            Ast::GreaterEq(a, b) => write!(f, "({a} >= {b})"),
            Ast::ISet(items) => write_set(f, items.iter()),
            Ast::FSet(items) => write_set(f, items.iter()),
            Ast::PropSet(items) => write_set(f, items.iter()),
            Ast::EmptySet => write!(f, "{{}}"),
            Ast::SetDecl(items) => write_set(f, items.iter()),
            Ast::Range(a, b) => write!(f, "[{a}..{b}]"),
            Ast::Union(a, b) => write!(f, "({a} union {b})"),
            Ast::Inter(a, b) => write!(f, "({a} inter {b})"),
            Ast::Diff(a, b) => write!(f, "({a} diff {b})"),
            Ast::Subset(a, b) => write!(f, "({a} subset {b})"),
            Ast::In(a, b) => write!(f, "({a} in {b})"),
            Ast::Card(a) => write!(f, "card({a})"),
            Ast::Empty(a) => write!(f, "empty({a})"),
            Ast::Bigand { vars, sets, body, .. } => write_generator(f, "bigand", vars, sets, body),
            Ast::Bigor { vars, sets, body, .. } => write_generator(f, "bigor", vars, sets, body),
            Ast::Let { var, value, body } => write!(f, "let {var} = {value} in {body}"),
            Ast::Affect { var, value } => write!(f, "{var} = {value}"),
            Ast::TouistCode(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Ast::Exact { n, set } => write!(f, "exact({n}, {set})"),
            Ast::Atleast { n, set } => write!(f, "atleast({n}, {set})"),
            Ast::Atmost { n, set } => write!(f, "atmost({n}, {set})"),
            Ast::Paren(a) => write!(f, "({a})"),
            Ast::Loc(inner, _) => write!(f, "{inner}"),
        }
    }
}

fn write_named(f: &mut fmt::Formatter<'_>, prefix: &str, indices: Option<&[Ast]>) -> fmt::Result {
    write!(f, "{prefix}")?;
    if let Some(indices) = indices {
        write!(f, "(")?;
        for (i, idx) in indices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{idx}")?;
        }
        write!(f, ")")?;
    }
    Ok(())
}

fn write_set<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = T>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "}}")
}

fn write_generator(
    f: &mut fmt::Formatter<'_>,
    keyword: &str,
    vars: &[String],
    sets: &[Ast],
    body: &Ast,
) -> fmt::Result {
    write!(f, "{keyword} ")?;
    for (i, (var, set)) in vars.iter().zip(sets.iter()).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{var} in {set}")?;
    }
    write!(f, ": {body} end")
}
