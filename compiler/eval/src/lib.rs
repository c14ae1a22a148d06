//! Name resolution, expression evaluation and formula expansion for the
//! TouIST core (spec §4.1-§4.7).

mod cardinality;
mod env;
mod expr;
mod formula;
mod options;
mod propname;
mod value;

pub use env::{compose_name, resolve, render_float, render_index, Binding, GlobalEnv, LocalEnv};
pub use expr::eval_expr;
pub use formula::eval_formula;
pub use options::{EmptyGeneratorPolicy, Options};
pub use value::{enumerate, flavor_of, is_set, set_card, set_equal, set_is_empty, set_member, set_subset, SetFlavor};

use touist_ast::Ast;
use touist_errors::{DiagnosticSink, Result, TouistError};
use touist_span::Span;

/// Evaluates every top-level `Affect`, populating `globals`, then evaluates
/// every remaining top-level statement as a formula and conjoins them into a
/// single output formula (spec §5: a program denotes the conjunction of its
/// top-level formula statements).
pub fn eval_program(program: &Ast, globals: &mut GlobalEnv, opts: &Options, sink: &mut DiagnosticSink) -> Result<Ast> {
    let items: &[Ast] = match program.strip_wrappers() {
        Ast::TouistCode(items) => items,
        other => return Err(TouistError::shape(format!("expected a top-level program, found `{other}`"))),
    };

    let mut locals = LocalEnv::new();
    let mut formulas = Vec::new();
    for item in items {
        let (node, item_span) = item.peel_loc_ref();
        let span = item_span.cloned().unwrap_or_else(Span::synthetic);
        match node {
            Ast::Affect { var, value } => {
                let value = eval_expr(value, &mut locals, globals, opts, &span)?;
                globals.set(var.clone(), (value, span));
            }
            _ => formulas.push((item, span)),
        }
    }
    log::debug!("eval_program bound {} global(s), {} top-level formula(s)", globals.len(), formulas.len());

    let mut out = Ast::Top;
    for (formula, span) in formulas {
        let evaluated = eval_formula(formula, &mut locals, globals, opts, sink, &span)?;
        out = match (out, evaluated) {
            (Ast::Top, r) => r,
            (l, Ast::Top) => l,
            (l, r) => Ast::And(Box::new(l), Box::new(r)),
        };
    }
    log::debug!("eval_program finished with {} diagnostic(s)", sink.iter().count());
    Ok(out)
}
