//! Two-scope name resolution (spec §4.1).
//!
//! The local env is a stack of frames searched most-recent-first (shadowing);
//! the global env is a hashed (well, insertion-ordered — `IndexMap`, so the
//! "source order" rule in spec §5 falls out of iteration order for free) map
//! populated once per run from the top-level `Affect` statements.

use indexmap::IndexMap;
use touist_ast::Ast;
use touist_errors::{Result, TouistError};
use touist_span::Span;

/// `(value, declaration-or-reference location)`.
pub type Binding = (Ast, Span);

/// The global env: populated once from top-level `Affect`s, read-only
/// afterwards (spec §3, §5).
#[derive(Default, Debug, Clone)]
pub struct GlobalEnv(IndexMap<String, Binding>);

impl GlobalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later `Affect`s overwrite earlier ones with the same canonical name
    /// (spec §5: "later declarations overwrite earlier ones").
    pub fn set(&mut self, name: String, binding: Binding) {
        self.0.insert(name, binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The local env: an ordered sequence of `(name, binding)` pairs, searched
/// most-recent-first. Frames are pushed for the duration of a generator body
/// or a `let` body and popped on return (modelled here as a `Vec` that the
/// caller truncates back to its original length).
#[derive(Default, Debug, Clone)]
pub struct LocalEnv(Vec<(String, Binding)>);

impl LocalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, name: String, binding: Binding) {
        self.0.push((name, binding));
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.0.iter().rev().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    /// Runs `f` with `name` bound to `binding` for the duration of the call,
    /// then restores the env to its prior state — the RAII-free equivalent of
    /// "entries live exactly for the evaluation of the body that introduced
    /// them" (spec §3 Lifecycle).
    pub fn with_binding<T>(&mut self, name: String, binding: Binding, f: impl FnOnce(&mut Self) -> T) -> T {
        let mark = self.len();
        self.push(name, binding);
        let result = f(self);
        self.truncate(mark);
        result
    }
}

/// Looks up `name`, preferring the local env over the global one (spec §4.1).
pub fn resolve<'a>(name: &str, locals: &'a LocalEnv, globals: &'a GlobalEnv, ref_span: &Span) -> Result<&'a Binding> {
    if let Some(binding) = locals.get(name) {
        return Ok(binding);
    }
    if let Some(binding) = globals.get(name) {
        return Ok(binding);
    }
    Err(TouistError::name(name, ref_span.clone()))
}

/// Renders an already-evaluated index value the way `expand_var_name` and the
/// set-indexed proposition expander do: integers as decimals, floats with a
/// decimal point, propositions by their bare name.
pub fn render_index(value: &Ast, span: &Span) -> Result<String> {
    match value {
        Ast::Int(n) => Ok(n.to_string()),
        Ast::Float(x) => Ok(render_float(*x)),
        Ast::Prop(name) => Ok(name.clone()),
        other => Err(TouistError::ty(
            format!("index must evaluate to an int, float, or proposition, found `{other}`"),
            span.clone(),
        )),
    }
}

/// Always includes a decimal point, even for integral floats (`3.0`, not `3`),
/// per spec §4.1: "floats with a decimal point".
pub fn render_float(x: f64) -> String {
    let s = x.to_string();
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{s}.0")
    }
}

/// `expand_var_name`: the canonical lookup key / materialised proposition
/// name for a `(prefix, indices)` pair (spec §4.1).
pub fn compose_name(prefix: &str, indices: &[Ast], span: &Span) -> Result<String> {
    if indices.is_empty() {
        return Ok(prefix.to_string());
    }
    let mut rendered = Vec::with_capacity(indices.len());
    for idx in indices {
        rendered.push(render_index(idx, span)?);
    }
    Ok(format!("{prefix}({})", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use touist_span::{Pos, Span};

    fn span() -> Span {
        Span::synthetic()
    }
    fn p(n: i64) -> Pos {
        Pos::new(1, 1, n as u32, "t")
    }

    #[test]
    fn local_shadows_global() {
        let mut globals = GlobalEnv::new();
        globals.set("x".into(), (Ast::Int(1), Span::new(p(0), p(1))));
        let mut locals = LocalEnv::new();
        locals.push("x".into(), (Ast::Int(2), Span::new(p(0), p(1))));
        let (value, _) = resolve("x", &locals, &globals, &span()).unwrap();
        assert_eq!(*value, Ast::Int(2));
    }

    #[test]
    fn missing_name_is_name_error() {
        let locals = LocalEnv::new();
        let globals = GlobalEnv::new();
        let err = resolve("missing", &locals, &globals, &span()).unwrap_err();
        assert!(matches!(err, TouistError::NameError { .. }));
    }

    #[test]
    fn compose_name_renders_float_with_dot() {
        let name = compose_name("p", &[Ast::Float(3.0)], &span()).unwrap();
        assert_eq!(name, "p(3.0)");
    }

    #[test]
    fn with_binding_restores_env() {
        let mut locals = LocalEnv::new();
        locals.with_binding("x".into(), (Ast::Int(1), span()), |inner| {
            assert_eq!(inner.get("x").map(|(v, _)| v.clone()), Some(Ast::Int(1)));
        });
        assert!(locals.is_empty());
    }
}
