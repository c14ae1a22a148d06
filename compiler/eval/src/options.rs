//! Driver-supplied configuration (spec §6), threaded explicitly rather than
//! through globals (spec §9: "Mutable globals → explicit context").

/// What to do when a `bigand`/`bigor` ranges over an empty set (spec §9 Open
/// Questions: two revisions of the original disagree; default to the later
/// revision's behavior).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmptyGeneratorPolicy {
    /// Emit a warning and use the generator's neutral element (`Top` for
    /// `bigand`, `Bottom` for `bigor`).
    #[default]
    Warn,
    /// Treat "nothing produced" as a fatal `ArityError`.
    Fatal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Options {
    /// Permits arithmetic comparisons and numeric variables inside formulas;
    /// formulas may retain linear-arithmetic nodes in the output.
    pub smt_mode: bool,
    /// Truncates `Range` to a singleton, truncates set iteration to the first
    /// element, and collapses cardinality constraints to a dummy proposition.
    /// Used by the `--linter` fast-typecheck path.
    pub check_only: bool,
    pub empty_generator_policy: EmptyGeneratorPolicy,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn smt_mode(mut self, on: bool) -> Self {
        self.smt_mode = on;
        self
    }

    pub fn check_only(mut self, on: bool) -> Self {
        self.check_only = on;
        self
    }

    pub fn empty_generator_policy(mut self, policy: EmptyGeneratorPolicy) -> Self {
        self.empty_generator_policy = policy;
        self
    }
}
