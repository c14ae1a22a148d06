use smallvec::SmallVec;
use touist_span::Span;

/// A list of variables bound by a single `bigand`/`bigor`, almost always of
/// length one after the n-ary unrolling in `touist-eval` (spec §4.5).
pub type VarList = SmallVec<[String; 2]>;

/// The tagged AST shared by every pass of the core (spec §3).
///
/// A single flat sum type, per the Design Notes in spec §9: "the source uses a
/// single large sum type covering every node kind; this is the right shape for
/// a pattern-matching implementation."
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Ast {
    // -- Literals -----------------------------------------------------
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A materialised, ground proposition name (e.g. `p` or `p(1,2)` after
    /// index expansion).
    Prop(String),
    Top,
    Bottom,

    // -- Variable reference --------------------------------------------
    /// `(prefix, optional index list)`, e.g. `$v` or `$v(1,2)`. Prefixes start
    /// with `$`.
    Var { prefix: String, indices: Option<Vec<Ast>> },

    /// An unexpanded proposition name awaiting index materialisation, e.g.
    /// `p(a,b)` before the indices are evaluated.
    UnexpProp { name: String, indices: Option<Vec<Ast>> },

    // -- Arithmetic ------------------------------------------------------
    Neg(Box<Ast>),
    Add(Box<Ast>, Box<Ast>),
    Sub(Box<Ast>, Box<Ast>),
    Mul(Box<Ast>, Box<Ast>),
    Div(Box<Ast>, Box<Ast>),
    Mod(Box<Ast>, Box<Ast>),
    Sqrt(Box<Ast>),
    ToInt(Box<Ast>),
    ToFloat(Box<Ast>),
    Abs(Box<Ast>),

    // -- Boolean -----------------------------------------------------
    Not(Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    Xor(Box<Ast>, Box<Ast>),
    Implies(Box<Ast>, Box<Ast>),
    Equiv(Box<Ast>, Box<Ast>),
    If { cond: Box<Ast>, then: Box<Ast>, else_: Box<Ast> },

    // -- Comparison ------------------------------------------------------
    Equal(Box<Ast>, Box<Ast>),
    NotEqual(Box<Ast>, Box<Ast>),
    Lesser(Box<Ast>, Box<Ast>),
    LesserEq(Box<Ast>, Box<Ast>),
    Greater(Box<Ast>, Box<Ast>),
    GreaterEq(Box<Ast>, Box<Ast>),

    // -- Set literals/constructors ----------------------------------------
    /// A typed set of integers. Kept sorted ascending and de-duplicated by
    /// every constructor in `touist-eval`.
    ISet(Vec<i64>),
    /// A typed set of floats. Kept sorted ascending (via `f64::total_cmp`) and
    /// de-duplicated by every constructor in `touist-eval`.
    FSet(Vec<f64>),
    /// A typed set of proposition names. Kept sorted lexicographically and
    /// de-duplicated.
    PropSet(Vec<String>),
    /// The polymorphic empty set (spec §4.3); resolved against a sibling
    /// operand's flavor at every binary set operation.
    EmptySet,
    /// `{e1, e2, ...}` before the evaluator has determined the element flavor.
    SetDecl(Vec<Ast>),
    /// `[a..b]`, inclusive.
    Range(Box<Ast>, Box<Ast>),
    Union(Box<Ast>, Box<Ast>),
    Inter(Box<Ast>, Box<Ast>),
    Diff(Box<Ast>, Box<Ast>),
    Subset(Box<Ast>, Box<Ast>),
    /// Element-of-set membership test.
    In(Box<Ast>, Box<Ast>),
    Card(Box<Ast>),
    /// Emptiness test, yields a `Bool`.
    Empty(Box<Ast>),

    // -- Generators --------------------------------------------------
    Bigand { vars: VarList, sets: Vec<Ast>, when: Option<Box<Ast>>, body: Box<Ast> },
    Bigor { vars: VarList, sets: Vec<Ast>, when: Option<Box<Ast>>, body: Box<Ast> },

    // -- Bindings ----------------------------------------------------
    Let { var: String, value: Box<Ast>, body: Box<Ast> },
    Affect { var: String, value: Box<Ast> },
    TouistCode(Vec<Ast>),

    // -- Cardinality --------------------------------------------------
    Exact { n: Box<Ast>, set: Box<Ast> },
    Atleast { n: Box<Ast>, set: Box<Ast> },
    Atmost { n: Box<Ast>, set: Box<Ast> },

    // -- Parentheses and location wrapper ---------------------------------
    Paren(Box<Ast>),
    Loc(Box<Ast>, Span),
}

impl Ast {
    pub fn at(self, span: Span) -> Ast {
        Ast::Loc(Box::new(self), span)
    }

    /// Peels a single `Loc` wrapper, per spec §3: "the location wrapper is
    /// always peeled immediately before pattern-matching a node, and
    /// re-attached for diagnostics." Returns the inner node and the span, if
    /// any was present.
    pub fn peel_loc(self) -> (Ast, Option<Span>) {
        match self {
            Ast::Loc(inner, span) => (*inner, Some(span)),
            other => (other, None),
        }
    }

    /// As [`Ast::peel_loc`], but borrowing.
    pub fn peel_loc_ref(&self) -> (&Ast, Option<&Span>) {
        match self {
            Ast::Loc(inner, span) => (inner.as_ref(), Some(span)),
            other => (other, None),
        }
    }

    /// Strips every `Loc`/`Paren` wrapper, returning the innermost node.
    pub fn strip_wrappers(&self) -> &Ast {
        match self {
            Ast::Loc(inner, _) | Ast::Paren(inner) => inner.strip_wrappers(),
            other => other,
        }
    }

    /// Direct children, for generic recursive traversal (used by the
    /// evaluated-output invariant checker and by the pretty-printer).
    pub fn children(&self) -> Vec<&Ast> {
        use Ast::*;
        match self {
            Int(_) | Float(_) | Bool(_) | Prop(_) | Top | Bottom | EmptySet | ISet(_) | FSet(_) | PropSet(_) => {
                vec![]
            }
            Var { indices, .. } | UnexpProp { indices, .. } => {
                indices.as_ref().map(|v| v.iter().collect()).unwrap_or_default()
            }
            Neg(a) | Sqrt(a) | ToInt(a) | ToFloat(a) | Abs(a) | Not(a) | Card(a) | Empty(a) | Paren(a) => {
                vec![a.as_ref()]
            }
            Add(a, b) | Sub(a, b) | Mul(a, b) | Div(a, b) | Mod(a, b) | And(a, b) | Or(a, b) | Xor(a, b)
            | Implies(a, b) | Equiv(a, b) | Equal(a, b) | NotEqual(a, b) | Lesser(a, b) | LesserEq(a, b)
            | Greater(a, b) | GreaterEq(a, b) | Range(a, b) | Union(a, b) | Inter(a, b) | Diff(a, b)
            | Subset(a, b) | In(a, b) => vec![a.as_ref(), b.as_ref()],
            If { cond, then, else_ } => vec![cond.as_ref(), then.as_ref(), else_.as_ref()],
            SetDecl(items) => items.iter().collect(),
            Bigand { sets, when, body, .. } | Bigor { sets, when, body, .. } => {
                let mut out: Vec<&Ast> = sets.iter().collect();
                if let Some(w) = when {
                    out.push(w.as_ref());
                }
                out.push(body.as_ref());
                out
            }
            Let { value, body, .. } => vec![value.as_ref(), body.as_ref()],
            Affect { value, .. } => vec![value.as_ref()],
            TouistCode(items) => items.iter().collect(),
            Exact { n, set } | Atleast { n, set } | Atmost { n, set } => vec![n.as_ref(), set.as_ref()],
            Loc(inner, _) => vec![inner.as_ref()],
        }
    }

    /// True if this node, or any descendant, matches `name_of_kind`. Used by
    /// `touist-eval`'s tests to check the §8 invariant that evaluated output
    /// contains none of the listed node kinds.
    pub fn contains_kind(&self, pred: impl Fn(&Ast) -> bool + Copy) -> bool {
        if pred(self) {
            return true;
        }
        self.children().into_iter().any(|c| c.contains_kind(pred))
    }

    pub fn is_forbidden_after_eval(node: &Ast) -> bool {
        matches!(
            node,
            Ast::UnexpProp { .. }
                | Ast::Var { .. }
                | Ast::Range(_, _)
                | Ast::Bigand { .. }
                | Ast::Bigor { .. }
                | Ast::Let { .. }
                | Ast::Exact { .. }
                | Ast::Atleast { .. }
                | Ast::Atmost { .. }
                | Ast::If { .. }
                | Ast::Union(_, _)
                | Ast::Inter(_, _)
                | Ast::Diff(_, _)
                | Ast::Subset(_, _)
                | Ast::In(_, _)
                | Ast::Card(_)
                | Ast::Empty(_)
                | Ast::SetDecl(_)
                | Ast::Loc(_, _)
        )
    }

    pub fn is_forbidden_in_cnf(node: &Ast) -> bool {
        !matches!(node, Ast::Top | Ast::Bottom | Ast::Prop(_) | Ast::Not(_) | Ast::And(_, _) | Ast::Or(_, _))
    }
}
