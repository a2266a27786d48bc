//! Expression nodes and the per-unit AST context.
//!
//! Expression kinds are a closed enum matched exhaustively by every
//! consumer; adding a kind is a compile-checked change. A node's type
//! starts absent and is set once checked; after that it is only ever
//! replaced by a sugared spelling of the same canonical type, never
//! widened.

use crate::arena::{Arena, Id};
use crate::decl::{Decl, DeclId};
use crate::scope::{ScopeId, ScopeTree};
use crate::ty::{TyArena, TyId};
use indexmap::IndexSet;
use opal_core::Span;
use smallvec::SmallVec;

/// Handle to an expression.
pub type ExprId = Id<Expr>;

/// Candidate set carried by an overloaded reference. Small enough to stay
/// inline for typical overload counts.
pub type OverloadSet = SmallVec<[DeclId; 4]>;

/// Ordered-unique set of declarations a closure captures from enclosing
/// scopes, in first-discovery order.
pub type CaptureSet = IndexSet<DeclId>;

// =============================================================================
// Expression Kinds
// =============================================================================

/// The kinds of expression semantic analysis works over.
#[derive(Debug, Clone)]
pub enum ExprKind {
    // === Literals ===
    /// Integer literal, untyped until checked.
    IntLit(i64),
    /// Float literal.
    FloatLit(f64),
    /// Boolean literal.
    BoolLit(bool),
    /// String literal.
    StrLit(String),

    // === References ===
    /// A resolved reference to one declaration.
    DeclRef {
        /// The referenced declaration.
        decl: DeclId,
        /// Whether the access bypasses dynamic dispatch.
        direct: bool,
        /// Whether explicit generic arguments were written.
        specialized: bool,
    },
    /// A reference that is still ambiguous between several candidates.
    /// Typed later by overload resolution.
    OverloadedRef {
        /// The candidate declarations.
        decls: OverloadSet,
        /// Whether explicit generic arguments were written.
        specialized: bool,
    },

    // === Applications ===
    /// A folded binary operation: the operator reference applied to a
    /// two-element tuple of operands.
    Binary {
        /// The operator reference.
        op: ExprId,
        /// The `(lhs, rhs)` argument tuple.
        arg: ExprId,
    },
    /// A call of a callee against one argument (tuples for arity > 1).
    Call {
        /// The function being applied.
        callee: ExprId,
        /// The argument expression.
        arg: ExprId,
    },
    /// A tuple of expressions.
    Tuple(Vec<ExprId>),

    // === Pseudo-operator forms ===
    /// `cond ? then : else`. The parser produces the node with only the
    /// then-branch; condition and else-branch are attached by folding.
    Ternary {
        /// The condition, [`Id::INVALID`] until folded.
        cond: ExprId,
        /// The then-branch, present from parse time.
        then_branch: ExprId,
        /// The else-branch, [`Id::INVALID`] until folded.
        else_branch: ExprId,
    },
    /// `dest = src`. Both sides are attached by folding.
    Assign {
        /// The destination, [`Id::INVALID`] until folded.
        dest: ExprId,
        /// The source, [`Id::INVALID`] until folded.
        src: ExprId,
    },
    /// `sub as Target`. The subject is attached by folding; a forced cast
    /// (`as!`) is rewritten into a force-unwrap of the cast when folded.
    Cast {
        /// The subject, [`Id::INVALID`] until folded.
        sub: ExprId,
        /// The target type, known from parse time.
        target: TyId,
        /// Whether the cast was written forced. Cleared by folding.
        forced: bool,
    },
    /// `operand!`, trapping on absence.
    ForceUnwrap(ExprId),

    // === Types as values ===
    /// A reference to a type itself, e.g. `Array<Int>` in expression
    /// position.
    Metatype {
        /// The instance type the metatype describes.
        instance_ty: TyId,
    },
    /// A member reference through a base expression.
    Member {
        /// The base expression.
        base: ExprId,
        /// The referenced member declaration.
        decl: DeclId,
    },

    // === Structure ===
    /// A flat operand/operator sequence awaiting precedence folding.
    Sequence(Vec<ExprId>),
    /// A closure literal.
    Closure {
        /// The scope of the closure body; parameters and locals live here.
        scope: ScopeId,
        /// The body expression.
        body: ExprId,
        /// Captured declarations, absent until capture analysis runs.
        captures: Option<CaptureSet>,
    },
}

// =============================================================================
// Expression Node
// =============================================================================

/// An expression tree node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// What the expression is.
    pub kind: ExprKind,
    /// The resolved type, absent until checked.
    pub ty: Option<TyId>,
    /// Where the expression was written.
    pub span: Span,
    /// Whether the compiler synthesized this node.
    pub implicit: bool,
}

impl Expr {
    /// Create an untyped, explicit expression.
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            ty: None,
            span,
            implicit: false,
        }
    }

    /// Whether a pseudo-operator node has had its operands attached by
    /// folding. True for every other kind.
    pub fn is_folded(&self) -> bool {
        match self.kind {
            ExprKind::Ternary { cond, .. } => cond.is_valid(),
            ExprKind::Assign { dest, .. } => dest.is_valid(),
            ExprKind::Cast { sub, .. } => sub.is_valid(),
            _ => true,
        }
    }
}

// =============================================================================
// AST Context
// =============================================================================

/// The arenas of one compilation unit, bundled. Everything semantic
/// analysis allocates or reads lives here and dies here.
#[derive(Debug, Default)]
pub struct AstContext {
    /// Expression nodes.
    pub exprs: Arena<Expr>,
    /// Declarations.
    pub decls: Arena<Decl>,
    /// Types.
    pub tys: TyArena,
    /// Lexical scopes.
    pub scopes: ScopeTree,
}

impl AstContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exprs: Arena::new(),
            decls: Arena::new(),
            tys: TyArena::new(),
            scopes: ScopeTree::new(),
        }
    }

    /// Allocate an explicit expression.
    pub fn expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.exprs.alloc(Expr::new(kind, span))
    }

    /// Allocate a compiler-synthesized expression.
    pub fn implicit_expr(&mut self, kind: ExprKind, span: Span) -> ExprId {
        let id = self.expr(kind, span);
        self.exprs[id].implicit = true;
        id
    }

    /// Allocate a declaration.
    pub fn decl(&mut self, decl: Decl) -> DeclId {
        self.decls.alloc(decl)
    }

    /// The resolved type of an expression, if set.
    #[inline]
    pub fn ty_of(&self, id: ExprId) -> Option<TyId> {
        self.exprs[id].ty
    }

    /// Set an expression's resolved type.
    #[inline]
    pub fn set_ty(&mut self, id: ExprId, ty: TyId) {
        self.exprs[id].ty = Some(ty);
    }

    // =========================================================================
    // Node constructors used across checking and tests
    // =========================================================================

    /// An unfolded ternary carrying only its then-branch.
    pub fn ternary(&mut self, then_branch: ExprId, span: Span) -> ExprId {
        self.expr(
            ExprKind::Ternary {
                cond: ExprId::INVALID,
                then_branch,
                else_branch: ExprId::INVALID,
            },
            span,
        )
    }

    /// An unfolded assignment operator node.
    pub fn assign(&mut self, span: Span) -> ExprId {
        self.expr(
            ExprKind::Assign {
                dest: ExprId::INVALID,
                src: ExprId::INVALID,
            },
            span,
        )
    }

    /// An unfolded cast to `target`.
    pub fn cast(&mut self, target: TyId, forced: bool, span: Span) -> ExprId {
        self.expr(
            ExprKind::Cast {
                sub: ExprId::INVALID,
                target,
                forced,
            },
            span,
        )
    }

    /// A reference to a single declaration.
    pub fn decl_ref(&mut self, decl: DeclId, span: Span) -> ExprId {
        self.expr(
            ExprKind::DeclRef {
                decl,
                direct: false,
                specialized: false,
            },
            span,
        )
    }

    /// A closure with its body and scope; captures not yet computed.
    pub fn closure(&mut self, scope: ScopeId, body: ExprId, span: Span) -> ExprId {
        self.expr(
            ExprKind::Closure {
                scope,
                body,
                captures: None,
            },
            span,
        )
    }

    /// A flat operand/operator sequence.
    pub fn sequence(&mut self, elements: Vec<ExprId>, span: Span) -> ExprId {
        self.expr(ExprKind::Sequence(elements), span)
    }
}

// =============================================================================
// Tests
// =============================================================================
