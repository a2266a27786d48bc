//! Expression resolution and type checking for Opal.
//!
//! This crate takes the expression trees the parser produces, still
//! containing flat operator sequences, unresolved references, and untyped
//! literals, and turns them into fully typed trees. Four entry points are
//! driven bottom-up by the expression checking driver:
//!
//! - [`fold_sequence_expr`] folds a flat operand/operator sequence into a
//!   precedence-correct binary tree,
//! - [`resolve_usage_type`] computes the type a reference to a declaration
//!   produces, including mutable-slot (lvalue) classification,
//! - [`build_ref`] / [`build_checked_ref`] construct reference expressions
//!   from name-lookup candidates,
//! - [`compute_captures`] records which enclosing-scope declarations a
//!   closure body reads.
//!
//! Errors never abort checking: each is reported into the diagnostics sink
//! and a best-effort tree is produced so that one compilation surfaces as
//! many independent problems as possible.

pub mod captures;
pub mod fold;
pub mod refs;
pub mod stdlib;
pub mod sugar;

pub use captures::compute_captures;
pub use fold::{fold_sequence, fold_sequence_expr};
pub use refs::{
    build_array_injection_ref, build_checked_ref, build_ref, resolve_usage_type, rvalue_type_of,
    subscript_ref_produces_lvalue, var_ref_produces_lvalue,
};
pub use stdlib::{LiteralDefaults, LiteralProtocol, Stdlib};
pub use sugar::propagate_sugar;

use opal_ast::{AstContext, DeclId, DeclState, OperatorTable};
use opal_core::Diagnostics;

/// Semantic analysis state for one compilation unit.
///
/// Owns the AST arenas, the infix operator table, the diagnostics sink,
/// and the standard-library lookup layer. Analysis is single-threaded and
/// synchronous; the arenas and the sink are append-only.
#[derive(Debug, Default)]
pub struct Sema {
    /// The unit's AST, declarations, types, and scopes.
    pub ast: AstContext,
    /// Declared infix operators, consulted during sequence folding.
    pub operators: OperatorTable,
    /// Accumulated diagnostics.
    pub diags: Diagnostics,
    /// Standard-library lookups and their memo caches.
    pub stdlib: Stdlib,
}

impl Sema {
    /// Create an empty analysis context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry point of the external declaration validator.
    ///
    /// Idempotent: the first transition out of `Unchecked` sticks. The
    /// stand-in here accepts any declaration that has a declared type; full
    /// declaration checking lives outside this crate.
    pub fn validate_decl(&mut self, decl: DeclId) -> bool {
        match self.ast.decls[decl].state {
            DeclState::Unchecked => {
                let valid = self.ast.decls[decl].declared_ty.is_some();
                self.ast.decls[decl].state = if valid {
                    DeclState::Valid
                } else {
                    DeclState::Invalid
                };
                valid
            }
            DeclState::Valid => true,
            DeclState::Invalid => false,
        }
    }
}
