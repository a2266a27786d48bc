//! Result-type sugar propagation for applications.
//!
//! When the arguments of a call use a consistent sugared spelling (an
//! alias) of the call's canonical result type, the call's result is
//! re-spelled with that sugar. Purely cosmetic: the canonical type never
//! changes, only the preferred spelling.

use crate::Sema;
use opal_ast::{ExprId, ExprKind, TyArena, TyId};

/// Prefer a consistent argument sugar spelling for the result type of
/// `apply` (a call or folded binary operation).
///
/// Identity when the application is untyped, error-typed, or not an
/// application. A unique sugar spelling found among the argument leaves
/// whose canonical type equals the function's canonical result type
/// replaces the application's type; conflicting spellings disable the
/// substitution entirely.
pub fn propagate_sugar(sema: &mut Sema, apply: ExprId) -> ExprId {
    let Some(apply_ty) = sema.ast.ty_of(apply) else {
        return apply;
    };
    if sema.ast.tys.is_error(apply_ty) {
        return apply;
    }

    let (callee, arg) = match sema.ast.exprs[apply].kind {
        ExprKind::Call { callee, arg } | ExprKind::Binary { op: callee, arg } => (callee, arg),
        _ => return apply,
    };
    let Some(arg_ty) = sema.ast.ty_of(arg) else {
        return apply;
    };
    let Some(fn_ty) = sema.ast.ty_of(callee) else {
        return apply;
    };
    let Some((_, result_ty)) = sema.ast.tys.as_function(fn_ty) else {
        return apply;
    };

    let mut state = SugarSearch {
        found: None,
        unique: true,
    };
    search_argument(&sema.ast.tys, arg_ty, result_ty, &mut state);

    if let (Some(sugar), true) = (state.found, state.unique) {
        sema.ast.set_ty(apply, sugar);
    }
    apply
}

/// Running state of the sugar search over an argument type.
struct SugarSearch {
    /// The candidate spelling, once one leaf matched.
    found: Option<TyId>,
    /// Cleared permanently when two matching leaves disagree on spelling.
    unique: bool,
}

/// Walk the tuple structure of `arg_ty`; at each leaf whose canonical
/// type equals `result_ty`, record its spelling as the candidate, or kill
/// the search on a spelling conflict.
fn search_argument(tys: &TyArena, arg_ty: TyId, result_ty: TyId, state: &mut SugarSearch) {
    if !state.unique {
        return;
    }

    if let Some(elems) = tys.as_tuple(arg_ty) {
        for &field in elems {
            search_argument(tys, field, result_ty, state);
            if !state.unique {
                return;
            }
        }
        return;
    }

    if tys.canon_eq(arg_ty, result_ty) {
        match state.found {
            Some(found) => {
                if !tys.spelled_like(arg_ty, found) {
                    state.unique = false;
                }
            }
            None => state.found = Some(arg_ty),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
