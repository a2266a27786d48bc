//! Reference classification, usage typing, and reference construction.
//!
//! A reference to a declaration either denotes an assignable storage slot
//! (an lvalue) or a plain readable value. The classifier decides which,
//! from declaration settability, the receiver's semantics, and accessor
//! mutability. The resolver layers storage unwrapping on top: inout and
//! lvalue declared types read as their object type, weak storage reads as
//! an optional of the referent, unowned storage as the referent itself.

use crate::Sema;
use opal_ast::{
    AstContext, Builtin, DeclId, DeclKind, ExprId, ExprKind, OverloadSet, ScopeId, Ty, TyId,
};
use opal_core::Span;

// =============================================================================
// Reference Classifier
// =============================================================================

/// Whether a reference to variable `decl` produces an assignable slot.
///
/// `base_ty` is the receiver type for member references, absent for free
/// references. The rules, in order: a non-settable declaration never
/// produces an lvalue; a free or static reference always does; mutating
/// through a reference-semantics receiver or an already-mutable slot is
/// always legal; through a value-type rvalue receiver, only a computed
/// property whose setter does not itself require a mutable receiver.
pub fn var_ref_produces_lvalue(ast: &AstContext, decl: DeclId, base_ty: Option<TyId>) -> bool {
    let d = &ast.decls[decl];
    if !d.is_settable() {
        return false;
    }

    let base = match base_ty {
        None => return true,
        Some(base) => base,
    };
    if d.is_static() {
        return true;
    }

    if ast.tys.has_reference_semantics(base) || ast.tys.is_lvalue(base) {
        return true;
    }

    match d.var_setter() {
        Some(setter) => !setter.mutating,
        None => false,
    }
}

/// Whether a reference to subscript `decl` produces an assignable slot.
///
/// Subscripts always have a receiver. Stricter than the variable rule for
/// value-type rvalue receivers: both accessors must be non-mutating.
pub fn subscript_ref_produces_lvalue(ast: &AstContext, decl: DeclId, base_ty: TyId) -> bool {
    let d = &ast.decls[decl];
    if !d.is_settable() {
        return false;
    }

    if ast.tys.has_reference_semantics(base_ty) || ast.tys.is_lvalue(base_ty) {
        return true;
    }

    match d.kind {
        DeclKind::Subscript { getter, setter } => {
            !getter.mutating && setter.is_some_and(|s| !s.mutating)
        }
        _ => false,
    }
}

// =============================================================================
// Type-of-Reference Resolver
// =============================================================================

/// The base rvalue type a use of `decl` produces, after storage
/// unwrapping.
///
/// Validates the declaration first. Inout and lvalue declared types read
/// as their object type. Weak storage reads as an optional of the
/// referent; when the standard library lacks optional intrinsics that is
/// diagnosed and the referent itself is substituted as a degraded but
/// usable recovery. Unowned storage reads as the referent directly.
pub fn rvalue_type_of(sema: &mut Sema, decl: DeclId, want_interface: bool) -> TyId {
    sema.validate_decl(decl);

    let d = &sema.ast.decls[decl];
    let declared = if want_interface {
        d.interface_ty.or(d.declared_ty)
    } else {
        d.declared_ty
    };
    let span = d.span;
    let ty = match declared {
        Some(ty) => ty,
        None => return sema.ast.tys.error(),
    };

    let canon = sema.ast.tys.canonical(ty);
    let weak_referent = match *sema.ast.tys.get(canon) {
        Ty::InOut(object) | Ty::Lvalue(object) => return object,
        Ty::Unowned(referent) => return referent,
        Ty::Weak(referent) => referent,
        _ => return ty,
    };

    // Weak storage reads as an optional of the referent; when optional
    // support is missing the referent itself is the degraded recovery.
    if sema.require_optional_intrinsics(span) {
        weak_referent
    } else {
        sema.ast.tys.optional(weak_referent)
    }
}

/// The type a reference to `decl` produces in use, including lvalue
/// qualification.
///
/// An invalid declaration yields the error type. A mutable variable
/// reference wraps its rvalue type in an lvalue. A mutable subscript
/// reference wraps only the result component of its function-shaped type,
/// leaving the index parameters unqualified.
pub fn resolve_usage_type(
    sema: &mut Sema,
    decl: DeclId,
    base_ty: Option<TyId>,
    want_interface: bool,
) -> TyId {
    sema.validate_decl(decl);
    if sema.ast.decls[decl].is_invalid() {
        return sema.ast.tys.error();
    }

    if sema.ast.decls[decl].is_var() && var_ref_produces_lvalue(&sema.ast, decl, base_ty) {
        let rvalue = rvalue_type_of(sema, decl, want_interface);
        return sema.ast.tys.lvalue(rvalue);
    }

    let requested = rvalue_type_of(sema, decl, want_interface);

    if sema.ast.decls[decl].is_subscript() {
        if let Some(base) = base_ty {
            if subscript_ref_produces_lvalue(&sema.ast, decl, base) {
                if let Some((param, result)) = sema.ast.tys.as_function(requested) {
                    let lvalue_result = sema.ast.tys.lvalue(result);
                    return sema.ast.tys.function(param, lvalue_result);
                }
            }
        }
    }

    requested
}

// =============================================================================
// Reference Builder
// =============================================================================

/// Whether a use of `decl` from `use_scope` bypasses dynamic dispatch.
/// Only stored variables referenced from within their defining scope
/// subtree are direct; computed properties never are.
fn is_use_direct(ast: &AstContext, decl: DeclId, use_scope: ScopeId) -> bool {
    let d = &ast.decls[decl];
    let stored = matches!(d.kind, DeclKind::Var { accessors: None });
    stored && (d.scope == use_scope || ast.scopes.is_ancestor_of(d.scope, use_scope))
}

/// Build a typed reference to a single known-good declaration.
pub fn build_checked_ref(
    sema: &mut Sema,
    decl: DeclId,
    use_scope: ScopeId,
    span: Span,
    implicit: bool,
) -> ExprId {
    let ty = resolve_usage_type(sema, decl, None, false);
    let direct = is_use_direct(&sema.ast, decl, use_scope);
    let id = sema.ast.expr(
        ExprKind::DeclRef {
            decl,
            direct,
            specialized: false,
        },
        span,
    );
    sema.ast.exprs[id].implicit = implicit;
    sema.ast.set_ty(id, ty);
    id
}

/// Build a reference expression from name-lookup candidates.
///
/// A single candidate that is not a protocol requirement becomes a plain
/// reference typed through [`resolve_usage_type`]. Anything else becomes
/// an overloaded reference carrying every candidate untyped, resolved
/// later by overload resolution.
pub fn build_ref(
    sema: &mut Sema,
    candidates: &[DeclId],
    use_scope: ScopeId,
    span: Span,
    implicit: bool,
    specialized: bool,
) -> ExprId {
    assert!(!candidates.is_empty(), "reference with no candidates");

    if candidates.len() == 1 && !sema.ast.decls[candidates[0]].is_protocol_requirement() {
        let decl = candidates[0];
        let ty = resolve_usage_type(sema, decl, None, false);
        let direct = is_use_direct(&sema.ast, decl, use_scope);
        let id = sema.ast.expr(
            ExprKind::DeclRef {
                decl,
                direct,
                specialized,
            },
            span,
        );
        sema.ast.exprs[id].implicit = implicit;
        sema.ast.set_ty(id, ty);
        return id;
    }

    let decls: OverloadSet = candidates.iter().copied().collect();
    let id = sema
        .ast
        .expr(ExprKind::OverloadedRef { decls, specialized }, span);
    sema.ast.exprs[id].implicit = implicit;
    id
}

// =============================================================================
// Array Injection Reference
// =============================================================================

/// Build the implicit converter reference used when allocating an array:
/// a metatype of the slice type with a member reference to the standard
/// library's heap-array converter, typed `(RawPointer, OwnerPointer, len)
/// -> Slice`. Returns `None` when the standard library does not provide
/// the converter.
pub fn build_array_injection_ref(
    sema: &mut Sema,
    slice_ty: TyId,
    len_ty: TyId,
    span: Span,
) -> Option<ExprId> {
    let converter = sema.array_converter_decl()?;

    let meta_ty = sema.ast.tys.metatype(slice_ty);
    let base = sema.ast.implicit_expr(
        ExprKind::Metatype {
            instance_ty: slice_ty,
        },
        span,
    );
    sema.ast.set_ty(base, meta_ty);

    let raw = sema.ast.tys.builtin(Builtin::RawPointer);
    let owner = sema.ast.tys.builtin(Builtin::OwnerPointer);
    let param = sema.ast.tys.tuple(vec![raw, owner, len_ty]);
    let fn_ty = sema.ast.tys.function(param, slice_ty);

    let member = sema.ast.implicit_expr(
        ExprKind::Member {
            base,
            decl: converter,
        },
        span,
    );
    sema.ast.set_ty(member, fn_ty);
    Some(member)
}

// =============================================================================
// Tests
// =============================================================================
