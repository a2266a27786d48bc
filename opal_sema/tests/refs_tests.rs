//! Reference classification, usage typing, and reference building tests.

use opal_ast::{
    Accessor, AccessorPair, Builtin, Decl, DeclFlags, DeclId, DeclKind, ExprKind, ScopeKind, Ty,
    TyId,
};
use opal_core::{DiagKind, Span};
use opal_sema::{
    build_array_injection_ref, build_checked_ref, build_ref, resolve_usage_type, rvalue_type_of,
    subscript_ref_produces_lvalue, var_ref_produces_lvalue, Sema,
};

fn decl_with_ty(sema: &mut Sema, name: &str, kind: DeclKind, ty: TyId) -> DeclId {
    let scope = sema.ast.scopes.root();
    let mut d = Decl::new(name, kind, scope, Span::default());
    d.declared_ty = Some(ty);
    sema.ast.decl(d)
}

fn settable_var(sema: &mut Sema, setter: Accessor) -> DeclId {
    let int = sema.ast.tys.nominal_struct("Int");
    decl_with_ty(
        sema,
        "x",
        DeclKind::Var {
            accessors: Some(AccessorPair {
                getter: Accessor::NONMUTATING,
                setter: Some(setter),
            }),
        },
        int,
    )
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_mutating_setter_blocks_value_receiver_mutation() {
    let mut sema = Sema::new();
    let decl = settable_var(&mut sema, Accessor::MUTATING);
    let value = sema.ast.tys.nominal_struct("Point");
    let class = sema.ast.tys.nominal_class("Cell");

    // Through a value-type rvalue the reference is immutable; through a
    // reference type the same declaration is always mutable.
    assert!(!var_ref_produces_lvalue(&sema.ast, decl, Some(value)));
    assert!(var_ref_produces_lvalue(&sema.ast, decl, Some(class)));
}

#[test]
fn test_lvalue_receiver_allows_mutation() {
    let mut sema = Sema::new();
    let decl = settable_var(&mut sema, Accessor::MUTATING);
    let value = sema.ast.tys.nominal_struct("Point");
    let slot = sema.ast.tys.lvalue(value);

    assert!(var_ref_produces_lvalue(&sema.ast, decl, Some(slot)));
}

#[test]
fn test_let_binding_is_immutable_everywhere() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let decl = decl_with_ty(&mut sema, "k", DeclKind::Var { accessors: None }, int);
    sema.ast.decls[decl].flags |= DeclFlags::LET;
    let class = sema.ast.tys.nominal_class("Cell");

    assert!(!var_ref_produces_lvalue(&sema.ast, decl, None));
    assert!(!var_ref_produces_lvalue(&sema.ast, decl, Some(class)));
}

#[test]
fn test_subscript_needs_both_accessors_nonmutating() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let value = sema.ast.tys.nominal_struct("Buffer");
    let class = sema.ast.tys.nominal_class("SharedBuffer");

    let both = decl_with_ty(
        &mut sema,
        "subscript",
        DeclKind::Subscript {
            getter: Accessor::NONMUTATING,
            setter: Some(Accessor::NONMUTATING),
        },
        int,
    );
    let mutating_getter = decl_with_ty(
        &mut sema,
        "subscript",
        DeclKind::Subscript {
            getter: Accessor::MUTATING,
            setter: Some(Accessor::NONMUTATING),
        },
        int,
    );
    let get_only = decl_with_ty(
        &mut sema,
        "subscript",
        DeclKind::Subscript {
            getter: Accessor::NONMUTATING,
            setter: None,
        },
        int,
    );

    assert!(subscript_ref_produces_lvalue(&sema.ast, both, value));
    // One mutating accessor is enough to block mutation through a value
    // rvalue, but not through a reference type.
    assert!(!subscript_ref_produces_lvalue(&sema.ast, mutating_getter, value));
    assert!(subscript_ref_produces_lvalue(&sema.ast, mutating_getter, class));
    assert!(!subscript_ref_produces_lvalue(&sema.ast, get_only, class));
}

// =============================================================================
// Usage Types
// =============================================================================

#[test]
fn test_mutable_var_usage_type_is_lvalue_wrapped() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let decl = decl_with_ty(&mut sema, "x", DeclKind::Var { accessors: None }, int);

    let usage = resolve_usage_type(&mut sema, decl, None, false);
    match *sema.ast.tys.get(usage) {
        Ty::Lvalue(object) => assert!(sema.ast.tys.canon_eq(object, int)),
        ref other => panic!("expected an lvalue-wrapped type, got {other:?}"),
    }
}

#[test]
fn test_immutable_reference_usage_type_is_plain() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let decl = decl_with_ty(&mut sema, "k", DeclKind::Var { accessors: None }, int);
    sema.ast.decls[decl].flags |= DeclFlags::LET;

    let usage = resolve_usage_type(&mut sema, decl, None, false);
    assert!(sema.ast.tys.canon_eq(usage, int));
    assert!(!sema.ast.tys.is_lvalue(usage));
}

#[test]
fn test_subscript_wraps_only_result_component() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let index = sema.ast.tys.nominal_struct("Index");
    let fn_ty = sema.ast.tys.function(index, int);
    let class = sema.ast.tys.nominal_class("SharedBuffer");
    let decl = decl_with_ty(
        &mut sema,
        "subscript",
        DeclKind::Subscript {
            getter: Accessor::NONMUTATING,
            setter: Some(Accessor::NONMUTATING),
        },
        fn_ty,
    );

    let usage = resolve_usage_type(&mut sema, decl, Some(class), false);
    let (param, result) = sema.ast.tys.as_function(usage).expect("function-shaped");
    assert!(sema.ast.tys.canon_eq(param, index), "index stays unqualified");
    assert!(sema.ast.tys.is_lvalue(result));
}

#[test]
fn test_inout_declared_type_reads_as_object() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let inout = sema.ast.tys.inout(int);
    let decl = decl_with_ty(&mut sema, "arg", DeclKind::Var { accessors: None }, inout);
    sema.ast.decls[decl].flags |= DeclFlags::LET;

    let rvalue = rvalue_type_of(&mut sema, decl, false);
    assert!(sema.ast.tys.canon_eq(rvalue, int));
}

#[test]
fn test_weak_storage_reads_as_optional() {
    let mut sema = Sema::new();
    let cell = sema.ast.tys.nominal_class("Cell");
    let weak = sema.ast.tys.weak(cell);
    let decl = decl_with_ty(&mut sema, "w", DeclKind::Var { accessors: None }, weak);
    sema.ast.decls[decl].flags |= DeclFlags::LET;

    // Register optional support in the standard scope.
    let opt_former = sema.ast.tys.nominal_struct("Optional");
    let opt_decl = decl_with_ty(
        &mut sema,
        "Optional",
        DeclKind::Var { accessors: None },
        opt_former,
    );
    sema.stdlib.define_global("Optional", opt_decl);

    let rvalue = rvalue_type_of(&mut sema, decl, false);
    match *sema.ast.tys.get(rvalue) {
        Ty::Optional(inner) => assert!(sema.ast.tys.canon_eq(inner, cell)),
        ref other => panic!("expected an optional, got {other:?}"),
    }
    assert!(sema.diags.is_empty());
}

#[test]
fn test_weak_storage_degrades_without_optional_support() {
    let mut sema = Sema::new();
    let cell = sema.ast.tys.nominal_class("Cell");
    let weak = sema.ast.tys.weak(cell);
    let decl = decl_with_ty(&mut sema, "w", DeclKind::Var { accessors: None }, weak);
    sema.ast.decls[decl].flags |= DeclFlags::LET;

    let rvalue = rvalue_type_of(&mut sema, decl, false);
    assert!(sema.ast.tys.canon_eq(rvalue, cell));
    assert!(sema.diags.has(DiagKind::MissingOptionalIntrinsics));

    // A second unwrap does not re-diagnose.
    rvalue_type_of(&mut sema, decl, false);
    assert_eq!(sema.diags.count_of(DiagKind::MissingOptionalIntrinsics), 1);
}

#[test]
fn test_unowned_storage_reads_as_referent() {
    let mut sema = Sema::new();
    let cell = sema.ast.tys.nominal_class("Cell");
    let unowned = sema.ast.tys.unowned(cell);
    let decl = decl_with_ty(&mut sema, "u", DeclKind::Var { accessors: None }, unowned);
    sema.ast.decls[decl].flags |= DeclFlags::LET;

    let rvalue = rvalue_type_of(&mut sema, decl, false);
    assert!(sema.ast.tys.canon_eq(rvalue, cell));
}

#[test]
fn test_invalid_decl_resolves_to_error_type() {
    let mut sema = Sema::new();
    let scope = sema.ast.scopes.root();
    let decl = sema.ast.decl(Decl::new(
        "broken",
        DeclKind::Var { accessors: None },
        scope,
        Span::default(),
    ));

    let usage = resolve_usage_type(&mut sema, decl, None, false);
    assert!(sema.ast.tys.is_error(usage));
}

// =============================================================================
// Reference Building
// =============================================================================

#[test]
fn test_checked_ref_is_typed_and_direct() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let module = sema.ast.scopes.root();
    let func = sema.ast.scopes.child(module, ScopeKind::Function);
    let mut d = Decl::new("x", DeclKind::Var { accessors: None }, func, Span::default());
    d.declared_ty = Some(int);
    let decl = sema.ast.decl(d);

    let reference = build_checked_ref(&mut sema, decl, func, Span::new(3, 4), false);
    let &ExprKind::DeclRef {
        decl: ref_decl,
        direct,
        ..
    } = &sema.ast.exprs[reference].kind
    else {
        panic!("expected a declaration reference");
    };
    assert_eq!(ref_decl, decl);
    assert!(direct, "stored var in its own scope is a direct access");
    assert!(sema.ast.ty_of(reference).is_some());
}

#[test]
fn test_computed_property_access_is_never_direct() {
    let mut sema = Sema::new();
    let decl = settable_var(&mut sema, Accessor::NONMUTATING);
    let scope = sema.ast.decls[decl].scope;

    let reference = build_checked_ref(&mut sema, decl, scope, Span::default(), false);
    let &ExprKind::DeclRef { direct, .. } = &sema.ast.exprs[reference].kind else {
        panic!("expected a declaration reference");
    };
    assert!(!direct);
}

#[test]
fn test_single_candidate_builds_plain_ref() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let decl = decl_with_ty(&mut sema, "f", DeclKind::Fn, int);
    let scope = sema.ast.decls[decl].scope;

    let reference = build_ref(&mut sema, &[decl], scope, Span::default(), false, true);
    let &ExprKind::DeclRef {
        decl: ref_decl,
        specialized,
        ..
    } = &sema.ast.exprs[reference].kind
    else {
        panic!("expected a declaration reference");
    };
    assert_eq!(ref_decl, decl);
    assert!(specialized);
    assert!(sema.ast.ty_of(reference).is_some());
}

#[test]
fn test_multiple_candidates_build_overload_set() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let a = decl_with_ty(&mut sema, "f", DeclKind::Fn, int);
    let b = decl_with_ty(&mut sema, "f", DeclKind::Fn, int);
    let scope = sema.ast.decls[a].scope;

    let reference = build_ref(&mut sema, &[a, b], scope, Span::default(), false, false);
    let ExprKind::OverloadedRef { ref decls, .. } = sema.ast.exprs[reference].kind else {
        panic!("expected an overloaded reference");
    };
    assert_eq!(decls.as_slice(), &[a, b][..]);
    assert!(sema.ast.ty_of(reference).is_none());
}

#[test]
fn test_protocol_requirement_always_overloads() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let decl = decl_with_ty(&mut sema, "req", DeclKind::Fn, int);
    sema.ast.decls[decl].flags |= DeclFlags::PROTOCOL_REQ;
    let scope = sema.ast.decls[decl].scope;

    let reference = build_ref(&mut sema, &[decl], scope, Span::default(), false, false);
    assert!(matches!(
        sema.ast.exprs[reference].kind,
        ExprKind::OverloadedRef { .. }
    ));
}

// =============================================================================
// Array Injection
// =============================================================================

#[test]
fn test_array_injection_ref_shape() {
    let mut sema = Sema::new();
    let int = sema.ast.tys.nominal_struct("Int");
    let slice = sema.ast.tys.nominal_struct("SliceOfInt");
    let word = sema.ast.tys.builtin(Builtin::Word);
    let converter = decl_with_ty(&mut sema, "convertFromHeapArray", DeclKind::Fn, int);
    sema.stdlib.define_global("convertFromHeapArray", converter);

    let reference = build_array_injection_ref(&mut sema, slice, word, Span::default())
        .expect("converter is registered");

    let &ExprKind::Member { base, decl } = &sema.ast.exprs[reference].kind else {
        panic!("expected a member reference");
    };
    assert_eq!(decl, converter);
    assert!(matches!(
        sema.ast.exprs[base].kind,
        ExprKind::Metatype { .. }
    ));
    assert!(sema.ast.exprs[reference].implicit);

    let fn_ty = sema.ast.ty_of(reference).expect("typed");
    let (param, result) = sema.ast.tys.as_function(fn_ty).expect("function-shaped");
    assert!(sema.ast.tys.canon_eq(result, slice));
    let elems = sema.ast.tys.as_tuple(param).expect("tuple input");
    assert_eq!(elems.len(), 3);
    assert!(matches!(
        *sema.ast.tys.get(elems[0]),
        Ty::Builtin(Builtin::RawPointer)
    ));
    assert!(matches!(
        *sema.ast.tys.get(elems[1]),
        Ty::Builtin(Builtin::OwnerPointer)
    ));
}

#[test]
fn test_array_injection_absent_without_stdlib_support() {
    let mut sema = Sema::new();
    let slice = sema.ast.tys.nominal_struct("SliceOfInt");
    let word = sema.ast.tys.builtin(Builtin::Word);
    assert!(build_array_injection_ref(&mut sema, slice, word, Span::default()).is_none());
}
