//! Type representation and the small algebra semantic analysis needs.
//!
//! Types are interned-by-allocation in a [`TyArena`] and referenced by
//! [`TyId`]. Two ids may denote structurally equal types; equality is a
//! query on the arena ([`TyArena::canon_eq`]), not on ids. The arena also
//! answers the wrapper queries checking relies on: is this an lvalue, does
//! it have reference semantics, what is behind a weak or unowned slot.

use crate::arena::{Arena, Id};

/// Handle to a type in a [`TyArena`].
pub type TyId = Id<Ty>;

// =============================================================================
// Type Kinds
// =============================================================================

/// Compiler-internal builtin types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// An untyped machine pointer to raw storage.
    RawPointer,
    /// A pointer that keeps its referent alive.
    OwnerPointer,
    /// A target-sized unsigned integer.
    Word,
}

/// A type. Closed over everything expression checking can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    /// Sentinel for a type that could not be computed. Propagates through
    /// checking without producing cascading diagnostics.
    Error,
    /// A compiler-internal builtin.
    Builtin(Builtin),
    /// A named struct or class. `class` types have reference semantics.
    Nominal { name: String, class: bool },
    /// A named alias (sugar) for another type. Canonically identical to its
    /// underlying type, but spelled differently.
    Alias { name: String, underlying: TyId },
    /// A fixed-arity aggregate of element types.
    Tuple(Vec<TyId>),
    /// A function from `param` to `result`. Multi-parameter functions take a
    /// tuple-typed `param`.
    Fn { param: TyId, result: TyId },
    /// A mutable storage slot holding a value of the wrapped type.
    Lvalue(TyId),
    /// An argument passed by mutable reference.
    InOut(TyId),
    /// A value that may be absent.
    Optional(TyId),
    /// Weak reference storage; reads produce an optional of the referent.
    Weak(TyId),
    /// Unowned reference storage; reads produce the referent directly.
    Unowned(TyId),
    /// The type of a reference to a type itself.
    Metatype(TyId),
}

// =============================================================================
// Type Arena
// =============================================================================

/// Owns every [`Ty`] of one compilation unit and implements the type
/// algebra over them.
#[derive(Debug)]
pub struct TyArena {
    tys: Arena<Ty>,
    error: TyId,
}

impl Default for TyArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TyArena {
    /// Create an arena with the error sentinel pre-allocated.
    #[must_use]
    pub fn new() -> Self {
        let mut tys = Arena::new();
        let error = tys.alloc(Ty::Error);
        TyArena { tys, error }
    }

    /// Look up a type by id.
    #[inline]
    pub fn get(&self, id: TyId) -> &Ty {
        &self.tys[id]
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// The shared error sentinel type.
    #[inline]
    pub fn error(&self) -> TyId {
        self.error
    }

    /// Allocate a builtin type.
    pub fn builtin(&mut self, b: Builtin) -> TyId {
        self.tys.alloc(Ty::Builtin(b))
    }

    /// Allocate a nominal struct type (value semantics).
    pub fn nominal_struct(&mut self, name: impl Into<String>) -> TyId {
        self.tys.alloc(Ty::Nominal {
            name: name.into(),
            class: false,
        })
    }

    /// Allocate a nominal class type (reference semantics).
    pub fn nominal_class(&mut self, name: impl Into<String>) -> TyId {
        self.tys.alloc(Ty::Nominal {
            name: name.into(),
            class: true,
        })
    }

    /// Allocate an alias spelling of `underlying`.
    pub fn alias(&mut self, name: impl Into<String>, underlying: TyId) -> TyId {
        self.tys.alloc(Ty::Alias {
            name: name.into(),
            underlying,
        })
    }

    /// Allocate a tuple type.
    pub fn tuple(&mut self, elems: Vec<TyId>) -> TyId {
        self.tys.alloc(Ty::Tuple(elems))
    }

    /// Allocate a function type.
    pub fn function(&mut self, param: TyId, result: TyId) -> TyId {
        self.tys.alloc(Ty::Fn { param, result })
    }

    /// Allocate an lvalue wrapper around `object`.
    pub fn lvalue(&mut self, object: TyId) -> TyId {
        self.tys.alloc(Ty::Lvalue(object))
    }

    /// Allocate an inout wrapper around `object`.
    pub fn inout(&mut self, object: TyId) -> TyId {
        self.tys.alloc(Ty::InOut(object))
    }

    /// Allocate an optional of `inner`.
    pub fn optional(&mut self, inner: TyId) -> TyId {
        self.tys.alloc(Ty::Optional(inner))
    }

    /// Allocate weak reference storage of `referent`.
    pub fn weak(&mut self, referent: TyId) -> TyId {
        self.tys.alloc(Ty::Weak(referent))
    }

    /// Allocate unowned reference storage of `referent`.
    pub fn unowned(&mut self, referent: TyId) -> TyId {
        self.tys.alloc(Ty::Unowned(referent))
    }

    /// Allocate the metatype of `instance`.
    pub fn metatype(&mut self, instance: TyId) -> TyId {
        self.tys.alloc(Ty::Metatype(instance))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `id` is the error sentinel (through any sugar).
    #[inline]
    pub fn is_error(&self, id: TyId) -> bool {
        matches!(self.get(self.canonical(id)), Ty::Error)
    }

    /// Whether `id` is an lvalue wrapper (through any sugar).
    #[inline]
    pub fn is_lvalue(&self, id: TyId) -> bool {
        matches!(self.get(self.canonical(id)), Ty::Lvalue(_))
    }

    /// Whether values of `id` are shared by reference rather than copied.
    pub fn has_reference_semantics(&self, id: TyId) -> bool {
        matches!(self.get(self.canonical(id)), Ty::Nominal { class: true, .. })
    }

    /// The parameter and result of a function type, through any sugar.
    pub fn as_function(&self, id: TyId) -> Option<(TyId, TyId)> {
        match *self.get(self.canonical(id)) {
            Ty::Fn { param, result } => Some((param, result)),
            _ => None,
        }
    }

    /// The element types of a tuple type, through any sugar.
    pub fn as_tuple(&self, id: TyId) -> Option<&[TyId]> {
        match self.get(self.canonical(id)) {
            Ty::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    // =========================================================================
    // Sugar and Equality
    // =========================================================================

    /// Strip exactly one level of alias sugar, if present.
    pub fn strip_one_sugar(&self, id: TyId) -> TyId {
        match *self.get(id) {
            Ty::Alias { underlying, .. } => underlying,
            _ => id,
        }
    }

    /// Resolve all top-level alias sugar, yielding the canonical head.
    pub fn canonical(&self, mut id: TyId) -> TyId {
        while let Ty::Alias { underlying, .. } = *self.get(id) {
            id = underlying;
        }
        id
    }

    /// Deep structural equality ignoring alias spellings.
    pub fn canon_eq(&self, a: TyId, b: TyId) -> bool {
        let (a, b) = (self.canonical(a), self.canonical(b));
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Ty::Error, Ty::Error) => true,
            (Ty::Builtin(x), Ty::Builtin(y)) => x == y,
            (
                Ty::Nominal { name: na, class: ca },
                Ty::Nominal { name: nb, class: cb },
            ) => na == nb && ca == cb,
            (Ty::Tuple(xs), Ty::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(&x, &y)| self.canon_eq(x, y))
            }
            (
                Ty::Fn { param: pa, result: ra },
                Ty::Fn { param: pb, result: rb },
            ) => self.canon_eq(*pa, *pb) && self.canon_eq(*ra, *rb),
            (Ty::Lvalue(x), Ty::Lvalue(y))
            | (Ty::InOut(x), Ty::InOut(y))
            | (Ty::Optional(x), Ty::Optional(y))
            | (Ty::Weak(x), Ty::Weak(y))
            | (Ty::Unowned(x), Ty::Unowned(y))
            | (Ty::Metatype(x), Ty::Metatype(y)) => self.canon_eq(*x, *y),
            _ => false,
        }
    }

    /// Deep equality of surface spellings. Two aliases are spelled alike
    /// only when their names match; an alias is never spelled like its
    /// underlying type.
    pub fn spelled_like(&self, a: TyId, b: TyId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Ty::Error, Ty::Error) => true,
            (Ty::Builtin(x), Ty::Builtin(y)) => x == y,
            (
                Ty::Nominal { name: na, class: ca },
                Ty::Nominal { name: nb, class: cb },
            ) => na == nb && ca == cb,
            (Ty::Alias { name: na, .. }, Ty::Alias { name: nb, .. }) => na == nb,
            (Ty::Tuple(xs), Ty::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(&x, &y)| self.spelled_like(x, y))
            }
            (
                Ty::Fn { param: pa, result: ra },
                Ty::Fn { param: pb, result: rb },
            ) => self.spelled_like(*pa, *pb) && self.spelled_like(*ra, *rb),
            (Ty::Lvalue(x), Ty::Lvalue(y))
            | (Ty::InOut(x), Ty::InOut(y))
            | (Ty::Optional(x), Ty::Optional(y))
            | (Ty::Weak(x), Ty::Weak(y))
            | (Ty::Unowned(x), Ty::Unowned(y))
            | (Ty::Metatype(x), Ty::Metatype(y)) => self.spelled_like(*x, *y),
            _ => false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
