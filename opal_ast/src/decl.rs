//! Declarations of named program elements.
//!
//! Expression checking never owns declarations; expressions hold [`DeclId`]
//! handles into the declaration arena of the compilation unit. Only the
//! attributes this layer reads are modeled: settability, accessor
//! mutability, staticness, declared and interface types, and the validation
//! state driven by the external declaration validator.

use crate::arena::Id;
use crate::scope::ScopeId;
use crate::ty::TyId;
use opal_core::Span;

/// Handle to a declaration.
pub type DeclId = Id<Decl>;

// =============================================================================
// Accessors
// =============================================================================

/// One accessor of a computed variable or subscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessor {
    /// Whether the accessor requires a mutable receiver.
    pub mutating: bool,
}

impl Accessor {
    /// An accessor that does not require a mutable receiver.
    pub const NONMUTATING: Accessor = Accessor { mutating: false };
    /// An accessor that requires a mutable receiver.
    pub const MUTATING: Accessor = Accessor { mutating: true };
}

/// The getter/setter pair of a computed variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorPair {
    /// The getter. Every computed variable has one.
    pub getter: Accessor,
    /// The setter, absent for get-only computed variables.
    pub setter: Option<Accessor>,
}

// =============================================================================
// Declaration Kinds
// =============================================================================

/// What kind of entity a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// A variable. Stored when `accessors` is `None`, computed otherwise.
    Var {
        /// Getter/setter pair for computed variables.
        accessors: Option<AccessorPair>,
    },
    /// An indexed accessor pair. Subscripts always have a getter.
    Subscript {
        /// The getter.
        getter: Accessor,
        /// The setter, absent for get-only subscripts.
        setter: Option<Accessor>,
    },
    /// A function, including operator functions referenced from sequences.
    Fn,
    /// An infix operator declaration; its attributes live in the operator
    /// table keyed by name.
    InfixOperator,
}

// =============================================================================
// Declaration Flags
// =============================================================================

/// Bit flags classifying a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclFlags(u8);

impl DeclFlags {
    /// No flags.
    pub const NONE: DeclFlags = DeclFlags(0);
    /// Immutable binding; never settable.
    pub const LET: DeclFlags = DeclFlags(1 << 0);
    /// Declared static; member references bind the type, not an instance.
    pub const STATIC: DeclFlags = DeclFlags(1 << 1);
    /// Declared as a protocol requirement; references always go through
    /// overload resolution.
    pub const PROTOCOL_REQ: DeclFlags = DeclFlags(1 << 2);

    /// Check if a flag is set.
    #[inline]
    pub const fn contains(self, other: DeclFlags) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Combine flags.
    #[inline]
    pub const fn union(self, other: DeclFlags) -> DeclFlags {
        DeclFlags(self.0 | other.0)
    }
}

impl std::ops::BitOr for DeclFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for DeclFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// =============================================================================
// Validation State
// =============================================================================

/// Where a declaration stands with the external validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclState {
    /// Not yet validated; its type may not be read.
    #[default]
    Unchecked,
    /// Validated successfully.
    Valid,
    /// Validation failed; references produce the error type.
    Invalid,
}

// =============================================================================
// Declaration
// =============================================================================

/// A named program element referenced by expressions.
#[derive(Debug, Clone)]
pub struct Decl {
    /// The declared name.
    pub name: String,
    /// What the declaration introduces.
    pub kind: DeclKind,
    /// The scope the declaration lives in.
    pub scope: ScopeId,
    /// The declared type, absent until set by the declaration checker.
    pub declared_ty: Option<TyId>,
    /// The interface type, if it differs from the declared type.
    pub interface_ty: Option<TyId>,
    /// Classification flags.
    pub flags: DeclFlags,
    /// Validation state, transitioned once by the validator.
    pub state: DeclState,
    /// Where the declaration was written.
    pub span: Span,
}

impl Decl {
    /// Create an unchecked declaration with no type and no flags.
    pub fn new(name: impl Into<String>, kind: DeclKind, scope: ScopeId, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            scope,
            declared_ty: None,
            interface_ty: None,
            flags: DeclFlags::NONE,
            state: DeclState::Unchecked,
            span,
        }
    }

    /// Whether this is a variable declaration.
    #[inline]
    pub fn is_var(&self) -> bool {
        matches!(self.kind, DeclKind::Var { .. })
    }

    /// Whether this is a subscript declaration.
    #[inline]
    pub fn is_subscript(&self) -> bool {
        matches!(self.kind, DeclKind::Subscript { .. })
    }

    /// Whether the declaration is static.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(DeclFlags::STATIC)
    }

    /// Whether the declaration is a protocol requirement.
    #[inline]
    pub fn is_protocol_requirement(&self) -> bool {
        self.flags.contains(DeclFlags::PROTOCOL_REQ)
    }

    /// Whether validation marked this declaration invalid.
    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.state == DeclState::Invalid
    }

    /// Whether a reference to this declaration can be assigned to at all.
    /// Immutable bindings and get-only accessors are never settable.
    pub fn is_settable(&self) -> bool {
        if self.flags.contains(DeclFlags::LET) {
            return false;
        }
        match self.kind {
            DeclKind::Var { accessors: None } => true,
            DeclKind::Var {
                accessors: Some(pair),
            } => pair.setter.is_some(),
            DeclKind::Subscript { setter, .. } => setter.is_some(),
            DeclKind::Fn | DeclKind::InfixOperator => false,
        }
    }

    /// The setter of a computed variable, if any.
    pub fn var_setter(&self) -> Option<Accessor> {
        match self.kind {
            DeclKind::Var {
                accessors: Some(pair),
            } => pair.setter,
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
