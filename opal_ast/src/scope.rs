//! Lexical scopes and ancestry queries.
//!
//! Scopes form a tree through parent links. Capture analysis and the
//! reference classifier only ever ask two questions of it: is scope A a
//! strict ancestor of scope B, and is a scope local (function or closure
//! body) as opposed to module or type level.

use crate::arena::{Arena, Id};

/// Handle to a scope in a [`ScopeTree`].
pub type ScopeId = Id<Scope>;

/// The kind of lexical scope a declaration can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Module (file) level.
    Module,
    /// The body of a struct or class.
    Nominal,
    /// A named function body.
    Function,
    /// A closure body.
    Closure,
}

impl ScopeKind {
    /// Whether declarations in this scope are local to an executable body.
    #[inline]
    pub const fn is_local(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::Closure)
    }
}

/// One node in the scope tree.
#[derive(Debug, Clone, Copy)]
pub struct Scope {
    /// Enclosing scope, or [`Id::INVALID`] for the module root.
    pub parent: ScopeId,
    /// What kind of scope this is.
    pub kind: ScopeKind,
}

/// Owns the scopes of one compilation unit.
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Arena<Scope>,
}

impl ScopeTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the module root scope.
    pub fn root(&mut self) -> ScopeId {
        self.scopes.alloc(Scope {
            parent: ScopeId::INVALID,
            kind: ScopeKind::Module,
        })
    }

    /// Allocate a child scope of `parent`.
    pub fn child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        self.scopes.alloc(Scope { parent, kind })
    }

    /// Look up a scope by id.
    #[inline]
    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Whether `ancestor` strictly encloses `scope`. A scope is not its own
    /// ancestor.
    pub fn is_ancestor_of(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut cur = self.get(scope).parent;
        while cur.is_valid() {
            if cur == ancestor {
                return true;
            }
            cur = self.get(cur).parent;
        }
        false
    }

    /// Whether declarations in `scope` are local (function or closure body).
    #[inline]
    pub fn is_local(&self, scope: ScopeId) -> bool {
        self.get(scope).kind.is_local()
    }
}
