//! Arena-allocated syntax trees, types, and declarations for Opal.
//!
//! Everything semantic analysis touches lives in arenas owned by one
//! [`AstContext`](expr::AstContext) per compilation unit. Nodes refer to each
//! other through lightweight typed indices ([`arena::Id`]) rather than owning
//! pointers: expressions reference declarations, declarations reference
//! types, and nothing is freed until the whole context goes away.

pub mod arena;
pub mod decl;
pub mod expr;
pub mod operator;
pub mod scope;
pub mod ty;

pub use arena::{Arena, Id};
pub use decl::{Accessor, AccessorPair, Decl, DeclFlags, DeclId, DeclKind, DeclState};
pub use expr::{AstContext, CaptureSet, Expr, ExprId, ExprKind, OverloadSet};
pub use operator::{Assoc, InfixAttrs, InfixOperator, OperatorTable};
pub use scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use ty::{Builtin, Ty, TyArena, TyId};
