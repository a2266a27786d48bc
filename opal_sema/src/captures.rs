//! Capture analysis for closures.
//!
//! Walks a closure body depth-first and records every reference to a
//! declaration from an enclosing scope. Nested closures are not walked
//! into: their already-computed capture sets are merged in instead, minus
//! anything they captured from this closure itself. Scheduling is
//! bottom-up over nesting and is the caller's obligation; this walk
//! assumes every syntactically nested closure has its set computed.

use crate::Sema;
use opal_ast::{AstContext, CaptureSet, DeclId, ExprId, ExprKind, ScopeId};

/// Compute and store the capture set of `closure`.
///
/// The set is populated in first-discovery order with set semantics, so
/// recomputing over an unchanged tree yields an identical set. Panics if
/// `closure` is not a closure expression.
pub fn compute_captures(sema: &mut Sema, closure: ExprId) {
    let (scope, body) = match sema.ast.exprs[closure].kind {
        ExprKind::Closure { scope, body, .. } => (scope, body),
        _ => panic!("capture analysis over a non-closure expression"),
    };

    let mut walker = CaptureWalker {
        closure_scope: scope,
        captures: CaptureSet::default(),
    };
    walker.walk_expr(&sema.ast, body);

    if let ExprKind::Closure { captures, .. } = &mut sema.ast.exprs[closure].kind {
        *captures = Some(walker.captures);
    }
}

// =============================================================================
// Walker
// =============================================================================

/// Depth-first pre-order walk over one closure body.
struct CaptureWalker {
    /// The scope of the closure being analyzed. Declarations at or below
    /// it are local, not captures.
    closure_scope: ScopeId,
    /// Captures found so far, in discovery order.
    captures: CaptureSet,
}

impl CaptureWalker {
    fn walk_expr(&mut self, ast: &AstContext, id: ExprId) {
        match &ast.exprs[id].kind {
            ExprKind::DeclRef { decl, .. } => self.visit_decl_ref(ast, *decl),

            // Nested closures contribute their own computed captures,
            // filtered: what they captured from this closure is local
            // here, not a capture from further out.
            ExprKind::Closure { captures, .. } => {
                if let Some(nested) = captures {
                    for &decl in nested {
                        if ast.decls[decl].scope != self.closure_scope {
                            self.captures.insert(decl);
                        }
                    }
                }
            }

            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::StrLit(_)
            | ExprKind::OverloadedRef { .. }
            | ExprKind::Metatype { .. } => {}

            ExprKind::Binary { op, arg } => {
                self.walk_expr(ast, *op);
                self.walk_expr(ast, *arg);
            }
            ExprKind::Call { callee, arg } => {
                self.walk_expr(ast, *callee);
                self.walk_expr(ast, *arg);
            }
            ExprKind::Tuple(elems) | ExprKind::Sequence(elems) => {
                for &elem in elems {
                    self.walk_expr(ast, elem);
                }
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                self.walk_child(ast, *cond);
                self.walk_child(ast, *then_branch);
                self.walk_child(ast, *else_branch);
            }
            ExprKind::Assign { dest, src } => {
                self.walk_child(ast, *dest);
                self.walk_child(ast, *src);
            }
            ExprKind::Cast { sub, .. } => self.walk_child(ast, *sub),
            ExprKind::ForceUnwrap(sub) => self.walk_expr(ast, *sub),
            ExprKind::Member { base, .. } => self.walk_expr(ast, *base),
        }
    }

    /// Walk a child slot that may still be unfilled on an unfolded
    /// pseudo-operator node.
    fn walk_child(&mut self, ast: &AstContext, id: ExprId) {
        if id.is_valid() {
            self.walk_expr(ast, id);
        }
    }

    fn visit_decl_ref(&mut self, ast: &AstContext, decl: DeclId) {
        let d = &ast.decls[decl];

        // References to declarations at or below this closure are local;
        // only enclosing-scope declarations are candidate captures.
        if !ast.scopes.is_ancestor_of(d.scope, self.closure_scope) {
            return;
        }

        // Globals and free functions are reachable without capturing;
        // only variables are captured from non-local scopes.
        if !d.is_var() && !ast.scopes.is_local(d.scope) {
            return;
        }

        self.captures.insert(decl);
    }
}
