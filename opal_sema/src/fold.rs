//! Precedence folding of flat operator sequences.
//!
//! The parser hands expression sequences over flat: `[E0, Op1, E1, Op2,
//! E2, ...]`. This module folds such a sequence into a binary tree by
//! precedence climbing with an explicit minimum-precedence floor, walking
//! an immutable element slice through a cursor. General operators get
//! their attributes from the operator table; the ternary, assignment, and
//! cast pseudo-operators carry fixed attributes and never consult it.
//!
//! Every error path recovers: an unknown operator folds as if it bound
//! tighter than everything else, and an associativity conflict is
//! diagnosed and then arbitrarily left-grouped. After a conflict the
//! output shape is best-effort only, kept so checking can continue.

use crate::Sema;
use opal_ast::{Assoc, ExprId, ExprKind, InfixAttrs};
use opal_core::DiagKind;

// =============================================================================
// Operator Attributes
// =============================================================================

/// Fixed attributes of `cond ? then : else`.
const TERNARY_ATTRS: InfixAttrs = InfixAttrs::new(100, Assoc::Right);
/// Fixed attributes of `as` / `as!` casts.
const CAST_ATTRS: InfixAttrs = InfixAttrs::new(95, Assoc::None);
/// Fixed attributes of assignment.
const ASSIGN_ATTRS: InfixAttrs = InfixAttrs::new(90, Assoc::Right);
/// Recovery attributes for an element that is not a known operator: bind
/// tighter than anything declarable so folding still terminates.
const UNKNOWN_ATTRS: InfixAttrs = InfixAttrs::new(u8::MAX, Assoc::Left);

/// Attributes of the expression in operator position `op`.
///
/// Pseudo-operators answer from their fixed table above. Operator
/// references answer from the operator table by declaration name. Anything
/// else is diagnosed and recovered as [`UNKNOWN_ATTRS`].
fn infix_attrs(sema: &mut Sema, op: ExprId) -> InfixAttrs {
    let expr = &sema.ast.exprs[op];
    let name = match &expr.kind {
        ExprKind::Ternary { .. } => {
            debug_assert!(!expr.is_folded(), "folded ternary in operator position");
            return TERNARY_ATTRS;
        }
        ExprKind::Assign { .. } => {
            debug_assert!(!expr.is_folded(), "folded assignment in operator position");
            return ASSIGN_ATTRS;
        }
        ExprKind::Cast { .. } => {
            debug_assert!(!expr.is_folded(), "folded cast in operator position");
            return CAST_ATTRS;
        }
        ExprKind::DeclRef { decl, .. } => sema.ast.decls[*decl].name.as_str(),
        ExprKind::OverloadedRef { decls, .. } => sema.ast.decls[decls[0]].name.as_str(),
        _ => {
            let span = expr.span;
            sema.diags.report(DiagKind::UnknownBinaryOperator, span);
            return UNKNOWN_ATTRS;
        }
    };
    if let Some(decl) = sema.operators.lookup(name) {
        return decl.attrs;
    }
    let span = sema.ast.exprs[op].span;
    sema.diags.report(DiagKind::UnknownBinaryOperator, span);
    UNKNOWN_ATTRS
}

// =============================================================================
// Node Construction
// =============================================================================

/// Fold one operator against its operands, producing the combined node.
///
/// A `None` operand propagated from an earlier failure short-circuits to
/// `None` instead of constructing an invalid node. Pseudo-operators attach
/// their operands in place; a forced cast is rewritten into a force-unwrap
/// of the cast with the forced marker cleared. General operators build the
/// operator reference applied to an `(lhs, rhs)` tuple.
fn make_bin_op(
    sema: &mut Sema,
    op: ExprId,
    lhs: Option<ExprId>,
    rhs: Option<ExprId>,
) -> Option<ExprId> {
    let (lhs, rhs) = (lhs?, rhs?);

    match sema.ast.exprs[op].kind {
        ExprKind::Ternary { .. } => {
            debug_assert!(!sema.ast.exprs[op].is_folded(), "refolding a ternary");
            if let ExprKind::Ternary {
                cond, else_branch, ..
            } = &mut sema.ast.exprs[op].kind
            {
                *cond = lhs;
                *else_branch = rhs;
            }
            Some(op)
        }
        ExprKind::Assign { .. } => {
            debug_assert!(!sema.ast.exprs[op].is_folded(), "refolding an assignment");
            if let ExprKind::Assign { dest, src } = &mut sema.ast.exprs[op].kind {
                *dest = lhs;
                *src = rhs;
            }
            Some(op)
        }
        ExprKind::Cast { .. } => {
            debug_assert!(!sema.ast.exprs[op].is_folded(), "refolding a cast");
            // The sequence carries the cast node in its own operand slot;
            // the right side never extends past it.
            debug_assert_eq!(rhs, op, "cast folded against a foreign right side");
            let mut was_forced = false;
            if let ExprKind::Cast { sub, forced, .. } = &mut sema.ast.exprs[op].kind {
                *sub = lhs;
                was_forced = std::mem::take(forced);
            }
            if was_forced {
                let span = sema.ast.exprs[op].span;
                return Some(sema.ast.expr(ExprKind::ForceUnwrap(op), span));
            }
            Some(op)
        }
        _ => {
            let span = sema.ast.exprs[lhs].span.to(sema.ast.exprs[rhs].span);
            let implicit = sema.ast.exprs[lhs].implicit && sema.ast.exprs[rhs].implicit;
            let arg = sema.ast.expr(ExprKind::Tuple(vec![lhs, rhs]), span);
            sema.ast.exprs[arg].implicit = implicit;

            let op_implicit = sema.ast.exprs[op].implicit;
            let bin = sema.ast.expr(ExprKind::Binary { op, arg }, span);
            sema.ast.exprs[bin].implicit = op_implicit;
            Some(bin)
        }
    }
}

// =============================================================================
// Precedence Climbing
// =============================================================================

/// An operator pulled from the sequence together with its attributes.
#[derive(Clone, Copy)]
struct OpRef {
    expr: ExprId,
    attrs: InfixAttrs,
}

/// Read the operator at `cursor` if it binds at least as tightly as
/// `min_prec`. Does not advance the cursor.
fn next_operator(
    sema: &mut Sema,
    elements: &[ExprId],
    cursor: usize,
    min_prec: u8,
) -> Option<OpRef> {
    let expr = elements[cursor];
    let attrs = infix_attrs(sema, expr);
    if attrs.precedence < min_prec {
        return None;
    }
    Some(OpRef { expr, attrs })
}

/// Fold the remainder of `elements` onto `lhs`, consuming every operator
/// whose precedence is at least `min_prec`. A below-floor operator unwinds
/// one recursion level, leaving the cursor on it.
fn fold(
    sema: &mut Sema,
    mut lhs: Option<ExprId>,
    elements: &[ExprId],
    cursor: &mut usize,
    min_prec: u8,
) -> Option<ExprId> {
    // Remaining input is operator/operand pairs.
    debug_assert!(*cursor < elements.len());
    debug_assert_eq!((elements.len() - *cursor) % 2, 0);

    let mut op1 = match next_operator(sema, elements, *cursor, min_prec) {
        Some(op) => op,
        None => return lhs,
    };
    let mut rhs = Some(elements[*cursor + 1]);
    *cursor += 2;

    while *cursor < elements.len() {
        debug_assert!(op1.attrs.precedence >= min_prec);

        // A cast's right side is exactly its type operand and is never
        // extended by a following operator; fold it and move on.
        if matches!(sema.ast.exprs[op1.expr].kind, ExprKind::Cast { .. }) {
            lhs = make_bin_op(sema, op1.expr, lhs, rhs);
            op1 = match next_operator(sema, elements, *cursor, min_prec) {
                Some(op) => op,
                None => return lhs,
            };
            rhs = Some(elements[*cursor + 1]);
            *cursor += 2;
            continue;
        }

        let op2_expr = elements[*cursor];
        let op2 = infix_attrs(sema, op2_expr);
        if op2.precedence < min_prec {
            break;
        }

        // Tighter on the left, or a left-associative tie: fold now.
        if op1.attrs.precedence > op2.precedence
            || (op1.attrs == op2 && op1.attrs.is_left_associative())
        {
            lhs = make_bin_op(sema, op1.expr, lhs, rhs);
            op1 = OpRef {
                expr: op2_expr,
                attrs: op2,
            };
            rhs = Some(elements[*cursor + 1]);
            *cursor += 2;
            continue;
        }

        // Tighter on the right: the right side absorbs every operator that
        // binds more strongly than op1, then we reconsider op2.
        if op1.attrs.precedence < op2.precedence {
            rhs = fold(sema, rhs, elements, cursor, op1.attrs.precedence + 1);
            continue;
        }

        // A right-associative tie: fold the right side at the same floor so
        // it nests rightward, combine, and restart with the combined node
        // as the new left side.
        if op1.attrs == op2 && op1.attrs.is_right_associative() {
            rhs = fold(sema, rhs, elements, cursor, op1.attrs.precedence);
            lhs = make_bin_op(sema, op1.expr, lhs, rhs);
            if *cursor == elements.len() {
                return lhs;
            }
            return fold(sema, lhs, elements, cursor, min_prec);
        }

        // Equal precedence with mismatched or no associativity.
        debug_assert_eq!(op1.attrs.precedence, op2.precedence);
        if op1.attrs.is_non_associative() {
            let span = sema.ast.exprs[op1.expr].span;
            sema.diags.report(DiagKind::NonAssociativeAdjacency, span);
        } else if op2.is_non_associative() {
            let span = sema.ast.exprs[op2_expr].span;
            sema.diags.report(DiagKind::NonAssociativeAdjacency, span);
        } else {
            let span = sema.ast.exprs[op1.expr].span;
            sema.diags.report(DiagKind::IncompatibleAssociativity, span);
        }

        // Recover by arbitrarily folding the first pair; the result shape
        // is best-effort from here on.
        lhs = make_bin_op(sema, op1.expr, lhs, rhs);
        return fold(sema, lhs, elements, cursor, min_prec);
    }

    make_bin_op(sema, op1.expr, lhs, rhs)
}

// =============================================================================
// Entry Points
// =============================================================================

/// Fold a flat operand/operator slice into a single expression.
///
/// `elements` must be `[E0, Op1, E1, ...]`: odd length of at least three,
/// operands at even indices. Degenerate single-operand sequences are the
/// caller's to filter out. Returns `None` only when node construction
/// short-circuited on a propagated failure.
pub fn fold_sequence(sema: &mut Sema, elements: &[ExprId]) -> Option<ExprId> {
    assert!(elements.len() > 1, "inadequate number of elements in sequence");
    assert_eq!(elements.len() % 2, 1, "even number of elements in sequence");

    let lhs = elements[0];
    let mut cursor = 1;
    let result = fold(sema, Some(lhs), elements, &mut cursor, 0);
    debug_assert_eq!(cursor, elements.len(), "sequence not fully consumed");
    result
}

/// Fold a parsed [`ExprKind::Sequence`] node.
pub fn fold_sequence_expr(sema: &mut Sema, seq: ExprId) -> Option<ExprId> {
    let elements = match &sema.ast.exprs[seq].kind {
        ExprKind::Sequence(elements) => elements.clone(),
        _ => panic!("folding a non-sequence expression"),
    };
    fold_sequence(sema, &elements)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use opal_ast::{Decl, DeclKind, ScopeId};
    use opal_core::Span;

    fn operator(sema: &mut Sema, name: &str, prec: u8, assoc: Assoc) -> ExprId {
        sema.operators.define(name, InfixAttrs::new(prec, assoc));
        let decl = sema.ast.decl(Decl::new(
            name,
            DeclKind::Fn,
            ScopeId::INVALID,
            Span::default(),
        ));
        sema.ast.decl_ref(decl, Span::default())
    }

    fn lit(sema: &mut Sema, v: i64) -> ExprId {
        sema.ast.expr(ExprKind::IntLit(v), Span::default())
    }

    #[test]
    fn test_single_operator_folds_to_binary() {
        let mut sema = Sema::new();
        let plus = operator(&mut sema, "+", 140, Assoc::Left);
        let (a, b) = (lit(&mut sema, 1), lit(&mut sema, 2));

        let result = fold_sequence(&mut sema, &[a, plus, b]).unwrap();
        match sema.ast.exprs[result].kind {
            ExprKind::Binary { op, arg } => {
                assert_eq!(op, plus);
                match &sema.ast.exprs[arg].kind {
                    ExprKind::Tuple(elems) => assert_eq!(elems.as_slice(), &[a, b]),
                    other => panic!("expected tuple argument, got {other:?}"),
                }
            }
            ref other => panic!("expected binary, got {other:?}"),
        }
        assert!(sema.diags.is_empty());
    }

    #[test]
    fn test_higher_precedence_binds_tighter() {
        let mut sema = Sema::new();
        let plus = operator(&mut sema, "+", 140, Assoc::Left);
        let star = operator(&mut sema, "*", 160, Assoc::Left);
        let (a, b, c) = (lit(&mut sema, 1), lit(&mut sema, 2), lit(&mut sema, 3));

        // 1 + 2 * 3 folds as 1 + (2 * 3).
        let result = fold_sequence(&mut sema, &[a, plus, b, star, c]).unwrap();
        let ExprKind::Binary { op, arg } = sema.ast.exprs[result].kind else {
            panic!("expected binary root");
        };
        assert_eq!(op, plus);
        let ExprKind::Tuple(ref elems) = sema.ast.exprs[arg].kind else {
            panic!("expected tuple argument");
        };
        assert_eq!(elems[0], a);
        let ExprKind::Binary { op: inner_op, .. } = sema.ast.exprs[elems[1]].kind else {
            panic!("expected nested binary on the right");
        };
        assert_eq!(inner_op, star);
    }

    #[test]
    fn test_unknown_operator_is_diagnosed_and_recovered() {
        let mut sema = Sema::new();
        let plus = operator(&mut sema, "+", 140, Assoc::Left);
        let mystery = {
            let decl = sema.ast.decl(Decl::new(
                "<?>",
                DeclKind::Fn,
                ScopeId::INVALID,
                Span::default(),
            ));
            sema.ast.decl_ref(decl, Span::default())
        };
        let (a, b, c) = (lit(&mut sema, 1), lit(&mut sema, 2), lit(&mut sema, 3));

        let result = fold_sequence(&mut sema, &[a, mystery, b, plus, c]);
        assert!(result.is_some());
        assert!(sema.diags.has(DiagKind::UnknownBinaryOperator));
    }
}
