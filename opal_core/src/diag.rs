//! Diagnostics for semantic analysis.
//!
//! Checking never aborts on a user-level error: each problem is reported
//! into the [`Diagnostics`] sink and analysis continues on a best-effort
//! tree, so one compilation surfaces as many independent errors as possible.

use crate::span::Span;
use thiserror::Error;

/// The diagnostics expression checking can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiagKind {
    /// An element in operator position of a sequence does not resolve to a
    /// declared infix operator.
    #[error("expression is not a known binary operator")]
    UnknownBinaryOperator,
    /// Two adjacent operators of equal precedence where at least one is
    /// declared non-associative.
    #[error("adjacent operators are non-associative; add parentheses")]
    NonAssociativeAdjacency,
    /// Two adjacent operators of equal precedence but different
    /// associativity.
    #[error("adjacent operators have incompatible associativity; add parentheses")]
    IncompatibleAssociativity,
    /// The standard library is missing the intrinsic support needed to
    /// operate on optional values.
    #[error("optional intrinsics are missing from the standard library")]
    MissingOptionalIntrinsics,
}

/// One reported diagnostic and where it was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagKind,
    /// Where it went wrong.
    pub span: Span,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.span, self.kind)
    }
}

/// Append-only collection of diagnostics for one compilation unit.
///
/// Reporting never fails and never throws; rendering is a separate concern.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diags: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn report(&mut self, kind: DiagKind, span: Span) {
        self.diags.push(Diagnostic { kind, span });
    }

    /// All diagnostics reported so far, in report order.
    #[must_use]
    pub fn all(&self) -> &[Diagnostic] {
        &self.diags
    }

    /// Whether any diagnostic of `kind` has been reported.
    #[must_use]
    pub fn has(&self, kind: DiagKind) -> bool {
        self.diags.iter().any(|d| d.kind == kind)
    }

    /// Number of diagnostics of `kind` reported so far.
    #[must_use]
    pub fn count_of(&self, kind: DiagKind) -> usize {
        self.diags.iter().filter(|d| d.kind == kind).count()
    }

    /// Total number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    /// Whether the sink is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diags.is_empty()
    }
}
