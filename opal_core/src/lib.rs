//! Shared primitives for the Opal compiler.
//!
//! This crate holds the pieces every phase agrees on: source spans and the
//! diagnostic sink that semantic analysis reports through. It deliberately
//! knows nothing about syntax trees or types.

pub mod diag;
pub mod span;

pub use diag::{DiagKind, Diagnostic, Diagnostics};
pub use span::Span;
