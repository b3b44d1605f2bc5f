//! Surface AST and semantic type model for the Gala language.
//!
//! Gala is a Scala-flavored superset of Go syntax: immutable `val`
//! bindings, case-class struct declarations, sealed discriminated unions,
//! pattern matching, generics, companion-object `Apply`/`Unapply`,
//! lambdas, and partial-function literals. The parser collaborator
//! produces the tree defined here; the analyzer and transformer consume
//! it.
//!
//! Every node is a plain tagged union carrying a byte-offset [`Span`].
//! There is no base class and no virtual dispatch -- consumers match
//! exhaustively on each sum.
//!
//! [`Span`]: gala_common::Span

pub mod ast;
pub mod build;
pub mod ty;

pub use ast::*;
pub use ty::Type;
