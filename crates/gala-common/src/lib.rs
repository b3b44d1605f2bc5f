//! Shared types for the Gala transpiler.
//!
//! Every stage of the pipeline (analyzer, inference, transformer)
//! reports positions as byte-offset spans into the original source.
//! [`SourceText`] is where a span becomes the `(file, line, column)` of
//! a structured [`SourceError`].

pub mod diagnostics;
pub mod error;
pub mod source;

pub use error::{ErrorKind, SourceError};
pub use source::{SourceText, Span};
