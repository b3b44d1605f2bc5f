//! Semantic analysis for the Gala transpiler.
//!
//! The analyzer resolves symbols across a set of parsed files and
//! produces one [`RichAst`] per file: the parse tree plus the per-symbol
//! metadata tables the transformer consults. It runs in two passes:
//!
//! 1. Collect every type, sealed union, interface, function, and method
//!    declared by any file, keyed by `package.Name`.
//! 2. Attach the merged tables (plus the package map and the Go-export
//!    tables used for dot-import clash detection) to each file.
//!
//! Metadata is read-only to the transformer once a transform begins.

pub mod analyze;
pub mod go_exports;
pub mod metadata;
pub mod packages;
pub mod rich_ast;
pub mod sealed;
pub mod std_lib;

pub use analyze::{analyze, SourceUnit};
pub use metadata::{
    CompanionObjectMetadata, FunctionMetadata, MethodMetadata, TypeMetadata,
};
pub use rich_ast::RichAst;
