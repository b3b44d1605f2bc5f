//! Target Go AST and printer.
//!
//! The transformer emits this tree; the printer serializes it to
//! gofmt-shaped text (tabs, one import block, fields aligned the simple
//! way). The tree intentionally mirrors `go/ast` concepts -- selector,
//! composite literal, index-list -- but is an owned tagged union with no
//! positions: the emitted file has no source mapping back to Gala.

pub mod ast;
pub mod printer;

pub use ast::*;
pub use printer::print_file;
