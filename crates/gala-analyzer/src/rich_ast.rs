//! The analyzer's output: a parse tree enriched with symbol metadata.

use gala_syntax::ast::SourceFile;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::metadata::{CompanionObjectMetadata, FunctionMetadata, TypeMetadata};

/// One file's parse tree plus everything the transformer needs to lower
/// it: the merged multi-file symbol tables, the package map, and the
/// Go-ecosystem export tables.
///
/// The tables are read-only once a transform begins; the transformer
/// keeps its own shadow tables for per-file rewrite bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct RichAst {
    pub file: SourceFile,
    pub file_path: String,
    pub source: String,
    /// Package-qualified type name -> metadata.
    pub types: FxHashMap<String, TypeMetadata>,
    /// Package-qualified function name -> metadata.
    pub functions: FxHashMap<String, FunctionMetadata>,
    /// Package-qualified companion name -> metadata.
    pub companion_objects: FxHashMap<String, CompanionObjectMetadata>,
    /// Import path -> package name, including the implicit runtime
    /// import.
    pub packages: FxHashMap<String, String>,
    /// Go package name -> exported symbols, for dot-import clash
    /// detection.
    pub go_exports: FxHashMap<String, Vec<String>>,
}
