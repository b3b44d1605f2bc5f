//! The Gala AST transformer.
//!
//! `transform` walks one rich AST and produces one Go file. It owns all
//! mutable state for the walk -- scopes, the import manager, the
//! inference session, shadow tables, temp-name counters -- and discards
//! everything on return. The call is synchronous and shares nothing:
//! callers may run many transforms in parallel, one instance each.
//!
//! # Architecture
//!
//! - [`imports`]: the import manager and dot-import clash detection
//! - [`scope`]: variable scopes with `val`/`var` tracking
//! - [`resolve`]: the single name-resolution order every lookup uses
//! - [`decls`]: declaration lowering, method hoisting
//! - [`structs`]: generated `Copy`/`Equal`/`Unapply` for struct types
//! - [`sealed`]: sealed-union lowering to tagged parent structs
//! - [`stmts`]: statement lowering
//! - [`exprs`]: expression lowering, auto-`Get`, lambdas, `if` IIFEs
//! - [`calls`]: the call-resolution decision tree
//! - [`matcher`]: `match` compilation to UnapplyCheck/UnapplyFull chains

pub mod calls;
pub mod decls;
pub mod exprs;
pub mod imports;
pub mod matcher;
pub mod resolve;
pub mod scope;
pub mod sealed;
pub mod stmts;
pub mod structs;
pub mod types;

use gala_analyzer::packages::{STD_PATH, STD_PKG};
use gala_analyzer::{FunctionMetadata, RichAst, TypeMetadata};
use gala_common::{SourceError, SourceText, Span};
use gala_goast as goast;
use gala_infer::Inferer;
use gala_syntax::ast::Decl;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::imports::{detect_dot_import_clashes, ImportManager};
use crate::resolve::{resolve_name, ResolveCtx};
use crate::scope::ScopeStack;

/// Transform one rich AST into a Go file.
pub fn transform(rich: &RichAst) -> Result<goast::File, SourceError> {
    Transformer::new(rich)?.run()
}

/// All state for one transform. Nothing survives the call.
pub struct Transformer<'a> {
    pub(crate) rich: &'a RichAst,
    pub(crate) source: SourceText,
    pub(crate) imports: ImportManager,
    pub(crate) scopes: ScopeStack,
    pub(crate) inferer: Inferer,

    // Shadow tables: per-file rewrite bookkeeping, populated as
    // declarations are visited, consulted by later call sites.
    pub(crate) struct_fields: FxHashMap<String, Vec<String>>,
    pub(crate) struct_immut_fields: FxHashMap<String, Vec<bool>>,
    pub(crate) struct_field_types: FxHashMap<String, FxHashMap<String, Type>>,
    pub(crate) generic_methods: FxHashMap<(String, String), bool>,

    pub(crate) tmp_counter: u32,
    pub(crate) ok_counter: u32,
    pub(crate) needs_runtime: bool,
    pub(crate) needs_fmt: bool,
}

impl<'a> Transformer<'a> {
    fn new(rich: &'a RichAst) -> Result<Self, SourceError> {
        let mut tf = Transformer {
            rich,
            source: SourceText::new(&rich.file_path, &rich.source),
            imports: ImportManager::new(),
            scopes: ScopeStack::new(),
            inferer: Inferer::new(),
            struct_fields: FxHashMap::default(),
            struct_immut_fields: FxHashMap::default(),
            struct_field_types: FxHashMap::default(),
            generic_methods: FxHashMap::default(),
            tmp_counter: 0,
            ok_counter: 0,
            needs_runtime: false,
            needs_fmt: false,
        };

        // Imports: explicit specs first (they take precedence), then
        // every package the analyzer discovered, then reconcile any
        // guessed package names against the analyzer's answers.
        for decl in &rich.file.decls {
            if let Decl::Import(import) = decl {
                for spec in &import.specs {
                    let pkg = rich.packages.get(&spec.path).map(String::as_str);
                    tf.imports
                        .add(&spec.path, spec.alias.as_deref(), spec.is_dot(), pkg);
                }
            }
        }
        tf.imports.add_from_packages(&rich.packages);
        for (path, pkg) in &rich.packages {
            tf.imports.update_actual_pkg_name(path, pkg);
        }

        detect_dot_import_clashes(rich, &tf.imports)?;

        // Seed the hoisting side table from metadata so cross-file call
        // sites agree with the declaring file's decision.
        for (qualified, meta) in &rich.types {
            let base = qualified.rsplit('.').next().unwrap_or(qualified);
            for (method, mm) in &meta.methods {
                if decls::needs_hoisting(base, &meta.type_params, mm) {
                    tf.generic_methods
                        .insert((qualified.clone(), method.clone()), true);
                }
            }
        }

        // Make functions of the current package and the runtime visible
        // to the inference helper under their simple names.
        for (qualified, meta) in &rich.functions {
            if let Some((pkg, simple)) = qualified.split_once('.') {
                if pkg == rich.file.package || pkg == STD_PKG {
                    tf.inferer.bind_func(
                        simple,
                        &meta.param_types,
                        &meta.result_types,
                        &meta.type_params,
                    );
                }
            }
        }

        Ok(tf)
    }

    fn run(mut self) -> Result<goast::File, SourceError> {
        let mut decls: Vec<goast::Decl> = Vec::new();
        let mut source_imports: Vec<goast::ImportSpec> = Vec::new();

        let rich = self.rich;
        for decl in &rich.file.decls {
            match decl {
                Decl::Import(import) => {
                    for spec in &import.specs {
                        source_imports.push(goast::ImportSpec {
                            path: spec.path.clone(),
                            alias: spec.alias.clone(),
                        });
                    }
                }
                other => decls.extend(self.decl(other)?),
            }
        }

        // Prepend required runtime imports, suppressing ones the source
        // already pulled in (with or without wildcard semantics).
        let mut imports: Vec<goast::ImportSpec> = Vec::new();
        if self.needs_runtime && !source_imports.iter().any(|i| i.path == STD_PATH) {
            imports.push(goast::ImportSpec::dot(STD_PATH));
        }
        if self.needs_fmt && !source_imports.iter().any(|i| i.path == "fmt") {
            imports.push(goast::ImportSpec::plain("fmt"));
        }
        imports.extend(source_imports);

        Ok(goast::File {
            package: rich.file.package.clone(),
            imports,
            decls,
        })
    }

    // ── Shared helpers ─────────────────────────────────────────────────

    pub(crate) fn current_pkg(&self) -> &str {
        &self.rich.file.package
    }

    /// A positioned semantic error at a span of the current file.
    pub(crate) fn err_at(&self, span: Span, message: impl Into<String>) -> SourceError {
        self.source.error_at(span, message)
    }

    /// Attach a position to an error that lacks one.
    pub(crate) fn position(&self, err: SourceError, span: Span) -> SourceError {
        if err.has_position() {
            err
        } else {
            self.err_at(span, err.message)
        }
    }

    /// Resolve a raw name against the type tables (shadow first, then
    /// analyzer metadata).
    pub(crate) fn lookup_type(&self, raw: &str) -> Option<(String, &TypeMetadata)> {
        let ctx = ResolveCtx {
            current_pkg: self.current_pkg(),
            imports: &self.imports,
        };
        let qualified = resolve_name(raw, &ctx, |name| {
            self.struct_fields.contains_key(name) || self.rich.types.contains_key(name)
        })?;
        self.rich.types.get(&qualified).map(|m| (qualified, m))
    }

    pub(crate) fn lookup_function(&self, raw: &str) -> Option<(String, &FunctionMetadata)> {
        let ctx = ResolveCtx {
            current_pkg: self.current_pkg(),
            imports: &self.imports,
        };
        let qualified = resolve_name(raw, &ctx, |name| self.rich.functions.contains_key(name))?;
        self.rich.functions.get(&qualified).map(|m| (qualified, m))
    }

    pub(crate) fn lookup_companion(
        &self,
        raw: &str,
    ) -> Option<(String, &gala_analyzer::CompanionObjectMetadata)> {
        let ctx = ResolveCtx {
            current_pkg: self.current_pkg(),
            imports: &self.imports,
        };
        let qualified =
            resolve_name(raw, &ctx, |name| self.rich.companion_objects.contains_key(name))?;
        self.rich
            .companion_objects
            .get(&qualified)
            .map(|m| (qualified, m))
    }

    /// Whether `(receiver type, method)` was hoisted to a free function.
    pub(crate) fn is_hoisted(&self, type_qualified: &str, method: &str) -> bool {
        self.generic_methods
            .get(&(type_qualified.to_string(), method.to_string()))
            .copied()
            .unwrap_or(false)
    }

    /// Metadata for the type a value of `ty` dispatches methods on.
    pub(crate) fn type_meta_of(&self, ty: &Type) -> Option<(String, &TypeMetadata)> {
        let base = ty.base_name();
        if base.is_empty() {
            return None;
        }
        let raw = if ty.package().is_empty() {
            base.to_string()
        } else {
            format!("{}.{}", ty.package(), base)
        };
        self.lookup_type(&raw)
    }

    pub(crate) fn fresh_tmp(&mut self) -> String {
        self.tmp_counter += 1;
        format!("tmp{}", self.tmp_counter)
    }

    pub(crate) fn fresh_ok(&mut self) -> String {
        self.ok_counter += 1;
        format!("ok{}", self.ok_counter)
    }

    /// An identifier from the runtime package; marks the runtime import
    /// as required.
    pub(crate) fn rt(&mut self, name: &str) -> goast::Expr {
        self.needs_runtime = true;
        goast::Expr::ident(name)
    }
}
