//! Multi-file semantic analysis.
//!
//! Two passes over every unit: types first (structs, interfaces, sealed
//! unions and their companions), then functions and methods, so a
//! method can attach to a receiver type declared in a different file of
//! the same package. The merged tables are attached to each file's
//! [`RichAst`].

use gala_common::{SourceError, SourceText};
use gala_syntax::ast::{Decl, FuncDecl, SourceFile, TypeExpr};
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::go_exports::go_exports;
use crate::metadata::{
    CompanionObjectMetadata, FunctionMetadata, MethodMetadata, TypeMetadata,
};
use crate::packages::{pkg_name_from_path, STD_PATH, STD_PKG};
use crate::rich_ast::RichAst;
use crate::sealed::sealed_layout;
use crate::std_lib::register_std;

/// One file handed to the analyzer: its path, raw source (for error
/// positions), and parse tree.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub path: String,
    pub source: String,
    pub file: SourceFile,
}

impl SourceUnit {
    pub fn new(
        path: impl Into<String>,
        source: impl Into<String>,
        file: SourceFile,
    ) -> Self {
        SourceUnit {
            path: path.into(),
            source: source.into(),
            file,
        }
    }
}

/// Analyze a set of parsed files into one rich AST per file.
pub fn analyze(units: Vec<SourceUnit>) -> Result<Vec<RichAst>, SourceError> {
    let mut types: FxHashMap<String, TypeMetadata> = FxHashMap::default();
    let mut functions: FxHashMap<String, FunctionMetadata> = FxHashMap::default();
    let mut companions: FxHashMap<String, CompanionObjectMetadata> = FxHashMap::default();
    let mut packages: FxHashMap<String, String> = FxHashMap::default();

    // The runtime is implicitly importable from every file.
    packages.insert(STD_PATH.to_string(), STD_PKG.to_string());
    register_std(&mut types, &mut functions, &mut companions);

    // Pass 1: packages and type-level declarations.
    for unit in &units {
        collect_imports(&unit.file, &mut packages);
        collect_types(unit, &mut types, &mut companions)?;
    }

    // Pass 2: functions and methods, now that receivers resolve.
    for unit in &units {
        collect_functions(unit, &mut types, &mut functions)?;
    }

    let exports = go_exports();
    Ok(units
        .into_iter()
        .map(|unit| RichAst {
            file: unit.file,
            file_path: unit.path,
            source: unit.source,
            types: types.clone(),
            functions: functions.clone(),
            companion_objects: companions.clone(),
            packages: packages.clone(),
            go_exports: exports.clone(),
        })
        .collect())
}

fn collect_imports(file: &SourceFile, packages: &mut FxHashMap<String, String>) {
    for decl in &file.decls {
        if let Decl::Import(import) = decl {
            for spec in &import.specs {
                packages
                    .entry(spec.path.clone())
                    .or_insert_with(|| pkg_name_from_path(&spec.path));
            }
        }
    }
}

fn collect_types(
    unit: &SourceUnit,
    types: &mut FxHashMap<String, TypeMetadata>,
    companions: &mut FxHashMap<String, CompanionObjectMetadata>,
) -> Result<(), SourceError> {
    let pkg = &unit.file.package;
    for decl in &unit.file.decls {
        match decl {
            Decl::Struct(s) => {
                let mut meta = TypeMetadata::new(pkg, &s.name);
                meta.type_params = s.type_params.iter().map(|p| p.name.clone()).collect();
                for field in &s.fields {
                    meta.push_field(
                        &field.name,
                        Type::from_type_expr(&field.ty),
                        !field.mutable,
                    );
                }
                types.insert(meta.name.clone(), meta);
            }

            Decl::Interface(i) => {
                let mut meta = TypeMetadata::new(pkg, &i.name);
                meta.type_params = i.type_params.iter().map(|p| p.name.clone()).collect();
                let generic = !meta.type_params.is_empty();
                for sig in &i.methods {
                    meta.methods.insert(
                        sig.name.clone(),
                        MethodMetadata {
                            param_types: sig
                                .params
                                .iter()
                                .map(|p| Type::from_type_expr(&p.ty))
                                .collect(),
                            type_params: vec![],
                            is_generic: generic,
                            result_types: result_types(&sig.results),
                        },
                    );
                }
                types.insert(meta.name.clone(), meta);
            }

            Decl::Sealed(s) => {
                let layout = sealed_layout(s);
                let generic = !layout.type_params.is_empty();
                let parent_ty = parent_type(pkg, &s.name, &layout.type_params);

                // The tagged parent struct.
                let mut parent = TypeMetadata::new(pkg, &s.name);
                parent.type_params = layout.type_params.clone();
                for field in &layout.parent_fields {
                    // Recursive fields live behind a plain pointer, so
                    // reads of them never unwrap through Get().
                    parent.push_field(&field.name, field.ty.clone(), !field.recursive);
                }
                // Generated surface: one is-check per variant, plus the
                // Copy/Equal/String trio every sealed parent carries.
                for variant in &layout.variants {
                    parent.methods.insert(
                        format!("is{}", variant.name),
                        MethodMetadata {
                            param_types: vec![],
                            type_params: vec![],
                            is_generic: generic,
                            result_types: vec![Type::basic("bool")],
                        },
                    );
                }
                parent.methods.insert(
                    "String".into(),
                    MethodMetadata {
                        param_types: vec![],
                        type_params: vec![],
                        is_generic: generic,
                        result_types: vec![Type::basic("string")],
                    },
                );
                parent.methods.insert(
                    "Copy".into(),
                    MethodMetadata {
                        param_types: vec![],
                        type_params: vec![],
                        is_generic: generic,
                        result_types: vec![parent_ty.clone()],
                    },
                );
                parent.methods.insert(
                    "Equal".into(),
                    MethodMetadata {
                        param_types: vec![parent_ty.clone()],
                        type_params: vec![],
                        is_generic: generic,
                        result_types: vec![Type::basic("bool")],
                    },
                );
                types.insert(parent.name.clone(), parent);

                // Per-variant companion structs with Apply/Unapply.
                for (variant, decl_variant) in layout.variants.iter().zip(&s.variants) {
                    let apply_params: Vec<Type> = decl_variant
                        .fields
                        .iter()
                        .map(|f| Type::from_type_expr(&f.ty))
                        .collect();
                    let mut companion_ty = TypeMetadata::new(pkg, &variant.name);
                    companion_ty.type_params = layout.type_params.clone();
                    companion_ty.methods.insert(
                        "Apply".into(),
                        MethodMetadata {
                            param_types: apply_params.clone(),
                            type_params: vec![],
                            is_generic: generic,
                            result_types: vec![parent_ty.clone()],
                        },
                    );
                    companion_ty.methods.insert(
                        "Unapply".into(),
                        MethodMetadata {
                            param_types: vec![parent_ty.clone()],
                            type_params: vec![],
                            is_generic: generic,
                            result_types: unapply_results(&apply_params),
                        },
                    );
                    types.insert(companion_ty.name.clone(), companion_ty);

                    companions.insert(
                        format!("{}.{}", pkg, variant.name),
                        CompanionObjectMetadata {
                            name: format!("{}.{}", pkg, variant.name),
                            package: pkg.clone(),
                            parent: parent_ty.clone(),
                            apply_param_types: apply_params,
                            type_params: layout.type_params.clone(),
                        },
                    );
                }
            }

            _ => {}
        }
    }
    Ok(())
}

fn collect_functions(
    unit: &SourceUnit,
    types: &mut FxHashMap<String, TypeMetadata>,
    functions: &mut FxHashMap<String, FunctionMetadata>,
) -> Result<(), SourceError> {
    let pkg = &unit.file.package;
    for decl in &unit.file.decls {
        let func = match decl {
            Decl::Func(f) => f,
            _ => continue,
        };
        match &func.receiver {
            Some(receiver) => {
                let recv_ty = Type::from_type_expr(&receiver.ty);
                let key = format!("{}.{}", pkg, recv_ty.base_name());
                let container = types.get_mut(&key).ok_or_else(|| {
                    positioned(
                        unit,
                        func,
                        format!(
                            "method {} declared on unknown type {}",
                            func.name,
                            recv_ty.base_name()
                        ),
                    )
                })?;
                let container_generic = !container.type_params.is_empty();
                let type_params: Vec<String> =
                    func.type_params.iter().map(|p| p.name.clone()).collect();
                container.methods.insert(
                    func.name.clone(),
                    MethodMetadata {
                        param_types: func
                            .params
                            .iter()
                            .map(|p| Type::from_type_expr(&p.ty))
                            .collect(),
                        is_generic: !type_params.is_empty() || container_generic,
                        type_params,
                        result_types: result_types(&func.results),
                    },
                );
            }
            None => {
                functions.insert(
                    format!("{}.{}", pkg, func.name),
                    FunctionMetadata {
                        param_types: func
                            .params
                            .iter()
                            .map(|p| Type::from_type_expr(&p.ty))
                            .collect(),
                        type_params: func.type_params.iter().map(|p| p.name.clone()).collect(),
                        result_types: result_types(&func.results),
                    },
                );
            }
        }
    }
    Ok(())
}

/// Convert a declared result list, treating a lone unit as void.
fn result_types(results: &[TypeExpr]) -> Vec<Type> {
    results
        .iter()
        .map(Type::from_type_expr)
        .filter(|t| !t.is_void())
        .collect()
}

/// The parent type a sealed companion's `Apply` returns.
fn parent_type(pkg: &str, name: &str, type_params: &[String]) -> Type {
    let base = Type::named(pkg, name);
    if type_params.is_empty() {
        base
    } else {
        Type::generic(
            base,
            type_params.iter().map(|p| Type::named("", p)).collect(),
        )
    }
}

/// The result shape of a generated variant `Unapply`: bare bool for
/// zero fields, `Option[F]` for one, `Option[TupleN[...]]` beyond.
fn unapply_results(apply_params: &[Type]) -> Vec<Type> {
    match apply_params.len() {
        0 => vec![Type::basic("bool")],
        1 => vec![Type::generic(
            Type::named(STD_PKG, "Option"),
            vec![apply_params[0].clone()],
        )],
        n => {
            let tuple_name = if n == 2 {
                "Tuple".to_string()
            } else {
                format!("Tuple{}", n)
            };
            vec![Type::generic(
                Type::named(STD_PKG, "Option"),
                vec![Type::generic(
                    Type::named(STD_PKG, &tuple_name),
                    apply_params.to_vec(),
                )],
            )]
        }
    }
}

/// Positioned error helper for declaration-level failures.
fn positioned(unit: &SourceUnit, func: &FuncDecl, message: String) -> SourceError {
    SourceText::new(&unit.path, &unit.source).error_at(func.span, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_syntax::build::*;

    #[test]
    fn struct_metadata_collected() {
        let file = file(
            "main",
            vec![struct_decl(
                "Point",
                vec![field("x", tname("int")), field("y", tname("int"))],
            )],
        );
        let rich = analyze(vec![SourceUnit::new("main.gala", "", file)]).unwrap();
        let meta = &rich[0].types["main.Point"];
        assert_eq!(meta.field_names, vec!["x", "y"]);
        assert_eq!(meta.immut_flags, vec![true, true]);
        assert_eq!(meta.fields["x"], Type::basic("int"));
    }

    #[test]
    fn sealed_union_registers_parent_and_companions() {
        let file = file(
            "main",
            vec![sealed_decl(
                "Shape",
                vec![
                    variant("Circle", vec![field("r", tname("int"))]),
                    variant(
                        "Rectangle",
                        vec![field("w", tname("int")), field("h", tname("int"))],
                    ),
                ],
            )],
        );
        let rich = analyze(vec![SourceUnit::new("shapes.gala", "", file)]).unwrap();
        let parent = &rich[0].types["main.Shape"];
        assert_eq!(parent.field_names, vec!["r", "w", "h"]);
        assert!(parent.has_method("isCircle"));
        assert!(parent.has_method("isRectangle"));
        assert!(parent.has_method("String"));

        let circle = &rich[0].companion_objects["main.Circle"];
        assert_eq!(circle.parent, Type::named("main", "Shape"));
        assert_eq!(circle.apply_param_types, vec![Type::basic("int")]);

        // The companion struct is also a type with Apply.
        assert!(rich[0].types["main.Circle"].has_method("Apply"));
    }

    #[test]
    fn method_attaches_across_files() {
        let decl_file = file(
            "geo",
            vec![struct_decl("Vec", vec![field("x", tname("int"))])],
        );
        let method_file = file(
            "geo",
            vec![method_expr(
                "v",
                tname("Vec"),
                "Norm",
                &[],
                vec![],
                vec![tname("int")],
                member(ident("v"), "x"),
            )],
        );
        let rich = analyze(vec![
            SourceUnit::new("vec.gala", "", decl_file),
            SourceUnit::new("norm.gala", "", method_file),
        ])
        .unwrap();
        let meta = &rich[0].types["geo.Vec"];
        let norm = &meta.methods["Norm"];
        assert!(!norm.is_generic);
        assert_eq!(norm.result_types, vec![Type::basic("int")]);
    }

    #[test]
    fn method_on_unknown_type_errors() {
        let bad = file(
            "main",
            vec![method_expr(
                "g",
                tname("Ghost"),
                "Boo",
                &[],
                vec![],
                vec![],
                int("1"),
            )],
        );
        let err = analyze(vec![SourceUnit::new("main.gala", "func ...", bad)]).unwrap_err();
        assert!(err.message.contains("unknown type Ghost"));
    }

    #[test]
    fn generic_method_flags() {
        let f = file(
            "main",
            vec![
                struct_decl_generic("Box", &["T"], vec![field("v", tname("T"))]),
                method_expr(
                    "b",
                    tgen(tname("Box"), vec![tname("T")]),
                    "Unwrap",
                    &[],
                    vec![],
                    vec![tname("T")],
                    member(ident("b"), "v"),
                ),
            ],
        );
        let rich = analyze(vec![SourceUnit::new("box.gala", "", f)]).unwrap();
        assert!(rich[0].types["main.Box"].methods["Unwrap"].is_generic);
    }

    #[test]
    fn implicit_std_import_present() {
        let rich = analyze(vec![SourceUnit::new(
            "main.gala",
            "",
            file("main", vec![]),
        )])
        .unwrap();
        assert_eq!(rich[0].packages[STD_PATH], STD_PKG);
        assert!(rich[0].types.contains_key("galat.Option"));
    }
}
