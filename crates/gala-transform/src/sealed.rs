//! Sealed-union lowering.
//!
//! `sealed T = C1(...) | C2(...)` expands to a tagged parent struct
//! holding the union of variant fields, a block of tag constants, one
//! empty companion struct per variant carrying `Apply`/`Unapply`, and
//! `isCi`/`Copy`/`Equal`/`String` on the parent. The shared layout
//! (field merging, collision prefixing, recursion) comes from the
//! analyzer so metadata and emission always agree.

use gala_analyzer::sealed::{sealed_layout, SealedLayout, SealedVariant};
use gala_common::SourceError;
use gala_goast as goast;
use gala_syntax::ast::SealedDecl;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::structs::receiver_name;
use crate::Transformer;

impl Transformer<'_> {
    pub(crate) fn sealed_decls(
        &mut self,
        s: &SealedDecl,
    ) -> Result<Vec<goast::Decl>, SourceError> {
        let layout = sealed_layout(s);
        let qualified = format!("{}.{}", self.current_pkg(), s.name);

        // Shadow registration mirrors what the struct path does.
        self.struct_fields.insert(
            qualified.clone(),
            layout.parent_fields.iter().map(|f| f.name.clone()).collect(),
        );
        self.struct_immut_fields.insert(
            qualified.clone(),
            layout.parent_fields.iter().map(|f| !f.recursive).collect(),
        );
        self.struct_field_types.insert(
            qualified.clone(),
            layout
                .parent_fields
                .iter()
                .map(|f| (f.name.clone(), f.ty.clone()))
                .collect::<FxHashMap<_, _>>(),
        );

        let parent_go = self.instantiated_name(&layout.parent_name, &layout.type_params);
        let mut decls = Vec::new();

        decls.push(self.parent_struct(&layout, &parent_go));
        decls.push(tag_constants(&layout));
        for variant in &layout.variants {
            decls.extend(self.companion_decls(&layout, variant, &parent_go));
        }
        decls.extend(self.parent_methods(&layout, &parent_go));
        Ok(decls)
    }

    /// The tagged parent struct.
    fn parent_struct(&mut self, layout: &SealedLayout, parent_go: &goast::Expr) -> goast::Decl {
        let mut fields = Vec::with_capacity(layout.parent_fields.len() + 1);
        for field in &layout.parent_fields {
            let ty = if field.recursive {
                // Stored by pointer to break value-type recursion.
                goast::Expr::Star(Box::new(parent_go.clone()))
            } else {
                self.immutable_of(&field.ty)
            };
            fields.push(goast::Field::named(field.name.clone(), ty));
        }
        fields.push(goast::Field::named("_variant", goast::Expr::ident("uint8")));

        let type_params = layout
            .type_params
            .iter()
            .map(|tp| goast::Field::named(tp.clone(), goast::Expr::ident("any")))
            .collect();
        goast::Decl::Type(goast::TypeDecl {
            name: layout.parent_name.clone(),
            type_params,
            ty: goast::Expr::StructType { fields },
        })
    }

    /// One companion struct per variant, with its `Apply` constructor
    /// and `Unapply` extractor.
    fn companion_decls(
        &mut self,
        layout: &SealedLayout,
        variant: &SealedVariant,
        parent_go: &goast::Expr,
    ) -> Vec<goast::Decl> {
        let recv = receiver_name(&variant.name);
        let companion_go = self.instantiated_name(&variant.name, &layout.type_params);
        let type_params: Vec<goast::Field> = layout
            .type_params
            .iter()
            .map(|tp| goast::Field::named(tp.clone(), goast::Expr::ident("any")))
            .collect();

        let mut decls = vec![goast::Decl::Type(goast::TypeDecl {
            name: variant.name.clone(),
            type_params,
            ty: goast::Expr::StructType { fields: vec![] },
        })];

        // Apply: construct the parent with this variant's tag.
        let mut elems = Vec::with_capacity(variant.slots.len() + 1);
        let mut params = Vec::with_capacity(variant.slots.len());
        for slot in &variant.slots {
            let value = if slot.recursive {
                goast::Expr::Unary {
                    op: "&",
                    expr: Box::new(goast::Expr::ident(slot.decl_name.clone())),
                }
            } else {
                let ctor = self.rt("NewImmutable");
                goast::Expr::call(ctor, vec![goast::Expr::ident(slot.decl_name.clone())])
            };
            elems.push(goast::Expr::key_value(
                goast::Expr::ident(slot.parent_field.clone()),
                value,
            ));
            let param_go = self.go_type(&slot.ty);
            params.push(goast::Field::named(slot.decl_name.clone(), param_go));
        }
        elems.push(goast::Expr::key_value(
            goast::Expr::ident("_variant"),
            goast::Expr::ident(tag_name(&layout.parent_name, &variant.name)),
        ));
        decls.push(goast::Decl::Func(goast::FuncDecl {
            name: "Apply".into(),
            recv: Some(goast::Field::named(recv.clone(), companion_go.clone())),
            type_params: vec![],
            params,
            results: vec![goast::Field::anon(parent_go.clone())],
            body: goast::Block::new(vec![goast::Stmt::ret(goast::Expr::Composite {
                ty: Some(Box::new(parent_go.clone())),
                elems,
            })]),
        }));

        // Unapply: bool for zero fields, Option[F] for one,
        // Option[TupleN[...]] beyond.
        decls.push(self.unapply_decl(layout, variant, parent_go, &recv, &companion_go));
        decls
    }

    fn unapply_decl(
        &mut self,
        layout: &SealedLayout,
        variant: &SealedVariant,
        parent_go: &goast::Expr,
        recv: &str,
        companion_go: &goast::Expr,
    ) -> goast::Decl {
        let tag = goast::Expr::ident(tag_name(&layout.parent_name, &variant.name));
        let tag_check = goast::Expr::binary(
            "==",
            goast::Expr::sel(goast::Expr::ident("v"), "_variant"),
            tag.clone(),
        );

        let reads: Vec<goast::Expr> = variant
            .slots
            .iter()
            .map(|slot| {
                let sel = goast::Expr::sel(goast::Expr::ident("v"), slot.parent_field.clone());
                if slot.recursive {
                    goast::Expr::Star(Box::new(sel))
                } else {
                    goast::Expr::method_call(sel, "Get", vec![])
                }
            })
            .collect();

        let (result_ty, success, failure) = match variant.slots.len() {
            0 => (
                goast::Expr::ident("bool"),
                goast::Expr::ident("true"),
                goast::Expr::ident("false"),
            ),
            1 => {
                let payload = variant.slots[0].ty.clone();
                let payload_go = self.go_type(&payload);
                let some = self.option_ctor("Some", &payload_go);
                let none = self.option_ctor("None", &payload_go);
                (
                    self.option_of(&payload_go),
                    goast::Expr::method_call(some, "Apply", reads.clone()),
                    goast::Expr::method_call(none, "Apply", vec![]),
                )
            }
            n => {
                let payload_types: Vec<Type> =
                    variant.slots.iter().map(|s| s.ty.clone()).collect();
                let tuple_base = if n == 2 {
                    "Tuple".to_string()
                } else {
                    format!("Tuple{}", n)
                };
                let tuple_args: Vec<goast::Expr> =
                    payload_types.iter().map(|t| self.go_type(t)).collect();
                let tuple_ident = self.rt(&tuple_base);
                let tuple_go = goast::Expr::IndexList {
                    recv: Box::new(tuple_ident),
                    indices: tuple_args,
                };
                let elems = reads
                    .iter()
                    .enumerate()
                    .map(|(i, read)| {
                        goast::Expr::key_value(
                            goast::Expr::ident(format!("V{}", i + 1)),
                            read.clone(),
                        )
                    })
                    .collect();
                let tuple_value = goast::Expr::Composite {
                    ty: Some(Box::new(tuple_go.clone())),
                    elems,
                };
                let some = self.option_ctor("Some", &tuple_go);
                let none = self.option_ctor("None", &tuple_go);
                (
                    self.option_of(&tuple_go),
                    goast::Expr::method_call(some, "Apply", vec![tuple_value]),
                    goast::Expr::method_call(none, "Apply", vec![]),
                )
            }
        };

        let body = if variant.slots.is_empty() {
            goast::Block::new(vec![goast::Stmt::ret(tag_check)])
        } else {
            goast::Block::new(vec![
                goast::Stmt::If(goast::IfStmt::new(
                    tag_check,
                    goast::Block::new(vec![goast::Stmt::ret(success)]),
                )),
                goast::Stmt::ret(failure),
            ])
        };

        goast::Decl::Func(goast::FuncDecl {
            name: "Unapply".into(),
            recv: Some(goast::Field::named(recv, companion_go.clone())),
            type_params: vec![],
            params: vec![goast::Field::named("v", parent_go.clone())],
            results: vec![goast::Field::anon(result_ty)],
            body,
        })
    }

    /// `Option[T]` type expression.
    fn option_of(&mut self, payload_go: &goast::Expr) -> goast::Expr {
        let option = self.rt("Option");
        goast::Expr::Index {
            recv: Box::new(option),
            index: Box::new(payload_go.clone()),
        }
    }

    /// `Some[T]{}` / `None[T]{}` companion literal.
    fn option_ctor(&mut self, name: &str, payload_go: &goast::Expr) -> goast::Expr {
        let base = self.rt(name);
        goast::Expr::Composite {
            ty: Some(Box::new(goast::Expr::Index {
                recv: Box::new(base),
                index: Box::new(payload_go.clone()),
            })),
            elems: vec![],
        }
    }

    /// `isCi`, `Copy`, `Equal`, and `String` on the parent.
    fn parent_methods(
        &mut self,
        layout: &SealedLayout,
        parent_go: &goast::Expr,
    ) -> Vec<goast::Decl> {
        let recv = receiver_name(&layout.parent_name);
        let mut decls = Vec::new();

        for variant in &layout.variants {
            decls.push(goast::Decl::Func(goast::FuncDecl {
                name: format!("is{}", variant.name),
                recv: Some(goast::Field::named(recv.clone(), parent_go.clone())),
                type_params: vec![],
                params: vec![],
                results: vec![goast::Field::anon(goast::Expr::ident("bool"))],
                body: goast::Block::new(vec![goast::Stmt::ret(goast::Expr::binary(
                    "==",
                    goast::Expr::sel(goast::Expr::ident(recv.clone()), "_variant"),
                    goast::Expr::ident(tag_name(&layout.parent_name, &variant.name)),
                ))]),
            }));
        }

        // Copy: field-wise, preserving the tag. Recursive pointers are
        // carried over as-is.
        let mut elems: Vec<goast::Expr> = layout
            .parent_fields
            .iter()
            .map(|field| {
                let sel = goast::Expr::sel(goast::Expr::ident(recv.clone()), field.name.clone());
                let value = if field.recursive {
                    sel
                } else {
                    let copy = self.rt("Copy");
                    goast::Expr::call(copy, vec![sel])
                };
                goast::Expr::key_value(goast::Expr::ident(field.name.clone()), value)
            })
            .collect();
        elems.push(goast::Expr::key_value(
            goast::Expr::ident("_variant"),
            goast::Expr::sel(goast::Expr::ident(recv.clone()), "_variant"),
        ));
        decls.push(goast::Decl::Func(goast::FuncDecl {
            name: "Copy".into(),
            recv: Some(goast::Field::named(recv.clone(), parent_go.clone())),
            type_params: vec![],
            params: vec![],
            results: vec![goast::Field::anon(parent_go.clone())],
            body: goast::Block::new(vec![goast::Stmt::ret(goast::Expr::Composite {
                ty: Some(Box::new(parent_go.clone())),
                elems,
            })]),
        }));

        // Equal: conjunction over fields plus the tag.
        let mut cond = goast::Expr::binary(
            "==",
            goast::Expr::sel(goast::Expr::ident(recv.clone()), "_variant"),
            goast::Expr::sel(goast::Expr::ident("other"), "_variant"),
        );
        for field in &layout.parent_fields {
            let equal = self.rt("Equal");
            let call = goast::Expr::call(
                equal,
                vec![
                    goast::Expr::sel(goast::Expr::ident(recv.clone()), field.name.clone()),
                    goast::Expr::sel(goast::Expr::ident("other"), field.name.clone()),
                ],
            );
            cond = goast::Expr::binary("&&", cond, call);
        }
        decls.push(goast::Decl::Func(goast::FuncDecl {
            name: "Equal".into(),
            recv: Some(goast::Field::named(recv.clone(), parent_go.clone())),
            type_params: vec![],
            params: vec![goast::Field::named("other", parent_go.clone())],
            results: vec![goast::Field::anon(goast::Expr::ident("bool"))],
            body: goast::Block::new(vec![goast::Stmt::ret(cond)]),
        }));

        decls.push(self.string_method(layout, parent_go, &recv));
        decls
    }

    /// `String()` switching on the tag: `"Circle(5)"`, `"None()"`.
    fn string_method(
        &mut self,
        layout: &SealedLayout,
        parent_go: &goast::Expr,
        recv: &str,
    ) -> goast::Decl {
        let mut cases = Vec::with_capacity(layout.variants.len());
        for variant in &layout.variants {
            let body = if variant.slots.is_empty() {
                vec![goast::Stmt::ret(goast::Expr::str_lit(&format!(
                    "{}()",
                    variant.name
                )))]
            } else {
                self.needs_fmt = true;
                let verbs = vec!["%v"; variant.slots.len()].join(", ");
                let mut args = vec![goast::Expr::str_lit(&format!(
                    "{}({})",
                    variant.name, verbs
                ))];
                for slot in &variant.slots {
                    let sel =
                        goast::Expr::sel(goast::Expr::ident(recv), slot.parent_field.clone());
                    args.push(if slot.recursive {
                        goast::Expr::Star(Box::new(sel))
                    } else {
                        goast::Expr::method_call(sel, "Get", vec![])
                    });
                }
                vec![goast::Stmt::ret(goast::Expr::call(
                    goast::Expr::sel(goast::Expr::ident("fmt"), "Sprintf"),
                    args,
                ))]
            };
            cases.push(goast::SwitchCase {
                exprs: vec![goast::Expr::ident(tag_name(
                    &layout.parent_name,
                    &variant.name,
                ))],
                body,
            });
        }
        cases.push(goast::SwitchCase {
            exprs: vec![],
            body: vec![goast::Stmt::ret(goast::Expr::str_lit(""))],
        });

        goast::Decl::Func(goast::FuncDecl {
            name: "String".into(),
            recv: Some(goast::Field::named(recv, parent_go.clone())),
            type_params: vec![],
            params: vec![],
            results: vec![goast::Field::anon(goast::Expr::ident("string"))],
            body: goast::Block::new(vec![goast::Stmt::Switch(goast::SwitchStmt {
                tag: Some(goast::Expr::sel(goast::Expr::ident(recv), "_variant")),
                cases,
            })]),
        })
    }
}

/// `_Parent_Variant` tag constant name.
pub(crate) fn tag_name(parent: &str, variant: &str) -> String {
    format!("_{}_{}", parent, variant)
}

/// The `const (...)` block assigning tags via iota.
fn tag_constants(layout: &SealedLayout) -> goast::Decl {
    let specs = layout
        .variants
        .iter()
        .enumerate()
        .map(|(i, variant)| goast::ConstSpec {
            names: vec![tag_name(&layout.parent_name, &variant.name)],
            ty: (i == 0).then(|| goast::Expr::ident("uint8")),
            values: if i == 0 {
                vec![goast::Expr::ident("iota")]
            } else {
                vec![]
            },
        })
        .collect();
    goast::Decl::Const(goast::ConstDecl { specs })
}
