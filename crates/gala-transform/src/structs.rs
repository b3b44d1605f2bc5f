//! Struct lowering and generated methods.
//!
//! A struct declaration emits the target struct (immutable fields typed
//! `Immutable[T]`), a field-wise `Copy`, an `Equal` conjunction, and an
//! `Unapply` extractor accepting the concrete type or a pointer to it.
//! Generic structs additionally get a marker interface enabling
//! wildcard pattern matching across instantiations.

use gala_common::SourceError;
use gala_goast as goast;
use gala_syntax::ast::StructDecl;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::Transformer;

impl Transformer<'_> {
    pub(crate) fn struct_decls(
        &mut self,
        s: &StructDecl,
    ) -> Result<Vec<goast::Decl>, SourceError> {
        let qualified = format!("{}.{}", self.current_pkg(), s.name);

        // Shadow tables: later call sites in this file resolve struct
        // construction through these.
        let field_names: Vec<String> = s.fields.iter().map(|f| f.name.clone()).collect();
        let immut_flags: Vec<bool> = s.fields.iter().map(|f| !f.mutable).collect();
        let field_types: FxHashMap<String, Type> = s
            .fields
            .iter()
            .map(|f| (f.name.clone(), Type::from_type_expr(&f.ty)))
            .collect();
        self.struct_fields.insert(qualified.clone(), field_names);
        self.struct_immut_fields.insert(qualified.clone(), immut_flags);
        self.struct_field_types.insert(qualified.clone(), field_types);

        let tp_names: Vec<String> = s.type_params.iter().map(|p| p.name.clone()).collect();
        let recv_go = self.instantiated_name(&s.name, &tp_names);
        let recv_name = receiver_name(&s.name);

        // The struct type itself.
        let mut go_fields = Vec::with_capacity(s.fields.len());
        for field in &s.fields {
            let raw = Type::from_type_expr(&field.ty);
            let ty = if field.mutable {
                self.go_type(&raw)
            } else {
                self.immutable_of(&raw)
            };
            go_fields.push(goast::Field::named(field.name.clone(), ty));
        }
        let mut decls = vec![goast::Decl::Type(goast::TypeDecl {
            name: s.name.clone(),
            type_params: self.type_param_fields(&s.type_params),
            ty: goast::Expr::StructType { fields: go_fields },
        })];

        // Marker interface for wildcard matching over generic structs.
        if !tp_names.is_empty() {
            decls.push(goast::Decl::Type(goast::TypeDecl {
                name: format!("Is{}", s.name),
                type_params: vec![],
                ty: goast::Expr::InterfaceType {
                    methods: vec![goast::InterfaceMethod {
                        name: format!("is{}", s.name),
                        params: vec![],
                        results: vec![],
                    }],
                },
            }));
            decls.push(goast::Decl::Func(goast::FuncDecl {
                name: format!("is{}", s.name),
                recv: Some(goast::Field::named(recv_name.clone(), recv_go.clone())),
                type_params: vec![],
                params: vec![],
                results: vec![],
                body: goast::Block::new(vec![]),
            }));
        }

        decls.push(self.copy_method(s, &recv_name, &recv_go));
        decls.push(self.equal_method(s, &recv_name, &recv_go));

        let user_declared_unapply = self
            .rich
            .types
            .get(&qualified)
            .is_some_and(|m| m.has_method("Unapply"));
        let all_fields_usable = s.fields.iter().all(|f| !f.name.starts_with('_'));
        if !user_declared_unapply && all_fields_usable {
            decls.push(self.unapply_method(s, &recv_name, &recv_go));
        }

        Ok(decls)
    }

    /// `Name` or `Name[T, U]` as a Go type expression.
    pub(crate) fn instantiated_name(&mut self, name: &str, tps: &[String]) -> goast::Expr {
        let base = goast::Expr::ident(name);
        match tps.len() {
            0 => base,
            1 => goast::Expr::Index {
                recv: Box::new(base),
                index: Box::new(goast::Expr::ident(tps[0].clone())),
            },
            _ => goast::Expr::IndexList {
                recv: Box::new(base),
                indices: tps.iter().map(|t| goast::Expr::ident(t.clone())).collect(),
            },
        }
    }

    /// `func (s S) Copy() S { return S{f: Copy(s.f), ...} }`
    fn copy_method(
        &mut self,
        s: &StructDecl,
        recv_name: &str,
        recv_go: &goast::Expr,
    ) -> goast::Decl {
        let elems = s
            .fields
            .iter()
            .map(|field| {
                let copy = self.rt("Copy");
                goast::Expr::key_value(
                    goast::Expr::ident(field.name.clone()),
                    goast::Expr::call(
                        copy,
                        vec![goast::Expr::sel(
                            goast::Expr::ident(recv_name),
                            field.name.clone(),
                        )],
                    ),
                )
            })
            .collect();
        goast::Decl::Func(goast::FuncDecl {
            name: "Copy".into(),
            recv: Some(goast::Field::named(recv_name, recv_go.clone())),
            type_params: vec![],
            params: vec![],
            results: vec![goast::Field::anon(recv_go.clone())],
            body: goast::Block::new(vec![goast::Stmt::ret(goast::Expr::Composite {
                ty: Some(Box::new(recv_go.clone())),
                elems,
            })]),
        })
    }

    /// `func (s S) Equal(other S) bool { return Equal(s.f, other.f) && ... }`
    fn equal_method(
        &mut self,
        s: &StructDecl,
        recv_name: &str,
        recv_go: &goast::Expr,
    ) -> goast::Decl {
        let mut cond: Option<goast::Expr> = None;
        for field in &s.fields {
            let equal = self.rt("Equal");
            let call = goast::Expr::call(
                equal,
                vec![
                    goast::Expr::sel(goast::Expr::ident(recv_name), field.name.clone()),
                    goast::Expr::sel(goast::Expr::ident("other"), field.name.clone()),
                ],
            );
            cond = Some(match cond {
                Some(prev) => goast::Expr::binary("&&", prev, call),
                None => call,
            });
        }
        let result = cond.unwrap_or_else(|| goast::Expr::ident("true"));
        goast::Decl::Func(goast::FuncDecl {
            name: "Equal".into(),
            recv: Some(goast::Field::named(recv_name, recv_go.clone())),
            type_params: vec![],
            params: vec![goast::Field::named("other", recv_go.clone())],
            results: vec![goast::Field::anon(goast::Expr::ident("bool"))],
            body: goast::Block::new(vec![goast::Stmt::ret(result)]),
        })
    }

    /// The generated extractor:
    ///
    /// ```go
    /// func (p Point) Unapply(v any) (int, int, bool) {
    ///     if c, ok := v.(Point); ok { return c.x.Get(), c.y.Get(), true }
    ///     if c, ok := v.(*Point); ok { return c.x.Get(), c.y.Get(), true }
    ///     return 0, 0, false
    /// }
    /// ```
    fn unapply_method(
        &mut self,
        s: &StructDecl,
        recv_name: &str,
        recv_go: &goast::Expr,
    ) -> goast::Decl {
        let mut results: Vec<goast::Field> = s
            .fields
            .iter()
            .map(|f| {
                let raw = Type::from_type_expr(&f.ty);
                let go = self.go_type(&raw);
                goast::Field::anon(go)
            })
            .collect();
        results.push(goast::Field::anon(goast::Expr::ident("bool")));

        // Both the concrete type and a pointer to it are accepted; the
        // if-init form keeps the assertion locals out of the method
        // scope.
        let mut stmts = Vec::new();
        for asserted in [
            recv_go.clone(),
            goast::Expr::Star(Box::new(recv_go.clone())),
        ] {
            let bind = if s.fields.is_empty() { "_" } else { "c" };
            let init = goast::Stmt::Assign {
                lhs: vec![goast::Expr::ident(bind), goast::Expr::ident("ok")],
                op: goast::AssignOp::Define,
                rhs: vec![goast::Expr::TypeAssert {
                    recv: Box::new(goast::Expr::ident("v")),
                    ty: Box::new(asserted),
                }],
            };
            let mut values: Vec<goast::Expr> = s
                .fields
                .iter()
                .map(|f| {
                    let sel = goast::Expr::sel(goast::Expr::ident("c"), f.name.clone());
                    if f.mutable {
                        sel
                    } else {
                        goast::Expr::method_call(sel, "Get", vec![])
                    }
                })
                .collect();
            values.push(goast::Expr::ident("true"));
            stmts.push(goast::Stmt::If(goast::IfStmt {
                init: Some(Box::new(init)),
                cond: goast::Expr::ident("ok"),
                then: goast::Block::new(vec![goast::Stmt::Return(values)]),
                else_: None,
            }));
        }
        let mut zeros: Vec<goast::Expr> = s
            .fields
            .iter()
            .map(|f| {
                let raw = Type::from_type_expr(&f.ty);
                self.zero_value(&raw)
            })
            .collect();
        zeros.push(goast::Expr::ident("false"));
        stmts.push(goast::Stmt::Return(zeros));

        goast::Decl::Func(goast::FuncDecl {
            name: "Unapply".into(),
            recv: Some(goast::Field::named(recv_name, recv_go.clone())),
            type_params: vec![],
            params: vec![goast::Field::named("v", goast::Expr::ident("any"))],
            results,
            body: goast::Block::new(stmts),
        })
    }
}

/// Receiver name convention: the struct's first letter, lowercased.
pub(crate) fn receiver_name(type_name: &str) -> String {
    type_name
        .chars()
        .next()
        .map(|c| c.to_lowercase().to_string())
        .unwrap_or_else(|| "v".to_string())
}
