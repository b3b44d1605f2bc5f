//! Declaration lowering.
//!
//! Top-level `val`/`var` bindings, functions and methods (including
//! generic-method hoisting), and interfaces. Structs and sealed unions
//! have their own modules; imports are mirrored at the file level.

use gala_analyzer::MethodMetadata;
use gala_common::SourceError;
use gala_goast as goast;
use gala_syntax::ast::*;
use gala_syntax::Type;

use crate::Transformer;

impl Transformer<'_> {
    pub(crate) fn decl(&mut self, decl: &Decl) -> Result<Vec<goast::Decl>, SourceError> {
        match decl {
            Decl::Val(v) => {
                let (call, raw_ty) = self.val_init(v)?;
                self.scopes.declare(&v.name, true, raw_ty.clone());
                self.inferer.bind_mono(&v.name, &raw_ty);
                Ok(vec![goast::Decl::Var(goast::VarSpec {
                    names: vec![v.name.clone()],
                    ty: None,
                    values: vec![call],
                })])
            }
            Decl::Var(v) => self.top_level_var(v),
            Decl::Func(f) => Ok(vec![self.func_decl(f)?]),
            Decl::Struct(s) => self.struct_decls(s),
            Decl::Interface(i) => Ok(vec![self.interface_decl(i)]),
            Decl::Sealed(s) => self.sealed_decls(s),
            // Imports are mirrored by the file-level walk.
            Decl::Import(_) => Ok(vec![]),
        }
    }

    fn top_level_var(&mut self, v: &VarDecl) -> Result<Vec<goast::Decl>, SourceError> {
        let declared = v.ty.as_ref().map(Type::from_type_expr);
        let (values, ty) = match (&v.init, &declared) {
            (Some(init), None) => {
                let (init, init_ty) = self.expr(init)?;
                (vec![init], init_ty)
            }
            (Some(init), Some(ty)) => {
                let (init, _) = self.expr_expected(init, Some(ty))?;
                (vec![init], ty.clone())
            }
            (None, Some(ty)) => (vec![], ty.clone()),
            (None, None) => {
                return Err(self.err_at(
                    v.span,
                    format!("variable {} needs a type or an initializer", v.name),
                ))
            }
        };
        self.scopes.declare(&v.name, false, ty.clone());
        self.inferer.bind_mono(&v.name, &ty);
        let go_ty = declared.as_ref().map(|t| self.go_type(t));
        Ok(vec![goast::Decl::Var(goast::VarSpec {
            names: vec![v.name.clone()],
            ty: go_ty,
            values,
        })])
    }

    // ── Functions and methods ──────────────────────────────────────────

    pub(crate) fn func_decl(&mut self, f: &FuncDecl) -> Result<goast::Decl, SourceError> {
        let receiver = match &f.receiver {
            Some(receiver) => receiver,
            None => return self.free_func(f),
        };

        let recv_ty = Type::from_type_expr(&receiver.ty);
        let recv_base = recv_ty.base_name().to_string();
        let recv_tps = recv_ty
            .type_args()
            .iter()
            .map(|t| t.base_name().to_string())
            .collect::<Vec<_>>();
        let method_tps: Vec<String> = f.type_params.iter().map(|p| p.name.clone()).collect();

        let mm = MethodMetadata {
            param_types: f.params.iter().map(|p| Type::from_type_expr(&p.ty)).collect(),
            type_params: method_tps.clone(),
            is_generic: !method_tps.is_empty() || !recv_tps.is_empty(),
            result_types: f.results.iter().map(Type::from_type_expr).collect(),
        };

        if needs_hoisting(&recv_base, &recv_tps, &mm) {
            // Record the decision for every later call site.
            let qualified = format!("{}.{}", self.current_pkg(), recv_base);
            self.generic_methods
                .insert((qualified, f.name.clone()), true);
            return self.hoisted_func(f, receiver, &recv_ty, &recv_tps);
        }

        // Regular method: receiver type parameters are declared in the
        // receiver itself, never in a separate list.
        self.scopes.push();
        self.inferer.push_scope();
        let result = (|| {
            self.scopes.declare(&receiver.name, false, recv_ty.clone());
            self.inferer.bind_mono(&receiver.name, &recv_ty);
            let params = self.bind_params(&f.params);
            let results = self.result_fields(&f.results);
            let body = self.func_body(f)?;
            let recv_go = self.go_type(&recv_ty);
            Ok(goast::Decl::Func(goast::FuncDecl {
                name: f.name.clone(),
                recv: Some(goast::Field::named(receiver.name.clone(), recv_go)),
                type_params: vec![],
                params,
                results,
                body,
            }))
        })();
        self.inferer.pop_scope();
        self.scopes.pop();
        result
    }

    fn free_func(&mut self, f: &FuncDecl) -> Result<goast::Decl, SourceError> {
        self.scopes.push();
        self.inferer.push_scope();
        let result = (|| {
            let type_params = self.type_param_fields(&f.type_params);
            let params = self.bind_params(&f.params);
            let results = self.result_fields(&f.results);
            let body = self.func_body(f)?;
            Ok(goast::Decl::Func(goast::FuncDecl {
                name: f.name.clone(),
                recv: None,
                type_params,
                params,
                results,
                body,
            }))
        })();
        self.inferer.pop_scope();
        self.scopes.pop();
        result
    }

    /// A hoisted method: `Recv_Method`, taking the receiver first,
    /// quantified over the receiver's and the method's type parameters
    /// (de-duplicated).
    fn hoisted_func(
        &mut self,
        f: &FuncDecl,
        receiver: &Receiver,
        recv_ty: &Type,
        recv_tps: &[String],
    ) -> Result<goast::Decl, SourceError> {
        let mut tp_names: Vec<String> = recv_tps.to_vec();
        for tp in &f.type_params {
            if !tp_names.contains(&tp.name) {
                tp_names.push(tp.name.clone());
            }
        }
        let mut type_params: Vec<goast::Field> = tp_names
            .iter()
            .map(|name| goast::Field::named(name.clone(), goast::Expr::ident("any")))
            .collect();
        // Honor declared constraints where the method spelled one out.
        for tp in &f.type_params {
            if let Some(constraint) = &tp.constraint {
                let go = self.go_type_expr(constraint);
                if let Some(field) = type_params
                    .iter_mut()
                    .find(|field| field.names == vec![tp.name.clone()])
                {
                    field.ty = go;
                }
            }
        }

        self.scopes.push();
        self.inferer.push_scope();
        let result = (|| {
            self.scopes.declare(&receiver.name, false, recv_ty.clone());
            self.inferer.bind_mono(&receiver.name, recv_ty);
            let mut params = vec![{
                let recv_go = self.go_type(recv_ty);
                goast::Field::named(receiver.name.clone(), recv_go)
            }];
            params.extend(self.bind_params(&f.params));
            let results = self.result_fields(&f.results);
            let body = self.func_body(f)?;
            Ok(goast::Decl::Func(goast::FuncDecl {
                name: format!("{}_{}", recv_ty.base_name(), f.name),
                recv: None,
                type_params,
                params,
                results,
                body,
            }))
        })();
        self.inferer.pop_scope();
        self.scopes.pop();
        result
    }

    /// Lower a function body; the expression form becomes a single
    /// return, asserted to the declared result type when inference
    /// could not pin the expression down.
    fn func_body(&mut self, f: &FuncDecl) -> Result<goast::Block, SourceError> {
        match &f.body {
            FuncBody::Block(block) => self.block_inner(block),
            FuncBody::Expr(expr) => {
                let declared = match f.results.len() {
                    1 => Some(Type::from_type_expr(&f.results[0])),
                    _ => None,
                };
                let (value, value_ty) = self.expr_expected(expr, declared.as_ref())?;
                let value = match &declared {
                    Some(ret) if value_ty.is_any() && !ret.is_any() && !ret.is_void() => {
                        let go_ty = self.go_type(ret);
                        goast::Expr::TypeAssert {
                            recv: Box::new(value),
                            ty: Box::new(go_ty),
                        }
                    }
                    _ => value,
                };
                if f.results.is_empty() {
                    Ok(goast::Block::new(vec![goast::Stmt::Expr(value)]))
                } else {
                    Ok(goast::Block::new(vec![goast::Stmt::ret(value)]))
                }
            }
        }
    }

    pub(crate) fn bind_params(&mut self, params: &[Param]) -> Vec<goast::Field> {
        params
            .iter()
            .map(|p| {
                let ty = Type::from_type_expr(&p.ty);
                self.scopes.declare(&p.name, false, ty.clone());
                self.inferer.bind_mono(&p.name, &ty);
                let go = self.go_type(&ty);
                goast::Field::named(p.name.clone(), go)
            })
            .collect()
    }

    pub(crate) fn result_fields(&mut self, results: &[TypeExpr]) -> Vec<goast::Field> {
        results
            .iter()
            .map(Type::from_type_expr)
            .filter(|t| !t.is_void())
            .map(|t| {
                let go = self.go_type(&t);
                goast::Field::anon(go)
            })
            .collect()
    }

    pub(crate) fn type_param_fields(&mut self, params: &[TypeParam]) -> Vec<goast::Field> {
        params
            .iter()
            .map(|tp| {
                let constraint = match &tp.constraint {
                    Some(c) => self.go_type_expr(c),
                    None => goast::Expr::ident("any"),
                };
                goast::Field::named(tp.name.clone(), constraint)
            })
            .collect()
    }

    // ── Interfaces ─────────────────────────────────────────────────────

    fn interface_decl(&mut self, i: &InterfaceDecl) -> goast::Decl {
        let methods = i
            .methods
            .iter()
            .map(|sig| {
                let params = sig
                    .params
                    .iter()
                    .map(|p| {
                        let ty = Type::from_type_expr(&p.ty);
                        let go = self.go_type(&ty);
                        goast::Field::named(p.name.clone(), go)
                    })
                    .collect();
                let results = self.result_fields(&sig.results);
                goast::InterfaceMethod {
                    name: sig.name.clone(),
                    params,
                    results,
                }
            })
            .collect();
        let type_params = self.type_param_fields(&i.type_params);
        goast::Decl::Type(goast::TypeDecl {
            name: i.name.clone(),
            type_params,
            ty: goast::Expr::InterfaceType { methods },
        })
    }
}

// ── Hoisting detection ─────────────────────────────────────────────────

/// Whether a method must be hoisted to a free function: it declares its
/// own type parameters (illegal on target-language methods), or its
/// return type instantiates the receiver's type with a transformation
/// of a receiver type parameter, which the target's instantiation rules
/// reject.
pub fn needs_hoisting(recv_base: &str, recv_tps: &[String], mm: &MethodMetadata) -> bool {
    if !mm.type_params.is_empty() {
        return true;
    }
    if recv_tps.is_empty() {
        return false;
    }
    mm.result_types
        .iter()
        .any(|ty| has_receiver_cycle(ty, recv_base, recv_tps))
}

/// A cycle: an application of the receiver's own head whose arguments
/// mention a receiver type parameter nested inside a different generic
/// head (`Container[T] -> Container[List[T]]`).
fn has_receiver_cycle(ty: &Type, recv_base: &str, recv_tps: &[String]) -> bool {
    match ty {
        Type::Generic { base, params } => {
            if base.base_name() == recv_base
                && params.iter().any(|p| mentions_tp_nested(p, recv_tps))
            {
                return true;
            }
            params
                .iter()
                .any(|p| has_receiver_cycle(p, recv_base, recv_tps))
        }
        Type::Pointer(elem) | Type::Array(elem) => {
            has_receiver_cycle(elem, recv_base, recv_tps)
        }
        Type::Map { key, value } => {
            has_receiver_cycle(key, recv_base, recv_tps)
                || has_receiver_cycle(value, recv_base, recv_tps)
        }
        Type::Func { params, results } => params
            .iter()
            .chain(results.iter())
            .any(|t| has_receiver_cycle(t, recv_base, recv_tps)),
        _ => false,
    }
}

/// A receiver type parameter occurring under some generic head.
fn mentions_tp_nested(ty: &Type, recv_tps: &[String]) -> bool {
    match ty {
        Type::Generic { params, .. } => params.iter().any(|p| mentions_tp(p, recv_tps)),
        Type::Pointer(elem) | Type::Array(elem) => mentions_tp_nested(elem, recv_tps),
        Type::Map { key, value } => {
            mentions_tp_nested(key, recv_tps) || mentions_tp_nested(value, recv_tps)
        }
        _ => false,
    }
}

fn mentions_tp(ty: &Type, recv_tps: &[String]) -> bool {
    match ty {
        Type::Named { package, name } if package.is_empty() => {
            recv_tps.iter().any(|tp| tp == name)
        }
        Type::Generic { base, params } => {
            mentions_tp(base, recv_tps) || params.iter().any(|p| mentions_tp(p, recv_tps))
        }
        Type::Pointer(elem) | Type::Array(elem) => mentions_tp(elem, recv_tps),
        Type::Map { key, value } => mentions_tp(key, recv_tps) || mentions_tp(value, recv_tps),
        Type::Func { params, results } => params
            .iter()
            .chain(results.iter())
            .any(|t| mentions_tp(t, recv_tps)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mm(type_params: Vec<&str>, result: Option<Type>) -> MethodMetadata {
        MethodMetadata {
            param_types: vec![],
            type_params: type_params.into_iter().map(String::from).collect(),
            is_generic: true,
            result_types: result.into_iter().collect(),
        }
    }

    #[test]
    fn own_type_params_force_hoisting() {
        let m = mm(vec!["U"], Some(Type::named("", "U")));
        assert!(needs_hoisting("Container", &["T".into()], &m));
    }

    #[test]
    fn plain_generic_method_is_not_hoisted() {
        // func (i Id[T]) Apply(v T) T
        let m = mm(vec![], Some(Type::named("", "T")));
        assert!(!needs_hoisting("Id", &["T".into()], &m));
    }

    #[test]
    fn receiver_cycle_forces_hoisting() {
        // func (c Container[T]) Wrap() Container[List[T]]
        let result = Type::generic(
            Type::named("", "Container"),
            vec![Type::generic(
                Type::named("", "List"),
                vec![Type::named("", "T")],
            )],
        );
        let m = mm(vec![], Some(result));
        assert!(needs_hoisting("Container", &["T".into()], &m));
    }

    #[test]
    fn plain_self_return_is_not_a_cycle() {
        // func (c Container[T]) Clone() Container[T]
        let result = Type::generic(Type::named("", "Container"), vec![Type::named("", "T")]);
        let m = mm(vec![], Some(result));
        assert!(!needs_hoisting("Container", &["T".into()], &m));
    }
}
