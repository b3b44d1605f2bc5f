//! Call resolution.
//!
//! Every `callee(args)` form runs through one decision tree; the first
//! branch that matches wins:
//!
//! 1. `recv.Copy` with named overrides
//! 2. method call whose receiver/method is generic-hoisted
//! 3. regular method call with expected-type propagation
//! 4. companion `Apply` on a type identifier
//! 5. positional struct construction
//! 6. named struct construction
//! 7. struct-literal callable
//! 8. variable whose type has `Apply`
//! 9. plain function call
//!
//! Wherever a parameter type is known it is passed down into argument
//! transformation so lambda parameters can be reconstructed.

use gala_analyzer::MethodMetadata;
use gala_common::SourceError;
use gala_goast as goast;
use gala_syntax::ast::*;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::exprs::{apply_subst, subst_pairs};
use crate::types::is_type_param_name;
use crate::Transformer;

impl Transformer<'_> {
    pub(crate) fn call_expr(
        &mut self,
        call: &CallExpr,
        expected: Option<&Type>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        if let Expr::Member(m) = call.callee.as_ref() {
            // Branch 1: Copy with overrides.
            if m.name == "Copy" && call.args.iter().any(|a| a.name.is_some()) {
                return self.copy_with_overrides(m, call);
            }

            let is_pkg_ref = matches!(m.recv.as_ref(), Expr::Ident(id)
                if self.scopes.lookup(&id.name).is_none() && self.imports.is_package(&id.name));
            if is_pkg_ref {
                return self.qualified_call(m, call, expected);
            }
            // Branches 2 and 3 (and the member fallthrough).
            return self.method_call(m, call);
        }

        if let Expr::Ident(id) = call.callee.as_ref() {
            if self.scopes.lookup(&id.name).is_some() {
                // Branch 8: variable whose type has Apply.
                if let Some(result) = self.apply_variable(id, call)? {
                    return Ok(result);
                }
            } else if let Some(result) = self.type_callee(&id.name, call, expected)? {
                // Branches 4, 5, 6.
                return Ok(result);
            }
        }

        // Branch 7: struct-literal callable.
        if let Expr::Composite(lit) = call.callee.as_ref() {
            let sem = Type::from_type_expr(&lit.ty);
            let has_apply = self
                .type_meta_of(&sem)
                .is_some_and(|(_, meta)| meta.has_method("Apply"));
            if has_apply {
                return self.literal_apply(call, &sem);
            }
        }

        // Branch 9.
        self.plain_call(call)
    }

    // ── Branch 1: Copy with overrides ──────────────────────────────────

    fn copy_with_overrides(
        &mut self,
        m: &MemberExpr,
        call: &CallExpr,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let (recv, recv_ty) = self.expr(&m.recv)?;
        let meta = match self.type_meta_of(&recv_ty) {
            Some((_, meta)) if !meta.field_names.is_empty() => meta.clone(),
            _ => {
                return Err(self.err_at(
                    call.span,
                    "named arguments require a struct Copy target",
                ))
            }
        };
        let mut overrides: FxHashMap<&str, &Expr> = FxHashMap::default();
        for arg in &call.args {
            match &arg.name {
                Some(name) => {
                    if !meta.fields.contains_key(name) {
                        return Err(self.err_at(
                            call.span,
                            format!("unknown field {} in Copy of {}", name, meta.name),
                        ));
                    }
                    overrides.insert(name.as_str(), &arg.value);
                }
                None => {
                    return Err(self.err_at(
                        call.span,
                        "positional arguments are not allowed in Copy",
                    ))
                }
            }
        }

        let pairs = subst_pairs(&meta.type_params, recv_ty.type_args());
        let mut elems = Vec::with_capacity(meta.field_names.len());
        for name in &meta.field_names {
            let immutable = meta.is_field_immutable(name);
            let value = match overrides.get(name.as_str()) {
                Some(expr) => {
                    let field_ty = apply_subst(&meta.fields[name], &pairs);
                    let (value, value_ty) = self.expr_expected(expr, Some(&field_ty))?;
                    self.wrap_field_value(immutable, value, &value_ty)
                }
                None => {
                    let copy = self.rt("Copy");
                    goast::Expr::call(copy, vec![goast::Expr::sel(recv.clone(), name.clone())])
                }
            };
            elems.push(goast::Expr::key_value(goast::Expr::ident(name.clone()), value));
        }
        let go_ty = self.go_type(&recv_ty);
        Ok((
            goast::Expr::Composite {
                ty: Some(Box::new(go_ty)),
                elems,
            },
            recv_ty,
        ))
    }

    // ── Branches 2 and 3: method calls ─────────────────────────────────

    fn method_call(
        &mut self,
        m: &MemberExpr,
        call: &CallExpr,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let (recv, recv_ty) = self.expr(&m.recv)?;
        let looked_up = self
            .type_meta_of(&recv_ty)
            .map(|(q, meta)| (q, meta.clone()));

        if let Some((qualified, meta)) = looked_up {
            if let Some(method) = meta.methods.get(&m.name).cloned() {
                if self.is_hoisted(&qualified, &m.name) {
                    return self.hoisted_call(m, call, recv, &recv_ty, &qualified, &method);
                }
                // Branch 3: expected-type propagation when the
                // receiver's type arguments are fully concrete.
                let concrete = recv_ty
                    .type_args()
                    .iter()
                    .all(|t| !is_unresolved_param(t));
                let pairs = if concrete && !meta.type_params.is_empty() {
                    subst_pairs(&meta.type_params, recv_ty.type_args())
                } else {
                    FxHashMap::default()
                };
                let hints = !pairs.is_empty() || meta.type_params.is_empty();
                let args = self.method_args(call, &method.param_types, &pairs, hints)?;
                let result = result_type(&method.result_types, &pairs);
                return Ok((
                    goast::Expr::call(goast::Expr::sel(recv, m.name.clone()), args),
                    result,
                ));
            }

            // A field holding a function value: call through the field.
            if let Some(field_ty) = meta.fields.get(&m.name).cloned() {
                let pairs = subst_pairs(&meta.type_params, recv_ty.type_args());
                let field_ty = apply_subst(&field_ty, &pairs);
                let mut callee = goast::Expr::sel(recv, m.name.clone());
                if meta.is_field_immutable(&m.name) {
                    callee = goast::Expr::method_call(callee, "Get", vec![]);
                }
                if let Type::Func { params, results } = &field_ty {
                    let args =
                        self.method_args(call, params, &FxHashMap::default(), true)?;
                    let result = result_type(results, &FxHashMap::default());
                    return Ok((goast::Expr::call(callee, args), result));
                }
                let args = self.plain_args(call)?;
                return Ok((goast::Expr::call(callee, args), Type::any()));
            }
        }

        // Unknown receiver type or method: emit the call as written.
        let args = self.plain_args(call)?;
        Ok((
            goast::Expr::call(goast::Expr::sel(recv, m.name.clone()), args),
            Type::any(),
        ))
    }

    /// Branch 2: `ReceiverType_Method[Targs](recv, args...)`.
    fn hoisted_call(
        &mut self,
        m: &MemberExpr,
        call: &CallExpr,
        recv: goast::Expr,
        recv_ty: &Type,
        qualified: &str,
        method: &MethodMetadata,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let (pkg, base) = qualified.split_once('.').unwrap_or(("", qualified));
        let pkg = pkg.to_string();
        let name = format!("{}_{}", base, m.name);

        // Receiver type arguments, minus unresolved type parameters.
        let recv_args: Vec<Type> = recv_ty
            .type_args()
            .iter()
            .filter(|t| !is_unresolved_param(t))
            .cloned()
            .collect();

        let container_tps: Vec<String> = self
            .type_meta_of(recv_ty)
            .map(|(_, meta)| meta.type_params.clone())
            .unwrap_or_default();
        let mut pairs = subst_pairs(&container_tps, &recv_args);
        for (tp, ty) in method.type_params.iter().zip(call.type_args.iter()) {
            pairs.insert(tp.clone(), Type::from_type_expr(ty));
        }

        // When the method has its own type parameters and none were
        // supplied, emit no type arguments and let the target compiler
        // infer every slot.
        let targs: Vec<goast::Expr> =
            if !method.type_params.is_empty() && call.type_args.is_empty() {
                vec![]
            } else {
                let mut out: Vec<goast::Expr> =
                    recv_args.iter().map(|t| self.go_type(t)).collect();
                for ta in &call.type_args {
                    out.push(self.go_type_expr(ta));
                }
                out
            };

        let mut callee = self.qualified_ident(&pkg, &name);
        if !targs.is_empty() {
            callee = goast::Expr::IndexList {
                recv: Box::new(callee),
                indices: targs,
            };
        }

        let mut args = vec![recv];
        args.extend(self.method_args(call, &method.param_types, &pairs, true)?);
        let result = result_type(&method.result_types, &pairs);
        Ok((goast::Expr::call(callee, args), result))
    }

    // ── Branches 4, 5, 6: type callees ─────────────────────────────────

    /// Companion `Apply`, positional construction, or named
    /// construction, depending on the argument shape. Returns `None`
    /// when the name is not a type.
    fn type_callee(
        &mut self,
        raw: &str,
        call: &CallExpr,
        expected: Option<&Type>,
    ) -> Result<Option<(goast::Expr, Type)>, SourceError> {
        let (qualified, meta) = match self.lookup_type(raw) {
            Some((q, meta)) => (q, meta.clone()),
            None => return Ok(None),
        };

        let any_named = call.args.iter().any(|a| a.name.is_some());
        if any_named {
            // Branch 6.
            return self.named_construction(call, &qualified, &meta).map(Some);
        }

        let field_count = meta.field_names.len();
        let has_apply = meta.has_method("Apply");
        let apply_over_fields =
            has_apply && (call.args.len() != field_count || field_count == 0);
        if apply_over_fields {
            // Branch 4.
            return self
                .companion_apply(call, &qualified, &meta, expected)
                .map(Some);
        }
        if call.args.len() == field_count {
            // Branch 5.
            return self.positional_construction(call, &qualified, &meta).map(Some);
        }
        Err(self.err_at(
            call.span,
            format!(
                "wrong number of arguments in construction of {}: expected {}, found {}",
                meta.name,
                field_count,
                call.args.len()
            ),
        ))
    }

    /// Branch 4: the callee is a type whose `Apply` acts as the
    /// constructor.
    fn companion_apply(
        &mut self,
        call: &CallExpr,
        qualified: &str,
        meta: &gala_analyzer::TypeMetadata,
        expected: Option<&Type>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let apply = meta.methods["Apply"].clone();
        let (pkg, base) = qualified.split_once('.').unwrap_or(("", qualified));
        let pkg = pkg.to_string();
        let base = base.to_string();

        // Type arguments: explicit ones win; then the expected result
        // type pins what it can; then Apply's parameter types are
        // unified against the argument types. Slots nothing pins
        // default to any.
        let mut pairs: FxHashMap<String, Type> = FxHashMap::default();
        for (tp, ta) in meta.type_params.iter().zip(call.type_args.iter()) {
            pairs.insert(tp.clone(), Type::from_type_expr(ta));
        }
        if let (Some(expected), Some(result)) = (expected, apply.result_types.first()) {
            pin_type_params(
                result,
                expected.unwrap_immutable(),
                &meta.type_params,
                &mut pairs,
            );
        }
        let (args, pairs) =
            self.args_with_inference(call, &apply.param_types, &meta.type_params, pairs)?;

        let targs: Vec<Type> = meta
            .type_params
            .iter()
            .map(|tp| pairs.get(tp).cloned().unwrap_or_else(Type::any))
            .collect();
        let targs_go: Vec<goast::Expr> = targs.iter().map(|t| self.go_type(t)).collect();

        let base_ident = self.qualified_ident(&pkg, &base);
        let instantiated = instantiate(base_ident, &targs_go);
        let companion_lit = goast::Expr::Composite {
            ty: Some(Box::new(instantiated.clone())),
            elems: vec![],
        };

        let result = result_type(&apply.result_types, &pairs);
        if self.is_hoisted(qualified, "Apply") {
            // Hoisted form: Name_Apply[Targs](Name[Targs]{}, args...).
            let mut callee = self.qualified_ident(&pkg, &format!("{}_Apply", base));
            if !targs_go.is_empty() {
                callee = goast::Expr::IndexList {
                    recv: Box::new(callee),
                    indices: targs_go,
                };
            }
            let mut all_args = vec![companion_lit];
            all_args.extend(args.into_iter().map(|(go, _)| go));
            return Ok((goast::Expr::call(callee, all_args), result));
        }

        Ok((
            goast::Expr::call(
                goast::Expr::sel(companion_lit, "Apply"),
                args.into_iter().map(|(go, _)| go).collect(),
            ),
            result,
        ))
    }

    /// Branch 5: `S(v1, v2)` with one value per field, in order.
    fn positional_construction(
        &mut self,
        call: &CallExpr,
        qualified: &str,
        meta: &gala_analyzer::TypeMetadata,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let field_types: Vec<Type> = meta
            .field_names
            .iter()
            .map(|n| meta.fields[n].clone())
            .collect();
        let mut pairs: FxHashMap<String, Type> = FxHashMap::default();
        for (tp, ta) in meta.type_params.iter().zip(call.type_args.iter()) {
            pairs.insert(tp.clone(), Type::from_type_expr(ta));
        }
        let (args, pairs) =
            self.args_with_inference(call, &field_types, &meta.type_params, pairs)?;

        let mut elems = Vec::with_capacity(args.len());
        for ((go, value_ty), name) in args.into_iter().zip(meta.field_names.iter()) {
            let wrapped = self.wrap_field_value(meta.is_field_immutable(name), go, &value_ty);
            elems.push(goast::Expr::key_value(goast::Expr::ident(name.clone()), wrapped));
        }

        self.construction_result(qualified, meta, &pairs, elems)
    }

    /// Branch 6: `S(x = 1, y = 2)` named construction.
    fn named_construction(
        &mut self,
        call: &CallExpr,
        qualified: &str,
        meta: &gala_analyzer::TypeMetadata,
    ) -> Result<(goast::Expr, Type), SourceError> {
        if meta.field_names.is_empty() {
            return Err(self.err_at(
                call.span,
                format!("named arguments have no matching struct: {} has no fields", meta.name),
            ));
        }
        if call.args.iter().any(|a| a.name.is_none()) {
            return Err(self.err_at(
                call.span,
                "cannot mix positional and named arguments in struct construction",
            ));
        }

        let mut by_name: FxHashMap<&str, &Expr> = FxHashMap::default();
        for arg in &call.args {
            let name = arg.name.as_deref().expect("checked above");
            if !meta.fields.contains_key(name) {
                return Err(self.err_at(
                    call.span,
                    format!("unknown field {} in construction of {}", name, meta.name),
                ));
            }
            by_name.insert(name, &arg.value);
        }

        let mut pairs: FxHashMap<String, Type> = FxHashMap::default();
        for (tp, ta) in meta.type_params.iter().zip(call.type_args.iter()) {
            pairs.insert(tp.clone(), Type::from_type_expr(ta));
        }

        // First pass: transform ordinary values and pin type parameters
        // from the field types they flow into.
        let mut values: FxHashMap<&str, (goast::Expr, Type)> = FxHashMap::default();
        for name in &meta.field_names {
            let Some(&expr) = by_name.get(name.as_str()) else { continue };
            if needs_expectation(expr) {
                continue;
            }
            let (go, ty) = self.expr(expr)?;
            pin_type_params(&meta.fields[name], &ty, &meta.type_params, &mut pairs);
            values.insert(name.as_str(), (go, ty));
        }
        // Second pass: lambdas and partial functions see field types
        // with the pins applied.
        for name in &meta.field_names {
            let Some(&expr) = by_name.get(name.as_str()) else { continue };
            if !needs_expectation(expr) {
                continue;
            }
            let expected = apply_subst(&meta.fields[name], &pairs);
            let entry = self.expr_expected(expr, Some(&expected))?;
            values.insert(name.as_str(), entry);
        }

        let mut elems = Vec::with_capacity(values.len());
        for name in &meta.field_names {
            let Some((go, value_ty)) = values.remove(name.as_str()) else { continue };
            let immutable = meta.is_field_immutable(name);
            // nil cannot seed an immutable pointer field: the wrapper
            // would never be reassignable.
            if immutable && value_ty.is_nil() {
                if matches!(meta.fields[name], Type::Pointer(_)) {
                    return Err(self.err_at(
                        call.span,
                        format!(
                            "cannot assign nil to immutable pointer field {}; declare it with var",
                            name
                        ),
                    ));
                }
            }
            let wrapped = self.wrap_field_value(immutable, go, &value_ty);
            elems.push(goast::Expr::key_value(goast::Expr::ident(name.clone()), wrapped));
        }

        self.construction_result(qualified, meta, &pairs, elems)
    }

    /// Shared tail of branches 5 and 6: the composite literal and its
    /// semantic type.
    fn construction_result(
        &mut self,
        qualified: &str,
        meta: &gala_analyzer::TypeMetadata,
        pairs: &FxHashMap<String, Type>,
        elems: Vec<goast::Expr>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let (pkg, base) = qualified.split_once('.').unwrap_or(("", qualified));
        let pkg = pkg.to_string();
        let base = base.to_string();
        let targs: Vec<Type> = meta
            .type_params
            .iter()
            .map(|tp| pairs.get(tp).cloned().unwrap_or_else(Type::any))
            .collect();
        let targs_go: Vec<goast::Expr> = targs.iter().map(|t| self.go_type(t)).collect();
        let base_ident = self.qualified_ident(&pkg, &base);
        let go_ty = instantiate(base_ident, &targs_go);

        let sem = if targs.is_empty() {
            Type::named(pkg, base)
        } else {
            Type::generic(Type::named(pkg, base), targs)
        };
        Ok((
            goast::Expr::Composite {
                ty: Some(Box::new(go_ty)),
                elems,
            },
            sem,
        ))
    }

    // ── Branch 7: struct-literal callable ──────────────────────────────

    fn literal_apply(
        &mut self,
        call: &CallExpr,
        sem: &Type,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let (lit, lit_ty) = self.expr(&call.callee)?;
        let (apply, pairs) = self
            .apply_of(&lit_ty)
            .or_else(|| self.apply_of(sem))
            .ok_or_else(|| self.err_at(call.span, "struct literal has no Apply method"))?;
        let args = self.method_args(call, &apply.param_types, &pairs, true)?;
        let result = result_type(&apply.result_types, &pairs);
        Ok((
            goast::Expr::call(goast::Expr::sel(lit, "Apply"), args),
            result,
        ))
    }

    // ── Branch 8: variable whose type has Apply ────────────────────────

    fn apply_variable(
        &mut self,
        id: &Ident,
        call: &CallExpr,
    ) -> Result<Option<(goast::Expr, Type)>, SourceError> {
        let binding_ty = self
            .scopes
            .lookup(&id.name)
            .map(|b| b.ty.clone())
            .expect("caller checked the binding exists");
        let Some((apply, pairs)) = self.apply_of(&binding_ty) else {
            // A function-typed variable is an ordinary call.
            return Ok(None);
        };
        let (callee, _) = self.expr(&Expr::Ident(id.clone()))?;
        let args = self.method_args(call, &apply.param_types, &pairs, true)?;
        let result = result_type(&apply.result_types, &pairs);
        Ok(Some((
            goast::Expr::call(goast::Expr::sel(callee, "Apply"), args),
            result,
        )))
    }

    /// The `Apply` metadata of a value's type, with the receiver's type
    /// arguments substituted.
    fn apply_of(&self, ty: &Type) -> Option<(MethodMetadata, FxHashMap<String, Type>)> {
        let (_, meta) = self.type_meta_of(ty)?;
        let apply = meta.methods.get("Apply")?.clone();
        let pairs = subst_pairs(&meta.type_params, ty.type_args());
        Some((apply, pairs))
    }

    // ── Branch 9: plain calls ──────────────────────────────────────────

    fn plain_call(&mut self, call: &CallExpr) -> Result<(goast::Expr, Type), SourceError> {
        let (mut callee, callee_ty) = self.expr(&call.callee)?;
        if !call.type_args.is_empty() {
            let targs = call
                .type_args
                .iter()
                .map(|ta| self.go_type_expr(ta))
                .collect();
            callee = goast::Expr::IndexList {
                recv: Box::new(callee),
                indices: targs,
            };
        }
        match callee_ty {
            Type::Func { params, results } => {
                // Type parameters of a known generic function are pinned
                // from the argument types so lambdas can reconstruct.
                let mut tp_names = Vec::new();
                for p in &params {
                    p.collect_free_names(&mut tp_names);
                }
                let mut pairs: FxHashMap<String, Type> = FxHashMap::default();
                for (tp, ta) in tp_names.iter().zip(call.type_args.iter()) {
                    pairs.insert(tp.clone(), Type::from_type_expr(ta));
                }
                let (args, pairs) =
                    self.args_with_inference(call, &params, &tp_names, pairs)?;
                let args = args.into_iter().map(|(go, _)| go).collect();
                let result = result_type(&results, &pairs);
                Ok((goast::Expr::call(callee, args), result))
            }
            _ => {
                let args = self.plain_args(call)?;
                Ok((goast::Expr::call(callee, args), Type::any()))
            }
        }
    }

    // ── Argument transformation ────────────────────────────────────────

    fn plain_args(&mut self, call: &CallExpr) -> Result<Vec<goast::Expr>, SourceError> {
        call.args
            .iter()
            .map(|arg| self.expr(&arg.value).map(|(go, _)| go))
            .collect()
    }

    /// Transform arguments against known parameter types, substituting
    /// `pairs` into each expected type. `hints` disables expectation
    /// passing when the receiver's type arguments are not concrete.
    fn method_args(
        &mut self,
        call: &CallExpr,
        params: &[Type],
        pairs: &FxHashMap<String, Type>,
        hints: bool,
    ) -> Result<Vec<goast::Expr>, SourceError> {
        let mut out = Vec::with_capacity(call.args.len());
        for (i, arg) in call.args.iter().enumerate() {
            let expected = if hints {
                params.get(i).map(|p| apply_subst(p, pairs))
            } else {
                None
            };
            let (go, _) = self.expr_expected(&arg.value, expected.as_ref())?;
            out.push(go);
        }
        Ok(out)
    }

    /// Two-pass argument transformation with type-parameter inference:
    /// ordinary arguments pin parameters first, then lambdas and
    /// partial functions are reconstructed against the pinned
    /// expectations.
    fn args_with_inference(
        &mut self,
        call: &CallExpr,
        params: &[Type],
        tp_names: &[String],
        mut pairs: FxHashMap<String, Type>,
    ) -> Result<(Vec<(goast::Expr, Type)>, FxHashMap<String, Type>), SourceError> {
        let mut slots: Vec<Option<(goast::Expr, Type)>> = vec![None; call.args.len()];
        for (i, arg) in call.args.iter().enumerate() {
            if needs_expectation(&arg.value) {
                continue;
            }
            let expected = params.get(i).map(|p| apply_subst(p, &pairs));
            let (go, ty) = self.expr_expected(&arg.value, expected.as_ref())?;
            if let Some(param) = params.get(i) {
                pin_type_params(param, &ty, tp_names, &mut pairs);
            }
            slots[i] = Some((go, ty));
        }
        for (i, arg) in call.args.iter().enumerate() {
            if !needs_expectation(&arg.value) {
                continue;
            }
            let expected = params.get(i).map(|p| apply_subst(p, &pairs));
            let (go, ty) = self.expr_expected(&arg.value, expected.as_ref())?;
            if let Some(param) = params.get(i) {
                pin_type_params(param, &ty, tp_names, &mut pairs);
            }
            slots[i] = Some((go, ty));
        }
        let args = slots
            .into_iter()
            .map(|s| s.expect("every argument transformed"))
            .collect();
        Ok((args, pairs))
    }

    // ── Qualified calls ────────────────────────────────────────────────

    /// `pkg.Name(args)` where `pkg` addresses an imported package.
    fn qualified_call(
        &mut self,
        m: &MemberExpr,
        call: &CallExpr,
        expected: Option<&Type>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let pkg_alias = match m.recv.as_ref() {
            Expr::Ident(id) => id.name.clone(),
            _ => unreachable!("caller matched a package reference"),
        };
        let real = self
            .imports
            .resolve_alias(&pkg_alias)
            .unwrap_or(&pkg_alias)
            .to_string();
        let qualified = format!("{}.{}", real, m.name);

        // A type in another package: companion Apply or construction.
        if self.rich.types.contains_key(&qualified) {
            if let Some(result) = self.type_callee(&qualified, call, expected)? {
                return Ok(result);
            }
        }

        if let Some(meta) = self.rich.functions.get(&qualified).cloned() {
            let mut callee = self.qualified_ident(&real, &m.name);
            if !call.type_args.is_empty() {
                let targs = call
                    .type_args
                    .iter()
                    .map(|ta| self.go_type_expr(ta))
                    .collect();
                callee = goast::Expr::IndexList {
                    recv: Box::new(callee),
                    indices: targs,
                };
            }
            let mut pairs: FxHashMap<String, Type> = FxHashMap::default();
            for (tp, ta) in meta.type_params.iter().zip(call.type_args.iter()) {
                pairs.insert(tp.clone(), Type::from_type_expr(ta));
            }
            let (args, pairs) =
                self.args_with_inference(call, &meta.param_types, &meta.type_params, pairs)?;
            let args = args.into_iter().map(|(go, _)| go).collect();
            let result = result_type(&meta.result_types, &pairs);
            return Ok((goast::Expr::call(callee, args), result));
        }

        // An external symbol: emit the call as written.
        let callee = self.qualified_ident(&real, &m.name);
        let args = self.plain_args(call)?;
        Ok((goast::Expr::call(callee, args), Type::any()))
    }
}

// ── Free helpers ───────────────────────────────────────────────────────

/// An unresolved type parameter left in a receiver's type arguments.
fn is_unresolved_param(ty: &Type) -> bool {
    matches!(ty, Type::Named { package, name } if package.is_empty() && is_type_param_name(name))
}

/// Arguments whose lowering depends on an expected function type, so
/// they transform after every other argument has pinned what it can.
fn needs_expectation(e: &Expr) -> bool {
    matches!(e, Expr::Lambda(_) | Expr::PartialFn(_))
}

fn instantiate(base: goast::Expr, targs: &[goast::Expr]) -> goast::Expr {
    match targs.len() {
        0 => base,
        1 => goast::Expr::Index {
            recv: Box::new(base),
            index: Box::new(targs[0].clone()),
        },
        _ => goast::Expr::IndexList {
            recv: Box::new(base),
            indices: targs.to_vec(),
        },
    }
}

/// The substituted result type of a call; void when there are no
/// results, the first result otherwise.
fn result_type(results: &[Type], pairs: &FxHashMap<String, Type>) -> Type {
    match results.len() {
        0 => Type::Void,
        _ => apply_subst(&results[0], pairs),
    }
}

/// Structurally match a parameter type against an argument type,
/// binding any type-parameter slots encountered. Also used by the
/// pattern compiler to map a companion's parent type onto the
/// scrutinee.
pub(crate) fn pin_type_params(
    param: &Type,
    arg: &Type,
    tp_names: &[String],
    pairs: &mut FxHashMap<String, Type>,
) {
    match (param, arg) {
        (Type::Named { package, name }, _) if package.is_empty() => {
            if tp_names.contains(name) && !pairs.contains_key(name) && !arg.is_nil() {
                pairs.insert(name.clone(), arg.clone());
            }
        }
        (Type::Generic { base: pb, params: pp }, Type::Generic { base: ab, params: ap })
            if pb.base_name() == ab.base_name() =>
        {
            for (p, a) in pp.iter().zip(ap.iter()) {
                pin_type_params(p, a, tp_names, pairs);
            }
        }
        (Type::Pointer(p), Type::Pointer(a)) | (Type::Array(p), Type::Array(a)) => {
            pin_type_params(p, a, tp_names, pairs);
        }
        (
            Type::Map { key: pk, value: pv },
            Type::Map { key: ak, value: av },
        ) => {
            pin_type_params(pk, ak, tp_names, pairs);
            pin_type_params(pv, av, tp_names, pairs);
        }
        (
            Type::Func { params: pp, results: pr },
            Type::Func { params: ap, results: ar },
        ) => {
            for (p, a) in pp.iter().zip(ap.iter()) {
                pin_type_params(p, a, tp_names, pairs);
            }
            for (p, a) in pr.iter().zip(ar.iter()) {
                pin_type_params(p, a, tp_names, pairs);
            }
        }
        _ => {}
    }
}
