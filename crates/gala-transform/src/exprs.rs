//! Expression lowering.
//!
//! Every expression transform returns the emitted Go expression paired
//! with its semantic type; call sites thread expected types downward so
//! lambda parameters can be reconstructed where the programmer omitted
//! them. Reads of `val` bindings and immutable fields pick up the
//! auto-`Get` here.

use gala_common::SourceError;
use gala_goast as goast;
use gala_infer::infer::expected_lambda_signature;
use gala_syntax::ast::*;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::Transformer;

/// Build a substitution map from type parameters to arguments.
pub(crate) fn subst_pairs(params: &[String], args: &[Type]) -> FxHashMap<String, Type> {
    params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}

/// Apply a substitution map to a type.
pub(crate) fn apply_subst(ty: &Type, pairs: &FxHashMap<String, Type>) -> Type {
    ty.substitute(&|name| pairs.get(name).cloned())
}

impl Transformer<'_> {
    pub(crate) fn expr(&mut self, e: &Expr) -> Result<(goast::Expr, Type), SourceError> {
        self.expr_expected(e, None)
    }

    pub(crate) fn expr_expected(
        &mut self,
        e: &Expr,
        expected: Option<&Type>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        match e {
            Expr::Ident(id) => self.ident_expr(id),
            Expr::Lit(lit) => Ok(self.lit_expr(lit)),
            Expr::Unary(u) => self.unary_expr(u),
            Expr::Binary(b) => self.binary_expr(b),
            Expr::Member(m) => self.member_expr(m),
            Expr::Index(ix) => self.index_expr(ix),
            Expr::Paren(inner, _) => {
                let (e, ty) = self.expr_expected(inner, expected)?;
                Ok((goast::Expr::Paren(Box::new(e)), ty))
            }
            Expr::Lambda(lambda) => self.lambda_expr(lambda, expected),
            Expr::PartialFn(pf) => self.partial_fn_expr(pf, expected),
            Expr::If(ife) => self.if_expr(ife),
            Expr::Match(m) => self.match_expr(m),
            Expr::Call(call) => self.call_expr(call, expected),
            Expr::Composite(lit) => self.composite_expr(lit),
        }
    }

    // ── Identifiers and literals ───────────────────────────────────────

    fn ident_expr(&mut self, id: &Ident) -> Result<(goast::Expr, Type), SourceError> {
        if let Some(binding) = self.scopes.lookup(&id.name) {
            let ty = binding.ty.clone();
            let base = goast::Expr::ident(id.name.clone());
            // A `val` read materializes as a Get() on the wrapper.
            if binding.is_val {
                return Ok((goast::Expr::method_call(base, "Get", vec![]), ty));
            }
            return Ok((base, ty));
        }

        if let Some((qualified, meta)) = self.lookup_function(&id.name) {
            let ty = Type::Func {
                params: meta.param_types.clone(),
                results: meta.result_types.clone(),
            };
            let (pkg, simple) = qualified.split_once('.').unwrap_or(("", qualified.as_str()));
            let pkg = pkg.to_string();
            let simple = simple.to_string();
            return Ok((self.qualified_ident(&pkg, &simple), ty));
        }

        Err(self.err_at(id.span, format!("unknown variable {}", id.name)))
    }

    pub(crate) fn lit_expr(&mut self, lit: &Lit) -> (goast::Expr, Type) {
        match lit.kind {
            LitKind::Int => (goast::Expr::int_lit(lit.text.clone()), Type::basic("int")),
            LitKind::Float => (
                goast::Expr::BasicLit(goast::LitKind::Float, lit.text.clone()),
                Type::basic("float64"),
            ),
            LitKind::Str => (goast::Expr::str_lit(&lit.text), Type::basic("string")),
            LitKind::RawStr => (
                goast::Expr::BasicLit(goast::LitKind::Str, format!("`{}`", lit.text)),
                Type::basic("string"),
            ),
            LitKind::Char => (
                goast::Expr::BasicLit(goast::LitKind::Char, format!("'{}'", lit.text)),
                Type::basic("rune"),
            ),
            LitKind::Bool => (goast::Expr::ident(lit.text.clone()), Type::basic("bool")),
            LitKind::Nil => (goast::Expr::ident("nil"), Type::Nil),
        }
    }

    // ── Operators ──────────────────────────────────────────────────────

    fn unary_expr(&mut self, u: &UnaryExpr) -> Result<(goast::Expr, Type), SourceError> {
        let (operand, operand_ty) = self.expr(&u.expr)?;
        let (go, ty) = match u.op {
            UnaryOp::Not => (
                goast::Expr::Unary {
                    op: "!",
                    expr: Box::new(operand),
                },
                Type::basic("bool"),
            ),
            UnaryOp::Ref => (
                goast::Expr::Unary {
                    op: "&",
                    expr: Box::new(operand),
                },
                Type::Pointer(Box::new(operand_ty)),
            ),
            UnaryOp::Deref => {
                let inner = match &operand_ty {
                    Type::Pointer(elem) => (**elem).clone(),
                    _ => Type::any(),
                };
                (goast::Expr::Star(Box::new(operand)), inner)
            }
            UnaryOp::Pos | UnaryOp::Neg | UnaryOp::BitNot => {
                let op = match u.op {
                    UnaryOp::Pos => "+",
                    UnaryOp::Neg => "-",
                    _ => "^",
                };
                (
                    goast::Expr::Unary {
                        op,
                        expr: Box::new(operand),
                    },
                    operand_ty,
                )
            }
        };
        Ok((go, ty))
    }

    fn binary_expr(&mut self, b: &BinaryExpr) -> Result<(goast::Expr, Type), SourceError> {
        let (lhs, lhs_ty) = self.expr(&b.lhs)?;
        let (rhs, rhs_ty) = self.expr(&b.rhs)?;
        let op = binary_op_str(b.op);
        let ty = match b.op {
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge
            | BinaryOp::And
            | BinaryOp::Or => Type::basic("bool"),
            _ => {
                if lhs_ty.is_any() || lhs_ty.is_nil() {
                    rhs_ty
                } else {
                    lhs_ty
                }
            }
        };
        Ok((goast::Expr::binary(op, lhs, rhs), ty))
    }

    // ── Member access ──────────────────────────────────────────────────

    pub(crate) fn member_expr(&mut self, m: &MemberExpr) -> Result<(goast::Expr, Type), SourceError> {
        // Package-qualified reference: `pkg.Symbol` where `pkg` is an
        // imported package not shadowed by a local variable.
        if let Expr::Ident(recv_id) = m.recv.as_ref() {
            if self.scopes.lookup(&recv_id.name).is_none()
                && self.imports.is_package(&recv_id.name)
            {
                let real = self
                    .imports
                    .resolve_alias(&recv_id.name)
                    .unwrap_or(&recv_id.name)
                    .to_string();
                let qualified = format!("{}.{}", real, m.name);
                let go = self.qualified_ident(&real, &m.name);
                if let Some(meta) = self.rich.functions.get(&qualified) {
                    let ty = Type::Func {
                        params: meta.param_types.clone(),
                        results: meta.result_types.clone(),
                    };
                    return Ok((go, ty));
                }
                if self.rich.types.contains_key(&qualified) {
                    return Ok((go, Type::named(real, &m.name)));
                }
                return Ok((go, Type::any()));
            }
        }

        let (recv, recv_ty) = self.expr(&m.recv)?;
        let sel = goast::Expr::sel(recv, m.name.clone());

        if let Some((_, meta)) = self.type_meta_of(&recv_ty) {
            let pairs = subst_pairs(&meta.type_params, recv_ty.type_args());

            if let Some(field_ty) = meta.fields.get(&m.name) {
                let ty = apply_subst(field_ty, &pairs);
                // Reads of immutable fields unwrap through Get().
                if meta.is_field_immutable(&m.name) {
                    return Ok((goast::Expr::method_call(sel, "Get", vec![]), ty));
                }
                return Ok((sel, ty));
            }

            if let Some(method) = meta.methods.get(&m.name) {
                let ty = Type::Func {
                    params: method
                        .param_types
                        .iter()
                        .map(|p| apply_subst(p, &pairs))
                        .collect(),
                    results: method
                        .result_types
                        .iter()
                        .map(|r| apply_subst(r, &pairs))
                        .collect(),
                };
                return Ok((sel, ty));
            }
        }

        Ok((sel, Type::any()))
    }

    // ── Indexing ───────────────────────────────────────────────────────

    fn index_expr(&mut self, ix: &IndexExpr) -> Result<(goast::Expr, Type), SourceError> {
        let (recv, recv_ty) = self.expr(&ix.recv)?;
        let mut indices = Vec::with_capacity(ix.indices.len());
        for index in &ix.indices {
            indices.push(self.expr(index)?.0);
        }
        if indices.len() == 1 {
            let elem_ty = match &recv_ty {
                Type::Array(elem) => (**elem).clone(),
                Type::Map { value, .. } => (**value).clone(),
                _ => Type::any(),
            };
            Ok((
                goast::Expr::Index {
                    recv: Box::new(recv),
                    index: Box::new(indices.into_iter().next().expect("length checked")),
                },
                elem_ty,
            ))
        } else {
            Ok((
                goast::Expr::IndexList {
                    recv: Box::new(recv),
                    indices,
                },
                Type::any(),
            ))
        }
    }

    // ── Lambdas ────────────────────────────────────────────────────────

    /// Lower a lambda, reconstructing omitted parameter types from the
    /// expected function type when one is known.
    pub(crate) fn lambda_expr(
        &mut self,
        lambda: &LambdaExpr,
        expected: Option<&Type>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let seeded = expected
            .and_then(|exp| expected_lambda_signature(exp, lambda.params.len()));
        let (seed_params, seed_ret) = match seeded {
            Some((params, ret)) => (
                params
                    .into_iter()
                    .map(|p| (!crate::types::has_unresolved_params(&p)).then_some(p))
                    .collect(),
                ret.filter(|r| !crate::types::has_unresolved_params(r)),
            ),
            None => (vec![None; lambda.params.len()], None),
        };

        let mut param_tys = Vec::with_capacity(lambda.params.len());
        let mut fields = Vec::with_capacity(lambda.params.len());
        self.scopes.push();
        self.inferer.push_scope();
        for (param, seed) in lambda.params.iter().zip(seed_params) {
            let ty = match &param.ty {
                Some(te) => Type::from_type_expr(te),
                None => seed.unwrap_or_else(Type::any),
            };
            self.scopes.declare(&param.name, false, ty.clone());
            self.inferer.bind_mono(&param.name, &ty);
            let go_ty = self.go_type(&ty);
            fields.push(goast::Field::named(param.name.clone(), go_ty));
            param_tys.push(ty);
        }

        let declared_ret = lambda.ret.as_ref().map(Type::from_type_expr);
        let result = (|| -> Result<(goast::Block, Type), SourceError> {
            match &lambda.body {
                FuncBody::Expr(expr) => {
                    let hint = declared_ret.clone().or(seed_ret.clone());
                    let (body, body_ty) = self.expr_expected(expr, hint.as_ref())?;
                    let ret_ty = declared_ret
                        .clone()
                        .or(seed_ret.clone())
                        .unwrap_or(body_ty);
                    Ok((goast::Block::new(vec![goast::Stmt::ret(body)]), ret_ty))
                }
                FuncBody::Block(block) => {
                    let body = self.block_inner(block)?;
                    let ret_ty = declared_ret
                        .clone()
                        .or(seed_ret.clone())
                        .unwrap_or(Type::Void);
                    Ok((body, ret_ty))
                }
            }
        })();
        self.inferer.pop_scope();
        self.scopes.pop();
        let (body, ret_ty) = result?;

        let results = if ret_ty.is_void() {
            vec![]
        } else {
            vec![goast::Field::anon(self.go_type(&ret_ty))]
        };
        let go = goast::Expr::FuncLit {
            params: fields,
            results,
            body,
        };
        let ty = Type::Func {
            params: param_tys,
            results: if ret_ty.is_void() { vec![] } else { vec![ret_ty] },
        };
        Ok((go, ty))
    }

    // ── If expressions ─────────────────────────────────────────────────

    /// An `if` in expression position becomes an immediately invoked
    /// function literal. The result type is the reconciled branch type
    /// when inference can narrow it, `any` otherwise.
    fn if_expr(&mut self, ife: &IfExpr) -> Result<(goast::Expr, Type), SourceError> {
        let (cond, _) = self.expr(&ife.cond)?;
        let (then, then_ty) = self.expr(&ife.then)?;
        let (else_, else_ty) = self.expr(&ife.else_)?;
        let result_ty = self
            .inferer
            .unify_types(&then_ty, &else_ty)
            .unwrap_or_else(|_| Type::any());

        let results = vec![goast::Field::anon(self.go_type(&result_ty))];
        let body = goast::Block::new(vec![goast::Stmt::If(goast::IfStmt {
            init: None,
            cond,
            then: goast::Block::new(vec![goast::Stmt::ret(then)]),
            else_: Some(Box::new(goast::ElseBranch::Block(goast::Block::new(vec![
                goast::Stmt::ret(else_),
            ])))),
        })]);
        let go = goast::Expr::Paren(Box::new(goast::Expr::call(
            goast::Expr::FuncLit {
                params: vec![],
                results,
                body,
            },
            vec![],
        )));
        Ok((go, result_ty))
    }

    // ── Composite literals ─────────────────────────────────────────────

    fn composite_expr(&mut self, lit: &CompositeLit) -> Result<(goast::Expr, Type), SourceError> {
        match &lit.ty {
            TypeExpr::Slice(..) => {
                return Err(self.err_at(
                    lit.span,
                    "slice literal is not allowed in expression position",
                ))
            }
            TypeExpr::Map { .. } => {
                return Err(self.err_at(
                    lit.span,
                    "map literal is not allowed in expression position",
                ))
            }
            _ => {}
        }

        let sem_ty = Type::from_type_expr(&lit.ty);
        let meta = self.type_meta_of(&sem_ty).map(|(q, m)| (q, m.clone()));
        let go_ty = self.go_type(&sem_ty);
        let mut elems = Vec::with_capacity(lit.elems.len());
        for elem in &lit.elems {
            match (&elem.key, &meta) {
                (Some(key), Some((_, meta))) if meta.fields.contains_key(key) => {
                    let field_ty = meta.fields[key].clone();
                    let immut = meta.is_field_immutable(key);
                    let (value, value_ty) =
                        self.expr_expected(&elem.value, Some(&field_ty))?;
                    let wrapped = self.wrap_field_value(immut, value, &value_ty);
                    elems.push(goast::Expr::key_value(
                        goast::Expr::ident(key.clone()),
                        wrapped,
                    ));
                }
                (Some(key), _) => {
                    let (value, _) = self.expr(&elem.value)?;
                    elems.push(goast::Expr::key_value(
                        goast::Expr::ident(key.clone()),
                        value,
                    ));
                }
                (None, _) => elems.push(self.expr(&elem.value)?.0),
            }
        }
        Ok((
            goast::Expr::Composite {
                ty: Some(Box::new(go_ty)),
                elems,
            },
            sem_ty,
        ))
    }

    // ── Shared wrapping helpers ────────────────────────────────────────

    /// Wrap a value for storage in a struct field: immutable fields get
    /// `NewImmutable(...)`, never doubly wrapped.
    pub(crate) fn wrap_field_value(
        &mut self,
        immutable: bool,
        value: goast::Expr,
        value_ty: &Type,
    ) -> goast::Expr {
        if !immutable {
            return value;
        }
        let unwrapped = self.unwrap_immutable_expr(value, value_ty);
        let ctor = self.rt("NewImmutable");
        goast::Expr::call(ctor, vec![unwrapped])
    }

    /// Strip one surface `Immutable` layer off an already-emitted
    /// expression, so wrapping never nests.
    pub(crate) fn unwrap_immutable_expr(
        &mut self,
        value: goast::Expr,
        value_ty: &Type,
    ) -> goast::Expr {
        if value_ty.is_immutable_wrapper() {
            goast::Expr::method_call(value, "Get", vec![])
        } else {
            value
        }
    }
}

pub(crate) fn binary_op_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
    }
}
