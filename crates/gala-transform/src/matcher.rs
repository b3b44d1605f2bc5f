//! Pattern-match compilation.
//!
//! `e match { case p1 => r1; ...; case _ => rd }` lowers to a typed,
//! immediately invoked function literal whose body is a sequential
//! chain: each constructor arm destructures through
//! `UnapplyFull`/`GetSafe`/`As`, literal arms check equality through
//! `UnapplyCheck`, and the mandatory wildcard arm becomes the final
//! else. Temporaries are numbered by unit-wide counters so every name
//! is unique within the compilation unit.
//!
//! A partial-function literal `{ case p => r; ... }` reuses the same
//! chain: it becomes a single-parameter function matching on its
//! argument, with the parameter and return types reconstructed from the
//! expected function type.

use gala_common::SourceError;
use gala_goast as goast;
use gala_infer::infer::expected_lambda_signature;
use gala_syntax::ast::*;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::types::has_unresolved_params;
use crate::Transformer;

/// One lowered non-default arm: destructuring statements, the combined
/// success condition, and the transformed body.
struct LoweredArm {
    stmts: Vec<goast::Stmt>,
    cond: goast::Expr,
    body: goast::Expr,
}

impl Transformer<'_> {
    pub(crate) fn match_expr(&mut self, m: &MatchExpr) -> Result<(goast::Expr, Type), SourceError> {
        // The scrutinee is transformed in the enclosing scope; the
        // auto-Get on `val` reads performs the immutability unwrap.
        let (scrut, scrut_ty) = self.expr(&m.scrutinee)?;
        let scrut_ty = scrut_ty.unwrap_immutable().clone();

        // The scrutinee's value is rebound to the IIFE parameter; it may
        // shadow a variable of the same name inside the arms.
        let param = match m.scrutinee.as_ref() {
            Expr::Ident(id) => id.name.clone(),
            _ => self.fresh_tmp(),
        };

        let (body, result_ty) = self.match_chain(&m.arms, m.span, &param, &scrut_ty, None)?;

        let param_go = self.go_type(&scrut_ty);
        let result_go = self.go_type(&result_ty);
        let iife = goast::Expr::Paren(Box::new(goast::Expr::call(
            goast::Expr::FuncLit {
                params: vec![goast::Field::named(param, param_go)],
                results: vec![goast::Field::anon(result_go)],
                body: goast::Block::new(body),
            },
            vec![scrut],
        )));
        Ok((iife, result_ty))
    }

    /// A partial-function literal: a single-parameter function whose
    /// body is the match chain over its argument. The parameter type
    /// comes from the expected function type (any when nothing is
    /// expected); an expected return type wins over the unified arm
    /// type, matching the declared-types-win rule everywhere else.
    pub(crate) fn partial_fn_expr(
        &mut self,
        pf: &PartialFnExpr,
        expected: Option<&Type>,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let seeded = expected.and_then(|exp| expected_lambda_signature(exp, 1));
        let (param_ty, ret_hint) = match seeded {
            Some((params, ret)) => {
                let param = params.into_iter().next().expect("arity checked");
                let param = if has_unresolved_params(&param) {
                    Type::any()
                } else {
                    param
                };
                (param, ret.filter(|r| !has_unresolved_params(r)))
            }
            None => (Type::any(), None),
        };

        let param = self.fresh_tmp();
        let (body, result_ty) =
            self.match_chain(&pf.arms, pf.span, &param, &param_ty, ret_hint.as_ref())?;

        let param_go = self.go_type(&param_ty);
        let result_go = self.go_type(&result_ty);
        let go = goast::Expr::FuncLit {
            params: vec![goast::Field::named(param, param_go)],
            results: vec![goast::Field::anon(result_go)],
            body: goast::Block::new(body),
        };
        let ty = Type::Func {
            params: vec![param_ty],
            results: vec![result_ty],
        };
        Ok((go, ty))
    }

    /// The shared arm chain: default-arm checks, per-arm lowering in a
    /// scope where `param` is bound at the scrutinee type, and the
    /// back-to-front assembly that nests later arms in the else.
    fn match_chain(
        &mut self,
        arms: &[MatchArm],
        span: gala_common::Span,
        param: &str,
        scrut_ty: &Type,
        expected_ret: Option<&Type>,
    ) -> Result<(Vec<goast::Stmt>, Type), SourceError> {
        let defaults: Vec<&MatchArm> = arms.iter().filter(|a| a.pattern.is_wildcard()).collect();
        match defaults.len() {
            0 => return Err(self.err_at(span, "match expression is missing a default case")),
            1 => {}
            _ => return Err(self.err_at(span, "match expression has multiple default cases")),
        }
        let default = defaults[0];

        self.scopes.push();
        self.inferer.push_scope();
        let result = self.lower_arms(arms, default, param, scrut_ty);
        self.inferer.pop_scope();
        self.scopes.pop();
        let (arms, default_body, result_ty) = result?;
        let result_ty = match expected_ret {
            Some(ret) => ret.clone(),
            None => result_ty,
        };

        // Assemble the chain back-to-front: each arm's destructuring
        // statements precede its check; later arms live in the else.
        let mut tail: Vec<goast::Stmt> = vec![goast::Stmt::ret(default_body)];
        for arm in arms.into_iter().rev() {
            let mut stmts = arm.stmts;
            stmts.push(goast::Stmt::If(goast::IfStmt {
                init: None,
                cond: arm.cond,
                then: goast::Block::new(vec![goast::Stmt::ret(arm.body)]),
                else_: Some(Box::new(goast::ElseBranch::Block(goast::Block::new(tail)))),
            }));
            tail = stmts;
        }
        Ok((tail, result_ty))
    }

    #[allow(clippy::type_complexity)]
    fn lower_arms(
        &mut self,
        all_arms: &[MatchArm],
        default: &MatchArm,
        param: &str,
        scrut_ty: &Type,
    ) -> Result<(Vec<LoweredArm>, goast::Expr, Type), SourceError> {
        self.scopes.declare(param, false, scrut_ty.clone());
        self.inferer.bind_mono(param, scrut_ty);

        let mut arms = Vec::new();
        let mut result_ty: Option<Type> = None;
        for arm in all_arms.iter().filter(|a| !a.pattern.is_wildcard()) {
            let lowered = self.lower_arm(param, scrut_ty, arm)?;
            result_ty = Some(match result_ty {
                None => lowered.1,
                Some(prev) => self
                    .inferer
                    .unify_types(&prev, &lowered.1)
                    .map_err(|_| {
                        self.err_at(
                            arm.span,
                            format!(
                                "match arms have mismatched types: {} vs {}",
                                prev, lowered.1
                            ),
                        )
                    })?,
            });
            arms.push(lowered.0);
        }

        let (default_body, default_ty) = self.expr(&default.body)?;
        let result_ty = match result_ty {
            None => default_ty,
            Some(ty) => self.inferer.unify_types(&ty, &default_ty).unwrap_or(ty),
        };
        Ok((arms, default_body, result_ty))
    }

    fn lower_arm(
        &mut self,
        param: &str,
        scrut_ty: &Type,
        arm: &MatchArm,
    ) -> Result<(LoweredArm, Type), SourceError> {
        let param_ident = goast::Expr::ident(param);
        self.scopes.push();
        self.inferer.push_scope();
        let result = (|| {
            let mut stmts = Vec::new();
            let mut conds = Vec::new();
            match &arm.pattern {
                Pattern::Wildcard(_) => unreachable!("default arms are filtered out"),

                // Literal patterns match by equality.
                Pattern::Lit(lit) => {
                    let (lit_go, _) = self.lit_expr(lit);
                    let check = self.rt("UnapplyCheck");
                    conds.push(goast::Expr::call(
                        check,
                        vec![param_ident.clone(), lit_go],
                    ));
                }

                // A top-level binder: with an annotation it narrows via
                // As[T]; without one it always matches.
                Pattern::Bind { name, ty, span: _ } => match ty {
                    Some(te) => {
                        let target = Type::from_type_expr(te);
                        let ok = self.fresh_ok();
                        let as_call = self.as_call(&target, param_ident.clone());
                        stmts.push(goast::Stmt::Assign {
                            lhs: vec![
                                goast::Expr::ident(name.clone()),
                                goast::Expr::ident(ok.clone()),
                            ],
                            op: goast::AssignOp::Define,
                            rhs: vec![as_call],
                        });
                        conds.push(goast::Expr::ident(ok));
                        self.scopes.declare(name, false, target.clone());
                        self.inferer.bind_mono(name, &target);
                    }
                    None => {
                        stmts.push(goast::Stmt::define(
                            goast::Expr::ident(name.clone()),
                            param_ident.clone(),
                        ));
                        conds.push(goast::Expr::ident("true"));
                        self.scopes.declare(name, false, scrut_ty.clone());
                        self.inferer.bind_mono(name, scrut_ty);
                    }
                },

                Pattern::Ctor { name, args, span } => {
                    self.lower_ctor_pattern(
                        param_ident.clone(),
                        scrut_ty,
                        name,
                        args,
                        *span,
                        &mut stmts,
                        &mut conds,
                    )?;
                }
            }

            let (body, body_ty) = self.expr(&arm.body)?;
            let cond = conds
                .into_iter()
                .reduce(|a, b| goast::Expr::binary("&&", a, b))
                .unwrap_or_else(|| goast::Expr::ident("true"));
            Ok((LoweredArm { stmts, cond, body }, body_ty))
        })();
        self.inferer.pop_scope();
        self.scopes.pop();
        result
    }

    /// `C(p1, ..., pn)`: check the companion, destructure the payload,
    /// bind sub-patterns positionally.
    #[allow(clippy::too_many_arguments)]
    fn lower_ctor_pattern(
        &mut self,
        param_ident: goast::Expr,
        scrut_ty: &Type,
        name: &str,
        args: &[Pattern],
        span: gala_common::Span,
        stmts: &mut Vec<goast::Stmt>,
        conds: &mut Vec<goast::Expr>,
    ) -> Result<(), SourceError> {
        let (elem_types, companion_go) = self.ctor_pattern_info(scrut_ty, name, span)?;
        if elem_types.len() != args.len() {
            return Err(self.err_at(
                span,
                format!(
                    "pattern {} expects {} fields, found {}",
                    name,
                    elem_types.len(),
                    args.len()
                ),
            ));
        }

        if args.is_empty() {
            let check = self.rt("UnapplyCheck");
            conds.push(goast::Expr::call(check, vec![param_ident, companion_go]));
            return Ok(());
        }

        let tmp = self.fresh_tmp();
        let ok = self.fresh_ok();
        let full = self.rt("UnapplyFull");
        stmts.push(goast::Stmt::Assign {
            lhs: vec![
                goast::Expr::ident(tmp.clone()),
                goast::Expr::ident(ok.clone()),
            ],
            op: goast::AssignOp::Define,
            rhs: vec![goast::Expr::call(full, vec![param_ident, companion_go])],
        });
        conds.push(goast::Expr::ident(ok));

        for (i, (sub, elem_ty)) in args.iter().zip(elem_types.iter()).enumerate() {
            let get_safe = self.rt("GetSafe");
            let payload = goast::Expr::call(
                get_safe,
                vec![
                    goast::Expr::ident(tmp.clone()),
                    goast::Expr::int_lit(i.to_string()),
                ],
            );
            match sub {
                Pattern::Wildcard(_) => {}
                Pattern::Lit(lit) => {
                    let (lit_go, _) = self.lit_expr(lit);
                    let check = self.rt("UnapplyCheck");
                    conds.push(goast::Expr::call(check, vec![payload, lit_go]));
                }
                Pattern::Bind { name, ty, .. } => {
                    let target = match ty {
                        Some(te) => Type::from_type_expr(te),
                        None => elem_ty.clone(),
                    };
                    if target.is_any() {
                        stmts.push(goast::Stmt::define(
                            goast::Expr::ident(name.clone()),
                            payload,
                        ));
                    } else {
                        let ok = self.fresh_ok();
                        let as_call = self.as_call(&target, payload);
                        stmts.push(goast::Stmt::Assign {
                            lhs: vec![
                                goast::Expr::ident(name.clone()),
                                goast::Expr::ident(ok.clone()),
                            ],
                            op: goast::AssignOp::Define,
                            rhs: vec![as_call],
                        });
                        conds.push(goast::Expr::ident(ok));
                    }
                    self.scopes.declare(name, false, target.clone());
                    self.inferer.bind_mono(name, &target);
                }
                Pattern::Ctor { .. } => {
                    return Err(
                        self.err_at(sub.span(), "nested constructor patterns are not supported")
                    )
                }
            }
        }
        Ok(())
    }

    /// Resolve a constructor pattern's payload element types (with the
    /// scrutinee's type arguments substituted) and the companion
    /// literal to pass to the runtime.
    fn ctor_pattern_info(
        &mut self,
        scrut_ty: &Type,
        name: &str,
        span: gala_common::Span,
    ) -> Result<(Vec<Type>, goast::Expr), SourceError> {
        // A sealed-variant (or runtime Some/None) companion.
        if let Some((qualified, companion)) = self
            .lookup_companion(name)
            .map(|(q, c)| (q, c.clone()))
        {
            let mut pairs: FxHashMap<String, Type> = FxHashMap::default();
            crate::calls::pin_type_params(
                &companion.parent,
                scrut_ty,
                &companion.type_params,
                &mut pairs,
            );
            let elems = companion
                .apply_param_types
                .iter()
                .map(|t| crate::exprs::apply_subst(t, &pairs))
                .collect();
            let (pkg, base) = qualified.split_once('.').unwrap_or(("", qualified.as_str()));
            let (pkg, base) = (pkg.to_string(), base.to_string());
            let ident = self.qualified_ident(&pkg, &base);
            let lit = goast::Expr::Composite {
                ty: Some(Box::new(ident)),
                elems: vec![],
            };
            return Ok((elems, lit));
        }

        // A struct with a (generated or user) Unapply.
        if let Some((qualified, meta)) = self.lookup_type(name).map(|(q, m)| (q, m.clone())) {
            let pairs = crate::exprs::subst_pairs(&meta.type_params, scrut_ty.type_args());
            let elems = meta
                .field_names
                .iter()
                .map(|f| crate::exprs::apply_subst(&meta.fields[f], &pairs))
                .collect();
            let (pkg, base) = qualified.split_once('.').unwrap_or(("", qualified.as_str()));
            let (pkg, base) = (pkg.to_string(), base.to_string());
            let ident = self.qualified_ident(&pkg, &base);
            let lit = goast::Expr::Composite {
                ty: Some(Box::new(ident)),
                elems: vec![],
            };
            return Ok((elems, lit));
        }

        Err(self.err_at(span, format!("unknown constructor pattern {}", name)))
    }

    /// `As[T](payload)`.
    fn as_call(&mut self, target: &Type, payload: goast::Expr) -> goast::Expr {
        let target_go = self.go_type(target);
        let as_ident = self.rt("As");
        goast::Expr::call(
            goast::Expr::Index {
                recv: Box::new(as_ident),
                index: Box::new(target_go),
            },
            vec![payload],
        )
    }
}
