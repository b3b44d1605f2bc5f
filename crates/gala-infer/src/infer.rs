//! The inference walker.
//!
//! Implements the two public operations the transformer consumes,
//! `infer_expr` and `infer_if`, plus the helpers it leans on for lambda
//! reconstruction and match-arm reconciliation. A manual fast path
//! resolves locally-determinable expressions (literals, known
//! identifiers) without touching the unifier; everything else runs
//! through Hindley-Milner terms.

use std::fmt;

use gala_syntax::ast::{
    BinaryOp, Expr, FuncBody, LambdaExpr, Lit, LitKind, Stmt, UnaryOp,
};
use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::env::TypeEnv;
use crate::ty::{Scheme, Ty};
use crate::unify::InferCtx;

// ── Errors ─────────────────────────────────────────────────────────────

/// Failures inference can report. The transformer wraps these into
/// positioned source errors where a parse-tree context exists.
#[derive(Debug, Clone, PartialEq)]
pub enum InferError {
    Mismatch { expected: String, found: String },
    ArityMismatch { expected: usize, found: usize },
    InfiniteType { ty: String },
    UnknownIdent(String),
    NotAFunction(String),
    /// The expression needs symbol metadata the inferer does not have
    /// (member access, companion construction). The transformer's own
    /// typing handles these.
    Unsupported(&'static str),
}

impl fmt::Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferError::Mismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            InferError::ArityMismatch { expected, found } => {
                write!(f, "expected {} argument(s), found {}", expected, found)
            }
            InferError::InfiniteType { ty } => write!(f, "infinite type: {}", ty),
            InferError::UnknownIdent(name) => write!(f, "unknown variable {}", name),
            InferError::NotAFunction(ty) => write!(f, "type {} is not callable", ty),
            InferError::Unsupported(what) => write!(f, "cannot infer type of {}", what),
        }
    }
}

impl std::error::Error for InferError {}

// ── Expected lambda signatures ─────────────────────────────────────────

/// Project a function type with the given arity out of an expected
/// parameter type, yielding the lambda's parameter types and declared
/// result. Returns `None` when the expectation is not a matching
/// function type, in which case the lambda's own annotations decide.
pub fn expected_lambda_signature(
    expected: &Type,
    arity: usize,
) -> Option<(Vec<Type>, Option<Type>)> {
    match expected.unwrap_immutable() {
        Type::Func { params, results } if params.len() == arity => {
            let ret = match results.len() {
                0 => None,
                1 => Some(results[0].clone()),
                _ => None,
            };
            Some((params.clone(), ret))
        }
        _ => None,
    }
}

// ── The inferer ────────────────────────────────────────────────────────

/// One inference session. Owned by a transformer instance and discarded
/// with it; nothing is shared across transforms.
pub struct Inferer {
    pub ctx: InferCtx,
    env: TypeEnv,
}

impl Inferer {
    pub fn new() -> Self {
        Inferer {
            ctx: InferCtx::new(),
            env: TypeEnv::new(),
        }
    }

    pub fn push_scope(&mut self) {
        self.env.push();
    }

    pub fn pop_scope(&mut self) {
        self.env.pop();
    }

    /// Bind a local variable at its known type.
    pub fn bind_mono(&mut self, name: &str, ty: &Type) {
        let term = Ty::from_type(ty, &FxHashMap::default());
        self.env.define(name, Scheme::mono(term));
    }

    /// Bind a function, generalized over its declared type parameters
    /// so every call site instantiates fresh copies.
    pub fn bind_func(
        &mut self,
        name: &str,
        params: &[Type],
        results: &[Type],
        type_params: &[String],
    ) {
        let mut vars = FxHashMap::default();
        let mut quantified = Vec::new();
        for tp in type_params {
            let fresh = self.ctx.fresh_var();
            if let Ty::Var(v) = fresh {
                quantified.push(v);
            }
            vars.insert(tp.clone(), fresh);
        }
        let sig = Type::Func {
            params: params.to_vec(),
            results: results.to_vec(),
        };
        let ty = Ty::from_type(&sig, &vars);
        self.env.define(
            name,
            Scheme {
                vars: quantified,
                ty,
            },
        );
    }

    /// Infer the semantic type of an expression.
    pub fn infer_expr(&mut self, expr: &Expr) -> Result<Type, InferError> {
        let term = self.infer_term(expr, None)?;
        Ok(term.to_type(&mut self.ctx))
    }

    /// Infer the result type of an `if` expression: the condition must
    /// be boolean and the two branches must reconcile.
    pub fn infer_if(
        &mut self,
        cond: &Expr,
        then: &Expr,
        else_: &Expr,
    ) -> Result<Type, InferError> {
        let cond_ty = self.infer_term(cond, None)?;
        self.ctx.unify(cond_ty, Ty::con("bool"))?;
        let then_ty = self.infer_term(then, None)?;
        let else_ty = self.infer_term(else_, None)?;
        self.ctx.unify(then_ty.clone(), else_ty)?;
        Ok(then_ty.to_type(&mut self.ctx))
    }

    /// Reconcile two already-computed semantic types (match arms).
    pub fn unify_types(&mut self, a: &Type, b: &Type) -> Result<Type, InferError> {
        let none = FxHashMap::default();
        let ta = Ty::from_type(a, &none);
        let tb = Ty::from_type(b, &none);
        self.ctx.unify(ta.clone(), tb)?;
        Ok(ta.to_type(&mut self.ctx))
    }

    // ── Term-level inference ───────────────────────────────────────────

    /// The manual-inference shortcut: a monomorphic answer for
    /// expressions whose type is locally determinable. `None` means the
    /// full walk must run.
    fn manual(&mut self, expr: &Expr) -> Option<Ty> {
        match expr {
            Expr::Lit(lit) => Some(lit_term(lit)),
            Expr::Ident(id) => {
                let scheme = self.env.lookup(&id.name)?;
                if scheme.vars.is_empty() {
                    Some(scheme.ty.clone())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn infer_term(&mut self, expr: &Expr, expected: Option<&Ty>) -> Result<Ty, InferError> {
        if let Some(ty) = self.manual(expr) {
            return Ok(ty);
        }
        match expr {
            Expr::Lit(lit) => Ok(lit_term(lit)),

            Expr::Ident(id) => {
                let scheme = self
                    .env
                    .lookup(&id.name)
                    .cloned()
                    .ok_or_else(|| InferError::UnknownIdent(id.name.clone()))?;
                Ok(self.ctx.instantiate(&scheme))
            }

            Expr::Paren(inner, _) => self.infer_term(inner, expected),

            Expr::Unary(u) => {
                let operand = self.infer_term(&u.expr, None)?;
                Ok(match u.op {
                    UnaryOp::Not => Ty::con("bool"),
                    UnaryOp::Ref => Ty::App("*".into(), vec![operand]),
                    UnaryOp::Deref => match self.ctx.resolve(operand) {
                        Ty::App(head, mut args) if head == "*" && args.len() == 1 => {
                            args.remove(0)
                        }
                        _ => Ty::any(),
                    },
                    UnaryOp::Pos | UnaryOp::Neg | UnaryOp::BitNot => operand,
                })
            }

            Expr::Binary(b) => {
                let lhs = self.infer_term(&b.lhs, None)?;
                let rhs = self.infer_term(&b.rhs, None)?;
                // Operands of every builtin operator share a type; the
                // unification may fail for mixed numeric literals, which
                // the target compiler tolerates, so it is best-effort.
                let _ = self.ctx.unify(lhs.clone(), rhs);
                Ok(match b.op {
                    BinaryOp::Eq
                    | BinaryOp::Ne
                    | BinaryOp::Lt
                    | BinaryOp::Gt
                    | BinaryOp::Le
                    | BinaryOp::Ge
                    | BinaryOp::And
                    | BinaryOp::Or => Ty::con("bool"),
                    _ => self.ctx.resolve(lhs),
                })
            }

            Expr::Call(call) => {
                let callee = self.infer_term(&call.callee, None)?;
                match self.ctx.resolve(callee) {
                    Ty::Fun(params, ret) => {
                        if params.len() != call.args.len() {
                            return Err(InferError::ArityMismatch {
                                expected: params.len(),
                                found: call.args.len(),
                            });
                        }
                        for (param, arg) in params.iter().zip(call.args.iter()) {
                            let arg_ty = self.infer_term(&arg.value, Some(param))?;
                            self.ctx.unify(arg_ty, param.clone())?;
                        }
                        Ok(*ret)
                    }
                    Ty::Var(v) => {
                        // Unknown callee: constrain it to a fresh
                        // function type of the right arity.
                        let mut params = Vec::new();
                        for arg in &call.args {
                            let arg_ty = self.infer_term(&arg.value, None)?;
                            params.push(arg_ty);
                        }
                        let ret = self.ctx.fresh_var();
                        self.ctx
                            .unify(Ty::Var(v), Ty::Fun(params, Box::new(ret.clone())))?;
                        Ok(ret)
                    }
                    other if other.is_any() => Ok(Ty::any()),
                    other => Err(InferError::NotAFunction(format!("{}", other))),
                }
            }

            Expr::Lambda(lambda) => self.infer_lambda(lambda, expected),

            Expr::If(ife) => {
                let cond = self.infer_term(&ife.cond, None)?;
                self.ctx.unify(cond, Ty::con("bool"))?;
                let then = self.infer_term(&ife.then, expected)?;
                let else_ = self.infer_term(&ife.else_, expected)?;
                self.ctx.unify(then.clone(), else_)?;
                Ok(then)
            }

            Expr::Member(_) => Err(InferError::Unsupported("member access")),
            Expr::Index(_) => Err(InferError::Unsupported("index expression")),
            Expr::Match(_) => Err(InferError::Unsupported("match expression")),
            Expr::PartialFn(_) => Err(InferError::Unsupported("partial function")),
            Expr::Composite(_) => Err(InferError::Unsupported("composite literal")),
        }
    }

    /// Infer a lambda, seeding parameter types from the expected
    /// function type where the programmer omitted annotations.
    fn infer_lambda(
        &mut self,
        lambda: &LambdaExpr,
        expected: Option<&Ty>,
    ) -> Result<Ty, InferError> {
        let expected_params: Vec<Option<Ty>> = match expected.map(|e| self.ctx.resolve(e.clone()))
        {
            Some(Ty::Fun(params, _)) if params.len() == lambda.params.len() => {
                params.into_iter().map(Some).collect()
            }
            _ => vec![None; lambda.params.len()],
        };

        self.env.push();
        let none = FxHashMap::default();
        let mut param_terms = Vec::with_capacity(lambda.params.len());
        for (param, seeded) in lambda.params.iter().zip(expected_params) {
            let term = match &param.ty {
                Some(te) => Ty::from_type(&Type::from_type_expr(te), &none),
                None => seeded.unwrap_or_else(|| self.ctx.fresh_var()),
            };
            self.env.define(&param.name, Scheme::mono(term.clone()));
            param_terms.push(term);
        }

        let body_ty = match &lambda.body {
            FuncBody::Expr(expr) => self.infer_term(expr, None),
            FuncBody::Block(block) => Ok(self.infer_block_result(block)),
        };
        self.env.pop();
        let body_ty = body_ty?;

        let ret = match &lambda.ret {
            Some(te) => {
                let declared = Ty::from_type(&Type::from_type_expr(te), &none);
                // Declared types win; the body just has to agree.
                self.ctx.unify(body_ty, declared.clone())?;
                declared
            }
            None => body_ty,
        };
        Ok(Ty::Fun(param_terms, Box::new(ret)))
    }

    /// Best-effort result type of a block body: the type of the last
    /// `return expr` at the top level of the block, if inferable.
    fn infer_block_result(&mut self, block: &gala_syntax::ast::Block) -> Ty {
        for stmt in block.stmts.iter().rev() {
            if let Stmt::Return(Some(expr), _) = stmt {
                if let Ok(ty) = self.infer_term(expr, None) {
                    return ty;
                }
            }
        }
        Ty::any()
    }
}

impl Default for Inferer {
    fn default() -> Self {
        Self::new()
    }
}

fn lit_term(lit: &Lit) -> Ty {
    match lit.kind {
        LitKind::Int => Ty::con("int"),
        LitKind::Float => Ty::con("float64"),
        LitKind::Str | LitKind::RawStr => Ty::con("string"),
        LitKind::Char => Ty::con("rune"),
        LitKind::Bool => Ty::con("bool"),
        LitKind::Nil => Ty::con("nil"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_syntax::build::*;

    #[test]
    fn literal_fast_path() {
        let mut inf = Inferer::new();
        assert_eq!(inf.infer_expr(&int("42")).unwrap(), Type::basic("int"));
        assert_eq!(
            inf.infer_expr(&str_lit("hi")).unwrap(),
            Type::basic("string")
        );
        assert_eq!(inf.infer_expr(&nil()).unwrap(), Type::Nil);
    }

    #[test]
    fn ident_lookup_and_unknown() {
        let mut inf = Inferer::new();
        inf.bind_mono("x", &Type::basic("int"));
        assert_eq!(inf.infer_expr(&ident("x")).unwrap(), Type::basic("int"));
        assert_eq!(
            inf.infer_expr(&ident("y")).unwrap_err(),
            InferError::UnknownIdent("y".into())
        );
    }

    #[test]
    fn binary_comparison_is_bool() {
        let mut inf = Inferer::new();
        inf.bind_mono("x", &Type::basic("int"));
        let e = binary(BinaryOp::Lt, ident("x"), int("3"));
        assert_eq!(inf.infer_expr(&e).unwrap(), Type::basic("bool"));
    }

    #[test]
    fn call_of_generic_function_instantiates() {
        let mut inf = Inferer::new();
        // identity: func[T](v T) T
        inf.bind_func(
            "identity",
            &[Type::named("", "T")],
            &[Type::named("", "T")],
            &["T".to_string()],
        );
        let e = call(ident("identity"), vec![int("1")]);
        assert_eq!(inf.infer_expr(&e).unwrap(), Type::basic("int"));
        // A second instantiation is independent.
        let e2 = call(ident("identity"), vec![str_lit("s")]);
        assert_eq!(inf.infer_expr(&e2).unwrap(), Type::basic("string"));
    }

    #[test]
    fn lambda_params_reconstructed_from_expectation() {
        let mut inf = Inferer::new();
        // apply: func(f func(int) int, v int) int
        inf.bind_func(
            "apply",
            &[
                Type::Func {
                    params: vec![Type::basic("int")],
                    results: vec![Type::basic("int")],
                },
                Type::basic("int"),
            ],
            &[Type::basic("int")],
            &[],
        );
        let e = call(
            ident("apply"),
            vec![lambda(&["v"], ident("v")), int("3")],
        );
        assert_eq!(inf.infer_expr(&e).unwrap(), Type::basic("int"));
    }

    #[test]
    fn if_expression_reconciles_branches() {
        let mut inf = Inferer::new();
        let ty = inf
            .infer_if(&bool_lit(true), &int("1"), &int("2"))
            .unwrap();
        assert_eq!(ty, Type::basic("int"));

        let err = inf
            .infer_if(&bool_lit(true), &int("1"), &str_lit("x"))
            .unwrap_err();
        assert!(matches!(err, InferError::Mismatch { .. }));
    }

    #[test]
    fn expected_lambda_signature_projects_func() {
        let f = Type::Func {
            params: vec![Type::basic("int"), Type::basic("string")],
            results: vec![Type::basic("bool")],
        };
        let (params, ret) = expected_lambda_signature(&f, 2).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(ret, Some(Type::basic("bool")));
        assert!(expected_lambda_signature(&f, 1).is_none());
        assert!(expected_lambda_signature(&Type::basic("int"), 2).is_none());
    }
}
