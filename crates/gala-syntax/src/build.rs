//! Terse constructors for building parse trees in tests.
//!
//! The parser collaborator is not part of this workspace, so tests
//! construct trees directly. These helpers keep that construction close
//! to the shape of the source it stands for. All spans are zero.

use gala_common::Span;

use crate::ast::*;

// ── Types ──────────────────────────────────────────────────────────────

/// `Name` or a builtin like `int`.
pub fn tname(name: &str) -> TypeExpr {
    TypeExpr::Name {
        pkg: None,
        name: name.into(),
        span: Span::zero(),
    }
}

/// `pkg.Name`.
pub fn tqual(pkg: &str, name: &str) -> TypeExpr {
    TypeExpr::Name {
        pkg: Some(pkg.into()),
        name: name.into(),
        span: Span::zero(),
    }
}

/// `Base[A, B]`.
pub fn tgen(base: TypeExpr, args: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Generic {
        base: Box::new(base),
        args,
        span: Span::zero(),
    }
}

/// `*T`.
pub fn tptr(elem: TypeExpr) -> TypeExpr {
    TypeExpr::Pointer(Box::new(elem), Span::zero())
}

/// `[]T`.
pub fn tslice(elem: TypeExpr) -> TypeExpr {
    TypeExpr::Slice(Box::new(elem), Span::zero())
}

/// `func(params) results`.
pub fn tfunc(params: Vec<TypeExpr>, results: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr::Func {
        params,
        results,
        span: Span::zero(),
    }
}

// ── Expressions ────────────────────────────────────────────────────────

pub fn ident(name: &str) -> Expr {
    Expr::Ident(Ident {
        name: name.into(),
        span: Span::zero(),
    })
}

pub fn int(text: &str) -> Expr {
    Expr::Lit(Lit {
        kind: LitKind::Int,
        text: text.into(),
        span: Span::zero(),
    })
}

pub fn float(text: &str) -> Expr {
    Expr::Lit(Lit {
        kind: LitKind::Float,
        text: text.into(),
        span: Span::zero(),
    })
}

pub fn str_lit(text: &str) -> Expr {
    Expr::Lit(Lit {
        kind: LitKind::Str,
        text: text.into(),
        span: Span::zero(),
    })
}

pub fn bool_lit(value: bool) -> Expr {
    Expr::Lit(Lit {
        kind: LitKind::Bool,
        text: if value { "true".into() } else { "false".into() },
        span: Span::zero(),
    })
}

pub fn nil() -> Expr {
    Expr::Lit(Lit {
        kind: LitKind::Nil,
        text: "nil".into(),
        span: Span::zero(),
    })
}

pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span: Span::zero(),
    })
}

pub fn unary(op: UnaryOp, expr: Expr) -> Expr {
    Expr::Unary(UnaryExpr {
        op,
        expr: Box::new(expr),
        span: Span::zero(),
    })
}

pub fn member(recv: Expr, name: &str) -> Expr {
    Expr::Member(MemberExpr {
        recv: Box::new(recv),
        name: name.into(),
        span: Span::zero(),
    })
}

/// Positional call `callee(args)`.
pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr {
        callee: Box::new(callee),
        type_args: Vec::new(),
        args: args.into_iter().map(Arg::positional).collect(),
        span: Span::zero(),
    })
}

/// Call with explicit type arguments `callee[T](args)`.
pub fn call_targs(callee: Expr, type_args: Vec<TypeExpr>, args: Vec<Expr>) -> Expr {
    Expr::Call(CallExpr {
        callee: Box::new(callee),
        type_args,
        args: args.into_iter().map(Arg::positional).collect(),
        span: Span::zero(),
    })
}

/// Call with explicit `Arg` values for named-argument forms.
pub fn call_args(callee: Expr, args: Vec<Arg>) -> Expr {
    Expr::Call(CallExpr {
        callee: Box::new(callee),
        type_args: Vec::new(),
        args,
        span: Span::zero(),
    })
}

pub fn index(recv: Expr, indices: Vec<Expr>) -> Expr {
    Expr::Index(IndexExpr {
        recv: Box::new(recv),
        indices,
        span: Span::zero(),
    })
}

/// `(params) => expr` with untyped parameters.
pub fn lambda(params: &[&str], body: Expr) -> Expr {
    Expr::Lambda(LambdaExpr {
        params: params
            .iter()
            .map(|p| LambdaParam {
                name: (*p).into(),
                ty: None,
            })
            .collect(),
        ret: None,
        body: FuncBody::Expr(Box::new(body)),
        span: Span::zero(),
    })
}

pub fn if_expr(cond: Expr, then: Expr, else_: Expr) -> Expr {
    Expr::If(IfExpr {
        cond: Box::new(cond),
        then: Box::new(then),
        else_: Box::new(else_),
        span: Span::zero(),
    })
}

pub fn match_expr(scrutinee: Expr, arms: Vec<MatchArm>) -> Expr {
    Expr::Match(MatchExpr {
        scrutinee: Box::new(scrutinee),
        arms,
        span: Span::zero(),
    })
}

/// `{ case p1 => r1; ... }` as a function value.
pub fn partial_fn(arms: Vec<MatchArm>) -> Expr {
    Expr::PartialFn(PartialFnExpr {
        arms,
        span: Span::zero(),
    })
}

pub fn arm(pattern: Pattern, body: Expr) -> MatchArm {
    MatchArm {
        pattern,
        body,
        span: Span::zero(),
    }
}

// ── Patterns ───────────────────────────────────────────────────────────

pub fn pat_wild() -> Pattern {
    Pattern::Wildcard(Span::zero())
}

pub fn pat_bind(name: &str) -> Pattern {
    Pattern::Bind {
        name: name.into(),
        ty: None,
        span: Span::zero(),
    }
}

pub fn pat_bind_typed(name: &str, ty: TypeExpr) -> Pattern {
    Pattern::Bind {
        name: name.into(),
        ty: Some(ty),
        span: Span::zero(),
    }
}

pub fn pat_int(text: &str) -> Pattern {
    Pattern::Lit(Lit {
        kind: LitKind::Int,
        text: text.into(),
        span: Span::zero(),
    })
}

pub fn pat_ctor(name: &str, args: Vec<Pattern>) -> Pattern {
    Pattern::Ctor {
        name: name.into(),
        args,
        span: Span::zero(),
    }
}

// ── Declarations and statements ────────────────────────────────────────

pub fn val(name: &str, init: Expr) -> Decl {
    Decl::Val(ValDecl {
        name: name.into(),
        ty: None,
        init,
        span: Span::zero(),
    })
}

pub fn val_typed(name: &str, ty: TypeExpr, init: Expr) -> Decl {
    Decl::Val(ValDecl {
        name: name.into(),
        ty: Some(ty),
        init,
        span: Span::zero(),
    })
}

pub fn var(name: &str, init: Expr) -> Decl {
    Decl::Var(VarDecl {
        name: name.into(),
        ty: None,
        init: Some(init),
        span: Span::zero(),
    })
}

pub fn var_typed(name: &str, ty: TypeExpr, init: Option<Expr>) -> Decl {
    Decl::Var(VarDecl {
        name: name.into(),
        ty: Some(ty),
        init,
        span: Span::zero(),
    })
}

pub fn field(name: &str, ty: TypeExpr) -> FieldDef {
    FieldDef {
        name: name.into(),
        ty,
        mutable: false,
        span: Span::zero(),
    }
}

pub fn field_var(name: &str, ty: TypeExpr) -> FieldDef {
    FieldDef {
        name: name.into(),
        ty,
        mutable: true,
        span: Span::zero(),
    }
}

pub fn struct_decl(name: &str, fields: Vec<FieldDef>) -> Decl {
    Decl::Struct(StructDecl {
        name: name.into(),
        type_params: Vec::new(),
        fields,
        span: Span::zero(),
    })
}

pub fn struct_decl_generic(name: &str, type_params: &[&str], fields: Vec<FieldDef>) -> Decl {
    Decl::Struct(StructDecl {
        name: name.into(),
        type_params: type_params
            .iter()
            .map(|p| TypeParam {
                name: (*p).into(),
                constraint: None,
            })
            .collect(),
        fields,
        span: Span::zero(),
    })
}

pub fn variant(name: &str, fields: Vec<FieldDef>) -> Variant {
    Variant {
        name: name.into(),
        fields,
        span: Span::zero(),
    }
}

pub fn sealed_decl(name: &str, variants: Vec<Variant>) -> Decl {
    Decl::Sealed(SealedDecl {
        name: name.into(),
        type_params: Vec::new(),
        variants,
        span: Span::zero(),
    })
}

pub fn param(name: &str, ty: TypeExpr) -> Param {
    Param {
        name: name.into(),
        ty,
    }
}

/// A free function with a block body.
pub fn func(name: &str, params: Vec<Param>, results: Vec<TypeExpr>, stmts: Vec<Stmt>) -> Decl {
    Decl::Func(FuncDecl {
        name: name.into(),
        receiver: None,
        type_params: Vec::new(),
        params,
        results,
        body: FuncBody::Block(Block {
            stmts,
            span: Span::zero(),
        }),
        span: Span::zero(),
    })
}

/// A function with the expression body form `= expr`.
pub fn func_expr(name: &str, params: Vec<Param>, results: Vec<TypeExpr>, body: Expr) -> Decl {
    Decl::Func(FuncDecl {
        name: name.into(),
        receiver: None,
        type_params: Vec::new(),
        params,
        results,
        body: FuncBody::Expr(Box::new(body)),
        span: Span::zero(),
    })
}

/// A method with a receiver and expression body.
pub fn method_expr(
    recv_name: &str,
    recv_ty: TypeExpr,
    name: &str,
    type_params: &[&str],
    params: Vec<Param>,
    results: Vec<TypeExpr>,
    body: Expr,
) -> Decl {
    Decl::Func(FuncDecl {
        name: name.into(),
        receiver: Some(Receiver {
            name: recv_name.into(),
            ty: recv_ty,
        }),
        type_params: type_params
            .iter()
            .map(|p| TypeParam {
                name: (*p).into(),
                constraint: None,
            })
            .collect(),
        params,
        results,
        body: FuncBody::Expr(Box::new(body)),
        span: Span::zero(),
    })
}

pub fn import(path: &str) -> Decl {
    Decl::Import(ImportDecl {
        specs: vec![ImportSpec {
            path: path.into(),
            alias: None,
            span: Span::zero(),
        }],
        span: Span::zero(),
    })
}

pub fn import_aliased(path: &str, alias: &str) -> Decl {
    Decl::Import(ImportDecl {
        specs: vec![ImportSpec {
            path: path.into(),
            alias: Some(alias.into()),
            span: Span::zero(),
        }],
        span: Span::zero(),
    })
}

pub fn import_dot(path: &str) -> Decl {
    import_aliased(path, ".")
}

pub fn assign(lhs: Expr, rhs: Expr) -> Stmt {
    Stmt::Assign(AssignStmt {
        lhs,
        op: AssignOp::Assign,
        rhs,
        span: Span::zero(),
    })
}

pub fn ret(expr: Expr) -> Stmt {
    Stmt::Return(Some(expr), Span::zero())
}

pub fn file(package: &str, decls: Vec<Decl>) -> SourceFile {
    SourceFile {
        package: package.into(),
        decls,
        span: Span::zero(),
    }
}
