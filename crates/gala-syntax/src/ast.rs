//! Parse-tree node definitions.
//!
//! The tree is fully owned: no interning, no arenas, no parent pointers.
//! A [`SourceFile`] is one compilation unit; the analyzer groups files
//! into packages by their declared package name.

use gala_common::Span;
use serde::Serialize;

// ── Compilation unit ───────────────────────────────────────────────────

/// One parsed source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    /// Declared package name (`package foo`).
    pub package: String,
    pub decls: Vec<Decl>,
    pub span: Span,
}

// ── Declarations ───────────────────────────────────────────────────────

/// A top-level or block-level declaration.
#[derive(Debug, Clone, Serialize)]
pub enum Decl {
    Import(ImportDecl),
    Val(ValDecl),
    Var(VarDecl),
    Func(FuncDecl),
    Struct(StructDecl),
    Interface(InterfaceDecl),
    Sealed(SealedDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Import(d) => d.span,
            Decl::Val(d) => d.span,
            Decl::Var(d) => d.span,
            Decl::Func(d) => d.span,
            Decl::Struct(d) => d.span,
            Decl::Interface(d) => d.span,
            Decl::Sealed(d) => d.span,
        }
    }
}

/// An `import (...)` declaration with one or more specs.
#[derive(Debug, Clone, Serialize)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    pub span: Span,
}

/// A single import spec. `alias` of `"."` marks a dot (wildcard) import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSpec {
    pub path: String,
    pub alias: Option<String>,
    pub span: Span,
}

impl ImportSpec {
    /// Whether this spec is a wildcard import injecting the package's
    /// exported names into the current namespace.
    pub fn is_dot(&self) -> bool {
        self.alias.as_deref() == Some(".")
    }
}

/// `val x = e` or `val x T = e` -- an immutable binding.
#[derive(Debug, Clone, Serialize)]
pub struct ValDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Expr,
    pub span: Span,
}

/// `var x = e`, `var x T = e`, or `var x T` -- a mutable binding.
#[derive(Debug, Clone, Serialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// A function or method declaration.
#[derive(Debug, Clone, Serialize)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
    pub body: FuncBody,
    pub span: Span,
}

/// A method receiver: `func (c Container[T]) Map(...)`.
#[derive(Debug, Clone, Serialize)]
pub struct Receiver {
    pub name: String,
    pub ty: TypeExpr,
}

/// A declared type parameter with its constraint (defaults to `any`).
#[derive(Debug, Clone, Serialize)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<TypeExpr>,
}

/// A named, typed function parameter.
#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
}

/// A function body: a block, or the expression form `= expr`.
#[derive(Debug, Clone, Serialize)]
pub enum FuncBody {
    Block(Block),
    Expr(Box<Expr>),
}

/// A struct declaration. Both the long form and the case-class shorthand
/// `struct Point(x int, y int)` normalize to this node; per-field
/// mutability is `val` (immutable) unless the field is declared `var`.
#[derive(Debug, Clone, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

/// A struct or variant field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    /// True for `var` fields; false for the `val` default.
    pub mutable: bool,
    pub span: Span,
}

/// An interface declaration; passes through to the target with its
/// method set lowered.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub methods: Vec<MethodSig>,
    pub span: Span,
}

/// A method signature inside an interface.
#[derive(Debug, Clone, Serialize)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
    pub span: Span,
}

/// `sealed Shape = Circle(r int) | Rectangle(w int, h int)`.
#[derive(Debug, Clone, Serialize)]
pub struct SealedDecl {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub variants: Vec<Variant>,
    pub span: Span,
}

/// One variant of a sealed union.
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

// ── Statements ─────────────────────────────────────────────────────────

/// A `{ ... }` block.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    /// A block-level `val`/`var` (or nested declaration).
    Decl(Decl),
    Assign(AssignStmt),
    Expr(Expr),
    Return(Option<Expr>, Span),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Block(Block),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl(d) => d.span(),
            Stmt::Assign(s) => s.span,
            Stmt::Expr(e) => e.span(),
            Stmt::Return(_, span) => *span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Block(b) => b.span,
        }
    }
}

/// `lhs = rhs`, `lhs += rhs`, ...
#[derive(Debug, Clone, Serialize)]
pub struct AssignStmt {
    pub lhs: Expr,
    pub op: AssignOp,
    pub rhs: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then: Block,
    pub else_: Option<Box<ElseArm>>,
    pub span: Span,
}

/// The `else` continuation of an `if` statement.
#[derive(Debug, Clone, Serialize)]
pub enum ElseArm {
    If(IfStmt),
    Block(Block),
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Block,
    pub span: Span,
}

/// A Go-style three-clause `for` loop. All clauses optional.
#[derive(Debug, Clone, Serialize)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

// ── Expressions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Ident(Ident),
    Lit(Lit),
    Unary(UnaryExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
    Member(MemberExpr),
    Index(IndexExpr),
    Lambda(LambdaExpr),
    PartialFn(PartialFnExpr),
    If(IfExpr),
    Match(MatchExpr),
    Composite(CompositeLit),
    Paren(Box<Expr>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(e) => e.span,
            Expr::Lit(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Lambda(e) => e.span,
            Expr::PartialFn(e) => e.span,
            Expr::If(e) => e.span,
            Expr::Match(e) => e.span,
            Expr::Composite(e) => e.span,
            Expr::Paren(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// A literal token. `text` is the lexeme as written in source.
#[derive(Debug, Clone, Serialize)]
pub struct Lit {
    pub kind: LitKind,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LitKind {
    Int,
    Float,
    Str,
    RawStr,
    Char,
    Bool,
    Nil,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
    BitNot,
    Ref,
    Deref,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

/// `callee[Targs](args)`. Arguments may be named (`x = expr`).
#[derive(Debug, Clone, Serialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Arg>,
    pub span: Span,
}

/// One call argument, positional (`name` empty) or named.
#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Arg { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Arg {
            name: Some(name.into()),
            value,
        }
    }
}

/// `recv.name` member access.
#[derive(Debug, Clone, Serialize)]
pub struct MemberExpr {
    pub recv: Box<Expr>,
    pub name: String,
    pub span: Span,
}

/// `recv[i]` or `recv[i, j]` indexing.
#[derive(Debug, Clone, Serialize)]
pub struct IndexExpr {
    pub recv: Box<Expr>,
    pub indices: Vec<Expr>,
    pub span: Span,
}

/// A lambda `(a, b) => expr` or `(a int) => { ... }`. Parameter types may
/// be omitted and reconstructed from the expected function type.
#[derive(Debug, Clone, Serialize)]
pub struct LambdaExpr {
    pub params: Vec<LambdaParam>,
    pub ret: Option<TypeExpr>,
    pub body: FuncBody,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct LambdaParam {
    pub name: String,
    pub ty: Option<TypeExpr>,
}

/// A partial-function literal `{ case p1 => r1; ... }` used directly as
/// a function value. Lowers to a single-parameter function whose body
/// matches on its argument; the parameter and return types are
/// reconstructed from the expected function type at the use site.
#[derive(Debug, Clone, Serialize)]
pub struct PartialFnExpr {
    pub arms: Vec<MatchArm>,
    pub span: Span,
}

/// An `if` in expression position. Lowered to an immediately invoked
/// function literal.
#[derive(Debug, Clone, Serialize)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then: Box<Expr>,
    pub else_: Box<Expr>,
    pub span: Span,
}

/// `e match { case p => r ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct MatchExpr {
    pub scrutinee: Box<Expr>,
    pub arms: Vec<MatchArm>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Span,
}

/// A composite literal in expression position: `T{...}`, `[]T{...}`,
/// `map[K]V{...}`. Only the struct form is legal in Gala expression
/// position; the slice and map forms are rejected by the transformer.
#[derive(Debug, Clone, Serialize)]
pub struct CompositeLit {
    pub ty: TypeExpr,
    pub elems: Vec<CompositeElem>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositeElem {
    pub key: Option<String>,
    pub value: Expr,
}

// ── Patterns ───────────────────────────────────────────────────────────

/// A pattern in a `case` arm.
#[derive(Debug, Clone, Serialize)]
pub enum Pattern {
    /// `_` -- matches anything, binds nothing. The mandatory default arm.
    Wildcard(Span),
    /// A literal pattern, matched by equality.
    Lit(Lit),
    /// A binder, optionally narrowed by a type annotation: `y` or `y: T`.
    Bind {
        name: String,
        ty: Option<TypeExpr>,
        span: Span,
    },
    /// A constructor pattern `C(p1, ..., pn)` destructured via `Unapply`.
    Ctor {
        name: String,
        args: Vec<Pattern>,
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard(span) => *span,
            Pattern::Lit(l) => l.span,
            Pattern::Bind { span, .. } => *span,
            Pattern::Ctor { span, .. } => *span,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Pattern::Wildcard(_))
    }
}

// ── Surface type syntax ────────────────────────────────────────────────

/// A type as written in source. Converted to the semantic [`Type`] model
/// by [`Type::from_type_expr`].
///
/// [`Type`]: crate::ty::Type
/// [`Type::from_type_expr`]: crate::ty::Type::from_type_expr
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExpr {
    /// `Name` or `pkg.Name`.
    Name {
        pkg: Option<String>,
        name: String,
        span: Span,
    },
    /// `Base[A, B]` generic application.
    Generic {
        base: Box<TypeExpr>,
        args: Vec<TypeExpr>,
        span: Span,
    },
    /// `*T`.
    Pointer(Box<TypeExpr>, Span),
    /// `[]T`.
    Slice(Box<TypeExpr>, Span),
    /// `map[K]V`.
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
        span: Span,
    },
    /// `func(params) results`.
    Func {
        params: Vec<TypeExpr>,
        results: Vec<TypeExpr>,
        span: Span,
    },
    /// The empty result list of a void function.
    Unit(Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Name { span, .. } => *span,
            TypeExpr::Generic { span, .. } => *span,
            TypeExpr::Pointer(_, span) => *span,
            TypeExpr::Slice(_, span) => *span,
            TypeExpr::Map { span, .. } => *span,
            TypeExpr::Func { span, .. } => *span,
            TypeExpr::Unit(span) => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::*;

    #[test]
    fn import_spec_dot_detection() {
        let spec = ImportSpec {
            path: "galalang.org/geo/shapes".into(),
            alias: Some(".".into()),
            span: Span::zero(),
        };
        assert!(spec.is_dot());
        let plain = ImportSpec {
            path: "fmt".into(),
            alias: None,
            span: Span::zero(),
        };
        assert!(!plain.is_dot());
    }

    #[test]
    fn spans_propagate_through_wrappers() {
        let e = binary(BinaryOp::Add, int("1"), int("2"));
        assert_eq!(e.span(), Span::zero());
        let p = pat_ctor("Some", vec![pat_bind("y")]);
        assert!(!p.is_wildcard());
        assert!(pat_wild().is_wildcard());
    }

    #[test]
    fn trees_serialize_to_json() {
        let decl = val("x", call(ident("Point"), vec![int("3"), int("4")]));
        let json = serde_json::to_value(&decl).expect("AST nodes serialize");
        assert!(json.to_string().contains("Point"));
    }
}
