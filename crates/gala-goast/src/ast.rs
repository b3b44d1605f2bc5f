//! Go AST node definitions.

use serde::Serialize;

// ── File level ─────────────────────────────────────────────────────────

/// An ordered collection of emitted files, one per compilation unit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSet {
    pub files: Vec<(String, File)>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, file: File) {
        self.files.push((name.into(), file));
    }
}

/// One emitted Go source file.
#[derive(Debug, Clone, Serialize)]
pub struct File {
    pub package: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

/// An import spec. An alias of `"."` is a dot import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpec {
    pub path: String,
    pub alias: Option<String>,
}

impl ImportSpec {
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    pub fn aliased(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn dot(path: impl Into<String>) -> Self {
        Self::aliased(path, ".")
    }
}

// ── Declarations ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeDecl),
    Var(VarSpec),
    Const(ConstDecl),
}

#[derive(Debug, Clone, Serialize)]
pub struct FuncDecl {
    pub name: String,
    /// Method receiver, if any.
    pub recv: Option<Field>,
    pub type_params: Vec<Field>,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Vec<Field>,
    /// The defined type: a `StructType`, `InterfaceType`, or any type expr.
    pub ty: Expr,
}

/// `var names ty = values`. Doubles as a declaration statement.
#[derive(Debug, Clone, Serialize)]
pub struct VarSpec {
    pub names: Vec<String>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
}

/// A `const (...)` block; used for sealed variant tags.
#[derive(Debug, Clone, Serialize)]
pub struct ConstDecl {
    pub specs: Vec<ConstSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstSpec {
    pub names: Vec<String>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
}

/// A parameter, result, struct field, or type-parameter entry.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Zero names for anonymous results, one for the common case.
    pub names: Vec<String>,
    pub ty: Expr,
}

impl Field {
    pub fn named(name: impl Into<String>, ty: Expr) -> Self {
        Self {
            names: vec![name.into()],
            ty,
        }
    }

    pub fn anon(ty: Expr) -> Self {
        Self {
            names: Vec::new(),
            ty,
        }
    }
}

// ── Statements ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    Expr(Expr),
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    Return(Vec<Expr>),
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    Switch(SwitchStmt),
    IncDec {
        expr: Expr,
        inc: bool,
    },
    Block(Block),
    /// A block-level `var` declaration.
    Var(VarSpec),
}

impl Stmt {
    /// `lhs := rhs` shorthand.
    pub fn define(lhs: Expr, rhs: Expr) -> Stmt {
        Stmt::Assign {
            lhs: vec![lhs],
            op: AssignOp::Define,
            rhs: vec![rhs],
        }
    }

    /// `return expr` shorthand.
    pub fn ret(expr: Expr) -> Stmt {
        Stmt::Return(vec![expr])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignOp {
    Assign,
    Define,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Define => ":=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IfStmt {
    /// Optional init statement: `if init; cond { ... }`.
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub else_: Option<Box<ElseBranch>>,
}

impl IfStmt {
    /// A plain `if cond { ... }` with no init and no else.
    pub fn new(cond: Expr, then: Block) -> Self {
        IfStmt {
            init: None,
            cond,
            then,
            else_: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum ElseBranch {
    If(IfStmt),
    Block(Block),
}

#[derive(Debug, Clone, Serialize)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeStmt {
    pub key: Option<String>,
    pub value: Option<String>,
    pub expr: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchStmt {
    pub tag: Option<Expr>,
    pub cases: Vec<SwitchCase>,
}

/// One `case` clause; empty `exprs` is the `default` clause.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchCase {
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
}

// ── Expressions ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Ident(String),
    BasicLit(LitKind, String),
    Selector {
        recv: Box<Expr>,
        name: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        recv: Box<Expr>,
        index: Box<Expr>,
    },
    IndexList {
        recv: Box<Expr>,
        indices: Vec<Expr>,
    },
    Unary {
        op: &'static str,
        expr: Box<Expr>,
    },
    Binary {
        op: &'static str,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `*T` -- pointer type or dereference, position decides.
    Star(Box<Expr>),
    /// `recv.(T)` type assertion.
    TypeAssert {
        recv: Box<Expr>,
        ty: Box<Expr>,
    },
    Composite {
        ty: Option<Box<Expr>>,
        elems: Vec<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncLit {
        params: Vec<Field>,
        results: Vec<Field>,
        body: Block,
    },
    Paren(Box<Expr>),
    ArrayType(Box<Expr>),
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    FuncType {
        params: Vec<Field>,
        results: Vec<Field>,
    },
    StructType {
        fields: Vec<Field>,
    },
    InterfaceType {
        methods: Vec<InterfaceMethod>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LitKind {
    Int,
    Float,
    Str,
    Char,
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(name.into())
    }

    pub fn int_lit(value: impl Into<String>) -> Expr {
        Expr::BasicLit(LitKind::Int, value.into())
    }

    /// A string literal; `value` is the unquoted content.
    pub fn str_lit(value: &str) -> Expr {
        Expr::BasicLit(LitKind::Str, format!("{:?}", value))
    }

    pub fn sel(recv: Expr, name: impl Into<String>) -> Expr {
        Expr::Selector {
            recv: Box::new(recv),
            name: name.into(),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn key_value(key: Expr, value: Expr) -> Expr {
        Expr::KeyValue {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn binary(op: &'static str, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn index(recv: Expr, index: Expr) -> Expr {
        Expr::Index {
            recv: Box::new(recv),
            index: Box::new(index),
        }
    }

    /// `recv.Method(args)` shorthand.
    pub fn method_call(recv: Expr, method: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::call(Expr::sel(recv, method), args)
    }
}
