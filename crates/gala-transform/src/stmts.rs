//! Statement lowering.
//!
//! Blocks push and pop a scope frame on every exit path; `val`/`var`
//! bindings record themselves in both the scope stack and the inference
//! environment so later statements see them.

use gala_common::SourceError;
use gala_goast as goast;
use gala_syntax::ast::*;
use gala_syntax::Type;

use crate::Transformer;

impl Transformer<'_> {
    /// Lower a block in a fresh scope frame.
    pub(crate) fn block(&mut self, block: &Block) -> Result<goast::Block, SourceError> {
        self.scopes.push();
        self.inferer.push_scope();
        let result = self.block_inner(block);
        self.inferer.pop_scope();
        self.scopes.pop();
        result
    }

    /// Lower a block into the current scope frame (the caller already
    /// pushed one, e.g. for function parameters).
    pub(crate) fn block_inner(&mut self, block: &Block) -> Result<goast::Block, SourceError> {
        let mut stmts = Vec::new();
        for stmt in &block.stmts {
            stmts.extend(self.stmt(stmt)?);
        }
        Ok(goast::Block::new(stmts))
    }

    pub(crate) fn stmt(&mut self, stmt: &Stmt) -> Result<Vec<goast::Stmt>, SourceError> {
        match stmt {
            Stmt::Decl(Decl::Val(v)) => Ok(vec![self.val_stmt(v)?]),
            Stmt::Decl(Decl::Var(v)) => Ok(vec![self.var_stmt(v)?]),
            Stmt::Decl(other) => Err(self.err_at(
                other.span(),
                "only val and var declarations are allowed inside a block",
            )),
            Stmt::Assign(a) => Ok(vec![self.assign_stmt(a)?]),
            Stmt::Expr(e) => {
                let (go, _) = self.expr(e)?;
                Ok(vec![goast::Stmt::Expr(go)])
            }
            Stmt::Return(value, _) => {
                let values = match value {
                    Some(e) => vec![self.expr(e)?.0],
                    None => vec![],
                };
                Ok(vec![goast::Stmt::Return(values)])
            }
            Stmt::If(s) => Ok(vec![goast::Stmt::If(self.if_stmt(s)?)]),
            Stmt::While(s) => {
                let (cond, _) = self.expr(&s.cond)?;
                let body = self.block(&s.body)?;
                Ok(vec![goast::Stmt::For(goast::ForStmt {
                    init: None,
                    cond: Some(cond),
                    post: None,
                    body,
                })])
            }
            Stmt::For(s) => {
                // The init clause scopes over the whole loop.
                self.scopes.push();
                self.inferer.push_scope();
                let result = (|| {
                    let init = match &s.init {
                        Some(stmt) => Some(Box::new(self.simple_stmt(stmt)?)),
                        None => None,
                    };
                    let cond = match &s.cond {
                        Some(cond) => Some(self.expr(cond)?.0),
                        None => None,
                    };
                    let post = match &s.post {
                        Some(stmt) => Some(Box::new(self.simple_stmt(stmt)?)),
                        None => None,
                    };
                    let body = self.block_inner(&s.body)?;
                    Ok(goast::Stmt::For(goast::ForStmt {
                        init,
                        cond,
                        post,
                        body,
                    }))
                })();
                self.inferer.pop_scope();
                self.scopes.pop();
                Ok(vec![result?])
            }
            Stmt::Block(b) => Ok(vec![goast::Stmt::Block(self.block(b)?)]),
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) -> Result<goast::IfStmt, SourceError> {
        let (cond, _) = self.expr(&s.cond)?;
        let then = self.block(&s.then)?;
        let else_ = match &s.else_ {
            Some(arm) => Some(Box::new(match arm.as_ref() {
                ElseArm::If(inner) => goast::ElseBranch::If(self.if_stmt(inner)?),
                ElseArm::Block(b) => goast::ElseBranch::Block(self.block(b)?),
            })),
            None => None,
        };
        Ok(goast::IfStmt {
            init: None,
            cond,
            then,
            else_,
        })
    }

    /// A statement that must lower to exactly one Go statement (for
    /// loop clauses).
    fn simple_stmt(&mut self, stmt: &Stmt) -> Result<goast::Stmt, SourceError> {
        let mut lowered = self.stmt(stmt)?;
        if lowered.len() != 1 {
            return Err(self.err_at(stmt.span(), "unsupported statement in for clause"));
        }
        Ok(lowered.remove(0))
    }

    // ── Bindings ───────────────────────────────────────────────────────

    /// `val x = e` in block position: `x := NewImmutable(unwrap(e))`.
    pub(crate) fn val_stmt(&mut self, v: &ValDecl) -> Result<goast::Stmt, SourceError> {
        let (call, raw_ty) = self.val_init(v)?;
        self.scopes.declare(&v.name, true, raw_ty.clone());
        self.inferer.bind_mono(&v.name, &raw_ty);
        Ok(goast::Stmt::define(
            goast::Expr::ident(v.name.clone()),
            call,
        ))
    }

    /// Shared `val` lowering: the `NewImmutable(...)` call and the raw
    /// binding type recorded in scope.
    pub(crate) fn val_init(
        &mut self,
        v: &ValDecl,
    ) -> Result<(goast::Expr, Type), SourceError> {
        let declared = v.ty.as_ref().map(Type::from_type_expr);
        if let Some(ty) = &declared {
            if ty.is_immutable_wrapper() {
                return Err(self.err_at(
                    v.span,
                    format!("nested Immutable[Immutable[...]] is not allowed for {}", v.name),
                ));
            }
        }

        let (init, init_ty) = self.expr_expected(&v.init, declared.as_ref())?;
        let unwrapped_ty = init_ty.unwrap_immutable().clone();
        if unwrapped_ty.is_immutable_wrapper() {
            return Err(self.err_at(
                v.span,
                format!("nested Immutable[Immutable[...]] is not allowed for {}", v.name),
            ));
        }
        let init = self.unwrap_immutable_expr(init, &init_ty);
        let raw_ty = declared.clone().unwrap_or(unwrapped_ty);

        let ctor = self.rt("NewImmutable");
        let ctor = match &declared {
            // An explicit type pins the wrapper: NewImmutable[T](...).
            Some(ty) => {
                let go_ty = self.go_type(ty);
                goast::Expr::Index {
                    recv: Box::new(ctor),
                    index: Box::new(go_ty),
                }
            }
            None => ctor,
        };
        Ok((goast::Expr::call(ctor, vec![init]), raw_ty))
    }

    /// `var x = e` in block position.
    pub(crate) fn var_stmt(&mut self, v: &VarDecl) -> Result<goast::Stmt, SourceError> {
        let declared = v.ty.as_ref().map(Type::from_type_expr);
        let stmt = match (&v.init, &declared) {
            (Some(init), None) => {
                let (init, init_ty) = self.expr(init)?;
                self.scopes.declare(&v.name, false, init_ty.clone());
                self.inferer.bind_mono(&v.name, &init_ty);
                goast::Stmt::define(goast::Expr::ident(v.name.clone()), init)
            }
            (Some(init), Some(ty)) => {
                let (init, _) = self.expr_expected(init, Some(ty))?;
                let go_ty = self.go_type(ty);
                self.scopes.declare(&v.name, false, ty.clone());
                self.inferer.bind_mono(&v.name, ty);
                goast::Stmt::Var(goast::VarSpec {
                    names: vec![v.name.clone()],
                    ty: Some(go_ty),
                    values: vec![init],
                })
            }
            (None, Some(ty)) => {
                let go_ty = self.go_type(ty);
                self.scopes.declare(&v.name, false, ty.clone());
                self.inferer.bind_mono(&v.name, ty);
                goast::Stmt::Var(goast::VarSpec {
                    names: vec![v.name.clone()],
                    ty: Some(go_ty),
                    values: vec![],
                })
            }
            (None, None) => {
                return Err(self.err_at(
                    v.span,
                    format!("variable {} needs a type or an initializer", v.name),
                ))
            }
        };
        Ok(stmt)
    }

    // ── Assignment ─────────────────────────────────────────────────────

    fn assign_stmt(&mut self, a: &AssignStmt) -> Result<goast::Stmt, SourceError> {
        let op = assign_op(a.op);
        let (lhs, expected) = match &a.lhs {
            Expr::Ident(id) => {
                self.scopes
                    .check_assign(&id.name)
                    .map_err(|e| self.position(e, a.span))?;
                let ty = self
                    .scopes
                    .lookup(&id.name)
                    .map(|b| b.ty.clone())
                    .unwrap_or_else(Type::any);
                (goast::Expr::ident(id.name.clone()), ty)
            }
            Expr::Member(m) => {
                let (recv, recv_ty) = self.expr(&m.recv)?;
                let mut field_ty = Type::any();
                if let Some((_, meta)) = self.type_meta_of(&recv_ty) {
                    if meta.is_field_immutable(&m.name) {
                        return Err(self.err_at(
                            a.span,
                            format!("cannot assign to immutable field {}", m.name),
                        ));
                    }
                    if let Some(ty) = meta.fields.get(&m.name) {
                        field_ty = ty.clone();
                    }
                }
                (goast::Expr::sel(recv, m.name.clone()), field_ty)
            }
            Expr::Index(ix) => {
                let (recv, recv_ty) = self.expr(&ix.recv)?;
                if ix.indices.len() != 1 {
                    return Err(self.err_at(a.span, "invalid assignment target"));
                }
                let (index, _) = self.expr(&ix.indices[0])?;
                let elem_ty = match &recv_ty {
                    Type::Array(elem) => (**elem).clone(),
                    Type::Map { value, .. } => (**value).clone(),
                    _ => Type::any(),
                };
                (
                    goast::Expr::Index {
                        recv: Box::new(recv),
                        index: Box::new(index),
                    },
                    elem_ty,
                )
            }
            other => {
                return Err(self.err_at(other.span(), "invalid assignment target"));
            }
        };
        let (rhs, _) = self.expr_expected(&a.rhs, Some(&expected))?;
        Ok(goast::Stmt::Assign {
            lhs: vec![lhs],
            op,
            rhs: vec![rhs],
        })
    }
}

fn assign_op(op: AssignOp) -> goast::AssignOp {
    match op {
        AssignOp::Assign => goast::AssignOp::Assign,
        AssignOp::Add => goast::AssignOp::Add,
        AssignOp::Sub => goast::AssignOp::Sub,
        AssignOp::Mul => goast::AssignOp::Mul,
        AssignOp::Div => goast::AssignOp::Div,
        AssignOp::Rem => goast::AssignOp::Rem,
    }
}
