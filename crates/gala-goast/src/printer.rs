//! Serializes the Go AST to gofmt-shaped source text.
//!
//! Tab indentation, one import block, composite literals on one line.
//! The output is what downstream tooling feeds to the Go toolchain, and
//! what the transformer's tests snapshot.

use std::fmt::Write;

use crate::ast::*;

/// Print a complete file.
pub fn print_file(file: &File) -> String {
    let mut p = Printer::new();
    p.file(file);
    p.out
}

/// Print a single expression (test helper).
pub fn print_expr(expr: &Expr) -> String {
    let mut p = Printer::new();
    p.expr(expr);
    p.out
}

/// Print a single statement at indent 0 (test helper).
pub fn print_stmt(stmt: &Stmt) -> String {
    let mut p = Printer::new();
    p.stmt(stmt);
    p.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Printer {
            out: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn line(&mut self, s: &str) {
        self.write_indent();
        self.out.push_str(s);
        self.out.push('\n');
    }

    // ── File ───────────────────────────────────────────────────────────

    fn file(&mut self, file: &File) {
        let _ = writeln!(self.out, "package {}", file.package);
        if !file.imports.is_empty() {
            self.out.push('\n');
            self.line("import (");
            self.indent += 1;
            for spec in &file.imports {
                self.write_indent();
                if let Some(alias) = &spec.alias {
                    let _ = write!(self.out, "{} ", alias);
                }
                let _ = writeln!(self.out, "{:?}", spec.path);
            }
            self.indent -= 1;
            self.line(")");
        }
        for decl in &file.decls {
            self.out.push('\n');
            self.decl(decl);
        }
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(f) => self.func_decl(f),
            Decl::Type(t) => self.type_decl(t),
            Decl::Var(v) => {
                self.write_indent();
                self.var_spec(v);
                self.out.push('\n');
            }
            Decl::Const(c) => self.const_decl(c),
        }
    }

    fn func_decl(&mut self, f: &FuncDecl) {
        self.write_indent();
        self.out.push_str("func ");
        if let Some(recv) = &f.recv {
            self.out.push('(');
            self.field(recv);
            self.out.push_str(") ");
        }
        self.out.push_str(&f.name);
        if !f.type_params.is_empty() {
            self.out.push('[');
            self.field_list(&f.type_params);
            self.out.push(']');
        }
        self.out.push('(');
        self.field_list(&f.params);
        self.out.push(')');
        self.results(&f.results);
        self.out.push(' ');
        self.block(&f.body);
        self.out.push('\n');
    }

    fn type_decl(&mut self, t: &TypeDecl) {
        self.write_indent();
        self.out.push_str("type ");
        self.out.push_str(&t.name);
        if !t.type_params.is_empty() {
            self.out.push('[');
            self.field_list(&t.type_params);
            self.out.push(']');
        }
        self.out.push(' ');
        self.type_body(&t.ty);
        self.out.push('\n');
    }

    /// Struct and interface bodies print multiline; everything else inline.
    fn type_body(&mut self, ty: &Expr) {
        match ty {
            Expr::StructType { fields } => {
                if fields.is_empty() {
                    self.out.push_str("struct{}");
                    return;
                }
                self.out.push_str("struct {\n");
                self.indent += 1;
                for field in fields {
                    self.write_indent();
                    self.field(field);
                    self.out.push('\n');
                }
                self.indent -= 1;
                self.write_indent();
                self.out.push('}');
            }
            Expr::InterfaceType { methods } => {
                if methods.is_empty() {
                    self.out.push_str("interface{}");
                    return;
                }
                self.out.push_str("interface {\n");
                self.indent += 1;
                for m in methods {
                    self.write_indent();
                    self.out.push_str(&m.name);
                    self.out.push('(');
                    self.field_list(&m.params);
                    self.out.push(')');
                    self.results(&m.results);
                    self.out.push('\n');
                }
                self.indent -= 1;
                self.write_indent();
                self.out.push('}');
            }
            other => self.expr(other),
        }
    }

    fn const_decl(&mut self, c: &ConstDecl) {
        self.line("const (");
        self.indent += 1;
        for spec in &c.specs {
            self.write_indent();
            self.out.push_str(&spec.names.join(", "));
            if let Some(ty) = &spec.ty {
                self.out.push(' ');
                self.expr(ty);
            }
            if !spec.values.is_empty() {
                self.out.push_str(" = ");
                self.expr_list(&spec.values);
            }
            self.out.push('\n');
        }
        self.indent -= 1;
        self.line(")");
    }

    fn var_spec(&mut self, v: &VarSpec) {
        self.out.push_str("var ");
        self.out.push_str(&v.names.join(", "));
        if let Some(ty) = &v.ty {
            self.out.push(' ');
            self.expr(ty);
        }
        if !v.values.is_empty() {
            self.out.push_str(" = ");
            self.expr_list(&v.values);
        }
    }

    fn field(&mut self, field: &Field) {
        if !field.names.is_empty() {
            self.out.push_str(&field.names.join(", "));
            self.out.push(' ');
        }
        self.expr(&field.ty);
    }

    fn field_list(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.field(field);
        }
    }

    fn results(&mut self, results: &[Field]) {
        match results.len() {
            0 => {}
            1 if results[0].names.is_empty() => {
                self.out.push(' ');
                self.expr(&results[0].ty);
            }
            _ => {
                self.out.push_str(" (");
                self.field_list(results);
                self.out.push(')');
            }
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn block(&mut self, block: &Block) {
        if block.stmts.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.write_indent();
            self.stmt(stmt);
            self.out.push('\n');
        }
        self.indent -= 1;
        self.write_indent();
        self.out.push('}');
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(e) => self.expr(e),
            Stmt::Assign { lhs, op, rhs } => {
                self.expr_list(lhs);
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr_list(rhs);
            }
            Stmt::Return(values) => {
                self.out.push_str("return");
                if !values.is_empty() {
                    self.out.push(' ');
                    self.expr_list(values);
                }
            }
            Stmt::If(s) => self.if_stmt(s),
            Stmt::For(s) => {
                self.out.push_str("for ");
                match (&s.init, &s.cond, &s.post) {
                    (None, Some(cond), None) => {
                        self.expr(cond);
                        self.out.push(' ');
                    }
                    (None, None, None) => {}
                    (init, cond, post) => {
                        if let Some(init) = init {
                            self.stmt(init);
                        }
                        self.out.push_str("; ");
                        if let Some(cond) = cond {
                            self.expr(cond);
                        }
                        self.out.push_str("; ");
                        if let Some(post) = post {
                            self.stmt(post);
                        }
                        self.out.push(' ');
                    }
                }
                self.block(&s.body);
            }
            Stmt::Range(s) => {
                self.out.push_str("for ");
                match (&s.key, &s.value) {
                    (Some(k), Some(v)) => {
                        let _ = write!(self.out, "{}, {} := range ", k, v);
                    }
                    (Some(k), None) => {
                        let _ = write!(self.out, "{} := range ", k);
                    }
                    _ => self.out.push_str("range "),
                }
                self.expr(&s.expr);
                self.out.push(' ');
                self.block(&s.body);
            }
            Stmt::Switch(s) => {
                self.out.push_str("switch ");
                if let Some(tag) = &s.tag {
                    self.expr(tag);
                    self.out.push(' ');
                }
                self.out.push_str("{\n");
                for case in &s.cases {
                    self.write_indent();
                    if case.exprs.is_empty() {
                        self.out.push_str("default:\n");
                    } else {
                        self.out.push_str("case ");
                        self.expr_list(&case.exprs);
                        self.out.push_str(":\n");
                    }
                    self.indent += 1;
                    for stmt in &case.body {
                        self.write_indent();
                        self.stmt(stmt);
                        self.out.push('\n');
                    }
                    self.indent -= 1;
                }
                self.write_indent();
                self.out.push('}');
            }
            Stmt::IncDec { expr, inc } => {
                self.expr(expr);
                self.out.push_str(if *inc { "++" } else { "--" });
            }
            Stmt::Block(b) => self.block(b),
            Stmt::Var(v) => self.var_spec(v),
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) {
        self.out.push_str("if ");
        if let Some(init) = &s.init {
            self.stmt(init);
            self.out.push_str("; ");
        }
        self.expr(&s.cond);
        self.out.push(' ');
        self.block(&s.then);
        if let Some(else_) = &s.else_ {
            self.out.push_str(" else ");
            match else_.as_ref() {
                ElseBranch::If(inner) => self.if_stmt(inner),
                ElseBranch::Block(b) => self.block(b),
            }
        }
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn binary_operand(&mut self, operand: &Expr, parent_prec: u8, is_rhs: bool) {
        let needs_parens = match operand {
            Expr::Binary { op, .. } => {
                let child = precedence(op);
                child < parent_prec || (is_rhs && child == parent_prec)
            }
            _ => false,
        };
        if needs_parens {
            self.out.push('(');
            self.expr(operand);
            self.out.push(')');
        } else {
            self.expr(operand);
        }
    }

    fn expr_list(&mut self, exprs: &[Expr]) {
        for (i, e) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(e);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(name) => self.out.push_str(name),
            Expr::BasicLit(_, value) => self.out.push_str(value),
            Expr::Selector { recv, name } => {
                self.expr(recv);
                self.out.push('.');
                self.out.push_str(name);
            }
            Expr::Call { callee, args } => {
                self.expr(callee);
                self.out.push('(');
                self.expr_list(args);
                self.out.push(')');
            }
            Expr::Index { recv, index } => {
                self.expr(recv);
                self.out.push('[');
                self.expr(index);
                self.out.push(']');
            }
            Expr::IndexList { recv, indices } => {
                self.expr(recv);
                self.out.push('[');
                self.expr_list(indices);
                self.out.push(']');
            }
            Expr::Unary { op, expr } => {
                self.out.push_str(op);
                if matches!(expr.as_ref(), Expr::Binary { .. }) {
                    self.out.push('(');
                    self.expr(expr);
                    self.out.push(')');
                } else {
                    self.expr(expr);
                }
            }
            Expr::Binary { op, lhs, rhs } => {
                // Parenthesize operands whose precedence would otherwise
                // regroup the tree. Left-nested chains print bare; a
                // right-nested equal-precedence operand reflects explicit
                // grouping and keeps its parens.
                self.binary_operand(lhs, precedence(op), false);
                let _ = write!(self.out, " {} ", op);
                self.binary_operand(rhs, precedence(op), true);
            }
            Expr::Star(inner) => {
                self.out.push('*');
                self.expr(inner);
            }
            Expr::TypeAssert { recv, ty } => {
                self.expr(recv);
                self.out.push_str(".(");
                self.expr(ty);
                self.out.push(')');
            }
            Expr::Composite { ty, elems } => {
                if let Some(ty) = ty {
                    self.expr(ty);
                }
                self.out.push('{');
                self.expr_list(elems);
                self.out.push('}');
            }
            Expr::KeyValue { key, value } => {
                self.expr(key);
                self.out.push_str(": ");
                self.expr(value);
            }
            Expr::FuncLit {
                params,
                results,
                body,
            } => {
                self.out.push_str("func(");
                self.field_list(params);
                self.out.push(')');
                self.results(results);
                self.out.push(' ');
                self.block(body);
            }
            Expr::Paren(inner) => {
                self.out.push('(');
                self.expr(inner);
                self.out.push(')');
            }
            Expr::ArrayType(elem) => {
                self.out.push_str("[]");
                self.expr(elem);
            }
            Expr::MapType { key, value } => {
                self.out.push_str("map[");
                self.expr(key);
                self.out.push(']');
                self.expr(value);
            }
            Expr::FuncType { params, results } => {
                self.out.push_str("func(");
                self.field_list(params);
                self.out.push(')');
                self.results(results);
            }
            Expr::StructType { fields } => {
                // Inline struct type (rare outside type decls).
                self.out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str("; ");
                    }
                    self.field(field);
                }
                self.out.push('}');
            }
            Expr::InterfaceType { methods } => {
                self.out.push_str("interface{");
                for (i, m) in methods.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str("; ");
                    }
                    self.out.push_str(&m.name);
                    self.out.push('(');
                    self.field_list(&m.params);
                    self.out.push(')');
                    self.results(&m.results);
                }
                self.out.push('}');
            }
        }
    }
}

/// Go binary-operator precedence (higher binds tighter).
fn precedence(op: &str) -> u8 {
    match op {
        "||" => 1,
        "&&" => 2,
        "==" | "!=" | "<" | "<=" | ">" | ">=" => 3,
        "+" | "-" | "|" | "^" => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_struct_type_decl() {
        let decl = Decl::Type(TypeDecl {
            name: "Point".into(),
            type_params: Vec::new(),
            ty: Expr::StructType {
                fields: vec![
                    Field::named("x", Expr::index(Expr::ident("Immutable"), Expr::ident("int"))),
                    Field::named("y", Expr::index(Expr::ident("Immutable"), Expr::ident("int"))),
                ],
            },
        });
        let file = File {
            package: "main".into(),
            imports: vec![ImportSpec::dot("galalang.org/x/galat")],
            decls: vec![decl],
        };
        let out = print_file(&file);
        assert_eq!(
            out,
            "package main\n\nimport (\n\t. \"galalang.org/x/galat\"\n)\n\ntype Point struct {\n\tx Immutable[int]\n\ty Immutable[int]\n}\n"
        );
    }

    #[test]
    fn print_method_with_receiver() {
        let f = FuncDecl {
            name: "Copy".into(),
            recv: Some(Field::named("p", Expr::ident("Point"))),
            type_params: Vec::new(),
            params: Vec::new(),
            results: vec![Field::anon(Expr::ident("Point"))],
            body: Block::new(vec![Stmt::ret(Expr::Composite {
                ty: Some(Box::new(Expr::ident("Point"))),
                elems: vec![Expr::key_value(
                    Expr::ident("x"),
                    Expr::call(Expr::ident("Copy"), vec![Expr::sel(Expr::ident("p"), "x")]),
                )],
            })]),
        };
        let out = print_stmt(&Stmt::Block(Block::new(vec![])));
        assert_eq!(out, "{}");
        let mut file = File {
            package: "main".into(),
            imports: Vec::new(),
            decls: Vec::new(),
        };
        file.decls.push(Decl::Func(f));
        let printed = print_file(&file);
        assert!(printed.contains("func (p Point) Copy() Point {\n\treturn Point{x: Copy(p.x)}\n}"));
    }

    #[test]
    fn print_iife_match_shape() {
        // (func(x int) int { if ok { return 1 } else { return 0 } }(v))
        let lit = Expr::FuncLit {
            params: vec![Field::named("x", Expr::ident("int"))],
            results: vec![Field::anon(Expr::ident("int"))],
            body: Block::new(vec![Stmt::If(IfStmt {
                init: None,
                cond: Expr::ident("ok"),
                then: Block::new(vec![Stmt::ret(Expr::int_lit("1"))]),
                else_: Some(Box::new(ElseBranch::Block(Block::new(vec![Stmt::ret(
                    Expr::int_lit("0"),
                )])))),
            })]),
        };
        let call = Expr::Paren(Box::new(Expr::call(lit, vec![Expr::ident("v")])));
        let out = print_expr(&call);
        assert!(out.starts_with("(func(x int) int {"));
        assert!(out.ends_with("}(v))"));
        assert!(out.contains("if ok {\n\treturn 1\n} else {\n\treturn 0\n}"));
    }

    #[test]
    fn binary_precedence_regroups_with_parens() {
        // (a + b) * c arrives as Mul(Add(a, b), c).
        let e = Expr::binary(
            "*",
            Expr::binary("+", Expr::ident("a"), Expr::ident("b")),
            Expr::ident("c"),
        );
        assert_eq!(print_expr(&e), "(a + b) * c");

        // Left-nested same-precedence chains stay bare.
        let chain = Expr::binary(
            "&&",
            Expr::binary("&&", Expr::ident("ok1"), Expr::ident("ok2")),
            Expr::ident("ok3"),
        );
        assert_eq!(print_expr(&chain), "ok1 && ok2 && ok3");

        // A right-nested equal-precedence operand keeps its grouping.
        let sub = Expr::binary(
            "-",
            Expr::ident("a"),
            Expr::binary("-", Expr::ident("b"), Expr::ident("c")),
        );
        assert_eq!(print_expr(&sub), "a - (b - c)");

        // Unary over a binary parenthesizes.
        let neg = Expr::Unary {
            op: "-",
            expr: Box::new(Expr::binary("+", Expr::ident("a"), Expr::ident("b"))),
        };
        assert_eq!(print_expr(&neg), "-(a + b)");
    }

    #[test]
    fn print_const_iota_block() {
        let c = ConstDecl {
            specs: vec![
                ConstSpec {
                    names: vec!["_Shape_Circle".into()],
                    ty: Some(Expr::ident("uint8")),
                    values: vec![Expr::ident("iota")],
                },
                ConstSpec {
                    names: vec!["_Shape_Rectangle".into()],
                    ty: None,
                    values: Vec::new(),
                },
            ],
        };
        let mut p = Printer::new();
        p.const_decl(&c);
        assert_eq!(
            p.out,
            "const (\n\t_Shape_Circle uint8 = iota\n\t_Shape_Rectangle\n)\n"
        );
    }
}
