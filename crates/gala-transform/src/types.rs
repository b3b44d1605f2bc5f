//! Emission of semantic types as Go type expressions.

use gala_analyzer::packages::STD_PKG;
use gala_goast as goast;
use gala_syntax::ast::TypeExpr;
use gala_syntax::Type;

use crate::Transformer;

impl Transformer<'_> {
    /// Emit a semantic type as a Go type expression.
    ///
    /// Runtime types come out unqualified (the emitted file dot-imports
    /// the runtime); other foreign packages are addressed through their
    /// emission alias.
    pub(crate) fn go_type(&mut self, ty: &Type) -> goast::Expr {
        match ty {
            Type::Basic(name) => goast::Expr::ident(name.clone()),
            Type::Named { package, name } => self.qualified_ident(package, name),
            Type::Generic { base, params } => {
                let base = self.go_type(base);
                let args: Vec<goast::Expr> = params.iter().map(|p| self.go_type(p)).collect();
                if args.len() == 1 {
                    goast::Expr::Index {
                        recv: Box::new(base),
                        index: Box::new(args.into_iter().next().expect("length checked")),
                    }
                } else {
                    goast::Expr::IndexList {
                        recv: Box::new(base),
                        indices: args,
                    }
                }
            }
            Type::Pointer(elem) => goast::Expr::Star(Box::new(self.go_type(elem))),
            Type::Array(elem) => goast::Expr::ArrayType(Box::new(self.go_type(elem))),
            Type::Map { key, value } => goast::Expr::MapType {
                key: Box::new(self.go_type(key)),
                value: Box::new(self.go_type(value)),
            },
            Type::Func { params, results } => goast::Expr::FuncType {
                params: params
                    .iter()
                    .map(|p| goast::Field::anon(self.go_type(p)))
                    .collect(),
                results: results
                    .iter()
                    .map(|r| goast::Field::anon(self.go_type(r)))
                    .collect(),
            },
            // Neither void nor nil is a printable type; `any` is the
            // emission boundary's answer for both.
            Type::Void | Type::Nil => goast::Expr::ident("any"),
        }
    }

    /// Emit a surface type annotation.
    pub(crate) fn go_type_expr(&mut self, te: &TypeExpr) -> goast::Expr {
        let ty = Type::from_type_expr(te);
        self.go_type(&ty)
    }

    /// `Immutable[T]` for a field or binding of raw type `ty`.
    pub(crate) fn immutable_of(&mut self, ty: &Type) -> goast::Expr {
        let inner = self.go_type(ty);
        let immutable = self.rt("Immutable");
        goast::Expr::Index {
            recv: Box::new(immutable),
            index: Box::new(inner),
        }
    }

    /// A package-qualified identifier, honoring dot imports and the
    /// implicit runtime import.
    pub(crate) fn qualified_ident(&mut self, package: &str, name: &str) -> goast::Expr {
        if package.is_empty() || package == self.current_pkg() {
            return goast::Expr::ident(name);
        }
        if package == STD_PKG {
            return self.rt(name);
        }
        if self.imports.is_dot_imported(package) {
            return goast::Expr::ident(name);
        }
        let alias = self
            .imports
            .get_alias(package)
            .unwrap_or(package)
            .to_string();
        goast::Expr::sel(goast::Expr::ident(alias), name)
    }

    /// The zero value of a type, for generated `Unapply` failure arms.
    pub(crate) fn zero_value(&mut self, ty: &Type) -> goast::Expr {
        match ty {
            Type::Basic(name) => match name.as_str() {
                "string" => goast::Expr::BasicLit(goast::LitKind::Str, "\"\"".into()),
                "bool" => goast::Expr::ident("false"),
                "any" | "error" => goast::Expr::ident("nil"),
                _ => goast::Expr::int_lit("0"),
            },
            Type::Pointer(_) | Type::Array(_) | Type::Map { .. } | Type::Func { .. } | Type::Nil => {
                goast::Expr::ident("nil")
            }
            Type::Named { package, name } => {
                // A bare single-uppercase name is a type parameter; its
                // zero value needs the *new(T) spelling.
                if package.is_empty() && is_type_param_name(name) {
                    goast::Expr::Star(Box::new(goast::Expr::call(
                        goast::Expr::ident("new"),
                        vec![goast::Expr::ident(name.clone())],
                    )))
                } else {
                    goast::Expr::Composite {
                        ty: Some(Box::new(self.go_type(ty))),
                        elems: vec![],
                    }
                }
            }
            Type::Generic { .. } => goast::Expr::Composite {
                ty: Some(Box::new(self.go_type(ty))),
                elems: vec![],
            },
            Type::Void => goast::Expr::ident("nil"),
        }
    }
}

/// Heuristic for unresolved type-parameter names: a single uppercase
/// letter.
pub(crate) fn is_type_param_name(name: &str) -> bool {
    name.len() == 1 && name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Whether a type still mentions an unresolved type parameter anywhere.
/// Such types are useless as lambda expectations: emitting them would
/// reference a name that does not exist at the call site.
pub(crate) fn has_unresolved_params(ty: &Type) -> bool {
    match ty {
        Type::Named { package, name } => package.is_empty() && is_type_param_name(name),
        Type::Generic { base, params } => {
            has_unresolved_params(base) || params.iter().any(has_unresolved_params)
        }
        Type::Pointer(elem) | Type::Array(elem) => has_unresolved_params(elem),
        Type::Map { key, value } => has_unresolved_params(key) || has_unresolved_params(value),
        Type::Func { params, results } => {
            params.iter().any(has_unresolved_params) || results.iter().any(has_unresolved_params)
        }
        _ => false,
    }
}
