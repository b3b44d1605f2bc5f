//! Semantic type model.
//!
//! A uniform representation of source types used by the analyzer's
//! metadata tables, the unified name resolver, and the transformer.
//! Unlike [`TypeExpr`], which mirrors what was written, `Type` is
//! canonical: builtins are `Basic`, user types carry their owning
//! package, and the `Display` form is the authoritative string the
//! whole pipeline keys tables on.

use std::fmt;

use serde::Serialize;

use crate::ast::TypeExpr;

/// The builtin scalar type names of the target language.
const BASIC_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "byte", "rune", "float32", "float64", "complex64",
    "complex128", "any", "error",
];

/// A semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// A builtin scalar: `int`, `string`, `bool`, `any`, ...
    Basic(String),
    /// A user-declared type, with its owning package ("" if unresolved).
    Named { package: String, name: String },
    /// A generic application `Base[P1, P2]`.
    Generic { base: Box<Type>, params: Vec<Type> },
    /// `*T`.
    Pointer(Box<Type>),
    /// `[]T`.
    Array(Box<Type>),
    /// `map[K]V`.
    Map { key: Box<Type>, value: Box<Type> },
    /// `func(params) results`.
    Func {
        params: Vec<Type>,
        results: Vec<Type>,
    },
    /// The absent type of a void function.
    Void,
    /// The type of the `nil` literal.
    Nil,
}

impl Type {
    /// The `any` type, used wherever inference gives up.
    pub fn any() -> Type {
        Type::Basic("any".into())
    }

    pub fn basic(name: impl Into<String>) -> Type {
        Type::Basic(name.into())
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Type {
        Type::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn generic(base: Type, params: Vec<Type>) -> Type {
        Type::Generic {
            base: Box::new(base),
            params,
        }
    }

    /// Whether `name` denotes a builtin scalar type.
    pub fn is_basic_name(name: &str) -> bool {
        BASIC_TYPES.contains(&name)
    }

    /// The simple last-dot-stripped identifier of this type.
    ///
    /// `galat.Option[int]` answers `Option`; `*Point` answers `Point`.
    /// Structural types (maps, functions) have no simple name.
    pub fn base_name(&self) -> &str {
        match self {
            Type::Basic(name) => name,
            Type::Named { name, .. } => match name.rfind('.') {
                Some(i) => &name[i + 1..],
                None => name,
            },
            Type::Generic { base, .. } => base.base_name(),
            Type::Pointer(elem) | Type::Array(elem) => elem.base_name(),
            Type::Map { .. } => "map",
            Type::Func { .. } => "func",
            Type::Void => "",
            Type::Nil => "nil",
        }
    }

    /// The owning package of this type, or "" for builtins and
    /// structural types.
    pub fn package(&self) -> &str {
        match self {
            Type::Named { package, .. } => package,
            Type::Generic { base, .. } => base.package(),
            Type::Pointer(elem) | Type::Array(elem) => elem.package(),
            _ => "",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Type::Nil)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Basic(name) if name == "any")
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Whether this is the runtime `Immutable[T]` wrapper.
    pub fn is_immutable_wrapper(&self) -> bool {
        matches!(self, Type::Generic { base, .. } if base.base_name() == "Immutable")
    }

    /// The type arguments of a generic application, or empty.
    pub fn type_args(&self) -> &[Type] {
        match self {
            Type::Generic { params, .. } => params,
            _ => &[],
        }
    }

    /// Strip one `Immutable[...]` layer, if present.
    pub fn unwrap_immutable(&self) -> &Type {
        match self {
            Type::Generic { base, params }
                if base.base_name() == "Immutable" && params.len() == 1 =>
            {
                &params[0]
            }
            _ => self,
        }
    }

    /// Convert surface type syntax into the semantic model.
    ///
    /// Unqualified non-builtin names become `Named` with an empty
    /// package; the analyzer qualifies them against its symbol tables.
    pub fn from_type_expr(te: &TypeExpr) -> Type {
        match te {
            TypeExpr::Name { pkg, name, .. } => match pkg {
                Some(pkg) => Type::named(pkg.clone(), name.clone()),
                None if Self::is_basic_name(name) => Type::basic(name.clone()),
                None => Type::named("", name.clone()),
            },
            TypeExpr::Generic { base, args, .. } => Type::Generic {
                base: Box::new(Type::from_type_expr(base)),
                params: args.iter().map(Type::from_type_expr).collect(),
            },
            TypeExpr::Pointer(elem, _) => Type::Pointer(Box::new(Type::from_type_expr(elem))),
            TypeExpr::Slice(elem, _) => Type::Array(Box::new(Type::from_type_expr(elem))),
            TypeExpr::Map { key, value, .. } => Type::Map {
                key: Box::new(Type::from_type_expr(key)),
                value: Box::new(Type::from_type_expr(value)),
            },
            TypeExpr::Func {
                params, results, ..
            } => Type::Func {
                params: params.iter().map(Type::from_type_expr).collect(),
                results: results.iter().map(Type::from_type_expr).collect(),
            },
            TypeExpr::Unit(_) => Type::Void,
        }
    }

    /// Replace every `Named` occurrence of a type parameter with its
    /// binding from `subst`. Used to derive expected argument types at
    /// generic call sites.
    pub fn substitute(&self, subst: &dyn Fn(&str) -> Option<Type>) -> Type {
        match self {
            Type::Named { package, name } if package.is_empty() => {
                subst(name).unwrap_or_else(|| self.clone())
            }
            Type::Generic { base, params } => Type::Generic {
                base: Box::new(base.substitute(subst)),
                params: params.iter().map(|p| p.substitute(subst)).collect(),
            },
            Type::Pointer(elem) => Type::Pointer(Box::new(elem.substitute(subst))),
            Type::Array(elem) => Type::Array(Box::new(elem.substitute(subst))),
            Type::Map { key, value } => Type::Map {
                key: Box::new(key.substitute(subst)),
                value: Box::new(value.substitute(subst)),
            },
            Type::Func { params, results } => Type::Func {
                params: params.iter().map(|p| p.substitute(subst)).collect(),
                results: results.iter().map(|r| r.substitute(subst)).collect(),
            },
            other => other.clone(),
        }
    }

    /// Collect the names of unresolved `Named`-with-empty-package
    /// occurrences -- the candidate type parameters of a signature.
    pub fn collect_free_names(&self, out: &mut Vec<String>) {
        match self {
            Type::Named { package, name } if package.is_empty() => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Type::Named { .. } | Type::Basic(_) | Type::Void | Type::Nil => {}
            Type::Generic { base, params } => {
                base.collect_free_names(out);
                for p in params {
                    p.collect_free_names(out);
                }
            }
            Type::Pointer(elem) | Type::Array(elem) => elem.collect_free_names(out),
            Type::Map { key, value } => {
                key.collect_free_names(out);
                value.collect_free_names(out);
            }
            Type::Func { params, results } => {
                for p in params {
                    p.collect_free_names(out);
                }
                for r in results {
                    r.collect_free_names(out);
                }
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(name) => write!(f, "{}", name),
            Type::Named { package, name } => {
                if package.is_empty() {
                    write!(f, "{}", name)
                } else {
                    write!(f, "{}.{}", package, name)
                }
            }
            Type::Generic { base, params } => {
                write!(f, "{}[", base)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, "]")
            }
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Array(elem) => write!(f, "[]{}", elem),
            Type::Map { key, value } => write!(f, "map[{}]{}", key, value),
            Type::Func { params, results } => {
                write!(f, "func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")?;
                match results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", results[0]),
                    _ => {
                        write!(f, " (")?;
                        for (i, r) in results.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", r)?;
                        }
                        write!(f, ")")
                    }
                }
            }
            Type::Void => write!(f, "void"),
            Type::Nil => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_common::Span;

    fn name(n: &str) -> TypeExpr {
        TypeExpr::Name {
            pkg: None,
            name: n.into(),
            span: Span::zero(),
        }
    }

    #[test]
    fn builtins_become_basic() {
        assert_eq!(Type::from_type_expr(&name("int")), Type::basic("int"));
        assert_eq!(Type::from_type_expr(&name("any")), Type::basic("any"));
    }

    #[test]
    fn user_types_become_named() {
        assert_eq!(Type::from_type_expr(&name("Point")), Type::named("", "Point"));
    }

    #[test]
    fn base_name_strips_package_and_wrappers() {
        let opt = Type::generic(Type::named("galat", "Option"), vec![Type::basic("int")]);
        assert_eq!(opt.base_name(), "Option");
        assert_eq!(opt.package(), "galat");

        let ptr = Type::Pointer(Box::new(Type::named("main", "Point")));
        assert_eq!(ptr.base_name(), "Point");
    }

    #[test]
    fn display_is_canonical() {
        let opt = Type::generic(Type::named("galat", "Option"), vec![Type::basic("int")]);
        assert_eq!(opt.to_string(), "galat.Option[int]");

        let m = Type::Map {
            key: Box::new(Type::basic("string")),
            value: Box::new(Type::basic("int")),
        };
        assert_eq!(m.to_string(), "map[string]int");

        let f = Type::Func {
            params: vec![Type::basic("int")],
            results: vec![Type::basic("int"), Type::basic("bool")],
        };
        assert_eq!(f.to_string(), "func(int) (int, bool)");
    }

    #[test]
    fn unwrap_immutable_strips_one_layer() {
        let inner = Type::basic("int");
        let wrapped = Type::generic(Type::named("galat", "Immutable"), vec![inner.clone()]);
        assert!(wrapped.is_immutable_wrapper());
        assert_eq!(wrapped.unwrap_immutable(), &inner);
        assert_eq!(inner.unwrap_immutable(), &inner);
    }

    #[test]
    fn substitute_replaces_free_names() {
        let container = Type::generic(Type::named("", "Container"), vec![Type::named("", "T")]);
        let out = container.substitute(&|n| (n == "T").then(|| Type::basic("int")));
        assert_eq!(out.to_string(), "Container[int]");
    }

    #[test]
    fn nil_answers_is_nil() {
        assert!(Type::Nil.is_nil());
        assert!(!Type::basic("int").is_nil());
    }
}
