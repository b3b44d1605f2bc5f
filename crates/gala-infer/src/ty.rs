//! Inference-internal type language.
//!
//! Semantic [`Type`] values are converted into `Ty` terms before
//! unification and converted back afterwards. Type constructors are
//! keyed by their canonical name (`int`, `galat.Option`, `*`, `[]`,
//! `map`); structural types become applications of the corresponding
//! head.

use std::fmt;

use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::unify::InferCtx;

/// A unification variable, indexed into the `ena` table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyVar(pub u32);

/// An inference-level type term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    /// An unresolved inference variable.
    Var(TyVar),
    /// A nullary constructor: `int`, `string`, `main.Point`, `nil`.
    Con(String),
    /// A constructor applied to arguments: `galat.Option` of `int`,
    /// `*` of `T`, `map` of `K, V`.
    App(String, Vec<Ty>),
    /// A function: params -> result.
    Fun(Vec<Ty>, Box<Ty>),
    /// A tuple, used for multi-value function results.
    Tuple(Vec<Ty>),
}

impl Ty {
    pub fn con(name: impl Into<String>) -> Ty {
        Ty::Con(name.into())
    }

    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Fun(params, Box::new(ret))
    }

    /// The wildcard constructor: unifies with anything, binds nothing.
    pub fn any() -> Ty {
        Ty::Con("any".into())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Ty::Con(name) if name == "any")
    }

    /// Convert a semantic type into an inference term.
    ///
    /// Names listed in `params` are treated as type parameters and
    /// mapped (consistently within one call) through `param_vars`,
    /// which the caller seeds with fresh variables.
    pub fn from_type(ty: &Type, param_vars: &FxHashMap<String, Ty>) -> Ty {
        match ty {
            Type::Basic(name) => Ty::Con(name.clone()),
            Type::Named { package, name } => {
                if package.is_empty() {
                    if let Some(var) = param_vars.get(name) {
                        return var.clone();
                    }
                    Ty::Con(name.clone())
                } else {
                    Ty::Con(format!("{}.{}", package, name))
                }
            }
            Type::Generic { base, params } => {
                let head = base.to_string();
                Ty::App(
                    head,
                    params.iter().map(|p| Ty::from_type(p, param_vars)).collect(),
                )
            }
            Type::Pointer(elem) => Ty::App("*".into(), vec![Ty::from_type(elem, param_vars)]),
            Type::Array(elem) => Ty::App("[]".into(), vec![Ty::from_type(elem, param_vars)]),
            Type::Map { key, value } => Ty::App(
                "map".into(),
                vec![
                    Ty::from_type(key, param_vars),
                    Ty::from_type(value, param_vars),
                ],
            ),
            Type::Func { params, results } => {
                let ret = match results.len() {
                    0 => Ty::Tuple(Vec::new()),
                    1 => Ty::from_type(&results[0], param_vars),
                    _ => Ty::Tuple(
                        results
                            .iter()
                            .map(|r| Ty::from_type(r, param_vars))
                            .collect(),
                    ),
                };
                Ty::fun(
                    params.iter().map(|p| Ty::from_type(p, param_vars)).collect(),
                    ret,
                )
            }
            Type::Void => Ty::Tuple(Vec::new()),
            Type::Nil => Ty::Con("nil".into()),
        }
    }

    /// Convert a resolved inference term back to the semantic model.
    ///
    /// Unresolved variables become `any` -- the emission boundary never
    /// sees a type variable.
    pub fn to_type(&self, ctx: &mut InferCtx) -> Type {
        let resolved = ctx.resolve(self.clone());
        match resolved {
            Ty::Var(_) => Type::any(),
            Ty::Con(name) => con_to_type(&name),
            Ty::App(head, args) => {
                let args: Vec<Type> = args.iter().map(|a| a.to_type(ctx)).collect();
                match (head.as_str(), args.len()) {
                    ("*", 1) => Type::Pointer(Box::new(args.into_iter().next().unwrap())),
                    ("[]", 1) => Type::Array(Box::new(args.into_iter().next().unwrap())),
                    ("map", 2) => {
                        let mut it = args.into_iter();
                        Type::Map {
                            key: Box::new(it.next().unwrap()),
                            value: Box::new(it.next().unwrap()),
                        }
                    }
                    _ => Type::Generic {
                        base: Box::new(con_to_type(&head)),
                        params: args,
                    },
                }
            }
            Ty::Fun(params, ret) => {
                let results = match ret.as_ref() {
                    Ty::Tuple(elems) => elems.iter().map(|e| e.to_type(ctx)).collect(),
                    other => vec![other.to_type(ctx)],
                };
                Type::Func {
                    params: params.iter().map(|p| p.to_type(ctx)).collect(),
                    results,
                }
            }
            Ty::Tuple(elems) if elems.is_empty() => Type::Void,
            Ty::Tuple(elems) => {
                // A bare tuple outside a function result position has no
                // semantic counterpart; fall back to any.
                let _ = elems;
                Type::any()
            }
        }
    }
}

/// Parse a constructor name back into a semantic type.
fn con_to_type(name: &str) -> Type {
    if name == "nil" {
        return Type::Nil;
    }
    if Type::is_basic_name(name) {
        return Type::basic(name);
    }
    match name.rfind('.') {
        Some(i) => Type::named(&name[..i], &name[i + 1..]),
        None => Type::named("", name),
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Con(name) => write!(f, "{}", name),
            Ty::App(head, args) => {
                write!(f, "{}[", head)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, "]")
            }
            Ty::Fun(params, ret) => {
                write!(f, "func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") {}", ret)
            }
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A type scheme: a term quantified over the declared type parameters
/// of the function it describes. Each instantiation replaces the
/// quantified variables with fresh ones, so call sites infer
/// independently.
#[derive(Clone, Debug)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    /// A monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_type_maps_structure() {
        let none = FxHashMap::default();
        let opt = Type::generic(Type::named("galat", "Option"), vec![Type::basic("int")]);
        assert_eq!(
            Ty::from_type(&opt, &none),
            Ty::App("galat.Option".into(), vec![Ty::con("int")])
        );

        let f = Type::Func {
            params: vec![Type::basic("int")],
            results: vec![Type::basic("bool")],
        };
        assert_eq!(
            Ty::from_type(&f, &none),
            Ty::fun(vec![Ty::con("int")], Ty::con("bool"))
        );
    }

    #[test]
    fn from_type_substitutes_params() {
        let mut vars = FxHashMap::default();
        vars.insert("T".to_string(), Ty::Var(TyVar(7)));
        let t = Type::named("", "T");
        assert_eq!(Ty::from_type(&t, &vars), Ty::Var(TyVar(7)));
    }

    #[test]
    fn round_trip_through_ctx() {
        let mut ctx = InferCtx::new();
        let none = FxHashMap::default();
        let src = Type::Map {
            key: Box::new(Type::basic("string")),
            value: Box::new(Type::named("main", "Point")),
        };
        let ty = Ty::from_type(&src, &none);
        assert_eq!(ty.to_type(&mut ctx), src);
    }

    #[test]
    fn unresolved_var_becomes_any() {
        let mut ctx = InferCtx::new();
        let v = ctx.fresh_var();
        assert_eq!(v.to_type(&mut ctx), Type::any());
    }
}
