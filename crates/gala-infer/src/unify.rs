//! Unification engine.
//!
//! A thin wrapper over `ena`'s union-find table: fresh variable
//! creation, resolution through the table, occurs check, structural
//! unification, and scheme instantiation. Generalization is by declared
//! type parameter, not by let-level: Gala functions quantify exactly the
//! parameters the programmer wrote, so the engine never needs level
//! tracking.

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;

use crate::infer::InferError;
use crate::ty::{Scheme, Ty, TyVar};

/// The unification context. One per transform; discarded with it.
pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
        }
    }

    /// Create a fresh unification variable.
    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.table.new_key(None))
    }

    /// Resolve a term by following union-find indirection, normalizing
    /// unbound variables to their equivalence-class root.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(params, ret) => {
                let params = params.into_iter().map(|p| self.resolve(p)).collect();
                Ty::Fun(params, Box::new(self.resolve(*ret)))
            }
            Ty::App(head, args) => {
                let args = args.into_iter().map(|a| self.resolve(a)).collect();
                Ty::App(head, args)
            }
            Ty::Tuple(elems) => Ty::Tuple(elems.into_iter().map(|e| self.resolve(e)).collect()),
            other => other,
        }
    }

    /// Whether `var` occurs anywhere inside `ty` (following bindings).
    /// Guards against constructing an infinite type.
    fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if *v == var {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Con(_) => false,
            Ty::Fun(params, ret) => {
                params.iter().any(|p| self.occurs_in(var, p)) || self.occurs_in(var, ret)
            }
            Ty::App(_, args) => args.iter().any(|a| self.occurs_in(var, a)),
            Ty::Tuple(elems) => elems.iter().any(|e| self.occurs_in(var, e)),
        }
    }

    /// Make two terms equal, or report why they cannot be.
    ///
    /// The `any` constructor unifies with everything without binding
    /// anything: declared `any` is a deliberate escape hatch, not a
    /// constraint.
    pub fn unify(&mut self, a: Ty, b: Ty) -> Result<(), InferError> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a.is_any() || b.is_any() {
            return Ok(());
        }

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),

            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table
                    .unify_var_var(v1, v2)
                    .expect("two unbound vars always unify");
                Ok(())
            }

            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    return Err(InferError::InfiniteType {
                        ty: format!("{}", ty),
                    });
                }
                self.table
                    .unify_var_value(v, Some(ty))
                    .expect("binding after occurs check cannot fail");
                Ok(())
            }

            (Ty::Con(c1), Ty::Con(c2)) => {
                // nil unifies with any nullary constructor: a nil
                // literal is assignable to every reference type.
                if c1 == c2 || c1 == "nil" || c2 == "nil" {
                    Ok(())
                } else {
                    Err(InferError::Mismatch {
                        expected: c1,
                        found: c2,
                    })
                }
            }

            (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
                if p1.len() != p2.len() {
                    return Err(InferError::ArityMismatch {
                        expected: p1.len(),
                        found: p2.len(),
                    });
                }
                for (a, b) in p1.into_iter().zip(p2.into_iter()) {
                    self.unify(a, b)?;
                }
                self.unify(*r1, *r2)
            }

            (Ty::App(h1, a1), Ty::App(h2, a2)) => {
                if h1 != h2 {
                    return Err(InferError::Mismatch {
                        expected: h1,
                        found: h2,
                    });
                }
                if a1.len() != a2.len() {
                    return Err(InferError::ArityMismatch {
                        expected: a1.len(),
                        found: a2.len(),
                    });
                }
                for (a, b) in a1.into_iter().zip(a2.into_iter()) {
                    self.unify(a, b)?;
                }
                Ok(())
            }

            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                if e1.len() != e2.len() {
                    return Err(InferError::ArityMismatch {
                        expected: e1.len(),
                        found: e2.len(),
                    });
                }
                for (a, b) in e1.into_iter().zip(e2.into_iter()) {
                    self.unify(a, b)?;
                }
                Ok(())
            }

            (a, b) => Err(InferError::Mismatch {
                expected: format!("{}", a),
                found: format!("{}", b),
            }),
        }
    }

    /// Instantiate a scheme: every quantified variable is replaced by a
    /// fresh one, so each call site constrains its own copy.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let subst: FxHashMap<TyVar, Ty> = scheme
            .vars
            .iter()
            .map(|v| (*v, self.fresh_var()))
            .collect();
        self.substitute(&scheme.ty, &subst)
    }

    fn substitute(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                if let Some(replacement) = subst.get(v) {
                    return replacement.clone();
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.substitute(&inner, subst),
                    None => ty.clone(),
                }
            }
            Ty::Con(_) => ty.clone(),
            Ty::Fun(params, ret) => {
                let params = params.iter().map(|p| self.substitute(p, subst)).collect();
                Ty::Fun(params, Box::new(self.substitute(ret, subst)))
            }
            Ty::App(head, args) => Ty::App(
                head.clone(),
                args.iter().map(|a| self.substitute(a, subst)).collect(),
            ),
            Ty::Tuple(elems) => {
                Ty::Tuple(elems.iter().map(|e| self.substitute(e, subst)).collect())
            }
        }
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_binds_to_concrete() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        ctx.unify(a.clone(), Ty::con("int")).unwrap();
        assert_eq!(ctx.resolve(a), Ty::con("int"));
    }

    #[test]
    fn transitive_binding() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        ctx.unify(a.clone(), b.clone()).unwrap();
        ctx.unify(b.clone(), Ty::con("string")).unwrap();
        assert_eq!(ctx.resolve(a), Ty::con("string"));
    }

    #[test]
    fn con_mismatch_errors() {
        let mut ctx = InferCtx::new();
        let err = ctx.unify(Ty::con("int"), Ty::con("string")).unwrap_err();
        match err {
            InferError::Mismatch { expected, found } => {
                assert_eq!(expected, "int");
                assert_eq!(found, "string");
            }
            other => panic!("expected Mismatch, got {:?}", other),
        }
    }

    #[test]
    fn any_unifies_with_everything() {
        let mut ctx = InferCtx::new();
        ctx.unify(Ty::any(), Ty::con("int")).unwrap();
        ctx.unify(Ty::fun(vec![], Ty::con("int")), Ty::any()).unwrap();
    }

    #[test]
    fn nil_unifies_with_reference_cons() {
        let mut ctx = InferCtx::new();
        ctx.unify(Ty::con("nil"), Ty::con("main.Point")).unwrap();
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let fun = Ty::fun(vec![a.clone()], Ty::con("int"));
        assert!(matches!(
            ctx.unify(a, fun),
            Err(InferError::InfiniteType { .. })
        ));
    }

    #[test]
    fn fun_unification_flows_to_params() {
        let mut ctx = InferCtx::new();
        let p = ctx.fresh_var();
        let lam = Ty::fun(vec![p.clone()], Ty::con("bool"));
        let expected = Ty::fun(vec![Ty::con("int")], Ty::con("bool"));
        ctx.unify(lam, expected).unwrap();
        assert_eq!(ctx.resolve(p), Ty::con("int"));
    }

    #[test]
    fn instantiation_is_fresh_per_call() {
        let mut ctx = InferCtx::new();
        let q = ctx.fresh_var();
        let var = match q {
            Ty::Var(v) => v,
            _ => unreachable!(),
        };
        let scheme = Scheme {
            vars: vec![var],
            ty: Ty::fun(vec![q.clone()], q),
        };
        let i1 = ctx.instantiate(&scheme);
        let i2 = ctx.instantiate(&scheme);
        // Pin i1's parameter; i2's must stay free.
        if let Ty::Fun(params, _) = &i1 {
            ctx.unify(params[0].clone(), Ty::con("int")).unwrap();
        }
        if let Ty::Fun(params, _) = &i2 {
            assert!(matches!(ctx.resolve(params[0].clone()), Ty::Var(_)));
        }
    }
}
