//! Scope-stacked environment of name -> scheme bindings.
//!
//! The transformer mirrors its own scope pushes and pops into this
//! environment so that inference sees exactly the bindings that are
//! lexically visible. Functions are bound once, generalized over their
//! declared type parameters; locals are bound monomorphically.

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

pub struct TypeEnv {
    /// Innermost scope is last. The outermost frame holds package-level
    /// functions and is never popped.
    frames: Vec<FxHashMap<String, Scheme>>,
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        assert!(self.frames.len() > 1, "cannot pop the package scope");
        self.frames.pop();
    }

    /// Bind in the innermost frame, shadowing any outer binding.
    pub fn define(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.frames
            .last_mut()
            .expect("frame stack is never empty")
            .insert(name.into(), scheme);
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{Scheme, Ty};

    #[test]
    fn inner_shadows_outer_until_pop() {
        let mut env = TypeEnv::new();
        env.define("x", Scheme::mono(Ty::con("int")));
        env.push();
        env.define("x", Scheme::mono(Ty::con("string")));
        assert_eq!(env.lookup("x").unwrap().ty, Ty::con("string"));
        env.pop();
        assert_eq!(env.lookup("x").unwrap().ty, Ty::con("int"));
    }

    #[test]
    fn missing_name_is_none() {
        let env = TypeEnv::new();
        assert!(env.lookup("y").is_none());
    }
}
