//! Variable scopes.
//!
//! A chain of frames mapping names to their binding kind (`val` or
//! `var`) and known type. Frames are pushed on function, block, lambda,
//! and match entry and popped on exit; lookup walks outward. Scopes
//! never outlive the transformer run that created them.

use gala_common::SourceError;
use gala_syntax::Type;
use rustc_hash::FxHashMap;

/// One binding: whether it is immutable, and its raw (unwrapped) type.
#[derive(Debug, Clone)]
pub struct Binding {
    pub is_val: bool,
    pub ty: Type,
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<FxHashMap<String, Binding>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        assert!(self.frames.len() > 1, "cannot pop the file scope");
        self.frames.pop();
    }

    /// Declare a binding in the innermost frame.
    pub fn declare(&mut self, name: &str, is_val: bool, ty: Type) {
        self.frames
            .last_mut()
            .expect("frame stack is never empty")
            .insert(name.to_string(), Binding { is_val, ty });
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|f| f.get(name))
    }

    /// Check that assigning to `name` is legal.
    pub fn check_assign(&self, name: &str) -> Result<(), SourceError> {
        match self.lookup(name) {
            Some(binding) if binding.is_val => Err(SourceError::bare(format!(
                "cannot assign to immutable variable {}",
                name
            ))),
            Some(_) => Ok(()),
            None => Err(SourceError::bare(format!("unknown variable {}", name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", true, Type::basic("int"));
        scopes.push();
        assert!(scopes.lookup("x").unwrap().is_val);
        scopes.declare("x", false, Type::basic("string"));
        assert!(!scopes.lookup("x").unwrap().is_val);
        scopes.pop();
        assert!(scopes.lookup("x").unwrap().is_val);
    }

    #[test]
    fn assign_to_val_is_rejected() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", true, Type::basic("int"));
        let err = scopes.check_assign("x").unwrap_err();
        assert_eq!(err.message, "cannot assign to immutable variable x");
    }

    #[test]
    fn assign_to_var_is_fine() {
        let mut scopes = ScopeStack::new();
        scopes.declare("y", false, Type::basic("int"));
        assert!(scopes.check_assign("y").is_ok());
    }

    #[test]
    fn assign_to_unknown_is_rejected() {
        let scopes = ScopeStack::new();
        let err = scopes.check_assign("ghost").unwrap_err();
        assert_eq!(err.message, "unknown variable ghost");
    }
}
