//! Per-symbol metadata tables.
//!
//! Every name in these tables is package-qualified (`main.Point`,
//! `galat.Option`); the transformer's unified resolver produces the
//! qualified candidates it probes the tables with.

use gala_syntax::Type;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Metadata for one user-declared (or runtime-provided) type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeMetadata {
    /// Package-qualified name.
    pub name: String,
    pub package: String,
    /// Declared type parameter names, in order.
    pub type_params: Vec<String>,
    /// Field names in declaration order.
    pub field_names: Vec<String>,
    /// Field name -> declared type.
    pub fields: FxHashMap<String, Type>,
    /// Per-field immutability, parallel to `field_names`.
    pub immut_flags: Vec<bool>,
    /// Method name -> metadata.
    pub methods: FxHashMap<String, MethodMetadata>,
}

impl TypeMetadata {
    pub fn new(package: &str, simple_name: &str) -> Self {
        TypeMetadata {
            name: format!("{}.{}", package, simple_name),
            package: package.to_string(),
            ..Default::default()
        }
    }

    /// Append a field, maintaining the parallel-arrays invariant.
    pub fn push_field(&mut self, name: &str, ty: Type, immutable: bool) {
        self.field_names.push(name.to_string());
        self.fields.insert(name.to_string(), ty);
        self.immut_flags.push(immutable);
        debug_assert_eq!(self.field_names.len(), self.immut_flags.len());
    }

    /// Whether the field at `name` is immutable. Unknown fields answer
    /// false.
    pub fn is_field_immutable(&self, name: &str) -> bool {
        self.field_names
            .iter()
            .position(|f| f == name)
            .map(|i| self.immut_flags[i])
            .unwrap_or(false)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

/// Metadata for a method attached to a type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MethodMetadata {
    pub param_types: Vec<Type>,
    /// The method's own type parameters (not the receiver's).
    pub type_params: Vec<String>,
    /// True iff the method or its container has type parameters.
    pub is_generic: bool,
    /// Empty for void.
    pub result_types: Vec<Type>,
}

/// Metadata for a free function. Same shape as a method, no receiver.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionMetadata {
    pub param_types: Vec<Type>,
    pub type_params: Vec<String>,
    pub result_types: Vec<Type>,
}

/// A companion object: a name that, when applied, constructs a variant
/// of a sealed parent.
#[derive(Debug, Clone, Serialize)]
pub struct CompanionObjectMetadata {
    /// Package-qualified companion name (`main.Circle`).
    pub name: String,
    pub package: String,
    /// The sealed parent this companion constructs.
    pub parent: Type,
    /// Positional parameter types of the generated `Apply`.
    pub apply_param_types: Vec<Type>,
    /// Type parameters inherited from the sealed parent.
    pub type_params: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_field_keeps_parallel_arrays() {
        let mut meta = TypeMetadata::new("main", "Point");
        meta.push_field("x", Type::basic("int"), true);
        meta.push_field("y", Type::basic("int"), false);
        assert_eq!(meta.name, "main.Point");
        assert_eq!(meta.field_names, vec!["x", "y"]);
        assert_eq!(meta.immut_flags, vec![true, false]);
        assert!(meta.is_field_immutable("x"));
        assert!(!meta.is_field_immutable("y"));
        assert!(!meta.is_field_immutable("z"));
    }
}
