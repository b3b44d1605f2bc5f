//! Sealed-union layout computation.
//!
//! A sealed declaration lowers to one tagged parent struct holding the
//! union of all variant fields. The layout is computed here, in one
//! place, because both the analyzer (metadata) and the transformer
//! (code emission) need the same answers: merged field order, collision
//! prefixing, recursive-field pointer storage, and tag values.

use gala_syntax::ast::SealedDecl;
use gala_syntax::Type;
use serde::Serialize;

/// The computed layout of one sealed union.
#[derive(Debug, Clone, Serialize)]
pub struct SealedLayout {
    pub parent_name: String,
    pub type_params: Vec<String>,
    /// Merged parent fields in emission order.
    pub parent_fields: Vec<SealedField>,
    pub variants: Vec<SealedVariant>,
}

/// One field of the tagged parent struct.
#[derive(Debug, Clone, Serialize)]
pub struct SealedField {
    pub name: String,
    pub ty: Type,
    /// Self-referential fields are stored as `*Parent` to break
    /// value-type recursion.
    pub recursive: bool,
}

/// One variant with its tag and its view into the parent fields.
#[derive(Debug, Clone, Serialize)]
pub struct SealedVariant {
    pub name: String,
    pub tag: u8,
    pub slots: Vec<SealedSlot>,
}

/// Where one declared variant field lives in the parent struct.
#[derive(Debug, Clone, Serialize)]
pub struct SealedSlot {
    /// The field name as declared on the variant.
    pub decl_name: String,
    /// The (possibly variant-prefixed) parent field it maps to.
    pub parent_field: String,
    pub ty: Type,
    pub recursive: bool,
}

/// Compute the layout of a sealed declaration.
pub fn sealed_layout(decl: &SealedDecl) -> SealedLayout {
    // Detect, per field name, whether all declaring variants agree on
    // the type. Disagreement forces variant-name prefixing for every
    // occurrence of that field name.
    let mut seen: Vec<(String, Type)> = Vec::new();
    let mut contested: Vec<String> = Vec::new();
    for variant in &decl.variants {
        for field in &variant.fields {
            let ty = Type::from_type_expr(&field.ty);
            match seen.iter().find(|(n, _)| n == &field.name) {
                Some((_, prior)) if prior != &ty => {
                    if !contested.contains(&field.name) {
                        contested.push(field.name.clone());
                    }
                }
                Some(_) => {}
                None => seen.push((field.name.clone(), ty)),
            }
        }
    }

    let mut parent_fields: Vec<SealedField> = Vec::new();
    let mut variants = Vec::new();
    for (tag, variant) in decl.variants.iter().enumerate() {
        let mut slots = Vec::new();
        for field in &variant.fields {
            let ty = Type::from_type_expr(&field.ty);
            let recursive = is_self_referential(&ty, &decl.name);
            let parent_field = if contested.contains(&field.name) {
                format!("{}{}", variant.name, capitalize(&field.name))
            } else {
                field.name.clone()
            };
            if !parent_fields.iter().any(|f| f.name == parent_field) {
                parent_fields.push(SealedField {
                    name: parent_field.clone(),
                    ty: ty.clone(),
                    recursive,
                });
            }
            slots.push(SealedSlot {
                decl_name: field.name.clone(),
                parent_field,
                ty,
                recursive,
            });
        }
        variants.push(SealedVariant {
            name: variant.name.clone(),
            tag: tag as u8,
            slots,
        });
    }

    SealedLayout {
        parent_name: decl.name.clone(),
        type_params: decl.type_params.iter().map(|p| p.name.clone()).collect(),
        parent_fields,
        variants,
    }
}

/// A field is self-referential when its type text names the parent,
/// either exactly or as the head of a generic application.
fn is_self_referential(ty: &Type, parent: &str) -> bool {
    let text = ty.to_string();
    text == parent || text.starts_with(&format!("{}[", parent))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gala_syntax::build::*;
    use gala_syntax::ast::{Decl, SealedDecl};

    fn as_sealed(decl: Decl) -> SealedDecl {
        match decl {
            Decl::Sealed(s) => s,
            _ => unreachable!(),
        }
    }

    #[test]
    fn disjoint_fields_merge_without_prefixing() {
        let decl = as_sealed(sealed_decl(
            "Shape",
            vec![
                variant("Circle", vec![field("r", tname("int"))]),
                variant(
                    "Rectangle",
                    vec![field("w", tname("int")), field("h", tname("int"))],
                ),
            ],
        ));
        let layout = sealed_layout(&decl);
        let names: Vec<&str> = layout.parent_fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["r", "w", "h"]);
        assert_eq!(layout.variants[0].tag, 0);
        assert_eq!(layout.variants[1].tag, 1);
    }

    #[test]
    fn same_name_same_type_is_shared() {
        let decl = as_sealed(sealed_decl(
            "Op",
            vec![
                variant("Add", vec![field("left", tname("int"))]),
                variant("Sub", vec![field("left", tname("int"))]),
            ],
        ));
        let layout = sealed_layout(&decl);
        assert_eq!(layout.parent_fields.len(), 1);
        assert_eq!(layout.variants[0].slots[0].parent_field, "left");
        assert_eq!(layout.variants[1].slots[0].parent_field, "left");
    }

    #[test]
    fn conflicting_types_are_variant_prefixed() {
        let decl = as_sealed(sealed_decl(
            "Op",
            vec![
                variant("Add", vec![field("left", tname("int"))]),
                variant("Sub", vec![field("left", tname("string"))]),
            ],
        ));
        let layout = sealed_layout(&decl);
        let names: Vec<&str> = layout.parent_fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["AddLeft", "SubLeft"]);
    }

    #[test]
    fn self_referential_fields_are_marked_recursive() {
        let decl = as_sealed(sealed_decl(
            "Expr",
            vec![
                variant("Num", vec![field("v", tname("int"))]),
                variant(
                    "Neg",
                    vec![field("inner", tname("Expr"))],
                ),
            ],
        ));
        let layout = sealed_layout(&decl);
        let inner = layout
            .parent_fields
            .iter()
            .find(|f| f.name == "inner")
            .unwrap();
        assert!(inner.recursive);
    }
}
