//! Runtime-library metadata seeding.
//!
//! The runtime package is implicitly importable from every Gala file,
//! so the analyzer pre-registers its surface: `Immutable`, `Option`
//! with its `Some`/`None` companions, the tuple family, and the free
//! helper functions the transformer emits calls to.

use gala_syntax::Type;
use rustc_hash::FxHashMap;

use crate::metadata::{
    CompanionObjectMetadata, FunctionMetadata, MethodMetadata, TypeMetadata,
};
use crate::packages::STD_PKG;

fn t(name: &str) -> Type {
    Type::named("", name)
}

fn std_ty(name: &str, params: Vec<Type>) -> Type {
    if params.is_empty() {
        Type::named(STD_PKG, name)
    } else {
        Type::generic(Type::named(STD_PKG, name), params)
    }
}

/// Register runtime types, companions, and functions into the shared
/// tables.
pub fn register_std(
    types: &mut FxHashMap<String, TypeMetadata>,
    functions: &mut FxHashMap<String, FunctionMetadata>,
    companions: &mut FxHashMap<String, CompanionObjectMetadata>,
) {
    // Immutable[T] with Get.
    let mut immutable = TypeMetadata::new(STD_PKG, "Immutable");
    immutable.type_params = vec!["T".into()];
    immutable.methods.insert(
        "Get".into(),
        MethodMetadata {
            param_types: vec![],
            type_params: vec![],
            is_generic: true,
            result_types: vec![t("T")],
        },
    );
    types.insert(immutable.name.clone(), immutable);

    // Option[T] with IsDefined/IsEmpty/Get.
    let mut option = TypeMetadata::new(STD_PKG, "Option");
    option.type_params = vec!["T".into()];
    for (name, result) in [
        ("IsDefined", Type::basic("bool")),
        ("IsEmpty", Type::basic("bool")),
        ("Get", t("T")),
    ] {
        option.methods.insert(
            name.into(),
            MethodMetadata {
                param_types: vec![],
                type_params: vec![],
                is_generic: true,
                result_types: vec![result],
            },
        );
    }
    types.insert(option.name.clone(), option);

    // Some[T] / None[T]: companion structs whose Apply constructs
    // Option[T].
    let option_of_t = std_ty("Option", vec![t("T")]);
    for (name, apply_params) in [("Some", vec![t("T")]), ("None", vec![])] {
        let mut meta = TypeMetadata::new(STD_PKG, name);
        meta.type_params = vec!["T".into()];
        meta.methods.insert(
            "Apply".into(),
            MethodMetadata {
                param_types: apply_params.clone(),
                type_params: vec![],
                is_generic: true,
                result_types: vec![option_of_t.clone()],
            },
        );
        meta.methods.insert(
            "Unapply".into(),
            MethodMetadata {
                param_types: vec![option_of_t.clone()],
                type_params: vec![],
                is_generic: true,
                result_types: vec![option_of_t.clone(), Type::basic("bool")],
            },
        );
        types.insert(meta.name.clone(), meta);
        companions.insert(
            format!("{}.{}", STD_PKG, name),
            CompanionObjectMetadata {
                name: format!("{}.{}", STD_PKG, name),
                package: STD_PKG.into(),
                parent: option_of_t.clone(),
                apply_param_types: apply_params,
                type_params: vec!["T".into()],
            },
        );
    }

    // Tuple family: Tuple[A, B] through Tuple5, public V1..Vn fields.
    for arity in 2..=5usize {
        let simple = if arity == 2 {
            "Tuple".to_string()
        } else {
            format!("Tuple{}", arity)
        };
        let mut meta = TypeMetadata::new(STD_PKG, &simple);
        let params: Vec<String> = (0..arity).map(|i| ((b'A' + i as u8) as char).to_string()).collect();
        for (i, p) in params.iter().enumerate() {
            meta.push_field(&format!("V{}", i + 1), t(p), false);
        }
        meta.type_params = params;
        types.insert(meta.name.clone(), meta);
    }

    // Free runtime helpers.
    let helpers: &[(&str, Vec<Type>, Vec<String>, Vec<Type>)] = &[
        (
            "NewImmutable",
            vec![t("T")],
            vec!["T".into()],
            vec![std_ty("Immutable", vec![t("T")])],
        ),
        ("Copy", vec![t("T")], vec!["T".into()], vec![t("T")]),
        (
            "Equal",
            vec![t("T"), t("T")],
            vec!["T".into()],
            vec![Type::basic("bool")],
        ),
        (
            "UnapplyCheck",
            vec![Type::any(), Type::any()],
            vec![],
            vec![Type::basic("bool")],
        ),
        (
            "UnapplyFull",
            vec![Type::any(), Type::any()],
            vec![],
            vec![Type::any(), Type::basic("bool")],
        ),
        (
            "GetSafe",
            vec![Type::any(), Type::basic("int")],
            vec![],
            vec![Type::any()],
        ),
        (
            "As",
            vec![Type::any()],
            vec!["T".into()],
            vec![t("T"), Type::basic("bool")],
        ),
    ];
    for (name, params, type_params, results) in helpers {
        functions.insert(
            format!("{}.{}", STD_PKG, name),
            FunctionMetadata {
                param_types: params.clone(),
                type_params: type_params.clone(),
                result_types: results.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_tables_register_core_names() {
        let mut types = FxHashMap::default();
        let mut functions = FxHashMap::default();
        let mut companions = FxHashMap::default();
        register_std(&mut types, &mut functions, &mut companions);

        assert!(types.contains_key("galat.Immutable"));
        assert!(types.contains_key("galat.Option"));
        assert!(types.contains_key("galat.Tuple3"));
        assert!(functions.contains_key("galat.NewImmutable"));

        let some = &companions["galat.Some"];
        assert_eq!(some.parent.base_name(), "Option");
        assert_eq!(some.apply_param_types.len(), 1);
        let none = &companions["galat.None"];
        assert!(none.apply_param_types.is_empty());
    }
}
