//! Unified name resolution.
//!
//! Every table lookup in the transformer -- types, functions, companion
//! objects, struct fields, generic-method flags -- goes through this one
//! routine, parameterized by an existence predicate, so all of them see
//! the same search order:
//!
//! 1. the raw name, exactly as written;
//! 2. with a `pkg.` prefix stripped, unless the prefix addresses an
//!    external (non-managed, non-dot) import;
//! 3. qualified with the runtime package;
//! 4. qualified with the current package;
//! 5. qualified with each dot-imported package, in insertion order;
//! 6. qualified with each non-dot imported package, in insertion order.
//!
//! Dot imports outrank non-dot imports because they inject symbols into
//! the current namespace by design.

use gala_analyzer::packages::{is_managed_path, STD_PKG};

use crate::imports::ImportManager;

/// The packages visible to a resolution.
pub struct ResolveCtx<'a> {
    pub current_pkg: &'a str,
    pub imports: &'a ImportManager,
}

/// Resolve a raw identifier to the qualified key for which `exists`
/// answers true, or `None` when nothing matches.
pub fn resolve_name<F>(raw: &str, ctx: &ResolveCtx<'_>, exists: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    // 1. Exact match.
    if exists(raw) {
        return Some(raw.to_string());
    }

    // 2. Strip a package prefix, unless it addresses an external
    //    import. External packages must not have their unqualified
    //    simple names shadow managed-ecosystem names.
    let simple = match raw.split_once('.') {
        Some((prefix, rest)) => {
            if let Some(entry) = ctx.imports.get_by_alias(prefix) {
                if !entry.is_dot && !is_managed_path(&entry.path) {
                    return None;
                }
            }
            rest
        }
        None => raw,
    };

    // 3. The runtime package.
    let candidate = format!("{}.{}", STD_PKG, simple);
    if exists(&candidate) {
        return Some(candidate);
    }

    // 4. The current package.
    let candidate = format!("{}.{}", ctx.current_pkg, simple);
    if exists(&candidate) {
        return Some(candidate);
    }

    // 5. Dot-imported packages, in insertion order.
    for entry in ctx.imports.dot_imports() {
        let candidate = format!("{}.{}", entry.pkg_name, simple);
        if exists(&candidate) {
            return Some(candidate);
        }
    }

    // 6. Non-dot imports, in insertion order.
    for entry in ctx.imports.non_dot_imports() {
        let candidate = format!("{}.{}", entry.pkg_name, simple);
        if exists(&candidate) {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportManager;

    fn table(entries: &[&str]) -> impl Fn(&str) -> bool {
        let owned: Vec<String> = entries.iter().map(|s| s.to_string()).collect();
        move |name: &str| owned.iter().any(|e| e == name)
    }

    #[test]
    fn exact_match_wins() {
        let imports = ImportManager::new();
        let ctx = ResolveCtx {
            current_pkg: "main",
            imports: &imports,
        };
        assert_eq!(
            resolve_name("main.Point", &ctx, table(&["main.Point"])),
            Some("main.Point".to_string())
        );
    }

    #[test]
    fn std_outranks_current_package() {
        let imports = ImportManager::new();
        let ctx = ResolveCtx {
            current_pkg: "main",
            imports: &imports,
        };
        assert_eq!(
            resolve_name("Option", &ctx, table(&["galat.Option", "main.Option"])),
            Some("galat.Option".to_string())
        );
    }

    #[test]
    fn dot_imports_outrank_non_dot() {
        let mut imports = ImportManager::new();
        imports.add("galalang.org/geo/shapes", None, false, Some("shapes"));
        imports.add("galalang.org/geo/curves", Some("."), true, Some("curves"));
        let ctx = ResolveCtx {
            current_pkg: "main",
            imports: &imports,
        };
        assert_eq!(
            resolve_name(
                "Circle",
                &ctx,
                table(&["shapes.Circle", "curves.Circle"])
            ),
            Some("curves.Circle".to_string())
        );
    }

    #[test]
    fn managed_prefix_is_stripped() {
        let mut imports = ImportManager::new();
        imports.add("galalang.org/geo/shapes", Some("sh"), false, Some("shapes"));
        let ctx = ResolveCtx {
            current_pkg: "main",
            imports: &imports,
        };
        // "sh.Circle" is not an exact key, but stripping the managed
        // alias prefix finds the symbol under its real package.
        assert_eq!(
            resolve_name("sh.Circle", &ctx, table(&["shapes.Circle"])),
            Some("shapes.Circle".to_string())
        );
    }

    #[test]
    fn external_prefix_is_not_stripped() {
        let mut imports = ImportManager::new();
        imports.add("github.com/rs/zerolog", None, false, Some("zerolog"));
        let ctx = ResolveCtx {
            current_pkg: "main",
            imports: &imports,
        };
        // zerolog.New must not resolve to some managed "New".
        assert_eq!(
            resolve_name("zerolog.New", &ctx, table(&["galat.New", "main.New"])),
            None
        );
    }

    #[test]
    fn insertion_order_breaks_ties() {
        let mut imports = ImportManager::new();
        imports.add("galalang.org/a", None, false, Some("a"));
        imports.add("galalang.org/b", None, false, Some("b"));
        let ctx = ResolveCtx {
            current_pkg: "main",
            imports: &imports,
        };
        assert_eq!(
            resolve_name("Thing", &ctx, table(&["a.Thing", "b.Thing"])),
            Some("a.Thing".to_string())
        );
    }
}
