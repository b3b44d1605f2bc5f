//! The import manager.
//!
//! One registry arbitrates every name-to-package question the
//! transformer asks: explicit imports, aliased imports, wildcard (dot)
//! imports, packages discovered by the analyzer, and clash detection
//! across dot-imported namespaces.

use gala_analyzer::packages::pkg_name_from_path;
use gala_analyzer::RichAst;
use gala_common::SourceError;
use rustc_hash::FxHashMap;

/// One registered import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub path: String,
    pub pkg_name: String,
    /// User-chosen alias; `None` means the package name is used.
    pub alias: Option<String>,
    pub is_dot: bool,
}

impl ImportEntry {
    /// The name this entry is addressed by in source code. Dot entries
    /// are addressed by package name; aliases are irrelevant for them.
    pub fn effective_alias(&self) -> &str {
        if self.is_dot {
            &self.pkg_name
        } else {
            self.alias.as_deref().unwrap_or(&self.pkg_name)
        }
    }
}

/// Registry of imports for one compilation unit, in insertion order.
#[derive(Debug, Default)]
pub struct ImportManager {
    entries: Vec<ImportEntry>,
}

impl ImportManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an import. An unknown package name is derived from the
    /// last path segment. A prior entry for the same path is replaced
    /// in place, keeping its position in insertion order.
    pub fn add(&mut self, path: &str, alias: Option<&str>, is_dot: bool, pkg_name: Option<&str>) {
        let pkg_name = pkg_name
            .map(str::to_string)
            .unwrap_or_else(|| pkg_name_from_path(path));
        let entry = ImportEntry {
            path: path.to_string(),
            pkg_name,
            alias: alias.filter(|a| *a != ".").map(str::to_string),
            is_dot,
        };
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Insert a non-dot entry for every path not already registered.
    /// Explicit imports take precedence.
    pub fn add_from_packages(&mut self, packages: &FxHashMap<String, String>) {
        // Sorted so insertion order is deterministic across runs.
        let mut paths: Vec<&String> = packages.keys().collect();
        paths.sort();
        for path in paths {
            if self.get_by_path(path).is_none() {
                self.add(path, None, false, Some(&packages[path]));
            }
        }
    }

    /// Reconcile a guessed package name once analysis reveals the real
    /// one.
    pub fn update_actual_pkg_name(&mut self, path: &str, pkg_name: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.pkg_name = pkg_name.to_string();
        }
    }

    // ── Lookups ────────────────────────────────────────────────────────

    /// Whether `name` addresses some imported package.
    pub fn is_package(&self, name: &str) -> bool {
        self.get_by_alias(name).is_some()
    }

    pub fn get_by_alias(&self, name: &str) -> Option<&ImportEntry> {
        self.entries.iter().find(|e| e.effective_alias() == name)
    }

    pub fn get_by_path(&self, path: &str) -> Option<&ImportEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn get_by_pkg_name(&self, pkg_name: &str) -> Option<&ImportEntry> {
        self.entries.iter().find(|e| e.pkg_name == pkg_name)
    }

    /// Resolve an addressing alias to the real package name.
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.get_by_alias(alias).map(|e| e.pkg_name.as_str())
    }

    /// The name emitted code must use to address a package: the alias
    /// when one was chosen, the package name otherwise.
    pub fn get_alias(&self, pkg_name: &str) -> Option<&str> {
        self.get_by_pkg_name(pkg_name).map(|e| e.effective_alias())
    }

    pub fn is_dot_imported(&self, pkg_name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_dot && e.pkg_name == pkg_name)
    }

    /// Dot entries in insertion order.
    pub fn dot_imports(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter().filter(|e| e.is_dot)
    }

    /// Non-dot entries in insertion order.
    pub fn non_dot_imports(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter().filter(|e| !e.is_dot)
    }

    /// All entries in insertion order.
    pub fn all(&self) -> &[ImportEntry] {
        &self.entries
    }
}

// ── Clash detection ────────────────────────────────────────────────────

/// Detect symbols exported by more than one dot-imported package.
///
/// Sources: the analyzer's type, function, and companion tables, plus
/// the Go-ecosystem export tables. The error lists every clash, sorted,
/// so the report is deterministic.
pub fn detect_dot_import_clashes(
    rich: &RichAst,
    imports: &ImportManager,
) -> Result<(), SourceError> {
    let mut symbol_sources: FxHashMap<String, Vec<String>> = FxHashMap::default();

    for entry in imports.dot_imports() {
        let pkg = &entry.pkg_name;
        let prefix = format!("{}.", pkg);
        let mut symbols: Vec<String> = Vec::new();
        for key in rich
            .types
            .keys()
            .chain(rich.functions.keys())
            .chain(rich.companion_objects.keys())
        {
            if let Some(name) = key.strip_prefix(&prefix) {
                symbols.push(name.to_string());
            }
        }
        if let Some(exports) = rich.go_exports.get(pkg) {
            symbols.extend(exports.iter().cloned());
        }
        symbols.sort();
        symbols.dedup();
        for symbol in symbols {
            let sources = symbol_sources.entry(symbol).or_default();
            if !sources.contains(pkg) {
                sources.push(pkg.clone());
            }
        }
    }

    let mut clashes: Vec<(String, Vec<String>)> = symbol_sources
        .into_iter()
        .filter(|(_, sources)| sources.len() >= 2)
        .collect();
    if clashes.is_empty() {
        return Ok(());
    }
    clashes.sort_by(|a, b| a.0.cmp(&b.0));
    let lines: Vec<String> = clashes
        .into_iter()
        .map(|(symbol, mut sources)| {
            sources.sort();
            format!(
                "symbol {:?} is exported by multiple dot-imported packages: {}",
                symbol,
                sources.join(", ")
            )
        })
        .collect();
    Err(SourceError::bare(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_derives_pkg_name_from_path() {
        let mut im = ImportManager::new();
        im.add("example.com/geo/shapes", None, false, None);
        let entry = im.get_by_path("example.com/geo/shapes").unwrap();
        assert_eq!(entry.pkg_name, "shapes");
        assert_eq!(entry.effective_alias(), "shapes");
    }

    #[test]
    fn alias_round_trip() {
        let mut im = ImportManager::new();
        im.add("example.com/geo/shapes", Some("sh"), false, Some("shapes"));
        assert_eq!(im.resolve_alias("sh"), Some("shapes"));
        assert_eq!(im.get_alias("shapes"), Some("sh"));
        assert!(im.is_package("sh"));
        assert!(!im.is_package("shapes"));
    }

    #[test]
    fn unaliased_package_addresses_by_name() {
        let mut im = ImportManager::new();
        im.add("fmt", None, false, None);
        assert_eq!(im.resolve_alias("fmt"), Some("fmt"));
        assert_eq!(im.get_alias("fmt"), Some("fmt"));
    }

    #[test]
    fn dot_entries_index_by_pkg_name() {
        let mut im = ImportManager::new();
        im.add("example.com/geo/shapes", Some("ignored"), true, Some("shapes"));
        assert!(im.is_dot_imported("shapes"));
        assert!(im.is_package("shapes"));
        assert_eq!(im.dot_imports().count(), 1);
    }

    #[test]
    fn same_path_replaces_in_place() {
        let mut im = ImportManager::new();
        im.add("a/b", None, false, None);
        im.add("c/d", None, false, None);
        im.add("a/b", Some("bb"), false, None);
        assert_eq!(im.all().len(), 2);
        assert_eq!(im.all()[0].alias.as_deref(), Some("bb"));
    }

    #[test]
    fn add_from_packages_respects_explicit_entries() {
        let mut im = ImportManager::new();
        im.add("example.com/x", Some("xx"), false, Some("x"));
        let mut packages = FxHashMap::default();
        packages.insert("example.com/x".to_string(), "x".to_string());
        packages.insert("example.com/y".to_string(), "y".to_string());
        im.add_from_packages(&packages);
        assert_eq!(im.all().len(), 2);
        assert_eq!(im.get_by_path("example.com/x").unwrap().alias.as_deref(), Some("xx"));
        assert!(im.get_by_path("example.com/y").is_some());
    }

    #[test]
    fn update_actual_pkg_name_reconciles_guess() {
        let mut im = ImportManager::new();
        im.add("example.com/geo/v2", None, false, None);
        assert_eq!(im.get_by_path("example.com/geo/v2").unwrap().pkg_name, "v2");
        im.update_actual_pkg_name("example.com/geo/v2", "geo");
        assert_eq!(im.get_by_path("example.com/geo/v2").unwrap().pkg_name, "geo");
    }
}
