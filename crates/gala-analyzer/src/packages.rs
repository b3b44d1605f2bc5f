//! Package-path conventions of the managed Gala ecosystem.

/// Path prefix marking a package as part of the managed ecosystem.
/// External imports (a plain Go library) lack this marker, and their
/// simple names must not shadow managed names during resolution.
pub const MANAGED_PATH_MARKER: &str = "galalang.org/";

/// Import path of the runtime support library.
pub const STD_PATH: &str = "galalang.org/x/galat";

/// Package name of the runtime support library.
pub const STD_PKG: &str = "galat";

/// Derive a package name from the last segment of an import path.
pub fn pkg_name_from_path(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Whether an import path belongs to the managed ecosystem.
pub fn is_managed_path(path: &str) -> bool {
    path.starts_with(MANAGED_PATH_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkg_name_is_last_segment() {
        assert_eq!(pkg_name_from_path("galalang.org/x/galat"), "galat");
        assert_eq!(pkg_name_from_path("fmt"), "fmt");
        assert_eq!(pkg_name_from_path("example.com/geo/shapes"), "shapes");
    }

    #[test]
    fn managed_marker() {
        assert!(is_managed_path(STD_PATH));
        assert!(!is_managed_path("fmt"));
        assert!(!is_managed_path("github.com/rs/zerolog"));
    }
}
