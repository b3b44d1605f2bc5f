//! Exported-symbol tables for the Go packages generated code can touch.
//!
//! Dot-import clash detection needs to know what names a wildcard
//! import of a plain Go package would inject. The table is static and
//! deliberately partial: it lists the symbols the runtime and the
//! emitted code actually reach for, which is what a clash against a
//! managed dot import would collide with.

use rustc_hash::FxHashMap;

/// Build the package -> exported symbols table.
pub fn go_exports() -> FxHashMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        (
            "fmt",
            &[
                "Errorf", "Fprintf", "Fprintln", "Print", "Printf", "Println", "Sprint",
                "Sprintf", "Sprintln", "Stringer",
            ],
        ),
        (
            "strings",
            &[
                "Builder", "Contains", "HasPrefix", "HasSuffix", "Index", "Join", "Repeat",
                "Replace", "ReplaceAll", "Split", "ToLower", "ToUpper", "TrimSpace",
            ],
        ),
        (
            "strconv",
            &["Atoi", "FormatBool", "FormatFloat", "FormatInt", "Itoa", "ParseBool", "ParseFloat", "ParseInt", "Quote"],
        ),
        (
            "time",
            &["After", "Duration", "Hour", "Millisecond", "Minute", "Now", "Second", "Since", "Sleep", "Time", "Tick"],
        ),
        (
            "math",
            &["Abs", "Ceil", "Floor", "Inf", "Max", "MaxInt", "Min", "MinInt", "Mod", "NaN", "Pow", "Sqrt"],
        ),
        ("errors", &["As", "Is", "Join", "New", "Unwrap"]),
        ("os", &["Args", "Exit", "Getenv", "Open", "ReadFile", "Stderr", "Stdin", "Stdout", "WriteFile"]),
        ("sort", &["Ints", "Slice", "SliceStable", "Sort", "Strings"]),
    ];

    table
        .iter()
        .map(|(pkg, names)| {
            (
                pkg.to_string(),
                names.iter().map(|n| n.to_string()).collect(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_packages_present() {
        let exports = go_exports();
        assert!(exports["fmt"].contains(&"Println".to_string()));
        assert!(exports["time"].contains(&"Sleep".to_string()));
    }
}
