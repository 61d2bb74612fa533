use std::path::Path;

/// Filename endings that never carry reviewable code
pub const EXCLUDED_SUFFIXES: [&str; 6] = [
    ".lock",
    ".sum",
    ".mod",
    "package-lock.json",
    "yarn.lock",
    ".DS_Store",
];

/// Language label for a file, by extension. Unknown extensions are `text`.
pub fn detect_language(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "rb" => "ruby",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "sh" => "bash",
        "md" => "markdown",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        _ => "text",
    }
}

/// Lockfiles, checksum manifests and Finder droppings
pub fn is_excluded(filename: &str) -> bool {
    EXCLUDED_SUFFIXES
        .iter()
        .any(|suffix| filename.ends_with(suffix))
}
