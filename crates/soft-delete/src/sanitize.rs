//! Helpers for names and paths that end up on disk or in log fields.

use std::path::Path;

const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the item name without exposing the
/// project layout.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Turns a display name into a single, portable path component.
///
/// Separators, characters Windows refuses in file names and control
/// characters become `_`. Names that would resolve to the parent or current
/// directory fall back to `item`.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if RESERVED.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_end_matches(['.', ' ']).to_string();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "item".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/projects/demo/shots/sh010/Comp/shot010_comp_v003.nk")),
            "shot010_comp_v003.nk"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_component("sq01_sh010_Lighting"), "sq01_sh010_Lighting");
        assert_eq!(sanitize_component("shot010_comp_v003.nk"), "shot010_comp_v003.nk");
    }

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_component("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_component("what?*"), "what__");
    }

    #[test]
    fn test_sanitize_rejects_dot_names() {
        assert_eq!(sanitize_component(""), "item");
        assert_eq!(sanitize_component("   "), "item");
        assert_eq!(sanitize_component(".."), "item");
        assert_eq!(sanitize_component("name."), "name");
    }
}
