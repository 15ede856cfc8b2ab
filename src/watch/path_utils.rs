// src/watch/path_utils.rs

//! Path helpers shared by the scanner and the change-set display code.

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if `path` is not under `root`. Scanner paths are always
/// built by joining onto their root, so no canonicalization is attempted.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// Render a path with forward slashes for logs.
pub fn display_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_str_strips_root_or_gives_up() {
        assert_eq!(
            relative_str(Path::new("proj/src"), Path::new("proj/src/a/B.java")),
            Some("a/B.java".to_string())
        );
        assert_eq!(relative_str(Path::new("proj/src"), Path::new("other/B.java")), None);
    }
}
