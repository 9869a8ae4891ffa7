//! Path normalization for cross-platform assertions.

use std::path::MAIN_SEPARATOR;

/// Converts a single path to its forward-slash form.
///
/// Only the platform separator is rewritten, so on Unix this is the identity.
pub fn to_slash(path: &str) -> String {
    path.replace(MAIN_SEPARATOR, "/")
}

/// Converts every path in `paths` to its forward-slash form, keeping order.
///
/// # Examples
///
/// ```
/// use command_harness_core::to_slash_all;
///
/// let sep = std::path::MAIN_SEPARATOR;
/// let paths = vec![format!("a{sep}b"), "c".to_string()];
/// assert_eq!(to_slash_all(&paths), vec!["a/b", "c"]);
/// ```
pub fn to_slash_all<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths.into_iter().map(|p| to_slash(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_slash_all_preserves_length_and_order() {
        let sep = MAIN_SEPARATOR;
        let input = vec![
            format!("root{sep}sub{sep}file.txt"),
            String::new(),
            format!("{sep}abs{sep}path"),
            "plain".to_string(),
        ];

        let out = to_slash_all(&input);

        assert_eq!(out.len(), input.len());
        assert_eq!(out[0], "root/sub/file.txt");
        assert_eq!(out[1], "");
        assert_eq!(out[2], "/abs/path");
        assert_eq!(out[3], "plain");
        if sep != '/' {
            assert!(out.iter().all(|p| !p.contains(sep)));
        }
    }

    #[test]
    fn test_to_slash_all_empty() {
        let empty: Vec<String> = Vec::new();
        assert!(to_slash_all(empty).is_empty());
    }

    #[test]
    fn test_to_slash_keeps_forward_slashes() {
        assert_eq!(to_slash("already/forward/slashes"), "already/forward/slashes");
    }
}
