//! Source file classification and component keys.

use std::path::{Component, Path, PathBuf};

/// Extensions of the C/C++ sources the tools are run against.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["cpp", "cc", "c", "h", "hpp"];

/// Returns `true` if the file is a C/C++ source the analyzer handles.
pub fn is_supported_source(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Makes a path absolute and removes `.` and `..` components without
/// touching the file system.
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Returns `true` if both paths name the same file.
pub fn same_file(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    let (a, b) = (normalize_path(a), normalize_path(b));
    if cfg!(windows) {
        a.to_string_lossy()
            .eq_ignore_ascii_case(&b.to_string_lossy())
    } else {
        a == b
    }
}

/// Builds the `projectKey:relative/path` key of a file below `root`.
///
/// Returns `None` if the file is not inside `root`.
pub fn component_key(project_key: &str, root: impl AsRef<Path>, file: impl AsRef<Path>) -> Option<String> {
    let root = normalize_path(root);
    let file = normalize_path(file);
    let relative = file.strip_prefix(&root).ok()?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }

    Some(format!("{}:{}", project_key, parts.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("a.cpp", true)]
    #[case("a.CC", true)]
    #[case("dir/a.c", true)]
    #[case("a.h", true)]
    #[case("a.HPP", true)]
    #[case("a.cxx", false)]
    #[case("a.md", false)]
    #[case("Makefile", false)]
    #[case("cpp", false)]
    fn test_is_supported_source(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_supported_source(path), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/src/./lib/../a.cpp"),
            PathBuf::from("/src/a.cpp")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_same_file() {
        assert!(same_file("/src/a.cpp", "/src/lib/../a.cpp"));
        assert!(!same_file("/src/a.cpp", "/src/b.cpp"));
    }

    #[test]
    fn test_same_file_relative_and_absolute() {
        let relative = Path::new("src/a.cpp");
        let absolute = std::env::current_dir().unwrap().join(relative);
        assert!(same_file(relative, absolute));
    }

    #[cfg(unix)]
    #[rstest]
    #[case("/work/proj", "/work/proj/src/a.cpp", Some("proj:src/a.cpp"))]
    #[case("/work/proj/", "/work/proj/a.h", Some("proj:a.h"))]
    #[case("/work/proj", "/elsewhere/a.cpp", None)]
    #[case("/work/proj", "/work/proj", None)]
    fn test_component_key(#[case] root: &str, #[case] file: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            component_key("proj", root, file).as_deref(),
            expected
        );
    }
}
