//! Lexical path helpers. Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Resolves `.` and `..` components without following links.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Joins a document-relative filename onto the document directory.
pub fn resolve(base_dir: &Path, filename: &str) -> PathBuf {
    normalize_lexically(&base_dir.join(filename))
}

/// Expresses `path` relative to `base_dir`. Returns `path` unchanged when one
/// is absolute and the other is not.
pub fn relative_path(path: &Path, base_dir: &Path) -> PathBuf {
    let path = normalize_lexically(path);
    let base = normalize_lexically(base_dir);
    if path.is_absolute() != base.is_absolute() {
        return path;
    }
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();
    let common = path_parts.iter().zip(&base_parts).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part);
    }
    relative
}

/// Renders a path with forward slashes.
pub fn posix_string(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::RootDir => out.push('/'),
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_normalization() {
        assert_eq!(normalize_lexically(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize_lexically(Path::new("../x/../y")), PathBuf::from("../y"));
    }

    #[test]
    fn relative_paths() {
        let rel = relative_path(Path::new("/work/masters/A.ufo"), Path::new("/work/family"));
        assert_eq!(posix_string(&rel), "../masters/A.ufo");
        let rel = relative_path(Path::new("/work/A.ufo"), Path::new("/work"));
        assert_eq!(posix_string(&rel), "A.ufo");
        let rel = relative_path(Path::new("masters/A.ufo"), Path::new(""));
        assert_eq!(posix_string(&rel), "masters/A.ufo");
    }

    #[test]
    fn resolve_against_directory() {
        assert_eq!(resolve(Path::new("/work/family"), "../masters/A.ufo"), PathBuf::from("/work/masters/A.ufo"));
    }

    #[test]
    fn posix_rendering() {
        assert_eq!(posix_string(Path::new("/a/b")), "/a/b");
        assert_eq!(posix_string(Path::new("a/b/c.ufo")), "a/b/c.ufo");
    }
}
