use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `VALPRO_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.valpro/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_project(&cwd).unwrap_or(cwd)
}

fn find_project(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(valpro_core::paths::VALPRO_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_project_from_subdirectory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".valpro")).unwrap();
        let deep = dir.path().join("reports/2024");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_project(&deep).unwrap(), dir.path());
    }

    #[test]
    fn no_project_found() {
        let dir = TempDir::new().unwrap();
        let deep = dir.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        // Ancestors above the tempdir could in principle hold a project;
        // only assert nothing inside the tempdir matched.
        if let Some(found) = find_project(&deep) {
            assert!(!found.starts_with(dir.path()));
        }
    }
}
