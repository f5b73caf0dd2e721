use crate::deploy::error::DiscoveryError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the compose file searched for under the app path.
pub const COMPOSE_FILE: &str = ".sad.docker-compose.yml";

/// Depth-first search under `root` for an entry named `filename`.
///
/// Siblings are visited in file name order, so the result is stable across
/// runs. Walk errors propagate as [`DiscoveryError::Walk`]; a clean walk that
/// finds nothing is [`DiscoveryError::NotFound`].
pub fn find_recursive(root: &Path, filename: &str) -> Result<PathBuf, DiscoveryError> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_name() == filename {
            debug!("Found {} at {}", filename, entry.path().display());
            return Ok(entry.into_path());
        }
    }

    Err(DiscoveryError::NotFound {
        filename: filename.to_string(),
        root: root.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_finds_nested_file() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("target.yml"), "services: {}").unwrap();
        fs::write(dir.path().join("a").join("other.yml"), "").unwrap();

        let found = find_recursive(dir.path(), "target.yml").unwrap();
        assert_eq!(found, nested.join("target.yml"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        fs::write(dir.path().join("a").join("target.yaml"), "").unwrap();

        let error = find_recursive(dir.path(), "target.yml").unwrap_err();
        match error {
            DiscoveryError::NotFound { filename, root } => {
                assert_eq!(filename, "target.yml");
                assert_eq!(root, dir.path());
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_root_is_a_walk_error() {
        let dir = tempdir().unwrap();
        let error = find_recursive(&dir.path().join("absent"), "target.yml").unwrap_err();
        assert!(matches!(error, DiscoveryError::Walk(_)));
    }

    #[test]
    fn test_first_match_in_name_order_wins() {
        let dir = tempdir().unwrap();
        for branch in ["b", "a"] {
            let path = dir.path().join(branch);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join(COMPOSE_FILE), branch).unwrap();
        }

        let found = find_recursive(dir.path(), COMPOSE_FILE).unwrap();
        assert_eq!(found, dir.path().join("a").join(COMPOSE_FILE));
    }
}
