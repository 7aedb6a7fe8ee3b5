use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;

/// Expand `~` and environment variables in a UTF-8 path. Anything that
/// cannot be expanded is returned unchanged with a warning
fn expand(input: &Path) -> PathBuf {
    let Some(s) = input.to_str() else {
        warn!("Path {:?} is not valid UTF-8, not expanding it", input);
        return input.to_path_buf();
    };
    match shellexpand::full(s) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            warn!("Could not expand path {:?} ({}), using it as given", input, e);
            input.to_path_buf()
        }
    }
}

///////////////////////////////
/// Expanded, absolute form of a command line path. Existing paths are
/// canonicalised; a path that does not exist yet is joined onto the
/// working directory instead of failing
pub fn expand_and_resolve_path<P: AsRef<Path>>(input: P) -> Result<PathBuf> {
    let expanded = expand(input.as_ref());
    if let Ok(canonical) = fs::canonicalize(&expanded) {
        return Ok(canonical);
    }
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(expanded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_becomes_absolute() {
        let p = expand_and_resolve_path("surely/not/here.txt").unwrap();
        assert!(p.is_absolute());
        assert!(p.ends_with("surely/not/here.txt"));
    }

    #[test]
    fn test_existing_dir_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let p = expand_and_resolve_path(dir.path()).unwrap();
        assert_eq!(p, fs::canonicalize(dir.path()).unwrap());
    }
}
