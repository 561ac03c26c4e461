//! src/test_utils.rs
use std::path::{Path, PathBuf};

/// Writes the given (name, contents) pairs into `dir` and returns the
/// resulting paths sorted by name, matching the order the engine discovers
/// input files in.
pub fn write_corpus(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        paths.push(path);
    }
    paths.sort();
    paths
}
