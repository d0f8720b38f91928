use std::path::{Path, PathBuf};

/// Looks for `file_name` in `start` and each of its ancestors.
pub fn find_file_upwards(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|file_path| file_path.exists())
}
