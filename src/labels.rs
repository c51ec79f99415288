//! Plain-text label files for third-party tools.

use std::{fs, path::PathBuf};

use anyhow::{Context as _, Result};

#[derive(Debug, Clone)]
pub struct LabelFiles {
    current: PathBuf,
    next: PathBuf,
}

impl LabelFiles {
    #[must_use]
    pub const fn new(current: PathBuf, next: PathBuf) -> Self {
        Self { current, next }
    }

    /// Overwrite both files with the given labels.
    ///
    /// Both writes are attempted even if the first one fails.
    ///
    /// # Errors
    ///
    /// Returns the first write failure.
    pub fn write(&self, current: &str, next: &str) -> Result<()> {
        let current_result = fs::write(&self.current, current)
            .with_context(|| format!("Failed to write {}", self.current.display()));
        let next_result = fs::write(&self.next, next)
            .with_context(|| format!("Failed to write {}", self.next.display()));
        current_result.and(next_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_both_files() {
        let dir = std::env::temp_dir().join(format!("vmix-titles-labels-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let files = LabelFiles::new(dir.join("current.txt"), dir.join("next.txt"));

        files.write("A much longer first title", "B").unwrap();
        files.write("C", "").unwrap();

        assert_eq!(fs::read_to_string(dir.join("current.txt")).unwrap(), "C");
        assert_eq!(fs::read_to_string(dir.join("next.txt")).unwrap(), "");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reports_failures() {
        let missing = std::env::temp_dir()
            .join(format!("vmix-titles-missing-{}", std::process::id()))
            .join("nested");
        let files = LabelFiles::new(missing.join("current.txt"), missing.join("next.txt"));
        assert!(files.write("A", "B").is_err());
    }
}
