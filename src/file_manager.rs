use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem access below the mirror root.
#[derive(Clone, Debug)]
pub struct FileManager {
    base_dir: PathBuf,
}

impl FileManager {
    pub fn new(base_dir: &Path) -> Result<Self> {
        let base_dir = base_dir.to_path_buf();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create base directory: {:?}", base_dir))?;

        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Absolute location of a mirror-relative path.
    ///
    /// Empty, `.` and `..` segments are dropped so the result never leaves
    /// the base directory.
    pub fn local_path(&self, relative_path: &str) -> PathBuf {
        let mut path = self.base_dir.clone();
        for segment in relative_path
            .split('/')
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        {
            path.push(segment);
        }
        path
    }

    /// Writes `content` to `relative_path`, creating parent directories and
    /// overwriting any existing file.
    pub fn save_file(&self, relative_path: &str, content: &[u8]) -> io::Result<PathBuf> {
        let file_path = self.local_path(relative_path);
        if file_path == self.base_dir {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{:?} does not name a file", relative_path),
            ));
        }

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;

        Ok(file_path)
    }

    /// Reads a previously saved file as text, replacing invalid UTF-8.
    pub fn read_to_string(&self, relative_path: &str) -> io::Result<String> {
        let bytes = fs::read(self.local_path(relative_path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_creates_base_dir() {
        let temp = tempdir().unwrap();
        let root = temp.path().join("nested/out");
        let manager = FileManager::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(manager.base_dir(), root.as_path());
    }

    #[test]
    fn test_save_creates_parents() {
        let temp = tempdir().unwrap();
        let manager = FileManager::new(temp.path()).unwrap();

        let saved = manager.save_file("css/fonts/a.woff", b"font").unwrap();
        assert_eq!(saved, temp.path().join("css").join("fonts").join("a.woff"));
        assert_eq!(fs::read(&saved).unwrap(), b"font");
        assert!(manager.local_path("css/fonts/a.woff").is_file());
    }

    #[test]
    fn test_save_overwrites() {
        let temp = tempdir().unwrap();
        let manager = FileManager::new(temp.path()).unwrap();

        manager.save_file("a.txt", b"first").unwrap();
        manager.save_file("a.txt", b"second").unwrap();
        assert_eq!(manager.read_to_string("a.txt").unwrap(), "second");
    }

    #[test]
    fn test_local_path_stays_under_root() {
        let temp = tempdir().unwrap();
        let manager = FileManager::new(temp.path()).unwrap();

        let path = manager.local_path("../../etc/./passwd");
        assert_eq!(path, temp.path().join("etc").join("passwd"));
        assert!(path.starts_with(temp.path()));
    }

    #[test]
    fn test_save_rejects_root() {
        let temp = tempdir().unwrap();
        let manager = FileManager::new(temp.path()).unwrap();

        let err = manager.save_file("..", b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_read_is_lossy() {
        let temp = tempdir().unwrap();
        let manager = FileManager::new(temp.path()).unwrap();

        manager.save_file("bad.css", &[b'a', 0xff, b'b']).unwrap();
        assert_eq!(manager.read_to_string("bad.css").unwrap(), "a\u{fffd}b");
    }
}
