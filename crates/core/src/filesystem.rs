//! Filesystem Capability (spec §4.2): path existence, read/write,
//! recursive remove, mkdir, advisory file lock, atomic write, glob, path
//! containment check.

use std::{
    collections::{HashMap, HashSet},
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use fs4::fs_std::FileExt;

pub use utils::path::is_path_within_base;

/// A held advisory lock, released on every exit path via `Drop`.
pub struct FileLockHandle(FileLockHandleInner);

enum FileLockHandleInner {
    Os(std::fs::File),
    Fake(Arc<Mutex<HashSet<PathBuf>>>, PathBuf),
}

impl Drop for FileLockHandle {
    fn drop(&mut self) {
        match &self.0 {
            FileLockHandleInner::Os(file) => {
                let _ = FileExt::unlock(file);
            }
            FileLockHandleInner::Fake(locks, path) => {
                locks.lock().unwrap().remove(path);
            }
        }
    }
}

pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;
    fn create_file_with_content(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;
    fn mkdir_all(&self, path: &Path) -> io::Result<()>;
    fn remove_all(&self, path: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>>;
    fn is_path_within_base(&self, base: &Path, candidate: &Path) -> bool {
        is_path_within_base(base, candidate)
    }
    fn write_file_atomic(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;
    fn file_lock(&self, path: &Path) -> io::Result<FileLockHandle>;
}

/// The real filesystem, backed by `std::fs`.
#[derive(Clone, Default)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        std::fs::write(path, data)
    }

    fn create_file_with_content(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        use std::io::Write as _;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        {
            let _ = mode;
        }
        let mut file = options.open(path)?;
        file.write_all(data)
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            std::fs::remove_dir_all(path)
        } else if path.exists() {
            std::fs::remove_file(path)
        } else {
            Ok(())
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if path.is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            entries.push(entry?.path());
        }
        entries.sort();
        Ok(entries)
    }

    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let paths = glob::glob(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        for entry in paths {
            if let Ok(path) = entry {
                out.push(path);
            }
        }
        Ok(out)
    }

    fn write_file_atomic(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        use std::io::Write as _;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = tmp.as_file().metadata()?.permissions();
            perms.set_mode(mode);
            tmp.as_file().set_permissions(perms)?;
        }
        #[cfg(not(unix))]
        {
            let _ = mode;
        }
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn file_lock(&self, path: &Path) -> io::Result<FileLockHandle> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)?;
        FileExt::lock_exclusive(&file)?;
        Ok(FileLockHandle(FileLockHandleInner::Os(file)))
    }
}

/// In-memory fake used by orchestrator/engine tests, avoiding a
/// mock-generation framework (spec §9 Design Notes).
#[derive(Clone, Default)]
pub struct InMemoryFilesystem {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    dirs: Arc<Mutex<HashSet<PathBuf>>>,
    locks: Arc<Mutex<HashSet<PathBuf>>>,
}

impl InMemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filesystem for InMemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.dirs.lock().unwrap().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn create_file_with_content(&self, path: &Path, data: &[u8], _mode: u32) -> io::Result<()> {
        let mut files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Err(io::Error::from(io::ErrorKind::AlreadyExists));
        }
        files.insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn mkdir_all(&self, path: &Path) -> io::Result<()> {
        let mut dirs = self.dirs.lock().unwrap();
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            dirs.insert(current.clone());
        }
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        self.files.lock().unwrap().retain(|p, _| !p.starts_with(path));
        self.dirs.lock().unwrap().retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        if self.files.lock().unwrap().remove(path).is_some() {
            return Ok(());
        }
        if self.dirs.lock().unwrap().remove(path) {
            return Ok(());
        }
        Err(io::Error::from(io::ErrorKind::NotFound))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut out: Vec<PathBuf> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        out.extend(
            self.dirs
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.parent() == Some(path))
                .cloned(),
        );
        out.sort();
        Ok(out)
    }

    fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
        // No shell-glob semantics in the fake; exact non-wildcard paths only.
        let path = PathBuf::from(pattern);
        if self.exists(&path) {
            Ok(vec![path])
        } else {
            Ok(Vec::new())
        }
    }

    fn write_file_atomic(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        self.write_file(path, data)?;
        let _ = mode;
        Ok(())
    }

    fn file_lock(&self, path: &Path) -> io::Result<FileLockHandle> {
        let mut locks = self.locks.lock().unwrap();
        if !locks.insert(path.to_path_buf()) {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        drop(locks);
        Ok(FileLockHandle(FileLockHandleInner::Fake(
            self.locks.clone(),
            path.to_path_buf(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_filesystem_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFilesystem;
        let path = dir.path().join("a.txt");
        fs.write_file(&path, b"hello").unwrap();
        assert_eq!(fs.read_file(&path).unwrap(), b"hello");
    }

    #[test]
    fn real_filesystem_atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFilesystem;
        let path = dir.path().join("registry.toml");
        fs.write_file_atomic(&path, b"one", 0o644).unwrap();
        fs.write_file_atomic(&path, b"two", 0o644).unwrap();
        assert_eq!(fs.read_file(&path).unwrap(), b"two");
    }

    #[test]
    fn in_memory_filesystem_mkdir_all_marks_every_ancestor() {
        let fs = InMemoryFilesystem::new();
        fs.mkdir_all(Path::new("/repos/a/origin/feature-x")).unwrap();
        assert!(fs.is_dir(Path::new("/repos/a")));
        assert!(fs.is_dir(Path::new("/repos/a/origin/feature-x")));
    }

    #[test]
    fn in_memory_filesystem_lock_rejects_concurrent_holder() {
        let fs = InMemoryFilesystem::new();
        let path = Path::new("/registry.toml");
        let guard = fs.file_lock(path).unwrap();
        assert!(fs.file_lock(path).is_err());
        drop(guard);
        assert!(fs.file_lock(path).is_ok());
    }
}
