//! Filesystem access and library path resolution.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;

/// Environment variable holding extra library directories.
pub const LIBRARY_PATH_VAR: &str = "SCAD_LIBRARY_PATH";

/// The two filesystem questions the cache asks.
pub trait FileSystem {
    /// Modification time of a regular file, `None` if it does not exist.
    fn stat(&self, path: &Path) -> Option<SystemTime>;

    fn read(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn stat(&self, path: &Path) -> Option<SystemTime> {
        let meta = std::fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        meta.modified().ok()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Ordered library directories consulted after the referencing file's own
/// directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        SearchPath {
            dirs: dirs.into_iter().collect(),
        }
    }

    /// Read directories from `SCAD_LIBRARY_PATH` (platform path separator).
    pub fn from_env() -> Self {
        match std::env::var_os(LIBRARY_PATH_VAR) {
            Some(value) => Self::new(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty())),
            None => Self::default(),
        }
    }

    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find an existing file for `spelling`.
    ///
    /// Absolute spellings are checked as-is. Relative ones are tried against
    /// `base_dir` first, then each library directory in order.
    pub fn resolve(
        &self,
        fs: &dyn FileSystem,
        base_dir: Option<&Path>,
        spelling: &str,
    ) -> Option<PathBuf> {
        let spelled = Path::new(spelling);
        if spelled.is_absolute() {
            let path = normalize(spelled);
            return fs.stat(&path).map(|_| path);
        }
        base_dir
            .into_iter()
            .chain(self.dirs.iter().map(PathBuf::as_path))
            .map(|dir| normalize(&dir.join(spelled)))
            .find(|candidate| {
                let found = fs.stat(candidate).is_some();
                trace!(candidate = %candidate.display(), found, "resolve");
                found
            })
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding normal component. No filesystem access, symlinks untouched.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute relative to `base_dir` (or the working directory)
/// and normalize it.
pub(crate) fn absolutize(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    let joined = match base_dir {
        Some(dir) => dir.join(path),
        None => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    };
    normalize(&joined)
}
