//! Script loading capability used to resolve nested references.
//!
//! The [`ScriptLoader`] trait keeps the compiler transport-agnostic:
//! [`FsLoader`] reads `sqlmfile` paths from disk and hands `sqlmref`
//! names to an optional remote lookup, [`InMemoryLoader`] serves canned
//! content for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Failure to produce the content of a nested reference.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no script named '{name}'")]
    NotFound { name: String },
    #[error("no remote lookup configured for script '{name}'")]
    RemoteUnavailable { name: String },
    #[error("remote lookup of '{name}' failed: {message}")]
    Remote { name: String, message: String },
}

/// Capability the compiler uses to fetch nested fragments.
pub trait ScriptLoader {
    /// Read a script referenced by `sqlmfile("path")`.
    fn read_file(&self, path: &Path) -> Result<String, LoadError>;

    /// Fetch a script referenced by `sqlmref("name")`.
    fn fetch_named(&self, name: &str) -> Result<String, LoadError>;
}

impl<L: ScriptLoader + ?Sized> ScriptLoader for &L {
    fn read_file(&self, path: &Path) -> Result<String, LoadError> {
        (**self).read_file(path)
    }

    fn fetch_named(&self, name: &str) -> Result<String, LoadError> {
        (**self).fetch_named(name)
    }
}

/// Remote lookup by name, e.g. a client for the script server.
pub trait RemoteLookup {
    fn lookup(&self, name: &str) -> Result<String, LoadError>;
}

impl<F> RemoteLookup for F
where
    F: Fn(&str) -> Result<String, LoadError>,
{
    fn lookup(&self, name: &str) -> Result<String, LoadError> {
        self(name)
    }
}

/// Placeholder lookup that rejects every name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteLookup for NoRemote {
    fn lookup(&self, name: &str) -> Result<String, LoadError> {
        Err(LoadError::RemoteUnavailable {
            name: name.to_string(),
        })
    }
}

/// Filesystem-backed loader.
///
/// Relative paths resolve against `base_dir`; absolute paths are used
/// as given.
#[derive(Debug, Clone)]
pub struct FsLoader<R = NoRemote> {
    base_dir: PathBuf,
    remote: R,
}

impl FsLoader<NoRemote> {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            remote: NoRemote,
        }
    }
}

impl<R> FsLoader<R> {
    /// Attach a remote lookup for `sqlmref` names.
    #[must_use]
    pub fn with_remote<T: RemoteLookup>(self, remote: T) -> FsLoader<T> {
        FsLoader {
            base_dir: self.base_dir,
            remote,
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl<R: RemoteLookup> ScriptLoader for FsLoader<R> {
    fn read_file(&self, path: &Path) -> Result<String, LoadError> {
        let full = self.base_dir.join(path);
        tracing::trace!(path = %full.display(), "reading nested script");
        std::fs::read_to_string(&full).map_err(|source| LoadError::Io { path: full, source })
    }

    fn fetch_named(&self, name: &str) -> Result<String, LoadError> {
        tracing::trace!(name, "fetching nested script");
        self.remote.lookup(name)
    }
}

/// In-memory loader for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    files: HashMap<PathBuf, String>,
    scripts: HashMap<String, String>,
}

impl InMemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `sqlmfile(path)`.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.files.insert(path.into(), content.to_string());
        self
    }

    /// Serve `content` for `sqlmref(name)`.
    #[must_use]
    pub fn script(mut self, name: &str, content: &str) -> Self {
        self.scripts.insert(name.to_string(), content.to_string());
        self
    }
}

impl ScriptLoader for InMemoryLoader {
    fn read_file(&self, path: &Path) -> Result<String, LoadError> {
        self.files.get(path).cloned().ok_or_else(|| LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found in memory"),
        })
    }

    fn fetch_named(&self, name: &str) -> Result<String, LoadError> {
        self.scripts
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                name: name.to_string(),
            })
    }
}
