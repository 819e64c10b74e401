//! Error types.
//!
//! None of these errors ever reach the callers of the lookup functions of
//! [`HostsContainer`]. They are logged where they happen and the container
//! degrades gracefully instead.
//!
//! [`HostsContainer`]: crate::HostsContainer

use std::fmt;
use std::io;
use std::path::PathBuf;

//------------ Error ---------------------------------------------------------

/// An error happened while loading or watching host files.
#[derive(Debug)]
pub enum Error {
    /// A host file or override directory could not be read.
    Io {
        /// The path that failed.
        path: PathBuf,

        /// The underlying I/O error.
        err: io::Error,
    },

    /// The file system watch mechanism failed.
    Watch(notify::Error),

    /// Watching was requested outside of a Tokio runtime.
    NoRuntime,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            err,
        }
    }

    /// Returns whether the error means the path does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io { err, .. } => err.kind() == io::ErrorKind::NotFound,
            Error::Watch(err) => match &err.kind {
                notify::ErrorKind::PathNotFound => true,
                notify::ErrorKind::Io(err) => {
                    err.kind() == io::ErrorKind::NotFound
                }
                _ => false,
            },
            Error::NoRuntime => false,
        }
    }
}

//--- From

impl From<notify::Error> for Error {
    fn from(err: notify::Error) -> Self {
        Error::Watch(err)
    }
}

//--- Display and Error

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "{}: {}", path.display(), err)
            }
            Error::Watch(err) => write!(f, "watcher: {err}"),
            Error::NoRuntime => {
                f.write_str("watcher: not running inside a Tokio runtime")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { err, .. } => Some(err),
            Error::Watch(err) => Some(err),
            Error::NoRuntime => None,
        }
    }
}

//============ Testing =======================================================
