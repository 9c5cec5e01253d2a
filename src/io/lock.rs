use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lock file name, next to the cache document
pub const LOCK_FILE: &str = ".lock";

const DEFAULT_WAIT: Duration = Duration::from_secs(5);
const POLL: Duration = Duration::from_millis(10);

/// Exclusive writer lock for a project index document.
///
/// Writers `flock` a `.lock` file in the document's directory. The file is
/// left in place after release: every writer has to contend on the same
/// inode, so unlinking it would let a waiter and a newcomer both win.
pub struct IndexLock {
    _file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file at {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: another revu process is writing the project index")]
    Busy { path: PathBuf },
}

impl IndexLock {
    /// The lock file guarding `document`
    pub fn path_for(document: &Path) -> PathBuf {
        match document.parent() {
            Some(dir) => dir.join(LOCK_FILE),
            None => PathBuf::from(LOCK_FILE),
        }
    }

    /// Lock `document` for writing, polling until `wait` runs out
    pub fn acquire(document: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = Self::path_for(document);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::Open {
                path: path.clone(),
                source: e,
            })?;
        Self::wait_for(file, path, wait)
    }

    pub fn acquire_default(document: &Path) -> Result<Self, LockError> {
        Self::acquire(document, DEFAULT_WAIT)
    }

    fn wait_for(file: File, path: PathBuf, wait: Duration) -> Result<Self, LockError> {
        let start = Instant::now();
        loop {
            if try_lock(&file).is_ok() {
                tracing::trace!(path = %path.display(), "index lock acquired");
                return Ok(IndexLock { _file: file });
            }
            if start.elapsed() >= wait {
                return Err(LockError::Busy { path });
            }
            std::thread::sleep(POLL);
        }
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
