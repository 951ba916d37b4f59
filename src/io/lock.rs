use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_FILE: &str = ".lock";
const DEFAULT_WAIT: Duration = Duration::from_secs(5);
const FIRST_RETRY: Duration = Duration::from_millis(5);
const MAX_RETRY: Duration = Duration::from_millis(100);

/// Exclusive hold on a board directory for one write command.
///
/// The lock file stays in place between runs and carries the pid of the
/// last holder, so a writer that gives up can say who it was waiting on.
/// Released when dropped.
#[derive(Debug)]
pub struct BoardLock {
    file: File,
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("board is busy: tb process {holder} still holds {path}")]
    Busy { path: PathBuf, holder: String },
}

impl BoardLock {
    /// Wait up to `wait` for the board in `board_dir`, backing off between
    /// attempts
    pub fn acquire(board_dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = board_dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + wait;
        let mut retry = FIRST_RETRY;
        while !try_lock(&file) {
            if Instant::now() >= deadline {
                let holder = read_holder(&mut file).unwrap_or_else(|| "unknown".into());
                tracing::warn!(path = %path.display(), %holder, "gave up waiting for board lock");
                return Err(LockError::Busy { path, holder });
            }
            std::thread::sleep(retry);
            retry = (retry * 2).min(MAX_RETRY);
        }

        if let Err(e) = record_holder(&mut file) {
            tracing::debug!(error = %e, "could not record lock holder");
        }
        tracing::trace!(path = %path.display(), "locked board");
        Ok(BoardLock { file })
    }

    pub fn acquire_default(board_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(board_dir, DEFAULT_WAIT)
    }
}

impl Drop for BoardLock {
    fn drop(&mut self) {
        unlock(&self.file);
    }
}

fn record_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.flush()
}

fn read_holder(file: &mut File) -> Option<String> {
    let mut pid = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut pid).ok()?;
    let pid = pid.trim();
    (!pid.is_empty()).then(|| pid.to_string())
}

#[cfg(unix)]
fn try_lock(file: &File) -> bool {
    use std::os::unix::io::AsRawFd;
    unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) == 0 }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> bool {
    true
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}
