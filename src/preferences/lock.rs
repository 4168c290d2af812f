//! File locking for the preference file.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// Locks older than this are considered abandoned.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(5);

/// `with_lock` waits at most this many attempts for a held lock.
const LOCK_ATTEMPTS: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Acquire an exclusive lock on a file, failing at once if it is held.
///
/// The lock file is created with `create_new`, so two callers can never both
/// succeed.
pub fn acquire_lock(path: &Path) -> Result<LockHandle, Error> {
    let lock_path = PathBuf::from(format!("{}.lock", path.display()));

    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut lock_file = match create_lock_file(&lock_path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if !is_stale(&lock_path) {
                return Err(Error::Lock(format!(
                    "Lock file is held: {}",
                    lock_path.display()
                )));
            }
            tracing::warn!("Removing stale lock: {}", lock_path.display());
            std::fs::remove_file(&lock_path).ok();
            // Someone else may win the race for the freed lock
            create_lock_file(&lock_path).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    Error::Lock(format!("Lock file is held: {}", lock_path.display()))
                }
                _ => Error::Io(e),
            })?
        }
        Err(e) => return Err(e.into()),
    };

    lock_file.write_all(format!("{}\n", std::process::id()).as_bytes())?;
    lock_file.sync_all()?;

    tracing::debug!("Acquired lock: {}", lock_path.display());

    Ok(LockHandle { lock_path })
}

fn create_lock_file(lock_path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().write(true).create_new(true).open(lock_path)
}

/// A lock that vanished between the failed create and this check counts as
/// stale, so the caller retries the create.
fn is_stale(lock_path: &Path) -> bool {
    match lock_path.metadata().and_then(|m| m.modified()) {
        Ok(modified) => modified.elapsed().unwrap_or_default() >= LOCK_STALE_AFTER,
        Err(_) => true,
    }
}

/// Lock handle - releases lock when dropped.
pub struct LockHandle {
    lock_path: PathBuf,
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            tracing::warn!("Failed to release lock {}: {}", self.lock_path.display(), e);
        } else {
            tracing::debug!("Released lock: {}", self.lock_path.display());
        }
    }
}

/// Acquire lock, execute function, release lock.
///
/// A held lock is retried for up to `LOCK_ATTEMPTS * LOCK_RETRY_DELAY`
/// before giving up with [`Error::Lock`].
pub fn with_lock<T, F>(path: &Path, f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    let mut attempt = 1;
    let _lock = loop {
        match acquire_lock(path) {
            Ok(lock) => break lock,
            Err(Error::Lock(reason)) if attempt < LOCK_ATTEMPTS => {
                tracing::debug!("Lock busy (attempt {}): {}", attempt, reason);
                attempt += 1;
                std::thread::sleep(LOCK_RETRY_DELAY);
            }
            Err(e) => return Err(e),
        }
    };
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("preferences.json");

        let lock1 = acquire_lock(&file);
        assert!(lock1.is_ok());

        // Held lock blocks a second acquirer
        assert!(matches!(acquire_lock(&file), Err(Error::Lock(_))));

        drop(lock1);
        assert!(acquire_lock(&file).is_ok());
    }

    #[test]
    fn test_with_lock_releases_on_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("preferences.json");

        let result: Result<(), Error> = with_lock(&file, || Err(Error::Other("boom".to_string())));
        assert!(result.is_err());
        assert!(!temp_dir.path().join("preferences.json.lock").exists());
    }

    #[test]
    fn test_with_lock_waits_for_holder() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("preferences.json");

        let held = acquire_lock(&file).unwrap();
        let releaser = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            drop(held);
        });

        let result = with_lock(&file, || Ok(42));
        releaser.join().unwrap();
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("preferences.json");
        let lock_path = temp_dir.path().join("preferences.json.lock");

        std::fs::write(&lock_path, "1\n").unwrap();
        let old = std::time::SystemTime::now() - Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&lock_path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        assert!(acquire_lock(&file).is_ok());
    }
}
