use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use forceadmin_core::errors::StoreError;

/// Replace `path` with `content`: temp file, fsync, rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let temp_path = dir.join(format!(".{}.tmp", temp_suffix()));

    let mut file = std::fs::File::create(&temp_path).map_err(|e| {
        StoreError::Io(format!("cannot create temp file for {}: {e}", path.display()))
    })?;
    file.write_all(content)
        .and_then(|()| file.sync_all())
        .map_err(|e| StoreError::Io(format!("cannot write {}: {e}", temp_path.display())))?;
    drop(file);

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        StoreError::Io(format!("cannot rename temp to {}: {e}", path.display()))
    })
}

/// Exclusive lock on a state file, held for the life of the value.
///
/// The `.lock` sibling holds the owner PID and acquisition time. Creation is
/// exclusive, so two processes cannot both hold it. A lock is never taken
/// over on age: the holder may keep it for as long as its store is open, so
/// a lock left by a crashed process has to be removed by hand.
#[derive(Debug)]
pub struct StoreLock {
    lock_path: PathBuf,
}

impl StoreLock {
    pub fn acquire(state_path: &Path) -> Result<Self, StoreError> {
        let lock_path = lock_path_for(state_path);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StoreError::Locked(format!(
                    "held by {} (remove {} only if that process is gone)",
                    lock_owner(&lock_path).unwrap_or_else(|| "an unknown process".into()),
                    lock_path.display()
                )),
                _ => StoreError::Io(format!("cannot acquire lock {}: {e}", lock_path.display())),
            })?;
        let content = format!("{}\n{}\n", std::process::id(), chrono::Utc::now().timestamp());
        if let Err(e) = file.write_all(content.as_bytes()) {
            let _ = std::fs::remove_file(&lock_path);
            return Err(StoreError::Io(format!(
                "cannot write lock {}: {e}",
                lock_path.display()
            )));
        }

        Ok(Self { lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(state_path: &Path) -> PathBuf {
    let mut os = state_path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

/// "pid N" from the lock's first line, for error messages.
fn lock_owner(lock_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(lock_path).ok()?;
    let pid: u32 = content.lines().next()?.trim().parse().ok()?;
    Some(format!("pid {pid}"))
}

fn temp_suffix() -> String {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}-{nanos:x}", std::process::id())
}
