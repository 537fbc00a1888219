use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

/// Lock file guarding `path`. Locking a sibling instead of the file itself lets the file be
/// replaced through a rename while the lock is held.
pub fn lock_path(path: &Path) -> PathBuf {
    sibling_with_suffix(path, ".lock")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_else(|| OsString::from("state"));
    name.push(suffix);
    path.with_file_name(name)
}

async fn open_lock(path: &Path) -> Result<File> {
    let lock = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))
        .await
        .with_context(|| format!("Failed to open lock for {path:?}"))?;
    Ok(lock)
}

/// Reads the whole file under a shared lock. A missing file is not an error.
pub async fn read_if_exists(path: &Path) -> Result<Option<String>> {
    let lock = open_lock(path).await?;
    lock.lock_shared()?;
    let result = async {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        Ok(Some(content))
    }
    .await
    .with_context(|| format!("Failed to read {path:?}"));
    lock.unlock_async().await?;
    result
}

/// Replaces the file contents as a whole. Data is written into a temporary sibling first and then
/// renamed over the target, so readers see either the old or the new contents.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let lock = open_lock(path).await?;
    lock.lock_exclusive()?;
    let temporary = sibling_with_suffix(path, ".tmp");
    let result = async {
        let mut file = File::create(&temporary).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
        tokio::fs::rename(&temporary, path).await?;
        Ok::<_, std::io::Error>(())
    }
    .await
    .with_context(|| format!("Failed to write {path:?}"));
    match &result {
        Ok(()) => debug!("Wrote {} bytes into {path:?}", contents.len()),
        Err(_) => {
            if let Err(e) = tokio::fs::remove_file(&temporary).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove {temporary:?} {e:?}");
                }
            }
        }
    }
    lock.unlock_async().await?;
    result
}
