use anyhow::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Backup documents larger than this are refused on import.
const MAX_BACKUP_BYTES: u64 = 10 * 1024 * 1024;

/// File IO for backup export and import.
pub struct FileManager {
    pub last_path: Option<PathBuf>,
}

impl FileManager {
    pub fn new() -> Self {
        Self { last_path: None }
    }

    pub fn last_path(&self) -> Option<&PathBuf> {
        self.last_path.as_ref()
    }

    pub async fn read_backup(&mut self, path: PathBuf) -> Result<String> {
        if !path.exists() {
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }

        if !path.is_file() {
            return Err(anyhow::anyhow!("Not a file: {}", path.display()));
        }

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.len() > MAX_BACKUP_BYTES => {
                return Err(anyhow::anyhow!(
                    "Backup is too large ({} bytes): {}",
                    metadata.len(),
                    path.display()
                ));
            }
            Ok(_) => {}
            Err(e) => log::warn!("Failed to get file metadata: {}", e),
        }

        match fs::read_to_string(&path).await {
            Ok(content) => {
                self.last_path = Some(path.clone());
                log::info!("Read backup from {}", path.display());
                Ok(content)
            }
            Err(e) => Err(anyhow::anyhow!(read_error_message(&path, &e))),
        }
    }

    /// Write an export, keeping the previous file at `<name>.bak`.
    pub async fn write_export(&mut self, path: PathBuf, content: &str) -> Result<String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow::anyhow!("Failed to create directory: {} - {}", parent.display(), e)
                })?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        if let Ok(metadata) = fs::metadata(&path).await {
            if metadata.permissions().readonly() {
                return Err(anyhow::anyhow!("Target file is read-only: {}", path.display()));
            }
            if metadata.len() > 0 {
                let backup_path = path.with_extension("bak");
                if let Err(e) = fs::copy(&path, &backup_path).await {
                    log::warn!("Failed to create backup: {}", e);
                } else {
                    log::info!("Created backup: {}", backup_path.display());
                }
            }
        }

        let mut attempts = 0;
        const MAX_ATTEMPTS: u32 = 3;

        loop {
            match fs::write(&path, content.as_bytes()).await {
                Ok(_) => {
                    log::info!("Exported backup to {}", path.display());
                    let message = format!("Exported to '{}'", path.display());
                    self.last_path = Some(path);
                    return Ok(message);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= MAX_ATTEMPTS || e.kind() == ErrorKind::PermissionDenied {
                        return Err(anyhow::anyhow!(write_error_message(&path, &e)));
                    }
                    log::warn!(
                        "Export attempt {} failed for {}, retrying...",
                        attempts,
                        path.display()
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(100 * attempts as u64))
                        .await;
                }
            }
        }
    }
}

impl Default for FileManager {
    fn default() -> Self {
        Self::new()
    }
}

fn read_error_message(path: &Path, e: &std::io::Error) -> String {
    match e.kind() {
        ErrorKind::PermissionDenied => format!("Permission denied: {}", path.display()),
        ErrorKind::NotFound => format!("File not found: {}", path.display()),
        ErrorKind::InvalidData => format!("File is not valid UTF-8: {}", path.display()),
        _ => format!("Failed to read {}: {}", path.display(), e),
    }
}

fn write_error_message(path: &Path, e: &std::io::Error) -> String {
    match e.kind() {
        ErrorKind::PermissionDenied => format!("No write permission: {}", path.display()),
        ErrorKind::WriteZero => format!("Disk may be full: {}", path.display()),
        _ => format!("Failed to write {}: {}", path.display(), e),
    }
}
