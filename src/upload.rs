use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};
use unicode_normalization::UnicodeNormalization;

use crate::error::{AppError, AppResult};

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

/// Reduces a client supplied filename to a single safe path segment.
///
/// Accented letters are folded to ASCII (NFKD, combining marks dropped), only
/// the last path component is kept, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are
/// trimmed. Returns `None` when nothing usable is left.
pub fn secure_filename(raw: &str) -> Option<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let folded: String = last.nfkd().filter(|c| c.is_ascii()).collect();
    let joined = folded.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        return None;
    }

    let stem = cleaned.split('.').next().unwrap_or_default().to_ascii_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        return Some(format!("_{cleaned}"));
    }

    Some(cleaned.to_string())
}

#[derive(Clone, Debug)]
pub struct PosterStorage {
    root: PathBuf,
}

impl PosterStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes a poster under `filename`, which must already be sanitized.
    /// An existing file with the same name is never replaced.
    pub async fn save(&self, filename: &str, data: &[u8]) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.root).await?;
        let path = self.root.join(filename);

        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path).await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::Conflict(format!(
                    "A poster named {filename} already exists"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = write_all(&mut file, data).await {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }

        tracing::debug!(poster = %filename, bytes = data.len(), "poster saved");
        Ok(path)
    }

    pub async fn remove(&self, filename: &str) {
        let path = self.root.join(filename);
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!(poster = %filename, error = %e, "failed to remove poster");
        }
    }

    pub async fn resolve(&self, filename: &str) -> AppResult<PathBuf> {
        resolve_in(&self.root, filename).await
    }
}

/// Finds `filename` directly inside `dir`. Names that are not already a
/// single sanitized segment are treated as missing.
pub async fn resolve_in(dir: &Path, filename: &str) -> AppResult<PathBuf> {
    if secure_filename(filename).as_deref() != Some(filename) {
        return Err(AppError::not_found());
    }

    let path = dir.join(filename);
    match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(AppError::not_found()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::not_found()),
        Err(e) => Err(e.into()),
    }
}

async fn write_all(file: &mut fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_plain_names() {
        assert_eq!(secure_filename("alien.png").as_deref(), Some("alien.png"));
    }

    #[test]
    fn strips_directories_and_unsafe_characters() {
        assert_eq!(secure_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(secure_filename("C:\\posters\\heat.jpg").as_deref(), Some("heat.jpg"));
        assert_eq!(secure_filename("my cool  poster!.png").as_deref(), Some("my_cool_poster.png"));
        assert_eq!(secure_filename("._hidden.png").as_deref(), Some("hidden.png"));
    }

    #[test]
    fn accents_are_folded() {
        assert_eq!(secure_filename("café.png").as_deref(), Some("cafe.png"));
        assert_eq!(secure_filename("Amélie poster.JPG").as_deref(), Some("Amelie_poster.JPG"));
    }

    #[test]
    fn nothing_left_is_none() {
        assert_eq!(secure_filename("../../"), None);
        assert_eq!(secure_filename("ポスター"), None);
    }

    #[test]
    fn device_names_are_prefixed() {
        assert_eq!(secure_filename("con.png").as_deref(), Some("_con.png"));
    }

    #[tokio::test]
    async fn save_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PosterStorage::new(dir.path().join("uploads"));

        storage.save("heat.png", b"first").await.unwrap();
        let err = storage.save("heat.png", b"second").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let on_disk = std::fs::read(dir.path().join("uploads/heat.png")).unwrap();
        assert_eq!(on_disk, b"first");
    }

    #[tokio::test]
    async fn resolve_only_finds_existing_plain_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PosterStorage::new(dir.path());
        storage.save("heat.png", b"img").await.unwrap();

        assert!(storage.resolve("heat.png").await.is_ok());
        assert!(matches!(storage.resolve("missing.png").await, Err(AppError::NotFound(_))));
        assert!(matches!(storage.resolve("../heat.png").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = PosterStorage::new(dir.path());
        let path = storage.save("heat.png", b"img").await.unwrap();

        storage.remove("heat.png").await;
        assert!(!path.exists());
    }
}
