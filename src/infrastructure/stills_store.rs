//! Filesystem Stills Store
//!
//! Writes each admitted face's cropped still to `{stills_dir}/{image_key}`
//! (§6 "Saved stills"). Written via a temp-file-then-rename so a reader
//! never observes a partially written file, the same atomicity idiom
//! `JsonRegistry` uses for the registry file.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::ports::{StillsResult, StillsStore};

pub struct FsStillsStore {
    dir: PathBuf,
}

impl FsStillsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl StillsStore for FsStillsStore {
    async fn save(&self, image_key: &str, bytes: &[u8]) -> StillsResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let final_path = self.dir.join(image_key);
        let tmp_path = self.dir.join(format!("{image_key}.tmp"));
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_writes_the_file_under_the_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStillsStore::new(dir.path());
        store.save("person_001_1700000000.png", b"still-bytes").await.unwrap();

        let written = tokio::fs::read(dir.path().join("person_001_1700000000.png")).await.unwrap();
        assert_eq!(written, b"still-bytes");
    }

    #[tokio::test]
    async fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("stills");
        let store = FsStillsStore::new(&nested);
        store.save("person_001_1700000000.png", b"x").await.unwrap();

        assert!(tokio::fs::metadata(nested.join("person_001_1700000000.png")).await.is_ok());
    }
}
