//! # Local Thumbnail Store
//!
//! Filesystem implementation of `ThumbnailStore`.
//! Thumbnails live at `{upload_dir}/{thumbs_folder}/{id}.png` and are
//! served publicly from `{base_url}/{thumbs_folder}/{id}.png`.

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use domains::{AppError, ThumbnailStore};
use image::ImageFormat;
use tokio::fs;

pub struct LocalThumbnailStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    upload_dir: PathBuf,
    /// Public URL prefix of `upload_dir` (e.g., "/uploads")
    base_url: String,
    folder: String,
    placeholder_url: String,
    /// Uploaded images larger than this on either edge are scaled down.
    max_edge: u32,
}

impl LocalThumbnailStore {
    pub fn new(
        upload_dir: PathBuf,
        base_url: String,
        folder: String,
        placeholder_url: String,
        max_edge: u32,
    ) -> Self {
        Self { upload_dir, base_url, folder, placeholder_url, max_edge }
    }

    pub fn path(&self, symbol_id: i64) -> PathBuf {
        self.upload_dir.join(&self.folder).join(format!("{symbol_id}.png"))
    }

    async fn ensure_folder(&self) -> anyhow::Result<()> {
        let folder = self.upload_dir.join(&self.folder);
        fs::create_dir_all(&folder)
            .await
            .with_context(|| format!("creating {}", folder.display()))
    }
}

/// Decodes `data`, shrinks it to fit `max_edge` and re-encodes it as PNG.
fn encode_thumbnail(data: &[u8], max_edge: u32) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::ValidationError(format!("unreadable image: {e}")))?;

    let img = if img.width() > max_edge || img.height() > max_edge {
        img.thumbnail(max_edge, max_edge)
    } else {
        img
    };

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[async_trait]
impl ThumbnailStore for LocalThumbnailStore {
    async fn exists(&self, symbol_id: i64) -> anyhow::Result<bool> {
        let path = self.path(symbol_id);
        fs::try_exists(&path)
            .await
            .with_context(|| format!("checking {}", path.display()))
    }

    fn url(&self, symbol_id: i64) -> String {
        format!(
            "{}/{}/{}.png",
            self.base_url.trim_end_matches('/'),
            self.folder,
            symbol_id
        )
    }

    fn placeholder_url(&self) -> String {
        self.placeholder_url.clone()
    }

    async fn copy(&self, from: i64, to: i64) -> anyhow::Result<()> {
        self.ensure_folder().await?;
        let (source, target) = (self.path(from), self.path(to));
        fs::copy(&source, &target)
            .await
            .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
        Ok(())
    }

    async fn save_image(&self, symbol_id: i64, data: Vec<u8>) -> anyhow::Result<()> {
        let max_edge = self.max_edge;
        let png = tokio::task::spawn_blocking(move || encode_thumbnail(&data, max_edge)).await??;

        self.ensure_folder().await?;
        let target = self.path(symbol_id);
        fs::write(&target, png)
            .await
            .with_context(|| format!("writing {}", target.display()))?;
        tracing::debug!(symbol_id, path = %target.display(), "thumbnail stored");
        Ok(())
    }

    async fn remove(&self, symbol_id: i64) -> anyhow::Result<()> {
        match fs::remove_file(self.path(symbol_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
