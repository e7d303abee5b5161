//! Media bucket: uploaded images stored on disk and served under `/media`.

use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const MEDIA_URL_PREFIX: &str = "/media";

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub name: String,
    pub url: String,
}

#[derive(Clone, Debug)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<StoredFile> {
        let extension = extension_for(content_type).ok_or_else(|| {
            AppError::Validation(format!("Unsupported media type: {}", content_type))
        })?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Upload is empty".to_string()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.dir.join(&name), bytes).await?;

        tracing::info!("Stored media file {} ({} bytes)", name, bytes.len());
        Ok(StoredFile {
            url: public_url(&name),
            name,
        })
    }

    /// Returns the file contents and content type, or `None` if absent.
    pub async fn load(&self, name: &str) -> Result<Option<(Vec<u8>, &'static str)>> {
        if !is_safe_name(name) {
            return Ok(None);
        }
        let Some(content_type) = content_type_for(name) else {
            return Ok(None);
        };

        match tokio::fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some((bytes, content_type))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn public_url(name: &str) -> String {
    format!("{}/{}", MEDIA_URL_PREFIX, name)
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| allowed.eq_ignore_ascii_case(mime))
        .map(|(_, ext)| *ext)
}

fn content_type_for(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    ALLOWED_TYPES
        .iter()
        .find(|(_, allowed)| allowed.eq_ignore_ascii_case(ext))
        .map(|(mime, _)| *mime)
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}
