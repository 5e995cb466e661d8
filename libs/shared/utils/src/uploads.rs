use std::path::{Component, Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Request body cap for JSON endpoints carrying a base64 image: 4/3 of the
/// decoded limit plus room for the other fields.
pub const MAX_UPLOAD_BODY_BYTES: usize = 8 * 1024 * 1024;
const PUBLIC_PREFIX: &str = "images";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Avatars,
    Specialties,
    Services,
}

impl AssetCategory {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetCategory::Avatars => "avatars",
            AssetCategory::Specialties => "specialties",
            AssetCategory::Services => "services",
        }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Image data is not valid base64")]
    InvalidEncoding,

    #[error("Unsupported image type; expected png, jpeg, gif or webp")]
    UnsupportedType,

    #[error("Image exceeds the 5 MiB limit ({0} bytes)")]
    TooLarge(usize),

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(e) => AppError::Internal(format!("Failed to store image: {}", e)),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

/// Decodes `data:image/png;base64,...` or bare base64 and sniffs the extension
/// from the file signature.
pub fn decode_image(encoded: &str) -> Result<(Vec<u8>, &'static str), UploadError> {
    let payload = match encoded.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|_| UploadError::InvalidEncoding)?;

    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge(bytes.len()));
    }

    let ext = if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "webp"
    } else {
        return Err(UploadError::UnsupportedType);
    };

    Ok((bytes, ext))
}

/// Uploaded images live under `<root>/images/<category>/` and are addressed by
/// their public path `/images/<category>/<file>`.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.public_assets_dir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save_base64(&self, category: AssetCategory, encoded: &str) -> Result<String, UploadError> {
        let (bytes, ext) = decode_image(encoded)?;

        let dir = self.root.join(PUBLIC_PREFIX).join(category.dir_name());
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(dir.join(&file_name), &bytes).await?;

        let public_path = format!("/{}/{}/{}", PUBLIC_PREFIX, category.dir_name(), file_name);
        info!("Stored {} byte image at {}", bytes.len(), public_path);
        Ok(public_path)
    }

    /// Maps a public path back onto disk; anything escaping the asset root is rejected.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let relative = Path::new(public_path.trim_start_matches('/'));

        let mut components = relative.components();
        match components.next() {
            Some(Component::Normal(first)) if first == PUBLIC_PREFIX => {}
            _ => return None,
        }
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }

        Some(self.root.join(relative))
    }

    /// Best-effort delete. Returns whether a file was removed.
    pub async fn remove(&self, public_path: &str) -> bool {
        let Some(path) = self.resolve(public_path) else {
            warn!("Refusing to remove asset outside the public root: {}", public_path);
            return false;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed asset {}", path.display());
                true
            }
            Err(e) => {
                warn!("Could not remove asset {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Removes a superseded file unless it is the shared default (e.g. the default avatar).
    pub async fn remove_superseded(&self, previous: Option<&str>, keep: &str) -> bool {
        match previous {
            Some(path) if !path.is_empty() && path != keep => self.remove(path).await,
            _ => false,
        }
    }
}
