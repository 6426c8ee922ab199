use anyhow::Context;
use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::storage::StorageClient;

pub const IMAGE_FIELD: &str = "profileImage";

/// Uploaded file as read from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Stores a profile image under a fresh name and returns its served path.
pub async fn store_profile_image(
    storage: &dyn StorageClient,
    upload: UploadItem,
) -> AppResult<StoredImage> {
    let ext = ext_from_mime(&upload.content_type).ok_or_else(|| {
        AppError::invalid(IMAGE_FIELD, "Only JPEG, PNG, WEBP or GIF images are allowed")
    })?;
    if upload.body.is_empty() {
        return Err(AppError::invalid(IMAGE_FIELD, "Uploaded image is empty"));
    }

    let key = format!("profile-{}.{}", Uuid::new_v4(), ext);
    storage
        .put_object(&key, upload.body, &upload.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    info!(%key, "profile image stored");
    Ok(StoredImage {
        url: storage.public_url(&key),
        key,
    })
}

/// Best-effort removal of an image whose user write did not go through.
pub async fn discard_image(storage: &dyn StorageClient, image: &StoredImage) {
    if let Err(e) = storage.delete_object(&image.key).await {
        warn!(error = %e, key = %image.key, "failed to remove orphaned image");
    }
}

/// Removes the file behind a profile image URL that has just been replaced.
/// URLs that do not point into our storage are left alone.
pub async fn discard_replaced(storage: &dyn StorageClient, old_url: &str, new_url: &str) {
    if old_url == new_url {
        return;
    }
    let Some(key) = storage.key_for_url(old_url) else {
        return;
    };
    if let Err(e) = storage.delete_object(&key).await {
        warn!(error = %e, %key, "failed to remove replaced image");
    }
}
