use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;

/// Stores recipe images sent as base64 payloads and removes them when the
/// owning recipe replaces or deletes its image.
pub struct ImageService {
    config: Config,
}

impl ImageService {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Decode a base64 image (optionally a `data:image/...;base64,` URI) and
    /// write it under the images directory. Returns the stored relative path.
    pub async fn save_base64(&self, payload: &str) -> Result<String> {
        let (extension, data) = split_data_uri(payload);

        let bytes = BASE64
            .decode(data.trim())
            .context("Invalid base64 image payload")?;

        if bytes.is_empty() {
            anyhow::bail!("Image payload is empty");
        }

        let relative = format!("recipes/{}.{}", Uuid::new_v4(), extension);
        let file_path = self.absolute(&relative);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), "Stored recipe image");
        Ok(relative)
    }

    /// Remove a stored image. A missing file is not an error; the row it
    /// belonged to is already gone or re-pointed.
    pub async fn remove(&self, relative: &str) {
        let file_path = self.absolute(relative);
        match fs::remove_file(&file_path).await {
            Ok(()) => info!(path = %file_path.display(), "Removed recipe image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %file_path.display(), "Failed to remove image: {e}"),
        }
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        PathBuf::from(&self.config.general.images_path).join(relative)
    }
}

/// Split an optional `data:image/<subtype>;base64,` prefix off the payload,
/// mapping the subtype to a file extension.
fn split_data_uri(payload: &str) -> (&'static str, &str) {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some((mime, data)) = rest.split_once(";base64,") {
            let extension = match mime {
                "image/jpeg" | "image/jpg" => "jpg",
                "image/gif" => "gif",
                "image/webp" => "webp",
                _ => "png",
            };
            return (extension, data);
        }
    }
    ("png", payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_prefix_maps_extension() {
        let (ext, data) = split_data_uri("data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(ext, "jpg");
        assert_eq!(data, "aGVsbG8=");
    }

    #[test]
    fn bare_payload_defaults_to_png() {
        let (ext, data) = split_data_uri("aGVsbG8=");
        assert_eq!(ext, "png");
        assert_eq!(data, "aGVsbG8=");
    }
}
