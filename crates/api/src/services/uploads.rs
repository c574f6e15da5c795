//! Product image upload storage.
//!
//! Uploaded images land on local disk under the configured uploads directory
//! and are served back as static files. Only the three image types the
//! storefront renders are accepted.

use std::path::Path;

use chrono::Utc;
use thiserror::Error;

/// Errors from handling an image upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The multipart request had no `image` part.
    #[error("no image file in request")]
    MissingFile,

    /// The uploaded content type is not an accepted image type.
    #[error("invalid image type: {0}")]
    InvalidImageType(String),

    /// Reading the multipart stream failed.
    #[error("failed to read upload: {0}")]
    Read(String),

    /// Writing the file to disk failed.
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Map an accepted image content type to its file extension.
///
/// # Errors
///
/// Returns [`UploadError::InvalidImageType`] for anything that is not
/// png/jpeg/jpg.
pub fn extension_for(content_type: &str) -> Result<&'static str, UploadError> {
    match content_type {
        "image/png" => Ok("png"),
        "image/jpeg" => Ok("jpeg"),
        "image/jpg" => Ok("jpg"),
        other => Err(UploadError::InvalidImageType(other.to_owned())),
    }
}

/// Build the stored filename for an upload: the sanitized original name with
/// a millisecond timestamp and the extension mapped from the content type.
///
/// # Errors
///
/// Returns [`UploadError::InvalidImageType`] if the content type is not
/// accepted.
pub fn stored_filename(original_name: &str, content_type: &str) -> Result<String, UploadError> {
    let extension = extension_for(content_type)?;
    let stem = sanitize_stem(original_name);
    let timestamp = Utc::now().timestamp_millis();
    Ok(format!("{stem}-{timestamp}.{extension}"))
}

/// Write uploaded image bytes to the uploads directory, returning the stored
/// filename.
///
/// # Errors
///
/// Returns [`UploadError`] if the content type is rejected or the write
/// fails.
pub async fn store_image(
    uploads_dir: &Path,
    original_name: &str,
    content_type: &str,
    data: &[u8],
) -> Result<String, UploadError> {
    let filename = stored_filename(original_name, content_type)?;

    tokio::fs::create_dir_all(uploads_dir).await?;
    tokio::fs::write(uploads_dir.join(&filename), data).await?;

    Ok(filename)
}

/// The public URL an uploaded file is served from.
#[must_use]
pub fn public_url(base_url: &str, filename: &str) -> String {
    format!("{}/public/uploads/{filename}", base_url.trim_end_matches('/'))
}

/// Reduce an uploaded filename to a safe stem: drop any path components and
/// the extension, then replace everything outside `[A-Za-z0-9._-]` with `-`.
fn sanitize_stem(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    let stem = base.rsplit_once('.').map_or(base, |(stem, _)| stem);

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.trim_matches('-').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_map() {
        assert_eq!(extension_for("image/png").unwrap(), "png");
        assert_eq!(extension_for("image/jpeg").unwrap(), "jpeg");
        assert_eq!(extension_for("image/jpg").unwrap(), "jpg");
        assert!(matches!(
            extension_for("image/gif"),
            Err(UploadError::InvalidImageType(_))
        ));
        assert!(matches!(
            extension_for("application/pdf"),
            Err(UploadError::InvalidImageType(_))
        ));
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("red shirt.png"), "red-shirt");
        assert_eq!(sanitize_stem("../../etc/passwd.png"), "passwd");
        assert_eq!(sanitize_stem("C:\\photos\\cat.jpeg"), "cat");
        assert_eq!(sanitize_stem("???.png"), "upload");
    }

    #[test]
    fn test_stored_filename_shape() {
        let name = stored_filename("blue mug.png", "image/png").unwrap();
        assert!(name.starts_with("blue-mug-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("http://localhost:3000/", "mug-1.png"),
            "http://localhost:3000/public/uploads/mug-1.png"
        );
    }
}
