//! Content-Type inference from a stored file's extension.

/// MIME type for an extension, case-insensitive
///
/// # Examples
/// ```
/// use imgdrop::http::mime::content_type_for;
/// assert_eq!(content_type_for(Some("PNG")), "image/png");
/// assert_eq!(content_type_for(Some("txt")), "text/plain; charset=utf-8");
/// assert_eq!(content_type_for(None), "application/octet-stream");
/// ```
pub fn content_type_for(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return "application/octet-stream";
    };

    match ext.to_ascii_lowercase().as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "heic" => "image/heic",

        // Text
        "txt" | "md" => "text/plain; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",

        // Documents / archives
        "pdf" => "application/pdf",
        "zip" => "application/zip",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_types() {
        assert_eq!(content_type_for(Some("jpg")), "image/jpeg");
        assert_eq!(content_type_for(Some("JPEG")), "image/jpeg");
        assert_eq!(content_type_for(Some("webp")), "image/webp");
        assert_eq!(content_type_for(Some("svg")), "image/svg+xml");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for(Some("raw")), "application/octet-stream");
        assert_eq!(content_type_for(None), "application/octet-stream");
    }
}
