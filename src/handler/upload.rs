//! `POST /upload`: multipart `image` field into the storage directory

use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Request, StatusCode};
use multer::{Constraints, Field, Multipart, SizeLimit};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use thiserror::Error;

use crate::config::{AppState, Config, UploadResponseFormat};
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::storage::{NameSource, PendingUpload, StorageError};

/// Multipart field carrying the image bytes
pub const IMAGE_FIELD: &str = "image";

/// Characters escaped when a stored name is placed in a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Why an upload was refused
#[derive(Debug, Error)]
pub enum UploadError {
    /// Not multipart, no `image` field, or the field could not be read.
    /// Answered with 500 like the service always has, though it is a
    /// client error.
    #[error("failed to read image field: {0}")]
    Read(String),
    #[error("upload exceeds {limit} bytes")]
    TooLarge { limit: u64 },
    /// The request stream broke while the field was being copied
    #[error("upload stream failed mid-copy: {0}")]
    Copy(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client; causes stay in the logs
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Read(_) => "Failed to read image",
            Self::TooLarge { .. } => "Payload Too Large",
            Self::Copy(_)
            | Self::Storage(StorageError::Write { .. } | StorageError::Rename { .. }) => {
                "Failed to copy image"
            }
            Self::Storage(_) => "Failed to save image",
        }
    }

    fn into_response(self) -> HttpResponse {
        match &self {
            Self::Read(_) | Self::TooLarge { .. } => {
                logger::log_warning(&format!("Upload rejected: {self}"));
            }
            _ => logger::log_error(&format!("Upload failed: {self}")),
        }
        if matches!(self, Self::TooLarge { .. }) {
            return http::build_413_response();
        }
        http::build_text_response(self.status(), self.public_message())
    }
}

#[derive(Debug, Serialize)]
struct UploadReceipt<'a> {
    filename: &'a str,
}

/// Store the request's `image` field and answer with its stored name
pub async fn handle_upload<B>(req: Request<B>, state: &AppState) -> HttpResponse
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    match store_upload(req, state).await {
        Ok(name) => upload_succeeded(&name, &state.config),
        Err(e) => e.into_response(),
    }
}

async fn store_upload<B>(req: Request<B>, state: &AppState) -> Result<String, UploadError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let limit = state.config.http.max_body_size;
    let naming = state.config.storage.naming;

    let content_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    if content_length
        .as_deref()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len > limit)
    {
        return Err(UploadError::TooLarge { limit });
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| UploadError::Read("missing Content-Type".to_string()))?;
    let boundary =
        multer::parse_boundary(content_type).map_err(|e| UploadError::Read(e.to_string()))?;

    let constraints = Constraints::new().size_limit(SizeLimit::new().whole_stream(limit));
    let mut multipart =
        Multipart::with_constraints(req.into_body().into_data_stream(), boundary, constraints);

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| classify(e, limit, UploadError::Read))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        // An empty filename means the part is not a file
        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);
        if naming.needs_file_name() {
            let Some(name) = file_name.as_deref() else {
                return Err(UploadError::Read(format!(
                    "'{IMAGE_FIELD}' part carries no filename"
                )));
            };
            state.store.path_for(name)?;
        }

        let mut pending = state.store.begin_upload().await?;
        let received = match copy_field(&mut field, &mut pending, limit).await {
            Ok(received) => received,
            Err(e) => {
                pending.discard().await;
                return Err(e);
            }
        };

        let source = NameSource {
            file_name: file_name.as_deref(),
            content_length: content_length.as_deref(),
            received_bytes: received,
        };
        let Some(name) = naming.derive(&source) else {
            pending.discard().await;
            return Err(UploadError::Read("no name could be derived".to_string()));
        };
        pending.commit(&name).await?;

        logger::log_upload_stored(&name, received);
        return Ok(name);
    }

    Err(UploadError::Read(format!(
        "missing multipart field '{IMAGE_FIELD}'"
    )))
}

/// Stream the field body into the temporary file, returning bytes written
async fn copy_field(
    field: &mut Field<'_>,
    pending: &mut PendingUpload,
    limit: u64,
) -> Result<u64, UploadError> {
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| classify(e, limit, UploadError::Copy))?
    {
        pending.write_chunk(&chunk).await?;
    }
    Ok(pending.written())
}

/// Size violations become 413, anything else is wrapped by `otherwise`
fn classify(e: multer::Error, limit: u64, otherwise: fn(String) -> UploadError) -> UploadError {
    match e {
        multer::Error::StreamSizeExceeded { .. } | multer::Error::FieldSizeExceeded { .. } => {
            UploadError::TooLarge { limit }
        }
        other => otherwise(other.to_string()),
    }
}

fn upload_succeeded(name: &str, config: &Config) -> HttpResponse {
    match config.http.upload_response {
        UploadResponseFormat::Json => {
            http::build_json_response(StatusCode::OK, &UploadReceipt { filename: name })
        }
        UploadResponseFormat::Text => http::build_text_response(
            StatusCode::OK,
            format!(
                "Image uploaded successfully: {}",
                image_url(&config.storage.public_base_url, name)
            ),
        ),
    }
}

/// Retrieval URL for a stored name
pub fn image_url(base: &str, name: &str) -> String {
    format!(
        "{}/images/{}",
        base.trim_end_matches('/'),
        utf8_percent_encode(name, PATH_SEGMENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url("http://localhost:8000/", "a.png"),
            "http://localhost:8000/images/a.png"
        );
        assert_eq!(
            image_url("https://cdn.example", "my cat#1.png"),
            "https://cdn.example/images/my%20cat%231.png"
        );
    }

    #[test]
    fn test_error_mapping() {
        let read = UploadError::Read("no field".to_string());
        assert_eq!(read.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read.public_message(), "Failed to read image");

        let big = UploadError::TooLarge { limit: 10 };
        assert_eq!(big.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let create = UploadError::Storage(StorageError::Create {
            path: "x".into(),
            source: std::io::ErrorKind::PermissionDenied.into(),
        });
        assert_eq!(create.public_message(), "Failed to save image");

        let invalid = UploadError::Storage(StorageError::InvalidName {
            name: "../x".to_string(),
        });
        assert_eq!(invalid.public_message(), "Failed to save image");

        let write = UploadError::Storage(StorageError::Write {
            path: "x".into(),
            source: std::io::ErrorKind::WriteZero.into(),
        });
        assert_eq!(write.public_message(), "Failed to copy image");
        assert_eq!(
            UploadError::Copy("reset".to_string()).public_message(),
            "Failed to copy image"
        );
    }

    #[test]
    fn test_size_errors_classify_as_too_large() {
        let err = classify(
            multer::Error::StreamSizeExceeded { limit: 4 },
            4,
            UploadError::Read,
        );
        assert!(matches!(err, UploadError::TooLarge { limit: 4 }));

        let err = classify(multer::Error::IncompleteStream, 4, UploadError::Copy);
        assert!(matches!(err, UploadError::Copy(_)));
    }
}
