//! Filename derivation for uploads

use serde::Deserialize;

/// How an upload's stored filename is chosen
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// The filename the client sent with the multipart part, verbatim
    #[default]
    Original,
    /// `<content-length digits>.jpg`; equal lengths overwrite each other
    ContentLength,
}

/// Request facts a filename can be derived from
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSource<'a> {
    /// Filename from the part's `Content-Disposition`
    pub file_name: Option<&'a str>,
    /// Raw `Content-Length` header of the whole request
    pub content_length: Option<&'a str>,
    /// Bytes actually received for the image field
    pub received_bytes: u64,
}

impl NamingStrategy {
    /// Whether the part's own filename must be present before reading it
    pub const fn needs_file_name(self) -> bool {
        matches!(self, Self::Original)
    }

    /// Derive the stored filename. `None` means the request carries nothing
    /// this strategy can name the file after.
    pub fn derive(self, source: &NameSource<'_>) -> Option<String> {
        match self {
            Self::Original => source.file_name.map(ToString::to_string),
            Self::ContentLength => {
                let digits = source.content_length.map_or_else(
                    || source.received_bytes.to_string(),
                    |len| len.trim().replace('.', ""),
                );
                Some(format!("{digits}.jpg"))
            }
        }
    }
}

/// A name that is exactly one path component inside the storage directory
pub fn is_flat_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_is_verbatim() {
        let src = NameSource {
            file_name: Some("cat photo.PNG"),
            content_length: Some("512"),
            received_bytes: 5,
        };
        assert_eq!(
            NamingStrategy::Original.derive(&src).as_deref(),
            Some("cat photo.PNG")
        );
        assert_eq!(NamingStrategy::Original.derive(&NameSource::default()), None);
    }

    #[test]
    fn test_content_length_forces_jpg() {
        let src = NameSource {
            file_name: Some("a.png"),
            content_length: Some("1234"),
            received_bytes: 5,
        };
        assert_eq!(
            NamingStrategy::ContentLength.derive(&src).as_deref(),
            Some("1234.jpg")
        );
    }

    #[test]
    fn test_content_length_strips_periods() {
        let src = NameSource {
            content_length: Some("1.5"),
            ..NameSource::default()
        };
        assert_eq!(
            NamingStrategy::ContentLength.derive(&src).as_deref(),
            Some("15.jpg")
        );
    }

    #[test]
    fn test_content_length_falls_back_to_received_bytes() {
        let src = NameSource {
            received_bytes: 42,
            ..NameSource::default()
        };
        assert_eq!(
            NamingStrategy::ContentLength.derive(&src).as_deref(),
            Some("42.jpg")
        );
    }

    #[test]
    fn test_flat_names() {
        assert!(is_flat_name("a.txt"));
        assert!(is_flat_name("..hidden"));
        assert!(!is_flat_name(""));
        assert!(!is_flat_name("."));
        assert!(!is_flat_name(".."));
        assert!(!is_flat_name("../etc/passwd"));
        assert!(!is_flat_name("sub/a.png"));
        assert!(!is_flat_name("..\\win.ini"));
        assert!(!is_flat_name("nul\0byte"));
    }
}
