use mime::Mime;
use reqwest::multipart::Part;

use crate::error::{ClientError, Result};

/// An image picked by the user, ready to be sent as a multipart part
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Mime,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Content type is derived from the file extension
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_for(&file_name);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: Mime) -> Self {
        self.content_type = content_type;
        self
    }

    pub(crate) fn into_part(self) -> Result<Part> {
        Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.content_type.as_ref())
            .map_err(|e| ClientError::Validation(format!("Invalid content type: {}", e)))
    }
}

fn mime_for(file_name: &str) -> Mime {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(ImageUpload::new("a.PNG", vec![]).content_type, mime::IMAGE_PNG);
        assert_eq!(ImageUpload::new("b.jpeg", vec![]).content_type, mime::IMAGE_JPEG);
        assert_eq!(
            ImageUpload::new("c.webp", vec![]).content_type.essence_str(),
            "image/webp"
        );
        assert_eq!(
            ImageUpload::new("noext", vec![]).content_type,
            mime::APPLICATION_OCTET_STREAM
        );
    }

    #[test]
    fn test_into_part() {
        let upload = ImageUpload::new("a.png", vec![1, 2, 3]);
        assert!(upload.into_part().is_ok());
    }
}
