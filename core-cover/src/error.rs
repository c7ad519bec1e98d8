use thiserror::Error;

/// Structural problems in a JPEG marker stream
///
/// Every variant is fatal to the codec call that produced it; the codec
/// never returns a best-effort slice.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContainerError {
    #[error("Marker {tag:02X?} not found")]
    MarkerNotFound { tag: Vec<u8> },

    #[error("Truncated length field at offset {offset}")]
    TruncatedLength { offset: usize },

    #[error("Invalid segment length {declared} at offset {offset}")]
    InvalidLength { offset: usize, declared: u16 },

    #[error("Segment declares {declared} payload bytes but only {available} remain")]
    SegmentOverrun { declared: usize, available: usize },

    #[error("Container does not begin with a start-of-image marker")]
    MissingStartOfImage,

    #[error("Payload of {len} bytes exceeds the {max} byte segment limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Comment is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Failures moving cover bytes to or from the remote store
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to fetch image from {url}: status {status}")]
    FetchFailed { url: String, status: u16 },

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Failures synthesizing a cover image
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Palette must contain at least one color")]
    EmptyPalette,

    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for marker codec operations
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ContainerError::MarkerNotFound {
            tag: vec![0xFF, 0xFE],
        };
        assert_eq!(error.to_string(), "Marker [FF, FE] not found");

        let error = TransportError::FetchFailed {
            url: "https://mosaic.example/x".to_string(),
            status: 404,
        };
        assert_eq!(
            error.to_string(),
            "Failed to fetch image from https://mosaic.example/x: status 404"
        );
    }
}
