//! `data:` URL encoding of file payloads.
//!
//! The data URL is the only representation of a record that survives
//! persistence: `data:<mime>;base64,<payload>`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum DataUrlError {
    #[error("Not a data URL")]
    MissingScheme,

    #[error("Data URL has no payload separator")]
    MissingSeparator,

    #[error("Only base64 data URLs are supported")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Encode `data` as a base64 data URL of the given MIME type.
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    let mime = if mime_type.is_empty() {
        crate::constants::FALLBACK_CONTENT_TYPE
    } else {
        mime_type
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Decode a base64 data URL into its MIME type and payload.
pub fn decode(url: &str) -> Result<(String, Bytes), DataUrlError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(DataUrlError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingSeparator)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;

    let data = STANDARD.decode(payload.trim())?;
    Ok((mime.to_string(), Bytes::from(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        assert_eq!(encode("text/plain", b"hi"), "data:text/plain;base64,aGk=");
        assert_eq!(
            encode("", b"hi"),
            "data:application/octet-stream;base64,aGk="
        );
    }

    #[test]
    fn test_decode() {
        let (mime, data) = decode("data:image/png;base64,AAEC").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(&data[..], &[0u8, 1, 2]);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode("image/png;base64,AAEC"),
            Err(DataUrlError::MissingScheme)
        ));
        assert!(matches!(
            decode("data:image/png;base64"),
            Err(DataUrlError::MissingSeparator)
        ));
        assert!(matches!(
            decode("data:text/plain,hello"),
            Err(DataUrlError::NotBase64)
        ));
        assert!(matches!(
            decode("data:image/png;base64,***"),
            Err(DataUrlError::Decode(_))
        ));
    }
}
