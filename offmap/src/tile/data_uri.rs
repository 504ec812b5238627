//! `data:` URI encoding for tile payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use thiserror::Error;

/// MIME type used when the payload format cannot be recognised.
const FALLBACK_MIME: &str = "image/png";

/// Errors decoding a stored tile payload.
#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("payload is not a data URI")]
    NotDataUri,

    #[error("data URI is not base64 encoded")]
    NotBase64,

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

/// Picks the MIME type by sniffing the image header.
pub fn mime_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        _ => FALLBACK_MIME,
    }
}

/// Encodes bytes as `data:<mime>;base64,<payload>`.
pub fn encode_data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_for(bytes), STANDARD.encode(bytes))
}

/// Splits a data URI into its MIME type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUriError::NotDataUri)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(DataUriError::NotBase64)?;

    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    #[test]
    fn test_png_mime() {
        assert_eq!(mime_for(PNG_MAGIC), "image/png");
        assert!(encode_data_uri(PNG_MAGIC).starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_mime() {
        assert_eq!(mime_for(JPEG_MAGIC), "image/jpeg");
    }

    #[test]
    fn test_unknown_bytes_fall_back_to_png() {
        assert_eq!(mime_for(b"hello"), "image/png");
    }

    #[test]
    fn test_decode_recovers_bytes_and_mime() {
        let uri = encode_data_uri(JPEG_MAGIC);
        let (mime, bytes) = decode_data_uri(&uri).unwrap();

        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, JPEG_MAGIC);
    }

    #[test]
    fn test_decode_rejects_plain_url() {
        let result = decode_data_uri("https://tile.openstreetmap.org/0/0/0.png");
        assert!(matches!(result, Err(DataUriError::NotDataUri)));
    }

    #[test]
    fn test_decode_rejects_percent_encoded() {
        let result = decode_data_uri("data:text/plain,hello");
        assert!(matches!(result, Err(DataUriError::NotBase64)));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let result = decode_data_uri("data:image/png;base64,@@@");
        assert!(matches!(result, Err(DataUriError::Base64(_))));
    }
}
