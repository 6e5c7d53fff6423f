//! Inbound image payload handling: data-URL/base64 decoding, mime
//! detection, and the decoded-size cap.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// A decoded inbound image.
#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Why an inbound image was rejected. `Unparseable` maps to 400,
/// `TooLarge` to 413.
#[derive(Debug)]
pub enum ImageError {
    Unparseable(String),
    TooLarge { size: usize, cap: usize },
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Unparseable(msg) => write!(f, "{}", msg),
            ImageError::TooLarge { size, cap } => write!(
                f,
                "image is about {} bytes, exceeding the {} byte limit",
                size, cap
            ),
        }
    }
}

impl std::error::Error for ImageError {}

/// Decode a data URL or raw base64 payload, enforcing the decoded-size cap.
///
/// Mime resolution order: data-URL header, then filename extension, then
/// `image/png`.
pub fn decode_image(
    input: &str,
    filename: Option<&str>,
    cap: usize,
) -> Result<DecodedImage, ImageError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ImageError::Unparseable("image payload is empty".into()));
    }

    let (payload, mime) = if let Some(rest) = input.strip_prefix("data:") {
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            ImageError::Unparseable("malformed data URL: missing comma separator".into())
        })?;
        let mime = header.trim_end_matches(";base64").trim();
        let mime = if mime.is_empty() {
            mime_from_filename(filename)
        } else {
            mime.to_string()
        };
        (payload, mime)
    } else {
        (input, mime_from_filename(filename))
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| ImageError::Unparseable(format!("invalid base64 image payload: {}", e)))?;

    if bytes.len() > cap {
        return Err(ImageError::TooLarge {
            size: bytes.len(),
            cap,
        });
    }

    Ok(DecodedImage { bytes, mime })
}

fn mime_from_filename(filename: Option<&str>) -> String {
    let ext = filename
        .and_then(|f| f.rsplit_once('.'))
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
    .to_string()
}
