//! Image Embedder – turns a caller-supplied logo payload into a fixed-size
//! placement.
//!
//! A broken logo never fails a render: every decode problem is logged and
//! reported as "no image".

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::layout_config::EmbeddedImage;

/// A decoded logo and the rectangle it occupies on the page, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub image: EmbeddedImage,
    pub width: f32,
    pub height: f32,
}

/// Decode `payload` (bare base64 or a `data:<mime>;base64,` URI) and size it
/// to `width` × `height` points. Returns `None` if anything goes wrong.
pub fn decode_logo(payload: &str, width: f32, height: f32) -> Option<Logo> {
    let bytes = match decode_payload(payload) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Skipping logo: {e}");
            return None;
        }
    };

    // Decode with the `image` crate to obtain pixel dimensions and to make
    // sure the PDF writer will not choke on it later.
    let decoded = match ::image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("Skipping logo: decode error: {e}");
            return None;
        }
    };

    Some(Logo {
        image: EmbeddedImage {
            px_width: decoded.width(),
            px_height: decoded.height(),
            bytes,
        },
        width,
        height,
    })
}

/// Strip an optional data-URI header and base64-decode the rest.
fn decode_payload(payload: &str) -> Result<Vec<u8>, String> {
    let payload = payload.trim();
    let data = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                "Invalid data URI: missing `,` separator between header and data".to_string()
            })?;
            if !header.contains(";base64") {
                return Err("Only base64-encoded data URIs are supported".to_string());
            }
            data
        }
        None => payload,
    };
    let data: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if data.is_empty() {
        return Err("empty image payload".to_string());
    }
    BASE64_STD
        .decode(data.as_bytes())
        .map_err(|e| format!("Base64 decode error: {e}"))
}
