//! Decoding of support images sent as data URIs.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use printpdf::image_crate::{self, DynamicImage};

use crate::pdf::PdfError;

/// Decode a `data:image/...;base64,` URI into an RGB image.
///
/// The alpha channel is dropped since the PDF page is always white.
pub(super) fn decode_data_uri(data_uri: &str) -> Result<DynamicImage, PdfError> {
    let (header, payload) = data_uri
        .split_once(',')
        .ok_or_else(|| PdfError::Image("missing data URI separator".to_owned()))?;

    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(PdfError::Image(format!(
            "unsupported data URI header \"{header}\""
        )));
    }

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|error| PdfError::Image(error.to_string()))?;

    let image =
        image_crate::load_from_memory(&bytes).map_err(|error| PdfError::Image(error.to_string()))?;

    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Encode raw image bytes as a data URI.
pub fn encode_data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64.encode(bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use printpdf::image_crate::{DynamicImage, GenericImageView, ImageFormat, RgbImage};

    use crate::pdf::PdfError;

    use super::{decode_data_uri, encode_data_uri};

    /// A tiny PNG as a data URI, for tests that need a real image.
    pub(crate) fn png_data_uri(width: u32, height: u32) -> String {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .expect("could not encode test PNG");

        encode_data_uri("image/png", bytes.get_ref())
    }

    #[test]
    fn decodes_png_data_uri() {
        let image = decode_data_uri(&png_data_uri(4, 2)).unwrap();

        assert_eq!(image.dimensions(), (4, 2));
    }

    #[test]
    fn rejects_non_data_uri() {
        let result = decode_data_uri("https://example.com/a.png");

        assert!(matches!(result, Err(PdfError::Image(_))));
    }

    #[test]
    fn rejects_bad_base64() {
        let result = decode_data_uri("data:image/png;base64,@@@");

        assert!(matches!(result, Err(PdfError::Image(_))));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let uri = encode_data_uri("image/png", b"not an image");

        assert!(matches!(decode_data_uri(&uri), Err(PdfError::Image(_))));
    }
}
