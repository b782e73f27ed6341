// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use image::ImageFormat;
use tracing::debug;

use crate::error::ImageError;
use crate::http::HttpClient;

/// Fixed name of the cover image inside a post directory
pub const COVER_FILENAME: &str = "featured.png";

/// Download an image and store it as PNG, whatever the source encoding
pub async fn write_cover_image<C: HttpClient>(
    client: &C,
    url: &str,
    output_path: &Path,
) -> Result<(), ImageError> {
    let response = client
        .get_bytes(url)
        .await
        .map_err(|e| ImageError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !response.is_success() {
        return Err(ImageError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let decoded = image::load_from_memory(&response.body).map_err(|e| ImageError::DecodeFailed {
        url: url.to_string(),
        source: e,
    })?;

    decoded
        .save_with_format(output_path, ImageFormat::Png)
        .map_err(|e| ImageError::WriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    debug!(%url, path = %output_path.display(), "cover image saved");
    Ok(())
}

#[cfg(test)]
pub(crate) fn encoded_test_image(format: ImageFormat) -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(pixels)
        .write_to(&mut out, format)
        .unwrap();
    out.into_inner()
}
