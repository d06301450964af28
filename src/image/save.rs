//! Image saving utilities.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::RasterImage;

/// Save a display-range image to disk, format inferred from the extension.
///
/// `jpg`/`jpeg` outputs are written through the JPEG encoder at the given
/// quality; any other extension is handed to the format-driven encoder, so
/// an unrecognized extension surfaces as a save error rather than a crash.
///
/// # Arguments
///
/// * `image` - `Gray`, `Rgb` or `Bgr` buffer with samples in `[0, 255]`
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the buffer is not displayable or cannot be written.
pub fn save_image<P: AsRef<Path>>(image: &RasterImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let final_img = image::DynamicImage::ImageRgb8(image.to_rgb8()?);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            final_img
                .write_with_encoder(encoder)
                .map_err(|source| Error::Save {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            final_img.save(path).map_err(|source| Error::Save {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

/// Conventional output path for a colorized rendition of `input`:
/// `colorized_<file name>` in the same directory, defaulting to a `.jpg`
/// extension when the input has none.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let name = match input.file_name() {
        Some(n) => format!("colorized_{}", n.to_string_lossy()),
        None => String::from("colorized"),
    };

    let mut out = input.with_file_name(name);
    if out.extension().is_none() {
        out.set_extension("jpg");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::image::ColorSpace;

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output_path(Path::new("photo.png")),
            PathBuf::from("colorized_photo.png")
        );
        assert_eq!(
            default_output_path(Path::new("/shots/old/scan.jpg")),
            PathBuf::from("/shots/old/colorized_scan.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("bare")),
            PathBuf::from("colorized_bare.jpg")
        );
    }

    #[test]
    fn test_save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image =
            RasterImage::from_samples(2, 1, ColorSpace::Rgb, vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0])
                .unwrap();

        save_image(&image, &path, 95).unwrap();

        let reloaded = crate::image::load_image(&path).unwrap();
        assert_eq!(reloaded.dimensions(), (2, 1));
        assert_eq!(reloaded.samples(), image.samples());
    }

    #[test]
    fn test_save_jpeg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let image =
            RasterImage::from_samples(4, 4, ColorSpace::Gray, vec![128.0; 16]).unwrap();

        save_image(&image, &path, 90).unwrap();

        let reloaded = crate::image::load_image(&path).unwrap();
        assert_eq!(reloaded.dimensions(), (4, 4));
    }

    #[test]
    fn test_save_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tiff.bogus");
        let image = RasterImage::from_samples(1, 1, ColorSpace::Gray, vec![0.0]).unwrap();

        assert!(matches!(
            save_image(&image, &path, 95),
            Err(Error::Save { .. })
        ));
    }
}
