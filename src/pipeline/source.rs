//! Where a photo comes from: a capture or a gallery pick.

use std::io::Read;
use std::path::PathBuf;

use ::image::DynamicImage;

use crate::error::Result;
use crate::image;

/// A user action that yields a photo.
#[derive(Debug)]
pub enum ImageSource<R = std::io::Stdin> {
    /// A file picked from storage.
    Gallery(PathBuf),
    /// Encoded image bytes delivered by a capture device.
    Capture(R),
}

impl<R: Read> ImageSource<R> {
    /// Decode the photo.
    ///
    /// Returns `Ok(None)` when a capture delivers no bytes, i.e. the user
    /// backed out without taking a picture.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo cannot be read or decoded.
    pub fn acquire(self) -> Result<Option<DynamicImage>> {
        match self {
            Self::Gallery(path) => image::load_image(path).map(Some),
            Self::Capture(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;

                if bytes.is_empty() {
                    tracing::info!("Capture cancelled");
                    return Ok(None);
                }

                tracing::debug!("Captured {} bytes", bytes.len());
                image::decode_image(&bytes).map(Some)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use ::image::ImageFormat;
    use std::io::Cursor;

    #[test]
    fn test_empty_capture_is_cancelled() {
        let source = ImageSource::Capture(Cursor::new(Vec::new()));
        assert!(source.acquire().unwrap().is_none());
    }

    #[test]
    fn test_capture_decodes() {
        let mut encoded = Vec::new();
        DynamicImage::new_rgb8(6, 4)
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .unwrap();

        let img = ImageSource::Capture(Cursor::new(encoded))
            .acquire()
            .unwrap()
            .unwrap();
        assert_eq!((img.width(), img.height()), (6, 4));
    }

    #[test]
    fn test_gallery_missing_file() {
        let source: ImageSource<Cursor<Vec<u8>>> =
            ImageSource::Gallery(PathBuf::from("/nonexistent/gallery/photo.png"));
        assert!(matches!(source.acquire(), Err(Error::ImageLoad { .. })));
    }
}
