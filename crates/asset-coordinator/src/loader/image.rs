use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use image::ImageError;

use crate::{
    asset::ImageAsset,
    error::LoadErrorKind,
    source::{fetch_source, Fetch, FetchError, SourceUri},
};

use super::{
    texture::{format_hint, image_reader},
    Loader,
};

#[derive(Debug)]
pub enum ImageLoadError {
    Fetch(FetchError),
    UnknownFormat,
    Image(ImageError),
}

impl ImageLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            ImageLoadError::Fetch(error) => error.kind(),
            ImageLoadError::UnknownFormat | ImageLoadError::Image(_) => {
                LoadErrorKind::DecodeFailure
            }
        }
    }
}

impl Display for ImageLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImageLoadError::Fetch(error) => Display::fmt(&error, f),
            ImageLoadError::UnknownFormat => write!(f, "Unknown image format"),
            ImageLoadError::Image(error) => write!(f, "Failed to decode image: {}", error),
        }
    }
}

impl Error for ImageLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImageLoadError::Fetch(error) => Some(error),
            ImageLoadError::Image(error) => Some(error),
            ImageLoadError::UnknownFormat => None,
        }
    }
}

impl From<FetchError> for ImageLoadError {
    fn from(value: FetchError) -> Self {
        ImageLoadError::Fetch(value)
    }
}

impl From<ImageError> for ImageLoadError {
    fn from(value: ImageError) -> Self {
        ImageLoadError::Image(value)
    }
}

/// Decodes standalone images to RGBA8, rows top to bottom.
pub struct ImageLoader<F> {
    fetcher: Arc<F>,
}

impl<F> ImageLoader<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetch> Loader for ImageLoader<F> {
    type Asset = ImageAsset;
    type Error = ImageLoadError;

    async fn load(&self, source: &SourceUri) -> Result<ImageAsset, ImageLoadError> {
        let buffer = fetch_source(self.fetcher.as_ref(), source).await?;
        let reader = image_reader(&buffer, format_hint(source))?;
        let Some(format) = reader.format() else {
            return Err(ImageLoadError::UnknownFormat);
        };
        let image = reader.decode()?.into_rgba8();
        Ok(ImageAsset {
            width: image.width(),
            height: image.height(),
            format,
            pixels: image.into_vec(),
        })
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use base64::{engine::general_purpose::STANDARD, Engine};
    use image::ImageFormat;

    use crate::{
        error::LoadErrorKind,
        loader::{texture::test::two_row_png, Loader},
        source::{MemoryFetcher, SourceUri},
    };

    use super::ImageLoader;

    #[tokio::test]
    async fn decodes_data_uri() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(two_row_png(2)));
        let loader = ImageLoader::new(Arc::new(MemoryFetcher::new()));
        let image = loader.load(&SourceUri::parse(&uri).unwrap()).await.unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(1, 1), Some([0, 0, 255, 255]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[tokio::test]
    async fn text_is_not_an_image() {
        let fetcher = MemoryFetcher::new().with("notes.txt", b"hello".to_vec());
        let loader = ImageLoader::new(Arc::new(fetcher));
        let error = loader
            .load(&SourceUri::parse("notes.txt").unwrap())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::DecodeFailure);
    }
}
