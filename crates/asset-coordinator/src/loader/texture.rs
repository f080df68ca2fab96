use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io::Cursor,
    sync::Arc,
};

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader};

use crate::{
    asset::texture::{SamplerAsset, TextureAsset, TextureAssetFormat},
    config::TextureSettings,
    error::LoadErrorKind,
    source::{fetch_source, Fetch, FetchError, SourceUri},
};

use super::Loader;

#[derive(Debug)]
pub enum TextureLoadError {
    Fetch(FetchError),
    Image(ImageError),
}

impl TextureLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            TextureLoadError::Fetch(error) => error.kind(),
            TextureLoadError::Image(_) => LoadErrorKind::DecodeFailure,
        }
    }
}

impl Display for TextureLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TextureLoadError::Fetch(error) => Display::fmt(&error, f),
            TextureLoadError::Image(error) => write!(f, "Failed to decode texture: {}", error),
        }
    }
}

impl Error for TextureLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TextureLoadError::Fetch(error) => Some(error),
            TextureLoadError::Image(error) => Some(error),
        }
    }
}

impl From<FetchError> for TextureLoadError {
    fn from(value: FetchError) -> Self {
        TextureLoadError::Fetch(value)
    }
}

impl From<ImageError> for TextureLoadError {
    fn from(value: ImageError) -> Self {
        TextureLoadError::Image(value)
    }
}

/// Image format named by a MIME type or file extension of the source.
pub(crate) fn format_hint(source: &SourceUri) -> Option<ImageFormat> {
    source
        .mime()
        .and_then(ImageFormat::from_mime_type)
        .or_else(|| source.extension().and_then(ImageFormat::from_extension))
}

/// Opens a reader that trusts magic bytes first and `format` second.
pub(crate) fn image_reader(
    buffer: &[u8],
    format: Option<ImageFormat>,
) -> Result<ImageReader<Cursor<&[u8]>>, ImageError> {
    let mut reader = ImageReader::new(Cursor::new(buffer));
    if let Some(format) = format {
        reader.set_format(format);
    }
    Ok(reader.with_guessed_format()?)
}

/// Keeps the channel layout of the decoded image where a texture format
/// exists for it; float images become 16 bit, everything else RGBA8.
pub(crate) fn texture_from_image(image: DynamicImage, sampler: SamplerAsset) -> TextureAsset {
    fn u16_bytes(data: Vec<u16>) -> Vec<u8> {
        data.into_iter().flat_map(|item| item.to_le_bytes()).collect()
    }

    let dimensions = image.dimensions();
    let (data, format) = match image {
        DynamicImage::ImageLuma8(image) => (image.into_vec(), TextureAssetFormat::Ru8),
        DynamicImage::ImageLumaA8(image) => (image.into_vec(), TextureAssetFormat::Rgu8),
        DynamicImage::ImageRgb8(image) => (image.into_vec(), TextureAssetFormat::Rgbu8),
        DynamicImage::ImageRgba8(image) => (image.into_vec(), TextureAssetFormat::Rgbau8),
        DynamicImage::ImageLuma16(image) => (u16_bytes(image.into_vec()), TextureAssetFormat::Ru16),
        DynamicImage::ImageLumaA16(image) => {
            (u16_bytes(image.into_vec()), TextureAssetFormat::Rgu16)
        }
        DynamicImage::ImageRgb16(image) => {
            (u16_bytes(image.into_vec()), TextureAssetFormat::Rgbu16)
        }
        DynamicImage::ImageRgba16(image) => {
            (u16_bytes(image.into_vec()), TextureAssetFormat::Rgbau16)
        }
        image @ DynamicImage::ImageRgb32F(_) => (
            u16_bytes(image.into_rgb16().into_vec()),
            TextureAssetFormat::Rgbu16,
        ),
        image @ DynamicImage::ImageRgba32F(_) => (
            u16_bytes(image.into_rgba16().into_vec()),
            TextureAssetFormat::Rgbau16,
        ),
        image => (image.into_rgba8().into_vec(), TextureAssetFormat::Rgbau8),
    };

    TextureAsset {
        size: dimensions,
        format,
        data,
        sampler,
    }
}

pub(crate) fn decode_texture(
    buffer: &[u8],
    format: Option<ImageFormat>,
    sampler: SamplerAsset,
    flip_y: bool,
) -> Result<TextureAsset, ImageError> {
    let image = image_reader(buffer, format)?.decode()?;
    let image = if flip_y { image.flipv() } else { image };
    Ok(texture_from_image(image, sampler))
}

pub struct TextureLoader<F> {
    fetcher: Arc<F>,
    settings: TextureSettings,
}

impl<F> TextureLoader<F> {
    pub fn new(fetcher: Arc<F>, settings: TextureSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }
}

impl<F: Fetch> Loader for TextureLoader<F> {
    type Asset = TextureAsset;
    type Error = TextureLoadError;

    async fn load(&self, source: &SourceUri) -> Result<TextureAsset, TextureLoadError> {
        let buffer = fetch_source(self.fetcher.as_ref(), source).await?;
        let texture = decode_texture(
            &buffer,
            format_hint(source),
            self.settings.sampler.clone(),
            self.settings.flip_y,
        )?;
        Ok(texture)
    }
}
