use serde::{Deserialize, Serialize};

/// Pixel layout of texture data, tightly packed, little endian for 16 bit
/// channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAssetFormat {
    Ru8,
    Rgu8,
    Rgbu8,
    Rgbau8,
    Ru16,
    Rgu16,
    Rgbu16,
    Rgbau16,
}

impl TextureAssetFormat {
    pub fn channels(self) -> usize {
        match self {
            TextureAssetFormat::Ru8 | TextureAssetFormat::Ru16 => 1,
            TextureAssetFormat::Rgu8 | TextureAssetFormat::Rgu16 => 2,
            TextureAssetFormat::Rgbu8 | TextureAssetFormat::Rgbu16 => 3,
            TextureAssetFormat::Rgbau8 | TextureAssetFormat::Rgbau16 => 4,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureAssetFormat::Ru8
            | TextureAssetFormat::Rgu8
            | TextureAssetFormat::Rgbu8
            | TextureAssetFormat::Rgbau8 => self.channels(),
            _ => self.channels() * 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub size: (u32, u32),
    pub format: TextureAssetFormat,
    pub data: Vec<u8>,
    pub sampler: SamplerAsset,
}

impl TextureAsset {
    pub fn row_pitch(&self) -> usize {
        self.size.0 as usize * self.format.bytes_per_pixel()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureMagFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureMinFilter {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureMipmapFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureWrappingMode {
    #[default]
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerAsset {
    pub mag_filter: TextureMagFilter,
    pub min_filter: TextureMinFilter,
    pub mipmap_filter: TextureMipmapFilter,
    pub wrap_x: TextureWrappingMode,
    pub wrap_y: TextureWrappingMode,
}

/// Reference from a material to a texture of the same scene.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    pub texture: usize,
    pub tex_coord: usize,
    pub transform: Option<TextureAssetTransform>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureAssetTransform {
    pub offset: [f32; 2],
    pub rotation: f32,
    pub scale: [f32; 2],
    pub tex_coord: Option<usize>,
}
