use std::{fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::texture::SamplerAsset;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    /// Flip rows so the first row is the bottom of the image, as GL texture
    /// uploads expect.
    pub flip_y: bool,
    pub sampler: SamplerAsset,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            flip_y: true,
            sampler: SamplerAsset::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Directory relative paths are resolved against.
    pub base_dir: PathBuf,
    /// Allow `http://` and `https://` sources.
    pub http: bool,
    pub texture: TextureSettings,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            http: true,
            texture: TextureSettings::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use crate::asset::texture::{TextureMagFilter, TextureWrappingMode};

    use super::CoordinatorConfig;

    #[test]
    fn missing_fields_take_defaults() {
        let config = CoordinatorConfig::from_json(
            r#"{
                "base_dir": "assets",
                "texture": { "flip_y": false, "sampler": { "mag_filter": "nearest", "wrap_x": "repeat" } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.base_dir, PathBuf::from("assets"));
        assert!(config.http);
        assert!(!config.texture.flip_y);
        assert_eq!(config.texture.sampler.mag_filter, TextureMagFilter::Nearest);
        assert_eq!(config.texture.sampler.wrap_x, TextureWrappingMode::Repeat);
        assert_eq!(config.texture.sampler.wrap_y, TextureWrappingMode::ClampToEdge);
    }

    #[test]
    fn rejects_unknown_enum_values() {
        let result = CoordinatorConfig::from_json(r#"{ "texture": { "sampler": { "mag_filter": "cubic" } } }"#);
        assert!(result.is_err());
    }
}
