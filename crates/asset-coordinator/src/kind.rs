use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The kinds of asset a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    Scene,
    Texture,
    Image,
    Font,
    MeshObject,
    Audio,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Scene,
        AssetKind::Texture,
        AssetKind::Image,
        AssetKind::Font,
        AssetKind::MeshObject,
        AssetKind::Audio,
    ];

    /// Field name carrying a source of this kind in a request manifest.
    pub fn request_field(self) -> &'static str {
        match self {
            AssetKind::Scene => "gltf",
            AssetKind::Texture => "texture",
            AssetKind::Image => "img",
            AssetKind::Font => "font",
            AssetKind::MeshObject => "obj",
            AssetKind::Audio => "audio",
        }
    }

    /// Tag of the loaded object inside an asset record.
    pub fn result_tag(self) -> &'static str {
        match self {
            AssetKind::Scene => "scene",
            AssetKind::Texture => "texture",
            AssetKind::Image => "image",
            AssetKind::Font => "font",
            AssetKind::MeshObject => "mesh-object",
            AssetKind::Audio => "audio-buffer",
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.result_tag())
    }
}
