use super::{
    animation::AnimationAsset, camera::CameraAsset, material::MaterialAsset, mesh::MeshAsset,
    node::NodeAsset, skin::SkinAsset, texture::TextureAsset,
};

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub name: Option<String>,
    pub nodes: Vec<NodeAsset>,
}

/// A decoded glTF document. Nodes refer to meshes, cameras and skins by
/// index; materials refer to textures by index.
#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub scenes: Vec<SceneGraph>,
    pub default_scene: Option<usize>,
    pub meshes: Vec<MeshAsset>,
    pub materials: Vec<MaterialAsset>,
    pub textures: Vec<TextureAsset>,
    pub cameras: Vec<CameraAsset>,
    pub skins: Vec<SkinAsset>,
    pub animations: Vec<AnimationAsset>,
}

impl SceneAsset {
    /// The scene to show when nothing else is asked for: the declared default,
    /// else the first one.
    pub fn scene(&self) -> Option<&SceneGraph> {
        self.default_scene
            .and_then(|index| self.scenes.get(index))
            .or_else(|| self.scenes.first())
    }

    pub fn mesh(&self, index: usize) -> Option<&MeshAsset> {
        self.meshes.get(index)
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationAsset> {
        self.animations
            .iter()
            .find(|animation| animation.name.as_deref() == Some(name))
    }
}
