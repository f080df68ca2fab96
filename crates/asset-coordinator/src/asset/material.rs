use super::texture::TextureInfo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialAlphaMode {
    Opaque,
    Mask(f32),
    Blend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalTextureInfo {
    pub texture: usize,
    pub tex_coord: usize,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionTextureInfo {
    pub texture: usize,
    pub tex_coord: usize,
    pub strength: f32,
}

/// Metallic-roughness material of a glTF scene.
#[derive(Debug, Clone)]
pub struct MaterialAsset {
    pub name: Option<String>,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<TextureInfo>,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: MaterialAlphaMode,
    pub double_sided: bool,
    /// KHR_materials_unlit
    pub unlit: bool,
}
