use super::primitive::PrimitiveAsset;

/// A Blinn-Phong material read from an MTL library. Texture maps are kept as
/// the paths written in the library.
#[derive(Debug, Clone)]
pub struct ObjMaterialAsset {
    pub name: String,
    pub ambient_color: [f32; 3],
    pub diffuse_color: [f32; 3],
    pub specular_color: [f32; 3],
    pub shininess: f32,
    pub dissolve: f32,
    pub optical_density: f32,
    pub ambient_texture: Option<String>,
    pub diffuse_texture: Option<String>,
    pub specular_texture: Option<String>,
    pub normal_texture: Option<String>,
    pub shininess_texture: Option<String>,
    pub dissolve_texture: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjModelAsset {
    pub name: String,
    pub primitive: PrimitiveAsset,
}

/// Models of a Wavefront OBJ file. Primitive materials index into
/// `materials`.
#[derive(Debug, Clone, Default)]
pub struct MeshObjectAsset {
    pub models: Vec<ObjModelAsset>,
    pub materials: Vec<ObjMaterialAsset>,
}

impl MeshObjectAsset {
    pub fn model(&self, name: &str) -> Option<&ObjModelAsset> {
        self.models.iter().find(|model| model.name == name)
    }

    pub fn vertex_count(&self) -> usize {
        self.models
            .iter()
            .map(|model| model.primitive.vertex_count())
            .sum()
    }
}
