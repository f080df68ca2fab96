#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveAssetMode {
    Points,
    LineStrip,
    LineLoop,
    LineList,
    TriangleStrip,
    TriangleFan,
    TriangleList,
}

pub type Position = Vec<[f32; 3]>;
pub type Normal = Vec<[f32; 3]>;
pub type Tangent = Vec<[f32; 4]>;
pub type TexCoord = Vec<[f32; 2]>;
pub type VertexColor = Vec<[f32; 4]>;
pub type Joints = Vec<[u16; 4]>;
pub type Weights = Vec<[f32; 4]>;

#[derive(Debug, Clone, Default)]
pub struct PrimitiveAssetAttributes {
    pub position: Position,
    pub normal: Normal,
    pub tangent: Tangent,
    pub tex_coord: Vec<TexCoord>,
    pub color: Vec<VertexColor>,
    pub joints: Vec<Joints>,
    pub weights: Vec<Weights>,
}

#[derive(Debug, Clone)]
pub struct PrimitiveAssetMorphTarget {
    pub position: Position,
    pub normal: Normal,
    pub tangent: Vec<[f32; 3]>,
}

#[derive(Debug, Clone)]
pub struct PrimitiveAsset {
    pub attributes: PrimitiveAssetAttributes,
    pub indices: Option<Vec<u32>>,
    /// Index into the materials of the owning scene or mesh object.
    pub material: Option<usize>,
    pub mode: PrimitiveAssetMode,
    pub targets: Vec<PrimitiveAssetMorphTarget>,
}

impl PrimitiveAsset {
    pub fn vertex_count(&self) -> usize {
        self.attributes.position.len()
    }

    pub fn triangle_count(&self) -> usize {
        let count = self
            .indices
            .as_ref()
            .map(Vec::len)
            .unwrap_or_else(|| self.vertex_count());
        match self.mode {
            PrimitiveAssetMode::TriangleList => count / 3,
            PrimitiveAssetMode::TriangleStrip | PrimitiveAssetMode::TriangleFan => {
                count.saturating_sub(2)
            }
            _ => 0,
        }
    }
}

/// Area weighted vertex normals of a triangle list.
///
/// Vertices not referenced by any triangle get a zero normal.
pub fn compute_vertex_normals(position: &[[f32; 3]], indices: Option<&[u32]>) -> Normal {
    let mut normals = vec![glam::Vec3::ZERO; position.len()];
    let sequential: Vec<u32>;
    let indices = match indices {
        Some(indices) => indices,
        None => {
            sequential = (0..position.len() as u32).collect();
            &sequential
        }
    };

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|index| index as usize);
        let (Some(pa), Some(pb), Some(pc)) = (position.get(a), position.get(b), position.get(c))
        else {
            continue;
        };
        let pa = glam::Vec3::from_array(*pa);
        let face = (glam::Vec3::from_array(*pb) - pa).cross(glam::Vec3::from_array(*pc) - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    normals
        .into_iter()
        .map(|normal| normal.normalize_or_zero().to_array())
        .collect()
}

#[cfg(test)]
mod test {
    use super::compute_vertex_normals;

    #[test]
    fn flat_triangle_faces_up() {
        let position = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        let normals = compute_vertex_normals(&position, Some(&[0, 1, 2]));
        assert_eq!(normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(normals[2], [0.0, 0.0, 1.0]);
        assert_eq!(normals[3], [0.0, 0.0, 0.0]);
    }
}
