use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl From<&DecomposedTransform> for Mat4 {
    fn from(value: &DecomposedTransform) -> Self {
        Mat4::from_scale_rotation_translation(value.scale, value.rotation, value.translation)
    }
}

impl From<&NodeTransform> for Mat4 {
    fn from(value: &NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => *matrix,
            NodeTransform::Decomposed(decomposed) => decomposed.into(),
        }
    }
}

impl From<&NodeTransform> for DecomposedTransform {
    fn from(value: &NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
                DecomposedTransform {
                    translation,
                    rotation,
                    scale,
                }
            }
            NodeTransform::Decomposed(decomposed) => decomposed.clone(),
        }
    }
}

/// A node of a scene graph. Meshes, cameras and skins are indices into the
/// owning [`SceneAsset`](super::scene::SceneAsset).
#[derive(Debug, Clone)]
pub struct NodeAsset {
    pub index: usize,
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub mesh: Option<usize>,
    pub camera: Option<usize>,
    pub skin: Option<usize>,
    pub weights: Vec<f32>,
    pub children: Vec<NodeAsset>,
}

impl NodeAsset {
    pub fn local_matrix(&self) -> Mat4 {
        (&self.transform).into()
    }

    /// Visits this node and its descendants depth first, with the world
    /// matrix of each node.
    pub fn visit<F: FnMut(&NodeAsset, Mat4)>(&self, parent: Mat4, visitor: &mut F) {
        let world = parent * self.local_matrix();
        visitor(self, world);
        for child in &self.children {
            child.visit(world, visitor);
        }
    }
}
