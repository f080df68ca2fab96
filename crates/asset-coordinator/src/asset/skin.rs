use glam::Mat4;

#[derive(Debug, Clone)]
pub struct SkinAsset {
    pub name: Option<String>,
    /// Node indices of the joints.
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Option<Vec<Mat4>>,
    pub skeleton: Option<usize>,
}
