use crate::{error::LoadError, record::StoredAsset, source::SourceUri};

/// glTF 2.0 scenes with the `gltf` crate.
pub mod scene;

/// Textures with the `image` crate, also used for scene images.
pub mod texture;

/// Standalone raster images.
pub mod image;

/// Typeface JSON vector fonts.
pub mod font;

/// Wavefront OBJ with `tobj`.
pub mod obj;

/// Compressed audio with `symphonia`.
pub mod audio;

/// Produces one kind of asset from a source.
#[allow(async_fn_in_trait)]
pub trait Loader {
    type Asset: StoredAsset;
    type Error: Into<LoadError>;

    async fn load(&self, source: &SourceUri) -> Result<Self::Asset, Self::Error>;
}

#[inline]
fn chunk_vec3<T: Copy>(data: &[T]) -> Vec<[T; 3]> {
    data.chunks_exact(3)
        .map(|item| [item[0], item[1], item[2]])
        .collect()
}

#[inline]
fn pad_color_vec3_to_vec4(color: [f32; 3]) -> [f32; 4] {
    [color[0], color[1], color[2], 1.0]
}
