//! Decoded assets, one type per kind plus the pieces a scene is made of.

pub mod animation;
pub mod audio;
pub mod camera;
pub mod font;
pub mod image;
pub mod material;
pub mod mesh;
pub mod node;
pub mod object;
pub mod primitive;
pub mod scene;
pub mod skin;
pub mod texture;

pub use audio::AudioBuffer;
pub use font::FontAsset;
pub use image::ImageAsset;
pub use object::MeshObjectAsset;
pub use scene::SceneAsset;
pub use texture::TextureAsset;
