use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    sync::Arc,
};

use futures::future::try_join_all;
use glam::{Mat4, Quat, Vec3};
use gltf::{
    animation::{util::ReadOutputs, Interpolation},
    camera::Projection,
    json::Value,
    material::AlphaMode,
    mesh::Mode,
    scene::Transform,
    texture::{self, MagFilter, MinFilter, WrappingMode},
    Animation, Camera, Document, Gltf, Material, Mesh, Node, Primitive, Scene, Skin,
};
use image::{DynamicImage, ImageError, ImageFormat};
use log::{debug, warn};

use crate::{
    asset::{
        animation::{
            AnimationAsset, AnimationChannelAsset, AnimationKeyFrame, AnimationKeyFrames,
            AnimationSampler,
        },
        camera::{
            CameraAsset, CameraProjectionAsset, OrthographicCameraAsset, PerspectiveCameraAsset,
        },
        material::{MaterialAlphaMode, MaterialAsset, NormalTextureInfo, OcclusionTextureInfo},
        mesh::MeshAsset,
        node::{DecomposedTransform, NodeAsset, NodeTransform},
        primitive::{
            compute_vertex_normals, PrimitiveAsset, PrimitiveAssetAttributes, PrimitiveAssetMode,
            PrimitiveAssetMorphTarget,
        },
        scene::{SceneAsset, SceneGraph},
        skin::SkinAsset,
        texture::{
            SamplerAsset, TextureAsset, TextureAssetTransform, TextureInfo, TextureMagFilter,
            TextureMinFilter, TextureMipmapFilter, TextureWrappingMode,
        },
    },
    error::LoadErrorKind,
    source::{fetch_source, Fetch, FetchError, SchemeError, SourceUri},
};

use super::{
    texture::{image_reader, texture_from_image},
    Loader,
};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

#[derive(Debug)]
pub enum SceneLoadError {
    Fetch(FetchError),
    Gltf(gltf::Error),
    Source(SchemeError),
    MissingBinaryChunk,
    BufferTooShort {
        buffer: usize,
        expected: usize,
        actual: usize,
    },
    BufferViewOutOfBounds(usize),
    BadImageMime {
        image: usize,
        mime: String,
    },
    Image {
        image: usize,
        error: ImageError,
    },
    MissingPositions {
        mesh: usize,
        primitive: usize,
    },
    MissingAnimationData {
        animation: usize,
        channel: usize,
    },
    NodeCycle(usize),
    CompressedMeshUnsupported {
        mesh: usize,
        primitive: usize,
    },
    BadCompressedMesh {
        mesh: usize,
        primitive: usize,
    },
    CompressedMesh {
        mesh: usize,
        primitive: usize,
        error: Box<dyn Error + Send + Sync>,
    },
}

impl SceneLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            SceneLoadError::Fetch(error) => error.kind(),
            SceneLoadError::Source(_) => LoadErrorKind::MalformedSource,
            _ => LoadErrorKind::DecodeFailure,
        }
    }
}

impl Display for SceneLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Fetch(error) => Display::fmt(error, f),
            SceneLoadError::Gltf(error) => Display::fmt(error, f),
            SceneLoadError::Source(error) => write!(f, "Bad reference in glTF: {}", error),
            SceneLoadError::MissingBinaryChunk => {
                write!(f, "Buffer refers to a binary chunk, but the file has none")
            }
            SceneLoadError::BufferTooShort {
                buffer,
                expected,
                actual,
            } => write!(
                f,
                "Buffer #{} is too short: expected {} bytes, got {}",
                buffer, expected, actual
            ),
            SceneLoadError::BufferViewOutOfBounds(view) => {
                write!(f, "Buffer view #{} is out of bounds", view)
            }
            SceneLoadError::BadImageMime { image, mime } => {
                write!(f, "Bad MIME {} for image #{}", mime, image)
            }
            SceneLoadError::Image { image, error } => {
                write!(f, "Bad image #{}: {}", image, error)
            }
            SceneLoadError::MissingPositions { mesh, primitive } => write!(
                f,
                "No positions in primitive #{} of mesh #{}",
                primitive, mesh
            ),
            SceneLoadError::MissingAnimationData { animation, channel } => write!(
                f,
                "Missing keyframes in channel #{} of animation #{}",
                channel, animation
            ),
            SceneLoadError::NodeCycle(node) => write!(f, "Node #{} is its own ancestor", node),
            SceneLoadError::CompressedMeshUnsupported { mesh, primitive } => write!(
                f,
                "Primitive #{} of mesh #{} is Draco compressed and no decoder is attached",
                primitive, mesh
            ),
            SceneLoadError::BadCompressedMesh { mesh, primitive } => write!(
                f,
                "Bad {} data in primitive #{} of mesh #{}",
                DRACO_EXTENSION, primitive, mesh
            ),
            SceneLoadError::CompressedMesh {
                mesh,
                primitive,
                error,
            } => write!(
                f,
                "Failed to decompress primitive #{} of mesh #{}: {}",
                primitive, mesh, error
            ),
        }
    }
}

impl Error for SceneLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SceneLoadError::Fetch(error) => Some(error),
            SceneLoadError::Gltf(error) => Some(error),
            SceneLoadError::Source(error) => Some(error),
            SceneLoadError::Image { error, .. } => Some(error),
            SceneLoadError::CompressedMesh { error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<FetchError> for SceneLoadError {
    fn from(value: FetchError) -> Self {
        SceneLoadError::Fetch(value)
    }
}

impl From<gltf::Error> for SceneLoadError {
    fn from(value: gltf::Error) -> Self {
        SceneLoadError::Gltf(value)
    }
}

impl From<SchemeError> for SceneLoadError {
    fn from(value: SchemeError) -> Self {
        SceneLoadError::Source(value)
    }
}

/// A primitive stored with `KHR_draco_mesh_compression`.
#[derive(Debug, Clone)]
pub struct CompressedPrimitive<'a> {
    /// Bytes of the buffer view holding the compressed mesh.
    pub data: &'a [u8],
    /// glTF attribute semantic to Draco attribute id.
    pub attributes: BTreeMap<String, u32>,
    pub mode: PrimitiveAssetMode,
}

/// Turns Draco compressed primitives back into plain vertex data.
///
/// No decoder ships with this crate; scenes with compressed primitives fail
/// to load unless one is attached to the coordinator.
pub trait CompressedMeshDecoder: Send + Sync {
    fn decode(
        &self,
        primitive: CompressedPrimitive<'_>,
    ) -> Result<PrimitiveAsset, Box<dyn Error + Send + Sync>>;
}

/// Drops the Draco extension from `extensionsRequired`, so validation passes
/// and compressed primitives reach the attached decoder.
fn accept_compressed_meshes(document: Document) -> Result<Document, gltf::Error> {
    let mut root = document.into_json();
    root.extensions_required
        .retain(|extension| extension != DRACO_EXTENSION);
    Document::from_json(root)
}

fn load_texture_sampler(sampler: texture::Sampler) -> SamplerAsset {
    let (min_filter, mipmap_filter) = sampler
        .min_filter()
        .map(|filter| match filter {
            MinFilter::Nearest => (TextureMinFilter::Nearest, TextureMipmapFilter::default()),
            MinFilter::Linear => (TextureMinFilter::Linear, TextureMipmapFilter::default()),
            MinFilter::NearestMipmapNearest => {
                (TextureMinFilter::Nearest, TextureMipmapFilter::Nearest)
            }
            MinFilter::LinearMipmapNearest => {
                (TextureMinFilter::Linear, TextureMipmapFilter::Nearest)
            }
            MinFilter::NearestMipmapLinear => {
                (TextureMinFilter::Nearest, TextureMipmapFilter::Linear)
            }
            MinFilter::LinearMipmapLinear => {
                (TextureMinFilter::Linear, TextureMipmapFilter::Linear)
            }
        })
        .unwrap_or_default();

    fn wrapping_mode(mode: WrappingMode) -> TextureWrappingMode {
        match mode {
            WrappingMode::ClampToEdge => TextureWrappingMode::ClampToEdge,
            WrappingMode::MirroredRepeat => TextureWrappingMode::MirroredRepeat,
            WrappingMode::Repeat => TextureWrappingMode::Repeat,
        }
    }

    SamplerAsset {
        mag_filter: sampler
            .mag_filter()
            .map(|filter| match filter {
                MagFilter::Nearest => TextureMagFilter::Nearest,
                MagFilter::Linear => TextureMagFilter::Linear,
            })
            .unwrap_or_default(),
        min_filter,
        mipmap_filter,
        wrap_x: wrapping_mode(sampler.wrap_s()),
        wrap_y: wrapping_mode(sampler.wrap_t()),
    }
}

fn load_texture_info(info: texture::Info) -> TextureInfo {
    TextureInfo {
        texture: info.texture().index(),
        tex_coord: info.tex_coord() as usize,
        transform: info
            .texture_transform()
            .map(|transform| TextureAssetTransform {
                offset: transform.offset(),
                rotation: transform.rotation(),
                scale: transform.scale(),
                tex_coord: transform.tex_coord().map(|v| v as usize),
            }),
    }
}

fn load_material(material: Material) -> MaterialAsset {
    let alpha_mode = match material.alpha_mode() {
        AlphaMode::Opaque => MaterialAlphaMode::Opaque,
        AlphaMode::Mask => MaterialAlphaMode::Mask(material.alpha_cutoff().unwrap_or(0.5)),
        AlphaMode::Blend => MaterialAlphaMode::Blend,
    };
    let pbr = material.pbr_metallic_roughness();

    MaterialAsset {
        name: material.name().map(str::to_string),
        base_color_factor: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(load_texture_info),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().map(load_texture_info),
        normal_texture: material.normal_texture().map(|info| NormalTextureInfo {
            texture: info.texture().index(),
            tex_coord: info.tex_coord() as usize,
            scale: info.scale(),
        }),
        occlusion_texture: material.occlusion_texture().map(|info| OcclusionTextureInfo {
            texture: info.texture().index(),
            tex_coord: info.tex_coord() as usize,
            strength: info.strength(),
        }),
        emissive_texture: material.emissive_texture().map(load_texture_info),
        emissive_factor: material.emissive_factor(),
        alpha_mode,
        double_sided: material.double_sided(),
        unlit: material.unlit(),
    }
}

fn load_camera(camera: Camera) -> CameraAsset {
    let projection = match camera.projection() {
        Projection::Orthographic(orthographic) => {
            CameraProjectionAsset::Orthographic(OrthographicCameraAsset {
                xmag: orthographic.xmag(),
                ymag: orthographic.ymag(),
                zfar: orthographic.zfar(),
                znear: orthographic.znear(),
            })
        }
        Projection::Perspective(perspective) => {
            CameraProjectionAsset::Perspective(PerspectiveCameraAsset {
                aspect_ratio: perspective.aspect_ratio(),
                yfov: perspective.yfov(),
                zfar: perspective.zfar(),
                znear: perspective.znear(),
            })
        }
    };
    CameraAsset {
        name: camera.name().map(str::to_string),
        projection,
    }
}

fn primitive_mode(mode: Mode) -> PrimitiveAssetMode {
    match mode {
        Mode::Points => PrimitiveAssetMode::Points,
        Mode::Lines => PrimitiveAssetMode::LineList,
        Mode::LineLoop => PrimitiveAssetMode::LineLoop,
        Mode::LineStrip => PrimitiveAssetMode::LineStrip,
        Mode::Triangles => PrimitiveAssetMode::TriangleList,
        Mode::TriangleStrip => PrimitiveAssetMode::TriangleStrip,
        Mode::TriangleFan => PrimitiveAssetMode::TriangleFan,
    }
}

fn keyframes<T: Debug + Clone>(
    times: &[f32],
    values: Vec<T>,
    interpolation: Interpolation,
) -> AnimationKeyFrames<T> {
    match interpolation {
        Interpolation::Linear | Interpolation::Step => {
            let frames = times
                .iter()
                .zip(values)
                .map(|(time, value)| AnimationKeyFrame { time: *time, value })
                .collect();
            if interpolation == Interpolation::Step {
                AnimationKeyFrames::Step(frames)
            } else {
                AnimationKeyFrames::Linear(frames)
            }
        }
        Interpolation::CubicSpline => AnimationKeyFrames::CubicSpline(
            times
                .iter()
                .zip(values.chunks_exact(3))
                .map(|(time, chunk)| AnimationKeyFrame {
                    time: *time,
                    value: (chunk[0].clone(), chunk[1].clone(), chunk[2].clone()),
                })
                .collect(),
        ),
    }
}

/// Converts a validated document with its buffers into a [`SceneAsset`].
struct GltfDocumentLoader<'a> {
    document: &'a Document,
    buffers: &'a [Vec<u8>],
    compressed_mesh_decoder: Option<&'a dyn CompressedMeshDecoder>,
}

impl<'a> GltfDocumentLoader<'a> {
    fn view_data(&self, view: &gltf::buffer::View) -> Result<&'a [u8], SceneLoadError> {
        let buffer = self
            .buffers
            .get(view.buffer().index())
            .ok_or(SceneLoadError::BufferViewOutOfBounds(view.index()))?;
        buffer
            .get(view.offset()..view.offset() + view.length())
            .ok_or(SceneLoadError::BufferViewOutOfBounds(view.index()))
    }

    fn load_compressed_primitive(
        &self,
        mesh: usize,
        primitive: &Primitive,
        extension: &Value,
    ) -> Result<PrimitiveAsset, SceneLoadError> {
        let bad = || SceneLoadError::BadCompressedMesh {
            mesh,
            primitive: primitive.index(),
        };
        let Some(decoder) = self.compressed_mesh_decoder else {
            return Err(SceneLoadError::CompressedMeshUnsupported {
                mesh,
                primitive: primitive.index(),
            });
        };

        let view_index = extension
            .get("bufferView")
            .and_then(Value::as_u64)
            .ok_or_else(bad)? as usize;
        let view = self
            .document
            .views()
            .nth(view_index)
            .ok_or(SceneLoadError::BufferViewOutOfBounds(view_index))?;
        let attributes = extension
            .get("attributes")
            .and_then(Value::as_object)
            .ok_or_else(bad)?
            .iter()
            .map(|(semantic, id)| {
                let id = id.as_u64().and_then(|id| u32::try_from(id).ok());
                id.map(|id| (semantic.clone(), id)).ok_or_else(bad)
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let mode = primitive_mode(primitive.mode());
        let mut asset = decoder
            .decode(CompressedPrimitive {
                data: self.view_data(&view)?,
                attributes,
                mode,
            })
            .map_err(|error| SceneLoadError::CompressedMesh {
                mesh,
                primitive: primitive.index(),
                error,
            })?;
        asset.material = primitive.material().index();
        asset.mode = mode;
        Ok(asset)
    }

    fn load_primitive(
        &self,
        mesh: usize,
        primitive: Primitive,
    ) -> Result<PrimitiveAsset, SceneLoadError> {
        if let Some(extension) = primitive.extension_value(DRACO_EXTENSION) {
            return self.load_compressed_primitive(mesh, &primitive, extension);
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let mode = primitive_mode(primitive.mode());

        let position: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or(SceneLoadError::MissingPositions {
                mesh,
                primitive: primitive.index(),
            })?
            .collect();
        let indices: Option<Vec<u32>> = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect());
        let normal = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None if mode == PrimitiveAssetMode::TriangleList => {
                compute_vertex_normals(&position, indices.as_deref())
            }
            None => vec![],
        };
        let tangent = reader
            .read_tangents()
            .map(|tangents| tangents.collect())
            .unwrap_or_default();
        let tex_coord = (0..)
            .map_while(|set| reader.read_tex_coords(set))
            .map(|coords| coords.into_f32().collect())
            .collect();
        let color = (0..)
            .map_while(|set| reader.read_colors(set))
            .map(|colors| colors.into_rgba_f32().collect())
            .collect();
        let joints = (0..)
            .map_while(|set| reader.read_joints(set))
            .map(|joints| joints.into_u16().collect())
            .collect();
        let weights = (0..)
            .map_while(|set| reader.read_weights(set))
            .map(|weights| weights.into_f32().collect())
            .collect();
        let targets = reader
            .read_morph_targets()
            .map(|(position, normal, tangent)| PrimitiveAssetMorphTarget {
                position: position.map(Iterator::collect).unwrap_or_default(),
                normal: normal.map(Iterator::collect).unwrap_or_default(),
                tangent: tangent.map(Iterator::collect).unwrap_or_default(),
            })
            .collect();

        Ok(PrimitiveAsset {
            attributes: PrimitiveAssetAttributes {
                position,
                normal,
                tangent,
                tex_coord,
                color,
                joints,
                weights,
            },
            indices,
            material: primitive.material().index(),
            mode,
            targets,
        })
    }

    fn load_mesh(&self, mesh: Mesh) -> Result<MeshAsset, SceneLoadError> {
        let primitives = mesh
            .primitives()
            .map(|primitive| self.load_primitive(mesh.index(), primitive))
            .collect::<Result<_, _>>()?;
        Ok(MeshAsset {
            name: mesh.name().map(str::to_string),
            primitives,
            weights: mesh
                .weights()
                .map(|weights| weights.to_vec())
                .unwrap_or_default(),
        })
    }

    fn load_skin(&self, skin: Skin) -> SkinAsset {
        let buffers = self.buffers;
        let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        SkinAsset {
            name: skin.name().map(str::to_string),
            joints: skin.joints().map(|joint| joint.index()).collect(),
            inverse_bind_matrices: reader.read_inverse_bind_matrices().map(|matrices| {
                matrices
                    .map(|matrix| Mat4::from_cols_array_2d(&matrix))
                    .collect()
            }),
            skeleton: skin.skeleton().map(|skeleton| skeleton.index()),
        }
    }

    fn load_node(&self, node: Node, depth: usize) -> Result<NodeAsset, SceneLoadError> {
        if depth > self.document.nodes().len() {
            return Err(SceneLoadError::NodeCycle(node.index()));
        }
        let transform = match node.transform() {
            Transform::Matrix { matrix } => NodeTransform::Matrix(Mat4::from_cols_array_2d(&matrix)),
            Transform::Decomposed {
                translation,
                rotation,
                scale,
            } => NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::from_array(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from_array(scale),
            }),
        };
        let children = node
            .children()
            .map(|child| self.load_node(child, depth + 1))
            .collect::<Result<_, _>>()?;

        Ok(NodeAsset {
            index: node.index(),
            name: node.name().map(str::to_string),
            transform,
            mesh: node.mesh().map(|mesh| mesh.index()),
            camera: node.camera().map(|camera| camera.index()),
            skin: node.skin().map(|skin| skin.index()),
            weights: node.weights().unwrap_or_default().to_vec(),
            children,
        })
    }

    fn load_scene(&self, scene: Scene) -> Result<SceneGraph, SceneLoadError> {
        Ok(SceneGraph {
            name: scene.name().map(str::to_string),
            nodes: scene
                .nodes()
                .map(|node| self.load_node(node, 0))
                .collect::<Result<_, _>>()?,
        })
    }

    fn load_animation(&self, animation: Animation) -> Result<AnimationAsset, SceneLoadError> {
        let buffers = self.buffers;
        let mut channels = Vec::new();
        for (index, channel) in animation.channels().enumerate() {
            let missing = || SceneLoadError::MissingAnimationData {
                animation: animation.index(),
                channel: index,
            };
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let times: Vec<f32> = reader.read_inputs().ok_or_else(missing)?.collect();
            let interpolation = channel.sampler().interpolation();

            let sampler = match reader.read_outputs().ok_or_else(missing)? {
                ReadOutputs::Translations(values) => AnimationSampler::Translation(keyframes(
                    &times,
                    values.map(Vec3::from_array).collect(),
                    interpolation,
                )),
                ReadOutputs::Rotations(values) => AnimationSampler::Rotation(keyframes(
                    &times,
                    values.into_f32().map(Quat::from_array).collect(),
                    interpolation,
                )),
                ReadOutputs::Scales(values) => AnimationSampler::Scale(keyframes(
                    &times,
                    values.map(Vec3::from_array).collect(),
                    interpolation,
                )),
                ReadOutputs::MorphTargetWeights(values) => {
                    let values: Vec<f32> = values.into_f32().collect();
                    let per_time = match interpolation {
                        Interpolation::CubicSpline => times.len() * 3,
                        _ => times.len(),
                    };
                    let targets = if per_time == 0 { 0 } else { values.len() / per_time };
                    let weights = values
                        .chunks_exact(targets.max(1))
                        .map(<[f32]>::to_vec)
                        .collect();
                    AnimationSampler::MorphWeights(keyframes(&times, weights, interpolation))
                }
            };

            channels.push(AnimationChannelAsset {
                target: channel.target().node().index(),
                sampler,
            });
        }

        Ok(AnimationAsset {
            name: animation.name().map(str::to_string),
            channels,
        })
    }

    fn load(&self, images: Vec<DynamicImage>) -> Result<SceneAsset, SceneLoadError> {
        let textures = self
            .document
            .textures()
            .filter_map(|texture| {
                let image = images.get(texture.source().index())?;
                Some(texture_from_image(
                    image.clone(),
                    load_texture_sampler(texture.sampler()),
                ))
            })
            .collect::<Vec<TextureAsset>>();

        Ok(SceneAsset {
            scenes: self
                .document
                .scenes()
                .map(|scene| self.load_scene(scene))
                .collect::<Result<_, _>>()?,
            default_scene: self.document.default_scene().map(|scene| scene.index()),
            meshes: self
                .document
                .meshes()
                .map(|mesh| self.load_mesh(mesh))
                .collect::<Result<_, _>>()?,
            materials: self.document.materials().map(load_material).collect(),
            textures,
            cameras: self.document.cameras().map(load_camera).collect(),
            skins: self
                .document
                .skins()
                .map(|skin| self.load_skin(skin))
                .collect(),
            animations: self
                .document
                .animations()
                .map(|animation| self.load_animation(animation))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Loads glTF 2.0 scenes, `.gltf` with external or embedded resources and
/// binary `.glb`.
///
/// Buffers and images referenced by relative URIs are fetched next to the
/// scene file, concurrently.
pub struct SceneLoader<F> {
    fetcher: Arc<F>,
    compressed_mesh_decoder: Option<Arc<dyn CompressedMeshDecoder>>,
}

impl<F> SceneLoader<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            compressed_mesh_decoder: None,
        }
    }

    pub fn with_compressed_mesh_decoder(mut self, decoder: Arc<dyn CompressedMeshDecoder>) -> Self {
        self.compressed_mesh_decoder = Some(decoder);
        self
    }
}

impl<F: Fetch> SceneLoader<F> {
    async fn load_buffers(
        &self,
        source: &SourceUri,
        document: &Document,
        blob: Option<Vec<u8>>,
    ) -> Result<Vec<Vec<u8>>, SceneLoadError> {
        let blob = blob.as_deref();
        let buffers = try_join_all(document.buffers().map(|buffer| async move {
            let mut data = match buffer.source() {
                gltf::buffer::Source::Bin => {
                    blob.ok_or(SceneLoadError::MissingBinaryChunk)?.to_vec()
                }
                gltf::buffer::Source::Uri(uri) => {
                    let uri = source.join(uri)?;
                    debug!("Fetching buffer #{} from {}", buffer.index(), uri);
                    fetch_source(self.fetcher.as_ref(), &uri).await?
                }
            };
            if data.len() < buffer.length() {
                return Err(SceneLoadError::BufferTooShort {
                    buffer: buffer.index(),
                    expected: buffer.length(),
                    actual: data.len(),
                });
            }
            // Pad the data to 4 bytes with zeroes
            while data.len() % 4 != 0 {
                data.push(0);
            }
            Ok(data)
        }))
        .await?;

        for view in document.views() {
            let end = view.offset() + view.length();
            let length = buffers
                .get(view.buffer().index())
                .map(Vec::len)
                .unwrap_or(0);
            if end > length {
                return Err(SceneLoadError::BufferViewOutOfBounds(view.index()));
            }
        }
        Ok(buffers)
    }

    async fn load_images(
        &self,
        source: &SourceUri,
        document: &Document,
        buffers: &[Vec<u8>],
    ) -> Result<Vec<DynamicImage>, SceneLoadError> {
        try_join_all(document.images().map(|image| async move {
            let index = image.index();
            let (data, format) = match image.source() {
                gltf::image::Source::View { view, mime_type } => {
                    let buffer = buffers
                        .get(view.buffer().index())
                        .and_then(|buffer| buffer.get(view.offset()..view.offset() + view.length()))
                        .ok_or(SceneLoadError::BufferViewOutOfBounds(view.index()))?;
                    let format = ImageFormat::from_mime_type(mime_type).ok_or_else(|| {
                        SceneLoadError::BadImageMime {
                            image: index,
                            mime: mime_type.to_string(),
                        }
                    })?;
                    (buffer.to_vec(), Some(format))
                }
                gltf::image::Source::Uri { uri, mime_type } => {
                    let uri = source.join(uri)?;
                    debug!("Fetching image #{} from {}", index, uri);
                    let data = fetch_source(self.fetcher.as_ref(), &uri).await?;
                    // Unknown MIME types are guessed from the bytes.
                    let format = mime_type
                        .or(uri.mime())
                        .and_then(ImageFormat::from_mime_type);
                    (data, format)
                }
            };

            image_reader(&data, format)
                .and_then(|reader| reader.decode())
                .map_err(|error| SceneLoadError::Image {
                    image: index,
                    error,
                })
        }))
        .await
    }
}

impl<F: Fetch> Loader for SceneLoader<F> {
    type Asset = SceneAsset;
    type Error = SceneLoadError;

    async fn load(&self, source: &SourceUri) -> Result<SceneAsset, SceneLoadError> {
        let buffer = fetch_source(self.fetcher.as_ref(), source).await?;
        let Gltf { document, blob } = Gltf::from_slice_without_validation(&buffer)?;
        let document = accept_compressed_meshes(document)?;
        if document
            .extensions_used()
            .any(|extension| extension == DRACO_EXTENSION)
            && self.compressed_mesh_decoder.is_none()
        {
            warn!("{} uses {} but no decoder is attached", source, DRACO_EXTENSION);
        }

        let buffers = self.load_buffers(source, &document, blob).await?;
        let images = self.load_images(source, &document, &buffers).await?;

        let loader = GltfDocumentLoader {
            document: &document,
            buffers: &buffers,
            compressed_mesh_decoder: self.compressed_mesh_decoder.as_deref(),
        };
        loader.load(images)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::{error::Error, sync::Arc};

    use base64::{engine::general_purpose::STANDARD, Engine};
    use glam::Vec3;
    use serde_json::{json, Value};

    use crate::{
        asset::{
            animation::{AnimationKeyFrames, AnimationSampler},
            primitive::{PrimitiveAsset, PrimitiveAssetAttributes, PrimitiveAssetMode},
            texture::{TextureMagFilter, TextureWrappingMode},
        },
        error::{LoadError, LoadErrorKind},
        loader::{texture::test::two_row_png, Loader},
        source::{MemoryFetcher, SourceUri},
    };

    use super::{CompressedMeshDecoder, CompressedPrimitive, SceneLoadError, SceneLoader};

    /// One triangle, its indices, and a two keyframe translation.
    pub fn triangle_buffer() -> Vec<u8> {
        let mut data = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            data.extend_from_slice(&index.to_le_bytes());
        }
        data.extend_from_slice(&[0, 0]);
        for value in [0.0f32, 1.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    /// A scene with a textured triangle. `buffer_uri` names the buffer.
    pub fn triangle_gltf(buffer_uri: &str) -> Value {
        json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "name": "main", "nodes": [0] }],
            "nodes": [{ "name": "tri", "mesh": 0, "translation": [0.0, 0.0, -2.0] }],
            "meshes": [{
                "name": "tri",
                "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
            }],
            "materials": [{
                "name": "paint",
                "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } }
            }],
            "textures": [{ "source": 0, "sampler": 0 }],
            "samplers": [{ "magFilter": 9728, "wrapS": 10497, "wrapT": 33071 }],
            "images": [{
                "uri": format!("data:image/png;base64,{}", STANDARD.encode(two_row_png(2)))
            }],
            "animations": [{
                "name": "lift",
                "channels": [{ "sampler": 0, "target": { "node": 0, "path": "translation" } }],
                "samplers": [{ "input": 2, "output": 3, "interpolation": "LINEAR" }]
            }],
            "buffers": [{ "uri": buffer_uri, "byteLength": 76 }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
                { "buffer": 0, "byteOffset": 44, "byteLength": 8 },
                { "buffer": 0, "byteOffset": 52, "byteLength": 24 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
                { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR",
                  "min": [0.0], "max": [1.0] },
                { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
            ]
        })
    }

    pub fn embedded_triangle_gltf() -> String {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(triangle_buffer())
        );
        triangle_gltf(&uri).to_string()
    }

    #[tokio::test]
    async fn loads_embedded_scene() {
        let fetcher = MemoryFetcher::new().with("tri.gltf", embedded_triangle_gltf());
        let loader = SceneLoader::new(Arc::new(fetcher));
        let scene = loader
            .load(&SourceUri::parse("tri.gltf").unwrap())
            .await
            .unwrap();

        let graph = scene.scene().unwrap();
        assert_eq!(graph.name.as_deref(), Some("main"));
        assert_eq!(graph.nodes[0].mesh, Some(0));
        assert_eq!(
            graph.nodes[0].local_matrix().transform_point3(Vec3::ZERO),
            Vec3::new(0.0, 0.0, -2.0)
        );

        let primitive = &scene.mesh(0).unwrap().primitives[0];
        assert_eq!(primitive.vertex_count(), 3);
        assert_eq!(primitive.indices, Some(vec![0, 1, 2]));
        assert_eq!(primitive.material, Some(0));
        assert_eq!(primitive.attributes.normal[0], [0.0, 0.0, 1.0]);

        let texture = &scene.textures[0];
        assert_eq!(texture.size, (2, 2));
        assert_eq!(texture.sampler.mag_filter, TextureMagFilter::Nearest);
        assert_eq!(texture.sampler.wrap_x, TextureWrappingMode::Repeat);
        // Scene textures keep glTF's top-left origin.
        assert_eq!(&texture.data[0..4], &[255, 0, 0, 255]);
        assert_eq!(
            scene.materials[0].base_color_texture.as_ref().map(|info| info.texture),
            Some(0)
        );

        let animation = scene.animation("lift").unwrap();
        assert_eq!(animation.duration(), 1.0);
        match &animation.channels[0].sampler {
            AnimationSampler::Translation(AnimationKeyFrames::Linear(frames)) => {
                assert_eq!(frames[1].value, Vec3::new(0.0, 2.0, 0.0));
            }
            other => panic!("unexpected sampler {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetches_buffers_next_to_scene() {
        let fetcher = MemoryFetcher::new()
            .with("models/tri.gltf", triangle_gltf("tri.bin").to_string())
            .with("models/tri.bin", triangle_buffer());
        let loader = SceneLoader::new(Arc::new(fetcher));
        let scene = loader
            .load(&SourceUri::parse("models/tri.gltf").unwrap())
            .await
            .unwrap();
        assert_eq!(scene.meshes.len(), 1);
    }

    #[tokio::test]
    async fn missing_buffer_is_not_found() {
        let fetcher =
            MemoryFetcher::new().with("models/tri.gltf", triangle_gltf("tri.bin").to_string());
        let loader = SceneLoader::new(Arc::new(fetcher));
        let error: LoadError = loader
            .load(&SourceUri::parse("models/tri.gltf").unwrap())
            .await
            .unwrap_err()
            .into();
        assert_eq!(error.kind(), LoadErrorKind::ResourceNotFound);
    }

    #[tokio::test]
    async fn short_buffer_is_a_decode_failure() {
        let fetcher = MemoryFetcher::new()
            .with("tri.gltf", triangle_gltf("tri.bin").to_string())
            .with("tri.bin", vec![0u8; 16]);
        let loader = SceneLoader::new(Arc::new(fetcher));
        let error = loader
            .load(&SourceUri::parse("tri.gltf").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(error, SceneLoadError::BufferTooShort { .. }));
        assert_eq!(error.kind(), LoadErrorKind::DecodeFailure);
    }

    #[tokio::test]
    async fn json_garbage_is_a_decode_failure() {
        let fetcher = MemoryFetcher::new().with("bad.gltf", "{ not json");
        let loader = SceneLoader::new(Arc::new(fetcher));
        let error = loader
            .load(&SourceUri::parse("bad.gltf").unwrap())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::DecodeFailure);
    }

    /// Ignores the payload and returns a fixed triangle.
    pub struct FixedTriangleDecoder;

    impl CompressedMeshDecoder for FixedTriangleDecoder {
        fn decode(
            &self,
            primitive: CompressedPrimitive<'_>,
        ) -> Result<PrimitiveAsset, Box<dyn Error + Send + Sync>> {
            if primitive.attributes.get("POSITION") != Some(&0) {
                return Err("no position attribute".into());
            }
            Ok(PrimitiveAsset {
                attributes: PrimitiveAssetAttributes {
                    position: vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
                    ..Default::default()
                },
                indices: None,
                material: None,
                mode: PrimitiveAssetMode::Points,
                targets: vec![],
            })
        }
    }

    pub fn compressed_triangle_gltf() -> String {
        let mut gltf = triangle_gltf(&format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(triangle_buffer())
        ));
        gltf["extensionsUsed"] = json!(["KHR_draco_mesh_compression"]);
        gltf["extensionsRequired"] = json!(["KHR_draco_mesh_compression"]);
        gltf["meshes"][0]["primitives"][0]["extensions"] = json!({
            "KHR_draco_mesh_compression": { "bufferView": 3, "attributes": { "POSITION": 0 } }
        });
        gltf.to_string()
    }

    #[tokio::test]
    async fn compressed_meshes_need_a_decoder() {
        let fetcher = Arc::new(MemoryFetcher::new().with("tri.gltf", compressed_triangle_gltf()));
        let source = SourceUri::parse("tri.gltf").unwrap();

        let error = SceneLoader::new(fetcher.clone())
            .load(&source)
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            SceneLoadError::CompressedMeshUnsupported { mesh: 0, primitive: 0 }
        ));
        assert_eq!(error.kind(), LoadErrorKind::DecodeFailure);

        let scene = SceneLoader::new(fetcher)
            .with_compressed_mesh_decoder(Arc::new(FixedTriangleDecoder))
            .load(&source)
            .await
            .unwrap();
        let primitive = &scene.meshes[0].primitives[0];
        assert_eq!(primitive.attributes.position[1], [2.0, 0.0, 0.0]);
        assert_eq!(primitive.mode, PrimitiveAssetMode::TriangleList);
        assert_eq!(primitive.material, Some(0));
    }
}
