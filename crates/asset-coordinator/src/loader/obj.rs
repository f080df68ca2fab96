use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    io::Cursor,
    sync::Arc,
};

use log::{debug, warn};
use tobj::{LoadError, LoadOptions, Material, Model};

use crate::{
    asset::{
        object::{MeshObjectAsset, ObjMaterialAsset, ObjModelAsset},
        primitive::{
            compute_vertex_normals, PrimitiveAsset, PrimitiveAssetAttributes, PrimitiveAssetMode,
        },
    },
    error::LoadErrorKind,
    source::{fetch_source, Fetch, FetchError, SourceUri},
};

use super::{chunk_vec3, pad_color_vec3_to_vec4, Loader};

#[derive(Debug)]
pub enum ObjLoadError {
    Fetch(FetchError),
    Obj(LoadError),
}

impl ObjLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            ObjLoadError::Fetch(error) => error.kind(),
            ObjLoadError::Obj(_) => LoadErrorKind::DecodeFailure,
        }
    }
}

impl Display for ObjLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Fetch(error) => Display::fmt(&error, f),
            ObjLoadError::Obj(error) => write!(f, "Failed to parse OBJ: {}", error),
        }
    }
}

impl Error for ObjLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ObjLoadError::Fetch(error) => Some(error),
            ObjLoadError::Obj(error) => Some(error),
        }
    }
}

impl From<FetchError> for ObjLoadError {
    fn from(value: FetchError) -> Self {
        ObjLoadError::Fetch(value)
    }
}

impl From<LoadError> for ObjLoadError {
    fn from(value: LoadError) -> Self {
        ObjLoadError::Obj(value)
    }
}

/// Material library names referenced by `mtllib` statements.
fn material_libraries(obj: &str) -> Vec<&str> {
    obj.lines()
        .filter_map(|line| {
            let (keyword, rest) = line.trim_start().split_once(char::is_whitespace)?;
            (keyword == "mtllib").then(|| rest.trim())
        })
        .filter(|name| !name.is_empty())
        .collect()
}

fn load_material(material: &Material) -> ObjMaterialAsset {
    ObjMaterialAsset {
        name: material.name.clone(),
        ambient_color: material.ambient.unwrap_or([1.0, 1.0, 1.0]),
        diffuse_color: material.diffuse.unwrap_or([1.0, 1.0, 1.0]),
        specular_color: material.specular.unwrap_or([1.0, 1.0, 1.0]),
        shininess: material.shininess.unwrap_or(1.0),
        dissolve: material.dissolve.unwrap_or(1.0),
        optical_density: material.optical_density.unwrap_or(1.0),
        ambient_texture: material.ambient_texture.clone(),
        diffuse_texture: material.diffuse_texture.clone(),
        specular_texture: material.specular_texture.clone(),
        normal_texture: material.normal_texture.clone(),
        shininess_texture: material.shininess_texture.clone(),
        dissolve_texture: material.dissolve_texture.clone(),
    }
}

fn load_model(model: Model, material_count: usize) -> ObjModelAsset {
    let mesh = model.mesh;

    let position = chunk_vec3(&mesh.positions);
    let normal = if !mesh.normals.is_empty() {
        chunk_vec3(&mesh.normals)
    } else {
        compute_vertex_normals(&position, Some(&mesh.indices))
    };
    let tex_coord = if !mesh.texcoords.is_empty() {
        let tex_coord = mesh
            .texcoords
            .chunks_exact(2)
            .map(|chunk| [chunk[0], 1.0 - chunk[1]])
            .collect();
        vec![tex_coord]
    } else {
        vec![]
    };
    let color = if !mesh.vertex_color.is_empty() {
        let color = chunk_vec3(&mesh.vertex_color)
            .into_iter()
            .map(pad_color_vec3_to_vec4)
            .collect();
        vec![color]
    } else {
        vec![]
    };

    ObjModelAsset {
        name: model.name,
        primitive: PrimitiveAsset {
            attributes: PrimitiveAssetAttributes {
                position,
                normal,
                tangent: vec![],
                tex_coord,
                color,
                joints: vec![],
                weights: vec![],
            },
            indices: Some(mesh.indices),
            material: mesh.material_id.filter(|index| *index < material_count),
            mode: PrimitiveAssetMode::TriangleList,
            targets: vec![],
        },
    }
}

/// Loads Wavefront OBJ models with their MTL libraries.
///
/// Libraries are looked up next to the OBJ file. A library that can't be read
/// or parsed leaves the models without materials.
pub struct ObjLoader<F> {
    fetcher: Arc<F>,
}

impl<F> ObjLoader<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetch> ObjLoader<F> {
    async fn fetch_libraries(&self, source: &SourceUri, obj: &str) -> HashMap<String, Vec<u8>> {
        let mut libraries = HashMap::new();
        for name in material_libraries(obj) {
            let uri = match source.join(name) {
                Ok(uri) => uri,
                Err(error) => {
                    warn!("Bad material library {} in {}: {}", name, source, error);
                    continue;
                }
            };
            match fetch_source(self.fetcher.as_ref(), &uri).await {
                Ok(buffer) => {
                    debug!("Fetched material library {}", uri);
                    libraries.insert(name.to_string(), buffer);
                }
                Err(error) => warn!("Material library {} unavailable: {}", uri, error),
            }
        }
        libraries
    }
}

impl<F: Fetch> Loader for ObjLoader<F> {
    type Asset = MeshObjectAsset;
    type Error = ObjLoadError;

    async fn load(&self, source: &SourceUri) -> Result<MeshObjectAsset, ObjLoadError> {
        let buffer = fetch_source(self.fetcher.as_ref(), source).await?;
        let text = String::from_utf8_lossy(&buffer);
        let libraries = self.fetch_libraries(source, &text).await;

        let (models, materials) = tobj::load_obj_buf(
            &mut Cursor::new(text.as_bytes()),
            &LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
            |path| {
                let key = path.to_string_lossy();
                let buffer = libraries.get(key.as_ref()).ok_or(LoadError::OpenFileFailed)?;
                tobj::load_mtl_buf(&mut Cursor::new(buffer))
            },
        )?;
        let materials = materials.unwrap_or_else(|error| {
            warn!("Ignoring materials of {}: {}", source, error);
            Vec::new()
        });

        let material_count = materials.len();
        Ok(MeshObjectAsset {
            models: models
                .into_iter()
                .map(|model| load_model(model, material_count))
                .collect(),
            materials: materials.iter().map(load_material).collect(),
        })
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Arc;

    use crate::{
        error::LoadErrorKind,
        loader::Loader,
        source::{MemoryFetcher, SourceUri},
    };

    use super::{material_libraries, ObjLoader};

    pub const QUAD_OBJ: &str = "\
mtllib quad.mtl
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl red
f 1/1 2/2 3/3 4/4
";

    pub const QUAD_MTL: &str = "\
newmtl red
Kd 1 0 0
map_Kd red.png
";

    #[test]
    fn finds_material_libraries() {
        assert_eq!(
            material_libraries("# comment\nmtllib a.mtl\n  mtllib  b c.mtl \nmtllib\n"),
            vec!["a.mtl", "b c.mtl"]
        );
    }

    #[tokio::test]
    async fn loads_quad_with_material() {
        let fetcher = MemoryFetcher::new()
            .with("models/quad.obj", QUAD_OBJ)
            .with("models/quad.mtl", QUAD_MTL);
        let loader = ObjLoader::new(Arc::new(fetcher));
        let object = loader
            .load(&SourceUri::parse("models/quad.obj").unwrap())
            .await
            .unwrap();

        assert_eq!(object.models.len(), 1);
        assert_eq!(object.vertex_count(), 4);
        let model = object.model("quad").unwrap();
        assert_eq!(model.primitive.indices.as_ref().unwrap().len(), 6);
        assert_eq!(model.primitive.triangle_count(), 2);
        assert_eq!(model.primitive.material, Some(0));
        // Texture coordinates are flipped to a top-left origin.
        assert_eq!(model.primitive.attributes.tex_coord[0][0], [0.0, 1.0]);
        assert_eq!(model.primitive.attributes.normal[0], [0.0, 0.0, 1.0]);

        assert_eq!(object.materials[0].name, "red");
        assert_eq!(object.materials[0].diffuse_color, [1.0, 0.0, 0.0]);
        assert_eq!(object.materials[0].diffuse_texture.as_deref(), Some("red.png"));
    }

    #[tokio::test]
    async fn missing_library_is_not_fatal() {
        let fetcher = MemoryFetcher::new().with("quad.obj", QUAD_OBJ);
        let loader = ObjLoader::new(Arc::new(fetcher));
        let object = loader
            .load(&SourceUri::parse("quad.obj").unwrap())
            .await
            .unwrap();
        assert!(object.materials.is_empty());
        assert_eq!(object.models[0].primitive.material, None);
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let loader = ObjLoader::new(Arc::new(MemoryFetcher::new()));
        let error = loader
            .load(&SourceUri::parse("none.obj").unwrap())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::ResourceNotFound);
        assert_eq!(error.to_string(), "Resource none.obj not found");
    }
}
