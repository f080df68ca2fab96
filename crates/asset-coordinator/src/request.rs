use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{self, Display, Formatter},
};

use serde::Deserialize;

use crate::{
    kind::AssetKind,
    source::{SchemeError, SourceUri},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    EmptyName,
    NoSources(String),
    BadSource {
        name: String,
        kind: AssetKind,
        error: SchemeError,
    },
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::EmptyName => write!(f, "Asset request without a name"),
            RequestError::NoSources(name) => write!(f, "Asset request {} has no source", name),
            RequestError::BadSource { name, kind, error } => write!(
                f,
                "Bad {} source for {}: {}",
                kind.request_field(),
                name,
                error
            ),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RequestError::BadSource { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// One requested resource: a name and at most one source per kind.
///
/// Built through [`AssetRequest::builder`] or deserialized from the manifest
/// form `{"name": "hero", "gltf": "hero.glb", "texture": "hero.png"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RequestManifest")]
pub struct AssetRequest {
    name: String,
    sources: BTreeMap<AssetKind, SourceUri>,
}

impl AssetRequest {
    pub fn builder<S: Into<String>>(name: S) -> AssetRequestBuilder {
        AssetRequestBuilder {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self, kind: AssetKind) -> Option<&SourceUri> {
        self.sources.get(&kind)
    }

    /// Present sources in [`AssetKind`] order.
    pub fn sources(&self) -> impl Iterator<Item = (AssetKind, &SourceUri)> {
        self.sources.iter().map(|(kind, source)| (*kind, source))
    }

    /// Parses a JSON array of requests.
    pub fn parse_manifest(json: &str) -> Result<Vec<AssetRequest>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone)]
pub struct AssetRequestBuilder {
    name: String,
    sources: Vec<(AssetKind, String)>,
}

impl AssetRequestBuilder {
    /// Sets the source of `kind`, replacing an earlier one.
    pub fn source<S: Into<String>>(mut self, kind: AssetKind, source: S) -> Self {
        self.sources.retain(|(existing, _)| *existing != kind);
        self.sources.push((kind, source.into()));
        self
    }

    pub fn scene<S: Into<String>>(self, source: S) -> Self {
        self.source(AssetKind::Scene, source)
    }

    pub fn texture<S: Into<String>>(self, source: S) -> Self {
        self.source(AssetKind::Texture, source)
    }

    pub fn image<S: Into<String>>(self, source: S) -> Self {
        self.source(AssetKind::Image, source)
    }

    pub fn font<S: Into<String>>(self, source: S) -> Self {
        self.source(AssetKind::Font, source)
    }

    pub fn mesh_object<S: Into<String>>(self, source: S) -> Self {
        self.source(AssetKind::MeshObject, source)
    }

    pub fn audio<S: Into<String>>(self, source: S) -> Self {
        self.source(AssetKind::Audio, source)
    }

    pub fn build(self) -> Result<AssetRequest, RequestError> {
        if self.name.trim().is_empty() {
            return Err(RequestError::EmptyName);
        }
        if self.sources.is_empty() {
            return Err(RequestError::NoSources(self.name));
        }

        let mut sources = BTreeMap::new();
        for (kind, source) in self.sources {
            let uri = SourceUri::parse(&source).map_err(|error| RequestError::BadSource {
                name: self.name.clone(),
                kind,
                error,
            })?;
            sources.insert(kind, uri);
        }

        Ok(AssetRequest {
            name: self.name,
            sources,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestManifest {
    name: String,
    gltf: Option<String>,
    texture: Option<String>,
    img: Option<String>,
    font: Option<String>,
    obj: Option<String>,
    audio: Option<String>,
}

impl TryFrom<RequestManifest> for AssetRequest {
    type Error = RequestError;

    fn try_from(manifest: RequestManifest) -> Result<Self, Self::Error> {
        let fields = [
            (AssetKind::Scene, manifest.gltf),
            (AssetKind::Texture, manifest.texture),
            (AssetKind::Image, manifest.img),
            (AssetKind::Font, manifest.font),
            (AssetKind::MeshObject, manifest.obj),
            (AssetKind::Audio, manifest.audio),
        ];
        fields
            .into_iter()
            .filter_map(|(kind, source)| source.map(|source| (kind, source)))
            .fold(AssetRequest::builder(manifest.name), |builder, (kind, source)| {
                builder.source(kind, source)
            })
            .build()
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use crate::{
        kind::AssetKind,
        source::{SchemeError, SourceUri},
    };

    use super::{AssetRequest, RequestError};

    #[test]
    fn builder_collects_sources_in_kind_order() {
        let request = AssetRequest::builder("hero")
            .texture("hero.png")
            .scene("hero.glb")
            .build()
            .unwrap();
        let kinds: Vec<_> = request.sources().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![AssetKind::Scene, AssetKind::Texture]);
        assert_eq!(
            request.source(AssetKind::Scene),
            Some(&SourceUri::Path(PathBuf::from("hero.glb")))
        );
        assert_eq!(request.source(AssetKind::Font), None);
    }

    #[test]
    fn builder_validates() {
        assert_eq!(
            AssetRequest::builder(" ").image("a.png").build(),
            Err(RequestError::EmptyName)
        );
        assert_eq!(
            AssetRequest::builder("a").build(),
            Err(RequestError::NoSources(String::from("a")))
        );
        assert_eq!(
            AssetRequest::builder("a").audio("").build(),
            Err(RequestError::BadSource {
                name: String::from("a"),
                kind: AssetKind::Audio,
                error: SchemeError::Empty,
            })
        );
    }

    #[test]
    fn later_source_of_same_kind_replaces_earlier() {
        let request = AssetRequest::builder("a")
            .image("first.png")
            .image("second.png")
            .build()
            .unwrap();
        assert_eq!(request.sources().count(), 1);
        assert_eq!(
            request.source(AssetKind::Image),
            Some(&SourceUri::Path(PathBuf::from("second.png")))
        );
    }

    #[test]
    fn parses_manifest() {
        let requests = AssetRequest::parse_manifest(
            r#"[
                { "name": "hero", "gltf": "hero.glb", "texture": "hero.png" },
                { "name": "logo", "img": "logo.png" },
                { "name": "click", "audio": "click.ogg", "font": "mono.json", "obj": "crate.obj" }
            ]"#,
        )
        .unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].sources().count(), 2);
        assert!(requests[1].source(AssetKind::Image).is_some());
        assert!(requests[2].source(AssetKind::MeshObject).is_some());
    }

    #[test]
    fn manifest_validation_fails_deserialization() {
        assert!(AssetRequest::parse_manifest(r#"[{ "name": "x" }]"#).is_err());
        assert!(AssetRequest::parse_manifest(r#"[{ "name": "x", "mp3": "a.mp3" }]"#).is_err());
        assert!(AssetRequest::parse_manifest(r#"[{ "name": "x", "img": "gopher://a" }]"#).is_err());
    }
}
