//! Where asset bytes come from.
//!
//! A source string from a request is parsed into a [`SourceUri`], and the
//! bytes behind it are read through a [`Fetch`] implementation. `data:` URIs
//! carry their payload inline and never reach the fetcher.

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::LoadErrorKind;

#[cfg(any(feature = "zip", feature = "tar"))]
pub use archive::ArchiveFetcher;
pub use fs::DefaultFetcher;
pub use memory::MemoryFetcher;

#[cfg(any(feature = "zip", feature = "tar"))]
mod archive;
mod fs;
mod memory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeError {
    Empty,
    Unsupported(String),
    BadDataUri,
    /// Percent escapes in a path that don't decode to UTF-8.
    BadPath(String),
    BadUrl(String),
}

impl Display for SchemeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemeError::Empty => write!(f, "Empty source"),
            SchemeError::Unsupported(scheme) => write!(f, "Unsupported scheme {}", scheme),
            SchemeError::BadDataUri => write!(f, "Bad data URI"),
            SchemeError::BadPath(path) => write!(f, "Path {} is not valid UTF-8", path),
            SchemeError::BadUrl(url) => write!(f, "Bad URL {}", url),
        }
    }
}

impl Error for SchemeError {}

/// A parsed asset source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUri {
    /// Data URI (RFC 2397) with optional MIME type.
    Data { mime: Option<String>, data: Vec<u8> },
    /// `http://` or `https://` URL.
    Http(String),
    /// File path, either absolute or relative to the fetcher's root.
    Path(PathBuf),
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

fn decode_path(path: &str) -> Result<PathBuf, SchemeError> {
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| SchemeError::BadPath(path.to_string()))?;
    Ok(PathBuf::from(decoded.into_owned()))
}

impl SourceUri {
    pub fn parse(uri: &str) -> Result<Self, SchemeError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(SchemeError::Empty);
        }

        if let Some(content) = strip_prefix_ignore_case(uri, "data:") {
            return Self::parse_data(content);
        }
        if strip_prefix_ignore_case(uri, "http://").is_some()
            || strip_prefix_ignore_case(uri, "https://").is_some()
        {
            return Ok(SourceUri::Http(uri.to_string()));
        }
        if let Some(path) = strip_prefix_ignore_case(uri, "file://") {
            return decode_path(path).map(SourceUri::Path);
        }
        if let Some(path) = strip_prefix_ignore_case(uri, "file:") {
            return decode_path(path).map(SourceUri::Path);
        }

        // A scheme is letters followed by a colon before any separator.
        // Single letter schemes are drive letters on Windows.
        if let Some((scheme, _)) = uri.split_once(':') {
            let is_scheme = scheme.len() > 1
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
            if is_scheme {
                return Err(SchemeError::Unsupported(scheme.to_string()));
            }
        }

        decode_path(uri).map(SourceUri::Path)
    }

    fn parse_data(content: &str) -> Result<Self, SchemeError> {
        let Some((param, value)) = content.split_once(',') else {
            return Err(SchemeError::BadDataUri);
        };
        match param.rsplit_once(';') {
            Some((mime, encoding)) if encoding.eq_ignore_ascii_case("base64") => {
                let data = STANDARD
                    .decode(value.trim())
                    .map_err(|_| SchemeError::BadDataUri)?;
                let mime = (!mime.is_empty()).then(|| mime.to_string());
                Ok(SourceUri::Data { mime, data })
            }
            _ => {
                let mime = param.split(';').next().filter(|mime| !mime.is_empty());
                Ok(SourceUri::Data {
                    mime: mime.map(str::to_string),
                    data: percent_decode_str(value).collect(),
                })
            }
        }
    }

    /// Resolves a reference found inside the document behind this source,
    /// such as a glTF buffer URI or an OBJ material library.
    pub fn join(&self, reference: &str) -> Result<SourceUri, SchemeError> {
        let target = SourceUri::parse(reference)?;
        let SourceUri::Path(relative) = &target else {
            return Ok(target);
        };

        match self {
            SourceUri::Http(base) => {
                // The raw reference goes to the URL parser, which handles
                // rooted paths, dot segments and escapes itself.
                let joined = Url::parse(base)
                    .and_then(|base| base.join(reference.trim()))
                    .map_err(|_| SchemeError::BadUrl(base.clone()))?;
                Ok(SourceUri::Http(joined.into()))
            }
            _ if relative.is_absolute() || reference.starts_with('/') => Ok(target),
            SourceUri::Path(base) => {
                let parent = base.parent().unwrap_or_else(|| Path::new(""));
                Ok(SourceUri::Path(parent.join(relative)))
            }
            SourceUri::Data { .. } => Ok(target),
        }
    }

    pub fn mime(&self) -> Option<&str> {
        match self {
            SourceUri::Data { mime, .. } => mime.as_deref(),
            _ => None,
        }
    }

    /// Lower-cased file extension of the path or URL, if any.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            SourceUri::Data { .. } => return None,
            SourceUri::Http(url) => {
                let url = url.split(['?', '#']).next().unwrap_or(url);
                Path::new(url).to_path_buf()
            }
            SourceUri::Path(path) => path.clone(),
        };
        path.extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
    }
}

impl FromStr for SourceUri {
    type Err = SchemeError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        SourceUri::parse(uri)
    }
}

impl Display for SourceUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SourceUri::Data { mime, data } => write!(
                f,
                "data:{} ({} bytes)",
                mime.as_deref().unwrap_or("application/octet-stream"),
                data.len()
            ),
            SourceUri::Http(url) => Display::fmt(url, f),
            SourceUri::Path(path) => Display::fmt(&path.display(), f),
        }
    }
}

/// Turns a relative path into a `/`-separated key, folding `.` and `..`.
pub(crate) fn normalize_path(path: &Path) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().unwrap_or_default()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts.join("/")
}

#[derive(Debug)]
pub enum FetchError {
    NotFound(String),
    Io(PathBuf, io::Error),
    Network(String, Box<dyn Error + Send + Sync>),
    HttpStatus(String, u16),
    Unsupported(String),
    Archive(String, Box<dyn Error + Send + Sync>),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(source) => write!(f, "Resource {} not found", source),
            FetchError::Io(path, error) => write!(f, "Failed to read {}: {}", path.display(), error),
            FetchError::Network(url, error) => write!(f, "Failed to fetch {}: {}", url, error),
            FetchError::HttpStatus(url, status) => {
                write!(f, "Server answered {} for {}", status, url)
            }
            FetchError::Unsupported(source) => {
                write!(f, "Source {} can't be served by this fetcher", source)
            }
            FetchError::Archive(path, error) => {
                write!(f, "Failed to read {} from archive: {}", path, error)
            }
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::Io(_, error) => Some(error),
            FetchError::Network(_, error) | FetchError::Archive(_, error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl FetchError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            FetchError::NotFound(_) => LoadErrorKind::ResourceNotFound,
            FetchError::Io(_, error) if error.kind() == io::ErrorKind::NotFound => {
                LoadErrorKind::ResourceNotFound
            }
            FetchError::HttpStatus(_, 404 | 410) => LoadErrorKind::ResourceNotFound,
            FetchError::Unsupported(_) => LoadErrorKind::MalformedSource,
            FetchError::Io(..)
            | FetchError::Network(..)
            | FetchError::HttpStatus(..)
            | FetchError::Archive(..) => LoadErrorKind::NetworkFailure,
        }
    }
}

/// Reads the bytes behind a source.
///
/// Implementations only see [`SourceUri::Path`] and [`SourceUri::Http`];
/// inline data is answered by [`fetch_source`].
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch(&self, uri: &SourceUri) -> Result<Vec<u8>, FetchError>;
}

pub async fn fetch_source<F: Fetch + ?Sized>(
    fetcher: &F,
    uri: &SourceUri,
) -> Result<Vec<u8>, FetchError> {
    if let SourceUri::Data { data, .. } = uri {
        return Ok(data.clone());
    }
    fetcher.fetch(uri).await
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::{normalize_path, SchemeError, SourceUri};

    #[test]
    fn parses_plain_paths() {
        assert_eq!(
            SourceUri::parse("models/hero.glb").unwrap(),
            SourceUri::Path(PathBuf::from("models/hero.glb"))
        );
        assert_eq!(
            SourceUri::parse("file:///srv/hero.glb").unwrap(),
            SourceUri::Path(PathBuf::from("/srv/hero.glb"))
        );
        assert_eq!(
            SourceUri::parse("my%20model.obj").unwrap(),
            SourceUri::Path(PathBuf::from("my model.obj"))
        );
    }

    #[test]
    fn parses_data_uris() {
        let uri = SourceUri::parse("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(
            uri,
            SourceUri::Data {
                mime: Some(String::from("application/octet-stream")),
                data: vec![1, 2, 3],
            }
        );
        assert_eq!(uri.mime(), Some("application/octet-stream"));

        let uri = SourceUri::parse("data:,hello").unwrap();
        assert_eq!(
            uri,
            SourceUri::Data {
                mime: None,
                data: b"hello".to_vec(),
            }
        );

        assert_eq!(
            SourceUri::parse("data:image/png;base64"),
            Err(SchemeError::BadDataUri)
        );
        assert_eq!(
            SourceUri::parse("data:image/png;base64,!!!"),
            Err(SchemeError::BadDataUri)
        );
    }

    #[test]
    fn percent_encoded_data_keeps_raw_bytes() {
        assert_eq!(
            SourceUri::parse("data:application/octet-stream,%FF%00%01").unwrap(),
            SourceUri::Data {
                mime: Some(String::from("application/octet-stream")),
                data: vec![0xff, 0x00, 0x01],
            }
        );
    }

    #[test]
    fn rejects_paths_escaping_to_invalid_utf8() {
        assert_eq!(
            SourceUri::parse("models/%FF.obj"),
            Err(SchemeError::BadPath(String::from("models/%FF.obj")))
        );
    }

    #[test]
    fn rejects_unknown_schemes_and_empty_sources() {
        assert_eq!(
            SourceUri::parse("ftp://example.com/a.png"),
            Err(SchemeError::Unsupported(String::from("ftp")))
        );
        assert_eq!(SourceUri::parse("   "), Err(SchemeError::Empty));
    }

    #[test]
    fn joins_relative_references() {
        let base = SourceUri::parse("models/hero/hero.gltf").unwrap();
        assert_eq!(
            base.join("hero.bin").unwrap(),
            SourceUri::Path(PathBuf::from("models/hero/hero.bin"))
        );

        let base = SourceUri::parse("https://cdn.example.com/models/hero.gltf?v=2").unwrap();
        assert_eq!(
            base.join("textures/skin.png").unwrap(),
            SourceUri::Http(String::from(
                "https://cdn.example.com/models/textures/skin.png"
            ))
        );

        let base = SourceUri::parse("https://cdn.example.com").unwrap();
        assert_eq!(
            base.join("hero.bin").unwrap(),
            SourceUri::Http(String::from("https://cdn.example.com/hero.bin"))
        );

        // Data URIs stay as they are regardless of the base.
        let joined = base.join("data:,abc").unwrap();
        assert!(matches!(joined, SourceUri::Data { .. }));
    }

    #[test]
    fn joins_rooted_and_parent_references_against_urls() {
        let base = SourceUri::parse("https://cdn.example.com/models/hero.gltf").unwrap();
        assert_eq!(
            base.join("/textures/skin.png").unwrap(),
            SourceUri::Http(String::from("https://cdn.example.com/textures/skin.png"))
        );
        assert_eq!(
            base.join("../textures/skin.png").unwrap(),
            SourceUri::Http(String::from("https://cdn.example.com/textures/skin.png"))
        );
        assert_eq!(
            base.join("./parts/../hero.bin").unwrap(),
            SourceUri::Http(String::from("https://cdn.example.com/models/hero.bin"))
        );

        // Rooted references next to a local file stay local.
        let base = SourceUri::parse("models/hero.gltf").unwrap();
        assert_eq!(
            base.join("/srv/hero.bin").unwrap(),
            SourceUri::Path(PathBuf::from("/srv/hero.bin"))
        );
    }

    #[test]
    fn extension_is_lowercase() {
        let uri = SourceUri::parse("https://cdn.example.com/clip.OGG?x=1").unwrap();
        assert_eq!(uri.extension().as_deref(), Some("ogg"));
        assert_eq!(SourceUri::parse("data:,a").unwrap().extension(), None);
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(
            normalize_path(&PathBuf::from("./models/../textures/a.png")),
            "textures/a.png"
        );
        assert_eq!(normalize_path(&PathBuf::from("/a/b")), "a/b");
    }
}
