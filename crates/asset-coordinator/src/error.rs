use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use crate::{
    loader::{
        audio::AudioLoadError, font::FontLoadError, image::ImageLoadError, obj::ObjLoadError,
        scene::SceneLoadError, texture::TextureLoadError,
    },
    source::SchemeError,
};

/// Coarse classification of a failed load, reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    /// Nothing exists at the source.
    ResourceNotFound,
    /// Bytes were read but could not be decoded as the requested kind.
    DecodeFailure,
    /// Bytes could not be transferred (network or local I/O).
    NetworkFailure,
    /// The source string itself can't be used.
    MalformedSource,
}

impl Display for LoadErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadErrorKind::ResourceNotFound => write!(f, "resource not found"),
            LoadErrorKind::DecodeFailure => write!(f, "decode failure"),
            LoadErrorKind::NetworkFailure => write!(f, "network failure"),
            LoadErrorKind::MalformedSource => write!(f, "malformed source"),
        }
    }
}

#[derive(Debug)]
pub enum LoadError {
    Source(SchemeError),
    Scene(SceneLoadError),
    Texture(TextureLoadError),
    Image(ImageLoadError),
    Font(FontLoadError),
    MeshObject(ObjLoadError),
    Audio(AudioLoadError),
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::Source(_) => LoadErrorKind::MalformedSource,
            LoadError::Scene(error) => error.kind(),
            LoadError::Texture(error) => error.kind(),
            LoadError::Image(error) => error.kind(),
            LoadError::Font(error) => error.kind(),
            LoadError::MeshObject(error) => error.kind(),
            LoadError::Audio(error) => error.kind(),
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Source(error) => Display::fmt(error, f),
            LoadError::Scene(error) => Display::fmt(error, f),
            LoadError::Texture(error) => Display::fmt(error, f),
            LoadError::Image(error) => Display::fmt(error, f),
            LoadError::Font(error) => Display::fmt(error, f),
            LoadError::MeshObject(error) => Display::fmt(error, f),
            LoadError::Audio(error) => Display::fmt(error, f),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Source(error) => Some(error),
            LoadError::Scene(error) => Some(error),
            LoadError::Texture(error) => Some(error),
            LoadError::Image(error) => Some(error),
            LoadError::Font(error) => Some(error),
            LoadError::MeshObject(error) => Some(error),
            LoadError::Audio(error) => Some(error),
        }
    }
}

impl From<SchemeError> for LoadError {
    fn from(value: SchemeError) -> Self {
        LoadError::Source(value)
    }
}

impl From<SceneLoadError> for LoadError {
    fn from(value: SceneLoadError) -> Self {
        LoadError::Scene(value)
    }
}

impl From<TextureLoadError> for LoadError {
    fn from(value: TextureLoadError) -> Self {
        LoadError::Texture(value)
    }
}

impl From<ImageLoadError> for LoadError {
    fn from(value: ImageLoadError) -> Self {
        LoadError::Image(value)
    }
}

impl From<FontLoadError> for LoadError {
    fn from(value: FontLoadError) -> Self {
        LoadError::Font(value)
    }
}

impl From<ObjLoadError> for LoadError {
    fn from(value: ObjLoadError) -> Self {
        LoadError::MeshObject(value)
    }
}

impl From<AudioLoadError> for LoadError {
    fn from(value: AudioLoadError) -> Self {
        LoadError::Audio(value)
    }
}
