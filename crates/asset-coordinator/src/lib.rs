//! Load batches of assets concurrently into a name keyed table.
//!
//! A request names a resource and carries one source per kind it wants:
//! glTF scenes, textures, raster images, typeface fonts, OBJ meshes and
//! audio clips. [`AssetCoordinator::load`] runs every load of a batch at
//! once, stores what succeeded under the request's name and reports what
//! failed, each failure classified by [`LoadErrorKind`].
//!
//! Sources are read through a [`Fetch`] implementation: the file system and
//! HTTP by default, an in-memory map, or a zip or tar archive.

pub mod archive;
/// Decoded asset types
pub mod asset;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod kind;
/// Kind specific loaders
pub mod loader;
pub mod record;
pub mod report;
pub mod request;
pub mod source;

mod table;

pub use config::CoordinatorConfig;
pub use coordinator::{AssetCoordinator, CoordinatorBuilder};
pub use error::{LoadError, LoadErrorKind};
pub use kind::AssetKind;
pub use loader::scene::{CompressedMeshDecoder, CompressedPrimitive};
pub use record::AssetRecord;
pub use report::{BatchError, BatchReport, LoadFailure, LoadedEntry};
pub use request::{AssetRequest, RequestError};
pub use source::{DefaultFetcher, Fetch, FetchError, MemoryFetcher, SourceUri};
