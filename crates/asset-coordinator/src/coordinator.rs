use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use futures::future::join_all;
use log::{debug, info, warn};

use crate::{
    asset::{AudioBuffer, FontAsset, ImageAsset, MeshObjectAsset, SceneAsset, TextureAsset},
    config::CoordinatorConfig,
    error::LoadError,
    kind::AssetKind,
    loader::{
        audio::AudioLoader,
        font::FontLoader,
        image::ImageLoader,
        obj::ObjLoader,
        scene::{CompressedMeshDecoder, SceneLoader},
        texture::TextureLoader,
        Loader,
    },
    record::{AssetRecord, StoredAsset},
    report::{BatchReport, LoadOutcome},
    request::AssetRequest,
    source::{DefaultFetcher, Fetch, SourceUri},
    table::AssetTable,
};

/// Loads batches of asset requests concurrently into a name keyed table.
///
/// Each kind has one loader that lives as long as the coordinator, and all
/// loaders read through the same fetcher. Loads run on the calling task;
/// nothing is spawned.
pub struct AssetCoordinator<F = DefaultFetcher> {
    table: AssetTable,
    tickets: AtomicU64,
    scene: SceneLoader<F>,
    texture: TextureLoader<F>,
    image: ImageLoader<F>,
    font: FontLoader<F>,
    mesh_object: ObjLoader<F>,
    audio: AudioLoader<F>,
}

impl AssetCoordinator<DefaultFetcher> {
    /// Coordinator reading files under `config.base_dir`, and URLs unless
    /// `config.http` is off.
    pub fn new(config: CoordinatorConfig) -> Self {
        let fetcher = DefaultFetcher::from_config(&config);
        CoordinatorBuilder::new(fetcher).config(config).build()
    }
}

impl Default for AssetCoordinator<DefaultFetcher> {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl<F: Fetch> AssetCoordinator<F> {
    pub fn builder(fetcher: F) -> CoordinatorBuilder<F> {
        CoordinatorBuilder::new(fetcher)
    }

    pub fn with_fetcher(fetcher: F, config: CoordinatorConfig) -> Self {
        CoordinatorBuilder::new(fetcher).config(config).build()
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Loads every source of every request and waits for all of them.
    ///
    /// Records are created for every requested name before the first load
    /// starts. A failed load does not stop the others; it is listed in the
    /// returned report and the remaining objects are still stored.
    pub async fn load(&self, requests: &[AssetRequest]) -> BatchReport {
        let mut loads = Vec::new();
        for request in requests {
            if self.table.ensure(request.name()) {
                debug!("Created record {}", request.name());
            }
            for (kind, source) in request.sources() {
                let ticket = self.next_ticket();
                loads.push(self.dispatch(request.name(), kind, source, ticket));
            }
        }

        debug!(
            "Starting {} loads for {} requests",
            loads.len(),
            requests.len()
        );
        let report = BatchReport::from_outcomes(join_all(loads).await);
        info!(
            "Batch finished: {} loaded, {} failed",
            report.loaded().len(),
            report.failures().len()
        );
        report
    }

    async fn dispatch(
        &self,
        name: &str,
        kind: AssetKind,
        source: &SourceUri,
        ticket: u64,
    ) -> LoadOutcome {
        let result = match kind {
            AssetKind::Scene => self.run(&self.scene, name, source, ticket).await.map(drop),
            AssetKind::Texture => self.run(&self.texture, name, source, ticket).await.map(drop),
            AssetKind::Image => self.run(&self.image, name, source, ticket).await.map(drop),
            AssetKind::Font => self.run(&self.font, name, source, ticket).await.map(drop),
            AssetKind::MeshObject => self
                .run(&self.mesh_object, name, source, ticket)
                .await
                .map(drop),
            AssetKind::Audio => self.run(&self.audio, name, source, ticket).await.map(drop),
        };
        LoadOutcome {
            name: name.to_string(),
            kind,
            source: source.to_string(),
            result,
        }
    }

    async fn run<L: Loader>(
        &self,
        loader: &L,
        name: &str,
        source: &SourceUri,
        ticket: u64,
    ) -> Result<Arc<L::Asset>, LoadError> {
        let kind = <L::Asset as StoredAsset>::KIND;
        debug!("Loading {} {} from {}", kind, name, source);
        match loader.load(source).await {
            Ok(asset) => {
                let asset = Arc::new(asset);
                if self.table.store(name, ticket, asset.clone()) {
                    info!("Loaded {} {} from {}", kind, name, source);
                } else {
                    debug!(
                        "Dropped {} {} from {}, a newer load already finished",
                        kind, name, source
                    );
                }
                Ok(asset)
            }
            Err(error) => {
                let error: LoadError = error.into();
                warn!(
                    "Failed to load {} {} from {} ({}): {}",
                    kind,
                    name,
                    source,
                    error.kind(),
                    error
                );
                Err(error)
            }
        }
    }

    async fn load_one<L: Loader>(
        &self,
        loader: &L,
        name: &str,
        source: &str,
    ) -> Result<Arc<L::Asset>, LoadError> {
        let source = SourceUri::parse(source).map_err(|error| {
            warn!(
                "Bad {} source {:?} for {}: {}",
                <L::Asset as StoredAsset>::KIND,
                source,
                name,
                error
            );
            LoadError::from(error)
        })?;
        self.table.ensure(name);
        let ticket = self.next_ticket();
        self.run(loader, name, &source, ticket).await
    }

    pub async fn load_scene(&self, name: &str, source: &str) -> Result<Arc<SceneAsset>, LoadError> {
        self.load_one(&self.scene, name, source).await
    }

    pub async fn load_texture(
        &self,
        name: &str,
        source: &str,
    ) -> Result<Arc<TextureAsset>, LoadError> {
        self.load_one(&self.texture, name, source).await
    }

    pub async fn load_image(&self, name: &str, source: &str) -> Result<Arc<ImageAsset>, LoadError> {
        self.load_one(&self.image, name, source).await
    }

    pub async fn load_font(&self, name: &str, source: &str) -> Result<Arc<FontAsset>, LoadError> {
        self.load_one(&self.font, name, source).await
    }

    pub async fn load_mesh_object(
        &self,
        name: &str,
        source: &str,
    ) -> Result<Arc<MeshObjectAsset>, LoadError> {
        self.load_one(&self.mesh_object, name, source).await
    }

    pub async fn load_audio(&self, name: &str, source: &str) -> Result<Arc<AudioBuffer>, LoadError> {
        self.load_one(&self.audio, name, source).await
    }
}

impl<F> AssetCoordinator<F> {
    /// Snapshot of the record for `name`. Slots of loads still running are
    /// empty.
    pub fn get(&self, name: &str) -> Option<AssetRecord> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    /// Requested names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.table.names()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct CoordinatorBuilder<F> {
    fetcher: F,
    config: CoordinatorConfig,
    compressed_mesh_decoder: Option<Arc<dyn CompressedMeshDecoder>>,
}

impl<F> CoordinatorBuilder<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            config: CoordinatorConfig::default(),
            compressed_mesh_decoder: None,
        }
    }

    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Decoder for `KHR_draco_mesh_compression` primitives in scenes.
    pub fn compressed_mesh_decoder(mut self, decoder: Arc<dyn CompressedMeshDecoder>) -> Self {
        self.compressed_mesh_decoder = Some(decoder);
        self
    }

    pub fn build(self) -> AssetCoordinator<F> {
        let fetcher = Arc::new(self.fetcher);
        let mut scene = SceneLoader::new(fetcher.clone());
        if let Some(decoder) = self.compressed_mesh_decoder {
            scene = scene.with_compressed_mesh_decoder(decoder);
        }

        AssetCoordinator {
            table: AssetTable::default(),
            tickets: AtomicU64::new(0),
            scene,
            texture: TextureLoader::new(fetcher.clone(), self.config.texture),
            image: ImageLoader::new(fetcher.clone()),
            font: FontLoader::new(fetcher.clone()),
            mesh_object: ObjLoader::new(fetcher.clone()),
            audio: AudioLoader::new(fetcher),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::LoadErrorKind,
        kind::AssetKind,
        loader::{font::test::TYPEFACE, obj::test::QUAD_OBJ},
        request::AssetRequest,
        source::MemoryFetcher,
    };

    use super::AssetCoordinator;

    fn coordinator() -> AssetCoordinator<MemoryFetcher> {
        let fetcher = MemoryFetcher::new()
            .with("fonts/mono.json", TYPEFACE)
            .with("models/quad.obj", QUAD_OBJ);
        AssetCoordinator::builder(fetcher).build()
    }

    #[tokio::test]
    async fn creates_records_for_every_name() {
        let coordinator = coordinator();
        let requests = vec![
            AssetRequest::builder("title")
                .font("fonts/mono.json")
                .build()
                .unwrap(),
            AssetRequest::builder("ghost")
                .font("fonts/missing.json")
                .build()
                .unwrap(),
        ];
        let report = coordinator.load(&requests).await;

        assert_eq!(report.total(), 2);
        assert_eq!(coordinator.names(), vec!["ghost", "title"]);
        assert!(coordinator.get("title").unwrap().font().is_some());
        // The record exists even though its only load failed.
        assert!(coordinator.get("ghost").unwrap().is_empty());
        assert!(coordinator.get("other").is_none());
    }

    #[tokio::test]
    async fn primitives_store_and_return() {
        let coordinator = coordinator();
        let object = coordinator
            .load_mesh_object("quad", "models/quad.obj")
            .await
            .unwrap();
        let record = coordinator.get("quad").unwrap();
        assert_eq!(record.kinds(), vec![AssetKind::MeshObject]);
        assert_eq!(record.mesh_object().unwrap().vertex_count(), object.vertex_count());
    }

    #[tokio::test]
    async fn bad_source_string_is_malformed() {
        let coordinator = coordinator();
        let error = coordinator
            .load_image("logo", "ftp://example.com/logo.png")
            .await
            .unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::MalformedSource);
        assert!(!coordinator.contains("logo"));
    }
}
