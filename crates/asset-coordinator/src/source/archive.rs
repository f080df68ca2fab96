use log::debug;
use parking_lot::Mutex;

use crate::archive::Archive;

use super::{normalize_path, Fetch, FetchError, SourceUri};

/// Serves relative paths out of a mounted archive.
///
/// The archive is read synchronously while the lock is held; no lookup
/// suspends with the lock taken.
#[derive(Debug)]
pub struct ArchiveFetcher<A> {
    archive: Mutex<A>,
}

impl<A: Archive> ArchiveFetcher<A> {
    pub fn new(archive: A) -> Self {
        Self {
            archive: Mutex::new(archive),
        }
    }

    pub fn into_inner(self) -> A {
        self.archive.into_inner()
    }
}

impl<A: Archive> Fetch for ArchiveFetcher<A> {
    async fn fetch(&self, uri: &SourceUri) -> Result<Vec<u8>, FetchError> {
        let path = match uri {
            SourceUri::Data { data, .. } => return Ok(data.clone()),
            SourceUri::Http(url) => return Err(FetchError::Unsupported(url.clone())),
            SourceUri::Path(path) => normalize_path(path),
        };
        debug!("Reading {} from archive", path);
        let entry = self
            .archive
            .lock()
            .read(&path)
            .map_err(|error| FetchError::Archive(path.clone(), Box::new(error)))?;
        entry.ok_or(FetchError::NotFound(path))
    }
}

#[cfg(all(test, feature = "zip"))]
mod test {
    use std::io::{Cursor, Write};

    use zip::{write::FileOptions, ZipArchive, ZipWriter};

    use crate::{
        error::LoadErrorKind,
        source::{Fetch, SourceUri},
    };

    use super::ArchiveFetcher;

    #[tokio::test]
    async fn serves_paths_from_zip() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("textures/logo.png", FileOptions::default())
            .unwrap();
        writer.write_all(&[0x89, b'P', b'N', b'G']).unwrap();
        let archive = ZipArchive::new(writer.finish().unwrap()).unwrap();
        let fetcher = ArchiveFetcher::new(archive);

        let uri = SourceUri::parse("./textures/logo.png").unwrap();
        assert_eq!(fetcher.fetch(&uri).await.unwrap(), vec![0x89, b'P', b'N', b'G']);

        let missing = SourceUri::parse("textures/none.png").unwrap();
        let error = fetcher.fetch(&missing).await.unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::ResourceNotFound);

        let remote = SourceUri::parse("https://example.com/logo.png").unwrap();
        let error = fetcher.fetch(&remote).await.unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::MalformedSource);
    }
}
