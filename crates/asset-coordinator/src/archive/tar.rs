use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io::{self, Read, Seek, SeekFrom},
};

use super::{read_entry, Archive};
use crate::source::normalize_path;

#[derive(Debug)]
pub enum TarError {
    Tar(io::Error),
    BadFileName,
}

impl Display for TarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TarError::Tar(error) => Display::fmt(error, f),
            TarError::BadFileName => write!(f, "Bad file name (not unicode)"),
        }
    }
}

impl Error for TarError {}

impl From<io::Error> for TarError {
    fn from(value: io::Error) -> Self {
        Self::Tar(value)
    }
}

/// A tar stream that can be searched any number of times.
///
/// `tar::Archive` only walks its entries once, so every lookup rewinds the
/// underlying stream and walks a fresh archive over it.
#[derive(Debug)]
pub struct TarBundle<R> {
    stream: R,
}

impl<R: Read + Seek> TarBundle<R> {
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> R {
        self.stream
    }
}

impl<R: Read + Seek + Send> Archive for TarBundle<R> {
    type Error = TarError;

    fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        self.stream.seek(SeekFrom::Start(0))?;
        let mut archive = tar::Archive::new(&mut self.stream);
        for entry in archive.entries_with_seek()? {
            let mut entry = entry?;
            let entry_path = entry.path()?;
            if entry_path.to_str().is_none() {
                return Err(TarError::BadFileName);
            }
            if normalize_path(&entry_path) != path {
                continue;
            }
            if !entry.header().entry_type().is_file() {
                return Ok(None);
            }
            let size = entry.header().size()?;
            return Ok(Some(read_entry(&mut entry, size)?));
        }
        Ok(None)
    }
}
