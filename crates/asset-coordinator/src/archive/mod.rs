//! Read-only access to packed asset bundles.

use std::error::Error;
#[cfg(any(feature = "zip", feature = "tar"))]
use std::io::{self, Read};

#[cfg(feature = "tar")]
pub mod tar;
#[cfg(feature = "zip")]
pub mod zip;

pub trait Archive {
    type Error: Error + Send + Sync + 'static;

    /// Reads the whole entry stored under `path`, `None` when the archive has
    /// no such entry. `path` is `/`-separated without a leading slash.
    fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>, Self::Error>;
}

/// Copies an entry of a declared size into memory.
#[cfg(any(feature = "zip", feature = "tar"))]
fn read_entry<R: Read>(entry: &mut R, size: u64) -> io::Result<Vec<u8>> {
    let capacity: usize = size.try_into().map_err(|_| {
        io::Error::new(
            io::ErrorKind::OutOfMemory,
            format!("File size {} is too large", size),
        )
    })?;
    let mut buffer = Vec::with_capacity(capacity);
    entry.read_to_end(&mut buffer)?;
    Ok(buffer)
}
