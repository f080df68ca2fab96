use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io::{self, Read, Seek},
};

use zip::{result::ZipError as ZipResultError, ZipArchive};

use super::{read_entry, Archive};

#[derive(Debug)]
pub enum ZipError {
    Zip(ZipResultError),
    Io(io::Error),
}

impl Display for ZipError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ZipError::Zip(error) => Display::fmt(error, f),
            ZipError::Io(error) => Display::fmt(error, f),
        }
    }
}

impl Error for ZipError {}

impl From<ZipResultError> for ZipError {
    fn from(value: ZipResultError) -> Self {
        Self::Zip(value)
    }
}

impl From<io::Error> for ZipError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl<R: Read + Seek + Send> Archive for ZipArchive<R> {
    type Error = ZipError;

    fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut entry = match self.by_name(path) {
            Ok(entry) => entry,
            Err(ZipResultError::FileNotFound) => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        if entry.is_dir() {
            return Ok(None);
        }
        let size = entry.size();
        Ok(Some(read_entry(&mut entry, size)?))
    }
}

#[cfg(test)]
mod test {
    use std::io::{Cursor, Write};

    use zip::{write::FileOptions, ZipArchive, ZipWriter};

    use crate::archive::Archive;

    #[test]
    fn reads_entries_by_path() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("fonts/mono.json", FileOptions::default())
            .unwrap();
        writer.write_all(b"{}").unwrap();
        let buffer = writer.finish().unwrap();

        let mut archive = ZipArchive::new(buffer).unwrap();
        assert_eq!(
            archive.read("fonts/mono.json").unwrap(),
            Some(b"{}".to_vec())
        );
        assert_eq!(archive.read("fonts/other.json").unwrap(), None);
    }
}
