//! JSON blob persistence for the cached catalogs.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Raw ship catalog as served by the API.
pub const SHIPS_BLOB: &str = "ships.json";
/// Raw module catalog as served by the API.
pub const MODULES_BLOB: &str = "modules.json";
/// Derived ship spec catalog.
pub const SPECS_BLOB: &str = "specs.json";

/// Stores and retrieves JSON documents by relative path.
pub trait BlobStore {
    fn save<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()>;
    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T>;
}

impl<S: BlobStore + ?Sized> BlobStore for &S {
    fn save<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        (**self).save(path, value)
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        (**self).load(path)
    }
}

/// Blob store rooted at a directory on the local filesystem.
///
/// Writes go to a temporary file in the target directory which then replaces
/// the destination, so readers never see a half-written blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute location of `path` inside the store.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let safe = !path.as_os_str().is_empty()
            && path
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(Error::InvalidBlobPath {
                path: path.to_path_buf(),
            });
        }
        Ok(self.root.join(path))
    }
}

impl BlobStore for FsBlobStore {
    fn save<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let destination = self.resolve(path)?;
        let parent = destination.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        tmp.persist(&destination).map_err(|err| err.error)?;
        debug!(path = %destination.display(), "blob saved");
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let source = self.resolve(path)?;
        let file = match File::open(&source) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::BlobNotFound { path: source })
            }
            Err(err) => return Err(err.into()),
        };
        let value = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %source.display(), "blob loaded");
        Ok(value)
    }
}
