use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::{self, NamedTempFile, TempDir};

use crate::config::{OnError, Profile};
use crate::storage::backend::{Backend, UploadRequest};
use crate::Error;

pub const A_AIP_PATH: &str = "tests/fixtures/staging/aip-0001.7z";
pub const STAGING_PATH: &str = "tests/fixtures/staging";

#[derive(Debug)]
pub struct FileGuard(Option<NamedTempFile>);

#[derive(Debug)]
pub struct DirGuard(Option<TempDir>);

impl AsRef<Path> for FileGuard {
    fn as_ref(&self) -> &Path {
        match self.0 {
            Some(ref temp) => temp.as_ref(),
            None => panic!("using after close"),
        }
    }
}

impl AsRef<Path> for DirGuard {
    fn as_ref(&self) -> &Path {
        match self.0 {
            Some(ref temp) => temp.path(),
            None => panic!("using after close"),
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if let Some(file) = self.0.take() {
            file.close().expect("cannot close temporary file")
        }
    }
}

impl Drop for DirGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.0.take() {
            dir.close().expect("cannot close temporary dir")
        }
    }
}

pub fn temp_file(suffix: &str) -> FileGuard {
    let mut b = tempfile::Builder::new();
    let file = b.suffix(suffix).tempfile().unwrap();
    FileGuard(Some(file))
}

pub fn temp_dir() -> DirGuard {
    let b = tempfile::Builder::new();
    let dir = b.tempdir().unwrap();
    DirGuard(Some(dir))
}

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();

    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    file.write_all(content).unwrap();

    path
}

/// A profile pointing at `dir`, with the same defaults the config loader
/// applies.
pub fn profile(dir: &Path) -> Profile {
    Profile {
        upload_dir: dir.to_path_buf(),
        container: "test-container".into(),
        segment_size: 1024,
        recursive: false,
        extension: None,
        on_error: OnError::Continue,
        archive_dir: None,
        report_file: None,
    }
}

/// In-memory stand-in for the remote store. Records uploaded object names,
/// serves a canned listing, and can be told to fail specific objects or
/// the listing itself.
#[derive(Debug, Default)]
pub struct FakeBackend {
    uploads: Arc<Mutex<Vec<String>>>,
    listing: Vec<String>,
    rejected: Option<String>,
    denied: Option<String>,
    broken_listing: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend::default()
    }

    pub fn listing(mut self, names: &[&str]) -> Self {
        self.listing = names.iter().map(|it| it.to_string()).collect();
        self
    }

    /// Uploads of this object fail with a transfer error.
    pub fn reject(mut self, name: &str) -> Self {
        self.rejected = Some(name.to_string());
        self
    }

    /// Uploads of this object fail as if the store rejected the credentials.
    pub fn deny(mut self, name: &str) -> Self {
        self.denied = Some(name.to_string());
        self
    }

    pub fn broken_listing(mut self) -> Self {
        self.broken_listing = true;
        self
    }

    /// Shared handle onto the recorded uploads, valid after the backend has
    /// been boxed away.
    pub fn uploads(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.uploads)
    }
}

impl Backend for FakeBackend {
    fn upload(&self, req: UploadRequest) -> Result<usize, Error> {
        if self.rejected.as_ref() == Some(&req.key) {
            return Err(Error::remote("injected transfer failure"));
        }

        if self.denied.as_ref() == Some(&req.key) {
            return Err(Error::credentials("injected credentials failure"));
        }

        self.uploads.lock().unwrap().push(req.key);
        Ok(req.len)
    }

    fn objects(&self) -> Result<Vec<String>, Error> {
        if self.broken_listing {
            return Err(Error::remote("injected listing failure"));
        }

        Ok(self.listing.clone())
    }
}
