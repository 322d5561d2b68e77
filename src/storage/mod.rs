use std::path::Path;

use crate::{Config, Error, Profile, Stats};

pub(crate) mod backend;
mod futures_ext;

/// Front for the remote store. Everything behind the `Backend` trait is the
/// storage client's territory: signing, TLS, segment assembly, pagination.
#[derive(Debug)]
pub struct Storage {
    backend: Box<dyn backend::Backend>,
    segment_size: usize,
}

impl Storage {
    pub fn new(cfg: &Config, profile: &Profile) -> Result<Self, Error> {
        let s3 = backend::S3::new(
            profile.container.as_str(),
            cfg.endpoint.as_deref(),
            cfg.region.as_deref(),
        )?;

        Ok(Storage {
            backend: Box::new(s3),
            segment_size: profile.segment_size as usize,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_backend(backend: Box<dyn backend::Backend>, segment_size: usize) -> Self {
        Storage {
            backend,
            segment_size,
        }
    }

    /// Pushes one local file into the container under `object_name`.
    /// The local file is never touched.
    pub fn upload<P>(&self, path: P, object_name: &str, len: usize) -> Result<(), Error>
    where
        P: AsRef<Path>,
    {
        let timer = Stats::current().uploading().timer();

        let req = backend::UploadRequest {
            path: path.as_ref().to_path_buf(),
            key: object_name.to_string(),
            len,
            segment_size: self.segment_size,
        };

        let len = self.backend.upload(req)?;

        timer.bytes(len);
        Stats::current().uploading().inc_files(1);

        Ok(())
    }

    /// All object names currently present in the container.
    pub fn objects(&self) -> Result<Vec<String>, Error> {
        let _timer = Stats::current().listing().timer();

        let names = self.backend.objects()?;
        Stats::current().listing().inc_files(names.len() as u64);

        Ok(names)
    }
}
