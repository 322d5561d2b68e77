use std::fmt::Debug;
use std::path::PathBuf;

mod s3;

pub use self::s3::S3;
use crate::Error;

#[derive(Debug)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub key: String,
    pub len: usize,
    pub segment_size: usize,
}

pub trait Backend: Debug {
    /// Uploads one local file as one remote object, returning the number of
    /// bytes sent. Files larger than the segment size go up in segments.
    fn upload(&self, req: UploadRequest) -> Result<usize, Error>;

    /// Returns every object name in the container.
    fn objects(&self) -> Result<Vec<String>, Error>;
}
