use std::fmt::{self, Debug};
use std::str::FromStr;

use futures::stream::{iter_ok, Stream};
use futures::Future;
use rusoto_core::credential::ChainProvider;
use rusoto_core::{HttpClient, Region};
use rusoto_s3::{self as s3_api, S3Client, S3 as S3Api};

use crate::errors::ResultExt;
use crate::storage::backend::{Backend, UploadRequest};
use crate::storage::futures_ext::FuturesExt;
use crate::{mmap, Error};

// Segments of one object may be in flight together; files still go up
// strictly one at a time.
const SEGMENT_PIPELINE: usize = 4;

pub struct S3 {
    container: String,
    region: Region,
    client: S3Client,
}

impl S3 {
    /// Builds the one client used for the whole run. Credentials come from
    /// the standard environment chain and are handed to the client library
    /// unmodified.
    pub fn new(container: &str, endpoint: Option<&str>, region: Option<&str>) -> Result<Self, Error> {
        let region = match (endpoint, region) {
            (Some(endpoint), _) => Region::Custom {
                name: "custom".into(),
                endpoint: endpoint.to_string(),
            },
            (_, Some(name)) => Region::from_str(name).unwrap_or_else(|_| Region::default()),
            _ => Region::default(),
        };

        let dispatcher = HttpClient::new().remote_err()?;
        let credentials = ChainProvider::new();
        let client = S3Client::new_with(dispatcher, credentials, region.clone());

        Ok(S3 {
            container: container.to_string(),
            region,
            client,
        })
    }

    fn upload_whole(&self, req: &UploadRequest) -> Result<usize, Error> {
        let body = if req.len == 0 {
            Vec::new()
        } else {
            let (_file, src) = mmap::read(&req.path)?;
            Vec::from(&src[..])
        };

        let put = s3_api::PutObjectRequest {
            bucket: self.container.clone(),
            key: req.key.clone(),
            body: Some(body.into()),
            ..Default::default()
        };

        self.client
            .put_object(put)
            .map_err(|err| match err {
                s3_api::PutObjectError::Credentials(cause) => Error::credentials(cause),
                other => Error::remote(other),
            })
            .sync()?;

        Ok(req.len)
    }

    fn upload_segmented(&self, req: &UploadRequest) -> Result<usize, Error> {
        let create = s3_api::CreateMultipartUploadRequest {
            bucket: self.container.clone(),
            key: req.key.clone(),
            ..Default::default()
        };

        let upload = self
            .client
            .create_multipart_upload(create)
            .map_err(|err| match err {
                s3_api::CreateMultipartUploadError::Credentials(cause) => Error::credentials(cause),
                other => Error::remote(other),
            })
            .sync()?;

        let upload_id = upload
            .upload_id
            .ok_or_else(|| Error::remote("upload id cannot be empty"))?;

        let (_file, src) = mmap::read(&req.path)?;

        let parts = src
            .chunks(req.segment_size)
            .enumerate()
            .map(|(idx, chunk)| {
                let part_number = (idx + 1) as i64;
                let body = Vec::from(chunk);
                let part = s3_api::UploadPartRequest {
                    body: Some(body.into()),
                    bucket: self.container.clone(),
                    key: req.key.clone(),
                    upload_id: upload_id.clone(),
                    part_number,
                    ..Default::default()
                };

                self.client
                    .upload_part(part)
                    .map_err(|err| match err {
                        s3_api::UploadPartError::Credentials(cause) => Error::credentials(cause),
                        other => Error::remote(other),
                    })
                    .map(move |res| s3_api::CompletedPart {
                        e_tag: res.e_tag.clone(),
                        part_number: Some(part_number),
                    })
            })
            .collect::<Vec<_>>();

        let parts = iter_ok(parts).buffered(SEGMENT_PIPELINE).collect().sync()?;

        let complete = s3_api::CompleteMultipartUploadRequest {
            bucket: self.container.clone(),
            key: req.key.clone(),
            upload_id,
            multipart_upload: Some(s3_api::CompletedMultipartUpload { parts: Some(parts) }),
            ..Default::default()
        };

        self.client
            .complete_multipart_upload(complete)
            .map_err(|err| match err {
                s3_api::CompleteMultipartUploadError::Credentials(cause) => Error::credentials(cause),
                other => Error::remote(other),
            })
            .sync()?;

        Ok(req.len)
    }
}

impl Backend for S3 {
    fn upload(&self, req: UploadRequest) -> Result<usize, Error> {
        if req.len > req.segment_size {
            self.upload_segmented(&req)
        } else {
            self.upload_whole(&req)
        }
    }

    fn objects(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let list = s3_api::ListObjectsV2Request {
                bucket: self.container.clone(),
                continuation_token: continuation.take(),
                ..Default::default()
            };

            let resp = self
                .client
                .list_objects_v2(list)
                .map_err(|err| match err {
                    s3_api::ListObjectsV2Error::Credentials(cause) => Error::credentials(cause),
                    other => Error::remote(other),
                })
                .sync()?;

            if let Some(contents) = resp.contents {
                names.extend(contents.into_iter().filter_map(|it| it.key));
            }

            if !resp.is_truncated.unwrap_or(false) {
                break;
            }

            match resp.next_continuation_token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(names)
    }
}

impl Debug for S3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("S3")
            .field("container", &self.container)
            .field("region", &self.region)
            .finish()
    }
}
