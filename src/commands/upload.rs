use std::fs::OpenOptions;
use std::path::Path;

use log::{error, info, warn};
use serde_derive::Serialize;

use crate::commands::Summary;
use crate::config::{OnError, Profile};
use crate::errors::ResultExt;
use crate::walk::{self, Source};
use crate::{pretty, Error, Storage};

/// Pushes every staged file into the remote container, one object per
/// file. Staged files are never deleted here; that is the cleanup
/// command's job, and only after the listing confirms the object exists.
pub struct Upload<'a, 'b> {
    profile: &'a Profile,
    storage: &'b Storage,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    object: String,
    len: u64,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ReportEntry {
    fn uploaded(src: &Source) -> Self {
        ReportEntry {
            object: src.object_name.clone(),
            len: src.len,
            status: "uploaded",
            error: None,
        }
    }

    fn failed(src: &Source, err: &Error) -> Self {
        ReportEntry {
            object: src.object_name.clone(),
            len: src.len,
            status: "failed",
            error: Some(err.to_string()),
        }
    }
}

impl<'a, 'b> Upload<'a, 'b> {
    pub fn new(profile: &'a Profile, storage: &'b Storage) -> Self {
        Upload { profile, storage }
    }

    pub fn run(self) -> Result<Summary, Error> {
        let Self { profile, storage } = self;

        profile.validate()?;

        let sources = walk::sources(
            &profile.upload_dir,
            profile.recursive,
            profile.extension.as_deref(),
        )?;

        if sources.is_empty() {
            warn!("No files found under {:?}, exiting", profile.upload_dir);
            return Ok(Summary::default());
        }

        info!(
            "Found {} files to upload under {:?}",
            sources.len(),
            profile.upload_dir
        );

        let mut summary = Summary::default();
        let mut report = Vec::with_capacity(sources.len());
        let mut fatal = None;

        for src in &sources {
            info!(
                "Uploading {} ({})",
                src.object_name,
                pretty::bytes(src.len as usize)
            );

            match storage.upload(&src.path, &src.object_name, src.len as usize) {
                Ok(()) => {
                    summary.succeeded += 1;
                    report.push(ReportEntry::uploaded(src));
                }
                Err(err) => {
                    error!("{}", err);
                    summary.failed += 1;
                    report.push(ReportEntry::failed(src, &err));

                    if err.is_fatal() || profile.on_error == OnError::Abort {
                        fatal = Some(err);
                        break;
                    }
                }
            }
        }

        if let Some(path) = &profile.report_file {
            write_report(path, &report)?;
        }

        if let Some(err) = fatal {
            return Err(err);
        }

        info!("Upload summary - {}", summary);

        Ok(summary)
    }
}

fn write_report(path: &Path, entries: &[ReportEntry]) -> Result<(), Error> {
    let mut opts = OpenOptions::new();
    let file = opts
        .create(true)
        .truncate(true)
        .write(true)
        .open(&path)
        .io_err(&path)?;

    serde_json::to_writer(&file, entries).io_err(&path)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;

    use serde_json::Value;

    use crate::testing::{self, FakeBackend};
    use crate::Storage;

    #[test]
    fn uploads_every_staged_file() {
        let work = testing::temp_dir();
        testing::write_file(work.as_ref(), "aip-0001.7z", b"alpha");
        testing::write_file(work.as_ref(), "aip-0002.7z", b"beta");

        let profile = testing::profile(work.as_ref());
        let fake = FakeBackend::new();
        let uploads = fake.uploads();
        let storage = Storage::with_backend(Box::new(fake), 1024);

        let summary = Upload::new(&profile, &storage).run().unwrap();

        assert_eq!(summary, Summary { succeeded: 2, failed: 0 });
        assert_eq!(
            *uploads.lock().unwrap(),
            vec!["aip-0001.7z", "aip-0002.7z"]
        );

        // the uploader never touches local files
        assert!(work.as_ref().join("aip-0001.7z").exists());
        assert!(work.as_ref().join("aip-0002.7z").exists());
    }

    #[test]
    fn failed_upload_continues_by_default() {
        let work = testing::temp_dir();
        testing::write_file(work.as_ref(), "aip-0001.7z", b"alpha");
        testing::write_file(work.as_ref(), "aip-0002.7z", b"beta");
        testing::write_file(work.as_ref(), "aip-0003.7z", b"gamma");

        let profile = testing::profile(work.as_ref());
        let fake = FakeBackend::new().reject("aip-0002.7z");
        let uploads = fake.uploads();
        let storage = Storage::with_backend(Box::new(fake), 1024);

        let summary = Upload::new(&profile, &storage).run().unwrap();

        assert_eq!(summary, Summary { succeeded: 2, failed: 1 });
        assert!(!summary.is_clean());
        assert_eq!(
            *uploads.lock().unwrap(),
            vec!["aip-0001.7z", "aip-0003.7z"]
        );
    }

    #[test]
    fn abort_policy_stops_the_run() {
        let work = testing::temp_dir();
        testing::write_file(work.as_ref(), "aip-0001.7z", b"alpha");
        testing::write_file(work.as_ref(), "aip-0002.7z", b"beta");

        let mut profile = testing::profile(work.as_ref());
        profile.on_error = OnError::Abort;

        let fake = FakeBackend::new().reject("aip-0001.7z");
        let uploads = fake.uploads();
        let storage = Storage::with_backend(Box::new(fake), 1024);

        Upload::new(&profile, &storage).run().unwrap_err();

        assert!(uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn credential_failure_aborts_even_under_continue() {
        let work = testing::temp_dir();
        testing::write_file(work.as_ref(), "aip-0001.7z", b"alpha");
        testing::write_file(work.as_ref(), "aip-0002.7z", b"beta");

        let profile = testing::profile(work.as_ref());
        assert_eq!(profile.on_error, OnError::Continue);

        let fake = FakeBackend::new().deny("aip-0001.7z");
        let uploads = fake.uploads();
        let storage = Storage::with_backend(Box::new(fake), 1024);

        let err = Upload::new(&profile, &storage).run().unwrap_err();

        assert!(err.is_fatal());
        assert!(uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_staging_dir_is_a_noop() {
        let work = testing::temp_dir();
        let profile = testing::profile(work.as_ref());
        let storage = Storage::with_backend(Box::new(FakeBackend::new()), 1024);

        let summary = Upload::new(&profile, &storage).run().unwrap();

        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn report_records_every_outcome() {
        let work = testing::temp_dir();
        let out = testing::temp_dir();
        testing::write_file(work.as_ref(), "aip-0001.7z", b"alpha");
        testing::write_file(work.as_ref(), "aip-0002.7z", b"beta");

        let mut profile = testing::profile(work.as_ref());
        profile.report_file = Some(out.as_ref().join("report.json"));

        let fake = FakeBackend::new().reject("aip-0002.7z");
        let storage = Storage::with_backend(Box::new(fake), 1024);

        Upload::new(&profile, &storage).run().unwrap();

        let file = File::open(out.as_ref().join("report.json")).unwrap();
        let report: Value = serde_json::from_reader(&file).unwrap();
        let entries = report.as_array().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["object"], "aip-0001.7z");
        assert_eq!(entries[0]["status"], "uploaded");
        assert_eq!(entries[1]["status"], "failed");
        assert!(entries[1]["error"].as_str().unwrap().contains("Remote"));
    }
}
