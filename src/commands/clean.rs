use std::collections::HashSet;
use std::fs;

use log::{error, info};

use crate::commands::Summary;
use crate::config::Profile;
use crate::errors::ResultExt;
use crate::walk::{self, Source};
use crate::{Error, Stats, Storage};

/// Removes staged files whose objects the container already holds, so the
/// next upload run does not redo completed work. Files without a matching
/// remote object are never touched.
pub struct Clean<'a, 'b> {
    profile: &'a Profile,
    storage: &'b Storage,
}

impl<'a, 'b> Clean<'a, 'b> {
    pub fn new(profile: &'a Profile, storage: &'b Storage) -> Self {
        Clean { profile, storage }
    }

    pub fn run(self) -> Result<Summary, Error> {
        let Self { profile, storage } = self;

        profile.validate()?;

        // A failed listing aborts the run before anything is removed.
        let remote = storage.objects()?.into_iter().collect::<HashSet<_>>();

        info!(
            "Container '{}' lists {} objects",
            profile.container,
            remote.len()
        );

        let sources = walk::sources(
            &profile.upload_dir,
            profile.recursive,
            profile.extension.as_deref(),
        )?;

        let mut summary = Summary::default();
        let timer = Stats::current().cleaning().timer();

        for src in &sources {
            if !remote.contains(&src.object_name) {
                continue;
            }

            match dispose(profile, src) {
                Ok(()) => {
                    summary.succeeded += 1;
                    timer.bytes(src.len as usize);
                    Stats::current().cleaning().inc_files(1);
                }
                Err(err) => {
                    error!("{}", err);
                    summary.failed += 1;
                }
            }
        }

        info!("Cleanup summary - {}", summary);

        Ok(summary)
    }
}

fn dispose(profile: &Profile, src: &Source) -> Result<(), Error> {
    match &profile.archive_dir {
        Some(dir) => {
            let dest = dir.join(&src.object_name);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).io_err(parent)?;
            }

            fs::rename(&src.path, &dest).io_err(&src.path)?;
            info!("Archived {} into {:?}", src.object_name, dest);
        }
        None => {
            fs::remove_file(&src.path).io_err(&src.path)?;
            info!("Removed {}", src.object_name);
        }
    }

    Ok(())
}
