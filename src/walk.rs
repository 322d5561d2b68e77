use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::ResultExt;
use crate::Error;

/// A local file staged for upload: its path plus the object name it maps to
/// in the remote container.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub path: PathBuf,
    pub object_name: String,
    pub len: u64,
}

/// Derives the remote object name for a staged file. Both the uploader and
/// the cleanup command go through this one function, so local names and
/// remote names cannot drift apart.
///
/// The name is the path relative to the staging root, components joined
/// with '/'. For a flat walk this is just the file name.
pub fn object_name<R, P>(root: R, path: P) -> Result<String, Error>
where
    R: AsRef<Path>,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let relative = match path.strip_prefix(root.as_ref()) {
        Ok(val) => val,
        Err(_) => {
            let err = format!("{:?} is outside of the staging root", path);
            return Err(Error::config(err));
        }
    };

    let mut parts = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(val) => parts.push(val),
            None => {
                let err = format!("Non-unicode file name in {:?}", path);
                return Err(Error::config(err));
            }
        }
    }

    if parts.is_empty() {
        let err = format!("Empty object name for {:?}", path);
        return Err(Error::config(err));
    }

    Ok(parts.join("/"))
}

/// Enumerates regular files under `root` in file-name order. Symlinks are
/// never followed; directories and non-files are skipped. A non-recursive
/// walk stops at the first level.
pub fn sources<P>(
    root: P,
    recursive: bool,
    extension: Option<&str>,
) -> Result<Vec<Source>, Error>
where
    P: AsRef<Path>,
{
    let root = root.as_ref();

    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut sources = Vec::new();

    for entry in walker {
        let entry = entry.io_err(root)?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();

        if let Some(wanted) = extension {
            let matched = path
                .extension()
                .and_then(|it| it.to_str())
                .map(|it| it == wanted)
                .unwrap_or(false);

            if !matched {
                continue;
            }
        }

        let object_name = object_name(root, path)?;
        let len = entry.metadata().io_err(path)?.len();

        sources.push(Source {
            path: path.to_path_buf(),
            object_name,
            len,
        });
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::STAGING_PATH;

    #[test]
    fn object_name_is_root_relative() {
        let name = object_name("/staging", "/staging/aip-0001.7z").unwrap();
        assert_eq!(name, "aip-0001.7z");

        let name = object_name("/staging", "/staging/crawl/daily-0001.warc.gz").unwrap();
        assert_eq!(name, "crawl/daily-0001.warc.gz");

        let err = object_name("/staging", "/elsewhere/aip-0001.7z").unwrap_err();
        assert!(err.to_string().contains("outside of the staging root"));

        let err = object_name("/staging", "/staging").unwrap_err();
        assert!(err.to_string().contains("Empty object name"));
    }

    #[test]
    fn flat_walk_skips_subdirectories() {
        let actual = sources(STAGING_PATH, false, None)
            .unwrap()
            .into_iter()
            .map(|it| it.object_name)
            .collect::<Vec<_>>();

        assert_eq!(actual, vec!["aip-0001.7z", "aip-0002.7z", "notes.txt"]);
    }

    #[test]
    fn recursive_walk_keeps_relative_names() {
        let actual = sources(STAGING_PATH, true, None)
            .unwrap()
            .into_iter()
            .map(|it| it.object_name)
            .collect::<Vec<_>>();

        assert_eq!(
            actual,
            vec![
                "aip-0001.7z",
                "aip-0002.7z",
                "crawl/daily-0001.warc.gz",
                "notes.txt",
            ]
        );
    }

    #[test]
    fn extension_filter() {
        let actual = sources(STAGING_PATH, true, Some("7z"))
            .unwrap()
            .into_iter()
            .map(|it| it.object_name)
            .collect::<Vec<_>>();

        assert_eq!(actual, vec!["aip-0001.7z", "aip-0002.7z"]);
    }

    #[test]
    fn lengths_come_from_metadata() {
        let actual = sources(STAGING_PATH, false, Some("7z")).unwrap();

        assert_eq!(actual[0].len, 5);
        assert_eq!(actual[1].len, 4);
    }
}
