use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;
use url::Url;

use crate::errors::ResultExt;
use crate::Error;

const CONFIG_DIR: &str = ".arch-sync";
const CONFIG_FILE: &str = "config.json";
const MAX_CONTAINER_NAME_LEN: usize = 256;

// 4.5gb, large enough that most packages go up in a single request
const DEFAULT_SEGMENT_SIZE: u64 = 4 * 1024 * 1024 * 1024 + 500 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    pub aip: Profile,
    pub warc: Profile,
}

/// What a failed individual upload does to the rest of the run. Credential
/// failures end the run no matter what the policy says.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    Continue,
    Abort,
}

impl Default for OnError {
    fn default() -> Self {
        OnError::Continue
    }
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub upload_dir: PathBuf,
    pub container: String,
    #[serde(default = "default_segment_size")]
    pub segment_size: u64,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub extension: Option<String>,
    #[serde(default)]
    pub on_error: OnError,
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
    #[serde(default)]
    pub report_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let home = env::var("HOME").unwrap_or_else(|_| ".".into());
        let path = Path::new(home.as_str()).join(CONFIG_DIR).join(CONFIG_FILE);
        Config::load(path)
    }

    pub fn load<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let file = File::open(&path).io_err(&path)?;
        let cfg: Config = serde_json::from_reader(&file).io_err(&path)?;

        if let Some(endpoint) = &cfg.endpoint {
            if Url::parse(endpoint).is_err() {
                let err = format!("Invalid endpoint url '{}'", endpoint);
                return Err(Error::config(err));
            }
        }

        cfg.aip.check_static()?;
        cfg.warc.check_static()?;

        Ok(cfg)
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        match name {
            "aip" => Some(&self.aip),
            "warc" => Some(&self.warc),
            _ => None,
        }
    }
}

impl Profile {
    /// Checks that don't touch the filesystem, run at load time for every
    /// profile regardless of which one the command uses.
    fn check_static(&self) -> Result<(), Error> {
        if self.container.is_empty() {
            return Err(Error::config("Container name is empty"));
        }

        if self.container.len() > MAX_CONTAINER_NAME_LEN {
            let err = format!(
                "Container name '{}' is longer than {} bytes",
                self.container, MAX_CONTAINER_NAME_LEN
            );
            return Err(Error::config(err));
        }

        if self.container.contains('/') {
            let err = format!("Container name '{}' contains '/'", self.container);
            return Err(Error::config(err));
        }

        if self.segment_size == 0 {
            return Err(Error::config("Segment size must be positive"));
        }

        if let Some(archive_dir) = &self.archive_dir {
            if archive_dir.starts_with(&self.upload_dir) {
                let err = format!(
                    "Archive directory {:?} is inside the upload directory",
                    archive_dir
                );
                return Err(Error::config(err));
            }
        }

        Ok(())
    }

    /// Runs before any network call is made on behalf of this profile.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.upload_dir.is_dir() {
            let err = format!(
                "Upload directory {:?} does not exist or is not a directory",
                self.upload_dir
            );
            return Err(Error::config(err));
        }

        Ok(())
    }
}

fn default_segment_size() -> u64 {
    DEFAULT_SEGMENT_SIZE
}
