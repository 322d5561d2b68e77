use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

type Cause = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug)]
pub enum ErrorKind {
    Io(PathBuf),
    Config(String),
    Credentials,
    Remote,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    cause: Option<Cause>,
}

impl Error {
    pub fn config<T>(message: T) -> Error
    where
        T: Into<String>,
    {
        Error {
            kind: ErrorKind::Config(message.into()),
            cause: None,
        }
    }

    pub fn credentials<E>(err: E) -> Error
    where
        E: Into<Cause>,
    {
        Error {
            kind: ErrorKind::Credentials,
            cause: Some(err.into()),
        }
    }

    pub fn remote<E>(err: E) -> Error
    where
        E: Into<Cause>,
    {
        Error {
            kind: ErrorKind::Remote,
            cause: Some(err.into()),
        }
    }

    pub fn io<T, E>(path: T) -> impl FnOnce(E) -> Error
    where
        T: AsRef<Path>,
        E: Into<Cause>,
    {
        let path = path.as_ref().to_path_buf();
        |err: E| Error {
            kind: ErrorKind::Io(path),
            cause: Some(err.into()),
        }
    }

    pub fn io_err<T, R, E>(path: T, err: E) -> Result<R, Error>
    where
        T: AsRef<Path>,
        E: Into<Cause>,
    {
        Err(Error {
            kind: ErrorKind::Io(path.as_ref().to_path_buf()),
            cause: Some(err.into()),
        })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Fatal errors end the run even under the `continue` failure policy.
    pub fn is_fatal(&self) -> bool {
        match self.kind {
            ErrorKind::Credentials | ErrorKind::Config(_) => true,
            _ => false,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.kind {
            ErrorKind::Io(path) => write!(f, "{} at {:?}", self.description(), path.as_os_str())?,
            ErrorKind::Config(message) => write!(f, "{}; {}", self.description(), message)?,
            ErrorKind::Credentials => write!(f, "{}", self.description())?,
            ErrorKind::Remote => write!(f, "{}", self.description())?,
        };

        let mut cause = self.source();
        while let Some(ref err) = cause {
            write!(f, "; {}", err)?;
            cause = err.source()
        }

        Ok(())
    }
}

impl StdError for Error {
    fn description(&self) -> &str {
        match &self.kind {
            ErrorKind::Io(_) => "I/O error",
            ErrorKind::Config(_) => "Configuration error",
            ErrorKind::Credentials => "Credentials missing or rejected",
            ErrorKind::Remote => "Remote storage error",
        }
    }

    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        if let Some(ref err) = self.cause {
            return Some(err.as_ref());
        }
        None
    }
}

pub trait ResultExt<T, E> {
    fn io_err<P>(self, path: P) -> Result<T, Error>
    where
        P: AsRef<Path>;

    fn remote_err(self) -> Result<T, Error>;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    E: Into<Cause>,
{
    fn io_err<P>(self, path: P) -> Result<T, Error>
    where
        P: AsRef<Path>,
    {
        self.map_err(Error::io(path))
    }

    fn remote_err(self) -> Result<T, Error> {
        self.map_err(Error::remote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_kinds() {
        assert!(Error::config("broken").is_fatal());
        assert!(Error::credentials("no token").is_fatal());
        assert!(!Error::remote("connection reset").is_fatal());

        let err: Result<(), _> = Error::io_err("/tmp/missing", "gone");
        assert!(!err.unwrap_err().is_fatal());
    }

    #[test]
    fn display_chains_cause() {
        let err = Error::remote("connection reset");
        assert_eq!(err.to_string(), "Remote storage error; connection reset");

        let err = Error::config("container name is empty");
        assert_eq!(
            err.to_string(),
            "Configuration error; container name is empty"
        );
    }
}
