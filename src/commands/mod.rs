use std::fmt::{self, Display};

mod clean;
mod upload;

pub use self::clean::Clean;
pub use self::upload::Upload;

/// Per-run outcome counts, logged at the end of every run. A run with any
/// failed objects exits non-zero even when it carried on to the end.
#[derive(Debug, Default, PartialEq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{} succeeded, {} failed", self.succeeded, self.failed)
    }
}
