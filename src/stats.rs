use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use lazy_static::lazy_static;

use crate::pretty;

const MICROS_IN_SEC: f64 = 1_000_000.0;

lazy_static! {
    static ref STATS: Stats = Stats::default();
}

#[derive(Debug, Default)]
pub struct Counter {
    files: AtomicU64,
    bytes: AtomicU64,
    micros: AtomicU64,
}

impl Counter {
    #[inline]
    pub fn inc_files(&self, n: u64) {
        self.files.fetch_add(n, Ordering::SeqCst);
    }

    #[inline]
    pub fn inc_bytes(&self, n: usize) {
        self.bytes.fetch_add(n as u64, Ordering::SeqCst);
    }

    #[inline]
    pub fn inc_time(&self, elapsed: &Duration) {
        let micros = elapsed.as_micros() as u64;
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }

    #[inline]
    pub fn files(&self) -> u64 {
        self.files.load(Ordering::Acquire)
    }

    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }

    #[inline]
    pub fn micros(&self) -> u64 {
        self.micros.load(Ordering::Acquire)
    }

    #[inline]
    pub fn timer(&self) -> Timer<'_> {
        Timer(Instant::now(), &self)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files() == 0 && self.bytes() == 0
    }
}

impl Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let secs = self.micros() as f64 / MICROS_IN_SEC;

        write!(f, "{} files took {:.2}s", self.files(), secs)?;

        let num_bytes = self.bytes() as f64;
        if num_bytes > 0.0 {
            let per_sec = if self.micros() == 0 {
                num_bytes
            } else {
                num_bytes / secs
            };
            write!(f, " - {}/s", pretty::bytes(per_sec as usize))?;
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct Timer<'a>(Instant, &'a Counter);

impl<'a> Timer<'a> {
    #[inline]
    pub fn bytes(&self, n: usize) {
        self.1.inc_bytes(n)
    }
}

impl<'a> Drop for Timer<'a> {
    #[inline]
    fn drop(&mut self) {
        let duration = self.0.elapsed();
        self.1.inc_time(&duration);
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    uploading: Counter,
    listing: Counter,
    cleaning: Counter,
}

impl Stats {
    #[inline]
    pub fn current() -> &'static Self {
        &STATS
    }

    #[inline]
    pub fn uploading(&self) -> &Counter {
        &self.uploading
    }

    #[inline]
    pub fn listing(&self) -> &Counter {
        &self.listing
    }

    #[inline]
    pub fn cleaning(&self) -> &Counter {
        &self.cleaning
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        if !self.uploading.is_empty() {
            write!(f, "upload: {}; ", self.uploading)?;
        }

        if !self.listing.is_empty() {
            write!(f, "listing: {}; ", self.listing)?;
        }

        if !self.cleaning.is_empty() {
            write!(f, "cleanup: {}; ", self.cleaning)?;
        }

        Ok(())
    }
}
