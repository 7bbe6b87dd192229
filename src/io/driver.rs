//! Driver abstraction for the bulk loader.
//!
//! A driver knows how to turn `BandInfo` descriptors into opened readers.
//! Opens are future-like: `open` returns a `PendingReader` whose `result()`
//! blocks until the reader is available, so a driver may resolve opens on a
//! worker thread without the loader assuming any particular runtime.

use std::thread;

use crate::io::reader::RasterReader;
use crate::types::{BandInfo, Pixel, RasterError, RasterResult};

enum Pending<'a, T: Pixel> {
    Ready(RasterResult<Box<dyn RasterReader<T> + 'a>>),
    Task(thread::JoinHandle<RasterResult<Box<dyn RasterReader<T> + Send>>>),
}

/// Future-like handle to an in-flight open.
pub struct PendingReader<'a, T: Pixel> {
    inner: Pending<'a, T>,
}

impl<'a, T: Pixel> PendingReader<'a, T> {
    /// An already-resolved open (the synchronous driver case).
    pub fn ready(r: RasterResult<Box<dyn RasterReader<T> + 'a>>) -> Self {
        Self {
            inner: Pending::Ready(r),
        }
    }

    /// Resolve the open on a worker thread.
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() -> RasterResult<Box<dyn RasterReader<T> + Send>> + Send + 'static,
    {
        Self {
            inner: Pending::Task(thread::spawn(f)),
        }
    }

    /// Block until the reader is available.
    pub fn result(self) -> RasterResult<Box<dyn RasterReader<T> + 'a>> {
        match self.inner {
            Pending::Ready(r) => r,
            Pending::Task(handle) => {
                let r = handle
                    .join()
                    .map_err(|_| RasterError::Driver("reader open task panicked".into()))?;
                let reader: Box<dyn RasterReader<T> + 'a> = r?;
                Ok(reader)
            }
        }
    }
}

/// Opens bands for the bulk loader.
pub trait ReaderDriver<T: Pixel> {
    /// Driver-owned state shared across one whole load (handle caches,
    /// connection pools). Purely an optimization seam.
    type Context;

    /// Batch-prepare state for the full set of bands before any reads begin.
    /// `prev` allows reuse across consecutive loads.
    fn new_load_context(&self, bands: &[BandInfo], prev: Option<Self::Context>) -> Self::Context;

    /// Begin opening one band.
    fn open<'a>(&'a self, band: &BandInfo, ctx: &'a Self::Context) -> PendingReader<'a, T>;
}
