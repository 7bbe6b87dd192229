//! In-memory sources, readers and driver.
//!
//! Reference implementations of the I/O seams: an array-backed source with
//! full window/decimation/extra-dim read support, and a driver that serves
//! sources out of a URI map. Used throughout the test suite and as the
//! template for real format drivers.

use ndarray::{s, Array2, Array3, Axis};
use std::collections::HashMap;

use crate::geometry::{Affine, Crs, Roi};
use crate::io::driver::{PendingReader, ReaderDriver};
use crate::io::reader::{RasterReader, RasterSource, ReadArgs};
use crate::types::{BandInfo, Pixel, RasterError, RasterResult};

/// An array-backed raster source. Holds one band, possibly with a stacked
/// extra dimension (layers, rows, cols).
#[derive(Debug, Clone)]
pub struct MemorySource<T: Pixel> {
    data: Array3<T>,
    transform: Affine,
    crs: Crs,
    nodata: Option<T>,
    paste_capable: bool,
}

impl<T: Pixel> MemorySource<T> {
    pub fn new(data: Array2<T>, transform: Affine, crs: Crs, nodata: Option<T>) -> Self {
        Self {
            data: data.insert_axis(Axis(0)),
            transform,
            crs,
            nodata,
            paste_capable: true,
        }
    }

    /// A source with a stacked extra dimension.
    pub fn stacked(data: Array3<T>, transform: Affine, crs: Crs, nodata: Option<T>) -> Self {
        Self {
            data,
            transform,
            crs,
            nodata,
            paste_capable: true,
        }
    }

    /// Opt out of the direct-copy capability; every read gets warped.
    pub fn without_paste(mut self) -> Self {
        self.paste_capable = false;
        self
    }

    fn open_reader(&self, layer: usize, nodata: Option<T>) -> MemoryReader<'_, T> {
        MemoryReader {
            source: self,
            default_layer: layer,
            nodata: nodata.or(self.nodata),
        }
    }
}

impl<T: Pixel> RasterSource<T> for MemorySource<T> {
    fn open(&self) -> RasterResult<Box<dyn RasterReader<T> + '_>> {
        Ok(Box::new(self.open_reader(0, None)))
    }
}

/// Reader over one layer of a [`MemorySource`].
pub struct MemoryReader<'a, T: Pixel> {
    source: &'a MemorySource<T>,
    default_layer: usize,
    nodata: Option<T>,
}

impl<T: Pixel> RasterReader<T> for MemoryReader<'_, T> {
    fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.source.data.dim();
        (rows, cols)
    }

    fn crs(&self) -> Crs {
        self.source.crs
    }

    fn transform(&self) -> Affine {
        self.source.transform
    }

    fn nodata(&self) -> Option<T> {
        self.nodata
    }

    fn supports_paste(&self) -> bool {
        self.source.paste_capable
    }

    fn read(&mut self, args: ReadArgs) -> RasterResult<Array2<T>> {
        let layer = args.extra_dim_index.unwrap_or(self.default_layer);
        if layer >= self.source.data.len_of(Axis(0)) {
            return Err(RasterError::Read {
                band: "memory".into(),
                reason: format!("layer {} out of range", layer),
            });
        }
        let plane = self.source.data.index_axis(Axis(0), layer);
        let full = (plane.nrows(), plane.ncols());

        let win = args.window.unwrap_or_else(|| Roi::full(full));
        if win.is_empty() || win.row1 > full.0 || win.col1 > full.1 {
            return Err(RasterError::Read {
                band: "memory".into(),
                reason: format!("window {} outside {}x{}", win, full.0, full.1),
            });
        }

        let out = args.out_shape.unwrap_or_else(|| win.shape());
        let (wh, ww) = win.shape();
        if out == (wh, ww) {
            return Ok(plane.slice(s![win.rows(), win.cols()]).to_owned());
        }

        // decimated read: nearest pixel to each output block center
        let ry = wh as f64 / out.0 as f64;
        let rx = ww as f64 / out.1 as f64;
        Ok(Array2::from_shape_fn(out, |(i, j)| {
            let r = win.row0 + (((i as f64 + 0.5) * ry) as usize).min(wh - 1);
            let c = win.col0 + (((j as f64 + 0.5) * rx) as usize).min(ww - 1);
            plane[(r, c)]
        }))
    }
}

/// Load-context for the in-memory driver: counts what was prepared, which
/// is all the batching this driver needs. Real drivers hang handle caches
/// off this seam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryLoadContext {
    pub bands_prepared: usize,
    pub loads: usize,
}

/// Serves [`MemorySource`]s out of a URI map.
#[derive(Debug, Default)]
pub struct MemoryDriver<T: Pixel> {
    sources: HashMap<String, MemorySource<T>>,
}

impl<T: Pixel> MemoryDriver<T> {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn insert(&mut self, uri: impl Into<String>, source: MemorySource<T>) {
        self.sources.insert(uri.into(), source);
    }
}

impl<T: Pixel> ReaderDriver<T> for MemoryDriver<T> {
    type Context = MemoryLoadContext;

    fn new_load_context(&self, bands: &[BandInfo], prev: Option<Self::Context>) -> Self::Context {
        let mut ctx = prev.unwrap_or_default();
        ctx.bands_prepared = bands.len();
        ctx.loads += 1;
        ctx
    }

    fn open<'a>(&'a self, band: &BandInfo, _ctx: &'a Self::Context) -> PendingReader<'a, T> {
        let opened = match self.sources.get(&band.uri) {
            Some(src) => {
                let nodata = band.nodata.and_then(num_traits::cast);
                let layer = band.layer.unwrap_or(0);
                Ok(Box::new(src.open_reader(layer, nodata)) as Box<dyn RasterReader<T> + 'a>)
            }
            None => Err(RasterError::Driver(format!(
                "no source registered for '{}'",
                band.uri
            ))),
        };
        PendingReader::ready(opened)
    }
}
